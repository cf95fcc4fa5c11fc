//! Options transitions over long random interaction sequences

use kristx::options::{
    apply_change, LookupFilters, LookupOptions, QueryOptionsStore, SortField, SortOrder,
    TableChange, MAX_PAGE_SIZE, PAGE_SIZE_CHOICES,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What a user would expect the table to show, tracked independently of `apply_change`.
#[derive(Clone, Copy, Debug)]
struct Expected {
    page: u64,
    size: u32,
    field: SortField,
    order: SortOrder,
}

impl Expected {
    fn check(&self, options: &LookupOptions, step: usize) {
        assert_eq!(options.limit(), self.size, "limit at step {step}");
        assert_eq!(
            options.offset(),
            (self.page - 1) * u64::from(self.size),
            "offset at step {step}"
        );
        assert_eq!(options.order_by(), self.field, "order_by at step {step}");
        assert_eq!(options.order(), self.order, "order at step {step}");
        assert_eq!(options.page(), self.page, "page at step {step}");
    }
}

fn random_field(rng: &mut StdRng) -> SortField {
    SortField::ALL[rng.gen_range(0..SortField::ALL.len())]
}

#[test]
fn random_sequences_keep_offset_on_page_boundaries() {
    for seed in 0..32u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut options = QueryOptionsStore::initial();
        let mut expected = Expected {
            page: 1,
            size: 20,
            field: SortField::Height,
            order: SortOrder::Descending,
        };
        expected.check(&options, 0);

        for step in 1..200 {
            let before = options.clone();
            match rng.gen_range(0..4) {
                // Page change, same size
                0 => {
                    let page = rng.gen_range(1..=50);
                    options = apply_change(&options, &TableChange::page(page, expected.size));
                    expected.page = page;
                    assert_eq!(options.order_by(), before.order_by());
                    assert_eq!(options.order(), before.order());
                }
                // Size changer, reports the page it was on
                1 => {
                    let size = PAGE_SIZE_CHOICES[rng.gen_range(0..PAGE_SIZE_CHOICES.len())];
                    let page = rng.gen_range(1..=50);
                    options = apply_change(&options, &TableChange::page(page, size));
                    expected.page = if size == expected.size { page } else { 1 };
                    expected.size = size;
                }
                // Header click
                2 => {
                    let field = random_field(&mut rng);
                    let change = TableChange::sort_by(field).with_page(rng.gen_range(1..=50), expected.size);
                    options = apply_change(&options, &change);
                    expected.order = if field == expected.field {
                        expected.order.flip()
                    } else {
                        field.default_order()
                    };
                    expected.field = field;
                    expected.page = 1;
                }
                // Explicit sort
                _ => {
                    let field = random_field(&mut rng);
                    let order = if rng.gen_bool(0.5) {
                        SortOrder::Ascending
                    } else {
                        SortOrder::Descending
                    };
                    let page = rng.gen_range(1..=50);
                    let change = TableChange::sort(field, order).with_page(page, expected.size);
                    options = apply_change(&options, &change);
                    expected.page = if field == expected.field && order == expected.order {
                        page
                    } else {
                        1
                    };
                    expected.field = field;
                    expected.order = order;
                }
            }
            expected.check(&options, step);
        }
    }
}

#[test]
fn store_reports_exactly_the_changes_that_alter_options() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut store = QueryOptionsStore::new(QueryOptionsStore::initial());

    for _ in 0..500 {
        let before = store.current().clone();
        let change = match rng.gen_range(0..3) {
            0 => TableChange::page(rng.gen_range(0..=5), before.limit()),
            1 => TableChange::page_size(PAGE_SIZE_CHOICES[rng.gen_range(0..PAGE_SIZE_CHOICES.len())]),
            _ => TableChange::sort_by(random_field(&mut rng)),
        };
        let expected = apply_change(&before, &change);
        let reported = store.apply(&change).cloned();

        if expected == before {
            assert!(reported.is_none());
        } else {
            assert_eq!(reported.as_ref(), Some(&expected));
        }
        assert_eq!(store.current(), &expected);
    }
}

#[test]
fn extreme_page_sizes_are_clamped() {
    let initial = QueryOptionsStore::initial();
    assert_eq!(apply_change(&initial, &TableChange::page_size(0)).limit(), 1);
    assert_eq!(
        apply_change(&initial, &TableChange::page_size(u32::MAX)).limit(),
        MAX_PAGE_SIZE
    );
    assert_eq!(
        QueryOptionsStore::initial_with_page_size(5000).limit(),
        MAX_PAGE_SIZE
    );
}

#[test]
fn huge_page_numbers_clamp_to_last_addressable_page() {
    let options = apply_change(
        &QueryOptionsStore::initial(),
        &TableChange::page(u64::MAX, 1000),
    );
    assert_eq!(options.limit(), 1000);
    assert_eq!(options.offset(), 0);

    let options = apply_change(&options, &TableChange::page(u64::MAX, 1000));
    let last_page = u64::MAX / 1000 + 1;
    assert_eq!(options.page(), last_page);
    assert_eq!(options.offset(), (last_page - 1) * 1000);

    // Still one step before the end is exact
    let options = apply_change(&options, &TableChange::page(last_page - 1, 1000));
    assert_eq!(options.offset(), (last_page - 2) * 1000);
}

#[test]
fn address_filter_resets_offset_and_keeps_sort() {
    let on_page_four = apply_change(&QueryOptionsStore::initial(), &TableChange::page(4, 20));
    assert_eq!(on_page_four.offset(), 60);

    let filtered = apply_change(
        &on_page_four,
        &TableChange::filters(LookupFilters::addresses(["kfakeaddrx", " ", "k5ztameslf "])),
    );
    assert_eq!(filtered.offset(), 0);
    assert_eq!(filtered.order_by(), SortField::Height);
    assert_eq!(filtered.order(), SortOrder::Descending);
    assert_eq!(filtered.filters().addresses, vec!["kfakeaddrx", "k5ztameslf"]);

    // Same filters again is not a change
    let again = apply_change(
        &filtered,
        &TableChange::filters(LookupFilters::addresses(["kfakeaddrx", "k5ztameslf"])),
    );
    assert_eq!(again, filtered);
}
