//! Lookup options and the pure transition that produces them.
//!
//! `LookupOptions` is never mutated in place: every table interaction goes through
//! [`apply_change`] and yields a fresh value, so equality is enough to tell whether the
//! query changed. [`QueryOptionsStore`] holds the single current value for one table.

use crate::debug::{self, cat};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page the Krist lookup endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page sizes offered by the size changer.
pub const PAGE_SIZE_CHOICES: [u32; 4] = [10, 20, 50, 100];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    /// Value of the `order` query parameter.
    pub fn as_api_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" | "ascend" => Ok(SortOrder::Ascending),
            "desc" | "descending" | "descend" => Ok(SortOrder::Descending),
            _ => Err(anyhow!("Invalid sort order '{s}'. Valid options: asc, desc")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "asc"),
            SortOrder::Descending => write!(f, "desc"),
        }
    }
}

/// Block fields the lookup endpoint can sort by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    Height,
    Address,
    Hash,
    Difficulty,
    Time,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Height,
        SortField::Address,
        SortField::Hash,
        SortField::Difficulty,
        SortField::Time,
    ];

    /// Value of the `orderBy` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Height => "height",
            SortField::Address => "address",
            SortField::Hash => "hash",
            SortField::Difficulty => "difficulty",
            SortField::Time => "time",
        }
    }

    /// Direction applied when this field becomes the sort column.
    ///
    /// Numeric and time-like fields open newest/largest first; text fields open A-Z.
    pub fn default_order(self) -> SortOrder {
        match self {
            SortField::Height => SortOrder::Descending,
            SortField::Address => SortOrder::Ascending,
            SortField::Hash => SortOrder::Ascending,
            SortField::Difficulty => SortOrder::Descending,
            SortField::Time => SortOrder::Descending,
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        SortField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                anyhow!("Invalid sort field '{s}'. Valid options: height, address, hash, difficulty, time")
            })
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional filters. The blocks table sends none; other lookups narrow by address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupFilters {
    pub addresses: Vec<String>,
}

impl LookupFilters {
    pub fn addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses
                .into_iter()
                .map(Into::into)
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct LookupOptions {
    limit: u32,
    offset: u64,
    order_by: SortField,
    order: SortOrder,
    #[serde(skip_serializing_if = "LookupFilters::is_empty")]
    filters: LookupFilters,
}

impl LookupOptions {
    /// Build options, clamping `limit` into `1..=MAX_PAGE_SIZE`.
    pub fn new(limit: u32, offset: u64, order_by: SortField, order: SortOrder) -> Self {
        Self {
            limit: clamp_page_size(limit),
            offset,
            order_by,
            order,
            filters: LookupFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: LookupFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn order_by(&self) -> SortField {
        self.order_by
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn filters(&self) -> &LookupFilters {
        &self.filters
    }

    /// 1-based page the offset falls on.
    pub fn page(&self) -> u64 {
        (self.offset / u64::from(self.limit)).saturating_add(1)
    }
}

impl Default for LookupOptions {
    fn default() -> Self {
        QueryOptionsStore::initial()
    }
}

/// How the sort column changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortChange {
    /// Header click: flips the active column, otherwise selects the column at its default.
    Toggle(SortField),
    /// Explicit column and direction.
    Set { field: SortField, order: SortOrder },
}

/// What the table reported on an interaction. Unset fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableChange {
    pub page: Option<u64>,
    pub page_size: Option<u32>,
    pub sort: Option<SortChange>,
    pub filters: Option<LookupFilters>,
}

impl TableChange {
    pub fn page(page: u64, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn page_size(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn sort_by(field: SortField) -> Self {
        Self {
            sort: Some(SortChange::Toggle(field)),
            ..Self::default()
        }
    }

    pub fn sort(field: SortField, order: SortOrder) -> Self {
        Self {
            sort: Some(SortChange::Set { field, order }),
            ..Self::default()
        }
    }

    pub fn filters(filters: LookupFilters) -> Self {
        Self {
            filters: Some(filters),
            ..Self::default()
        }
    }

    /// Attach the pagination state the table reported alongside a sort or filter change.
    pub fn with_page(mut self, page: u64, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }
}

fn clamp_page_size(size: u32) -> u32 {
    let clamped = size.clamp(1, MAX_PAGE_SIZE);
    if clamped != size {
        if debug::is(cat::STORE) {
            debug::log(cat::STORE, format!("page size {size} clamped to {clamped}"));
        }
    }
    clamped
}

fn clamp_page(page: u64) -> u64 {
    if page == 0 {
        debug::log(cat::STORE, "page 0 clamped to 1");
        return 1;
    }
    page
}

/// Offset of the first record on `page`. Pages past the last addressable one clamp to it,
/// so the offset is always an exact multiple of `limit`.
fn page_offset(page: u64, limit: u32) -> u64 {
    let limit = u64::from(limit);
    let index = clamp_page(page) - 1;
    let last_index = u64::MAX / limit;
    if index > last_index {
        debug::log(cat::STORE, "page past the addressable range clamped");
        return last_index * limit;
    }
    index * limit
}

/// Produce the options that follow `current` after `change`.
///
/// A new page size, sort column, sort direction or filter set changes the shape of the
/// result set, so the offset goes back to the first page and any reported page number is
/// ignored. A bare page change keeps sort and filters.
pub fn apply_change(current: &LookupOptions, change: &TableChange) -> LookupOptions {
    let limit = change
        .page_size
        .map(clamp_page_size)
        .unwrap_or(current.limit);

    let (order_by, order) = match change.sort {
        None => (current.order_by, current.order),
        Some(SortChange::Toggle(field)) if field == current.order_by => {
            (field, current.order.flip())
        }
        Some(SortChange::Toggle(field)) => (field, field.default_order()),
        Some(SortChange::Set { field, order }) => (field, order),
    };

    let filters = change
        .filters
        .clone()
        .unwrap_or_else(|| current.filters.clone());

    let reshaped = limit != current.limit
        || order_by != current.order_by
        || order != current.order
        || filters != current.filters;

    let offset = if reshaped {
        0
    } else {
        match change.page {
            Some(page) => page_offset(page, limit),
            None => current.offset,
        }
    };

    LookupOptions {
        limit,
        offset,
        order_by,
        order,
        filters,
    }
}

/// Holds the one current `LookupOptions` for a table.
#[derive(Clone, Debug)]
pub struct QueryOptionsStore {
    current: LookupOptions,
}

impl QueryOptionsStore {
    /// Newest blocks first, one default-sized page.
    pub fn initial() -> LookupOptions {
        Self::initial_with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn initial_with_page_size(page_size: u32) -> LookupOptions {
        let order_by = SortField::Height;
        LookupOptions::new(page_size, 0, order_by, order_by.default_order())
    }

    pub fn new(initial: LookupOptions) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> &LookupOptions {
        &self.current
    }

    /// Apply a table change. Returns the new options only if they differ from the old ones.
    pub fn apply(&mut self, change: &TableChange) -> Option<&LookupOptions> {
        let next = apply_change(&self.current, change);
        if next == self.current {
            debug::log(cat::STORE, "change left options untouched");
            return None;
        }
        if debug::is(cat::STORE) {
            debug::log(
                cat::STORE,
                format!(
                    "options -> limit={} offset={} orderBy={} order={}",
                    next.limit,
                    next.offset,
                    next.order_by,
                    next.order.as_api_str()
                ),
            );
        }
        self.current = next;
        Some(&self.current)
    }
}

impl Default for QueryOptionsStore {
    fn default() -> Self {
        Self::new(Self::initial())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(limit: u32, offset: u64, order_by: SortField, order: SortOrder) -> LookupOptions {
        LookupOptions::new(limit, offset, order_by, order)
    }

    #[test]
    fn page_of_last_offset_does_not_overflow() {
        let options = opts(1, u64::MAX, SortField::Height, SortOrder::Descending);
        assert_eq!(options.page(), u64::MAX);
    }

    #[test]
    fn far_pages_stay_on_page_boundaries() {
        let one = opts(1, 0, SortField::Height, SortOrder::Descending);
        let far = apply_change(&one, &TableChange::page(u64::MAX, 1));
        assert_eq!(far.offset(), u64::MAX - 1);
        assert_eq!(far.page(), u64::MAX);

        let thousand = opts(1000, 0, SortField::Height, SortOrder::Descending);
        let far = apply_change(&thousand, &TableChange::page(u64::MAX, 1000));
        assert_eq!(far.offset() % 1000, 0);
        assert_eq!(far.offset(), (far.page() - 1) * 1000);
    }

    #[test]
    fn initial_is_newest_first() {
        assert_eq!(
            QueryOptionsStore::initial(),
            opts(20, 0, SortField::Height, SortOrder::Descending)
        );
    }

    #[test]
    fn page_navigation_translates_to_offset() {
        let base = QueryOptionsStore::initial();
        let next = apply_change(&base, &TableChange::page(3, 20));
        assert_eq!(next, opts(20, 40, SortField::Height, SortOrder::Descending));
        assert_eq!(next.page(), 3);
    }

    #[test]
    fn page_size_change_resets_offset() {
        let on_page_5 = opts(20, 80, SortField::Time, SortOrder::Ascending);
        let next = apply_change(&on_page_5, &TableChange::page(5, 50));
        assert_eq!(next, opts(50, 0, SortField::Time, SortOrder::Ascending));
    }

    #[test]
    fn header_click_on_new_column_uses_its_default() {
        let on_page_3 = opts(20, 40, SortField::Height, SortOrder::Descending);
        let next = apply_change(&on_page_3, &TableChange::sort_by(SortField::Address).with_page(3, 20));
        assert_eq!(next, opts(20, 0, SortField::Address, SortOrder::Ascending));
    }

    #[test]
    fn header_click_on_active_column_flips_and_flips_back() {
        let base = QueryOptionsStore::initial();
        let once = apply_change(&base, &TableChange::sort_by(SortField::Height));
        assert_eq!(once.order(), SortOrder::Ascending);
        let twice = apply_change(&once, &TableChange::sort_by(SortField::Height));
        assert_eq!(twice.order(), SortOrder::Descending);
        assert_eq!(twice.order_by(), SortField::Height);
    }

    #[test]
    fn explicit_sort_to_same_value_keeps_page() {
        let on_page_2 = opts(20, 20, SortField::Height, SortOrder::Descending);
        let change = TableChange::sort(SortField::Height, SortOrder::Descending).with_page(2, 20);
        assert_eq!(apply_change(&on_page_2, &change), on_page_2);
    }

    #[test]
    fn filter_change_resets_offset_and_page_keeps_filters() {
        let base = opts(20, 60, SortField::Height, SortOrder::Descending);
        let filtered = apply_change(&base, &TableChange::filters(LookupFilters::addresses(["kfoo000000"])));
        assert_eq!(filtered.offset(), 0);
        assert_eq!(filtered.filters().addresses, vec!["kfoo000000".to_string()]);

        let paged = apply_change(&filtered, &TableChange::page(2, 20));
        assert_eq!(paged.offset(), 20);
        assert_eq!(paged.filters(), filtered.filters());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let base = QueryOptionsStore::initial();
        assert_eq!(apply_change(&base, &TableChange::page(0, 20)).offset(), 0);
        assert_eq!(apply_change(&base, &TableChange::page_size(0)).limit(), 1);
        assert_eq!(
            apply_change(&base, &TableChange::page_size(5000)).limit(),
            MAX_PAGE_SIZE
        );
    }

    #[test]
    fn store_reports_only_real_changes() {
        let mut store = QueryOptionsStore::default();
        assert!(store.apply(&TableChange::page(1, 20)).is_none());
        assert!(store.apply(&TableChange::page(2, 20)).is_some());
        assert_eq!(store.current().offset(), 20);
    }

    #[test]
    fn parse_sort_field_and_order() {
        assert_eq!("Difficulty".parse::<SortField>().unwrap(), SortField::Difficulty);
        assert!("short_hash".parse::<SortField>().is_err());
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Descending);
    }
}
