//! Pagination widget settings derived from the current options and last result.

use crate::options::{LookupOptions, PAGE_SIZE_CHOICES};
use crate::util_text::format_thousands;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationSettings {
    /// 1-based
    pub current_page: u64,
    pub page_size: u32,
    /// `None` until the first lookup commits
    pub total: Option<u64>,
    pub page_size_choices: &'static [u32],
    /// Off once the whole result set fits on the smallest choice
    pub show_size_changer: bool,
}

impl PaginationSettings {
    pub fn new(options: &LookupOptions, total: Option<u64>) -> Self {
        Self {
            current_page: options.page(),
            page_size: options.limit(),
            total,
            page_size_choices: &PAGE_SIZE_CHOICES,
            show_size_changer: total
                .map_or(true, |t| t > u64::from(PAGE_SIZE_CHOICES[0])),
        }
    }

    /// Number of pages, at least one. Unknown totals count as a single page.
    pub fn page_count(&self) -> u64 {
        match self.total {
            Some(total) if total > 0 => total.div_ceil(u64::from(self.page_size)),
            _ => 1,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.page_count()
    }

    /// 1-based inclusive range of records shown for a page holding `count` records.
    pub fn item_range(&self, count: u64) -> Option<(u64, u64)> {
        if count == 0 {
            return None;
        }
        let first = (self.current_page - 1)
            .saturating_mul(u64::from(self.page_size))
            .saturating_add(1);
        Some((first, first.saturating_add(count - 1)))
    }

    /// Page size choice after the current one, wrapping. Sizes outside the choices snap
    /// to the first choice larger than them.
    pub fn next_page_size(&self) -> u32 {
        let choices = self.page_size_choices;
        match choices.iter().position(|&c| c > self.page_size) {
            Some(i) => choices[i],
            None => choices.first().copied().unwrap_or(self.page_size),
        }
    }

    pub fn prev_page_size(&self) -> u32 {
        let choices = self.page_size_choices;
        match choices.iter().rposition(|&c| c < self.page_size) {
            Some(i) => choices[i],
            None => choices.last().copied().unwrap_or(self.page_size),
        }
    }

    /// e.g. "5,000 blocks"
    pub fn total_label(&self, noun: &str) -> String {
        format!("{} {noun}", format_thousands(self.total.unwrap_or(0)))
    }
}
