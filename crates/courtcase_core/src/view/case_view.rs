//! Client-side case collection state.
//!
//! # Responsibility
//! - Hold the fetched case set plus the user's filter, sort and page choices.
//! - Derive the visible page without touching the store.
//! - Fold repository outcomes back into the collection.
//!
//! # Invariants
//! - Derived views never mutate `cases`.
//! - Changing search, status filter, date range or page size resets `page` to 0.
//! - `error` holds the latest failure only and is cleared by the next request.

use crate::model::case::{CaseRecord, CaseStatus};
use crate::view::sort::{sort_cases, SortField, SortSpec};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Status chip selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(CaseStatus),
}

impl StatusFilter {
    /// Parses `"all"` (any case) or an exact status value.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        CaseStatus::parse(value).map(Self::Only)
    }

    pub fn matches(self, status: CaseStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == status,
        }
    }
}

/// Inclusive bounds on `caseDate`, in epoch milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl DateRange {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A case without a date fails any set bound.
    pub fn contains(&self, case_date: Option<i64>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = case_date else {
            return false;
        };
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseViewState {
    pub cases: Vec<CaseRecord>,
    pub current_case: Option<CaseRecord>,
    pub loading: bool,
    pub error: Option<String>,
    search_term: String,
    status_filter: StatusFilter,
    date_range: DateRange,
    sort: SortSpec,
    page: usize,
    page_size: usize,
}

impl Default for CaseViewState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl CaseViewState {
    /// Empty state with a custom page size; zero falls back to the default.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            cases: Vec::new(),
            current_case: None,
            loading: false,
            error: None,
            search_term: String::new(),
            status_filter: StatusFilter::All,
            date_range: DateRange::default(),
            sort: SortSpec::default(),
            page: 0,
            page_size: normalize_page_size(page_size),
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 0;
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
        self.page = 0;
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.date_range = range;
        self.page = 0;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = normalize_page_size(page_size);
        self.page = 0;
    }

    /// Resets search, status and date filters.
    pub fn clear_filters(&mut self) {
        self.search_term.clear();
        self.status_filter = StatusFilter::All;
        self.date_range = DateRange::default();
        self.page = 0;
    }

    /// Sorting keeps the current page.
    pub fn set_sorting(&mut self, sort: SortSpec) {
        self.sort = sort;
    }

    /// Column header click.
    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort = self.sort.toggled(field);
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Cases matching search, status and date range, in fetch order.
    pub fn filtered_cases(&self) -> Vec<&CaseRecord> {
        let needle = self.search_term.trim().to_lowercase();
        self.cases
            .iter()
            .filter(|case| matches_search(case, &needle))
            .filter(|case| self.status_filter.matches(case.status))
            .filter(|case| self.date_range.contains(case.case_date))
            .collect()
    }

    /// Filtered cases under the active sort.
    pub fn sorted(&self) -> Vec<&CaseRecord> {
        let mut cases = self.filtered_cases();
        sort_cases(&mut cases, self.sort);
        cases
    }

    /// The current page of sorted cases; empty past the last page.
    pub fn visible_cases(&self) -> Vec<&CaseRecord> {
        let sorted = self.sorted();
        let start = self.page.saturating_mul(self.page_size);
        sorted
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_cases().len()
    }

    pub fn page_count(&self) -> usize {
        self.filtered_count().div_ceil(self.page_size)
    }

    pub fn begin_request(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn cases_loaded(&mut self, cases: Vec<CaseRecord>) {
        self.cases = cases;
        self.loading = false;
    }

    pub fn case_loaded(&mut self, case: CaseRecord) {
        self.current_case = Some(case);
        self.loading = false;
    }

    pub fn case_created(&mut self, case: CaseRecord) {
        self.cases.insert(0, case.clone());
        self.current_case = Some(case);
        self.loading = false;
    }

    pub fn case_updated(&mut self, case: CaseRecord) {
        self.replace_in_list(&case);
        self.replace_current(case);
        self.loading = false;
    }

    /// Keeps the tombstoned record in the list until the next refetch and
    /// closes it if it is the open case.
    pub fn case_soft_deleted(&mut self, case: CaseRecord) {
        self.replace_in_list(&case);
        if self
            .current_case
            .as_ref()
            .is_some_and(|current| current.id == case.id)
        {
            self.current_case = None;
        }
        self.loading = false;
    }

    pub fn case_restored(&mut self, case: CaseRecord) {
        if !self.replace_in_list(&case) {
            self.cases.insert(0, case.clone());
        }
        self.replace_current(case);
        self.loading = false;
    }

    pub fn case_permanently_deleted(&mut self, id: &str) {
        self.cases.retain(|case| case.id != id);
        if self.current_case.as_ref().is_some_and(|case| case.id == id) {
            self.current_case = None;
        }
        self.loading = false;
    }

    pub fn request_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.loading = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn clear_current_case(&mut self) {
        self.current_case = None;
    }

    pub fn find(&self, id: &str) -> Option<&CaseRecord> {
        self.cases.iter().find(|case| case.id == id)
    }

    fn replace_in_list(&mut self, case: &CaseRecord) -> bool {
        match self.cases.iter_mut().find(|existing| existing.id == case.id) {
            Some(existing) => {
                *existing = case.clone();
                true
            }
            None => false,
        }
    }

    fn replace_current(&mut self, case: CaseRecord) {
        if self
            .current_case
            .as_ref()
            .map_or(true, |current| current.id == case.id)
        {
            self.current_case = Some(case);
        }
    }
}

fn matches_search(case: &CaseRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [&case.case_number, &case.client_name, &case.current_summary]
        .into_iter()
        .any(|text| text.to_lowercase().contains(needle))
}

fn normalize_page_size(page_size: usize) -> usize {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}
