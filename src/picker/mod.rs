//! Paged, searchable employee picker.
//!
//! The picker is a pure state machine. Time enters only as a millisecond
//! value passed to [`EmployeePicker::type_search`] and [`EmployeePicker::tick`],
//! and fetching is left to the caller: operations that need data return the
//! [`FetchKey`] to request, and the caller reports back with
//! [`EmployeePicker::complete`] or [`EmployeePicker::fail`].
//!
//! Rules:
//! - typed text is visible immediately but only reaches the fetch key once it
//!   has been stable for the debounce window;
//! - a new debounced term resets to page 1, a page change keeps the term;
//! - pages are clamped to the server-reported total;
//! - a response for a key that is no longer in flight is discarded;
//! - a fetch that never reported back is re-issued once it has been in
//!   flight for the stall window.

mod clock;

pub use clock::*;

use serde::Serialize;

use crate::models::{EmployeePage, EmployeeQuery};

/// Parameters of one employee listing request.
pub type FetchKey = EmployeeQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Idle,
    /// First fetch, nothing to show yet.
    Loading,
    /// Refetch while the previous page is still shown.
    Fetching,
    Error,
    Ready,
}

#[derive(Debug, Clone)]
struct PendingTerm {
    term: String,
    due_at: u64,
}

#[derive(Debug, Clone)]
struct InFlight {
    key: FetchKey,
    started_at: u64,
}

#[derive(Debug, Clone)]
pub struct EmployeePicker {
    search_term: String,
    debounced_term: String,
    pending: Option<PendingTerm>,
    page: u32,
    per_page: u32,
    total_pages: Option<u32>,
    debounce_ms: u64,
    stall_ms: u64,
    status: FetchStatus,
    in_flight: Option<InFlight>,
    data: Option<EmployeePage>,
    error: Option<String>,
}

/// Snapshot rendered by the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerView {
    pub search_term: String,
    pub debounced_term: String,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: Option<u32>,
    pub status: FetchStatus,
    pub data: Option<EmployeePage>,
    pub error: Option<String>,
    /// Only offered after a failed fetch.
    pub can_retry: bool,
}

impl EmployeePicker {
    pub fn new(per_page: u32, debounce_ms: u64, stall_ms: u64) -> Self {
        Self {
            search_term: String::new(),
            debounced_term: String::new(),
            pending: None,
            page: 1,
            per_page: per_page.max(1),
            total_pages: None,
            debounce_ms,
            stall_ms,
            status: FetchStatus::Idle,
            in_flight: None,
            data: None,
            error: None,
        }
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn data(&self) -> Option<&EmployeePage> {
        self.data.as_ref()
    }

    /// Whether a response for `key` would be applied.
    pub fn is_in_flight(&self, key: &FetchKey) -> bool {
        self.in_flight.as_ref().is_some_and(|flight| flight.key == *key)
    }

    /// Parameters for the current state.
    pub fn fetch_key(&self) -> FetchKey {
        FetchKey {
            search: self.debounced_term.clone(),
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// Record a keystroke. Restarts the debounce window.
    pub fn type_search(&mut self, term: impl Into<String>, now_ms: u64) {
        let term = term.into();
        self.search_term = term.clone();
        self.pending = Some(PendingTerm {
            term,
            due_at: now_ms.saturating_add(self.debounce_ms),
        });
    }

    /// Advance to `now_ms`. Returns a key when a fetch should start: on the
    /// first tick, when a debounced term has settled on a new value, and when
    /// the in-flight fetch has stalled.
    pub fn tick(&mut self, now_ms: u64) -> Option<FetchKey> {
        if let Some(pending) = self.pending.take_if(|pending| now_ms >= pending.due_at) {
            let term = pending.term.trim().to_string();
            if term != self.debounced_term {
                self.debounced_term = term;
                self.page = 1;
                return Some(self.request(now_ms));
            }
        }

        let stalled = self
            .in_flight
            .as_ref()
            .is_some_and(|flight| now_ms.saturating_sub(flight.started_at) >= self.stall_ms);
        if stalled {
            tracing::warn!(page = self.page, search = %self.debounced_term, "Re-issuing stalled picker fetch");
            return Some(self.request(now_ms));
        }

        if self.status == FetchStatus::Idle {
            return Some(self.request(now_ms));
        }
        None
    }

    /// Move to `page`, clamped to the known range. Returns a key when the
    /// effective page changed.
    pub fn set_page(&mut self, page: u32, now_ms: u64) -> Option<FetchKey> {
        let page = self.clamp(page);
        if page == self.page && self.status != FetchStatus::Idle {
            return None;
        }
        self.page = page;
        Some(self.request(now_ms))
    }

    /// Re-issue the failed query unchanged.
    pub fn retry(&mut self, now_ms: u64) -> Option<FetchKey> {
        if self.status != FetchStatus::Error {
            return None;
        }
        Some(self.request(now_ms))
    }

    /// Apply a successful response.
    ///
    /// When the reported total pages puts the current page out of range, the
    /// page is clamped and the key for the clamped page is returned.
    pub fn complete(
        &mut self,
        key: &FetchKey,
        result: EmployeePage,
        now_ms: u64,
    ) -> Option<FetchKey> {
        if !self.is_in_flight(key) {
            tracing::debug!(page = key.page, search = %key.search, "Discarding stale picker response");
            return None;
        }
        self.in_flight = None;
        self.error = None;

        let total_pages = result.pagination.total_pages.max(1);
        self.total_pages = Some(total_pages);
        self.data = Some(result);

        if self.page > total_pages {
            self.page = total_pages;
            return Some(self.request(now_ms));
        }
        self.status = FetchStatus::Ready;
        None
    }

    /// Apply a failed response.
    pub fn fail(&mut self, key: &FetchKey, message: impl Into<String>) {
        if !self.is_in_flight(key) {
            return;
        }
        self.in_flight = None;
        self.status = FetchStatus::Error;
        self.error = Some(message.into());
    }

    pub fn view(&self) -> PickerView {
        PickerView {
            search_term: self.search_term.clone(),
            debounced_term: self.debounced_term.clone(),
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            can_retry: self.status == FetchStatus::Error,
        }
    }

    fn clamp(&self, page: u32) -> u32 {
        let upper = self.total_pages.unwrap_or(u32::MAX);
        page.clamp(1, upper.max(1))
    }

    fn request(&mut self, now_ms: u64) -> FetchKey {
        let key = self.fetch_key();
        self.status = if self.data.is_some() {
            FetchStatus::Fetching
        } else {
            FetchStatus::Loading
        };
        self.in_flight = Some(InFlight {
            key: key.clone(),
            started_at: now_ms,
        });
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pagination;

    const DEBOUNCE: u64 = 400;
    const STALL: u64 = 10_000;

    fn page_of(page: u32, total_pages: u32) -> EmployeePage {
        EmployeePage {
            employees: Vec::new(),
            pagination: Pagination {
                page,
                per_page: 10,
                total_pages,
                total_docs: u64::from(total_pages) * 10,
            },
        }
    }

    fn loaded(total_pages: u32) -> EmployeePicker {
        let mut picker = EmployeePicker::new(10, DEBOUNCE, STALL);
        let key = picker.tick(0).unwrap();
        assert!(picker.complete(&key, page_of(1, total_pages), 0).is_none());
        picker
    }

    #[test]
    fn test_first_tick_loads() {
        let mut picker = EmployeePicker::new(10, DEBOUNCE, STALL);
        assert_eq!(picker.status(), FetchStatus::Idle);

        let key = picker.tick(0).unwrap();
        assert_eq!(key.page, 1);
        assert_eq!(key.search, "");
        assert_eq!(picker.status(), FetchStatus::Loading);
        assert!(picker.tick(1).is_none());

        picker.complete(&key, page_of(1, 3), 0);
        assert_eq!(picker.status(), FetchStatus::Ready);
    }

    #[test]
    fn test_only_final_term_of_burst_fetches() {
        let mut picker = loaded(3);
        picker.type_search("a", 0);
        picker.type_search("ad", 100);
        picker.type_search("ada", 300);

        assert_eq!(picker.search_term(), "ada");
        assert!(picker.tick(500).is_none());
        assert!(picker.tick(699).is_none());

        let key = picker.tick(700).unwrap();
        assert_eq!(key.search, "ada");
        assert!(picker.tick(2000).is_none());
    }

    #[test]
    fn test_term_equal_to_current_does_not_refetch() {
        let mut picker = loaded(3);
        picker.type_search("x", 0);
        picker.type_search("", 100);
        assert!(picker.tick(1000).is_none());
    }

    #[test]
    fn test_new_term_resets_page() {
        let mut picker = loaded(5);
        let key = picker.set_page(4, 0).unwrap();
        assert_eq!(picker.status(), FetchStatus::Fetching);
        picker.complete(&key, page_of(4, 5), 0);

        picker.type_search("bo", 0);
        let key = picker.tick(DEBOUNCE).unwrap();
        assert_eq!(key.page, 1);
        assert_eq!(key.search, "bo");
    }

    #[test]
    fn test_page_change_keeps_term() {
        let mut picker = loaded(5);
        picker.type_search("bo", 0);
        let key = picker.tick(DEBOUNCE).unwrap();
        picker.complete(&key, page_of(1, 5), 0);

        let key = picker.set_page(3, 0).unwrap();
        assert_eq!(key.search, "bo");
        assert_eq!(key.page, 3);
    }

    #[test]
    fn test_set_page_is_clamped() {
        let mut picker = loaded(3);
        assert_eq!(picker.set_page(9, 0).unwrap().page, 3);
        let mut picker = loaded(3);
        assert_eq!(picker.set_page(0, 0), None);
        assert_eq!(picker.page(), 1);
    }

    #[test]
    fn test_shrinking_total_pages_clamps_next_fetch() {
        let mut picker = loaded(6);
        let key = picker.set_page(5, 0).unwrap();
        picker.complete(&key, page_of(5, 6), 0);

        let key = picker.set_page(5, 0);
        assert!(key.is_none());

        // A response reporting fewer pages than the current one.
        let key = picker.set_page(6, 0).unwrap();
        let follow_up = picker.complete(&key, page_of(6, 2), 0).unwrap();
        assert_eq!(follow_up.page, 2);
        assert_eq!(picker.page(), 2);
        assert_eq!(picker.status(), FetchStatus::Fetching);
    }

    #[test]
    fn test_error_then_retry_same_key() {
        let mut picker = loaded(3);
        picker.type_search("zed", 0);
        let key = picker.tick(DEBOUNCE).unwrap();
        picker.fail(&key, "upstream unavailable");

        let view = picker.view();
        assert_eq!(view.status, FetchStatus::Error);
        assert!(view.can_retry);
        assert_eq!(view.error.as_deref(), Some("upstream unavailable"));

        let retried = picker.retry(0).unwrap();
        assert_eq!(retried, key);
        assert!(picker.retry(0).is_none());
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let mut picker = loaded(5);
        let old = picker.set_page(2, 0).unwrap();
        let new = picker.set_page(3, 0).unwrap();

        assert!(picker.complete(&old, page_of(2, 5), 0).is_none());
        assert_eq!(picker.status(), FetchStatus::Fetching);

        picker.complete(&new, page_of(3, 5), 0);
        assert_eq!(picker.status(), FetchStatus::Ready);
        assert_eq!(picker.data().unwrap().pagination.page, 3);
    }

    #[test]
    fn test_stalled_fetch_is_reissued() {
        let mut picker = loaded(5);
        let key = picker.set_page(3, 100).unwrap();
        assert!(picker.tick(100 + STALL - 1).is_none());

        let reissued = picker.tick(100 + STALL).unwrap();
        assert_eq!(reissued, key);
        assert_eq!(picker.status(), FetchStatus::Fetching);
        assert!(picker.tick(100 + STALL + 1).is_none());

        picker.complete(&reissued, page_of(3, 5), 100 + STALL + 2);
        assert_eq!(picker.status(), FetchStatus::Ready);
        assert!(picker.tick(100 + 3 * STALL).is_none());
    }

    #[test]
    fn test_repeated_shrink_follows_down() {
        let mut picker = loaded(10);
        let key = picker.set_page(10, 0).unwrap();
        let follow_up = picker.complete(&key, page_of(10, 5), 0).unwrap();
        assert_eq!(follow_up.page, 5);

        let follow_up = picker.complete(&follow_up, page_of(5, 2), 0).unwrap();
        assert_eq!(follow_up.page, 2);

        assert!(picker.complete(&follow_up, page_of(2, 2), 0).is_none());
        assert_eq!(picker.status(), FetchStatus::Ready);
        assert_eq!(picker.page(), 2);
    }
}
