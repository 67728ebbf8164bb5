//! Payroll run wizard sessions.
//!
//! One session per open wizard, held in memory only. A session starts at the
//! details step, collects the employee scope, and is discarded when the run is
//! submitted, the wizard is cancelled, or it sits idle past the store's TTL.

mod details;

pub use details::*;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    CreatePayrollRequest, EmployeePage, EntityKind, EntityOption, OptionQuery, RunPayroll,
    ScopeDefaults, ScopePayload, SelectionMode,
};
use crate::options::CountLookup;
use crate::picker::{Clock, EmployeePicker, FetchKey};
use crate::scope::{CountContext, ScopeSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Details,
    Scope,
    Review,
}

#[derive(Debug)]
pub struct WizardSession {
    id: Uuid,
    step: WizardStep,
    details: Option<RunPayroll>,
    pub scope: ScopeSelection,
    pub picker: EmployeePicker,
    counts: CountContext,
    submitting: bool,
    created_at: DateTime<Utc>,
    last_active_ms: AtomicU64,
}

/// Wizard state returned to the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub id: Uuid,
    pub step: WizardStep,
    pub details: Option<RunPayroll>,
    pub mode: SelectionMode,
    pub departments: Vec<String>,
    pub cadres: Vec<String>,
    pub employees: Vec<String>,
    pub payload: ScopePayload,
    pub current_count: Option<u64>,
    pub submitting: bool,
    pub created_at: DateTime<Utc>,
}

/// Department and cadre choices for the scope step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardOptions {
    pub departments: OptionQuery,
    pub cadres: OptionQuery,
}

impl WizardSession {
    pub fn new(defaults: &ScopeDefaults, picker: EmployeePicker) -> Self {
        Self {
            id: Uuid::new_v4(),
            step: WizardStep::Details,
            details: None,
            scope: ScopeSelection::from_defaults(defaults),
            picker,
            counts: CountContext::default(),
            submitting: false,
            created_at: Utc::now(),
            last_active_ms: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Store validated run details and move past the details step.
    pub fn set_details(&mut self, details: RunPayroll) {
        self.details = Some(details);
        if self.step == WizardStep::Details {
            self.step = WizardStep::Scope;
        }
    }

    /// Move between steps. Anything past the details step needs details.
    pub fn go_to(&mut self, step: WizardStep) -> Result<(), AppError> {
        if step != WizardStep::Details && self.details.is_none() {
            return Err(AppError::Validation(
                "Run details must be completed first".to_string(),
            ));
        }
        self.step = step;
        Ok(())
    }

    /// Remember the counts of freshly loaded options.
    pub fn record_options(&mut self, kind: EntityKind, options: &[EntityOption]) {
        let lookup = CountLookup::from_options(options);
        match kind {
            EntityKind::Department => self.counts.departments = lookup,
            EntityKind::Cadre => self.counts.cadres = lookup,
        }
    }

    /// Feed an employee page to the picker. An accepted unfiltered listing
    /// also reports the roster size used by the `all` mode count.
    pub fn apply_employee_page(
        &mut self,
        key: &FetchKey,
        page: EmployeePage,
        now_ms: u64,
    ) -> Option<FetchKey> {
        if key.search.is_empty() && self.picker.is_in_flight(key) {
            self.counts.roster_total = Some(page.pagination.total_docs);
        }
        self.picker.complete(key, page, now_ms)
    }

    /// Compose the payroll-creation request and mark the session submitting.
    ///
    /// Empty selections are submitted as-is; whether they should be blocked
    /// is a product decision that has not been made.
    pub fn begin_submit(&mut self) -> Result<CreatePayrollRequest, AppError> {
        if self.submitting {
            return Err(AppError::Conflict(format!(
                "Wizard {} is already submitting",
                self.id
            )));
        }
        let run_payroll = self.details.clone().ok_or_else(|| {
            AppError::Validation("Run details must be completed before submitting".to_string())
        })?;

        if self.scope.is_empty_selection() {
            tracing::warn!(
                wizard = %self.id,
                mode = self.scope.mode().as_str(),
                "Submitting payroll run with an empty employee selection"
            );
        }

        self.submitting = true;
        Ok(CreatePayrollRequest {
            run_payroll,
            employee_scope: self.scope.build_payload(),
        })
    }

    /// Re-enable submission after a failed attempt.
    pub fn abort_submit(&mut self) {
        self.submitting = false;
    }

    fn touch(&self, now_ms: u64) {
        self.last_active_ms.store(now_ms, Ordering::Relaxed);
    }

    /// Idle past `ttl_ms`. A session with a submission in flight never expires.
    fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        !self.submitting
            && now_ms.saturating_sub(self.last_active_ms.load(Ordering::Relaxed)) >= ttl_ms
    }

    pub fn view(&self) -> WizardView {
        WizardView {
            id: self.id,
            step: self.step,
            details: self.details.clone(),
            mode: self.scope.mode(),
            departments: self.scope.departments().to_vec(),
            cadres: self.scope.cadres().to_vec(),
            employees: self.scope.employees().to_vec(),
            payload: self.scope.build_payload(),
            current_count: self.scope.current_count(&self.counts),
            submitting: self.submitting,
            created_at: self.created_at,
        }
    }
}

/// In-memory wizard sessions keyed by id.
///
/// Every read or update refreshes a session's activity time; sessions idle
/// for longer than the TTL are treated as gone and swept.
pub struct WizardStore {
    sessions: RwLock<HashMap<Uuid, WizardSession>>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
}

impl WizardStore {
    pub fn new(clock: Arc<dyn Clock>, ttl_ms: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
            ttl_ms,
        }
    }

    pub async fn insert(&self, session: WizardSession) -> WizardView {
        let now = self.clock.now_ms();
        session.touch(now);
        let view = session.view();

        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions, now);
        sessions.insert(session.id(), session);
        tracing::info!(wizard = %view.id, open = sessions.len(), "Wizard opened");
        view
    }

    pub async fn read<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&WizardSession) -> T,
    ) -> Result<T, AppError> {
        let now = self.clock.now_ms();
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&id)
            .filter(|session| !session.is_expired(now, self.ttl_ms))
            .ok_or_else(|| not_found(id))?;
        session.touch(now);
        Ok(f(session))
    }

    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WizardSession) -> T,
    ) -> Result<T, AppError> {
        let now = self.clock.now_ms();
        let mut sessions = self.sessions.write().await;
        if sessions.get(&id).is_some_and(|session| session.is_expired(now, self.ttl_ms)) {
            sessions.remove(&id);
            tracing::info!(wizard = %id, "Wizard expired");
        }
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.touch(now);
        Ok(f(session))
    }

    /// Drop a session unconditionally.
    pub async fn remove(&self, id: Uuid) -> Result<WizardSession, AppError> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(&id).ok_or_else(|| not_found(id))?;
        tracing::info!(wizard = %id, open = sessions.len(), "Wizard closed");
        Ok(removed)
    }

    /// Drop a session on the user's behalf. Refused while a submission is in
    /// flight, so a run created upstream is always reported back.
    pub async fn cancel(&self, id: Uuid) -> Result<(), AppError> {
        let now = self.clock.now_ms();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get(&id)
            .filter(|session| !session.is_expired(now, self.ttl_ms))
            .ok_or_else(|| not_found(id))?;
        if session.submitting {
            return Err(AppError::Conflict(format!(
                "Wizard {} is submitting and cannot be cancelled",
                id
            )));
        }
        sessions.remove(&id);
        tracing::info!(wizard = %id, open = sessions.len(), "Wizard cancelled");
        Ok(())
    }

    /// Drop every expired session. Returns how many were dropped.
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions, now)
    }

    fn sweep(&self, sessions: &mut HashMap<Uuid, WizardSession>, now_ms: u64) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now_ms, self.ttl_ms));
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::info!(swept, open = sessions.len(), "Expired wizards swept");
        }
        swept
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Wizard {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::models::{Pagination, SelectionKind};
    use crate::picker::ManualClock;

    const TTL_MS: u64 = 60_000;

    fn details() -> RunPayroll {
        RunPayroll {
            month: "March".to_string(),
            year: 2026,
            payroll_type: "monthly".to_string(),
            payroll_date: NaiveDate::from_ymd_opt(2026, 3, 28).unwrap(),
        }
    }

    fn session() -> WizardSession {
        WizardSession::new(&ScopeDefaults::default(), EmployeePicker::new(10, 400, 10_000))
    }

    fn page_with_total(total_docs: u64) -> EmployeePage {
        EmployeePage {
            employees: Vec::new(),
            pagination: Pagination { page: 1, per_page: 10, total_pages: 9, total_docs },
        }
    }

    fn store() -> (WizardStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (WizardStore::new(clock.clone(), TTL_MS), clock)
    }

    #[test]
    fn test_steps_require_details() {
        let mut wizard = session();
        assert_eq!(wizard.step(), WizardStep::Details);
        assert!(wizard.go_to(WizardStep::Review).is_err());

        wizard.set_details(details());
        assert_eq!(wizard.step(), WizardStep::Scope);
        wizard.go_to(WizardStep::Review).unwrap();
        wizard.go_to(WizardStep::Details).unwrap();
        assert_eq!(wizard.step(), WizardStep::Details);
    }

    #[test]
    fn test_submit_is_one_shot() {
        let mut wizard = session();
        wizard.set_details(details());

        let request = wizard.begin_submit().unwrap();
        assert!(request.employee_scope.all_employees);
        assert_eq!(wizard.begin_submit().unwrap_err().error_code(), "CONFLICT");

        wizard.abort_submit();
        assert!(wizard.begin_submit().is_ok());
    }

    #[test]
    fn test_submit_without_details_fails() {
        let mut wizard = session();
        let err = wizard.begin_submit().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!wizard.view().submitting);
    }

    #[test]
    fn test_empty_selection_is_still_submitted() {
        let mut wizard = session();
        wizard.set_details(details());
        wizard.scope.set_mode(SelectionMode::Department);

        let request = wizard.begin_submit().unwrap();
        assert!(request.employee_scope.by_department);
        assert!(request.employee_scope.departments.is_empty());
    }

    #[test]
    fn test_view_counts_from_recorded_options() {
        let mut wizard = session();
        wizard.record_options(
            EntityKind::Department,
            &[
                EntityOption { id: "eng".into(), name: "Engineering".into(), count: Some(12) },
                EntityOption { id: "sales".into(), name: "Sales".into(), count: Some(7) },
            ],
        );
        wizard.scope.set_mode(SelectionMode::Department);
        wizard.scope.toggle(SelectionKind::Department, &json!("eng"));
        wizard.scope.toggle(SelectionKind::Department, &json!("sales"));

        assert_eq!(wizard.view().current_count, Some(19));
    }

    #[test]
    fn test_unfiltered_page_sets_roster_total() {
        let mut wizard = session();
        let key = wizard.picker.tick(0).unwrap();
        wizard.apply_employee_page(&key, page_with_total(87), 0);

        assert_eq!(wizard.view().current_count, Some(87));
    }

    #[test]
    fn test_stale_unfiltered_page_keeps_roster_total() {
        let mut wizard = session();
        let key = wizard.picker.tick(0).unwrap();
        wizard.apply_employee_page(&key, page_with_total(87), 0);

        let old = wizard.picker.set_page(2, 0).unwrap();
        let new = wizard.picker.set_page(3, 0).unwrap();
        assert!(wizard.apply_employee_page(&old, page_with_total(5), 0).is_none());
        assert_eq!(wizard.view().current_count, Some(87));

        wizard.apply_employee_page(&new, page_with_total(90), 0);
        assert_eq!(wizard.view().current_count, Some(90));
    }

    #[tokio::test]
    async fn test_store_lifecycle() {
        let (store, _) = store();
        let view = store.insert(session()).await;

        let step = store.read(view.id, |s| s.step()).await.unwrap();
        assert_eq!(step, WizardStep::Details);

        store.update(view.id, |s| s.set_details(details())).await.unwrap();
        assert_eq!(store.read(view.id, |s| s.step()).await.unwrap(), WizardStep::Scope);

        store.remove(view.id).await.unwrap();
        assert!(store.read(view.id, |s| s.id()).await.is_err());
        assert!(store.remove(view.id).await.is_err());
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let (store, clock) = store();
        let idle = store.insert(session()).await;
        let active = store.insert(session()).await;

        clock.advance(TTL_MS - 1);
        store.read(active.id, |s| s.id()).await.unwrap();
        clock.advance(1);

        assert_eq!(
            store.read(idle.id, |s| s.id()).await.unwrap_err().error_code(),
            "NOT_FOUND"
        );
        assert!(store.update(idle.id, |s| s.id()).await.is_err());
        assert_eq!(store.sweep_expired().await, 0);
        assert!(store.read(active.id, |s| s.id()).await.is_ok());

        clock.advance(TTL_MS);
        assert_eq!(store.sweep_expired().await, 1);
    }

    #[tokio::test]
    async fn test_submitting_session_survives_ttl_and_cancel() {
        let (store, clock) = store();
        let view = store.insert(session()).await;
        store
            .update(view.id, |s| {
                s.set_details(details());
                s.begin_submit().map(|_| ())
            })
            .await
            .unwrap()
            .unwrap();

        clock.advance(TTL_MS * 2);
        assert_eq!(store.sweep_expired().await, 0);
        assert_eq!(store.cancel(view.id).await.unwrap_err().error_code(), "CONFLICT");

        store.update(view.id, |s| s.abort_submit()).await.unwrap();
        store.cancel(view.id).await.unwrap();
        assert!(store.read(view.id, |s| s.id()).await.is_err());
    }
}
