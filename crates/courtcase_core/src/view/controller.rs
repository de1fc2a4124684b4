//! Binds the case service to the collection view state.
//!
//! Each method marks the state busy, runs one service call and folds the
//! outcome back in. Failures are recorded as the state's error message and
//! also returned to the caller.

use crate::config::AppConfig;
use crate::model::case::{CaseId, CasePatch, CaseRecord};
use crate::model::case_form::CaseDraft;
use crate::model::identity::Identity;
use crate::repo::case_store::CaseStore;
use crate::service::case_service::{CaseError, CaseResult, CaseService};
use crate::view::case_view::CaseViewState;

pub struct CaseController<S: CaseStore> {
    service: CaseService<S>,
    state: CaseViewState,
}

impl<S: CaseStore> CaseController<S> {
    pub fn new(service: CaseService<S>) -> Self {
        Self::with_state(service, CaseViewState::default())
    }

    pub fn with_state(service: CaseService<S>, state: CaseViewState) -> Self {
        Self { service, state }
    }

    /// Empty state paged by the configured page size.
    pub fn from_config(service: CaseService<S>, config: &AppConfig) -> Self {
        Self::with_state(service, CaseViewState::with_page_size(config.page_size))
    }

    pub fn service(&self) -> &CaseService<S> {
        &self.service
    }

    pub fn state(&self) -> &CaseViewState {
        &self.state
    }

    /// Filter, sort and page setters go straight to the state.
    pub fn state_mut(&mut self) -> &mut CaseViewState {
        &mut self.state
    }

    /// Reloads the requester's active cases.
    pub fn refresh(&mut self, identity: Option<&Identity>) -> CaseResult<usize> {
        self.state.begin_request();
        let cases = self.run(|service| service.list(identity))?;
        let count = cases.len();
        self.state.cases_loaded(cases);
        Ok(count)
    }

    pub fn open_case(&mut self, identity: Option<&Identity>, id: &str) -> CaseResult<CaseRecord> {
        self.state.begin_request();
        let case = self.run(|service| service.get_by_id(identity, id))?;
        self.state.case_loaded(case.clone());
        Ok(case)
    }

    /// Validates the form locally before anything reaches the store.
    pub fn submit_new_case(
        &mut self,
        identity: Option<&Identity>,
        draft: CaseDraft,
    ) -> CaseResult<CaseRecord> {
        self.state.begin_request();
        let new_case = match draft.into_new_case() {
            Ok(new_case) => new_case,
            Err(err) => {
                let err = CaseError::from(err);
                self.state.request_failed(err.to_string());
                return Err(err);
            }
        };
        let case = self.run(|service| service.create(identity, new_case))?;
        self.state.case_created(case.clone());
        Ok(case)
    }

    pub fn update_case(
        &mut self,
        identity: Option<&Identity>,
        id: &str,
        patch: CasePatch,
    ) -> CaseResult<CaseRecord> {
        self.state.begin_request();
        let case = self.run(|service| service.update(identity, id, patch))?;
        self.state.case_updated(case.clone());
        Ok(case)
    }

    pub fn soft_delete_case(
        &mut self,
        identity: Option<&Identity>,
        id: &str,
    ) -> CaseResult<CaseRecord> {
        self.state.begin_request();
        let case = self.run(|service| service.soft_delete(identity, id))?;
        self.state.case_soft_deleted(case.clone());
        Ok(case)
    }

    pub fn restore_case(
        &mut self,
        identity: Option<&Identity>,
        id: &str,
    ) -> CaseResult<CaseRecord> {
        self.state.begin_request();
        let case = self.run(|service| service.restore(identity, id))?;
        self.state.case_restored(case.clone());
        Ok(case)
    }

    pub fn permanently_delete_case(
        &mut self,
        identity: Option<&Identity>,
        id: &str,
    ) -> CaseResult<CaseId> {
        self.state.begin_request();
        let removed = self.run(|service| service.permanently_delete(identity, id))?;
        self.state.case_permanently_deleted(&removed);
        Ok(removed)
    }

    pub fn export_case(&mut self, identity: Option<&Identity>, id: &str) -> CaseResult<String> {
        self.state.begin_request();
        let json = self.run(|service| service.export_case(identity, id))?;
        self.state.loading = false;
        Ok(json)
    }

    fn run<T>(
        &mut self,
        call: impl FnOnce(&CaseService<S>) -> CaseResult<T>,
    ) -> CaseResult<T> {
        call(&self.service).map_err(|err| {
            self.state.request_failed(err.to_string());
            err
        })
    }
}
