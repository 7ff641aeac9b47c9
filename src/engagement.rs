//! The engagement service: one catalog, one overlay, one tracking set
//!
//! Owns the stores explicitly (no global state) and pushes every mutation to
//! the persistence boundary fire-and-forget: a failed durable write is
//! remembered and reportable, but never rolls back the in-memory mutation.

use thiserror::Error;

use crate::catalog::{Area, BaseCatalog, Problem};
use crate::overlay::{
    AreaPatch, NewArea, NewProblem, OverlayError, OverlayStore, ProblemPatch,
};
use crate::persist::{Bundle, BundleError, NullStore, PersistError, Persistence, PersistedState};
use crate::roi::{self, EffectiveRoi};
use crate::tracking::{
    CustomCost, DatePatch, FollowUp, FollowUpKind, InternalPriority, ProblemTracking, RoiScenario,
    Status, TrackingError, TrackingStore,
};

/// Errors surfaced to the engagement's caller
#[derive(Debug, Error)]
pub enum EngagementError {
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("no problem with id '{0}' in the resolved catalog")]
    ProblemNotFound(String),
}

pub struct Engagement {
    overlay: OverlayStore,
    tracking: TrackingStore,
    persistence: Box<dyn Persistence>,
    last_save_error: Option<PersistError>,
}

impl Engagement {
    /// Open against a durable medium, restoring any previously saved state
    pub fn open(
        base: BaseCatalog,
        persistence: Box<dyn Persistence>,
    ) -> Result<Self, PersistError> {
        let state = persistence.load()?.unwrap_or_default();
        Ok(Self {
            overlay: OverlayStore::with_state(base, state.overlay),
            tracking: TrackingStore::with_state(state.tracking),
            persistence,
            last_save_error: None,
        })
    }

    /// Ephemeral engagement with no durable medium (tests, dry runs)
    pub fn in_memory(base: BaseCatalog) -> Self {
        Self {
            overlay: OverlayStore::new(base),
            tracking: TrackingStore::new(),
            persistence: Box::new(NullStore),
            last_save_error: None,
        }
    }

    pub fn overlay(&self) -> &OverlayStore {
        &self.overlay
    }

    pub fn tracking_store(&self) -> &TrackingStore {
        &self.tracking
    }

    fn snapshot(&self) -> PersistedState {
        PersistedState {
            overlay: self.overlay.state().clone(),
            tracking: self.tracking.state().clone(),
        }
    }

    /// Write the current state to the durable medium
    pub fn save(&self) -> Result<(), PersistError> {
        self.persistence.save(&self.snapshot())
    }

    fn autosave(&mut self) {
        if let Err(e) = self.save() {
            self.last_save_error = Some(e);
        }
    }

    /// A durable-write failure left over from the last mutation, if any.
    /// The mutation itself is always live in memory.
    pub fn take_save_error(&mut self) -> Option<PersistError> {
        self.last_save_error.take()
    }

    // ---- catalog view ----

    pub fn resolve(&self) -> Vec<Area> {
        self.overlay.resolve()
    }

    pub fn resolve_area(&self, id: &str) -> Option<Area> {
        self.overlay.resolve_area(id)
    }

    pub fn resolve_problem(&self, id: &str) -> Option<Problem> {
        self.overlay.resolve_problem(id)
    }

    fn ensure_problem(&self, id: &str) -> Result<Problem, EngagementError> {
        self.overlay
            .resolve_problem(id)
            .ok_or_else(|| EngagementError::ProblemNotFound(id.to_string()))
    }

    // ---- overlay mutations ----

    pub fn create_area(&mut self, new: NewArea, author: &str) -> Result<String, EngagementError> {
        let id = self.overlay.create_area(new, author)?;
        self.autosave();
        Ok(id)
    }

    pub fn update_area(
        &mut self,
        id: &str,
        patch: AreaPatch,
        author: &str,
    ) -> Result<(), EngagementError> {
        self.overlay.update_area(id, patch, author)?;
        self.autosave();
        Ok(())
    }

    /// Delete a custom area (cascading) or discard a base area's edits.
    /// Tracking records of removed problems stay untouched; they simply no
    /// longer resolve.
    pub fn delete_area(&mut self, id: &str) -> bool {
        let removed = self.overlay.delete_area(id);
        if removed {
            self.autosave();
        }
        removed
    }

    pub fn create_problem(
        &mut self,
        new: NewProblem,
        author: &str,
    ) -> Result<String, EngagementError> {
        let id = self.overlay.create_problem(new, author)?;
        self.autosave();
        Ok(id)
    }

    pub fn update_problem(
        &mut self,
        id: &str,
        patch: ProblemPatch,
        author: &str,
    ) -> Result<(), EngagementError> {
        self.overlay.update_problem(id, patch, author)?;
        self.autosave();
        Ok(())
    }

    pub fn delete_problem(&mut self, id: &str) -> bool {
        let removed = self.overlay.delete_problem(id);
        if removed {
            self.autosave();
        }
        removed
    }

    pub fn next_problem_id(&self, area_id: &str) -> Result<String, EngagementError> {
        Ok(self.overlay.next_problem_id(area_id)?)
    }

    // ---- tracking ----

    /// Read-only tracking lookup; does not create a record
    pub fn tracking(&self, problem_id: &str) -> Option<&ProblemTracking> {
        self.tracking.get(problem_id)
    }

    /// Fetch (and persist) the tracking record for a resolvable problem,
    /// creating it with defaults on first access
    pub fn tracking_record(
        &mut self,
        problem_id: &str,
    ) -> Result<ProblemTracking, EngagementError> {
        self.ensure_problem(problem_id)?;
        let created = self.tracking.get(problem_id).is_none();
        let record = self.tracking.get_or_create(problem_id).clone();
        if created {
            self.autosave();
        }
        Ok(record)
    }

    pub fn set_status(
        &mut self,
        problem_id: &str,
        status: Status,
    ) -> Result<ProblemTracking, EngagementError> {
        self.ensure_problem(problem_id)?;
        let record = self.tracking.set_status(problem_id, status).clone();
        self.autosave();
        Ok(record)
    }

    pub fn set_progress(
        &mut self,
        problem_id: &str,
        value: i64,
    ) -> Result<ProblemTracking, EngagementError> {
        self.ensure_problem(problem_id)?;
        let record = self.tracking.set_progress(problem_id, value).clone();
        self.autosave();
        Ok(record)
    }

    pub fn set_assignee(
        &mut self,
        problem_id: &str,
        assignee: Option<String>,
    ) -> Result<ProblemTracking, EngagementError> {
        self.ensure_problem(problem_id)?;
        let record = self.tracking.set_assignee(problem_id, assignee).clone();
        self.autosave();
        Ok(record)
    }

    pub fn set_priority(
        &mut self,
        problem_id: &str,
        priority: InternalPriority,
    ) -> Result<ProblemTracking, EngagementError> {
        self.ensure_problem(problem_id)?;
        let record = self.tracking.set_priority(problem_id, priority).clone();
        self.autosave();
        Ok(record)
    }

    pub fn set_dates(
        &mut self,
        problem_id: &str,
        patch: DatePatch,
    ) -> Result<ProblemTracking, EngagementError> {
        self.ensure_problem(problem_id)?;
        let record = self.tracking.set_dates(problem_id, patch).clone();
        self.autosave();
        Ok(record)
    }

    pub fn set_custom_cost(
        &mut self,
        problem_id: &str,
        cost: Option<CustomCost>,
    ) -> Result<ProblemTracking, EngagementError> {
        self.ensure_problem(problem_id)?;
        let record = self.tracking.set_custom_cost(problem_id, cost)?.clone();
        self.autosave();
        Ok(record)
    }

    pub fn add_follow_up(
        &mut self,
        problem_id: &str,
        kind: FollowUpKind,
        content: &str,
        author: &str,
    ) -> Result<FollowUp, EngagementError> {
        self.ensure_problem(problem_id)?;
        let follow_up = self
            .tracking
            .add_follow_up(problem_id, kind, content, author)?
            .clone();
        self.autosave();
        Ok(follow_up)
    }

    pub fn delete_follow_up(&mut self, problem_id: &str, follow_up_id: &str) -> bool {
        let removed = self.tracking.delete_follow_up(problem_id, follow_up_id);
        if removed {
            self.autosave();
        }
        removed
    }

    /// Catalog ROI with the tracking cost override applied
    pub fn effective_roi(&self, problem_id: &str) -> Result<EffectiveRoi, EngagementError> {
        let problem = self.ensure_problem(problem_id)?;
        let custom = self
            .tracking
            .get(problem_id)
            .and_then(|t| t.custom_cost.as_ref());
        Ok(roi::effective_roi(&problem.cost, &problem.roi, custom))
    }

    // ---- ROI scenarios ----

    pub fn scenarios(&self, problem_id: &str) -> &[RoiScenario] {
        self.tracking.scenarios(problem_id)
    }

    pub fn save_scenario(
        &mut self,
        problem_id: &str,
        scenario: RoiScenario,
    ) -> Result<RoiScenario, EngagementError> {
        self.ensure_problem(problem_id)?;
        let saved = self.tracking.save_scenario(problem_id, scenario).clone();
        self.autosave();
        Ok(saved)
    }

    pub fn delete_scenario(&mut self, problem_id: &str, scenario_id: &str) -> bool {
        let removed = self.tracking.delete_scenario(problem_id, scenario_id);
        if removed {
            self.autosave();
        }
        removed
    }

    // ---- export / import / reset ----

    pub fn export_bundle(&self) -> Bundle {
        Bundle::new(self.overlay.state().clone(), self.tracking.state().clone())
    }

    pub fn export_json(&self) -> Result<String, EngagementError> {
        Ok(self.export_bundle().to_json()?)
    }

    /// Replace overlay and tracking state from a bundle document.
    ///
    /// Validation happens before anything is applied; on error the existing
    /// state is untouched. The tracking section is a full replace, never a
    /// merge.
    pub fn import_json(&mut self, raw: &str) -> Result<(), EngagementError> {
        let bundle = Bundle::from_json(raw)?;
        self.overlay.replace_state(bundle.problems);
        self.tracking.replace_state(bundle.tracking);
        self.autosave();
        Ok(())
    }

    /// Discard all custom data: overlay, tracking, scenarios, and the
    /// durable blob. Irreversible; callers confirm before invoking.
    pub fn reset(&mut self) -> Result<(), EngagementError> {
        self.overlay.clear();
        self.tracking.clear();
        self.persistence.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CostRange;
    use crate::persist::FileStore;
    use tempfile::tempdir;

    fn base() -> BaseCatalog {
        BaseCatalog::from_yaml(
            r#"
areas:
  - id: alpha
    code: ALP
    name: Alpha
    problems:
      - id: ALP-1
        area_id: alpha
        title: First
        cost: { min: 1000, max: 2000 }
        roi: { min: 100, max: 200 }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_tracking_requires_resolvable_problem() {
        let mut eng = Engagement::in_memory(base());
        let err = eng.set_status("NOPE-1", Status::Analyzing).unwrap_err();
        assert!(matches!(err, EngagementError::ProblemNotFound(_)));

        eng.set_status("ALP-1", Status::InProgress).unwrap();
        assert_eq!(eng.tracking("ALP-1").unwrap().status, Status::InProgress);
    }

    #[test]
    fn test_effective_roi_uses_override() {
        let mut eng = Engagement::in_memory(base());
        let eff = eng.effective_roi("ALP-1").unwrap();
        assert!(!eff.is_adjusted);
        assert_eq!(eff.min, 100.0);

        eng.set_custom_cost(
            "ALP-1",
            Some(CustomCost {
                min: 500.0,
                max: 2000.0,
                notes: None,
            }),
        )
        .unwrap();
        let eff = eng.effective_roi("ALP-1").unwrap();
        assert!(eff.is_adjusted);
        assert_eq!(eff.min, 200.0);
        assert_eq!(eff.max, 200.0);
    }

    #[test]
    fn test_state_survives_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.json");

        {
            let store = FileStore::new(&path);
            let mut eng = Engagement::open(base(), Box::new(store)).unwrap();
            eng.set_progress("ALP-1", 40).unwrap();
            eng.add_follow_up("ALP-1", FollowUpKind::Note, "kickoff", "alice")
                .unwrap();
            assert!(eng.take_save_error().is_none());
        }

        let store = FileStore::new(&path);
        let eng = Engagement::open(base(), Box::new(store)).unwrap();
        let record = eng.tracking("ALP-1").unwrap();
        assert_eq!(record.progress, 40);
        assert_eq!(record.follow_ups.len(), 1);
    }

    #[test]
    fn test_export_clear_import_round_trip() {
        let mut eng = Engagement::in_memory(base());
        eng.create_problem(
            NewProblem {
                area_id: "alpha".to_string(),
                title: "Custom".to_string(),
                cost: CostRange::default(),
                ..Default::default()
            },
            "alice",
        )
        .unwrap();
        eng.set_status("ALP-1", Status::Completed).unwrap();
        eng.save_scenario("ALP-1", RoiScenario::new(100.0, 50.0, None))
            .unwrap();

        let exported = eng.export_json().unwrap();
        let resolved_before = eng.resolve();

        eng.reset().unwrap();
        assert_eq!(eng.resolve()[0].problems.len(), 1);
        assert!(eng.tracking("ALP-1").is_none());

        eng.import_json(&exported).unwrap();
        assert_eq!(eng.resolve(), resolved_before);
        assert_eq!(eng.tracking("ALP-1").unwrap().status, Status::Completed);
        assert_eq!(eng.scenarios("ALP-1").len(), 1);
    }

    #[test]
    fn test_malformed_import_leaves_state_untouched() {
        let mut eng = Engagement::in_memory(base());
        eng.set_progress("ALP-1", 70).unwrap();
        let before = eng.export_bundle();

        let err = eng
            .import_json(r#"{ "applicationName": "remtrack" }"#)
            .unwrap_err();
        assert!(matches!(err, EngagementError::Bundle(_)));

        let after = eng.export_bundle();
        assert_eq!(after.problems, before.problems);
        assert_eq!(after.tracking, before.tracking);
    }
}
