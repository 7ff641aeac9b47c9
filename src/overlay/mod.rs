//! Overlay store and resolver
//!
//! The overlay holds everything a user layers on top of the base catalog:
//! newly created areas, newly created problems, and partial-field edits
//! keyed by base entity id. `resolve()` is the single merge point that turns
//! base + overlay into the live catalog view with recomputed aggregates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::catalog::{
    Area, AreaCore, AreaPriority, BaseCatalog, CatalogError, CatalogSource, CostRange, Horizon,
    Impact, Problem, RoiRange,
};
use crate::roi;

pub mod patch;

pub use patch::{AreaEdit, AreaPatch, CustomMeta, ProblemEdit, ProblemPatch};

/// A user-created area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomArea {
    #[serde(flatten)]
    pub core: AreaCore,

    #[serde(flatten)]
    pub meta: CustomMeta,
}

/// A user-created problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomProblem {
    #[serde(flatten)]
    pub problem: Problem,

    #[serde(flatten)]
    pub meta: CustomMeta,
}

/// The serializable mutable half of the overlay.
///
/// Edit maps hold at most one record per base entity id; custom collections
/// keep creation order, which the resolver preserves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_areas: Vec<CustomArea>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_problems: Vec<CustomProblem>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub area_edits: BTreeMap<String, AreaEdit>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub problem_edits: BTreeMap<String, ProblemEdit>,
}

/// Fields for a new area; `id` defaults to [`OverlayStore::next_area_id`]
#[derive(Debug, Clone, Default)]
pub struct NewArea {
    pub id: Option<String>,
    pub code: String,
    pub name: String,
    pub description: String,
    pub priority: AreaPriority,
}

/// Fields for a new problem; `id` defaults to [`OverlayStore::next_problem_id`]
#[derive(Debug, Clone, Default)]
pub struct NewProblem {
    pub id: Option<String>,
    pub area_id: String,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub urgency: Horizon,
    pub causes: Vec<String>,
    pub evidence: Vec<String>,
    pub proposed_solution: String,
    pub implementation_steps: Vec<String>,
    pub cost: CostRange,
    pub roi: RoiRange,
    pub dependencies: Vec<String>,
    pub tags: Vec<String>,
}

/// Errors from overlay operations
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no area with id '{0}' in the resolved catalog")]
    AreaNotFound(String),

    #[error("no problem with id '{0}' in the resolved catalog")]
    ProblemNotFound(String),

    #[error("id '{0}' already exists in the resolved catalog")]
    DuplicateId(String),
}

/// Owns the overlay deltas and merges them with the base catalog
#[derive(Debug)]
pub struct OverlayStore {
    base: BaseCatalog,
    state: OverlayState,
}

impl OverlayStore {
    pub fn new(base: BaseCatalog) -> Self {
        Self {
            base,
            state: OverlayState::default(),
        }
    }

    pub fn with_state(base: BaseCatalog, state: OverlayState) -> Self {
        Self { base, state }
    }

    pub fn base(&self) -> &BaseCatalog {
        &self.base
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    /// Replace the whole overlay (import path)
    pub fn replace_state(&mut self, state: OverlayState) {
        self.state = state;
    }

    /// Drop every custom entity and edit record
    pub fn clear(&mut self) {
        self.state = OverlayState::default();
    }

    /// Merge base + overlay into the live catalog view.
    ///
    /// Pure projection: base areas first in catalog order, then custom areas
    /// in creation order; within an area, base problems (edits applied) in
    /// catalog order, then custom problems in creation order. Summaries are
    /// recomputed from the merged problem list on every call.
    pub fn resolve(&self) -> Vec<Area> {
        let mut areas = Vec::with_capacity(self.base.areas().len() + self.state.custom_areas.len());

        for base_area in self.base.areas() {
            let mut core = base_area.core.clone();
            if let Some(edit) = self.state.area_edits.get(&core.id) {
                edit.changes.apply(&mut core);
            }

            let mut problems: Vec<Problem> = base_area
                .problems
                .iter()
                .map(|p| {
                    let mut p = p.clone();
                    if let Some(edit) = self.state.problem_edits.get(&p.id) {
                        edit.changes.apply(&mut p);
                    }
                    p
                })
                .collect();
            problems.extend(self.custom_problems_for(&core.id));

            let summary = roi::area_summary(&problems);
            areas.push(Area {
                core,
                is_custom: false,
                problems,
                summary,
            });
        }

        for custom in &self.state.custom_areas {
            let problems = self.custom_problems_for(&custom.core.id);
            let summary = roi::area_summary(&problems);
            areas.push(Area {
                core: custom.core.clone(),
                is_custom: true,
                problems,
                summary,
            });
        }

        areas
    }

    /// Resolve a single area by id
    pub fn resolve_area(&self, id: &str) -> Option<Area> {
        self.resolve().into_iter().find(|a| a.core.id == id)
    }

    /// Find a problem anywhere in the resolved catalog
    pub fn resolve_problem(&self, id: &str) -> Option<Problem> {
        self.resolve()
            .into_iter()
            .flat_map(|a| a.problems)
            .find(|p| p.id == id)
    }

    fn custom_problems_for(&self, area_id: &str) -> Vec<Problem> {
        self.state
            .custom_problems
            .iter()
            .filter(|c| c.problem.area_id == area_id)
            .map(|c| c.problem.clone())
            .collect()
    }

    fn resolved_area_ids(&self) -> Vec<String> {
        self.base
            .areas()
            .iter()
            .map(|a| a.core.id.clone())
            .chain(self.state.custom_areas.iter().map(|a| a.core.id.clone()))
            .collect()
    }

    fn is_custom_area(&self, id: &str) -> bool {
        self.state.custom_areas.iter().any(|a| a.core.id == id)
    }

    fn is_custom_problem(&self, id: &str) -> bool {
        self.state.custom_problems.iter().any(|p| p.problem.id == id)
    }

    /// Next generated area id, distinct from every currently resolved one
    pub fn next_area_id(&self) -> String {
        let taken = self.resolved_area_ids();
        let mut n = self.state.custom_areas.len() + 1;
        loop {
            let candidate = format!("custom-{}", n);
            if !taken.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Next problem id for an area: `<code>-<resolved count + 1>`.
    ///
    /// The suffix derives from the current resolved count, so deleting and
    /// re-adding problems can produce an id that collides with a surviving
    /// one. That numbering is kept as observed; `create_problem` rejects the
    /// collision instead of overwriting, and callers may supply explicit ids.
    pub fn next_problem_id(&self, area_id: &str) -> Result<String, OverlayError> {
        let area = self
            .resolve_area(area_id)
            .ok_or_else(|| OverlayError::AreaNotFound(area_id.to_string()))?;
        Ok(format!("{}-{}", area.core.code, area.problems.len() + 1))
    }

    /// Append a custom area; returns its id
    pub fn create_area(&mut self, new: NewArea, author: &str) -> Result<String, OverlayError> {
        if new.code.trim().is_empty() {
            return Err(OverlayError::Validation("area code must not be empty".into()));
        }
        if new.name.trim().is_empty() {
            return Err(OverlayError::Validation("area name must not be empty".into()));
        }

        let id = new.id.unwrap_or_else(|| self.next_area_id());
        if self.resolved_area_ids().contains(&id) {
            return Err(OverlayError::DuplicateId(id));
        }

        self.state.custom_areas.push(CustomArea {
            core: AreaCore {
                id: id.clone(),
                code: new.code,
                name: new.name,
                description: new.description,
                priority: new.priority,
            },
            meta: CustomMeta::new(author),
        });
        Ok(id)
    }

    /// Append a custom problem; returns its id
    pub fn create_problem(&mut self, new: NewProblem, author: &str) -> Result<String, OverlayError> {
        if new.title.trim().is_empty() {
            return Err(OverlayError::Validation(
                "problem title must not be empty".into(),
            ));
        }
        if !new.cost.is_valid() {
            return Err(OverlayError::Validation(format!(
                "cost range must satisfy 0 <= min <= max (got {}..{})",
                new.cost.min, new.cost.max
            )));
        }
        if !new.roi.is_valid() {
            return Err(OverlayError::Validation(format!(
                "roi range must satisfy 0 <= min <= max (got {}..{})",
                new.roi.min, new.roi.max
            )));
        }
        if self.resolve_area(&new.area_id).is_none() {
            return Err(OverlayError::AreaNotFound(new.area_id));
        }

        let id = match new.id {
            Some(id) => id,
            None => self.next_problem_id(&new.area_id)?,
        };
        if self.resolve_problem(&id).is_some() {
            return Err(OverlayError::DuplicateId(id));
        }

        let mut tags: Vec<String> = Vec::with_capacity(new.tags.len());
        for tag in new.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let problem = Problem {
            id: id.clone(),
            area_id: new.area_id,
            title: new.title,
            description: new.description,
            impact: new.impact,
            urgency: new.urgency,
            causes: new.causes,
            evidence: new.evidence,
            proposed_solution: new.proposed_solution,
            implementation_steps: new.implementation_steps,
            cost: new.cost,
            roi: new.roi,
            dependencies: new.dependencies,
            tags,
        };

        self.state.custom_problems.push(CustomProblem {
            problem,
            meta: CustomMeta::new(author),
        });
        Ok(id)
    }

    /// Edit an area: custom areas are mutated in place, base areas get an
    /// accumulated edit record
    pub fn update_area(
        &mut self,
        id: &str,
        patch: AreaPatch,
        author: &str,
    ) -> Result<(), OverlayError> {
        if let Some(code) = &patch.code {
            if code.trim().is_empty() {
                return Err(OverlayError::Validation("area code must not be empty".into()));
            }
        }

        if let Some(custom) = self
            .state
            .custom_areas
            .iter_mut()
            .find(|a| a.core.id == id)
        {
            patch.apply(&mut custom.core);
            custom.meta.touch(author);
            return Ok(());
        }

        if self.base.area(id).is_none() {
            return Err(OverlayError::AreaNotFound(id.to_string()));
        }

        self.upsert_area_edit(id, patch, author);
        Ok(())
    }

    /// Edit a problem: custom problems are mutated in place, base problems
    /// get an accumulated edit record. Applying the same patch twice yields
    /// the same resolved state.
    pub fn update_problem(
        &mut self,
        id: &str,
        patch: ProblemPatch,
        author: &str,
    ) -> Result<(), OverlayError> {
        if let Some(cost) = &patch.cost {
            if !cost.is_valid() {
                return Err(OverlayError::Validation(format!(
                    "cost range must satisfy 0 <= min <= max (got {}..{})",
                    cost.min, cost.max
                )));
            }
        }
        if let Some(roi) = &patch.roi {
            if !roi.is_valid() {
                return Err(OverlayError::Validation(format!(
                    "roi range must satisfy 0 <= min <= max (got {}..{})",
                    roi.min, roi.max
                )));
            }
        }
        if let Some(area_id) = &patch.area_id {
            if self.resolve_area(area_id).is_none() {
                return Err(OverlayError::AreaNotFound(area_id.clone()));
            }
        }

        if let Some(custom) = self
            .state
            .custom_problems
            .iter_mut()
            .find(|p| p.problem.id == id)
        {
            patch.apply(&mut custom.problem);
            custom.meta.touch(author);
            return Ok(());
        }

        if self.base.problem(id).is_none() {
            return Err(OverlayError::ProblemNotFound(id.to_string()));
        }

        self.upsert_problem_edit(id, patch, author);
        Ok(())
    }

    /// Delete an area.
    ///
    /// Custom areas are removed permanently along with their custom problems.
    /// For a base area only the edit record is dropped; the base area itself
    /// always remains resolvable. No-op (returns false) on unknown ids.
    pub fn delete_area(&mut self, id: &str) -> bool {
        if self.is_custom_area(id) {
            self.state.custom_areas.retain(|a| a.core.id != id);
            self.state.custom_problems.retain(|p| p.problem.area_id != id);
            self.state.area_edits.remove(id);
            return true;
        }
        self.state.area_edits.remove(id).is_some()
    }

    /// Delete a problem.
    ///
    /// Custom problems are removed permanently; for a base problem only its
    /// edit record (the customization) is discarded. No-op on unknown ids.
    pub fn delete_problem(&mut self, id: &str) -> bool {
        if self.is_custom_problem(id) {
            self.state.custom_problems.retain(|p| p.problem.id != id);
            self.state.problem_edits.remove(id);
            return true;
        }
        self.state.problem_edits.remove(id).is_some()
    }

    fn upsert_area_edit(&mut self, id: &str, patch: AreaPatch, author: &str) {
        self.state
            .area_edits
            .entry(id.to_string())
            .and_modify(|edit| {
                edit.changes.merge(patch.clone());
                edit.edited_at = chrono::Utc::now();
                edit.edited_by = author.to_string();
            })
            .or_insert_with(|| AreaEdit {
                target_id: id.to_string(),
                changes: patch,
                edited_at: chrono::Utc::now(),
                edited_by: author.to_string(),
            });
    }

    fn upsert_problem_edit(&mut self, id: &str, patch: ProblemPatch, author: &str) {
        self.state
            .problem_edits
            .entry(id.to_string())
            .and_modify(|edit| {
                edit.changes.merge(patch.clone());
                edit.edited_at = chrono::Utc::now();
                edit.edited_by = author.to_string();
            })
            .or_insert_with(|| ProblemEdit {
                target_id: id.to_string(),
                changes: patch,
                edited_at: chrono::Utc::now(),
                edited_by: author.to_string(),
            });
    }
}

impl CatalogSource for OverlayStore {
    fn catalog(&self) -> Result<Vec<Area>, CatalogError> {
        Ok(self.resolve())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> OverlayStore {
        let yaml = r#"
areas:
  - id: alpha
    code: ALP
    name: Alpha
    priority: high
    problems:
      - id: ALP-1
        area_id: alpha
        title: First
        cost: { min: 1000, max: 2000 }
        roi: { min: 50, max: 100 }
      - id: ALP-2
        area_id: alpha
        title: Second
        cost: { min: 500, max: 500 }
        roi: { min: 20, max: 40 }
  - id: beta
    code: BET
    name: Beta
    problems: []
"#;
        OverlayStore::new(BaseCatalog::from_yaml(yaml).unwrap())
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut store = fixture();
        store
            .update_problem(
                "ALP-1",
                ProblemPatch {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();

        let first = store.resolve();
        let second = store.resolve();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolver_ordering() {
        let mut store = fixture();
        store
            .create_area(
                NewArea {
                    code: "GAM".to_string(),
                    name: "Gamma".to_string(),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();
        store
            .create_problem(
                NewProblem {
                    area_id: "alpha".to_string(),
                    title: "Appended".to_string(),
                    cost: CostRange {
                        min: 1.0,
                        max: 2.0,
                        currency: "EUR".to_string(),
                    },
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();

        let areas = store.resolve();
        let ids: Vec<&str> = areas.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["alpha", "beta", "custom-1"]);

        // Base problems first in catalog order, then customs
        let alpha = &areas[0];
        let pids: Vec<&str> = alpha.problems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(pids, vec!["ALP-1", "ALP-2", "ALP-3"]);
    }

    #[test]
    fn test_edit_merge_monotonicity() {
        let mut store = fixture();
        store
            .update_problem(
                "ALP-1",
                ProblemPatch {
                    title: Some("A".to_string()),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();
        store
            .update_problem(
                "ALP-1",
                ProblemPatch {
                    description: Some("B".to_string()),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();

        let p = store.resolve_problem("ALP-1").unwrap();
        assert_eq!(p.title, "A");
        assert_eq!(p.description, "B");

        store
            .update_problem(
                "ALP-1",
                ProblemPatch {
                    title: Some("C".to_string()),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();
        let p = store.resolve_problem("ALP-1").unwrap();
        assert_eq!(p.title, "C");
        assert_eq!(p.description, "B");

        // Still exactly one edit record for the base problem
        assert_eq!(store.state().problem_edits.len(), 1);
    }

    #[test]
    fn test_summary_consistency_after_mutations() {
        let mut store = fixture();
        store
            .update_problem(
                "ALP-2",
                ProblemPatch {
                    cost: Some(CostRange {
                        min: 1000.0,
                        max: 3000.0,
                        currency: "EUR".to_string(),
                    }),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();

        let alpha = store.resolve_area("alpha").unwrap();
        let expect_min: f64 = alpha.problems.iter().map(|p| p.cost.min).sum();
        let expect_savings: f64 = alpha
            .problems
            .iter()
            .map(|p| (p.cost.max * p.roi.max / 100.0).round())
            .sum();
        assert_eq!(alpha.summary.investment_min, expect_min);
        assert_eq!(alpha.summary.savings_max, expect_savings);
        assert_eq!(alpha.summary.problem_count, alpha.problems.len());
    }

    #[test]
    fn test_delete_custom_area_cascades() {
        let mut store = fixture();
        let area_id = store
            .create_area(
                NewArea {
                    code: "GAM".to_string(),
                    name: "Gamma".to_string(),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();
        let pid = store
            .create_problem(
                NewProblem {
                    area_id: area_id.clone(),
                    title: "Orphan candidate".to_string(),
                    cost: CostRange::default(),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();

        assert!(store.delete_area(&area_id));
        assert!(store.resolve_area(&area_id).is_none());
        assert!(store.resolve_problem(&pid).is_none());
        // No orphaned custom problem retains the dangling area id
        assert!(store.state().custom_problems.is_empty());
    }

    #[test]
    fn test_delete_base_problem_only_discards_edit() {
        let mut store = fixture();
        store
            .update_problem(
                "ALP-1",
                ProblemPatch {
                    title: Some("Customized".to_string()),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();

        assert!(store.delete_problem("ALP-1"));
        // The base problem survives with its seed title
        let p = store.resolve_problem("ALP-1").unwrap();
        assert_eq!(p.title, "First");
        // A second delete has nothing left to discard
        assert!(!store.delete_problem("ALP-1"));
    }

    #[test]
    fn test_create_problem_rejects_bad_input() {
        let mut store = fixture();

        let err = store
            .create_problem(
                NewProblem {
                    area_id: "nowhere".to_string(),
                    title: "t".to_string(),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap_err();
        assert!(matches!(err, OverlayError::AreaNotFound(_)));

        let err = store
            .create_problem(
                NewProblem {
                    area_id: "alpha".to_string(),
                    title: "t".to_string(),
                    cost: CostRange {
                        min: 10.0,
                        max: 5.0,
                        currency: "EUR".to_string(),
                    },
                    ..Default::default()
                },
                "alice",
            )
            .unwrap_err();
        assert!(matches!(err, OverlayError::Validation(_)));

        let err = store
            .create_problem(
                NewProblem {
                    id: Some("ALP-1".to_string()),
                    area_id: "alpha".to_string(),
                    title: "t".to_string(),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap_err();
        assert!(matches!(err, OverlayError::DuplicateId(_)));
    }

    #[test]
    fn test_update_missing_signals_not_found() {
        let mut store = fixture();
        let err = store
            .update_problem("ZZZ-9", ProblemPatch::default(), "alice")
            .unwrap_err();
        assert!(matches!(err, OverlayError::ProblemNotFound(_)));
    }

    #[test]
    fn test_next_ids() {
        let mut store = fixture();
        assert_eq!(store.next_problem_id("alpha").unwrap(), "ALP-3");
        assert_eq!(store.next_area_id(), "custom-1");

        store
            .create_area(
                NewArea {
                    code: "GAM".to_string(),
                    name: "Gamma".to_string(),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();
        assert_eq!(store.next_area_id(), "custom-2");
        assert_eq!(store.next_problem_id("custom-1").unwrap(), "GAM-1");
    }

    #[test]
    fn test_area_edit_changes_problem_id_prefixing() {
        let mut store = fixture();
        store
            .update_area(
                "beta",
                AreaPatch {
                    code: Some("BTA".to_string()),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();
        // next_problem_id follows the resolved (edited) code
        assert_eq!(store.next_problem_id("beta").unwrap(), "BTA-1");
    }
}
