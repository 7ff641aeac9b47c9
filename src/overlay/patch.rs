//! Typed partial updates and edit records
//!
//! Edits against base entities are stored as patches, one record per target
//! id. Re-editing merges field-wise with last-write-wins semantics, so the
//! resolved view only ever sees the accumulated patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{AreaCore, AreaPriority, CostRange, Horizon, Impact, Problem, RoiRange};

/// Creation/update stamps carried by overlay entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomMeta {
    pub created_at: DateTime<Utc>,
    pub created_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl CustomMeta {
    pub fn new(author: &str) -> Self {
        Self {
            created_at: Utc::now(),
            created_by: author.to_string(),
            updated_at: None,
            updated_by: None,
        }
    }

    pub fn touch(&mut self, author: &str) {
        self.updated_at = Some(Utc::now());
        self.updated_by = Some(author.to_string());
    }
}

/// Partial update for an area; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<AreaPriority>,
}

impl AreaPatch {
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.priority.is_none()
    }

    /// Fold a later patch into this one (later fields win)
    pub fn merge(&mut self, later: AreaPatch) {
        if later.code.is_some() {
            self.code = later.code;
        }
        if later.name.is_some() {
            self.name = later.name;
        }
        if later.description.is_some() {
            self.description = later.description;
        }
        if later.priority.is_some() {
            self.priority = later.priority;
        }
    }

    /// Overwrite the set fields on the target area
    pub fn apply(&self, core: &mut AreaCore) {
        if let Some(code) = &self.code {
            core.code = code.clone();
        }
        if let Some(name) = &self.name {
            core.name = name.clone();
        }
        if let Some(description) = &self.description {
            core.description = description.clone();
        }
        if let Some(priority) = self.priority {
            core.priority = priority;
        }
    }
}

/// Partial update for a problem; list fields are replaced wholesale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Horizon>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub causes: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_solution: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_steps: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostRange>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<RoiRange>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ProblemPatch {
    pub fn is_empty(&self) -> bool {
        self == &ProblemPatch::default()
    }

    pub fn merge(&mut self, later: ProblemPatch) {
        macro_rules! take {
            ($field:ident) => {
                if later.$field.is_some() {
                    self.$field = later.$field;
                }
            };
        }
        take!(area_id);
        take!(title);
        take!(description);
        take!(impact);
        take!(urgency);
        take!(causes);
        take!(evidence);
        take!(proposed_solution);
        take!(implementation_steps);
        take!(cost);
        take!(roi);
        take!(dependencies);
        take!(tags);
    }

    pub fn apply(&self, problem: &mut Problem) {
        if let Some(area_id) = &self.area_id {
            problem.area_id = area_id.clone();
        }
        if let Some(title) = &self.title {
            problem.title = title.clone();
        }
        if let Some(description) = &self.description {
            problem.description = description.clone();
        }
        if let Some(impact) = self.impact {
            problem.impact = impact;
        }
        if let Some(urgency) = self.urgency {
            problem.urgency = urgency;
        }
        if let Some(causes) = &self.causes {
            problem.causes = causes.clone();
        }
        if let Some(evidence) = &self.evidence {
            problem.evidence = evidence.clone();
        }
        if let Some(solution) = &self.proposed_solution {
            problem.proposed_solution = solution.clone();
        }
        if let Some(steps) = &self.implementation_steps {
            problem.implementation_steps = steps.clone();
        }
        if let Some(cost) = &self.cost {
            problem.cost = cost.clone();
        }
        if let Some(roi) = &self.roi {
            problem.roi = roi.clone();
        }
        if let Some(dependencies) = &self.dependencies {
            problem.dependencies = dependencies.clone();
        }
        if let Some(tags) = &self.tags {
            let mut deduped: Vec<String> = Vec::with_capacity(tags.len());
            for tag in tags {
                if !deduped.contains(tag) {
                    deduped.push(tag.clone());
                }
            }
            problem.tags = deduped;
        }
    }
}

/// Accumulated edit against one base area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEdit {
    pub target_id: String,
    pub changes: AreaPatch,
    pub edited_at: DateTime<Utc>,
    pub edited_by: String,
}

/// Accumulated edit against one base problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemEdit {
    pub target_id: String,
    pub changes: ProblemPatch,
    pub edited_at: DateTime<Utc>,
    pub edited_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_patch_merge_last_write_wins() {
        let mut first = AreaPatch {
            name: Some("Old name".to_string()),
            priority: Some(AreaPriority::High),
            ..Default::default()
        };
        let second = AreaPatch {
            name: Some("New name".to_string()),
            description: Some("Added".to_string()),
            ..Default::default()
        };
        first.merge(second);

        assert_eq!(first.name.as_deref(), Some("New name"));
        assert_eq!(first.description.as_deref(), Some("Added"));
        // Untouched by the later patch
        assert_eq!(first.priority, Some(AreaPriority::High));
    }

    #[test]
    fn test_problem_patch_apply_replaces_lists_wholesale() {
        let mut problem = Problem {
            id: "X-1".to_string(),
            area_id: "x".to_string(),
            title: "t".to_string(),
            description: String::new(),
            impact: Impact::Low,
            urgency: Horizon::Long,
            causes: vec!["old".to_string()],
            evidence: vec![],
            proposed_solution: String::new(),
            implementation_steps: vec![],
            cost: CostRange::default(),
            roi: RoiRange::default(),
            dependencies: vec![],
            tags: vec![],
        };

        let patch = ProblemPatch {
            causes: Some(vec!["a".to_string(), "b".to_string()]),
            impact: Some(Impact::High),
            tags: Some(vec!["erp".to_string(), "erp".to_string()]),
            ..Default::default()
        };
        patch.apply(&mut problem);

        assert_eq!(problem.causes, vec!["a", "b"]);
        assert_eq!(problem.impact, Impact::High);
        // Tag uniqueness is enforced on write
        assert_eq!(problem.tags, vec!["erp"]);
        assert_eq!(problem.urgency, Horizon::Long);
    }

    #[test]
    fn test_patch_idempotent() {
        let mut a = AreaPatch::default();
        let patch = AreaPatch {
            name: Some("n".to_string()),
            ..Default::default()
        };
        a.merge(patch.clone());
        a.merge(patch.clone());
        assert_eq!(a, patch);
    }
}
