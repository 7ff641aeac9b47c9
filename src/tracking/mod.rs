//! Per-problem tracking records, follow-ups, and the ROI scenario log
//!
//! One mutable tracking record exists per problem id, created explicitly via
//! [`TrackingStore::get_or_create`]. Status changes carry inferred side
//! effects (dates, progress); follow-ups are an append-only, newest-first
//! timeline. Saved ROI scenarios live beside the records and never feed back
//! into catalog cost or ROI figures.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use ulid::Ulid;

/// Remediation status of a tracked problem.
///
/// The transition graph is deliberately permissive: completed and discarded
/// are terminal-ish but a record can be moved back out of them, since the
/// machine models corrections rather than a locked workflow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Analyzing,
    InProgress,
    Blocked,
    Completed,
    Discarded,
}

impl Status {
    pub fn all() -> &'static [Status] {
        &[
            Status::Pending,
            Status::Analyzing,
            Status::InProgress,
            Status::Blocked,
            Status::Completed,
            Status::Discarded,
        ]
    }

    /// Whether entering this status should backfill a start date
    fn starts_work(self) -> bool {
        matches!(self, Status::Analyzing | Status::InProgress)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::Analyzing => write!(f, "analyzing"),
            Status::InProgress => write!(f, "in_progress"),
            Status::Blocked => write!(f, "blocked"),
            Status::Completed => write!(f, "completed"),
            Status::Discarded => write!(f, "discarded"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "analyzing" => Ok(Status::Analyzing),
            "in_progress" | "in-progress" => Ok(Status::InProgress),
            "blocked" => Ok(Status::Blocked),
            "completed" => Ok(Status::Completed),
            "discarded" => Ok(Status::Discarded),
            _ => Err(format!(
                "Unknown status: {}. Use pending, analyzing, in_progress, blocked, completed, or discarded",
                s
            )),
        }
    }
}

/// Internal working priority, independent of the catalog's area priority
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum InternalPriority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl std::fmt::Display for InternalPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternalPriority::Critical => write!(f, "critical"),
            InternalPriority::High => write!(f, "high"),
            InternalPriority::Medium => write!(f, "medium"),
            InternalPriority::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for InternalPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(InternalPriority::Critical),
            "high" => Ok(InternalPriority::High),
            "medium" => Ok(InternalPriority::Medium),
            "low" => Ok(InternalPriority::Low),
            _ => Err(format!(
                "Unknown priority: {}. Use critical, high, medium, or low",
                s
            )),
        }
    }
}

/// Kind of a follow-up timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpKind {
    #[default]
    Note,
    Update,
    Blocker,
    Resolution,
    Decision,
    Milestone,
}

impl std::fmt::Display for FollowUpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FollowUpKind::Note => write!(f, "note"),
            FollowUpKind::Update => write!(f, "update"),
            FollowUpKind::Blocker => write!(f, "blocker"),
            FollowUpKind::Resolution => write!(f, "resolution"),
            FollowUpKind::Decision => write!(f, "decision"),
            FollowUpKind::Milestone => write!(f, "milestone"),
        }
    }
}

impl std::str::FromStr for FollowUpKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "note" => Ok(FollowUpKind::Note),
            "update" => Ok(FollowUpKind::Update),
            "blocker" => Ok(FollowUpKind::Blocker),
            "resolution" => Ok(FollowUpKind::Resolution),
            "decision" => Ok(FollowUpKind::Decision),
            "milestone" => Ok(FollowUpKind::Milestone),
            _ => Err(format!(
                "Unknown follow-up kind: {}. Use note, update, blocker, resolution, decision, or milestone",
                s
            )),
        }
    }
}

/// Immutable follow-up entry; deletable but never edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: String,
    pub problem_id: String,
    pub kind: FollowUpKind,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Cost override recorded during remediation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCost {
    pub min: f64,
    pub max: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial date update: `None` leaves a field untouched, `Some(None)`
/// clears it, `Some(Some(d))` sets it
#[derive(Debug, Clone, Default)]
pub struct DatePatch {
    pub start_date: Option<Option<NaiveDate>>,
    pub target_date: Option<Option<NaiveDate>>,
    pub completed_date: Option<Option<NaiveDate>>,
}

impl DatePatch {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.target_date.is_none() && self.completed_date.is_none()
    }
}

/// Mutable remediation state of one problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemTracking {
    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub internal_priority: InternalPriority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,

    /// 0..=100
    #[serde(default)]
    pub progress: u8,

    /// Newest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_ups: Vec<FollowUp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_cost: Option<CustomCost>,

    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ProblemTracking {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            status: Status::Pending,
            internal_priority: InternalPriority::Medium,
            assignee: None,
            start_date: None,
            target_date: None,
            completed_date: None,
            progress: 0,
            follow_ups: Vec::new(),
            custom_cost: None,
            created_at: now,
            last_updated: now,
        }
    }
}

/// A saved ROI what-if calculation; an annotation log entry, never coupled
/// back into tracking or catalog figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiScenario {
    pub id: String,

    pub investment: f64,
    pub annual_savings: f64,

    /// Derived: annual savings over investment, in percent
    pub roi_pct: f64,

    /// Derived: months to recoup the investment; absent when savings are zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payback_months: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl RoiScenario {
    pub fn new(investment: f64, annual_savings: f64, notes: Option<String>) -> Self {
        let roi_pct = if investment == 0.0 {
            0.0
        } else {
            annual_savings / investment * 100.0
        };
        let payback_months = if annual_savings <= 0.0 {
            None
        } else {
            Some(investment / (annual_savings / 12.0))
        };
        Self {
            id: Ulid::new().to_string(),
            investment,
            annual_savings,
            roi_pct,
            payback_months,
            notes,
            created_at: Utc::now(),
        }
    }
}

/// Serializable mutable state of the tracking store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingState {
    /// Tracking records keyed by problem id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub records: BTreeMap<String, ProblemTracking>,

    /// Saved ROI scenarios keyed by problem id, newest first
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scenarios: BTreeMap<String, Vec<RoiScenario>>,
}

/// Errors from tracking operations
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Owns every tracking record and scenario list
#[derive(Debug, Default)]
pub struct TrackingStore {
    state: TrackingState,
}

impl TrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: TrackingState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    /// Replace all tracking state (import path)
    pub fn replace_state(&mut self, state: TrackingState) {
        self.state = state;
    }

    /// Drop every record and scenario
    pub fn clear(&mut self) {
        self.state = TrackingState::default();
    }

    /// Read-only lookup; does not create a record
    pub fn get(&self, problem_id: &str) -> Option<&ProblemTracking> {
        self.state.records.get(problem_id)
    }

    /// Fetch a record, creating it with defaults on first access
    pub fn get_or_create(&mut self, problem_id: &str) -> &ProblemTracking {
        self.record_mut(problem_id)
    }

    fn record_mut(&mut self, problem_id: &str) -> &mut ProblemTracking {
        self.state
            .records
            .entry(problem_id.to_string())
            .or_insert_with(ProblemTracking::new)
    }

    /// Change status, applying the inferred side effects atomically with the
    /// status write: completion stamps `completed_date` once and forces
    /// progress to 100; entering analysis or work backfills `start_date`.
    pub fn set_status(&mut self, problem_id: &str, status: Status) -> &ProblemTracking {
        let today = Local::now().date_naive();
        let record = self.record_mut(problem_id);

        record.status = status;
        match status {
            Status::Completed => {
                if record.completed_date.is_none() {
                    record.completed_date = Some(today);
                }
                record.progress = 100;
            }
            s if s.starts_work() => {
                if record.start_date.is_none() {
                    record.start_date = Some(today);
                }
            }
            _ => {}
        }
        record.last_updated = Utc::now();
        record
    }

    /// Set progress, clamped to 0..=100. Never touches status: operators may
    /// report 100% without completing, or reduce progress after completion.
    pub fn set_progress(&mut self, problem_id: &str, value: i64) -> &ProblemTracking {
        let record = self.record_mut(problem_id);
        record.progress = value.clamp(0, 100) as u8;
        record.last_updated = Utc::now();
        record
    }

    pub fn set_assignee(&mut self, problem_id: &str, assignee: Option<String>) -> &ProblemTracking {
        let record = self.record_mut(problem_id);
        record.assignee = assignee.filter(|a| !a.trim().is_empty());
        record.last_updated = Utc::now();
        record
    }

    pub fn set_priority(
        &mut self,
        problem_id: &str,
        priority: InternalPriority,
    ) -> &ProblemTracking {
        let record = self.record_mut(problem_id);
        record.internal_priority = priority;
        record.last_updated = Utc::now();
        record
    }

    /// Apply a partial date update; absent keys leave dates untouched
    pub fn set_dates(&mut self, problem_id: &str, patch: DatePatch) -> &ProblemTracking {
        let record = self.record_mut(problem_id);
        if let Some(start) = patch.start_date {
            record.start_date = start;
        }
        if let Some(target) = patch.target_date {
            record.target_date = target;
        }
        if let Some(completed) = patch.completed_date {
            record.completed_date = completed;
        }
        record.last_updated = Utc::now();
        record
    }

    /// Record or clear the remediation cost override
    pub fn set_custom_cost(
        &mut self,
        problem_id: &str,
        cost: Option<CustomCost>,
    ) -> Result<&ProblemTracking, TrackingError> {
        if let Some(cost) = &cost {
            if cost.min < 0.0 || cost.min > cost.max {
                return Err(TrackingError::Validation(format!(
                    "custom cost must satisfy 0 <= min <= max (got {}..{})",
                    cost.min, cost.max
                )));
            }
        }
        let record = self.record_mut(problem_id);
        record.custom_cost = cost;
        record.last_updated = Utc::now();
        Ok(record)
    }

    /// Prepend a follow-up (newest first). Content and author must be
    /// non-empty.
    pub fn add_follow_up(
        &mut self,
        problem_id: &str,
        kind: FollowUpKind,
        content: &str,
        author: &str,
    ) -> Result<&FollowUp, TrackingError> {
        if content.trim().is_empty() {
            return Err(TrackingError::Validation(
                "follow-up content must not be empty".into(),
            ));
        }
        if author.trim().is_empty() {
            return Err(TrackingError::Validation(
                "follow-up author must not be empty".into(),
            ));
        }

        let follow_up = FollowUp {
            id: Ulid::new().to_string(),
            problem_id: problem_id.to_string(),
            kind,
            content: content.to_string(),
            author: author.to_string(),
            created_at: Utc::now(),
        };

        let record = self.record_mut(problem_id);
        record.follow_ups.insert(0, follow_up);
        record.last_updated = Utc::now();
        Ok(&record.follow_ups[0])
    }

    /// Remove a follow-up by id; no-op when absent
    pub fn delete_follow_up(&mut self, problem_id: &str, follow_up_id: &str) -> bool {
        let Some(record) = self.state.records.get_mut(problem_id) else {
            return false;
        };
        let before = record.follow_ups.len();
        record.follow_ups.retain(|f| f.id != follow_up_id);
        let removed = record.follow_ups.len() != before;
        if removed {
            record.last_updated = Utc::now();
        }
        removed
    }

    /// Saved scenarios for a problem, newest first
    pub fn scenarios(&self, problem_id: &str) -> &[RoiScenario] {
        self.state
            .scenarios
            .get(problem_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Prepend a saved calculation to the problem's scenario log
    pub fn save_scenario(&mut self, problem_id: &str, scenario: RoiScenario) -> &RoiScenario {
        let list = self.state.scenarios.entry(problem_id.to_string()).or_default();
        list.insert(0, scenario);
        &list[0]
    }

    /// Remove a saved calculation by id; no-op when absent
    pub fn delete_scenario(&mut self, problem_id: &str, scenario_id: &str) -> bool {
        let Some(list) = self.state.scenarios.get_mut(problem_id) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.id != scenario_id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.state.scenarios.remove(problem_id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults_on_first_access() {
        let mut store = TrackingStore::new();
        assert!(store.get("PROC-1").is_none());

        let record = store.get_or_create("PROC-1");
        assert_eq!(record.status, Status::Pending);
        assert_eq!(record.internal_priority, InternalPriority::Medium);
        assert_eq!(record.progress, 0);
        assert!(record.assignee.is_none());
        assert!(store.get("PROC-1").is_some());
    }

    #[test]
    fn test_completion_side_effects_apply_once() {
        let mut store = TrackingStore::new();
        store.set_progress("PROC-1", 40);

        let record = store.set_status("PROC-1", Status::Completed);
        assert_eq!(record.progress, 100);
        let first_completion = record.completed_date.unwrap();

        // Re-completing must not overwrite the original completion date
        store.set_status("PROC-1", Status::InProgress);
        let record = store.set_status("PROC-1", Status::Completed);
        assert_eq!(record.completed_date.unwrap(), first_completion);
    }

    #[test]
    fn test_start_date_backfilled_once() {
        let mut store = TrackingStore::new();
        let record = store.set_status("PROC-1", Status::Analyzing);
        let start = record.start_date.unwrap();

        let record = store.set_status("PROC-1", Status::InProgress);
        assert_eq!(record.start_date.unwrap(), start);

        // Blocked does not backfill
        let mut store = TrackingStore::new();
        let record = store.set_status("PROC-2", Status::Blocked);
        assert!(record.start_date.is_none());
    }

    #[test]
    fn test_progress_clamping() {
        let mut store = TrackingStore::new();
        assert_eq!(store.set_progress("PROC-1", 150).progress, 100);
        assert_eq!(store.set_progress("PROC-1", -10).progress, 0);
        assert_eq!(store.set_progress("PROC-1", 55).progress, 55);
    }

    #[test]
    fn test_progress_does_not_alter_status() {
        let mut store = TrackingStore::new();
        store.set_status("PROC-1", Status::Completed);
        let record = store.set_progress("PROC-1", 60);
        assert_eq!(record.status, Status::Completed);
        assert_eq!(record.progress, 60);
    }

    #[test]
    fn test_date_patch_semantics() {
        let mut store = TrackingStore::new();
        let d1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();

        store.set_dates(
            "PROC-1",
            DatePatch {
                start_date: Some(Some(d1)),
                target_date: Some(Some(d2)),
                completed_date: None,
            },
        );

        // Absent key leaves start untouched; explicit None clears target
        let record = store.set_dates(
            "PROC-1",
            DatePatch {
                target_date: Some(None),
                ..Default::default()
            },
        );
        assert_eq!(record.start_date, Some(d1));
        assert!(record.target_date.is_none());
    }

    #[test]
    fn test_follow_up_ordering_and_validation() {
        let mut store = TrackingStore::new();
        store
            .add_follow_up("PROC-1", FollowUpKind::Note, "F1", "alice")
            .unwrap();
        store
            .add_follow_up("PROC-1", FollowUpKind::Update, "F2", "alice")
            .unwrap();
        store
            .add_follow_up("PROC-1", FollowUpKind::Blocker, "F3", "bob")
            .unwrap();

        let contents: Vec<&str> = store
            .get("PROC-1")
            .unwrap()
            .follow_ups
            .iter()
            .map(|f| f.content.as_str())
            .collect();
        assert_eq!(contents, vec!["F3", "F2", "F1"]);

        assert!(store
            .add_follow_up("PROC-1", FollowUpKind::Note, "  ", "alice")
            .is_err());
        assert!(store
            .add_follow_up("PROC-1", FollowUpKind::Note, "content", "")
            .is_err());
    }

    #[test]
    fn test_delete_follow_up_noop_when_absent() {
        let mut store = TrackingStore::new();
        let id = store
            .add_follow_up("PROC-1", FollowUpKind::Note, "F1", "alice")
            .unwrap()
            .id
            .clone();

        assert!(!store.delete_follow_up("PROC-1", "nope"));
        assert!(!store.delete_follow_up("OTHER-1", &id));
        assert!(store.delete_follow_up("PROC-1", &id));
        assert!(store.get("PROC-1").unwrap().follow_ups.is_empty());
    }

    #[test]
    fn test_custom_cost_validation() {
        let mut store = TrackingStore::new();
        let err = store
            .set_custom_cost(
                "PROC-1",
                Some(CustomCost {
                    min: 10.0,
                    max: 5.0,
                    notes: None,
                }),
            )
            .unwrap_err();
        assert!(matches!(err, TrackingError::Validation(_)));

        store
            .set_custom_cost(
                "PROC-1",
                Some(CustomCost {
                    min: 5.0,
                    max: 10.0,
                    notes: Some("vendor quote".to_string()),
                }),
            )
            .unwrap();
        store.set_custom_cost("PROC-1", None).unwrap();
        assert!(store.get("PROC-1").unwrap().custom_cost.is_none());
    }

    #[test]
    fn test_scenario_log_independent_of_tracking() {
        let mut store = TrackingStore::new();
        let s1 = RoiScenario::new(10000.0, 25000.0, None);
        let s2 = RoiScenario::new(20000.0, 10000.0, Some("pessimistic".to_string()));
        let id1 = s1.id.clone();

        store.save_scenario("PROC-1", s1);
        store.save_scenario("PROC-1", s2);

        let scenarios = store.scenarios("PROC-1");
        assert_eq!(scenarios.len(), 2);
        // Newest first
        assert_eq!(scenarios[1].id, id1);
        assert_eq!(scenarios[0].roi_pct, 50.0);
        assert_eq!(scenarios[0].payback_months, Some(24.0));

        // Scenarios never create tracking records
        assert!(store.get("PROC-1").is_none());

        assert!(store.delete_scenario("PROC-1", &id1));
        assert!(!store.delete_scenario("PROC-1", &id1));
        assert_eq!(store.scenarios("PROC-1").len(), 1);
    }

    #[test]
    fn test_scenario_derivations_guard_zero() {
        let s = RoiScenario::new(0.0, 0.0, None);
        assert_eq!(s.roi_pct, 0.0);
        assert!(s.payback_months.is_none());
    }
}
