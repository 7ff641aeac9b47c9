//! Catalog data model shared by the base seed, the overlay, and reports

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod base;

pub use base::BaseCatalog;

/// Area priority as rated in the engagement
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AreaPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl std::fmt::Display for AreaPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaPriority::High => write!(f, "high"),
            AreaPriority::Medium => write!(f, "medium"),
            AreaPriority::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for AreaPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(AreaPriority::High),
            "medium" => Ok(AreaPriority::Medium),
            "low" => Ok(AreaPriority::Low),
            _ => Err(format!("Unknown priority: {}. Use high, medium, or low", s)),
        }
    }
}

/// Business impact of a problem
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    #[default]
    Medium,
    Low,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Impact::High => write!(f, "high"),
            Impact::Medium => write!(f, "medium"),
            Impact::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Impact::High),
            "medium" => Ok(Impact::Medium),
            "low" => Ok(Impact::Low),
            _ => Err(format!("Unknown impact: {}. Use high, medium, or low", s)),
        }
    }
}

/// Time horizon in which a problem should be tackled
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Short,
    #[default]
    Medium,
    Long,
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Horizon::Short => write!(f, "short"),
            Horizon::Medium => write!(f, "medium"),
            Horizon::Long => write!(f, "long"),
        }
    }
}

impl std::str::FromStr for Horizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(Horizon::Short),
            "medium" => Ok(Horizon::Medium),
            "long" => Ok(Horizon::Long),
            _ => Err(format!("Unknown horizon: {}. Use short, medium, or long", s)),
        }
    }
}

/// Estimated implementation cost range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "EUR".to_string()
}

impl Default for CostRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 0.0,
            currency: default_currency(),
        }
    }
}

impl CostRange {
    /// Check the `0 <= min <= max` invariant
    pub fn is_valid(&self) -> bool {
        self.min >= 0.0 && self.min <= self.max
    }
}

/// Expected return range in percent of the invested cost
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiRange {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub justification: String,
}

impl RoiRange {
    pub fn is_valid(&self) -> bool {
        self.min >= 0.0 && self.min <= self.max
    }
}

/// A remediation problem
///
/// `dependencies` may reference problems that no longer resolve; dangling
/// references are tolerated everywhere and never followed transitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Unique identifier; base problems follow `<AREA-CODE>-<n>`
    pub id: String,

    /// Owning area
    pub area_id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub impact: Impact,

    #[serde(default)]
    pub urgency: Horizon,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proposed_solution: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implementation_steps: Vec<String>,

    #[serde(default)]
    pub cost: CostRange,

    #[serde(default)]
    pub roi: RoiRange,

    /// Other problem ids this one depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Unique per problem; duplicates are dropped on write
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The identity and descriptive fields of an area, as stored in the seed
/// and in the overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaCore {
    pub id: String,

    /// Short human-chosen label; used as the base-problem id prefix.
    /// Not guaranteed unique across custom areas.
    pub code: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub priority: AreaPriority,
}

/// Per-area aggregate, recomputed on every resolve and never persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub problem_count: usize,
    pub investment_min: f64,
    pub investment_max: f64,
    pub savings_min: f64,
    pub savings_max: f64,
}

/// A fully resolved area: base or custom fields with edits applied,
/// member problems attached, and the summary recomputed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    #[serde(flatten)]
    pub core: AreaCore,

    #[serde(default)]
    pub is_custom: bool,

    pub problems: Vec<Problem>,

    pub summary: AreaSummary,
}

impl Area {
    pub fn id(&self) -> &str {
        &self.core.id
    }

    pub fn code(&self) -> &str {
        &self.core.code
    }

    /// Find a member problem by id
    pub fn problem(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }
}

/// Anything that can hand out a resolved catalog view.
///
/// The overlay resolver is the shipped implementor; a remote mirror that
/// returns an already-resolved catalog can stand in behind the same contract.
pub trait CatalogSource {
    fn catalog(&self) -> Result<Vec<Area>, CatalogError>;
}

/// Errors from a catalog source
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog source unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_range_invariant() {
        let ok = CostRange {
            min: 100.0,
            max: 200.0,
            currency: "EUR".to_string(),
        };
        assert!(ok.is_valid());

        let inverted = CostRange {
            min: 300.0,
            max: 200.0,
            currency: "EUR".to_string(),
        };
        assert!(!inverted.is_valid());

        let negative = CostRange {
            min: -1.0,
            max: 200.0,
            currency: "EUR".to_string(),
        };
        assert!(!negative.is_valid());
    }

    #[test]
    fn test_enum_round_trips() {
        assert_eq!("high".parse::<Impact>().unwrap(), Impact::High);
        assert_eq!("short".parse::<Horizon>().unwrap(), Horizon::Short);
        assert_eq!("low".parse::<AreaPriority>().unwrap(), AreaPriority::Low);
        assert!("urgent".parse::<Horizon>().is_err());
        assert_eq!(Impact::Medium.to_string(), "medium");
    }

    #[test]
    fn test_problem_yaml_defaults() {
        let yaml = r#"
id: PROC-9
area_id: process
title: Minimal problem
cost:
  min: 10
  max: 20
"#;
        let p: Problem = serde_yml::from_str(yaml).unwrap();
        assert_eq!(p.impact, Impact::Medium);
        assert_eq!(p.urgency, Horizon::Medium);
        assert_eq!(p.cost.currency, "EUR");
        assert!(p.causes.is_empty());
        assert!(p.roi.justification.is_empty());
    }
}
