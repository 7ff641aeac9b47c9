//! Pure aggregation and ROI arithmetic
//!
//! These functions own no state; both stores and the report commands call
//! them on resolved data.

use serde::{Deserialize, Serialize};

use crate::catalog::{AreaSummary, CostRange, Problem, RoiRange};
use crate::tracking::CustomCost;

/// Recompute an area's aggregate from its member problems.
///
/// Savings bounds are `round(cost * roi / 100)` summed per problem, not the
/// product of the summed bounds.
pub fn area_summary(problems: &[Problem]) -> AreaSummary {
    let mut summary = AreaSummary {
        problem_count: problems.len(),
        ..AreaSummary::default()
    };

    for p in problems {
        summary.investment_min += p.cost.min;
        summary.investment_max += p.cost.max;
        summary.savings_min += (p.cost.min * p.roi.min / 100.0).round();
        summary.savings_max += (p.cost.max * p.roi.max / 100.0).round();
    }

    summary
}

/// ROI after applying an optional tracking cost override
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveRoi {
    pub min: f64,
    pub max: f64,
    pub is_adjusted: bool,
}

/// Rescale the catalog ROI against a tracking cost override.
///
/// The implied absolute return (`cost * roi%`) is held constant: a lower
/// actual cost raises the percentage, a higher one lowers it. A zero override
/// bound yields 0 for that bound rather than a division blow-up.
pub fn effective_roi(cost: &CostRange, roi: &RoiRange, custom: Option<&CustomCost>) -> EffectiveRoi {
    let Some(custom) = custom else {
        return EffectiveRoi {
            min: roi.min,
            max: roi.max,
            is_adjusted: false,
        };
    };

    let scale = |roi_bound: f64, cost_bound: f64, custom_bound: f64| -> f64 {
        if custom_bound == 0.0 {
            0.0
        } else {
            roi_bound * (cost_bound / custom_bound)
        }
    };

    EffectiveRoi {
        min: scale(roi.min, cost.min, custom.min),
        max: scale(roi.max, cost.max, custom.max),
        is_adjusted: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Impact;

    fn problem(id: &str, cost_min: f64, cost_max: f64, roi_min: f64, roi_max: f64) -> Problem {
        Problem {
            id: id.to_string(),
            area_id: "a".to_string(),
            title: id.to_string(),
            description: String::new(),
            impact: Impact::Medium,
            urgency: Default::default(),
            causes: vec![],
            evidence: vec![],
            proposed_solution: String::new(),
            implementation_steps: vec![],
            cost: CostRange {
                min: cost_min,
                max: cost_max,
                currency: "EUR".to_string(),
            },
            roi: RoiRange {
                min: roi_min,
                max: roi_max,
                justification: String::new(),
            },
            dependencies: vec![],
            tags: vec![],
        }
    }

    #[test]
    fn test_area_summary_sums_and_rounds() {
        let problems = vec![
            problem("X-1", 1000.0, 2000.0, 50.0, 100.0),
            problem("X-2", 333.0, 400.0, 10.0, 15.0),
        ];
        let s = area_summary(&problems);
        assert_eq!(s.problem_count, 2);
        assert_eq!(s.investment_min, 1333.0);
        assert_eq!(s.investment_max, 2400.0);
        // 500 + round(33.3) = 533
        assert_eq!(s.savings_min, 533.0);
        // 2000 + 60
        assert_eq!(s.savings_max, 2060.0);
    }

    #[test]
    fn test_area_summary_empty() {
        let s = area_summary(&[]);
        assert_eq!(s.problem_count, 0);
        assert_eq!(s.investment_max, 0.0);
        assert_eq!(s.savings_min, 0.0);
    }

    #[test]
    fn test_effective_roi_without_override() {
        let p = problem("X-1", 1000.0, 2000.0, 100.0, 200.0);
        let eff = effective_roi(&p.cost, &p.roi, None);
        assert_eq!(eff.min, 100.0);
        assert_eq!(eff.max, 200.0);
        assert!(!eff.is_adjusted);
    }

    #[test]
    fn test_effective_roi_scales_inverse_to_cost() {
        let p = problem("X-1", 1000.0, 2000.0, 100.0, 200.0);
        let custom = CustomCost {
            min: 500.0,
            max: 2000.0,
            notes: None,
        };
        let eff = effective_roi(&p.cost, &p.roi, Some(&custom));
        // Half the cost doubles the min ROI; the max bound is unchanged
        // because the override matches the catalog cost there.
        assert_eq!(eff.min, 200.0);
        assert_eq!(eff.max, 200.0);
        assert!(eff.is_adjusted);
    }

    #[test]
    fn test_effective_roi_zero_override_bound() {
        let p = problem("X-1", 1000.0, 2000.0, 100.0, 200.0);
        let custom = CustomCost {
            min: 0.0,
            max: 4000.0,
            notes: None,
        };
        let eff = effective_roi(&p.cost, &p.roi, Some(&custom));
        assert_eq!(eff.min, 0.0);
        assert_eq!(eff.max, 100.0);
        assert!(eff.is_adjusted);
    }
}
