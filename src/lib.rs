//! Remtrack: remediation catalog and tracking toolkit
//!
//! Tracks remediation problems grouped into areas for a consulting
//! engagement. A built-in catalog is merged with a user overlay (custom
//! areas, custom problems, partial edits) into a single resolved view, and
//! every problem carries a mutable tracking record with status, progress,
//! follow-ups, and ROI adjustments.

pub mod catalog;
pub mod cli;
pub mod core;
pub mod engagement;
pub mod overlay;
pub mod persist;
pub mod roi;
pub mod tracking;
