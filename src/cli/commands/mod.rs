//! Command implementations, one module per domain

pub mod area;
pub mod completions;
pub mod data;
pub mod followup;
pub mod init;
pub mod problem;
pub mod report;
pub mod roi;
pub mod track;
