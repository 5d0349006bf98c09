//! Peer tutor eligibility checks and course assignment workflow.

pub mod assignments;
pub mod config;
pub mod error;
pub mod telemetry;
