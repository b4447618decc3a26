//! Audit orchestration for linkaudit.
//!
//! Ties the probe, freshness, search, and report crates together into
//! the sequential audit pipeline. See [`pipeline::run_audit`].

pub mod pipeline;

pub use pipeline::{AuditPlan, AuditResult, ProgressReporter, SilentProgress, run_audit};
