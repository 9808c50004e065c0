//! Automated discharge of citizens from municipal rehabilitation programs.
//!
//! The [`workflows::discharge`] module holds the rule engine and task actions;
//! `config`, `error` and `telemetry` carry the ambient plumbing shared with the
//! worker service.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
