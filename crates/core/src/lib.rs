//! Tally Core - time tracking domain library.
//!
//! This crate holds the rules every other Tally component relies on:
//! - [`authz`] - the `employee < manager < admin` role hierarchy
//! - [`period`] - semi-monthly pay period windows
//! - [`duration`] - the `H:MM` duration codec and totals
//! - [`timesheet`] - turning a submitted weekly sheet into entry drafts
//! - [`types`] - IDs, emails, subjects and status enums
//!
//! # Architecture
//!
//! Everything here is pure: no I/O, no clock reads, no shared state. The
//! server crate supplies "now", the caller's identity and persistence.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod authz;
pub mod duration;
pub mod period;
pub mod timesheet;
pub mod types;

pub use authz::{InvalidRoleError, PermissionDenied, PrincipalRole, Role};
pub use duration::{DurationError, EntryDuration, TotalMinutes};
pub use period::PayPeriod;
pub use timesheet::{SubmissionError, TimeEntryDraft, WeeklySheet};
pub use types::*;
