//! Shared value types.
//!
//! Type-safe IDs, validated strings, and the status enums that persisted
//! entities move through.

pub mod email;
pub mod id;
pub mod status;
pub mod subject;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::{InviteStatus, ProjectStatus, TimeEntryStatus};
pub use subject::{InvalidSubjectId, SubjectId};
