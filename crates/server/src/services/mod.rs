//! Business logic services.
//!
//! # Services
//!
//! - `clock` - Injected time source
//! - `email` - Invitation delivery via SMTP, or logging when SMTP is off
//! - `invites` - Issuing, previewing, accepting and revoking invitations
//! - `time_entries` - Weekly batches, review transitions and period totals

pub mod clock;
pub mod email;
pub mod invites;
pub mod time_entries;

pub use clock::{Clock, FixedClock, SystemClock};
pub use email::{EmailError, InvitationMessage, InviteNotifier, LogNotifier, SmtpNotifier};
