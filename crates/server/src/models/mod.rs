//! Persisted domain records.
//!
//! Each record is what the store hands back; the matching `New*` and
//! `*Changes` types are what handlers hand to the store.

pub mod client;
pub mod company;
pub mod invite;
pub mod member;
pub mod project;
pub mod time_entry;

pub use client::{Client, ClientChanges};
pub use company::{Company, CompanyChanges, NewCompany};
pub use invite::{Invite, NewInvite};
pub use member::{Member, MemberChanges, MemberProfile, NewMember};
pub use project::{Project, ProjectChanges};
pub use time_entry::{StatusChange, TimeEntry, TimeEntryFilter};
