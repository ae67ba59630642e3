//! Users domain module.
//!
//! Accounts, permission records and the user ↔ permission association, as
//! plain validated records (no IO, no HTTP, no storage).

pub mod permission;
pub mod user;

pub use permission::{Permission, UserPermission};
pub use user::{NewUser, User, UserProfile, UserUpdate};
