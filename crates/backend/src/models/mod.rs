//! Domain models for the loyalty backend.
//!
//! These types represent validated domain objects, as opposed to the
//! database row types used internally by the repositories.

pub mod admin_user;
pub mod directory;
pub mod user_profile;

pub use admin_user::{AdminUser, NewAdminUser};
pub use directory::{Cashier, Store};
pub use user_profile::{NewRegistration, NewUserProfile, UserProfile};
