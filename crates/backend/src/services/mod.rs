//! Business logic services.
//!
//! Services borrow their stores from a [`Backend`](crate::Backend) and are
//! cheap to build per operation.

pub mod auth;
pub mod directory;
pub mod ingest;
pub mod matcher;
pub mod points;
pub mod registration;

pub use auth::{AuthError, AuthService};
pub use directory::{DirectoryError, DirectoryService};
pub use ingest::{ImportSummary, IngestError, IngestService};
pub use matcher::MatcherService;
pub use points::{PointsError, PointsService};
pub use registration::{RegistrationError, RegistrationService};
