//! Tessera Core - fidelity card types and normalization.
//!
//! This crate provides the pure part of the Tessera loyalty backend:
//! - `backend` - Persistence, registration and import services
//! - `cli` - Command-line tools for migrations, imports and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no database access,
//! no network clients. Reading an export works over any [`std::io::BufRead`],
//! so the caller decides where the bytes come from.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, card numbers and roles
//! - [`normalize`] - Italian-locale coercions and the fidelity record normalizer
//! - [`export`] - Streaming reader for the bulk fidelity export, with repair
//! - [`matcher`] - Classification of a card lookup

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod export;
pub mod matcher;
pub mod normalize;
pub mod types;

pub use export::{ExportReader, IngestReport, ParseFailure, RawChunk};
pub use matcher::{TesseraMatch, classify};
pub use normalize::{ExtendedProfile, FidelityProfile, FidelityRecord, NormalizeError, normalize};
pub use types::*;
