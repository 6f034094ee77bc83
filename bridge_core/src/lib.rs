//! # bridge_core - Bridge Deck Screening Engine
//!
//! `bridge_core` holds the logic behind the group design form: site loading
//! lookup, girder layout editing, deck load effects, and project export.
//! All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Explicit state**: the form's working values live in a [`Session`]
//!   owned by the caller
//! - **Validate, then mutate**: failed operations leave previous values untouched
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use bridge_core::location::LocationDatabase;
//! use bridge_core::project::Session;
//! use bridge_core::settings::Settings;
//!
//! let settings = Settings::default();
//! let db = LocationDatabase::builtin();
//! let mut session = Session::new(db, settings.geometry);
//!
//! let mut editor = session.open_geometry_editor().unwrap();
//! editor.set_girders(Some(5));
//! session.commit_geometry(&editor).unwrap();
//!
//! let result = session.calculate().unwrap();
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`location`] - State/district loading records with a built-in fallback table
//! - [`geometry`] - Girder spacing, count, and overhang resolution
//! - [`calculations`] - Deck self-weight, moment, and shear
//! - [`materials`] - Steel and concrete grade selections
//! - [`project`] - Form inputs and the working session
//! - [`export`] - Export preconditions and atomic JSON writes
//! - [`settings`] - TOML configuration
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod errors;
pub mod export;
pub mod geometry;
pub mod location;
pub mod materials;
pub mod project;
pub mod settings;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use export::{export_project, ExportLimits, ExportOutcome};
pub use location::{LoadingRecord, LocationDatabase, SeismicZone};
pub use project::{ProjectInput, Session};
pub use settings::Settings;
