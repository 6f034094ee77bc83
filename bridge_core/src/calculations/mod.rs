//! # Structural Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(input) -> Result<*Result, CalcError>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`deck_load`] - Simply-supported deck self-weight, moment, and shear

pub mod deck_load;

// Re-export commonly used types
pub use deck_load::{calculate, DeckLoadInput, DeckLoadResult};
