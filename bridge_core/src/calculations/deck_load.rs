//! # Simply-Supported Deck Load Calculation
//!
//! Screening-level load effects for a single-span girder bridge deck.
//!
//! ## Assumptions
//!
//! - Simply-supported (pin-roller) single span
//! - Self-weight is the concrete deck slab only: 0.2 m thick at 25 kN/m³,
//!   over the full span and carriageway width (girders and bracing ignored)
//! - Live load is a uniform line load along the span (kN/m)
//! - Load effects are shared equally between girders
//!
//! ## Example
//!
//! ```rust
//! use bridge_core::calculations::deck_load::{calculate, DeckLoadInput};
//!
//! let input = DeckLoadInput {
//!     span_m: 30.0,
//!     carriageway_width_m: 10.0,
//!     girder_count: 4,
//!     live_load_kn_per_m: 5.0,
//! };
//!
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.self_weight_kn, 1500.0);
//! assert_eq!(result.total_moment_knm, 6187.5);
//! println!("Per-girder M / V: {:.2} / {:.2}", result.per_girder_moment_knm, result.per_girder_shear_kn);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};

/// Deck slab thickness (m)
pub const DECK_THICKNESS_M: f64 = 0.2;

/// Unit weight of reinforced concrete (kN/m³)
pub const CONCRETE_DENSITY_KN_PER_M3: f64 = 25.0;

/// Input parameters for the deck load calculation.
///
/// ## JSON Example
///
/// ```json
/// {
///   "span_m": 30.0,
///   "carriageway_width_m": 10.0,
///   "girder_count": 4,
///   "live_load_kn_per_m": 5.0
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeckLoadInput {
    /// Effective span (m)
    pub span_m: f64,

    /// Carriageway width (m)
    pub carriageway_width_m: f64,

    /// Number of girders sharing the load
    pub girder_count: u32,

    /// Uniform live load along the span (kN/m)
    pub live_load_kn_per_m: f64,
}

impl DeckLoadInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.span_m.is_finite() && self.span_m > 0.0) {
            return Err(CalcError::invalid_input(
                "span_m",
                self.span_m.to_string(),
                "Span must be a positive number",
            ));
        }
        if !(self.carriageway_width_m.is_finite() && self.carriageway_width_m > 0.0) {
            return Err(CalcError::invalid_input(
                "carriageway_width_m",
                self.carriageway_width_m.to_string(),
                "Carriageway width must be a positive number",
            ));
        }
        if self.girder_count == 0 {
            return Err(CalcError::invalid_input(
                "girder_count",
                "0",
                "At least one girder is required",
            ));
        }
        if !(self.live_load_kn_per_m.is_finite() && self.live_load_kn_per_m >= 0.0) {
            return Err(CalcError::invalid_input(
                "live_load_kn_per_m",
                self.live_load_kn_per_m.to_string(),
                "Live load must be zero or positive",
            ));
        }
        Ok(())
    }

    /// Plan area of the deck slab (m²)
    pub fn deck_area_m2(&self) -> f64 {
        self.span_m * self.carriageway_width_m
    }

    /// Total slab self-weight (kN)
    pub fn self_weight_kn(&self) -> f64 {
        CONCRETE_DENSITY_KN_PER_M3 * DECK_THICKNESS_M * self.deck_area_m2()
    }
}

/// Results from the deck load calculation.
///
/// All values come from a single [`calculate`] call; a result is never
/// partially updated.
///
/// ## JSON Example
///
/// ```json
/// {
///   "girder_count": 4,
///   "self_weight_kn": 1500.0,
///   "uniform_load_kn_per_m": 55.0,
///   "total_moment_knm": 6187.5,
///   "total_shear_kn": 825.0,
///   "per_girder_moment_knm": 1546.875,
///   "per_girder_shear_kn": 206.25
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeckLoadResult {
    /// Girder count the per-girder values were divided by
    pub girder_count: u32,

    /// Deck slab self-weight (kN)
    pub self_weight_kn: f64,

    /// Self-weight per metre of span plus live load (kN/m)
    pub uniform_load_kn_per_m: f64,

    /// Midspan moment M = wL²/8 (kN·m)
    pub total_moment_knm: f64,

    /// Support shear V = wL/2 (kN)
    pub total_shear_kn: f64,

    /// Moment per girder (kN·m)
    pub per_girder_moment_knm: f64,

    /// Shear per girder (kN)
    pub per_girder_shear_kn: f64,
}

/// Calculate deck load effects.
///
/// # Returns
///
/// * `Ok(DeckLoadResult)` - all six load effects
/// * `Err(CalcError::InvalidInput)` - non-positive span, width, or girder
///   count, or negative live load
pub fn calculate(input: &DeckLoadInput) -> CalcResult<DeckLoadResult> {
    input.validate()?;

    let span = input.span_m;
    let self_weight_kn = input.self_weight_kn();

    // w = W / L + q
    let uniform_load_kn_per_m = self_weight_kn / span + input.live_load_kn_per_m;

    // M = wL²/8, V = wL/2
    let total_moment_knm = uniform_load_kn_per_m * span.powi(2) / 8.0;
    let total_shear_kn = uniform_load_kn_per_m * span / 2.0;

    let girders = input.girder_count.max(1) as f64;

    let result = DeckLoadResult {
        girder_count: input.girder_count,
        self_weight_kn,
        uniform_load_kn_per_m,
        total_moment_knm,
        total_shear_kn,
        per_girder_moment_knm: total_moment_knm / girders,
        per_girder_shear_kn: total_shear_kn / girders,
    };
    debug!(?input, ?result, "Deck load calculated");
    Ok(result)
}
