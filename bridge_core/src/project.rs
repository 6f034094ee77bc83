//! # Project Session
//!
//! The form's working state, held in one explicit [`Session`] value owned by
//! the caller:
//!
//! ```text
//! Session
//! ├── input: ProjectInput (structure, location, loading, geometric details, materials)
//! ├── geometry: Option<GeometrySpec> (last committed girder layout)
//! └── result: Option<DeckLoadResult> (last successful calculation)
//! ```
//!
//! Operations validate before they mutate: a failed lookup, geometry commit,
//! or calculation leaves the previous values in place.
//!
//! ## Example
//!
//! ```rust
//! use bridge_core::geometry::GeometrySettings;
//! use bridge_core::location::LocationDatabase;
//! use bridge_core::project::Session;
//!
//! let db = LocationDatabase::builtin();
//! let mut session = Session::new(db, GeometrySettings::default());
//! assert_eq!(session.input.state, "Maharashtra");
//!
//! let result = session.calculate().unwrap();
//! assert_eq!(result.girder_count, 4);
//! assert_eq!(result.total_moment_knm, 6187.5);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculations::deck_load::{self, DeckLoadInput, DeckLoadResult};
use crate::errors::{CalcError, CalcResult};
use crate::geometry::{GeometryEditor, GeometrySettings, GeometrySpec, DEFAULT_GIRDER_COUNT};
use crate::location::{LoadingRecord, LocationDatabase};
use crate::materials::MaterialSelection;

/// Kind of structure being screened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StructureType {
    /// Highway bridge; the only supported structure
    #[default]
    Highway,
    /// Any other structure; inputs are disabled
    Other,
}

impl StructureType {
    pub fn is_supported(&self) -> bool {
        matches!(self, StructureType::Highway)
    }
}

impl FromStr for StructureType {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "highway" => Ok(StructureType::Highway),
            "other" => Ok(StructureType::Other),
            _ => Err(CalcError::invalid_input("structure", s, "Expected Highway or Other")),
        }
    }
}

/// Where the loading record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    /// Looked up from the location database by state and district
    #[default]
    Location,
    /// Entered by the user
    Custom,
}

/// Footpath arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Footpath {
    #[default]
    None,
    #[serde(rename = "Single-sided")]
    SingleSided,
    Both,
}

impl Footpath {
    pub const ALL: [Footpath; 3] = [Footpath::None, Footpath::SingleSided, Footpath::Both];

    pub fn display_name(&self) -> &'static str {
        match self {
            Footpath::None => "None",
            Footpath::SingleSided => "Single-sided",
            Footpath::Both => "Both",
        }
    }
}

impl fmt::Display for Footpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Footpath {
    type Err = CalcError;

    /// Accepts the display names case-insensitively, plus `single`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "single" {
            return Ok(Footpath::SingleSided);
        }
        Footpath::ALL
            .into_iter()
            .find(|f| f.display_name().to_lowercase() == wanted)
            .ok_or_else(|| CalcError::invalid_input("footpath", s, "Expected None, Single-sided, or Both"))
    }
}

/// Geometric details entered on the form.
///
/// Serializes with the exported file's key names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometricDetails {
    /// Span (m)
    #[serde(rename = "span")]
    pub span_m: f64,

    /// Carriageway width (m)
    #[serde(rename = "carriageway_width")]
    pub carriageway_width_m: f64,

    pub footpath: Footpath,

    /// Skew angle (degrees)
    #[serde(rename = "skew")]
    pub skew_deg: f64,

    /// Uniform live load (kN/m)
    #[serde(rename = "live_load")]
    pub live_load_kn_per_m: f64,
}

impl Default for GeometricDetails {
    fn default() -> Self {
        GeometricDetails {
            span_m: 30.0,
            carriageway_width_m: 10.0,
            footpath: Footpath::None,
            skew_deg: 0.0,
            live_load_kn_per_m: 5.0,
        }
    }
}

/// Everything the user has entered on the form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectInput {
    pub structure: StructureType,
    pub location_mode: LocationMode,

    /// Selected state (location mode)
    pub state: String,

    /// Selected district (location mode)
    pub district: String,

    /// Resolved loading; `None` in custom mode until a record is entered
    pub loading: Option<LoadingRecord>,

    pub geometric: GeometricDetails,
    pub materials: MaterialSelection,
}

/// Working state of one interactive session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Form inputs; edited freely by the form layer
    pub input: ProjectInput,
    geometry: Option<GeometrySpec>,
    result: Option<DeckLoadResult>,
    geometry_settings: GeometrySettings,
}

impl Session {
    /// Start a session with default inputs and the first location preselected.
    pub fn new(db: &LocationDatabase, geometry_settings: GeometrySettings) -> Self {
        let mut input = ProjectInput::default();
        if let Some((state, district)) = db.first_location() {
            input.loading = db.lookup(state, district).ok();
            input.state = state.to_string();
            input.district = district.to_string();
        }
        Session {
            input,
            geometry: None,
            result: None,
            geometry_settings,
        }
    }

    /// Last committed girder layout
    pub fn geometry(&self) -> Option<&GeometrySpec> {
        self.geometry.as_ref()
    }

    /// Last successful calculation
    pub fn result(&self) -> Option<&DeckLoadResult> {
        self.result.as_ref()
    }

    pub fn geometry_settings(&self) -> &GeometrySettings {
        &self.geometry_settings
    }

    /// Girder count used by calculations: the committed count, else 4
    pub fn girder_count(&self) -> u32 {
        self.geometry.map(|g| g.girder_count).unwrap_or(DEFAULT_GIRDER_COUNT)
    }

    /// Select a state and district and resolve its loading record.
    pub fn select_location(&mut self, db: &LocationDatabase, state: &str, district: &str) -> CalcResult<LoadingRecord> {
        if self.input.location_mode == LocationMode::Custom {
            return Err(CalcError::invalid_input(
                "location_mode",
                "custom",
                "Location selection is disabled while custom loading is active",
            ));
        }
        let record = db.lookup(state, district)?;
        self.input.state = state.to_string();
        self.input.district = district.to_string();
        self.input.loading = Some(record);
        Ok(record)
    }

    /// Select a state and its first district.
    pub fn select_state(&mut self, db: &LocationDatabase, state: &str) -> CalcResult<LoadingRecord> {
        let district = db
            .districts(state)
            .first()
            .map(|d| d.to_string())
            .ok_or_else(|| CalcError::not_found("State", state))?;
        self.select_location(db, state, &district)
    }

    /// Switch between database lookup and custom loading.
    ///
    /// Custom mode clears the resolved record; location mode re-resolves the
    /// selected district.
    pub fn set_location_mode(&mut self, db: &LocationDatabase, mode: LocationMode) {
        self.input.location_mode = mode;
        self.input.loading = match mode {
            LocationMode::Custom => None,
            LocationMode::Location => db.lookup(&self.input.state, &self.input.district).ok(),
        };
    }

    /// Use a user-entered loading record. Switches to custom mode.
    pub fn apply_custom_loading(&mut self, record: LoadingRecord) -> CalcResult<()> {
        record.validate()?;
        self.input.location_mode = LocationMode::Custom;
        self.input.loading = Some(record);
        info!(?record, "Custom loading applied");
        Ok(())
    }

    pub fn set_structure_type(&mut self, structure: StructureType) {
        self.input.structure = structure;
        if !structure.is_supported() {
            info!("Other structure selected; inputs disabled");
        }
    }

    /// Open a geometry editing session for the current carriageway width.
    pub fn open_geometry_editor(&self) -> CalcResult<GeometryEditor> {
        GeometryEditor::open(
            self.input.geometric.carriageway_width_m,
            self.geometry.as_ref(),
            self.geometry_settings,
        )
    }

    /// Commit an editing session. The previous layout is kept on failure.
    pub fn commit_geometry(&mut self, editor: &GeometryEditor) -> CalcResult<GeometrySpec> {
        let spec = editor.commit()?;
        self.geometry = Some(spec);
        info!(
            spacing_m = spec.girder_spacing_m,
            girders = spec.girder_count,
            overhang_m = spec.deck_overhang_m,
            "Geometry committed"
        );
        Ok(spec)
    }

    /// Run the deck load calculation on the current inputs.
    ///
    /// The stored result is replaced only when the calculation succeeds.
    pub fn calculate(&mut self) -> CalcResult<DeckLoadResult> {
        self.ensure_supported()?;
        let geometric = &self.input.geometric;
        let input = DeckLoadInput {
            span_m: geometric.span_m,
            carriageway_width_m: geometric.carriageway_width_m,
            girder_count: self.girder_count(),
            live_load_kn_per_m: geometric.live_load_kn_per_m,
        };
        let result = deck_load::calculate(&input)?;
        self.result = Some(result);
        info!("Calculated results updated");
        Ok(result)
    }

    /// Restore default inputs and clear loading, geometry, and results.
    ///
    /// Structure type, location mode, and the selected state/district are kept.
    pub fn reset(&mut self) {
        self.input.geometric = GeometricDetails::default();
        self.input.materials = MaterialSelection::default();
        self.input.loading = None;
        self.geometry = None;
        self.result = None;
    }

    pub(crate) fn ensure_supported(&self) -> CalcResult<()> {
        if self.input.structure.is_supported() {
            Ok(())
        } else {
            Err(CalcError::invalid_input(
                "structure",
                "Other",
                "Other structures are not included",
            ))
        }
    }
}
