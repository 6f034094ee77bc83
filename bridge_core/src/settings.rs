//! # Settings
//!
//! Optional TOML configuration. Every key has a default, so an empty file
//! (or no file at all) gives the standard screening setup.
//!
//! ```toml
//! location_db = "data/external_db.json"
//!
//! [geometry]
//! width_allowance_m = 5.0
//! relation_tolerance = 0.5
//!
//! [export]
//! span_min_m = 20.0
//! span_max_m = 45.0
//! carriageway_min_m = 4.25
//! carriageway_max_m = 24.0
//! skew_warning_deg = 15.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{CalcError, CalcResult};
use crate::export::ExportLimits;
use crate::geometry::GeometrySettings;

/// Default location of the external location data file
pub const DEFAULT_LOCATION_DB: &str = "data/external_db.json";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// External location data file; the built-in table is used when unset or unusable
    pub location_db: Option<PathBuf>,

    /// Geometry constants
    pub geometry: GeometrySettings,

    /// Export preconditions
    pub export: ExportLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            location_db: Some(PathBuf::from(DEFAULT_LOCATION_DB)),
            geometry: GeometrySettings::default(),
            export: ExportLimits::default(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> CalcResult<Settings> {
        let settings: Settings = toml::from_str(text)
            .map_err(|e| CalcError::serialization(format!("Invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a TOML file
    pub fn load(path: &Path) -> CalcResult<Settings> {
        let text = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        let settings = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Read settings from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> CalcResult<Settings> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Settings::default()),
        }
    }

    /// Check that the configured values make sense together
    pub fn validate(&self) -> CalcResult<()> {
        let mut violations = Vec::new();
        if !(self.geometry.width_allowance_m >= 0.0) {
            violations.push("geometry.width_allowance_m must not be negative".to_string());
        }
        if !(self.geometry.relation_tolerance >= 0.0) {
            violations.push("geometry.relation_tolerance must not be negative".to_string());
        }
        if !(self.export.span_min_m < self.export.span_max_m) {
            violations.push("export.span_min_m must be below export.span_max_m".to_string());
        }
        if !(self.export.carriageway_min_m < self.export.carriageway_max_m) {
            violations.push("export.carriageway_min_m must be below export.carriageway_max_m".to_string());
        }
        if !(self.export.skew_warning_deg >= 0.0) {
            violations.push("export.skew_warning_deg must not be negative".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(CalcError::validation_failed("settings", violations))
        }
    }
}
