//! # Location Database
//!
//! Site loading parameters (basic wind speed, seismic zone and factor, shade
//! temperature extremes) keyed by state and district.
//!
//! The database is read once at startup. An external JSON file can replace
//! the built-in table entirely; when the file is missing or malformed the
//! built-in five-city table is used instead. The fallback is explicit:
//!
//! ```rust
//! use bridge_core::location::LocationDatabase;
//! use std::path::Path;
//!
//! let db = LocationDatabase::try_load_external(Path::new("does/not/exist.json"))
//!     .unwrap_or_else(|| LocationDatabase::builtin().clone());
//!
//! let mumbai = db.lookup("Maharashtra", "Mumbai").unwrap();
//! assert_eq!(mumbai.wind_speed_mps, 39.0);
//! ```
//!
//! ## File Format
//!
//! ```json
//! {
//!   "Maharashtra": {
//!     "Mumbai": { "wind": 39, "seismic_zone": "III", "seismic_factor": 0.16, "temp_max": 36, "temp_min": 18 }
//!   }
//! }
//! ```
//!
//! Key order in the file is preserved for [`LocationDatabase::states`] and
//! [`LocationDatabase::districts`].

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};

/// Seismic zone classification (IS 1893 zones II through V)
///
/// Deserialization goes through [`FromStr`], so data files may use any case
/// and surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SeismicZone {
    II,
    III,
    IV,
    V,
}

impl SeismicZone {
    /// All zones for iteration
    pub const ALL: [SeismicZone; 4] = [SeismicZone::II, SeismicZone::III, SeismicZone::IV, SeismicZone::V];

    /// Roman-numeral label as written in data files
    pub fn label(&self) -> &'static str {
        match self {
            SeismicZone::II => "II",
            SeismicZone::III => "III",
            SeismicZone::IV => "IV",
            SeismicZone::V => "V",
        }
    }
}

impl fmt::Display for SeismicZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SeismicZone {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_uppercase();
        SeismicZone::ALL
            .into_iter()
            .find(|zone| zone.label() == label)
            .ok_or_else(|| CalcError::invalid_input("seismic_zone", s, "Expected one of II, III, IV, V"))
    }
}

impl TryFrom<String> for SeismicZone {
    type Error = CalcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Loading parameters for one district.
///
/// Field names on the wire match the location data file
/// (`wind`, `seismic_zone`, `seismic_factor`, `temp_max`, `temp_min`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadingRecord {
    /// Basic wind speed (m/s)
    #[serde(rename = "wind")]
    pub wind_speed_mps: f64,

    /// Seismic zone
    pub seismic_zone: SeismicZone,

    /// Seismic zone factor, between 0 and 1
    pub seismic_factor: f64,

    /// Maximum shade air temperature (°C)
    #[serde(rename = "temp_max")]
    pub temp_max_c: f64,

    /// Minimum shade air temperature (°C)
    #[serde(rename = "temp_min")]
    pub temp_min_c: f64,
}

impl LoadingRecord {
    /// Check the record invariants.
    ///
    /// Applied to user-entered custom loading. Records read from a location
    /// data file are taken as-is.
    pub fn validate(&self) -> CalcResult<()> {
        let mut violations = Vec::new();
        if !(self.wind_speed_mps.is_finite() && self.wind_speed_mps > 0.0) {
            violations.push(format!("wind speed must be positive (got {})", self.wind_speed_mps));
        }
        if !(self.seismic_factor > 0.0 && self.seismic_factor < 1.0) {
            violations.push(format!("seismic factor must be between 0 and 1 (got {})", self.seismic_factor));
        }
        if !self.temp_max_c.is_finite() || !self.temp_min_c.is_finite() {
            violations.push("temperatures must be numeric".to_string());
        } else if self.temp_min_c >= self.temp_max_c {
            violations.push(format!(
                "minimum temperature {} must be below maximum {}",
                self.temp_min_c, self.temp_max_c
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(CalcError::validation_failed("loading record", violations))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct StateEntry {
    name: String,
    districts: Vec<(String, LoadingRecord)>,
}

/// Two-level `state → district → LoadingRecord` table.
///
/// Immutable after construction. Every state holds at least one district.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDatabase {
    states: Vec<StateEntry>,
}

const fn record(wind: f64, zone: SeismicZone, factor: f64, temp_max: f64, temp_min: f64) -> LoadingRecord {
    LoadingRecord {
        wind_speed_mps: wind,
        seismic_zone: zone,
        seismic_factor: factor,
        temp_max_c: temp_max,
        temp_min_c: temp_min,
    }
}

const BUILTIN_ROWS: &[(&str, &str, LoadingRecord)] = &[
    ("Maharashtra", "Mumbai", record(39.0, SeismicZone::III, 0.16, 36.0, 18.0)),
    ("Maharashtra", "Pune", record(33.0, SeismicZone::III, 0.16, 34.0, 12.0)),
    ("Delhi NCR", "Delhi", record(39.0, SeismicZone::IV, 0.24, 45.0, 2.0)),
    ("Tamil Nadu", "Chennai", record(44.0, SeismicZone::III, 0.16, 40.0, 20.0)),
    ("Karnataka", "Bengaluru", record(33.0, SeismicZone::III, 0.16, 35.0, 12.0)),
    ("West Bengal", "Kolkata", record(44.0, SeismicZone::III, 0.16, 39.0, 18.0)),
];

static BUILTIN: Lazy<LocationDatabase> = Lazy::new(|| {
    let mut states: Vec<StateEntry> = Vec::new();
    for (state, district, record) in BUILTIN_ROWS {
        match states.iter_mut().find(|entry| entry.name == *state) {
            Some(entry) => entry.districts.push((district.to_string(), *record)),
            None => states.push(StateEntry {
                name: state.to_string(),
                districts: vec![(district.to_string(), *record)],
            }),
        }
    }
    LocationDatabase { states }
});

impl LocationDatabase {
    /// The built-in fallback table.
    pub fn builtin() -> &'static LocationDatabase {
        &BUILTIN
    }

    /// Load the database for this process: the external file when it is
    /// usable, otherwise the built-in table. Never fails.
    pub fn load(external_path: Option<&Path>) -> LocationDatabase {
        external_path
            .and_then(Self::try_load_external)
            .unwrap_or_else(|| {
                debug!("Using built-in location table");
                Self::builtin().clone()
            })
    }

    /// Attempt to read an external location file.
    ///
    /// Returns `None` (after logging) when the file is absent, unreadable,
    /// or not a non-empty `state → district → record` mapping.
    pub fn try_load_external(path: &Path) -> Option<LocationDatabase> {
        if !path.exists() {
            debug!(path = %path.display(), "No external location file");
            return None;
        }
        match Self::load_external(path) {
            Ok(db) => {
                info!(
                    path = %path.display(),
                    states = db.states.len(),
                    districts = db.district_count(),
                    "Loaded external location file"
                );
                Some(db)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring external location file");
                None
            }
        }
    }

    /// Read and parse an external location file, reporting any failure.
    pub fn load_external(path: &Path) -> CalcResult<LocationDatabase> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        Self::from_json_str(&contents)
    }

    /// Parse a location table from JSON text.
    pub fn from_json_str(json: &str) -> CalcResult<LocationDatabase> {
        let top: Map<String, Value> = serde_json::from_str(json)
            .map_err(|e| CalcError::serialization(format!("Invalid location data: {}", e)))?;
        if top.is_empty() {
            return Err(CalcError::serialization("Location data contains no states"));
        }

        let mut states = Vec::with_capacity(top.len());
        for (state, districts) in top {
            let districts: Map<String, Value> = serde_json::from_value(districts)
                .map_err(|e| CalcError::serialization(format!("State '{}': {}", state, e)))?;
            if districts.is_empty() {
                return Err(CalcError::serialization(format!("State '{}' has no districts", state)));
            }

            let mut entries = Vec::with_capacity(districts.len());
            for (district, value) in districts {
                match serde_json::from_value::<LoadingRecord>(value) {
                    Ok(record) => entries.push((district, record)),
                    Err(e) => warn!(%state, %district, error = %e, "Skipping unreadable district record"),
                }
            }
            if entries.is_empty() {
                warn!(%state, "Skipping state with no readable districts");
                continue;
            }
            states.push(StateEntry {
                name: state,
                districts: entries,
            });
        }

        if states.is_empty() {
            return Err(CalcError::serialization("Location data contains no readable records"));
        }
        Ok(LocationDatabase { states })
    }

    /// State names in table order.
    pub fn states(&self) -> Vec<&str> {
        self.states.iter().map(|s| s.name.as_str()).collect()
    }

    /// District names for a state in table order; empty when the state is unknown.
    pub fn districts(&self, state: &str) -> Vec<&str> {
        self.state(state)
            .map(|entry| entry.districts.iter().map(|(name, _)| name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Look up the loading record for a state and district.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bridge_core::location::{LocationDatabase, SeismicZone};
    ///
    /// let delhi = LocationDatabase::builtin().lookup("Delhi NCR", "Delhi").unwrap();
    /// assert_eq!(delhi.seismic_zone, SeismicZone::IV);
    /// assert!(LocationDatabase::builtin().lookup("Goa", "Panaji").is_err());
    /// ```
    pub fn lookup(&self, state: &str, district: &str) -> CalcResult<LoadingRecord> {
        let entry = self.state(state).ok_or_else(|| CalcError::not_found("State", state))?;
        entry
            .districts
            .iter()
            .find(|(name, _)| name == district)
            .map(|(_, record)| *record)
            .ok_or_else(|| CalcError::not_found("District", format!("{} / {}", state, district)))
    }

    /// First state and its first district, used to preselect the form.
    pub fn first_location(&self) -> Option<(&str, &str)> {
        let entry = self.states.first()?;
        let (district, _) = entry.districts.first()?;
        Some((entry.name.as_str(), district.as_str()))
    }

    /// Total number of districts across all states.
    pub fn district_count(&self) -> usize {
        self.states.iter().map(|s| s.districts.len()).sum()
    }

    fn state(&self, name: &str) -> Option<&StateEntry> {
        self.states.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_builtin_mumbai() {
        let record = LocationDatabase::builtin().lookup("Maharashtra", "Mumbai").unwrap();
        assert_eq!(record.wind_speed_mps, 39.0);
        assert_eq!(record.seismic_zone, SeismicZone::III);
        assert_eq!(record.seismic_factor, 0.16);
        assert_eq!(record.temp_max_c, 36.0);
        assert_eq!(record.temp_min_c, 18.0);
    }

    #[test]
    fn test_builtin_order() {
        let db = LocationDatabase::builtin();
        assert_eq!(
            db.states(),
            vec!["Maharashtra", "Delhi NCR", "Tamil Nadu", "Karnataka", "West Bengal"]
        );
        assert_eq!(db.districts("Maharashtra"), vec!["Mumbai", "Pune"]);
        assert_eq!(db.district_count(), 6);
        assert_eq!(db.first_location(), Some(("Maharashtra", "Mumbai")));
    }

    #[test]
    fn test_unknown_keys() {
        let db = LocationDatabase::builtin();
        assert!(db.districts("Goa").is_empty());

        let err = db.lookup("Goa", "Panaji").unwrap_err();
        assert_eq!(err, CalcError::not_found("State", "Goa"));

        let err = db.lookup("Maharashtra", "Nagpur").unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_external_file_preserves_order() {
        let file = write_temp(
            r#"{
                "Zeta": {
                    "Second": {"wind": 50, "seismic_zone": "V", "seismic_factor": 0.36, "temp_max": 30, "temp_min": 5},
                    "First": {"wind": 47, "seismic_zone": "IV", "seismic_factor": 0.24, "temp_max": 31, "temp_min": 6}
                },
                "Alpha": {
                    "Only": {"wind": 33, "seismic_zone": "II", "seismic_factor": 0.10, "temp_max": 42, "temp_min": 8}
                }
            }"#,
        );

        let db = LocationDatabase::load(Some(file.path()));
        assert_eq!(db.states(), vec!["Zeta", "Alpha"]);
        assert_eq!(db.districts("Zeta"), vec!["Second", "First"]);
        assert_eq!(db.lookup("Alpha", "Only").unwrap().seismic_zone, SeismicZone::II);
        // External data replaces the built-in table entirely
        assert!(db.lookup("Maharashtra", "Mumbai").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("external_db.json");
        assert!(LocationDatabase::try_load_external(&path).is_none());
        assert_eq!(&LocationDatabase::load(Some(path.as_path())), LocationDatabase::builtin());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let file = write_temp("{ not json");
        assert!(LocationDatabase::try_load_external(file.path()).is_none());
        assert!(LocationDatabase::load_external(file.path()).is_err());
        assert_eq!(&LocationDatabase::load(Some(file.path())), LocationDatabase::builtin());
    }

    #[test]
    fn test_empty_mapping_falls_back() {
        let file = write_temp("{}");
        assert!(LocationDatabase::try_load_external(file.path()).is_none());

        let file = write_temp(r#"{"Goa": {}}"#);
        assert!(LocationDatabase::try_load_external(file.path()).is_none());

        let file = write_temp("[1, 2, 3]");
        assert!(LocationDatabase::try_load_external(file.path()).is_none());
    }

    #[test]
    fn test_unreadable_district_skipped() {
        let file = write_temp(
            r#"{
                "Goa": {
                    "Panaji": {"wind": 39, "seismic_zone": "III", "seismic_factor": 0.16, "temp_max": 34, "temp_min": 20},
                    "Margao": {"wind": 39, "seismic_zone": " iii", "seismic_factor": 0.16, "temp_max": 35, "temp_min": 21},
                    "Vasco": {"wind": "fast", "seismic_zone": "III", "seismic_factor": 0.16, "temp_max": 33, "temp_min": 22}
                },
                "Broken": {
                    "Nowhere": {"wind": 39}
                }
            }"#,
        );

        let db = LocationDatabase::load_external(file.path()).unwrap();
        assert_eq!(db.states(), vec!["Goa"]);
        assert_eq!(db.districts("Goa"), vec!["Panaji", "Margao"]);
        assert_eq!(db.lookup("Goa", "Margao").unwrap().seismic_zone, SeismicZone::III);
        assert!(db.lookup("Goa", "Vasco").is_err());
    }

    #[test]
    fn test_file_without_readable_records_falls_back() {
        let file = write_temp(r#"{"Goa": {"Panaji": {"wind": 39}}}"#);
        assert_eq!(
            LocationDatabase::load_external(file.path()).unwrap_err().error_code(),
            "SERIALIZATION_ERROR"
        );
        assert_eq!(&LocationDatabase::load(Some(file.path())), LocationDatabase::builtin());
    }

    #[test]
    fn test_no_path_uses_builtin() {
        assert_eq!(&LocationDatabase::load(None), LocationDatabase::builtin());
    }

    #[test]
    fn test_seismic_zone_parsing() {
        assert_eq!(" iv ".parse::<SeismicZone>().unwrap(), SeismicZone::IV);
        assert!("VI".parse::<SeismicZone>().is_err());
        assert_eq!(serde_json::to_string(&SeismicZone::III).unwrap(), "\"III\"");
        assert_eq!(serde_json::from_str::<SeismicZone>("\"v\"").unwrap(), SeismicZone::V);
        assert!(serde_json::from_str::<SeismicZone>("\"VI\"").is_err());
    }

    #[test]
    fn test_record_validation() {
        let good = record(39.0, SeismicZone::III, 0.16, 36.0, 18.0);
        assert!(good.validate().is_ok());

        let bad = record(0.0, SeismicZone::III, 1.5, 10.0, 20.0);
        match bad.validate().unwrap_err() {
            CalcError::ValidationFailed { violations, .. } => assert_eq!(violations.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_record_wire_names() {
        let json = serde_json::to_value(record(44.0, SeismicZone::III, 0.16, 40.0, 20.0)).unwrap();
        assert_eq!(json["wind"], 44.0);
        assert_eq!(json["temp_min"], 20.0);
    }
}
