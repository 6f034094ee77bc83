//! # Project Export
//!
//! Writes the session's parameters to a JSON file for downstream design
//! tools.
//!
//! - **Preconditions first**: span and carriageway limits are checked, and a
//!   large skew needs the caller's confirmation, before anything is written
//! - **Atomic saves**: write to `<name>.tmp`, sync, rename, so an interrupted
//!   export never leaves a partial file
//!
//! ## File Format
//!
//! ```json
//! {
//!   "type_of_structure": "Highway",
//!   "location_mode": "location",
//!   "state": "Maharashtra",
//!   "district": "Mumbai",
//!   "wind": 39.0,
//!   "seismic_zone": "III",
//!   "seismic_factor": 0.16,
//!   "temp_max": 36.0,
//!   "temp_min": 18.0,
//!   "geometric": { "span": 30.0, "carriageway_width": 10.0, "footpath": "None", "skew": 0.0, "live_load": 5.0 },
//!   "materials": { "girder_steel": "E250", "bracing_steel": "E250", "deck_concrete": "M25" },
//!   "modify_geometry": { "spacing": 3.5, "girders": 4, "overhang": 1.0 }
//! }
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use bridge_core::export::{export_project, ExportLimits, ExportOutcome};
//! use bridge_core::geometry::GeometrySettings;
//! use bridge_core::location::LocationDatabase;
//! use bridge_core::project::Session;
//! use std::path::Path;
//!
//! let session = Session::new(LocationDatabase::builtin(), GeometrySettings::default());
//! let outcome = export_project(
//!     &session,
//!     Path::new("group_design_project.json"),
//!     &ExportLimits::default(),
//!     |_skew| true,
//! )?;
//! assert!(matches!(outcome, ExportOutcome::Written(_)));
//! # Ok::<(), bridge_core::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{CalcError, CalcResult};
use crate::geometry::GeometrySpec;
use crate::location::SeismicZone;
use crate::materials::MaterialSelection;
use crate::project::{GeometricDetails, LocationMode, Session, StructureType};

/// Suggested file name for exports
pub const DEFAULT_EXPORT_FILE_NAME: &str = "group_design_project.json";

/// Export preconditions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportLimits {
    /// Minimum span, inclusive (m)
    pub span_min_m: f64,

    /// Maximum span, inclusive (m)
    pub span_max_m: f64,

    /// Minimum carriageway width, inclusive (m)
    pub carriageway_min_m: f64,

    /// Maximum carriageway width, exclusive (m)
    pub carriageway_max_m: f64,

    /// Skew magnitude above which the user must confirm (degrees)
    pub skew_warning_deg: f64,
}

impl Default for ExportLimits {
    fn default() -> Self {
        ExportLimits {
            span_min_m: 20.0,
            span_max_m: 45.0,
            carriageway_min_m: 4.25,
            carriageway_max_m: 24.0,
            skew_warning_deg: 15.0,
        }
    }
}

/// Outcome of the precondition check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportCheck {
    /// All limits satisfied
    Ready,
    /// Limits satisfied, but the skew exceeds the warning angle
    NeedsConfirmation { skew_deg: f64 },
}

/// Outcome of an export request
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// File written to this path
    Written(PathBuf),
    /// The user declined the skew warning; nothing was written
    Declined,
}

/// Girder layout as written under `modify_geometry`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportedGeometry {
    pub spacing: f64,
    pub girders: u32,
    pub overhang: f64,
}

impl From<&GeometrySpec> for ExportedGeometry {
    fn from(spec: &GeometrySpec) -> Self {
        ExportedGeometry {
            spacing: spec.girder_spacing_m,
            girders: spec.girder_count,
            overhang: spec.deck_overhang_m,
        }
    }
}

/// The exported project document.
///
/// Loading fields are `null` when no record is resolved (custom mode before
/// values are entered).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectExport {
    pub type_of_structure: StructureType,
    pub location_mode: LocationMode,
    pub state: String,
    pub district: String,
    pub wind: Option<f64>,
    pub seismic_zone: Option<SeismicZone>,
    pub seismic_factor: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub geometric: GeometricDetails,
    pub materials: MaterialSelection,
    pub modify_geometry: Option<ExportedGeometry>,
}

impl ProjectExport {
    /// Snapshot the session into an export document
    pub fn from_session(session: &Session) -> Self {
        let input = &session.input;
        let loading = input.loading;
        ProjectExport {
            type_of_structure: input.structure,
            location_mode: input.location_mode,
            state: input.state.clone(),
            district: input.district.clone(),
            wind: loading.map(|r| r.wind_speed_mps),
            seismic_zone: loading.map(|r| r.seismic_zone),
            seismic_factor: loading.map(|r| r.seismic_factor),
            temp_max: loading.map(|r| r.temp_max_c),
            temp_min: loading.map(|r| r.temp_min_c),
            geometric: input.geometric,
            materials: input.materials,
            modify_geometry: session.geometry().map(ExportedGeometry::from),
        }
    }
}

/// Check export preconditions without writing anything.
///
/// # Returns
///
/// * `Ok(ExportCheck::Ready)` - safe to write
/// * `Ok(ExportCheck::NeedsConfirmation)` - skew beyond the warning angle
/// * `Err(CalcError::ValidationFailed)` - span or carriageway out of range
/// * `Err(CalcError::InvalidInput)` - unsupported structure type
pub fn check_export(session: &Session, limits: &ExportLimits) -> CalcResult<ExportCheck> {
    session.ensure_supported()?;
    let geometric = &session.input.geometric;
    let mut violations = Vec::new();

    let span = geometric.span_m;
    if !(span >= limits.span_min_m && span <= limits.span_max_m) {
        violations.push(format!(
            "span {} m outside {}-{} m",
            span, limits.span_min_m, limits.span_max_m
        ));
    }

    let carriageway = geometric.carriageway_width_m;
    if !(carriageway >= limits.carriageway_min_m && carriageway < limits.carriageway_max_m) {
        violations.push(format!(
            "carriageway width {} m must be at least {} m and below {} m",
            carriageway, limits.carriageway_min_m, limits.carriageway_max_m
        ));
    }

    if !geometric.skew_deg.is_finite() {
        violations.push("skew angle must be a number".to_string());
    }
    if !(geometric.live_load_kn_per_m.is_finite() && geometric.live_load_kn_per_m >= 0.0) {
        violations.push("live load must be zero or positive".to_string());
    }

    if !violations.is_empty() {
        return Err(CalcError::validation_failed("export", violations));
    }

    if geometric.skew_deg.abs() > limits.skew_warning_deg {
        Ok(ExportCheck::NeedsConfirmation {
            skew_deg: geometric.skew_deg,
        })
    } else {
        Ok(ExportCheck::Ready)
    }
}

/// Validate and export the session.
///
/// `confirm_skew` is called with the skew angle only when it exceeds the
/// warning angle; returning `false` cancels the export.
pub fn export_project<F>(session: &Session, path: &Path, limits: &ExportLimits, confirm_skew: F) -> CalcResult<ExportOutcome>
where
    F: FnOnce(f64) -> bool,
{
    if let ExportCheck::NeedsConfirmation { skew_deg } = check_export(session, limits)? {
        if !confirm_skew(skew_deg) {
            info!(skew_deg, "Export declined at skew warning");
            return Ok(ExportOutcome::Declined);
        }
    }

    let document = ProjectExport::from_session(session);
    save_export(&document, path)?;
    info!(path = %path.display(), "Project exported");
    Ok(ExportOutcome::Written(path.to_path_buf()))
}

/// Write an export document with atomic write semantics.
///
/// 1. Serialize to pretty JSON
/// 2. Write to `<file name>.tmp` next to the target
/// 3. Sync to disk
/// 4. Rename over the target
pub fn save_export(document: &ProjectExport, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(document).map_err(|e| CalcError::serialization(e.to_string()))?;

    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// Read a previously exported project file.
pub fn load_export(path: &Path) -> CalcResult<ProjectExport> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&contents)
        .map_err(|e| CalcError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))
}

/// Temp file path used during an atomic save
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_EXPORT_FILE_NAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometrySettings;
    use crate::location::LocationDatabase;
    use std::cell::Cell;

    fn session() -> Session {
        Session::new(LocationDatabase::builtin(), GeometrySettings::default())
    }

    fn violations(result: CalcResult<ExportCheck>) -> Vec<String> {
        match result {
            Err(CalcError::ValidationFailed { violations, .. }) => violations,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_exportable() {
        assert_eq!(check_export(&session(), &ExportLimits::default()).unwrap(), ExportCheck::Ready);
    }

    #[test]
    fn test_span_limits() {
        let limits = ExportLimits::default();
        let mut session = session();

        session.input.geometric.span_m = 50.0;
        let found = violations(check_export(&session, &limits));
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("span 50 m"));

        session.input.geometric.span_m = 20.0;
        assert!(check_export(&session, &limits).is_ok());
        session.input.geometric.span_m = 45.0;
        assert!(check_export(&session, &limits).is_ok());
        session.input.geometric.span_m = 19.99;
        assert!(check_export(&session, &limits).is_err());
    }

    #[test]
    fn test_carriageway_limits() {
        let limits = ExportLimits::default();
        let mut session = session();

        session.input.geometric.carriageway_width_m = 3.0;
        let found = violations(check_export(&session, &limits));
        assert!(found[0].contains("carriageway width 3 m"));

        session.input.geometric.carriageway_width_m = 4.25;
        assert!(check_export(&session, &limits).is_ok());
        session.input.geometric.carriageway_width_m = 24.0;
        assert!(check_export(&session, &limits).is_err());
    }

    #[test]
    fn test_all_violations_reported() {
        let mut session = session();
        session.input.geometric.span_m = 50.0;
        session.input.geometric.carriageway_width_m = 3.0;
        let found = violations(check_export(&session, &ExportLimits::default()));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_skew_needs_confirmation() {
        let mut session = session();
        session.input.geometric.skew_deg = 15.0;
        assert_eq!(check_export(&session, &ExportLimits::default()).unwrap(), ExportCheck::Ready);

        session.input.geometric.skew_deg = -20.0;
        assert_eq!(
            check_export(&session, &ExportLimits::default()).unwrap(),
            ExportCheck::NeedsConfirmation { skew_deg: -20.0 }
        );
    }

    #[test]
    fn test_other_structure_not_exportable() {
        let mut session = session();
        session.set_structure_type(StructureType::Other);
        let err = check_export(&session, &ExportLimits::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_export_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_FILE_NAME);
        let asked = Cell::new(false);

        let outcome = export_project(&session(), &path, &ExportLimits::default(), |_| {
            asked.set(true);
            true
        })
        .unwrap();

        assert_eq!(outcome, ExportOutcome::Written(path.clone()));
        assert!(!asked.get());
        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());

        let loaded = load_export(&path).unwrap();
        assert_eq!(loaded.state, "Maharashtra");
        assert_eq!(loaded.wind, Some(39.0));
        assert_eq!(loaded.geometric.span_m, 30.0);
        assert_eq!(loaded.modify_geometry, None);
    }

    #[test]
    fn test_skew_export_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skewed.json");
        let mut session = session();
        session.input.geometric.skew_deg = 20.0;

        let outcome = export_project(&session, &path, &ExportLimits::default(), |skew| {
            assert_eq!(skew, 20.0);
            true
        })
        .unwrap();
        assert_eq!(outcome, ExportOutcome::Written(path.clone()));
        assert_eq!(load_export(&path).unwrap().geometric.skew_deg, 20.0);
    }

    #[test]
    fn test_skew_export_declined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skewed.json");
        let mut session = session();
        session.input.geometric.skew_deg = 20.0;

        let outcome = export_project(&session, &path, &ExportLimits::default(), |_| false).unwrap();
        assert_eq!(outcome, ExportOutcome::Declined);
        assert!(!path.exists());
    }

    #[test]
    fn test_rejected_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rejected.json");
        let mut session = session();
        session.input.geometric.span_m = 50.0;

        assert!(export_project(&session, &path, &ExportLimits::default(), |_| true).is_err());
        assert!(!path.exists());
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn test_document_shape() {
        let mut session = session();
        let mut editor = session.open_geometry_editor().unwrap();
        editor.set_girders(Some(4));
        session.commit_geometry(&editor).unwrap();

        let json = serde_json::to_value(ProjectExport::from_session(&session)).unwrap();
        assert_eq!(json["type_of_structure"], "Highway");
        assert_eq!(json["location_mode"], "location");
        assert_eq!(json["seismic_zone"], "III");
        assert_eq!(json["geometric"]["live_load"], 5.0);
        assert_eq!(json["materials"]["deck_concrete"], "M25");
        assert_eq!(json["modify_geometry"]["girders"], 4);
        assert_eq!(json["modify_geometry"]["spacing"], 3.5);
    }

    #[test]
    fn test_custom_mode_without_record_exports_nulls() {
        let db = LocationDatabase::builtin();
        let mut session = session();
        session.set_location_mode(db, LocationMode::Custom);

        let json = serde_json::to_value(ProjectExport::from_session(&session)).unwrap();
        assert_eq!(json["location_mode"], "custom");
        assert!(json["wind"].is_null());
        assert!(json["modify_geometry"].is_null());
    }

    #[test]
    fn test_load_export_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(load_export(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_tmp_path() {
        assert_eq!(
            tmp_path_for(Path::new("/exports/project.json")),
            Path::new("/exports/project.json.tmp")
        );
    }
}
