//! # Girder Geometry
//!
//! Keeps girder spacing, girder count, and deck overhang consistent with the
//! overall deck width while the user edits them:
//!
//! ```text
//! (overall_width - overhang) / spacing = girder_count
//! overall_width = carriageway_width + 5.0
//! ```
//!
//! Editing one field recomputes exactly one other field ([`recompute`]). The
//! propagation is a single step; nothing here triggers a further recompute,
//! so the caller decides when each edit is applied.
//!
//! A [`GeometryEditor`] holds one editing session. Its draft only becomes a
//! [`GeometrySpec`] through [`GeometryEditor::commit`], which checks the
//! relation within a tolerance of half a girder.
//!
//! ## Example
//!
//! ```rust
//! use bridge_core::geometry::{GeometryEditor, GeometrySettings};
//!
//! let mut editor = GeometryEditor::open(10.0, None, GeometrySettings::default()).unwrap();
//! assert_eq!(editor.overall_width_m(), 15.0);
//!
//! // 14 m between overhangs at 3.5 m spacing gives 4 girders
//! editor.set_spacing(Some(3.5));
//! assert_eq!(editor.draft().girders, Some(4));
//!
//! let spec = editor.commit().unwrap();
//! assert_eq!(spec.girder_count, 4);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};

/// Default girder spacing for a new editing session (m)
pub const DEFAULT_SPACING_M: f64 = 3.0;

/// Default girder count, also used by calculations when no geometry is committed
pub const DEFAULT_GIRDER_COUNT: u32 = 4;

/// Default deck overhang for a new editing session (m)
pub const DEFAULT_OVERHANG_M: f64 = 1.0;

/// Allowance added to the carriageway for footpaths and parapets (m)
pub const WIDTH_ALLOWANCE_M: f64 = 5.0;

/// Allowed mismatch, in girders, between the stated count and
/// `(overall_width - overhang) / spacing`.
pub const RELATION_TOLERANCE: f64 = 0.5;

/// Lower bound on spacing recomputed from an overhang edit (m)
pub const MIN_RECOMPUTED_SPACING_M: f64 = 0.1;

/// Tunable geometry constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySettings {
    /// Added to the carriageway width to get the overall deck width (m)
    pub width_allowance_m: f64,

    /// Relation tolerance applied at commit, in girders
    pub relation_tolerance: f64,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        GeometrySettings {
            width_allowance_m: WIDTH_ALLOWANCE_M,
            relation_tolerance: RELATION_TOLERANCE,
        }
    }
}

impl GeometrySettings {
    /// Overall deck width for a carriageway width
    pub fn overall_width_m(&self, carriageway_width_m: f64) -> f64 {
        carriageway_width_m + self.width_allowance_m
    }
}

/// The field a user just edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryField {
    Spacing,
    Girders,
    Overhang,
}

/// In-progress geometry values.
///
/// `None` stands for an empty or unparseable form field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryDraft {
    pub spacing_m: Option<f64>,
    pub girders: Option<u32>,
    pub overhang_m: Option<f64>,
}

impl GeometryDraft {
    /// Draft pre-filled with the session defaults (3.0 m, 4 girders, 1.0 m)
    pub fn defaults() -> Self {
        GeometryDraft {
            spacing_m: Some(DEFAULT_SPACING_M),
            girders: Some(DEFAULT_GIRDER_COUNT),
            overhang_m: Some(DEFAULT_OVERHANG_M),
        }
    }

    /// Draft pre-filled from a committed layout
    pub fn from_spec(spec: &GeometrySpec) -> Self {
        GeometryDraft {
            spacing_m: Some(spec.girder_spacing_m),
            girders: Some(spec.girder_count),
            overhang_m: Some(spec.deck_overhang_m),
        }
    }
}

/// Committed girder layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometrySpec {
    /// Carriageway width the layout was committed against (m)
    pub carriageway_width_m: f64,

    /// Carriageway width plus the width allowance (m)
    pub overall_width_m: f64,

    /// Centre-to-centre girder spacing, one decimal (m)
    pub girder_spacing_m: f64,

    /// Number of girders
    pub girder_count: u32,

    /// Deck overhang, one decimal (m)
    pub deck_overhang_m: f64,
}

/// Round to one decimal place, ties to even (3.25 -> 3.2, 3.75 -> 3.8)
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Propagate an edit of `changed` to one other field.
///
/// - Spacing edited: girders = max(1, round((overall - overhang) / spacing))
/// - Girders edited: spacing = (overall - overhang) / girders, one decimal
/// - Overhang edited: spacing = max(0.1, (overall - overhang) / girders), one decimal
///
/// An unset overhang counts as 0 and an unset girder count as 1. Edits that
/// would produce a non-positive value, or a girder count beyond `u32`, leave
/// the draft unchanged.
///
/// # Example
///
/// ```rust
/// use bridge_core::geometry::{recompute, GeometryDraft, GeometryField};
///
/// let draft = GeometryDraft { spacing_m: Some(2.8), girders: None, overhang_m: Some(1.0) };
/// let next = recompute(GeometryField::Spacing, draft, 15.0);
/// assert_eq!(next.girders, Some(5));
/// assert_eq!(next.spacing_m, Some(2.8));
/// ```
pub fn recompute(changed: GeometryField, draft: GeometryDraft, overall_width_m: f64) -> GeometryDraft {
    let mut next = draft;
    match changed {
        GeometryField::Spacing => {
            if let Some(spacing) = draft.spacing_m.filter(|s| *s > 0.0) {
                let raw = (overall_width_m - draft.overhang_m.unwrap_or(0.0)) / spacing;
                let count = raw.round_ties_even();
                if raw > 0.0 && count <= u32::MAX as f64 {
                    next.girders = Some((count as u32).max(1));
                }
            }
        }
        GeometryField::Girders => {
            if let Some(girders) = draft.girders.filter(|g| *g >= 1) {
                let raw = (overall_width_m - draft.overhang_m.unwrap_or(0.0)) / girders as f64;
                if raw.is_finite() && raw > 0.0 {
                    next.spacing_m = Some(round_to_tenth(raw));
                }
            }
        }
        GeometryField::Overhang => {
            if let Some(overhang) = draft.overhang_m.filter(|o| o.is_finite()) {
                let girders = draft.girders.unwrap_or(1);
                if girders >= 1 {
                    let raw = (overall_width_m - overhang) / girders as f64;
                    next.spacing_m = Some(round_to_tenth(raw.max(MIN_RECOMPUTED_SPACING_M)));
                }
            }
        }
    }
    debug!(?changed, before = ?draft, after = ?next, "Recomputed geometry");
    next
}

/// Validate a draft against the overall width and commit it.
///
/// All violated constraints are reported together. The relation check only
/// runs once every value is present and in range.
pub fn commit(draft: &GeometryDraft, carriageway_width_m: f64, settings: &GeometrySettings) -> CalcResult<GeometrySpec> {
    let overall = settings.overall_width_m(carriageway_width_m);
    let mut violations = Vec::new();

    let (spacing, girders, overhang) = match (draft.spacing_m, draft.girders, draft.overhang_m) {
        (Some(s), Some(g), Some(o)) => (s, g, o),
        _ => {
            for (name, missing) in [
                ("girder spacing", draft.spacing_m.is_none()),
                ("number of girders", draft.girders.is_none()),
                ("deck overhang", draft.overhang_m.is_none()),
            ] {
                if missing {
                    violations.push(format!("{} must be a number", name));
                }
            }
            return Err(CalcError::validation_failed("geometry", violations));
        }
    };

    if !(spacing.is_finite() && spacing > 0.0) {
        violations.push(format!("girder spacing must be positive (got {})", spacing));
    } else if spacing >= overall {
        violations.push(format!(
            "girder spacing {} m must be less than overall width {} m",
            spacing, overall
        ));
    }
    if girders == 0 {
        violations.push("number of girders must be at least 1".to_string());
    }
    if !(overhang.is_finite() && overhang >= 0.0) {
        violations.push(format!("deck overhang must not be negative (got {})", overhang));
    } else if overhang >= overall {
        violations.push(format!(
            "deck overhang {} m must be less than overall width {} m",
            overhang, overall
        ));
    }

    if violations.is_empty() {
        let implied = (overall - overhang) / spacing;
        if (implied - girders as f64).abs() > settings.relation_tolerance {
            violations.push(format!(
                "(overall width - overhang) / spacing = {:.2} does not match {} girders within {}",
                implied, girders, settings.relation_tolerance
            ));
        }
    }

    if !violations.is_empty() {
        return Err(CalcError::validation_failed("geometry", violations));
    }

    Ok(GeometrySpec {
        carriageway_width_m,
        overall_width_m: overall,
        girder_spacing_m: round_to_tenth(spacing),
        girder_count: girders,
        deck_overhang_m: round_to_tenth(overhang),
    })
}

/// One geometry editing session.
///
/// Opened from a carriageway width and the previously committed layout.
/// Dropping the editor discards the draft; the caller's committed layout is
/// untouched until [`GeometryEditor::commit`] succeeds and the result is
/// stored.
#[derive(Debug, Clone)]
pub struct GeometryEditor {
    carriageway_width_m: f64,
    settings: GeometrySettings,
    draft: GeometryDraft,
}

impl GeometryEditor {
    /// Start editing. Fails if the carriageway width is not a positive number.
    pub fn open(
        carriageway_width_m: f64,
        previous: Option<&GeometrySpec>,
        settings: GeometrySettings,
    ) -> CalcResult<Self> {
        if !(carriageway_width_m.is_finite() && carriageway_width_m > 0.0) {
            return Err(CalcError::invalid_input(
                "carriageway_width_m",
                carriageway_width_m.to_string(),
                "Enter a valid carriageway width before editing geometry",
            ));
        }
        let draft = previous.map(GeometryDraft::from_spec).unwrap_or_else(GeometryDraft::defaults);
        Ok(GeometryEditor {
            carriageway_width_m,
            settings,
            draft,
        })
    }

    /// Current draft values
    pub fn draft(&self) -> &GeometryDraft {
        &self.draft
    }

    /// Carriageway width this session edits against (m)
    pub fn carriageway_width_m(&self) -> f64 {
        self.carriageway_width_m
    }

    /// Overall deck width (m)
    pub fn overall_width_m(&self) -> f64 {
        self.settings.overall_width_m(self.carriageway_width_m)
    }

    /// Edit girder spacing; recomputes the girder count
    pub fn set_spacing(&mut self, spacing_m: Option<f64>) {
        self.draft.spacing_m = spacing_m;
        self.apply(GeometryField::Spacing);
    }

    /// Edit girder count; recomputes the spacing
    pub fn set_girders(&mut self, girders: Option<u32>) {
        self.draft.girders = girders;
        self.apply(GeometryField::Girders);
    }

    /// Edit deck overhang; recomputes the spacing
    pub fn set_overhang(&mut self, overhang_m: Option<f64>) {
        self.draft.overhang_m = overhang_m;
        self.apply(GeometryField::Overhang);
    }

    /// Validate the draft and produce a committed layout
    pub fn commit(&self) -> CalcResult<GeometrySpec> {
        commit(&self.draft, self.carriageway_width_m, &self.settings)
    }

    fn apply(&mut self, field: GeometryField) {
        self.draft = recompute(field, self.draft, self.overall_width_m());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERALL: f64 = 15.0;

    fn draft(spacing: f64, girders: u32, overhang: f64) -> GeometryDraft {
        GeometryDraft {
            spacing_m: Some(spacing),
            girders: Some(girders),
            overhang_m: Some(overhang),
        }
    }

    fn violations(result: CalcResult<GeometrySpec>) -> Vec<String> {
        match result {
            Err(CalcError::ValidationFailed { violations, .. }) => violations,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_spacing_edit_sets_girders() {
        // (15 - 1) / 3.0 = 4.67 -> 5
        let next = recompute(GeometryField::Spacing, draft(3.0, 4, 1.0), OVERALL);
        assert_eq!(next.girders, Some(5));
        assert_eq!(next.spacing_m, Some(3.0));
        assert_eq!(next.overhang_m, Some(1.0));
    }

    #[test]
    fn test_spacing_edit_rounds_ties_to_even() {
        // (15 - 0) / 6.0 = 2.5 -> 2
        let next = recompute(GeometryField::Spacing, draft(6.0, 4, 0.0), OVERALL);
        assert_eq!(next.girders, Some(2));
    }

    #[test]
    fn test_spacing_edit_clamps_to_one_girder() {
        // (15 - 1) / 14.5 = 0.97 -> 1, and 14 / 40 = 0.35 -> max(1, 0) = 1
        let next = recompute(GeometryField::Spacing, draft(14.5, 4, 1.0), OVERALL);
        assert_eq!(next.girders, Some(1));
        let next = recompute(GeometryField::Spacing, draft(40.0, 4, 1.0), OVERALL);
        assert_eq!(next.girders, Some(1));
    }

    #[test]
    fn test_spacing_edit_ignored_when_invalid() {
        let start = draft(0.0, 4, 1.0);
        assert_eq!(recompute(GeometryField::Spacing, start, OVERALL), start);

        let start = GeometryDraft { spacing_m: None, ..draft(3.0, 4, 1.0) };
        assert_eq!(recompute(GeometryField::Spacing, start, OVERALL), start);

        // Overhang wider than the deck makes the raw count negative
        let start = draft(3.0, 4, 20.0);
        assert_eq!(recompute(GeometryField::Spacing, start, OVERALL), start);
    }

    #[test]
    fn test_spacing_edit_without_overhang() {
        let start = GeometryDraft { overhang_m: None, ..draft(3.0, 4, 0.0) };
        let next = recompute(GeometryField::Spacing, start, OVERALL);
        assert_eq!(next.girders, Some(5));
        assert_eq!(next.overhang_m, None);
    }

    #[test]
    fn test_girders_edit_sets_spacing() {
        // (15 - 1) / 4 = 3.5
        let next = recompute(GeometryField::Girders, draft(3.0, 4, 1.0), OVERALL);
        assert_eq!(next.spacing_m, Some(3.5));

        // (15 - 1) / 3 = 4.666 -> 4.7
        let next = recompute(GeometryField::Girders, draft(3.0, 3, 1.0), OVERALL);
        assert_eq!(next.spacing_m, Some(4.7));
    }

    #[test]
    fn test_girders_edit_rounds_tenths_to_even() {
        // 9 m carriageway: (14 - 1) / 4 = 3.25 -> 3.2
        let next = recompute(GeometryField::Girders, draft(3.0, 4, 1.0), 14.0);
        assert_eq!(next.spacing_m, Some(3.2));

        // (16 - 1) / 4 = 3.75 -> 3.8
        let next = recompute(GeometryField::Girders, draft(3.0, 4, 1.0), 16.0);
        assert_eq!(next.spacing_m, Some(3.8));
    }

    #[test]
    fn test_spacing_edit_ignored_when_count_overflows() {
        let start = draft(1e-12, 4, 1.0);
        assert_eq!(recompute(GeometryField::Spacing, start, OVERALL), start);
    }

    #[test]
    fn test_girders_edit_ignored_when_zero() {
        let start = draft(3.0, 0, 1.0);
        assert_eq!(recompute(GeometryField::Girders, start, OVERALL), start);
    }

    #[test]
    fn test_overhang_edit_sets_spacing() {
        // (15 - 3) / 4 = 3.0
        let next = recompute(GeometryField::Overhang, draft(3.5, 4, 3.0), OVERALL);
        assert_eq!(next.spacing_m, Some(3.0));
        assert_eq!(next.girders, Some(4));
    }

    #[test]
    fn test_overhang_edit_defaults_to_one_girder() {
        let start = GeometryDraft { girders: None, ..draft(3.0, 4, 2.0) };
        let next = recompute(GeometryField::Overhang, start, OVERALL);
        assert_eq!(next.spacing_m, Some(13.0));
    }

    #[test]
    fn test_overhang_edit_floors_spacing() {
        // (15 - 16) / 4 is negative, floored at 0.1
        let next = recompute(GeometryField::Overhang, draft(3.0, 4, 16.0), OVERALL);
        assert_eq!(next.spacing_m, Some(0.1));
    }

    #[test]
    fn test_spacing_girders_round_trip() {
        for spacing in [3.5, 2.8, 7.0, 4.7] {
            let after_spacing = recompute(GeometryField::Spacing, draft(spacing, 1, 1.0), OVERALL);
            let after_girders = recompute(GeometryField::Girders, after_spacing, OVERALL);
            let back = after_girders.spacing_m.unwrap();
            assert!(
                (back - spacing).abs() <= 0.1 + 1e-9,
                "spacing {} came back as {}",
                spacing,
                back
            );
        }
    }

    #[test]
    fn test_round_trip_is_stable_for_derived_spacings() {
        for girders in 1..=10 {
            let derived = recompute(GeometryField::Girders, draft(1.0, girders, 1.0), OVERALL);
            let counted = recompute(GeometryField::Spacing, derived, OVERALL);
            assert_eq!(counted.girders, Some(girders));
            let again = recompute(GeometryField::Girders, counted, OVERALL);
            assert_eq!(again.spacing_m, derived.spacing_m);
        }
    }

    #[test]
    fn test_commit_defaults() {
        // (15 - 1) / 3 = 4.67 is 0.67 away from 4 girders
        let result = commit(&GeometryDraft::defaults(), 10.0, &GeometrySettings::default());
        assert_eq!(violations(result).len(), 1);

        // 8 m carriageway: (13 - 1) / 3 = 4.0
        let spec = commit(&GeometryDraft::defaults(), 8.0, &GeometrySettings::default()).unwrap();
        assert_eq!(spec.overall_width_m, 13.0);
        assert_eq!(spec.girder_count, 4);
    }

    #[test]
    fn test_commit_within_tolerance() {
        // (15 - 1) / 3.0 = 4.67, 0.33 from 5
        let spec = commit(&draft(3.0, 5, 1.0), 10.0, &GeometrySettings::default()).unwrap();
        assert_eq!(spec.girder_spacing_m, 3.0);
        assert_eq!(spec.girder_count, 5);
        assert_eq!(spec.deck_overhang_m, 1.0);
        assert_eq!(spec.carriageway_width_m, 10.0);
    }

    #[test]
    fn test_commit_rounds_to_one_decimal() {
        let spec = commit(&draft(3.46, 4, 1.04), 10.0, &GeometrySettings::default()).unwrap();
        assert_eq!(spec.girder_spacing_m, 3.5);
        assert_eq!(spec.deck_overhang_m, 1.0);
    }

    #[test]
    fn test_commit_rounds_tenths_to_even() {
        // (14 - 1.25) / 3.25 = 3.92, within 0.5 of 4
        let spec = commit(&draft(3.25, 4, 1.25), 9.0, &GeometrySettings::default()).unwrap();
        assert_eq!(spec.girder_spacing_m, 3.2);
        assert_eq!(spec.deck_overhang_m, 1.2);
    }

    #[test]
    fn test_commit_rejects_zero_spacing() {
        let found = violations(commit(&draft(0.0, 4, 1.0), 10.0, &GeometrySettings::default()));
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("spacing must be positive"));
    }

    #[test]
    fn test_commit_rejects_zero_girders() {
        let found = violations(commit(&draft(3.5, 0, 1.0), 10.0, &GeometrySettings::default()));
        assert!(found.iter().any(|v| v.contains("at least 1")));
    }

    #[test]
    fn test_commit_rejects_overhang_at_overall_width() {
        let found = violations(commit(&draft(3.0, 4, 15.0), 10.0, &GeometrySettings::default()));
        assert!(found.iter().any(|v| v.contains("deck overhang 15 m must be less than overall width 15 m")));
    }

    #[test]
    fn test_commit_rejects_spacing_at_overall_width() {
        let found = violations(commit(&draft(15.0, 1, 0.0), 10.0, &GeometrySettings::default()));
        assert!(found.iter().any(|v| v.contains("girder spacing 15 m")));
    }

    #[test]
    fn test_commit_rejects_negative_overhang() {
        let found = violations(commit(&draft(3.5, 4, -1.0), 10.0, &GeometrySettings::default()));
        assert!(found.iter().any(|v| v.contains("must not be negative")));
    }

    #[test]
    fn test_commit_rejects_relation_mismatch() {
        // (15 - 1) / 3.5 = 4.0 vs 6 girders
        let found = violations(commit(&draft(3.5, 6, 1.0), 10.0, &GeometrySettings::default()));
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("does not match 6 girders"));
    }

    #[test]
    fn test_commit_reports_missing_values() {
        let found = violations(commit(&GeometryDraft::default(), 10.0, &GeometrySettings::default()));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_commit_uses_configured_tolerance() {
        let strict = GeometrySettings {
            relation_tolerance: 0.1,
            ..GeometrySettings::default()
        };
        // 0.33 off passes the default tolerance but not a strict one
        assert!(commit(&draft(3.0, 5, 1.0), 10.0, &strict).is_err());
    }

    #[test]
    fn test_editor_session() {
        let mut editor = GeometryEditor::open(10.0, None, GeometrySettings::default()).unwrap();
        assert_eq!(editor.draft(), &GeometryDraft::defaults());

        editor.set_girders(Some(5));
        assert_eq!(editor.draft().spacing_m, Some(2.8));

        editor.set_overhang(Some(2.0));
        assert_eq!(editor.draft().spacing_m, Some(2.6));
        assert_eq!(editor.draft().girders, Some(5));

        let spec = editor.commit().unwrap();
        assert_eq!(spec.girder_count, 5);
        assert_eq!(spec.girder_spacing_m, 2.6);
        assert_eq!(spec.deck_overhang_m, 2.0);
    }

    #[test]
    fn test_editor_reopens_from_previous_layout() {
        let previous = commit(&draft(3.5, 4, 1.0), 10.0, &GeometrySettings::default()).unwrap();
        let editor = GeometryEditor::open(12.0, Some(&previous), GeometrySettings::default()).unwrap();
        assert_eq!(editor.draft(), &GeometryDraft::from_spec(&previous));
        assert_eq!(editor.overall_width_m(), 17.0);
    }

    #[test]
    fn test_editor_requires_carriageway() {
        assert!(GeometryEditor::open(0.0, None, GeometrySettings::default()).is_err());
        assert!(GeometryEditor::open(f64::NAN, None, GeometrySettings::default()).is_err());
    }
}
