#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Feedback generation and iterative repair of specifications.
//!
//! [`FeedbackGenerator`] inspects a specification and its score and proposes
//! fixes in priority order; it also knows how to apply each fix. The
//! [`iterate`] module drives the score → feedback → patch loop, and
//! [`optimize`] runs the weakest-objective loop over the quality objectives.
//! Neither ever modifies its input: every patch returns a new specification.

use std::sync::Arc;

use serde_json::{Map, Value};
use specloop_core::spec::RequiredField;
use specloop_core::tables::{Domain, DomainProfile, DomainTables};
use specloop_core::{
    Critique, DimensionsField, FeedbackResult, FixAction, ScoreResult, Specification,
};

pub mod iterate;
pub mod optimize;

pub use iterate::{IterationController, IterationRecord, IterationRun};
pub use optimize::{ObjectiveOptimizer, OptimizationRecord, OptimizationRun, TargetedFix};

/// Key in `extras` under which replaced descriptive dimension text is kept.
pub const DIMENSIONS_NOTE_KEY: &str = "dimensions_note";

/// Proposes and applies fixes using the injected tables.
#[derive(Debug, Clone)]
pub struct FeedbackGenerator {
    tables: Arc<DomainTables>,
}

impl Default for FeedbackGenerator {
    fn default() -> Self {
        Self::new(DomainTables::shared())
    }
}

impl FeedbackGenerator {
    #[must_use]
    pub fn new(tables: Arc<DomainTables>) -> Self {
        Self { tables }
    }

    /// Fixes that apply to `spec`, highest priority first.
    ///
    /// 1. missing fields (`add_material`, `add_purpose`, `add_color`)
    /// 2. implausible or unresolved materials (`fix_materials`)
    /// 3. absent or malformed dimensions (`add_dimensions`)
    /// 4. a low score with nothing more specific to do (`improve_completeness`)
    #[must_use]
    pub fn fixes(&self, spec: &Specification, score: &ScoreResult) -> Vec<FixAction> {
        let mut fixes = Vec::new();
        if spec.material.is_empty() {
            fixes.push(FixAction::AddMaterial);
        }
        if !spec.is_filled(RequiredField::Purpose) {
            fixes.push(FixAction::AddPurpose);
        }
        if !spec.is_filled(RequiredField::Color) {
            fixes.push(FixAction::AddColor);
        }
        if self.needs_material_fix(spec) {
            fixes.push(FixAction::FixMaterials);
        }
        if needs_dimensions(spec) {
            fixes.push(FixAction::AddDimensions);
        }
        if fixes.is_empty() && score.spec_score < self.tables.thresholds.improvement {
            fixes.push(FixAction::ImproveCompleteness);
        }
        fixes
    }

    /// Canned remediation sentence for one fix, worded for the spec's domain.
    #[must_use]
    pub fn remediation(&self, spec: &Specification, fix: FixAction) -> String {
        let profile = self.tables.profile_or_fallback(&spec.r#type);
        let canonical = profile.canonical_materials.join(", ");
        let standard = describe_dimensions(profile);
        match (fix, profile.domain) {
            (FixAction::AddMaterial, domain) => format!(
                "Add {} materials such as {canonical}.",
                domain_adjective(domain)
            ),
            (FixAction::FixMaterials, domain) => format!(
                "Replace unresolved or implausible materials with {canonical}{}.",
                material_reason(domain)
            ),
            (FixAction::AddDimensions, Domain::General) => {
                format!("Add width, depth, height and unit (for example {standard}).")
            }
            (FixAction::AddDimensions, _) => format!(
                "Add {} dimensions (typical: {standard}).",
                spec.r#type.trim().to_lowercase()
            ),
            (FixAction::AddPurpose, _) => format!(
                "Add a purpose or use case description (e.g. {}).",
                profile.default_purpose
            ),
            (FixAction::AddColor, _) => format!(
                "Add a color or finish (e.g. {}).",
                profile.default_color
            ),
            (FixAction::ImproveCompleteness, _) => {
                format!("Replace descriptive sizes with measured dimensions ({standard}).")
            }
        }
    }

    fn needs_material_fix(&self, spec: &Specification) -> bool {
        if spec.material.is_empty() {
            return false;
        }
        if spec.has_material_sentinel() {
            return true;
        }
        self.tables.profile(&spec.r#type).is_some()
            && spec
                .material
                .iter()
                .any(|m| !self.tables.is_plausible(&spec.r#type, m))
    }

    fn patch_materials(&self, spec: &mut Specification, profile: &DomainProfile) {
        let has_profile = self.tables.profile(&spec.r#type).is_some();
        let type_tag = spec.r#type.clone();
        spec.material.retain(|m| {
            !m.trim().eq_ignore_ascii_case(specloop_core::UNKNOWN)
                && (!has_profile || self.tables.is_plausible(&type_tag, m))
        });
        if spec.material.is_empty() {
            spec.material = profile.canonical_materials.clone();
        }
    }
}

impl Critique for FeedbackGenerator {
    fn feedback(&self, spec: &Specification, score: &ScoreResult) -> FeedbackResult {
        let fixes = self.fixes(spec, score);
        let explanation = fixes
            .iter()
            .map(|fix| self.remediation(spec, *fix))
            .collect::<Vec<_>>()
            .join(" ");

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            spec_type = %spec.r#type,
            spec_score = score.spec_score,
            fixes = ?fixes,
            "feedback generated"
        );

        FeedbackResult { fixes, explanation }
    }

    /// Applies one fix. Only empty, sentinel or malformed values are touched,
    /// so applying the same fix twice changes nothing the second time.
    fn apply_fix(&self, spec: &Specification, fix: FixAction) -> Specification {
        let mut next = spec.clone();
        let profile = self.tables.profile_or_fallback(&spec.r#type);
        match fix {
            FixAction::AddMaterial => {
                if next.material.is_empty() {
                    next.material = profile.canonical_materials.clone();
                }
            }
            FixAction::AddPurpose => {
                if !next.is_filled(RequiredField::Purpose) {
                    next.purpose = Some(profile.default_purpose.clone());
                }
            }
            FixAction::AddColor => {
                if !next.is_filled(RequiredField::Color) {
                    next.color = Some(profile.default_color.clone());
                }
            }
            FixAction::FixMaterials => {
                if self.needs_material_fix(&next) {
                    self.patch_materials(&mut next, profile);
                }
            }
            FixAction::AddDimensions => {
                if needs_dimensions(&next) {
                    next.dimensions =
                        Some(DimensionsField::Structured(profile.standard_dimensions.clone()));
                }
            }
            FixAction::ImproveCompleteness => {
                if let Some(DimensionsField::Descriptive(text)) = &spec.dimensions {
                    next.extras = Some(with_note(next.extras.take(), text.clone()));
                    next.dimensions =
                        Some(DimensionsField::Structured(profile.standard_dimensions.clone()));
                }
            }
        }
        next
    }
}

/// Absent dimensions or a structured triple that fails the shape check.
/// Descriptive text is left to `improve_completeness`.
fn needs_dimensions(spec: &Specification) -> bool {
    match &spec.dimensions {
        None => true,
        Some(DimensionsField::Structured(d)) => !d.is_valid(),
        Some(DimensionsField::Descriptive(_)) => false,
    }
}

fn with_note(extras: Option<Value>, note: String) -> Value {
    let mut map = match extras {
        Some(Value::Object(map)) => map,
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            let mut map = Map::new();
            map.insert("value".into(), other);
            map
        }
    };
    map.insert(DIMENSIONS_NOTE_KEY.into(), Value::String(note));
    Value::Object(map)
}

fn describe_dimensions(profile: &DomainProfile) -> String {
    let d = &profile.standard_dimensions;
    match d.height {
        Some(h) => format!("{}x{}x{}{}", d.width, d.depth, h, d.unit),
        None => format!("{}x{}{}", d.width, d.depth, d.unit),
    }
}

fn material_reason(domain: Domain) -> &'static str {
    match domain {
        Domain::Automotive => "; body panels must survive crash and corrosion loads",
        Domain::Construction => " suited to load-bearing construction",
        Domain::Aerospace => "; airframe mass drives flight time",
        Domain::Furniture => ", durable enough for everyday furniture",
        Domain::Mechanical => " able to carry gear tooth loads",
        Domain::General => "",
    }
}

fn domain_adjective(domain: Domain) -> &'static str {
    match domain {
        Domain::Automotive => "automotive",
        Domain::Construction => "construction",
        Domain::Aerospace => "aerospace",
        Domain::Furniture => "furniture",
        Domain::Mechanical => "mechanical",
        Domain::General => "realistic",
    }
}
