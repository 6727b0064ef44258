//! Specification scoring.
//!
//! Two independent views of one specification:
//! - four additive structural criteria yielding `spec_score` in 0..=10
//! - five weighted quality objectives in [0, 1] yielding `total_reward`

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::spec::{DimensionsField, Specification};
use crate::tables::{CostClass, DomainTables};
use crate::Evaluate;

const DIMENSIONS_POINTS: u8 = 2;
const MATERIALS_POINTS: u8 = 2;
const TYPE_POINTS: u8 = 2;
const COMPLETENESS_POINTS: u8 = 4;
/// Confidence implied for a supported type label that carries no `meta`.
const IMPLIED_CONFIDENCE: u8 = 10;

// Feasibility heuristics
const FEASIBILITY_DIMENSION_SHARE: f64 = 0.5;
const DESCRIPTIVE_DIMENSION_CREDIT: f64 = 0.4;
const OVERSIZED_SIDE_M: f64 = 1000.0;
const OVERSIZED_PENALTY: f64 = 0.3;
const UNDERSIZED_SIDE_M: f64 = 0.01;
const UNDERSIZED_PENALTY: f64 = 0.2;

// Innovation heuristics
const INNOVATION_BASE: f64 = 0.6;
const INNOVATION_PER_ADVANCED: f64 = 0.15;
const INNOVATION_DETAILED_PURPOSE: f64 = 0.1;
/// A purpose longer than this many characters earns the innovation bonus.
pub const DETAILED_PURPOSE_CHARS: usize = 20;

// Cost heuristics
const COST_BASE: f64 = 0.85;
const COST_EXPENSIVE_PENALTY: f64 = 0.15;
const COST_ECONOMY_BONUS: f64 = 0.05;
const COST_LARGE_SIDE_M: f64 = 100.0;
const COST_LARGE_PENALTY: f64 = 0.2;

/// Points awarded by each structural criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionScores {
    pub dimensions: u8,
    pub materials: u8,
    pub type_match: u8,
    pub completeness: u8,
}

impl CriterionScores {
    #[must_use]
    pub fn total(&self) -> u8 {
        self.dimensions + self.materials + self.type_match + self.completeness
    }
}

/// One of the five quality objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Completeness,
    Realism,
    Feasibility,
    Innovation,
    CostEfficiency,
}

impl Objective {
    /// All objectives in weight order.
    pub const ALL: [Objective; 5] = [
        Objective::Completeness,
        Objective::Realism,
        Objective::Feasibility,
        Objective::Innovation,
        Objective::CostEfficiency,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completeness => "completeness",
            Self::Realism => "realism",
            Self::Feasibility => "feasibility",
            Self::Innovation => "innovation",
            Self::CostEfficiency => "cost_efficiency",
        }
    }
}

/// The five quality objectives, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub completeness: f64,
    pub realism: f64,
    pub feasibility: f64,
    pub innovation: f64,
    pub cost_efficiency: f64,
}

impl QualityBreakdown {
    /// Objective values in weight order.
    #[must_use]
    pub fn values(&self) -> [f64; 5] {
        [
            self.completeness,
            self.realism,
            self.feasibility,
            self.innovation,
            self.cost_efficiency,
        ]
    }

    #[must_use]
    pub fn get(&self, objective: Objective) -> f64 {
        match objective {
            Objective::Completeness => self.completeness,
            Objective::Realism => self.realism,
            Objective::Feasibility => self.feasibility,
            Objective::Innovation => self.innovation,
            Objective::CostEfficiency => self.cost_efficiency,
        }
    }

    /// The lowest-valued objective; ties go to the one listed first.
    #[must_use]
    pub fn weakest(&self) -> Objective {
        let mut weakest = Objective::Completeness;
        for objective in Objective::ALL {
            if self.get(objective) < self.get(weakest) {
                weakest = objective;
            }
        }
        weakest
    }
}

/// Result of scoring one specification. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub spec_score: u8,
    pub valid: bool,
    /// First structural problem when `valid` is false.
    pub validation_error: Option<String>,
    pub criteria: CriterionScores,
    pub quality_breakdown: QualityBreakdown,
    pub total_reward: f64,
}

/// Coarse verdict on a `spec_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assessment {
    Excellent,
    Good,
    Adequate,
    Poor,
}

impl Assessment {
    #[must_use]
    pub fn from_score(spec_score: u8) -> Self {
        match spec_score {
            9.. => Self::Excellent,
            7..=8 => Self::Good,
            5..=6 => Self::Adequate,
            _ => Self::Poor,
        }
    }

    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            Self::Excellent => {
                "Excellent specification with comprehensive details and realistic parameters."
            }
            Self::Good => "Good specification with minor improvements needed.",
            Self::Adequate => {
                "Adequate specification requiring significant enhancements before production use."
            }
            Self::Poor => "Specification needs substantial work before it can be used.",
        }
    }
}

/// Verdict for a `spec_score`.
#[must_use]
pub fn assess(spec_score: u8) -> Assessment {
    Assessment::from_score(spec_score)
}

/// Scores specifications against the injected tables.
#[derive(Debug, Clone)]
pub struct Scorer {
    tables: Arc<DomainTables>,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DomainTables::shared())
    }
}

impl Scorer {
    #[must_use]
    pub fn new(tables: Arc<DomainTables>) -> Self {
        Self { tables }
    }

    #[must_use]
    pub fn tables(&self) -> &DomainTables {
        &self.tables
    }

    /// Scores a specification. Pure: the input is never modified.
    #[must_use]
    pub fn score(&self, spec: &Specification) -> ScoreResult {
        let criteria = self.criteria(spec);
        let quality_breakdown = self.objectives(spec);
        let validation_error = validate(spec).err();
        ScoreResult {
            spec_score: criteria.total(),
            valid: validation_error.is_none(),
            validation_error,
            criteria,
            total_reward: self.total_reward(&quality_breakdown),
            quality_breakdown,
        }
    }

    /// The four structural criteria, each independently capped.
    #[must_use]
    pub fn criteria(&self, spec: &Specification) -> CriterionScores {
        CriterionScores {
            dimensions: if spec
                .dimensions
                .as_ref()
                .is_some_and(DimensionsField::is_valid_structured)
            {
                DIMENSIONS_POINTS
            } else {
                0
            },
            materials: if self.materials_realistic(spec) {
                MATERIALS_POINTS
            } else {
                0
            },
            type_match: self.type_points(spec),
            completeness: completeness_points(spec.filled_fields()),
        }
    }

    /// Detection confidence, from `meta` when present, else implied by the label.
    #[must_use]
    pub fn type_confidence(&self, spec: &Specification) -> u8 {
        if spec.has_unknown_type() {
            return 0;
        }
        match spec.meta {
            Some(meta) => meta.confidence.min(10),
            None if self.tables.profile(&spec.r#type).is_some() => IMPLIED_CONFIDENCE,
            None => 0,
        }
    }

    fn type_points(&self, spec: &Specification) -> u8 {
        let confidence = self.type_confidence(spec);
        let thresholds = self.tables.thresholds;
        if confidence >= thresholds.high_confidence {
            TYPE_POINTS
        } else if confidence >= thresholds.type_confidence {
            TYPE_POINTS / 2
        } else {
            0
        }
    }

    fn materials_realistic(&self, spec: &Specification) -> bool {
        if spec.material.is_empty() || spec.has_material_sentinel() {
            return false;
        }
        if spec.has_unknown_type() || self.tables.profile(&spec.r#type).is_none() {
            return true;
        }
        spec.material
            .iter()
            .all(|m| self.tables.is_plausible(&spec.r#type, m))
    }

    /// The five quality objectives, each clamped to [0, 1].
    #[must_use]
    pub fn objectives(&self, spec: &Specification) -> QualityBreakdown {
        QualityBreakdown {
            completeness: completeness_fraction(spec),
            realism: self.realism(spec),
            feasibility: self.feasibility(spec),
            innovation: self.innovation(spec),
            cost_efficiency: self.cost_efficiency(spec),
        }
    }

    /// Weighted sum of the objectives.
    #[must_use]
    pub fn total_reward(&self, breakdown: &QualityBreakdown) -> f64 {
        let w = self.tables.weights;
        let weights = [
            w.completeness,
            w.realism,
            w.feasibility,
            w.innovation,
            w.cost_efficiency,
        ];
        breakdown
            .values()
            .iter()
            .zip(weights)
            .map(|(value, weight)| value * weight)
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    #[allow(clippy::cast_precision_loss)]
    fn realism(&self, spec: &Specification) -> f64 {
        if spec.material.is_empty() {
            return 0.0;
        }
        let plausible = spec
            .material
            .iter()
            .filter(|m| self.tables.is_plausible(&spec.r#type, m))
            .count();
        plausible as f64 / spec.material.len() as f64
    }

    #[allow(clippy::cast_precision_loss)]
    fn feasibility(&self, spec: &Specification) -> f64 {
        let dimension_part = match &spec.dimensions {
            Some(DimensionsField::Structured(d)) if d.is_valid() => {
                let sides = d.sides_in_metres();
                let mut part = 1.0;
                if sides.iter().any(|s| *s > OVERSIZED_SIDE_M) {
                    part -= OVERSIZED_PENALTY;
                }
                if sides.iter().any(|s| *s < UNDERSIZED_SIDE_M) {
                    part -= UNDERSIZED_PENALTY;
                }
                part
            }
            Some(DimensionsField::Descriptive(_)) => DESCRIPTIVE_DIMENSION_CREDIT,
            _ => 0.0,
        };
        let material_part = if spec.material.is_empty() {
            0.0
        } else {
            let total: f64 = spec
                .material
                .iter()
                .map(|m| self.tables.material(m).map_or(0.0, |e| e.tier.score()))
                .sum();
            total / spec.material.len() as f64
        };
        (FEASIBILITY_DIMENSION_SHARE * dimension_part
            + (1.0 - FEASIBILITY_DIMENSION_SHARE) * material_part)
            .clamp(0.0, 1.0)
    }

    #[allow(clippy::cast_precision_loss)]
    fn innovation(&self, spec: &Specification) -> f64 {
        let advanced = spec
            .material
            .iter()
            .filter(|m| self.tables.material(m).is_some_and(|e| e.advanced))
            .count();
        let mut score = INNOVATION_BASE + INNOVATION_PER_ADVANCED * advanced as f64;
        if spec
            .purpose
            .as_deref()
            .is_some_and(|p| p.trim().chars().count() > DETAILED_PURPOSE_CHARS)
        {
            score += INNOVATION_DETAILED_PURPOSE;
        }
        score.clamp(0.0, 1.0)
    }

    fn cost_efficiency(&self, spec: &Specification) -> f64 {
        let mut score = COST_BASE;
        for entry in spec.material.iter().filter_map(|m| self.tables.material(m)) {
            match entry.cost {
                CostClass::Expensive => score -= COST_EXPENSIVE_PENALTY,
                CostClass::Economy => score += COST_ECONOMY_BONUS,
                CostClass::Standard => {}
            }
        }
        let oversized = spec
            .dimensions
            .as_ref()
            .and_then(DimensionsField::structured)
            .is_some_and(|d| d.sides_in_metres().iter().any(|s| *s > COST_LARGE_SIDE_M));
        if oversized {
            score -= COST_LARGE_PENALTY;
        }
        score.clamp(0.0, 1.0)
    }
}

impl Evaluate for Scorer {
    fn evaluate(&self, spec: &Specification) -> ScoreResult {
        self.score(spec)
    }
}

/// Fraction of the five completeness fields that hold a value.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completeness_fraction(spec: &Specification) -> f64 {
    spec.filled_fields() as f64 / 5.0
}

/// `ceil(4 × filled / 5)`: four of five filled fields already earn full credit.
fn completeness_points(filled: usize) -> u8 {
    let filled = u8::try_from(filled.min(5)).unwrap_or(5);
    (COMPLETENESS_POINTS * filled).div_ceil(5)
}

/// Structural shape check, independent of content quality.
pub fn validate(spec: &Specification) -> Result<(), String> {
    if spec.r#type.trim().is_empty() {
        return Err("type must be a non-empty label".into());
    }
    if let Some(idx) = spec.material.iter().position(|m| m.trim().is_empty()) {
        return Err(format!("material[{idx}] must be a non-empty string"));
    }
    match &spec.dimensions {
        Some(DimensionsField::Structured(d)) => d.check()?,
        Some(DimensionsField::Descriptive(text)) if text.trim().is_empty() => {
            return Err("dimensions must not be an empty string".into());
        }
        _ => {}
    }
    if let Some(meta) = spec.meta {
        if meta.confidence > 10 {
            return Err(format!("meta.confidence must be 0..=10 (got {})", meta.confidence));
        }
        if !(0.0..=1.0).contains(&meta.semantic_quality) {
            return Err(format!(
                "meta.semantic_quality must be within [0, 1] (got {})",
                meta.semantic_quality
            ));
        }
    }
    Ok(())
}
