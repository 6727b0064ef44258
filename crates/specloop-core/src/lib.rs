#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Specification model, domain tables and scoring for specloop.
//!
//! The extractor, feedback generator and iteration controller live in their
//! own crates and meet here through [`Evaluate`] and [`Critique`].

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod error;
pub mod request;
pub mod score;
pub mod spec;
pub mod tables;

pub use error::{Result, SpecError};
pub use request::{parse_prompt, IterateRequest, DEFAULT_MAX_ITERS, DEFAULT_MAX_PROMPT_LEN};
pub use score::{
    assess, Assessment, CriterionScores, Objective, QualityBreakdown, ScoreResult, Scorer,
};
pub use spec::{
    find_dimensions, Dimensions, DimensionsField, SpecMeta, Specification, Unit, UNKNOWN,
};
pub use tables::{DomainProfile, DomainTables, ObjectiveDefaults};

/// A named, deterministic patch operation on a [`Specification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixAction {
    AddMaterial,
    AddPurpose,
    AddColor,
    FixMaterials,
    AddDimensions,
    ImproveCompleteness,
}

impl FixAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddMaterial => "add_material",
            Self::AddPurpose => "add_purpose",
            Self::AddColor => "add_color",
            Self::FixMaterials => "fix_materials",
            Self::AddDimensions => "add_dimensions",
            Self::ImproveCompleteness => "improve_completeness",
        }
    }
}

impl fmt::Display for FixAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered fixes for one specification plus the matching critique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub fixes: Vec<FixAction>,
    pub explanation: String,
}

impl FeedbackResult {
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Anything that can score a specification.
pub trait Evaluate {
    fn evaluate(&self, spec: &Specification) -> ScoreResult;
}

/// Anything that can criticise a specification and patch it.
pub trait Critique {
    fn feedback(&self, spec: &Specification, score: &ScoreResult) -> FeedbackResult;
    fn apply_fix(&self, spec: &Specification, fix: FixAction) -> Specification;
}
