//! Objective-targeted optimisation loop.
//!
//! Each round scores the specification, picks its weakest quality objective
//! and applies at most two fixes aimed at that objective, using the
//! profile's economy or advanced defaults where the objective calls for
//! them. A round that does not raise the weighted objective total is
//! recorded and ends the loop; its patch is discarded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use specloop_core::score::DETAILED_PURPOSE_CHARS;
use specloop_core::spec::RequiredField;
use specloop_core::tables::DomainTables;
use specloop_core::{
    DimensionsField, Evaluate, Objective, QualityBreakdown, Scorer, Specification,
};

use crate::with_note;

/// Most fixes applied in one round.
const FIXES_PER_ROUND: usize = 2;

/// A patch aimed at one quality objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetedFix {
    AddDimensions,
    AddMaterial,
    AddPurpose,
    AddColor,
    PlausibleMaterials,
    AdvancedMaterials,
    DetailPurpose,
    EconomyMaterials,
}

impl TargetedFix {
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::AddDimensions => "Add specific dimensions with units.",
            Self::AddMaterial => "Specify realistic materials.",
            Self::AddPurpose => "Define a clear purpose or use case.",
            Self::AddColor => "Choose a color or finish.",
            Self::PlausibleMaterials => "Use materials appropriate for the object type.",
            Self::AdvancedMaterials => "Consider advanced materials.",
            Self::DetailPurpose => "Describe the intended use in more detail.",
            Self::EconomyMaterials => "Balance performance with cost-effective materials.",
        }
    }
}

/// One round of the optimisation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecord {
    /// 1-based round number.
    pub iteration: usize,
    /// Weakest objective at the start of the round.
    pub target: Objective,
    pub fixes: Vec<TargetedFix>,
    pub explanation: String,
    pub before: Specification,
    pub after: Specification,
    pub objectives_before: QualityBreakdown,
    pub objectives_after: QualityBreakdown,
    pub total_before: f64,
    pub total_after: f64,
    /// Weighted sum of per-objective changes, in [-1, 1].
    pub reward: f64,
    /// `total_after - total_before`; the round was kept only when positive.
    pub improvement: f64,
}

impl OptimizationRecord {
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.improvement > 0.0
    }
}

/// Outcome of one `optimize` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRun {
    pub final_spec: Specification,
    pub final_objectives: QualityBreakdown,
    pub final_total: f64,
    pub history: Vec<OptimizationRecord>,
}

/// Improves a specification one weakest objective at a time.
#[derive(Debug, Clone)]
pub struct ObjectiveOptimizer<E = Scorer> {
    evaluator: E,
    tables: Arc<DomainTables>,
}

impl Default for ObjectiveOptimizer {
    fn default() -> Self {
        Self::with_tables(DomainTables::shared())
    }
}

impl ObjectiveOptimizer {
    /// The built-in scorer over `tables`.
    #[must_use]
    pub fn with_tables(tables: Arc<DomainTables>) -> Self {
        Self::new(Scorer::new(Arc::clone(&tables)), tables)
    }
}

impl<E: Evaluate> ObjectiveOptimizer<E> {
    pub fn new(evaluator: E, tables: Arc<DomainTables>) -> Self {
        Self { evaluator, tables }
    }

    /// Fixes aimed at `target` that would change `spec`, at most two.
    #[must_use]
    pub fn targeted_fixes(&self, spec: &Specification, target: Objective) -> Vec<TargetedFix> {
        let profile = self.tables.profile_or_fallback(&spec.r#type);
        let mut fixes = Vec::new();
        match target {
            Objective::Completeness => {
                if !spec.is_filled(RequiredField::Dimensions) {
                    fixes.push(TargetedFix::AddDimensions);
                }
                if spec.material.is_empty() {
                    fixes.push(TargetedFix::AddMaterial);
                }
                if !spec.is_filled(RequiredField::Purpose) {
                    fixes.push(TargetedFix::AddPurpose);
                }
                if !spec.is_filled(RequiredField::Color) {
                    fixes.push(TargetedFix::AddColor);
                }
            }
            Objective::Realism => {
                if spec.material.is_empty()
                    || spec
                        .material
                        .iter()
                        .any(|m| !self.tables.is_plausible(&spec.r#type, m))
                {
                    fixes.push(TargetedFix::PlausibleMaterials);
                }
            }
            Objective::Feasibility => {
                if !has_valid_dimensions(spec) {
                    fixes.push(TargetedFix::AddDimensions);
                }
            }
            Objective::Innovation => {
                if spec.material != profile.materials_for(Objective::Innovation) {
                    fixes.push(TargetedFix::AdvancedMaterials);
                }
                if !has_detailed_purpose(spec) {
                    fixes.push(TargetedFix::DetailPurpose);
                }
            }
            Objective::CostEfficiency => {
                if spec.material != profile.materials_for(Objective::CostEfficiency) {
                    fixes.push(TargetedFix::EconomyMaterials);
                }
                if !has_valid_dimensions(spec) {
                    fixes.push(TargetedFix::AddDimensions);
                }
            }
        }
        fixes.truncate(FIXES_PER_ROUND);
        fixes
    }

    /// Applies one fix with defaults tuned for `target`. Never modifies `spec`.
    #[must_use]
    pub fn apply(
        &self,
        spec: &Specification,
        fix: TargetedFix,
        target: Objective,
    ) -> Specification {
        let mut next = spec.clone();
        let profile = self.tables.profile_or_fallback(&spec.r#type);
        match fix {
            TargetedFix::AddDimensions => {
                if !has_valid_dimensions(&next) {
                    if let Some(DimensionsField::Descriptive(text)) = &spec.dimensions {
                        next.extras = Some(with_note(next.extras.take(), text.clone()));
                    }
                    next.dimensions =
                        Some(DimensionsField::Structured(profile.dimensions_for(target).clone()));
                }
            }
            TargetedFix::AddMaterial => {
                if next.material.is_empty() {
                    next.material = profile.materials_for(target).to_vec();
                }
            }
            TargetedFix::AddPurpose => {
                if !next.is_filled(RequiredField::Purpose) {
                    next.purpose = Some(profile.purpose_for(target).to_string());
                }
            }
            TargetedFix::AddColor => {
                if !next.is_filled(RequiredField::Color) {
                    next.color = Some(profile.default_color.clone());
                }
            }
            TargetedFix::PlausibleMaterials => {
                next.material.retain(|m| self.tables.is_plausible(&spec.r#type, m));
                if next.material.is_empty() {
                    next.material = profile.materials_for(Objective::Realism).to_vec();
                }
            }
            TargetedFix::AdvancedMaterials => {
                next.material = profile.materials_for(Objective::Innovation).to_vec();
            }
            TargetedFix::DetailPurpose => {
                if !has_detailed_purpose(&next) {
                    next.purpose = Some(profile.purpose_for(Objective::Innovation).to_string());
                }
            }
            TargetedFix::EconomyMaterials => {
                next.material = profile.materials_for(Objective::CostEfficiency).to_vec();
            }
        }
        next
    }

    /// Runs at most `max_iters` rounds, stopping after the first round whose
    /// weighted objective total does not rise.
    pub fn optimize(&self, spec: &Specification, max_iters: usize) -> OptimizationRun {
        let mut current = spec.clone();
        let mut eval_current = self.evaluator.evaluate(&current);
        let mut history = Vec::with_capacity(max_iters.min(16));

        for iteration in 1..=max_iters {
            let target = eval_current.quality_breakdown.weakest();
            let fixes = self.targeted_fixes(&current, target);
            let next = fixes
                .iter()
                .fold(current.clone(), |s, fix| self.apply(&s, *fix, target));
            let eval_next = self.evaluator.evaluate(&next);

            let record = OptimizationRecord {
                iteration,
                target,
                explanation: fixes
                    .iter()
                    .map(|f| f.describe())
                    .collect::<Vec<_>>()
                    .join(" "),
                fixes,
                before: current.clone(),
                after: next.clone(),
                objectives_before: eval_current.quality_breakdown,
                objectives_after: eval_next.quality_breakdown,
                total_before: eval_current.total_reward,
                total_after: eval_next.total_reward,
                reward: self
                    .tables
                    .weights
                    .weighted_delta(&eval_current.quality_breakdown, &eval_next.quality_breakdown),
                improvement: eval_next.total_reward - eval_current.total_reward,
            };
            let accepted = record.accepted();

            #[cfg(feature = "telemetry")]
            tracing::info!(
                iteration,
                target = target.as_str(),
                fixes = ?record.fixes,
                before = record.total_before,
                after = record.total_after,
                accepted,
                "optimisation round"
            );

            history.push(record);
            if !accepted {
                break;
            }
            current = next;
            eval_current = eval_next;
        }

        OptimizationRun {
            final_spec: current,
            final_objectives: eval_current.quality_breakdown,
            final_total: eval_current.total_reward,
            history,
        }
    }
}

fn has_valid_dimensions(spec: &Specification) -> bool {
    spec.dimensions
        .as_ref()
        .is_some_and(DimensionsField::is_valid_structured)
}

fn has_detailed_purpose(spec: &Specification) -> bool {
    spec.purpose
        .as_deref()
        .is_some_and(|p| p.trim().chars().count() > DETAILED_PURPOSE_CHARS)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use specloop_core::{Dimensions, Unit};

    fn optimizer() -> ObjectiveOptimizer {
        ObjectiveOptimizer::default()
    }

    fn sparse_car() -> Specification {
        Specification::from_value(json!({
            "type": "car",
            "material": ["unknown"],
            "dimensions": null,
            "color": null,
            "purpose": null,
            "extras": null
        }))
        .unwrap()
    }

    /// Complete car whose only weak spot is innovation.
    fn economy_car() -> Specification {
        Specification {
            r#type: "car".into(),
            material: vec!["steel".into()],
            dimensions: Some(DimensionsField::Structured(Dimensions::new(
                4.5,
                1.8,
                1.4,
                Unit::M,
            ))),
            color: Some("red".into()),
            purpose: Some("autonomous electric racing vehicle".into()),
            extras: None,
            meta: None,
        }
    }

    #[test]
    fn rounds_target_the_weakest_objective() {
        let run = optimizer().optimize(&sparse_car(), 2);
        assert_eq!(run.history.len(), 2);

        let first = &run.history[0];
        assert_eq!(first.target, Objective::Realism);
        assert_eq!(first.fixes, vec![TargetedFix::PlausibleMaterials]);
        assert_eq!(first.after.material, vec!["aluminum", "steel"]);

        let second = &run.history[1];
        assert_eq!(second.target, Objective::Completeness);
        assert_eq!(
            second.fixes,
            vec![TargetedFix::AddDimensions, TargetedFix::AddPurpose]
        );
        assert!(run.history.iter().all(OptimizationRecord::accepted));
        assert_eq!(run.final_spec, second.after);
        assert!((run.final_objectives.completeness - 0.8).abs() < 1e-9);
    }

    #[test]
    fn round_without_improvement_stops_and_is_discarded() {
        let spec = economy_car();
        let run = optimizer().optimize(&spec, 5);
        assert_eq!(run.history.len(), 1);

        let round = &run.history[0];
        assert_eq!(round.target, Objective::Innovation);
        assert_eq!(round.fixes, vec![TargetedFix::AdvancedMaterials]);
        assert!(round.objectives_after.innovation > round.objectives_before.innovation);
        assert!(round.improvement < 0.0);
        assert!(!round.accepted());
        assert_eq!(run.final_spec, spec);
        assert!((run.final_total - round.total_before).abs() < 1e-12);
    }

    #[test]
    fn reward_is_the_weighted_objective_change() {
        let run = optimizer().optimize(&sparse_car(), 3);
        for round in &run.history {
            assert!((-1.0..=1.0).contains(&round.reward));
            assert!((round.improvement - (round.total_after - round.total_before)).abs() < 1e-12);
            assert!((round.reward - round.improvement).abs() < 1e-9);
        }
    }

    #[test]
    fn cost_target_uses_economy_defaults() {
        let mut spec = sparse_car();
        spec.material = vec!["carbon fiber".into()];
        let optimizer = optimizer();
        let fixes = optimizer.targeted_fixes(&spec, Objective::CostEfficiency);
        assert_eq!(
            fixes,
            vec![TargetedFix::EconomyMaterials, TargetedFix::AddDimensions]
        );
        let patched = fixes
            .iter()
            .fold(spec, |s, f| optimizer.apply(&s, *f, Objective::CostEfficiency));
        assert_eq!(patched.material, vec!["steel"]);
        let dims = patched.dimensions.as_ref().and_then(DimensionsField::structured).unwrap();
        assert_eq!(dims, &Dimensions::new(4.0, 1.6, 1.3, Unit::M));
    }

    #[test]
    fn descriptive_dimensions_are_kept_as_a_note() {
        let mut spec = economy_car();
        spec.dimensions = Some(DimensionsField::Descriptive("about car sized".into()));
        let patched = optimizer().apply(&spec, TargetedFix::AddDimensions, Objective::Feasibility);
        assert!(patched.dimensions.unwrap().is_valid_structured());
        assert_eq!(
            patched.extras.unwrap()[crate::DIMENSIONS_NOTE_KEY],
            "about car sized"
        );
    }

    #[test]
    fn zero_budget_returns_input_unchanged() {
        let spec = sparse_car();
        let run = optimizer().optimize(&spec, 0);
        assert!(run.history.is_empty());
        assert_eq!(run.final_spec, spec);
    }

    #[test]
    fn optimize_does_not_mutate_input() {
        let spec = sparse_car();
        let before = spec.clone();
        let _ = optimizer().optimize(&spec, 3);
        assert_eq!(spec, before);
    }
}
