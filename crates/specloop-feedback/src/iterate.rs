//! Bounded score → feedback → patch loop.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use specloop_core::tables::DomainTables;
use specloop_core::{Critique, Evaluate, FeedbackResult, ScoreResult, Scorer, Specification};

use crate::FeedbackGenerator;

/// One round of the improvement loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based round number.
    pub iteration: usize,
    pub before: Specification,
    pub after: Specification,
    pub feedback: FeedbackResult,
    pub eval_before: ScoreResult,
    pub eval_after: ScoreResult,
    /// 1 when the structural score went up this round, else 0.
    pub reward: u8,
    /// Signed change of `spec_score`; negative rounds are kept as-is.
    pub score_improvement: i32,
}

/// Outcome of one `iterate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRun {
    pub final_spec: Specification,
    pub history: Vec<IterationRecord>,
    /// True when the loop stopped because no fixes were left, false when
    /// the budget ran out first (or was zero).
    pub converged: bool,
}

impl IterationRun {
    /// Number of rounds that raised the score.
    #[must_use]
    pub fn improvements(&self) -> usize {
        self.history.iter().filter(|r| r.reward == 1).count()
    }

    /// Total signed score change across all rounds.
    #[must_use]
    pub fn net_improvement(&self) -> i32 {
        self.history.iter().map(|r| r.score_improvement).sum()
    }
}

/// Runs the repair loop with an evaluator and a critic.
#[derive(Debug, Clone)]
pub struct IterationController<E = Scorer, C = FeedbackGenerator> {
    evaluator: E,
    critic: C,
}

impl Default for IterationController {
    fn default() -> Self {
        Self::with_tables(DomainTables::shared())
    }
}

impl IterationController {
    /// The built-in scorer and feedback generator over shared tables.
    #[must_use]
    pub fn with_tables(tables: Arc<DomainTables>) -> Self {
        Self::new(Scorer::new(Arc::clone(&tables)), FeedbackGenerator::new(tables))
    }
}

impl<E: Evaluate, C: Critique> IterationController<E, C> {
    pub fn new(evaluator: E, critic: C) -> Self {
        Self { evaluator, critic }
    }

    /// Repairs `spec` for at most `max_iters` rounds.
    ///
    /// A round with no fixes ends the loop without a record. A budget of
    /// zero returns the input unchanged with an empty history.
    pub fn iterate(&self, spec: &Specification, max_iters: usize) -> IterationRun {
        let mut current = spec.clone();
        let mut history = Vec::with_capacity(max_iters.min(16));
        if max_iters == 0 {
            return IterationRun {
                final_spec: current,
                history,
                converged: false,
            };
        }

        let mut eval_current = self.evaluator.evaluate(&current);
        for iteration in 1..=max_iters {
            let feedback = self.critic.feedback(&current, &eval_current);
            if feedback.is_converged() {
                #[cfg(feature = "telemetry")]
                tracing::info!(
                    iteration,
                    spec_score = eval_current.spec_score,
                    "specification converged"
                );
                return IterationRun {
                    final_spec: current,
                    history,
                    converged: true,
                };
            }

            let next = feedback
                .fixes
                .iter()
                .fold(current.clone(), |s, fix| self.critic.apply_fix(&s, *fix));
            let eval_next = self.evaluator.evaluate(&next);
            let score_improvement =
                i32::from(eval_next.spec_score) - i32::from(eval_current.spec_score);
            let reward = u8::from(score_improvement > 0);

            #[cfg(feature = "telemetry")]
            tracing::info!(
                iteration,
                fixes = ?feedback.fixes,
                before = eval_current.spec_score,
                after = eval_next.spec_score,
                reward,
                "iteration round applied"
            );

            history.push(IterationRecord {
                iteration,
                before: current,
                after: next.clone(),
                feedback,
                eval_before: eval_current,
                eval_after: eval_next.clone(),
                reward,
                score_improvement,
            });
            current = next;
            eval_current = eval_next;
        }

        #[cfg(feature = "telemetry")]
        tracing::info!(max_iters, "iteration budget exhausted");

        IterationRun {
            final_spec: current,
            history,
            converged: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use specloop_core::FixAction;

    fn controller() -> IterationController {
        IterationController::default()
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

    #[test]
    fn sparse_car_reaches_ten_in_one_round() {
        let run = controller().iterate(&sparse_car(), 3);
        assert_eq!(run.history.len(), 1);
        assert!(run.converged);
        let round = &run.history[0];
        assert_eq!(round.iteration, 1);
        assert_eq!(round.eval_before.spec_score, 4);
        assert_eq!(round.eval_after.spec_score, 10);
        assert_eq!(round.reward, 1);
        assert_eq!(round.score_improvement, 6);
        for fix in [FixAction::AddDimensions, FixAction::FixMaterials, FixAction::AddPurpose] {
            assert!(round.feedback.fixes.contains(&fix));
        }
        assert_eq!(run.final_spec, round.after);
        assert_eq!(run.improvements(), 1);
    }

    #[test]
    fn zero_budget_returns_input_unchanged() {
        let spec = sparse_car();
        let run = controller().iterate(&spec, 0);
        assert!(run.history.is_empty());
        assert_eq!(run.final_spec, spec);
        assert!(!run.converged);
    }

    #[test]
    fn already_complete_spec_converges_without_records() {
        let spec = controller()
            .iterate(&sparse_car(), 1)
            .final_spec;
        let run = controller().iterate(&spec, 5);
        assert!(run.history.is_empty());
        assert!(run.converged);
        assert_eq!(run.final_spec, spec);
    }

    #[test]
    fn input_spec_is_not_mutated() {
        let spec = sparse_car();
        let before = spec.clone();
        let _ = controller().iterate(&spec, 3);
        assert_eq!(spec, before);
    }
}
