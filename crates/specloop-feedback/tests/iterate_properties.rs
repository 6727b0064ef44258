//! Convergence, budget and regression behaviour of the repair loop.

use std::cell::Cell;

use serde_json::json;
use specloop_core::{
    Critique, FeedbackResult, FixAction, ScoreResult, Scorer, Specification,
};
use specloop_extract::FieldExtractor;
use specloop_feedback::{FeedbackGenerator, IterationController};

fn controller() -> IterationController {
    IterationController::default()
}

fn prompts() -> Vec<&'static str> {
    vec![
        "",
        "🚁🚁",
        "a car",
        "a red sports car made of concrete",
        "Design a lightweight carbon fiber racing drone 50x30x15cm for aerial surveillance operations",
        "Un edificio de hormigón",
        "a table 3x4x5furlongs",
        "ein Getriebe",
        "something about the size of a shoebox",
        "width 2m height 1m depth 0.5m cabinet for storage",
    ]
}

#[test]
fn history_never_exceeds_budget_and_early_stop_means_converged() {
    let extractor = FieldExtractor::default();
    for prompt in prompts() {
        let spec = extractor.extract(prompt);
        for max_iters in 1..=4 {
            let run = controller().iterate(&spec, max_iters);
            assert!(run.history.len() <= max_iters, "{prompt:?}");
            if run.history.len() < max_iters {
                assert!(run.converged, "{prompt:?} stopped early without converging");
            }
            for (idx, record) in run.history.iter().enumerate() {
                assert_eq!(record.iteration, idx + 1);
                assert!(!record.feedback.fixes.is_empty());
                assert_eq!(
                    record.score_improvement,
                    i32::from(record.eval_after.spec_score) - i32::from(record.eval_before.spec_score)
                );
                assert_eq!(record.reward, u8::from(record.score_improvement > 0));
            }
        }
    }
}

#[test]
fn every_prompt_converges_within_three_rounds() {
    let extractor = FieldExtractor::default();
    let scorer = Scorer::default();
    for prompt in prompts() {
        let spec = extractor.extract(prompt);
        let run = controller().iterate(&spec, 3);
        assert!(run.converged, "{prompt:?} did not converge");
        assert!(scorer.score(&run.final_spec).spec_score >= scorer.score(&spec).spec_score);
    }
}

#[test]
fn rounds_are_chained() {
    let spec = Specification::from_value(json!({
        "type": "unknown",
        "material": [],
        "dimensions": "about a metre wide",
    }))
    .unwrap();
    let run = controller().iterate(&spec, 5);
    for pair in run.history.windows(2) {
        assert_eq!(pair[0].after, pair[1].before);
        assert_eq!(pair[0].eval_after, pair[1].eval_before);
    }
    assert_eq!(run.history.first().map(|r| &r.before), Some(&spec));
}

/// Strips the dimensions of whatever it is asked to fix.
struct Regressing {
    calls: Cell<usize>,
}

impl Critique for Regressing {
    fn feedback(&self, _spec: &Specification, _score: &ScoreResult) -> FeedbackResult {
        self.calls.set(self.calls.get() + 1);
        FeedbackResult {
            fixes: vec![FixAction::AddDimensions],
            explanation: "drop dimensions".into(),
        }
    }

    fn apply_fix(&self, spec: &Specification, _fix: FixAction) -> Specification {
        let mut next = spec.clone();
        next.dimensions = None;
        next
    }
}

#[test]
fn negative_improvement_is_recorded_not_reverted() {
    let spec = Specification::from_value(json!({
        "type": "car",
        "material": ["steel"],
        "dimensions": {"width": 4.5, "depth": 1.8, "height": 1.4, "unit": "m"},
        "color": "red",
        "purpose": "transportation"
    }))
    .unwrap();
    let critic = Regressing {
        calls: Cell::new(0),
    };
    let run = IterationController::new(Scorer::default(), critic).iterate(&spec, 2);
    assert_eq!(run.history.len(), 2);
    assert!(!run.converged);
    assert_eq!(run.history[0].score_improvement, -2);
    assert_eq!(run.history[0].reward, 0);
    assert_eq!(run.history[1].score_improvement, 0);
    assert!(run.final_spec.dimensions.is_none());
    assert_eq!(run.improvements(), 0);
    assert_eq!(run.net_improvement(), -2);
}

#[test]
fn fixes_match_generator_when_used_directly() {
    let spec = FieldExtractor::default().extract("a car");
    let generator = FeedbackGenerator::default();
    let score = Scorer::default().score(&spec);
    let direct = generator.feedback(&spec, &score);
    let run = controller().iterate(&spec, 1);
    assert_eq!(run.history[0].feedback, direct);
}
