//! Budget, targeting and stopping behaviour of the objective optimiser.

use specloop_core::Scorer;
use specloop_extract::FieldExtractor;
use specloop_feedback::ObjectiveOptimizer;

fn prompts() -> Vec<&'static str> {
    vec![
        "",
        "a car",
        "a red sports car made of concrete",
        "Design a lightweight carbon fiber racing drone 50x30x15cm for aerial surveillance operations",
        "Un edificio de hormigón",
        "a table 3x4x5furlongs",
        "ein Getriebe aus Titan",
        "a gold spaceship",
    ]
}

#[test]
fn rounds_stay_within_budget_and_only_the_last_may_fail() {
    let extractor = FieldExtractor::default();
    let optimizer = ObjectiveOptimizer::default();
    for prompt in prompts() {
        let spec = extractor.extract(prompt);
        for max_iters in 1..=5 {
            let run = optimizer.optimize(&spec, max_iters);
            assert!(!run.history.is_empty() && run.history.len() <= max_iters, "{prompt:?}");
            let (last, accepted) = run.history.split_last().unwrap();
            assert!(accepted.iter().all(|r| r.accepted()), "{prompt:?}");
            if run.history.len() < max_iters {
                assert!(!last.accepted(), "{prompt:?} stopped after an improving round");
            }
            for (idx, record) in run.history.iter().enumerate() {
                assert_eq!(record.iteration, idx + 1);
                assert_eq!(record.target, record.objectives_before.weakest());
                assert!(record.fixes.len() <= 2);
                assert!((-1.0..=1.0).contains(&record.reward));
            }
        }
    }
}

#[test]
fn weighted_total_never_decreases() {
    let extractor = FieldExtractor::default();
    let scorer = Scorer::default();
    let optimizer = ObjectiveOptimizer::default();
    for prompt in prompts() {
        let spec = extractor.extract(prompt);
        let initial = scorer.score(&spec).total_reward;
        let run = optimizer.optimize(&spec, 10);
        assert!(run.final_total >= initial, "{prompt:?}");
        assert!((scorer.score(&run.final_spec).total_reward - run.final_total).abs() < 1e-12);
    }
}

#[test]
fn loop_stops_on_its_own_before_a_large_budget() {
    let extractor = FieldExtractor::default();
    let optimizer = ObjectiveOptimizer::default();
    for prompt in prompts() {
        let run = optimizer.optimize(&extractor.extract(prompt), 50);
        assert!(run.history.len() < 50, "{prompt:?}");
        assert!(!run.history.last().unwrap().accepted(), "{prompt:?}");
    }
}
