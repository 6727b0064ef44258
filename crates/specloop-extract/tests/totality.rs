//! Extraction is total: every prompt yields a complete specification.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use specloop_core::{Scorer, Specification};
use specloop_extract::FieldExtractor;

const FRAGMENTS: &[&str] = &[
    "",
    " ",
    "car",
    "drone",
    "🚗",
    "🏗️🛸",
    "車",
    "建物",
    "дрон",
    "синий",
    "véhicule",
    "Straße",
    "für",
    "for",
    "used for",
    "50x30x15cm",
    "3x4",
    "0x0x0m",
    "12.5 x 3 x 9 furlongs",
    "width 2 height 3 depth 4",
    "carbon fiber",
    "acier",
    "rojo",
    ",",
    ".",
    "\n",
    "\u{0301}",
    "ÆØÅ",
];

fn assert_total(spec: &Specification) {
    let value = serde_json::to_value(spec).expect("specification serializes");
    let map = value.as_object().expect("specification is an object");
    for key in ["type", "material", "dimensions", "color", "purpose", "extras"] {
        assert!(map.contains_key(key), "missing {key} in {value}");
    }
    let meta = spec.meta.expect("extraction always reports meta");
    assert!(meta.confidence <= 10);
    assert!((0.0..=1.0).contains(&meta.semantic_quality));
}

#[test]
fn fixed_edge_prompts_are_total() {
    let extractor = FieldExtractor::default();
    for prompt in ["", "🚀🚀🚀", "这是一个设计", "Привет мир", "   \t\n", "for", "x"] {
        assert_total(&extractor.extract(prompt));
    }
}

#[test]
fn random_prompts_are_total_and_score_in_range() {
    let extractor = FieldExtractor::default();
    let scorer = Scorer::default();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let len = rng.gen_range(0..12);
        let prompt: Vec<&str> = (0..len)
            .map(|_| *FRAGMENTS.choose(&mut rng).expect("fragments are non-empty"))
            .collect();
        let prompt = prompt.join(" ");
        let spec = extractor.extract(&prompt);
        assert_total(&spec);
        let score = scorer.score(&spec);
        assert!(score.spec_score <= 10, "{prompt:?}");
    }
}
