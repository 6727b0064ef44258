//! End-to-end extraction of representative prompts, scored afterwards.

use std::sync::Arc;

use serde_json::json;
use specloop_core::{DimensionsField, DomainTables, Scorer};
use specloop_extract::FieldExtractor;

#[test]
fn drone_prompt_scores_ten() {
    let extractor = FieldExtractor::default();
    let spec = extractor.extract(
        "Design a lightweight carbon fiber racing drone 50x30x15cm for aerial surveillance operations",
    );
    assert_eq!(spec.r#type, "drone");
    assert_eq!(spec.material, vec!["carbon fiber"]);
    assert!(spec.color.is_none());
    let result = Scorer::default().score(&spec);
    assert_eq!(result.spec_score, 10);
    assert!(result.valid);
}

#[test]
fn empty_prompt_falls_back_to_unknown() {
    let spec = FieldExtractor::default().extract("");
    assert_eq!(spec.r#type, "unknown");
    assert!(spec.material.is_empty());
    assert!(spec.dimensions.is_none());
    assert!(spec.color.is_none());
    assert!(spec.purpose.is_none());
    assert_eq!(spec.meta.map(|m| m.confidence), Some(0));

    let value = serde_json::to_value(&spec).unwrap();
    assert_eq!(value["dimensions"], json!(null));
    assert_eq!(value["extras"], json!(null));
}

#[test]
fn spanish_building_prompt() {
    let spec = FieldExtractor::default()
        .extract("Un edificio de hormigón y vidrio de 20x15x8m para oficinas, color gris");
    assert_eq!(spec.r#type, "building");
    assert_eq!(spec.material, vec!["concrete", "glass"]);
    assert_eq!(spec.color.as_deref(), Some("gray"));
    assert_eq!(spec.purpose.as_deref(), Some("oficinas"));
    let dims = spec
        .dimensions
        .as_ref()
        .and_then(DimensionsField::structured)
        .unwrap();
    assert_eq!(dims.unit, "m");
}

#[test]
fn german_gearbox_prompt() {
    let spec = FieldExtractor::default().extract("Ein Getriebe aus Stahl für Windkraftanlagen");
    assert_eq!(spec.r#type, "gearbox");
    assert_eq!(spec.material, vec!["steel"]);
    assert_eq!(spec.purpose.as_deref(), Some("Windkraftanlagen"));
}

#[test]
fn unparseable_unit_is_kept_as_text() {
    let spec = FieldExtractor::default().extract("a table 3x4x5furlongs");
    assert_eq!(
        spec.dimensions,
        Some(DimensionsField::Descriptive("3x4x5furlongs".into()))
    );
}

#[test]
fn alternate_tables_are_honoured() {
    let mut raw = serde_json::to_value(DomainTables::builtin()).unwrap();
    raw["colors"] = json!([{ "name": "teal", "synonyms": ["petrol"] }]);
    let tables = DomainTables::from_json_str(&raw.to_string()).unwrap();
    let extractor = FieldExtractor::new(Arc::new(tables));
    let spec = extractor.extract("a petrol and red car");
    assert_eq!(spec.color.as_deref(), Some("teal"));
}
