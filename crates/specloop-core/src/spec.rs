//! The canonical design specification and its dimension model.
//!
//! A [`Specification`] is always a total record: every one of the six
//! top-level keys (`type`, `material`, `dimensions`, `color`, `purpose`,
//! `extras`) is serialized, either with a value or with `null`. Structural
//! well-formedness is checked separately by the scorer so that a malformed
//! dimension triple can be reported as `valid: false` instead of aborting.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SpecError};

/// Sentinel used for unresolved type labels and unresolved materials.
pub const UNKNOWN: &str = "unknown";

/// Extraction metadata reported next to the six specification fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecMeta {
    /// Type detection confidence, 0 to 10.
    pub confidence: u8,
    /// Completeness objective at extraction time, 0.0 to 1.0.
    pub semantic_quality: f64,
}

/// A structured design specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// Classification label, e.g. "car", "building" or [`UNKNOWN`].
    /// Serialized as `type` (raw identifier, same name in code and JSON).
    pub r#type: String,
    pub material: Vec<String>,
    #[serde(default)]
    pub dimensions: Option<DimensionsField>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub extras: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SpecMeta>,
}

/// The five fields that count towards completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Type,
    Material,
    Dimensions,
    Color,
    Purpose,
}

impl RequiredField {
    pub const ALL: [RequiredField; 5] = [
        RequiredField::Type,
        RequiredField::Material,
        RequiredField::Dimensions,
        RequiredField::Color,
        RequiredField::Purpose,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Material => "material",
            Self::Dimensions => "dimensions",
            Self::Color => "color",
            Self::Purpose => "purpose",
        }
    }
}

impl Specification {
    /// The fully unresolved specification: unknown type, nothing else.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            r#type: UNKNOWN.to_string(),
            material: Vec::new(),
            dimensions: None,
            color: None,
            purpose: None,
            extras: None,
            meta: None,
        }
    }

    /// Parses a caller-supplied JSON payload, failing fast on malformed input.
    ///
    /// `type` and `material` are required; the remaining fields default to
    /// `null` when omitted. Errors name the offending field.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(SpecError::NotAnObject {
                what: "specification",
            });
        };

        let r#type = match map.get("type") {
            None => return Err(SpecError::MissingField("type")),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(SpecError::invalid(
                    "type",
                    format!("expected a string, found {}", json_kind(other)),
                ))
            }
        };

        let material = match map.get("material") {
            None => return Err(SpecError::MissingField("material")),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(SpecError::invalid(
                        "material",
                        format!("list entries must be strings, found {}", json_kind(other)),
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(SpecError::invalid(
                    "material",
                    format!("expected a list of strings, found {}", json_kind(other)),
                ))
            }
        };

        let dimensions = match map.get("dimensions") {
            None | Some(Value::Null) => None,
            Some(v @ (Value::String(_) | Value::Object(_))) => {
                Some(DimensionsField::deserialize(v.clone()).map_err(|e| {
                    SpecError::invalid("dimensions", e.to_string())
                })?)
            }
            Some(other) => {
                return Err(SpecError::invalid(
                    "dimensions",
                    format!(
                        "expected a string, an object or null, found {}",
                        json_kind(other)
                    ),
                ))
            }
        };

        let meta = match map.get("meta") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                SpecMeta::deserialize(v.clone())
                    .map_err(|e| SpecError::invalid("meta", e.to_string()))?,
            ),
        };

        Ok(Self {
            r#type,
            material,
            dimensions,
            color: optional_string(&map, "color")?,
            purpose: optional_string(&map, "purpose")?,
            extras: match map.get("extras") {
                None | Some(Value::Null) => None,
                Some(v) => Some(v.clone()),
            },
            meta,
        })
    }

    /// Whether the given completeness field holds a value.
    #[must_use]
    pub fn is_filled(&self, field: RequiredField) -> bool {
        match field {
            RequiredField::Type => !self.r#type.trim().is_empty(),
            RequiredField::Material => !self.material.is_empty(),
            RequiredField::Dimensions => self.dimensions.is_some(),
            RequiredField::Color => has_text(self.color.as_deref()),
            RequiredField::Purpose => has_text(self.purpose.as_deref()),
        }
    }

    /// Number of filled completeness fields, 0 to 5.
    #[must_use]
    pub fn filled_fields(&self) -> usize {
        RequiredField::ALL
            .iter()
            .filter(|f| self.is_filled(**f))
            .count()
    }

    #[must_use]
    pub fn has_unknown_type(&self) -> bool {
        let label = self.r#type.trim();
        label.is_empty() || label.eq_ignore_ascii_case(UNKNOWN)
    }

    #[must_use]
    pub fn has_material_sentinel(&self) -> bool {
        self.material
            .iter()
            .any(|m| m.trim().eq_ignore_ascii_case(UNKNOWN))
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

fn optional_string(map: &Map<String, Value>, field: &'static str) -> Result<Option<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(SpecError::invalid(
            field,
            format!("expected a string or null, found {}", json_kind(other)),
        )),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Recognized length units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    M,
    Cm,
    Mm,
    Ft,
    In,
}

impl Unit {
    /// Resolves a unit symbol or spelled-out alias, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Some(Self::M),
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => Some(Self::Cm),
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => Some(Self::Mm),
            "ft" | "foot" | "feet" => Some(Self::Ft),
            "in" | "inch" | "inches" => Some(Self::In),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::M => "m",
            Self::Cm => "cm",
            Self::Mm => "mm",
            Self::Ft => "ft",
            Self::In => "in",
        }
    }

    /// Length of one unit in metres.
    #[must_use]
    pub fn metres(self) -> f64 {
        match self {
            Self::M => 1.0,
            Self::Cm => 0.01,
            Self::Mm => 0.001,
            Self::Ft => 0.3048,
            Self::In => 0.0254,
        }
    }
}

/// Structured width × depth × height triple. `height` is `None` for a 2-D
/// footprint such as `120x80cm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub depth: f64,
    pub height: Option<f64>,
    pub unit: String,
}

impl Dimensions {
    #[must_use]
    pub fn new(width: f64, depth: f64, height: f64, unit: Unit) -> Self {
        Self {
            width,
            depth,
            height: Some(height),
            unit: unit.as_str().to_string(),
        }
    }

    #[must_use]
    pub fn unit(&self) -> Option<Unit> {
        Unit::parse(&self.unit)
    }

    /// Describes the first structural problem, if any.
    pub fn check(&self) -> std::result::Result<(), String> {
        let sides = [
            ("width", Some(self.width)),
            ("depth", Some(self.depth)),
            ("height", self.height),
        ];
        for (name, value) in sides {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(format!("dimensions.{name} must be positive (got {v})"));
                }
            }
        }
        if self.unit().is_none() {
            return Err(format!(
                "dimensions.unit '{}' is not one of m, cm, mm, ft, in",
                self.unit
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }

    /// Sides converted to metres; empty when the unit is unrecognized.
    #[must_use]
    pub fn sides_in_metres(&self) -> Vec<f64> {
        let Some(unit) = self.unit() else {
            return Vec::new();
        };
        [Some(self.width), Some(self.depth), self.height]
            .into_iter()
            .flatten()
            .map(|v| v * unit.metres())
            .collect()
    }
}

/// Either a structured triple or a descriptive string that did not parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DimensionsField {
    Structured(Dimensions),
    Descriptive(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDimensions {
    Structured(Dimensions),
    Text(String),
}

impl<'de> Deserialize<'de> for DimensionsField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawDimensions::deserialize(deserializer)? {
            RawDimensions::Structured(d) => Self::Structured(d),
            // Strings such as "4.5x1.8x1.4m" are promoted to a triple when they parse.
            RawDimensions::Text(text) => {
                find_dimensions(&text).unwrap_or(Self::Descriptive(text))
            }
        })
    }
}

impl DimensionsField {
    #[must_use]
    pub fn structured(&self) -> Option<&Dimensions> {
        match self {
            Self::Structured(d) => Some(d),
            Self::Descriptive(_) => None,
        }
    }

    /// True only for a structured triple with positive sides and a known unit.
    #[must_use]
    pub fn is_valid_structured(&self) -> bool {
        self.structured().is_some_and(Dimensions::is_valid)
    }
}

const NUMBER: &str = r"(\d+(?:\.\d+)?)";
// Unit glued to the number ("15cm") or a recognized unit word after a space.
const UNIT: &str = r"(?:([a-zA-Z]+)|\s+(millimet(?:er|re)s?|centimet(?:er|re)s?|met(?:er|re)s?|feet|foot|inch(?:es)?|mm|cm|ft|in|m)\b)?";

struct DimensionPattern {
    regex: Regex,
    layout: Layout,
}

#[derive(Clone, Copy)]
enum Layout {
    /// `W x D x H unit`
    Box3,
    /// `W x D unit`
    Plane2,
    /// `width W height H depth D`, each with an optional unit
    Verbose,
}

#[allow(clippy::expect_used)]
static PATTERNS: LazyLock<Vec<DimensionPattern>> = LazyLock::new(|| {
    let sep = r"\s*[x×X*]\s*";
    let field = |name: &str| format!(r"{name}\s*(?:of|:|=)?\s*{NUMBER}\s*([a-zA-Z]+)?");
    let gap = r"[\s,;]*(?:and\s+)?";
    let specs = [
        (format!(r"(?i){NUMBER}{sep}{NUMBER}{sep}{NUMBER}{UNIT}"), Layout::Box3),
        (format!(r"(?i){NUMBER}{sep}{NUMBER}{UNIT}"), Layout::Plane2),
        (
            format!(
                r"(?i){}{gap}{}{gap}{}",
                field("width"),
                field("height"),
                field("depth")
            ),
            Layout::Verbose,
        ),
    ];
    specs
        .into_iter()
        .map(|(source, layout)| DimensionPattern {
            regex: Regex::new(&source).expect("dimension pattern is a valid regex"),
            layout,
        })
        .collect()
});

/// Finds the first dimension expression in free text.
///
/// Patterns are tried in priority order (3-D, 2-D, verbose) and the first
/// one that matches wins. A match whose numbers are not all positive or
/// whose unit is not recognized is kept verbatim as
/// [`DimensionsField::Descriptive`]. A bare spaced `in` counts as inches
/// only at the end of a clause; "180x90x75 in oak" has no unit.
#[must_use]
pub fn find_dimensions(text: &str) -> Option<DimensionsField> {
    PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(text)?;
        let whole = caps.get(0)?;
        let dangling = pattern
            .layout
            .spaced_unit_group()
            .and_then(|i| caps.get(i))
            .filter(|u| {
                u.as_str().eq_ignore_ascii_case("in") && !ends_clause(&text[whole.end()..])
            });
        if let Some(preposition) = dangling {
            let raw = text[whole.start()..preposition.start()].trim();
            return Some(DimensionsField::Descriptive(raw.to_string()));
        }
        let raw = whole.as_str().trim().to_string();
        Some(
            structured_from(&caps, pattern.layout)
                .map_or(DimensionsField::Descriptive(raw), DimensionsField::Structured),
        )
    })
}

impl Layout {
    /// Capture group of the unit written after a space, if the layout has one.
    fn spaced_unit_group(self) -> Option<usize> {
        match self {
            Self::Box3 => Some(5),
            Self::Plane2 => Some(4),
            Self::Verbose => None,
        }
    }
}

fn ends_clause(rest: &str) -> bool {
    rest.trim_start()
        .chars()
        .next()
        .map_or(true, |c| !c.is_alphanumeric())
}

fn structured_from(caps: &Captures<'_>, layout: Layout) -> Option<Dimensions> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    let text = |i: usize| caps.get(i).map(|m| m.as_str());

    let (width, depth, height, unit) = match layout {
        Layout::Box3 => (
            num(1)?,
            num(2)?,
            Some(num(3)?),
            Unit::parse(text(4).or(text(5))?)?,
        ),
        Layout::Plane2 => (num(1)?, num(2)?, None, Unit::parse(text(3).or(text(4))?)?),
        Layout::Verbose => return verbose_from(caps),
    };
    let dims = Dimensions {
        width,
        depth,
        height,
        unit: unit.as_str().to_string(),
    };
    dims.is_valid().then_some(dims)
}

/// `width W height H depth D` where every side may carry its own unit.
///
/// The first unit written becomes the triple's unit; sides without a unit
/// inherit it and sides in another unit are converted to it.
fn verbose_from(caps: &Captures<'_>) -> Option<Dimensions> {
    // capture order: width, unit, height, unit, depth, unit
    let side = |value: usize, unit: usize| -> Option<(f64, Option<&str>)> {
        let v = caps.get(value)?.as_str().parse::<f64>().ok()?;
        Some((v, caps.get(unit).map(|m| m.as_str())))
    };
    let sides = [side(1, 2)?, side(3, 4)?, side(5, 6)?];
    let base = Unit::parse(sides.iter().find_map(|(_, unit)| *unit)?)?;

    let mut converted = [0.0; 3];
    for (slot, (value, unit)) in converted.iter_mut().zip(sides) {
        let from = match unit {
            Some(raw) => Unit::parse(raw)?,
            None => base,
        };
        *slot = convert(value, from, base);
    }
    let [width, height, depth] = converted;
    let dims = Dimensions {
        width,
        depth,
        height: Some(height),
        unit: base.as_str().to_string(),
    };
    dims.is_valid().then_some(dims)
}

/// Converts a length between units, rounded to six decimals.
fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    if from == to {
        return value;
    }
    (value * from.metres() / to.metres() * 1e6).round() / 1e6
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured(text: &str) -> Dimensions {
        match find_dimensions(text) {
            Some(DimensionsField::Structured(d)) => d,
            other => panic!("expected structured dimensions for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn parses_three_dimensional_triple() {
        let d = structured("a drone 50x30x15cm for surveillance");
        assert_eq!(d, Dimensions::new(50.0, 30.0, 15.0, Unit::Cm));
    }

    #[test]
    fn parses_decimals_and_spaced_units() {
        let d = structured("roughly 4.5 x 1.8 x 1.4 meters overall");
        assert_eq!(d, Dimensions::new(4.5, 1.8, 1.4, Unit::M));
    }

    #[test]
    fn parses_plane_footprint_without_height() {
        let d = structured("a desk of 120x80cm");
        assert_eq!(d.height, None);
        assert_eq!(d.unit, "cm");
    }

    #[test]
    fn parses_verbose_phrasing() {
        let d = structured("Width 2m, height 1.5m and depth 0.6m");
        assert_eq!(d.width, 2.0);
        assert_eq!(d.height, Some(1.5));
        assert_eq!(d.depth, 0.6);
        assert_eq!(d.unit, "m");
    }

    #[test]
    fn verbose_sides_in_mixed_units_are_converted_to_the_first_unit() {
        let d = structured("width 2m height 150cm depth 60cm cabinet");
        assert_eq!(d, Dimensions::new(2.0, 0.6, 1.5, Unit::M));

        let d = structured("width 120cm, height 0.75m and depth 800mm");
        assert_eq!(d, Dimensions::new(120.0, 80.0, 75.0, Unit::Cm));
    }

    #[test]
    fn verbose_sides_without_unit_inherit_the_written_one() {
        let d = structured("width 2 height 1.5m depth 0.6");
        assert_eq!(d, Dimensions::new(2.0, 0.6, 1.5, Unit::M));
    }

    #[test]
    fn verbose_side_with_unknown_unit_keeps_raw_text() {
        assert!(matches!(
            find_dimensions("width 2m height 3furlongs depth 1m"),
            Some(DimensionsField::Descriptive(_))
        ));
    }

    #[test]
    fn preposition_in_is_not_read_as_inches() {
        assert_eq!(
            find_dimensions("a table 180x90x75 in oak for dining"),
            Some(DimensionsField::Descriptive("180x90x75".into()))
        );
        assert_eq!(
            find_dimensions("a desk 120x80 in walnut"),
            Some(DimensionsField::Descriptive("120x80".into()))
        );
    }

    #[test]
    fn trailing_in_is_inches() {
        assert_eq!(structured("a monitor 24x14x2 in").unit, "in");
        assert_eq!(structured("a frame 24 x 36 in, framed").unit, "in");
        assert_eq!(structured("a shelf 30x12x10in oak").unit, "in");
    }

    #[test]
    fn unknown_unit_keeps_raw_text() {
        assert_eq!(
            find_dimensions("a box 3x4x5furlongs wide"),
            Some(DimensionsField::Descriptive("3x4x5furlongs".into()))
        );
    }

    #[test]
    fn missing_unit_keeps_raw_text() {
        assert_eq!(
            find_dimensions("a table 180x90x75 for dining"),
            Some(DimensionsField::Descriptive("180x90x75".into()))
        );
    }

    #[test]
    fn zero_component_keeps_raw_text() {
        assert_eq!(
            find_dimensions("0x30x15cm"),
            Some(DimensionsField::Descriptive("0x30x15cm".into()))
        );
    }

    #[test]
    fn no_dimensions_in_plain_text() {
        assert_eq!(find_dimensions("a red sports car"), None);
        assert_eq!(find_dimensions(""), None);
    }

    #[test]
    fn string_dimensions_are_promoted_on_input() {
        let spec: Specification = serde_json::from_value(json!({
            "type": "car",
            "material": ["steel"],
            "dimensions": "4.5x1.8x1.4m",
            "color": null,
            "purpose": null,
            "extras": null
        }))
        .unwrap();
        assert!(spec.dimensions.as_ref().unwrap().is_valid_structured());
    }

    #[test]
    fn serializes_all_six_fields_even_when_null() {
        let json = serde_json::to_value(Specification::unknown()).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["type", "material", "dimensions", "color", "purpose", "extras"] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert!(!obj.contains_key("meta"));
        assert!(!obj.contains_key("r#type"));
    }

    #[test]
    fn from_value_names_missing_field() {
        let err = Specification::from_value(json!({"material": []})).unwrap_err();
        assert!(matches!(err, SpecError::MissingField("type")));

        let err = Specification::from_value(json!({"type": "car"})).unwrap_err();
        assert!(err.to_string().contains("material"));
    }

    #[test]
    fn from_value_rejects_wrong_shapes() {
        let err =
            Specification::from_value(json!({"type": 3, "material": []})).unwrap_err();
        assert!(err.to_string().contains("'type'"));

        let err = Specification::from_value(json!({
            "type": "car", "material": ["steel", 4]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("'material'"));

        let err = Specification::from_value(json!({
            "type": "car", "material": [], "dimensions": 12
        }))
        .unwrap_err();
        assert!(err.to_string().contains("'dimensions'"));

        assert!(matches!(
            Specification::from_value(json!(["car"])),
            Err(SpecError::NotAnObject { .. })
        ));
    }

    #[test]
    fn from_value_defaults_optional_fields_to_null() {
        let spec = Specification::from_value(json!({
            "type": "table", "material": ["wood"]
        }))
        .unwrap();
        assert_eq!(spec.dimensions, None);
        assert_eq!(spec.color, None);
        assert_eq!(spec.purpose, None);
        assert_eq!(spec.extras, None);
    }

    #[test]
    fn structural_check_reports_non_positive_side() {
        let d = Dimensions::new(0.0, 30.0, 15.0, Unit::Cm);
        let err = d.check().unwrap_err();
        assert!(err.contains("width"));
    }
}
