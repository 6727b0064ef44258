//! Static keyword, material and per-type tables.
//!
//! The tables are plain data: loaded once per process (see
//! [`DomainTables::shared`]) and handed to the extractor, scorer and feedback
//! generator as an `Arc`. Per-type behaviour lives in [`DomainProfile`]
//! records keyed by type tag, with [`DomainTables::fallback`] standing in for
//! every label that has no profile.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpecError};
use crate::score::{Objective, QualityBreakdown};
use crate::spec::{Dimensions, Unit, UNKNOWN};

/// Tolerance for the objective weights summing to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;
/// Weight of a weak hint keyword such as "furniture" or "structure".
const HINT_WEIGHT: u8 = 2;

/// Application domain of a type, used for remediation wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Automotive,
    Construction,
    Aerospace,
    Furniture,
    Mechanical,
    General,
}

/// A type keyword with its detection weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub phrase: String,
    pub weight: u8,
}

impl Keyword {
    /// A naming keyword; weight grows with the number of words in the phrase.
    #[must_use]
    pub fn new(phrase: &str) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let words = phrase.split_whitespace().count().min(3) as u8;
        Self {
            phrase: phrase.to_string(),
            weight: 2 * words + 3,
        }
    }

    /// A weak contextual hint.
    #[must_use]
    pub fn hint(phrase: &str) -> Self {
        Self {
            phrase: phrase.to_string(),
            weight: HINT_WEIGHT,
        }
    }
}

/// Behaviour record for one type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainProfile {
    pub type_tag: String,
    pub domain: Domain,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    /// Canonical material names considered realistic for this type.
    #[serde(default)]
    pub plausible_materials: Vec<String>,
    /// Replacement list used by the `fix_materials` patch.
    pub canonical_materials: Vec<String>,
    pub standard_dimensions: Dimensions,
    pub default_purpose: String,
    pub default_color: String,
    /// Patch defaults when optimising for cost efficiency.
    #[serde(default)]
    pub economy: Option<ObjectiveDefaults>,
    /// Patch defaults when optimising for innovation.
    #[serde(default)]
    pub advanced: Option<ObjectiveDefaults>,
}

/// Materials, size and purpose tuned towards one quality objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveDefaults {
    pub materials: Vec<String>,
    pub dimensions: Dimensions,
    pub purpose: String,
}

impl DomainProfile {
    fn tuned(&self, target: Objective) -> Option<&ObjectiveDefaults> {
        match target {
            Objective::CostEfficiency => self.economy.as_ref(),
            Objective::Innovation => self.advanced.as_ref(),
            Objective::Completeness | Objective::Realism | Objective::Feasibility => None,
        }
    }

    /// Replacement materials when optimising for `target`; the canonical
    /// list unless the profile has a tuned variant.
    #[must_use]
    pub fn materials_for(&self, target: Objective) -> &[String] {
        self.tuned(target)
            .map_or(&self.canonical_materials, |d| &d.materials)
    }

    #[must_use]
    pub fn dimensions_for(&self, target: Objective) -> &Dimensions {
        self.tuned(target)
            .map_or(&self.standard_dimensions, |d| &d.dimensions)
    }

    #[must_use]
    pub fn purpose_for(&self, target: Objective) -> &str {
        self.tuned(target)
            .map_or(&self.default_purpose, |d| &d.purpose)
    }
}

/// How readily a material can be manufactured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManufacturingTier {
    Common,
    Specialised,
    Exotic,
}

impl ManufacturingTier {
    #[must_use]
    pub fn score(self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Specialised => 0.7,
            Self::Exotic => 0.4,
        }
    }
}

/// Rough cost class of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostClass {
    Economy,
    Standard,
    Expensive,
}

/// A known material with its prompt synonyms (any supported language).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub tier: ManufacturingTier,
    pub cost: CostClass,
    #[serde(default)]
    pub advanced: bool,
}

/// A canonical colour name with localized synonyms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorEntry {
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Fixed policy thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Winning keyword sums below this resolve to `unknown`.
    pub min_type_confidence: u8,
    /// Confidence needed for any type-match credit.
    pub type_confidence: u8,
    /// Confidence needed for full type-match credit.
    pub high_confidence: u8,
    /// `spec_score` below this asks for `improve_completeness`.
    pub improvement: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_type_confidence: 3,
            type_confidence: 5,
            high_confidence: 8,
            improvement: 8,
        }
    }
}

/// Weights of the five quality objectives; they sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    pub completeness: f64,
    pub realism: f64,
    pub feasibility: f64,
    pub innovation: f64,
    pub cost_efficiency: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            completeness: 0.30,
            realism: 0.25,
            feasibility: 0.20,
            innovation: 0.15,
            cost_efficiency: 0.10,
        }
    }
}

impl ObjectiveWeights {
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.completeness + self.realism + self.feasibility + self.innovation + self.cost_efficiency
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

    /// Weighted sum of per-objective changes, clamped to [-1, 1].
    #[must_use]
    pub fn weighted_delta(&self, before: &QualityBreakdown, after: &QualityBreakdown) -> f64 {
        Objective::ALL
            .iter()
            .map(|o| (after.get(*o) - before.get(*o)) * self.get(*o))
            .sum::<f64>()
            .clamp(-1.0, 1.0)
    }
}

/// All read-only configuration shared by the engine components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTables {
    pub profiles: Vec<DomainProfile>,
    pub fallback: DomainProfile,
    pub materials: Vec<MaterialEntry>,
    pub colors: Vec<ColorEntry>,
    /// Phrases that introduce a purpose, most specific first.
    pub purpose_markers: Vec<String>,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub weights: ObjectiveWeights,
}

static SHARED: OnceLock<Arc<DomainTables>> = OnceLock::new();

impl DomainTables {
    /// The built-in tables, initialised once per process.
    #[must_use]
    pub fn shared() -> Arc<DomainTables> {
        SHARED.get_or_init(|| Arc::new(Self::builtin())).clone()
    }

    /// Loads alternate tables from JSON and validates them.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let tables: Self = serde_json::from_str(json)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SpecError::InvalidTables(format!(
                "objective weights must sum to 1.0 (got {sum})"
            )));
        }
        let t = self.thresholds;
        if [t.min_type_confidence, t.type_confidence, t.high_confidence, t.improvement]
            .iter()
            .any(|v| *v > 10)
        {
            return Err(SpecError::InvalidTables(
                "thresholds must lie within 0..=10".into(),
            ));
        }
        for profile in self.profiles.iter().chain(std::iter::once(&self.fallback)) {
            profile.standard_dimensions.check().map_err(|e| {
                SpecError::InvalidTables(format!("profile '{}': {e}", profile.type_tag))
            })?;
            if profile.canonical_materials.is_empty() {
                return Err(SpecError::InvalidTables(format!(
                    "profile '{}' has no canonical materials",
                    profile.type_tag
                )));
            }
            let variants = [("economy", &profile.economy), ("advanced", &profile.advanced)];
            for (label, defaults) in variants {
                let Some(defaults) = defaults else { continue };
                defaults.dimensions.check().map_err(|e| {
                    SpecError::InvalidTables(format!(
                        "profile '{}' {label}: {e}",
                        profile.type_tag
                    ))
                })?;
                if defaults.materials.is_empty() {
                    return Err(SpecError::InvalidTables(format!(
                        "profile '{}' {label} defaults have no materials",
                        profile.type_tag
                    )));
                }
            }
        }
        Ok(())
    }

    /// Profile for a type label, if the label is a supported type.
    #[must_use]
    pub fn profile(&self, type_tag: &str) -> Option<&DomainProfile> {
        let tag = type_tag.trim();
        self.profiles
            .iter()
            .find(|p| p.type_tag.eq_ignore_ascii_case(tag))
    }

    #[must_use]
    pub fn profile_or_fallback(&self, type_tag: &str) -> &DomainProfile {
        self.profile(type_tag).unwrap_or(&self.fallback)
    }

    /// Resolves a material name or synonym to its table entry.
    #[must_use]
    pub fn material(&self, name: &str) -> Option<&MaterialEntry> {
        let needle = name.trim().to_lowercase();
        self.materials.iter().find(|m| {
            same_name(&m.name, &needle) || m.synonyms.iter().any(|s| same_name(s, &needle))
        })
    }

    /// Whether a material is realistic for the type. Unsupported types accept
    /// anything any profile accepts; the `unknown` sentinel is never plausible.
    #[must_use]
    pub fn is_plausible(&self, type_tag: &str, material: &str) -> bool {
        let Some(entry) = self.material(material) else {
            return false;
        };
        match self.profile(type_tag) {
            Some(profile) => whitelists(profile, &entry.name),
            None => self.profiles.iter().any(|p| whitelists(p, &entry.name)),
        }
    }

    /// Built-in English, Spanish, French and German tables.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            profiles: vec![
                DomainProfile {
                    type_tag: "car".into(),
                    domain: Domain::Automotive,
                    keywords: keywords(
                        &[
                            "car", "vehicle", "automobile", "sports car", "racing car", "sedan",
                            "suv", "truck", "coupe", "coche", "vehículo", "auto", "voiture",
                            "véhicule", "fahrzeug",
                        ],
                        &["van", "wagen", "roadster"],
                    ),
                    plausible_materials: names(&[
                        "steel", "aluminum", "carbon fiber", "plastic", "glass", "rubber",
                    ]),
                    canonical_materials: names(&["aluminum", "steel"]),
                    standard_dimensions: Dimensions::new(4.5, 1.8, 1.4, Unit::M),
                    default_purpose: "transportation".into(),
                    default_color: "red".into(),
                    economy: Some(tuned(
                        &["steel"],
                        Dimensions::new(4.0, 1.6, 1.3, Unit::M),
                        "efficient transportation",
                    )),
                    advanced: Some(tuned(
                        &["carbon fiber", "aluminum"],
                        Dimensions::new(5.0, 2.0, 1.5, Unit::M),
                        "autonomous electric racing vehicle",
                    )),
                },
                DomainProfile {
                    type_tag: "building".into(),
                    domain: Domain::Construction,
                    keywords: keywords(
                        &[
                            "building", "house", "office", "library", "tower", "skyscraper",
                            "warehouse", "casa", "edificio", "oficina", "maison", "bâtiment",
                            "haus", "gebäude", "büro",
                        ],
                        &["structure", "construction", "architecture"],
                    ),
                    plausible_materials: names(&[
                        "concrete", "steel", "glass", "brick", "wood", "stone", "smart glass",
                    ]),
                    canonical_materials: names(&["concrete", "glass"]),
                    standard_dimensions: Dimensions::new(20.0, 15.0, 8.0, Unit::M),
                    default_purpose: "commercial use".into(),
                    default_color: "gray".into(),
                    economy: Some(tuned(
                        &["concrete"],
                        Dimensions::new(15.0, 12.0, 6.0, Unit::M),
                        "commercial office space",
                    )),
                    advanced: Some(tuned(
                        &["smart glass", "steel"],
                        Dimensions::new(25.0, 20.0, 12.0, Unit::M),
                        "smart sustainable office complex",
                    )),
                },
                DomainProfile {
                    type_tag: "drone".into(),
                    domain: Domain::Aerospace,
                    keywords: keywords(
                        &[
                            "drone", "uav", "quadcopter", "aerial", "unmanned", "multicopter",
                            "dron", "drohne",
                        ],
                        &["flying", "aircraft", "copter"],
                    ),
                    plausible_materials: names(&["carbon fiber", "aluminum", "plastic", "titanium"]),
                    canonical_materials: names(&["carbon fiber"]),
                    standard_dimensions: Dimensions::new(50.0, 50.0, 15.0, Unit::Cm),
                    default_purpose: "aerial surveillance".into(),
                    default_color: "black".into(),
                    economy: Some(tuned(
                        &["aluminum"],
                        Dimensions::new(40.0, 40.0, 12.0, Unit::Cm),
                        "aerial surveillance",
                    )),
                    advanced: Some(tuned(
                        &["carbon fiber", "titanium"],
                        Dimensions::new(60.0, 60.0, 20.0, Unit::Cm),
                        "AI-powered surveillance and delivery",
                    )),
                },
                DomainProfile {
                    type_tag: "table".into(),
                    domain: Domain::Furniture,
                    keywords: keywords(
                        &[
                            "table", "desk", "dining table", "coffee table", "workbench", "mesa",
                            "escritorio", "tisch", "schreibtisch",
                        ],
                        &["furniture", "mueble", "meuble", "möbel", "bureau"],
                    ),
                    plausible_materials: names(&[
                        "wood", "steel", "aluminum", "glass", "plastic", "stone", "smart glass",
                    ]),
                    canonical_materials: names(&["wood"]),
                    standard_dimensions: Dimensions::new(180.0, 90.0, 75.0, Unit::Cm),
                    default_purpose: "dining".into(),
                    default_color: "brown".into(),
                    economy: Some(tuned(
                        &["wood"],
                        Dimensions::new(120.0, 80.0, 75.0, Unit::Cm),
                        "dining and workspace",
                    )),
                    advanced: Some(tuned(
                        &["smart glass", "aluminum"],
                        Dimensions::new(200.0, 100.0, 75.0, Unit::Cm),
                        "smart interactive workspace",
                    )),
                },
                DomainProfile {
                    type_tag: "gearbox".into(),
                    domain: Domain::Mechanical,
                    keywords: keywords(
                        &[
                            "gearbox", "transmission", "drivetrain", "caja de cambios",
                            "engranaje", "boîte de vitesses", "engrenage", "getriebe", "zahnrad",
                        ],
                        &["gear", "clutch", "mechanical"],
                    ),
                    plausible_materials: names(&["steel", "aluminum", "titanium", "plastic"]),
                    canonical_materials: names(&["steel"]),
                    standard_dimensions: Dimensions::new(40.0, 30.0, 25.0, Unit::Cm),
                    default_purpose: "power transmission".into(),
                    default_color: "gray".into(),
                    economy: Some(tuned(
                        &["steel"],
                        Dimensions::new(30.0, 25.0, 20.0, Unit::Cm),
                        "power transmission",
                    )),
                    advanced: Some(tuned(
                        &["titanium"],
                        Dimensions::new(35.0, 28.0, 22.0, Unit::Cm),
                        "high-torque precision power transmission",
                    )),
                },
            ],
            fallback: DomainProfile {
                type_tag: UNKNOWN.into(),
                domain: Domain::General,
                keywords: Vec::new(),
                plausible_materials: Vec::new(),
                canonical_materials: names(&["steel"]),
                standard_dimensions: Dimensions::new(100.0, 50.0, 30.0, Unit::Cm),
                default_purpose: "general use".into(),
                default_color: "gray".into(),
                economy: Some(tuned(
                    &["steel"],
                    Dimensions::new(100.0, 50.0, 30.0, Unit::Cm),
                    "general purpose use",
                )),
                advanced: Some(tuned(
                    &["carbon fiber"],
                    Dimensions::new(100.0, 50.0, 30.0, Unit::Cm),
                    "multi-purpose smart design prototype",
                )),
            },
            materials: vec![
                material(
                    "steel",
                    &["metal", "iron", "stainless", "acero", "acier", "stahl", "eisen"],
                    ManufacturingTier::Common,
                    CostClass::Economy,
                    false,
                ),
                material(
                    "aluminum",
                    &["aluminium", "alloy", "lightweight metal", "aluminio"],
                    ManufacturingTier::Common,
                    CostClass::Economy,
                    false,
                ),
                material(
                    "wood",
                    &["wooden", "timber", "oak", "pine", "mahogany", "bamboo", "madera", "bois", "holz"],
                    ManufacturingTier::Common,
                    CostClass::Economy,
                    false,
                ),
                material(
                    "concrete",
                    &["cement", "reinforced concrete", "hormigón", "béton", "beton"],
                    ManufacturingTier::Common,
                    CostClass::Standard,
                    false,
                ),
                material(
                    "glass",
                    &["tempered glass", "vidrio", "verre", "glas"],
                    ManufacturingTier::Common,
                    CostClass::Standard,
                    false,
                ),
                material(
                    "carbon fiber",
                    &["carbon fibre", "composite", "fibra de carbono", "fibre de carbone", "kohlefaser"],
                    ManufacturingTier::Specialised,
                    CostClass::Expensive,
                    true,
                ),
                material(
                    "plastic",
                    &["polymer", "abs", "pvc", "plástico", "plastique", "kunststoff"],
                    ManufacturingTier::Common,
                    CostClass::Economy,
                    false,
                ),
                material(
                    "brick",
                    &["masonry", "ladrillo", "brique", "ziegel"],
                    ManufacturingTier::Common,
                    CostClass::Standard,
                    false,
                ),
                material(
                    "stone",
                    &["granite", "marble", "limestone", "piedra", "pierre", "stein"],
                    ManufacturingTier::Common,
                    CostClass::Standard,
                    false,
                ),
                material(
                    "rubber",
                    &["caucho", "caoutchouc", "gummi"],
                    ManufacturingTier::Common,
                    CostClass::Standard,
                    false,
                ),
                material(
                    "titanium",
                    &["titanio", "titane", "titan"],
                    ManufacturingTier::Specialised,
                    CostClass::Expensive,
                    true,
                ),
                material(
                    "graphene",
                    &["grafeno", "graphène", "graphen"],
                    ManufacturingTier::Exotic,
                    CostClass::Expensive,
                    true,
                ),
                material("aerogel", &[], ManufacturingTier::Exotic, CostClass::Expensive, true),
                material(
                    "smart glass",
                    &["vidrio inteligente", "verre intelligent"],
                    ManufacturingTier::Exotic,
                    CostClass::Expensive,
                    true,
                ),
                material("gold", &["oro"], ManufacturingTier::Exotic, CostClass::Expensive, false),
                material(
                    "platinum",
                    &["platino", "platine", "platin"],
                    ManufacturingTier::Exotic,
                    CostClass::Expensive,
                    false,
                ),
            ],
            colors: vec![
                color("red", &["rojo", "roja", "rouge", "rot"]),
                color("blue", &["azul", "bleu", "blau"]),
                color("green", &["verde", "vert", "grün"]),
                color("black", &["negro", "negra", "noir", "schwarz"]),
                color("white", &["blanco", "blanca", "blanc", "weiß"]),
                color("yellow", &["amarillo", "jaune", "gelb"]),
                color("gray", &["grey", "gris", "grau"]),
                color("silver", &["plata", "argent", "silber"]),
                color("brown", &["marrón", "marron", "braun"]),
                color("orange", &["naranja"]),
            ],
            purpose_markers: names(&[
                "used for",
                "designed for",
                "intended for",
                "purpose is",
                "meant for",
                "for",
                "para",
                "pour",
                "für",
            ]),
            thresholds: Thresholds::default(),
            weights: ObjectiveWeights::default(),
        }
    }
}

/// Table names compare case-insensitively; alternate tables may capitalise.
fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn whitelists(profile: &DomainProfile, material: &str) -> bool {
    profile
        .plausible_materials
        .iter()
        .any(|name| same_name(name, material))
}

fn keywords(naming: &[&str], hints: &[&str]) -> Vec<Keyword> {
    naming
        .iter()
        .map(|p| Keyword::new(p))
        .chain(hints.iter().map(|p| Keyword::hint(p)))
        .collect()
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn material(
    name: &str,
    synonyms: &[&str],
    tier: ManufacturingTier,
    cost: CostClass,
    advanced: bool,
) -> MaterialEntry {
    MaterialEntry {
        name: name.to_string(),
        synonyms: names(synonyms),
        tier,
        cost,
        advanced,
    }
}

fn tuned(materials: &[&str], dimensions: Dimensions, purpose: &str) -> ObjectiveDefaults {
    ObjectiveDefaults {
        materials: names(materials),
        dimensions,
        purpose: purpose.to_string(),
    }
}

fn color(name: &str, synonyms: &[&str]) -> ColorEntry {
    ColorEntry {
        name: name.to_string(),
        synonyms: names(synonyms),
    }
}
