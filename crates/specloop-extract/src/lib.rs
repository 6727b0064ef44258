#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Prompt-to-specification field extraction.
//!
//! [`FieldExtractor`] turns free text into a [`Specification`] with five
//! independent sub-extractions (type, material, dimensions, purpose, color).
//! None of them can fail: unresolved fields fall back to `"unknown"` or null.

use std::sync::Arc;

use regex::Regex;
use specloop_core::score::completeness_fraction;
use specloop_core::tables::DomainTables;
use specloop_core::{find_dimensions, SpecMeta, Specification, UNKNOWN};

pub mod text;

use text::{contains_phrase, find_phrase, tokens};

/// Detected type label and its confidence on the 0–10 scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMatch {
    pub type_tag: String,
    pub confidence: u8,
}

impl TypeMatch {
    fn unknown() -> Self {
        Self {
            type_tag: UNKNOWN.to_string(),
            confidence: 0,
        }
    }
}

struct CompiledKeyword {
    tokens: Vec<String>,
    weight: u8,
}

struct CompiledProfile {
    type_tag: String,
    keywords: Vec<CompiledKeyword>,
}

struct CompiledLexeme {
    /// Canonical name reported in the specification.
    name: String,
    /// Token sequences of the name and every synonym.
    variants: Vec<Vec<String>>,
}

/// Extracts specifications from prompts using the injected tables.
///
/// Keyword and synonym phrases are tokenised once at construction.
pub struct FieldExtractor {
    tables: Arc<DomainTables>,
    profiles: Vec<CompiledProfile>,
    materials: Vec<CompiledLexeme>,
    colors: Vec<CompiledLexeme>,
    purpose_patterns: Vec<Regex>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(DomainTables::shared())
    }
}

impl FieldExtractor {
    #[must_use]
    pub fn new(tables: Arc<DomainTables>) -> Self {
        let profiles = tables
            .profiles
            .iter()
            .map(|p| CompiledProfile {
                type_tag: p.type_tag.clone(),
                keywords: p
                    .keywords
                    .iter()
                    .map(|k| CompiledKeyword {
                        tokens: tokens(&k.phrase),
                        weight: k.weight,
                    })
                    .filter(|k| !k.tokens.is_empty())
                    .collect(),
            })
            .collect();
        let materials = tables
            .materials
            .iter()
            .map(|m| lexeme(&m.name, &m.synonyms))
            .collect();
        let colors = tables
            .colors
            .iter()
            .map(|c| lexeme(&c.name, &c.synonyms))
            .collect();
        // Escaped literals always compile; anything else is skipped.
        let purpose_patterns = tables
            .purpose_markers
            .iter()
            .filter_map(|marker| {
                Regex::new(&format!(r"(?i)\b{}\s+([^,.;:!?\n]+)", regex::escape(marker))).ok()
            })
            .collect();
        Self {
            tables,
            profiles,
            materials,
            colors,
            purpose_patterns,
        }
    }

    #[must_use]
    pub fn tables(&self) -> &DomainTables {
        &self.tables
    }

    /// Builds a complete specification from a prompt. Never fails.
    #[must_use]
    pub fn extract(&self, prompt: &str) -> Specification {
        let words = tokens(prompt);
        let detected = self.detect_type(&words);
        let material = self.materials_in(&words, &detected.type_tag);

        let mut spec = Specification {
            r#type: detected.type_tag,
            material,
            dimensions: find_dimensions(prompt),
            color: self.color_in(&words),
            purpose: self.purpose_in(prompt),
            extras: None,
            meta: None,
        };
        spec.meta = Some(SpecMeta {
            confidence: detected.confidence,
            semantic_quality: completeness_fraction(&spec),
        });

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            spec_type = %spec.r#type,
            confidence = detected.confidence,
            materials = spec.material.len(),
            has_dimensions = spec.dimensions.is_some(),
            "prompt extracted"
        );

        spec
    }

    /// Picks the type whose distinct matched keywords weigh the most.
    ///
    /// Ties go to the type with the heaviest single matched keyword, then to
    /// table order. A winning sum below the minimum threshold yields
    /// `unknown` with confidence 0.
    #[must_use]
    pub fn detect_type(&self, words: &[String]) -> TypeMatch {
        let mut best: Option<(&str, u32, u8)> = None;
        for profile in &self.profiles {
            let mut sum = 0u32;
            let mut heaviest = 0u8;
            for keyword in &profile.keywords {
                if contains_phrase(words, &keyword.tokens) {
                    sum += u32::from(keyword.weight);
                    heaviest = heaviest.max(keyword.weight);
                }
            }
            if sum == 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_sum, best_heaviest)) => {
                    sum > best_sum || (sum == best_sum && heaviest > best_heaviest)
                }
            };
            if better {
                best = Some((profile.type_tag.as_str(), sum, heaviest));
            }
        }

        match best {
            Some((tag, sum, _)) if sum >= u32::from(self.tables.thresholds.min_type_confidence) => {
                TypeMatch {
                    type_tag: tag.to_string(),
                    confidence: u8::try_from(sum.min(10)).unwrap_or(10),
                }
            }
            _ => TypeMatch::unknown(),
        }
    }

    /// Canonical materials mentioned in the prompt, in table order.
    ///
    /// A recognised type with no material mention yields the `unknown`
    /// sentinel; an unrecognised type yields an empty list.
    fn materials_in(&self, words: &[String], type_tag: &str) -> Vec<String> {
        let found: Vec<String> = self
            .materials
            .iter()
            .filter(|m| m.variants.iter().any(|v| contains_phrase(words, v)))
            .map(|m| m.name.clone())
            .collect();
        if found.is_empty() && type_tag != UNKNOWN {
            return vec![UNKNOWN.to_string()];
        }
        found
    }

    /// The color mentioned first in the prompt.
    fn color_in(&self, words: &[String]) -> Option<String> {
        self.colors
            .iter()
            .filter_map(|c| {
                c.variants
                    .iter()
                    .filter_map(|v| find_phrase(words, v))
                    .min()
                    .map(|pos| (pos, &c.name))
            })
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, name)| name.clone())
    }

    /// Text following the first purpose marker that matches, most specific
    /// marker first.
    fn purpose_in(&self, prompt: &str) -> Option<String> {
        self.purpose_patterns.iter().find_map(|pattern| {
            let captured = pattern.captures(prompt)?.get(1)?.as_str().trim();
            (!captured.is_empty()).then(|| captured.to_string())
        })
    }
}

fn lexeme(name: &str, synonyms: &[String]) -> CompiledLexeme {
    CompiledLexeme {
        name: name.to_string(),
        variants: std::iter::once(name)
            .chain(synonyms.iter().map(String::as_str))
            .map(tokens)
            .filter(|t| !t.is_empty())
            .collect(),
    }
}
