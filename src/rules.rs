//! Weighted rule evaluation: extracts independently-sourced factors from a
//! chart (and optional comparison aspects and numerology) against the
//! meaning library, then aggregates them into per-topic scores.
//!
//! Scores accumulate as a weighted sum, not an average, so a richer chart
//! legitimately scores higher. Rescaling to a display range is the
//! caller's concern.

use crate::meanings::{MeaningBlock, MeaningLibrary};
use crate::numerology::NumerologyProfile;
use crate::{Aspect, Chart, Topic, TopicScores};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Houses 1, 4, 7, and 10 are angular; planets there amplify an aspect.
const ANGULAR_HOUSES: [u8; 4] = [1, 4, 7, 10];
const ANGULAR_BONUS: f64 = 0.1;
const ORB_WEIGHT_FLOOR: f64 = 0.2;
const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorOrigin {
    Natal,
    Transit,
    Synastry,
}

impl fmt::Display for FactorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FactorOrigin::Natal => write!(f, "natal"),
            FactorOrigin::Transit => write!(f, "transit"),
            FactorOrigin::Synastry => write!(f, "synastry"),
        }
    }
}

/// One scored contribution, produced per evaluation and discarded after the
/// caller extracts what it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    pub code: String,
    pub label: String,
    pub score: f64,
    pub topic_scores: TopicScores,
    pub meaning: Option<&'static MeaningBlock>,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleResult {
    pub topic_scores: TopicScores,
    pub factors: Vec<Factor>,
}

// ---------------------------
// ## Emphasis table
// ---------------------------

/// Per-query-type topic multipliers. Unknown query types get no entry and
/// every topic multiplies by a neutral 1.0.
fn emphasis(query_type: &str) -> HashMap<Topic, f64> {
    use Topic::*;
    let table: &[(Topic, f64)] = match query_type {
        "natal_love" => &[(Love, 1.3), (Emotional, 1.15), (Support, 1.05)],
        "natal_career" => &[(Career, 1.3), (Challenge, 1.1), (General, 1.05)],
        "natal_health" => &[(Health, 1.3), (Emotional, 1.1)],
        "natal_general" => &[(General, 1.2), (Support, 1.05)],
        "daily_forecast" => &[(General, 1.15), (Emotional, 1.1), (Challenge, 1.05)],
        "compatibility_romantic" => &[(Love, 1.35), (Emotional, 1.2), (Support, 1.1)],
        "compatibility_friendship" => &[(Support, 1.25), (General, 1.1)],
        _ => &[],
    };
    table.iter().copied().collect()
}

/// Query-type-aware score of a weight vector, renormalized against the
/// block's own topic mix. A block with no weights is neutral.
fn base_score(block_weights: &TopicScores, emphasis: &HashMap<Topic, f64>) -> f64 {
    let total: f64 = block_weights.values().sum();
    if total == 0.0 {
        return NEUTRAL_SCORE;
    }
    let emphasized: f64 = block_weights
        .iter()
        .map(|(topic, weight)| weight * emphasis.get(topic).copied().unwrap_or(1.0))
        .sum();
    emphasized / total
}

// ---------------------------
// ## Engine
// ---------------------------

#[derive(Debug)]
pub struct RuleEngine {
    library: &'static MeaningLibrary,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        RuleEngine {
            library: MeaningLibrary::global(),
        }
    }

    /// Evaluates every available factor source. Optional inputs simply
    /// contribute no factors; missing meaning lookups skip silently. Never
    /// fails for data-dependent reasons.
    pub fn evaluate(
        &self,
        query_type: &str,
        chart: &Chart,
        transit_aspects: Option<&[Aspect]>,
        synastry_aspects: Option<&[Aspect]>,
        numerology: Option<&NumerologyProfile>,
    ) -> RuleResult {
        let emphasis = emphasis(query_type);
        let mut factors = Vec::new();

        self.sign_factors(chart, &emphasis, &mut factors);
        self.house_factors(chart, &emphasis, &mut factors);
        self.aspect_factors(&chart.aspects, FactorOrigin::Natal, &mut factors);
        if let Some(aspects) = transit_aspects {
            self.aspect_factors(aspects, FactorOrigin::Transit, &mut factors);
        }
        if let Some(aspects) = synastry_aspects {
            self.aspect_factors(aspects, FactorOrigin::Synastry, &mut factors);
        }
        if let Some(profile) = numerology {
            self.numerology_factors(profile, &emphasis, &mut factors);
        }

        log::debug!(
            "evaluated {} factors for query_type={}",
            factors.len(),
            query_type
        );

        let mut topic_scores: TopicScores = Topic::iter().map(|t| (t, 0.0)).collect();
        for factor in &factors {
            for (topic, weight) in &factor.topic_scores {
                *topic_scores.entry(*topic).or_insert(0.0) += weight * factor.score;
            }
        }

        RuleResult {
            topic_scores,
            factors,
        }
    }

    fn sign_factors(
        &self,
        chart: &Chart,
        emphasis: &HashMap<Topic, f64>,
        factors: &mut Vec<Factor>,
    ) {
        for planet in &chart.planets {
            let Some(block) = self.library.planet_sign(planet.planet, planet.sign) else {
                continue;
            };
            factors.push(Factor {
                code: format!("sign:{}:{}", planet.planet, planet.sign).to_lowercase(),
                label: format!("{} in {}", planet.planet, planet.sign),
                score: base_score(&block.weights, emphasis),
                topic_scores: block.weights.clone(),
                meaning: Some(block),
                context: FactorOrigin::Natal.to_string(),
            });
        }
    }

    fn house_factors(
        &self,
        chart: &Chart,
        emphasis: &HashMap<Topic, f64>,
        factors: &mut Vec<Factor>,
    ) {
        for planet in &chart.planets {
            let Some(house) = planet.house else { continue };
            let Some(block) = self.library.planet_house(planet.planet, house) else {
                continue;
            };
            // The house-level block lends its domain phrase as context.
            let context = self
                .library
                .house(house)
                .map(|h| h.text.clone())
                .unwrap_or_else(|| FactorOrigin::Natal.to_string());
            factors.push(Factor {
                code: format!("house:{}:{}", planet.planet, house).to_lowercase(),
                label: format!("{} in house {}", planet.planet, house),
                score: base_score(&block.weights, emphasis),
                topic_scores: block.weights.clone(),
                meaning: Some(block),
                context,
            });
        }
    }

    fn aspect_factors(&self, aspects: &[Aspect], origin: FactorOrigin, factors: &mut Vec<Factor>) {
        for aspect in aspects {
            let Some(block) =
                self.library
                    .aspect(aspect.planet_a, aspect.planet_b, aspect.aspect_type)
            else {
                continue;
            };
            factors.push(Factor {
                code: format!(
                    "aspect:{}:{}-{}:{}",
                    origin, aspect.planet_a, aspect.planet_b, aspect.aspect_type
                )
                .to_lowercase(),
                label: format!(
                    "{} {} {}",
                    aspect.planet_a, aspect.aspect_type, aspect.planet_b
                ),
                score: aspect_score(aspect),
                topic_scores: block.weights.clone(),
                meaning: Some(block),
                context: origin.to_string(),
            });
        }
    }

    fn numerology_factors(
        &self,
        profile: &NumerologyProfile,
        emphasis: &HashMap<Topic, f64>,
        factors: &mut Vec<Factor>,
    ) {
        for (key, entry) in profile {
            let Some(block) = self.library.numerology(entry.number) else {
                continue;
            };
            factors.push(Factor {
                code: format!("numerology:{}", key),
                label: format!("{} {}", entry.label, entry.number),
                score: base_score(&block.weights, emphasis),
                topic_scores: block.weights.clone(),
                meaning: Some(block),
                context: "numerology".to_string(),
            });
        }
    }
}

/// Aspect factor score: exactness first, then a bonus for every endpoint
/// sitting in an angular house.
fn aspect_score(aspect: &Aspect) -> f64 {
    let orb_weight = (1.0 - aspect.orb / 8.0).max(ORB_WEIGHT_FLOOR);
    let angular_endpoints = [aspect.house_a, aspect.house_b]
        .iter()
        .filter(|house| matches!(house, Some(h) if ANGULAR_HOUSES.contains(h)))
        .count();
    let angular_bonus = 1.0 + ANGULAR_BONUS * angular_endpoints as f64;
    aspect.strength_score * orb_weight * angular_bonus
}
