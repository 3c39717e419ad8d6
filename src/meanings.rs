//! Static, process-wide meaning library: chart facts to small pre-authored
//! meaning blocks (text + tags + topic-weight vector). Built declaratively
//! at startup from per-planet, per-sign, and per-house profiles so that
//! every planet x sign and planet x house combination resolves, then frozen
//! behind a `Lazy` for read-only concurrent access.

use crate::{AspectType, Planet, Topic, TopicScores, ZodiacSign};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeaningBlock {
    pub text: String,
    pub tags: Vec<String>,
    pub weights: TopicScores,
}

impl MeaningBlock {
    fn new(text: String, tags: Vec<String>, weights: TopicScores) -> Self {
        MeaningBlock { text, tags, weights }
    }
}

fn weights(entries: &[(Topic, f64)]) -> TopicScores {
    entries.iter().copied().collect()
}

/// Half-and-half blend of two weight vectors over the union of their keys.
fn blend(a: &TopicScores, b: &TopicScores) -> TopicScores {
    let mut out: TopicScores = HashMap::new();
    for (topic, w) in a.iter().chain(b.iter()) {
        *out.entry(*topic).or_insert(0.0) += w * 0.5;
    }
    out
}

// ---------------------------
// ## Authored profiles
// ---------------------------

fn planet_profile(planet: Planet) -> (&'static str, TopicScores) {
    use Topic::*;
    match planet {
        Planet::Sun => ("core identity and vitality", weights(&[(General, 1.0), (Career, 0.6), (Health, 0.4)])),
        Planet::Moon => ("instinct and emotional need", weights(&[(Emotional, 1.0), (General, 0.5), (Love, 0.4)])),
        Planet::Mercury => ("thought and exchange", weights(&[(General, 0.8), (Career, 0.6), (Support, 0.3)])),
        Planet::Venus => ("attraction and what is valued", weights(&[(Love, 1.0), (Support, 0.5), (General, 0.4)])),
        Planet::Mars => ("drive and assertion", weights(&[(Career, 0.7), (Challenge, 0.6), (Health, 0.4)])),
        Planet::Jupiter => ("growth and confidence", weights(&[(Support, 0.9), (General, 0.6), (Career, 0.5)])),
        Planet::Saturn => ("structure and limit", weights(&[(Challenge, 0.9), (Career, 0.8), (General, 0.3)])),
        Planet::Uranus => ("disruption and reinvention", weights(&[(Challenge, 0.7), (General, 0.6), (Career, 0.3)])),
        Planet::Neptune => ("imagination and dissolution", weights(&[(Emotional, 0.7), (Love, 0.5), (Health, 0.3)])),
        Planet::Pluto => ("depth and transformation", weights(&[(Challenge, 0.8), (Emotional, 0.6), (Career, 0.4)])),
    }
}

fn sign_profile(sign: ZodiacSign) -> (&'static str, TopicScores) {
    use Topic::*;
    match sign {
        ZodiacSign::Aries => ("headlong and direct", weights(&[(Challenge, 0.5), (Career, 0.5), (General, 0.4)])),
        ZodiacSign::Taurus => ("steady and sensate", weights(&[(Support, 0.6), (Love, 0.4), (Health, 0.4)])),
        ZodiacSign::Gemini => ("curious and quick", weights(&[(General, 0.6), (Career, 0.4), (Support, 0.3)])),
        ZodiacSign::Cancer => ("protective and tidal", weights(&[(Emotional, 0.8), (Love, 0.4), (Health, 0.3)])),
        ZodiacSign::Leo => ("radiant and wholehearted", weights(&[(General, 0.6), (Love, 0.5), (Career, 0.4)])),
        ZodiacSign::Virgo => ("precise and of service", weights(&[(Health, 0.7), (Career, 0.5), (Support, 0.4)])),
        ZodiacSign::Libra => ("relational and balancing", weights(&[(Love, 0.8), (Support, 0.5), (General, 0.3)])),
        ZodiacSign::Scorpio => ("intense and probing", weights(&[(Emotional, 0.7), (Challenge, 0.6), (Love, 0.4)])),
        ZodiacSign::Sagittarius => ("expansive and candid", weights(&[(Support, 0.6), (General, 0.5), (Career, 0.3)])),
        ZodiacSign::Capricorn => ("ambitious and enduring", weights(&[(Career, 0.8), (Challenge, 0.5), (General, 0.3)])),
        ZodiacSign::Aquarius => ("detached and inventive", weights(&[(General, 0.6), (Support, 0.4), (Career, 0.4)])),
        ZodiacSign::Pisces => ("porous and compassionate", weights(&[(Emotional, 0.7), (Love, 0.5), (Health, 0.3)])),
    }
}

fn house_profile(house: u8) -> (&'static str, TopicScores) {
    use Topic::*;
    match house {
        1 => ("self and outward bearing", weights(&[(General, 0.8), (Health, 0.3)])),
        2 => ("resources and self-worth", weights(&[(Career, 0.6), (Support, 0.4)])),
        3 => ("speech and the near world", weights(&[(General, 0.5), (Support, 0.4)])),
        4 => ("home and root", weights(&[(Emotional, 0.7), (Support, 0.5)])),
        5 => ("play, romance, and making", weights(&[(Love, 0.7), (Emotional, 0.4)])),
        6 => ("daily work and the body", weights(&[(Health, 0.8), (Career, 0.5)])),
        7 => ("partnership and the other", weights(&[(Love, 0.9), (Support, 0.4)])),
        8 => ("shared depths and crisis", weights(&[(Challenge, 0.6), (Emotional, 0.6)])),
        9 => ("belief and distance", weights(&[(General, 0.6), (Support, 0.4)])),
        10 => ("vocation and standing", weights(&[(Career, 0.9), (General, 0.4)])),
        11 => ("allies and the future", weights(&[(Support, 0.7), (General, 0.4)])),
        _ => ("retreat and the undertow", weights(&[(Emotional, 0.6), (Health, 0.4), (Challenge, 0.4)])),
    }
}

fn aspect_profile(aspect_type: AspectType) -> (&'static str, TopicScores) {
    use Topic::*;
    match aspect_type {
        AspectType::Conjunction => ("fused so the two act as one", weights(&[(General, 0.7), (Challenge, 0.3), (Support, 0.3)])),
        AspectType::Sextile => ("an open door that rewards effort", weights(&[(Support, 0.7), (General, 0.3)])),
        AspectType::Square => ("friction that demands action", weights(&[(Challenge, 0.9), (General, 0.3)])),
        AspectType::Trine => ("a current of natural ease", weights(&[(Support, 0.8), (General, 0.4)])),
        AspectType::Opposition => ("a seesaw seeking balance", weights(&[(Challenge, 0.6), (Love, 0.3), (General, 0.3)])),
    }
}

fn numerology_profile(number: u32) -> Option<(&'static str, TopicScores)> {
    use Topic::*;
    let profile = match number {
        1 => ("initiative and standing alone", weights(&[(Career, 0.7), (General, 0.6), (Challenge, 0.3)])),
        2 => ("partnership and sensitivity", weights(&[(Love, 0.7), (Emotional, 0.6), (Support, 0.4)])),
        3 => ("expression and delight", weights(&[(General, 0.7), (Love, 0.4), (Support, 0.4)])),
        4 => ("foundation and patient labor", weights(&[(Career, 0.8), (Support, 0.4), (Health, 0.3)])),
        5 => ("change and appetite", weights(&[(General, 0.6), (Challenge, 0.5), (Love, 0.4)])),
        6 => ("care and responsibility", weights(&[(Love, 0.8), (Support, 0.6), (Emotional, 0.4)])),
        7 => ("inquiry and retreat", weights(&[(General, 0.6), (Emotional, 0.5), (Health, 0.3)])),
        8 => ("mastery of the material", weights(&[(Career, 0.9), (Challenge, 0.4), (General, 0.3)])),
        9 => ("completion and wide sympathy", weights(&[(Support, 0.7), (Emotional, 0.5), (General, 0.4)])),
        11 => ("illumination carried uneasily", weights(&[(Emotional, 0.8), (General, 0.6), (Challenge, 0.5)])),
        22 => ("the master builder", weights(&[(Career, 0.9), (Support, 0.6), (Challenge, 0.5)])),
        33 => ("teaching through devotion", weights(&[(Love, 0.8), (Support, 0.7), (Emotional, 0.5)])),
        _ => return None,
    };
    Some(profile)
}

/// Hand-authored overrides for classic planet pairs; everything else falls
/// back to the type-level block.
fn pair_overrides() -> Vec<((Planet, Planet, AspectType), MeaningBlock)> {
    use AspectType::*;
    use Planet::*;
    use Topic::*;
    let entry = |a: Planet, b: Planet, t: AspectType, text: &str, w: TopicScores| {
        (
            ordered_pair(a, b, t),
            MeaningBlock::new(
                text.to_string(),
                vec![a.to_string().to_lowercase(), b.to_string().to_lowercase(), t.to_string()],
                w,
            ),
        )
    };
    vec![
        entry(Sun, Moon, Conjunction, "Will and need speak with one voice; inner weather and outer aim agree.", weights(&[(General, 0.8), (Emotional, 0.7), (Support, 0.4)])),
        entry(Venus, Mars, Conjunction, "Desire and pursuit are welded together; attraction arrives with momentum.", weights(&[(Love, 1.0), (Emotional, 0.5), (Challenge, 0.3)])),
        entry(Venus, Mars, Trine, "Affection and initiative cooperate without effort.", weights(&[(Love, 0.9), (Support, 0.6)])),
        entry(Sun, Saturn, Square, "Ambition meets the wall; discipline is demanded before recognition.", weights(&[(Challenge, 0.9), (Career, 0.7), (General, 0.3)])),
        entry(Moon, Venus, Sextile, "Comfort and affection open doors for each other.", weights(&[(Love, 0.8), (Emotional, 0.6), (Support, 0.5)])),
        entry(Mars, Saturn, Opposition, "The brake and the accelerator pressed at once; timing becomes the lesson.", weights(&[(Challenge, 0.9), (Career, 0.5), (Health, 0.3)])),
    ]
}

/// Pair keys are stored with the lower-numbered planet first so lookup is
/// order-independent.
fn ordered_pair(a: Planet, b: Planet, t: AspectType) -> (Planet, Planet, AspectType) {
    if (a as u8) <= (b as u8) {
        (a, b, t)
    } else {
        (b, a, t)
    }
}

// ---------------------------
// ## Library
// ---------------------------

#[derive(Debug)]
pub struct MeaningLibrary {
    planet_sign: HashMap<(Planet, ZodiacSign), MeaningBlock>,
    planet_house: HashMap<(Planet, u8), MeaningBlock>,
    aspect_type: HashMap<AspectType, MeaningBlock>,
    aspect_pair: HashMap<(Planet, Planet, AspectType), MeaningBlock>,
    house: HashMap<u8, MeaningBlock>,
    numerology: HashMap<u32, MeaningBlock>,
}

static LIBRARY: Lazy<MeaningLibrary> = Lazy::new(MeaningLibrary::build);

impl MeaningLibrary {
    /// The process-wide read-only instance.
    pub fn global() -> &'static MeaningLibrary {
        &LIBRARY
    }

    fn build() -> Self {
        let mut planet_sign = HashMap::new();
        let mut planet_house = HashMap::new();
        for planet in Planet::iter() {
            let (theme, planet_weights) = planet_profile(planet);
            for sign in ZodiacSign::iter() {
                let (style, sign_weights) = sign_profile(sign);
                planet_sign.insert(
                    (planet, sign),
                    MeaningBlock::new(
                        format!("{} in {}: {}, {}.", planet, sign, theme, style),
                        vec![planet.to_string().to_lowercase(), sign.to_string().to_lowercase()],
                        blend(&planet_weights, &sign_weights),
                    ),
                );
            }
            for house in 1..=12u8 {
                let (domain, house_weights) = house_profile(house);
                planet_house.insert(
                    (planet, house),
                    MeaningBlock::new(
                        format!("{} in house {}: {} brought into {}.", planet, house, theme, domain),
                        vec![planet.to_string().to_lowercase(), format!("house-{}", house)],
                        blend(&planet_weights, &house_weights),
                    ),
                );
            }
        }

        let mut aspect_type = HashMap::new();
        for t in AspectType::iter() {
            let (phrase, w) = aspect_profile(t);
            aspect_type.insert(
                t,
                MeaningBlock::new(
                    format!("A {}: {}.", t, phrase),
                    vec![t.to_string()],
                    w,
                ),
            );
        }

        let mut house = HashMap::new();
        for number in 1..=12u8 {
            let (domain, w) = house_profile(number);
            house.insert(
                number,
                MeaningBlock::new(
                    format!("House {}: {}.", number, domain),
                    vec![format!("house-{}", number)],
                    w,
                ),
            );
        }

        let mut numerology = HashMap::new();
        for number in (1u32..=9).chain([11, 22, 33]) {
            if let Some((phrase, w)) = numerology_profile(number) {
                numerology.insert(
                    number,
                    MeaningBlock::new(
                        format!("Number {}: {}.", number, phrase),
                        vec![format!("number-{}", number)],
                        w,
                    ),
                );
            }
        }

        MeaningLibrary {
            planet_sign,
            planet_house,
            aspect_type,
            aspect_pair: pair_overrides().into_iter().collect(),
            house,
            numerology,
        }
    }

    pub fn planet_sign(&self, planet: Planet, sign: ZodiacSign) -> Option<&MeaningBlock> {
        self.planet_sign.get(&(planet, sign))
    }

    pub fn planet_house(&self, planet: Planet, house: u8) -> Option<&MeaningBlock> {
        self.planet_house.get(&(planet, house))
    }

    /// Pair-specific block when one is authored, otherwise the type-level
    /// block. Order of the two planets does not matter.
    pub fn aspect(&self, a: Planet, b: Planet, t: AspectType) -> Option<&MeaningBlock> {
        self.aspect_pair
            .get(&ordered_pair(a, b, t))
            .or_else(|| self.aspect_type.get(&t))
    }

    pub fn house(&self, house: u8) -> Option<&MeaningBlock> {
        self.house.get(&house)
    }

    pub fn numerology(&self, number: u32) -> Option<&MeaningBlock> {
        self.numerology.get(&number)
    }

    /// Every combination the rule engine can ask for must resolve. Returns
    /// the list of gaps, empty when coverage is complete.
    pub fn coverage_gaps(&self) -> Vec<String> {
        let mut gaps = Vec::new();
        for planet in Planet::iter() {
            for sign in ZodiacSign::iter() {
                if self.planet_sign(planet, sign).is_none() {
                    gaps.push(format!("{} in {}", planet, sign));
                }
            }
            for house in 1..=12u8 {
                if self.planet_house(planet, house).is_none() {
                    gaps.push(format!("{} in house {}", planet, house));
                }
            }
        }
        for t in AspectType::iter() {
            if self.aspect_type.get(&t).is_none() {
                gaps.push(format!("aspect {}", t));
            }
        }
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_is_complete() {
        let gaps = MeaningLibrary::global().coverage_gaps();
        assert!(gaps.is_empty(), "missing meaning blocks: {:?}", gaps);
    }

    #[test]
    fn venus_in_libra_leans_toward_love() {
        let block = MeaningLibrary::global()
            .planet_sign(Planet::Venus, ZodiacSign::Libra)
            .unwrap();
        let love = block.weights.get(&Topic::Love).copied().unwrap_or(0.0);
        let career = block.weights.get(&Topic::Career).copied().unwrap_or(0.0);
        assert!(love > career);
        assert!(love > 0.5);
    }

    #[test]
    fn aspect_lookup_is_order_independent() {
        let lib = MeaningLibrary::global();
        let a = lib.aspect(Planet::Mars, Planet::Venus, AspectType::Conjunction);
        let b = lib.aspect(Planet::Venus, Planet::Mars, AspectType::Conjunction);
        assert_eq!(a, b);
        assert!(a.unwrap().text.contains("Desire"));
    }

    #[test]
    fn unauthored_pair_falls_back_to_type_block() {
        let lib = MeaningLibrary::global();
        let block = lib.aspect(Planet::Mercury, Planet::Pluto, AspectType::Square).unwrap();
        assert!(block.text.contains("square"));
    }

    #[test]
    fn master_numbers_are_present() {
        let lib = MeaningLibrary::global();
        for number in [11, 22, 33] {
            assert!(lib.numerology(number).is_some());
        }
        assert!(lib.numerology(10).is_none());
    }
}
