use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod aspects;
pub mod engine;
pub mod houses;
pub mod meanings;
pub mod numerology;
pub mod provider;
pub mod rules;
#[cfg(feature = "swisseph")]
pub mod swisseph;

pub use aspects::{closest_aspect, compute_aspects, compute_synastry, deg_diff, score_aspect};
pub use engine::ChartEngine;
pub use houses::house_for_longitude;
pub use meanings::{MeaningBlock, MeaningLibrary};
pub use provider::{PositionProvider, ProviderCapability, ProviderError, ProviderKind, StubProvider};
pub use rules::{Factor, RuleEngine, RuleResult};

// ---------------------------
// ## Enumerations
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Planet {
    Sun = 0,
    Moon = 1,
    Mercury = 2,
    Venus = 3,
    Mars = 4,
    Jupiter = 5,
    Saturn = 6,
    Uranus = 7,
    Neptune = 8,
    Pluto = 9,
}

impl Planet {
    pub fn iter() -> impl Iterator<Item = Planet> {
        [
            Planet::Sun,
            Planet::Moon,
            Planet::Mercury,
            Planet::Venus,
            Planet::Mars,
            Planet::Jupiter,
            Planet::Saturn,
            Planet::Uranus,
            Planet::Neptune,
            Planet::Pluto,
        ]
        .iter()
        .copied()
    }

    /// Luminaries never show apparent retrograde motion.
    pub fn can_be_retrograde(self) -> bool {
        !matches!(self, Planet::Sun | Planet::Moon)
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Planet::Sun => "Sun",
            Planet::Moon => "Moon",
            Planet::Mercury => "Mercury",
            Planet::Venus => "Venus",
            Planet::Mars => "Mars",
            Planet::Jupiter => "Jupiter",
            Planet::Saturn => "Saturn",
            Planet::Uranus => "Uranus",
            Planet::Neptune => "Neptune",
            Planet::Pluto => "Pluto",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries = 0,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub fn from_longitude(longitude: f64) -> Self {
        let normalized_longitude = longitude.rem_euclid(360.0);
        let sign_index = (normalized_longitude / 30.0).floor() as usize;
        Self::from_index(sign_index).unwrap_or(ZodiacSign::Aries)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ZodiacSign::Aries),
            1 => Some(ZodiacSign::Taurus),
            2 => Some(ZodiacSign::Gemini),
            3 => Some(ZodiacSign::Cancer),
            4 => Some(ZodiacSign::Leo),
            5 => Some(ZodiacSign::Virgo),
            6 => Some(ZodiacSign::Libra),
            7 => Some(ZodiacSign::Scorpio),
            8 => Some(ZodiacSign::Sagittarius),
            9 => Some(ZodiacSign::Capricorn),
            10 => Some(ZodiacSign::Aquarius),
            11 => Some(ZodiacSign::Pisces),
            _ => None,
        }
    }

    pub fn iter() -> impl Iterator<Item = ZodiacSign> {
        (0..12).flat_map(ZodiacSign::from_index)
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign_str = match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        };
        write!(f, "{}", sign_str)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectType {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl AspectType {
    /// Exact angle of the aspect, degrees.
    pub fn angle(self) -> f64 {
        match self {
            AspectType::Conjunction => 0.0,
            AspectType::Sextile => 60.0,
            AspectType::Square => 90.0,
            AspectType::Trine => 120.0,
            AspectType::Opposition => 180.0,
        }
    }

    /// Widest orb at which the aspect still counts.
    pub fn max_orb(self) -> f64 {
        match self {
            AspectType::Conjunction | AspectType::Opposition => 7.0,
            AspectType::Square | AspectType::Trine => 5.5,
            AspectType::Sextile => 3.5,
        }
    }

    /// Family weight: fused and flowing aspects score above the square.
    pub fn weight(self) -> f64 {
        match self {
            AspectType::Conjunction | AspectType::Opposition => 1.2,
            AspectType::Trine | AspectType::Sextile => 1.1,
            AspectType::Square => 1.0,
        }
    }

    pub fn iter() -> impl Iterator<Item = AspectType> {
        [
            AspectType::Conjunction,
            AspectType::Sextile,
            AspectType::Square,
            AspectType::Trine,
            AspectType::Opposition,
        ]
        .iter()
        .copied()
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AspectType::Conjunction => "conjunction",
            AspectType::Sextile => "sextile",
            AspectType::Square => "square",
            AspectType::Trine => "trine",
            AspectType::Opposition => "opposition",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartType {
    Natal,
    Transit,
    Progressed,
    Return,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ChartType::Natal => "natal",
            ChartType::Transit => "transit",
            ChartType::Progressed => "progressed",
            ChartType::Return => "return",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HouseSystem {
    Placidus,
    Whole,
    Equal,
    Koch,
    Campanus,
    Topocentric,
}

impl HouseSystem {
    /// Case-insensitive parse; anything unrecognized falls back to Placidus.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "whole" => HouseSystem::Whole,
            "equal" => HouseSystem::Equal,
            "koch" => HouseSystem::Koch,
            "campanus" => HouseSystem::Campanus,
            "topocentric" => HouseSystem::Topocentric,
            _ => HouseSystem::Placidus,
        }
    }

    /// Swiss Ephemeris house system code.
    pub fn code(self) -> char {
        match self {
            HouseSystem::Placidus => 'P',
            HouseSystem::Whole => 'W',
            HouseSystem::Equal => 'E',
            HouseSystem::Koch => 'K',
            HouseSystem::Campanus => 'C',
            HouseSystem::Topocentric => 'T',
        }
    }
}

impl Default for HouseSystem {
    fn default() -> Self {
        HouseSystem::Placidus
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
    General,
    Love,
    Career,
    Emotional,
    Health,
    Challenge,
    Support,
}

impl Topic {
    pub fn iter() -> impl Iterator<Item = Topic> {
        [
            Topic::General,
            Topic::Love,
            Topic::Career,
            Topic::Emotional,
            Topic::Health,
            Topic::Challenge,
            Topic::Support,
        ]
        .iter()
        .copied()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Topic::General => "general",
            Topic::Love => "love",
            Topic::Career => "career",
            Topic::Emotional => "emotional",
            Topic::Health => "health",
            Topic::Challenge => "challenge",
            Topic::Support => "support",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------
// ## Structures
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timezone: impl Into<String>) -> Self {
        Location {
            latitude,
            longitude,
            timezone: timezone.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub planet: Planet,
    pub sign: ZodiacSign,
    /// Degree within the sign, [0, 30).
    pub degree: f64,
    /// Ecliptic longitude, [0, 360).
    pub absolute_degree: f64,
    pub house: Option<u8>,
    pub retrograde: bool,
    pub speed: Option<f64>,
}

impl PlanetPosition {
    pub fn from_longitude(planet: Planet, longitude: f64) -> Self {
        let absolute_degree = longitude.rem_euclid(360.0);
        PlanetPosition {
            planet,
            sign: ZodiacSign::from_longitude(absolute_degree),
            degree: absolute_degree % 30.0,
            absolute_degree,
            house: None,
            retrograde: false,
            speed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseCusp {
    /// 1..=12
    pub house: u8,
    pub sign: ZodiacSign,
    /// Degree within the cusp sign, [0, 30).
    pub degree: f64,
    /// Ecliptic longitude of the cusp, [0, 360).
    pub absolute_degree: f64,
}

impl HouseCusp {
    pub fn from_longitude(house: u8, longitude: f64) -> Self {
        let absolute_degree = longitude.rem_euclid(360.0);
        HouseCusp {
            house,
            sign: ZodiacSign::from_longitude(absolute_degree),
            degree: absolute_degree % 30.0,
            absolute_degree,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub planet_a: Planet,
    pub planet_b: Planet,
    pub aspect_type: AspectType,
    /// Deviation from the exact angle, degrees.
    pub orb: f64,
    pub strength_score: f64,
    pub house_a: Option<u8>,
    pub house_b: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    pub provider: ProviderKind,
    pub house_system: HouseSystem,
    /// Set when the external provider failed and the stub stood in.
    pub fallback: Option<String>,
}

/// A chart is assembled once and never mutated; its identity is
/// (chart_type, datetime, location).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub chart_type: ChartType,
    pub datetime: DateTime<Utc>,
    pub location: Location,
    pub planets: Vec<PlanetPosition>,
    pub houses: Vec<HouseCusp>,
    pub aspects: Vec<Aspect>,
    pub metadata: ChartMetadata,
}

impl Chart {
    pub fn planet(&self, planet: Planet) -> Option<&PlanetPosition> {
        self.planets.iter().find(|p| p.planet == planet)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub chart_type: ChartType,
    /// Absolute instant; timezone conversion is the caller's concern.
    pub datetime: DateTime<Utc>,
    pub location: Location,
    pub house_system: HouseSystem,
    /// Optional seed tag so the stub reproduces a named subject's chart.
    pub subject: Option<String>,
}

impl ChartRequest {
    pub fn natal(datetime: DateTime<Utc>, location: Location) -> Self {
        ChartRequest {
            chart_type: ChartType::Natal,
            datetime,
            location,
            house_system: HouseSystem::default(),
            subject: None,
        }
    }

    pub fn transit(datetime: DateTime<Utc>, location: Location) -> Self {
        ChartRequest {
            chart_type: ChartType::Transit,
            datetime,
            location,
            house_system: HouseSystem::default(),
            subject: None,
        }
    }
}

/// Convenience alias used by rule evaluation.
pub type TopicScores = HashMap<Topic, f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_from_longitude_covers_the_wheel() {
        assert_eq!(ZodiacSign::from_longitude(0.0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(29.999), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(30.0), ZodiacSign::Taurus);
        assert_eq!(ZodiacSign::from_longitude(185.2), ZodiacSign::Libra);
        assert_eq!(ZodiacSign::from_longitude(359.9), ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_longitude(360.0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(-10.0), ZodiacSign::Pisces);
    }

    #[test]
    fn planet_position_normalizes_longitude() {
        let pos = PlanetPosition::from_longitude(Planet::Venus, 395.5);
        assert_eq!(pos.sign, ZodiacSign::Taurus);
        assert!((pos.absolute_degree - 35.5).abs() < 1e-9);
        assert!((pos.degree - 5.5).abs() < 1e-9);
    }

    #[test]
    fn house_system_parse_is_case_insensitive_with_default() {
        assert_eq!(HouseSystem::parse("WHOLE"), HouseSystem::Whole);
        assert_eq!(HouseSystem::parse("Koch"), HouseSystem::Koch);
        assert_eq!(HouseSystem::parse("placidus"), HouseSystem::Placidus);
        assert_eq!(HouseSystem::parse("no-such-system"), HouseSystem::Placidus);
    }

    #[test]
    fn exactly_ten_planets() {
        assert_eq!(Planet::iter().count(), 10);
        assert!(!Planet::Sun.can_be_retrograde());
        assert!(Planet::Mercury.can_be_retrograde());
    }
}
