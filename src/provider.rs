//! Position provider strategies: the external ephemeris wrapper and the
//! deterministic stub, plus the startup capability probe that picks
//! between them.

use crate::houses::{equal_cusps, house_for_longitude};
use crate::{ChartRequest, HouseCusp, Planet, PlanetPosition};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable pointing at the Swiss Ephemeris data directory.
pub const EPHE_PATH_ENV: &str = "ASTRA_EPHE_PATH";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("ephemeris calculation failed (code {code}): {message}")]
    Computation { code: i32, message: String },
    #[error("ephemeris data unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    External,
    Stub,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProviderKind::External => write!(f, "external"),
            ProviderKind::Stub => write!(f, "stub"),
        }
    }
}

/// One chart's worth of raw positions: ten planets and twelve cusps.
pub type Positions = (Vec<PlanetPosition>, Vec<HouseCusp>);

pub trait PositionProvider {
    fn kind(&self) -> ProviderKind;
    fn compute_positions(&self, request: &ChartRequest) -> Result<Positions, ProviderError>;
}

// ---------------------------
// ## Capability probe
// ---------------------------

/// Immutable record of what the environment offers, built once at startup
/// and injected into the engine. Replaces any notion of a mutable global
/// "library available" flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCapability {
    pub external_available: bool,
    pub ephe_path: Option<PathBuf>,
    /// Why the external provider is disabled, when it is.
    pub disabled_reason: Option<String>,
}

impl ProviderCapability {
    #[cfg(feature = "swisseph")]
    pub fn probe() -> Self {
        match std::env::var(EPHE_PATH_ENV) {
            Ok(path) => {
                let path = PathBuf::from(path);
                if path.is_dir() {
                    log::info!("swisseph ephemeris directory: {}", path.display());
                    ProviderCapability {
                        external_available: true,
                        ephe_path: Some(path),
                        disabled_reason: None,
                    }
                } else {
                    ProviderCapability::disabled(format!(
                        "{} is not a directory: {}",
                        EPHE_PATH_ENV,
                        path.display()
                    ))
                }
            }
            Err(_) => ProviderCapability::disabled(format!("{} not set", EPHE_PATH_ENV)),
        }
    }

    #[cfg(not(feature = "swisseph"))]
    pub fn probe() -> Self {
        ProviderCapability::disabled("compiled without the swisseph feature".to_string())
    }

    pub fn disabled(reason: String) -> Self {
        log::info!("external provider disabled: {}", reason);
        ProviderCapability {
            external_available: false,
            ephe_path: None,
            disabled_reason: Some(reason),
        }
    }

    /// A capability that always routes to the stub, for tests and callers
    /// that want reproducible charts regardless of environment.
    pub fn stub_only() -> Self {
        ProviderCapability {
            external_available: false,
            ephe_path: None,
            disabled_reason: None,
        }
    }
}

// ---------------------------
// ## Deterministic stub
// ---------------------------

/// Derives chart positions from a seeded hash instead of astronomy. The
/// same request always reproduces the same chart, across calls and across
/// process restarts, so chart availability never depends on the external
/// library. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubProvider;

impl StubProvider {
    fn seed(request: &ChartRequest, fragment: &str) -> u64 {
        let key = format!(
            "{}|{}|{}|{:.4}|{:.4}|{}",
            request.subject.as_deref().unwrap_or(""),
            request.chart_type,
            request.datetime.timestamp(),
            request.location.latitude,
            request.location.longitude,
            fragment,
        );
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Infallible core of the stub; the trait impl wraps it in `Ok`.
    pub fn generate(&self, request: &ChartRequest) -> Positions {
        let ascendant = (Self::seed(request, "ascendant") % 36000) as f64 / 100.0;
        let cusps = equal_cusps(ascendant);
        let planets = Planet::iter()
            .map(|planet| {
                let mut position = Self::planet_position(request, planet);
                position.house = Some(house_for_longitude(position.absolute_degree, &cusps));
                position
            })
            .collect();
        (planets, cusps)
    }

    fn planet_position(request: &ChartRequest, planet: Planet) -> PlanetPosition {
        let h = Self::seed(request, &planet.to_string());
        let longitude = (h % 36000) as f64 / 100.0;
        let retrograde = planet.can_be_retrograde() && (h >> 16) % 5 == 0;
        let magnitude = ((h >> 24) % 150) as f64 / 100.0 + 0.05;
        let speed = if retrograde { -magnitude } else { magnitude };
        let mut position = PlanetPosition::from_longitude(planet, longitude);
        position.retrograde = retrograde;
        position.speed = Some(speed);
        position
    }
}

impl PositionProvider for StubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Stub
    }

    fn compute_positions(&self, request: &ChartRequest) -> Result<Positions, ProviderError> {
        Ok(self.generate(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChartType, Location};
    use chrono::TimeZone;
    use chrono::Utc;

    fn ada_request() -> ChartRequest {
        let mut request = ChartRequest::natal(
            Utc.with_ymd_and_hms(1990, 3, 15, 9, 30, 0).unwrap(),
            Location::new(51.5074, -0.1278, "Europe/London"),
        );
        request.subject = Some("Ada".to_string());
        request
    }

    #[test]
    fn stub_returns_ten_planets_and_twelve_houses() {
        let (planets, cusps) = StubProvider.compute_positions(&ada_request()).unwrap();
        assert_eq!(planets.len(), 10);
        assert_eq!(cusps.len(), 12);
        for p in &planets {
            assert!(p.degree >= 0.0 && p.degree < 30.0);
            assert!(p.absolute_degree >= 0.0 && p.absolute_degree < 360.0);
            assert!(p.house.is_some());
        }
    }

    #[test]
    fn identical_seed_reproduces_the_same_chart() {
        let a = StubProvider.compute_positions(&ada_request()).unwrap();
        let b = StubProvider.compute_positions(&ada_request()).unwrap();
        assert_eq!(a, b);
        let sun_a = &a.0[0];
        let sun_b = &b.0[0];
        assert_eq!(sun_a.sign, sun_b.sign);
        assert_eq!(sun_a.degree, sun_b.degree);
    }

    #[test]
    fn different_subject_or_chart_type_changes_the_chart() {
        let base = StubProvider.compute_positions(&ada_request()).unwrap();

        let mut renamed = ada_request();
        renamed.subject = Some("Grace".to_string());
        let other = StubProvider.compute_positions(&renamed).unwrap();
        assert_ne!(base.0, other.0);

        let mut transit = ada_request();
        transit.chart_type = ChartType::Transit;
        let other = StubProvider.compute_positions(&transit).unwrap();
        assert_ne!(base.0, other.0);
    }

    #[test]
    fn luminaries_are_never_retrograde() {
        let (planets, _) = StubProvider.compute_positions(&ada_request()).unwrap();
        assert!(!planets[Planet::Sun as usize].retrograde);
        assert!(!planets[Planet::Moon as usize].retrograde);
    }

    #[test]
    fn probe_without_feature_disables_external() {
        // Default build carries no swisseph linkage
        if cfg!(not(feature = "swisseph")) {
            let capability = ProviderCapability::probe();
            assert!(!capability.external_available);
            assert!(capability.disabled_reason.is_some());
        }
    }
}
