//! Chart assembly: positions from the selected provider, houses, aspects,
//! one immutable `Chart`. Only the position step can fail, and that failure
//! is converted into a stub fallback recorded in the chart metadata; the
//! rest of the pipeline is pure arithmetic over resolved degrees.

use crate::aspects::{compute_aspects, compute_synastry};
use crate::provider::{Positions, ProviderCapability, ProviderKind, StubProvider};
use crate::{Aspect, Chart, ChartMetadata, ChartRequest};

#[cfg(feature = "swisseph")]
use crate::provider::PositionProvider;
#[cfg(feature = "swisseph")]
use crate::swisseph::SwissEph;

pub struct ChartEngine {
    capability: ProviderCapability,
    stub: StubProvider,
    #[cfg(feature = "swisseph")]
    external: Option<SwissEph>,
}

impl ChartEngine {
    /// Builds an engine from an already-probed capability record. The
    /// capability is immutable; provider selection never changes after
    /// construction except per-call failover.
    pub fn new(capability: ProviderCapability) -> Self {
        #[cfg(feature = "swisseph")]
        let external = match (&capability.external_available, &capability.ephe_path) {
            (true, Some(path)) => match SwissEph::new(path) {
                Ok(eph) => Some(eph),
                Err(err) => {
                    log::warn!("swisseph init failed, stub only: {}", err);
                    None
                }
            },
            _ => None,
        };
        ChartEngine {
            capability,
            stub: StubProvider,
            #[cfg(feature = "swisseph")]
            external,
        }
    }

    /// Probes the environment once and builds the engine from the result.
    pub fn from_env() -> Self {
        Self::new(ProviderCapability::probe())
    }

    pub fn capability(&self) -> &ProviderCapability {
        &self.capability
    }

    /// Computes a full chart. Infallible: a provider failure falls back to
    /// the deterministic stub for this one chart and is recorded in
    /// `metadata.fallback`, never surfaced as an error.
    pub fn compute_chart(&self, request: &ChartRequest) -> Chart {
        let (provider, (planets, houses), fallback) = self.positions(request);
        let aspects = compute_aspects(&planets);
        Chart {
            chart_type: request.chart_type,
            datetime: request.datetime,
            location: request.location.clone(),
            planets,
            houses,
            aspects,
            metadata: ChartMetadata {
                provider,
                house_system: request.house_system,
                fallback,
            },
        }
    }

    /// Cross-chart aspects: each endpoint keeps the house it holds in its
    /// own chart. Used for transit-to-natal and person-to-person work.
    pub fn build_synastry(&self, chart_a: &Chart, chart_b: &Chart) -> Vec<Aspect> {
        compute_synastry(&chart_a.planets, &chart_b.planets)
    }

    #[cfg(feature = "swisseph")]
    fn positions(&self, request: &ChartRequest) -> (ProviderKind, Positions, Option<String>) {
        if let Some(external) = &self.external {
            match external.compute_positions(request) {
                Ok(positions) => return (ProviderKind::External, positions, None),
                Err(err) => {
                    log::warn!("external provider failed, falling back to stub: {}", err);
                    return (
                        ProviderKind::Stub,
                        self.stub.generate(request),
                        Some(err.to_string()),
                    );
                }
            }
        }
        (ProviderKind::Stub, self.stub.generate(request), None)
    }

    #[cfg(not(feature = "swisseph"))]
    fn positions(&self, request: &ChartRequest) -> (ProviderKind, Positions, Option<String>) {
        (ProviderKind::Stub, self.stub.generate(request), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChartType, Location, ProviderKind};
    use chrono::{TimeZone, Utc};

    fn request() -> ChartRequest {
        let mut request = ChartRequest::natal(
            Utc.with_ymd_and_hms(1990, 3, 15, 9, 30, 0).unwrap(),
            Location::new(51.5074, -0.1278, "Europe/London"),
        );
        request.subject = Some("Ada".to_string());
        request
    }

    fn stub_engine() -> ChartEngine {
        ChartEngine::new(ProviderCapability::stub_only())
    }

    #[test]
    fn chart_has_ten_planets_twelve_houses_and_bounded_degrees() {
        let chart = stub_engine().compute_chart(&request());
        assert_eq!(chart.planets.len(), 10);
        assert_eq!(chart.houses.len(), 12);
        for p in &chart.planets {
            assert!(p.degree >= 0.0 && p.degree < 30.0);
            assert!(p.absolute_degree >= 0.0 && p.absolute_degree < 360.0);
        }
        for aspect in &chart.aspects {
            assert!(aspect.orb <= aspect.aspect_type.max_orb());
        }
    }

    #[test]
    fn stub_charts_are_deterministic() {
        let engine = stub_engine();
        let a = engine.compute_chart(&request());
        let b = engine.compute_chart(&request());
        assert_eq!(a, b);
    }

    #[test]
    fn stub_only_engine_tags_metadata() {
        let chart = stub_engine().compute_chart(&request());
        assert_eq!(chart.metadata.provider, ProviderKind::Stub);
        assert!(chart.metadata.fallback.is_none());
    }

    #[test]
    fn self_synastry_contains_ten_exact_conjunctions() {
        let engine = stub_engine();
        let natal = engine.compute_chart(&request());
        let cross = engine.build_synastry(&natal, &natal);
        let exact_self = cross
            .iter()
            .filter(|a| a.planet_a == a.planet_b && a.orb == 0.0)
            .count();
        assert_eq!(exact_self, 10);
        for aspect in &cross {
            assert!(aspect.orb <= aspect.aspect_type.max_orb());
        }
    }

    #[test]
    fn transit_charts_use_their_own_seed_space() {
        let engine = stub_engine();
        let natal = engine.compute_chart(&request());
        let mut transit_request = request();
        transit_request.chart_type = ChartType::Transit;
        transit_request.datetime = Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap();
        let transit = engine.compute_chart(&transit_request);
        assert_ne!(transit.planets, natal.planets);
        assert_eq!(transit.chart_type, ChartType::Transit);
    }

    #[test]
    fn chart_identity_follows_request_fields() {
        let engine = stub_engine();
        let a = engine.compute_chart(&request());
        let mut moved = request();
        moved.location = Location::new(40.7128, -74.006, "America/New_York");
        let b = engine.compute_chart(&moved);
        assert_ne!(a.planets, b.planets);
    }
}
