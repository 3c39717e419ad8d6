//! Angular separation, aspect classification, and aspect strength.

use crate::{Aspect, AspectType, PlanetPosition};

/// Smallest angular separation between two longitudes, always in [0, 180].
pub fn deg_diff(a: f64, b: f64) -> f64 {
    ((a - b + 180.0).rem_euclid(360.0) - 180.0).abs()
}

/// The canonical angle nearest to `diff`, with the residual orb.
///
/// Tolerance is deliberately not applied here; callers filter against
/// each type's max orb.
pub fn closest_aspect(diff: f64) -> (AspectType, f64) {
    let mut best = AspectType::Conjunction;
    let mut best_orb = f64::MAX;
    for aspect_type in AspectType::iter() {
        let orb = (diff - aspect_type.angle()).abs();
        if orb < best_orb {
            best = aspect_type;
            best_orb = orb;
        }
    }
    (best, best_orb)
}

/// Strength in [0, weight]: exactness dominates, the family weight is a
/// secondary bonus for fused and flowing aspects.
pub fn score_aspect(aspect_type: AspectType, orb: f64) -> f64 {
    let closeness = 1.0 - (orb / aspect_type.max_orb()).min(1.0);
    closeness * aspect_type.weight()
}

fn classify_pair(a: &PlanetPosition, b: &PlanetPosition) -> Option<Aspect> {
    let diff = deg_diff(a.absolute_degree, b.absolute_degree);
    let (aspect_type, orb) = closest_aspect(diff);
    if orb > aspect_type.max_orb() {
        return None;
    }
    Some(Aspect {
        planet_a: a.planet,
        planet_b: b.planet,
        aspect_type,
        orb,
        strength_score: score_aspect(aspect_type, orb),
        house_a: a.house,
        house_b: b.house,
    })
}

/// All in-orb aspects over unordered planet pairs (45 pairs for 10 planets).
pub fn compute_aspects(planets: &[PlanetPosition]) -> Vec<Aspect> {
    let mut aspects = Vec::new();
    for (i, a) in planets.iter().enumerate() {
        for b in planets.iter().skip(i + 1) {
            if let Some(aspect) = classify_pair(a, b) {
                aspects.push(aspect);
            }
        }
    }
    aspects
}

/// Cross-chart variant: the full a×b product (100 pairs for 10×10),
/// used for transit-to-natal and person-to-person comparison. Each
/// endpoint keeps the house it holds in its own chart.
pub fn compute_synastry(a_planets: &[PlanetPosition], b_planets: &[PlanetPosition]) -> Vec<Aspect> {
    let mut aspects = Vec::new();
    for a in a_planets {
        for b in b_planets {
            if let Some(aspect) = classify_pair(a, b) {
                aspects.push(aspect);
            }
        }
    }
    aspects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Planet, PlanetPosition};
    use approx::assert_relative_eq;

    fn at(planet: Planet, longitude: f64) -> PlanetPosition {
        PlanetPosition::from_longitude(planet, longitude)
    }

    #[test]
    fn deg_diff_takes_the_short_way_around() {
        assert_relative_eq!(deg_diff(350.0, 10.0), 20.0);
        assert_relative_eq!(deg_diff(10.0, 350.0), 20.0);
        assert_relative_eq!(deg_diff(0.0, 180.0), 180.0);
        assert_relative_eq!(deg_diff(90.0, 90.0), 0.0);
        assert_relative_eq!(deg_diff(359.0, 1.0), 2.0);
    }

    #[test]
    fn closest_aspect_picks_the_nearest_angle() {
        let (t, orb) = closest_aspect(3.0);
        assert_eq!(t, AspectType::Conjunction);
        assert_relative_eq!(orb, 3.0);

        let (t, orb) = closest_aspect(175.0);
        assert_eq!(t, AspectType::Opposition);
        assert_relative_eq!(orb, 5.0);

        let (t, orb) = closest_aspect(118.0);
        assert_eq!(t, AspectType::Trine);
        assert_relative_eq!(orb, 2.0);
    }

    #[test]
    fn exact_square_scores_its_full_weight() {
        let aspects = compute_aspects(&[at(Planet::Sun, 0.0), at(Planet::Moon, 90.0)]);
        assert_eq!(aspects.len(), 1);
        let aspect = &aspects[0];
        assert_eq!(aspect.aspect_type, AspectType::Square);
        assert_relative_eq!(aspect.orb, 0.0);
        assert_relative_eq!(aspect.strength_score, 1.0);
    }

    #[test]
    fn out_of_orb_pairs_are_dropped() {
        // 45 degrees sits between sextile and conjunction, far outside both orbs
        let aspects = compute_aspects(&[at(Planet::Sun, 0.0), at(Planet::Moon, 45.0)]);
        assert!(aspects.is_empty());
    }

    #[test]
    fn every_emitted_orb_respects_the_type_table() {
        let planets: Vec<PlanetPosition> = Planet::iter()
            .enumerate()
            .map(|(i, p)| at(p, i as f64 * 37.3))
            .collect();
        for aspect in compute_aspects(&planets) {
            assert!(aspect.orb <= aspect.aspect_type.max_orb());
            assert!(aspect.strength_score >= 0.0);
        }
    }

    #[test]
    fn no_duplicate_pairs() {
        let planets: Vec<PlanetPosition> = Planet::iter()
            .enumerate()
            .map(|(i, p)| at(p, i as f64 * 31.0))
            .collect();
        let aspects = compute_aspects(&planets);
        for (i, x) in aspects.iter().enumerate() {
            for y in aspects.iter().skip(i + 1) {
                let mirrored = x.planet_a == y.planet_b && x.planet_b == y.planet_a;
                assert!(!mirrored, "mirrored pair emitted: {:?} / {:?}", x, y);
            }
        }
    }

    #[test]
    fn synastry_walks_the_full_cross_product() {
        // Two charts with every planet conjunct its counterpart
        let a: Vec<PlanetPosition> = Planet::iter()
            .enumerate()
            .map(|(i, p)| at(p, i as f64 * 36.0))
            .collect();
        let b = a.clone();
        let aspects = compute_synastry(&a, &b);
        // At least one conjunction per matched planet
        let conjunctions = aspects
            .iter()
            .filter(|x| x.aspect_type == AspectType::Conjunction && x.planet_a == x.planet_b)
            .count();
        assert_eq!(conjunctions, 10);
    }

    #[test]
    fn wraparound_conjunction_is_detected() {
        let aspects = compute_aspects(&[at(Planet::Venus, 358.0), at(Planet::Mars, 2.0)]);
        assert_eq!(aspects.len(), 1);
        assert_eq!(aspects[0].aspect_type, AspectType::Conjunction);
        assert_relative_eq!(aspects[0].orb, 4.0);
    }
}
