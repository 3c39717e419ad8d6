//! Placement of a longitude into one of 12 circular house segments.

use crate::HouseCusp;

/// Finds the house whose segment `[cusp[i], cusp[i+1])` contains the
/// longitude. Segments are circular: a house whose start cusp is larger
/// than its end cusp crosses 0 Aries, and membership there is
/// `lon >= start || lon < end`. A naive linear comparison misplaces
/// planets near the Ascendant, so the wrap case is explicit.
///
/// Malformed cusp data never raises; house 1 is the defensive default.
pub fn house_for_longitude(longitude: f64, cusps: &[HouseCusp]) -> u8 {
    let lon = longitude.rem_euclid(360.0);
    let n = cusps.len();
    if n == 0 {
        return 1;
    }
    for i in 0..n {
        let start = cusps[i].absolute_degree;
        let end = cusps[(i + 1) % n].absolute_degree;
        let contained = if start <= end {
            lon >= start && lon < end
        } else {
            lon >= start || lon < end
        };
        if contained {
            return cusps[i].house;
        }
    }
    1
}

/// Equal 30-degree cusps from an ascendant longitude. The stub provider
/// uses this; the external provider gets cusps from the ephemeris.
pub fn equal_cusps(ascendant: f64) -> Vec<HouseCusp> {
    (0..12)
        .map(|i| HouseCusp::from_longitude(i as u8 + 1, ascendant + i as f64 * 30.0))
        .collect()
}
