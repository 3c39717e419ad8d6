//! External position provider wrapping the Swiss Ephemeris C library.
//!
//! Only compiled with the `swisseph` cargo feature; the default build has
//! no foreign linkage and the capability probe reports this provider as
//! unavailable.

use crate::houses::house_for_longitude;
use crate::provider::{PositionProvider, Positions, ProviderError, ProviderKind};
use crate::{ChartRequest, HouseCusp, Planet, PlanetPosition};
use chrono::{Datelike, Timelike};
use std::ffi::CString;
use std::os::raw::{c_char, c_double, c_int};
use std::path::Path;
use std::sync::Once;

pub const SE_GREG_CAL: c_int = 1;
pub const SEFLG_SWIEPH: c_int = 2;
pub const SEFLG_SPEED: c_int = 256;

const SERR_LEN: usize = 256;

extern "C" {
    fn swe_set_ephe_path(path: *const c_char);
    fn swe_close();
    fn swe_julday(
        year: c_int,
        month: c_int,
        day: c_int,
        hour: c_double,
        gregflag: c_int,
    ) -> c_double;
    fn swe_calc_ut(
        tjd_ut: c_double,
        ipl: c_int,
        iflag: c_int,
        xx: *mut c_double,
        serr: *mut c_char,
    ) -> c_int;
    fn swe_houses_ex(
        tjd_ut: c_double,
        iflag: c_int,
        geolat: c_double,
        geolon: c_double,
        hsys: c_int,
        cusps: *mut c_double,
        ascmc: *mut c_double,
    ) -> c_int;
}

static INIT: Once = Once::new();

/// Safe wrapper over the Swiss Ephemeris. Construction sets the ephemeris
/// search path exactly once per process.
pub struct SwissEph;

impl SwissEph {
    pub fn new(ephe_path: &Path) -> Result<Self, ProviderError> {
        let path_str = ephe_path
            .to_str()
            .ok_or_else(|| ProviderError::Unavailable("non-utf8 ephemeris path".to_string()))?;
        let c_path = CString::new(path_str)
            .map_err(|_| ProviderError::Unavailable("ephemeris path contains NUL".to_string()))?;
        INIT.call_once(|| {
            unsafe { swe_set_ephe_path(c_path.as_ptr()) };
            log::info!("swisseph ephemeris path set to {}", path_str);
        });
        Ok(SwissEph)
    }

    fn julian_day(request: &ChartRequest) -> f64 {
        let dt = request.datetime;
        let hour =
            dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;
        unsafe {
            swe_julday(
                dt.year(),
                dt.month() as c_int,
                dt.day() as c_int,
                hour,
                SE_GREG_CAL,
            )
        }
    }

    fn body_longitude(julian_day: f64, planet: Planet) -> Result<(f64, f64), ProviderError> {
        let mut xx: [c_double; 6] = [0.0; 6];
        let mut serr: [c_char; SERR_LEN] = [0; SERR_LEN];
        let flag = SEFLG_SWIEPH | SEFLG_SPEED;
        let code = unsafe {
            swe_calc_ut(
                julian_day,
                planet as c_int,
                flag,
                xx.as_mut_ptr(),
                serr.as_mut_ptr(),
            )
        };
        if code < 0 {
            let message = unsafe { std::ffi::CStr::from_ptr(serr.as_ptr()) }
                .to_string_lossy()
                .into_owned();
            return Err(ProviderError::Computation { code, message });
        }
        // xx[0] is ecliptic longitude, xx[3] its daily speed
        Ok((xx[0], xx[3]))
    }

    fn cusps(request: &ChartRequest, julian_day: f64) -> Result<Vec<HouseCusp>, ProviderError> {
        let mut raw_cusps: [c_double; 13] = [0.0; 13];
        let mut ascmc: [c_double; 10] = [0.0; 10];
        let code = unsafe {
            swe_houses_ex(
                julian_day,
                SEFLG_SWIEPH,
                request.location.latitude,
                request.location.longitude,
                request.house_system.code() as c_int,
                raw_cusps.as_mut_ptr(),
                ascmc.as_mut_ptr(),
            )
        };
        if code < 0 {
            return Err(ProviderError::Computation {
                code,
                message: "house computation failed".to_string(),
            });
        }
        // Cusp array is 1-indexed by the library
        Ok((1..=12usize)
            .map(|house| HouseCusp::from_longitude(house as u8, raw_cusps[house]))
            .collect())
    }
}

impl Drop for SwissEph {
    fn drop(&mut self) {
        unsafe { swe_close() };
    }
}

impl PositionProvider for SwissEph {
    fn kind(&self) -> ProviderKind {
        ProviderKind::External
    }

    fn compute_positions(&self, request: &ChartRequest) -> Result<Positions, ProviderError> {
        let julian_day = Self::julian_day(request);
        let cusps = Self::cusps(request, julian_day)?;
        let mut planets = Vec::with_capacity(10);
        for planet in Planet::iter() {
            let (longitude, speed) = Self::body_longitude(julian_day, planet)?;
            let mut position = PlanetPosition::from_longitude(planet, longitude);
            position.retrograde = speed < 0.0;
            position.speed = Some(speed);
            position.house = Some(house_for_longitude(position.absolute_degree, &cusps));
            planets.push(position);
        }
        Ok((planets, cusps))
    }
}
