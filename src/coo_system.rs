//! Celestial reference frames
//!
//! Every system is expressed relative to J2000 (FK5): its rotater maps
//! J2000 unit vectors into the system, and Besselian systems additionally
//! apply the E-terms of aberration before the rotation.

use crate::error::Error;
use crate::rotater::Rotater;
use crate::sphere_distorter::SphereDistorter;

/// Radians per arcsecond
const DAS2R: f64 = 4.848136811095359935e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CooSystem {
    /// FK5 equatorial at the given epoch of equinox
    Julian(f64),
    /// FK4 equatorial at the given epoch of equinox, dynamic terms not included
    Besselian(f64),
    Galactic,
    Icrs,
    /// Ecliptic at the given epoch, with longitudes counted from `lon` (radians)
    Ecliptic { epoch: f64, lon: f64 },
    /// Ecliptic with the Sun at the origin of longitudes
    Helioecliptic(f64),
}

impl Default for CooSystem {
    fn default() -> Self {
        CooSystem::Julian(2000.0)
    }
}

impl CooSystem {
    /// Get a coordinate system by name (case insensitive).
    ///
    /// The name is an initial followed by an epoch, e.g. "J2000", "B1950",
    /// "E2000.45", "H2010". Names starting with G are Galactic and "ICRS"
    /// is ICRS. When the epoch is missing, `equinox` is used, then 2000
    /// (1950 for Besselian).
    pub fn parse(name: &str, equinox: Option<&str>) -> Result<Self, Error> {
        let name = name.trim().to_ascii_uppercase();
        let unknown = || Error::UnknownCoordinateSystem(name.clone());

        if name == "ICRS" {
            return Ok(CooSystem::Icrs);
        }

        let mut chars = name.chars();
        let initial = chars.next().ok_or_else(unknown)?;
        if initial == 'G' {
            return Ok(CooSystem::Galactic);
        }

        let suffix = chars.as_str().trim();
        let epoch = if suffix.is_empty() {
            equinox
                .map(|eq| eq.trim().parse::<f64>())
                .transpose()
                .map_err(|_| unknown())?
        } else {
            Some(suffix.parse::<f64>().map_err(|_| unknown())?)
        };

        match initial {
            'J' => Ok(CooSystem::Julian(epoch.unwrap_or(2000.0))),
            'B' => Ok(CooSystem::Besselian(epoch.unwrap_or(1950.0))),
            'E' => Ok(CooSystem::Ecliptic {
                epoch: epoch.unwrap_or(2000.0),
                lon: 0.0,
            }),
            'H' => Ok(CooSystem::Helioecliptic(epoch.unwrap_or(2000.0))),
            _ => Err(unknown()),
        }
    }

    pub fn name(&self) -> String {
        match self {
            CooSystem::Julian(epoch) => format!("J{}", epoch),
            CooSystem::Besselian(epoch) => format!("B{}", epoch),
            CooSystem::Galactic => "Galactic".to_string(),
            CooSystem::Icrs => "ICRS".to_string(),
            CooSystem::Ecliptic { epoch, .. } => format!("E{}", epoch),
            CooSystem::Helioecliptic(epoch) => format!("H{}", epoch),
        }
    }

    pub fn description(&self) -> String {
        match self {
            CooSystem::Julian(epoch) => format!(
                "A Julian (FK5-based) equatorial coordinate system with epoch of the equinox of {}",
                epoch
            ),
            CooSystem::Besselian(epoch) => format!(
                "A Besselian (FK4-based) equatorial coordinate system with epoch of the equinox of {}. Dynamic terms are not included.",
                epoch
            ),
            CooSystem::Galactic => {
                "Coordinate system based upon the orientation and center of the Galaxy".to_string()
            }
            CooSystem::Icrs => "Non-precessing equatorial coordinate system".to_string(),
            CooSystem::Ecliptic { epoch, .. } => format!(
                "A coordinate system with the ecliptic as the equator at epoch of equinox {}",
                epoch
            ),
            CooSystem::Helioecliptic(_) => {
                "A coordinate system with the equator along the ecliptic and the Sun at the center. The position of the Sun is inferred from the epoch.".to_string()
            }
        }
    }

    /// Rotation from J2000 to this system, `None` when there is nothing to rotate
    pub fn rotater(&self) -> Result<Option<Rotater>, Error> {
        match *self {
            CooSystem::Julian(epoch) => julian_precession(2000.0, epoch),
            CooSystem::Besselian(epoch) => besselian_precession(epoch).map(Some),
            CooSystem::Galactic => {
                // (l of the NCP, b of the NCP, ra of the NGP) in degrees
                let poles = [122.931918_f64, 27.128251, 192.859481];
                Rotater::from_euler(
                    "ZYZ",
                    poles[2].to_radians(),
                    (90.0 - poles[1]).to_radians(),
                    (180.0 - poles[0]).to_radians(),
                )
                .map(Some)
            }
            CooSystem::Icrs => {
                // Feissel and Mignard (1998)
                Rotater::from_euler(
                    "XYZ",
                    (-0.0199_f64 / 3600.0).to_radians(),
                    (-0.0091_f64 / 3600.0).to_radians(),
                    (0.0229_f64 / 3600.0).to_radians(),
                )
                .map(Some)
            }
            CooSystem::Ecliptic { epoch, lon } => ecliptic(epoch, lon).map(Some),
            CooSystem::Helioecliptic(epoch) => ecliptic(epoch, sun_longitude(epoch)).map(Some),
        }
    }

    pub fn sphere_distorter(&self) -> Option<SphereDistorter> {
        match self {
            CooSystem::Besselian(_) => Some(SphereDistorter::Besselian),
            _ => None,
        }
    }
}

/// FK5 precession between two epochs (IAU 1976), `None` when they are equal
pub fn julian_precession(from: f64, to: f64) -> Result<Option<Rotater>, Error> {
    if from == to {
        return Ok(None);
    }

    let big_t = (from - 2000.0) / 100.0;
    let t = (to - from) / 100.0;
    let tas2r = t * DAS2R;

    let w = 2306.2181 + (1.39656 - 0.000139 * big_t) * big_t;
    let zeta = (w + ((0.30188 - 0.000344 * big_t) + 0.017998 * t) * t) * tas2r;
    let z = (w + ((1.09468 + 0.000066 * big_t) + 0.018203 * t) * t) * tas2r;
    let theta = ((2004.3109 + (-0.85330 - 0.000217 * big_t) * big_t)
        + ((-0.42665 - 0.000217 * big_t) - 0.041833 * t) * t)
        * tas2r;

    Rotater::from_euler("ZYZ", -zeta, theta, -z).map(Some)
}

/// FK4 precession from B1950
fn besselian_precession(epoch: f64) -> Result<Rotater, Error> {
    // B1850 to B1950 in tropical centuries
    let big_t = 1.0;
    let t = (epoch - 1950.0) / 100.0;
    let tas2r = t * DAS2R;

    let w = 2303.5548 + (1.39720 + 0.000059 * big_t) * big_t;
    let zeta = (w + (0.30242 - 0.000269 * big_t + 0.017996 * t) * t) * tas2r;
    let z = (w + (1.09478 + 0.000387 * big_t + 0.018324 * t) * t) * tas2r;
    let theta = (2005.1125
        + (-0.85294 - 0.000365 * big_t) * big_t
        + (-0.42647 - 0.000365 * big_t - 0.041802 * t) * t)
        * tas2r;

    Rotater::from_euler("ZYZ", -zeta, theta, -z)
}

fn ecliptic(epoch: f64, lon: f64) -> Result<Rotater, Error> {
    let t = (epoch - 2000.0) / 100.0;
    // Mean obliquity
    let eps0 = DAS2R * (84381.448 + (-46.8150 + (-0.00059 + 0.001813 * t) * t) * t);
    let obliquity = Rotater::from_euler("XZ", eps0, lon, 0.0)?;

    Ok(match julian_precession(2000.0, epoch)? {
        Some(precession) => precession.add(&obliquity),
        None => obliquity,
    })
}

/// Ecliptic longitude of the Sun (radians, in [0, 2pi)) at a given epoch in years.
///
/// Simplified from the sunpos routine of the IDL Astronomy library:
/// mean longitude, equation of the centre, planetary and lunar
/// perturbations and a long period term.
pub fn sun_longitude(epoch: f64) -> f64 {
    let dtor = 3.1415926535 / 180.0;
    let sin = |deg: f64| (deg * dtor).sin();
    let cos = |deg: f64| (deg * dtor).cos();

    // Julian centuries from 1900.0, 2000-01-01 being JD 2451544.5
    let t = ((epoch - 2000.0) * 365.25 + 2451544.5 - 2415020.0) / 36525.0;

    // Mean longitude in arcsec
    let mut l = (279.696678 + ((36000.768925 * t) % 360.0)) * 3600.0;

    // Equation of the centre, using the Earth mean anomaly
    let me = 358.475844 + ((35999.049750 * t) % 360.0);
    l += (6910.1 - 17.2 * t) * sin(me) + 72.3 * sin(2.0 * me);

    // Venus
    let mv = 212.603219 + ((58517.803875 * t) % 360.0);
    l += 4.8 * cos(299.1017 + mv - me)
        + 5.5 * cos(148.3133 + 2.0 * mv - 2.0 * me)
        + 2.5 * cos(315.9433 + 2.0 * mv - 3.0 * me)
        + 1.6 * cos(345.2533 + 3.0 * mv - 4.0 * me)
        + 1.0 * cos(318.15 + 3.0 * mv - 5.0 * me);

    // Mars
    let mm = 319.529425 + ((19139.858500 * t) % 360.0);
    l += 2.0 * cos(343.8883 - 2.0 * mm + 2.0 * me) + 1.8 * cos(200.4017 - 2.0 * mm + me);

    // Jupiter
    let mj = 225.328328 + ((3034.6920239 * t) % 360.0);
    l += 7.2 * cos(179.5317 - mj + me)
        + 2.6 * cos(263.2167 - mj)
        + 2.7 * cos(87.1450 - 2.0 * mj + 2.0 * me)
        + 1.6 * cos(109.4933 - 2.0 * mj + me);

    // Moon, from its mean elongation
    let d = 350.7376814 + ((445267.11422 * t) % 360.0);
    l += 6.5 * sin(d);

    // Long period terms
    l += 6.4 * sin(231.19 + 20.20 * t);

    let l = (l + 2592000.0).rem_euclid(1296000.0);
    l / 3600.0 * dtor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Point, Transformer};
    use approx::assert_abs_diff_eq;

    macro_rules! assert_delta {
        ($x:expr, $y:expr, $d:expr) => {
            if ($x - $y).abs() > $d {
                panic!("{} != {} (+/- {})", $x, $y, $d);
            }
        };
    }

    fn assert_same_matrix(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3], tolerance: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert_delta!(a[i][j], b[i][j], tolerance);
            }
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!(CooSystem::parse("icrs", None), Ok(CooSystem::Icrs));
        assert_eq!(CooSystem::parse("Gal", None), Ok(CooSystem::Galactic));
        assert_eq!(CooSystem::parse("J", None), Ok(CooSystem::Julian(2000.0)));
        assert_eq!(CooSystem::parse("b", None), Ok(CooSystem::Besselian(1950.0)));
        assert_eq!(
            CooSystem::parse("J1975.5", None),
            Ok(CooSystem::Julian(1975.5))
        );
        assert_eq!(
            CooSystem::parse("B", Some("1900")),
            Ok(CooSystem::Besselian(1900.0))
        );
        assert_eq!(
            CooSystem::parse("E2000.45", None),
            Ok(CooSystem::Ecliptic {
                epoch: 2000.45,
                lon: 0.0
            })
        );
        assert_eq!(
            CooSystem::parse("H2010", None),
            Ok(CooSystem::Helioecliptic(2010.0))
        );
    }

    #[test]
    fn unknown_names_are_errors() {
        for name in ["X2000", "", "J19x5", "Q"] {
            assert!(matches!(
                CooSystem::parse(name, None),
                Err(Error::UnknownCoordinateSystem(_))
            ));
        }
    }

    #[test]
    fn j2000_is_the_reference() {
        assert_eq!(CooSystem::Julian(2000.0).rotater(), Ok(None));
        assert_eq!(CooSystem::Julian(2000.0).sphere_distorter(), None);
        assert!(CooSystem::Besselian(1950.0).sphere_distorter().is_some());
    }

    #[test]
    fn precession_is_consistent_across_epochs() {
        let epochs = [1950.0, 1975.0, 2000.0, 2025.0, 2050.0];
        let identity = Rotater::default();
        let to = |epoch: f64| {
            CooSystem::Julian(epoch)
                .rotater()
                .unwrap()
                .unwrap_or_else(|| identity.clone())
        };

        for &e1 in &epochs {
            for &e2 in &epochs {
                // e1 -> J2000 -> e2
                let composed = to(e1).inverted().add(&to(e2));
                let direct = julian_precession(e1, e2)
                    .unwrap()
                    .unwrap_or_else(|| identity.clone());
                assert_same_matrix(composed.matrix(), direct.matrix(), 1e-10);
            }
        }
    }

    #[test]
    fn precession_moves_the_equinox() {
        // The J2000 equinox drifts by about 50.3"/yr in longitude
        let r = CooSystem::Julian(2050.0).rotater().unwrap().unwrap();
        let p = r.transform(Point::from_lonlat(0.0, 0.0)).unwrap();
        let (lon, lat) = p.to_lonlat().unwrap();
        let arcsec = |rad: f64| rad.to_degrees() * 3600.0;

        assert_delta!(arcsec(lon), 50.0 * 46.1, 10.0);
        assert_delta!(arcsec(lat), 50.0 * 20.04, 5.0);
    }

    #[test]
    fn galactic_pole() {
        let r = CooSystem::Galactic.rotater().unwrap().unwrap();
        let ngp = Point::from_lonlat(192.859481_f64.to_radians(), 27.128251_f64.to_radians());
        let (_, b) = r.transform(ngp).unwrap().to_lonlat().unwrap();
        assert_abs_diff_eq!(b, std::f64::consts::FRAC_PI_2, epsilon = 1e-9);

        // Galactic center
        let gc = Point::from_lonlat(266.40499_f64.to_radians(), (-28.93617_f64).to_radians());
        let (l, b) = r.transform(gc).unwrap().to_lonlat().unwrap();
        let l = if l > std::f64::consts::PI { l - std::f64::consts::TAU } else { l };
        assert_abs_diff_eq!(l.to_degrees(), 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(b.to_degrees(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn ecliptic_pole() {
        let r = CooSystem::Ecliptic {
            epoch: 2000.0,
            lon: 0.0,
        }
        .rotater()
        .unwrap()
        .unwrap();
        // North ecliptic pole at (RA, Dec) = (270, 66.56)
        let nep = Point::from_lonlat(270_f64.to_radians(), (90.0 - 23.439291_f64).to_radians());
        let (_, b) = r.transform(nep).unwrap().to_lonlat().unwrap();
        assert_abs_diff_eq!(b.to_degrees(), 90.0, epsilon = 1e-5);
    }

    #[test]
    fn sun_longitude_series() {
        assert_delta!(sun_longitude(2000.0).to_degrees(), 279.8672897254747, 1e-7);
        assert_delta!(sun_longitude(2010.5).to_degrees(), 100.15204095599523, 1e-7);
        for epoch in [1900.0, 1990.0, 2000.25, 2100.0] {
            let lon = sun_longitude(epoch);
            assert!((0.0..std::f64::consts::TAU).contains(&lon));
        }
    }

    #[test]
    fn helioecliptic_puts_the_sun_at_the_origin() {
        let epoch = 2010.5;
        let helio = CooSystem::Helioecliptic(epoch).rotater().unwrap().unwrap();
        let ecl = CooSystem::Ecliptic { epoch, lon: 0.0 }
            .rotater()
            .unwrap()
            .unwrap();

        // A point at the Sun ecliptic longitude has helioecliptic longitude 0
        let sun = Point::from_lonlat(sun_longitude(epoch), 0.0);
        let sun_j2000 = ecl.inverted().transform(sun).unwrap();
        let (l, b) = helio.transform(sun_j2000).unwrap().to_lonlat().unwrap();
        let l = if l > std::f64::consts::PI { l - std::f64::consts::TAU } else { l };
        assert_abs_diff_eq!(l, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b, 0.0, epsilon = 1e-12);
    }
}
