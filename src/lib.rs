#![doc = include_str!("../readme.md")]

extern crate mapproj;
#[macro_use]
extern crate quick_error;

pub mod error;

pub mod converter;
pub mod coo_system;
pub mod depth_sampler;
pub mod distorter;
pub mod header;
pub mod image;
pub mod image_finder;
pub mod params;
pub mod process;
pub mod projection;
pub mod rotater;
pub mod sampler;
pub mod scaler;
pub mod settings;
pub mod sphere_distorter;
pub mod survey;
pub mod transform;

pub use converter::Converter;
pub use coo_system::CooSystem;
pub use error::Error;
pub use params::{DssPlateParams, WCSParams};
pub use projection::{Projection, ProjectionKind};
pub use rotater::Rotater;
pub use scaler::Scaler;
pub use transform::{Point, Stage, Transformer};

use distorter::{Distorter, Dss, PlateModel};

/// Pixel/sky mapping of one image.
///
/// The forward direction goes from J2000 unit vectors to pixel
/// coordinates, where pixel `(i, j)` covers `[i, i + 1) x [j, j + 1)`.
/// The stages are, in order:
/// * the sphere distorter of the coordinate system,
/// * the rotation of the coordinate system,
/// * the rotation to the reference point of the projection,
/// * the projecter,
/// * the distortion of the projection plane,
/// * the scaler from the projection plane to pixels.
///
/// The forward converter is reachable through `Deref`, its inverse with
/// [`WCS::inverse`].
#[derive(Clone)]
pub struct WCS {
    coo_system: CooSystem,
    projection: Projection,
    scaler: Scaler,
    /// sky -> pixel
    converter: Converter,
    /// pixel -> sky
    inverse: Converter,
}

impl WCS {
    pub fn new(coo_system: CooSystem, projection: Projection, scaler: Scaler) -> Result<Self, Error> {
        let mut converter = Converter::new();
        converter
            .add_opt(coo_system.sphere_distorter())?
            .add_opt(coo_system.rotater()?)?
            .add_opt(projection.rotater().cloned())?
            .add(projection.projecter())?
            .add_opt(projection.distorter().cloned())?
            .add(scaler)?;
        let inverse = converter.inverse()?;

        Ok(Self {
            coo_system,
            projection,
            scaler,
            converter,
            inverse,
        })
    }

    /// North up, east left tangent plane of `width` x `height` pixels
    /// centered on (lon, lat). Angles in radians
    pub fn tangent(
        lon: f64,
        lat: f64,
        pixel_scale: f64,
        width: usize,
        height: usize,
    ) -> Result<Self, Error> {
        let scaler = Scaler::new(
            width as f64 / 2.0,
            height as f64 / 2.0,
            -1.0 / pixel_scale,
            0.0,
            0.0,
            1.0 / pixel_scale,
        );

        Self::new(
            CooSystem::Julian(2000.0),
            Projection::new(ProjectionKind::Tan, lon, lat),
            scaler,
        )
    }

    /// Create a WCS from standard FITS keywords
    pub fn from_params(params: &WCSParams) -> Result<Self, Error> {
        let ctype1 = params.ctype1.trim().to_ascii_uppercase();
        let lat_first = is_latitude_axis(&ctype1);
        let coo_system = coo_system_from_ctype(&ctype1, params)?;
        let kind = ProjectionKind::parse(ctype1.get(5..8).unwrap_or("TAN"));

        let crval1 = params
            .crval1
            .ok_or(Error::MandatoryWCSKeywordsMissing("CRVAL1"))?;
        let crval2 = params
            .crval2
            .ok_or(Error::MandatoryWCSKeywordsMissing("CRVAL2"))?;
        let (lon, lat) = if lat_first {
            (crval2, crval1)
        } else {
            (crval1, crval2)
        };

        // FITS pixel centers are at 1, 2, ... ours at 0.5, 1.5, ...
        let crpix1 = params
            .crpix1
            .ok_or(Error::MandatoryWCSKeywordsMissing("CRPIX1"))?
            - 0.5;
        let crpix2 = params
            .crpix2
            .ok_or(Error::MandatoryWCSKeywordsMissing("CRPIX2"))?
            - 0.5;

        let (m11, m12, m21, m22) = params::linear_matrix(params);
        let (m11, m12, m21, m22) = (
            m11.to_radians(),
            m12.to_radians(),
            m21.to_radians(),
            m22.to_radians(),
        );
        // pixel -> projection plane
        let mut to_plane = Scaler::new(
            -m11 * crpix1 - m12 * crpix2,
            -m21 * crpix1 - m22 * crpix2,
            m11,
            m12,
            m21,
            m22,
        );
        if lat_first {
            to_plane = to_plane.interchange_axes();
        }

        let projection = Projection::new(kind, lon.to_radians(), lat.to_radians());
        Self::new(coo_system, projection, to_plane.inverted()?)
    }

    /// Create the WCS of a Digitized Sky Survey plate: a tangent plane about
    /// the plate center followed by the plate polynomial model
    pub fn from_dss(params: &DssPlateParams) -> Result<Self, Error> {
        let (ra, dec) = params.plate_center();

        // Degrees per pixel
        let cdelt1 = -params.pltscale / 1000.0 * params.xpixelsz / 3600.0;
        let cdelt2 = params.pltscale / 1000.0 * params.ypixelsz / 3600.0;
        let (cdelt1, cdelt2) = (cdelt1.to_radians(), cdelt2.to_radians());

        // CNPIX pixels start at 1 and are off by 0.5 from ours
        let crpix1 = params.ppo[2] / params.xpixelsz - params.cnpix1 - 0.5;
        let crpix2 = params.ppo[5] / params.ypixelsz - params.cnpix2 - 0.5;

        let plate = PlateModel {
            plate_ra: ra.to_radians(),
            plate_dec: dec.to_radians(),
            plate_scale: params.pltscale,
            x_pixel_size: params.xpixelsz,
            y_pixel_size: params.ypixelsz,
            ppo: params.ppo,
            amdx: params.amdx,
            amdy: params.amdy,
        };
        let projection = Projection::new(ProjectionKind::Tan, ra.to_radians(), dec.to_radians())
            .with_distorter(Distorter::Dss(Dss::new(plate)));

        let to_plane = Scaler::new(
            -cdelt1 * crpix1,
            -cdelt2 * crpix2,
            cdelt1,
            0.0,
            0.0,
            cdelt2,
        );
        Self::new(CooSystem::Julian(2000.0), projection, to_plane.inverted()?)
    }

    /// Same WCS with `shift` applied after the scaler, e.g. for a sub-image
    pub fn add_scaler(&self, shift: &Scaler) -> Result<Self, Error> {
        Self::new(
            self.coo_system,
            self.projection.clone(),
            self.scaler.add(shift),
        )
    }

    /// Angular size of a pixel in radians
    pub fn scale(&self) -> f64 {
        1.0 / self.scaler.determinant().abs().sqrt()
    }

    /// pixel -> sky converter
    pub fn inverse(&self) -> &Converter {
        &self.inverse
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn coo_system(&self) -> &CooSystem {
        &self.coo_system
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    /// Pixel position of the J2000 (lon, lat) position, in radians
    pub fn sky_to_pixel(&self, lon: f64, lat: f64) -> Result<(f64, f64), Error> {
        let [x, y] = self
            .converter
            .transform(Point::from_lonlat(lon, lat))?
            .plane("WCS")?;
        Ok((x, y))
    }

    /// J2000 (lon, lat) in radians of a pixel position
    pub fn pixel_to_sky(&self, x: f64, y: f64) -> Result<(f64, f64), Error> {
        let p = self.inverse.transform(Point::Plane([x, y]))?;
        p.to_lonlat().ok_or(Error::DimensionMismatch("WCS", 3, 2))
    }
}

fn is_latitude_axis(ctype: &str) -> bool {
    ["DEC", "GLAT", "ELAT", "HLAT"]
        .iter()
        .any(|prefix| ctype.starts_with(prefix))
}

fn coo_system_from_ctype(ctype: &str, params: &WCSParams) -> Result<CooSystem, Error> {
    let equinox = params.equinox;
    if ctype.starts_with("RA") || ctype.starts_with("DEC") {
        let radesys = params
            .radesys
            .as_deref()
            .map(|s| s.trim().to_ascii_uppercase());
        match radesys.as_deref() {
            Some("FK4") | Some("FK4-NO-E") => Ok(CooSystem::Besselian(equinox.unwrap_or(1950.0))),
            Some("FK5") => Ok(CooSystem::Julian(equinox.unwrap_or(2000.0))),
            Some("ICRS") => Ok(CooSystem::Icrs),
            Some(other) => Err(Error::UnknownCoordinateSystem(other.to_string())),
            // Equinoxes before 1984 are FK4
            None => match equinox {
                Some(e) if e < 1984.0 => Ok(CooSystem::Besselian(e)),
                Some(e) => Ok(CooSystem::Julian(e)),
                None => Ok(CooSystem::Julian(2000.0)),
            },
        }
    } else if ctype.starts_with("GLON") || ctype.starts_with("GLAT") {
        Ok(CooSystem::Galactic)
    } else if ctype.starts_with("ELON") || ctype.starts_with("ELAT") {
        Ok(CooSystem::Ecliptic {
            epoch: equinox.unwrap_or(2000.0),
            lon: 0.0,
        })
    } else if ctype.starts_with("HLON") || ctype.starts_with("HLAT") {
        Ok(CooSystem::Helioecliptic(equinox.unwrap_or(2000.0)))
    } else {
        Err(Error::UnknownCoordinateSystem(ctype.to_string()))
    }
}

use std::ops::Deref;
impl Deref for WCS {
    type Target = Converter;

    fn deref(&self) -> &Self::Target {
        &self.converter
    }
}

impl std::fmt::Debug for WCS {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WCS")
            .field("coosys", &self.coo_system)
            .field("projection", &self.projection.kind())
            .field("reference", &self.projection.reference())
            .field("scaler", &self.scaler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_delta {
        ($x:expr, $y:expr, $d:expr) => {
            if ($x - $y).abs() > $d {
                panic!("{} != {} (+/- {})", $x, $y, $d);
            }
        };
    }

    fn tan_params() -> WCSParams {
        WCSParams {
            naxis1: Some(100),
            naxis2: Some(100),
            ctype1: "RA---TAN".to_string(),
            ctype2: Some("DEC--TAN".to_string()),
            crpix1: Some(50.0),
            crpix2: Some(50.0),
            crval1: Some(10.0),
            crval2: Some(20.0),
            cd1_1: Some(-0.01),
            cd1_2: Some(0.0),
            cd2_1: Some(0.0),
            cd2_2: Some(0.01),
            ..Default::default()
        }
    }

    #[test]
    fn tangent_grid() {
        let scale = 1e-4;
        let wcs = WCS::tangent(1.0, 0.5, scale, 20, 10).unwrap();
        let (x, y) = wcs.sky_to_pixel(1.0, 0.5).unwrap();
        assert_delta!(x, 10.0, 1e-9);
        assert_delta!(y, 5.0, 1e-9);
        assert_delta!(wcs.scale(), scale, 1e-15);

        // East is to the left
        let (x, _) = wcs.sky_to_pixel(1.0 + 10.0 * scale, 0.5).unwrap();
        assert!(x < 10.0);
    }

    #[test]
    fn reference_pixel() {
        let wcs = WCS::from_params(&tan_params()).unwrap();
        let (x, y) = wcs
            .sky_to_pixel(10_f64.to_radians(), 20_f64.to_radians())
            .unwrap();
        assert_delta!(x, 49.5, 1e-9);
        assert_delta!(y, 49.5, 1e-9);
        assert_delta!(wcs.scale(), 0.01_f64.to_radians(), 1e-15);
    }

    #[test]
    fn pixel_sky_round_trip() {
        let params = [
            tan_params(),
            WCSParams {
                ctype1: "GLON-CAR".to_string(),
                ctype2: Some("GLAT-CAR".to_string()),
                crval1: Some(120.0),
                crval2: Some(-5.0),
                cd1_1: None,
                cd2_2: None,
                cd1_2: None,
                cd2_1: None,
                cdelt1: Some(-0.05),
                cdelt2: Some(0.05),
                crota2: Some(12.0),
                ..tan_params()
            },
            WCSParams {
                ctype1: "RA---SIN".to_string(),
                ctype2: Some("DEC--SIN".to_string()),
                equinox: Some(1950.0),
                ..tan_params()
            },
            WCSParams {
                ctype1: "ELON-AIT".to_string(),
                ctype2: Some("ELAT-AIT".to_string()),
                ..tan_params()
            },
        ];

        for p in &params {
            let wcs = WCS::from_params(p).unwrap();
            for (x, y) in [(0.5, 0.5), (49.5, 49.5), (10.0, 90.0), (99.0, 3.0)] {
                let (lon, lat) = wcs.pixel_to_sky(x, y).unwrap();
                let (x2, y2) = wcs.sky_to_pixel(lon, lat).unwrap();
                assert_delta!(x2, x, 1e-6);
                assert_delta!(y2, y, 1e-6);
            }
        }
    }

    #[test]
    fn besselian_header() {
        let params = WCSParams {
            radesys: Some("FK4".to_string()),
            ..tan_params()
        };
        let wcs = WCS::from_params(&params).unwrap();
        assert_eq!(wcs.coo_system(), &CooSystem::Besselian(1950.0));
        // E-terms, precession, projection rotation, projecter, scaler
        assert_eq!(wcs.stages().len(), 5);

        // E-terms are below an arcsecond, i.e. well inside a 36" pixel
        let (x, y) = wcs
            .sky_to_pixel(10_f64.to_radians(), 20_f64.to_radians())
            .unwrap();
        assert!((x - 49.5).abs() < 0.1 && (y - 49.5).abs() < 0.1);
        assert!((x - 49.5).abs() > 1e-6 || (y - 49.5).abs() > 1e-6);
    }

    #[test]
    fn latitude_first_axes() {
        let swapped = WCSParams {
            ctype1: "DEC--TAN".to_string(),
            ctype2: Some("RA---TAN".to_string()),
            crval1: Some(20.0),
            crval2: Some(10.0),
            cd1_1: Some(0.0),
            cd1_2: Some(0.01),
            cd2_1: Some(-0.01),
            cd2_2: Some(0.0),
            ..tan_params()
        };
        let a = WCS::from_params(&tan_params()).unwrap();
        let b = WCS::from_params(&swapped).unwrap();

        for (lon, lat) in [(10.0_f64, 20.0_f64), (10.2, 19.7), (9.6, 20.4)] {
            let pa = a.sky_to_pixel(lon.to_radians(), lat.to_radians()).unwrap();
            let pb = b.sky_to_pixel(lon.to_radians(), lat.to_radians()).unwrap();
            assert_delta!(pa.0, pb.0, 1e-9);
            assert_delta!(pa.1, pb.1, 1e-9);
        }
    }

    #[test]
    fn bad_headers() {
        let params = WCSParams {
            ctype1: "FOO--TAN".to_string(),
            ..tan_params()
        };
        assert!(matches!(
            WCS::from_params(&params),
            Err(Error::UnknownCoordinateSystem(_))
        ));

        let params = WCSParams {
            crval2: None,
            ..tan_params()
        };
        assert_eq!(
            WCS::from_params(&params).err(),
            Some(Error::MandatoryWCSKeywordsMissing("CRVAL2"))
        );

        let params = WCSParams {
            cd1_1: Some(0.0),
            cd2_2: Some(0.0),
            ..tan_params()
        };
        assert_eq!(
            WCS::from_params(&params).err(),
            Some(Error::NotInvertible("Scaler".to_string()))
        );
    }

    fn dss_params() -> DssPlateParams {
        let mut amdx = [0.0; 13];
        let mut amdy = [0.0; 13];
        amdx[0] = 67.2;
        amdy[0] = 67.2;
        amdx[3] = 2e-6;
        amdy[5] = -1e-6;

        DssPlateParams {
            pltrah: 5.0,
            pltram: 30.0,
            pltras: 0.0,
            pltdecsn: "+".to_string(),
            pltdecd: 30.0,
            pltdecm: 0.0,
            pltdecs: 0.0,
            pltscale: 67.2,
            xpixelsz: 25.0,
            ypixelsz: 25.0,
            ppo: [0.0, 0.0, 12500.0, 0.0, 0.0, 12500.0],
            amdx,
            amdy,
            cnpix1: 200.0,
            cnpix2: 300.0,
        }
    }

    #[test]
    fn dss_plate() {
        let wcs = WCS::from_dss(&dss_params()).unwrap();
        // 1.68"/pixel
        assert_delta!(
            wcs.scale().to_degrees() * 3600.0,
            67.2 * 25.0 / 1000.0,
            1e-9
        );

        let (x, y) = wcs
            .sky_to_pixel(82.5_f64.to_radians(), 30_f64.to_radians())
            .unwrap();
        assert_delta!(x, 299.5, 1e-6);
        assert_delta!(y, 199.5, 1e-6);

        for (x, y) in [(0.0, 0.0), (150.5, 80.25), (400.0, 512.0)] {
            let (lon, lat) = wcs.pixel_to_sky(x, y).unwrap();
            let (x2, y2) = wcs.sky_to_pixel(lon, lat).unwrap();
            assert_delta!(x2, x, 1e-6);
            assert_delta!(y2, y, 1e-6);
        }
    }

    #[test]
    fn shifted_wcs() {
        let wcs = WCS::from_params(&tan_params()).unwrap();
        let sub = wcs.add_scaler(&Scaler::shift(-10.0, -20.0)).unwrap();
        let (x, y) = sub
            .sky_to_pixel(10_f64.to_radians(), 20_f64.to_radians())
            .unwrap();
        assert_delta!(x, 39.5, 1e-9);
        assert_delta!(y, 29.5, 1e-9);
    }
}
