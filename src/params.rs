//! Header keyword values a [`crate::WCS`] can be built from

/// Standard FITS WCS keywords of a 2d celestial image
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WCSParams {
    pub naxis1: Option<i64>,
    pub naxis2: Option<i64>,

    /// e.g. "RA---TAN"
    pub ctype1: String,
    pub ctype2: Option<String>,

    pub crpix1: Option<f64>,
    pub crpix2: Option<f64>,

    /// Degrees
    pub crval1: Option<f64>,
    pub crval2: Option<f64>,

    /// Degrees per pixel
    pub cdelt1: Option<f64>,
    pub cdelt2: Option<f64>,
    /// Degrees
    pub crota2: Option<f64>,

    pub cd1_1: Option<f64>,
    pub cd1_2: Option<f64>,
    pub cd2_1: Option<f64>,
    pub cd2_2: Option<f64>,

    pub pc1_1: Option<f64>,
    pub pc1_2: Option<f64>,
    pub pc2_1: Option<f64>,
    pub pc2_2: Option<f64>,

    pub equinox: Option<f64>,
    pub radesys: Option<String>,
}

/// Plate solution keywords of a Digitized Sky Survey image
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DssPlateParams {
    pub pltrah: f64,
    pub pltram: f64,
    pub pltras: f64,
    /// "+" or "-"
    pub pltdecsn: String,
    pub pltdecd: f64,
    pub pltdecm: f64,
    pub pltdecs: f64,
    /// arcsec/mm
    pub pltscale: f64,
    /// microns
    pub xpixelsz: f64,
    pub ypixelsz: f64,
    /// PPO1..PPO6
    pub ppo: [f64; 6],
    /// AMDX1..AMDX13
    pub amdx: [f64; 13],
    /// AMDY1..AMDY13
    pub amdy: [f64; 13],
    pub cnpix1: f64,
    pub cnpix2: f64,
}

impl DssPlateParams {
    /// Plate center (ra, dec) in degrees
    pub fn plate_center(&self) -> (f64, f64) {
        let ra = 15.0 * (self.pltrah + self.pltram / 60.0 + self.pltras / 3600.0);
        let mut dec = self.pltdecd + self.pltdecm / 60.0 + self.pltdecs / 3600.0;
        if self.pltdecsn.trim_start().starts_with('-') {
            dec = -dec;
        }
        (ra, dec)
    }
}

pub(crate) fn parse_pc_matrix(params: &WCSParams) -> Option<(f64, f64, f64, f64)> {
    match (params.pc1_1, params.pc1_2, params.pc2_1, params.pc2_2) {
        (None, None, None, None) => None,
        (pc11, pc12, pc21, pc22) => Some((
            pc11.unwrap_or(1.0),
            pc12.unwrap_or(0.0),
            pc21.unwrap_or(0.0),
            pc22.unwrap_or(1.0),
        )),
    }
}

pub(crate) fn parse_cd_matrix(params: &WCSParams) -> Option<(f64, f64, f64, f64)> {
    match (params.cd1_1, params.cd1_2, params.cd2_1, params.cd2_2) {
        (None, None, None, None) => None,
        // At least one CDi_j is given
        (cd11, cd12, cd21, cd22) => Some((
            cd11.unwrap_or(1.0),
            cd12.unwrap_or(0.0),
            cd21.unwrap_or(0.0),
            cd22.unwrap_or(1.0),
        )),
    }
}

/// Linear part of the pixel to intermediate world coordinates map, in degrees.
///
/// Priority is given to CD, then to PC + CDELT, then to CDELT + CROTA2.
pub(crate) fn linear_matrix(params: &WCSParams) -> (f64, f64, f64, f64) {
    if let Some(cd) = parse_cd_matrix(params) {
        return cd;
    }

    let cdelt1 = params.cdelt1.unwrap_or(1.0);
    let cdelt2 = params.cdelt2.unwrap_or(1.0);
    if let Some((pc11, pc12, pc21, pc22)) = parse_pc_matrix(params) {
        (cdelt1 * pc11, cdelt1 * pc12, cdelt2 * pc21, cdelt2 * pc22)
    } else {
        let (s, c) = params.crota2.unwrap_or(0.0).to_radians().sin_cos();
        (cdelt1 * c, -cdelt2 * s, cdelt1 * s, cdelt2 * c)
    }
}
