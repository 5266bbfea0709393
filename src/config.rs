//! The options that control an export.
//!
//! Options are read from a JSON object. Per-bin options may be given either
//! as a single number or as an array; a scalar is normalized to a
//! single-element array while parsing so that nothing downstream has to care.

use std::path::Path;

use serde::Deserialize;

use crate::{Error, NoiseParameters};

/// Either a single float or an array of floats
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum ScalarOrArray {
    Scalar(f64),
    Array(Vec<f64>),
}

fn per_bin_values<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match ScalarOrArray::deserialize(deserializer)? {
        ScalarOrArray::Scalar(v) => vec![v],
        ScalarOrArray::Array(v) => v,
    })
}

/// The recognized options, exactly as they appear in the input
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    ell_min: f64,
    ell_max: f64,
    n_ell: usize,
    #[serde(deserialize_with = "per_bin_values")]
    number_density_shear_bin: Vec<f64>,
    #[serde(deserialize_with = "per_bin_values")]
    number_density_lss_bin: Vec<f64>,
    #[serde(deserialize_with = "per_bin_values")]
    sigma_e_bin: Vec<f64>,
    survey_area: f64,
    shear_nz_name: String,
    position_nz_name: String,
    filename: String,
    #[serde(default)]
    clobber: bool,
}

/// The validated configuration of an export
#[derive(Clone, Debug, PartialEq)]
pub struct ExportConfig {
    /// the (log-spaced) ell values that every spectrum is resampled onto
    pub ell_sample: Vec<f64>,
    pub noise: NoiseParameters,
    /// survey area in steradians
    pub survey_area: f64,
    /// name of the data store section holding the shear n(z) (upper-case)
    pub shear_nz: String,
    /// name of the data store section holding the position n(z) (upper-case)
    pub position_nz: String,
    pub filename: String,
    /// whether an existing output file may be overwritten
    pub clobber: bool,
}

impl ExportConfig {
    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        let raw: RawOptions =
            serde_json::from_str(text).map_err(|err| Error::config("<json>", err.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            let what = format!("{}: {err}", path.display());
            Error::config("<file>", what)
        })?;
        Self::from_json_str(&text)
    }

    fn from_raw(raw: RawOptions) -> Result<Self, Error> {
        if !(raw.ell_min > 0.0 && raw.ell_min.is_finite()) {
            return Err(Error::config(
                "ell_min",
                format!("must be positive and finite, not {}", raw.ell_min),
            ));
        } else if !(raw.ell_max > raw.ell_min && raw.ell_max.is_finite()) {
            return Err(Error::config(
                "ell_max",
                format!("must be finite and exceed ell_min, not {}", raw.ell_max),
            ));
        } else if raw.n_ell == 0 {
            return Err(Error::config("n_ell", "must be at least 1".to_string()));
        } else if !(raw.survey_area > 0.0) {
            return Err(Error::config(
                "survey_area",
                format!("must be positive, not {}", raw.survey_area),
            ));
        }

        for (option, values) in [
            ("number_density_shear_bin", &raw.number_density_shear_bin),
            ("number_density_lss_bin", &raw.number_density_lss_bin),
        ] {
            if values.is_empty() || values.iter().any(|&n| !(n > 0.0)) {
                return Err(Error::config(
                    option,
                    "must hold one positive value per bin".to_string(),
                ));
            }
        }
        if raw.sigma_e_bin.is_empty() {
            return Err(Error::config(
                "sigma_e_bin",
                "must hold one value per bin".to_string(),
            ));
        }

        Ok(ExportConfig {
            ell_sample: logspace(raw.ell_min, raw.ell_max, raw.n_ell),
            noise: NoiseParameters {
                number_density_shear_bin: raw.number_density_shear_bin,
                number_density_lss_bin: raw.number_density_lss_bin,
                sigma_e_bin: raw.sigma_e_bin,
            },
            survey_area: square_degrees_to_steradians(raw.survey_area),
            shear_nz: raw.shear_nz_name.to_uppercase(),
            position_nz: raw.position_nz_name.to_uppercase(),
            filename: raw.filename,
            clobber: raw.clobber,
        })
    }
}

pub fn square_degrees_to_steradians(area: f64) -> f64 {
    area * (std::f64::consts::PI * std::f64::consts::PI) / (180.0 * 180.0)
}

/// `n` values evenly spaced in log10 between `min` and `max` (inclusive).
///
/// The endpoints are exactly `min` and `max`, so that a grid tabulated over
/// `[min, max]` can always be sampled without extrapolating.
pub fn logspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let (lo, hi) = (min.log10(), max.log10());
            let step = (hi - lo) / ((n - 1) as f64);
            let mut out: Vec<f64> = (0..n).map(|k| 10f64.powf(lo + step * (k as f64))).collect();
            out[0] = min;
            out[n - 1] = max;
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "ell_min": 10.0,
        "ell_max": 1000.0,
        "n_ell": 3,
        "number_density_shear_bin": [1.0, 2.0],
        "number_density_lss_bin": 0.5,
        "sigma_e_bin": [0.2, 0.3],
        "survey_area": 1000.0,
        "shear_nz_name": "nz_source",
        "position_nz_name": "nz_lens",
        "filename": "sim.fits"
    }"#;

    #[test]
    fn parse_full() {
        let config = ExportConfig::from_json_str(FULL).unwrap();
        assert_eq!(config.ell_sample[0], 10.0);
        assert!((config.ell_sample[1] - 100.0).abs() < 1e-10);
        assert_eq!(config.ell_sample[2], 1000.0);

        assert_eq!(config.noise.number_density_shear_bin, vec![1.0, 2.0]);
        // scalars become single-element arrays
        assert_eq!(config.noise.number_density_lss_bin, vec![0.5]);
        assert_eq!(config.noise.sigma_e_bin, vec![0.2, 0.3]);

        let expected_area = 1000.0 * (std::f64::consts::PI / 180.0).powi(2);
        assert!((config.survey_area - expected_area).abs() < 1e-14);

        assert_eq!(config.shear_nz, "NZ_SOURCE");
        assert_eq!(config.position_nz, "NZ_LENS");
        assert_eq!(config.filename, "sim.fits");
        assert!(!config.clobber);
    }

    #[test]
    fn invalid_options() {
        // unknown option
        let text = FULL.replace("\"n_ell\": 3", "\"n_ell\": 3, \"nell\": 4");
        assert!(ExportConfig::from_json_str(&text).is_err());

        // missing option
        let text = FULL.replace("\"filename\": \"sim.fits\"", "\"clobber\": true");
        assert!(ExportConfig::from_json_str(&text).is_err());

        // bad ell range
        let text = FULL.replace("\"ell_max\": 1000.0", "\"ell_max\": 5.0");
        let err = ExportConfig::from_json_str(&text).unwrap_err();
        assert!(err.to_string().contains("ell_max"));

        // no ell values
        let text = FULL.replace("\"n_ell\": 3", "\"n_ell\": 0");
        assert!(ExportConfig::from_json_str(&text).is_err());

        // non-positive number density
        let text = FULL.replace(
            "\"number_density_lss_bin\": 0.5",
            "\"number_density_lss_bin\": 0.0",
        );
        let err = ExportConfig::from_json_str(&text).unwrap_err();
        assert!(err.to_string().contains("number_density_lss_bin"));
    }

    #[test]
    fn clobber_flag() {
        let text = FULL.replace(
            "\"filename\": \"sim.fits\"",
            "\"filename\": \"a\", \"clobber\": true",
        );
        assert!(ExportConfig::from_json_str(&text).unwrap().clobber);
    }

    #[test]
    fn logspace_props() {
        assert!(logspace(1.0, 10.0, 0).is_empty());
        assert_eq!(logspace(3.0, 10.0, 1), vec![3.0]);

        let vals = logspace(2.0, 2000.0, 25);
        assert_eq!(vals.len(), 25);
        assert_eq!(vals[0], 2.0);
        assert_eq!(vals[24], 2000.0);
        for w in vals.windows(2) {
            assert!(w[1] > w[0]);
            // constant ratio
            assert!((w[1] / w[0] - 10f64.powf(3.0 / 24.0)).abs() < 1e-12);
        }
    }
}
