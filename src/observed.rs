//! Provides "observed" spectra (theory + noise) to the covariance kernel.
//!
//! A Gaussian covariance is built from the observed spectra, which include
//! shot noise (for galaxy positions) and shape noise (for galaxy shear). The
//! covariance kernel evaluates these at many angles for each bin-pair, so we
//! spline each theory prediction once and reuse the spline.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::{BlockDataStore, Error, LinearInterpolator, SpectrumType, SpectrumTypePair};

/// number of square arcminutes in a steradian
const ARCMIN2_PER_STERADIAN: f64 = (41253.0 * 60.0 * 60.0) / (4.0 * std::f64::consts::PI);

/// Convert a number density per square arcminute into a number density per
/// steradian.
pub fn convert_nz_steradian(n: f64) -> f64 {
    n * ARCMIN2_PER_STERADIAN
}

/// The per-bin noise properties of a survey, in input units
///
/// Number densities are per square arcminute. Entry `k` of each vector
/// describes (1-based) bin `k + 1`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoiseParameters {
    pub number_density_shear_bin: Vec<f64>,
    pub number_density_lss_bin: Vec<f64>,
    pub sigma_e_bin: Vec<f64>,
}

/// The callback that a covariance kernel uses to retrieve observed spectra
pub trait TheoryLookup {
    /// Evaluate the observed `C^{ij}_{AB}(ell)`, where `i` and `j` are
    /// 1-based bin indices.
    fn lookup(
        &mut self,
        block: &dyn BlockDataStore,
        a: SpectrumType,
        b: SpectrumType,
        i: usize,
        j: usize,
        ell: f64,
    ) -> Result<f64, Error>;
}

/// Memoizes the splines of theory predictions.
///
/// Keys are `(section, value_name)`. An entry is written at most once and is
/// never invalidated. Each [`ObservedSpectrumProvider`] owns its cache, so the
/// cached splines are only ever valid for the data store that the provider
/// was queried with.
#[derive(Clone, Debug, Default)]
pub struct SplineCache {
    splines: HashMap<(String, String), LinearInterpolator>,
}

impl SplineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.splines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splines.is_empty()
    }

    pub fn contains(&self, section: &str, name: &str) -> bool {
        self.splines
            .contains_key(&(section.to_string(), name.to_string()))
    }

    /// Get the spline stored under `(section, name)`, building it with
    /// `make` if it isn't present yet.
    fn get_or_try_insert_with(
        &mut self,
        section: &str,
        name: String,
        make: impl FnOnce() -> Result<LinearInterpolator, Error>,
    ) -> Result<&LinearInterpolator, Error> {
        match self.splines.entry((section.to_string(), name)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(make()?)),
        }
    }
}

/// Produces noise-augmented spectra for the covariance kernel.
///
/// One instance should be used for a single covariance-assembly pass over a
/// single data store. The spline cache starts out empty and can't be handed
/// to another provider.
#[derive(Clone, Debug)]
pub struct ObservedSpectrumProvider {
    // per steradian
    number_density_shear_bin: Vec<f64>,
    // per steradian
    number_density_lss_bin: Vec<f64>,
    sigma_e_bin: Vec<f64>,
    splines: SplineCache,
}

impl ObservedSpectrumProvider {
    pub fn new(noise: &NoiseParameters) -> Self {
        ObservedSpectrumProvider {
            number_density_shear_bin: to_steradian(&noise.number_density_shear_bin),
            number_density_lss_bin: to_steradian(&noise.number_density_lss_bin),
            sigma_e_bin: noise.sigma_e_bin.clone(),
            splines: SplineCache::new(),
        }
    }

    pub fn cache(&self) -> &SplineCache {
        &self.splines
    }

    /// the noise contribution to `C^{ij}_{AB}`
    ///
    /// We assume that shot/shape noise is uncorrelated between bins and
    /// between observables, so only the diagonal of an auto-spectrum gets
    /// noise.
    fn noise(&self, a: SpectrumType, b: SpectrumType, i: usize, j: usize) -> Result<f64, Error> {
        if a != b || i != j {
            return Ok(0.0);
        }
        match a {
            SpectrumType::GalaxyShearEmodeFourier => {
                let sigma_e = per_bin(&self.sigma_e_bin, i, "sigma_e_bin")?;
                let n = per_bin(
                    &self.number_density_shear_bin,
                    i,
                    "number_density_shear_bin",
                )?;
                Ok(sigma_e * sigma_e / n)
            }
            SpectrumType::GalaxyPositionFourier => {
                let n = per_bin(&self.number_density_lss_bin, i, "number_density_lss_bin")?;
                Ok(1.0 / n)
            }
            _ => Ok(0.0),
        }
    }
}

impl TheoryLookup for ObservedSpectrumProvider {
    fn lookup(
        &mut self,
        block: &dyn BlockDataStore,
        a: SpectrumType,
        b: SpectrumType,
        i: usize,
        j: usize,
        ell: f64,
    ) -> Result<f64, Error> {
        let types = SpectrumTypePair::new(a, b);
        let entry = types.fourier_table_entry()?;
        let name_ij = entry.value_name(i, j);

        let make = || make_spline(block, types, i, j);
        let spline = self
            .splines
            .get_or_try_insert_with(entry.section, name_ij, make)?;
        let theory = spline.eval(ell).map_err(|err| {
            let who = format!("{} in section {}", entry.value_name(i, j), entry.section);
            Error::context(who, err)
        })?;

        // the noise is added after evaluating the spline
        Ok(theory + self.noise(a, b, i, j)?)
    }
}

/// Build a spline of the theory prediction `C^{ij}_{AB}`.
///
/// Auto-correlations only store one triangle, so for those we fall back to
/// `C^{ji}_{AB}` when `C^{ij}_{AB}` is absent.
fn make_spline(
    block: &dyn BlockDataStore,
    types: SpectrumTypePair,
    i: usize,
    j: usize,
) -> Result<LinearInterpolator, Error> {
    let entry = types.fourier_table_entry()?;
    let section = entry.section;
    let name_ij = entry.value_name(i, j);
    let name_ji = entry.value_name(j, i);

    let name = if block.has_value(section, &name_ij) {
        &name_ij
    } else if types.is_auto() && block.has_value(section, &name_ji) {
        &name_ji
    } else {
        return Err(Error::missing_theory(section, name_ij.clone()));
    };

    let angle = block.get_f64_array(section, entry.angle.value_name())?;
    let theory = block.get_f64_array(section, name)?;
    log::trace!("building spline for {name} in section {section}");
    LinearInterpolator::new(angle, theory).map_err(|err| {
        let who = format!("{name} in section {section}");
        Error::context(who, err)
    })
}

fn to_steradian(number_densities: &[f64]) -> Vec<f64> {
    number_densities
        .iter()
        .map(|&n| convert_nz_steradian(n))
        .collect()
}

fn per_bin(values: &[f64], bin: usize, description: &'static str) -> Result<f64, Error> {
    if bin == 0 {
        return Err(Error::noise_parameter(description, bin, values.len()));
    }
    values
        .get(bin - 1)
        .copied()
        .ok_or_else(|| Error::noise_parameter(description, bin, values.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBlock;

    #[test]
    fn steradian_conversion() {
        let expected = 41253.0 * 3600.0 / (4.0 * std::f64::consts::PI);
        assert_eq!(convert_nz_steradian(1.0), expected);
        assert_eq!(convert_nz_steradian(0.0), 0.0);
    }

    #[test]
    fn per_bin_bounds() {
        let values = [1.0, 2.0];
        assert_eq!(per_bin(&values, 1, "x").unwrap(), 1.0);
        assert_eq!(per_bin(&values, 2, "x").unwrap(), 2.0);
        assert!(per_bin(&values, 0, "x").is_err());
        assert!(per_bin(&values, 3, "x").is_err());
    }

    #[test]
    fn missing_noise_parameter_is_an_error() {
        let mut block = InMemoryBlock::new();
        block.put("galaxy_cl", "ell", vec![1.0, 2.0]);
        block.put("galaxy_cl", "bin_2_2", vec![1.0, 2.0]);

        // only one bin worth of noise
        let noise = NoiseParameters {
            number_density_shear_bin: vec![1.0],
            number_density_lss_bin: vec![1.0],
            sigma_e_bin: vec![0.3],
        };
        let mut provider = ObservedSpectrumProvider::new(&noise);
        let gpf = SpectrumType::GalaxyPositionFourier;
        let err = provider.lookup(&block, gpf, gpf, 2, 2, 1.5).unwrap_err();
        assert!(err.to_string().contains("number_density_lss_bin"));
    }

    #[test]
    fn cross_type_gets_no_noise() {
        let mut block = InMemoryBlock::new();
        block.put("galaxy_shear_cl", "ell", vec![1.0, 2.0]);
        block.put("galaxy_shear_cl", "bin_1_1", vec![5.0, 5.0]);

        let noise = NoiseParameters {
            number_density_shear_bin: vec![1.0],
            number_density_lss_bin: vec![1.0],
            sigma_e_bin: vec![0.3],
        };
        let mut provider = ObservedSpectrumProvider::new(&noise);
        let value = provider
            .lookup(
                &block,
                SpectrumType::GalaxyPositionFourier,
                SpectrumType::GalaxyShearEmodeFourier,
                1,
                1,
                1.5,
            )
            .unwrap();
        assert_eq!(value, 5.0);
    }
}
