//! Conversion of the redshift distributions (n(z)) stored in the data store
//! into histogram kernels.

use crate::{BlockDataStore, Error};

/// Per-bin redshift distributions, described as histograms
#[derive(Clone, Debug, PartialEq)]
pub struct NumberDensity {
    pub name: String,
    pub z_low: Vec<f64>,
    pub z_mid: Vec<f64>,
    pub z_high: Vec<f64>,
    /// `nzs[k]` is the distribution of (1-based) bin `k + 1`
    pub nzs: Vec<Vec<f64>>,
}

impl NumberDensity {
    pub fn n_bins(&self) -> usize {
        self.nzs.len()
    }
}

/// Build a [`NumberDensity`] from the n(z) stored in the `nz_name` section.
///
/// The pipeline stores each n(z) as samples of a spline at evenly spaced z.
/// We treat each sample as the left edge of a histogram bin whose width is
/// the spacing of the first two samples. This is only an approximation.
pub fn nz_from_block(block: &impl BlockDataStore, nz_name: &str) -> Result<NumberDensity, Error> {
    log::warn!(
        "converting the n(z) splines in {nz_name} to histograms; this assumes \
         evenly spaced z samples and may not be quite right"
    );

    let z = block.get_f64_array(nz_name, "z")?;
    if z.len() < 2 {
        return Err(Error::context(
            format!("z in section {nz_name}"),
            Error::interpolant_knots("at least two redshift samples are required"),
        ));
    }
    let dz = z[1] - z[0];
    let z_low = z;
    let z_high: Vec<f64> = z_low.iter().map(|zl| zl + dz).collect();
    let z_mid: Vec<f64> = z_low.iter().map(|zl| zl + 0.5 * dz).collect();

    let nbin = block.get_int(nz_name, "nbin")?;
    let nzs = (1..=nbin)
        .map(|i| block.get_f64_array(nz_name, &format!("bin_{i}")))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(NumberDensity {
        name: nz_name.to_string(),
        z_low,
        z_mid,
        z_high,
        nzs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBlock;

    #[test]
    fn histogram_edges() {
        let mut block = InMemoryBlock::new();
        block.put("NZ_SOURCE", "z", vec![0.0, 0.5, 1.0]);
        block.put("NZ_SOURCE", "nbin", 2_i64);
        block.put("NZ_SOURCE", "bin_1", vec![0.0, 1.0, 0.0]);
        block.put("NZ_SOURCE", "bin_2", vec![0.0, 0.5, 1.0]);

        let nz = nz_from_block(&block, "NZ_SOURCE").unwrap();
        assert_eq!(nz.name, "NZ_SOURCE");
        assert_eq!(nz.z_low, vec![0.0, 0.5, 1.0]);
        assert_eq!(nz.z_mid, vec![0.25, 0.75, 1.25]);
        assert_eq!(nz.z_high, vec![0.5, 1.0, 1.5]);
        assert_eq!(nz.n_bins(), 2);
        assert_eq!(nz.nzs[1], vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn missing_bin() {
        let mut block = InMemoryBlock::new();
        block.put("NZ_LENS", "z", vec![0.0, 0.5]);
        block.put("NZ_LENS", "nbin", 2_i64);
        block.put("NZ_LENS", "bin_1", vec![1.0, 1.0]);
        let err = nz_from_block(&block, "NZ_LENS").unwrap_err();
        assert!(err.to_string().contains("bin_2"));
    }

    #[test]
    fn too_few_samples() {
        let mut block = InMemoryBlock::new();
        block.put("NZ_LENS", "z", vec![0.0]);
        block.put("NZ_LENS", "nbin", 0_i64);
        assert!(nz_from_block(&block, "NZ_LENS").is_err());
    }
}
