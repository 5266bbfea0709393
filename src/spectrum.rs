//! Extraction of 2-point measurements from the data store.
//!
//! The pipeline tabulates each bin-pair's theory prediction on its own
//! (native) ell grid. We resample every bin-pair onto a caller-specified
//! grid, `ell_sample`, and flatten the result into the "long vector" layout
//! used by 2-point output files: one row per (bin1, bin2, angular_bin) tuple.

use crate::{
    BlockDataStore, Error, LinearInterpolator, SpectrumTypePair,
    types::{TypeTableEntry, bin_pairs},
};

/// The window function associated with a measurement.
///
/// At the moment we only support sampling the spectrum at the given angles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowKind {
    Sample,
}

impl WindowKind {
    pub fn name(&self) -> &'static str {
        match self {
            WindowKind::Sample => "SAMPLE",
        }
    }
}

/// A flattened 2-point measurement.
///
/// All of the per-row vectors (`bin1`, `bin2`, `angular_bin`, `value`,
/// `angle`) have the same length, which is the number of bin pairs times the
/// number of sample angles. Bin indices are 1-based.
#[derive(Clone, Debug)]
pub struct SpectrumMeasurement {
    pub name: String,
    pub types: SpectrumTypePair,
    /// names of the n(z) kernels associated with each side of the pair
    pub kernels: (String, String),
    pub windows: WindowKind,
    pub bin1: Vec<usize>,
    pub bin2: Vec<usize>,
    pub angular_bin: Vec<usize>,
    pub value: Vec<f64>,
    pub angle: Vec<f64>,
}

impl SpectrumMeasurement {
    /// the number of rows in the measurement
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// the distinct bin pairs, in the order they appear
    pub fn bin_pairs(&self) -> Vec<(usize, usize)> {
        let mut out: Vec<(usize, usize)> = Vec::new();
        for pair in self.bin1.iter().copied().zip(self.bin2.iter().copied()) {
            if out.last() != Some(&pair) {
                out.push(pair);
            }
        }
        out
    }

    /// Get the `(angle, value)` slices for the rows of bin pair `(i, j)`.
    ///
    /// Returns `None` if the pair isn't part of the measurement.
    pub fn get_pair(&self, i: usize, j: usize) -> Option<(&[f64], &[f64])> {
        let start = (0..self.len()).find(|&k| self.bin1[k] == i && self.bin2[k] == j)?;
        let stop = (start..self.len())
            .find(|&k| self.bin1[k] != i || self.bin2[k] != j)
            .unwrap_or(self.len());
        Some((&self.angle[start..stop], &self.value[start..stop]))
    }
}

/// Build a [`SpectrumMeasurement`] by resampling the spectrum stored in
/// `section` onto `ell_sample`.
///
/// `ell_sample` must be strictly increasing and lie entirely within the
/// native ell grid; we never extrapolate. A spectrum without any bin pairs
/// or sample angles is an error.
pub fn spectrum_measurement_from_block(
    block: &impl BlockDataStore,
    section: &str,
    output_name: &str,
    types: SpectrumTypePair,
    kernels: (&str, &str),
    ell_sample: &[f64],
) -> Result<SpectrumMeasurement, Error> {
    let entry = types.fourier_table_entry()?;
    if let Err(err) = check_ell_sample(ell_sample) {
        return Err(Error::context(format!("resampling {section}"), err));
    }

    // for cross correlations we must save bin_ji as well as bin_ij, and the
    // numbers of bins can differ
    let (nbin_a, nbin_b) = if types.is_auto() {
        (block.get_int(section, "nbin")?, None)
    } else {
        let nbin_a = block.get_int(section, "nbin_a")?;
        let nbin_b = block.get_int(section, "nbin_b")?;
        (nbin_a, Some(nbin_b))
    };
    if nbin_a == 0 || nbin_b == Some(0) || ell_sample.is_empty() {
        return Err(Error::empty_spectrum(section));
    }

    // the ell values computed by the pipeline (not to be confused with
    // ell_sample)
    let ell = block.get_f64_array(section, entry.angle.value_name())?;

    let n_sample = ell_sample.len();
    let mut out = SpectrumMeasurement {
        name: output_name.to_string(),
        types,
        kernels: (kernels.0.to_string(), kernels.1.to_string()),
        windows: WindowKind::Sample,
        bin1: Vec::new(),
        bin2: Vec::new(),
        angular_bin: Vec::new(),
        value: Vec::new(),
        angle: Vec::new(),
    };

    for (i, j) in bin_pairs(nbin_a, nbin_b) {
        let resampled = resample_pair(block, section, &entry, &ell, i, j, ell_sample)?;
        out.bin1.extend(std::iter::repeat_n(i, n_sample));
        out.bin2.extend(std::iter::repeat_n(j, n_sample));
        out.angular_bin.extend(0..n_sample);
        out.value.extend(resampled);
        out.angle.extend_from_slice(ell_sample);
    }

    log::debug!(
        "resampled {} onto {} ell values ({} rows)",
        section,
        n_sample,
        out.len()
    );
    Ok(out)
}

fn check_ell_sample(ell_sample: &[f64]) -> Result<(), Error> {
    if ell_sample.iter().any(|ell| !ell.is_finite()) {
        Err(Error::ell_sample("every value must be finite"))
    } else if ell_sample.windows(2).any(|pair| pair[1] <= pair[0]) {
        Err(Error::ell_sample("the values must be strictly increasing"))
    } else {
        Ok(())
    }
}

fn resample_pair(
    block: &impl BlockDataStore,
    section: &str,
    entry: &TypeTableEntry,
    ell: &[f64],
    i: usize,
    j: usize,
    ell_sample: &[f64],
) -> Result<Vec<f64>, Error> {
    let name = entry.value_name(i, j);
    let cl = block.get_f64_array(section, &name)?;
    let wrap = |err| Error::context(format!("{name} in section {section}"), err);
    LinearInterpolator::new(ell.to_vec(), cl)
        .and_then(|interp| interp.eval_many(ell_sample))
        .map_err(wrap)
}
