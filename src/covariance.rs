//! Assembly of the full covariance matrix across several spectra.
//!
//! The covariance is made up of `S x S` blocks, where `S` is the number of
//! spectra. Block `(s, t)` holds the covariance between every row of spectrum
//! `s` and every row of spectrum `t`. We delegate the computation of each
//! block to a [`CovarianceKernel`]. Since the total covariance is symmetric,
//! block `(t, s)` is exactly the transpose of block `(s, t)`: we only invoke
//! the kernel for `s <= t` and fill in the rest by transposition (this also
//! guarantees that the assembled matrix is exactly symmetric).

use ndarray::{Array2, ArrayView2, s};

use crate::{
    BlockDataStore, Error, NoiseParameters, ObservedSpectrumProvider, SpectrumMeasurement,
    TheoryLookup,
};

/// Computes a single block of the covariance matrix.
///
/// Implementors evaluate the observed spectra through `lookup`, which must be
/// passed `block` as its data store. The returned matrix must have shape
/// `[ab.len(), cd.len()]`.
pub trait CovarianceKernel {
    fn compute_block(
        &self,
        sky_area: f64,
        lookup: &mut dyn TheoryLookup,
        block: &dyn BlockDataStore,
        ab: &SpectrumMeasurement,
        cd: &SpectrumMeasurement,
    ) -> Result<Array2<f64>, Error>;
}

impl<F> CovarianceKernel for F
where
    F: Fn(
        f64,
        &mut dyn TheoryLookup,
        &dyn BlockDataStore,
        &SpectrumMeasurement,
        &SpectrumMeasurement,
    ) -> Result<Array2<f64>, Error>,
{
    fn compute_block(
        &self,
        sky_area: f64,
        lookup: &mut dyn TheoryLookup,
        block: &dyn BlockDataStore,
        ab: &SpectrumMeasurement,
        cd: &SpectrumMeasurement,
    ) -> Result<Array2<f64>, Error> {
        self(sky_area, lookup, block, ab, cd)
    }
}

/// A covariance matrix along with the bookkeeping describing which rows
/// belong to which spectrum
#[derive(Clone, Debug)]
pub struct CovarianceMatrixInfo {
    pub name: String,
    pub names: Vec<String>,
    pub starts: Vec<usize>,
    pub lengths: Vec<usize>,
    pub covmat: Array2<f64>,
}

impl CovarianceMatrixInfo {
    /// the number of spectra described by the matrix
    pub fn n_spectra(&self) -> usize {
        self.names.len()
    }

    /// Get a view of the block holding the covariance between spectra `s` and
    /// `t`.
    pub fn block(&self, s: usize, t: usize) -> ArrayView2<'_, f64> {
        let (r0, r1) = (self.starts[s], self.starts[s] + self.lengths[s]);
        let (c0, c1) = (self.starts[t], self.starts[t] + self.lengths[t]);
        self.covmat.slice(s![r0..r1, c0..c1])
    }
}

/// Build the covariance matrix for `spectra`, using a fresh
/// [`ObservedSpectrumProvider`] configured with `noise`.
///
/// `sky_area` is in steradians.
pub fn covmat_from_block<B: BlockDataStore>(
    block: &B,
    spectra: &[SpectrumMeasurement],
    sky_area: f64,
    noise: &NoiseParameters,
    kernel: &impl CovarianceKernel,
) -> Result<CovarianceMatrixInfo, Error> {
    let mut provider = ObservedSpectrumProvider::new(noise);
    assemble_covariance(block, spectra, sky_area, &mut provider, kernel)
}

/// Build the covariance matrix for `spectra`, reading observed spectra
/// through `provider`.
pub fn assemble_covariance<B: BlockDataStore>(
    block: &B,
    spectra: &[SpectrumMeasurement],
    sky_area: f64,
    provider: &mut ObservedSpectrumProvider,
    kernel: &impl CovarianceKernel,
) -> Result<CovarianceMatrixInfo, Error> {
    if spectra.is_empty() {
        return Err(Error::empty_spectrum_list());
    }
    // every spectrum must occupy at least one row, so that the offsets are
    // strictly increasing
    if let Some(empty) = spectra.iter().find(|spectrum| spectrum.is_empty()) {
        return Err(Error::empty_spectrum(&empty.name));
    }

    let mut names = Vec::with_capacity(spectra.len());
    let mut starts = Vec::with_capacity(spectra.len());
    let mut lengths = Vec::with_capacity(spectra.len());
    let mut x = 0;
    for spectrum in spectra {
        names.push(spectrum.name.clone());
        starts.push(x);
        lengths.push(spectrum.len());
        x += spectrum.len();
    }

    // upper[s][t - s] holds block (s, t) for t >= s
    let mut upper: Vec<Vec<Array2<f64>>> = Vec::with_capacity(spectra.len());
    for (s, ab) in spectra.iter().enumerate() {
        let mut row = Vec::with_capacity(spectra.len() - s);
        for (t, cd) in spectra.iter().enumerate().skip(s) {
            log::debug!(
                "computing covariance between {} and {} (s={}, t={})",
                ab.name,
                cd.name,
                s,
                t
            );
            let m = kernel.compute_block(sky_area, &mut *provider, block, ab, cd)?;
            let expected = [ab.len(), cd.len()];
            let actual = [m.nrows(), m.ncols()];
            if actual != expected {
                return Err(Error::block_shape(
                    ab.name.clone(),
                    cd.name.clone(),
                    expected,
                    actual,
                ));
            }
            row.push(m);
        }
        upper.push(row);
    }

    // stitch the blocks together. Block (s, t) lands at rows
    // starts[s]..starts[s]+lengths[s] and the analogous columns; this is
    // equivalent to horizontally stacking each row of blocks and then
    // vertically stacking the rows
    let mut covmat = Array2::<f64>::zeros((x, x));
    for s in 0..spectra.len() {
        for t in 0..spectra.len() {
            let rows = starts[s]..(starts[s] + lengths[s]);
            let cols = starts[t]..(starts[t] + lengths[t]);
            let mut dest = covmat.slice_mut(s![rows, cols]);
            if s <= t {
                dest.assign(&upper[s][t - s]);
            } else {
                // the lower triangle is the transpose of the upper one
                dest.assign(&upper[t][s - t].t());
            }
        }
    }

    log::info!(
        "assembled a {x}x{x} covariance matrix from {} spectra",
        spectra.len()
    );

    Ok(CovarianceMatrixInfo {
        name: "COVMAT".to_string(),
        names,
        starts,
        lengths,
        covmat,
    })
}
