// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

// not every test file uses every helper
#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use ndarray::Array2;
use twopt_export::{
    BlockDataStore, BlockValue, CovarianceKernel, Error, InMemoryBlock, SpectrumMeasurement,
    TheoryLookup,
};

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

/// the native ell grid used by [`synthetic_block`] (roughly 3 to 11000)
pub fn native_ell() -> Vec<f64> {
    (0..60).map(|k| 10f64.powf(0.5 + 0.06 * (k as f64))).collect()
}

/// a smooth, bin-dependent toy spectrum
pub fn toy_cl(amplitude: f64, i: usize, j: usize, ell: &[f64]) -> Vec<f64> {
    let scale = amplitude * (1.0 + 0.1 * (i as f64) + 0.01 * (j as f64));
    ell.iter().map(|l| scale / (l + 10.0)).collect()
}

/// Build a data store resembling the pipeline's output.
///
/// Auto-spectra only hold the `j <= i` triangle. `galaxy_shear_cl` is only
/// included if `with_cross` is true. A spectrum with 0 bins is omitted.
pub fn synthetic_block(nbin_shear: usize, nbin_lss: usize, with_cross: bool) -> InMemoryBlock {
    let ell = native_ell();
    let mut block = InMemoryBlock::new();

    if nbin_shear > 0 {
        block.put("shear_cl", "nbin", nbin_shear as i64);
        block.put("shear_cl", "ell", ell.clone());
        for i in 1..=nbin_shear {
            for j in 1..=i {
                let name = format!("bin_{i}_{j}");
                block.put("shear_cl", &name, toy_cl(1e-7, i, j, &ell));
            }
        }
        add_nz(&mut block, "NZ_SOURCE", nbin_shear);
    }

    if nbin_lss > 0 {
        block.put("galaxy_cl", "nbin", nbin_lss as i64);
        block.put("galaxy_cl", "ell", ell.clone());
        for i in 1..=nbin_lss {
            for j in 1..=i {
                let name = format!("bin_{i}_{j}");
                block.put("galaxy_cl", &name, toy_cl(1e-5, i, j, &ell));
            }
        }
        add_nz(&mut block, "NZ_LENS", nbin_lss);
    }

    if with_cross {
        block.put("galaxy_shear_cl", "nbin_a", nbin_lss as i64);
        block.put("galaxy_shear_cl", "nbin_b", nbin_shear as i64);
        block.put("galaxy_shear_cl", "ell", ell.clone());
        for i in 1..=nbin_lss {
            for j in 1..=nbin_shear {
                let name = format!("bin_{i}_{j}");
                block.put("galaxy_shear_cl", &name, toy_cl(1e-6, i, j, &ell));
            }
        }
    }

    block
}

fn add_nz(block: &mut InMemoryBlock, section: &str, nbin: usize) {
    let z: Vec<f64> = (0..20).map(|k| 0.1 * (k as f64)).collect();
    block.put(section, "nbin", nbin as i64);
    for i in 1..=nbin {
        let center = 0.3 * (i as f64);
        let nz: Vec<f64> = z.iter().map(|zz| (-(zz - center).powi(2)).exp()).collect();
        block.put(section, &format!("bin_{i}"), nz);
    }
    block.put(section, "z", z);
}

/// Wraps a data store and counts how often it is accessed
pub struct CountingBlock<B> {
    pub inner: B,
    pub value_checks: Cell<usize>,
    pub reads: Cell<usize>,
}

impl<B> CountingBlock<B> {
    pub fn new(inner: B) -> Self {
        CountingBlock {
            inner,
            value_checks: Cell::new(0),
            reads: Cell::new(0),
        }
    }
}

impl<B: BlockDataStore> BlockDataStore for CountingBlock<B> {
    fn has_section(&self, section: &str) -> bool {
        self.inner.has_section(section)
    }

    fn has_value(&self, section: &str, name: &str) -> bool {
        self.value_checks.set(self.value_checks.get() + 1);
        self.inner.has_value(section, name)
    }

    fn get(&self, section: &str, name: &str) -> Result<BlockValue, Error> {
        self.reads.set(self.reads.get() + 1);
        self.inner.get(section, name)
    }
}

/// evaluate the observed value of every row of `spectrum`
pub fn observed_rows(
    lookup: &mut dyn TheoryLookup,
    block: &dyn BlockDataStore,
    spectrum: &SpectrumMeasurement,
) -> Result<Vec<f64>, Error> {
    (0..spectrum.len())
        .map(|r| {
            lookup.lookup(
                block,
                spectrum.types.a,
                spectrum.types.b,
                spectrum.bin1[r],
                spectrum.bin2[r],
                spectrum.angle[r],
            )
        })
        .collect()
}

/// A stand-in for the Gaussian covariance kernel.
///
/// Entry `(r, c)` of a block is the product of the observed values of row
/// `r` of the first spectrum and row `c` of the second, divided by the sky
/// area. Every invocation is recorded.
#[derive(Default)]
pub struct ProductKernel {
    pub calls: RefCell<Vec<(String, String)>>,
}

impl CovarianceKernel for ProductKernel {
    fn compute_block(
        &self,
        sky_area: f64,
        lookup: &mut dyn TheoryLookup,
        block: &dyn BlockDataStore,
        ab: &SpectrumMeasurement,
        cd: &SpectrumMeasurement,
    ) -> Result<Array2<f64>, Error> {
        self.calls
            .borrow_mut()
            .push((ab.name.clone(), cd.name.clone()));
        let x = observed_rows(lookup, block, ab)?;
        let y = observed_rows(lookup, block, cd)?;
        let out = Array2::from_shape_fn((x.len(), y.len()), |(r, c)| x[r] * y[c] / sky_area);
        Ok(out)
    }
}
