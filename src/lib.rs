/*!
Extracts angular power spectra ("2-point" measurements) computed by a
cosmology pipeline, resamples them onto a chosen set of multipoles and
assembles the analytic Gaussian covariance matrix between all of them.

<div class="warning">

This is intended for making simulated data vectors. It is not yet fully
battle-tested, so please check the results carefully.

</div>

# Overview

The pipeline leaves its predictions in a section-scoped key/value store,
described by the [`BlockDataStore`] trait. For each of the recognized
observables (see [`RECOGNIZED_SPECTRA`]) that is present:

1. [`spectrum_measurement_from_block`] interpolates every bin-pair of the
   spectrum onto the target ell values and flattens the result into a
   [`SpectrumMeasurement`].
2. [`covmat_from_block`] computes the covariance between every pair of
   spectra. The per-block computation is delegated to a
   [`CovarianceKernel`], which reads noise-augmented spectra through an
   [`ObservedSpectrumProvider`]. Only the upper triangle of blocks is
   computed; the lower triangle is filled in by transposition.

[`export_two_point`] ties these together (plus the n(z) kernels) based on an
[`ExportConfig`].

We only handle Fourier-space spectra (tabulated against `ell`) and only the
trivial "sample" window function.
*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the crates in this package
mod config;
mod covariance;
mod datablock;
mod error;
mod export;
mod interp;
mod nz;
mod observed;
mod spectrum;
mod types;

// pull in symbols that visible outside of the package
pub use config::{ExportConfig, logspace, square_degrees_to_steradians};
pub use covariance::{
    CovarianceKernel, CovarianceMatrixInfo, assemble_covariance, covmat_from_block,
};
pub use datablock::{BlockDataStore, BlockValue, InMemoryBlock};
pub use error::Error;
pub use export::{
    KernelRole, RECOGNIZED_SPECTRA, RecognizedSpectrum, TwoPointExport, export_two_point,
};
pub use interp::LinearInterpolator;
pub use nz::{NumberDensity, nz_from_block};
pub use observed::{
    NoiseParameters, ObservedSpectrumProvider, SplineCache, TheoryLookup, convert_nz_steradian,
};
pub use spectrum::{SpectrumMeasurement, WindowKind, spectrum_measurement_from_block};
pub use types::{AngleKind, SpectrumType, SpectrumTypePair, TypeTableEntry, bin_pairs};
