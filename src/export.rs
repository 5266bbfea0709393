//! Drives a full export: find the spectra present in the data store,
//! resample them, build their covariance and collect the n(z) kernels.
//!
//! Writing the results to disk is left to the caller.

use crate::{
    BlockDataStore, CovarianceKernel, CovarianceMatrixInfo, Error, ExportConfig, NumberDensity,
    SpectrumMeasurement, SpectrumType, SpectrumTypePair, covmat_from_block, nz_from_block,
    spectrum_measurement_from_block,
};

/// Identifies which of the configured n(z) kernels a side of a spectrum uses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelRole {
    Shear,
    Position,
}

impl KernelRole {
    fn nz_name<'a>(&self, config: &'a ExportConfig) -> &'a str {
        match self {
            KernelRole::Shear => &config.shear_nz,
            KernelRole::Position => &config.position_nz,
        }
    }
}

/// An observable that we know how to export
#[derive(Clone, Copy, Debug)]
pub struct RecognizedSpectrum {
    pub section: &'static str,
    pub types: SpectrumTypePair,
    pub kernels: (KernelRole, KernelRole),
}

/// The observables we look for, in the order they are exported
pub static RECOGNIZED_SPECTRA: [RecognizedSpectrum; 3] = [
    RecognizedSpectrum {
        section: "shear_cl",
        types: SpectrumTypePair {
            a: SpectrumType::GalaxyShearEmodeFourier,
            b: SpectrumType::GalaxyShearEmodeFourier,
        },
        kernels: (KernelRole::Shear, KernelRole::Shear),
    },
    RecognizedSpectrum {
        section: "galaxy_shear_cl",
        types: SpectrumTypePair {
            a: SpectrumType::GalaxyPositionFourier,
            b: SpectrumType::GalaxyShearEmodeFourier,
        },
        kernels: (KernelRole::Position, KernelRole::Shear),
    },
    RecognizedSpectrum {
        section: "galaxy_cl",
        types: SpectrumTypePair {
            a: SpectrumType::GalaxyPositionFourier,
            b: SpectrumType::GalaxyPositionFourier,
        },
        kernels: (KernelRole::Position, KernelRole::Position),
    },
];

/// Everything that goes into a 2-point output file
#[derive(Clone, Debug)]
pub struct TwoPointExport {
    pub spectra: Vec<SpectrumMeasurement>,
    pub kernels: Vec<NumberDensity>,
    /// we don't support window functions, so this is always empty
    pub windows: Vec<String>,
    pub covmat_info: CovarianceMatrixInfo,
    pub filename: String,
    pub clobber: bool,
}

/// Produce all of the 2-point data for the spectra found in `block`.
pub fn export_two_point<B: BlockDataStore>(
    block: &B,
    config: &ExportConfig,
    kernel: &impl CovarianceKernel,
) -> Result<TwoPointExport, Error> {
    log::info!("preparing two-point data for {}", config.filename);

    let present: Vec<&RecognizedSpectrum> = RECOGNIZED_SPECTRA
        .iter()
        .filter(|recognized| block.has_section(recognized.section))
        .collect();

    if present.is_empty() {
        let sections = RECOGNIZED_SPECTRA.iter().map(|r| r.section).collect();
        return Err(Error::no_spectra(sections));
    }

    let mut spectra = Vec::with_capacity(present.len());
    for recognized in present.iter() {
        let kernels = (
            recognized.kernels.0.nz_name(config),
            recognized.kernels.1.nz_name(config),
        );
        let spectrum = spectrum_measurement_from_block(
            block,
            recognized.section,
            recognized.section,
            recognized.types,
            kernels,
            &config.ell_sample,
        )?;
        log::info!(" - saving {}", recognized.section);
        spectra.push(spectrum);
    }

    let covmat_info =
        covmat_from_block(block, &spectra, config.survey_area, &config.noise, kernel)?;

    let uses = |role: KernelRole| {
        present
            .iter()
            .any(|r| r.kernels.0 == role || r.kernels.1 == role)
    };
    let mut kernels = Vec::new();
    if uses(KernelRole::Shear) {
        kernels.push(nz_from_block(block, &config.shear_nz)?);
    }
    if uses(KernelRole::Position) && (config.position_nz != config.shear_nz) {
        kernels.push(nz_from_block(block, &config.position_nz)?);
    }

    Ok(TwoPointExport {
        spectra,
        kernels,
        windows: Vec::new(),
        covmat_info,
        filename: config.filename.clone(),
        clobber: config.clobber,
    })
}
