// We follow the approach of defining a single public Error type that wraps a
// private ErrorKind. Each kind holds a small struct that knows how to format
// itself. This leaves us free to restructure the individual kinds without
// breaking anybody who matches on the public type.
//
// Errors raised deep inside a helper (e.g. the interpolator) don't know which
// section or bin-pair they came from. The caller wraps them with
// `Error::context`, which (for now) flattens the inner error into a string.

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug)]
enum ErrorKind {
    /// An error that occurs when a spectrum's angle axis isn't the multipole
    AngleKind(AngleKindError),
    /// An error that occurs when a covariance kernel returns a block with
    /// the wrong shape
    BlockShape(BlockShapeError),
    /// An error that occurs when a configuration option is missing or invalid
    Config(ConfigError),
    /// An error that wraps another error with information about where it
    /// occurred
    Context(ContextError),
    /// An error that occurs when the ell values to resample onto are unusable
    EllSample(EllSampleError),
    /// An error that occurs when a spectrum would hold no rows
    EmptySpectrum(EmptySpectrumError),
    /// An error that occurs when a covariance is requested for no spectra
    EmptySpectrumList(EmptySpectrumListError),
    /// An error that occurs when an interpolant is evaluated outside of its
    /// knots
    InterpolationDomain(InterpolationDomainError),
    /// An error that occurs when the knots of an interpolant are unusable
    InterpolantKnots(InterpolantKnotsError),
    /// An error that occurs when neither the direct nor the mirrored theory
    /// prediction for a bin-pair can be found
    MissingTheory(MissingTheoryError),
    /// An error that occurs when a value is absent from the data store
    MissingValue(MissingValueError),
    /// An error that occurs when a noise parameter isn't available for a bin
    NoiseParameter(NoiseParameterError),
    /// An error that occurs when none of the recognized spectra are present
    NoSpectra(NoSpectraError),
    /// An error that occurs when a pair of spectrum types has no entry in the
    /// type table
    UnknownTypePair(UnknownTypePairError),
    /// An error that occurs when a data store value has an unexpected type
    ValueType(ValueTypeError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that a spectrum-type pair uses an angle
    /// axis other than `ell`
    pub(crate) fn angle_kind(pair: String, angle_name: &'static str) -> Self {
        Error {
            kind: ErrorKind::AngleKind(AngleKindError { pair, angle_name }),
        }
    }

    /// produce an error indicating that a covariance block has the wrong
    /// shape
    pub(crate) fn block_shape(
        row_name: String,
        col_name: String,
        expected: [usize; 2],
        actual: [usize; 2],
    ) -> Self {
        Error {
            kind: ErrorKind::BlockShape(BlockShapeError {
                row_name,
                col_name,
                expected,
                actual,
            }),
        }
    }

    /// produce an error describing a problem with a configuration option
    pub(crate) fn config(option: &str, what: String) -> Self {
        Error {
            kind: ErrorKind::Config(ConfigError {
                option: option.to_string(),
                what,
            }),
        }
    }

    /// wrap `err` with a description of what was being processed
    pub(crate) fn context(who: String, err: Error) -> Self {
        Error {
            kind: ErrorKind::Context(ContextError {
                who,
                // todo: consider introducing more proper error chaining
                what: err.to_string(),
            }),
        }
    }

    /// produce an error indicating that the ell values that spectra get
    /// resampled onto are unusable
    pub(crate) fn ell_sample(what: &'static str) -> Self {
        Error {
            kind: ErrorKind::EllSample(EllSampleError(what)),
        }
    }

    /// produce an error indicating that the spectrum `name` would hold no rows
    pub(crate) fn empty_spectrum(name: &str) -> Self {
        Error {
            kind: ErrorKind::EmptySpectrum(EmptySpectrumError {
                name: name.to_string(),
            }),
        }
    }

    /// produce an error indicating that a covariance matrix was requested for
    /// an empty list of spectra
    pub(crate) fn empty_spectrum_list() -> Self {
        Error {
            kind: ErrorKind::EmptySpectrumList(EmptySpectrumListError),
        }
    }

    /// produce an error indicating that an interpolant was evaluated outside
    /// of the range spanned by its knots
    pub(crate) fn interpolation_domain(x: f64, min: f64, max: f64) -> Self {
        Error {
            kind: ErrorKind::InterpolationDomain(InterpolationDomainError { x, min, max }),
        }
    }

    /// produce an error indicating that an interpolant can't be built from
    /// the supplied knots
    pub(crate) fn interpolant_knots(what: &'static str) -> Self {
        Error {
            kind: ErrorKind::InterpolantKnots(InterpolantKnotsError(what)),
        }
    }

    /// produce an error indicating that a theory prediction is missing
    pub(crate) fn missing_theory(section: &str, name: String) -> Self {
        Error {
            kind: ErrorKind::MissingTheory(MissingTheoryError {
                section: section.to_string(),
                name,
            }),
        }
    }

    /// produce an error indicating that a value is absent from the store
    pub(crate) fn missing_value(section: &str, name: &str) -> Self {
        Error {
            kind: ErrorKind::MissingValue(MissingValueError {
                section: section.to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// produce an error indicating that a noise parameter isn't available
    /// for a (1-based) bin index
    pub(crate) fn noise_parameter(description: &'static str, bin: usize, available: usize) -> Self {
        Error {
            kind: ErrorKind::NoiseParameter(NoiseParameterError {
                description,
                bin,
                available,
            }),
        }
    }

    /// produce an error indicating that none of the recognized sections
    /// could be found
    pub(crate) fn no_spectra(sections: Vec<&'static str>) -> Self {
        Error {
            kind: ErrorKind::NoSpectra(NoSpectraError { sections }),
        }
    }

    /// produce an error indicating that a pair of types isn't in the type
    /// table
    pub(crate) fn unknown_type_pair(a: &'static str, b: &'static str) -> Self {
        Error {
            kind: ErrorKind::UnknownTypePair(UnknownTypePairError { a, b }),
        }
    }

    /// produce an error indicating that a data store value has the wrong
    /// type
    pub(crate) fn value_type(section: &str, name: &str, expected: &'static str) -> Self {
        Error {
            kind: ErrorKind::ValueType(ValueTypeError {
                section: section.to_string(),
                name: name.to_string(),
                expected,
            }),
        }
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for ErrorKind {}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::AngleKind(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::BlockShape(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::Config(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::Context(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::EllSample(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::EmptySpectrum(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::EmptySpectrumList(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::InterpolationDomain(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::InterpolantKnots(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::MissingTheory(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::MissingValue(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::NoiseParameter(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::NoSpectra(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::UnknownTypePair(ref err) => core::fmt::Display::fmt(err, f),
            ErrorKind::ValueType(ref err) => core::fmt::Display::fmt(err, f),
        }
    }
}

/// An error that occurs when a spectrum's angle axis isn't the multipole
///
/// Gaussian covariances (and the resampling onto `ell_sample`) are currently
/// only written for C_ell, not for real-space 2pt functions.
#[derive(Clone, Debug)]
struct AngleKindError {
    pair: String,
    angle_name: &'static str,
}

impl std::error::Error for AngleKindError {}

impl core::fmt::Display for AngleKindError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} is tabulated against \"{}\"; only C_ell spectra (tabulated \
             against \"ell\") are supported",
            self.pair, self.angle_name
        )
    }
}

/// An error that occurs when a covariance kernel returns a block with the
/// wrong shape
#[derive(Clone, Debug)]
struct BlockShapeError {
    row_name: String,
    col_name: String,
    expected: [usize; 2],
    actual: [usize; 2],
}

impl std::error::Error for BlockShapeError {}

impl core::fmt::Display for BlockShapeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "the covariance block between {} and {} has shape {:?}. It \
             should have shape {:?}",
            self.row_name, self.col_name, self.actual, self.expected
        )
    }
}

#[derive(Clone, Debug)]
struct ConfigError {
    option: String,
    what: String,
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let option = self.option.as_str();
        let what = self.what.as_str();
        write!(f, "problem with the \"{option}\" option: {what}")
    }
}

#[derive(Clone, Debug)]
struct ContextError {
    who: String,
    // TODO we probably want to handle this more carefully (the proper thing
    // to do is to probably chain errors)
    what: String,
}

impl std::error::Error for ContextError {}

impl core::fmt::Display for ContextError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let who = self.who.as_str();
        let what = self.what.as_str();
        write!(f, "problem with {who}: {what}")
    }
}

#[derive(Clone, Debug)]
struct EllSampleError(&'static str);

impl std::error::Error for EllSampleError {}

impl core::fmt::Display for EllSampleError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid ell_sample: {}", self.0)
    }
}

#[derive(Clone, Debug)]
struct EmptySpectrumError {
    name: String,
}

impl std::error::Error for EmptySpectrumError {}

impl core::fmt::Display for EmptySpectrumError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} would have no rows. Every spectrum needs at least one bin pair \
             and one sample angle",
            self.name
        )
    }
}

#[derive(Clone, Debug)]
struct EmptySpectrumListError;

impl std::error::Error for EmptySpectrumListError {}

impl core::fmt::Display for EmptySpectrumListError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let msg = "can't assemble a covariance matrix from an empty list of spectra";
        f.write_str(msg)
    }
}

#[derive(Clone, Debug)]
struct InterpolationDomainError {
    x: f64,
    min: f64,
    max: f64,
}

impl std::error::Error for InterpolationDomainError {}

impl core::fmt::Display for InterpolationDomainError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "can't interpolate at {}. The value should be no less than {} and \
             not exceed {} (extrapolation isn't supported)",
            self.x, self.min, self.max
        )
    }
}

#[derive(Clone, Debug)]
struct InterpolantKnotsError(&'static str);

impl std::error::Error for InterpolantKnotsError {}

impl core::fmt::Display for InterpolantKnotsError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// An error that occurs when neither the direct nor the mirrored theory
/// prediction for a bin-pair can be found
#[derive(Clone, Debug)]
struct MissingTheoryError {
    section: String,
    name: String,
}

impl std::error::Error for MissingTheoryError {}

impl core::fmt::Display for MissingTheoryError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "could not find theory prediction {} in section {}",
            self.name, self.section
        )
    }
}

#[derive(Clone, Debug)]
struct MissingValueError {
    section: String,
    name: String,
}

impl std::error::Error for MissingValueError {}

impl core::fmt::Display for MissingValueError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "no value \"{}\" in section \"{}\"",
            self.name, self.section
        )
    }
}

#[derive(Clone, Debug)]
struct NoiseParameterError {
    description: &'static str,
    bin: usize,
    available: usize,
}

impl std::error::Error for NoiseParameterError {}

impl core::fmt::Display for NoiseParameterError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} is needed for bin {}, but values were only provided for {} \
             bin(s)",
            self.description, self.bin, self.available
        )
    }
}

#[derive(Clone, Debug)]
struct NoSpectraError {
    sections: Vec<&'static str>,
}

impl std::error::Error for NoSpectraError {}

impl core::fmt::Display for NoSpectraError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "couldn't find any of the sections {:?}, so there is nothing to save",
            self.sections
        )
    }
}

#[derive(Clone, Debug)]
struct UnknownTypePairError {
    a: &'static str,
    b: &'static str,
}

impl std::error::Error for UnknownTypePairError {}

impl core::fmt::Display for UnknownTypePairError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "there is no known data store layout for spectra of type ({}, {})",
            self.a, self.b
        )
    }
}

#[derive(Clone, Debug)]
struct ValueTypeError {
    section: String,
    name: String,
    expected: &'static str,
}

impl std::error::Error for ValueTypeError {}

impl core::fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "\"{}\" in section \"{}\" should be {}",
            self.name, self.section, self.expected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_includes_inner_message() {
        let inner = Error::missing_theory("shear_cl", "bin_2_1".to_string());
        let err = Error::context("shear_cl (1, 2)".to_string(), inner);
        let msg = err.to_string();
        assert!(msg.starts_with("problem with shear_cl (1, 2)"));
        assert!(msg.contains("bin_2_1"));
    }
}
