//! Describes the kinds of 2-point measurements we know about and where their
//! theory predictions live inside the data store.

use crate::Error;

/// A kind of correlation observable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpectrumType {
    GalaxyShearEmodeFourier,
    GalaxyShearBmodeFourier,
    GalaxyPositionFourier,
    GalaxyShearPlusReal,
    GalaxyShearMinusReal,
    GalaxyPositionReal,
}

impl SpectrumType {
    pub fn name(&self) -> &'static str {
        match self {
            SpectrumType::GalaxyShearEmodeFourier => "galaxy_shear_emode_fourier",
            SpectrumType::GalaxyShearBmodeFourier => "galaxy_shear_bmode_fourier",
            SpectrumType::GalaxyPositionFourier => "galaxy_position_fourier",
            SpectrumType::GalaxyShearPlusReal => "galaxy_shear_plus_real",
            SpectrumType::GalaxyShearMinusReal => "galaxy_shear_minus_real",
            SpectrumType::GalaxyPositionReal => "galaxy_position_real",
        }
    }

    /// the short code used to label this type in output files
    pub fn code(&self) -> &'static str {
        match self {
            SpectrumType::GalaxyShearEmodeFourier => "GEF",
            SpectrumType::GalaxyShearBmodeFourier => "GBF",
            SpectrumType::GalaxyPositionFourier => "GPF",
            SpectrumType::GalaxyShearPlusReal => "G+R",
            SpectrumType::GalaxyShearMinusReal => "G-R",
            SpectrumType::GalaxyPositionReal => "GPR",
        }
    }
}

/// The variable that a spectrum is tabulated against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AngleKind {
    /// multipole
    Ell,
    /// angular separation
    Theta,
}

impl AngleKind {
    /// the name of the data store value holding the native angle grid
    pub fn value_name(&self) -> &'static str {
        match self {
            AngleKind::Ell => "ell",
            AngleKind::Theta => "theta",
        }
    }
}

/// Where the theory predictions for a [`SpectrumTypePair`] are stored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeTableEntry {
    pub section: &'static str,
    pub angle: AngleKind,
    /// prefix of the value-name template `{prefix}_{i}_{j}`
    prefix: &'static str,
}

impl TypeTableEntry {
    /// Instantiate the value-name template for the (1-based) bins `i` and `j`.
    pub fn value_name(&self, i: usize, j: usize) -> String {
        format!("{}_{}_{}", self.prefix, i, j)
    }
}

/// The pair of observables (A, B) that a spectrum correlates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpectrumTypePair {
    pub a: SpectrumType,
    pub b: SpectrumType,
}

impl SpectrumTypePair {
    pub fn new(a: SpectrumType, b: SpectrumType) -> Self {
        SpectrumTypePair { a, b }
    }

    /// auto-correlations only store one triangle of bin pairs
    pub fn is_auto(&self) -> bool {
        self.a == self.b
    }

    /// Look up where this pair lives in the data store.
    pub fn table_entry(&self) -> Result<TypeTableEntry, Error> {
        use AngleKind::{Ell, Theta};
        use SpectrumType::*;

        let (section, angle, prefix) = match (self.a, self.b) {
            (GalaxyShearEmodeFourier, GalaxyShearEmodeFourier) => ("shear_cl", Ell, "bin"),
            (GalaxyShearBmodeFourier, GalaxyShearBmodeFourier) => ("shear_cl_bb", Ell, "bin"),
            (GalaxyPositionFourier, GalaxyShearEmodeFourier) => ("galaxy_shear_cl", Ell, "bin"),
            (GalaxyPositionFourier, GalaxyPositionFourier) => ("galaxy_cl", Ell, "bin"),
            (GalaxyPositionReal, GalaxyPositionReal) => ("galaxy_xi", Theta, "bin"),
            (GalaxyShearPlusReal, GalaxyShearPlusReal) => ("shear_xi", Theta, "xiplus"),
            (GalaxyShearMinusReal, GalaxyShearMinusReal) => ("shear_xi", Theta, "ximinus"),
            (GalaxyPositionReal, GalaxyShearPlusReal) => ("galaxy_shear_xi", Theta, "bin"),
            (a, b) => return Err(Error::unknown_type_pair(a.name(), b.name())),
        };
        Ok(TypeTableEntry {
            section,
            angle,
            prefix,
        })
    }

    /// Like [`Self::table_entry`], but also requires that the spectrum is
    /// tabulated against `ell`.
    pub(crate) fn fourier_table_entry(&self) -> Result<TypeTableEntry, Error> {
        let entry = self.table_entry()?;
        if entry.angle != AngleKind::Ell {
            Err(Error::angle_kind(
                self.to_string(),
                entry.angle.value_name(),
            ))
        } else {
            Ok(entry)
        }
    }
}

impl core::fmt::Display for SpectrumTypePair {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "({}, {})", self.a.code(), self.b.code())
    }
}

/// Enumerate the (1-based) bin pairs of a spectrum.
///
/// For an auto-correlation (`nbin_b` is `None`), we only visit `j <= i`.
/// Otherwise, we visit the full `nbin_a x nbin_b` grid. In both cases, `i`
/// varies slowest. Pairs are produced lazily, so a bogus bin count costs
/// nothing until the pairs are actually visited.
pub fn bin_pairs(nbin_a: usize, nbin_b: Option<usize>) -> impl Iterator<Item = (usize, usize)> {
    (1..=nbin_a).flat_map(move |i| (1..=nbin_b.unwrap_or(i)).map(move |j| (i, j)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_pair_counts() {
        for n in 0..6 {
            assert_eq!(bin_pairs(n, None).count(), n * (n + 1) / 2);
            for m in 0..4 {
                assert_eq!(bin_pairs(n, Some(m)).count(), n * m);
            }
        }
    }

    #[test]
    fn bin_pair_order() {
        let auto: Vec<_> = bin_pairs(3, None).collect();
        assert_eq!(auto, [(1, 1), (2, 1), (2, 2), (3, 1), (3, 2), (3, 3)]);
        let cross: Vec<_> = bin_pairs(2, Some(2)).collect();
        assert_eq!(cross, [(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn huge_bin_count() {
        let mut pairs = bin_pairs(usize::MAX, None);
        assert_eq!(pairs.next(), Some((1, 1)));
        assert_eq!(pairs.next(), Some((2, 1)));
        assert_eq!(pairs.next(), Some((2, 2)));

        let mut pairs = bin_pairs(usize::MAX, Some(usize::MAX));
        assert_eq!(pairs.nth(2), Some((1, 3)));
    }

    #[test]
    fn table_lookup() {
        use SpectrumType::*;
        let shear = SpectrumTypePair::new(GalaxyShearEmodeFourier, GalaxyShearEmodeFourier);
        let entry = shear.fourier_table_entry().unwrap();
        assert_eq!(entry.section, "shear_cl");
        assert_eq!(entry.value_name(2, 1), "bin_2_1");
        assert!(shear.is_auto());

        let ggl = SpectrumTypePair::new(GalaxyPositionFourier, GalaxyShearEmodeFourier);
        assert_eq!(ggl.table_entry().unwrap().section, "galaxy_shear_cl");
        assert!(!ggl.is_auto());

        // ordering within the pair matters
        let reversed = SpectrumTypePair::new(GalaxyShearEmodeFourier, GalaxyPositionFourier);
        assert!(reversed.table_entry().is_err());
    }

    #[test]
    fn real_space_is_not_fourier() {
        use SpectrumType::*;
        let xip = SpectrumTypePair::new(GalaxyShearPlusReal, GalaxyShearPlusReal);
        let entry = xip.table_entry().unwrap();
        assert_eq!(entry.angle, AngleKind::Theta);
        assert_eq!(entry.value_name(1, 1), "xiplus_1_1");

        let err = xip.fourier_table_entry().unwrap_err();
        assert!(err.to_string().contains("theta"));
    }
}
