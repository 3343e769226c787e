//! Section-address bookkeeping: deriving the four section starts and
//! `ENDofTable` from the four per-section counts, and enforcing the
//! 512-word LUT capacity.

use crate::hal::CanAfHal;
use crate::mode::FilterMode;
use crate::LUT_WORDS;

/// The four per-section entry counts. This is the single source of truth
/// for geometry; the section-address registers are derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub std: u16,
    pub std_grp: u16,
    pub ext: u16,
    pub ext_grp: u16,
}

/// The five section-address register values derived from a [`Counts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub sff_sa: u32,
    pub sff_grp_sa: u32,
    pub eff_sa: u32,
    pub eff_grp_sa: u32,
    pub end_of_table: u32,
}

impl Geometry {
    /// Derives the section layout from the current counts, per the
    /// invariant `SFF_sa == 0`, `SFF_GRP_sa == SFF_sa +
    /// ceil(stdCount/2)*4`, `EFF_sa == SFF_GRP_sa + stdGrpCount*4`,
    /// `EFF_GRP_sa == EFF_sa + extCount*4`, `ENDofTable == EFF_GRP_sa +
    /// extGrpCount*8`.
    #[must_use]
    pub const fn from_counts(counts: Counts) -> Self {
        let sff_sa = 0;
        let sff_grp_sa = sff_sa + (counts.std as u32 + 1) / 2 * 4;
        let eff_sa = sff_grp_sa + counts.std_grp as u32 * 4;
        let eff_grp_sa = eff_sa + counts.ext as u32 * 4;
        let end_of_table = eff_grp_sa + counts.ext_grp as u32 * 2 * 4;
        Self {
            sff_sa,
            sff_grp_sa,
            eff_sa,
            eff_grp_sa,
            end_of_table,
        }
    }

    /// Number of 32-bit words this geometry occupies.
    #[must_use]
    pub const fn words(&self) -> u32 {
        self.end_of_table / 4
    }
}

/// Returns whether a geometry with `end_of_table_words` words fits in the
/// 512-word LUT.
#[must_use]
pub const fn fits_capacity(end_of_table_words: u32) -> bool {
    end_of_table_words <= LUT_WORDS as u32
}

/// Recomputes and writes the five section-address registers from
/// `counts`, then restores the mode register to [`FilterMode::Operating`].
///
/// Must be called with the mode register already in
/// [`FilterMode::Bypass`] (the mutation engine's common preamble ensures
/// this before any shift or write happens).
pub fn recompute(hal: &mut impl CanAfHal, counts: Counts) -> Geometry {
    let geometry = Geometry::from_counts(counts);
    hal.set_sff_sa(geometry.sff_sa);
    hal.set_sff_grp_sa(geometry.sff_grp_sa);
    hal.set_eff_sa(geometry.eff_sa);
    hal.set_eff_grp_sa(geometry.eff_grp_sa);
    hal.set_end_of_table(geometry.end_of_table);
    hal.set_mode(FilterMode::Operating);
    geometry
}
