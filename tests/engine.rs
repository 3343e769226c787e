//! End-to-end coverage of the mutation engine against the documented
//! scenarios, run against the in-memory `FakeHal` double.
//!
//! Requires the `fake-hal` feature (`cargo test --features fake-hal`):
//! `FakeHal` is only part of the public surface under that feature, since
//! ordinary downstream firmware has no use for it outside a dev-profile.
#![cfg(feature = "fake-hal")]

use canaf::encoding::{sanitize_ext, sanitize_std, unpack_std_pair};
use canaf::geometry::Counts;
use canaf::hal::{CanAfHal, FakeHal};
use canaf::{Controller, FilterError, FilterMode, FilterTable, LUT_WORDS};

fn table() -> FilterTable<FakeHal> {
    FilterTable::new(FakeHal::new())
}

/// S1, pack two standard IDs in one word.
#[test]
fn s1_packs_two_standard_ids_in_one_word() {
    let mut t = table();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    t.insert_std(Controller::Can1, 0x200).unwrap();

    assert_eq!(t.counts().std, 2);
    assert_eq!(t.hal().sff_grp_sa(), 4);
    assert_eq!(t.hal().end_of_table(), 4);
    let expected = (u32::from(sanitize_std(Controller::Can1, 0x100)) << 16) | u32::from(sanitize_std(Controller::Can1, 0x200));
    assert_eq!(t.hal().lut()[0], expected);
}

/// S2, out-of-order insert triggers a half-word shift and a new word.
#[test]
fn s2_out_of_order_insert_grows_a_word() {
    let mut t = table();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    t.insert_std(Controller::Can1, 0x200).unwrap();
    t.insert_std(Controller::Can1, 0x080).unwrap();

    assert_eq!(t.counts().std, 3);
    assert_eq!(t.hal().end_of_table(), 8);
    let (msb0, lsb0) = unpack_std_pair(t.hal().lut()[0]);
    assert_eq!(msb0, sanitize_std(Controller::Can1, 0x080));
    assert_eq!(lsb0, sanitize_std(Controller::Can1, 0x100));
    let (msb1, _) = unpack_std_pair(t.hal().lut()[1]);
    assert_eq!(msb1, sanitize_std(Controller::Can1, 0x200));
}

/// S3, section boundaries advance with one of each kind.
#[test]
fn s3_section_boundaries_advance() {
    let mut t = table();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    t.insert_std_group(Controller::Can1, 0x200, 0x300).unwrap();
    t.insert_ext(Controller::Can1, 0x1000).unwrap();
    t.insert_ext_group(Controller::Can1, 0x2000, 0x3000).unwrap();

    assert_eq!(t.hal().sff_sa(), 0);
    assert_eq!(t.hal().sff_grp_sa(), 4);
    assert_eq!(t.hal().eff_sa(), 8);
    assert_eq!(t.hal().eff_grp_sa(), 12);
    assert_eq!(t.hal().end_of_table(), 20);
}

/// S4, delete from the LSB rotates, then shrinks once the section
/// collapses to an empty trailing word.
#[test]
fn s4_delete_from_lsb_rotates_then_shrinks() {
    let mut t = table();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    t.insert_std(Controller::Can1, 0x200).unwrap();

    t.delete_std(Controller::Can1, 0x200).unwrap();
    assert_eq!(t.counts().std, 1);
    assert_eq!(t.hal().end_of_table(), 4);
    let (msb0, _) = unpack_std_pair(t.hal().lut()[0]);
    assert_eq!(msb0, sanitize_std(Controller::Can1, 0x100));

    t.delete_std(Controller::Can1, 0x100).unwrap();
    assert_eq!(t.counts().std, 0);
    assert_eq!(t.hal().end_of_table(), 0);
}

/// S5, capacity rejection leaves counts and registers unchanged.
#[test]
fn s5_capacity_rejection_leaves_state_unchanged() {
    let mut t = table();
    for i in 0..256u32 {
        t.insert_ext_group(Controller::Can1, i * 2, i * 2 + 1).unwrap();
    }
    let counts_before = t.counts();
    let end_before = t.hal().end_of_table();

    let result = t.insert_ext_group(Controller::Can1, 100_000, 100_001);
    assert_eq!(result, Err(FilterError::CapacityExhausted));
    assert_eq!(t.counts(), counts_before);
    assert_eq!(t.hal().end_of_table(), end_before);
}

/// S6, reset is idempotent.
#[test]
fn s6_reset_is_idempotent() {
    let mut t = table();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    t.insert_ext(Controller::Can1, 0x1000).unwrap();

    t.reset_filter();
    t.reset_filter();

    assert_eq!(t.counts(), Counts::default());
    assert_eq!(t.hal().sff_sa(), 0);
    assert_eq!(t.hal().sff_grp_sa(), 0);
    assert_eq!(t.hal().eff_sa(), 0);
    assert_eq!(t.hal().eff_grp_sa(), 0);
    assert_eq!(t.hal().end_of_table(), 0);
    assert_eq!(t.hal().mode(), FilterMode::Bypass);
}

#[test]
fn insert_then_delete_restores_mode_to_operating() {
    let mut t = table();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    assert_eq!(t.hal().mode(), FilterMode::Operating);
    t.delete_std(Controller::Can1, 0x100).unwrap();
    assert_eq!(t.hal().mode(), FilterMode::Operating);
}

#[test]
fn delete_on_missing_key_leaves_table_untouched() {
    let mut t = table();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    let counts_before = t.counts();
    let lut_before = *t.hal().lut();

    assert_eq!(t.delete_std(Controller::Can1, 0x999), Err(FilterError::NotFound));
    assert_eq!(t.counts(), counts_before);
    assert_eq!(t.hal().lut(), &lut_before);
    assert_eq!(t.hal().mode(), FilterMode::Operating);
}

#[test]
fn update_across_all_four_sections() {
    let mut t = table();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    t.insert_std_group(Controller::Can1, 0x200, 0x210).unwrap();
    t.insert_ext(Controller::Can1, 0x1000).unwrap();
    t.insert_ext_group(Controller::Can1, 0x2000, 0x2010).unwrap();

    t.update_std(Controller::Can1, 0x100, 0x150).unwrap();
    t.update_std_group(Controller::Can1, 0x200, 0x210, 0x250, 0x260).unwrap();
    t.update_ext(Controller::Can1, 0x1000, 0x1500).unwrap();
    t.update_ext_group(Controller::Can1, 0x2000, 0x2010, 0x2500, 0x2510).unwrap();

    assert_eq!(t.counts().std, 1);
    assert_eq!(t.counts().std_grp, 1);
    assert_eq!(t.counts().ext, 1);
    assert_eq!(t.counts().ext_grp, 1);
    assert_eq!(t.delete_std(Controller::Can1, 0x100), Err(FilterError::NotFound));
    t.delete_std(Controller::Can1, 0x150).unwrap();
}

#[test]
fn extended_group_delete_requires_exact_end_match() {
    let mut t = table();
    t.insert_ext_group(Controller::Can1, 0x1000, 0x1010).unwrap();
    assert_eq!(
        t.delete_ext_group(Controller::Can1, 0x1000, 0x1020),
        Err(FilterError::NotFound)
    );
    t.delete_ext_group(Controller::Can1, 0x1000, 0x1010).unwrap();
    assert_eq!(t.counts().ext_grp, 0);
}

#[test]
fn delete_ext_group_pulls_trailing_words_down() {
    let mut t = table();
    t.insert_ext_group(Controller::Can1, 0x100, 0x110).unwrap();
    t.insert_ext_group(Controller::Can1, 0x200, 0x210).unwrap();
    t.delete_ext_group(Controller::Can1, 0x100, 0x110).unwrap();
    assert_eq!(t.counts().ext_grp, 1);
    assert_eq!(t.hal().lut()[0], sanitize_ext(Controller::Can1, 0x200));
    assert_eq!(t.hal().lut()[1], sanitize_ext(Controller::Can1, 0x210));
}

#[test]
fn delete_on_empty_section_is_table_empty() {
    let mut t = table();
    assert_eq!(t.delete_std(Controller::Can1, 0x100), Err(FilterError::TableEmpty));
    assert_eq!(t.delete_std_group(Controller::Can1, 0x100, 0x200), Err(FilterError::TableEmpty));
    assert_eq!(t.delete_ext(Controller::Can1, 0x1000), Err(FilterError::TableEmpty));
    assert_eq!(t.delete_ext_group(Controller::Can1, 0x1000, 0x2000), Err(FilterError::TableEmpty));
}

#[test]
fn insert_is_idempotent_for_a_duplicate_id() {
    let mut t = table();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    t.insert_std(Controller::Can1, 0x100).unwrap();
    assert_eq!(t.counts().std, 1);
}

/// A `CanAfHal` wrapper that records every mode-register write, so a test
/// can tell whether a composite operation passed back through `Operating`
/// between its internal delete and its internal insert.
struct RecordingHal {
    inner: FakeHal,
    pub mode_writes: Vec<FilterMode>,
}

impl RecordingHal {
    fn new() -> Self {
        Self {
            inner: FakeHal::new(),
            mode_writes: Vec::new(),
        }
    }
}

impl CanAfHal for RecordingHal {
    fn lut(&self) -> &[u32; LUT_WORDS] {
        self.inner.lut()
    }

    fn lut_mut(&mut self) -> &mut [u32; LUT_WORDS] {
        self.inner.lut_mut()
    }

    fn mode(&self) -> FilterMode {
        self.inner.mode()
    }

    fn set_mode(&mut self, mode: FilterMode) {
        self.mode_writes.push(mode);
        self.inner.set_mode(mode);
    }

    fn sff_sa(&self) -> u32 {
        self.inner.sff_sa()
    }

    fn set_sff_sa(&mut self, value: u32) {
        self.inner.set_sff_sa(value);
    }

    fn sff_grp_sa(&self) -> u32 {
        self.inner.sff_grp_sa()
    }

    fn set_sff_grp_sa(&mut self, value: u32) {
        self.inner.set_sff_grp_sa(value);
    }

    fn eff_sa(&self) -> u32 {
        self.inner.eff_sa()
    }

    fn set_eff_sa(&mut self, value: u32) {
        self.inner.set_eff_sa(value);
    }

    fn eff_grp_sa(&self) -> u32 {
        self.inner.eff_grp_sa()
    }

    fn set_eff_grp_sa(&mut self, value: u32) {
        self.inner.set_eff_grp_sa(value);
    }

    fn end_of_table(&self) -> u32 {
        self.inner.end_of_table()
    }

    fn set_end_of_table(&mut self, value: u32) {
        self.inner.set_end_of_table(value);
    }
}

/// Regression test for the update atomicity fix: a caller-visible `update_*`
/// must write the mode register to `Operating` exactly once, at the very
/// end, not once after the internal delete and again after the internal
/// insert. Two writes would mean the peripheral passed through `Operating`
/// with the old entry already gone and the new one not yet written.
#[test]
fn update_applies_delete_and_insert_under_one_bypass_bracket() {
    let mut t = FilterTable::new(RecordingHal::new());
    t.insert_std(Controller::Can1, 0x100).unwrap();
    t.insert_std(Controller::Can1, 0x200).unwrap();

    let operating_before = t.hal().mode_writes.iter().filter(|&&m| m == FilterMode::Operating).count();
    t.update_std(Controller::Can1, 0x100, 0x150).unwrap();
    let operating_after = t.hal().mode_writes.iter().filter(|&&m| m == FilterMode::Operating).count();

    assert_eq!(operating_after - operating_before, 1);
}
