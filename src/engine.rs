//! The mutation engine: the insert/update/delete operations for all four
//! LUT sections, plus `reset_filter` and `set_filter_mode`.
//!
//! Every mutating call follows the same shape: switch the mode register
//! to [`FilterMode::Bypass`], locate the entry (or the position it
//! belongs at), check capacity if the table is growing, run the
//! section-appropriate shift primitive, write the entry, update the
//! owned counts, and recompute the section-address registers via
//! [`geometry::recompute`] (which restores [`FilterMode::Operating`]).
//! The locate/capacity checks run before any shift or write, so a
//! rejected call leaves the counts and the LUT untouched; the mode
//! register is restored to its pre-call value on the failure path
//! instead of being left at `Bypass`.
//!
//! `update_*` chains an internal delete with an internal insert under a
//! single `Bypass` bracket instead of two separate ones: each `*_inner`
//! helper below performs the locate/validate/shift/count-update work but
//! leaves the mode register and the section-address registers alone,
//! so the peripheral never observes `Operating` with the old entry gone
//! and the new one not yet written. The public single-entry-point
//! methods wrap one `*_inner` call in a bypass/recompute bracket; the
//! `update_*` methods wrap two.

use core::cmp::Ordering;

use crate::encoding::{pack_std_group, pack_std_pair, sanitize_ext, sanitize_std, unpack_std_pair, Controller};
use crate::error::{FilterError, FilterResult};
use crate::geometry::{self, Counts, Geometry};
use crate::hal::CanAfHal;
use crate::mode::FilterMode;
use crate::shift;

#[cfg(feature = "log")]
macro_rules! trace { ($($arg:tt)*) => { log::trace!($($arg)*) } }
#[cfg(not(feature = "log"))]
macro_rules! trace { ($($arg:tt)*) => {} }

#[cfg(feature = "log")]
macro_rules! debug { ($($arg:tt)*) => { log::debug!($($arg)*) } }
#[cfg(not(feature = "log"))]
macro_rules! debug { ($($arg:tt)*) => {} }

/// Owns a HAL handle and the four per-section entry counts, and exposes
/// the full CAN acceptance-filter LUT mutation API.
pub struct FilterTable<H: CanAfHal> {
    hal: H,
    counts: Counts,
}

impl<H: CanAfHal> FilterTable<H> {
    /// Wraps a HAL handle, assuming a freshly reset table (all counts
    /// zero). Callers whose HAL starts with a non-empty LUT should not
    /// use this constructor; this crate has no way to recover counts
    /// from raw LUT content.
    #[must_use]
    pub const fn new(hal: H) -> Self {
        Self {
            hal,
            counts: Counts {
                std: 0,
                std_grp: 0,
                ext: 0,
                ext_grp: 0,
            },
        }
    }

    /// The four per-section entry counts this table believes are live.
    #[must_use]
    pub const fn counts(&self) -> Counts {
        self.counts
    }

    /// Borrows the underlying HAL handle, for callers that need to
    /// inspect raw register/LUT state (diagnostics, tests).
    #[must_use]
    pub const fn hal(&self) -> &H {
        &self.hal
    }

    /// Directly sets the mode register, bypassing the mutation preamble.
    /// Used to take the filter out of `Off` after power-up, or to force
    /// `Bypass`/`Operating` without touching any entries.
    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        debug!("setting CAN acceptance filter mode to {mode:?}");
        self.hal.set_mode(mode);
    }

    /// Clears every section to empty and leaves the mode register in
    /// `Bypass` (accept-all), matching the peripheral's own reset
    /// behavior: a freshly reset table has nothing to filter against
    /// until entries are programmed and the mode is explicitly set back
    /// to `Operating`.
    pub fn reset_filter(&mut self) {
        debug!("resetting CAN acceptance filter table");
        self.hal.set_mode(FilterMode::Bypass);
        self.counts = Counts::default();
        let geometry = Geometry::from_counts(self.counts);
        self.hal.set_sff_sa(geometry.sff_sa);
        self.hal.set_sff_grp_sa(geometry.sff_grp_sa);
        self.hal.set_eff_sa(geometry.eff_sa);
        self.hal.set_eff_grp_sa(geometry.eff_grp_sa);
        self.hal.set_end_of_table(geometry.end_of_table);
    }

    fn std_words(&self) -> usize {
        (self.counts.std as usize).div_ceil(2)
    }

    fn std_grp_start(&self) -> usize {
        self.std_words()
    }

    fn ext_start(&self) -> usize {
        self.std_grp_start() + self.counts.std_grp as usize
    }

    fn ext_grp_start(&self) -> usize {
        self.ext_start() + self.counts.ext as usize
    }

    fn end_words(&self) -> usize {
        self.ext_grp_start() + 2 * self.counts.ext_grp as usize
    }

    fn check_capacity(&self, candidate: Counts) -> FilterResult<()> {
        if geometry::fits_capacity(Geometry::from_counts(candidate).words()) {
            Ok(())
        } else {
            Err(FilterError::CapacityExhausted)
        }
    }

    /// Locates a sanitized standard ID's half-slot, or the half-slot it
    /// should be inserted before.
    fn locate_std(&self, sanitized: u16) -> Result<usize, usize> {
        for half_slot in 0..self.counts.std as usize {
            let word = self.hal.lut()[half_slot / 2];
            let (msb, lsb) = unpack_std_pair(word);
            let value = if half_slot % 2 == 0 { msb } else { lsb };
            match value.cmp(&sanitized) {
                Ordering::Equal => return Ok(half_slot),
                Ordering::Greater => return Err(half_slot),
                Ordering::Less => {}
            }
        }
        Err(self.counts.std as usize)
    }

    /// Locates a standard group by its packed `(start << 16) | end` key,
    /// comparing the whole word exactly as it is stored. Used for both the
    /// insert scan (first word exceeding the key) and the delete exact
    /// match (an `Ok` hit already implies both `start` and `end` matched).
    fn locate_std_grp(&self, key: u32) -> Result<usize, usize> {
        let base = self.std_grp_start();
        for i in 0..self.counts.std_grp as usize {
            match self.hal.lut()[base + i].cmp(&key) {
                Ordering::Equal => return Ok(i),
                Ordering::Greater => return Err(i),
                Ordering::Less => {}
            }
        }
        Err(self.counts.std_grp as usize)
    }

    fn locate_ext(&self, sanitized: u32) -> Result<usize, usize> {
        let base = self.ext_start();
        for i in 0..self.counts.ext as usize {
            match self.hal.lut()[base + i].cmp(&sanitized) {
                Ordering::Equal => return Ok(i),
                Ordering::Greater => return Err(i),
                Ordering::Less => {}
            }
        }
        Err(self.counts.ext as usize)
    }

    fn locate_ext_grp(&self, sanitized_start: u32) -> Result<usize, usize> {
        let base = self.ext_grp_start();
        for i in 0..self.counts.ext_grp as usize {
            match self.hal.lut()[base + 2 * i].cmp(&sanitized_start) {
                Ordering::Equal => return Ok(i),
                Ordering::Greater => return Err(i),
                Ordering::Less => {}
            }
        }
        Err(self.counts.ext_grp as usize)
    }

    fn write_std_half_slot(&mut self, half_slot: usize, value: u16) {
        let word = half_slot / 2;
        let (msb, lsb) = unpack_std_pair(self.hal.lut()[word]);
        self.hal.lut_mut()[word] = if half_slot % 2 == 0 {
            pack_std_pair(value, lsb)
        } else {
            pack_std_pair(msb, value)
        };
    }

    /// Core of [`Self::insert_std`]: locates the slot, checks capacity,
    /// runs the shift primitive and writes the payload. Leaves the mode
    /// register and the section-address registers untouched; the caller
    /// is responsible for the `Bypass`/recompute bracket. On error,
    /// nothing is mutated.
    fn insert_std_inner(&mut self, ctrl: Controller, id: u16) -> FilterResult<()> {
        let sanitized = sanitize_std(ctrl, id);
        let half_slot = match self.locate_std(sanitized) {
            Ok(_) => return Ok(()),
            Err(half_slot) => half_slot,
        };
        let new_counts = Counts {
            std: self.counts.std + 1,
            ..self.counts
        };
        self.check_capacity(new_counts)?;
        trace!("inserting standard id {sanitized:#x} at half-slot {half_slot}");

        let std_words_bound = self.std_words();
        let end_words = self.end_words();
        let word_index = half_slot / 2;
        let lsb_slot = half_slot % 2 == 1;

        if (self.counts.std as usize) % 2 == 1 {
            // an odd count already has a free trailing half-slot; no word
            // growth needed.
            shift::upshift_std(self.hal.lut_mut(), word_index, lsb_slot, self.counts.std as usize);
        } else {
            shift::upshift_full(
                self.hal.lut_mut(),
                word_index,
                lsb_slot,
                self.counts.std as usize,
                std_words_bound,
                end_words,
            );
        }
        self.write_std_half_slot(half_slot, sanitized);
        self.counts = new_counts;
        Ok(())
    }

    /// Inserts a standard (11-bit) ID, keeping the section sorted
    /// ascending. A no-op if the sanitized ID is already present.
    pub fn insert_std(&mut self, ctrl: Controller, id: u16) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        match self.insert_std_inner(ctrl, id) {
            Ok(()) => {
                geometry::recompute(&mut self.hal, self.counts);
                Ok(())
            }
            Err(err) => {
                self.hal.set_mode(prev_mode);
                Err(err)
            }
        }
    }

    /// Core of [`Self::delete_std`]. Leaves the mode register and the
    /// section-address registers untouched. On error, nothing is
    /// mutated.
    fn delete_std_inner(&mut self, ctrl: Controller, id: u16) -> FilterResult<()> {
        if self.counts.std == 0 {
            return Err(FilterError::TableEmpty);
        }
        let sanitized = sanitize_std(ctrl, id);
        let half_slot = self.locate_std(sanitized).map_err(|_| FilterError::NotFound)?;
        trace!("deleting standard id {sanitized:#x} at half-slot {half_slot}");

        let old_std_count = self.counts.std as usize;
        let old_std_words = self.std_words();
        let end_words = self.end_words();

        shift::downshift_std(self.hal.lut_mut(), half_slot / 2, half_slot % 2 == 1, old_std_count);
        if old_std_count % 2 == 1 {
            // the section shrinks by a whole word: pull the tail down to
            // close the now-superfluous last standard word.
            shift::downshift_full(self.hal.lut_mut(), old_std_words - 1, end_words);
        }
        self.counts = Counts {
            std: self.counts.std - 1,
            ..self.counts
        };
        Ok(())
    }

    /// Deletes a standard ID. Returns [`FilterError::TableEmpty`] if the
    /// section is empty, [`FilterError::NotFound`] if the ID isn't
    /// present.
    pub fn delete_std(&mut self, ctrl: Controller, id: u16) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        match self.delete_std_inner(ctrl, id) {
            Ok(()) => {
                geometry::recompute(&mut self.hal, self.counts);
                Ok(())
            }
            Err(err) => {
                self.hal.set_mode(prev_mode);
                Err(err)
            }
        }
    }

    /// Replaces a standard ID with another. Runs the delete and the
    /// insert under a single `Bypass` bracket, so the peripheral never
    /// observes `Operating` with the old ID gone and the new one not yet
    /// written. If the insert half fails (it cannot, in practice: a
    /// replace never grows the section's count), the old ID is
    /// reinserted before returning the error, leaving the table exactly
    /// as it was before the call.
    pub fn update_std(&mut self, ctrl: Controller, old_id: u16, new_id: u16) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        if let Err(err) = self.delete_std_inner(ctrl, old_id) {
            self.hal.set_mode(prev_mode);
            return Err(err);
        }
        if let Err(err) = self.insert_std_inner(ctrl, new_id) {
            self.insert_std_inner(ctrl, old_id)
                .expect("reinserting a just-deleted entry cannot fail");
            geometry::recompute(&mut self.hal, self.counts);
            self.hal.set_mode(prev_mode);
            return Err(err);
        }
        geometry::recompute(&mut self.hal, self.counts);
        Ok(())
    }

    /// Core of [`Self::insert_std_group`].
    fn insert_std_group_inner(&mut self, ctrl: Controller, start: u16, end: u16) -> FilterResult<()> {
        let s = sanitize_std(ctrl, start);
        let e = sanitize_std(ctrl, end);
        let key = pack_std_group(s, e);
        let pos = match self.locate_std_grp(key) {
            Ok(_) => return Ok(()),
            Err(pos) => pos,
        };
        let new_counts = Counts {
            std_grp: self.counts.std_grp + 1,
            ..self.counts
        };
        self.check_capacity(new_counts)?;
        trace!("inserting standard group [{s:#x}, {e:#x}] at position {pos}");

        let word_index = self.std_grp_start() + pos;
        let std_words_bound = self.std_words();
        let end_words = self.end_words();

        shift::upshift_full(self.hal.lut_mut(), word_index, false, self.counts.std as usize, std_words_bound, end_words);
        self.hal.lut_mut()[word_index] = key;
        self.counts = new_counts;
        Ok(())
    }

    /// Inserts a standard ID-range group `[start, end]`, keeping the
    /// section sorted ascending by `start`.
    pub fn insert_std_group(&mut self, ctrl: Controller, start: u16, end: u16) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        match self.insert_std_group_inner(ctrl, start, end) {
            Ok(()) => {
                geometry::recompute(&mut self.hal, self.counts);
                Ok(())
            }
            Err(err) => {
                self.hal.set_mode(prev_mode);
                Err(err)
            }
        }
    }

    /// Core of [`Self::delete_std_group`].
    fn delete_std_group_inner(&mut self, ctrl: Controller, start: u16, end: u16) -> FilterResult<()> {
        if self.counts.std_grp == 0 {
            return Err(FilterError::TableEmpty);
        }
        let key = pack_std_group(sanitize_std(ctrl, start), sanitize_std(ctrl, end));
        let pos = self.locate_std_grp(key).map_err(|_| FilterError::NotFound)?;
        trace!("deleting standard group with key {key:#x}");

        let word_index = self.std_grp_start() + pos;
        let end_words = self.end_words();

        shift::downshift_full(self.hal.lut_mut(), word_index, end_words);
        self.counts = Counts {
            std_grp: self.counts.std_grp - 1,
            ..self.counts
        };
        Ok(())
    }

    /// Deletes a standard group by exact `(start, end)` match.
    pub fn delete_std_group(&mut self, ctrl: Controller, start: u16, end: u16) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        match self.delete_std_group_inner(ctrl, start, end) {
            Ok(()) => {
                geometry::recompute(&mut self.hal, self.counts);
                Ok(())
            }
            Err(err) => {
                self.hal.set_mode(prev_mode);
                Err(err)
            }
        }
    }

    /// Replaces a standard group under a single `Bypass` bracket; see
    /// [`Self::update_std`] for the rollback-on-insert-failure contract.
    pub fn update_std_group(&mut self, ctrl: Controller, old_start: u16, old_end: u16, new_start: u16, new_end: u16) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        if let Err(err) = self.delete_std_group_inner(ctrl, old_start, old_end) {
            self.hal.set_mode(prev_mode);
            return Err(err);
        }
        if let Err(err) = self.insert_std_group_inner(ctrl, new_start, new_end) {
            self.insert_std_group_inner(ctrl, old_start, old_end)
                .expect("reinserting a just-deleted entry cannot fail");
            geometry::recompute(&mut self.hal, self.counts);
            self.hal.set_mode(prev_mode);
            return Err(err);
        }
        geometry::recompute(&mut self.hal, self.counts);
        Ok(())
    }

    /// Core of [`Self::insert_ext`].
    fn insert_ext_inner(&mut self, ctrl: Controller, id: u32) -> FilterResult<()> {
        let sanitized = sanitize_ext(ctrl, id);
        let pos = match self.locate_ext(sanitized) {
            Ok(_) => return Ok(()),
            Err(pos) => pos,
        };
        let new_counts = Counts {
            ext: self.counts.ext + 1,
            ..self.counts
        };
        self.check_capacity(new_counts)?;
        trace!("inserting extended id {sanitized:#x} at position {pos}");

        let word_index = self.ext_start() + pos;
        let std_words_bound = self.std_words();
        let end_words = self.end_words();

        shift::upshift_full(self.hal.lut_mut(), word_index, false, self.counts.std as usize, std_words_bound, end_words);
        self.hal.lut_mut()[word_index] = sanitized;
        self.counts = new_counts;
        Ok(())
    }

    /// Inserts an extended (29-bit) ID, keeping the section sorted
    /// ascending.
    pub fn insert_ext(&mut self, ctrl: Controller, id: u32) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        match self.insert_ext_inner(ctrl, id) {
            Ok(()) => {
                geometry::recompute(&mut self.hal, self.counts);
                Ok(())
            }
            Err(err) => {
                self.hal.set_mode(prev_mode);
                Err(err)
            }
        }
    }

    /// Core of [`Self::delete_ext`].
    fn delete_ext_inner(&mut self, ctrl: Controller, id: u32) -> FilterResult<()> {
        if self.counts.ext == 0 {
            return Err(FilterError::TableEmpty);
        }
        let sanitized = sanitize_ext(ctrl, id);
        let pos = self.locate_ext(sanitized).map_err(|_| FilterError::NotFound)?;
        trace!("deleting extended id {sanitized:#x}");

        let word_index = self.ext_start() + pos;
        let end_words = self.end_words();

        shift::downshift_full(self.hal.lut_mut(), word_index, end_words);
        self.counts = Counts {
            ext: self.counts.ext - 1,
            ..self.counts
        };
        Ok(())
    }

    /// Deletes an extended ID.
    pub fn delete_ext(&mut self, ctrl: Controller, id: u32) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        match self.delete_ext_inner(ctrl, id) {
            Ok(()) => {
                geometry::recompute(&mut self.hal, self.counts);
                Ok(())
            }
            Err(err) => {
                self.hal.set_mode(prev_mode);
                Err(err)
            }
        }
    }

    /// Replaces an extended ID under a single `Bypass` bracket; see
    /// [`Self::update_std`] for the rollback-on-insert-failure contract.
    pub fn update_ext(&mut self, ctrl: Controller, old_id: u32, new_id: u32) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        if let Err(err) = self.delete_ext_inner(ctrl, old_id) {
            self.hal.set_mode(prev_mode);
            return Err(err);
        }
        if let Err(err) = self.insert_ext_inner(ctrl, new_id) {
            self.insert_ext_inner(ctrl, old_id)
                .expect("reinserting a just-deleted entry cannot fail");
            geometry::recompute(&mut self.hal, self.counts);
            self.hal.set_mode(prev_mode);
            return Err(err);
        }
        geometry::recompute(&mut self.hal, self.counts);
        Ok(())
    }

    /// Core of [`Self::insert_ext_group`].
    fn insert_ext_group_inner(&mut self, ctrl: Controller, start: u32, end: u32) -> FilterResult<()> {
        let s = sanitize_ext(ctrl, start);
        let e = sanitize_ext(ctrl, end);
        let pos = match self.locate_ext_grp(s) {
            Ok(_) => return Ok(()),
            Err(pos) => pos,
        };
        let new_counts = Counts {
            ext_grp: self.counts.ext_grp + 1,
            ..self.counts
        };
        self.check_capacity(new_counts)?;
        trace!("inserting extended group [{s:#x}, {e:#x}] at position {pos}");

        let word_index = self.ext_grp_start() + 2 * pos;
        let std_words_bound = self.std_words();
        let end_words = self.end_words();

        // opens a two-word gap: the entry's start and end words both need
        // a home, so the whole-word shift runs once per word.
        shift::upshift_full(self.hal.lut_mut(), word_index, false, self.counts.std as usize, std_words_bound, end_words);
        shift::upshift_full(
            self.hal.lut_mut(),
            word_index + 1,
            false,
            self.counts.std as usize,
            std_words_bound,
            end_words + 1,
        );
        self.hal.lut_mut()[word_index] = s;
        self.hal.lut_mut()[word_index + 1] = e;
        self.counts = new_counts;
        Ok(())
    }

    /// Inserts an extended ID-range group `[start, end]`. Each entry
    /// occupies two LUT words (`start`, then `end`), so capacity is
    /// effectively 511 whole groups rather than 512.
    pub fn insert_ext_group(&mut self, ctrl: Controller, start: u32, end: u32) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        match self.insert_ext_group_inner(ctrl, start, end) {
            Ok(()) => {
                geometry::recompute(&mut self.hal, self.counts);
                Ok(())
            }
            Err(err) => {
                self.hal.set_mode(prev_mode);
                Err(err)
            }
        }
    }

    /// Core of [`Self::delete_ext_group`]. A hit requires both `start`
    /// and `end` to match the stored entry, not just `start`.
    fn delete_ext_group_inner(&mut self, ctrl: Controller, start: u32, end: u32) -> FilterResult<()> {
        if self.counts.ext_grp == 0 {
            return Err(FilterError::TableEmpty);
        }
        let s = sanitize_ext(ctrl, start);
        let e = sanitize_ext(ctrl, end);
        let pos = self.locate_ext_grp(s).map_err(|_| FilterError::NotFound)?;
        let word_index = self.ext_grp_start() + 2 * pos;
        if self.hal.lut()[word_index + 1] != e {
            return Err(FilterError::NotFound);
        }
        trace!("deleting extended group [{s:#x}, {e:#x}]");

        let end_words = self.end_words();

        shift::downshift_full(self.hal.lut_mut(), word_index, end_words);
        shift::downshift_full(self.hal.lut_mut(), word_index, end_words - 1);
        self.counts = Counts {
            ext_grp: self.counts.ext_grp - 1,
            ..self.counts
        };
        Ok(())
    }

    /// Deletes an extended group. A hit requires both `start` and `end`
    /// to match the stored entry, not just `start`.
    pub fn delete_ext_group(&mut self, ctrl: Controller, start: u32, end: u32) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        match self.delete_ext_group_inner(ctrl, start, end) {
            Ok(()) => {
                geometry::recompute(&mut self.hal, self.counts);
                Ok(())
            }
            Err(err) => {
                self.hal.set_mode(prev_mode);
                Err(err)
            }
        }
    }

    /// Replaces an extended group under a single `Bypass` bracket; see
    /// [`Self::update_std`] for the rollback-on-insert-failure contract.
    pub fn update_ext_group(&mut self, ctrl: Controller, old_start: u32, old_end: u32, new_start: u32, new_end: u32) -> FilterResult<()> {
        let prev_mode = self.hal.mode();
        self.hal.set_mode(FilterMode::Bypass);
        if let Err(err) = self.delete_ext_group_inner(ctrl, old_start, old_end) {
            self.hal.set_mode(prev_mode);
            return Err(err);
        }
        if let Err(err) = self.insert_ext_group_inner(ctrl, new_start, new_end) {
            self.insert_ext_group_inner(ctrl, old_start, old_end)
                .expect("reinserting a just-deleted entry cannot fail");
            geometry::recompute(&mut self.hal, self.counts);
            self.hal.set_mode(prev_mode);
            return Err(err);
        }
        geometry::recompute(&mut self.hal, self.counts);
        Ok(())
    }
}
