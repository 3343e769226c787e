//! Carry-aware primitives that open or close a slot in the LUT while
//! preserving the four-section layout.
//!
//! These are the only places in the crate that manipulate the packed
//! half-word layout directly; the mutation engine in [`crate::engine`]
//! treats entries as whole sanitized values and leaves the bit-carry
//! arithmetic entirely to this module.
//!
//! The standard section is addressed two ways: by *word* index (a LUT
//! word) and by *half-slot* index (a flattened view where half-slot `2*w`
//! is the MSB of word `w` and `2*w + 1` is its LSB). Shifting the
//! standard section by one entry is a half-slot-granularity operation;
//! shifting any other section is whole-word.

use crate::encoding::{pack_std_pair, unpack_std_pair};
use crate::LUT_WORDS;

fn get_half_slot(lut: &[u32; LUT_WORDS], half_slot: usize) -> u16 {
    let (msb, lsb) = unpack_std_pair(lut[half_slot / 2]);
    if half_slot % 2 == 0 {
        msb
    } else {
        lsb
    }
}

fn set_half_slot(lut: &mut [u32; LUT_WORDS], half_slot: usize, value: u16) {
    let (msb, lsb) = unpack_std_pair(lut[half_slot / 2]);
    lut[half_slot / 2] = if half_slot % 2 == 0 {
        pack_std_pair(value, lsb)
    } else {
        pack_std_pair(msb, value)
    };
}

/// Shifts whole words `[from, to_exclusive)` up by one position, so that
/// the old content of word `k` ends up at word `k + 1`. Word `from` is
/// left holding a duplicate of its pre-shift contents; the caller
/// overwrites it next.
fn shift_words_up(lut: &mut [u32; LUT_WORDS], from: usize, to_exclusive: usize) {
    for idx in (from..to_exclusive).rev() {
        lut[idx + 1] = lut[idx];
    }
}

/// Shifts whole words `[from + 1, to_exclusive]` down by one position, so
/// that the old content of word `k` ends up at word `k - 1`. The word at
/// `to_exclusive` is left unmodified (it held the table's old last word,
/// now excluded from every section).
fn shift_words_down(lut: &mut [u32; LUT_WORDS], from: usize, to_exclusive: usize) {
    for idx in from..to_exclusive {
        lut[idx] = lut[idx + 1];
    }
}

/// Shifts standard-section half-slots `[from_half_slot + 1,
/// new_half_slot_count)` up by one position. Half-slot `from_half_slot`
/// is left holding a duplicate of its pre-shift contents.
fn shift_std_half_slots_up(lut: &mut [u32; LUT_WORDS], from_half_slot: usize, new_half_slot_count: usize) {
    for m in (from_half_slot + 1..new_half_slot_count).rev() {
        let value = get_half_slot(lut, m - 1);
        set_half_slot(lut, m, value);
    }
}

/// Shifts standard-section half-slots `[from_half_slot, old_half_slot_count
/// - 1)` down by one position, so the entry at `from_half_slot` is
/// deleted and everything after it moves one half-slot earlier. The
/// half-slot at `old_half_slot_count - 1` is left unmodified.
fn shift_std_half_slots_down(lut: &mut [u32; LUT_WORDS], from_half_slot: usize, old_half_slot_count: usize) {
    for m in from_half_slot..old_half_slot_count.saturating_sub(1) {
        let value = get_half_slot(lut, m + 1);
        set_half_slot(lut, m, value);
    }
}

/// Opens a one-word gap starting at `word_index`, shifting every word
/// from `word_index` through `end_words - 1` one position toward higher
/// addresses.
///
/// When `word_index` falls within the standard section (`word_index <
/// std_words_bound`), the portion of the shift inside the standard
/// section happens at half-word granularity: the half-slot the new entry
/// will occupy is `2 * word_index` (or `2 * word_index + 1` if
/// `lsb_slot`), and everything from there through the new trailing
/// standard entry (`std_count + 1`) cascades up by one half-slot. If that
/// growth pushes the standard section's word count past
/// `std_words_bound`, the remainder of the table (from the old
/// `std_words_bound` through `end_words - 1`) is carried along as a
/// whole-word shift so the newly-grown standard section has room.
///
/// The word (or half-slot) at the insertion point is left holding a
/// duplicate of its pre-shift contents; the caller overwrites it next.
pub fn upshift_full(
    lut: &mut [u32; LUT_WORDS],
    word_index: usize,
    lsb_slot: bool,
    std_count: usize,
    std_words_bound: usize,
    end_words: usize,
) {
    if word_index < std_words_bound {
        let from_half_slot = 2 * word_index + usize::from(lsb_slot);
        let new_std_count = std_count + 1;

        // The tail (group sections onward) must move out of the way first:
        // if the standard section is about to claim an extra word, that
        // word currently holds the first word of whatever follows it.
        let new_std_words_bound = new_std_count.div_ceil(2);
        if new_std_words_bound > std_words_bound {
            shift_words_up(lut, std_words_bound, end_words);
        }

        shift_std_half_slots_up(lut, from_half_slot, new_std_count);
    } else {
        shift_words_up(lut, word_index, end_words);
    }
}

/// Opens a one-half-word gap at the standard-section half-slot
/// `2 * word_index` (or `+ 1` if `lsb_slot`), without touching any other
/// section. Valid only when the standard section already has a free
/// trailing half-slot (`std_count` odd) wide enough to absorb the
/// growth: the word count does not change.
pub fn upshift_std(lut: &mut [u32; LUT_WORDS], word_index: usize, lsb_slot: bool, std_count: usize) {
    let from_half_slot = 2 * word_index + usize::from(lsb_slot);
    shift_std_half_slots_up(lut, from_half_slot, std_count + 1);
}

/// Closes the gap at word `word_index` by moving each subsequent word
/// one position toward lower addresses, up to `end_words`. The word at
/// the old end (`end_words - 1`, if in range) is left unmodified.
pub fn downshift_full(lut: &mut [u32; LUT_WORDS], word_index: usize, end_words: usize) {
    if end_words == 0 {
        return;
    }
    shift_words_down(lut, word_index, end_words - 1);
}

/// Closes a half-word gap within the standard section: deletes the entry
/// at half-slot `2 * word_index` (or `+ 1` if `lsb_slot`) and shifts
/// every subsequent standard half-slot one position earlier, through the
/// pre-delete `std_count`.
pub fn downshift_std(lut: &mut [u32; LUT_WORDS], word_index: usize, lsb_slot: bool, std_count: usize) {
    let from_half_slot = 2 * word_index + usize::from(lsb_slot);
    shift_std_half_slots_down(lut, from_half_slot, std_count);
}
