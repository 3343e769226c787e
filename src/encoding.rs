//! Sanitizing raw IDs and packing/unpacking the half-word and full-word
//! payloads the LUT stores.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;

/// Which on-chip CAN controller a filter entry applies to.
///
/// The hardware reserves the three most-significant bits of each packed
/// entry for this selector; only two controllers exist on parts this
/// crate targets, so the public enum stays 2-valued (`ctrl ∈ {CAN1=0,
/// CAN2=1}`) while [`sanitize_std`]/[`sanitize_ext`] mask a full 3-bit
/// field, leaving room for a future third controller without an encoding
/// change. See `DESIGN.md` Open Question 1.
#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Can1 = 0,
    Can2 = 1,
}

impl From<Controller> for u32 {
    fn from(value: Controller) -> Self {
        // SAFETY: `Controller` is a 1-bit enum and always fits in a `u32`.
        unsafe { ToPrimitive::to_u32(&value).unwrap_unchecked() }
    }
}

/// Mask covering the 3-bit controller-selector field reserved in every
/// packed entry.
const CONTROLLER_FIELD_MASK: u32 = 0b111;

/// Sanitizes a standard (11-bit) ID for storage in one half of a packed
/// word: masks off any bits beyond the 11-bit range and stamps the
/// controller selector into bit 11 of the half-word.
#[must_use]
pub fn sanitize_std(ctrl: Controller, id: u16) -> u16 {
    let ctrl = u32::from(ctrl) & CONTROLLER_FIELD_MASK;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the result is masked to 14 significant bits, well within u16"
    )]
    let sanitized = ((u32::from(id) & 0x7FF) | (ctrl << 11)) as u16;
    sanitized
}

/// Sanitizes an extended (29-bit) ID: masks off any bits beyond the
/// 29-bit range and stamps the controller selector into bit 29 of the
/// full word.
#[must_use]
pub fn sanitize_ext(ctrl: Controller, id: u32) -> u32 {
    let ctrl = u32::from(ctrl) & CONTROLLER_FIELD_MASK;
    (id & 0x1FFF_FFFF) | (ctrl << 29)
}

/// Packs two sanitized standard half-words into one LUT word, MSB first.
///
/// The standard section's ascending-order invariant requires `msb`'s sort
/// key to be less than `lsb`'s whenever both are occupied; callers are
/// responsible for choosing which sanitized value goes in which slot.
#[must_use]
pub const fn pack_std_pair(msb: u16, lsb: u16) -> u32 {
    (msb as u32) << 16 | lsb as u32
}

/// Splits a packed standard-section word back into its MSB and LSB
/// half-words.
#[must_use]
pub const fn unpack_std_pair(word: u32) -> (u16, u16) {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "each half is exactly 16 bits wide by construction"
    )]
    (((word >> 16) & 0xFFFF) as u16, (word & 0xFFFF) as u16)
}

/// Packs a standard-group `(start, end)` pair into the single word the
/// group section stores.
///
/// This is a bitwise OR of `start` into the MSB and `end` into the LSB;
/// see `DESIGN.md` Open Question 2 for the historical `&` bug this
/// corrects.
#[must_use]
pub const fn pack_std_group(start: u16, end: u16) -> u32 {
    (start as u32) << 16 | end as u32
}

/// Splits a packed standard-group word back into `(start, end)`.
#[must_use]
pub const fn unpack_std_group(word: u32) -> (u16, u16) {
    unpack_std_pair(word)
}
