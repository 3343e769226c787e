//! Coverage for ID sanitation and half-word/word packing.

use canaf::encoding::{pack_std_group, pack_std_pair, sanitize_ext, sanitize_std, unpack_std_group, unpack_std_pair};
use canaf::Controller;

#[test]
fn sanitize_std_masks_and_stamps() {
    assert_eq!(sanitize_std(Controller::Can1, 0x100), 0x100);
    assert_eq!(sanitize_std(Controller::Can2, 0x100), 0x100 | (1 << 11));
    // Bits beyond the 11-bit range are discarded.
    assert_eq!(sanitize_std(Controller::Can1, 0xFFFF), 0x7FF);
}

#[test]
fn sanitize_ext_masks_and_stamps() {
    assert_eq!(sanitize_ext(Controller::Can1, 0x1000), 0x1000);
    assert_eq!(sanitize_ext(Controller::Can2, 0x1000), 0x1000 | (1 << 29));
    assert_eq!(sanitize_ext(Controller::Can1, 0xFFFF_FFFF), 0x1FFF_FFFF);
}

#[test]
fn std_pair_round_trips() {
    let word = pack_std_pair(0x080, 0x100);
    assert_eq!(unpack_std_pair(word), (0x080, 0x100));
}

#[test]
fn std_group_packs_with_or_not_and() {
    // A pure AND would zero any bit not set in both halves; confirm OR
    // semantics by using disjoint bit patterns.
    let word = pack_std_group(0x00F0, 0x0F00);
    assert_eq!(word, 0x00F0_0F00);
    assert_eq!(unpack_std_group(word), (0x00F0, 0x0F00));
}
