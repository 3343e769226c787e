//! Coverage for the documented `i32` error-code mapping.

use canaf::FilterError;

#[test]
fn documented_error_codes() {
    assert_eq!(FilterError::CapacityExhausted.code(), -1);
    assert_eq!(FilterError::TableEmpty.code(), -1);
    assert_eq!(FilterError::NotFound.code(), -2);
}
