//! Row identity helpers: code normalization and order-preserving list set operations.
//!
//! The set operations are plain membership scans. Identifier lists are small
//! (tens to low thousands), and keeping them `PartialEq`-only lets callers use
//! them on any key type.

/// Strip every `'0'` that appears before the first non-zero digit.
///
/// Characters other than `'0'` are always kept, and zeros after the first
/// `1..=9` digit are kept too: `"ABC001234"` becomes `"ABC1234"`.
/// A code whose digits are all zeros loses all of them (`"A0000"` → `"A"`).
pub fn normalize_code(code: &str) -> String {
    let mut leading = true;
    code.chars()
        .filter(|&c| {
            if matches!(c, '1'..='9') {
                leading = false;
            }
            !(leading && c == '0')
        })
        .collect()
}

/// Elements of `l1` that are also in `l2`, in `l1` order (duplicates kept).
pub fn intersect<T: PartialEq + Clone>(l1: &[T], l2: &[T]) -> Vec<T> {
    l1.iter().filter(|x| l2.contains(x)).cloned().collect()
}

/// Elements of `l1` that are not in `l2`, in `l1` order.
pub fn complement<T: PartialEq + Clone>(l1: &[T], l2: &[T]) -> Vec<T> {
    l1.iter().filter(|x| !l2.contains(x)).cloned().collect()
}
