//! Fixed-size batching of identifier lists.

use crate::error::{CardtrackError, Result};

/// Default number of identifiers per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Split `items` into consecutive chunks of `chunk_size`; the last chunk holds the remainder.
///
/// Concatenating the chunks reproduces `items`. An empty input yields no chunks.
pub fn split<T: Clone>(items: &[T], chunk_size: usize) -> Result<Vec<Vec<T>>> {
    if chunk_size == 0 {
        return Err(CardtrackError::validation("batch size must be greater than zero"));
    }
    Ok(items.chunks(chunk_size).map(<[T]>::to_vec).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_23_by_10() {
        let items: Vec<u32> = (1..=23).collect();
        let chunks = split(&items, 10).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], (1..=10).collect::<Vec<_>>());
        assert_eq!(chunks[1], (11..=20).collect::<Vec<_>>());
        assert_eq!(chunks[2], vec![21, 22, 23]);
    }

    #[test]
    fn split_exact_multiple_has_no_short_tail() {
        let items: Vec<u32> = (0..20).collect();
        let chunks = split(&items, 5).unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() == 5));
    }

    #[test]
    fn split_concatenation_reproduces_input() {
        let items: Vec<u32> = (0..37).collect();
        for k in 1..=40 {
            let chunks = split(&items, k).unwrap();
            let (last, head) = chunks.split_last().unwrap();
            assert!(head.iter().all(|c| c.len() == k));
            assert!(!last.is_empty() && last.len() <= k);
            assert_eq!(chunks.concat(), items);
        }
    }

    #[test]
    fn split_empty_input() {
        let chunks = split::<u32>(&[], 10).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn split_zero_size_fails() {
        let err = split(&[1, 2, 3], 0).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }
}
