//! Batching policy for embedding calls.
//!
//! Texts are cut into contiguous slices of at most `B` items; the embedder
//! outputs for slice `i` map back to positions `i*B .. i*B + len - 1`.

use crate::{Error, Result};

/// Partitions `items` into `ceil(N / B)` contiguous slices of at most `B`.
///
/// A batch size of 0 is treated as 1.
pub fn partition<T>(items: &[T], max_batch_size: usize) -> impl Iterator<Item = &[T]> {
    items.chunks(max_batch_size.max(1))
}

/// Returns how many batches [`partition`] yields.
#[must_use]
pub const fn batch_count(items: usize, max_batch_size: usize) -> usize {
    let size = if max_batch_size == 0 { 1 } else { max_batch_size };
    items.div_ceil(size)
}

/// Combines the configured batch size with an embedder's advisory maximum.
///
/// An advisory maximum of 0 means the embedder states no limit.
#[must_use]
pub fn effective_batch_size(configured: usize, advisory: usize) -> usize {
    let size = if advisory == 0 {
        configured
    } else {
        configured.min(advisory)
    };
    size.max(1)
}

/// Flattens per-batch outputs back into input order.
///
/// `expected` holds each batch's input length. A batch returning a
/// different number of vectors is an error: positions would no longer line
/// up with document keys.
pub fn reassemble<V>(expected: &[usize], outputs: Vec<Vec<V>>) -> Result<Vec<V>> {
    if expected.len() != outputs.len() {
        return Err(Error::OperationFailed {
            operation: "reassemble_embeddings".to_string(),
            cause: format!(
                "expected {} batch results, got {}",
                expected.len(),
                outputs.len()
            ),
        });
    }

    let mut flat = Vec::with_capacity(expected.iter().sum());
    for (index, (want, batch)) in expected.iter().zip(outputs).enumerate() {
        if batch.len() != *want {
            return Err(Error::OperationFailed {
                operation: "reassemble_embeddings".to_string(),
                cause: format!(
                    "batch {index} returned {} embeddings for {want} texts",
                    batch.len()
                ),
            });
        }
        flat.extend(batch);
    }
    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(5, 2, &[2, 2, 1] ; "uneven tail")]
    #[test_case(4, 2, &[2, 2] ; "even split")]
    #[test_case(3, 100, &[3] ; "single batch")]
    #[test_case(0, 10, &[] ; "empty input")]
    #[test_case(3, 0, &[1, 1, 1] ; "zero batch size treated as one")]
    fn test_partition_sizes(n: usize, b: usize, sizes: &[usize]) {
        let items: Vec<usize> = (0..n).collect();
        let got: Vec<usize> = partition(&items, b).map(<[usize]>::len).collect();
        assert_eq!(got, sizes);
        assert_eq!(batch_count(n, b), sizes.len());
    }

    #[test_case(100, 0, 100 ; "no advisory limit")]
    #[test_case(100, 16, 16 ; "advisory smaller")]
    #[test_case(8, 64, 8 ; "configured smaller")]
    #[test_case(0, 0, 1 ; "clamped to one")]
    fn test_effective_batch_size(configured: usize, advisory: usize, want: usize) {
        assert_eq!(effective_batch_size(configured, advisory), want);
    }

    #[test]
    fn test_reassemble_in_order() {
        let flat = reassemble(&[2, 1], vec![vec!['a', 'b'], vec!['c']]).unwrap();
        assert_eq!(flat, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_reassemble_short_batch() {
        let err = reassemble(&[2, 2], vec![vec![1, 2], vec![3]]).unwrap_err();
        assert!(err.to_string().contains("batch 1 returned 1 embeddings for 2 texts"));
    }

    #[test]
    fn test_reassemble_missing_batch() {
        assert!(reassemble::<u8>(&[1, 1], vec![vec![1]]).is_err());
    }
}
