// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Carves a validation set off the END of the training samples:
//   - Training set:   first (1 - fraction) of the rows
//   - Validation set: last `fraction` of the rows
//
// No shuffling happens here. The loader already permuted the
// training rows once, so the tail is a random subset, and a
// fixed tail keeps the validation set identical across epochs.
//
// e.g. 3601 FordA rows with fraction 0.2:
//   train = floor(3601 * 0.8) = 2880, validation = 721
//
// Reference: Rust Book §8 (Vectors)

use anyhow::{ensure, Result};

/// Split `samples` into (train, validation).
///
/// # Arguments
/// * `samples`             - All training samples (consumed)
/// * `validation_fraction` - Share held out for validation, in [0, 1)
pub fn split_validation<T>(
    mut samples:         Vec<T>,
    validation_fraction: f64,
) -> Result<(Vec<T>, Vec<T>)> {
    ensure!(
        (0.0..1.0).contains(&validation_fraction),
        "validation fraction must be in [0, 1), got {validation_fraction}"
    );

    let total    = samples.len();
    let split_at = ((total as f64) * (1.0 - validation_fraction)).floor() as usize;
    let split_at = split_at.min(total);

    // split_off(n) leaves [0..n] in `samples` and returns [n..]
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    Ok((samples, val))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_validation(items, 0.2).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_forda_sizes() {
        let items: Vec<usize> = (0..3601).collect();
        let (train, val)      = split_validation(items, 0.2).unwrap();
        assert_eq!(train.len(), 2880);
        assert_eq!(val.len(),   721);
    }

    #[test]
    fn test_validation_is_the_tail() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_validation(items, 0.5).unwrap();
        assert_eq!(train, vec![0, 1, 2, 3, 4]);
        assert_eq!(val,   vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_zero_fraction_keeps_everything() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_validation(items, 0.0).unwrap();
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }

    #[test]
    fn test_empty_dataset() {
        let (train, val) = split_validation(Vec::<usize>::new(), 0.2).unwrap();
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_fraction_out_of_range() {
        assert!(split_validation(vec![1, 2, 3], 1.0).is_err());
        assert!(split_validation(vec![1, 2, 3], -0.1).is_err());
    }
}
