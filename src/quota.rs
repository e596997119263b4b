//! Quota allocation: category proportions + total count -> integer targets.

use crate::error::PathGenError;

/// Rounding rule applied when converting `total * proportion` to an integer.
///
/// Categories that drive an external resolution step round up so that enough
/// distinct identifiers are fetched to cover the quota; everything else
/// rounds down. Quotas are computed independently per category, so the sum
/// may over- or under-shoot `total` by a bounded rounding error. That is
/// accepted: the coordinator truncates overshoot after the merge and never
/// pads undershoot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round up (`ceil`)
    Up,
    /// Round down (`floor`)
    Down,
}

/// Compute the integer quota for one category.
///
/// Pure function. Fails with [`PathGenError::Configuration`] on a zero
/// total or a proportion outside `(0, 1]`.
pub fn allocate(total: u64, proportion: f64, rounding: Rounding) -> Result<u64, PathGenError> {
    if total == 0 {
        return Err(PathGenError::Configuration(
            "total path count must be positive".into(),
        ));
    }
    if !(proportion > 0.0 && proportion <= 1.0) {
        return Err(PathGenError::Configuration(format!(
            "proportion must be in (0, 1], got {proportion}"
        )));
    }

    let exact = total as f64 * proportion;
    let quota = match rounding {
        Rounding::Up => exact.ceil(),
        Rounding::Down => exact.floor(),
    };
    Ok(quota as u64)
}
