//! Exact summation of a stream of doubles.
//!
//! Shewchuk's algorithm: a list of nonoverlapping partial sums, each new
//! term fully absorbed with error-free two-sum transformations. The partials
//! sum to the exact mathematical total; the final pass rounds once, with a
//! half-even correction.

use smallvec::SmallVec;

use crate::errors::{RunResult, overflow_error, value_error};

/// Sum terms exactly. Terms arrive as fallible conversions so iteration
/// errors from the caller propagate mid-stream.
pub fn fsum<I>(terms: I) -> RunResult<f64>
where
    I: IntoIterator<Item = RunResult<f64>>,
{
    let mut partials: SmallVec<[f64; 32]> = SmallVec::new();
    // Non-finite terms bypass the partials entirely.
    let mut special_sum = 0.0f64;
    let mut inf_sum = 0.0f64;

    for term in terms {
        let mut x = term?;
        let xsave = x;
        let mut i = 0;
        for j in 0..partials.len() {
            let mut y = partials[j];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let hi = x + y;
            let yr = hi - x;
            let lo = y - yr;
            if lo != 0.0 {
                partials[i] = lo;
                i += 1;
            }
            x = hi;
        }
        partials.truncate(i);
        if !x.is_finite() {
            // An infinite/nan partial from finite inputs means the sum
            // itself overflowed.
            if xsave.is_finite() {
                return Err(overflow_error("intermediate overflow in fsum"));
            }
            if xsave.is_infinite() {
                inf_sum += xsave;
            }
            special_sum += xsave;
            partials.clear();
        } else if x != 0.0 {
            partials.push(x);
        }
    }

    if special_sum != 0.0 {
        if inf_sum.is_nan() {
            return Err(value_error("-inf + inf in fsum"));
        }
        return Ok(special_sum);
    }

    // Round the partials into one double, half-even at the boundary.
    let mut n = partials.len();
    let mut hi = 0.0f64;
    if n > 0 {
        n -= 1;
        hi = partials[n];
        let mut lo = 0.0f64;
        while n > 0 {
            let x = hi;
            n -= 1;
            let y = partials[n];
            hi = x + y;
            let yr = hi - x;
            lo = y - yr;
            if lo != 0.0 {
                break;
            }
        }
        // The remaining partials all share lo's sign exactly when the
        // rounded-away half needs to bump the last bit.
        if n > 0 && ((lo < 0.0 && partials[n - 1] < 0.0) || (lo > 0.0 && partials[n - 1] > 0.0)) {
            let y = lo * 2.0;
            let x = hi + y;
            let yr = x - hi;
            if y == yr {
                hi = x;
            }
        }
    }
    Ok(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_of(xs: &[f64]) -> RunResult<f64> {
        fsum(xs.iter().map(|x| Ok(*x)))
    }

    #[test]
    fn defeats_naive_float_addition() {
        assert_eq!(sum_of(&[1e16, 1.0, -1e16]).unwrap(), 1.0);
        // naive addition collapses to 0.0 here
        assert_eq!(1e16 + 1.0 - 1e16, 0.0);
    }

    #[test]
    fn empty_and_single() {
        assert_eq!(sum_of(&[]).unwrap(), 0.0);
        assert_eq!(sum_of(&[2.5]).unwrap(), 2.5);
    }

    #[test]
    fn many_small_terms_exact() {
        let terms: Vec<f64> = std::iter::repeat(0.1).take(10).collect();
        assert_eq!(fsum(terms.into_iter().map(Ok)).unwrap(), 1.0);
    }

    #[test]
    fn opposite_infinities_raise() {
        let err = sum_of(&[f64::INFINITY, f64::NEG_INFINITY]).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::ValueError);
    }

    #[test]
    fn single_infinity_passes_through() {
        assert_eq!(sum_of(&[1.0, f64::INFINITY, 2.0]).unwrap(), f64::INFINITY);
    }

    #[test]
    fn overflow_of_finite_terms_is_reported() {
        let err = sum_of(&[f64::MAX, f64::MAX]).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::OverflowError);
    }

    #[test]
    fn nan_term_wins() {
        assert!(sum_of(&[1.0, f64::NAN]).unwrap().is_nan());
    }

    #[test]
    fn large_magnitude_cancellation() {
        assert_eq!(sum_of(&[1e300, 7.0, -1e300]).unwrap(), 7.0);
    }
}
