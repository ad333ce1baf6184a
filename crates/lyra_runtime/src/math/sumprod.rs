//! Extended-precision dot product.
//!
//! Three accumulation paths entered lazily per pair: exact native-integer
//! arithmetic, triple-length float arithmetic built on error-free
//! transformations, and a generic fallback. Leaving a specialized path
//! merges its partial total into the running total arithmetically — the
//! exact value is added once, never replayed through dispatch.

use crate::core::iter::iter_next;
use crate::core::value::Value;
use crate::errors::{RunResult, value_error};
use crate::num;
use crate::runtime::Runtime;

#[derive(Clone, Copy)]
struct DoubleLength {
    hi: f64,
    lo: f64,
}

/// Branch-free two-sum: `hi + lo == a + b` exactly.
fn dl_sum(a: f64, b: f64) -> DoubleLength {
    let s = a + b;
    let bv = s - a;
    let av = s - bv;
    let br = b - bv;
    let ar = a - av;
    DoubleLength { hi: s, lo: ar + br }
}

/// Error-free product via fused multiply-add.
fn dl_mul(x: f64, y: f64) -> DoubleLength {
    let z = x * y;
    let zz = x.mul_add(y, -z);
    DoubleLength { hi: z, lo: zz }
}

#[derive(Clone, Copy)]
struct TripleLength {
    hi: f64,
    lo: f64,
    tiny: f64,
}

const TL_ZERO: TripleLength = TripleLength {
    hi: 0.0,
    lo: 0.0,
    tiny: 0.0,
};

fn tl_fma(total: TripleLength, x: f64, y: f64) -> TripleLength {
    let pr = dl_mul(x, y);
    let sm = dl_sum(total.hi, pr.hi);
    let r1 = dl_sum(total.lo, pr.lo);
    let r2 = dl_sum(r1.hi, sm.lo);
    TripleLength {
        hi: sm.hi,
        lo: r2.hi,
        tiny: total.tiny + r1.lo + r2.lo,
    }
}

fn tl_to_d(total: TripleLength) -> f64 {
    total.tiny + total.lo + total.hi
}

fn small_int(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        _ => None,
    }
}

fn float_pair(p: &Value, q: &Value) -> RunResult<Option<(f64, f64)>> {
    match (p, q) {
        (Value::Float(a), Value::Float(b)) => Ok(Some((*a, *b))),
        (Value::Float(a), Value::Int(_) | Value::Bool(_) | Value::Big(_)) => {
            Ok(Some((*a, num::to_float(q)?)))
        }
        (Value::Int(_) | Value::Bool(_) | Value::Big(_), Value::Float(b)) => {
            Ok(Some((num::to_float(p)?, *b)))
        }
        _ => Ok(None),
    }
}

/// Sum of products over two equal-length iterables.
pub fn sumprod(rt: &mut Runtime, p: &Value, q: &Value) -> RunResult<Value> {
    let p_it = rt.get_iter(p)?;
    let q_it = rt.get_iter(q)?;

    let mut total = Value::Int(0);
    let mut int_active = true;
    let mut int_total: i64 = 0;
    let mut int_in_use = false;
    let mut flt_active = true;
    let mut flt_total = TL_ZERO;
    let mut flt_in_use = false;

    loop {
        let p_i = iter_next(rt, &p_it)?;
        let q_i = iter_next(rt, &q_it)?;
        let finished = match (&p_i, &q_i) {
            (None, None) => true,
            (Some(_), None) | (None, Some(_)) => {
                return Err(value_error("Inputs are not the same length"));
            }
            _ => false,
        };

        if int_active {
            let mut stay = false;
            if !finished {
                if let (Some(ip), Some(iq)) = (
                    p_i.as_ref().and_then(small_int),
                    q_i.as_ref().and_then(small_int),
                ) {
                    if let Some(new_total) = ip
                        .checked_mul(iq)
                        .and_then(|prod| int_total.checked_add(prod))
                    {
                        int_total = new_total;
                        int_in_use = true;
                        stay = true;
                    }
                }
            }
            if stay {
                continue;
            }
            // Overflow, a non-int pair, or end of input: merge the exact
            // partial and leave the path for good.
            int_active = false;
            if int_in_use {
                total = num::add(&total, &Value::Int(int_total))?;
                int_in_use = false;
            }
        }

        if flt_active {
            let mut stay = false;
            if !finished {
                if let Some((fp, fq)) = float_pair(p_i.as_ref().unwrap(), q_i.as_ref().unwrap())? {
                    let new_total = tl_fma(flt_total, fp, fq);
                    if new_total.hi.is_finite() {
                        flt_total = new_total;
                        flt_in_use = true;
                        stay = true;
                    }
                    // A non-finite accumulator abandons the extended-precision
                    // path; the pair is redone generically below.
                }
            }
            if stay {
                continue;
            }
            flt_active = false;
            if flt_in_use {
                total = num::add(&total, &Value::Float(tl_to_d(flt_total)))?;
                flt_in_use = false;
            }
        }

        if finished {
            return Ok(total);
        }
        let prod = num::mul(p_i.as_ref().unwrap(), q_i.as_ref().unwrap())?;
        total = num::add(&total, &prod)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    fn run(p: Vec<Value>, q: Vec<Value>) -> RunResult<Value> {
        let mut rt = Runtime::new();
        sumprod(&mut rt, &Value::list(p), &Value::list(q))
    }

    fn ints(xs: &[i64]) -> Vec<Value> {
        xs.iter().map(|x| Value::Int(*x)).collect()
    }

    fn floats(xs: &[f64]) -> Vec<Value> {
        xs.iter().map(|x| Value::Float(*x)).collect()
    }

    #[test]
    fn int_path_stays_exact() {
        let r = run(ints(&[1, 2, 3]), ints(&[4, 5, 6])).unwrap();
        assert!(matches!(r, Value::Int(32)));
    }

    #[test]
    fn int_overflow_falls_back_without_losing_precision() {
        let r = run(ints(&[i64::MAX, i64::MAX]), ints(&[2, 2])).unwrap();
        let expected = num_bigint::BigInt::from(i64::MAX) * 4;
        match r {
            Value::Big(b) => assert_eq!(*b, expected),
            other => panic!("expected Big, got {other:?}"),
        }
    }

    #[test]
    fn float_path_defeats_naive_accumulation() {
        let r = run(floats(&[1e20, 1.0, -1e20]), floats(&[1.0, 1.0, 1.0])).unwrap();
        assert!(matches!(r, Value::Float(f) if f == 1.0));
    }

    #[test]
    fn mixed_paths_merge_arithmetically() {
        let r = run(
            vec![Value::Int(2), Value::Int(3)],
            vec![Value::Int(4), Value::Float(0.5)],
        )
        .unwrap();
        assert!(matches!(r, Value::Float(f) if f == 9.5));
    }

    #[test]
    fn unequal_lengths_raise() {
        let err = run(ints(&[1, 2]), ints(&[1])).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::ValueError);
    }

    #[test]
    fn empty_inputs_sum_to_int_zero() {
        let r = run(vec![], vec![]).unwrap();
        assert!(matches!(r, Value::Int(0)));
    }
}
