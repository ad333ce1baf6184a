//! Integer combinatorics and roots over the numeric tower.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::core::value::Value;
use crate::errors::{
    RunResult, messages, overflow_error, type_error, value_error,
};
use crate::num::{ldexp, to_big};

/// n! for 0..=20 fits in an i64.
const SMALL_FACTORIALS: [i64; 21] = [
    1,
    1,
    2,
    6,
    24,
    120,
    720,
    5040,
    40320,
    362_880,
    3_628_800,
    39_916_800,
    479_001_600,
    6_227_020_800,
    87_178_291_200,
    1_307_674_368_000,
    20_922_789_888_000,
    355_687_428_096_000,
    6_402_373_705_728_000,
    121_645_100_408_832_000,
    2_432_902_008_176_640_000,
];

/// Product of the `n` consecutive integers starting at `start`, splitting
/// the range in half so the partial products stay balanced in size.
fn factorial_part(start: u64, n: u64) -> BigInt {
    if n <= 16 {
        let mut r = BigInt::from(start);
        for i in start + 1..start + n {
            r *= BigInt::from(i);
        }
        return r;
    }
    let half = n / 2;
    factorial_part(start, half) * factorial_part(start + half, n - half)
}

/// Coerce a factorial-style argument to a non-negative u64.
fn integral_arg(op: &str, v: &Value) -> RunResult<u64> {
    let n = match v {
        Value::Int(i) => *i as i128,
        Value::Bool(b) => *b as i128,
        Value::Big(b) => {
            if b.is_negative() {
                return Err(value_error(messages::FACTORIAL_NEGATIVE));
            }
            return b.to_i64().map(|i| i as u64).ok_or_else(|| {
                overflow_error(format!("{op}() argument should not exceed {}", i64::MAX))
            });
        }
        Value::Float(f) => {
            if f.is_nan() {
                return Err(value_error("cannot convert float NaN to integer"));
            }
            if f.is_infinite() {
                return Err(value_error("cannot convert float infinity to integer"));
            }
            if *f < 0.0 {
                return Err(value_error(messages::FACTORIAL_NEGATIVE));
            }
            if f.fract() != 0.0 {
                return Err(value_error(format!("{op}() only accepts integral values")));
            }
            if *f > i64::MAX as f64 {
                return Err(overflow_error(format!(
                    "{op}() argument should not exceed {}",
                    i64::MAX
                )));
            }
            *f as i128
        }
        _ => {
            return Err(type_error(format!(
                "an integer is required (got type {})",
                v.type_name()
            )));
        }
    };
    if n < 0 {
        return Err(value_error(messages::FACTORIAL_NEGATIVE));
    }
    Ok(n as u64)
}

pub fn factorial(v: &Value) -> RunResult<Value> {
    let n = integral_arg("factorial", v)?;
    if (n as usize) < SMALL_FACTORIALS.len() {
        return Ok(Value::Int(SMALL_FACTORIALS[n as usize]));
    }
    Ok(Value::big(factorial_part(1, n)))
}

fn comb_perm_arg(op: &str, name: &str, v: &Value) -> RunResult<u64> {
    let b = to_big(v).ok_or_else(|| {
        type_error(format!(
            "{op}() argument '{name}' must be an integer, not '{}'",
            v.type_name()
        ))
    })?;
    if b.is_negative() {
        return Err(value_error(format!("{name} must be a non-negative integer")));
    }
    b.to_u64()
        .ok_or_else(|| overflow_error(format!("{op}() argument '{name}' too large")))
}

/// Binomial coefficient, exact at every step: the running product of
/// `(n-k+i)/i` terms is always divisible by `i`.
pub fn comb(n_val: &Value, k_val: &Value) -> RunResult<Value> {
    let n = comb_perm_arg("comb", "n", n_val)?;
    let k = comb_perm_arg("comb", "k", k_val)?;
    if k > n {
        return Ok(Value::Int(0));
    }
    let k = k.min(n - k);
    let mut result = BigInt::one();
    for i in 1..=k {
        result = result * BigInt::from(n - k + i) / BigInt::from(i);
    }
    Ok(Value::big(result))
}

/// Falling factorial `n * (n-1) * ... * (n-k+1)`.
pub fn perm(n_val: &Value, k_val: Option<&Value>) -> RunResult<Value> {
    let n = comb_perm_arg("perm", "n", n_val)?;
    let k = match k_val {
        None | Some(Value::None) => n,
        Some(kv) => comb_perm_arg("perm", "k", kv)?,
    };
    if k > n {
        return Ok(Value::Int(0));
    }
    if k == 0 {
        return Ok(Value::Int(1));
    }
    Ok(Value::big(factorial_part(n - k + 1, k)))
}

// ============================================================================
// gcd / lcm
// ============================================================================

fn gcd_u64(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn integral_operand(op: &str, v: &Value) -> RunResult<BigInt> {
    to_big(v).ok_or_else(|| {
        type_error(format!(
            "{op}() arguments must be integers, not '{}'",
            v.type_name()
        ))
    })
}

/// Pairwise left fold; the zero-length identity is 0.
pub fn gcd_fold(args: &[Value]) -> RunResult<Value> {
    // Native fast path while everything stays in u64 magnitudes.
    let mut acc_small: Option<u64> = Some(0);
    let mut acc_big: Option<BigInt> = None;
    for v in args {
        match (&acc_big, v) {
            (None, Value::Int(i)) => {
                acc_small = Some(gcd_u64(acc_small.unwrap(), i.unsigned_abs()));
            }
            (None, Value::Bool(b)) => {
                acc_small = Some(gcd_u64(acc_small.unwrap(), *b as u64));
            }
            _ => {
                let operand = integral_operand("gcd", v)?.abs();
                let current = match acc_big.take() {
                    Some(b) => b,
                    None => BigInt::from(acc_small.take().unwrap()),
                };
                acc_big = Some(current.gcd(&operand));
            }
        }
    }
    match acc_big {
        Some(b) => Ok(Value::big(b)),
        None => {
            let g = acc_small.unwrap();
            if g <= i64::MAX as u64 {
                Ok(Value::Int(g as i64))
            } else {
                Ok(Value::big(BigInt::from(g)))
            }
        }
    }
}

/// Pairwise left fold; the zero-length identity is 1, and any zero operand
/// pins the result at 0.
pub fn lcm_fold(args: &[Value]) -> RunResult<Value> {
    let mut acc = BigInt::one();
    for v in args {
        let operand = integral_operand("lcm", v)?.abs();
        if operand.is_zero() {
            // still validate the remaining operands' types
            for rest in args {
                integral_operand("lcm", rest)?;
            }
            return Ok(Value::Int(0));
        }
        acc = acc.lcm(&operand);
    }
    Ok(Value::big(acc))
}

// ============================================================================
// Integer square root
// ============================================================================

/// Floor square root by multiply-compare; no float involvement for big
/// operands, and the native fast path verifies its float seed the same way.
pub fn isqrt(v: &Value) -> RunResult<Value> {
    let n = to_big(v).ok_or_else(|| {
        type_error(format!(
            "isqrt() argument must be an integer, not '{}'",
            v.type_name()
        ))
    })?;
    if n.is_negative() {
        return Err(value_error("isqrt() argument must be nonnegative"));
    }
    if let Some(small) = n.to_u64() {
        let mut s = (small as f64).sqrt() as u64;
        // float seed can be off by one either way near 2^52
        while s.checked_mul(s).map_or(true, |sq| sq > small) {
            s -= 1;
        }
        while (s + 1).checked_mul(s + 1).is_some_and(|sq| sq <= small) {
            s += 1;
        }
        return Ok(Value::Int(s as i64));
    }
    // Binary search over [0, 2^(bits/2 + 1)).
    let mut lo = BigInt::zero();
    let mut hi: BigInt = BigInt::one() << (n.bits() / 2 + 1);
    while lo < hi {
        let mid: BigInt = (&lo + &hi + 1u32) >> 1u32;
        if &mid * &mid <= n {
            lo = mid;
        } else {
            hi = mid - 1u32;
        }
    }
    Ok(Value::big(lo))
}

/// `x * 2^scale` as a double, extracting only the top bits of huge values.
fn big_times_pow2(x: &BigInt, scale: i64) -> f64 {
    let bits = x.bits() as i64;
    if bits <= 62 {
        return ldexp(x.to_i64().unwrap_or(0) as f64, scale);
    }
    let shift = (bits - 62) as u64;
    let top: BigInt = x >> shift;
    ldexp(top.to_i64().unwrap_or(0) as f64, shift as i64 + scale)
}

/// Square root of a big integer as a double, without converting the operand
/// to a double first (which would overflow past ~1e308).
///
/// Newton's method over integers scaled by 2^64; the iteration settles into
/// a two-cycle between adjacent fixed-point values, which terminates it.
pub fn sqrt_big(n: &BigInt) -> RunResult<f64> {
    if n.is_negative() {
        return Err(value_error(messages::MATH_DOMAIN));
    }
    if n.is_zero() {
        return Ok(0.0);
    }
    let scaled: BigInt = n << 128u32;
    let mut x: BigInt = BigInt::one() << (scaled.bits() / 2 + 1);
    let mut prev = BigInt::zero();
    loop {
        let next: BigInt = (&x + &scaled / &x) >> 1u32;
        if next == x {
            break;
        }
        if next == prev {
            // flip-flop: the true root lies between the two; take the floor
            if next < x {
                x = next;
            }
            break;
        }
        prev = std::mem::replace(&mut x, next);
    }
    Ok(big_times_pow2(&x, -64))
}
