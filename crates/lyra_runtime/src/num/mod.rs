//! Numeric tower: native-width fast paths with arbitrary-precision fallback.
//!
//! Fixed-width arithmetic tries `i64::checked_*` first; a `None` result is
//! the overflow marker (no unwinding) and routes the operation through
//! `BigInt`, whose result is normalized back to native width when it fits.

mod bigmath;

pub use bigmath::{comb, factorial, gcd_fold, isqrt, lcm_fold, perm, sqrt_big};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;

use crate::core::value::Value;
use crate::errors::{RunResult, messages, overflow_error, type_error, value_error, zero_division};

/// Borrowed numeric view. Bools read as 0/1.
pub enum NumRepr<'a> {
    Int(i64),
    Big(&'a BigInt),
    Float(f64),
}

pub fn num_repr(v: &Value) -> Option<NumRepr<'_>> {
    match v {
        Value::Int(i) => Some(NumRepr::Int(*i)),
        Value::Bool(b) => Some(NumRepr::Int(*b as i64)),
        Value::Big(b) => Some(NumRepr::Big(b)),
        Value::Float(f) => Some(NumRepr::Float(*f)),
        _ => None,
    }
}

fn bad_operands(op: &str, a: &Value, b: &Value) -> crate::errors::RunError {
    type_error(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        a.type_name(),
        b.type_name()
    ))
}

/// Convert any integral value to a `BigInt` (never fails for integrals).
pub fn to_big(v: &Value) -> Option<BigInt> {
    match v {
        Value::Int(i) => Some(BigInt::from(*i)),
        Value::Bool(b) => Some(BigInt::from(*b as i64)),
        Value::Big(b) => Some((**b).clone()),
        _ => None,
    }
}

/// Float coercion through the tower. OverflowError when a big integer
/// exceeds the double range.
pub fn to_float(v: &Value) -> RunResult<f64> {
    match v {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        Value::Bool(b) => Ok(*b as i64 as f64),
        Value::Big(b) => {
            let f = b.to_f64().unwrap_or(f64::INFINITY);
            if f.is_infinite() {
                Err(overflow_error(messages::INT_TOO_LARGE_FOR_FLOAT))
            } else {
                Ok(f)
            }
        }
        _ => Err(type_error(format!(
            "must be real number, not {}",
            v.type_name()
        ))),
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

pub fn add(a: &Value, b: &Value) -> RunResult<Value> {
    match (num_repr(a), num_repr(b)) {
        (Some(NumRepr::Int(x)), Some(NumRepr::Int(y))) => Ok(match x.checked_add(y) {
            Some(r) => Value::Int(r),
            None => Value::big(BigInt::from(x) + BigInt::from(y)),
        }),
        (Some(NumRepr::Float(_)), Some(_)) | (Some(_), Some(NumRepr::Float(_))) => {
            Ok(Value::Float(to_float(a)? + to_float(b)?))
        }
        (Some(_), Some(_)) => Ok(Value::big(to_big(a).unwrap() + to_big(b).unwrap())),
        _ => Err(bad_operands("+", a, b)),
    }
}

pub fn sub(a: &Value, b: &Value) -> RunResult<Value> {
    match (num_repr(a), num_repr(b)) {
        (Some(NumRepr::Int(x)), Some(NumRepr::Int(y))) => Ok(match x.checked_sub(y) {
            Some(r) => Value::Int(r),
            None => Value::big(BigInt::from(x) - BigInt::from(y)),
        }),
        (Some(NumRepr::Float(_)), Some(_)) | (Some(_), Some(NumRepr::Float(_))) => {
            Ok(Value::Float(to_float(a)? - to_float(b)?))
        }
        (Some(_), Some(_)) => Ok(Value::big(to_big(a).unwrap() - to_big(b).unwrap())),
        _ => Err(bad_operands("-", a, b)),
    }
}

pub fn mul(a: &Value, b: &Value) -> RunResult<Value> {
    match (num_repr(a), num_repr(b)) {
        (Some(NumRepr::Int(x)), Some(NumRepr::Int(y))) => Ok(match x.checked_mul(y) {
            Some(r) => Value::Int(r),
            None => Value::big(BigInt::from(x) * BigInt::from(y)),
        }),
        (Some(NumRepr::Float(_)), Some(_)) | (Some(_), Some(NumRepr::Float(_))) => {
            Ok(Value::Float(to_float(a)? * to_float(b)?))
        }
        (Some(_), Some(_)) => Ok(Value::big(to_big(a).unwrap() * to_big(b).unwrap())),
        _ => Err(bad_operands("*", a, b)),
    }
}

pub fn neg(a: &Value) -> RunResult<Value> {
    match num_repr(a) {
        Some(NumRepr::Int(x)) => Ok(match x.checked_neg() {
            Some(r) => Value::Int(r),
            None => Value::big(-BigInt::from(x)),
        }),
        Some(NumRepr::Big(b)) => Ok(Value::big(-b.clone())),
        Some(NumRepr::Float(f)) => Ok(Value::Float(-f)),
        None => Err(type_error(format!(
            "bad operand type for unary -: '{}'",
            a.type_name()
        ))),
    }
}

pub fn absolute(a: &Value) -> RunResult<Value> {
    match num_repr(a) {
        Some(NumRepr::Int(x)) => Ok(match x.checked_abs() {
            Some(r) => Value::Int(r),
            None => Value::big(BigInt::from(x).abs()),
        }),
        Some(NumRepr::Big(b)) => Ok(Value::big(b.abs())),
        Some(NumRepr::Float(f)) => Ok(Value::Float(f.abs())),
        None => Err(type_error(format!(
            "bad operand type for abs(): '{}'",
            a.type_name()
        ))),
    }
}

/// Floor division and modulo with sign following the divisor.
pub fn divmod(a: &Value, b: &Value) -> RunResult<(Value, Value)> {
    match (num_repr(a), num_repr(b)) {
        (Some(NumRepr::Int(x)), Some(NumRepr::Int(y))) => {
            if y == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            match x.checked_div(y) {
                Some(mut q) => {
                    let mut r = x - q * y;
                    if r != 0 && (r < 0) != (y < 0) {
                        q -= 1;
                        r += y;
                    }
                    Ok((Value::Int(q), Value::Int(r)))
                }
                // Only i64::MIN / -1 lands here.
                None => {
                    let (q, r) = BigInt::from(x).div_mod_floor(&BigInt::from(y));
                    Ok((Value::big(q), Value::big(r)))
                }
            }
        }
        (Some(NumRepr::Float(_)), Some(_)) | (Some(_), Some(NumRepr::Float(_))) => {
            let (x, y) = (to_float(a)?, to_float(b)?);
            if y == 0.0 {
                return Err(zero_division("float divmod()"));
            }
            let q = (x / y).floor();
            let r = x - q * y;
            Ok((Value::Float(q), Value::Float(r)))
        }
        (Some(_), Some(_)) => {
            let (x, y) = (to_big(a).unwrap(), to_big(b).unwrap());
            if y.is_zero() {
                return Err(zero_division("integer division or modulo by zero"));
            }
            let (q, r) = x.div_mod_floor(&y);
            Ok((Value::big(q), Value::big(r)))
        }
        _ => Err(type_error(format!(
            "unsupported operand type(s) for divmod(): '{}' and '{}'",
            a.type_name(),
            b.type_name()
        ))),
    }
}

pub fn floor_div(a: &Value, b: &Value) -> RunResult<Value> {
    Ok(divmod(a, b)?.0)
}

pub fn rem(a: &Value, b: &Value) -> RunResult<Value> {
    Ok(divmod(a, b)?.1)
}

/// True division: always a float for numeric operands.
pub fn true_div(a: &Value, b: &Value) -> RunResult<Value> {
    match (num_repr(a), num_repr(b)) {
        (Some(_), Some(_)) => {
            let y = to_float(b)?;
            if y == 0.0 && !matches!(num_repr(b), Some(NumRepr::Float(_))) {
                return Err(zero_division("division by zero"));
            }
            if y == 0.0 {
                return Err(zero_division("float division by zero"));
            }
            Ok(Value::Float(to_float(a)? / y))
        }
        _ => Err(bad_operands("/", a, b)),
    }
}

/// Power. Integer base with non-negative integer exponent stays exact;
/// negative exponents go through floats; a modulus forces integer-only
/// modular exponentiation.
pub fn pow(a: &Value, b: &Value, modulus: Option<&Value>) -> RunResult<Value> {
    if let Some(m) = modulus {
        return pow_mod(a, b, m);
    }
    match (num_repr(a), num_repr(b)) {
        (Some(NumRepr::Float(_)), Some(_)) | (Some(_), Some(NumRepr::Float(_))) => {
            let (x, y) = (to_float(a)?, to_float(b)?);
            if x == 0.0 && y < 0.0 {
                return Err(zero_division("0.0 cannot be raised to a negative power"));
            }
            let r = x.powf(y);
            if x < 0.0 && r.is_nan() && !y.is_nan() {
                // fractional power of a negative base
                return Err(value_error(messages::MATH_DOMAIN));
            }
            Ok(Value::Float(r))
        }
        (Some(_), Some(_)) => {
            let exp = to_big(b).unwrap();
            if exp.is_negative() {
                let base = to_float(a)?;
                if base == 0.0 {
                    return Err(zero_division("0.0 cannot be raised to a negative power"));
                }
                return Ok(Value::Float(base.powf(to_float(b)?)));
            }
            let base = to_big(a).unwrap();
            // Fast path while everything fits native width.
            if let (Some(base_i), Some(exp_u)) = (base.to_i64(), exp.to_u32()) {
                if let Some(r) = base_i.checked_pow(exp_u) {
                    return Ok(Value::Int(r));
                }
            }
            let exp_u = exp
                .to_u64()
                .ok_or_else(|| overflow_error("exponent too large"))?;
            Ok(Value::big(big_pow(&base, exp_u)))
        }
        _ => Err(bad_operands("** or pow()", a, b)),
    }
}

fn big_pow(base: &BigInt, mut exp: u64) -> BigInt {
    let mut result = BigInt::one();
    let mut acc = base.clone();
    while exp > 0 {
        if exp & 1 == 1 {
            result *= &acc;
        }
        exp >>= 1;
        if exp > 0 {
            acc = &acc * &acc;
        }
    }
    result
}

fn pow_mod(a: &Value, b: &Value, m: &Value) -> RunResult<Value> {
    let (base, exp, modulus) = match (to_big(a), to_big(b), to_big(m)) {
        (Some(x), Some(y), Some(z)) => (x, y, z),
        _ => {
            return Err(type_error(
                "pow() 3rd argument not allowed unless all arguments are integers",
            ));
        }
    };
    if modulus.is_zero() {
        return Err(value_error("pow() 3rd argument cannot be 0"));
    }
    let m_abs = modulus.abs();
    let result = if exp.is_negative() {
        let inverse = mod_inverse(&base, &m_abs).ok_or_else(|| {
            value_error("base is not invertible for the given modulus")
        })?;
        inverse.modpow(&-&exp, &m_abs)
    } else {
        base.modpow(&exp, &m_abs)
    };
    // result carries the sign of the modulus, like floor modulo
    Ok(Value::big(result.mod_floor(&modulus)))
}

fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    let e = a.extended_gcd(m);
    if !e.gcd.is_one() {
        return None;
    }
    Some(e.x.mod_floor(m))
}

// ============================================================================
// Comparison, equality, hashing
// ============================================================================

/// Exact integer/float comparison without rounding the integer side.
fn cmp_i64_f64(i: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f == f64::INFINITY {
        return Some(Ordering::Less);
    }
    if f == f64::NEG_INFINITY {
        return Some(Ordering::Greater);
    }
    // Outside this window every i64 is strictly inside the float's magnitude.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    if f >= LIMIT {
        return Some(Ordering::Less);
    }
    if f < -LIMIT {
        return Some(Ordering::Greater);
    }
    let floor = f.floor();
    let fi = floor as i128;
    match (i as i128).cmp(&fi) {
        Ordering::Equal => {
            if f > floor {
                Some(Ordering::Less)
            } else {
                Some(Ordering::Equal)
            }
        }
        other => Some(other),
    }
}

fn cmp_big_f64(b: &BigInt, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f == f64::INFINITY {
        return Some(Ordering::Less);
    }
    if f == f64::NEG_INFINITY {
        return Some(Ordering::Greater);
    }
    let floor = f.floor();
    let bf = BigInt::from_f64(floor).expect("finite float");
    match b.cmp(&bf) {
        Ordering::Equal => {
            if f > floor {
                Some(Ordering::Less)
            } else {
                Some(Ordering::Equal)
            }
        }
        other => Some(other),
    }
}

/// Total numeric ordering; `None` only when a NaN is involved.
pub fn numeric_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (num_repr(a)?, num_repr(b)?) {
        (NumRepr::Int(x), NumRepr::Int(y)) => Some(x.cmp(&y)),
        (NumRepr::Int(x), NumRepr::Big(y)) => Some(BigInt::from(x).cmp(y)),
        (NumRepr::Big(x), NumRepr::Int(y)) => Some(x.cmp(&BigInt::from(y))),
        (NumRepr::Big(x), NumRepr::Big(y)) => Some(x.cmp(y)),
        (NumRepr::Int(x), NumRepr::Float(y)) => cmp_i64_f64(x, y),
        (NumRepr::Float(x), NumRepr::Int(y)) => cmp_i64_f64(y, x).map(Ordering::reverse),
        (NumRepr::Big(x), NumRepr::Float(y)) => cmp_big_f64(x, y),
        (NumRepr::Float(x), NumRepr::Big(y)) => cmp_big_f64(y, x).map(Ordering::reverse),
        (NumRepr::Float(x), NumRepr::Float(y)) => x.partial_cmp(&y),
    }
}

pub fn numeric_eq(a: &Value, b: &Value) -> bool {
    numeric_cmp(a, b) == Some(Ordering::Equal)
}

pub const HASH_MODULUS: u64 = (1 << 61) - 1;
pub const HASH_INF: i64 = 314_159;

fn mul_pow2_mod(x: u64, e: u32) -> u64 {
    (((x as u128) << e) % (HASH_MODULUS as u128)) as u64
}

pub fn hash_i64(i: i64) -> i64 {
    let mut h = (i.unsigned_abs() % HASH_MODULUS) as i64;
    if i < 0 {
        h = -h;
    }
    if h == -1 { -2 } else { h }
}

pub fn hash_big(b: &BigInt) -> i64 {
    let m = b.magnitude() % HASH_MODULUS;
    let mut h = m.to_u64().unwrap_or(0) as i64;
    if b.is_negative() {
        h = -h;
    }
    if h == -1 { -2 } else { h }
}

/// Float hash consistent with the integer hash: `hash(1.0) == hash(1)`.
pub fn hash_f64(f: f64) -> i64 {
    if f.is_nan() {
        return 0;
    }
    if f.is_infinite() {
        return if f > 0.0 { HASH_INF } else { -HASH_INF };
    }
    let (mut m, mut e) = frexp(f);
    let negative = m < 0.0;
    if negative {
        m = -m;
    }
    let mut x: u64 = 0;
    while m != 0.0 {
        x = mul_pow2_mod(x, 28);
        m *= 268_435_456.0; // 2^28
        e -= 28;
        let y = m as u64;
        m -= y as f64;
        x += y;
        if x >= HASH_MODULUS {
            x -= HASH_MODULUS;
        }
    }
    let e = e.rem_euclid(61) as u32;
    x = mul_pow2_mod(x, e);
    let mut h = x as i64;
    if negative {
        h = -h;
    }
    if h == -1 { -2 } else { h }
}

pub fn hash_number(v: &Value) -> Option<i64> {
    match num_repr(v)? {
        NumRepr::Int(i) => Some(hash_i64(i)),
        NumRepr::Big(b) => Some(hash_big(b)),
        NumRepr::Float(f) => Some(hash_f64(f)),
    }
}

// ============================================================================
// Float decomposition
// ============================================================================

/// Split into mantissa in [0.5, 1) and exponent so that `m * 2^e == x`.
pub fn frexp(x: f64) -> (f64, i32) {
    if x == 0.0 || x.is_nan() || x.is_infinite() {
        return (x, 0);
    }
    let mut bits = x.to_bits();
    let mut biased = ((bits >> 52) & 0x7ff) as i32;
    if biased == 0 {
        // Subnormal: renormalize by scaling up first.
        bits = (x * f64::powi(2.0, 64)).to_bits();
        biased = ((bits >> 52) & 0x7ff) as i32 - 64;
    }
    let e = biased - 1022;
    let mantissa = f64::from_bits((bits & !(0x7ffu64 << 52)) | (1022u64 << 52));
    (mantissa, e)
}

/// `x * 2^e` with clamped staging so huge exponents saturate cleanly.
pub fn ldexp(x: f64, e: i64) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let e = e.clamp(-4096, 4096) as i32;
    let half = e / 2;
    x * f64::powi(2.0, half) * f64::powi(2.0, e - half)
}

/// Normalize a big value down to `Int` if it fits (observable-boundary
/// invariant for hashing and equality).
pub fn normalize(v: Value) -> Value {
    match v {
        Value::Big(ref b) => match b.to_i64() {
            Some(i) => Value::Int(i),
            None => v,
        },
        other => other,
    }
}
