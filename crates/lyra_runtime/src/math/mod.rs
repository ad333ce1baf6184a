//! Math function library.
//!
//! Every transcendental follows one policy: coerce through the numeric
//! tower's float conversion, run the native double computation, then
//! post-check the result — NaN from a non-NaN input is a domain error,
//! infinity from finite input is a range error. Detection is sentinel
//! inspection, never hardware traps.

mod fsum;
mod gamma;
mod special;
mod sumprod;

pub use fsum::fsum;
pub use gamma::{erf, erfc, gamma, lgamma, sinpi};
pub use special::{dist, hypot, nextafter, ulp, vector_norm};
pub use sumprod::sumprod;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use crate::core::value::Value;
use crate::errors::{RunResult, messages, overflow_error, type_error, value_error};
use crate::num::{self, NumRepr, sqrt_big};

pub const PI: f64 = std::f64::consts::PI;
pub const E: f64 = std::f64::consts::E;
pub const TAU: f64 = std::f64::consts::TAU;

/// One-argument transcendental post-check.
pub fn math1(x: f64, f: impl FnOnce(f64) -> f64) -> RunResult<f64> {
    let r = f(x);
    if r.is_nan() && !x.is_nan() {
        return Err(value_error(messages::MATH_DOMAIN));
    }
    if r.is_infinite() && x.is_finite() {
        return Err(overflow_error(messages::MATH_RANGE));
    }
    Ok(r)
}

/// Two-argument transcendental post-check.
pub fn math2(x: f64, y: f64, f: impl FnOnce(f64, f64) -> f64) -> RunResult<f64> {
    let r = f(x, y);
    if r.is_nan() && !x.is_nan() && !y.is_nan() {
        return Err(value_error(messages::MATH_DOMAIN));
    }
    if r.is_infinite() && x.is_finite() && y.is_finite() {
        return Err(overflow_error(messages::MATH_RANGE));
    }
    Ok(r)
}

// ============================================================================
// Square root and logarithms with big-integer fast paths
// ============================================================================

/// Square root. Big integers are handled without an intermediate float, so
/// values past the double range still have a square root.
pub fn sqrt(v: &Value) -> RunResult<f64> {
    if let Value::Big(b) = v {
        let r = sqrt_big(b)?;
        if r.is_infinite() {
            return Err(overflow_error(messages::MATH_RANGE));
        }
        return Ok(r);
    }
    math1(num::to_float(v)?, f64::sqrt)
}

/// log2 of a big integer: keep the top 62 bits, log those, add back the
/// shifted-out bit count. Avoids overflow and keeps full double precision.
fn log2_big(b: &BigInt) -> RunResult<f64> {
    if !b.is_positive() {
        return Err(value_error(messages::MATH_DOMAIN));
    }
    let bits = b.bits();
    if bits <= 62 {
        return Ok((b.to_i64().unwrap() as f64).log2());
    }
    let shift = bits - 62;
    let top = ((b >> shift).to_i64().unwrap()) as f64;
    Ok(top.log2() + shift as f64)
}

/// Natural log; optional base computes `log(x) / log(base)`.
pub fn log(v: &Value, base: Option<&Value>) -> RunResult<f64> {
    let num_log = log_value(v)?;
    match base {
        None => Ok(num_log),
        Some(b) => {
            let den = log_value(b)?;
            if den == 0.0 {
                return Err(zero_base_error());
            }
            Ok(num_log / den)
        }
    }
}

fn zero_base_error() -> crate::errors::RunError {
    crate::errors::zero_division("float division by zero")
}

fn log_value(v: &Value) -> RunResult<f64> {
    if let Value::Big(b) = v {
        return Ok(log2_big(b)? * std::f64::consts::LN_2);
    }
    math1(num::to_float(v)?, f64::ln)
}

pub fn log2(v: &Value) -> RunResult<f64> {
    if let Value::Big(b) = v {
        return log2_big(b);
    }
    math1(num::to_float(v)?, f64::log2)
}

pub fn log10(v: &Value) -> RunResult<f64> {
    if let Value::Big(b) = v {
        return Ok(log2_big(b)? * std::f64::consts::LOG10_2);
    }
    math1(num::to_float(v)?, f64::log10)
}

pub fn log1p(x: f64) -> RunResult<f64> {
    math1(x, f64::ln_1p)
}

// ============================================================================
// Plain one/two-argument wrappers
// ============================================================================

pub fn exp(x: f64) -> RunResult<f64> {
    math1(x, f64::exp)
}

pub fn expm1(x: f64) -> RunResult<f64> {
    math1(x, f64::exp_m1)
}

pub fn cbrt(x: f64) -> RunResult<f64> {
    math1(x, f64::cbrt)
}

pub fn sin(x: f64) -> RunResult<f64> {
    math1(x, f64::sin)
}

pub fn cos(x: f64) -> RunResult<f64> {
    math1(x, f64::cos)
}

pub fn tan(x: f64) -> RunResult<f64> {
    math1(x, f64::tan)
}

pub fn asin(x: f64) -> RunResult<f64> {
    math1(x, f64::asin)
}

pub fn acos(x: f64) -> RunResult<f64> {
    math1(x, f64::acos)
}

pub fn atan(x: f64) -> RunResult<f64> {
    math1(x, f64::atan)
}

pub fn atan2(y: f64, x: f64) -> RunResult<f64> {
    math2(y, x, f64::atan2)
}

pub fn sinh(x: f64) -> RunResult<f64> {
    math1(x, f64::sinh)
}

pub fn cosh(x: f64) -> RunResult<f64> {
    math1(x, f64::cosh)
}

pub fn tanh(x: f64) -> RunResult<f64> {
    math1(x, f64::tanh)
}

pub fn asinh(x: f64) -> RunResult<f64> {
    math1(x, f64::asinh)
}

pub fn acosh(x: f64) -> RunResult<f64> {
    math1(x, f64::acosh)
}

pub fn atanh(x: f64) -> RunResult<f64> {
    math1(x, f64::atanh)
}

pub fn fmod(x: f64, y: f64) -> RunResult<f64> {
    math2(x, y, |a, b| a % b)
}

/// IEEE-754 remainder with round-half-even quotient.
pub fn remainder(x: f64, y: f64) -> RunResult<f64> {
    if x.is_finite() && y.is_finite() {
        if y == 0.0 {
            return Err(value_error(messages::MATH_DOMAIN));
        }
        let absx = x.abs();
        let absy = y.abs();
        let m = absx % absy;
        let c = absy - m;
        let r = if m < c {
            m
        } else if m > c {
            -c
        } else {
            // tie: pick the even quotient
            m - 2.0 * ((0.5 * (absx - m)) % absy)
        };
        return Ok(1.0f64.copysign(x) * r);
    }
    if x.is_nan() {
        return Ok(x);
    }
    if y.is_nan() {
        return Ok(y);
    }
    if x.is_infinite() {
        return Err(value_error(messages::MATH_DOMAIN));
    }
    Ok(x)
}

/// math-style pow: domain error for a negative base with fractional
/// exponent and for 0 raised to a negative power.
pub fn pow_f(x: f64, y: f64) -> RunResult<f64> {
    // Special-case agreements that the post-check would misclassify.
    if x == 1.0 || y == 0.0 {
        return Ok(1.0);
    }
    let r = x.powf(y);
    if r.is_nan() && !x.is_nan() && !y.is_nan() {
        return Err(value_error(messages::MATH_DOMAIN));
    }
    if r.is_infinite() && x.is_finite() && y.is_finite() {
        if x == 0.0 {
            return Err(value_error(messages::MATH_DOMAIN));
        }
        return Err(overflow_error(messages::MATH_RANGE));
    }
    Ok(r)
}

pub fn degrees(x: f64) -> f64 {
    x * (180.0 / PI)
}

pub fn radians(x: f64) -> f64 {
    x * (PI / 180.0)
}

pub fn copysign(x: f64, y: f64) -> f64 {
    x.copysign(y)
}

pub fn fabs(x: f64) -> f64 {
    x.abs()
}

// ============================================================================
// Rounding to integers
// ============================================================================

fn float_to_int(f: f64) -> RunResult<Value> {
    if f.is_nan() {
        return Err(value_error("cannot convert float NaN to integer"));
    }
    if f.is_infinite() {
        return Err(overflow_error("cannot convert float infinity to integer"));
    }
    if f.abs() < 9.2e18 {
        return Ok(Value::Int(f as i64));
    }
    Ok(Value::big(
        num_traits::FromPrimitive::from_f64(f).expect("finite float"),
    ))
}

pub fn ceil(v: &Value) -> RunResult<Value> {
    match num::num_repr(v) {
        Some(NumRepr::Float(f)) => float_to_int(f.ceil()),
        Some(NumRepr::Int(i)) => Ok(Value::Int(i)),
        Some(NumRepr::Big(_)) => Ok(v.clone()),
        None => Err(type_error(format!(
            "must be real number, not {}",
            v.type_name()
        ))),
    }
}

pub fn floor(v: &Value) -> RunResult<Value> {
    match num::num_repr(v) {
        Some(NumRepr::Float(f)) => float_to_int(f.floor()),
        Some(NumRepr::Int(i)) => Ok(Value::Int(i)),
        Some(NumRepr::Big(_)) => Ok(v.clone()),
        None => Err(type_error(format!(
            "must be real number, not {}",
            v.type_name()
        ))),
    }
}

pub fn trunc(v: &Value) -> RunResult<Value> {
    match num::num_repr(v) {
        Some(NumRepr::Float(f)) => float_to_int(f.trunc()),
        Some(NumRepr::Int(i)) => Ok(Value::Int(i)),
        Some(NumRepr::Big(_)) => Ok(v.clone()),
        None => Err(type_error(format!(
            "type {} doesn't define __trunc__ method",
            v.type_name()
        ))),
    }
}

/// Fractional and integral parts, both carrying the sign of the input.
pub fn modf(x: f64) -> (f64, f64) {
    if x.is_infinite() {
        return (0.0f64.copysign(x), x);
    }
    if x.is_nan() {
        return (x, x);
    }
    let int_part = x.trunc();
    (x - int_part, int_part)
}

// ============================================================================
// Classification
// ============================================================================

pub fn is_nan(v: &Value) -> RunResult<bool> {
    Ok(matches!(num_repr_checked(v)?, NumRepr::Float(f) if f.is_nan()))
}

pub fn is_inf(v: &Value) -> RunResult<bool> {
    Ok(matches!(num_repr_checked(v)?, NumRepr::Float(f) if f.is_infinite()))
}

pub fn is_finite(v: &Value) -> RunResult<bool> {
    Ok(match num_repr_checked(v)? {
        NumRepr::Float(f) => f.is_finite(),
        _ => true,
    })
}

fn num_repr_checked(v: &Value) -> RunResult<NumRepr<'_>> {
    num::num_repr(v)
        .ok_or_else(|| type_error(format!("must be real number, not {}", v.type_name())))
}

/// Approximate equality with both relative and absolute tolerances.
pub fn isclose(a: f64, b: f64, rel_tol: f64, abs_tol: f64) -> RunResult<bool> {
    if rel_tol < 0.0 || abs_tol < 0.0 {
        return Err(value_error("tolerances must be non-negative"));
    }
    if a == b {
        return Ok(true);
    }
    if a.is_infinite() || b.is_infinite() {
        return Ok(false);
    }
    let diff = (b - a).abs();
    Ok(diff <= (rel_tol * b).abs() || diff <= (rel_tol * a).abs() || diff <= abs_tol)
}
