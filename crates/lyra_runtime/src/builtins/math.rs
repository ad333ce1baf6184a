//! Math-module builtins: thin wrappers dispatching into the math library.

use super::common::*;
use crate::core::value::{KwArgs, Value};
use crate::errors::{RunResult, type_error, value_error};
use crate::math;
use crate::num;
use crate::runtime::Runtime;

fn float_arg(v: &Value) -> RunResult<f64> {
    num::to_float(v)
}

macro_rules! math1_builtin {
    ($rust_name:ident, $name:literal, $f:expr) => {
        pub fn $rust_name(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
            no_kwargs($name, kwargs)?;
            check_arity($name, args, 1, 1)?;
            let x = float_arg(&args[0])?;
            Ok(Value::Float($f(x)?))
        }
    };
}

macro_rules! math2_builtin {
    ($rust_name:ident, $name:literal, $f:expr) => {
        pub fn $rust_name(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
            no_kwargs($name, kwargs)?;
            check_arity($name, args, 2, 2)?;
            let x = float_arg(&args[0])?;
            let y = float_arg(&args[1])?;
            Ok(Value::Float($f(x, y)?))
        }
    };
}

math1_builtin!(builtin_exp, "exp", math::exp);
math1_builtin!(builtin_expm1, "expm1", math::expm1);
math1_builtin!(builtin_log1p, "log1p", math::log1p);
math1_builtin!(builtin_cbrt, "cbrt", math::cbrt);
math1_builtin!(builtin_sin, "sin", math::sin);
math1_builtin!(builtin_cos, "cos", math::cos);
math1_builtin!(builtin_tan, "tan", math::tan);
math1_builtin!(builtin_asin, "asin", math::asin);
math1_builtin!(builtin_acos, "acos", math::acos);
math1_builtin!(builtin_atan, "atan", math::atan);
math1_builtin!(builtin_sinh, "sinh", math::sinh);
math1_builtin!(builtin_cosh, "cosh", math::cosh);
math1_builtin!(builtin_tanh, "tanh", math::tanh);
math1_builtin!(builtin_asinh, "asinh", math::asinh);
math1_builtin!(builtin_acosh, "acosh", math::acosh);
math1_builtin!(builtin_atanh, "atanh", math::atanh);
math1_builtin!(builtin_gamma, "gamma", math::gamma);
math1_builtin!(builtin_lgamma, "lgamma", math::lgamma);
math2_builtin!(builtin_atan2, "atan2", math::atan2);
math2_builtin!(builtin_fmod, "fmod", math::fmod);
math2_builtin!(builtin_remainder, "remainder", math::remainder);
math2_builtin!(builtin_pow_f, "pow", math::pow_f);

pub fn builtin_sqrt(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("sqrt", kwargs)?;
    check_arity("sqrt", args, 1, 1)?;
    Ok(Value::Float(math::sqrt(&args[0])?))
}

pub fn builtin_log(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("log", kwargs)?;
    check_arity("log", args, 1, 2)?;
    Ok(Value::Float(math::log(&args[0], args.get(1))?))
}

pub fn builtin_log2(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("log2", kwargs)?;
    check_arity("log2", args, 1, 1)?;
    Ok(Value::Float(math::log2(&args[0])?))
}

pub fn builtin_log10(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("log10", kwargs)?;
    check_arity("log10", args, 1, 1)?;
    Ok(Value::Float(math::log10(&args[0])?))
}

pub fn builtin_erf(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("erf", kwargs)?;
    check_arity("erf", args, 1, 1)?;
    Ok(Value::Float(math::erf(float_arg(&args[0])?)))
}

pub fn builtin_erfc(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("erfc", kwargs)?;
    check_arity("erfc", args, 1, 1)?;
    Ok(Value::Float(math::erfc(float_arg(&args[0])?)))
}

pub fn builtin_ceil(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("ceil", kwargs)?;
    check_arity("ceil", args, 1, 1)?;
    math::ceil(&args[0])
}

pub fn builtin_floor(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("floor", kwargs)?;
    check_arity("floor", args, 1, 1)?;
    math::floor(&args[0])
}

pub fn builtin_trunc(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("trunc", kwargs)?;
    check_arity("trunc", args, 1, 1)?;
    math::trunc(&args[0])
}

pub fn builtin_fabs(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("fabs", kwargs)?;
    check_arity("fabs", args, 1, 1)?;
    Ok(Value::Float(math::fabs(float_arg(&args[0])?)))
}

pub fn builtin_copysign(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("copysign", kwargs)?;
    check_arity("copysign", args, 2, 2)?;
    Ok(Value::Float(math::copysign(
        float_arg(&args[0])?,
        float_arg(&args[1])?,
    )))
}

pub fn builtin_degrees(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("degrees", kwargs)?;
    check_arity("degrees", args, 1, 1)?;
    Ok(Value::Float(math::degrees(float_arg(&args[0])?)))
}

pub fn builtin_radians(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("radians", kwargs)?;
    check_arity("radians", args, 1, 1)?;
    Ok(Value::Float(math::radians(float_arg(&args[0])?)))
}

pub fn builtin_modf(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("modf", kwargs)?;
    check_arity("modf", args, 1, 1)?;
    let (frac, int) = math::modf(float_arg(&args[0])?);
    Ok(Value::tuple(vec![Value::Float(frac), Value::Float(int)]))
}

pub fn builtin_frexp(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("frexp", kwargs)?;
    check_arity("frexp", args, 1, 1)?;
    let (m, e) = num::frexp(float_arg(&args[0])?);
    Ok(Value::tuple(vec![Value::Float(m), Value::Int(e as i64)]))
}

pub fn builtin_ldexp(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("ldexp", kwargs)?;
    check_arity("ldexp", args, 2, 2)?;
    let x = float_arg(&args[0])?;
    let e = match &args[1] {
        Value::Int(i) => *i,
        Value::Bool(b) => *b as i64,
        // out-of-range exponents saturate; ldexp clamps anyway
        Value::Big(b) => {
            if num_traits::Signed::is_negative(&**b) {
                i64::MIN
            } else {
                i64::MAX
            }
        }
        _ => {
            return Err(type_error("Expected an int as second argument to ldexp."));
        }
    };
    let r = num::ldexp(x, e);
    if r.is_infinite() && x.is_finite() {
        return Err(crate::errors::overflow_error(
            crate::errors::messages::MATH_RANGE,
        ));
    }
    Ok(Value::Float(r))
}

pub fn builtin_isnan(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("isnan", kwargs)?;
    check_arity("isnan", args, 1, 1)?;
    Ok(Value::Bool(math::is_nan(&args[0])?))
}

pub fn builtin_isinf(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("isinf", kwargs)?;
    check_arity("isinf", args, 1, 1)?;
    Ok(Value::Bool(math::is_inf(&args[0])?))
}

pub fn builtin_isfinite(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("isfinite", kwargs)?;
    check_arity("isfinite", args, 1, 1)?;
    Ok(Value::Bool(math::is_finite(&args[0])?))
}

pub fn builtin_isclose(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("isclose", kwargs, &["rel_tol", "abs_tol"])?;
    check_arity("isclose", args, 2, 2)?;
    let a = float_arg(&args[0])?;
    let b = float_arg(&args[1])?;
    let rel_tol = match kwarg(kwargs, "rel_tol") {
        Some(v) => float_arg(v)?,
        None => 1e-09,
    };
    let abs_tol = match kwarg(kwargs, "abs_tol") {
        Some(v) => float_arg(v)?,
        None => 0.0,
    };
    Ok(Value::Bool(math::isclose(a, b, rel_tol, abs_tol)?))
}

// ============================================================================
// Integer arithmetic
// ============================================================================

pub fn builtin_factorial(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("factorial", kwargs)?;
    check_arity("factorial", args, 1, 1)?;
    num::factorial(&args[0])
}

pub fn builtin_comb(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("comb", kwargs)?;
    check_arity("comb", args, 2, 2)?;
    num::comb(&args[0], &args[1])
}

pub fn builtin_perm(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("perm", kwargs)?;
    check_arity("perm", args, 1, 2)?;
    num::perm(&args[0], args.get(1))
}

pub fn builtin_gcd(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("gcd", kwargs)?;
    num::gcd_fold(args)
}

pub fn builtin_lcm(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("lcm", kwargs)?;
    num::lcm_fold(args)
}

pub fn builtin_isqrt(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("isqrt", kwargs)?;
    check_arity("isqrt", args, 1, 1)?;
    num::isqrt(&args[0])
}

// ============================================================================
// Summation and norms
// ============================================================================

pub fn builtin_fsum(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("fsum", kwargs)?;
    check_arity("fsum", args, 1, 1)?;
    let it = rt.get_iter(&args[0])?;
    let mut terms = Vec::new();
    while let Some(item) = rt.iter_next(&it)? {
        terms.push(num::to_float(&item));
    }
    Ok(Value::Float(math::fsum(terms)?))
}

pub fn builtin_sumprod(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("sumprod", kwargs)?;
    check_arity("sumprod", args, 2, 2)?;
    math::sumprod(rt, &args[0], &args[1])
}

fn collect_floats(rt: &mut Runtime, v: &Value) -> RunResult<Vec<f64>> {
    let it = rt.get_iter(v)?;
    let mut out = Vec::new();
    while let Some(item) = rt.iter_next(&it)? {
        out.push(num::to_float(&item)?);
    }
    Ok(out)
}

pub fn builtin_hypot(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("hypot", kwargs)?;
    let mut coords = Vec::with_capacity(args.len());
    for a in args {
        coords.push(num::to_float(a)?);
    }
    Ok(Value::Float(math::hypot(&coords)))
}

pub fn builtin_dist(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("dist", kwargs)?;
    check_arity("dist", args, 2, 2)?;
    let p = collect_floats(rt, &args[0])?;
    let q = collect_floats(rt, &args[1])?;
    Ok(Value::Float(math::dist(&p, &q)?))
}

pub fn builtin_nextafter(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("nextafter", kwargs, &["steps"])?;
    check_arity("nextafter", args, 2, 2)?;
    let x = float_arg(&args[0])?;
    let y = float_arg(&args[1])?;
    let steps = match kwarg(kwargs, "steps") {
        None | Some(Value::None) => None,
        Some(v) => {
            let n = v.as_index("steps")?;
            if n < 0 {
                return Err(value_error("steps must be a non-negative integer"));
            }
            Some(n as u64)
        }
    };
    Ok(Value::Float(math::nextafter(x, y, steps)))
}

pub fn builtin_ulp(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("ulp", kwargs)?;
    check_arity("ulp", args, 1, 1)?;
    Ok(Value::Float(math::ulp(float_arg(&args[0])?)))
}
