//! Builtin registration.
//!
//! Providers fill a registry with name/function pairs (and module
//! namespaces); the runtime installs the result into its global namespace
//! at startup.

use crate::builtins;
use crate::core::value::{DictKey, DictStorage, NativeFn, Value, dict_new};
use crate::math;

pub struct BuiltinRegistry {
    entries: Vec<(&'static str, Value)>,
    modules: Vec<(&'static str, Vec<(&'static str, Value)>)>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, fun: NativeFn) {
        self.entries.push((name, Value::function(name, fun)));
    }

    pub fn register_value(&mut self, name: &'static str, value: Value) {
        self.entries.push((name, value));
    }

    /// Start a module namespace; entries land in a dict under `name`.
    pub fn module(&mut self, name: &'static str) -> ModuleBuilder<'_> {
        self.modules.push((name, Vec::new()));
        ModuleBuilder { registry: self }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn install_into(self, globals: &mut DictStorage) {
        for (name, value) in self.entries {
            globals.insert(DictKey::from_str(name), value);
        }
        for (mod_name, entries) in self.modules {
            let mut ns = dict_new();
            for (name, value) in entries {
                ns.insert(DictKey::from_str(name), value);
            }
            globals.insert(DictKey::from_str(mod_name), Value::dict(ns));
        }
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ModuleBuilder<'a> {
    registry: &'a mut BuiltinRegistry,
}

impl ModuleBuilder<'_> {
    pub fn register(&mut self, name: &'static str, fun: NativeFn) -> &mut Self {
        let entries = &mut self.registry.modules.last_mut().expect("open module").1;
        entries.push((name, Value::function(name, fun)));
        self
    }

    pub fn register_value(&mut self, name: &'static str, value: Value) -> &mut Self {
        let entries = &mut self.registry.modules.last_mut().expect("open module").1;
        entries.push((name, value));
        self
    }
}

pub trait BuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry);
}

/// The global builtin functions.
pub struct StdBuiltinProvider;

impl BuiltinProvider for StdBuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry) {
        registry.register("len", builtins::builtin_len);
        registry.register("iter", builtins::builtin_iter);
        registry.register("next", builtins::builtin_next);
        registry.register("all", builtins::builtin_all);
        registry.register("any", builtins::builtin_any);
        registry.register("min", builtins::builtin_min);
        registry.register("max", builtins::builtin_max);
        registry.register("sum", builtins::builtin_sum);
        registry.register("sorted", builtins::builtin_sorted);
        registry.register("isinstance", builtins::builtin_isinstance);
        registry.register("issubclass", builtins::builtin_issubclass);
        registry.register("callable", builtins::builtin_callable);
        registry.register("repr", builtins::builtin_repr);
        registry.register("ascii", builtins::builtin_ascii);
        registry.register("hash", builtins::builtin_hash);
        registry.register("getattr", builtins::builtin_getattr);
        registry.register("setattr", builtins::builtin_setattr);
        registry.register("delattr", builtins::builtin_delattr);
        registry.register("hasattr", builtins::builtin_hasattr);
        registry.register("abs", builtins::builtin_abs);
        registry.register("divmod", builtins::builtin_divmod);
        registry.register("pow", builtins::builtin_pow);
        registry.register("round", builtins::builtin_round);
        registry.register("chr", builtins::builtin_chr);
        registry.register("ord", builtins::builtin_ord);
        registry.register("bin", builtins::builtin_bin);
        registry.register("oct", builtins::builtin_oct);
        registry.register("hex", builtins::builtin_hex);
        registry.register("print", builtins::builtin_print);
        registry.register("compile", builtins::builtin_compile);
        registry.register("eval", builtins::builtin_eval);
        registry.register("exec", builtins::builtin_exec);
        registry.register("globals", builtins::builtin_globals);
        registry.register("locals", builtins::builtin_locals);
        registry.register("__build_class__", builtins::builtin_build_class);
    }
}

/// The math module namespace.
pub struct MathBuiltinProvider;

impl BuiltinProvider for MathBuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry) {
        let mut m = registry.module("math");
        m.register("sqrt", builtins::math::builtin_sqrt)
            .register("isqrt", builtins::math::builtin_isqrt)
            .register("cbrt", builtins::math::builtin_cbrt)
            .register("exp", builtins::math::builtin_exp)
            .register("expm1", builtins::math::builtin_expm1)
            .register("log", builtins::math::builtin_log)
            .register("log2", builtins::math::builtin_log2)
            .register("log10", builtins::math::builtin_log10)
            .register("log1p", builtins::math::builtin_log1p)
            .register("pow", builtins::math::builtin_pow_f)
            .register("sin", builtins::math::builtin_sin)
            .register("cos", builtins::math::builtin_cos)
            .register("tan", builtins::math::builtin_tan)
            .register("asin", builtins::math::builtin_asin)
            .register("acos", builtins::math::builtin_acos)
            .register("atan", builtins::math::builtin_atan)
            .register("atan2", builtins::math::builtin_atan2)
            .register("sinh", builtins::math::builtin_sinh)
            .register("cosh", builtins::math::builtin_cosh)
            .register("tanh", builtins::math::builtin_tanh)
            .register("asinh", builtins::math::builtin_asinh)
            .register("acosh", builtins::math::builtin_acosh)
            .register("atanh", builtins::math::builtin_atanh)
            .register("ceil", builtins::math::builtin_ceil)
            .register("floor", builtins::math::builtin_floor)
            .register("trunc", builtins::math::builtin_trunc)
            .register("fabs", builtins::math::builtin_fabs)
            .register("fmod", builtins::math::builtin_fmod)
            .register("remainder", builtins::math::builtin_remainder)
            .register("modf", builtins::math::builtin_modf)
            .register("frexp", builtins::math::builtin_frexp)
            .register("ldexp", builtins::math::builtin_ldexp)
            .register("copysign", builtins::math::builtin_copysign)
            .register("degrees", builtins::math::builtin_degrees)
            .register("radians", builtins::math::builtin_radians)
            .register("isnan", builtins::math::builtin_isnan)
            .register("isinf", builtins::math::builtin_isinf)
            .register("isfinite", builtins::math::builtin_isfinite)
            .register("isclose", builtins::math::builtin_isclose)
            .register("factorial", builtins::math::builtin_factorial)
            .register("comb", builtins::math::builtin_comb)
            .register("perm", builtins::math::builtin_perm)
            .register("gcd", builtins::math::builtin_gcd)
            .register("lcm", builtins::math::builtin_lcm)
            .register("fsum", builtins::math::builtin_fsum)
            .register("sumprod", builtins::math::builtin_sumprod)
            .register("hypot", builtins::math::builtin_hypot)
            .register("dist", builtins::math::builtin_dist)
            .register("erf", builtins::math::builtin_erf)
            .register("erfc", builtins::math::builtin_erfc)
            .register("gamma", builtins::math::builtin_gamma)
            .register("lgamma", builtins::math::builtin_lgamma)
            .register("nextafter", builtins::math::builtin_nextafter)
            .register("ulp", builtins::math::builtin_ulp)
            .register_value("pi", Value::Float(math::PI))
            .register_value("e", Value::Float(math::E))
            .register_value("tau", Value::Float(math::TAU))
            .register_value("inf", Value::Float(f64::INFINITY))
            .register_value("nan", Value::Float(f64::NAN));
    }
}

/// The codecs module namespace.
pub struct CodecsBuiltinProvider;

impl BuiltinProvider for CodecsBuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry) {
        let mut m = registry.module("codecs");
        m.register("encode", builtins::builtin_encode)
            .register("decode", builtins::builtin_decode)
            .register("lookup", builtins::builtin_lookup)
            .register("register", builtins::builtin_register)
            .register("unregister", builtins::builtin_unregister)
            .register("register_error", builtins::builtin_register_error)
            .register("lookup_error", builtins::builtin_lookup_error)
            .register("escape_decode", builtins::builtin_escape_decode)
            .register("escape_encode", builtins::builtin_escape_encode);
    }
}
