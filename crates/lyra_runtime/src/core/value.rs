//! Runtime value representation.
//!
//! Values are a closed tagged enum with one variant per logical
//! representation: native-width integers with an arbitrary-precision
//! fallback, IEEE-754 doubles, and the builtin container shapes. Dispatch in
//! the builtin layer is a match on this enum.

use ahash::RandomState;
use hashbrown::HashMap;
use indexmap::IndexMap;
use lyra_ir::{CodeUnit, SyntaxTree};
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::core::iter::IterState;
use crate::core::storage::SequenceStorage;
use crate::core::type_obj::{InstanceObject, TypeObject};
use crate::errors::{RunResult, type_error};
use crate::runtime::Runtime;

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;
pub type OrderedMap<K, V> = IndexMap<K, V, RandomState>;

pub fn fast_hasher() -> RandomState {
    RandomState::with_seeds(0, 0, 0, 0)
}

pub fn fast_map_new<K: Eq + Hash, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(fast_hasher())
}

pub fn fast_map_with_capacity<K: Eq + Hash, V>(cap: usize) -> FastHashMap<K, V> {
    HashMap::with_capacity_and_hasher(cap, fast_hasher())
}

pub fn ordered_map_new<K: Eq + Hash, V>() -> OrderedMap<K, V> {
    IndexMap::with_hasher(fast_hasher())
}

// ============================================================================
// Dictionary keys
// ============================================================================

/// Compact dict key. String keys carry a pre-computed hash so equality can
/// reject on hash before touching the content.
#[derive(Clone, Debug)]
pub enum DictKey {
    Str { hash: u64, data: Rc<str> },
    Int(i64),
}

impl DictKey {
    pub fn from_str(s: &str) -> Self {
        DictKey::Str {
            hash: Self::hash_str(s),
            data: Rc::from(s),
        }
    }

    pub fn from_rc(data: Rc<str>) -> Self {
        DictKey::Str {
            hash: Self::hash_str(&data),
            data,
        }
    }

    pub fn hash_str(s: &str) -> u64 {
        let mut hasher = ahash::AHasher::default();
        hasher.write(s.as_bytes());
        hasher.finish()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DictKey::Str { data, .. } => Some(data),
            DictKey::Int(_) => None,
        }
    }

    /// Key for a value, if the value is hashable as a dict key.
    /// Bools and normalizable big integers collapse to their integer key.
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Str(s) => Some(DictKey::from_rc(s.clone())),
            Value::Int(i) => Some(DictKey::Int(*i)),
            Value::Bool(b) => Some(DictKey::Int(*b as i64)),
            Value::Big(b) => b.to_i64().map(DictKey::Int),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DictKey::Str { data, .. } => Value::Str(data.clone()),
            DictKey::Int(i) => Value::Int(*i),
        }
    }
}

impl PartialEq for DictKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DictKey::Str { hash: h1, data: d1 }, DictKey::Str { hash: h2, data: d2 }) => {
                if h1 != h2 {
                    return false;
                }
                if Rc::ptr_eq(d1, d2) {
                    return true;
                }
                d1 == d2
            }
            (DictKey::Int(a), DictKey::Int(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DictKey {}

impl Hash for DictKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            DictKey::Str { hash, .. } => {
                state.write_u8(0);
                state.write_u64(*hash);
            }
            DictKey::Int(i) => {
                state.write_u8(1);
                i.hash(state);
            }
        }
    }
}

pub type DictStorage = OrderedMap<DictKey, Value>;

pub fn dict_new() -> DictStorage {
    ordered_map_new()
}

// ============================================================================
// Builtin callables
// ============================================================================

/// Keyword arguments as the caller spelled them, in order.
pub type KwArgs = [(Rc<str>, Value)];

pub type NativeFn = fn(&mut Runtime, &[Value], &KwArgs) -> RunResult<Value>;

/// A named builtin function value.
#[derive(Clone)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<built-in function {}>", self.name)
    }
}

// ============================================================================
// Value
// ============================================================================

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Big(Rc<BigInt>),
    Float(f64),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    List(Rc<RefCell<SequenceStorage>>),
    Tuple(Rc<[Value]>),
    Dict(Rc<RefCell<DictStorage>>),
    Type(Rc<TypeObject>),
    Object(Rc<InstanceObject>),
    Function(Rc<BuiltinFunction>),
    Code(Rc<CodeUnit>),
    Ast(Rc<SyntaxTree>),
    Iter(Rc<RefCell<IterState>>),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn bytes(b: impl Into<Rc<[u8]>>) -> Self {
        Value::Bytes(b.into())
    }

    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(SequenceStorage::from_values(values))))
    }

    pub fn tuple(values: Vec<Value>) -> Self {
        Value::Tuple(Rc::from(values))
    }

    pub fn dict(map: DictStorage) -> Self {
        Value::Dict(Rc::new(RefCell::new(map)))
    }

    /// Big integer, normalized down to `Int` when it fits native width.
    pub fn big(b: BigInt) -> Self {
        match b.to_i64() {
            Some(i) => Value::Int(i),
            None => Value::Big(Rc::new(b)),
        }
    }

    pub fn function(name: &'static str, func: NativeFn) -> Self {
        Value::Function(Rc::new(BuiltinFunction { name, func }))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Big(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// Integer-like for arithmetic: includes bool (0/1).
    pub fn is_integral(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Big(_) | Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Big(_) | Value::Float(_) | Value::Bool(_)
        )
    }

    pub fn is_callable(&self) -> bool {
        match self {
            Value::Function(_) | Value::Type(_) => true,
            Value::Object(o) => o.class.lookup("__call__").is_some(),
            _ => false,
        }
    }

    /// Native integer view of integral values, when it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            Value::Big(b) => b.to_i64(),
            _ => None,
        }
    }

    /// Index coercion: TypeError for non-integers, OverflowError-free
    /// (callers bound-check the result themselves).
    pub fn as_index(&self, what: &str) -> RunResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(*b as i64),
            Value::Big(b) => b.to_i64().ok_or_else(|| {
                crate::errors::overflow_error(format!(
                    "cannot fit 'int' into an index-sized integer for {what}"
                ))
            }),
            _ => Err(type_error(format!(
                "{what} cannot be interpreted as an integer (got '{}')",
                self.type_name()
            ))),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::Big(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Type(_) => "type",
            Value::Object(o) => o.class.name(),
            Value::Function(_) => "builtin_function_or_method",
            Value::Code(_) => "code",
            Value::Ast(_) => "ast",
            Value::Iter(_) => "iterator",
        }
    }

    /// Truthiness without object hooks. `None` means a hook is required.
    pub fn is_truthy_fast(&self) -> Option<bool> {
        match self {
            Value::None => Some(false),
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Big(b) => Some(!b.is_zero()),
            Value::Float(f) => Some(*f != 0.0),
            Value::Str(s) => Some(!s.is_empty()),
            Value::Bytes(b) => Some(!b.is_empty()),
            Value::List(l) => Some(!l.borrow().is_empty()),
            Value::Tuple(t) => Some(!t.is_empty()),
            Value::Dict(d) => Some(!d.borrow().is_empty()),
            Value::Object(_) => None,
            _ => Some(true),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&repr_value(self))
    }
}

// ============================================================================
// Structural equality
// ============================================================================

/// Cross-representation equality. Numeric variants compare by value
/// (`True == 1`, `1 == 1.0`, normalized bigints equal their native twins);
/// containers compare structurally. Object `__eq__` hooks are the object
/// model's concern, not handled here.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    use crate::num;
    match (a, b) {
        (Value::None, Value::None) => true,
        _ if a.is_number() && b.is_number() => num::numeric_eq(a, b),
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(u, v)| values_equal(u, v))
        }
        (Value::List(x), Value::List(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && (0..x.len()).all(|i| values_equal(&x.get(i).unwrap(), &y.get(i).unwrap()))
        }
        (Value::Dict(x), Value::Dict(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        (Value::Type(x), Value::Type(y)) => Rc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => std::ptr::fn_addr_eq(x.func, y.func),
        (Value::Code(x), Value::Code(y)) => Rc::ptr_eq(x, y) || x == y,
        (Value::Ast(x), Value::Ast(y)) => Rc::ptr_eq(x, y) || x == y,
        _ => false,
    }
}

/// Strict less-than for the `<` operator: numeric pairs compare by value
/// (NaN answers false, it does not raise), sequences compare
/// lexicographically, anything else is unordered and raises TypeError.
pub fn value_lt(a: &Value, b: &Value) -> RunResult<bool> {
    use crate::num;
    use std::cmp::Ordering;
    if a.is_number() && b.is_number() {
        return Ok(num::numeric_cmp(a, b) == Some(Ordering::Less));
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x < y),
        (Value::Bytes(x), Value::Bytes(y)) => Ok(x < y),
        (Value::Tuple(x), Value::Tuple(y)) => seq_lt(x, y),
        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow().to_values(), y.borrow().to_values());
            seq_lt(&x, &y)
        }
        _ => Err(type_error(format!(
            "'<' not supported between instances of '{}' and '{}'",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn seq_lt(x: &[Value], y: &[Value]) -> RunResult<bool> {
    for (u, v) in x.iter().zip(y.iter()) {
        if !values_equal(u, v) {
            return value_lt(u, v);
        }
    }
    Ok(x.len() < y.len())
}

// ============================================================================
// Rendering
// ============================================================================

/// Float repr with shortest round-trip digits and a normalized exponent.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let mut buf = ryu::Buffer::new();
    let s = buf.format_finite(f);
    match s.find(['e', 'E']) {
        Some(pos) if !s[pos + 1..].starts_with('-') => {
            // ryu prints "1e30"; the runtime surface prints "1e+30"
            format!("{}e+{}", &s[..pos], &s[pos + 1..])
        }
        _ => s.to_string(),
    }
}

pub fn format_int(i: i64) -> String {
    let mut buf = itoa::Buffer::new();
    buf.format(i).to_string()
}

fn quote_str(s: &str, out: &mut String) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

fn repr_into(v: &Value, out: &mut String, depth: usize) {
    if depth > 16 {
        out.push_str("...");
        return;
    }
    match v {
        Value::None => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Int(i) => {
            let mut buf = itoa::Buffer::new();
            out.push_str(buf.format(*i));
        }
        Value::Big(b) => out.push_str(&b.to_string()),
        Value::Float(f) => out.push_str(&format_float(*f)),
        Value::Str(s) => quote_str(s, out),
        Value::Bytes(b) => {
            out.push_str("b'");
            for byte in b.iter() {
                match byte {
                    b'\\' => out.push_str("\\\\"),
                    b'\'' => out.push_str("\\'"),
                    b'\n' => out.push_str("\\n"),
                    b'\r' => out.push_str("\\r"),
                    b'\t' => out.push_str("\\t"),
                    0x20..=0x7e => out.push(*byte as char),
                    _ => out.push_str(&format!("\\x{byte:02x}")),
                }
            }
            out.push('\'');
        }
        Value::List(l) => {
            out.push('[');
            let items = l.borrow().to_values();
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                repr_into(item, out, depth + 1);
            }
            out.push(']');
        }
        Value::Tuple(t) => {
            out.push('(');
            for (i, item) in t.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                repr_into(item, out, depth + 1);
            }
            if t.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Value::Dict(d) => {
            out.push('{');
            for (i, (k, val)) in d.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                repr_into(&k.to_value(), out, depth + 1);
                out.push_str(": ");
                repr_into(val, out, depth + 1);
            }
            out.push('}');
        }
        Value::Type(t) => {
            out.push_str("<class '");
            out.push_str(t.name());
            out.push_str("'>");
        }
        Value::Object(o) => {
            out.push('<');
            out.push_str(o.class.name());
            out.push_str(" object>");
        }
        Value::Function(f) => {
            out.push_str("<built-in function ");
            out.push_str(f.name);
            out.push('>');
        }
        Value::Code(c) => {
            out.push_str("<code object, file \"");
            out.push_str(&c.filename);
            out.push_str("\">");
        }
        Value::Ast(_) => out.push_str("<ast object>"),
        Value::Iter(_) => out.push_str("<iterator>"),
    }
}

pub fn repr_value(v: &Value) -> String {
    let mut out = String::new();
    repr_into(v, &mut out, 0);
    out
}

/// `str()` rendering: strings stay unquoted, everything else is its repr.
pub fn str_value(v: &Value) -> String {
    match v {
        Value::Str(s) => s.to_string(),
        _ => repr_value(v),
    }
}
