//! The runtime context handle.
//!
//! All process-wide mutable state — the codec registry and cache, the error
//! handler table, the builtin namespace — hangs off `Runtime` and is
//! mutated only through `&mut` methods. One `Runtime` is one logical
//! execution context; embedders that want several run several.

use std::cell::RefCell;
use std::rc::Rc;

use lyra_ir::{Frontend, PassthroughFrontend};

use crate::builtins_registry::{
    BuiltinProvider, BuiltinRegistry, CodecsBuiltinProvider, MathBuiltinProvider,
    StdBuiltinProvider,
};
use crate::codecs::{CodecRegistry, HandlerRegistry};
use crate::core::iter::{IterState, iter_next};
use crate::core::type_obj::{InstanceObject, TypeObject, is_subtype};
use crate::core::value::{DictKey, DictStorage, KwArgs, Value, dict_new};
use crate::errors::{
    RunError, RunResult, attribute_error, recursion_error, type_error, value_error,
};

use super::capabilities::Interpreter;
use super::config::RuntimeConfig;

/// Class objects for the builtin representations.
pub struct CoreTypes {
    pub object: Rc<TypeObject>,
    pub type_: Rc<TypeObject>,
    pub none_type: Rc<TypeObject>,
    pub bool_: Rc<TypeObject>,
    pub int_: Rc<TypeObject>,
    pub float_: Rc<TypeObject>,
    pub str_: Rc<TypeObject>,
    pub bytes_: Rc<TypeObject>,
    pub list_: Rc<TypeObject>,
    pub tuple_: Rc<TypeObject>,
    pub dict_: Rc<TypeObject>,
    pub function_: Rc<TypeObject>,
    pub code_: Rc<TypeObject>,
    pub iterator_: Rc<TypeObject>,
}

impl CoreTypes {
    fn new() -> Self {
        let object = TypeObject::new_root("object");
        let sub = |name: &str, base: &Rc<TypeObject>| {
            TypeObject::new_rc(name, vec![base.clone()], dict_new())
                .expect("linear bases always linearize")
        };
        let type_ = sub("type", &object);
        let int_ = sub("int", &object);
        let bool_ = sub("bool", &int_); // bool is a numeric subtype of int
        let types = CoreTypes {
            none_type: sub("NoneType", &object),
            float_: sub("float", &object),
            str_: sub("str", &object),
            bytes_: sub("bytes", &object),
            list_: sub("list", &object),
            tuple_: sub("tuple", &object),
            dict_: sub("dict", &object),
            function_: sub("builtin_function_or_method", &object),
            code_: sub("code", &object),
            iterator_: sub("iterator", &object),
            bool_,
            int_,
            type_,
            object,
        };
        for t in [
            &types.object,
            &types.none_type,
            &types.bool_,
            &types.int_,
            &types.float_,
            &types.str_,
            &types.bytes_,
            &types.list_,
            &types.tuple_,
            &types.dict_,
            &types.function_,
            &types.code_,
            &types.iterator_,
            &types.type_,
        ] {
            *t.class.borrow_mut() = Some(types.type_.clone());
        }
        types
    }
}

/// Where `print` and friends deliver their output.
pub enum OutputSink {
    /// Collected into a buffer the embedder drains (the default).
    Capture(String),
    /// Forwarded to the process stdout.
    Standard,
}

pub struct Runtime {
    pub(crate) globals: Rc<RefCell<DictStorage>>,
    pub(crate) stdout: Option<OutputSink>,
    pub(crate) recursion_depth: usize,
    pub(crate) active_error: Option<RunError>,
    pub(crate) codec_registry: CodecRegistry,
    pub(crate) codec_error_handlers: HandlerRegistry,
    pub(crate) frontend: Option<Box<dyn Frontend>>,
    pub(crate) interpreter: Option<Rc<dyn Interpreter>>,
    pub(crate) config: RuntimeConfig,
    pub core_types: CoreTypes,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut rt = Self {
            globals: Rc::new(RefCell::new(dict_new())),
            stdout: Some(OutputSink::Capture(String::new())),
            recursion_depth: 0,
            active_error: None,
            codec_registry: CodecRegistry::new(),
            codec_error_handlers: HandlerRegistry::with_builtins(),
            frontend: Some(Box::new(PassthroughFrontend)),
            interpreter: None,
            config,
            core_types: CoreTypes::new(),
        };
        rt.install_builtins();
        rt
    }

    fn install_builtins(&mut self) {
        let mut registry = BuiltinRegistry::new();
        StdBuiltinProvider.install(&mut registry);
        MathBuiltinProvider.install(&mut registry);
        CodecsBuiltinProvider.install(&mut registry);
        registry.install_into(&mut self.globals.borrow_mut());
        // the core classes are globals too
        let type_values: [(&str, Rc<TypeObject>); 9] = [
            ("object", self.core_types.object.clone()),
            ("type", self.core_types.type_.clone()),
            ("int", self.core_types.int_.clone()),
            ("float", self.core_types.float_.clone()),
            ("bool", self.core_types.bool_.clone()),
            ("str", self.core_types.str_.clone()),
            ("bytes", self.core_types.bytes_.clone()),
            ("list", self.core_types.list_.clone()),
            ("tuple", self.core_types.tuple_.clone()),
        ];
        for (name, ty) in type_values {
            self.globals
                .borrow_mut()
                .insert(DictKey::from_str(name), Value::Type(ty));
        }
    }

    pub fn set_frontend(&mut self, frontend: Box<dyn Frontend>) {
        self.frontend = Some(frontend);
    }

    pub fn set_interpreter(&mut self, interpreter: Rc<dyn Interpreter>) {
        self.interpreter = Some(interpreter);
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Number of entries in the codec lookup cache (observable so embedders
    /// and tests can verify invalidation).
    pub fn codec_cache_len(&self) -> usize {
        self.codec_registry.cache_len()
    }

    // ------------------------------------------------------------------
    // Globals
    // ------------------------------------------------------------------

    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.borrow().get(&DictKey::from_str(name)).cloned()
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals
            .borrow_mut()
            .insert(DictKey::from_str(name), value);
    }

    /// The live builtin/global namespace as a dict value.
    pub fn globals_value(&self) -> Value {
        Value::Dict(self.globals.clone())
    }

    /// Look up a builtin by name and call it. Test and embedding shorthand.
    pub fn call_global(&mut self, name: &str, args: &[Value]) -> RunResult<Value> {
        let f = self
            .get_global(name)
            .ok_or_else(|| crate::errors::lookup_error(format!("name '{name}' is not defined")))?;
        self.call(&f, args)
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn write_output(&mut self, s: &str) {
        match &mut self.stdout {
            None => {}
            Some(OutputSink::Capture(buf)) => buf.push_str(s),
            Some(OutputSink::Standard) => {
                use std::io::Write;
                let _ = std::io::stdout().write_all(s.as_bytes());
            }
        }
    }

    pub fn flush_output(&mut self) {
        if let Some(OutputSink::Standard) = &self.stdout {
            use std::io::Write;
            let _ = std::io::stdout().flush();
        }
    }

    pub fn stdout_connected(&self) -> bool {
        self.stdout.is_some()
    }

    /// Detach the stdout handle; `print` becomes a no-op.
    pub fn disconnect_stdout(&mut self) {
        self.stdout = None;
    }

    pub fn set_stdout(&mut self, sink: OutputSink) {
        self.stdout = Some(sink);
    }

    pub fn take_output(&mut self) -> String {
        match &mut self.stdout {
            Some(OutputSink::Capture(buf)) => std::mem::take(buf),
            _ => String::new(),
        }
    }

    // ------------------------------------------------------------------
    // Calling
    // ------------------------------------------------------------------

    pub fn call(&mut self, callee: &Value, args: &[Value]) -> RunResult<Value> {
        self.call_kw(callee, args, &[])
    }

    pub fn call_kw(&mut self, callee: &Value, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
        if self.recursion_depth >= self.config.recursion_limit {
            return Err(recursion_error());
        }
        self.recursion_depth += 1;
        let result = self.call_inner(callee, args, kwargs);
        self.recursion_depth -= 1;
        result
    }

    /// Call back into possibly-interpreted code (a `key=` function, a
    /// `__prepare__` hook, an error handler). The caller's recursion and
    /// active-error bookkeeping is restored on every exit path.
    pub fn call_reentrant(&mut self, callee: &Value, args: &[Value]) -> RunResult<Value> {
        self.call_reentrant_kw(callee, args, &[])
    }

    pub fn call_reentrant_kw(
        &mut self,
        callee: &Value,
        args: &[Value],
        kwargs: &KwArgs,
    ) -> RunResult<Value> {
        let saved_depth = self.recursion_depth;
        let saved_error = self.active_error.take();
        let result = self.call_kw(callee, args, kwargs);
        self.recursion_depth = saved_depth;
        self.active_error = saved_error;
        result
    }

    fn call_inner(&mut self, callee: &Value, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
        match callee {
            Value::Function(f) => (f.func)(self, args, kwargs),
            Value::Type(t) => {
                let t = t.clone();
                self.call_type(&t, args, kwargs)
            }
            Value::Object(o) => {
                let hook = o.class.lookup("__call__").ok_or_else(|| {
                    type_error(format!("'{}' object is not callable", callee.type_name()))
                })?;
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(callee.clone());
                full.extend_from_slice(args);
                self.call_kw(&hook, &full, kwargs)
            }
            _ => Err(type_error(format!(
                "'{}' object is not callable",
                callee.type_name()
            ))),
        }
    }

    fn call_type(
        &mut self,
        t: &Rc<TypeObject>,
        args: &[Value],
        kwargs: &KwArgs,
    ) -> RunResult<Value> {
        if is_subtype(t, &self.core_types.type_) {
            // type(x) reflection and three-argument class construction
            if Rc::ptr_eq(t, &self.core_types.type_) && args.len() == 1 {
                return Ok(Value::Type(self.get_class(&args[0])));
            }
            if args.len() == 3 {
                return crate::builtins::class::type_new(
                    self, t, &args[0], &args[1], &args[2], kwargs,
                );
            }
            return Err(type_error(format!(
                "{}() takes 1 or 3 arguments",
                t.name()
            )));
        }
        let instance = Value::Object(InstanceObject::new(t.clone()));
        if let Some(init) = t.lookup("__init__") {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(instance.clone());
            full.extend_from_slice(args);
            let r = self.call_kw(&init, &full, kwargs)?;
            if !r.is_none() {
                return Err(type_error(format!(
                    "__init__() should return None, not '{}'",
                    r.type_name()
                )));
            }
        } else if !args.is_empty() || !kwargs.is_empty() {
            return Err(type_error(format!("{}() takes no arguments", t.name())));
        }
        Ok(instance)
    }

    // ------------------------------------------------------------------
    // Object protocol
    // ------------------------------------------------------------------

    pub fn get_class(&self, v: &Value) -> Rc<TypeObject> {
        let ct = &self.core_types;
        match v {
            Value::None => ct.none_type.clone(),
            Value::Bool(_) => ct.bool_.clone(),
            Value::Int(_) | Value::Big(_) => ct.int_.clone(),
            Value::Float(_) => ct.float_.clone(),
            Value::Str(_) => ct.str_.clone(),
            Value::Bytes(_) => ct.bytes_.clone(),
            Value::List(_) => ct.list_.clone(),
            Value::Tuple(_) => ct.tuple_.clone(),
            Value::Dict(_) => ct.dict_.clone(),
            Value::Type(t) => t.metaclass().unwrap_or_else(|| ct.type_.clone()),
            Value::Object(o) => o.class.clone(),
            Value::Function(_) => ct.function_.clone(),
            Value::Code(_) | Value::Ast(_) => ct.code_.clone(),
            Value::Iter(_) => ct.iterator_.clone(),
        }
    }

    /// Special-method lookup: on the type, never the instance dict.
    pub fn lookup_special(&self, v: &Value, name: &str) -> Option<Value> {
        match v {
            Value::Object(o) => o.class.lookup(name),
            Value::Type(t) => t.metaclass().and_then(|m| m.lookup(name)),
            _ => None,
        }
    }

    pub fn get_attr(&self, v: &Value, name: &str) -> RunResult<Value> {
        let found = match v {
            Value::Object(o) => o.get_attr(name),
            Value::Type(t) => t
                .lookup(name)
                .or_else(|| t.metaclass().and_then(|m| m.lookup(name))),
            _ => None,
        };
        found.ok_or_else(|| {
            attribute_error(format!(
                "'{}' object has no attribute '{name}'",
                v.type_name()
            ))
        })
    }

    pub fn set_attr(&mut self, v: &Value, name: &str, value: Value) -> RunResult<()> {
        match v {
            Value::Object(o) => {
                o.set_attr(name, value);
                Ok(())
            }
            Value::Type(t) => {
                t.set_attr(name, value);
                Ok(())
            }
            _ => Err(attribute_error(format!(
                "'{}' object has no settable attributes",
                v.type_name()
            ))),
        }
    }

    pub fn del_attr(&mut self, v: &Value, name: &str) -> RunResult<()> {
        let missing = || {
            attribute_error(format!(
                "'{}' object has no attribute '{name}'",
                v.type_name()
            ))
        };
        match v {
            Value::Object(o) => o
                .dict
                .borrow_mut()
                .shift_remove(&DictKey::from_str(name))
                .map(|_| ())
                .ok_or_else(missing),
            Value::Type(t) => t
                .namespace
                .borrow_mut()
                .shift_remove(&DictKey::from_str(name))
                .map(|_| ())
                .ok_or_else(missing),
            _ => Err(missing()),
        }
    }

    // ------------------------------------------------------------------
    // Iteration and truth
    // ------------------------------------------------------------------

    pub fn get_iter(&mut self, v: &Value) -> RunResult<Value> {
        let not_iterable =
            |v: &Value| type_error(format!("'{}' object is not iterable", v.type_name()));
        let state = match v {
            Value::Iter(_) => return Ok(v.clone()),
            Value::List(l) => IterState::Sequence {
                storage: l.clone(),
                index: 0,
            },
            Value::Tuple(t) => IterState::Tuple {
                items: t.clone(),
                index: 0,
            },
            Value::Str(s) => IterState::Chars {
                s: s.clone(),
                byte_pos: 0,
            },
            Value::Bytes(b) => IterState::Bytes {
                data: b.clone(),
                index: 0,
            },
            Value::Dict(d) => IterState::Keys {
                keys: d.borrow().keys().map(|k| k.to_value()).collect(),
                index: 0,
            },
            Value::Object(o) => {
                if let Some(hook) = o.class.lookup("__iter__") {
                    let it = self.call_reentrant(&hook, &[v.clone()])?;
                    return match &it {
                        Value::Iter(_) => Ok(it),
                        Value::Object(io) if io.class.lookup("__next__").is_some() => {
                            Ok(IterState::Object { obj: it.clone() }.into_value())
                        }
                        _ => Err(type_error(format!(
                            "iter() returned non-iterator of type '{}'",
                            it.type_name()
                        ))),
                    };
                }
                if o.class.lookup("__next__").is_some() {
                    IterState::Object { obj: v.clone() }
                } else {
                    return Err(not_iterable(v));
                }
            }
            _ => return Err(not_iterable(v)),
        };
        Ok(state.into_value())
    }

    /// Internal iteration step; `Ok(None)` is exhaustion.
    pub fn iter_next(&mut self, iterator: &Value) -> RunResult<Option<Value>> {
        iter_next(self, iterator)
    }

    pub fn is_truthy(&mut self, v: &Value) -> RunResult<bool> {
        if let Some(b) = v.is_truthy_fast() {
            return Ok(b);
        }
        if let Value::Object(o) = v {
            if let Some(hook) = o.class.lookup("__bool__") {
                let r = self.call_reentrant(&hook, &[v.clone()])?;
                return match r {
                    Value::Bool(b) => Ok(b),
                    _ => Err(type_error(format!(
                        "__bool__ should return bool, returned {}",
                        r.type_name()
                    ))),
                };
            }
            if let Some(hook) = o.class.lookup("__len__") {
                let r = self.call_reentrant(&hook, &[v.clone()])?;
                let n = r.as_index("__len__")?;
                if n < 0 {
                    return Err(value_error("__len__() should return >= 0"));
                }
                return Ok(n != 0);
            }
        }
        Ok(true)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
