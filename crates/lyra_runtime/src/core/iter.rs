//! Iterator protocol internals.
//!
//! Exhaustion is `Ok(None)` everywhere inside the runtime; only the `next`
//! builtin converts it to a user-visible StopIteration at the protocol
//! boundary.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::storage::SequenceStorage;
use crate::core::value::{Value, values_equal};
use crate::errors::{ErrorKind, RunResult, type_error};
use crate::runtime::Runtime;

pub enum IterState {
    /// Cursor over list storage; reads through the `RefCell` on every step so
    /// concurrent mutation is observed, not cached away.
    Sequence {
        storage: Rc<RefCell<SequenceStorage>>,
        index: usize,
    },
    Tuple {
        items: Rc<[Value]>,
        index: usize,
    },
    Chars {
        s: Rc<str>,
        byte_pos: usize,
    },
    Bytes {
        data: Rc<[u8]>,
        index: usize,
    },
    /// Dict key snapshot taken when iteration starts.
    Keys {
        keys: Vec<Value>,
        index: usize,
    },
    /// `iter(callable, sentinel)` form.
    Callable {
        callable: Value,
        sentinel: Value,
        done: bool,
    },
    /// Object implementing `__next__`.
    Object {
        obj: Value,
    },
}

impl IterState {
    pub fn into_value(self) -> Value {
        Value::Iter(Rc::new(RefCell::new(self)))
    }
}

/// Advance an iterator value. `Ok(None)` signals exhaustion.
pub fn iter_next(rt: &mut Runtime, iterator: &Value) -> RunResult<Option<Value>> {
    let state = match iterator {
        Value::Iter(state) => state.clone(),
        _ => {
            return Err(type_error(format!(
                "'{}' object is not an iterator",
                iterator.type_name()
            )));
        }
    };

    // Decide the step without holding the borrow across a reentrant call.
    enum Step {
        Yield(Value),
        Done,
        CallCallable(Value, Value),
        CallDunder(Value),
    }

    let step = {
        let mut st = state.borrow_mut();
        match &mut *st {
            IterState::Sequence { storage, index } => match storage.borrow().get(*index) {
                Some(v) => {
                    *index += 1;
                    Step::Yield(v)
                }
                None => Step::Done,
            },
            IterState::Tuple { items, index } => match items.get(*index) {
                Some(v) => {
                    *index += 1;
                    Step::Yield(v.clone())
                }
                None => Step::Done,
            },
            IterState::Chars { s, byte_pos } => match s[*byte_pos..].chars().next() {
                Some(c) => {
                    *byte_pos += c.len_utf8();
                    Step::Yield(Value::str(c.to_string()))
                }
                None => Step::Done,
            },
            IterState::Bytes { data, index } => match data.get(*index) {
                Some(b) => {
                    *index += 1;
                    Step::Yield(Value::Int(*b as i64))
                }
                None => Step::Done,
            },
            IterState::Keys { keys, index } => match keys.get(*index) {
                Some(v) => {
                    *index += 1;
                    Step::Yield(v.clone())
                }
                None => Step::Done,
            },
            IterState::Callable {
                callable,
                sentinel,
                done,
            } => {
                if *done {
                    Step::Done
                } else {
                    Step::CallCallable(callable.clone(), sentinel.clone())
                }
            }
            IterState::Object { obj } => Step::CallDunder(obj.clone()),
        }
    };

    match step {
        Step::Yield(v) => Ok(Some(v)),
        Step::Done => Ok(None),
        Step::CallCallable(callable, sentinel) => {
            let produced = rt.call(&callable, &[])?;
            if values_equal(&produced, &sentinel) {
                if let IterState::Callable { done, .. } = &mut *state.borrow_mut() {
                    *done = true;
                }
                Ok(None)
            } else {
                Ok(Some(produced))
            }
        }
        Step::CallDunder(obj) => {
            let next = rt
                .lookup_special(&obj, "__next__")
                .ok_or_else(|| {
                    type_error(format!("'{}' object is not an iterator", obj.type_name()))
                })?;
            match rt.call(&next, &[obj]) {
                Ok(v) => Ok(Some(v)),
                Err(e) if e.is(ErrorKind::StopIteration) => Ok(None),
                Err(e) => Err(e),
            }
        }
    }
}
