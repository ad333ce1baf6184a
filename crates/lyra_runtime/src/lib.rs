//! Lyra language runtime core.
//!
//! The builtin-function layer and numeric/codec subsystem: a closed
//! tagged-value model, the multi-precision numeric tower, the math function
//! library, the resumable text-codec engine, the polymorphic builtin
//! dispatcher, and the class-construction protocol. The parser/compiler and
//! the interpreter loop are external collaborators consumed through
//! `lyra_ir::Frontend` and [`runtime::Interpreter`].

#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::get_first)]

pub mod core;
pub mod errors;
pub mod num;

pub mod builtins;
pub mod builtins_registry;
pub mod codecs;
pub mod math;
mod runtime;

// Re-exports from core/
pub use core::storage::SequenceStorage;
pub use core::type_obj::{InstanceObject, TypeObject};
pub use core::value::{BuiltinFunction, DictKey, KwArgs, NativeFn, Value};
pub use core::value::{repr_value, str_value, value_lt, values_equal};

// Re-exports from runtime/
pub use runtime::{CoreTypes, Interpreter, OutputSink, Runtime, RuntimeConfig};

// Re-exports from other modules
pub use builtins_registry::{
    BuiltinProvider, BuiltinRegistry, CodecsBuiltinProvider, MathBuiltinProvider,
    StdBuiltinProvider,
};
pub use errors::{ErrorKind, RunError, RunResult};
pub use lyra_ir::{CodeUnit, Frontend, ParseMode, SyntaxTree};
