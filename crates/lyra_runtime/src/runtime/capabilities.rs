//! Interpreter capability consumed from the embedder.
//!
//! The runtime core never executes code units itself; `eval`/`exec` and
//! class-body execution delegate here. The front end counterpart lives in
//! `lyra_ir::Frontend`.

use lyra_ir::CodeUnit;

use crate::core::value::Value;
use crate::errors::RunResult;
use crate::runtime::Runtime;

pub trait Interpreter {
    /// Run a code unit against explicit global/local namespaces.
    fn invoke(
        &self,
        rt: &mut Runtime,
        code: &CodeUnit,
        globals: &Value,
        locals: &Value,
    ) -> RunResult<Value>;

    /// The currently-executing frame's global namespace.
    fn current_globals(&self, rt: &mut Runtime) -> RunResult<Value>;

    /// The currently-executing frame's local namespace.
    fn current_locals(&self, rt: &mut Runtime) -> RunResult<Value>;
}
