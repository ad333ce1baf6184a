//! Runtime configuration.

/// Runtime configuration options.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeConfig {
    /// Depth bound for reentrant calls (builtin -> hook -> builtin ...).
    pub recursion_limit: usize,
    /// Above this depth, isinstance/issubclass tuple recursion switches to
    /// an explicit worklist.
    pub type_check_recursion_limit: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 1000,
            type_check_recursion_limit: 64,
        }
    }
}
