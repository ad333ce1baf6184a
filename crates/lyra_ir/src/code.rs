use crate::ParseMode;

/// Compile-flag bits accepted by the front end.
///
/// Unknown bits are rejected by the runtime before the front end ever sees
/// them.
pub mod flags {
    /// Stop after parsing and return the syntax tree itself.
    pub const AST_ONLY: u32 = 0x0400;
    /// Source bytes are known to be UTF-8 (skips the coding-declaration scan).
    pub const SOURCE_IS_UTF8: u32 = 0x0100;
    /// Interactive input: an unterminated block is an incomplete-input error,
    /// not a syntax error.
    pub const DONT_IMPLY_DEDENT: u32 = 0x0200;
    /// Retain type comments in the tree.
    pub const TYPE_COMMENTS: u32 = 0x1000;
    /// Permit `await` at module top level.
    pub const ALLOW_TOP_LEVEL_AWAIT: u32 = 0x2000;

    /// Every bit the front end understands.
    pub const MASK: u32 =
        AST_ONLY | SOURCE_IS_UTF8 | DONT_IMPLY_DEDENT | TYPE_COMMENTS | ALLOW_TOP_LEVEL_AWAIT;
}

/// Executable unit produced by [`crate::Frontend::compile`].
///
/// Opaque to the runtime core: only the interpreter capability knows how to
/// run one. Filename/mode/flags are carried for error messages and for
/// `compile()` pass-through.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeUnit {
    pub filename: String,
    pub mode: ParseMode,
    pub flags: u32,
    pub source: String,
}
