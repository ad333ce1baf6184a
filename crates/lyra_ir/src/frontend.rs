use crate::{CodeUnit, ParseMode, SyntaxTree};

/// Parse or compile failure reported by the front end.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontendError {
    pub message: String,
    pub filename: String,
    pub line: Option<usize>,
}

impl FrontendError {
    pub fn new(message: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            filename: filename.into(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// The parser/compiler capability the runtime core consumes.
///
/// Implementations live outside this workspace; tests use a trivial
/// source-preserving stand-in.
pub trait Frontend {
    fn parse(
        &self,
        source: &str,
        filename: &str,
        mode: ParseMode,
        flags: u32,
    ) -> Result<SyntaxTree, FrontendError>;

    fn compile(&self, tree: &SyntaxTree, flags: u32) -> Result<CodeUnit, FrontendError>;
}

/// Frontend that records the source verbatim. Suitable for embedders that
/// interpret source directly and for tests.
pub struct PassthroughFrontend;

impl Frontend for PassthroughFrontend {
    fn parse(
        &self,
        source: &str,
        filename: &str,
        mode: ParseMode,
        _flags: u32,
    ) -> Result<SyntaxTree, FrontendError> {
        Ok(SyntaxTree::new(filename, mode, source))
    }

    fn compile(&self, tree: &SyntaxTree, flags: u32) -> Result<CodeUnit, FrontendError> {
        Ok(CodeUnit {
            filename: tree.filename.clone(),
            mode: tree.mode,
            flags,
            source: tree.source.clone(),
        })
    }
}
