//! Runtime error taxonomy and common message constants.

use std::fmt;

/// The closed set of error categories the core can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    TypeError,
    ValueError,
    OverflowError,
    ZeroDivisionError,
    LookupError,
    KeyError,
    AttributeError,
    UnicodeDecodeError,
    UnicodeEncodeError,
    StopIteration,
    RecursionError,
    SyntaxError,
    RuntimeError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::OverflowError => "OverflowError",
            ErrorKind::ZeroDivisionError => "ZeroDivisionError",
            ErrorKind::LookupError => "LookupError",
            ErrorKind::KeyError => "KeyError",
            ErrorKind::AttributeError => "AttributeError",
            ErrorKind::UnicodeDecodeError => "UnicodeDecodeError",
            ErrorKind::UnicodeEncodeError => "UnicodeEncodeError",
            ErrorKind::StopIteration => "StopIteration",
            ErrorKind::RecursionError => "RecursionError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::RuntimeError => "RuntimeError",
        }
    }
}

/// A raised runtime error: category plus rendered message.
#[derive(Clone, Debug, PartialEq)]
pub struct RunError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RunError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(self.kind.name())
        } else {
            write!(f, "{}: {}", self.kind.name(), self.message)
        }
    }
}

impl std::error::Error for RunError {}

pub type RunResult<T> = Result<T, RunError>;

pub fn type_error(message: impl Into<String>) -> RunError {
    RunError::new(ErrorKind::TypeError, message)
}

pub fn value_error(message: impl Into<String>) -> RunError {
    RunError::new(ErrorKind::ValueError, message)
}

pub fn overflow_error(message: impl Into<String>) -> RunError {
    RunError::new(ErrorKind::OverflowError, message)
}

pub fn zero_division(message: impl Into<String>) -> RunError {
    RunError::new(ErrorKind::ZeroDivisionError, message)
}

pub fn lookup_error(message: impl Into<String>) -> RunError {
    RunError::new(ErrorKind::LookupError, message)
}

pub fn key_error(message: impl Into<String>) -> RunError {
    RunError::new(ErrorKind::KeyError, message)
}

pub fn attribute_error(message: impl Into<String>) -> RunError {
    RunError::new(ErrorKind::AttributeError, message)
}

pub fn stop_iteration() -> RunError {
    RunError::new(ErrorKind::StopIteration, "")
}

pub fn recursion_error() -> RunError {
    RunError::new(ErrorKind::RecursionError, messages::RECURSION_LIMIT)
}

pub fn runtime_error(message: impl Into<String>) -> RunError {
    RunError::new(ErrorKind::RuntimeError, message)
}

pub mod messages {
    pub const MATH_DOMAIN: &str = "math domain error";
    pub const MATH_RANGE: &str = "math range error";
    pub const DIVISION_BY_ZERO: &str = "division by zero";
    pub const INT_TOO_LARGE_FOR_FLOAT: &str = "int too large to convert to float";
    pub const FACTORIAL_NEGATIVE: &str = "factorial() not defined for negative values";
    pub const RECURSION_LIMIT: &str = "maximum recursion depth exceeded";
    pub const METACLASS_CONFLICT: &str = "metaclass conflict: the metaclass of a derived class \
must be a (non-strict) subclass of the metaclasses of all its bases";
}
