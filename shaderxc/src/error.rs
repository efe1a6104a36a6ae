//! Internal/fatal error type. Recoverable, user-facing failures go through
//! [`crate::report::Report`] instead — see spec §7's propagation policy.
use core::fmt;

/// Errors that abort a `compile()` call outright rather than flowing through
/// the diagnostic sink: I/O failures opening a root source, and internal
/// precondition violations (always fatal, tagged with the function that
/// detected them).
#[derive(Debug)]
pub enum CompileError {
    IoErr(std::io::Error),
    InternalErr { function: &'static str, message: String },
    EntryPointNotFound(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::IoErr(err) => write!(f, "I/O error: {}", err),
            CompileError::InternalErr { function, message } => {
                write!(f, "internal error in {}: {}", function, message)
            }
            CompileError::EntryPointNotFound(name) => {
                write!(f, "entry point '{}' not found", name)
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        CompileError::IoErr(err)
    }
}

/// Shorthand for raising an internal error tagged with the current function name.
macro_rules! internal_err {
    ($fname:expr, $($arg:tt)*) => {
        $crate::error::CompileError::InternalErr { function: $fname, message: format!($($arg)*) }
    };
}
pub(crate) use internal_err;
