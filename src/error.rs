use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed program text. Fatal to the load; nothing is installed.
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("variable '{0}' is not defined")]
    UndefinedVariable(String),

    /// An argument that is neither an integer literal nor a variable name.
    #[error("invalid value or undefined variable: '{0}'")]
    InvalidValue(String),

    #[error("'{command}' expects {expected} argument(s), got {found}")]
    Arity {
        command: String,
        expected: usize,
        found: usize,
    },

    #[error("integer overflow updating variable '{0}'")]
    Overflow(String),

    #[error("cannot read program '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("program did not finish within {0} steps")]
    StepLimit(u64),
}
