use thiserror::Error;

/// A single error produced while parsing or compiling. Errors are
/// collected rather than aborting the compilation, so one bad statement
/// does not hide problems in its siblings.
#[derive(Debug, Clone, Error)]
#[error("[line {line}] Error: {message}")]
pub struct CompileError {
    pub line: usize,
    pub message: String,
}

impl CompileError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        CompileError {
            line,
            message: message.into(),
        }
    }
}

/// A runtime fault. The VM never recovers from these internally; the
/// current run halts and the host decides what to do next.
#[derive(Debug, Clone, Error)]
#[error("[line {line}] {message}")]
pub struct RuntimeError {
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        RuntimeError {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PhasaError {
    #[error("compilation failed")]
    Compile(Vec<CompileError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
