//! Error type shared by the loader, the formulation and the solver boundary.

use std::fmt;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, CdpError>;

/// Errors surfaced by the library.
///
/// A dead-end action in the constructive engine is not an error: `extend`
/// returns `None` for it.
#[derive(Debug)]
pub enum CdpError {
    /// The instance file could not be read.
    Io(std::io::Error),
    /// The problem description is malformed. `line` is 1-based when known.
    Parse { line: Option<usize>, message: String },
    /// The instance is well-formed but cannot be routed at all
    /// (no vehicles, a zero capacity, no relay station, ...).
    InfeasibleInstance(String),
    /// The MIP engine proved infeasibility or hit a limit without an incumbent.
    NoSolutionFound { status: String },
    /// The MIP engine itself failed or is not available in this build.
    Solver(String),
}

impl CdpError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        CdpError::Parse { line: Some(line), message: message.into() }
    }

    pub(crate) fn parse_global(message: impl Into<String>) -> Self {
        CdpError::Parse { line: None, message: message.into() }
    }
}

impl fmt::Display for CdpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CdpError::Io(e) => write!(f, "I/O error: {}", e),
            CdpError::Parse { line: Some(line), message } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            CdpError::Parse { line: None, message } => write!(f, "Parse error: {}", message),
            CdpError::InfeasibleInstance(msg) => write!(f, "Infeasible instance: {}", msg),
            CdpError::NoSolutionFound { status } => {
                write!(f, "No solution found (solver status: {})", status)
            }
            CdpError::Solver(msg) => write!(f, "Solver error: {}", msg),
        }
    }
}

impl std::error::Error for CdpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CdpError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CdpError {
    fn from(e: std::io::Error) -> Self {
        CdpError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_line() {
        let err = CdpError::parse(7, "time window start 30 exceeds end 10");
        assert_eq!(
            err.to_string(),
            "Parse error at line 7: time window start 30 exceeds end 10"
        );
    }

    #[test]
    fn test_io_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CdpError = io.into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
