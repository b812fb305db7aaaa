//! Error types.

use std::error;
use std::fmt;

/// Errors raised by this crate.
///
/// All variants signal programmer or input errors detected synchronously;
/// nothing here is transient or retried. A failed call never leaves a
/// network's stored weights partially modified.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Malformed network construction, or an operation attempted on a layer
    /// that cannot perform it (e.g. computing outputs for the input layer).
    Configuration(String),
    /// Malformed training data: shape mismatches, NaN values, or split
    /// ratios that do not sum to one.
    Validation(String),
    /// A flat weight vector of the wrong length, or weight-range bookkeeping
    /// that runs past the end of the buffer.
    Shape(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Error::Configuration(ref msg) => {
                write!(f, "configuration error: {}", msg)
            }
            &Error::Validation(ref msg) => {
                write!(f, "validation error: {}", msg)
            }
            &Error::Shape(ref msg) => write!(f, "shape error: {}", msg),
        }
    }
}

impl error::Error for Error {
    fn description(&self) -> &str {
        match self {
            &Error::Configuration(_) => "configuration error",
            &Error::Validation(_) => "validation error",
            &Error::Shape(_) => "shape error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let err = Error::Shape("expected 9 weights, got 8".to_string());
        assert_eq!(format!("{}", err), "shape error: expected 9 weights, got 8");
    }
}
