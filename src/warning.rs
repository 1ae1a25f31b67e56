//! The comparable representation of one analyzer finding.

use std::fmt;
use std::path::PathBuf;

/// One finding at one location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Warning {
    /// Finding text.
    pub message: String,

    /// 1-based line.
    pub line: u32,

    /// 1-based column.
    pub column: u32,

    /// File path relative to the test root.
    pub file_name: PathBuf,
}

impl Warning {
    /// Create a warning.
    pub fn new(
        message: impl Into<String>,
        line: u32,
        column: u32,
        file_name: impl Into<PathBuf>,
    ) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            file_name: file_name.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file_name.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        let a = Warning::new("unused variable", 3, 7, "suite/FooTest.kt");
        let b = Warning::new("unused variable".to_string(), 3, 7, PathBuf::from("suite/FooTest.kt"));
        assert_eq!(a, b);
        assert_ne!(a, Warning::new("unused variable", 3, 8, "suite/FooTest.kt"));
    }

    #[test]
    fn displays_like_compiler_output() {
        let warning = Warning::new("missing newline", 1, 1, "FooTest.kt");
        assert_eq!(warning.to_string(), "FooTest.kt:1:1: missing newline");
    }
}
