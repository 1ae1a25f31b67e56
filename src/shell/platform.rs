//! Platform-specific command interpreter detection.

/// Command interpreter used to run user command strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// Interpreter executable.
    pub program: &'static str,

    /// Flag that makes the interpreter run the next argument.
    pub flag: &'static str,

    /// Exit code the interpreter reports for an unknown command.
    pub not_found_code: i32,
}

impl Interpreter {
    /// POSIX `sh -c`.
    pub const POSIX: Interpreter = Interpreter {
        program: "sh",
        flag: "-c",
        not_found_code: 127,
    };

    /// Windows `cmd /C`.
    pub const WINDOWS: Interpreter = Interpreter {
        program: "cmd",
        flag: "/C",
        not_found_code: 9009,
    };

    /// Interpreter of the current platform.
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Self::WINDOWS
        } else {
            Self::POSIX
        }
    }
}
