// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Exit Codes
//!
//! Unix exit codes following BSD `sysexits.h` conventions, so an operator
//! running `aetherframe serve` from a supervisor (systemd, Docker healthcheck)
//! can distinguish a configuration mistake from a transient I/O failure
//! without parsing log output.

use std::fmt;

/// Exit codes returned by the `aetherframe` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,

    /// General error, no more specific code applies.
    Error = 1,

    /// Invalid arguments, missing required flag, unknown subcommand (64).
    UsageError = 64,

    /// Malformed configuration file or migration file (65).
    DataError = 65,

    /// Required input (config file, target, database file) not found (66).
    NoInput = 66,

    /// A required collaborator is not reachable: database, bind address
    /// already in use (69).
    Unavailable = 69,

    /// Internal invariant violation (70).
    Software = 70,

    /// I/O error reading or writing a file (74).
    IoError = 74,

    /// Insufficient permissions (77).
    NoPerm = 77,

    /// Configuration failed validation (78).
    Config = 78,

    /// SIGINT received (130).
    Interrupted = 130,

    /// SIGTERM received (143).
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a boxed error's message to the closest matching exit code.
    ///
    /// This is a best-effort heuristic for top-level error reporting in
    /// `main`, not a substitute for callers returning a specific `ExitCode`
    /// where they know exactly what went wrong.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let text = error.to_string().to_lowercase();

        if text.contains("permission") || text.contains("access denied") {
            ExitCode::NoPerm
        } else if text.contains("not found") || text.contains("no such") {
            ExitCode::NoInput
        } else if text.contains("config") {
            ExitCode::Config
        } else if text.contains("invalid") || text.contains("argument") {
            ExitCode::UsageError
        } else if text.contains("parse") || text.contains("format") || text.contains("migrat") {
            ExitCode::DataError
        } else if text.contains("unavailable") || text.contains("address in use") || text.contains("connect") {
            ExitCode::Unavailable
        } else if text.contains("io") || text.contains("read") || text.contains("write") {
            ExitCode::IoError
        } else {
            ExitCode::Error
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "success",
            ExitCode::Error => "general error",
            ExitCode::UsageError => "command line usage error",
            ExitCode::DataError => "data format error",
            ExitCode::NoInput => "cannot open input",
            ExitCode::Unavailable => "required service unavailable",
            ExitCode::Software => "internal software error",
            ExitCode::IoError => "I/O error",
            ExitCode::NoPerm => "permission denied",
            ExitCode::Config => "configuration error",
            ExitCode::Interrupted => "interrupted by SIGINT",
            ExitCode::Terminated => "terminated by SIGTERM",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_values_match_sysexits() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::UsageError.as_i32(), 64);
        assert_eq!(ExitCode::Config.as_i32(), 78);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::Terminated.as_i32(), 143);
    }

    #[test]
    fn classifies_common_error_messages() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        assert_eq!(ExitCode::from_error(&err), ExitCode::NoPerm);

        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found");
        assert_eq!(ExitCode::from_error(&err), ExitCode::NoInput);
    }

    #[test]
    fn is_signal_only_true_for_interrupted_and_terminated() {
        assert!(ExitCode::Interrupted.is_signal());
        assert!(ExitCode::Terminated.is_signal());
        assert!(!ExitCode::Success.is_signal());
        assert!(!ExitCode::Config.is_signal());
    }

    #[test]
    fn default_is_success() {
        assert_eq!(ExitCode::default(), ExitCode::Success);
    }
}
