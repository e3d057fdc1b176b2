// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Path and Argument Validation
//!
//! Defence-in-depth checks applied to CLI-supplied paths (`--config`,
//! `--database-url` when it names a file) before they reach the rest of the
//! application. Clap already enforces types and required-ness; this module
//! blocks the patterns an operator's shell history or a copy-pasted command
//! could smuggle in: traversal, shell metacharacters, and access to
//! filesystem locations AetherFrame has no legitimate reason to touch.

use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_ARG_LENGTH: usize = 1000;
const MAX_PATH_LENGTH: usize = 4096;

const DANGEROUS_PATTERNS: &[&str] = &["..", "~", "$", "`", ";", "&", "|", ">", "<", "\n", "\r", "\0"];

const PROTECTED_DIRS: &[&str] = &["/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("argument too long (max {MAX_ARG_LENGTH} characters): {0}")]
    ArgumentTooLong(String),

    #[error("dangerous pattern '{pattern}' detected in argument: {arg}")]
    DangerousPattern { pattern: String, arg: String },

    #[error("path exceeds maximum length ({MAX_PATH_LENGTH})")]
    PathTooLong,

    #[error("access to protected system directory denied: {0}")]
    ProtectedDirectory(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid value for {arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

pub struct PathValidator;

impl PathValidator {
    /// Rejects arguments that are too long or contain shell/path-traversal
    /// metacharacters.
    pub fn validate_argument(arg: &str) -> Result<(), ValidationError> {
        if arg.len() > MAX_ARG_LENGTH {
            return Err(ValidationError::ArgumentTooLong(arg.chars().take(50).collect::<String>() + "..."));
        }

        for pattern in DANGEROUS_PATTERNS {
            if arg.contains(pattern) {
                return Err(ValidationError::DangerousPattern { pattern: pattern.to_string(), arg: arg.to_string() });
            }
        }

        Ok(())
    }

    /// Validates, canonicalizes, and rejects a path outside what AetherFrame
    /// should ever read from or write to.
    pub fn validate_path(path: &str) -> Result<PathBuf, ValidationError> {
        Self::validate_argument(path).map_err(|e| match e {
            ValidationError::ArgumentTooLong(_) => ValidationError::InvalidPath(format!("path too long: {path}")),
            ValidationError::DangerousPattern { pattern, .. } => {
                ValidationError::InvalidPath(format!("path contains dangerous pattern '{pattern}': {path}"))
            }
            other => other,
        })?;

        let raw = Path::new(path);
        let canonical = raw.canonicalize().map_err(|e| {
            if !raw.exists() {
                ValidationError::PathNotFound(path.to_string())
            } else {
                ValidationError::InvalidPath(format!("{path}: {e}"))
            }
        })?;

        if canonical.to_string_lossy().len() > MAX_PATH_LENGTH {
            return Err(ValidationError::PathTooLong);
        }

        for protected in PROTECTED_DIRS {
            if canonical.starts_with(protected) {
                return Err(ValidationError::ProtectedDirectory(canonical.display().to_string()));
            }
        }

        Ok(canonical)
    }

    pub fn validate_optional_path(path: Option<&str>) -> Result<Option<PathBuf>, ValidationError> {
        path.map(Self::validate_path).transpose()
    }

    pub fn validate_number<T>(arg_name: &str, value: &str, min: Option<T>, max: Option<T>) -> Result<T, ValidationError>
    where
        T: std::str::FromStr + PartialOrd + std::fmt::Display,
    {
        Self::validate_argument(value)?;

        let num = value
            .parse::<T>()
            .map_err(|_| ValidationError::InvalidValue { arg: arg_name.to_string(), reason: format!("not a valid number: {value}") })?;

        if let Some(min_val) = min {
            if num < min_val {
                return Err(ValidationError::InvalidValue {
                    arg: arg_name.to_string(),
                    reason: format!("{value} is less than minimum {min_val}"),
                });
            }
        }

        if let Some(max_val) = max {
            if num > max_val {
                return Err(ValidationError::InvalidValue {
                    arg: arg_name.to_string(),
                    reason: format!("{value} is greater than maximum {max_val}"),
                });
            }
        }

        Ok(num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_safe_arguments() {
        assert!(PathValidator::validate_argument("safe-arg").is_ok());
        assert!(PathValidator::validate_argument("config.yaml").is_ok());
        assert!(PathValidator::validate_argument("path/to/file").is_ok());
    }

    #[test]
    fn rejects_too_long_arguments() {
        let long_arg = "a".repeat(MAX_ARG_LENGTH + 1);
        assert!(matches!(PathValidator::validate_argument(&long_arg), Err(ValidationError::ArgumentTooLong(_))));
    }

    #[test]
    fn detects_dangerous_patterns() {
        let dangerous = ["../etc/passwd", "~/.ssh/id_rsa", "$(whoami)", "`ls`", "file;rm -rf /", "file|pipe"];

        for arg in dangerous {
            assert!(
                matches!(PathValidator::validate_argument(arg), Err(ValidationError::DangerousPattern { .. })),
                "failed to detect dangerous pattern in: {arg}"
            );
        }
    }

    #[test]
    fn validates_numbers_within_range() {
        assert_eq!(PathValidator::validate_number::<usize>("max-concurrent-jobs", "8", Some(1), Some(64)).unwrap(), 8);
        assert!(PathValidator::validate_number::<usize>("max-concurrent-jobs", "0", Some(1), Some(64)).is_err());
        assert!(PathValidator::validate_number::<usize>("max-concurrent-jobs", "not-a-number", None, None).is_err());
    }

    #[test]
    fn rejects_paths_to_protected_system_directories() {
        assert!(matches!(PathValidator::validate_path("/etc/passwd"), Err(ValidationError::ProtectedDirectory(_))));
    }

    #[test]
    fn rejects_nonexistent_paths() {
        assert!(matches!(
            PathValidator::validate_path("/tmp/aetherframe-definitely-does-not-exist-12345"),
            Err(ValidationError::PathNotFound(_))
        ));
    }
}
