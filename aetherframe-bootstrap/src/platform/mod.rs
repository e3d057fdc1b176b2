// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Platform Abstraction
//!
//! OS-specific facts the bootstrap layer needs before the rest of the
//! application starts: CPU count (default worker concurrency), temp/workspace
//! directory, and process privilege level. Lives outside the layered
//! application so it is the one place conditional compilation is allowed.
//!
//! - `UnixPlatform`: POSIX implementation (Linux + macOS)
//! - `WindowsPlatform`: Windows API implementation
//! - Selection is compile-time, via `#[cfg]`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::UnixPlatform;

#[cfg(windows)]
pub use windows::WindowsPlatform;

/// Platform-specific errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not supported on this platform: {0}")]
    NotSupported(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("platform error: {0}")]
    Other(String),
}

/// Platform abstraction trait for OS-specific operations.
///
/// All methods are stateless and thread-safe; implementations use native
/// platform APIs (`libc` on Unix, `winapi` on Windows) with standard-library
/// fallbacks where the native call is unavailable.
#[async_trait]
pub trait Platform: Send + Sync {
    /// System page size in bytes, used to size memory-mapped reads of large
    /// targets (memory dumps, APK archives).
    fn page_size(&self) -> usize;

    /// Number of logical CPUs, used as the default worker pool concurrency
    /// when `max_concurrent_jobs` is not configured explicitly.
    fn cpu_count(&self) -> usize;

    /// Total physical memory in bytes.
    fn total_memory(&self) -> Result<u64, PlatformError>;

    /// Available (free) memory in bytes.
    fn available_memory(&self) -> Result<u64, PlatformError>;

    /// Platform line separator (`"\n"` on Unix, `"\r\n"` on Windows).
    fn line_separator(&self) -> &'static str;

    /// PATH environment variable separator (`':'` on Unix, `';'` on Windows).
    fn path_separator(&self) -> char;

    /// Platform identifier: `"linux"`, `"macos"`, `"windows"`.
    fn platform_name(&self) -> &'static str;

    /// System temp directory, used as the default parent of per-job
    /// workspace directories when `workspace_base` is not configured.
    fn temp_dir(&self) -> PathBuf;

    /// True if running with elevated privileges (root / Administrator).
    fn is_elevated(&self) -> bool;

    /// Set Unix permission bits on a path; no-op on Windows.
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError>;

    /// True if the path points to an executable file.
    fn is_executable(&self, path: &Path) -> bool;

    /// Flush a file's buffers to disk, used after writing extracted
    /// artifacts so they survive an immediate crash.
    async fn sync_file(&self, file: &tokio::fs::File) -> Result<(), PlatformError>;
}

#[cfg(unix)]
type PlatformImpl = UnixPlatform;

#[cfg(windows)]
type PlatformImpl = WindowsPlatform;

/// Construct the platform implementation for the current target.
pub fn create_platform() -> Box<dyn Platform> {
    Box::new(PlatformImpl::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_at_least_one_cpu_and_a_sane_page_size() {
        let platform = create_platform();
        assert!(platform.cpu_count() >= 1);
        let page_size = platform.page_size();
        assert!((512..=65536).contains(&page_size));
        assert!(!platform.platform_name().is_empty());
    }

    #[test]
    fn reports_the_expected_separators_for_this_target() {
        let platform = create_platform();

        #[cfg(unix)]
        {
            assert_eq!(platform.line_separator(), "\n");
            assert_eq!(platform.path_separator(), ':');
        }
        #[cfg(windows)]
        {
            assert_eq!(platform.line_separator(), "\r\n");
            assert_eq!(platform.path_separator(), ';');
        }
    }
}
