// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Windows implementation of [`Platform`].
//!
//! Built on Windows; builds with stub bodies on other targets so the crate
//! still cross-compiles when this module is force-included for tooling.

use super::{Platform, PlatformError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        Self
    }

    #[cfg(windows)]
    fn memory_info() -> Result<(u64, u64), PlatformError> {
        use std::mem;
        use winapi::um::sysinfoapi::{GlobalMemoryStatusEx, MEMORYSTATUSEX};

        unsafe {
            let mut status: MEMORYSTATUSEX = mem::zeroed();
            status.dwLength = mem::size_of::<MEMORYSTATUSEX>() as u32;
            if GlobalMemoryStatusEx(&mut status) != 0 {
                Ok((status.ullTotalPhys, status.ullAvailPhys))
            } else {
                Err(PlatformError::Other("GlobalMemoryStatusEx failed".to_string()))
            }
        }
    }

    #[cfg(not(windows))]
    fn memory_info() -> Result<(u64, u64), PlatformError> {
        Err(PlatformError::NotSupported("Windows memory APIs unavailable on this target".to_string()))
    }

    #[cfg(windows)]
    fn system_info() -> winapi::um::sysinfoapi::SYSTEM_INFO {
        use std::mem;
        use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};
        unsafe {
            let mut info: SYSTEM_INFO = mem::zeroed();
            GetSystemInfo(&mut info);
            info
        }
    }
}

impl Default for WindowsPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for WindowsPlatform {
    fn page_size(&self) -> usize {
        #[cfg(windows)]
        {
            Self::system_info().dwPageSize as usize
        }
        #[cfg(not(windows))]
        {
            4096
        }
    }

    fn cpu_count(&self) -> usize {
        #[cfg(windows)]
        {
            Self::system_info().dwNumberOfProcessors as usize
        }
        #[cfg(not(windows))]
        {
            1
        }
    }

    fn total_memory(&self) -> Result<u64, PlatformError> {
        Self::memory_info().map(|(total, _)| total)
    }

    fn available_memory(&self) -> Result<u64, PlatformError> {
        Self::memory_info().map(|(_, available)| available)
    }

    fn line_separator(&self) -> &'static str {
        "\r\n"
    }

    fn path_separator(&self) -> char {
        ';'
    }

    fn platform_name(&self) -> &'static str {
        "windows"
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        #[cfg(windows)]
        {
            use winapi::um::shellapi::IsUserAnAdmin;
            unsafe { IsUserAnAdmin() != 0 }
        }
        #[cfg(not(windows))]
        {
            false
        }
    }

    fn set_permissions(&self, _path: &Path, _mode: u32) -> Result<(), PlatformError> {
        // Unix mode bits have no Windows equivalent; ACLs are out of scope.
        Ok(())
    }

    fn is_executable(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
            Some("exe") | Some("bat") | Some("cmd") | Some("com")
        )
    }

    async fn sync_file(&self, file: &tokio::fs::File) -> Result<(), PlatformError> {
        file.sync_all().await?;
        Ok(())
    }
}

#[cfg(all(test, windows))]
mod tests {
    use super::*;

    #[test]
    fn reports_plausible_system_constants() {
        let platform = WindowsPlatform::new();
        assert!(platform.cpu_count() >= 1);
        assert_eq!(platform.line_separator(), "\r\n");
        assert_eq!(platform.path_separator(), ';');
    }

    #[test]
    fn is_executable_checks_extension() {
        let platform = WindowsPlatform::new();
        assert!(platform.is_executable(Path::new(r"C:\tools\sample.EXE")));
        assert!(!platform.is_executable(Path::new(r"C:\tools\sample.dll")));
    }
}
