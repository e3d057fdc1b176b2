// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! POSIX implementation of [`Platform`], covering Linux and macOS.

use super::{Platform, PlatformError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct UnixPlatform;

impl UnixPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

fn page_size_impl() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

#[cfg(target_os = "linux")]
fn get_memory_info() -> Result<(u64, u64), PlatformError> {
    let contents = std::fs::read_to_string("/proc/meminfo")?;
    let mut total = None;
    let mut available = None;

    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total = parse_kb_field(rest);
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available = parse_kb_field(rest);
        }
    }

    match (total, available) {
        (Some(t), Some(a)) => Ok((t, a)),
        _ => Err(PlatformError::Other("MemTotal/MemAvailable not found in /proc/meminfo".to_string())),
    }
}

#[cfg(target_os = "linux")]
fn parse_kb_field(rest: &str) -> Option<u64> {
    rest.trim().strip_suffix("kB").map(str::trim).and_then(|kb| kb.parse::<u64>().ok()).map(|kb| kb * 1024)
}

#[cfg(target_os = "macos")]
fn get_memory_info() -> Result<(u64, u64), PlatformError> {
    use std::mem;

    let total: u64 = unsafe {
        let mut value: u64 = 0;
        let mut len = mem::size_of::<u64>();
        let name = std::ffi::CString::new("hw.memsize").unwrap();
        let rc = libc::sysctlbyname(
            name.as_ptr(),
            &mut value as *mut _ as *mut libc::c_void,
            &mut len,
            std::ptr::null_mut(),
            0,
        );
        if rc != 0 {
            return Err(PlatformError::Other("sysctlbyname(hw.memsize) failed".to_string()));
        }
        value
    };

    let page_size = page_size_impl() as u64;
    let free_pages: libc::c_uint = unsafe {
        let mut value: libc::c_uint = 0;
        let mut len = mem::size_of::<libc::c_uint>();
        let name = std::ffi::CString::new("vm.page_free_count").unwrap();
        let rc = libc::sysctlbyname(
            name.as_ptr(),
            &mut value as *mut _ as *mut libc::c_void,
            &mut len,
            std::ptr::null_mut(),
            0,
        );
        if rc != 0 {
            return Err(PlatformError::Other("sysctlbyname(vm.page_free_count) failed".to_string()));
        }
        value
    };

    Ok((total, free_pages as u64 * page_size))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn get_memory_info() -> Result<(u64, u64), PlatformError> {
    Err(PlatformError::NotSupported("memory introspection not implemented for this unix".to_string()))
}

#[async_trait]
impl Platform for UnixPlatform {
    fn page_size(&self) -> usize {
        page_size_impl()
    }

    fn cpu_count(&self) -> usize {
        let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if n > 0 {
            n as usize
        } else {
            1
        }
    }

    fn total_memory(&self) -> Result<u64, PlatformError> {
        get_memory_info().map(|(total, _)| total)
    }

    fn available_memory(&self) -> Result<u64, PlatformError> {
        get_memory_info().map(|(_, available)| available)
    }

    fn line_separator(&self) -> &'static str {
        "\n"
    }

    fn path_separator(&self) -> char {
        ':'
    }

    fn platform_name(&self) -> &'static str {
        #[cfg(target_os = "linux")]
        {
            "linux"
        }
        #[cfg(target_os = "macos")]
        {
            "macos"
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            "unix"
        }
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError> {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(mode);
        std::fs::set_permissions(path, perms)?;
        Ok(())
    }

    fn is_executable(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).map(|m| m.permissions().mode() & 0o111 != 0).unwrap_or(false)
    }

    async fn sync_file(&self, file: &tokio::fs::File) -> Result<(), PlatformError> {
        file.sync_all().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_plausible_system_constants() {
        let platform = UnixPlatform::new();
        assert!(platform.cpu_count() >= 1);
        assert!(platform.page_size() >= 512);
        assert_eq!(platform.line_separator(), "\n");
        assert_eq!(platform.path_separator(), ':');
    }

    #[test]
    fn platform_name_is_not_empty() {
        assert!(!UnixPlatform::new().platform_name().is_empty());
    }

    #[test]
    fn memory_info_is_internally_consistent() {
        let platform = UnixPlatform::new();
        if let (Ok(total), Ok(available)) = (platform.total_memory(), platform.available_memory()) {
            assert!(total > 0);
            assert!(available <= total);
        }
    }

    #[test]
    fn temp_dir_exists() {
        assert!(UnixPlatform::new().temp_dir().exists());
    }

    #[test]
    fn is_elevated_matches_euid_zero() {
        let expected = unsafe { libc::geteuid() == 0 };
        assert_eq!(UnixPlatform::new().is_elevated(), expected);
    }
}
