// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Resolves a job's opaque `target` string into a usable path.

use std::path::{Path, PathBuf};

use aetherframe_domain::error::ResolveError;
use aetherframe_domain::value_objects::TargetType;
use async_trait::async_trait;

/// Turns a job's `target` into a concrete path the executor can hand
/// stages. Local-file targets are resolved today; `pid` targets (and any
/// future URL-shaped target) have no resolver yet.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn resolve(&self, target: &str, target_type: TargetType, workspace: &Path) -> Result<PathBuf, ResolveError>;
}

/// Resolves `binary`, `apk`, `memory_dump`, and `trace_log` targets as
/// local filesystem paths: canonicalizes and requires the file to exist.
pub struct LocalPathResolver;

#[async_trait]
impl TargetResolver for LocalPathResolver {
    async fn resolve(&self, target: &str, _target_type: TargetType, _workspace: &Path) -> Result<PathBuf, ResolveError> {
        let path = Path::new(target);
        tokio::fs::metadata(path)
            .await
            .map_err(|_| ResolveError::NotFound(target.to_string()))?;
        tokio::fs::canonicalize(path)
            .await
            .map_err(|e| ResolveError::Io(e.to_string()))
    }
}

/// Stands in for target types this engine doesn't resolve yet (`pid`, and
/// any future URL-based target) — the seam exists without pretending the
/// platform can attach to a live process today.
pub struct UnsupportedTargetResolver;

#[async_trait]
impl TargetResolver for UnsupportedTargetResolver {
    async fn resolve(&self, _target: &str, target_type: TargetType, _workspace: &Path) -> Result<PathBuf, ResolveError> {
        Err(ResolveError::Unsupported(target_type))
    }
}

/// Picks the resolver for a target type, per [`TargetType::is_local_path`].
pub fn resolver_for(target_type: TargetType) -> Box<dyn TargetResolver> {
    if target_type.is_local_path() {
        Box::new(LocalPathResolver)
    } else {
        Box::new(UnsupportedTargetResolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_resolver_fails_on_missing_file() {
        let resolver = LocalPathResolver;
        let result = resolver
            .resolve("/nonexistent/path/does-not-exist.bin", TargetType::Binary, Path::new("/tmp"))
            .await;
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
    }

    #[tokio::test]
    async fn local_resolver_resolves_an_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolver = LocalPathResolver;
        let result = resolver
            .resolve(file.path().to_str().unwrap(), TargetType::Binary, Path::new("/tmp"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn pid_targets_are_unsupported() {
        let result = resolver_for(TargetType::Pid)
            .resolve("1234", TargetType::Pid, Path::new("/tmp"))
            .await;
        assert!(matches!(result, Err(ResolveError::Unsupported(_))));
    }
}
