// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in analyzer plugins.
//!
//! These stand in for the out-of-scope analyzer content: the algorithmic
//! substance here (simple heuristics over file bytes) is deliberately
//! minimal. Any implementation honouring [`aetherframe_domain::plugin::AnalyzerPlugin`]
//! could replace a module here without the executor or the registry
//! noticing the difference.

mod aegis;
mod laintrace;
mod mnemosyne;
mod noema;
mod scribe;
mod umbriel;
mod valkyrie;

pub use aegis::Aegis;
pub use laintrace::Laintrace;
pub use mnemosyne::Mnemosyne;
pub use noema::Noema;
pub use scribe::Scribe;
pub use umbriel::Umbriel;
pub use valkyrie::Valkyrie;

use aetherframe_domain::entities::NewArtifact;
use aetherframe_domain::job_context::JobContext;
use aetherframe_domain::value_objects::ArtifactType;
use sha2::{Digest, Sha256};

/// Writes a JSON body into the job's artifacts directory and returns the
/// [`NewArtifact`] describing it, with `sha256`/`size_bytes` computed from
/// the bytes actually written — satisfying the invariant that a persisted
/// artifact's checksum matches the file on disk.
pub(crate) async fn write_json_artifact(
    ctx: &JobContext,
    file_name: &str,
    body: &serde_json::Value,
) -> std::io::Result<NewArtifact> {
    tokio::fs::create_dir_all(&ctx.artifacts_dir).await?;
    let path = ctx.get_artifact_path(file_name);
    let bytes = serde_json::to_vec_pretty(body)?;
    tokio::fs::write(&path, &bytes).await?;
    let sha256 = hex::encode(Sha256::digest(&bytes));

    Ok(NewArtifact {
        artifact_type: ArtifactType::Json,
        name: file_name.to_string(),
        description: None,
        uri: format!("file://{}", path.display()),
        sha256: Some(sha256),
        size_bytes: Some(bytes.len() as u64),
        meta: serde_json::Value::Null,
    })
}

/// Reads the target file's bytes, used by the several plugins that do a
/// byte-level heuristic scan.
pub(crate) async fn read_target(ctx: &JobContext) -> std::io::Result<Vec<u8>> {
    tokio::fs::read(&ctx.target_path).await
}
