// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # AetherFrame Bootstrap
//!
//! Entry-point concerns that sit outside the layered application in
//! `aetherframe-core`: CLI parsing and validation, signal handling,
//! graceful-shutdown coordination, platform abstraction, and process
//! exit-code mapping. Nothing in this crate knows about jobs, pipelines, or
//! plugins — it only gets the process running and stops it cleanly.

pub mod cli;
pub mod exit_code;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_cli, Cli, Commands};
pub use exit_code::ExitCode;
pub use platform::{create_platform, Platform, PlatformError};
pub use shutdown::{CancellationToken, ShutdownCoordinator};
pub use signals::{create_signal_handler, SystemSignals};
