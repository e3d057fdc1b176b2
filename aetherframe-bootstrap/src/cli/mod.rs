// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Command-line parsing (`parser`) and path/argument validation
//! (`validator`) for the `aetherframe` binary.

mod parser;
mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{PathValidator, ValidationError};
