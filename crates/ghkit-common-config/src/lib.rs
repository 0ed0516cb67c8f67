// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration primitives shared by the ghkit crates.
//!
//! - [`Secret`]: redacting wrapper for tokens and private keys
//! - [`load_secret_env`]: `VAR` / `VAR_FILE` secret loading
//! - [`load_parsed_env`]: typed loading of plain variables

pub mod env;
pub mod secret;

pub use env::{load_parsed_env, load_secret_env, EnvError};
pub use secret::{Secret, SecretString, REDACTED};
