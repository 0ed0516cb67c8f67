// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Errors raised while setting up GitHub App authentication.
//!
//! Per-request failures to obtain a token are
//! [`TokenExchangeError`](ghkit_common_http::TokenExchangeError).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubAppError {
	/// Invalid app configuration (bad URL, empty issuer).
	#[error("Configuration error: {0}")]
	Config(String),

	/// The private key could not be parsed as an RSA PEM key.
	#[error("Invalid RSA private key: {0}")]
	InvalidKey(String),

	/// The private key file could not be read.
	#[error("Failed to read private key file {path}: {source}")]
	PrivateKeyFile {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}
