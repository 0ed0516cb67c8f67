// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Where the App's PEM private key comes from.

use std::fs;
use std::path::PathBuf;

use ghkit_common_config::SecretString;

use crate::error::GithubAppError;

/// A PEM-encoded RSA private key, given inline or as a file path.
///
/// The two sources are mutually exclusive: a key has exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateKeySource {
	Pem(SecretString),
	File(PathBuf),
}

impl PrivateKeySource {
	pub fn pem(value: impl Into<String>) -> Self {
		Self::Pem(SecretString::new(value.into()))
	}

	pub fn file(path: impl Into<PathBuf>) -> Self {
		Self::File(path.into())
	}

	/// Resolve the PEM text, reading the file if needed.
	pub fn load(&self) -> Result<SecretString, GithubAppError> {
		let pem = match self {
			Self::Pem(pem) => pem.clone(),
			Self::File(path) => fs::read_to_string(path)
				.map(SecretString::new)
				.map_err(|source| GithubAppError::PrivateKeyFile {
					path: path.clone(),
					source,
				})?,
		};

		if pem.expose().trim().is_empty() {
			return Err(GithubAppError::InvalidKey("private key is empty".to_string()));
		}

		Ok(pem)
	}
}
