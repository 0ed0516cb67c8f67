// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! JWT generation for GitHub App authentication.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use ghkit_common_http::TokenExchangeError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GithubAppError;

/// Backdate `iat` to tolerate clock drift between us and GitHub.
const CLOCK_DRIFT_SECS: i64 = 60;
/// GitHub caps app JWTs at 10 minutes; stay under it.
const JWT_LIFETIME_SECS: i64 = 9 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
	/// Issued at (seconds since epoch).
	pub(crate) iat: i64,
	/// Expiration (seconds since epoch).
	pub(crate) exp: i64,
	/// Issuer: the App's client ID, or its numeric App ID as a string.
	pub(crate) iss: String,
}

/// Signs app JWTs with a parsed RSA key.
///
/// The key is parsed once at construction so a malformed key fails client
/// construction instead of the first request.
#[derive(Clone)]
pub struct AppJwtSigner {
	issuer: String,
	key: EncodingKey,
}

impl fmt::Debug for AppJwtSigner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AppJwtSigner")
			.field("issuer", &self.issuer)
			.finish_non_exhaustive()
	}
}

impl AppJwtSigner {
	pub fn new(issuer: impl Into<String>, private_key_pem: &str) -> Result<Self, GithubAppError> {
		let issuer = issuer.into();
		if issuer.trim().is_empty() {
			return Err(GithubAppError::Config(
				"GitHub App issuer (client ID or App ID) is empty".to_string(),
			));
		}

		let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
			.map_err(|e| GithubAppError::InvalidKey(e.to_string()))?;

		Ok(Self { issuer, key })
	}

	pub fn issuer(&self) -> &str {
		&self.issuer
	}

	/// Sign a JWT valid from `now - 60s` to `now + 9min`.
	pub fn sign_at(&self, now: DateTime<Utc>) -> Result<String, TokenExchangeError> {
		let claims = Claims {
			iat: (now - Duration::seconds(CLOCK_DRIFT_SECS)).timestamp(),
			exp: (now + Duration::seconds(JWT_LIFETIME_SECS)).timestamp(),
			iss: self.issuer.clone(),
		};

		let token = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
			.map_err(|e| TokenExchangeError::Jwt(format!("Failed to encode JWT: {e}")))?;

		debug!(issuer = %self.issuer, exp = claims.exp, "Generated GitHub App JWT");

		Ok(token)
	}
}
