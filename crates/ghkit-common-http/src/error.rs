// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Errors produced while moving a request through the transport pipeline.

use thiserror::Error;

/// Failure inside the transport pipeline, before any API response exists.
#[derive(Debug, Error)]
pub enum HttpError {
	/// DNS, connect, TLS or body-streaming failure.
	#[error("network error: {0}")]
	Network(#[source] reqwest::Error),

	/// The request exceeded its deadline.
	#[error("request timed out")]
	Timeout,

	/// A credential layer could not obtain a token for the request.
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),
}

impl HttpError {
	/// Classify a reqwest error, separating timeouts from other network errors.
	pub fn from_reqwest(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			HttpError::Timeout
		} else {
			HttpError::Network(err)
		}
	}
}

impl From<reqwest::Error> for HttpError {
	fn from(err: reqwest::Error) -> Self {
		Self::from_reqwest(err)
	}
}

/// Failure to obtain or refresh an installation access token.
///
/// Surfaced to the caller of the request that triggered the exchange; never
/// retried by the credential layer.
#[derive(Debug, Error)]
pub enum TokenExchangeError {
	#[error("failed to sign app JWT: {0}")]
	Jwt(String),

	#[error("token exchange request failed: {0}")]
	Network(#[source] reqwest::Error),

	#[error("token exchange timed out")]
	Timeout,

	#[error("token exchange returned HTTP {status}: {body}")]
	Status { status: u16, body: String },

	#[error("invalid token exchange response: {0}")]
	InvalidResponse(String),
}
