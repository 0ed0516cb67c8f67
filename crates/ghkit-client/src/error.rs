// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for client construction and API calls.

use std::fmt;
use std::time::Duration;

use ghkit_common_http::{HttpError, TokenExchangeError};
use ghkit_github_app::GithubAppError;
use serde::Serialize;
use thiserror::Error;

/// Contradictory or incomplete credential configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthConfigError {
	#[error("no credentials configured: provide a token or GitHub App credentials")]
	Missing,

	#[error("both a static token and GitHub App credentials are configured")]
	Conflicting,

	#[error("incomplete GitHub App credentials: missing {}", .missing.join(", "))]
	IncompleteApp { missing: Vec<&'static str> },

	#[error("static token is empty")]
	EmptyToken,

	#[error("static token contains characters not allowed in an HTTP header")]
	InvalidToken,

	#[error("installation ID must be positive, got {0}")]
	InvalidInstallationId(i64),
}

/// Failure while turning options into a client. Wraps the first error hit.
#[derive(Debug, Error)]
pub enum BuildError {
	#[error("invalid authentication configuration: {0}")]
	AuthConfig(#[from] AuthConfigError),

	#[error("failed to set up GitHub App authentication: {0}")]
	AppTransport(#[from] GithubAppError),

	#[error("invalid base URL {url:?}: {reason}")]
	BaseUrl { url: String, reason: String },

	#[error("failed to build HTTP client: {0}")]
	HttpClient(#[source] reqwest::Error),
}

/// A well-formed error response from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
	pub status: u16,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub documentation_url: Option<String>,
}

impl ApiError {
	pub fn new(status: u16, message: impl Into<String>) -> Self {
		Self {
			status,
			message: message.into(),
			documentation_url: None,
		}
	}

	pub fn with_documentation_url(mut self, url: impl Into<String>) -> Self {
		self.documentation_url = Some(url.into());
		self
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "GitHub API error {}: {}", self.status, self.message)?;
		if let Some(url) = &self.documentation_url {
			write!(f, " ({url})")?;
		}
		Ok(())
	}
}

impl std::error::Error for ApiError {}

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ClientError {
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),

	/// Still rate limited after the middleware gave up.
	#[error("rate limited (HTTP {status})")]
	RateLimited {
		status: u16,
		retry_after: Option<Duration>,
	},

	#[error(transparent)]
	Api(#[from] ApiError),

	#[error("transport error: {0}")]
	Transport(#[source] HttpError),

	#[error("request timed out")]
	Timeout,

	#[error("failed to decode response: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("invalid request path: {0}")]
	InvalidPath(String),

	/// The static token cannot be carried in an `Authorization` header.
	#[error("token is not a valid header value")]
	InvalidCredential,
}

impl ClientError {
	/// HTTP status, when the failure came with a response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::RateLimited { status, .. } => Some(*status),
			Self::Api(err) => Some(err.status),
			Self::TokenExchange(TokenExchangeError::Status { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

impl From<HttpError> for ClientError {
	fn from(err: HttpError) -> Self {
		match err {
			HttpError::TokenExchange(inner) => Self::TokenExchange(inner),
			HttpError::Timeout => Self::Timeout,
			other => Self::Transport(other),
		}
	}
}
