// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Installation access tokens and the cache that keeps one fresh.

use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use ghkit_common_config::SecretString;
use ghkit_common_http::{HttpError, TokenExchangeError, Transport};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, Request, Url};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, trace};

use crate::error::GithubAppError;
use crate::jwt::AppJwtSigner;
use crate::types::AccessTokenResponse;

/// Default `X-GitHub-Api-Version` sent with the exchange request.
pub const DEFAULT_API_VERSION: &str = "2022-11-28";
/// Refresh this long before `expires_at`.
pub const DEFAULT_REFRESH_MARGIN: StdDuration = StdDuration::from_secs(60);

/// A short-lived token scoped to one installation.
#[derive(Debug, Clone)]
pub struct InstallationToken {
	token: SecretString,
	expires_at: DateTime<Utc>,
	installation_id: i64,
}

impl InstallationToken {
	pub fn new(token: SecretString, expires_at: DateTime<Utc>, installation_id: i64) -> Self {
		Self {
			token,
			expires_at,
			installation_id,
		}
	}

	pub fn token(&self) -> &SecretString {
		&self.token
	}

	pub fn expires_at(&self) -> DateTime<Utc> {
		self.expires_at
	}

	pub fn installation_id(&self) -> i64 {
		self.installation_id
	}

	/// Usable at `now` with at least `margin` to spare.
	pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
		now + margin < self.expires_at
	}
}

/// Holds the current installation token and exchanges a new one when it
/// nears expiry.
///
/// Readers share the cached token; at most one exchange runs at a time, and
/// callers that queue behind it reuse its result.
pub struct InstallationTokenCache {
	signer: AppJwtSigner,
	installation_id: i64,
	endpoint: Url,
	api_version: String,
	refresh_margin: Duration,
	exchanger: Arc<dyn Transport>,
	cached: RwLock<Option<InstallationToken>>,
	refresh_lock: Mutex<()>,
}

impl fmt::Debug for InstallationTokenCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InstallationTokenCache")
			.field("signer", &self.signer)
			.field("installation_id", &self.installation_id)
			.field("endpoint", &self.endpoint.as_str())
			.field("refresh_margin", &self.refresh_margin)
			.finish_non_exhaustive()
	}
}

impl InstallationTokenCache {
	/// `base_url` must end with `/`; `exchanger` should be a transport with
	/// no middleware in front of it.
	pub fn new(
		signer: AppJwtSigner,
		installation_id: i64,
		base_url: &Url,
		exchanger: Arc<dyn Transport>,
	) -> Result<Self, GithubAppError> {
		if installation_id <= 0 {
			return Err(GithubAppError::Config(format!(
				"installation ID must be positive, got {installation_id}"
			)));
		}

		let endpoint = base_url
			.join(&format!("app/installations/{installation_id}/access_tokens"))
			.map_err(|e| GithubAppError::Config(format!("Invalid URL: {e}")))?;

		Ok(Self {
			signer,
			installation_id,
			endpoint,
			api_version: DEFAULT_API_VERSION.to_string(),
			refresh_margin: Duration::seconds(DEFAULT_REFRESH_MARGIN.as_secs() as i64),
			exchanger,
			cached: RwLock::new(None),
			refresh_lock: Mutex::new(()),
		})
	}

	pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
		self.api_version = api_version.into();
		self
	}

	pub fn with_refresh_margin(mut self, margin: StdDuration) -> Self {
		self.refresh_margin = Duration::from_std(margin).unwrap_or_else(|_| Duration::zero());
		self
	}

	pub fn installation_id(&self) -> i64 {
		self.installation_id
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Current token, exchanging a new one first if it is missing or within
	/// the refresh margin.
	pub async fn token(&self) -> Result<SecretString, TokenExchangeError> {
		self.token_at(Utc::now()).await
	}

	/// [`token`](Self::token) evaluated at an explicit instant.
	#[instrument(skip(self), fields(installation_id = self.installation_id))]
	pub async fn token_at(&self, now: DateTime<Utc>) -> Result<SecretString, TokenExchangeError> {
		if let Some(token) = self.valid_at(now).await {
			trace!("Using cached installation token");
			return Ok(token);
		}

		let _guard = self.refresh_lock.lock().await;

		// Whoever held the lock before us may already have refreshed.
		if let Some(token) = self.valid_at(now).await {
			trace!("Using cached installation token (post-lock)");
			return Ok(token);
		}

		debug!("Fetching new installation token");
		let fresh = self.exchange(now).await?;
		let token = fresh.token().clone();
		let expires_at = fresh.expires_at();
		*self.cached.write().await = Some(fresh);

		info!(%expires_at, "Installation token refreshed");
		Ok(token)
	}

	/// Snapshot of the cached token, valid or not.
	#[cfg(test)]
	pub(crate) async fn cached(&self) -> Option<InstallationToken> {
		self.cached.read().await.clone()
	}

	/// Drop the cached token so the next request exchanges a new one.
	pub async fn invalidate(&self) {
		if self.cached.write().await.take().is_some() {
			debug!(
				installation_id = self.installation_id,
				"Installation token invalidated"
			);
		}
	}

	async fn valid_at(&self, now: DateTime<Utc>) -> Option<SecretString> {
		self
			.cached
			.read()
			.await
			.as_ref()
			.filter(|cached| cached.is_valid_at(now, self.refresh_margin))
			.map(|cached| cached.token().clone())
	}

	async fn exchange(&self, now: DateTime<Utc>) -> Result<InstallationToken, TokenExchangeError> {
		let jwt = self.signer.sign_at(now)?;

		let mut request = Request::new(Method::POST, self.endpoint.clone());
		let headers = request.headers_mut();
		let mut bearer = HeaderValue::from_str(&format!("Bearer {jwt}"))
			.map_err(|e| TokenExchangeError::Jwt(format!("JWT is not a valid header value: {e}")))?;
		bearer.set_sensitive(true);
		headers.insert(AUTHORIZATION, bearer);
		headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
		if let Ok(version) = HeaderValue::from_str(&self.api_version) {
			headers.insert("x-github-api-version", version);
		}

		let response = self.exchanger.execute(request).await.map_err(|e| match e {
			HttpError::Timeout => {
				error!("Installation token request timed out");
				TokenExchangeError::Timeout
			}
			HttpError::Network(source) => {
				error!(error = %source, "Installation token request failed");
				TokenExchangeError::Network(source)
			}
			HttpError::TokenExchange(inner) => inner,
		})?;

		let status = response.status();
		let body = response.text().await.map_err(|e| {
			if e.is_timeout() {
				TokenExchangeError::Timeout
			} else {
				TokenExchangeError::Network(e)
			}
		})?;

		if !status.is_success() {
			error!(status = status.as_u16(), "Installation token exchange rejected");
			return Err(TokenExchangeError::Status {
				status: status.as_u16(),
				body,
			});
		}

		let parsed: AccessTokenResponse = serde_json::from_str(&body)
			.map_err(|e| TokenExchangeError::InvalidResponse(e.to_string()))?;

		if parsed.token.is_empty() {
			return Err(TokenExchangeError::InvalidResponse(
				"token exchange returned an empty token".to_string(),
			));
		}

		Ok(InstallationToken::new(
			SecretString::new(parsed.token),
			parsed.expires_at,
			self.installation_id,
		))
	}
}
