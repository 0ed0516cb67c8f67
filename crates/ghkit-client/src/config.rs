// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Client configuration: the option set, the mutable draft it applies to,
//! and the validated snapshot a built client reads from.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ghkit_common_config::SecretString;
use ghkit_common_http::{LoggingMiddleware, Middleware, RateLimitConfig};
use ghkit_github_app::{PrivateKeySource, DEFAULT_REFRESH_MARGIN};
use reqwest::Url;

use crate::error::{AuthConfigError, BuildError};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_API_VERSION: &str = ghkit_github_app::DEFAULT_API_VERSION;

/// GitHub App identity used to mint installation tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredential {
	/// JWT issuer: the App's client ID, or its App ID in decimal.
	pub client_id: String,
	pub installation_id: i64,
	pub private_key: PrivateKeySource,
}

/// The one way a client authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
	StaticToken(SecretString),
	AppInstallation(AppCredential),
}

/// A named interceptor. Its position in the chain is its registration order.
#[derive(Clone)]
pub struct MiddlewareEntry {
	name: &'static str,
	middleware: Arc<dyn Middleware>,
}

impl MiddlewareEntry {
	pub fn new(middleware: Arc<dyn Middleware>) -> Self {
		Self {
			name: middleware.name(),
			middleware,
		}
	}

	/// Request logging with default settings.
	pub fn logging() -> Self {
		Self::new(Arc::new(LoggingMiddleware::new()))
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn middleware(&self) -> &Arc<dyn Middleware> {
		&self.middleware
	}
}

impl fmt::Debug for MiddlewareEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("MiddlewareEntry").field(&self.name).finish()
	}
}

/// A recognized configuration effect.
///
/// Scalars are last-write-wins; `Middleware` appends.
#[derive(Debug, Clone)]
pub enum ClientOption {
	BaseUrl(String),
	UserAgent(String),
	ApiVersion(String),
	RequestTimeout(Duration),
	Token(SecretString),
	GithubApp {
		client_id: String,
		installation_id: i64,
		private_key: PrivateKeySource,
	},
	AppClientId(String),
	/// Numeric App ID, used as the JWT issuer.
	AppId(u64),
	InstallationId(i64),
	PrivateKey(PrivateKeySource),
	Middleware(MiddlewareEntry),
	RateLimit(RateLimitConfig),
	RefreshMargin(Duration),
}

/// Mutable configuration the builder applies options to.
#[derive(Debug, Clone)]
pub struct ConfigDraft {
	pub base_url: String,
	pub user_agent: String,
	pub api_version: String,
	pub request_timeout: Option<Duration>,
	pub token: Option<SecretString>,
	pub app_client_id: Option<String>,
	pub installation_id: Option<i64>,
	pub private_key: Option<PrivateKeySource>,
	pub middleware: Vec<MiddlewareEntry>,
	pub rate_limit: RateLimitConfig,
	pub refresh_margin: Duration,
}

impl ConfigDraft {
	pub fn apply(&mut self, option: ClientOption) {
		match option {
			ClientOption::BaseUrl(url) => self.base_url = url,
			ClientOption::UserAgent(ua) => self.user_agent = ua,
			ClientOption::ApiVersion(version) => self.api_version = version,
			ClientOption::RequestTimeout(timeout) => self.request_timeout = Some(timeout),
			ClientOption::Token(token) => self.token = Some(token),
			ClientOption::GithubApp {
				client_id,
				installation_id,
				private_key,
			} => {
				self.app_client_id = Some(client_id);
				self.installation_id = Some(installation_id);
				self.private_key = Some(private_key);
			}
			ClientOption::AppClientId(client_id) => self.app_client_id = Some(client_id),
			ClientOption::AppId(app_id) => self.app_client_id = Some(app_id.to_string()),
			ClientOption::InstallationId(id) => self.installation_id = Some(id),
			ClientOption::PrivateKey(key) => self.private_key = Some(key),
			ClientOption::Middleware(entry) => self.middleware.push(entry),
			ClientOption::RateLimit(config) => self.rate_limit = config,
			ClientOption::RefreshMargin(margin) => self.refresh_margin = margin,
		}
	}

	/// Validate and freeze into a [`ClientConfig`].
	pub fn finish(self) -> Result<ClientConfig, BuildError> {
		let credential = resolve_credential(
			self.token,
			self.app_client_id,
			self.installation_id,
			self.private_key,
		)?;
		let base_url = parse_base_url(&self.base_url)?;

		Ok(ClientConfig {
			base_url,
			user_agent: self.user_agent,
			api_version: self.api_version,
			request_timeout: self.request_timeout,
			credential,
			middleware: self.middleware,
			rate_limit: self.rate_limit,
			refresh_margin: self.refresh_margin,
		})
	}
}

/// Immutable configuration of a built client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	base_url: Url,
	user_agent: String,
	api_version: String,
	request_timeout: Option<Duration>,
	credential: Credential,
	middleware: Vec<MiddlewareEntry>,
	rate_limit: RateLimitConfig,
	refresh_margin: Duration,
}

impl ClientConfig {
	/// Defaults every builder starts from. A fresh value per call.
	pub fn default_draft() -> ConfigDraft {
		ConfigDraft {
			base_url: DEFAULT_BASE_URL.to_string(),
			user_agent: ghkit_common_http::user_agent(),
			api_version: DEFAULT_API_VERSION.to_string(),
			request_timeout: None,
			token: None,
			app_client_id: None,
			installation_id: None,
			private_key: None,
			middleware: Vec::new(),
			rate_limit: RateLimitConfig::default(),
			refresh_margin: DEFAULT_REFRESH_MARGIN,
		}
	}

	/// Always ends with `/`.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	pub fn user_agent(&self) -> &str {
		&self.user_agent
	}

	pub fn api_version(&self) -> &str {
		&self.api_version
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout
	}

	pub fn credential(&self) -> &Credential {
		&self.credential
	}

	pub fn middleware(&self) -> &[MiddlewareEntry] {
		&self.middleware
	}

	pub fn rate_limit(&self) -> &RateLimitConfig {
		&self.rate_limit
	}

	pub fn refresh_margin(&self) -> Duration {
		self.refresh_margin
	}
}

/// Pick exactly one credential out of the configured fields.
pub fn resolve_credential(
	token: Option<SecretString>,
	client_id: Option<String>,
	installation_id: Option<i64>,
	private_key: Option<PrivateKeySource>,
) -> Result<Credential, AuthConfigError> {
	let client_id = client_id.filter(|id| !id.trim().is_empty());
	let any_app = client_id.is_some() || installation_id.is_some() || private_key.is_some();

	match (token, any_app) {
		(Some(_), true) => Err(AuthConfigError::Conflicting),
		(Some(token), false) if token.expose().trim().is_empty() => Err(AuthConfigError::EmptyToken),
		(Some(token), false) => Ok(Credential::StaticToken(token)),
		(None, false) => Err(AuthConfigError::Missing),
		(None, true) => match (client_id, installation_id, private_key) {
			(Some(_), Some(installation_id), Some(_)) if installation_id <= 0 => {
				Err(AuthConfigError::InvalidInstallationId(installation_id))
			}
			(Some(client_id), Some(installation_id), Some(private_key)) => {
				Ok(Credential::AppInstallation(AppCredential {
					client_id,
					installation_id,
					private_key,
				}))
			}
			(client_id, installation_id, private_key) => {
				let mut missing = Vec::new();
				if client_id.is_none() {
					missing.push("client_id");
				}
				if installation_id.is_none() {
					missing.push("installation_id");
				}
				if private_key.is_none() {
					missing.push("private_key");
				}
				Err(AuthConfigError::IncompleteApp { missing })
			}
		},
	}
}

/// Accept an http(s) URL with a host; normalize to a trailing `/` so
/// relative joins stay under its path.
pub fn parse_base_url(raw: &str) -> Result<Url, BuildError> {
	let invalid = |reason: String| BuildError::BaseUrl {
		url: raw.to_string(),
		reason,
	};

	let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;

	if !matches!(url.scheme(), "http" | "https") {
		return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
	}
	if url.host_str().is_none() {
		return Err(invalid("missing host".to_string()));
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(invalid("query and fragment are not allowed".to_string()));
	}

	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());
		url.set_path(&path);
	}

	Ok(url)
}
