// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use ghkit_common_config::SecretString;
use ghkit_common_http::{
	BaseTransport, Middleware, MiddlewareChain, RateLimitConfig, RateLimitMiddleware, Transport,
};
use ghkit_github_app::{
	bearer_header, AppAuthTransport, AppJwtSigner, InstallationTokenCache, PrivateKeySource,
	TokenProvider,
};
use tracing::info;

use crate::client::GithubClient;
use crate::config::{ClientConfig, ClientOption, ConfigDraft, Credential, MiddlewareEntry};
use crate::error::{AuthConfigError, BuildError};

/// Collects [`ClientOption`]s and assembles the request pipeline.
///
/// The pipeline is, outermost first: user middleware in registration order,
/// rate limiting, App authentication (App mode only), the network.
#[derive(Debug)]
pub struct ClientBuilder {
	draft: ConfigDraft,
}

impl Default for ClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ClientBuilder {
	pub fn new() -> Self {
		Self {
			draft: ClientConfig::default_draft(),
		}
	}

	pub fn option(mut self, option: ClientOption) -> Self {
		self.draft.apply(option);
		self
	}

	pub fn options(mut self, options: impl IntoIterator<Item = ClientOption>) -> Self {
		for option in options {
			self.draft.apply(option);
		}
		self
	}

	pub fn with_base_url(self, url: impl Into<String>) -> Self {
		self.option(ClientOption::BaseUrl(url.into()))
	}

	pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
		self.option(ClientOption::UserAgent(user_agent.into()))
	}

	pub fn with_api_version(self, version: impl Into<String>) -> Self {
		self.option(ClientOption::ApiVersion(version.into()))
	}

	pub fn with_request_timeout(self, timeout: Duration) -> Self {
		self.option(ClientOption::RequestTimeout(timeout))
	}

	pub fn with_token(self, token: impl Into<String>) -> Self {
		self.option(ClientOption::Token(SecretString::new(token.into())))
	}

	pub fn with_github_app(
		self,
		client_id: impl Into<String>,
		installation_id: i64,
		private_key: PrivateKeySource,
	) -> Self {
		self.option(ClientOption::GithubApp {
			client_id: client_id.into(),
			installation_id,
			private_key,
		})
	}

	pub fn with_middleware(self, middleware: Arc<dyn Middleware>) -> Self {
		self.option(ClientOption::Middleware(MiddlewareEntry::new(middleware)))
	}

	pub fn with_logging(self) -> Self {
		self.option(ClientOption::Middleware(MiddlewareEntry::logging()))
	}

	pub fn with_rate_limit(self, config: RateLimitConfig) -> Self {
		self.option(ClientOption::RateLimit(config))
	}

	/// Refresh an installation token this long before its `expires_at`
	/// (default one minute, matching GitHub's own client libraries). A token
	/// issued with less than the margin left is exchanged again on every
	/// request; use `Duration::ZERO` to reuse a token until it expires.
	pub fn with_refresh_margin(self, margin: Duration) -> Self {
		self.option(ClientOption::RefreshMargin(margin))
	}

	pub fn build(self) -> Result<GithubClient, BuildError> {
		let config = self.draft.finish()?;

		let http = ghkit_common_http::builder_with_user_agent(config.user_agent())
			.build()
			.map_err(BuildError::HttpClient)?;
		let base = BaseTransport::new(http);

		let (authenticated, tokens): (Box<dyn Transport>, TokenProvider) = match config.credential() {
			Credential::StaticToken(token) => {
				bearer_header(token).ok_or(AuthConfigError::InvalidToken)?;
				(Box::new(base), TokenProvider::Static(token.clone()))
			}
			Credential::AppInstallation(app) => {
				let pem = app.private_key.load()?;
				let signer = AppJwtSigner::new(app.client_id.clone(), pem.expose())?;
				// The exchange goes straight to the network, never through middleware.
				let exchanger: Arc<dyn Transport> = Arc::new(base.clone());
				let cache = InstallationTokenCache::new(
					signer,
					app.installation_id,
					config.base_url(),
					exchanger,
				)?
				.with_api_version(config.api_version())
				.with_refresh_margin(config.refresh_margin());
				let tokens = TokenProvider::AppInstallation(Arc::new(cache));

				(Box::new(AppAuthTransport::new(base, tokens.clone())), tokens)
			}
		};

		let mut pipeline = MiddlewareChain::new(authenticated);
		for entry in config.middleware() {
			pipeline = pipeline.with(Arc::clone(entry.middleware()));
		}
		pipeline = pipeline.with(Arc::new(RateLimitMiddleware::new(config.rate_limit().clone())));

		info!(
			auth = tokens.kind(),
			base_url = %config.base_url(),
			middleware = ?pipeline.names(),
			timeout_ms = config.request_timeout().map(|t| t.as_millis() as u64),
			"GitHub client built"
		);

		Ok(GithubClient::new(config, pipeline, tokens))
	}
}
