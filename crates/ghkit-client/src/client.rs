// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::SystemTime;

use ghkit_common_http::{detect_rate_limit, HttpError, MiddlewareChain, Transport};
use ghkit_github_app::{bearer_header, TokenProvider};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, Request, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::builder::ClientBuilder;
use crate::classify::{ApiOutcome, ResponseClassifier, BRANCH_PROTECTION};
use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::types::{BasicError, BranchProtection};

const GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";

/// A configured GitHub REST client. Cheap to clone; clones share the
/// pipeline and the token cache.
#[derive(Debug, Clone)]
pub struct GithubClient {
	inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
	config: ClientConfig,
	pipeline: MiddlewareChain,
	tokens: TokenProvider,
	classifier: ResponseClassifier,
}

impl GithubClient {
	pub fn builder() -> ClientBuilder {
		ClientBuilder::new()
	}

	pub(crate) fn new(
		config: ClientConfig,
		pipeline: MiddlewareChain,
		tokens: TokenProvider,
	) -> Self {
		Self {
			inner: Arc::new(ClientInner {
				config,
				pipeline,
				tokens,
				classifier: ResponseClassifier::new(),
			}),
		}
	}

	pub fn config(&self) -> &ClientConfig {
		&self.inner.config
	}

	pub fn token_provider(&self) -> &TokenProvider {
		&self.inner.tokens
	}

	pub fn classifier(&self) -> &ResponseClassifier {
		&self.inner.classifier
	}

	/// Middleware names, outermost first.
	pub fn middleware_names(&self) -> Vec<&'static str> {
		self.inner.pipeline.names()
	}

	/// Resolve path segments under the base URL, percent-encoding each one.
	pub fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
		if let Some(bad) = segments
			.iter()
			.find(|s| s.is_empty() || **s == "." || **s == "..")
		{
			return Err(ClientError::InvalidPath(format!(
				"invalid path segment {bad:?} in {segments:?}"
			)));
		}

		let mut url = self.inner.config.base_url().clone();
		url.path_segments_mut()
			.map_err(|_| ClientError::InvalidPath("base URL cannot carry a path".to_string()))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	/// A request with GitHub's headers. In static-token mode it also carries
	/// the `Authorization` header; App mode adds it further down the pipeline.
	pub fn request(&self, method: Method, segments: &[&str]) -> Result<Request, ClientError> {
		let mut request = Request::new(method, self.url(segments)?);
		let headers = request.headers_mut();
		headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
		if let Ok(version) = HeaderValue::from_str(self.inner.config.api_version()) {
			headers.insert(API_VERSION_HEADER, version);
		}

		if let TokenProvider::Static(token) = &self.inner.tokens {
			let value = bearer_header(token).ok_or(ClientError::InvalidCredential)?;
			headers.insert(AUTHORIZATION, value);
		}

		Ok(request)
	}

	/// Run a request through the pipeline. Non-2xx responses become errors.
	pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
		let pending = self.inner.pipeline.execute(request);
		let response = match self.inner.config.request_timeout() {
			Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
				warn!(timeout_ms = limit.as_millis() as u64, "Request timed out");
				ClientError::Timeout
			})??,
			None => pending.await?,
		};

		if response.status().is_success() {
			return Ok(response);
		}
		Err(self.error_from_response(response).await?)
	}

	pub async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
		let request = self.request(Method::GET, segments)?;
		let response = self.send(request).await?;
		let body = response.bytes().await.map_err(HttpError::from)?;
		Ok(serde_json::from_slice(&body)?)
	}

	/// Protection rules of a branch. An unprotected branch is an empty
	/// result, not an error.
	#[instrument(skip(self))]
	pub async fn get_branch_protection(
		&self,
		owner: &str,
		repo: &str,
		branch: &str,
	) -> Result<ApiOutcome<BranchProtection>, ClientError> {
		let segments = ["repos", owner, repo, "branches", branch, "protection"];
		match self.get_json::<BranchProtection>(&segments).await {
			Ok(protection) => Ok(ApiOutcome::Success(protection)),
			Err(ClientError::Api(err)) => Ok(self.inner.classifier.classify(BRANCH_PROTECTION, err)),
			Err(err) => Err(err),
		}
	}

	/// Protection rules as JSON bytes; `{}` for an unprotected branch.
	pub async fn branch_protection_rules(
		&self,
		owner: &str,
		repo: &str,
		branch: &str,
	) -> Result<Vec<u8>, ClientError> {
		match self.get_branch_protection(owner, repo, branch).await? {
			ApiOutcome::Success(protection) => Ok(serde_json::to_vec(&protection)?),
			ApiOutcome::EmptyBySemanticRule(empty) => Ok(serde_json::to_vec(&empty.payload())?),
			ApiOutcome::Failure(err) => Err(ClientError::Api(err)),
		}
	}

	/// The error a non-2xx response stands for. Failing to read the body is a
	/// transport error in its own right and is returned as `Err`.
	async fn error_from_response(&self, response: Response) -> Result<ClientError, ClientError> {
		let status = response.status();

		if let Some(signal) = detect_rate_limit(
			status,
			response.headers(),
			SystemTime::now(),
			self.inner.config.rate_limit().fallback_wait,
		) {
			return Ok(ClientError::RateLimited {
				status: status.as_u16(),
				retry_after: Some(signal.wait),
			});
		}

		let body = response.bytes().await.map_err(HttpError::from)?;
		let parsed: BasicError = serde_json::from_slice(&body).unwrap_or_default();
		let message = parsed
			.message
			.unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

		debug!(status = status.as_u16(), %message, "GitHub API error");

		Ok(ApiError {
			status: status.as_u16(),
			message,
			documentation_url: parsed.documentation_url,
		}
		.into())
	}
}
