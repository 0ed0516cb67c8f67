// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! End-to-end tests for the client pipeline against a mock GitHub API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use ghkit_client::{
	ApiOutcome, AuthConfigError, BuildError, ClientError, GithubClient, PrivateKeySource,
	RateLimitConfig,
};
use ghkit_common_http::{HttpError, Middleware, Next};
use ghkit_github_app::testing::TEST_APP_PRIVATE_KEY;
use reqwest::{Method, Request, Response};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROTECTION_PATH: &str = "/repos/octo/widgets/branches/main/protection";
const TOKEN_PATH: &str = "/app/installations/77/access_tokens";

fn protection_body() -> serde_json::Value {
	serde_json::json!({
		"url": "https://api.github.com/repos/octo/widgets/branches/main/protection",
		"required_status_checks": {"strict": true, "contexts": ["ci/build"]},
		"enforce_admins": {"enabled": true},
		"allow_force_pushes": {"enabled": false}
	})
}

fn static_client(server: &MockServer) -> GithubClient {
	GithubClient::builder()
		.with_base_url(server.uri())
		.with_token("ghp_static")
		.build()
		.unwrap()
}

fn app_client(server: &MockServer) -> GithubClient {
	GithubClient::builder()
		.with_base_url(server.uri())
		.with_github_app(
			"Iv1.integration",
			77,
			PrivateKeySource::pem(TEST_APP_PRIVATE_KEY),
		)
		.with_refresh_margin(Duration::ZERO)
		.build()
		.unwrap()
}

fn token_response(token: &str, expires_in: chrono::Duration) -> ResponseTemplate {
	let expires_at = (Utc::now() + expires_in).to_rfc3339_opts(SecondsFormat::Secs, true);
	ResponseTemplate::new(201).set_body_json(serde_json::json!({
		"token": token,
		"expires_at": expires_at,
	}))
}

/// Records `METHOD path` of every request passing through it.
#[derive(Default)]
struct RequestLog {
	seen: Mutex<Vec<String>>,
}

impl RequestLog {
	fn seen(&self) -> Vec<String> {
		self.seen.lock().unwrap().clone()
	}
}

#[async_trait]
impl Middleware for RequestLog {
	fn name(&self) -> &'static str {
		"request-log"
	}

	async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, HttpError> {
		self.seen
			.lock()
			.unwrap()
			.push(format!("{} {}", request.method(), request.url().path()));
		next.run(request).await
	}
}

fn authorization(request: &wiremock::Request) -> String {
	request
		.headers
		.get("authorization")
		.map(|value| value.to_str().unwrap().to_string())
		.unwrap_or_default()
}

/// Building without any credential fails.
/// **Why Important**: A client must never silently send unauthenticated
/// requests because configuration was forgotten.
#[test]
fn test_missing_credentials_fail_build() {
	let err = GithubClient::builder().build().unwrap_err();
	assert!(matches!(err, BuildError::AuthConfig(AuthConfigError::Missing)));
}

/// A token together with complete App data is contradictory.
/// **Why Important**: Exactly one credential is active per client.
#[test]
fn test_token_and_app_credentials_conflict() {
	let err = GithubClient::builder()
		.with_github_app("Iv1.x", 1, PrivateKeySource::pem(TEST_APP_PRIVATE_KEY))
		.with_token("ghp_x")
		.build()
		.unwrap_err();
	assert!(matches!(err, BuildError::AuthConfig(AuthConfigError::Conflicting)));
}

/// The static token is sent as a bearer credential and the payload decoded.
#[tokio::test]
async fn test_static_token_fetches_protection() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.and(header("authorization", "Bearer ghp_static"))
		.and(header("accept", "application/vnd.github+json"))
		.and(header("x-github-api-version", "2022-11-28"))
		.respond_with(ResponseTemplate::new(200).set_body_json(protection_body()))
		.expect(1)
		.mount(&server)
		.await;

	let client = static_client(&server);
	let bytes = client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap();

	let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
	assert_eq!(value, protection_body());
}

/// An unprotected branch yields `{}` instead of an error.
/// **Why Important**: Callers auditing many branches must not treat the
/// documented "not protected" answer as a failure.
#[tokio::test]
async fn test_unprotected_branch_is_empty_object() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
			"message": "Branch not protected",
			"documentation_url": "https://docs.github.com/rest/branches/branch-protection"
		})))
		.mount(&server)
		.await;

	let client = static_client(&server);

	let outcome = client
		.get_branch_protection("octo", "widgets", "main")
		.await
		.unwrap();
	assert!(outcome.is_semantic_empty());

	let bytes = client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap();
	assert_eq!(bytes, b"{}");
}

/// Any other 404 stays a structured failure.
#[tokio::test]
async fn test_missing_branch_is_api_error() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
			"message": "Branch not found",
			"documentation_url": "https://docs.github.com/rest/branches"
		})))
		.mount(&server)
		.await;

	let client = static_client(&server);

	match client
		.get_branch_protection("octo", "widgets", "main")
		.await
		.unwrap()
	{
		ApiOutcome::Failure(err) => {
			assert_eq!(err.status, 404);
			assert_eq!(err.message, "Branch not found");
		}
		other => panic!("expected failure, got {other:?}"),
	}

	let err = client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap_err();
	match err {
		ClientError::Api(api) => {
			assert_eq!(api.status, 404);
			assert_eq!(
				api.documentation_url.as_deref(),
				Some("https://docs.github.com/rest/branches")
			);
		}
		other => panic!("expected API error, got {other:?}"),
	}
}

/// An error body that is not JSON falls back to the reason phrase.
#[tokio::test]
async fn test_unparsable_error_body_uses_reason_phrase() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
		.mount(&server)
		.await;

	let err = static_client(&server)
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap_err();
	match err {
		ClientError::Api(api) => {
			assert_eq!(api.status, 502);
			assert_eq!(api.message, "Bad Gateway");
			assert!(api.documentation_url.is_none());
		}
		other => panic!("expected API error, got {other:?}"),
	}
}

/// Installation tokens are reused until expiry, then exchanged once more.
/// **Why Important**: Every exchange costs a signed JWT round trip; the cache
/// must not refresh a still-valid token, and must refresh an expired one.
#[tokio::test]
async fn test_installation_token_reused_until_expiry() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path(TOKEN_PATH))
		.respond_with(token_response("ghs_first", chrono::Duration::seconds(3)))
		.up_to_n_times(1)
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path(TOKEN_PATH))
		.respond_with(token_response("ghs_second", chrono::Duration::hours(1)))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_json(protection_body()))
		.expect(3)
		.mount(&server)
		.await;

	let client = app_client(&server);

	client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap();
	client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap();

	tokio::time::sleep(Duration::from_secs(4)).await;

	client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap();

	let auth_headers: Vec<String> = server
		.received_requests()
		.await
		.unwrap()
		.iter()
		.filter(|r| r.url.path() == PROTECTION_PATH)
		.map(|r| {
			r.headers
				.get("authorization")
				.unwrap()
				.to_str()
				.unwrap()
				.to_string()
		})
		.collect();
	assert_eq!(
		auth_headers,
		vec![
			"Bearer ghs_first",
			"Bearer ghs_first",
			"Bearer ghs_second"
		]
	);
}

/// Concurrent first requests share a single token exchange.
#[tokio::test]
async fn test_concurrent_requests_share_exchange() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path(TOKEN_PATH))
		.respond_with(
			token_response("ghs_shared", chrono::Duration::hours(1))
				.set_delay(Duration::from_millis(200)),
		)
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.and(header("authorization", "Bearer ghs_shared"))
		.respond_with(ResponseTemplate::new(200).set_body_json(protection_body()))
		.expect(5)
		.mount(&server)
		.await;

	let client = app_client(&server);
	let calls = (0..5).map(|_| {
		let client = client.clone();
		async move { client.branch_protection_rules("octo", "widgets", "main").await }
	});

	for result in futures::future::join_all(calls).await {
		result.unwrap();
	}
}

/// A failed exchange surfaces as a token exchange error, not an API error.
#[tokio::test]
async fn test_exchange_failure_surfaces_to_caller() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path(TOKEN_PATH))
		.respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_json(protection_body()))
		.expect(0)
		.mount(&server)
		.await;

	let err = app_client(&server)
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap_err();

	assert!(matches!(err, ClientError::TokenExchange(_)));
	assert_eq!(err.status(), Some(401));
}

/// A secondary rate limit is waited out and the request re-sent unchanged.
/// **Why Important**: Retries must carry the original body byte for byte.
#[tokio::test]
async fn test_rate_limited_request_is_retried_with_same_body() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/repos/octo/widgets/issues"))
		.respond_with(
			ResponseTemplate::new(429)
				.insert_header("retry-after", "0")
				.set_body_json(serde_json::json!({"message": "You have exceeded a secondary rate limit"})),
		)
		.up_to_n_times(1)
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/repos/octo/widgets/issues"))
		.respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"number": 1})))
		.expect(1)
		.mount(&server)
		.await;

	let client = static_client(&server);
	let payload = br#"{"title":"Found a bug","body":"It breaks."}"#;
	let mut request = client
		.request(Method::POST, &["repos", "octo", "widgets", "issues"])
		.unwrap();
	*request.body_mut() = Some(reqwest::Body::from(payload.to_vec()));

	let response = client.send(request).await.unwrap();
	assert_eq!(response.status(), 201);

	let received = server.received_requests().await.unwrap();
	assert_eq!(received.len(), 2);
	for request in &received {
		assert_eq!(request.body, payload.to_vec());
	}
}

/// Once retries run out the caller sees a rate-limit error.
#[tokio::test]
async fn test_exhausted_rate_limit_is_reported() {
	let server = MockServer::start().await;
	let reset = Utc::now().timestamp().to_string();
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.respond_with(
			ResponseTemplate::new(403)
				.insert_header("x-ratelimit-remaining", "0")
				.insert_header("x-ratelimit-reset", reset.as_str())
				.set_body_json(serde_json::json!({"message": "API rate limit exceeded"})),
		)
		.expect(2)
		.mount(&server)
		.await;

	let client = GithubClient::builder()
		.with_base_url(server.uri())
		.with_token("ghp_static")
		.with_rate_limit(RateLimitConfig {
			max_retries: 1,
			..RateLimitConfig::default()
		})
		.build()
		.unwrap();

	let err = client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap_err();
	assert!(matches!(err, ClientError::RateLimited { status: 403, .. }));
}

/// The request timeout aborts a slow call.
#[tokio::test]
async fn test_request_timeout() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(protection_body())
				.set_delay(Duration::from_secs(2)),
		)
		.mount(&server)
		.await;

	let client = GithubClient::builder()
		.with_base_url(server.uri())
		.with_token("ghp_static")
		.with_request_timeout(Duration::from_millis(200))
		.build()
		.unwrap();

	let err = client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap_err();
	assert!(matches!(err, ClientError::Timeout));
}

/// Branch names are percent-encoded into a single path segment.
#[tokio::test]
async fn test_branch_name_with_slash_is_encoded() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/widgets/branches/release%2F2.0/protection"))
		.respond_with(ResponseTemplate::new(200).set_body_json(protection_body()))
		.expect(1)
		.mount(&server)
		.await;

	static_client(&server)
		.branch_protection_rules("octo", "widgets", "release/2.0")
		.await
		.unwrap();
}

/// An error body cut off mid-stream is a transport failure.
/// **Why Important**: A dropped connection must not be passed off as a
/// GitHub API answer built from the status line alone.
#[tokio::test]
async fn test_truncated_error_body_is_transport_error() {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		let (mut socket, _) = listener.accept().await.unwrap();
		let mut buf = [0u8; 4096];
		let _ = socket.read(&mut buf).await;
		socket
			.write_all(
				b"HTTP/1.1 502 Bad Gateway\r\n\
				content-type: application/json\r\n\
				content-length: 64\r\n\
				\r\n\
				{\"message\":",
			)
			.await
			.unwrap();
		socket.shutdown().await.unwrap();
	});

	let client = GithubClient::builder()
		.with_base_url(format!("http://{addr}"))
		.with_token("ghp_static")
		.build()
		.unwrap();

	let err = client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap_err();
	assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
	assert_eq!(err.status(), None);
}

/// In App mode a rate-limited request is retried with the installation token.
/// **Why Important**: Rate limiting wraps App authentication, so every retry
/// is re-authenticated, and one exchange serves the original and the retry.
#[tokio::test]
async fn test_app_mode_retry_carries_installation_token() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path(TOKEN_PATH))
		.respond_with(token_response("ghs_retry", chrono::Duration::hours(1)))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.respond_with(
			ResponseTemplate::new(429)
				.insert_header("retry-after", "0")
				.set_body_json(serde_json::json!({"message": "You have exceeded a secondary rate limit"})),
		)
		.up_to_n_times(1)
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_json(protection_body()))
		.expect(1)
		.mount(&server)
		.await;

	let client = app_client(&server);
	let bytes = client
		.branch_protection_rules("octo", "widgets", "main")
		.await
		.unwrap();
	let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
	assert_eq!(value, protection_body());

	let received = server.received_requests().await.unwrap();
	let api_auth: Vec<String> = received
		.iter()
		.filter(|r| r.url.path() == PROTECTION_PATH)
		.map(authorization)
		.collect();
	assert_eq!(api_auth, vec!["Bearer ghs_retry", "Bearer ghs_retry"]);

	let exchanges: Vec<&wiremock::Request> =
		received.iter().filter(|r| r.url.path() == TOKEN_PATH).collect();
	assert_eq!(exchanges.len(), 1);
	assert!(authorization(exchanges[0]).starts_with("Bearer ey"));
}

/// The token exchange never passes through user middleware.
/// **Why Important**: Logging and other user middleware must not see the
/// signed App JWT, and the exchange must not be retried by rate limiting.
#[tokio::test]
async fn test_token_exchange_bypasses_user_middleware() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path(TOKEN_PATH))
		.respond_with(token_response("ghs_quiet", chrono::Duration::hours(1)))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(PROTECTION_PATH))
		.and(header("authorization", "Bearer ghs_quiet"))
		.respond_with(ResponseTemplate::new(200).set_body_json(protection_body()))
		.expect(2)
		.mount(&server)
		.await;

	let log = Arc::new(RequestLog::default());
	let client = GithubClient::builder()
		.with_base_url(server.uri())
		.with_github_app(
			"Iv1.integration",
			77,
			PrivateKeySource::pem(TEST_APP_PRIVATE_KEY),
		)
		.with_logging()
		.with_middleware(log.clone())
		.build()
		.unwrap();
	assert_eq!(
		client.middleware_names(),
		vec!["logging", "request-log", "rate-limit"]
	);

	for _ in 0..2 {
		client
			.branch_protection_rules("octo", "widgets", "main")
			.await
			.unwrap();
	}

	let expected = format!("GET {PROTECTION_PATH}");
	assert_eq!(log.seen(), vec![expected.clone(), expected]);
}
