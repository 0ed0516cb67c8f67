// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Primary and secondary rate-limit handling.
//!
//! GitHub signals a primary limit with `x-ratelimit-remaining: 0` plus an
//! `x-ratelimit-reset` epoch, and a secondary limit with `retry-after`. Both
//! arrive as 403 or 429. The middleware waits out the signal and re-issues a
//! clone of the original request, leaving the body untouched.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::error::HttpError;
use crate::middleware::{Middleware, Next};

pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
	/// Re-issues after the first attempt; the final response surfaces after this.
	pub max_retries: u32,
	/// Longest wait the middleware will sit out. A longer signal is returned
	/// to the caller immediately.
	pub max_wait: Duration,
	/// Wait used for a 429 that carries neither header.
	pub fallback_wait: Duration,
}

impl Default for RateLimitConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			max_wait: Duration::from_secs(60),
			fallback_wait: Duration::from_secs(60),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
	Primary,
	Secondary,
}

/// A rate-limit verdict for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSignal {
	pub kind: RateLimitKind,
	pub wait: Duration,
}

/// Inspect a response for a rate-limit signal.
///
/// `fallback_wait` applies only to a bare 429. A 403 without rate-limit
/// headers is a permissions error and yields `None`.
pub fn detect_rate_limit(
	status: StatusCode,
	headers: &HeaderMap,
	now: SystemTime,
	fallback_wait: Duration,
) -> Option<RateLimitSignal> {
	if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
		return None;
	}

	if let Some(wait) = parse_retry_after(headers, now) {
		return Some(RateLimitSignal {
			kind: RateLimitKind::Secondary,
			wait,
		});
	}

	if header_str(headers, RATE_LIMIT_REMAINING) == Some("0") {
		let wait = header_str(headers, RATE_LIMIT_RESET)
			.and_then(|reset| reset.parse::<u64>().ok())
			.map(|reset| wait_until_epoch(reset, now))
			.unwrap_or(fallback_wait);
		return Some(RateLimitSignal {
			kind: RateLimitKind::Primary,
			wait,
		});
	}

	if status == StatusCode::TOO_MANY_REQUESTS {
		return Some(RateLimitSignal {
			kind: RateLimitKind::Secondary,
			wait: fallback_wait,
		});
	}

	None
}

/// Parse `retry-after` as delta-seconds or an HTTP date.
pub fn parse_retry_after(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
	let value = header_str(headers, RETRY_AFTER.as_str())?.trim();

	if let Ok(seconds) = value.parse::<u64>() {
		return Some(Duration::from_secs(seconds));
	}

	let at = httpdate::parse_http_date(value).ok()?;
	Some(at.duration_since(now).unwrap_or(Duration::ZERO))
}

fn wait_until_epoch(reset_secs: u64, now: SystemTime) -> Duration {
	let now_secs = now
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs();
	Duration::from_secs(reset_secs.saturating_sub(now_secs))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|v| v.to_str().ok())
}

/// Waits out rate-limit responses and re-issues the request.
#[derive(Debug, Clone, Default)]
pub struct RateLimitMiddleware {
	config: RateLimitConfig,
}

impl RateLimitMiddleware {
	pub fn new(config: RateLimitConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &RateLimitConfig {
		&self.config
	}
}

#[async_trait]
impl Middleware for RateLimitMiddleware {
	fn name(&self) -> &'static str {
		"rate-limit"
	}

	async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, HttpError> {
		let mut request = request;
		let mut attempt: u32 = 0;

		loop {
			let replay = request.try_clone();
			let response = next.run(request).await?;

			let Some(signal) = detect_rate_limit(
				response.status(),
				response.headers(),
				SystemTime::now(),
				self.config.fallback_wait,
			) else {
				return Ok(response);
			};

			if attempt >= self.config.max_retries {
				warn!(
					status = response.status().as_u16(),
					attempts = attempt + 1,
					"Rate limit retries exhausted"
				);
				return Ok(response);
			}

			if signal.wait > self.config.max_wait {
				warn!(
					kind = ?signal.kind,
					wait_secs = signal.wait.as_secs(),
					max_wait_secs = self.config.max_wait.as_secs(),
					"Rate limit wait exceeds limit, not retrying"
				);
				return Ok(response);
			}

			let Some(replay) = replay else {
				debug!("Request body cannot be replayed, not retrying");
				return Ok(response);
			};

			attempt += 1;
			warn!(
				kind = ?signal.kind,
				status = response.status().as_u16(),
				attempt,
				max_retries = self.config.max_retries,
				delay_ms = signal.wait.as_millis() as u64,
				"Rate limited, retrying"
			);

			drop(response);
			tokio::time::sleep(signal.wait).await;
			request = replay;
		}
	}
}
