// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Diagnostic request logging.

use std::time::Instant;

use async_trait::async_trait;
use ghkit_common_config::REDACTED;
use reqwest::header::{HeaderMap, HeaderName, AUTHORIZATION, COOKIE, PROXY_AUTHORIZATION};
use reqwest::{Request, Response};
use tracing::{debug, info};

use crate::error::HttpError;
use crate::middleware::{Middleware, Next};

const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024;

/// Logs method, URL, headers and body of each outgoing request.
///
/// Credential headers are redacted. Buffered bodies are read in place, so
/// the next link receives exactly the bytes the caller supplied; streaming
/// bodies are forwarded without being captured. Responses pass through
/// unmodified.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
	max_body_bytes: usize,
}

impl Default for LoggingMiddleware {
	fn default() -> Self {
		Self {
			max_body_bytes: DEFAULT_MAX_BODY_BYTES,
		}
	}
}

impl LoggingMiddleware {
	pub fn new() -> Self {
		Self::default()
	}

	/// Truncate logged bodies beyond `max` bytes. Zero disables body logging.
	pub fn with_max_body_bytes(mut self, max: usize) -> Self {
		self.max_body_bytes = max;
		self
	}

	fn describe_body(&self, request: &Request) -> String {
		let Some(body) = request.body() else {
			return String::new();
		};
		if self.max_body_bytes == 0 {
			return "<omitted>".to_string();
		}
		match body.as_bytes() {
			Some(bytes) if bytes.len() > self.max_body_bytes => format!(
				"{}... ({} bytes)",
				String::from_utf8_lossy(&bytes[..self.max_body_bytes]),
				bytes.len()
			),
			Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
			None => "<streaming body>".to_string(),
		}
	}
}

fn is_sensitive(name: &HeaderName) -> bool {
	name == AUTHORIZATION || name == PROXY_AUTHORIZATION || name == COOKIE
}

/// Render headers one per line, redacting credentials.
pub fn format_headers(headers: &HeaderMap) -> String {
	headers
		.iter()
		.map(|(name, value)| {
			if is_sensitive(name) {
				format!("{name}: {REDACTED}")
			} else {
				format!("{name}: {}", value.to_str().unwrap_or("<binary>"))
			}
		})
		.collect::<Vec<_>>()
		.join("\n")
}

#[async_trait]
impl Middleware for LoggingMiddleware {
	fn name(&self) -> &'static str {
		"logging"
	}

	async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, HttpError> {
		info!(
			method = %request.method(),
			url = %request.url(),
			headers = %format_headers(request.headers()),
			body = %self.describe_body(&request),
			"Outgoing request"
		);

		let started = Instant::now();
		let result = next.run(request).await;

		match &result {
			Ok(response) => debug!(
				status = response.status().as_u16(),
				elapsed_ms = started.elapsed().as_millis() as u64,
				"Response received"
			),
			Err(e) => debug!(
				error = %e,
				elapsed_ms = started.elapsed().as_millis() as u64,
				"Request failed"
			),
		}

		result
	}
}
