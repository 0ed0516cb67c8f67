// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use ghkit_common_config::SecretString;
use ghkit_common_http::{HttpError, TokenExchangeError, Transport};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use tracing::warn;

use crate::token_provider::TokenProvider;

/// `Bearer <token>` as a sensitive header value, or `None` when the token
/// contains bytes a header cannot carry.
pub fn bearer_header(token: &SecretString) -> Option<HeaderValue> {
	let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose())).ok()?;
	value.set_sensitive(true);
	Some(value)
}

/// Decorates a transport with the provider's current token on every request.
///
/// Any `Authorization` header already on the request is replaced. A 401 from
/// upstream drops the cached token so the next request exchanges a new one;
/// the 401 itself is returned unchanged.
#[derive(Debug)]
pub struct AppAuthTransport<T> {
	inner: T,
	tokens: TokenProvider,
}

impl<T: Transport> AppAuthTransport<T> {
	pub fn new(inner: T, tokens: TokenProvider) -> Self {
		Self { inner, tokens }
	}

	pub fn tokens(&self) -> &TokenProvider {
		&self.tokens
	}
}

#[async_trait]
impl<T: Transport> Transport for AppAuthTransport<T> {
	async fn execute(&self, mut request: Request) -> Result<Response, HttpError> {
		let token = self.tokens.token().await?;
		let value = bearer_header(&token).ok_or_else(|| {
			TokenExchangeError::InvalidResponse("installation token is not a valid header value".to_string())
		})?;
		request.headers_mut().insert(AUTHORIZATION, value);

		let response = self.inner.execute(request).await?;

		if response.status() == StatusCode::UNAUTHORIZED {
			warn!(
				installation_id = self.tokens.installation_id(),
				"Installation token rejected, dropping cached token"
			);
			self.tokens.invalidate().await;
		}

		Ok(response)
	}
}
