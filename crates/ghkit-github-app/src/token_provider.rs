// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ghkit_common_config::SecretString;
use ghkit_common_http::TokenExchangeError;

use crate::installation::InstallationTokenCache;

/// Source of the bearer token for API requests.
#[derive(Debug, Clone)]
pub enum TokenProvider {
	/// A fixed token, returned as-is and never refreshed.
	Static(SecretString),
	/// An installation token kept fresh by the cache.
	AppInstallation(Arc<InstallationTokenCache>),
}

impl TokenProvider {
	pub async fn token(&self) -> Result<SecretString, TokenExchangeError> {
		self.token_at(Utc::now()).await
	}

	pub async fn token_at(&self, now: DateTime<Utc>) -> Result<SecretString, TokenExchangeError> {
		match self {
			Self::Static(token) => Ok(token.clone()),
			Self::AppInstallation(cache) => cache.token_at(now).await,
		}
	}

	/// Drop a rejected installation token. A static token has nothing to
	/// refresh, so this is a no-op for it.
	pub async fn invalidate(&self) {
		if let Self::AppInstallation(cache) = self {
			cache.invalidate().await;
		}
	}

	pub fn installation_id(&self) -> Option<i64> {
		match self {
			Self::Static(_) => None,
			Self::AppInstallation(cache) => Some(cache.installation_id()),
		}
	}

	pub fn is_app_installation(&self) -> bool {
		matches!(self, Self::AppInstallation(_))
	}

	pub fn kind(&self) -> &'static str {
		match self {
			Self::Static(_) => "static-token",
			Self::AppInstallation(_) => "app-installation",
		}
	}
}
