// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wire types for the installation token endpoint.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Body of `POST /app/installations/{id}/access_tokens`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
	pub token: String,
	pub expires_at: DateTime<Utc>,
	#[serde(default)]
	pub repository_selection: Option<String>,
}
