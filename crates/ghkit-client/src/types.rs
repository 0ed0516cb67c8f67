// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub API payloads used by the client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GitHub's error body: `{"message": ..., "documentation_url": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BasicError {
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub documentation_url: Option<String>,
}

/// A toggle such as `enforce_admins` or `allow_force_pushes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledSetting {
	pub enabled: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredStatusChecks {
	#[serde(default)]
	pub strict: bool,
	#[serde(default)]
	pub contexts: Vec<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// `GET /repos/{owner}/{repo}/branches/{branch}/protection`.
///
/// Fields not modelled here are kept in `extra` so the payload re-serializes
/// without loss.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchProtection {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub required_status_checks: Option<RequiredStatusChecks>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enforce_admins: Option<EnabledSetting>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub required_pull_request_reviews: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub restrictions: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub required_linear_history: Option<EnabledSetting>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub allow_force_pushes: Option<EnabledSetting>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub allow_deletions: Option<EnabledSetting>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
