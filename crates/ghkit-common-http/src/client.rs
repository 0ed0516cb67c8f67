// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared reqwest client construction with a consistent User-Agent header.

use reqwest::ClientBuilder;

/// Default User-Agent: `ghkit/{version}`.
pub fn user_agent() -> String {
	format!("ghkit/{}", env!("CARGO_PKG_VERSION"))
}

/// Client builder carrying the default User-Agent.
pub fn builder() -> ClientBuilder {
	builder_with_user_agent(user_agent())
}

/// Client builder carrying a caller-chosen User-Agent.
pub fn builder_with_user_agent(user_agent: impl Into<String>) -> ClientBuilder {
	reqwest::Client::builder().user_agent(user_agent.into())
}
