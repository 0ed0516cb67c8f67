// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Authenticated GitHub REST client.
//!
//! [`ClientBuilder`] validates the credential (a static token or a GitHub App
//! installation, never both) and wires the request pipeline once. Every call
//! then flows through user middleware, rate limiting and App authentication
//! to the network. [`ResponseClassifier`] turns documented "nothing here"
//! errors into [`ApiOutcome::EmptyBySemanticRule`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use ghkit_client::{ApiOutcome, GithubClient};
//!
//! let client = GithubClient::builder().with_token("ghp_example").build()?;
//! match client.get_branch_protection("octocat", "hello-world", "main").await? {
//! 	ApiOutcome::Success(rules) => println!("{rules:?}"),
//! 	ApiOutcome::EmptyBySemanticRule(empty) => println!("{}", empty.reason()),
//! 	ApiOutcome::Failure(err) => eprintln!("{err}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use builder::ClientBuilder;
pub use classify::{
	ApiOutcome, ResponseClassifier, SemanticEmpty, SemanticEmptyRule, BRANCH_NOT_PROTECTED,
	BRANCH_PROTECTION,
};
pub use client::GithubClient;
pub use config::{
	AppCredential, ClientConfig, ClientOption, ConfigDraft, Credential, MiddlewareEntry,
	DEFAULT_API_VERSION, DEFAULT_BASE_URL,
};
pub use error::{ApiError, AuthConfigError, BuildError, ClientError};
pub use ghkit_common_http::RateLimitConfig;
pub use ghkit_github_app::PrivateKeySource;
pub use types::BranchProtection;
