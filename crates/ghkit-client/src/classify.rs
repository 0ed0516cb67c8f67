// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Turns known API error signatures into empty successes.
//!
//! Some endpoints answer "there is nothing here" with an error status. The
//! classifier holds a whitelist of exact (resource, status, message)
//! signatures; anything else stays a failure. Only [`ApiError`]s reach it.

use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;

pub const BRANCH_PROTECTION: &str = "branch-protection";
pub const BRANCH_NOT_PROTECTED: &str = "Branch not protected";

/// One whitelisted failure signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticEmptyRule {
	pub resource: &'static str,
	pub status: u16,
	/// Compared for exact equality.
	pub message: &'static str,
	pub reason: &'static str,
}

impl SemanticEmptyRule {
	pub fn branch_not_protected() -> Self {
		Self {
			resource: BRANCH_PROTECTION,
			status: 404,
			message: BRANCH_NOT_PROTECTED,
			reason: "branch has no protection rules",
		}
	}

	pub fn matches(&self, resource: &str, error: &ApiError) -> bool {
		self.resource == resource && self.status == error.status && self.message == error.message
	}
}

/// A failure downgraded to "no error, no data".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticEmpty {
	resource: &'static str,
	reason: &'static str,
}

impl SemanticEmpty {
	pub fn resource(&self) -> &'static str {
		self.resource
	}

	pub fn reason(&self) -> &'static str {
		self.reason
	}

	/// The substitute payload, `{}`.
	pub fn payload(&self) -> Value {
		Value::Object(serde_json::Map::new())
	}
}

/// Result of a classified call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
	Success(T),
	EmptyBySemanticRule(SemanticEmpty),
	Failure(ApiError),
}

impl<T> ApiOutcome<T> {
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	pub fn is_semantic_empty(&self) -> bool {
		matches!(self, Self::EmptyBySemanticRule(_))
	}

	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiOutcome<U> {
		match self {
			Self::Success(value) => ApiOutcome::Success(f(value)),
			Self::EmptyBySemanticRule(empty) => ApiOutcome::EmptyBySemanticRule(empty),
			Self::Failure(err) => ApiOutcome::Failure(err),
		}
	}

	/// `Ok(None)` for a semantic empty.
	pub fn into_result(self) -> Result<Option<T>, ApiError> {
		match self {
			Self::Success(value) => Ok(Some(value)),
			Self::EmptyBySemanticRule(_) => Ok(None),
			Self::Failure(err) => Err(err),
		}
	}
}

#[derive(Debug, Clone)]
pub struct ResponseClassifier {
	rules: Vec<SemanticEmptyRule>,
}

impl Default for ResponseClassifier {
	fn default() -> Self {
		Self {
			rules: vec![SemanticEmptyRule::branch_not_protected()],
		}
	}
}

impl ResponseClassifier {
	/// Classifier with the built-in rules.
	pub fn new() -> Self {
		Self::default()
	}

	/// Classifier with no rules; every error stays a failure.
	pub fn without_rules() -> Self {
		Self { rules: Vec::new() }
	}

	/// Append a rule. Existing rules are never replaced.
	pub fn with_rule(mut self, rule: SemanticEmptyRule) -> Self {
		self.rules.push(rule);
		self
	}

	pub fn rules(&self) -> &[SemanticEmptyRule] {
		&self.rules
	}

	pub fn classify<T>(&self, resource: &str, error: ApiError) -> ApiOutcome<T> {
		match self.rules.iter().find(|rule| rule.matches(resource, &error)) {
			Some(rule) => {
				debug!(
					resource,
					status = error.status,
					reason = rule.reason,
					"API error classified as empty result"
				);
				ApiOutcome::EmptyBySemanticRule(SemanticEmpty {
					resource: rule.resource,
					reason: rule.reason,
				})
			}
			None => ApiOutcome::Failure(error),
		}
	}
}
