// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory transport for pipeline tests.
//!
//! [`ScriptedTransport`] answers requests from a queue of canned responses
//! and records every request it sees, including the body bytes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, Response, Url};

use crate::error::HttpError;
use crate::transport::Transport;

#[derive(Debug, Clone)]
struct Scripted {
	status: u16,
	headers: Vec<(String, String)>,
	body: String,
}

impl Scripted {
	fn to_response(&self) -> Response {
		let mut builder = http::Response::builder().status(self.status);
		for (name, value) in &self.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		let response = builder
			.body(self.body.clone())
			.unwrap_or_else(|_| http::Response::new(String::new()));
		Response::from(response)
	}
}

/// A request as observed by the bottom of the pipeline.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
	pub method: Method,
	pub url: Url,
	pub headers: HeaderMap,
	pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}
}

/// Shared view of the requests a [`ScriptedTransport`] received.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
	pub fn requests(&self) -> Vec<RecordedRequest> {
		self
			.requests
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub fn count(&self) -> usize {
		self
			.requests
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}

	fn record(&self, request: &Request) {
		let recorded = RecordedRequest {
			method: request.method().clone(),
			url: request.url().clone(),
			headers: request.headers().clone(),
			body: request
				.body()
				.and_then(|body| body.as_bytes())
				.map(<[u8]>::to_vec),
		};
		self
			.requests
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(recorded);
	}
}

/// Answers from a script; once the script runs out the last response repeats.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
	script: Mutex<VecDeque<Scripted>>,
	last: Mutex<Option<Scripted>>,
	recorder: Recorder,
}

impl ScriptedTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn respond(self, status: u16, body: &str) -> Self {
		self.respond_with_headers(status, &[], body)
	}

	pub fn respond_with_headers(self, status: u16, headers: &[(&str, &str)], body: &str) -> Self {
		self
			.script
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push_back(Scripted {
				status,
				headers: headers
					.iter()
					.map(|(k, v)| ((*k).to_string(), (*v).to_string()))
					.collect(),
				body: body.to_string(),
			});
		self
	}

	pub fn recorder(&self) -> Recorder {
		self.recorder.clone()
	}

	fn next_scripted(&self) -> Scripted {
		let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
		let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(next) = script.pop_front() {
			*last = Some(next.clone());
			return next;
		}
		last.clone().unwrap_or(Scripted {
			status: 200,
			headers: Vec::new(),
			body: String::new(),
		})
	}
}

#[async_trait]
impl Transport for ScriptedTransport {
	async fn execute(&self, request: Request) -> Result<Response, HttpError> {
		self.recorder.record(&request);
		Ok(self.next_scripted().to_response())
	}
}
