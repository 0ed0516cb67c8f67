// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The single capability every pipeline layer shares: execute a request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Request, Response};
use tracing::trace;

use crate::error::HttpError;

/// One layer of the request pipeline.
///
/// Decorators (credential injection, the middleware chain) own the layer they
/// wrap and delegate to it; [`BaseTransport`] sits at the bottom and talks to
/// the network.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn execute(&self, request: Request) -> Result<Response, HttpError>;
}

#[async_trait]
impl<T> Transport for Box<T>
where
	T: Transport + ?Sized,
{
	async fn execute(&self, request: Request) -> Result<Response, HttpError> {
		(**self).execute(request).await
	}
}

#[async_trait]
impl<T> Transport for Arc<T>
where
	T: Transport + ?Sized,
{
	async fn execute(&self, request: Request) -> Result<Response, HttpError> {
		(**self).execute(request).await
	}
}

/// Innermost transport backed by a [`reqwest::Client`].
///
/// Cloning is cheap; clones share the client's connection pool.
#[derive(Debug, Clone)]
pub struct BaseTransport {
	client: Client,
}

impl BaseTransport {
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	pub fn client(&self) -> &Client {
		&self.client
	}
}

#[async_trait]
impl Transport for BaseTransport {
	async fn execute(&self, request: Request) -> Result<Response, HttpError> {
		trace!(method = %request.method(), url = %request.url(), "Sending request");
		self
			.client
			.execute(request)
			.await
			.map_err(HttpError::from_reqwest)
	}
}
