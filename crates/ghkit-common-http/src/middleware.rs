// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Ordered request/response interceptors around an inner transport.
//!
//! Links run in registration order: the first registered link sees the
//! request first and the response last. The chain itself is a [`Transport`],
//! so it can wrap a credential layer and be wrapped in turn.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::error::HttpError;
use crate::transport::Transport;

/// A request/response interceptor.
///
/// Implementations either answer without calling `next` or forward through
/// [`Next::run`], optionally more than once (retries) and optionally
/// post-processing the response.
#[async_trait]
pub trait Middleware: Send + Sync {
	/// Stable name, used in logs and for inspecting chain order.
	fn name(&self) -> &'static str;

	async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, HttpError>;
}

/// The remainder of the chain after the current link.
#[derive(Clone, Copy)]
pub struct Next<'a> {
	links: &'a [Arc<dyn Middleware>],
	inner: &'a dyn Transport,
}

impl<'a> Next<'a> {
	pub fn new(links: &'a [Arc<dyn Middleware>], inner: &'a dyn Transport) -> Self {
		Self { links, inner }
	}

	/// Forward `request` to the next link, or to the inner transport when no
	/// links remain.
	pub async fn run(self, request: Request) -> Result<Response, HttpError> {
		match self.links.split_first() {
			Some((link, rest)) => {
				link
					.handle(
						request,
						Next {
							links: rest,
							inner: self.inner,
						},
					)
					.await
			}
			None => self.inner.execute(request).await,
		}
	}
}

/// A fixed sequence of middleware around an exclusively owned transport.
pub struct MiddlewareChain {
	links: Vec<Arc<dyn Middleware>>,
	inner: Box<dyn Transport>,
}

impl MiddlewareChain {
	pub fn new(inner: Box<dyn Transport>) -> Self {
		Self {
			links: Vec::new(),
			inner,
		}
	}

	/// Append a link; it runs after every link registered before it.
	pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.links.push(middleware);
		self
	}

	/// Link names in execution order.
	pub fn names(&self) -> Vec<&'static str> {
		self.links.iter().map(|link| link.name()).collect()
	}

	pub fn is_empty(&self) -> bool {
		self.links.is_empty()
	}
}

impl fmt::Debug for MiddlewareChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MiddlewareChain")
			.field("links", &self.names())
			.finish_non_exhaustive()
	}
}

#[async_trait]
impl Transport for MiddlewareChain {
	async fn execute(&self, request: Request) -> Result<Response, HttpError> {
		Next::new(&self.links, self.inner.as_ref())
			.run(request)
			.await
	}
}
