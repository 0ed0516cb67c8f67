// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP plumbing shared by the ghkit crates.
//!
//! This crate provides:
//! - The [`Transport`] trait and the network-facing [`BaseTransport`]
//! - [`MiddlewareChain`] with the rate-limit and logging interceptors
//! - A pre-configured reqwest client builder with a consistent User-Agent

mod client;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod rate_limit;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod transport;

pub use client::{builder, builder_with_user_agent, user_agent};
pub use error::{HttpError, TokenExchangeError};
pub use logging::LoggingMiddleware;
pub use middleware::{Middleware, MiddlewareChain, Next};
pub use rate_limit::{detect_rate_limit, RateLimitConfig, RateLimitKind, RateLimitMiddleware, RateLimitSignal};
pub use transport::{BaseTransport, Transport};
