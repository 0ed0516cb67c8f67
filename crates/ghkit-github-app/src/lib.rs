// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub App authentication for ghkit.
//!
//! An App authenticates as one installation by signing a short-lived RS256
//! JWT and exchanging it for an installation access token. This crate holds
//! the signer, the token cache, [`TokenProvider`] and [`AppAuthTransport`],
//! which puts the provider's current token on every request passing through it.

pub mod error;
pub mod installation;
pub mod jwt;
pub mod key;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod token_provider;
pub mod transport;
pub mod types;

pub use error::GithubAppError;
pub use installation::{
	InstallationToken, InstallationTokenCache, DEFAULT_API_VERSION, DEFAULT_REFRESH_MARGIN,
};
pub use jwt::AppJwtSigner;
pub use key::PrivateKeySource;
pub use token_provider::TokenProvider;
pub use transport::{bearer_header, AppAuthTransport};
pub use types::AccessTokenResponse;
