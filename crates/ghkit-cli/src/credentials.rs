// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Credential options read from the environment.
//!
//! | variable | option |
//! |---|---|
//! | `{P}_TOKEN` / `{P}_TOKEN_FILE` | static token |
//! | `{P}_CLIENT_ID` | App client ID |
//! | `{P}_APP_ID` | numeric App ID (used when no client ID is set) |
//! | `{P}_INSTALLATION_ID` | installation ID |
//! | `{P}_PRIVATE_KEY` / `{P}_PRIVATE_KEY_FILE` | App private key (PEM) |
//!
//! `P` is `GHKIT` for the binary. Validation of the combination is left to
//! the client builder.

use ghkit_client::{ClientOption, PrivateKeySource};
use ghkit_common_config::{load_parsed_env, load_secret_env, EnvError};

pub const ENV_PREFIX: &str = "GHKIT";

pub fn options_from_env(prefix: &str) -> Result<Vec<ClientOption>, EnvError> {
	let var = |name: &str| format!("{prefix}_{name}");
	let mut options = Vec::new();

	if let Some(token) = load_secret_env(&var("TOKEN"))? {
		options.push(ClientOption::Token(token));
	}

	let client_id = load_parsed_env::<String>(&var("CLIENT_ID"))?;
	let app_id = load_parsed_env::<u64>(&var("APP_ID"))?;
	match (client_id, app_id) {
		(Some(client_id), _) => options.push(ClientOption::AppClientId(client_id)),
		(None, Some(app_id)) => options.push(ClientOption::AppId(app_id)),
		(None, None) => {}
	}

	if let Some(id) = load_parsed_env::<i64>(&var("INSTALLATION_ID"))? {
		options.push(ClientOption::InstallationId(id));
	}

	if let Some(pem) = load_secret_env(&var("PRIVATE_KEY"))? {
		options.push(ClientOption::PrivateKey(PrivateKeySource::Pem(pem)));
	}

	Ok(options)
}
