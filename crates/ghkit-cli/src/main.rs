// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! ghkit: print the branch protection rules of a GitHub repository.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ghkit_client::{ClientError, ClientOption, GithubClient, DEFAULT_BASE_URL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod credentials;

/// ghkit - authenticated GitHub REST client.
#[derive(Parser, Debug)]
#[command(name = "ghkit", about = "Authenticated GitHub REST client", version)]
struct Cli {
	/// Emit logs as JSON lines
	#[arg(long, global = true, env = "GHKIT_LOG_JSON")]
	log_json: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print a branch's protection rules as JSON (`{}` when unprotected)
	Protection(ProtectionArgs),
}

#[derive(Args, Debug)]
struct ProtectionArgs {
	/// Repository owner
	#[arg(long, env = "GHKIT_OWNER")]
	owner: String,

	/// Repository name
	#[arg(long, env = "GHKIT_REPO")]
	repo: String,

	/// Branch name
	#[arg(long, env = "GHKIT_BRANCH", default_value = "main")]
	branch: String,

	/// API base URL (GitHub Enterprise: https://HOST/api/v3)
	#[arg(long, env = "GHKIT_BASE_URL", default_value = DEFAULT_BASE_URL)]
	base_url: String,

	/// Overall request timeout in seconds, retries included
	#[arg(long, env = "GHKIT_TIMEOUT_SECS", default_value_t = 5)]
	timeout_secs: u64,

	/// Log every outgoing request (credentials redacted)
	#[arg(long)]
	log_requests: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
	// Load .env before parsing so `env = ...` arguments see it
	dotenvy::dotenv().ok();

	let cli = Cli::parse();

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info".into()),
		)
		.with(
			cli.log_json
				.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
		)
		.with(
			(!cli.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
		)
		.init();

	match run(cli).await {
		Ok(code) => code,
		Err(e) => {
			tracing::error!(error = %format!("{e:#}"), "ghkit failed");
			ExitCode::FAILURE
		}
	}
}

async fn run(cli: Cli) -> Result<ExitCode> {
	match cli.command {
		Command::Protection(args) => protection(args).await,
	}
}

async fn protection(args: ProtectionArgs) -> Result<ExitCode> {
	let mut options = credentials::options_from_env(credentials::ENV_PREFIX)
		.context("failed to read credentials from the environment")?;
	options.push(ClientOption::BaseUrl(args.base_url.clone()));
	options.push(ClientOption::RequestTimeout(Duration::from_secs(args.timeout_secs)));

	let mut builder = GithubClient::builder().options(options);
	if args.log_requests {
		builder = builder.with_logging();
	}
	let client = builder.build().context("failed to build GitHub client")?;

	tracing::info!(
		owner = %args.owner,
		repo = %args.repo,
		branch = %args.branch,
		auth = client.token_provider().kind(),
		"Fetching branch protection"
	);

	match client
		.branch_protection_rules(&args.owner, &args.repo, &args.branch)
		.await
	{
		Ok(bytes) => {
			let value: serde_json::Value =
				serde_json::from_slice(&bytes).context("protection payload is not JSON")?;
			println!("{}", serde_json::to_string_pretty(&value)?);
			Ok(ExitCode::SUCCESS)
		}
		Err(ClientError::Api(err)) => {
			eprintln!("{}", serde_json::to_string_pretty(&err)?);
			Ok(ExitCode::FAILURE)
		}
		Err(err) => Err(err).context("request failed"),
	}
}
