//! topicsel - command line client for thesis/internship topic selection.
//!
//! Every view command first navigates through the route guard, so protected
//! commands refuse to run until `topicsel login` has stored a token.

mod app;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use topicsel_core::auth;
use topicsel_core::models::TeamMemberParam;
use topicsel_core::{ApiClient, Config, Router};

use app::App;

/// Log file name prefix inside `<cache_dir>/logs`
const LOG_FILE_PREFIX: &str = "topicsel.log";

#[derive(Parser, Debug)]
#[command(name = "topicsel", version, about = "Thesis/internship topic selection client")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, env = "TOPICSEL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the authentication partition base URL
    #[arg(long)]
    auth_base_url: Option<String>,

    /// Override the business partition base URL
    #[arg(long)]
    api_base_url: Option<String>,

    /// Print response data as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in; fetches a CAPTCHA unless both --captcha-key and --captcha are given
    Login(LoginArgs),
    /// Forget the stored token
    Logout,
    /// Fetch a CAPTCHA challenge and save it as a viewable file
    Captcha {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Home view: available theses and unselected students
    Home,
    /// List available theses
    Theses,
    /// List students without a selection
    Students,
    /// Submit a selection application
    Apply(ApplyCommand),
    /// Show whether a selection has been submitted
    Status,
    /// Show the submitted selection
    Detail,
    /// Resolve a path through the route guard
    Open { path: String },
    /// List the route table
    Routes,
    /// Show the stored session
    Session,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Student or staff number; defaults to the last one used
    #[arg(long)]
    pub identifier: Option<String>,

    #[arg(long, default_value = "STUDENT")]
    pub user_type: String,

    #[arg(long, env = "TOPICSEL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long)]
    pub captcha_key: Option<String>,

    #[arg(long)]
    pub captcha: Option<String>,
}

#[derive(Args, Debug)]
pub struct ApplyCommand {
    #[command(subcommand)]
    pub command: ApplySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ApplySubcommand {
    Individual {
        #[arg(long)]
        thesis_id: i64,
        #[arg(long)]
        achievement_type: String,
    },
    Group {
        #[arg(long)]
        thesis_id: i64,
        #[arg(long)]
        achievement_type: String,
        #[arg(long)]
        reason: String,
        /// Team member as STUDENT_ID:RESPONSIBILITY, repeatable
        #[arg(long = "member", value_parser = parse_member, required = true)]
        members: Vec<TeamMemberParam>,
    },
}

fn parse_member(raw: &str) -> Result<TeamMemberParam, String> {
    let (id, responsibility) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected STUDENT_ID:RESPONSIBILITY, got '{}'", raw))?;
    let student_id = id
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid student id '{}'", id))?;
    let responsibility = responsibility.trim();
    if responsibility.is_empty() {
        return Err(format!("missing responsibility for student {}", student_id));
    }
    Ok(TeamMemberParam {
        student_id,
        responsibility: responsibility.to_string(),
    })
}

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
/// When `log_dir` is given, logs are also written to a daily file there.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env().context("Invalid environment configuration")?;

    if let Some(ref url) = cli.auth_base_url {
        config.auth_base_url = Some(url.clone());
    }
    if let Some(ref url) = cli.api_base_url {
        config.api_base_url = Some(url.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let log_dir = config
        .cache_dir()
        .ok()
        .map(|dir| dir.join("logs"))
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());
    let _log_guard = init_tracing(log_dir.as_deref());
    info!("topicsel starting");

    // Partitions are fixed from here on
    let session = auth::open_session(&config)?;
    let api = ApiClient::from_config(&config, session.clone())?;
    let router = Router::new(session.clone());

    let app = App::new(config, cli.config, api, router, session, cli.json);
    app.run(cli.command).await
}
