use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use session_controller::config::ConfigError;
use session_controller::{
    AuthConfig, AuthError, Credential, HttpAuthService, MemoryTokenStore, SessionController, SessionOptions, SessionPhase,
    SessionState, StaleResolution, TokenStore,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("auth error [{code}]: {0}", code = .0.error_code())]
    Auth(#[from] AuthError),
}

#[derive(Parser, Debug)]
#[command(name = "session-cli", about = "Drive a session controller against an auth backend")]
struct Cli {
    /// Overrides `AUTH_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Existing bearer token to resolve before running the command.
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Ignore identity resolutions superseded by a newer one.
    #[arg(long)]
    discard_stale: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and print the current identity.
    Status,
    /// Sign in and print the resolved identity.
    Login { username: String, password: String },
    /// Register an account (does not sign in).
    Register { username: String, password: String },
    /// Sign in, then sign out again.
    Cycle { username: String, password: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "session-cli failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = AuthConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url)?;
    }

    let tokens: Arc<dyn TokenStore> = match cli.token {
        Some(token) => Arc::new(MemoryTokenStore::seeded(Credential::new(token))),
        None => Arc::new(MemoryTokenStore::new()),
    };
    let service = HttpAuthService::new(&config, tokens)?;

    let stale_resolution = if cli.discard_stale { StaleResolution::Discard } else { StaleResolution::LastWriteWins };
    let controller = SessionController::with_options(Arc::new(service), SessionOptions { stale_resolution });
    let _sub = controller.subscribe(|state| tracing::debug!(state = %describe(state), "session state"));

    let initial = controller.settled().await;
    tracing::info!(base_url = %config.base_url, state = %describe(&initial), "session resolved");

    match cli.command {
        Command::Status => {}
        Command::Login { username, password } => {
            controller.sign_in(&username, &password).await?;
        }
        Command::Register { username, password } => {
            controller.sign_up(&username, &password).await?;
            println!("registered {username}");
        }
        Command::Cycle { username, password } => {
            controller.sign_in(&username, &password).await?;
            println!("{}", describe(&controller.snapshot()));
            controller.sign_out();
        }
    }

    println!("{}", describe(&controller.snapshot()));
    Ok(())
}

fn describe(state: &SessionState) -> String {
    match (state.phase(), &state.identity) {
        (SessionPhase::SignedIn, Some(identity)) => {
            format!("signed in as {} (id {}, {})", identity.username, identity.id, identity.role)
        }
        (SessionPhase::Resolving, _) => "resolving".to_owned(),
        (SessionPhase::SignedIn | SessionPhase::SignedOut, _) => "signed out".to_owned(),
    }
}
