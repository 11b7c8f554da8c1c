//! authctx - command-line front end for the authentication context.
//!
//! Signs in against the configured auth API, keeps the session token pair
//! between runs and restores the session on every start.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use authcontext_core::{ApiClient, AuthError, Config, Credentials, RouteHistory, SessionStore, User};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the default sign-in email
const EMAIL_ENV: &str = "AUTHCONTEXT_EMAIL";

/// Environment variable holding the sign-in password
const PASSWORD_ENV: &str = "AUTHCONTEXT_PASSWORD";

const USAGE: &str = "\
Usage: authctx <command>

Commands:
  login [email]     Sign in and store the session
  whoami [--json]   Restore the stored session and show the user
  logout            Forget the stored session";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Everything a command needs, wired from the config
struct App {
    config: Config,
    api: Arc<ApiClient>,
    history: Arc<RouteHistory>,
    store: SessionStore,
}

impl App {
    fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let api = Arc::new(ApiClient::new(&config.api_base_url()).context("Failed to build HTTP client")?);
        let tokens = config.token_store().context("Failed to open token storage")?;
        let history = Arc::new(RouteHistory::new());
        let store = SessionStore::new(api.clone(), tokens, history.clone())
            .with_options(config.session_options());

        Ok(Self {
            config,
            api,
            history,
            store,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str);

    match command {
        Some("login") => login(args.get(1).cloned()).await,
        Some("whoami") => whoami(args.iter().any(|a| a == "--json")).await,
        Some("logout") => logout(),
        _ => {
            eprintln!("{}", USAGE);
            Ok(())
        }
    }
}

async fn login(email: Option<String>) -> Result<()> {
    let mut app = App::new()?;
    info!(api = app.api.base_url(), "Signing in");

    let default_email = std::env::var(EMAIL_ENV)
        .ok()
        .or_else(|| app.config.last_email.clone());

    let email = match email {
        Some(email) => email,
        None => prompt_email(default_email.as_deref())?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ")?,
    };

    if email.is_empty() || password.is_empty() {
        anyhow::bail!("Email and password required");
    }

    let user = match app.store.sign_in(Credentials::new(email.clone(), password)).await {
        Ok(user) => user,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    app.config.last_email = Some(email);
    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    print_user(&user);
    if let Some(route) = app.history.current() {
        println!("Continue at {}", route);
    }
    Ok(())
}

async fn whoami(json: bool) -> Result<()> {
    let app = App::new()?;

    match app.store.restore().await {
        Ok(state) => match state.user() {
            Some(user) if json => println!("{}", serde_json::to_string_pretty(user)?),
            Some(user) => print_user(user),
            None => println!("Not signed in. Use 'authctx login' first."),
        },
        Err(AuthError::SessionExpired) => {
            println!("{}", AuthError::SessionExpired.user_message());
        }
        Err(e) => return Err(e).context("Failed to restore session"),
    }
    Ok(())
}

fn logout() -> Result<()> {
    let app = App::new()?;
    app.store.sign_out().context("Failed to clear stored session")?;
    println!("Signed out");
    Ok(())
}

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match default {
        Some(last) if input.is_empty() => last.to_string(),
        _ => input.to_string(),
    })
}

fn print_user(user: &User) {
    println!("Signed in as {}", user.email);
    println!("  roles:       {}", join(&user.roles));
    println!("  permissions: {}", join(&user.permissions));
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let joined: Vec<&str> = items.into_iter().map(String::as_str).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_join_sorted_items() {
        let items: BTreeSet<String> = ["users.list", "metrics.list"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join(&items), "metrics.list, users.list");
    }

    #[test]
    fn test_join_empty() {
        let items: BTreeSet<String> = BTreeSet::new();
        assert_eq!(join(&items), "-");
    }
}
