use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use client::{Route, SessionManager, guard};
use rpassword::prompt_password;
use shared::config::ClientConfig;
use tracing::{debug, info};

/// Exchange credentials for tokens and persist them.
pub async fn login(
    session: &SessionManager,
    config: &ClientConfig,
    email: Option<String>,
    password_stdin: bool,
) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = if password_stdin {
        debug!("reading password from stdin");
        read_line()?
    } else {
        prompt_password("Password: ")?
    };
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    debug!(%email, api_url = session.base_url(), "logging in");
    session.login(&email, &password).await.context("login failed")?;
    info!(session_path = %config.session_path.display(), "session stored");

    println!("Logged in as {email}");
    println!("session stored at {}", config.session_path.display());
    Ok(())
}

/// Drop the stored session. Works offline and when already logged out.
pub fn logout(session: &SessionManager, config: &ClientConfig) {
    let was_authenticated = session.is_authenticated();
    session.logout();
    info!(was_authenticated, "session cleared");
    if was_authenticated {
        println!("Logged out; removed tokens from {}", config.session_path.display());
    } else {
        println!("No active session found at {}", config.session_path.display());
    }
}

pub fn status(session: &SessionManager, config: &ClientConfig) {
    let snapshot = session.snapshot();
    if snapshot.is_authenticated {
        println!("Logged in to {}", session.base_url());
    } else {
        println!("Not logged in to {}", session.base_url());
    }
    println!(
        "refresh token: {}",
        if session.refresh_token().is_some() {
            "present"
        } else {
            "absent"
        }
    );
    println!(
        "landing view: {}",
        guard(Route::Dashboard, snapshot.is_authenticated).target()
    );
    println!("session file: {}", config.session_path.display());
}

/// Create an account. Does not sign in.
pub async fn register(session: &SessionManager, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = prompt_password("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }
    let confirm = prompt_password("Confirm password: ")?;
    if confirm != password {
        bail!("passwords do not match");
    }

    debug!(%email, api_url = session.base_url(), "registering account");
    let user = session
        .register(&email, &password)
        .await
        .context("registration failed")?;
    println!("Registered {} (id {})", user.email, user.id);
    println!("Run `taskflow login --email {}` to sign in.", user.email);
    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let input = read_line()?;
    if input.is_empty() {
        bail!("input must not be empty");
    }
    Ok(input)
}

/// One line of stdin, trimmed. Empty input is left for the caller to reject.
fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("failed to read from stdin")?;
    Ok(input.trim().to_string())
}
