//! Login screen and session commands.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use plie_app::{App, AuthStatus};

pub async fn login(app: &App, email: &str, password: Option<String>) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        anyhow::bail!("Email cannot be empty");
    }

    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    app.auth()
        .login(email, &password)
        .await
        .context("login")?;

    let user = app.store().with_state(|s| s.auth.user.clone());
    let who = user
        .as_ref()
        .and_then(|u| u.name().or_else(|| u.email()).map(str::to_string))
        .unwrap_or_else(|| email.to_string());
    println!("✓ Logged in as {who}");
    Ok(())
}

pub async fn logout(app: &App, force: bool) -> Result<()> {
    if force {
        app.auth().force_logout().await;
    } else {
        app.auth()
            .logout()
            .await
            .context("logout (retry with --force to reset the local session)")?;
    }
    println!("✓ Logged out");
    Ok(())
}

pub async fn status(app: &App) -> Result<()> {
    let status = app.auth().check_session().await;
    println!("Status: {}", status.label());
    if status != AuthStatus::Authenticated {
        println!("Run `plie login --email <EMAIL>` to log in.");
    }
    Ok(())
}

/// Reads a line from stdin. The input is echoed.
fn prompt_password() -> Result<String> {
    eprintln!("(input is echoed; set PLIE_PASSWORD to avoid typing it)");
    print!("Password: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("read password")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
