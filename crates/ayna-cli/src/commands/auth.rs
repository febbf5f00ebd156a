use std::future::Future;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use ayna_core::{
    Authenticator, Credential, CredentialState, FileTokenStore, PasswordVault, TokenCache,
    TokenStore,
};
use chrono::Local;
use tracing::{error, info, warn};

use super::{load_config, preview, token_cache};

/// Characters of each token shown on screen
const TOKEN_PREVIEW_CHARS: usize = 40;

fn print_credential(credential: &Credential) {
    println!("Access token:  {}", preview(&credential.access_token, TOKEN_PREVIEW_CHARS));
    println!("Refresh token: {}", preview(&credential.refresh_token, TOKEN_PREVIEW_CHARS));
    println!(
        "Expires at:    {}",
        credential.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub async fn login(config_path: Option<&Path>, user: Option<String>) -> Result<()> {
    let mut config = load_config(config_path)?;

    let login = match user.or_else(|| config.login.clone()) {
        Some(login) => login,
        None => prompt_line("Login: ")?,
    };
    if login.is_empty() {
        anyhow::bail!("A login is required");
    }
    let password = rpassword::prompt_password(format!("Password for {}: ", login))
        .context("Failed to read password")?;

    config.login = Some(login.clone());
    config.save(config_path)?;
    if let Err(e) = PasswordVault::for_login(&login).store(&password) {
        warn!(error = %e, "Could not store password in keychain; set AYNA_PASSWORD instead");
    }

    let (mut tokens, _) = token_cache(&config, Some(password))?;
    let credential = tokens.login().await?;
    println!("Logged in as {}", login);
    print_credential(&credential);
    Ok(())
}

pub fn logout(config_path: Option<&Path>, forget_password: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let mut store = FileTokenStore::new(config.token_path()?);
    store.clear()?;
    println!("Token removed from {}", store.path().display());

    if forget_password {
        let login = config.account_login()?;
        PasswordVault::for_login(login).forget()?;
        println!("Password for {} removed from keychain", login);
    }
    Ok(())
}

pub async fn token(config_path: Option<&Path>, force_refresh: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let (mut tokens, _) = token_cache(&config, None)?;

    let credential = if force_refresh {
        tokens.force_refresh().await?
    } else {
        tokens.get_valid_credential().await?
    };
    print_credential(&credential);
    Ok(())
}

pub fn status(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let (tokens, _) = token_cache(&config, Some(String::new()))?;

    let (state, credential) = tokens.status()?;
    println!("Token file:    {}", config.token_path()?.display());
    println!("State:         {}", state);
    if let Some(credential) = credential {
        if state != CredentialState::Expired {
            let remaining = credential.remaining(chrono::Utc::now());
            println!("Remaining:     {}m", remaining.num_minutes().max(0));
        }
        print_credential(&credential);
    }
    Ok(())
}

pub async fn watch(config_path: Option<&Path>, interval_secs: u64) -> Result<()> {
    let config = load_config(config_path)?;
    let (mut tokens, _) = token_cache(&config, None)?;
    let interval = Duration::from_secs(interval_secs);

    info!(interval_secs, "Starting token watch. Ctrl+C to stop.");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl+C");
        }
    };
    keep_fresh(&mut tokens, interval, shutdown).await;
    Ok(())
}

/// Check the token every `interval` until `shutdown` resolves, including
/// while a check is in flight. Returns the number of completed checks.
async fn keep_fresh<A, S>(
    tokens: &mut TokenCache<A, S>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> usize
where
    A: Authenticator,
    S: TokenStore,
{
    tokio::pin!(shutdown);
    let mut checks = 0;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = tokens.get_valid_credential() => {
                checks += 1;
                match result {
                    Ok(credential) => info!(
                        expires_at = %credential.expires_at.with_timezone(&Local).to_rfc3339(),
                        "Token valid"
                    ),
                    Err(e) => error!(error = %e, "No token obtained"),
                }
            }
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    info!(checks, "Stopped by user");
    checks
}
