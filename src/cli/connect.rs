// src/cli/connect.rs — Credential storage + validation for Discord and Google

use crate::auth::GOOGLE_SCOPES;
use crate::integrations::credentials::{self, IntegrationCredentials};

/// Handle the `worklog connect <app> [token]` command.
pub async fn run_connect(app: &str, token: Option<&str>) -> anyhow::Result<()> {
    match (app, token) {
        ("status" | "list", _) => show_connection_status(),
        ("discord" | "google", Some(token)) => store_token(app, token.trim()),
        ("discord", None) => {
            print_usage("discord", "DISCORD_BOT_TOKEN", "<bot-token>");
            Ok(())
        }
        ("google", None) => {
            print_usage(
                "google",
                "GOOGLE_REFRESH_TOKEN",
                "<client_id>:<client_secret>:<refresh_token>",
            );
            println!();
            println!("  The refresh token needs these scopes:");
            for scope in GOOGLE_SCOPES {
                println!("    {scope}");
            }
            Ok(())
        }
        _ => {
            eprintln!("Unknown integration: {app}");
            eprintln!();
            eprintln!("Available integrations:");
            eprintln!("  discord   Discord bot (Bot API)");
            eprintln!("  google    Google Calendar + Sheets (OAuth2 refresh token)");
            eprintln!();
            eprintln!("  status    Show which integrations are configured");
            Err(anyhow::anyhow!("Unknown integration: {app}"))
        }
    }
}

fn store_token(app: &str, token: &str) -> anyhow::Result<()> {
    if let Err(e) = credentials::validate_token_format(app, token) {
        // Formats change; warn but still store.
        eprintln!("  Warning: {e}");
    }

    let mut creds = IntegrationCredentials::load().unwrap_or_default();
    creds.set_token(app, token)?;
    creds.save()?;

    tracing::info!("Stored {} credentials", app);
    println!(
        "  Saved {app} credentials to {}",
        credentials::credentials_path().display()
    );
    println!("  Run `worklog check` to validate them.");
    Ok(())
}

fn print_usage(app: &str, env_var: &str, token_hint: &str) {
    println!("Connect {app}:");
    println!();
    println!("  Option 1: Store the token:");
    println!("    worklog connect {app} {token_hint}");
    println!();
    println!("  Option 2: Set the environment variable:");
    println!("    export {env_var}=...");
}

fn show_connection_status() -> anyhow::Result<()> {
    let creds = IntegrationCredentials::load().unwrap_or_default();

    println!("Integration Status");
    println!("==================");
    println!();

    for (id, name) in [("discord", "Discord"), ("google", "Google")] {
        let has_creds = creds.has_credentials(id);
        let status = if has_creds { "configured" } else { "not configured" };
        let marker = if has_creds { "+" } else { "-" };
        println!("  [{marker}] {name}: {status}");
    }

    Ok(())
}
