// src/cli/check.rs — `worklog check`: validate config and credentials

use std::sync::Arc;

use crate::auth::{GoogleOAuth, TokenSource};
use crate::infra::config::Config;
use crate::integrations::credentials::IntegrationCredentials;
use crate::integrations::discord::DiscordAdapter;
use crate::integrations::google_calendar::GoogleCalendarAdapter;
use crate::integrations::google_sheets::{GoogleSheetsAdapter, LOG_COLUMNS};

/// Run every check and report each result; fails if any check failed.
pub async fn run_check(config: &Config) -> anyhow::Result<()> {
    let creds = IntegrationCredentials::load().unwrap_or_default();
    let mut failures = 0usize;

    println!("worklog check");
    println!("=============");
    println!();

    match config.session_settings() {
        Ok(s) => report(
            "Config",
            Ok(format!(
                "update every {}s, auto-stop {} UTC, {} channel(s)",
                s.update_interval.as_secs(),
                s.auto_stop.format("%H:%M"),
                config.discord.channels.len()
            )),
            &mut failures,
        ),
        Err(e) => report("Config", Err(e.to_string()), &mut failures),
    }

    match creds.discord.as_ref() {
        Some(d) => {
            let result = DiscordAdapter::new(d.bot_token.clone()).validate().await;
            report("Discord", result.map_err(|e| e.to_string()), &mut failures);
        }
        None => report(
            "Discord",
            Err("not connected (worklog connect discord <bot_token>)".into()),
            &mut failures,
        ),
    }

    let tokens: Option<Arc<dyn TokenSource>> = match creds.google.as_ref().map(GoogleOAuth::new) {
        Some(Ok(oauth)) => Some(Arc::new(oauth) as Arc<dyn TokenSource>),
        Some(Err(e)) => {
            report("Google", Err(e.to_string()), &mut failures);
            None
        }
        None => {
            report(
                "Google",
                Err("not connected (worklog connect google <client_id:client_secret:refresh_token>)"
                    .into()),
                &mut failures,
            );
            None
        }
    };

    if let Some(tokens) = tokens {
        let calendar = GoogleCalendarAdapter::new(tokens.clone(), config.calendar.calendar_id.clone());
        report(
            "Calendar",
            calendar.validate().await.map_err(|e| e.to_string()),
            &mut failures,
        );

        match config.spreadsheet_id() {
            Ok(id) => {
                let sheets = GoogleSheetsAdapter::new(tokens, id, config.sheet.sheet_name.clone());
                report(
                    "Sheets",
                    sheets
                        .validate()
                        .await
                        .map(|msg| format!("{msg} (columns: {})", LOG_COLUMNS.join(", ")))
                        .map_err(|e| e.to_string()),
                    &mut failures,
                );
            }
            Err(e) => report("Sheets", Err(e.to_string()), &mut failures),
        }
    }

    println!();
    if failures > 0 {
        anyhow::bail!("{failures} check(s) failed");
    }
    println!("All checks passed.");
    Ok(())
}

fn report(name: &str, result: Result<String, String>, failures: &mut usize) {
    match result {
        Ok(msg) => println!("  [+] {name}: {msg}"),
        Err(e) => {
            *failures += 1;
            println!("  [-] {name}: {e}");
        }
    }
}
