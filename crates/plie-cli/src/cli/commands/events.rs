//! Home screen and event listing.

use anyhow::{Context, Result};
use comfy_table::{ContentArrangement, Table};
use plie_app::{App, AuthStatus};
use plie_core::events::Event;

const LOGIN_HINT: &str = "Not logged in. Run `plie login --email <EMAIL>` to log in.";

/// Startup screen: restore the session and show whatever was loaded.
pub async fn home(app: &App) -> Result<()> {
    if app.bootstrap().await != AuthStatus::Authenticated {
        println!("{LOGIN_HINT}");
        return Ok(());
    }

    let state = app.store().snapshot();
    if let Some(name) = state.auth.user.as_ref().and_then(|u| u.name()) {
        println!("Hello {name}!");
    }
    if let Some(err) = &state.events.error {
        anyhow::bail!("Failed to load events: {err}");
    }
    print_events(&state.events.items);
    Ok(())
}

/// Fetches the listing and prints it.
pub async fn list(app: &App, json: bool) -> Result<()> {
    if app.auth().check_session().await != AuthStatus::Authenticated {
        anyhow::bail!(LOGIN_HINT);
    }

    let items = app.events().refresh().await.context("fetch events")?;

    if json {
        let out = serde_json::to_string_pretty(&items).context("serialize events")?;
        println!("{out}");
    } else {
        print_events(&items);
    }
    Ok(())
}

fn print_events(items: &[Event]) {
    if items.is_empty() {
        println!("No events found.");
        return;
    }
    println!("{}", render_table(items));
}

fn render_table(items: &[Event]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "Event", "When", "Where", "Price", "Tags"]);

    for event in items {
        table.add_row(vec![
            if event.liked { "♥" } else { "" }.to_string(),
            event.display_title().to_string(),
            event.display_date().unwrap_or("-").to_string(),
            event.location.clone().unwrap_or_else(|| "-".to_string()),
            event.display_price().unwrap_or("-").to_string(),
            event.tags.join(", "),
        ]);
    }

    table.to_string()
}
