// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use chipdesk_api::{Gateway, HttpGateway};
use chipdesk_app::{NotificationCenter, SearchDisplay, slot};
use chipdesk_panel::{AdminPanel, SearchFlow};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

/// Build the gateway for one session and resolve its forgery token.
pub fn connect(config: &Config) -> Result<HttpGateway> {
    let mut gateway = HttpGateway::new(config.base_url(), config.timeout()?)
        .context("invalid [server] config; fix base_url/timeout values")?;
    match config.token_source() {
        Some(source) => gateway
            .load_token(&source)
            .with_context(|| format!("load forgery token from {}", gateway.base_url()))?,
        None => tracing::warn!(
            "neither server.csrf_token nor server.csrf_page is set; requests carry an empty token"
        ),
    }
    Ok(gateway)
}

pub fn check(gateway: &HttpGateway) -> Result<String> {
    let health = gateway.health()?;
    let mut line = format!("{} is {}", gateway.base_url(), health.status);
    if let Some(message) = health.message.filter(|message| !message.is_empty()) {
        line.push_str(": ");
        line.push_str(&message);
    }
    Ok(line)
}

/// Run one search on the calling thread and render the hit as text.
pub fn search_once(gateway: &dyn Gateway, model: &str, currency: &str) -> Result<String> {
    let mut flow = SearchFlow::default();
    flow.input.model = model.to_owned();
    let mut notices = NotificationCenter::with_slots(slot::ALL);

    let issued = flow.run_with(gateway, &mut notices, Instant::now(), currency);
    if let Some(display) = flow.display() {
        return Ok(render_display(display));
    }
    let reason = notices
        .slot(slot::SEARCH_ERROR)
        .map(|state| state.message.clone())
        .unwrap_or_default();
    if issued {
        bail!("search for {model:?} failed: {reason}");
    }
    bail!("{reason}; pass a model after --search")
}

pub fn run_interactive(gateway: HttpGateway, currency: &str) -> Result<()> {
    let mut panel = AdminPanel::new(Arc::new(gateway), currency);
    chipdesk_tui::run_app(&mut panel)
}

fn render_display(display: &SearchDisplay) -> String {
    format!(
        "model:       {}\ndescription: {}\nstock:       {} ({})\nprice:       {}",
        display.model,
        display.description,
        display.stock_text(),
        display.tier.label(),
        display.price_text,
    )
}
