pub mod config;
pub mod error;
pub mod notify;
pub mod output;

use std::io::Read;

use flate2::read::MultiGzDecoder;
use gtfs_realtime::{FeedMessage, TranslatedString};
use prost::Message;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde::Serialize;

pub use config::{AlertsConfig, OutputMode, SmtpConfig};
pub use error::{AlertsError, ConfigError, NotifyError};
pub use notify::{Notification, Notifier, SmtpNotifier};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// An alert matched against one of the watched routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteAlert {
    pub entity_id: String,
    pub route_id: String,
    pub header_text: String,
    pub description: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// The part of a [`RouteAlert`] that gets published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub route_id: String,
    pub description: String,
}

impl RouteAlert {
    pub fn summary(&self) -> AlertSummary {
        AlertSummary {
            route_id: self.route_id.clone(),
            description: self.description.clone(),
        }
    }
}

pub async fn fetch_feed_bytes(client: &Client, url: &str) -> Result<Vec<u8>, AlertsError> {
    let resp = client
        .get(url)
        .header(USER_AGENT, config::USER_AGENT)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AlertsError::HttpStatus { status, body });
    }

    let bytes = resp.bytes().await?;
    tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);
    maybe_decompress(bytes.to_vec())
}

/// Gunzip `bytes` when they start with the gzip magic number. Every gzip
/// member in the stream is decoded.
pub fn maybe_decompress(bytes: Vec<u8>) -> Result<Vec<u8>, AlertsError> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }

    let mut out = Vec::new();
    MultiGzDecoder::new(bytes.as_slice())
        .read_to_end(&mut out)
        .map_err(AlertsError::Decompress)?;
    tracing::debug!("Decompressed gzip payload: {} -> {} bytes", bytes.len(), out.len());
    Ok(out)
}

pub fn decode_feed(bytes: &[u8]) -> Result<FeedMessage, AlertsError> {
    let feed = FeedMessage::decode(bytes)?;
    let alert_count = feed.entity.iter().filter(|e| e.alert.is_some()).count();
    tracing::debug!(
        "Decoded feed with {} entities ({} alerts)",
        feed.entity.len(),
        alert_count
    );
    Ok(feed)
}

fn first_translation(text: Option<&TranslatedString>) -> String {
    text.and_then(|t| t.translation.first())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

/// Keep alerts that inform any of `route_ids`, one record per feed entity,
/// in feed order.
pub fn filter_route_alerts(feed: &FeedMessage, route_ids: &[String]) -> Vec<RouteAlert> {
    let mut filtered = Vec::new();

    for entity in &feed.entity {
        let Some(alert) = &entity.alert else {
            continue;
        };

        let matched = alert.informed_entity.iter().find_map(|ie| {
            ie.route_id
                .as_ref()
                .filter(|route_id| route_ids.contains(*route_id))
        });

        if let Some(route_id) = matched {
            let period = alert.active_period.first();
            filtered.push(RouteAlert {
                entity_id: entity.id.clone(),
                route_id: route_id.clone(),
                header_text: first_translation(alert.header_text.as_ref()),
                description: first_translation(alert.description_text.as_ref()),
                start: period.and_then(|p| p.start),
                end: period.and_then(|p| p.end),
            });
        }
    }

    tracing::debug!("{} alerts match routes {}", filtered.len(), route_ids.join(", "));
    filtered
}

/// Write the artifacts for `alerts` and run the configured sink.
///
/// In email mode an empty result triggers one notification through
/// `notifier`; a missing notifier or a failed delivery is logged and does
/// not fail the run.
pub fn publish<N: Notifier>(
    config: &AlertsConfig,
    alerts: &[RouteAlert],
    notifier: Option<&N>,
) -> Result<(), AlertsError> {
    let summaries: Vec<AlertSummary> = alerts.iter().map(RouteAlert::summary).collect();

    match config.mode {
        OutputMode::Html => {
            let json = output::write_json(&config.json_path(), &summaries)?;
            let html = output::write_html(&config.html_path(), &summaries)?;
            println!("{json}");
            println!("{html}");
        }
        OutputMode::Email => {
            if summaries.is_empty() {
                notify_empty(config, notifier);
            }
            let json = output::write_json(&config.json_path(), &summaries)?;
            println!("{json}");
        }
    }

    Ok(())
}

fn notify_empty<N: Notifier>(config: &AlertsConfig, notifier: Option<&N>) {
    let Some(notifier) = notifier else {
        tracing::warn!(
            "SMTP configuration unavailable ({}); skipping notification",
            smtp_unavailable_reason(config)
        );
        return;
    };

    let notification =
        Notification::no_alerts(&config.route_ids, &config.feed_url, chrono::Utc::now());
    if let Err(e) = notifier.send(&notification) {
        tracing::error!("Failed to send notification: {e}");
    }
}

fn smtp_unavailable_reason(config: &AlertsConfig) -> String {
    match &config.smtp {
        Ok(_) => "no notifier".to_string(),
        Err(e) => e.to_string(),
    }
}

/// Fetch, decode, filter and publish once.
///
/// Fatal errors return before any output file is touched.
pub async fn run(config: AlertsConfig) -> Result<Vec<RouteAlert>, AlertsError> {
    run_with_client(&Client::new(), config).await
}

pub async fn run_with_client(
    client: &Client,
    config: AlertsConfig,
) -> Result<Vec<RouteAlert>, AlertsError> {
    let bytes = fetch_feed_bytes(client, &config.feed_url).await?;
    let feed = decode_feed(&bytes)?;
    let alerts = filter_route_alerts(&feed, &config.route_ids);

    // SMTP delivery blocks, keep it off the async workers.
    let alerts = tokio::task::spawn_blocking(move || {
        let notifier = config.smtp.clone().ok().map(SmtpNotifier::new);
        publish(&config, &alerts, notifier.as_ref()).map(|()| alerts)
    })
    .await??;

    Ok(alerts)
}
