use crate::config::NotifierConfig;
use crate::metrics_defs::{
    WEBHOOK_DELIVERY_DURATION, WEBHOOK_DELIVERY_FAILED, WEBHOOK_DELIVERY_SUCCEEDED,
};
use crate::model::{ObjectId, Temperature, Webhook};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use shared::{counter, histogram};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, JoinSet};

/// Payload posted to every webhook of a city when a reading is recorded
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemperatureEvent {
    pub id: ObjectId,
    pub city_id: ObjectId,
    pub min: i64,
    pub max: i64,
    pub timestamp: DateTime<Utc>,
}

impl From<&Temperature> for TemperatureEvent {
    fn from(temperature: &Temperature) -> Self {
        TemperatureEvent {
            id: temperature.id,
            city_id: temperature.city_id,
            min: temperature.min,
            max: temperature.max,
            timestamp: temperature.timestamp,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("could not serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("callback answered {0}")]
    Status(StatusCode),
}

impl DeliveryError {
    fn reason(&self) -> &'static str {
        match self {
            DeliveryError::Serialization(_) => "serialization",
            DeliveryError::Transport(_) => "transport",
            DeliveryError::Timeout(_) => "timeout",
            DeliveryError::Status(_) => "status",
        }
    }
}

/// Outcome of one fan-out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Posts temperature events to webhook callback URLs.
///
/// Deliveries are attempted exactly once. Failures are logged and counted but
/// never reported back to whoever triggered the notification.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    timeout: Duration,
}

impl Notifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("weather-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Notifier {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Overrides the per-delivery timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Spawns the fan-out as a detached task and returns immediately.
    ///
    /// Each webhook is delivered on its own task, so a slow, failing or
    /// panicking delivery does not hold up the others. Dropping the returned
    /// handle does not cancel anything; deliveries still in flight at
    /// shutdown are abandoned.
    pub fn notify(&self, webhooks: Vec<Webhook>, event: TemperatureEvent) -> JoinHandle<NotifyReport> {
        let client = self.client.clone();
        let timeout = self.timeout;
        let event = Arc::new(event);

        tokio::spawn(fan_out(webhooks, move |webhook| {
            let client = client.clone();
            let event = event.clone();
            let url = webhook.callback_url.clone();
            async move { deliver(&client, &url, &event, timeout).await }
        }))
    }
}

async fn fan_out<F, Fut>(webhooks: Vec<Webhook>, deliver: F) -> NotifyReport
where
    F: Fn(&Webhook) -> Fut + Send,
    Fut: Future<Output = Result<(), DeliveryError>> + Send + 'static,
{
    let mut join_set = JoinSet::new();

    for webhook in webhooks {
        let delivery = deliver(&webhook);
        join_set.spawn(async move {
            let start = Instant::now();
            let result = delivery.await;
            histogram!(WEBHOOK_DELIVERY_DURATION).record(start.elapsed().as_secs_f64());
            (webhook, result)
        });
    }

    let mut report = NotifyReport::default();

    while let Some(join_result) = join_set.join_next().await {
        match join_result {
            Ok((webhook, Ok(()))) => {
                report.delivered += 1;
                counter!(WEBHOOK_DELIVERY_SUCCEEDED).increment(1);
                tracing::debug!(
                    webhook_id = %webhook.id,
                    callback_url = %webhook.callback_url,
                    "Delivered webhook"
                );
            }
            Ok((webhook, Err(e))) => {
                report.failed += 1;
                counter!(WEBHOOK_DELIVERY_FAILED, "reason" => e.reason()).increment(1);
                tracing::warn!(
                    webhook_id = %webhook.id,
                    callback_url = %webhook.callback_url,
                    error = %e,
                    "Webhook delivery failed"
                );
            }
            Err(e) => {
                report.failed += 1;
                counter!(WEBHOOK_DELIVERY_FAILED, "reason" => "panic").increment(1);
                tracing::error!("Delivery task panicked: {}", e);
            }
        }
    }

    tracing::debug!(
        delivered = report.delivered,
        failed = report.failed,
        "Fan-out finished"
    );
    report
}

async fn deliver(
    client: &reqwest::Client,
    url: &str,
    event: &TemperatureEvent,
    timeout: Duration,
) -> Result<(), DeliveryError> {
    let body = serde_json::to_vec(event)?;

    let response = tokio::time::timeout(
        timeout,
        client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send(),
    )
    .await
    .map_err(|_| DeliveryError::Timeout(timeout))??;

    let status = response.status();
    if !status.is_success() {
        return Err(DeliveryError::Status(status));
    }

    Ok(())
}
