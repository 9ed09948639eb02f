use super::{CITIES, City, ObjectId, WEBHOOKS};
use crate::errors::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store::{Collection, DocumentStore, Filter, ID_FIELD};
use url::Url;

/// Subscription to the temperature readings of a city
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub city_id: ObjectId,
    pub callback_url: String,
}

#[derive(Clone, Debug)]
pub struct NewWebhook {
    pub city_id: ObjectId,
    pub callback_url: String,
}

// Normalizing first makes "http://a.com" and "http://a.com/" the same
// subscription.
fn normalize_callback_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| ModelError::InvalidInput(format!("invalid callback url {raw:?}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url.into()),
        scheme => Err(ModelError::InvalidInput(format!(
            "unsupported callback url scheme: {scheme}"
        ))),
    }
}

#[derive(Clone)]
pub struct WebhookManager {
    cities: Collection<City>,
    webhooks: Collection<Webhook>,
}

impl WebhookManager {
    /// Ensures the unique index on `(city_id, callback_url)` exists.
    pub async fn new(store: Arc<dyn DocumentStore>) -> Result<Self> {
        let webhooks = Collection::new(store.clone(), WEBHOOKS);
        webhooks
            .ensure_unique_index(&["city_id", "callback_url"])
            .await
            .map_err(ModelError::Store)?;

        Ok(WebhookManager {
            cities: Collection::new(store, CITIES),
            webhooks,
        })
    }

    pub async fn create(&self, nw: NewWebhook) -> Result<Webhook> {
        let callback_url = normalize_callback_url(&nw.callback_url)?;

        self.cities
            .find_one(&Filter::new().eq(ID_FIELD, nw.city_id))
            .await?;

        let webhook = Webhook {
            id: ObjectId::new(),
            city_id: nw.city_id,
            callback_url,
        };
        self.webhooks.insert(&webhook).await?;
        tracing::debug!(webhook_id = %webhook.id, city_id = %webhook.city_id, "Created webhook");

        Ok(webhook)
    }

    /// All webhooks of a city. A city without subscriptions is `NotFound`.
    pub async fn get(&self, city_id: ObjectId) -> Result<Vec<Webhook>> {
        let webhooks = self
            .webhooks
            .find_many(&Filter::new().eq("city_id", city_id))
            .await?;

        if webhooks.is_empty() {
            return Err(ModelError::NotFound);
        }

        Ok(webhooks)
    }

    pub async fn delete(&self, id: ObjectId) -> Result<Webhook> {
        let by_id = Filter::new().eq(ID_FIELD, id);
        let webhook = self.webhooks.find_one(&by_id).await?;

        if self.webhooks.delete_one(&by_id).await? == 0 {
            return Err(ModelError::NotFound);
        }

        Ok(webhook)
    }
}
