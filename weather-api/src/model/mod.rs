//! Entities and their managers. Every manager owns typed collections over a
//! shared [`DocumentStore`](store::DocumentStore) handle passed in at
//! construction.

pub mod cities;
pub mod forecasts;
pub mod temperatures;
pub mod webhooks;

pub use cities::{City, CityManager, CityUpdate, NewCity};
pub use forecasts::{Forecast, ForecastManager};
pub use temperatures::{NewTemperature, Temperature, TemperatureManager};
pub use webhooks::{NewWebhook, Webhook, WebhookManager};

use crate::errors::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub(crate) const CITIES: &str = "cities";
pub(crate) const TEMPERATURES: &str = "temperatures";
pub(crate) const WEBHOOKS: &str = "webhooks";

/// Opaque, globally unique identifier. Used both for entity ids and for
/// version tokens; a fresh one is minted on every creation or mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new() -> Self {
        ObjectId(Uuid::now_v7())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ObjectId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(ObjectId)
            .map_err(|_| ModelError::InvalidInput(format!("malformed id: {s:?}")))
    }
}

// Filters compare against the serialized form.
impl From<ObjectId> for serde_json::Value {
    fn from(id: ObjectId) -> Self {
        serde_json::Value::String(id.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);

        let parsed: ObjectId = a.to_string().parse().unwrap();
        assert_eq!(parsed, a);

        // Serializes to the same string a filter compares against
        assert_eq!(
            serde_json::to_value(a).unwrap(),
            serde_json::Value::from(a)
        );

        assert!(matches!(
            "5d8a3c1f9e".parse::<ObjectId>(),
            Err(ModelError::InvalidInput(_))
        ));
    }
}
