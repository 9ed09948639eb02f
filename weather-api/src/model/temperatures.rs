use super::{CITIES, City, ObjectId, TEMPERATURES};
use crate::errors::{ModelError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store::{Collection, DocumentStore, Filter, ID_FIELD};

/// A temperature reading of a city. Immutable once recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub city_id: ObjectId,
    pub min: i64,
    pub max: i64,
    /// Capture time
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewTemperature {
    pub city_id: ObjectId,
    pub min: i64,
    pub max: i64,
}

#[derive(Clone)]
pub struct TemperatureManager {
    cities: Collection<City>,
    temperatures: Collection<Temperature>,
}

impl TemperatureManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        TemperatureManager {
            cities: Collection::new(store.clone(), CITIES),
            temperatures: Collection::new(store, TEMPERATURES),
        }
    }

    pub async fn create(&self, nt: NewTemperature) -> Result<Temperature> {
        if nt.min > nt.max {
            return Err(ModelError::InvalidInput(format!(
                "min ({}) is greater than max ({})",
                nt.min, nt.max
            )));
        }

        self.cities
            .find_one(&Filter::new().eq(ID_FIELD, nt.city_id))
            .await?;

        let temperature = Temperature {
            id: ObjectId::new(),
            city_id: nt.city_id,
            min: nt.min,
            max: nt.max,
            timestamp: Utc::now(),
        };
        self.temperatures.insert(&temperature).await?;

        Ok(temperature)
    }

    /// All readings of a city, oldest first.
    pub async fn list(&self, city_id: ObjectId) -> Result<Vec<Temperature>> {
        Ok(self
            .temperatures
            .find_many(&Filter::new().eq("city_id", city_id))
            .await?)
    }
}
