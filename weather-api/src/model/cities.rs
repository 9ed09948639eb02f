use super::{CITIES, ObjectId};
use crate::errors::{ModelError, Result};
use crate::metrics_defs::CITY_UPDATE_CONFLICT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::counter;
use std::sync::Arc;
use store::{Collection, DocumentStore, Filter, ID_FIELD};

/// A city in the world, e.g. Berlin
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Replaced on every successful update
    pub version: ObjectId,
}

#[derive(Clone, Debug)]
pub struct NewCity {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Desired state of a city. `version` must be the token last read by the
/// caller.
#[derive(Clone, Debug)]
pub struct CityUpdate {
    pub id: ObjectId,
    pub version: ObjectId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

fn validate(name: &str, latitude: f64, longitude: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ModelError::InvalidInput("city name cannot be empty".into()));
    }
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ModelError::InvalidInput(format!(
            "latitude out of range: {latitude}"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ModelError::InvalidInput(format!(
            "longitude out of range: {longitude}"
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CityManager {
    cities: Collection<City>,
}

impl CityManager {
    /// Ensures the unique index on `name` exists.
    pub async fn new(store: Arc<dyn DocumentStore>) -> Result<Self> {
        let cities = Collection::new(store, CITIES);
        cities
            .ensure_unique_index(&["name"])
            .await
            .map_err(ModelError::Store)?;

        Ok(CityManager { cities })
    }

    pub async fn create(&self, nc: NewCity) -> Result<City> {
        validate(&nc.name, nc.latitude, nc.longitude)?;

        let now = Utc::now();
        let city = City {
            id: ObjectId::new(),
            name: nc.name,
            latitude: nc.latitude,
            longitude: nc.longitude,
            created_at: now,
            updated_at: now,
            version: ObjectId::new(),
        };

        self.cities.insert(&city).await?;
        tracing::debug!(city_id = %city.id, name = %city.name, "Created city");

        Ok(city)
    }

    pub async fn get(&self, id: ObjectId) -> Result<City> {
        Ok(self.cities.find_one(&Filter::new().eq(ID_FIELD, id)).await?)
    }

    /// Compare-and-swap update. Both the read and the write are predicated on
    /// `(id, version)`, so a concurrent update landing in between makes the
    /// write match nothing and this call fail with `NotFound`.
    pub async fn update(&self, cu: CityUpdate) -> Result<City> {
        validate(&cu.name, cu.latitude, cu.longitude)?;

        let predicate = Filter::new()
            .eq(ID_FIELD, cu.id)
            .eq("version", cu.version);

        let mut city = self.cities.find_one(&predicate).await?;

        city.name = cu.name;
        city.latitude = cu.latitude;
        city.longitude = cu.longitude;
        city.updated_at = Utc::now();
        city.version = ObjectId::new();

        if self.cities.update_one(&predicate, &city).await? == 0 {
            counter!(CITY_UPDATE_CONFLICT).increment(1);
            tracing::debug!(city_id = %cu.id, "City changed between read and write");
            return Err(ModelError::NotFound);
        }

        Ok(city)
    }

    /// Deletes regardless of version.
    pub async fn delete(&self, id: ObjectId) -> Result<City> {
        let by_id = Filter::new().eq(ID_FIELD, id);
        let city = self.cities.find_one(&by_id).await?;

        if self.cities.delete_one(&by_id).await? == 0 {
            return Err(ModelError::NotFound);
        }

        Ok(city)
    }
}
