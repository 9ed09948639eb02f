//! JSON representations returned by the API.

use crate::model::{City, Forecast, ObjectId, Temperature, Webhook};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CityView {
    pub id: ObjectId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub version: ObjectId,
}

impl From<City> for CityView {
    fn from(city: City) -> Self {
        CityView {
            id: city.id,
            name: city.name,
            latitude: city.latitude,
            longitude: city.longitude,
            version: city.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TemperatureView {
    pub id: ObjectId,
    pub city_id: ObjectId,
    pub min: i64,
    pub max: i64,
    pub timestamp: DateTime<Utc>,
}

impl From<Temperature> for TemperatureView {
    fn from(t: Temperature) -> Self {
        TemperatureView {
            id: t.id,
            city_id: t.city_id,
            min: t.min,
            max: t.max,
            timestamp: t.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastView {
    pub city_id: ObjectId,
    pub min: i64,
    pub max: i64,
    pub sample: i64,
}

impl From<Forecast> for ForecastView {
    fn from(f: Forecast) -> Self {
        ForecastView {
            city_id: f.city_id,
            min: f.min,
            max: f.max,
            sample: f.sample,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookView {
    pub id: ObjectId,
    pub city_id: ObjectId,
    pub callback_url: String,
}

impl From<Webhook> for WebhookView {
    fn from(w: Webhook) -> Self {
        WebhookView {
            id: w.id,
            city_id: w.city_id,
            callback_url: w.callback_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorView<'a> {
    pub error_message: &'a str,
}
