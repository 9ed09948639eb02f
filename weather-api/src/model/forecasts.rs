use super::{CITIES, City, ObjectId, TEMPERATURES, Temperature};
use crate::errors::Result;
use std::sync::Arc;
use store::{Collection, DocumentStore, Filter, ID_FIELD};

/// Average minimum and maximum over every reading of a city. Computed on
/// demand, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Forecast {
    pub city_id: ObjectId,
    pub min: i64,
    pub max: i64,
    pub sample: i64,
}

impl Forecast {
    /// Means use integer division, truncating toward zero. No readings yields
    /// an all-zero forecast.
    pub fn from_readings(city_id: ObjectId, readings: &[Temperature]) -> Self {
        let sample = readings.len() as i64;
        if sample == 0 {
            return Forecast {
                city_id,
                min: 0,
                max: 0,
                sample: 0,
            };
        }

        Forecast {
            city_id,
            min: mean(readings.iter().map(|t| t.min), sample),
            max: mean(readings.iter().map(|t| t.max), sample),
            sample,
        }
    }
}

// Summed as i128 so many extreme readings cannot overflow.
fn mean(values: impl Iterator<Item = i64>, count: i64) -> i64 {
    (values.map(i128::from).sum::<i128>() / i128::from(count)) as i64
}

#[derive(Clone)]
pub struct ForecastManager {
    cities: Collection<City>,
    temperatures: Collection<Temperature>,
}

impl ForecastManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        ForecastManager {
            cities: Collection::new(store.clone(), CITIES),
            temperatures: Collection::new(store, TEMPERATURES),
        }
    }

    /// Aggregates all readings ever recorded for the city; no time window is
    /// applied.
    pub async fn get(&self, city_id: ObjectId) -> Result<Forecast> {
        self.cities
            .find_one(&Filter::new().eq(ID_FIELD, city_id))
            .await?;

        let readings = self
            .temperatures
            .find_many(&Filter::new().eq("city_id", city_id))
            .await?;

        Ok(Forecast::from_readings(city_id, &readings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ModelError;
    use crate::model::testutils::{create_test_city, memory_store};
    use crate::model::{NewTemperature, TemperatureManager};
    use chrono::Utc;

    fn reading(city_id: ObjectId, min: i64, max: i64) -> Temperature {
        Temperature {
            id: ObjectId::new(),
            city_id,
            min,
            max,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_from_readings() {
        let city_id = ObjectId::new();
        let readings = [
            reading(city_id, 17, 22),
            reading(city_id, 19, 25),
            reading(city_id, 22, 28),
        ];

        assert_eq!(
            Forecast::from_readings(city_id, &readings),
            Forecast {
                city_id,
                min: 19,
                max: 25,
                sample: 3,
            }
        );
    }

    #[test]
    fn test_from_readings_truncates_toward_zero() {
        let city_id = ObjectId::new();

        let forecast =
            Forecast::from_readings(city_id, &[reading(city_id, 1, 2), reading(city_id, 2, 2)]);
        assert_eq!((forecast.min, forecast.max), (1, 2));

        let forecast = Forecast::from_readings(
            city_id,
            &[reading(city_id, -1, 0), reading(city_id, -2, 0)],
        );
        assert_eq!(forecast.min, -1);

        let forecast = Forecast::from_readings(
            city_id,
            &[reading(city_id, i64::MAX, i64::MAX), reading(city_id, i64::MAX, i64::MAX)],
        );
        assert_eq!(forecast.max, i64::MAX);
    }

    #[tokio::test]
    async fn test_get_forecast() {
        let store = memory_store();
        let city = create_test_city(&store, "Berlin").await;
        let other = create_test_city(&store, "Hamburg").await;
        let tm = TemperatureManager::new(store.clone());

        for (min, max) in [(17, 22), (19, 25), (22, 28)] {
            tm.create(NewTemperature {
                city_id: city.id,
                min,
                max,
            })
            .await
            .unwrap();
        }
        // Readings of other cities are not part of the aggregate
        tm.create(NewTemperature {
            city_id: other.id,
            min: -40,
            max: 40,
        })
        .await
        .unwrap();

        let fm = ForecastManager::new(store);
        let forecast = fm.get(city.id).await.unwrap();
        assert_eq!(forecast.city_id, city.id);
        assert_eq!(forecast.sample, 3);
        assert_eq!(forecast.min, 19);
        assert_eq!(forecast.max, 25);
    }

    #[tokio::test]
    async fn test_get_forecast_without_readings_returns_zeroed_values() {
        let store = memory_store();
        let city = create_test_city(&store, "Berlin").await;

        let forecast = ForecastManager::new(store).get(city.id).await.unwrap();
        assert_eq!(
            forecast,
            Forecast {
                city_id: city.id,
                min: 0,
                max: 0,
                sample: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_cannot_get_forecast_with_non_existent_city() {
        let fm = ForecastManager::new(memory_store());

        assert!(matches!(
            fm.get(ObjectId::new()).await,
            Err(ModelError::NotFound)
        ));
    }
}
