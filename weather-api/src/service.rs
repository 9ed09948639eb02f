use crate::errors::{ModelError, Result};
use crate::model::{
    CityManager, ForecastManager, NewTemperature, Temperature, TemperatureManager, WebhookManager,
};
use crate::notifier::Notifier;
use std::sync::Arc;
use store::DocumentStore;

/// All managers over one store, plus the notifier that fans readings out to
/// webhooks.
#[derive(Clone)]
pub struct WeatherService {
    pub cities: CityManager,
    pub temperatures: TemperatureManager,
    pub forecasts: ForecastManager,
    pub webhooks: WebhookManager,
    notifier: Notifier,
}

impl WeatherService {
    pub async fn new(store: Arc<dyn DocumentStore>, notifier: Notifier) -> Result<Self> {
        Ok(WeatherService {
            cities: CityManager::new(store.clone()).await?,
            temperatures: TemperatureManager::new(store.clone()),
            forecasts: ForecastManager::new(store.clone()),
            webhooks: WebhookManager::new(store).await?,
            notifier,
        })
    }

    /// Records a reading and notifies the city's webhooks in the background.
    ///
    /// Returns as soon as the reading is persisted. Webhook lookup and delivery
    /// failures never fail this call.
    pub async fn create_temperature(&self, nt: NewTemperature) -> Result<Temperature> {
        let temperature = self.temperatures.create(nt).await?;

        match self.webhooks.get(temperature.city_id).await {
            Ok(webhooks) => {
                tracing::debug!(
                    city_id = %temperature.city_id,
                    webhooks = webhooks.len(),
                    "Notifying webhooks"
                );
                // Detached; the handle is only useful to tests.
                let _ = self.notifier.notify(webhooks, (&temperature).into());
            }
            Err(ModelError::NotFound) => {}
            Err(e) => {
                tracing::warn!(
                    city_id = %temperature.city_id,
                    error = %e,
                    "Could not look up webhooks, skipping notification"
                );
            }
        }

        Ok(temperature)
    }
}
