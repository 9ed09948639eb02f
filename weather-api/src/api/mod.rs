//! HTTP surface of the weather API.
//!
//! Requests carry form-encoded fields, responses are JSON. Every model error
//! is turned into a JSON body of the form `{"error_message": "..."}`.

mod forms;
mod views;

use crate::errors::{ModelError, WeatherApiError};
use crate::metrics_defs::REQUEST_DURATION;
use crate::model::{CityUpdate, NewCity, NewTemperature, NewWebhook, ObjectId};
use crate::service::WeatherService;
use forms::Form;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use shared::histogram;
use shared::http::full_body;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use thiserror::Error;
use views::{CityView, ErrorView, ForecastView, TemperatureView, WebhookView};

const MAX_BODY_SIZE: usize = 64 * 1024;

type ApiResponse = Response<BoxBody<Bytes, WeatherApiError>>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{0}")]
    BadRequest(String),

    #[error("no such route")]
    NoRoute,

    #[error("method not allowed")]
    MethodNotAllowed(&'static str),

    #[error("could not encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Model(ModelError::NotFound) | ApiError::NoRoute => StatusCode::NOT_FOUND,
            ApiError::Model(ModelError::AlreadyExists) => StatusCode::CONFLICT,
            ApiError::Model(ModelError::InvalidInput(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Model(ModelError::Store(_)) | ApiError::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn into_response(self) -> ApiResponse {
        let status = self.status();

        // Internal details stay in the logs
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::to_vec(&ErrorView {
            error_message: &message,
        })
        .unwrap_or_default();

        let mut response = json_response(status, body);
        if let ApiError::MethodNotAllowed(allowed) = self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(allowed));
        }
        response
    }
}

fn json_response(status: StatusCode, body: Vec<u8>) -> ApiResponse {
    let mut response = Response::new(full_body(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<ApiResponse, ApiError> {
    Ok(json_response(status, serde_json::to_vec(value)?))
}

/// Ids in the path that do not parse cannot name an existing resource.
fn path_id(raw: &str) -> Result<ObjectId, ApiError> {
    raw.parse().map_err(|_| ApiError::Model(ModelError::NotFound))
}

pub struct ApiService {
    weather: WeatherService,
}

impl ApiService {
    pub fn new(weather: WeatherService) -> Self {
        Self { weather }
    }
}

impl<B> Service<Request<B>> for ApiService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = ApiResponse;
    type Error = WeatherApiError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let weather = self.weather.clone();

        Box::pin(async move {
            let start = Instant::now();
            let method = req.method().clone();
            let path = req.uri().path().to_owned();

            let response = match route(&weather, req).await {
                Ok(response) => response,
                Err(e) => e.into_response(),
            };

            tracing::debug!(%method, %path, status = %response.status(), "Handled request");
            histogram!(
                REQUEST_DURATION,
                "method" => method.to_string(),
                "status" => response.status().as_str().to_owned()
            )
            .record(start.elapsed().as_secs_f64());

            Ok(response)
        })
    }
}

async fn read_form<B>(body: B) -> Result<Form, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = Limited::new(body, MAX_BODY_SIZE)
        .collect()
        .await
        .map_err(|e| ApiError::BadRequest(format!("could not read request body: {e}")))?
        .to_bytes();
    Ok(Form::parse(&bytes))
}

async fn route<B>(weather: &WeatherService, req: Request<B>) -> Result<ApiResponse, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let segments: Vec<&str> = parts.uri.path().trim_matches('/').split('/').collect();

    match (segments.as_slice(), &parts.method) {
        (["cities"], &Method::POST) => create_city(weather, read_form(body).await?).await,
        (["cities"], _) => Err(ApiError::MethodNotAllowed("POST")),

        (["cities", id], &Method::GET) => get_city(weather, path_id(id)?).await,
        (["cities", id], &Method::PATCH) => {
            update_city(weather, path_id(id)?, read_form(body).await?).await
        }
        (["cities", id], &Method::DELETE) => delete_city(weather, path_id(id)?).await,
        (["cities", _], _) => Err(ApiError::MethodNotAllowed("GET, PATCH, DELETE")),

        (["temperatures"], &Method::POST) => {
            create_temperature(weather, read_form(body).await?).await
        }
        (["temperatures"], _) => Err(ApiError::MethodNotAllowed("POST")),

        (["forecasts", id], &Method::GET) => get_forecast(weather, path_id(id)?).await,
        (["forecasts", _], _) => Err(ApiError::MethodNotAllowed("GET")),

        (["webhooks"], &Method::POST) => create_webhook(weather, read_form(body).await?).await,
        (["webhooks"], &Method::GET) => {
            let query = Form::parse(parts.uri.query().unwrap_or_default().as_bytes());
            list_webhooks(weather, query).await
        }
        (["webhooks"], _) => Err(ApiError::MethodNotAllowed("GET, POST")),

        (["webhooks", id], &Method::DELETE) => delete_webhook(weather, path_id(id)?).await,
        (["webhooks", _], _) => Err(ApiError::MethodNotAllowed("DELETE")),

        _ => Err(ApiError::NoRoute),
    }
}

async fn create_city(weather: &WeatherService, form: Form) -> Result<ApiResponse, ApiError> {
    let city = weather
        .cities
        .create(NewCity {
            name: form.required("name")?.to_owned(),
            latitude: form.parse_field("latitude")?,
            longitude: form.parse_field("longitude")?,
        })
        .await?;

    json(StatusCode::CREATED, &CityView::from(city))
}

async fn get_city(weather: &WeatherService, id: ObjectId) -> Result<ApiResponse, ApiError> {
    let city = weather.cities.get(id).await?;
    json(StatusCode::OK, &CityView::from(city))
}

async fn update_city(
    weather: &WeatherService,
    id: ObjectId,
    form: Form,
) -> Result<ApiResponse, ApiError> {
    let city = weather
        .cities
        .update(CityUpdate {
            id,
            version: form.parse_field("version")?,
            name: form.required("name")?.to_owned(),
            latitude: form.parse_field("latitude")?,
            longitude: form.parse_field("longitude")?,
        })
        .await?;

    json(StatusCode::OK, &CityView::from(city))
}

async fn delete_city(weather: &WeatherService, id: ObjectId) -> Result<ApiResponse, ApiError> {
    let city = weather.cities.delete(id).await?;
    json(StatusCode::OK, &CityView::from(city))
}

async fn create_temperature(
    weather: &WeatherService,
    form: Form,
) -> Result<ApiResponse, ApiError> {
    let temperature = weather
        .create_temperature(NewTemperature {
            city_id: form.parse_field("city_id")?,
            min: form.parse_field("min")?,
            max: form.parse_field("max")?,
        })
        .await?;

    json(StatusCode::CREATED, &TemperatureView::from(temperature))
}

async fn get_forecast(weather: &WeatherService, city_id: ObjectId) -> Result<ApiResponse, ApiError> {
    let forecast = weather.forecasts.get(city_id).await?;
    json(StatusCode::OK, &ForecastView::from(forecast))
}

async fn create_webhook(weather: &WeatherService, form: Form) -> Result<ApiResponse, ApiError> {
    let webhook = weather
        .webhooks
        .create(NewWebhook {
            city_id: form.parse_field("city_id")?,
            callback_url: form.required("callback_url")?.to_owned(),
        })
        .await?;

    json(StatusCode::CREATED, &WebhookView::from(webhook))
}

async fn list_webhooks(weather: &WeatherService, query: Form) -> Result<ApiResponse, ApiError> {
    let webhooks = weather.webhooks.get(query.parse_field("city_id")?).await?;
    let views: Vec<WebhookView> = webhooks.into_iter().map(WebhookView::from).collect();
    json(StatusCode::OK, &views)
}

async fn delete_webhook(weather: &WeatherService, id: ObjectId) -> Result<ApiResponse, ApiError> {
    let webhook = weather.webhooks.delete(id).await?;
    json(StatusCode::OK, &WebhookView::from(webhook))
}
