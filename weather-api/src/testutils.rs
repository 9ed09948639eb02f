use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use parking_lot::Mutex;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// A request received by a [`CallbackServer`].
#[derive(Clone, Debug)]
pub struct Delivery {
    pub path: String,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

/// Local webhook receiver that records every request it gets.
pub struct CallbackServer {
    pub port: u16,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl CallbackServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(StatusCode::OK, Duration::ZERO).await
    }

    /// Answers every request with `status` after waiting `delay`. The request is
    /// recorded before the delay starts.
    pub async fn spawn_with(status: StatusCode, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();
        let deliveries = Arc::new(Mutex::new(Vec::new()));

        let recorded = deliveries.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let recorded = recorded.clone();

                tokio::spawn(async move {
                    let handler = move |req: Request<Incoming>| {
                        let recorded = recorded.clone();
                        async move {
                            let (parts, body) = req.into_parts();
                            let bytes = body
                                .collect()
                                .await
                                .map(|collected| collected.to_bytes())
                                .unwrap_or_else(|_| Bytes::new());

                            recorded.lock().push(Delivery {
                                path: parts.uri.path().to_string(),
                                content_type: parts
                                    .headers
                                    .get(hyper::header::CONTENT_TYPE)
                                    .and_then(|v| v.to_str().ok())
                                    .map(String::from),
                                body: serde_json::from_slice(&bytes)
                                    .unwrap_or(serde_json::Value::Null),
                            });

                            tokio::time::sleep(delay).await;
                            let mut response = Response::new(Full::new(Bytes::new()));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    };

                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service_fn(handler))
                        .await;
                });
            }
        });

        CallbackServer { port, deliveries }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// Polls until at least `count` requests arrived or `timeout` elapsed.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Delivery> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let received = self.deliveries.lock().len();
            if received >= count || tokio::time::Instant::now() >= deadline {
                return self.deliveries();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// A URL nothing listens on, so connecting to it is refused.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/refused")
}
