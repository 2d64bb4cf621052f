//! Prometheus metrics HTTP server.
//!
//! Serves metrics on a configurable HTTP endpoint.

use crate::metrics::MetricsCollector;
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus_client::encoding::text::encode;
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

const CONTENT_TYPE_METRICS: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus metrics HTTP server.
pub struct MetricsServer {
    listener: TcpListener,
    /// Path for metrics endpoint.
    path: String,
    collector: MetricsCollector,
}

impl MetricsServer {
    /// Bind the listener. Failing here is a startup error.
    pub async fn bind(
        address: SocketAddr,
        path: String,
        collector: MetricsCollector,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            path,
            collector,
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if let Ok(address) = self.listener.local_addr() {
            info!(address = %address, path = %self.path, "metrics server started");
        }

        let collector = Arc::new(self.collector);
        let path: Arc<str> = Arc::from(self.path);

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => {
                            let collector = Arc::clone(&collector);
                            let path = Arc::clone(&path);

                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let collector = Arc::clone(&collector);
                                    let path = Arc::clone(&path);
                                    async move {
                                        handle_request(req, &collector, &path).await
                                    }
                                });

                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!(error = %e, "metrics connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept metrics connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    info!("metrics server shutting down");
                    break;
                }
            }
        }
    }
}

/// Handle an incoming metrics request.
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    collector: &MetricsCollector,
    metrics_path: &str,
) -> Result<Response<Full<Bytes>>, Infallible> {
    debug!(path = %req.uri().path(), method = %req.method(), "metrics request");
    Ok(route(req.method(), req.uri().path(), collector, metrics_path))
}

fn route(
    method: &Method,
    path: &str,
    collector: &MetricsCollector,
    metrics_path: &str,
) -> Response<Full<Bytes>> {
    if method != Method::GET {
        return text(StatusCode::METHOD_NOT_ALLOWED, "text/plain", "Method not allowed\n".into());
    }

    if path == metrics_path {
        let mut buffer = String::new();
        if let Err(e) = encode(&mut buffer, collector.registry()) {
            error!(error = %e, "failed to encode metrics");
            return text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain",
                "Failed to encode metrics\n".into(),
            );
        }
        text(StatusCode::OK, CONTENT_TYPE_METRICS, buffer)
    } else if path == "/health" || path == "/healthz" {
        text(StatusCode::OK, "text/plain", "OK\n".into())
    } else if path == "/" {
        let body = format!(
            "sitewatch metrics server\n\nEndpoints:\n  {} - Prometheus metrics\n  /health - Health check\n",
            metrics_path
        );
        text(StatusCode::OK, "text/plain", body)
    } else {
        text(StatusCode::NOT_FOUND, "text/plain", "Not found\n".into())
    }
}

fn text(status: StatusCode, content_type: &'static str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
    response
}
