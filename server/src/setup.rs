use std::{collections::HashMap, net::SocketAddr};

use axum::Router;
use opentelemetry_otlp::WithExportConfig as _;
use tracing::{info, Subscriber};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    layer::SubscriberExt as _, registry::LookupSpan, util::SubscriberInitExt as _, EnvFilter,
};

/// Installs color-eyre and the tracing subscriber.
///
/// Output goes through `tracing-tree`. When `OTEL_EXPORTER_OTLP_ENDPOINT` is set,
/// spans are also exported over OTLP/HTTP.
pub fn setup_tracing(crate_name: &str) -> color_eyre::Result<()> {
    color_eyre::install()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{crate_name}=debug")));

    let tree_layer = tracing_tree::HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);

    let otel_layer = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => Some(otlp_layer(crate_name, endpoint)?),
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tree_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

fn otlp_layer<S>(
    service_name: &str,
    endpoint: String,
) -> color_eyre::Result<OpenTelemetryLayer<S, opentelemetry_sdk::trace::Tracer>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let headers = std::env::var("OTEL_EXPORTER_OTLP_HEADERS")
        .map(|raw| parse_otlp_headers(&raw))
        .unwrap_or_default();

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .http()
                .with_endpoint(endpoint)
                .with_headers(headers),
        )
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
            opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                "service.name",
                service_name.to_string(),
            )]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    Ok(tracing_opentelemetry::layer().with_tracer(tracer))
}

/// `key=value,key2=value2` as used by the OTLP exporters
fn parse_otlp_headers(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Returns a guard that must live for the whole process, or `None` without a DSN
pub fn setup_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok()?;
    let environment =
        std::env::var("SENTRY_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(environment.into()),
            traces_sample_rate: 0.1,
            ..Default::default()
        },
    ));

    Some(guard)
}

pub async fn run_server(router: Router, port: u16) -> color_eyre::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_otlp_headers() {
        let headers = parse_otlp_headers("x-honeycomb-team=abc123, x-dataset = portfolio,broken");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("x-honeycomb-team").map(String::as_str), Some("abc123"));
        assert_eq!(headers.get("x-dataset").map(String::as_str), Some("portfolio"));
    }
}
