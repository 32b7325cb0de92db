use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Field names whose values never reach the log output.
const REDACTED_FIELDS: &[&str] = &["token", "access_token", "password", "secret"];

/// Output flavour selected by `logging.format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Console,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "console" => Ok(LogFormat::Console),
            other => Err(format!(
                "Invalid logging.format '{}'. Valid values: json, console",
                other
            )),
        }
    }
}

/// Parse `logging.level` into a filter.
pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        _ => Err(format!(
            "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
            level
        )),
    }
}

#[derive(Default)]
struct JsonFieldVisitor {
    fields: Map<String, Value>,
}

impl JsonFieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        let value = if REDACTED_FIELDS.contains(&field.name()) {
            Value::from("<redacted>")
        } else {
            value
        };
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for JsonFieldVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}

fn severity_number(level: &Level) -> u64 {
    match *level {
        Level::TRACE => 1,
        Level::DEBUG => 5,
        Level::INFO => 9,
        Level::WARN => 13,
        Level::ERROR => 17,
    }
}

/// Arrange recorded fields into an OTel-shaped log record.
///
/// `event_name` / `event_domain` become `event.name` / `event.domain`, and the
/// `message` field becomes the body (falling back to `fallback_body`).
fn otel_record(
    level: &Level,
    mut attributes: Map<String, Value>,
    fallback_body: &str,
    service_name: &str,
    service_version: &str,
) -> Value {
    for (from, to) in [("event_name", "event.name"), ("event_domain", "event.domain")] {
        if let Some(v) = attributes.remove(from) {
            attributes.insert(to.to_string(), v);
        }
    }

    let body = attributes
        .remove("message")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| fallback_body.to_string());

    let mut resource = Map::new();
    resource.insert("service.name".to_string(), Value::from(service_name));
    resource.insert("service.version".to_string(), Value::from(service_version));

    let mut root = Map::new();
    root.insert(
        "timestamp".to_string(),
        Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    root.insert("severity_text".to_string(), Value::from(level.as_str()));
    root.insert(
        "severity_number".to_string(),
        Value::from(severity_number(level)),
    );
    root.insert("body".to_string(), Value::from(body));
    root.insert("resource".to_string(), Value::Object(resource));
    root.insert("attributes".to_string(), Value::Object(attributes));
    Value::Object(root)
}

#[derive(Clone)]
struct OtelJsonEventFormatter {
    service_name: String,
    service_version: String,
}

impl<S, N> FormatEvent<S, N> for OtelJsonEventFormatter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let mut attributes = visitor.fields;
        if let Some(file) = metadata.file() {
            attributes.insert("code.filepath".to_string(), Value::from(file));
        }
        if let Some(line) = metadata.line() {
            attributes.insert("code.lineno".to_string(), Value::from(line));
        }
        attributes.insert("code.target".to_string(), Value::from(metadata.target()));

        let record = otel_record(
            metadata.level(),
            attributes,
            metadata.name(),
            &self.service_name,
            &self.service_version,
        );
        let serialized = serde_json::to_string(&record).map_err(|_| std::fmt::Error)?;
        writer.write_str(&serialized)?;
        writer.write_char('\n')?;
        Ok(())
    }
}

/// Install the global tracing subscriber described by `logging_config`.
///
/// `RUST_LOG` directives are honoured on top of the configured level. Logs go to
/// stderr so command output on stdout stays machine readable.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), String> {
    let level_filter = parse_level(&logging_config.level)?;
    let format = logging_config.format.parse::<LogFormat>()?;

    let filter_layer = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter_layer)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .event_format(OtelJsonEventFormatter {
                        service_name: logging_config.service_name.clone(),
                        service_version: logging_config.service_version.clone(),
                    }),
            )
            .try_init(),
        LogFormat::Console => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().with_writer(std::io::stderr).compact())
            .try_init(),
    };
    result.map_err(|e| format!("Failed to install tracing subscriber: {}", e))
}
