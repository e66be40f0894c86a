//! Tracing setup for the engine process.
//!
//! `LOG_LEVEL` takes any `EnvFilter` directive string. Without it the engine
//! logs its own targets at debug and the HTTP stack at info. `LOG_FORMAT=json`
//! switches to one JSON object per line.
//!
//! Targets: `challenge_engine` for plumbing (config, backend calls, sockets),
//! `session` for the attempt lifecycle (start, finish triggers, submission).

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &[&str] = &[
    "info",
    "challenge_engine=debug",
    "session=debug",
    "tower_http=info",
    "axum=info",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than `json` (any case) means pretty output.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn default_filter() -> String {
    DEFAULT_DIRECTIVES.join(",")
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(default_filter()));
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
