use crate::config::AppConfig;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber: rolling file output plus, in text mode,
/// a colored stdout layer. Keep the returned guard alive until exit or
/// buffered lines are lost.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = file_writer(config);
    let registry = tracing_subscriber::registry().with(level_filter(config));

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(writer)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}

/// Unknown values mean a single file
fn rotation(config: &AppConfig) -> Rotation {
    match config.rotation.as_str() {
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

fn file_writer(config: &AppConfig) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(rotation(config), &config.log_dir, &config.log_file);
    tracing_appender::non_blocking(appender)
}

/// RUST_LOG wins over the configured level
fn level_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,peer_transfer={}", config.log_level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(rotation: &str) -> AppConfig {
        let dir = std::env::temp_dir().join(format!("peer_transfer-{}", ulid::Ulid::new()));
        AppConfig {
            log_dir: dir.to_string_lossy().into_owned(),
            log_file: "transfer.log".into(),
            use_json: true,
            rotation: rotation.into(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_rotation_names() {
        assert_eq!(rotation(&temp_config("hourly")), Rotation::HOURLY);
        assert_eq!(rotation(&temp_config("daily")), Rotation::DAILY);
        assert_eq!(rotation(&temp_config("never")), Rotation::NEVER);
        assert_eq!(rotation(&temp_config("weekly")), Rotation::NEVER);
    }

    /// Json lines reach the configured file once the guard is dropped
    #[test]
    fn test_json_lines_written_to_log_file() {
        let config = temp_config("never");
        std::fs::create_dir_all(&config.log_dir).unwrap();

        let (writer, guard) = file_writer(&config);
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("info"))
            .with(fmt::layer().json().with_writer(writer).with_ansi(false));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(amount = "200.00", "Insufficient funds at confirm");
            tracing::debug!("filtered out");
        });
        drop(guard);

        let path = std::path::Path::new(&config.log_dir).join(&config.log_file);
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "WARN");
        assert_eq!(lines[0]["fields"]["message"], "Insufficient funds at confirm");
        assert_eq!(lines[0]["fields"]["amount"], "200.00");

        std::fs::remove_dir_all(&config.log_dir).unwrap();
    }
}
