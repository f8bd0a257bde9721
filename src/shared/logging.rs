use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Once;

use chrono::{SecondsFormat, Utc};
use env_logger::Target;

use crate::shared::config::{LogFormat, LogTarget, LoggingConfig};

static INIT: Once = Once::new();

/// Installs the global logger from `cfg`. Only the first call in a process
/// has an effect.
///
/// If the log file cannot be opened, lines go to stdout and the failure is
/// logged once the logger is up.
pub fn init(cfg: &LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&cfg.filter);

        let format = cfg.format;
        builder.format(move |buf, record| {
            let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            let line = render_line(
                format,
                &ts,
                record.level().as_str(),
                record.target(),
                &record.args().to_string(),
            );
            writeln!(buf, "{}", line)
        });

        let fallback = match open_target(&cfg.target) {
            Ok(target) => {
                builder.target(target);
                None
            }
            Err(reason) => {
                builder.target(Target::Stdout);
                Some(reason)
            }
        };

        if builder.try_init().is_err() {
            return;
        }
        if let Some(reason) = fallback {
            log::warn!("[logging] {}, logging to stdout", reason);
        }
        log::debug!("[logging] filter={} format={:?}", cfg.filter, cfg.format);
    });
}

fn open_target(target: &LogTarget) -> Result<Target, String> {
    let path = match target {
        LogTarget::Stdout => return Ok(Target::Stdout),
        LogTarget::File(path) => path,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("cannot create log dir {}: {}", dir.display(), e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("cannot open log file {}: {}", path.display(), e))?;
    Ok(Target::Pipe(Box::new(file)))
}

fn render_line(format: LogFormat, ts: &str, level: &str, target: &str, msg: &str) -> String {
    match format {
        LogFormat::Json => serde_json::json!({
            "ts": ts,
            "level": level,
            "target": target,
            "msg": msg,
        })
        .to_string(),
        LogFormat::Text => format!("{} {:<5} {} {}", ts, level, target, msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_lines_are_parseable() {
        let line = render_line(
            LogFormat::Json,
            "2026-01-01T00:00:00.000Z",
            "INFO",
            "voice_emotion_backend::service",
            "[analysis] job \"a\" done",
        );
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["msg"], "[analysis] job \"a\" done");
    }

    #[test]
    fn text_lines_pad_level() {
        let line = render_line(LogFormat::Text, "ts", "WARN", "t", "m");
        assert_eq!(line, "ts WARN  t m");
    }

    #[test]
    fn file_target_creates_missing_dirs() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested/logs/app.log");
        let target = open_target(&LogTarget::File(path.clone())).unwrap();
        assert!(matches!(target, Target::Pipe(_)));
        assert!(path.exists());
    }

    #[test]
    fn unopenable_file_is_reported() {
        let temp = tempdir().unwrap();
        // A directory where the file should be.
        match open_target(&LogTarget::File(temp.path().to_path_buf())) {
            Ok(_) => panic!("a directory must not open as a log file"),
            Err(reason) => assert!(reason.contains("cannot open log file")),
        }
    }
}
