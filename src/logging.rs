use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialise logging. The level is `debug` when `debug` is set and `info`
/// otherwise. `RUST_LOG` can override the level, but only in debug mode.
/// With `log_file` set, output goes to that file instead of stdout.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Outside debug mode `RUST_LOG` is ignored so a stray variable in the
    // user's environment cannot turn on verbose output.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let file = log_file.and_then(|path| {
        let name = path.file_name()?.to_os_string();
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Some(tracing_appender::rolling::never(dir, name))
    });

    let _ = match file {
        Some(appender) => builder.with_ansi(false).with_writer(appender).try_init(),
        None => builder.try_init(),
    };
}
