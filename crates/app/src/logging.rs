use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tradelens_core::config::LogConfig;

const LOG_FILE_PREFIX: &str = "tradelens.log";

/// # Summary
/// 安装全局 tracing 订阅器。
///
/// # Logic
/// 1. `RUST_LOG` 优先于 `config.level`。
/// 2. 可读日志输出到 stderr，stdout 仅用于结果。
/// 3. 设置 `config.dir` 时，同样的事件额外写入按天滚动的日志文件。
///
/// # Returns
/// * 文件写入器的 guard，需要存活到进程退出。

pub fn init_logging(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Invalid log level")?;

    let (file_layer, guard) = match &config.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
