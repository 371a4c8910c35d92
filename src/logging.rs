//! 日志初始化（供嵌入方在加载配置后调用）

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// 日志输出选项（不属于配置文件内容）
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub directory: PathBuf,
    pub file_prefix: String,
    /// daily / hourly / never
    pub rotation: String,
    pub console_output: bool,
}

fn default_log_directory() -> PathBuf { PathBuf::from("data/logs") }
fn default_log_prefix() -> String { "dashboard".to_string() }
fn default_log_rotation() -> String { "daily".to_string() }
fn default_console_output() -> bool { true }

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file_prefix: default_log_prefix(),
            rotation: default_log_rotation(),
            console_output: default_console_output(),
        }
    }
}

/// 按配置的 Debug 开关选择日志等级，RUST_LOG 优先
pub fn level_for(config: &Config) -> &'static str {
    if config.debug { "debug" } else { "info" }
}

/// 初始化日志系统（带轮转）
///
/// 返回的 guard 需要在进程生命周期内持有，否则缓冲中的日志会丢失。
pub fn init_logging(config: &Config, options: &LogOptions) -> Result<WorkerGuard> {
    fs::create_dir_all(&options.directory)?;

    let file_appender = match options.rotation.as_str() {
        "hourly" => rolling::hourly(&options.directory, &options.file_prefix),
        "never" => rolling::never(&options.directory, &options.file_prefix),
        _ => rolling::daily(&options.directory, &options.file_prefix),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_for(config)))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if options.console_output {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
            .try_init()?;
    } else {
        registry.try_init()?;
    }

    Ok(guard)
}
