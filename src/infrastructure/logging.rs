use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    pub include_file_location: bool,
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            include_file_location: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    /// 调试模式下输出更详细的日志
    pub fn for_debug(debug: bool) -> Self {
        if debug {
            Self {
                level: Level::DEBUG,
                format: LogFormat::Pretty,
                include_file_location: true,
                ..Default::default()
            }
        } else {
            Self::default()
        }
    }
}

/// 日志格式
#[derive(Debug, Clone)]
pub enum LogFormat {
    /// 人类可读的格式
    Pretty,
    /// 紧凑格式
    Compact,
}

/// 日志输出目标
///
/// 命令行输出 JSON 到 stdout，因此默认写 stderr。
#[derive(Debug, Clone)]
pub enum LogOutput {
    Stdout,
    Stderr,
}

/// 构建过滤器：显式 filter 优先，其次 RUST_LOG，最后按 level 过滤本 crate
pub fn build_env_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    let env_filter = if let Some(filter) = &config.filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::from_default_env()
            .add_directive(format!("sentiment_review={}", config.level).parse()?)
    };

    Ok(env_filter)
}

/// 设置日志系统
pub fn setup_logging(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = build_env_filter(&config)?;

    let fmt_layer = match config.output {
        LogOutput::Stdout => create_fmt_layer(&config, io::stdout, env_filter),
        LogOutput::Stderr => create_fmt_layer(&config, io::stderr, env_filter),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}

fn create_fmt_layer<W>(
    config: &LoggingConfig,
    make_writer: W,
    env_filter: EnvFilter,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(make_writer)
        .with_target(true)
        .with_level(true)
        .with_file(config.include_file_location)
        .with_line_number(config.include_file_location);

    match config.format {
        LogFormat::Pretty => layer.pretty().with_filter(env_filter).boxed(),
        LogFormat::Compact => layer.compact().with_filter(env_filter).boxed(),
    }
}
