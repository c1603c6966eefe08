//! hypi-agent-status - 巡检 hypivisor 上注册的所有 pi agent
//!
//! 用法：
//!   hypi-agent-status [--hypivisor-port PORT] [--filter-cwd PATH] [--timeout SECS] [--json]

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use hypi_agent_status::{ChannelConfig, Error, InspectConfig, OutputFormat, WsChannel};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(
    name = "hypi-agent-status",
    about = "Inspect running pi agents registered with the hypivisor",
    version,
    long_about = None
)]
struct Cli {
    /// Hypivisor port (default: 31415, or HYPIVISOR_PORT).
    #[arg(long, value_name = "PORT")]
    hypivisor_port: Option<u16>,

    /// Only show agents whose cwd starts with this prefix.
    #[arg(long, value_name = "PATH")]
    filter_cwd: Option<String>,

    /// WebSocket timeout in seconds, per connection.
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    timeout: u64,

    /// Output raw JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Host running the hypivisor and the agents.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Hypivisor auth token (overrides HYPI_TOKEN).
    #[arg(long)]
    token: Option<String>,

    /// Maximum number of agents inspected at the same time (1 = sequential).
    #[arg(long, value_name = "N", default_value_t = hypi_agent_status::config::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Log debug details to stderr.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// 环境变量打底，命令行参数覆盖
    fn into_config(self) -> InspectConfig {
        let mut config = InspectConfig::from_env()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_concurrency(self.concurrency)
            .with_format(if self.json { OutputFormat::Json } else { OutputFormat::Table });
        config.host = self.host;
        if let Some(port) = self.hypivisor_port {
            config = config.with_hypivisor_port(port);
        }
        if let Some(prefix) = self.filter_cwd {
            config = config.with_filter_cwd(prefix);
        }
        if let Some(token) = self.token {
            config = config.with_token(token);
        }
        config
    }
}

/// 写出结果并刷新
fn write_output(out: &mut impl Write, output: &str) -> hypi_agent_status::Result<()> {
    out.write_all(output.as_bytes())?;
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志（stderr，stdout 只输出结果）
    let default_level = if cli.verbose { "hypi_agent_status=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = cli.into_config();
    let channel = WsChannel::new(ChannelConfig::from(&config));

    match hypi_agent_status::run(&channel, &config).await {
        Ok(output) => {
            if let Err(e) = write_output(&mut std::io::stdout().lock(), &output) {
                tracing::error!("写入输出失败: {}", e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(Error::NoAgents) => {
            eprintln!("{}", Error::NoAgents);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 拒绝写入的输出端
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_output() {
        let mut buf = Vec::new();
        write_output(&mut buf, "[]\n").unwrap();
        assert_eq!(buf, b"[]\n");
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let err = write_output(&mut ClosedPipe, "[]\n").unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    }
}
