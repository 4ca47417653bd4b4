//! # Catalog Publisher CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 组装编解码器、HTTP 传输、消息代理与投递路由
//! - 发布 / 撤销发布目录实体

mod cli;
mod commands;
mod runtime;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_publish, run_unpublish, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_observability(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Catalog Publisher CLI starting"
    );

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Publish(args) => run_publish(args).await,
        Commands::Unpublish(args) => run_unpublish(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging and metrics based on CLI options
fn init_observability(cli: &Cli) -> Result<()> {
    let config = observability::ObservabilityConfig::from_verbosity(cli.quiet, cli.verbose)
        .with_log_format(cli.log_format.into())
        .with_metrics_port(cli.metrics_port);
    observability::init_with_config(config)
}
