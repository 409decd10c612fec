//! RED 随机拓扑仿真
//!
//! 按配置构建随机平面拓扑，运行 ON/OFF Pareto 流量若干 tick，输出汇总。

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use redsim::error::ConfigError;
use redsim::net::Summary;
use redsim::sim::SimConfig;
use redsim::topo::random_mesh::network_from_config;

#[derive(Debug, Parser)]
#[command(name = "redsim", about = "RED 主动队列管理仿真：ON/OFF Pareto 流量 + 随机路由器全连接拓扑")]
struct Args {
    /// JSON 配置文件；命令行参数覆盖其中的字段
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    hosts: Option<usize>,
    #[arg(long)]
    routers: Option<usize>,
    /// 仿真运行多少个 tick
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    /// 路由器每条队列的容量（包）
    #[arg(long)]
    buffer_size: Option<usize>,
    #[arg(long)]
    alpha_on: Option<f64>,
    #[arg(long)]
    alpha_off: Option<f64>,
    #[arg(long)]
    min_th: Option<f64>,
    #[arg(long)]
    max_th: Option<f64>,
    #[arg(long)]
    max_p: Option<f64>,
    #[arg(long)]
    wq: Option<f64>,
    /// 输出 JSON 汇总；不填则只打印一行摘要
    #[arg(long)]
    report_json: Option<PathBuf>,
    /// 关闭日志输出
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

impl Args {
    fn resolve(&self) -> Result<SimConfig, ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => SimConfig::from_json_file(path)?,
            None => SimConfig::default(),
        };
        if let Some(v) = self.hosts {
            cfg.hosts = v;
        }
        if let Some(v) = self.routers {
            cfg.routers = v;
        }
        if let Some(v) = self.ticks {
            cfg.ticks = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = v;
        }
        if let Some(v) = self.buffer_size {
            cfg.buffer_size = v;
        }
        if let Some(v) = self.alpha_on {
            cfg.alpha_on = v;
        }
        if let Some(v) = self.alpha_off {
            cfg.alpha_off = v;
        }
        if let Some(v) = self.min_th {
            cfg.red.min_th = v;
        }
        if let Some(v) = self.max_th {
            cfg.red.max_th = v;
        }
        if let Some(v) = self.max_p {
            cfg.red.max_p = v;
        }
        if let Some(v) = self.wq {
            cfg.red.wq = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let cfg = match args.resolve() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::from(2);
        }
    };

    let (mut net, _topo) = match network_from_config(&cfg) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::from(2);
        }
    };

    net.run(cfg.ticks);

    let summary = Summary::from_network(&net);
    println!("{}", summary.line());

    if let Some(path) = &args.report_json {
        let written = serde_json::to_string_pretty(&summary)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => eprintln!("wrote report to {}", path.display()),
            Err(err) => {
                eprintln!("write report {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
