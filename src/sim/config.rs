use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::net::Protocol;
use crate::queue::RedConfig;

/// 仿真配置（JSON）。所有字段都有默认值，默认即参考场景：3 主机、2 路由器。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub hosts: usize,
    pub routers: usize,
    /// ON 状态驻留时长的 Pareto 形状参数
    pub alpha_on: f64,
    /// OFF 状态驻留时长的 Pareto 形状参数
    pub alpha_off: f64,
    /// 路由器每条队列的容量（包）
    pub buffer_size: usize,
    pub red: RedConfig,
    /// 链路传播时延下界（tick，含）
    pub delay_min: u32,
    /// 链路传播时延上界（tick，含）
    pub delay_max: u32,
    pub seed: u64,
    pub ticks: u64,
    /// 主机 TCP 发送窗口初值（不会回补）
    pub initial_cwnd: u64,
    /// 参与生成的协议标签
    pub protocols: Vec<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hosts: 3,
            routers: 2,
            alpha_on: 1.5,
            alpha_off: 1.5,
            buffer_size: 10,
            red: RedConfig::default(),
            delay_min: 1,
            delay_max: 5,
            seed: 1,
            ticks: 1000,
            initial_cwnd: 1,
            protocols: vec!["tcp".to_string(), "udp".to_string()],
        }
    }
}

impl SimConfig {
    /// 从 JSON 文件加载
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// 解析协议标签；未知标签直接报错，不做静默忽略。
    pub fn parsed_protocols(&self) -> Result<Vec<Protocol>, ConfigError> {
        let mut out = Vec::with_capacity(self.protocols.len());
        for tag in &self.protocols {
            let p: Protocol = tag.parse()?;
            if !out.contains(&p) {
                out.push(p);
            }
        }
        if out.is_empty() {
            return Err(ConfigError::NoProtocols);
        }
        Ok(out)
    }

    /// 构建前的整体校验（拓扑退化、RED 参数、时延区间、协议标签）
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts == 0 {
            return Err(ConfigError::NoHosts);
        }
        if self.routers == 0 {
            return Err(ConfigError::NoRouters);
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::ZeroBuffer);
        }
        if self.delay_min == 0 || self.delay_min > self.delay_max {
            return Err(ConfigError::InvalidDelayRange {
                min: self.delay_min,
                max: self.delay_max,
            });
        }
        self.red.validate()?;
        self.parsed_protocols()?;
        Ok(())
    }
}
