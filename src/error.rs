//! 错误类型
//!
//! 配置错误在构建网络时一次性暴露；仿真运行期间的丢包/不可达都是可计数事件，不会中断运行。

use crate::net::{LinkId, NodeId};
use thiserror::Error;

/// 构建期（任何 tick 执行之前）的致命配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("topology has no hosts")]
    NoHosts,
    #[error("topology has no routers")]
    NoRouters,
    #[error("host {host:?} has no egress link")]
    MissingEgress { host: NodeId },
    #[error("egress link {link:?} of host {host:?} does not start at that host")]
    BadEgress { host: NodeId, link: LinkId },
    #[error("link {link:?} has zero propagation delay")]
    ZeroDelay { link: LinkId },
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("router buffer size must be at least 1")]
    ZeroBuffer,
    #[error("invalid RED parameters: {0}")]
    InvalidRed(String),
    #[error("invalid pareto shape {alpha} for host {host:?}")]
    InvalidAlpha { host: NodeId, alpha: f64 },
    #[error("invalid link delay range [{min}, {max}]")]
    InvalidDelayRange { min: u32, max: u32 },
    #[error(transparent)]
    UnknownProtocol(#[from] PacketError),
    #[error("no protocols enabled for traffic generation")]
    NoProtocols,
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// 数据包元信息校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("unknown protocol tag {0:?}")]
    UnknownProtocol(String),
}

/// 路由器找不到下一跳（可恢复：丢包并计数）
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("no next hop from {from:?} toward {dst:?}")]
    NoNextHop { from: NodeId, dst: NodeId },
}

/// 运行期 API 误用
#[derive(Debug, Error)]
pub enum SimError {
    #[error("node {0:?} is not a host")]
    NotAHost(NodeId),
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error(transparent)]
    Packet(#[from] PacketError),
}
