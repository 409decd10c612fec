//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件，如节点、链路、数据包和网络拓扑。

// 子模块声明
mod directory;
mod host;
mod id;
mod link;
mod network;
mod node;
mod packet;
mod report;
mod router;
mod stats;

// 重新导出公共接口
pub use directory::LinkDirectory;
pub use host::{Host, HostConfig, OnOff, TrafficState};
pub use id::{LinkId, NodeId};
pub use link::Link;
pub use network::{Network, NetworkBuilder};
pub use node::{DropCause, Node, Position, Reception, Role};
pub(crate) use node::TickCtx;
pub use packet::{Packet, Protocol, Transport};
pub use report::{NodeSummary, Summary};
pub use router::Router;
pub use stats::{NodeCounters, Stats};
