//! 数据包类型
//!
//! 数据包只携带逻辑元信息（源、目的、协议、序号、ack 标志），没有载荷。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::NodeId;
use crate::error::PacketError;
use crate::sim::Tick;

/// 协议标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl FromStr for Protocol {
    type Err = PacketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(PacketError::UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Udp => f.write_str("udp"),
        }
    }
}

/// 传输层元信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// `seq` 为创建时所在目的地队列的长度；`ack` 保留未用
    Tcp { seq: u64, ack: bool },
    Udp,
}

/// 网络数据包（创建后不可变）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: u64,
    pub src: NodeId,
    pub dst: NodeId,
    pub transport: Transport,
    pub created_at: Tick,
}

impl Packet {
    pub fn protocol(&self) -> Protocol {
        match self.transport {
            Transport::Tcp { .. } => Protocol::Tcp,
            Transport::Udp => Protocol::Udp,
        }
    }

    /// TCP 序号；UDP 包没有序号
    pub fn seq(&self) -> Option<u64> {
        match self.transport {
            Transport::Tcp { seq, .. } => Some(seq),
            Transport::Udp => None,
        }
    }
}
