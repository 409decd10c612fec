//! 节点类型
//!
//! 主机与路由器共享 id/名称/坐标，行为按角色分派：
//! 两者都有 `receive` 和 `send_egress`，主机额外有状态机与发包。

use serde::Serialize;

use super::directory::LinkDirectory;
use super::host::Host;
use super::id::{LinkId, NodeId};
use super::link::Link;
use super::packet::Packet;
use super::router::Router;
use super::stats::{NodeCounters, Stats};
use crate::error::RouteError;
use crate::queue::FlowQueues;
use crate::sim::{SimRng, Tick};

/// 平面坐标（只在拓扑构建时有意义）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dist2(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// 节点角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Host,
    Router,
}

/// 丢包原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropCause {
    Overflow,
    Red,
    Undeliverable,
}

/// 一次交付的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reception {
    /// 到达最终目的主机
    Delivered,
    /// 进入路由器队列
    Queued,
    Dropped(DropCause),
}

/// 单个相位内节点可用的执行上下文
pub(crate) struct TickCtx<'a> {
    pub now: Tick,
    pub rng: &'a mut SimRng,
    pub stats: &'a mut Stats,
}

/// 网络节点
#[derive(Debug, Clone)]
pub enum Node {
    Host(Host),
    Router(Router),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Host(h) => h.id(),
            Node::Router(r) => r.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Host(h) => h.name(),
            Node::Router(r) => r.name(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Node::Host(_) => Role::Host,
            Node::Router(_) => Role::Router,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Node::Host(h) => h.pos,
            Node::Router(r) => r.pos,
        }
    }

    pub fn queues(&self) -> &FlowQueues {
        match self {
            Node::Host(h) => h.queues(),
            Node::Router(r) => r.queues(),
        }
    }

    pub fn counters(&self) -> &NodeCounters {
        match self {
            Node::Host(h) => h.counters(),
            Node::Router(r) => r.counters(),
        }
    }

    pub fn as_host(&self) -> Option<&Host> {
        match self {
            Node::Host(h) => Some(h),
            Node::Router(_) => None,
        }
    }

    pub fn as_router(&self) -> Option<&Router> {
        match self {
            Node::Router(r) => Some(r),
            Node::Host(_) => None,
        }
    }

    pub(crate) fn as_host_mut(&mut self) -> Option<&mut Host> {
        match self {
            Node::Host(h) => Some(h),
            Node::Router(_) => None,
        }
    }

    /// 处理链路交付过来的包
    pub(crate) fn receive(&mut self, pkt: Packet, ctx: &mut TickCtx<'_>) -> Reception {
        match self {
            Node::Host(h) => h.receive(pkt, ctx),
            Node::Router(r) => r.receive(pkt, ctx),
        }
    }

    /// 最多向出链路注入一个包
    pub(crate) fn send_egress(
        &mut self,
        links: &mut [Link],
        dir: &LinkDirectory,
        ctx: &mut TickCtx<'_>,
    ) -> Result<Option<LinkId>, RouteError> {
        match self {
            Node::Host(h) => Ok(h.send_egress(links, ctx).map(|_| h.egress())),
            Node::Router(r) => r.send_egress(links, dir, ctx),
        }
    }
}
