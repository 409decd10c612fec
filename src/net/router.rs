//! 路由器（转发节点）
//!
//! 入方向：先做容量检查（溢出丢包），再用入队后的候选队长询问 RED。
//! 出方向：随机选择 TCP/UDP 类别，出队一个包，经链路目录解析下一跳。

use tracing::{debug, trace, warn};

use super::directory::LinkDirectory;
use super::id::{LinkId, NodeId};
use super::link::Link;
use super::node::{DropCause, Position, Reception, TickCtx};
use super::packet::{Packet, Protocol};
use super::stats::NodeCounters;
use crate::error::{ConfigError, RouteError};
use crate::queue::{FlowQueues, Red, RedConfig};

/// 路由器节点
#[derive(Debug, Clone)]
pub struct Router {
    id: NodeId,
    name: String,
    pub(crate) pos: Position,
    buffer_size: usize,
    queues: FlowQueues,
    red: Red,
    pub(crate) counters: NodeCounters,
}

impl Router {
    pub(crate) fn new(
        id: NodeId,
        name: String,
        pos: Position,
        buffer_size: usize,
        red: RedConfig,
    ) -> Result<Self, ConfigError> {
        if buffer_size == 0 {
            return Err(ConfigError::ZeroBuffer);
        }
        Ok(Self {
            id,
            name,
            pos,
            buffer_size,
            queues: FlowQueues::new(Some(buffer_size)),
            red: Red::new(red)?,
            counters: NodeCounters::default(),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn queues(&self) -> &FlowQueues {
        &self.queues
    }

    pub fn red(&self) -> &Red {
        &self.red
    }

    pub fn counters(&self) -> &NodeCounters {
        &self.counters
    }

    /// 准入控制
    pub(crate) fn receive(&mut self, pkt: Packet, ctx: &mut TickCtx<'_>) -> Reception {
        let cur = self.queues.len_for(pkt.protocol(), pkt.dst);
        if cur >= self.buffer_size {
            debug!(router = ?self.id, pkt_id = pkt.id, q_len = cur, cap = self.buffer_size, "🗑️ 队列已满，溢出丢包");
            self.counters.dropped_overflow += 1;
            ctx.stats.dropped_overflow += 1;
            return Reception::Dropped(DropCause::Overflow);
        }

        let verdict = self.red.check(cur + 1, ctx.rng);
        if verdict.is_drop() {
            debug!(
                router = ?self.id,
                pkt_id = pkt.id,
                avg = self.red.avg_queue_size(),
                verdict = ?verdict,
                "🎲 RED 丢包"
            );
            self.counters.dropped_red += 1;
            ctx.stats.dropped_red += 1;
            return Reception::Dropped(DropCause::Red);
        }

        trace!(router = ?self.id, pkt_id = pkt.id, q_len = cur + 1, "📥 入队");
        match self.queues.enqueue(pkt) {
            Ok(()) => {
                self.counters.received += 1;
                Reception::Queued
            }
            Err(pkt) => {
                // 上面已检查过容量，这里只在两者不一致时兜底计数
                debug!(router = ?self.id, pkt_id = pkt.id, "入队失败，按溢出计");
                self.counters.dropped_overflow += 1;
                ctx.stats.dropped_overflow += 1;
                Reception::Dropped(DropCause::Overflow)
            }
        }
    }

    /// 相位 3：最多转发一个包。找不到下一跳时丢包、计数并返回错误。
    pub(crate) fn send_egress(
        &mut self,
        links: &mut [Link],
        dir: &LinkDirectory,
        ctx: &mut TickCtx<'_>,
    ) -> Result<Option<LinkId>, RouteError> {
        let class = if ctx.rng.coin() {
            Protocol::Tcp
        } else {
            Protocol::Udp
        };
        let Some(pkt) = self.queues.dequeue_class(class, ctx.rng) else {
            return Ok(None);
        };

        match dir.next_hop(self.id, pkt.dst) {
            Ok(link_id) => {
                let link = &mut links[link_id.0];
                trace!(router = ?self.id, pkt_id = pkt.id, link = ?link_id, next = ?link.to, "🔀 转发");
                link.push(pkt);
                self.counters.sent += 1;
                ctx.stats.forwarded_pkts += 1;
                Ok(Some(link_id))
            }
            Err(err) => {
                warn!(router = ?self.id, pkt_id = pkt.id, %err, "不可达，丢弃");
                self.counters.undeliverable += 1;
                ctx.stats.undeliverable_pkts += 1;
                Err(err)
            }
        }
    }
}
