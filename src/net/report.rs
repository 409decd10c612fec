//! 运行结束后的汇总
//!
//! 只读取 Network 的检查接口，派生统计（平均队长、满队列占比）在这里计算，不进入 tick 循环。

use serde::Serialize;

use super::id::NodeId;
use super::network::Network;
use super::node::{Position, Role};
use super::stats::{NodeCounters, Stats};

#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub name: String,
    pub role: Role,
    pub position: Position,
    pub queued_tcp: usize,
    pub queued_udp: usize,
    pub counters: NodeCounters,
    /// 仅路由器：RED 平均队长
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_avg: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub ticks: u64,
    pub stats: Stats,
    pub dropped_pkts: u64,
    pub in_flight_pkts: usize,
    /// 路由器现存队列的平均长度
    pub avg_router_queue_len: f64,
    /// 路由器现存队列中已满队列的占比
    pub full_router_queue_fraction: f64,
    pub nodes: Vec<NodeSummary>,
}

impl Summary {
    pub fn from_network(net: &Network) -> Self {
        let nodes = net
            .nodes()
            .iter()
            .map(|n| NodeSummary {
                id: n.id(),
                name: n.name().to_string(),
                role: n.role(),
                position: n.position(),
                queued_tcp: n.queues().tcp_len(),
                queued_udp: n.queues().udp_len(),
                counters: n.counters().clone(),
                red_avg: n.as_router().map(|r| r.red().avg_queue_size()),
            })
            .collect();

        let mut queues = 0usize;
        let mut total_len = 0usize;
        let mut full = 0usize;
        for r in net.router_ids().iter().filter_map(|&id| net.router(id)) {
            for q in r.queues().queues() {
                queues += 1;
                total_len += q.len();
                if q.is_full() {
                    full += 1;
                }
            }
        }
        let (avg, frac) = if queues == 0 {
            (0.0, 0.0)
        } else {
            (
                total_len as f64 / queues as f64,
                full as f64 / queues as f64,
            )
        };

        Self {
            ticks: net.now().0,
            stats: net.stats().clone(),
            dropped_pkts: net.stats().dropped_pkts(),
            in_flight_pkts: net.in_flight_count(),
            avg_router_queue_len: avg,
            full_router_queue_fraction: frac,
            nodes,
        }
    }

    /// 单行文本摘要
    pub fn line(&self) -> String {
        format!(
            "summary ticks={} generated={} sent={} forwarded={} delivered={} dropped_overflow={} dropped_red={} undeliverable={} in_flight={} avg_q={:.3} full_q={:.3}",
            self.ticks,
            self.stats.generated_pkts,
            self.stats.sent_pkts,
            self.stats.forwarded_pkts,
            self.stats.delivered_pkts,
            self.stats.dropped_overflow,
            self.stats.dropped_red,
            self.stats.undeliverable_pkts,
            self.in_flight_pkts,
            self.avg_router_queue_len,
            self.full_router_queue_fraction,
        )
    }
}
