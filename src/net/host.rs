//! 主机（流量源）
//!
//! ON/OFF 状态机：进入某状态时从 Pareto(1, α) 抽取驻留时长，每个 tick 递减，
//! 减到 0 才切换状态并重新抽取。ON 状态下每个 tick 生成恰好一个包。

use rand_distr::Pareto;
use serde::Serialize;
use tracing::{debug, trace};

use super::id::{LinkId, NodeId};
use super::link::Link;
use super::node::{DropCause, Position, Reception, TickCtx};
use super::packet::{Packet, Protocol, Transport};
use super::stats::NodeCounters;
use crate::error::ConfigError;
use crate::queue::FlowQueues;
use crate::sim::{SimRng, Tick};

/// 流量状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficState {
    On,
    Off,
}

/// 主机的流量参数
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub alpha_on: f64,
    pub alpha_off: f64,
    pub initial_cwnd: u64,
    pub protocols: Vec<Protocol>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            alpha_on: 1.5,
            alpha_off: 1.5,
            initial_cwnd: 1,
            protocols: vec![Protocol::Tcp, Protocol::Udp],
        }
    }
}

/// Pareto 调制的 ON/OFF 过程
#[derive(Debug, Clone)]
pub struct OnOff {
    state: TrafficState,
    remaining: u64,
    on: Pareto<f64>,
    off: Pareto<f64>,
}

impl OnOff {
    /// 以 OFF 状态启动，并抽取第一段驻留时长。
    pub fn new(
        host: NodeId,
        alpha_on: f64,
        alpha_off: f64,
        rng: &mut SimRng,
    ) -> Result<Self, ConfigError> {
        let on = Self::dist(host, alpha_on)?;
        let off = Self::dist(host, alpha_off)?;
        let remaining = Self::draw(&off, rng);
        Ok(Self {
            state: TrafficState::Off,
            remaining,
            on,
            off,
        })
    }

    fn dist(host: NodeId, alpha: f64) -> Result<Pareto<f64>, ConfigError> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ConfigError::InvalidAlpha { host, alpha });
        }
        Pareto::new(1.0, alpha).map_err(|_| ConfigError::InvalidAlpha { host, alpha })
    }

    /// 驻留时长取整到 tick，至少 1
    fn draw(dist: &Pareto<f64>, rng: &mut SimRng) -> u64 {
        let d: f64 = rng.sample(dist);
        // 重尾样本可能极大，`as` 转换会饱和到 u64::MAX
        (d.ceil() as u64).max(1)
    }

    pub fn state(&self) -> TrafficState {
        self.state
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// 推进一个 tick；发生切换时返回新状态。
    pub fn update(&mut self, rng: &mut SimRng) -> Option<TrafficState> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return None;
        }
        let (next, dist) = match self.state {
            TrafficState::On => (TrafficState::Off, &self.off),
            TrafficState::Off => (TrafficState::On, &self.on),
        };
        self.remaining = Self::draw(dist, rng);
        self.state = next;
        Some(next)
    }
}

/// 主机节点
#[derive(Debug, Clone)]
pub struct Host {
    id: NodeId,
    name: String,
    pub(crate) pos: Position,
    traffic: OnOff,
    queues: FlowQueues,
    egress: LinkId,
    cwnd: u64,
    protocols: Vec<Protocol>,
    /// (到达 tick, 包)
    received: Vec<(Tick, Packet)>,
    pub(crate) counters: NodeCounters,
}

impl Host {
    pub(crate) fn new(
        id: NodeId,
        name: String,
        pos: Position,
        cfg: &HostConfig,
        egress: LinkId,
        rng: &mut SimRng,
    ) -> Result<Self, ConfigError> {
        if cfg.protocols.is_empty() {
            return Err(ConfigError::NoProtocols);
        }
        Ok(Self {
            id,
            name,
            pos,
            traffic: OnOff::new(id, cfg.alpha_on, cfg.alpha_off, rng)?,
            queues: FlowQueues::new(None),
            egress,
            cwnd: cfg.initial_cwnd,
            protocols: cfg.protocols.clone(),
            received: Vec::new(),
            counters: NodeCounters::default(),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> TrafficState {
        self.traffic.state()
    }

    pub fn traffic(&self) -> &OnOff {
        &self.traffic
    }

    pub fn queues(&self) -> &FlowQueues {
        &self.queues
    }

    pub fn egress(&self) -> LinkId {
        self.egress
    }

    /// 剩余的 TCP 发送预算
    pub fn cwnd(&self) -> u64 {
        self.cwnd
    }

    pub fn received(&self) -> &[(Tick, Packet)] {
        &self.received
    }

    pub fn counters(&self) -> &NodeCounters {
        &self.counters
    }

    /// 相位 1a：状态机更新
    pub(crate) fn update_state(&mut self, rng: &mut SimRng) {
        if let Some(next) = self.traffic.update(rng) {
            trace!(host = ?self.id, state = ?next, remaining = self.traffic.remaining(), "🔁 切换流量状态");
        }
    }

    /// 相位 1b：ON 状态下生成一个包，目的地在全部主机中均匀选取（可以是自己）。
    pub(crate) fn generate(&mut self, hosts: &[NodeId], ctx: &mut TickCtx<'_>) -> Option<u64> {
        if self.traffic.state() != TrafficState::On || hosts.is_empty() {
            return None;
        }
        let dst = hosts[ctx.rng.index(hosts.len())];
        let proto = self.protocols[ctx.rng.index(self.protocols.len())];
        Some(self.enqueue(proto, dst, ctx))
    }

    /// 构造一个新包并放入对应的出口队列，返回包 id。
    pub(crate) fn enqueue(&mut self, proto: Protocol, dst: NodeId, ctx: &mut TickCtx<'_>) -> u64 {
        let id = ctx.stats.generated_pkts;
        ctx.stats.generated_pkts += 1;
        self.counters.generated += 1;

        let transport = match proto {
            Protocol::Tcp => Transport::Tcp {
                seq: self.queues.len_for(Protocol::Tcp, dst) as u64,
                ack: false,
            },
            Protocol::Udp => Transport::Udp,
        };
        let pkt = Packet {
            id,
            src: self.id,
            dst,
            transport,
            created_at: ctx.now,
        };
        trace!(host = ?self.id, pkt_id = id, dst = ?dst, proto = %proto, "📦 生成数据包");

        // 主机出口队列不设上限
        if let Err(pkt) = self.queues.enqueue(pkt) {
            debug!(host = ?self.id, pkt_id = pkt.id, "主机出口队列已满，丢弃");
            self.counters.dropped_overflow += 1;
            ctx.stats.dropped_overflow += 1;
        }
        id
    }

    /// 相位 2：随机选择 TCP/UDP 类别，最多向出口链路注入一个包。
    pub(crate) fn send_egress(&mut self, links: &mut [Link], ctx: &mut TickCtx<'_>) -> Option<u64> {
        let class = if ctx.rng.coin() {
            Protocol::Tcp
        } else {
            Protocol::Udp
        };
        if class == Protocol::Tcp && (self.cwnd == 0 || !self.queues.has_tcp()) {
            return None;
        }
        let pkt = self.queues.dequeue_class(class, ctx.rng)?;
        if class == Protocol::Tcp {
            self.cwnd -= 1;
        }

        let pkt_id = pkt.id;
        let link = &mut links[self.egress.0];
        trace!(host = ?self.id, pkt_id, link = ?link.id, to = ?link.to, "🚀 注入出口链路");
        link.push(pkt);
        self.counters.sent += 1;
        ctx.stats.sent_pkts += 1;
        Some(pkt_id)
    }

    /// 链路交付：记录收到的包，不做任何协议处理（不回 ACK）。
    pub(crate) fn receive(&mut self, pkt: Packet, ctx: &mut TickCtx<'_>) -> Reception {
        if pkt.dst != self.id {
            debug!(host = ?self.id, pkt_id = pkt.id, dst = ?pkt.dst, "包不属于本主机，丢弃");
            self.counters.undeliverable += 1;
            ctx.stats.undeliverable_pkts += 1;
            return Reception::Dropped(DropCause::Undeliverable);
        }
        trace!(host = ?self.id, pkt_id = pkt.id, src = ?pkt.src, "✅ 数据包送达目的地");
        self.counters.received += 1;
        ctx.stats.delivered_pkts += 1;
        self.received.push((ctx.now, pkt));
        Reception::Delivered
    }
}
