//! 网络拓扑管理与 tick 调度
//!
//! `NetworkBuilder` 接收外部已经构建好的节点/链路图并在构建时做全部校验；
//! `Network` 持有所有实体、RED 实例、随机源与统计，按固定相位顺序推进时间：
//! 1. 每台主机：状态机更新，然后生成
//! 2. 每台主机：出口发送一个包
//! 3. 每台路由器：出口转发一个包
//! 4. 每条链路：倒计时推进，到期交付给目的节点
//!
//! 这一顺序保证一个包在同一 tick 内最多经过一条链路。

use std::collections::HashMap;

use tracing::{debug, info};

use super::directory::LinkDirectory;
use super::host::{Host, HostConfig};
use super::id::{LinkId, NodeId};
use super::link::Link;
use super::node::{Node, Position, Role, TickCtx};
use super::packet::Protocol;
use super::router::Router;
use super::stats::Stats;
use crate::error::{ConfigError, SimError};
use crate::queue::RedConfig;
use crate::sim::{SimRng, Tick};

#[derive(Debug, Clone)]
enum NodeSpec {
    Host {
        name: String,
        pos: Position,
        cfg: HostConfig,
    },
    Router {
        name: String,
        pos: Position,
        buffer_size: usize,
    },
}

/// 拓扑描述：节点、单向链路、主机出口指派
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    nodes: Vec<NodeSpec>,
    links: Vec<(NodeId, NodeId, u32)>,
    egress: HashMap<NodeId, LinkId>,
}

impl NetworkBuilder {
    /// 添加主机节点
    pub fn add_host(&mut self, name: impl Into<String>, pos: Position, cfg: HostConfig) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSpec::Host {
            name: name.into(),
            pos,
            cfg,
        });
        id
    }

    /// 添加路由器节点
    pub fn add_router(&mut self, name: impl Into<String>, pos: Position, buffer_size: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSpec::Router {
            name: name.into(),
            pos,
            buffer_size,
        });
        id
    }

    /// 连接两个节点（创建单向链路）
    pub fn connect(&mut self, from: NodeId, to: NodeId, delay: u32) -> LinkId {
        let id = LinkId(self.links.len());
        self.links.push((from, to, delay));
        id
    }

    /// 显式指定主机的出口链路；未指定时取该主机第一条通往路由器的链路。
    pub fn set_egress(&mut self, host: NodeId, link: LinkId) {
        self.egress.insert(host, link);
    }

    pub fn hosts(&self) -> impl Iterator<Item = (NodeId, Position)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            NodeSpec::Host { pos, .. } => Some((NodeId(i), *pos)),
            NodeSpec::Router { .. } => None,
        })
    }

    pub fn routers(&self) -> impl Iterator<Item = (NodeId, Position)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            NodeSpec::Router { pos, .. } => Some((NodeId(i), *pos)),
            NodeSpec::Host { .. } => None,
        })
    }

    fn role(&self, id: NodeId) -> Result<Role, ConfigError> {
        match self.nodes.get(id.0) {
            Some(NodeSpec::Host { .. }) => Ok(Role::Host),
            Some(NodeSpec::Router { .. }) => Ok(Role::Router),
            None => Err(ConfigError::UnknownNode(id)),
        }
    }

    fn resolve_egress(&self, host: NodeId) -> Result<LinkId, ConfigError> {
        if let Some(&link) = self.egress.get(&host) {
            return match self.links.get(link.0) {
                Some((from, _, _)) if *from == host => Ok(link),
                _ => Err(ConfigError::BadEgress { host, link }),
            };
        }
        self.links
            .iter()
            .enumerate()
            .find(|(_, (from, to, _))| {
                *from == host && matches!(self.nodes.get(to.0), Some(NodeSpec::Router { .. }))
            })
            .map(|(i, _)| LinkId(i))
            .ok_or(ConfigError::MissingEgress { host })
    }

    /// 用给定种子构建网络
    pub fn build(self, red: RedConfig, seed: u64) -> Result<Network, ConfigError> {
        self.build_with_rng(red, SimRng::new(seed))
    }

    /// 校验拓扑并构建网络；`rng` 随后成为网络唯一的随机源。
    pub fn build_with_rng(self, red: RedConfig, mut rng: SimRng) -> Result<Network, ConfigError> {
        red.validate()?;

        let mut hosts = Vec::new();
        let mut routers = Vec::new();
        for (i, spec) in self.nodes.iter().enumerate() {
            match spec {
                NodeSpec::Host { .. } => hosts.push(NodeId(i)),
                NodeSpec::Router { .. } => routers.push(NodeId(i)),
            }
        }
        if hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        if routers.is_empty() {
            return Err(ConfigError::NoRouters);
        }

        let mut links = Vec::with_capacity(self.links.len());
        for (i, &(from, to, delay)) in self.links.iter().enumerate() {
            let id = LinkId(i);
            self.role(from)?;
            self.role(to)?;
            if delay == 0 {
                return Err(ConfigError::ZeroDelay { link: id });
            }
            links.push(Link::new(id, from, to, delay));
        }

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (i, spec) in self.nodes.iter().enumerate() {
            let id = NodeId(i);
            let node = match spec {
                NodeSpec::Host { name, pos, cfg } => {
                    let egress = self.resolve_egress(id)?;
                    Node::Host(Host::new(id, name.clone(), *pos, cfg, egress, &mut rng)?)
                }
                NodeSpec::Router {
                    name,
                    pos,
                    buffer_size,
                } => Node::Router(Router::new(id, name.clone(), *pos, *buffer_size, red)?),
            };
            nodes.push(node);
        }

        let directory = LinkDirectory::build(&links);
        info!(
            hosts = hosts.len(),
            routers = routers.len(),
            links = links.len(),
            "🧱 网络构建完成"
        );

        Ok(Network {
            nodes,
            hosts,
            routers,
            links,
            directory,
            rng,
            now: Tick::ZERO,
            stats: Stats::default(),
        })
    }
}

/// 网络：拥有全部节点、链路、RED 实例与随机源
#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<Node>,
    hosts: Vec<NodeId>,
    routers: Vec<NodeId>,
    links: Vec<Link>,
    directory: LinkDirectory,
    rng: SimRng,
    now: Tick,
    pub stats: Stats,
}

impl Network {
    /// 当前时间（已执行的 tick 数）
    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn host(&self, id: NodeId) -> Option<&Host> {
        self.node(id).and_then(Node::as_host)
    }

    pub fn router(&self, id: NodeId) -> Option<&Router> {
        self.node(id).and_then(Node::as_router)
    }

    pub fn host_ids(&self) -> &[NodeId] {
        &self.hosts
    }

    pub fn router_ids(&self) -> &[NodeId] {
        &self.routers
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0)
    }

    pub fn directory(&self) -> &LinkDirectory {
        &self.directory
    }

    /// 仍在节点队列中的包数
    pub fn queued_count(&self) -> usize {
        self.nodes.iter().map(|n| n.queues().total_len()).sum()
    }

    /// 尚未交付也未丢弃的包数（节点队列 + 链路在途）
    pub fn in_flight_count(&self) -> usize {
        self.queued_count() + self.links.iter().map(Link::in_flight_len).sum::<usize>()
    }

    /// 从主机 `host` 注入一个去往 `dst` 的包（走与自动生成相同的入队路径），返回包 id。
    pub fn enqueue(&mut self, host: NodeId, proto: Protocol, dst: NodeId) -> Result<u64, SimError> {
        match self.nodes.get(dst.0) {
            Some(Node::Host(_)) => {}
            Some(Node::Router(_)) => return Err(SimError::NotAHost(dst)),
            None => return Err(SimError::UnknownNode(dst)),
        }
        let node = self
            .nodes
            .get_mut(host.0)
            .ok_or(SimError::UnknownNode(host))?;
        let h = node.as_host_mut().ok_or(SimError::NotAHost(host))?;
        let mut ctx = TickCtx {
            now: self.now,
            rng: &mut self.rng,
            stats: &mut self.stats,
        };
        Ok(h.enqueue(proto, dst, &mut ctx))
    }

    /// 以字符串协议标签注入；未知标签在调用处直接拒绝。
    pub fn enqueue_tagged(&mut self, host: NodeId, tag: &str, dst: NodeId) -> Result<u64, SimError> {
        let proto: Protocol = tag.parse()?;
        self.enqueue(host, proto, dst)
    }

    /// 执行一个 tick 的四个相位
    pub fn step(&mut self) {
        let now = self.now;
        {
            let Self {
                nodes,
                hosts,
                routers,
                links,
                directory,
                rng,
                stats,
                ..
            } = self;
            let hosts: &[NodeId] = hosts;
            let routers: &[NodeId] = routers;
            let mut ctx = TickCtx { now, rng, stats };

            // 1. 主机：状态机 + 生成
            for &h in hosts.iter() {
                if let Some(host) = nodes[h.0].as_host_mut() {
                    host.update_state(ctx.rng);
                    host.generate(hosts, &mut ctx);
                }
            }

            // 2. 主机出口
            for &h in hosts.iter() {
                // 主机出口固定，不会解析失败
                let _ = nodes[h.0].send_egress(links, directory, &mut ctx);
            }

            // 3. 路由器出口
            for &r in routers.iter() {
                if let Err(err) = nodes[r.0].send_egress(links, directory, &mut ctx) {
                    debug!(tick = now.0, %err, "路由器出口丢包");
                }
            }

            // 4. 链路推进与交付
            for link in links.iter_mut() {
                if let Some(pkt) = link.advance() {
                    let to = link.to;
                    nodes[to.0].receive(pkt, &mut ctx);
                }
            }
        }
        self.now = now.next();
    }

    /// 连续执行 `ticks` 个 tick
    #[tracing::instrument(skip(self), fields(start = self.now.0))]
    pub fn run(&mut self, ticks: u64) {
        info!("▶️  开始运行仿真");
        for _ in 0..ticks {
            self.step();
        }
        info!(
            now = self.now.0,
            generated = self.stats.generated_pkts,
            sent = self.stats.sent_pkts,
            delivered = self.stats.delivered_pkts,
            dropped_overflow = self.stats.dropped_overflow,
            dropped_red = self.stats.dropped_red,
            undeliverable = self.stats.undeliverable_pkts,
            "✅ 仿真完成"
        );
    }
}
