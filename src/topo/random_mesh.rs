//! 随机平面拓扑
//!
//! 主机与路由器在 10x10 平面上均匀随机放置；每台主机与最近的路由器双向相连，
//! 路由器之间两两有向全连接。所有链路时延在 `[delay_min, delay_max]` 中均匀抽取。

use tracing::debug;

use crate::error::ConfigError;
use crate::net::{HostConfig, LinkId, Network, NetworkBuilder, NodeId, Position};
use crate::sim::{SimConfig, SimRng};

/// 平面边长
pub const PLANE_SIZE: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct MeshTopology {
    pub hosts: Vec<NodeId>,
    pub routers: Vec<NodeId>,
    /// 与 `hosts` 一一对应的出口链路
    pub egress: Vec<LinkId>,
    /// 与 `hosts` 一一对应的最近路由器
    pub nearest: Vec<NodeId>,
}

fn random_position(rng: &mut SimRng) -> Position {
    Position::new(rng.uniform(0.0, PLANE_SIZE), rng.uniform(0.0, PLANE_SIZE))
}

/// 按配置构建随机拓扑；所有抽样消费 `rng`。
pub fn build_random_mesh(
    b: &mut NetworkBuilder,
    cfg: &SimConfig,
    rng: &mut SimRng,
) -> Result<MeshTopology, ConfigError> {
    cfg.validate()?;
    let host_cfg = HostConfig {
        alpha_on: cfg.alpha_on,
        alpha_off: cfg.alpha_off,
        initial_cwnd: cfg.initial_cwnd,
        protocols: cfg.parsed_protocols()?,
    };

    let mut hosts = Vec::with_capacity(cfg.hosts);
    for i in 0..cfg.hosts {
        let pos = random_position(rng);
        hosts.push((b.add_host(format!("h{i}"), pos, host_cfg.clone()), pos));
    }
    let mut routers = Vec::with_capacity(cfg.routers);
    for i in 0..cfg.routers {
        let pos = random_position(rng);
        routers.push((b.add_router(format!("r{i}"), pos, cfg.buffer_size), pos));
    }

    let mut egress = Vec::with_capacity(hosts.len());
    let mut nearest = Vec::with_capacity(hosts.len());
    for &(h, hpos) in &hosts {
        let (r, _) = routers
            .iter()
            .min_by(|(_, p), (_, q)| hpos.dist2(p).total_cmp(&hpos.dist2(q)))
            .copied()
            .ok_or(ConfigError::NoRouters)?;
        let delay = rng.range_inclusive(cfg.delay_min, cfg.delay_max);
        let up = b.connect(h, r, delay);
        b.connect(r, h, delay);
        b.set_egress(h, up);
        debug!(host = ?h, router = ?r, delay, "主机接入最近路由器");
        egress.push(up);
        nearest.push(r);
    }

    for &(r1, _) in &routers {
        for &(r2, _) in &routers {
            if r1 == r2 {
                continue;
            }
            let delay = rng.range_inclusive(cfg.delay_min, cfg.delay_max);
            b.connect(r1, r2, delay);
        }
    }

    Ok(MeshTopology {
        hosts: hosts.into_iter().map(|(id, _)| id).collect(),
        routers: routers.into_iter().map(|(id, _)| id).collect(),
        egress,
        nearest,
    })
}

/// 由配置直接得到可运行的网络：拓扑抽样与仿真共享同一个以 `cfg.seed` 播种的随机源。
pub fn network_from_config(cfg: &SimConfig) -> Result<(Network, MeshTopology), ConfigError> {
    let mut rng = SimRng::new(cfg.seed);
    let mut b = NetworkBuilder::default();
    let topo = build_random_mesh(&mut b, cfg, &mut rng)?;
    let net = b.build_with_rng(cfg.red, rng)?;
    Ok((net, topo))
}
