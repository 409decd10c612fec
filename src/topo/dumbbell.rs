//! Dumbbell 拓扑构建

use crate::net::{HostConfig, LinkId, NetworkBuilder, NodeId, Position};

/// Dumbbell 拓扑配置选项
#[derive(Debug, Clone)]
pub struct DumbbellOpts {
    /// 每侧主机数
    pub hosts_per_side: usize,
    pub buffer_size: usize,
    /// 主机 <-> 路由器链路时延（tick）
    pub access_delay: u32,
    /// 路由器 <-> 路由器链路时延（tick）
    pub core_delay: u32,
    pub host: HostConfig,
}

impl Default for DumbbellOpts {
    fn default() -> Self {
        Self {
            hosts_per_side: 1,
            buffer_size: 10,
            access_delay: 1,
            core_delay: 1,
            host: HostConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DumbbellTopology {
    pub left_hosts: Vec<NodeId>,
    pub right_hosts: Vec<NodeId>,
    pub r0: NodeId,
    pub r1: NodeId,
    /// 每台主机（左侧在前）的出口链路
    pub egress: Vec<LinkId>,
}

/// 构建 dumbbell 拓扑
///
/// 拓扑结构：左侧主机 <-> r0 <-> r1 <-> 右侧主机
pub fn build_dumbbell(b: &mut NetworkBuilder, opts: &DumbbellOpts) -> DumbbellTopology {
    let n = opts.hosts_per_side;
    let left_hosts: Vec<NodeId> = (0..n)
        .map(|i| b.add_host(format!("hl{i}"), Position::new(0.0, i as f64), opts.host.clone()))
        .collect();
    let right_hosts: Vec<NodeId> = (0..n)
        .map(|i| b.add_host(format!("hr{i}"), Position::new(10.0, i as f64), opts.host.clone()))
        .collect();
    let r0 = b.add_router("r0", Position::new(3.0, 0.0), opts.buffer_size);
    let r1 = b.add_router("r1", Position::new(7.0, 0.0), opts.buffer_size);

    let mut egress = Vec::with_capacity(2 * n);
    for (hosts, r) in [(&left_hosts, r0), (&right_hosts, r1)] {
        for &h in hosts {
            let up = b.connect(h, r, opts.access_delay);
            b.connect(r, h, opts.access_delay);
            b.set_egress(h, up);
            egress.push(up);
        }
    }
    // r0 <-> r1
    b.connect(r0, r1, opts.core_delay);
    b.connect(r1, r0, opts.core_delay);

    DumbbellTopology {
        left_hosts,
        right_hosts,
        r0,
        r1,
        egress,
    }
}
