//! 链路目录
//!
//! 不是路由协议：只维护 (from, to) -> 链路 的边表，以及 to -> 所有入链路 的索引。
//! 选下一跳时优先直连；否则找一条进入目的节点的链路，取其起点作为网关，
//! 再查一次本节点到网关的链路。构建后在仿真期间只读。

use std::collections::HashMap;

use super::id::{LinkId, NodeId};
use super::link::Link;
use crate::error::RouteError;

#[derive(Debug, Default, Clone)]
pub struct LinkDirectory {
    edges: HashMap<(NodeId, NodeId), LinkId>,
    /// to -> 所有以 `to` 为终点的链路（按链路 id 升序）
    inbound: HashMap<NodeId, Vec<(LinkId, NodeId)>>,
}

impl LinkDirectory {
    pub fn build(links: &[Link]) -> Self {
        let mut dir = Self::default();
        for link in links {
            // 重复的 (from, to) 以先出现者为准
            dir.edges.entry((link.from, link.to)).or_insert(link.id);
            dir.inbound
                .entry(link.to)
                .or_default()
                .push((link.id, link.from));
        }
        dir
    }

    /// 直连链路
    pub fn link_between(&self, from: NodeId, to: NodeId) -> Option<LinkId> {
        self.edges.get(&(from, to)).copied()
    }

    /// 所有以 `to` 为终点的链路
    pub fn links_into(&self, to: NodeId) -> impl Iterator<Item = LinkId> + '_ {
        self.inbound
            .get(&to)
            .into_iter()
            .flat_map(|v| v.iter().map(|(id, _)| *id))
    }

    /// 解析 `from` 朝 `dst` 的出链路。
    pub fn next_hop(&self, from: NodeId, dst: NodeId) -> Result<LinkId, RouteError> {
        if let Some(id) = self.link_between(from, dst) {
            return Ok(id);
        }
        self.inbound
            .get(&dst)
            .into_iter()
            .flatten()
            .filter(|(_, gateway)| *gateway != from)
            .find_map(|(_, gateway)| self.link_between(from, *gateway))
            .ok_or(RouteError::NoNextHop { from, dst })
    }
}
