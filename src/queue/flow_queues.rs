//! 按目的地分流的 TCP 队列 + 共享 UDP 队列
//!
//! TCP 队列以目的节点 id 为键，首次使用时创建、清空后立即移除；
//! 使用 `BTreeMap` 保证随机挑选队列时的遍历顺序与运行无关。

use std::collections::BTreeMap;

use crate::net::{NodeId, Packet, Protocol};
use crate::sim::SimRng;

use super::DropTailQueue;

#[derive(Debug, Clone, Default)]
pub struct FlowQueues {
    /// 单条队列容量；`None` 表示不设上限
    cap: Option<usize>,
    tcp: BTreeMap<NodeId, DropTailQueue>,
    udp: DropTailQueue,
}

impl FlowQueues {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            cap,
            tcp: BTreeMap::new(),
            udp: DropTailQueue::new(cap),
        }
    }

    pub fn capacity_pkts(&self) -> Option<usize> {
        self.cap
    }

    /// 某个包将进入的那条队列的当前长度（队列不存在时为 0）
    pub fn len_for(&self, proto: Protocol, dst: NodeId) -> usize {
        match proto {
            Protocol::Tcp => self.tcp.get(&dst).map_or(0, DropTailQueue::len),
            Protocol::Udp => self.udp.len(),
        }
    }

    /// 入队到包所属的队列；队列已满返回 Err(pkt)，且不会留下空的 TCP 队列。
    pub fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet> {
        match pkt.protocol() {
            Protocol::Tcp => {
                if self.cap.is_some_and(|cap| self.len_for(Protocol::Tcp, pkt.dst) >= cap) {
                    return Err(pkt);
                }
                let cap = self.cap;
                self.tcp
                    .entry(pkt.dst)
                    .or_insert_with(|| DropTailQueue::new(cap))
                    .enqueue(pkt)
            }
            Protocol::Udp => self.udp.enqueue(pkt),
        }
    }

    /// 从指定类别出队。TCP 类别在非空队列中均匀随机挑一条。
    pub fn dequeue_class(&mut self, class: Protocol, rng: &mut SimRng) -> Option<Packet> {
        match class {
            Protocol::Tcp => {
                if self.tcp.is_empty() {
                    return None;
                }
                let idx = rng.index(self.tcp.len());
                let key = *self.tcp.keys().nth(idx)?;
                let q = self.tcp.get_mut(&key)?;
                let pkt = q.dequeue();
                if q.is_empty() {
                    self.tcp.remove(&key);
                }
                pkt
            }
            Protocol::Udp => self.udp.dequeue(),
        }
    }

    pub fn has_tcp(&self) -> bool {
        !self.tcp.is_empty()
    }

    pub fn tcp_len(&self) -> usize {
        self.tcp.values().map(DropTailQueue::len).sum()
    }

    pub fn udp_len(&self) -> usize {
        self.udp.len()
    }

    pub fn total_len(&self) -> usize {
        self.tcp_len() + self.udp_len()
    }

    pub fn tcp_queue(&self, dst: NodeId) -> Option<&DropTailQueue> {
        self.tcp.get(&dst)
    }

    pub fn udp_queue(&self) -> &DropTailQueue {
        &self.udp
    }

    /// 所有现存队列：先按目的地排序的 TCP 队列，最后是 UDP 队列
    pub fn queues(&self) -> impl Iterator<Item = &DropTailQueue> {
        self.tcp.values().chain(std::iter::once(&self.udp))
    }
}
