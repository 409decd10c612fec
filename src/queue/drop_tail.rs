//! DropTail（尾丢弃）队列
//!
//! 按包计数的 FIFO；容量为 `None` 时不设上限（主机出口队列）。

use std::collections::VecDeque;

use crate::net::Packet;

#[derive(Debug, Clone, Default)]
pub struct DropTailQueue {
    max_pkts: Option<usize>,
    q: VecDeque<Packet>,
}

impl DropTailQueue {
    pub fn new(max_pkts: Option<usize>) -> Self {
        Self {
            max_pkts,
            q: VecDeque::new(),
        }
    }

    /// 入队：成功返回 Ok；队列已满则返回 Err(pkt)
    pub fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet> {
        if self.is_full() {
            return Err(pkt);
        }
        self.q.push_back(pkt);
        Ok(())
    }

    pub fn dequeue(&mut self) -> Option<Packet> {
        self.q.pop_front()
    }

    pub fn is_full(&self) -> bool {
        self.max_pkts.is_some_and(|cap| self.q.len() >= cap)
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn capacity_pkts(&self) -> Option<usize> {
        self.max_pkts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.q.iter()
    }
}
