//! 链路类型
//!
//! 单向、固定传播时延的链路。倒计时到 0 的那个 tick 才允许交付一个包，
//! 随后立即重置为时延 D；在途队列本身不限长度，发送方快于 D 时会积压。

use std::collections::VecDeque;

use super::id::{LinkId, NodeId};
use super::packet::Packet;

#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub from: NodeId,
    pub to: NodeId,
    delay: u32,
    countdown: u32,
    in_flight: VecDeque<Packet>,
    delivered: u64,
}

impl Link {
    /// 创建新链路；倒计时初值为 `delay`
    pub fn new(id: LinkId, from: NodeId, to: NodeId, delay: u32) -> Self {
        Self {
            id,
            from,
            to,
            delay,
            countdown: delay,
            in_flight: VecDeque::new(),
            delivered: 0,
        }
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// 发送方把包放上链路
    pub fn push(&mut self, pkt: Packet) {
        self.in_flight.push_back(pkt);
    }

    /// 推进一个 tick；到期时最多交付一个包。
    pub fn advance(&mut self) -> Option<Packet> {
        if self.countdown > 0 {
            self.countdown -= 1;
            return None;
        }
        self.countdown = self.delay;
        let pkt = self.in_flight.pop_front()?;
        self.delivered = self.delivered.saturating_add(1);
        Some(pkt)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &Packet> {
        self.in_flight.iter()
    }

    /// 累计交付数
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}
