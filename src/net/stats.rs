//! 统计信息
//!
//! 由 Network 持有并在各自的相位内更新，不使用全局计数器。

use serde::Serialize;

/// 网络级累计计数
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// 主机生成（入出口队列）的包数
    pub generated_pkts: u64,
    /// 主机注入出口链路的包数
    pub sent_pkts: u64,
    /// 路由器注入出链路的包数
    pub forwarded_pkts: u64,
    /// 到达最终目的主机的包数
    pub delivered_pkts: u64,
    /// 队列满导致的丢包
    pub dropped_overflow: u64,
    /// RED 判决导致的丢包
    pub dropped_red: u64,
    /// 找不到下一跳而丢弃的包
    pub undeliverable_pkts: u64,
}

impl Stats {
    /// 所有原因的丢包之和
    pub fn dropped_pkts(&self) -> u64 {
        self.dropped_overflow
            .saturating_add(self.dropped_red)
            .saturating_add(self.undeliverable_pkts)
    }
}

/// 单节点累计计数
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct NodeCounters {
    pub generated: u64,
    pub sent: u64,
    pub received: u64,
    pub dropped_overflow: u64,
    pub dropped_red: u64,
    pub undeliverable: u64,
}
