//! 仿真时间类型
//!
//! 离散时间：每个 tick 按固定相位顺序推进一次整个网络。

use serde::Serialize;

/// 仿真时间（tick 数）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// 下一个 tick（饱和）
    pub fn next(self) -> Tick {
        Tick(self.0.saturating_add(1))
    }
}
