//! 仿真核心模块
//!
//! 离散时间、随机源与运行配置。

// 子模块声明
mod config;
mod rng;
mod time;

// 重新导出公共接口
pub use config::SimConfig;
pub use rng::SimRng;
pub use time::Tick;
