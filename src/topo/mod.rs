//! 拓扑构建
//!
//! 产出 `NetworkBuilder`；仿真核心只消费构建好的图。

pub mod dumbbell;
pub mod random_mesh;
