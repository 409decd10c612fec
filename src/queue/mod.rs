//! 队列策略（Queue disciplines）
//!
//! 节点侧的缓冲：尾丢弃 FIFO、按目的地分流的队列组，以及 RED 准入控制。

mod drop_tail;
mod flow_queues;
mod red;

pub use drop_tail::DropTailQueue;
pub use flow_queues::FlowQueues;
pub use red::{Red, RedConfig, RedVerdict};
