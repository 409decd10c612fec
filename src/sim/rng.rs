//! 可注入、可复现的随机源
//!
//! 网络中所有随机抽样（Pareto 驻留时长、协议选择、目的地选择、RED 伯努利判决）
//! 都从同一个 `SimRng` 消费，不使用线程本地的全局 RNG。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;

#[derive(Debug, Clone)]
pub struct SimRng {
    inner: StdRng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// 公平硬币
    pub fn coin(&mut self) -> bool {
        self.inner.gen_bool(0.5)
    }

    /// 以概率 `p` 返回 true；`p <= 0` 时不消费随机数。
    pub fn bernoulli(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        self.inner.gen_bool(p.min(1.0))
    }

    /// `[0, n)` 上的均匀下标；调用方保证 `n > 0`。
    pub fn index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        self.inner.gen_range(0..n)
    }

    /// `[lo, hi]` 上的均匀整数
    pub fn range_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        self.inner.gen_range(lo..=hi)
    }

    /// `[lo, hi)` 上的均匀浮点数
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        self.inner.gen_range(lo..hi)
    }

    pub fn sample<T, D: Distribution<T>>(&mut self, dist: &D) -> T {
        dist.sample(&mut self.inner)
    }
}
