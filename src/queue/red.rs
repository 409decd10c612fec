//! RED（Random Early Detection）拥塞控制器
//!
//! 每次准入检查都用候选队列长度更新 EWMA 平均队长 `avg`，再据此给出判决：
//! - `avg < min_th`：放行
//! - `avg > max_th`：强制丢弃
//! - 其间：以 `max_p * (avg - min_th) / (max_th - min_th)` 的概率丢弃
//!
//! `max_p = 0` 关闭 RED 丢包（含强制丢弃），`avg` 仍照常更新；此时只剩溢出丢包。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::SimRng;

/// RED 参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RedConfig {
    pub min_th: f64,
    pub max_th: f64,
    pub max_p: f64,
    /// EWMA 权重 wq ∈ (0, 1]
    pub wq: f64,
}

impl Default for RedConfig {
    fn default() -> Self {
        Self {
            min_th: 1.0,
            max_th: 3.0,
            max_p: 0.0,
            wq: 0.1,
        }
    }
}

impl RedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_th.is_finite() && self.max_th.is_finite()) || self.min_th >= self.max_th {
            return Err(ConfigError::InvalidRed(format!(
                "min_th ({}) must be below max_th ({})",
                self.min_th, self.max_th
            )));
        }
        if !(0.0..=1.0).contains(&self.max_p) {
            return Err(ConfigError::InvalidRed(format!(
                "max_p ({}) must lie in [0, 1]",
                self.max_p
            )));
        }
        if !(self.wq > 0.0 && self.wq <= 1.0) {
            return Err(ConfigError::InvalidRed(format!(
                "wq ({}) must lie in (0, 1]",
                self.wq
            )));
        }
        Ok(())
    }
}

/// 一次准入检查的判决
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedVerdict {
    Admit,
    /// 处于 [min_th, max_th] 区间内的概率丢弃
    EarlyDrop,
    /// `avg > max_th` 的确定性丢弃
    ForcedDrop,
}

impl RedVerdict {
    pub fn is_drop(self) -> bool {
        !matches!(self, RedVerdict::Admit)
    }
}

#[derive(Debug, Clone)]
pub struct Red {
    cfg: RedConfig,
    avg: f64,
}

impl Red {
    pub fn new(cfg: RedConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg, avg: 0.0 })
    }

    pub fn config(&self) -> &RedConfig {
        &self.cfg
    }

    /// 当前 EWMA 平均队长
    pub fn avg_queue_size(&self) -> f64 {
        self.avg
    }

    /// 给定平均队长下的丢弃概率（不更新状态）
    pub fn drop_probability(&self, avg: f64) -> f64 {
        let RedConfig {
            min_th,
            max_th,
            max_p,
            ..
        } = self.cfg;
        if max_p == 0.0 || avg < min_th {
            0.0
        } else if avg > max_th {
            1.0
        } else {
            max_p * (avg - min_th) / (max_th - min_th)
        }
    }

    /// 用候选队列长度 `q`（入队后的长度）更新 `avg` 并给出判决。
    pub fn check(&mut self, q: usize, rng: &mut SimRng) -> RedVerdict {
        let wq = self.cfg.wq;
        self.avg = (1.0 - wq) * self.avg + wq * q as f64;

        if self.cfg.max_p == 0.0 || self.avg < self.cfg.min_th {
            RedVerdict::Admit
        } else if self.avg > self.cfg.max_th {
            RedVerdict::ForcedDrop
        } else if rng.bernoulli(self.drop_probability(self.avg)) {
            RedVerdict::EarlyDrop
        } else {
            RedVerdict::Admit
        }
    }
}
