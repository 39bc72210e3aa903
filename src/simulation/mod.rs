//! 模拟步进
//!
//! - step: 单骨骼 Verlet 积分 + 碰撞解算（核心算法）
//! - scheduler: 两阶段调度器 SpringWorld（碰撞刷新 → 链步进）

mod scheduler;
mod step;

pub use scheduler::{ChainHandle, SpringWorld};
pub use step::{step_bone, step_chain};
