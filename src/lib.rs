//! Spring Engine - 骨骼链二次运动（Jiggle 物理）引擎
//!
//! 为附着在骨架上的骨骼链（头发、飘带、尾巴等）提供次级运动模拟：
//! - 骨骼末端视为质点，Verlet 风格积分（位置历史即速度）
//! - 刚性长度约束（每次位移后重投影）
//! - 刚度力拉回静止姿态，阻尼衰减惯性，外力（风等）叠加
//! - 球形碰撞体贪心顺序排斥
//!
//! 每帧两阶段：先 `refresh_colliders` 刷新碰撞体，再 `step_chains`
//! 按父先子后顺序更新每条链。独立链之间数据并行。

pub mod bone;
pub mod collider;
pub mod config;
pub mod pose;
pub mod simulation;

pub use bone::{BoneParams, BoneSnapshot, SpringBoneData, SpringChain};
pub use collider::{ColliderData, ColliderHandle, ColliderSet};
pub use config::{get_config, reset_config, set_config, SpringConfig};
pub use pose::{PoseId, PoseProvider, WorldPose};
pub use simulation::{ChainHandle, SpringWorld};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpringError {
    /// 骨骼没有末端锚点（子节点），无法确定弹簧长度
    #[error("bone '{0}' has no tip child anchor")]
    MissingTipChild(String),

    /// 链输入不合法
    #[error("invalid chain: {0}")]
    InvalidChain(String),
}

pub type Result<T> = std::result::Result<T, SpringError>;
