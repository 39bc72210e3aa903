//! 骨骼数据模型
//!
//! - SpringBoneData: 单根弹簧骨骼的记录（静止参数 + 运行时端点对）
//! - SpringChain: 从根到梢的有序骨骼链，保证父先子后的更新顺序

mod chain;
mod spring_bone;

pub use chain::SpringChain;
pub use spring_bone::{BoneParams, BoneSnapshot, SpringBoneData};
