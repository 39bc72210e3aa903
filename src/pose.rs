//! 姿态查询接口
//!
//! 引擎不拥有也不遍历场景图，只通过 `PoseProvider` 按标识查询世界姿态。
//! 链根骨骼的外部父节点和碰撞体的所属变换都经由此接口读取。

use glam::{Mat4, Quat, Vec3};

/// 外部姿态标识（宿主场景图中的变换句柄，引擎视为不透明）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoseId(pub u64);

/// 世界空间姿态
#[derive(Clone, Copy, Debug)]
pub struct WorldPose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for WorldPose {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl WorldPose {
    /// 转换为 4x4 矩阵
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// 从矩阵分解
    #[inline]
    pub fn from_matrix(m: Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self { translation, rotation, scale }
    }
}

/// 姿态提供者
///
/// 每帧由宿主保证返回当前世界姿态。返回 `None` 表示该变换本帧不可用，
/// 调用方就地恢复（保持上一帧状态），不会中断整帧。
///
/// 阶段 B 中多条链会并发查询，实现必须可跨线程共享（`Sync`）。
pub trait PoseProvider: Sync {
    fn world_pose(&self, id: PoseId) -> Option<WorldPose>;
}
