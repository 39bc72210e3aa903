//! 球形碰撞体
//!
//! 每个碰撞体只有世界球心和半径，每帧从所属变换刷新一次球心。
//! 不与任何骨骼建立关联：碰撞检测是全配对的，任意骨骼末端都会
//! 依注册顺序测试所有活动碰撞体。
//!
//! 碰撞体必须先于骨骼更新，顺序由显式两阶段保证：
//! `SpringWorld::refresh_colliders` 必须先于 `step_chains`。

use glam::Vec3;

use crate::pose::{PoseId, PoseProvider};

// ============================================================================
// 碰撞体记录
// ============================================================================

/// 碰撞体记录
///
/// radius <= 0 视为未激活，碰撞测试时静默跳过。
#[derive(Clone, Copy, Debug)]
pub struct ColliderData {
    /// 碰撞半径（可逐帧改动）
    pub radius: f32,
    /// 世界球心（每帧刷新）
    pub global_position: Vec3,
}

/// 碰撞体句柄（注册时返回，用于改半径 / 注销）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub(crate) usize);

// ============================================================================
// 碰撞体集合
// ============================================================================

/// 碰撞体集合
///
/// 保持注册顺序（贪心顺序碰撞解算依赖此顺序）；注销留空洞，
/// 保证已发出的句柄不失效。
#[derive(Debug, Default)]
pub struct ColliderSet {
    entries: Vec<Option<(PoseId, ColliderData)>>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// 注册碰撞体，返回句柄
    pub fn register(&mut self, pose: PoseId, radius: f32) -> ColliderHandle {
        let handle = ColliderHandle(self.entries.len());
        self.entries.push(Some((
            pose,
            ColliderData {
                radius,
                global_position: Vec3::ZERO,
            },
        )));
        handle
    }

    /// 注销碰撞体
    pub fn deregister(&mut self, handle: ColliderHandle) {
        if let Some(entry) = self.entries.get_mut(handle.0) {
            *entry = None;
        }
    }

    /// 改半径（可逐帧调用，零/负值使碰撞体休眠）
    pub fn set_radius(&mut self, handle: ColliderHandle, radius: f32) {
        if let Some(Some((_, data))) = self.entries.get_mut(handle.0) {
            data.radius = radius;
        }
    }

    /// 每帧刷新所有球心（阶段 A）
    ///
    /// 所属变换本帧不可用时保留上一帧球心，仅告警。
    pub fn refresh(&mut self, provider: &impl PoseProvider) {
        for entry in self.entries.iter_mut().flatten() {
            let (pose, data) = (entry.0, &mut entry.1);
            match provider.world_pose(pose) {
                Some(world) => data.global_position = world.translation,
                None => {
                    log::warn!("collider pose {pose:?} unavailable, keeping stale center");
                }
            }
        }
    }

    /// 按注册顺序遍历存活碰撞体（含休眠的，半径过滤在碰撞测试处）
    pub fn iter(&self) -> impl Iterator<Item = &ColliderData> {
        self.entries.iter().flatten().map(|(_, data)| data)
    }

    /// 存活碰撞体数量
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::WorldPose;

    struct FixedProvider(Vec3);

    impl PoseProvider for FixedProvider {
        fn world_pose(&self, _id: PoseId) -> Option<WorldPose> {
            Some(WorldPose {
                translation: self.0,
                ..WorldPose::default()
            })
        }
    }

    #[test]
    fn test_refresh_updates_centers() {
        let mut set = ColliderSet::new();
        let h = set.register(PoseId(7), 0.5);

        set.refresh(&FixedProvider(Vec3::new(1.0, 2.0, 3.0)));
        let data: Vec<_> = set.iter().collect();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].global_position, Vec3::new(1.0, 2.0, 3.0));

        // 半径改动逐帧可见
        set.set_radius(h, 0.0);
        assert_eq!(set.iter().next().unwrap().radius, 0.0);
    }

    #[test]
    fn test_deregister_keeps_order_and_handles() {
        let mut set = ColliderSet::new();
        let a = set.register(PoseId(1), 0.1);
        let b = set.register(PoseId(2), 0.2);
        let c = set.register(PoseId(3), 0.3);

        set.deregister(b);
        assert_eq!(set.len(), 2);

        // 剩余碰撞体保持注册顺序
        let radii: Vec<f32> = set.iter().map(|d| d.radius).collect();
        assert_eq!(radii, vec![0.1, 0.3]);

        // 其余句柄不受注销影响
        set.set_radius(a, 0.4);
        set.set_radius(c, 0.6);
        let radii: Vec<f32> = set.iter().map(|d| d.radius).collect();
        assert_eq!(radii, vec![0.4, 0.6]);
    }
}
