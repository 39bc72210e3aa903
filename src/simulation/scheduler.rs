//! 两阶段调度器
//!
//! 每帧同步执行一个完整的模拟通道：
//!
//! - 阶段 A `refresh_colliders`：刷新所有碰撞体球心
//! - 阶段 B `step_chains`：全部链按父先子后更新
//!
//! 阶段 A 必须先于阶段 B（文档化前置条件，由屏障标志监督）。
//! 阶段 B 中碰撞体只读，链与链之间不共享任何状态，
//! 链数达到阈值时用 rayon 跨链并行。每个通道必须完整跑完，不存在
//! 可观察的半途状态。

use rayon::prelude::*;

use crate::bone::SpringChain;
use crate::collider::{ColliderHandle, ColliderSet};
use crate::config::get_config;
use crate::pose::{PoseId, PoseProvider};
use crate::simulation::step_chain;

/// 链句柄（注册时返回，用于移除/重置）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChainHandle(usize);

/// 弹簧骨骼世界：持有全部链与碰撞体，驱动每帧两阶段更新
#[derive(Debug, Default)]
pub struct SpringWorld {
    /// 注销留空洞，句柄不失效
    chains: Vec<Option<SpringChain>>,
    colliders: ColliderSet,
    /// 阶段屏障：上次 step 之后是否刷新过碰撞体
    colliders_refreshed: bool,
}

impl SpringWorld {
    pub fn new() -> Self {
        Self {
            chains: Vec::new(),
            colliders: ColliderSet::new(),
            colliders_refreshed: false,
        }
    }

    // ========================================
    // 注册
    // ========================================

    /// 添加骨骼链
    pub fn add_chain(&mut self, chain: SpringChain) -> ChainHandle {
        if get_config().debug_log {
            log::debug!(
                "spring world: chain added ({} bones, parent {:?})",
                chain.len(),
                chain.parent
            );
        }
        let handle = ChainHandle(self.chains.len());
        self.chains.push(Some(chain));
        handle
    }

    /// 移除骨骼链
    pub fn remove_chain(&mut self, handle: ChainHandle) -> Option<SpringChain> {
        self.chains.get_mut(handle.0).and_then(Option::take)
    }

    /// 注册碰撞体
    pub fn add_collider(&mut self, pose: PoseId, radius: f32) -> ColliderHandle {
        self.colliders.register(pose, radius)
    }

    /// 注销碰撞体
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.colliders.deregister(handle);
    }

    /// 改碰撞体半径（可逐帧调用）
    pub fn set_collider_radius(&mut self, handle: ColliderHandle, radius: f32) {
        self.colliders.set_radius(handle, radius);
    }

    // ========================================
    // 每帧两阶段
    // ========================================

    /// 阶段 A：刷新所有碰撞体球心
    ///
    /// 必须在当帧 `step_chains` 之前调用。
    pub fn refresh_colliders(&mut self, provider: &impl PoseProvider) {
        self.colliders.refresh(provider);
        self.colliders_refreshed = true;
    }

    /// 阶段 B：更新全部链
    ///
    /// 前置条件：本帧已调用过 `refresh_colliders`。漏调用时告警并
    /// 沿用上一帧球心继续（就地恢复，不中断本帧）。
    pub fn step_chains(&mut self, provider: &impl PoseProvider, delta_time: f32) {
        if !self.colliders_refreshed && !self.colliders.is_empty() {
            log::warn!("step_chains called without refresh_colliders, collider centers are stale");
        }
        self.colliders_refreshed = false;

        let config = get_config();
        let dt = delta_time.clamp(config.min_delta_time, config.max_delta_time);

        let colliders = &self.colliders;
        let active = self.chains.iter().flatten().count();

        if active >= config.parallel_threshold {
            // 链间无共享状态，碰撞体只读，可安全并行
            self.chains
                .par_iter_mut()
                .filter_map(Option::as_mut)
                .for_each(|chain| step_chain(chain, provider, colliders, dt));
        } else {
            for chain in self.chains.iter_mut().flatten() {
                step_chain(chain, provider, colliders, dt);
            }
        }
    }

    // ========================================
    // 视图
    // ========================================

    /// 只读链视图（诊断/可视化用）
    pub fn chains(&self) -> impl Iterator<Item = &SpringChain> {
        self.chains.iter().flatten()
    }

    /// 按句柄取链
    pub fn chain(&self, handle: ChainHandle) -> Option<&SpringChain> {
        self.chains.get(handle.0).and_then(Option::as_ref)
    }

    /// 只读碰撞体视图
    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    /// 整个世界重新就位到绑定姿态
    pub fn reset(&mut self) {
        for chain in self.chains.iter_mut().flatten() {
            chain.reset();
        }
    }

    /// 存活链数量
    pub fn chain_count(&self) -> usize {
        self.chains.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::{BoneParams, BoneSnapshot};
    use crate::pose::WorldPose;
    use glam::{Quat, Vec3};
    use std::collections::HashMap;

    struct MapProvider(HashMap<PoseId, WorldPose>);

    impl PoseProvider for MapProvider {
        fn world_pose(&self, id: PoseId) -> Option<WorldPose> {
            self.0.get(&id).copied()
        }
    }

    fn chain_at(x: f32) -> SpringChain {
        let params = BoneParams {
            bone_axis: Vec3::new(0.0, -1.0, 0.0),
            radius: 0.02,
            stiffness_force: 0.1,
            drag_force: 0.2,
            spring_force: Vec3::new(0.0, -9.8, 0.0),
        };
        let snapshots = (0..4)
            .map(|i| {
                let y = 2.0 - 0.4 * i as f32;
                BoneSnapshot {
                    name: format!("c{x}_b{i}"),
                    local_position: Vec3::new(0.0, -0.4, 0.0),
                    local_rotation: Quat::IDENTITY,
                    global_position: Vec3::new(x, y, 0.0),
                    global_rotation: Quat::IDENTITY,
                    parent_scale: Vec3::ONE,
                    tip_position: Some(Vec3::new(x, y - 0.4, 0.0)),
                    params,
                }
            })
            .collect();
        let (chain, errors) = SpringChain::build(PoseId(x as u64), snapshots);
        assert!(errors.is_empty());
        chain
    }

    fn provider_for(count: usize) -> MapProvider {
        let mut map = HashMap::new();
        for x in 0..count {
            map.insert(
                PoseId(x as u64),
                WorldPose {
                    translation: Vec3::new(x as f32 + 0.2, 2.5, 0.1),
                    rotation: Quat::from_rotation_x(0.2),
                    scale: Vec3::ONE,
                },
            );
        }
        map.insert(
            PoseId(1000),
            WorldPose {
                translation: Vec3::new(0.0, 1.0, 0.0),
                ..WorldPose::default()
            },
        );
        MapProvider(map)
    }

    fn endpoints(world: &SpringWorld) -> Vec<Vec3> {
        world
            .chains()
            .flat_map(|c| c.bones().iter().map(|b| b.current_endpoint))
            .collect()
    }

    #[test]
    fn test_world_determinism_across_runs() {
        // 相同输入的两个世界逐位一致（同时覆盖并行/串行的等价性：
        // 16 条链超过并行阈值，2 条链走串行路径，两种规模都验证）
        let _ = env_logger::builder().is_test(true).try_init();
        for chain_count in [2usize, 16] {
            let provider = provider_for(chain_count);
            let run = || {
                let mut world = SpringWorld::new();
                for x in 0..chain_count {
                    world.add_chain(chain_at(x as f32));
                }
                world.add_collider(PoseId(1000), 0.3);
                for _ in 0..20 {
                    world.refresh_colliders(&provider);
                    world.step_chains(&provider, 1.0 / 60.0);
                }
                endpoints(&world)
            };
            assert_eq!(run(), run());
        }
    }

    #[test]
    fn test_length_invariant_world_wide() {
        let provider = provider_for(12);
        let mut world = SpringWorld::new();
        for x in 0..12 {
            world.add_chain(chain_at(x as f32));
        }
        world.add_collider(PoseId(1000), 0.3);

        for _ in 0..30 {
            world.refresh_colliders(&provider);
            world.step_chains(&provider, 1.0 / 60.0);
        }

        // 所有骨骼的长度约束在多帧之后仍然成立
        for chain in world.chains() {
            for bone in chain.bones() {
                let len = bone.global_position.distance(bone.current_endpoint);
                assert!(
                    (len - bone.spring_length).abs() < 1e-4,
                    "bone '{}' length {} != {}",
                    bone.name,
                    len,
                    bone.spring_length
                );
            }
        }
    }

    #[test]
    fn test_non_penetration_world_wide() {
        let provider = provider_for(4);
        let mut world = SpringWorld::new();
        for x in 0..4 {
            world.add_chain(chain_at(x as f32));
        }
        world.add_collider(PoseId(1000), 0.3);

        for _ in 0..60 {
            world.refresh_colliders(&provider);
            world.step_chains(&provider, 1.0 / 60.0);
        }

        let center = Vec3::new(0.0, 1.0, 0.0);
        for chain in world.chains() {
            for bone in chain.bones() {
                let dist = bone.current_endpoint.distance(center);
                assert!(
                    dist >= 0.3 + bone.radius - 1e-2,
                    "bone '{}' penetrates collider: {dist}",
                    bone.name
                );
            }
        }
    }

    #[test]
    fn test_remove_chain_and_collider() {
        let provider = provider_for(3);
        let mut world = SpringWorld::new();
        let h0 = world.add_chain(chain_at(0.0));
        world.add_chain(chain_at(1.0));
        let ch = world.add_collider(PoseId(1000), 0.3);

        assert_eq!(world.chain_count(), 2);
        let removed = world.remove_chain(h0);
        assert!(removed.is_some());
        assert_eq!(world.chain_count(), 1);
        // 重复移除无事发生
        assert!(world.remove_chain(h0).is_none());

        world.remove_collider(ch);
        world.refresh_colliders(&provider);
        world.step_chains(&provider, 1.0 / 60.0);
        assert!(world.colliders().is_empty());
    }

    #[test]
    fn test_reset_reseats_world() {
        let provider = provider_for(2);
        let mut world = SpringWorld::new();
        world.add_chain(chain_at(0.0));

        for _ in 0..10 {
            world.refresh_colliders(&provider);
            world.step_chains(&provider, 1.0 / 60.0);
        }
        world.reset();

        for chain in world.chains() {
            for bone in chain.bones() {
                assert_eq!(bone.current_endpoint, bone.bind_tip);
                assert_eq!(bone.previous_endpoint, bone.bind_tip);
            }
        }
    }
}
