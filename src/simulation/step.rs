//! 单骨骼物理更新（核心算法）
//!
//! 每骨骼每帧一次，链内严格父先子后（子骨骼读取父骨骼本帧刚更新
//! 完的全局姿态）。步骤：
//!
//! 1. 确定驱动父姿态（链根读外部变换，其余读父骨骼模拟结果）
//! 2. 由冻结的静止姿态推导目标末端位置
//! 3. Verlet 惯性项：(current - previous) * (1 - drag)，位置历史即速度
//! 4. 叠加刚度拉力（向目标末端线性插值）与外力 * dt
//! 5. 刚性长度重投影（每次位移后强制执行，约束不允许漂移）
//! 6. 按注册顺序贪心碰撞排斥，每次排斥后重新投影
//! 7. 提交端点对，重算全局/本地旋转

use glam::{Quat, Vec3};

use crate::bone::{SpringBoneData, SpringChain};
use crate::collider::ColliderSet;
use crate::config::get_config;
use crate::pose::PoseProvider;

/// 重投影到以 origin 为心、length 为半径的约束球面
///
/// 点与球心重合（退化）时返回 None，由调用方保持原位。
#[inline]
fn project_to_length(origin: Vec3, point: Vec3, length: f32, epsilon_sq: f32) -> Option<Vec3> {
    let offset = point - origin;
    if offset.length_squared() <= epsilon_sq {
        return None;
    }
    Some(origin + offset.normalize() * length)
}

/// 单骨骼更新
///
/// `parent_position` / `parent_rotation` 是本帧已确定的驱动父姿态。
/// 对碰撞体集合做全配对测试；半径 <= 0 的碰撞体静默跳过。
pub fn step_bone(
    bone: &mut SpringBoneData,
    parent_position: Vec3,
    parent_rotation: Quat,
    colliders: &ColliderSet,
    delta_time: f32,
    epsilon_sq: f32,
) {
    // 1-2. 驱动父姿态 → 骨骼原点与静止目标末端
    let origin = parent_position + parent_rotation * (bone.local_position * bone.parent_scale);
    let rest_rotation = parent_rotation * bone.local_rotation;
    let rest_dir = rest_rotation * bone.bone_axis;
    let target_tip = origin + rest_dir * bone.spring_length;

    // 3. Verlet 惯性项（阻尼衰减上一步的位移）
    let inertia = (bone.current_endpoint - bone.previous_endpoint) * (1.0 - bone.drag());

    // 4. 刚度拉力是向目标末端的线性插值系数，不是弹簧-质量-阻尼 ODE 项，
    //    大时间步下不会失稳震荡
    let blended = bone.current_endpoint
        + inertia
        + (target_tip - bone.current_endpoint) * bone.stiffness()
        + bone.spring_force * delta_time;

    // 5. 刚性长度重投影
    let mut candidate = match project_to_length(origin, blended, bone.spring_length, epsilon_sq) {
        Some(p) => p,
        None => {
            // 零长链/端点与原点重合：跳过归一化，保持原位
            log::warn!("degenerate chain at bone '{}', holding position", bone.name);
            bone.global_position = origin;
            return;
        }
    };

    // 6. 贪心顺序碰撞解算：逐碰撞体立即排斥，排斥结果影响后续测试。
    //    多碰撞体重叠时可能残留轻微穿透，为速度接受的近似。
    for collider in colliders.iter() {
        if collider.radius <= 0.0 {
            continue;
        }
        let combined = collider.radius + bone.radius;
        let offset = candidate - collider.global_position;
        let dist_sq = offset.length_squared();
        if dist_sq < combined * combined {
            let push_dir = if dist_sq > epsilon_sq {
                offset / dist_sq.sqrt()
            } else {
                // 末端正好落在球心：沿来向排斥，再退化则沿静止方向
                let approach = bone.current_endpoint - collider.global_position;
                if approach.length_squared() > epsilon_sq {
                    approach.normalize()
                } else {
                    rest_dir
                }
            };
            let pushed = collider.global_position + push_dir * combined;
            // 排斥后长度约束同样必须成立
            if let Some(p) = project_to_length(origin, pushed, bone.spring_length, epsilon_sq) {
                candidate = p;
            }
        }
    }

    // 7. 提交：端点对前移一步，全局旋转 = 把静止方向映射到新末端方向
    bone.previous_endpoint = bone.current_endpoint;
    bone.current_endpoint = candidate;
    bone.global_position = origin;

    let new_dir = (candidate - origin).normalize_or_zero();
    let rest_dir_unit = rest_dir.normalize_or_zero();
    let aim = if new_dir != Vec3::ZERO && rest_dir_unit != Vec3::ZERO {
        Quat::from_rotation_arc(rest_dir_unit, new_dir)
    } else {
        Quat::IDENTITY
    };
    bone.global_rotation = (aim * rest_rotation).normalize();
    bone.simulated_local_rotation = parent_rotation.inverse() * bone.global_rotation;
}

/// 整链更新（父先子后）
///
/// 链根的父姿态每帧从 `PoseProvider` 读取；读不到时整链本帧保持
/// 上一状态（仅告警，不中断其他链）。
pub fn step_chain(
    chain: &mut SpringChain,
    provider: &impl PoseProvider,
    colliders: &ColliderSet,
    delta_time: f32,
) {
    if chain.is_empty() {
        return;
    }

    let root_pose = match provider.world_pose(chain.parent) {
        Some(pose) => pose,
        None => {
            log::warn!("chain parent pose {:?} unavailable, holding chain", chain.parent);
            return;
        }
    };

    let epsilon_sq = get_config().degenerate_epsilon;

    let mut parent_position = root_pose.translation;
    let mut parent_rotation = root_pose.rotation;
    for bone in chain.bones_mut() {
        step_bone(
            bone,
            parent_position,
            parent_rotation,
            colliders,
            delta_time,
            epsilon_sq,
        );
        // 子骨骼的驱动姿态是本骨骼刚更新完的模拟结果
        parent_position = bone.global_position;
        parent_rotation = bone.global_rotation;
    }
}
