//! 弹簧骨骼记录
//!
//! 设计原则：
//! - 静态数据：绑定时刻的快照（静止姿态、物理参数、弹簧长度），初始化后不变
//! - 动态数据：每步更新的运行时状态（端点对、当前全局姿态），仅由模拟步写入
//! - 诊断/可视化协作方只拿只读视图，避免双写

use glam::{Quat, Vec3};

use crate::{Result, SpringError};

// ============================================================================
// 物理参数
// ============================================================================

/// 骨骼物理参数（激活前设置一次）
#[derive(Clone, Copy, Debug)]
pub struct BoneParams {
    /// 骨骼延伸方向（本地空间单位向量）
    pub bone_axis: Vec3,
    /// 末端碰撞半径（>= 0）
    pub radius: f32,
    /// 刚度系数，每步向静止姿态插值的比例（读取时钳制到 [0,1]）
    pub stiffness_force: f32,
    /// 阻尼系数，衰减惯性项（读取时钳制到 [0,1]）
    pub drag_force: f32,
    /// 恒定外力（风等），每步乘以 dt 叠加
    pub spring_force: Vec3,
}

impl Default for BoneParams {
    fn default() -> Self {
        Self {
            bone_axis: Vec3::new(-1.0, 0.0, 0.0),
            radius: 0.1,
            stiffness_force: 0.05,
            drag_force: 0.4,
            spring_force: Vec3::ZERO,
        }
    }
}

// ============================================================================
// 初始化快照
// ============================================================================

/// 激活时刻的骨骼快照（初始化输入）
///
/// 由宿主在链激活时采集：骨骼当前本地/世界姿态、父节点有损缩放、
/// 末端锚点（唯一子节点）的世界位置。没有子节点的骨骼是非法输入。
#[derive(Clone, Debug)]
pub struct BoneSnapshot {
    /// 骨骼名称（用于诊断）
    pub name: String,
    /// 相对父节点的本地位置
    pub local_position: Vec3,
    /// 相对父节点的本地旋转
    pub local_rotation: Quat,
    /// 世界位置
    pub global_position: Vec3,
    /// 世界旋转
    pub global_rotation: Quat,
    /// 父节点世界有损缩放
    pub parent_scale: Vec3,
    /// 末端锚点世界位置（None = 没有子节点）
    pub tip_position: Option<Vec3>,
    /// 物理参数
    pub params: BoneParams,
}

// ============================================================================
// 骨骼记录
// ============================================================================

/// 弹簧骨骼记录
#[derive(Clone, Debug)]
pub struct SpringBoneData {
    // ========================================
    // 静态数据（初始化后不变）
    // ========================================

    /// 骨骼名称
    pub name: String,

    /// 静止本地位置（相对父节点）
    pub local_position: Vec3,

    /// 静止本地旋转（相对父节点）
    pub local_rotation: Quat,

    /// 绑定时刻世界位置
    pub bind_global_position: Vec3,

    /// 绑定时刻世界旋转
    pub bind_global_rotation: Quat,

    /// 绑定时刻末端世界位置（用于 reset 重新就位）
    pub bind_tip: Vec3,

    /// 父节点世界有损缩放
    pub parent_scale: Vec3,

    /// 骨骼延伸方向（本地空间单位向量）
    pub bone_axis: Vec3,

    /// 末端碰撞半径
    pub radius: f32,

    /// 刚度系数（原始值，使用时钳制）
    pub stiffness_force: f32,

    /// 阻尼系数（原始值，使用时钳制）
    pub drag_force: f32,

    /// 恒定外力
    pub spring_force: Vec3,

    /// 弹簧长度 = 绑定时刻骨骼原点到末端的距离，此后冻结
    pub spring_length: f32,

    /// 父节点是否不参与模拟（链根，父姿态是外部输入）
    pub is_root_child: bool,

    // ========================================
    // 动态数据（每步由模拟写入）
    // ========================================

    /// 当前世界位置（由本帧父姿态推导）
    pub global_position: Vec3,

    /// 当前世界旋转（末端方向对齐后的结果）
    pub global_rotation: Quat,

    /// 本帧末端世界位置
    pub current_endpoint: Vec3,

    /// 上一步末端世界位置（与 current 恰好相隔一步）
    pub previous_endpoint: Vec3,

    /// 输出本地旋转 = 父旋转的逆 * 当前全局旋转
    pub simulated_local_rotation: Quat,
}

impl SpringBoneData {
    /// 初始化骨骼记录（纯快照操作，每次激活只调用一次）
    ///
    /// 末端锚点缺失时返回 `MissingTipChild`，仅该骨骼激活失败，
    /// 不影响同链其他骨骼。
    pub fn initialize(snapshot: BoneSnapshot, is_root_child: bool) -> Result<Self> {
        let tip = snapshot
            .tip_position
            .ok_or_else(|| SpringError::MissingTipChild(snapshot.name.clone()))?;

        let spring_length = snapshot.global_position.distance(tip);

        Ok(Self {
            name: snapshot.name,
            local_position: snapshot.local_position,
            local_rotation: snapshot.local_rotation,
            bind_global_position: snapshot.global_position,
            bind_global_rotation: snapshot.global_rotation,
            bind_tip: tip,
            parent_scale: snapshot.parent_scale,
            bone_axis: snapshot.params.bone_axis,
            radius: snapshot.params.radius.max(0.0),
            stiffness_force: snapshot.params.stiffness_force,
            drag_force: snapshot.params.drag_force,
            spring_force: snapshot.params.spring_force,
            spring_length,
            is_root_child,
            global_position: snapshot.global_position,
            global_rotation: snapshot.global_rotation,
            current_endpoint: tip,
            previous_endpoint: tip,
            simulated_local_rotation: snapshot.local_rotation,
        })
    }

    /// 是否为链根骨骼
    #[inline]
    pub fn is_root_bone(&self) -> bool {
        self.is_root_child
    }

    /// 钳制后的刚度系数
    #[inline]
    pub fn stiffness(&self) -> f32 {
        self.stiffness_force.clamp(0.0, 1.0)
    }

    /// 钳制后的阻尼系数
    #[inline]
    pub fn drag(&self) -> f32 {
        self.drag_force.clamp(0.0, 1.0)
    }

    /// 重新就位到绑定姿态（重新激活时使用，不需要重新采集快照）
    pub fn reset(&mut self) {
        self.global_position = self.bind_global_position;
        self.global_rotation = self.bind_global_rotation;
        self.current_endpoint = self.bind_tip;
        self.previous_endpoint = self.bind_tip;
        self.simulated_local_rotation = self.local_rotation;
    }
}
