//! 骨骼链
//!
//! 从根到梢的有序骨骼序列。第一根激活成功的骨骼是链根，其父姿态
//! 由外部（未模拟的）变换驱动；后续每根骨骼的父姿态是前一根骨骼
//! 本帧刚更新完的模拟姿态，天然满足父先子后的更新顺序。

use crate::bone::{BoneSnapshot, SpringBoneData};
use crate::pose::PoseId;
use crate::SpringError;

/// 骨骼链
#[derive(Clone, Debug)]
pub struct SpringChain {
    /// 链根外部父节点的姿态标识
    pub parent: PoseId,
    bones: Vec<SpringBoneData>,
}

impl SpringChain {
    /// 从激活快照构建骨骼链
    ///
    /// 逐骨骼初始化；失败的骨骼仅自身被剔除（配置错误不波及同链
    /// 其他骨骼），错误收集后返回给调用方。剔除中间骨骼后，下一根
    /// 骨骼的父节点顺延为上一根激活成功的骨骼。
    pub fn build(
        parent: PoseId,
        snapshots: Vec<BoneSnapshot>,
    ) -> (Self, Vec<SpringError>) {
        let mut errors = Vec::new();

        if snapshots.is_empty() {
            errors.push(SpringError::InvalidChain(
                "no bone snapshots supplied".to_string(),
            ));
        }

        let mut bones = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            // 第一根激活成功的骨骼是链根
            let is_root_child = bones.is_empty();
            match SpringBoneData::initialize(snapshot, is_root_child) {
                Ok(bone) => bones.push(bone),
                Err(e) => {
                    log::warn!("spring bone activation failed: {e}");
                    errors.push(e);
                }
            }
        }

        (Self { parent, bones }, errors)
    }

    /// 骨骼数量
    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// 只读骨骼视图（诊断/可视化用）
    #[inline]
    pub fn bones(&self) -> &[SpringBoneData] {
        &self.bones
    }

    #[inline]
    pub(crate) fn bones_mut(&mut self) -> &mut [SpringBoneData] {
        &mut self.bones
    }

    /// 整链重新就位到绑定姿态（重新激活时使用）
    pub fn reset(&mut self) {
        for bone in &mut self.bones {
            bone.reset();
        }
    }
}
