//! 模拟配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 模拟配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct SpringConfig {
    // ========== 时间步长 ==========
    /// 最小时间步长（秒），默认 0.0
    pub min_delta_time: f32,
    /// 最大时间步长（秒），默认 0.1
    /// 卡顿帧会被截断到此值，防止外力项爆炸
    pub max_delta_time: f32,

    // ========== 并行 ==========
    /// 启用并行的最小链数，默认 8
    /// 链数低于此值时串行更新（避免小规模下的调度开销）
    pub parallel_threshold: usize,

    // ========== 数值 ==========
    /// 退化检测阈值（长度平方），默认 1e-10
    /// 候选端点与骨骼原点重合时跳过归一化，保持原位
    pub degenerate_epsilon: f32,

    // ========== 调试 ==========
    /// 是否输出调试日志，默认 false
    pub debug_log: bool,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            // ====== 时间步长 ======
            min_delta_time: 0.0,
            // 100ms 上限：更长的帧视为卡顿，截断而非放大外力
            max_delta_time: 0.1,

            // ====== 并行 ======
            // 8 条链以下 rayon 的任务调度开销超过收益
            parallel_threshold: 8,

            // ====== 数值 ======
            degenerate_epsilon: 1e-10,

            // ====== 调试 ======
            debug_log: false,
        }
    }
}

/// 全局配置实例
static SPRING_CONFIG: Lazy<RwLock<SpringConfig>> = Lazy::new(|| {
    RwLock::new(SpringConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> SpringConfig {
    SPRING_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: SpringConfig) {
    *SPRING_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *SPRING_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = SpringConfig::default();
}
