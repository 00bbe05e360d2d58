//! 动作引擎默认配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。
//! 各组件构造时读取一份快照，之后的运行状态归实例所有。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 动作引擎配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct MotionConfig {
    // ========== 次级运动 ==========
    /// 过冲强度，默认 0.15
    /// 0.0 = 无惯性，越大关节"甩"得越明显
    pub secondary_overshoot: f32,
    /// 稳定时间（秒），默认 0.3
    /// 单帧间隔超过此值视为断档，清空已记录的速度
    pub secondary_settle_time: f32,
    /// 速度平滑系数，默认 0.8
    /// 越接近 1 越依赖历史速度
    pub secondary_damping: f32,
    /// 是否启用次级运动，默认 true
    pub secondary_enabled: bool,

    // ========== FABRIK ==========
    /// 最大迭代次数，默认 10
    pub fabrik_max_iterations: u32,
    /// 末端收敛容差，默认 0.01
    pub fabrik_tolerance: f32,

    // ========== 腿部 IK ==========
    /// 大腿长度，默认 0.45
    pub thigh_length: f32,
    /// 小腿长度，默认 0.42
    pub shin_length: f32,
    /// 膝盖最小弯曲角（弧度），默认 0.05
    /// 避免膝盖完全锁直
    pub min_knee_bend: f32,
    /// 三角形夹紧余量，默认 1e-4
    pub leg_epsilon: f32,
    /// 髋部侧向旋转系数，默认 0.5
    pub lateral_hip_factor: f32,

    // ========== 落地判定 ==========
    /// 地面高度，默认 0.0
    pub ground_level: f32,
    /// 摆动腿抬脚高度，默认 0.12
    pub swing_height: f32,
    /// 脚相对髋部的侧向偏移，默认 0.15
    pub foot_lateral_offset: f32,
    /// 摆动时的脚背屈角（弧度），默认 0.2
    pub swing_dorsiflexion: f32,
    /// 脚目标平滑速度（每秒），默认 10.0
    pub foot_smoothing_speed: f32,

    // ========== 调试 ==========
    /// 是否输出逐帧调试日志，默认 false
    pub debug_log: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            // ====== 次级运动 ======
            secondary_overshoot: 0.15,
            secondary_settle_time: 0.3,
            secondary_damping: 0.8,
            secondary_enabled: true,

            // ====== FABRIK ======
            fabrik_max_iterations: 10,
            fabrik_tolerance: 0.01,

            // ====== 腿部 IK ======
            // 与内置人形骨骼的腿长一致
            thigh_length: 0.45,
            shin_length: 0.42,
            min_knee_bend: 0.05,
            leg_epsilon: 1e-4,
            lateral_hip_factor: 0.5,

            // ====== 落地判定 ======
            ground_level: 0.0,
            swing_height: 0.12,
            foot_lateral_offset: 0.15,
            swing_dorsiflexion: 0.2,
            foot_smoothing_speed: 10.0,

            // ====== 调试 ======
            debug_log: false,
        }
    }
}

/// 全局配置实例
static MOTION_CONFIG: Lazy<RwLock<MotionConfig>> = Lazy::new(|| {
    RwLock::new(MotionConfig::default())
});

/// 获取当前配置（只读快照）
pub fn get_config() -> MotionConfig {
    MOTION_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: MotionConfig) {
    *MOTION_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *MOTION_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = MotionConfig::default();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_leg_lengths() {
        let config = MotionConfig::default();
        assert!((config.thigh_length - 0.45).abs() < 1e-6);
        assert!((config.shin_length - 0.42).abs() < 1e-6);
        assert!(config.min_knee_bend > 0.0);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut snapshot = get_config();
        snapshot.swing_height = 99.0;
        assert!(get_config().swing_height < 99.0);
    }
}
