//! 次级运动 - 在目标旋转上叠加惯性 / 过冲
//!
//! 不是完整的弹簧阻尼积分，只是轻量启发式：
//! 估计每个关节的角速度并平滑，再按过冲强度把速度加回到目标旋转上。
//!
//! 速度表归实例所有。切换动画时必须调用 `reset()`，
//! 否则上一个动作的残余速度会带入新动作。

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec3;

use crate::config::{get_config, MotionConfig};
use crate::skeleton::JointName;

use super::interpolation::{slerp_rotation_with, Curve, JointRotation, JointRotationMap};

/// 速度归一化的参考帧率
const REFERENCE_FPS: f32 = 60.0;

/// 过冲曲线只在过渡的最后 30% 叠加回弹
const BOUNCE_START: f32 = 0.7;

// ============================================================================
// 配置
// ============================================================================

/// 次级运动配置
#[derive(Clone, Debug, PartialEq)]
pub struct SecondaryMotionConfig {
    /// 过冲强度
    pub overshoot: f32,
    /// 稳定时间（秒），单帧间隔超过此值时丢弃历史速度
    pub settle_time: f32,
    /// 速度平滑系数 [0, 1)
    pub damping_factor: f32,
    /// 关闭时原样返回输入
    pub enabled: bool,
}

impl From<&MotionConfig> for SecondaryMotionConfig {
    fn from(config: &MotionConfig) -> Self {
        Self {
            overshoot: config.secondary_overshoot,
            settle_time: config.secondary_settle_time,
            damping_factor: config.secondary_damping,
            enabled: config.secondary_enabled,
        }
    }
}

impl Default for SecondaryMotionConfig {
    fn default() -> Self {
        Self::from(&get_config())
    }
}

// ============================================================================
// 关节速度状态
// ============================================================================

/// 单个关节的速度历史
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointVelocityState {
    /// 上一次的目标旋转
    pub previous_rotation: JointRotation,
    /// 平滑后的欧拉角速度（弧度/秒）
    pub velocity: Vec3,
    /// 累计时间（秒）
    pub timestamp: f32,
}

// ============================================================================
// 次级运动层
// ============================================================================

/// 次级运动层（每个虚拟人一个实例）
#[derive(Clone, Debug, Default)]
pub struct SecondaryMotion {
    config: SecondaryMotionConfig,
    states: HashMap<JointName, JointVelocityState>,
}

impl SecondaryMotion {
    /// 使用全局默认配置创建
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SecondaryMotionConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SecondaryMotionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SecondaryMotionConfig) {
        self.config = config;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// 对单个关节施加次级运动
    ///
    /// 首次见到某关节时只记录状态，原样返回目标。
    pub fn apply(&mut self, joint: JointName, target: JointRotation, delta_time: f32) -> JointRotation {
        if !self.config.enabled || delta_time <= 0.0 {
            return target;
        }

        let Some(state) = self.states.get_mut(&joint) else {
            self.states.insert(
                joint,
                JointVelocityState {
                    previous_rotation: target,
                    velocity: Vec3::ZERO,
                    timestamp: delta_time,
                },
            );
            return target;
        };

        if delta_time > self.config.settle_time {
            state.velocity = Vec3::ZERO;
        }

        let target_vec = target.to_vec3();
        let instant = (target_vec - state.previous_rotation.to_vec3()) / delta_time;
        let damping = self.config.damping_factor;
        state.velocity = state.velocity * damping + instant * (1.0 - damping);
        state.previous_rotation = target;
        state.timestamp += delta_time;

        let offset = state.velocity * self.config.overshoot * delta_time * REFERENCE_FPS;
        JointRotation::from_vec3(target_vec + offset)
    }

    /// 对整套姿势施加次级运动（原地修改）
    pub fn apply_pose(&mut self, joints: &mut JointRotationMap, delta_time: f32) {
        for (joint, rotation) in joints.iter_mut() {
            *rotation = self.apply(*joint, *rotation, delta_time);
        }
    }

    /// 查询关节速度状态
    pub fn state(&self, joint: JointName) -> Option<&JointVelocityState> {
        self.states.get(&joint)
    }

    /// 清空全部关节的速度历史
    pub fn reset(&mut self) {
        self.states.clear();
    }

    pub fn reset_joint(&mut self, joint: JointName) {
        self.states.remove(&joint);
    }
}

// ============================================================================
// 过冲缓动
// ============================================================================

/// 过冲缓动
///
/// base = 1 - (1-t)³；t > 0.7 时叠加衰减正弦回弹 overshoot·sin(2πt)·e^(-5t)
pub fn overshoot_ease(t: f32, overshoot: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let base = 1.0 - (1.0 - t).powi(3);
    if t > BOUNCE_START {
        base + overshoot * (TAU * t).sin() * (-5.0 * t).exp()
    } else {
        base
    }
}

/// 过冲曲线
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OvershootCurve {
    pub overshoot: f32,
}

impl Curve for OvershootCurve {
    fn value(&self, t: f32) -> f32 {
        overshoot_ease(t, self.overshoot)
    }
}

/// 带过冲回弹的球面插值
pub fn slerp_with_overshoot(from: JointRotation, to: JointRotation, t: f32, overshoot: f32) -> JointRotation {
    slerp_rotation_with(from, to, t, &OvershootCurve { overshoot })
}
