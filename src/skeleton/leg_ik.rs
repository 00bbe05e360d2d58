//! 解析式双骨骼腿部 IK（余弦定理）
//!
//! 髋 → 膝 → 踝，腿在静止姿势下竖直向下。
//! 大腿 x 为负 = 屈髋，小腿 x 为正 = 屈膝，z 为正 = 脚向 +X 侧摆。

use std::f32::consts::PI;

use glam::Vec3;

use crate::animation::{JointRotation, JointRotationMap};
use crate::config::{get_config, MotionConfig};

use super::joint::{JointName, Side};

/// 腿部 IK 参数
#[derive(Clone, Debug, PartialEq)]
pub struct LegIkConfig {
    /// 大腿长度
    pub thigh_length: f32,
    /// 小腿长度
    pub shin_length: f32,
    /// 膝盖最小弯曲角（弧度）
    pub min_knee_bend: f32,
    /// 三角形夹紧余量
    pub epsilon: f32,
    /// 髋部侧向旋转系数
    pub lateral_hip_factor: f32,
}

impl From<&MotionConfig> for LegIkConfig {
    fn from(config: &MotionConfig) -> Self {
        Self {
            thigh_length: config.thigh_length,
            shin_length: config.shin_length,
            min_knee_bend: config.min_knee_bend,
            epsilon: config.leg_epsilon,
            lateral_hip_factor: config.lateral_hip_factor,
        }
    }
}

impl Default for LegIkConfig {
    fn default() -> Self {
        Self::from(&get_config())
    }
}

/// 单腿求解结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LegIkSolution {
    pub side: Side,
    /// 大腿旋转
    pub hip: JointRotation,
    /// 小腿旋转
    pub knee: JointRotation,
    /// 脚旋转（脚底保持水平）
    pub ankle: JointRotation,
    /// 夹紧后的髋到目标距离
    pub reach: f32,
}

impl LegIkSolution {
    /// 膝盖弯曲角
    #[inline]
    pub fn knee_bend(&self) -> f32 {
        self.knee.x
    }

    /// 写入姿势（覆盖该侧的大腿 / 小腿 / 脚）
    pub fn write_to(&self, joints: &mut JointRotationMap) {
        let [upper, lower, foot] = JointName::leg(self.side);
        joints.insert(upper, self.hip);
        joints.insert(lower, self.knee);
        joints.insert(foot, self.ankle);
    }
}

/// 双骨骼腿部 IK 求解器
#[derive(Clone, Debug, Default)]
pub struct LegIkSolver {
    config: LegIkConfig,
}

impl LegIkSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LegIkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LegIkConfig {
        &self.config
    }

    /// 求解单腿
    ///
    /// 距离先夹紧到 [|a-b|+ε, a+b-ε]，所有 acos 参数夹紧到 [-1, 1]，
    /// 任何输入都得到有限的结果。
    pub fn solve(&self, hip: Vec3, target: Vec3, side: Side) -> LegIkSolution {
        let a = self.config.thigh_length;
        let b = self.config.shin_length;
        let eps = self.config.epsilon;

        let d = target - hip;
        let min_reach = (a - b).abs() + eps;
        let max_reach = (a + b - eps).max(min_reach);
        let c = d.length().clamp(min_reach, max_reach);

        // 膝盖：π - 膝内角
        let cos_knee = ((a * a + b * b - c * c) / (2.0 * a * b).max(f32::EPSILON)).clamp(-1.0, 1.0);
        let knee_bend = (PI - cos_knee.acos()).max(self.config.min_knee_bend);

        // 髋：大腿与髋→目标连线的夹角 + 矢状面内目标方向
        let cos_alpha = ((a * a + c * c - b * b) / (2.0 * a * c).max(f32::EPSILON)).clamp(-1.0, 1.0);
        let alpha = cos_alpha.acos();
        let sagittal = d.z.atan2(-d.y);
        let hip_pitch = -(sagittal + alpha);

        let hip_roll = d.x.atan2(-d.y) * self.config.lateral_hip_factor;

        LegIkSolution {
            side,
            hip: JointRotation::new(hip_pitch, 0.0, hip_roll),
            knee: JointRotation::new(knee_bend, 0.0, 0.0),
            ankle: JointRotation::new(-(hip_pitch + knee_bend), 0.0, 0.0),
            reach: c,
        }
    }
}
