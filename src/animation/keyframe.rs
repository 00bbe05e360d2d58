//! 练习动画数据 - 关键帧、阶段与整段练习
//!
//! 这些都是编写期的静态数据，运行时只读。

use glam::Vec3;

use crate::skeleton::{JointName, Side};
use crate::{MotionError, Result};

use super::interpolation::{JointRotation, JointRotationMap};

// ============================================================================
// 步态标记
// ============================================================================

/// 阶段的步态标记，供脚部 IK 判断支撑 / 摆动
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum GaitPhase {
    /// 双脚着地
    #[default]
    Stance,
    /// 指定侧的脚处于摆动
    Swing(Side),
}

impl GaitPhase {
    /// 从阶段名推断（兼容未标记的旧数据）
    ///
    /// - 含 "step" / "walk" 且含 "left" / "right"：该侧摆动
    /// - 含 "lunge" 且含 "forward"：左脚（前导脚）摆动
    /// - 其余：支撑
    pub fn infer_from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("step") || name.contains("walk") {
            if name.contains("left") {
                return GaitPhase::Swing(Side::Left);
            }
            if name.contains("right") {
                return GaitPhase::Swing(Side::Right);
            }
        }
        if name.contains("lunge") && name.contains("forward") {
            return GaitPhase::Swing(Side::Left);
        }
        GaitPhase::Stance
    }

    #[inline]
    pub fn is_swing(self, side: Side) -> bool {
        self == GaitPhase::Swing(side)
    }
}

// ============================================================================
// 关键帧
// ============================================================================

/// 姿势关键帧
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PoseKeyframe {
    /// 归一化时间 [0, 1]
    pub time: f32,
    /// 关节旋转（不要求覆盖全部关节）
    pub joints: JointRotationMap,
    /// 表情标记
    #[cfg_attr(feature = "serde", serde(default))]
    pub expression: Option<String>,
    /// 根节点世界偏移（下游只使用 y）
    #[cfg_attr(feature = "serde", serde(default))]
    pub root_position: Option<Vec3>,
}

impl PoseKeyframe {
    pub fn new(time: f32) -> Self {
        Self {
            time,
            ..Default::default()
        }
    }

    pub fn with_joint(mut self, joint: JointName, rotation: JointRotation) -> Self {
        self.joints.insert(joint, rotation);
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn with_root_height(mut self, y: f32) -> Self {
        self.root_position = Some(Vec3::new(0.0, y, 0.0));
        self
    }

    /// 根节点高度偏移（未设置为 0）
    #[inline]
    pub fn root_height(&self) -> f32 {
        self.root_position.map_or(0.0, |p| p.y)
    }

    /// 关节旋转，缺失时为零旋转
    #[inline]
    pub fn rotation_or_zero(&self, joint: JointName) -> JointRotation {
        self.joints.get(&joint).copied().unwrap_or(JointRotation::ZERO)
    }
}

// ============================================================================
// 阶段
// ============================================================================

/// 动画阶段（时间轴上的命名区间）
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AnimationPhase {
    pub name: String,
    pub start_time: f32,
    pub end_time: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub gait: GaitPhase,
}

impl AnimationPhase {
    /// 创建支撑阶段
    pub fn new(name: impl Into<String>, start_time: f32, end_time: f32, description: impl Into<String>) -> Self {
        Self::with_gait_tag(name, start_time, end_time, description, GaitPhase::Stance)
    }

    /// 创建阶段并显式指定步态
    pub fn with_gait_tag(
        name: impl Into<String>,
        start_time: f32,
        end_time: f32,
        description: impl Into<String>,
        gait: GaitPhase,
    ) -> Self {
        Self {
            name: name.into(),
            start_time,
            end_time,
            description: description.into(),
            gait,
        }
    }

    /// 步态按名称推断（用于未标记步态的旧数据）
    pub fn inferred(name: impl Into<String>, start_time: f32, end_time: f32, description: impl Into<String>) -> Self {
        let name = name.into();
        let gait = GaitPhase::infer_from_name(&name);
        Self::with_gait_tag(name, start_time, end_time, description, gait)
    }

    pub fn with_gait(mut self, gait: GaitPhase) -> Self {
        self.gait = gait;
        self
    }

    /// 闭区间包含
    #[inline]
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}

// ============================================================================
// 练习动画
// ============================================================================

/// 一种练习的完整动画数据
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ExerciseAnimationData {
    pub name: String,
    /// 按时间排序，首帧 time=0，末帧 time=1
    pub keyframes: Vec<PoseKeyframe>,
    pub phases: Vec<AnimationPhase>,
    /// 单次循环时长（秒）
    pub duration: f32,
    #[cfg_attr(feature = "serde", serde(rename = "loop"))]
    pub looping: bool,
    pub default_tempo: f32,
}

impl ExerciseAnimationData {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            keyframes: Vec::new(),
            phases: Vec::new(),
            duration,
            looping: true,
            default_tempo: 1.0,
        }
    }

    pub fn with_keyframe(mut self, keyframe: PoseKeyframe) -> Self {
        self.keyframes.push(keyframe);
        self
    }

    pub fn with_phase(mut self, phase: AnimationPhase) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_default_tempo(mut self, tempo: f32) -> Self {
        self.default_tempo = tempo;
        self
    }

    /// 编写期校验
    ///
    /// 运行时插值不做防御，数据错误只能在这里提前发现。
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> {
            Err(MotionError::InvalidExercise(format!("{}: {}", self.name, msg)))
        };

        if self.duration.is_nan() || self.duration <= 0.0 {
            return invalid(format!("duration must be positive, got {}", self.duration));
        }
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return invalid("no keyframes".to_string());
        };
        if first.time != 0.0 {
            return invalid(format!("first keyframe must be at time 0, got {}", first.time));
        }
        if last.time != 1.0 {
            return invalid(format!("last keyframe must be at time 1, got {}", last.time));
        }
        for pair in self.keyframes.windows(2) {
            if pair[1].time < pair[0].time {
                return invalid(format!(
                    "keyframe times are not monotonic ({} after {})",
                    pair[1].time, pair[0].time
                ));
            }
        }
        for phase in &self.phases {
            let in_range = (0.0..=1.0).contains(&phase.start_time) && (0.0..=1.0).contains(&phase.end_time);
            if !in_range || phase.start_time > phase.end_time {
                return invalid(format!(
                    "phase '{}' has invalid range [{}, {}]",
                    phase.name, phase.start_time, phase.end_time
                ));
            }
        }
        Ok(())
    }
}
