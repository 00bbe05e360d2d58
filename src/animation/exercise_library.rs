//! 内置练习动画
//!
//! 坐标约定：Y 轴向上，角色面向 +Z，左侧为 +X。
//! 大腿 x 为负 = 屈髋（脚向前），小腿 x 为正 = 屈膝。

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::skeleton::{JointName, Side};

use super::interpolation::JointRotation;
use super::keyframe::{AnimationPhase, ExerciseAnimationData, GaitPhase, PoseKeyframe};

pub const SQUAT: &str = "squat";
pub const LUNGE: &str = "lunge";
pub const ARM_RAISE: &str = "arm_raise";
pub const MARCH: &str = "march";

static LIBRARY: Lazy<BTreeMap<&'static str, ExerciseAnimationData>> = Lazy::new(|| {
    let mut library = BTreeMap::new();
    library.insert(SQUAT, squat());
    library.insert(LUNGE, lunge());
    library.insert(ARM_RAISE, arm_raise());
    library.insert(MARCH, march());
    library
});

/// 按名称获取内置练习
pub fn get(name: &str) -> Option<&'static ExerciseAnimationData> {
    LIBRARY.get(name)
}

/// 全部内置练习名（字典序）
pub fn names() -> impl Iterator<Item = &'static str> {
    LIBRARY.keys().copied()
}

// ============================================================================
// 姿势片段
// ============================================================================

/// 单腿 髋 / 膝 / 踝 的屈曲角
fn with_leg(keyframe: PoseKeyframe, side: Side, hip: f32, knee: f32, ankle: f32) -> PoseKeyframe {
    let [upper, lower, foot] = JointName::leg(side);
    keyframe
        .with_joint(upper, JointRotation::new(hip, 0.0, 0.0))
        .with_joint(lower, JointRotation::new(knee, 0.0, 0.0))
        .with_joint(foot, JointRotation::new(ankle, 0.0, 0.0))
}

fn with_legs(keyframe: PoseKeyframe, hip: f32, knee: f32, ankle: f32) -> PoseKeyframe {
    let keyframe = with_leg(keyframe, Side::Left, hip, knee, ankle);
    with_leg(keyframe, Side::Right, hip, knee, ankle)
}

/// 双臂：抬起角（0 = 自然下垂，π/2 = 侧平举）与前伸角
fn with_arms(keyframe: PoseKeyframe, raise: f32, forward: f32) -> PoseKeyframe {
    // 静止姿势为 T 字，先绕 z 放下再按 raise 抬起
    let lowered = -std::f32::consts::FRAC_PI_2 + raise;
    keyframe
        .with_joint(JointName::LeftUpperArm, JointRotation::new(0.0, -forward, lowered))
        .with_joint(JointName::RightUpperArm, JointRotation::new(0.0, forward, -lowered))
}

fn with_torso(keyframe: PoseKeyframe, spine: f32, chest: f32) -> PoseKeyframe {
    keyframe
        .with_joint(JointName::Spine, JointRotation::new(spine, 0.0, 0.0))
        .with_joint(JointName::Chest, JointRotation::new(chest, 0.0, 0.0))
}

fn standing(time: f32) -> PoseKeyframe {
    let keyframe = PoseKeyframe::new(time)
        .with_joint(JointName::Hips, JointRotation::ZERO)
        .with_root_height(0.0)
        .with_expression("neutral");
    let keyframe = with_torso(keyframe, 0.0, 0.0);
    let keyframe = with_arms(keyframe, 0.0, 0.0);
    with_legs(keyframe, 0.0, 0.0, 0.0)
}

// ============================================================================
// 练习
// ============================================================================

/// 深蹲：下蹲（离心）2 秒，起身（向心）2 秒
fn squat() -> ExerciseAnimationData {
    let bottom = PoseKeyframe::new(0.5)
        .with_joint(JointName::Hips, JointRotation::new(0.15, 0.0, 0.0))
        .with_root_height(-0.35)
        .with_expression("effort");
    let bottom = with_torso(bottom, 0.25, 0.1);
    let bottom = with_arms(bottom, 1.4, 1.4);
    let bottom = with_legs(bottom, -1.35, 1.9, -0.55);

    ExerciseAnimationData::new(SQUAT, 4.0)
        .with_keyframe(standing(0.0))
        .with_keyframe(bottom)
        .with_keyframe(standing(1.0))
        .with_phase(AnimationPhase::new("ECCENTRIC", 0.0, 0.5, "屈髋屈膝下蹲，膝盖对准脚尖"))
        .with_phase(AnimationPhase::new("CONCENTRIC", 0.5, 1.0, "脚跟发力站起"))
}

/// 弓步：左脚向前迈出，保持，收回
fn lunge() -> ExerciseAnimationData {
    let lowered = PoseKeyframe::new(0.4)
        .with_joint(JointName::Hips, JointRotation::ZERO)
        .with_root_height(-0.3)
        .with_expression("effort");
    let lowered = with_torso(lowered, 0.05, 0.0);
    let lowered = with_arms(lowered, 0.1, 0.0);
    let lowered = with_leg(lowered, Side::Left, -1.45, 1.5, -0.05);
    let lowered = with_leg(lowered, Side::Right, 0.35, 1.45, 0.4);

    let mut hold = lowered.clone();
    hold.time = 0.6;

    ExerciseAnimationData::new(LUNGE, 5.0)
        .with_keyframe(standing(0.0))
        .with_keyframe(lowered)
        .with_keyframe(hold)
        .with_keyframe(standing(1.0))
        .with_phase(AnimationPhase::with_gait_tag(
            "LUNGE_FORWARD",
            0.0,
            0.4,
            "左脚向前迈出并下沉",
            GaitPhase::Swing(Side::Left),
        ))
        .with_phase(AnimationPhase::new("HOLD", 0.4, 0.6, "保持后膝接近地面"))
        .with_phase(AnimationPhase::new("LUNGE_RETURN", 0.6, 1.0, "前脚蹬地收回"))
}

/// 侧平举
fn arm_raise() -> ExerciseAnimationData {
    let raised = PoseKeyframe::new(0.5).with_expression("effort");
    let raised = with_arms(raised, std::f32::consts::FRAC_PI_2, 0.0);
    let raised = raised
        .with_joint(JointName::LeftLowerArm, JointRotation::ZERO)
        .with_joint(JointName::RightLowerArm, JointRotation::ZERO);

    let rest = |time| {
        with_arms(PoseKeyframe::new(time), 0.0, 0.0)
            .with_joint(JointName::LeftLowerArm, JointRotation::new(0.0, 0.0, 0.1))
            .with_joint(JointName::RightLowerArm, JointRotation::new(0.0, 0.0, -0.1))
            .with_expression("neutral")
    };

    ExerciseAnimationData::new(ARM_RAISE, 3.0)
        .with_keyframe(rest(0.0))
        .with_keyframe(raised)
        .with_keyframe(rest(1.0))
        .with_phase(AnimationPhase::new("RAISE", 0.0, 0.5, "双臂侧向抬至肩高"))
        .with_phase(AnimationPhase::new("LOWER", 0.5, 1.0, "缓慢放下"))
        .with_default_tempo(0.8)
}

/// 原地踏步
fn march() -> ExerciseAnimationData {
    let knee_up = |time, side: Side| {
        let keyframe = with_leg(PoseKeyframe::new(time), side, -1.2, 1.4, 0.1);
        let keyframe = with_leg(keyframe, side.opposite(), 0.0, 0.0, 0.0);
        // 对侧手臂前摆
        let (left_swing, right_swing) = match side {
            Side::Left => (-0.4, 0.4),
            Side::Right => (0.4, -0.4),
        };
        keyframe
            .with_joint(JointName::LeftUpperArm, JointRotation::new(left_swing, 0.0, -1.4))
            .with_joint(JointName::RightUpperArm, JointRotation::new(right_swing, 0.0, 1.4))
    };
    let neutral = |time| {
        let keyframe = with_legs(PoseKeyframe::new(time), 0.0, 0.0, 0.0);
        keyframe
            .with_joint(JointName::LeftUpperArm, JointRotation::new(0.0, 0.0, -1.4))
            .with_joint(JointName::RightUpperArm, JointRotation::new(0.0, 0.0, 1.4))
    };

    ExerciseAnimationData::new(MARCH, 2.0)
        .with_keyframe(neutral(0.0))
        .with_keyframe(knee_up(0.25, Side::Left))
        .with_keyframe(neutral(0.5))
        .with_keyframe(knee_up(0.75, Side::Right))
        .with_keyframe(neutral(1.0))
        .with_phase(AnimationPhase::with_gait_tag("STEP_LEFT", 0.0, 0.5, "抬左膝", GaitPhase::Swing(Side::Left)))
        .with_phase(AnimationPhase::with_gait_tag("STEP_RIGHT", 0.5, 1.0, "抬右膝", GaitPhase::Swing(Side::Right)))
}
