//! 关键帧姿势插值
//!
//! 给定归一化时间，找到前后关键帧并逐关节做缓动 SLERP。

use std::collections::BTreeSet;

use super::interpolation::{ease_in_out_cubic, lerp, slerp_rotation, JointRotationMap};
use super::keyframe::{AnimationPhase, ExerciseAnimationData, PoseKeyframe};

/// 插值后的姿势
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterpolatedPose {
    /// 关节旋转
    pub joints: JointRotationMap,
    /// 根节点高度偏移
    pub root_height: f32,
    /// 表情标记
    pub expression: Option<String>,
}

/// 查找包住 time 的前后关键帧
///
/// 按顺序取第一个满足 prev.time <= time <= next.time 的相邻对；
/// time 落在首帧之前或末帧之后时，前后都取首帧 / 末帧。
fn search_closest_keyframes(keyframes: &[PoseKeyframe], time: f32) -> Option<(&PoseKeyframe, &PoseKeyframe)> {
    let first = keyframes.first()?;
    let last = keyframes.last()?;

    for pair in keyframes.windows(2) {
        if time >= pair[0].time && time <= pair[1].time {
            return Some((&pair[0], &pair[1]));
        }
    }

    if time < first.time {
        Some((first, first))
    } else {
        Some((last, last))
    }
}

/// 区间内的局部插值系数（零宽区间为 0）
#[inline]
fn coefficient(prev: &PoseKeyframe, next: &PoseKeyframe, time: f32) -> f32 {
    let interval = next.time - prev.time;
    if interval > 0.0 {
        ((time - prev.time) / interval).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// 计算归一化时间处的姿势
///
/// 只在一侧关键帧出现的关节，另一侧按零旋转处理（不是静止姿势）。
/// 没有关键帧时返回空姿势。
pub fn interpolate_pose(animation: &ExerciseAnimationData, normalized_time: f32) -> InterpolatedPose {
    let time = normalized_time.clamp(0.0, 1.0);
    let Some((prev, next)) = search_closest_keyframes(&animation.keyframes, time) else {
        return InterpolatedPose::default();
    };

    let t = coefficient(prev, next, time);

    let names: BTreeSet<_> = prev.joints.keys().chain(next.joints.keys()).copied().collect();
    let joints = names
        .into_iter()
        .map(|joint| {
            let from = prev.rotation_or_zero(joint);
            let to = next.rotation_or_zero(joint);
            (joint, slerp_rotation(from, to, t))
        })
        .collect();

    let root_height = lerp(prev.root_height(), next.root_height(), ease_in_out_cubic(t));

    let expression = if t < 0.5 {
        prev.expression.clone()
    } else {
        next.expression.clone()
    };

    InterpolatedPose {
        joints,
        root_height,
        expression,
    }
}

/// 当前阶段：列表中第一个包含 time 的阶段
pub fn get_current_phase(animation: &ExerciseAnimationData, time: f32) -> Option<&AnimationPhase> {
    current_phase_index(animation, time).map(|i| &animation.phases[i])
}

/// 当前阶段在列表中的下标
pub fn current_phase_index(animation: &ExerciseAnimationData, time: f32) -> Option<usize> {
    animation.phases.iter().position(|phase| phase.contains(time))
}
