//! 动画系统
//!
//! - interpolation: 欧拉角 / 四元数、SLERP、缓动曲线
//! - keyframe: 关键帧、阶段、练习动画数据
//! - pose: 关键帧插值
//! - secondary_motion: 次级运动（惯性 / 过冲）
//! - controller: 播放状态机
//! - exercise_library: 内置练习

pub mod controller;
pub mod exercise_library;
pub mod interpolation;
pub mod keyframe;
pub mod pose;
pub mod secondary_motion;

pub use controller::{AnimationController, PhaseChange, PlaybackState};
pub use interpolation::{
    ease_in_out_cubic, lerp, slerp_rotation, slerp_rotation_with, Curve, EaseInOutCubic, JointRotation,
    JointRotationMap, Linear, EULER_ORDER,
};
pub use keyframe::{AnimationPhase, ExerciseAnimationData, GaitPhase, PoseKeyframe};
pub use pose::{get_current_phase, interpolate_pose, InterpolatedPose};
pub use secondary_motion::{
    overshoot_ease, slerp_with_overshoot, JointVelocityState, OvershootCurve, SecondaryMotion,
    SecondaryMotionConfig,
};
