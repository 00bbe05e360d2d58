//! Rehab Motion - 康复训练虚拟人的骨骼动画与 IK 引擎
//!
//! 每帧计算人形骨骼所有关节的旋转：
//! - 骨骼层次定义与骨骼映射校验
//! - 关键帧姿势插值（四元数 SLERP）
//! - 次级运动（惯性 / 过冲）
//! - 动画播放控制与阶段切换通知
//! - FABRIK 多骨骼 IK
//! - 解析式双骨骼腿部 IK 与落地判定
//!
//! 渲染、模型加载、逐帧驱动均由外部负责，本引擎只输出关节目标旋转。

pub mod animation;
pub mod avatar;
pub mod config;
pub mod skeleton;

pub use animation::{
    AnimationController, AnimationPhase, ExerciseAnimationData, GaitPhase, InterpolatedPose,
    JointRotation, JointRotationMap, PlaybackState, PoseKeyframe, SecondaryMotion,
};
pub use avatar::{AvatarAnimator, FramePose};
pub use config::MotionConfig;
pub use skeleton::{
    BoneDefinition, BoneMap, FabrikChain, FabrikSolver, FootIk, HipPositions, JointName, Side,
    Skeleton,
};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    #[error("Unknown joint name: {0}")]
    UnknownJoint(String),

    #[error("Skeleton validation failed, missing joints: {0:?}")]
    IncompleteSkeleton(Vec<JointName>),

    #[error("Invalid bone hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("Invalid exercise data: {0}")]
    InvalidExercise(String),
}

pub type Result<T> = std::result::Result<T, MotionError>;
