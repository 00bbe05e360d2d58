//! 骨骼系统
//!
//! - joint: 关节名称闭集、左右侧、关节位掩码
//! - bone_definition / bone_map: 静态层次与模型骨骼映射
//! - fabrik: 通用多骨骼 IK
//! - leg_ik / foot_ik: 解析式腿部 IK 与落地判定

mod bone_definition;
mod bone_map;
mod fabrik;
mod foot_ik;
mod joint;
mod leg_ik;

pub use bone_definition::{BoneDefinition, ParentChain, Skeleton};
pub use bone_map::BoneMap;
pub use fabrik::{FabrikBone, FabrikChain, FabrikConfig, FabrikOutcome, FabrikSolver, REFERENCE_AXIS};
pub use foot_ik::{FootIk, FootIkConfig, FootIkState, FootTarget, HipPositions};
pub use joint::{JointMask, JointName, Side};
pub use leg_ik::{LegIkConfig, LegIkSolution, LegIkSolver};
