//! 虚拟人动画驱动
//!
//! 每个虚拟人一个 `AvatarAnimator`，持有自己的控制器、次级运动和脚部 IK 状态。
//! 单帧内的顺序固定：关键帧插值 → 次级运动 → 脚部 IK。

use glam::Vec3;

use crate::animation::{
    exercise_library, AnimationController, ExerciseAnimationData, GaitPhase, InterpolatedPose, JointRotationMap,
    SecondaryMotion,
};
use crate::skeleton::{BoneMap, FabrikChain, FabrikOutcome, FabrikSolver, FootIk, HipPositions, JointName, Skeleton};
use crate::{MotionError, Result};

/// 交给渲染端的一帧结果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePose {
    /// 目标关节旋转（只含骨骼映射中存在的关节）
    pub joints: JointRotationMap,
    /// 根节点高度偏移
    pub root_height: f32,
    pub expression: Option<String>,
    /// 当前阶段名
    pub phase: Option<String>,
    /// 归一化时间
    pub time: f32,
}

/// 虚拟人动画驱动
#[derive(Debug)]
pub struct AvatarAnimator {
    bone_map: BoneMap,
    skeleton: Skeleton,
    controller: AnimationController,
    secondary: SecondaryMotion,
    foot_ik: FootIk,
    fabrik: FabrikSolver,
    foot_ik_enabled: bool,
    last_pose: Option<FramePose>,
}

impl AvatarAnimator {
    /// 使用内置人形骨骼创建；骨骼映射缺少必需关节时拒绝
    pub fn new(bone_map: &BoneMap) -> Result<Self> {
        Self::with_skeleton(bone_map, Skeleton::humanoid().clone())
    }

    pub fn with_skeleton(bone_map: &BoneMap, skeleton: Skeleton) -> Result<Self> {
        bone_map.validate()?;
        Ok(Self {
            bone_map: bone_map.clone(),
            skeleton,
            controller: AnimationController::new(),
            secondary: SecondaryMotion::new(),
            foot_ik: FootIk::new(),
            fabrik: FabrikSolver::new(),
            foot_ik_enabled: true,
            last_pose: None,
        })
    }

    // ========================================
    // 动画加载
    // ========================================

    /// 加载练习并清空次级运动 / 脚部 IK 的历史
    pub fn load_exercise(&mut self, animation: ExerciseAnimationData) -> Result<()> {
        animation.validate()?;
        self.controller.load(animation);
        self.secondary.reset();
        self.foot_ik.reset();
        self.last_pose = None;
        Ok(())
    }

    /// 按名称加载内置练习
    pub fn load_builtin(&mut self, name: &str) -> Result<()> {
        let animation = exercise_library::get(name)
            .ok_or_else(|| MotionError::InvalidExercise(format!("unknown exercise '{}'", name)))?;
        self.load_exercise(animation.clone())
    }

    // ========================================
    // 组件访问
    // ========================================

    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AnimationController {
        &mut self.controller
    }

    pub fn secondary(&self) -> &SecondaryMotion {
        &self.secondary
    }

    pub fn secondary_mut(&mut self) -> &mut SecondaryMotion {
        &mut self.secondary
    }

    pub fn foot_ik(&self) -> &FootIk {
        &self.foot_ik
    }

    pub fn foot_ik_mut(&mut self) -> &mut FootIk {
        &mut self.foot_ik
    }

    pub fn set_foot_ik_enabled(&mut self, enabled: bool) {
        self.foot_ik_enabled = enabled;
    }

    pub fn bone_map(&self) -> &BoneMap {
        &self.bone_map
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn last_pose(&self) -> Option<&FramePose> {
        self.last_pose.as_ref()
    }

    // ========================================
    // 逐帧更新
    // ========================================

    /// 推进一帧
    ///
    /// 未提供髋位置时跳过脚部 IK；未加载练习时返回 None。
    pub fn tick(&mut self, delta_time: f32, hips: Option<HipPositions>) -> Option<FramePose> {
        let InterpolatedPose {
            mut joints,
            root_height,
            expression,
        } = self.controller.update(delta_time)?;

        self.secondary.apply_pose(&mut joints, delta_time);

        let (gait, phase) = match self.controller.current_phase() {
            Some(phase) => (phase.gait, Some(phase.name.clone())),
            None => (GaitPhase::Stance, None),
        };

        if self.foot_ik_enabled {
            if let Some(hips) = hips {
                self.foot_ik.apply(&mut joints, &hips, gait, root_height, delta_time);
            }
        }

        joints.retain(|joint, _| self.bone_map.contains(*joint));

        let frame = FramePose {
            joints,
            root_height,
            expression,
            phase,
            time: self.controller.time(),
        };
        self.last_pose = Some(frame.clone());
        Some(frame)
    }

    /// 用 FABRIK 让肢体链末端够向目标，覆盖上一帧姿势中该链的旋转
    ///
    /// 链中有关节不在骨骼中或还没有任何一帧时返回 None。
    pub fn reach(&mut self, chain: &[JointName], target: Vec3) -> Option<FabrikOutcome> {
        let pose = self.last_pose.as_mut()?;
        let mut fabrik_chain = FabrikChain::init_chain(chain, &self.skeleton)?;
        let outcome = self.fabrik.solve(&mut fabrik_chain, target);

        for (joint, rotation) in fabrik_chain.positions_to_rotations() {
            if self.bone_map.contains(joint) {
                pose.joints.insert(joint, rotation);
            }
        }
        Some(outcome)
    }
}
