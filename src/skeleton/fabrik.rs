//! FABRIK 多骨骼 IK
//!
//! 前向 / 后向交替修正位置，每一轮都严格保持相邻骨骼间距等于骨长。
//! 目标超出链长时直接沿根→目标方向拉直（一次求解）。
//!
//! 链是按值持有的每次求解状态，不做任何全局缓存。

use glam::{Quat, Vec3};

use crate::animation::{JointRotation, JointRotationMap};
use crate::config::{get_config, MotionConfig};

use super::bone_definition::Skeleton;
use super::joint::JointName;

/// 骨骼方向换算旋转时使用的参考"上"轴
pub const REFERENCE_AXIS: Vec3 = Vec3::Y;

// ============================================================================
// 链数据
// ============================================================================

/// 链上的一个关节
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FabrikBone {
    pub name: JointName,
    /// 当前世界位置
    pub position: Vec3,
    /// 到下一个关节的长度
    pub length: f32,
}

/// IK 链
#[derive(Clone, Debug, PartialEq)]
pub struct FabrikChain {
    bones: Vec<FabrikBone>,
    /// 各段长度之和（末端关节的长度不计入）
    total_length: f32,
    /// 固定的根位置
    root: Vec3,
    /// 初始化时的位置快照
    initial: Vec<Vec3>,
}

impl FabrikChain {
    /// 直接由骨骼数据构建
    ///
    /// 段长取每根骨骼自身的 length，最后一根不参与链长。
    pub fn from_bones(bones: Vec<FabrikBone>) -> Self {
        let total_length = match bones.split_last() {
            Some((_, segments)) => segments.iter().map(|bone| bone.length).sum(),
            None => 0.0,
        };
        let root = bones.first().map_or(Vec3::ZERO, |bone| bone.position);
        let initial = bones.iter().map(|bone| bone.position).collect();
        Self {
            bones,
            total_length,
            root,
            initial,
        }
    }

    /// 按骨骼定义初始化链
    ///
    /// 首关节取静止世界位置，之后逐个累加局部偏移。
    /// 段长取下一个关节的偏移长度（多子关节时 BoneDefinition.length 不代表这段），
    /// 只有末端关节使用自身的 length。
    /// 任一关节不在骨骼中时返回 None。
    pub fn init_chain(joints: &[JointName], skeleton: &Skeleton) -> Option<Self> {
        let defs = joints
            .iter()
            .map(|&joint| skeleton.bone(joint))
            .collect::<Option<Vec<_>>>()?;
        let first = defs.first()?;

        let mut position = skeleton.rest_world_position(first.name)?;
        let mut bones = Vec::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if i > 0 {
                position += def.local_offset;
            }
            let length = defs
                .get(i + 1)
                .map_or(def.length, |next| next.local_offset.length());
            bones.push(FabrikBone {
                name: def.name,
                position,
                length,
            });
        }

        Some(Self::from_bones(bones))
    }

    /// 由当前位置构建，段长取相邻位置的距离
    pub fn from_positions(joints: &[(JointName, Vec3)]) -> Self {
        let bones = joints
            .iter()
            .enumerate()
            .map(|(i, &(name, position))| {
                let length = joints
                    .get(i + 1)
                    .map_or(0.0, |&(_, next)| position.distance(next));
                FabrikBone { name, position, length }
            })
            .collect();
        Self::from_bones(bones)
    }

    #[inline]
    pub fn bones(&self) -> &[FabrikBone] {
        &self.bones
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[inline]
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    #[inline]
    pub fn root(&self) -> Vec3 {
        self.root
    }

    /// 末端位置
    pub fn end_effector(&self) -> Vec3 {
        self.bones.last().map_or(self.root, |bone| bone.position)
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.bones.iter().map(|bone| bone.position).collect()
    }

    /// 恢复到初始化时的位置
    pub fn reset(&mut self) {
        for (bone, &position) in self.bones.iter_mut().zip(&self.initial) {
            bone.position = position;
        }
    }

    /// 由位置换算每根骨骼的朝向
    ///
    /// 旋转 = 把参考轴转到指向下一个关节的方向；末端关节为零旋转。
    pub fn positions_to_rotations(&self) -> JointRotationMap {
        let mut rotations = JointRotationMap::new();
        for (i, bone) in self.bones.iter().enumerate() {
            let rotation = self
                .bones
                .get(i + 1)
                .and_then(|next| (next.position - bone.position).try_normalize())
                .map_or(JointRotation::ZERO, |dir| {
                    JointRotation::from_quat(Quat::from_rotation_arc(REFERENCE_AXIS, dir))
                });
            rotations.insert(bone.name, rotation);
        }
        rotations
    }
}

// ============================================================================
// 求解器
// ============================================================================

/// FABRIK 求解参数
#[derive(Clone, Debug, PartialEq)]
pub struct FabrikConfig {
    pub max_iterations: u32,
    pub tolerance: f32,
    /// 未收敛时输出 trace 日志
    pub debug_log: bool,
}

impl From<&MotionConfig> for FabrikConfig {
    fn from(config: &MotionConfig) -> Self {
        Self {
            max_iterations: config.fabrik_max_iterations,
            tolerance: config.fabrik_tolerance,
            debug_log: config.debug_log,
        }
    }
}

impl Default for FabrikConfig {
    fn default() -> Self {
        Self::from(&get_config())
    }
}

/// 求解结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FabrikOutcome {
    /// 末端是否进入容差
    pub reached: bool,
    /// 实际迭代次数（拉直分支为 0）
    pub iterations: u32,
    /// 末端到目标的距离
    pub error: f32,
}

/// FABRIK 求解器（无状态，可复用）
#[derive(Clone, Debug, Default)]
pub struct FabrikSolver {
    config: FabrikConfig,
}

impl FabrikSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FabrikConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FabrikConfig {
        &self.config
    }

    /// 根到目标的直线距离不超过链长
    #[inline]
    pub fn is_reachable(&self, chain: &FabrikChain, target: Vec3) -> bool {
        chain.root.distance(target) <= chain.total_length
    }

    /// 让链末端尽量到达目标
    ///
    /// 收敛不保证，但返回时相邻关节间距一定等于段长。
    pub fn solve(&self, chain: &mut FabrikChain, target: Vec3) -> FabrikOutcome {
        if chain.bones.len() < 2 {
            let error = chain.end_effector().distance(target);
            return FabrikOutcome {
                reached: error <= self.config.tolerance,
                iterations: 0,
                error,
            };
        }

        if !self.is_reachable(chain, target) {
            Self::stretch(chain, target);
            return FabrikOutcome {
                reached: false,
                iterations: 0,
                error: chain.end_effector().distance(target),
            };
        }

        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            if chain.end_effector().distance(target) <= self.config.tolerance {
                break;
            }
            Self::forward_reach(chain, target);
            Self::backward_reach(chain);
            iterations += 1;
        }

        let error = chain.end_effector().distance(target);
        let reached = error <= self.config.tolerance;
        if !reached && self.config.debug_log {
            log::trace!(
                "FABRIK 未收敛: {} 关节, {} 次迭代, 误差 {:.4}",
                chain.bones.len(),
                iterations,
                error
            );
        }

        FabrikOutcome {
            reached,
            iterations,
            error,
        }
    }

    /// 目标不可达：沿根→目标方向逐段排开
    fn stretch(chain: &mut FabrikChain, target: Vec3) {
        let dir = (target - chain.root).try_normalize().unwrap_or(REFERENCE_AXIS);
        chain.bones[0].position = chain.root;
        for i in 1..chain.bones.len() {
            let prev = chain.bones[i - 1];
            chain.bones[i].position = prev.position + dir * prev.length;
        }
    }

    /// 前向：末端贴到目标，从后往前逐个拉回
    fn forward_reach(chain: &mut FabrikChain, target: Vec3) {
        let last = chain.bones.len() - 1;
        chain.bones[last].position = target;
        for i in (0..last).rev() {
            let child = chain.bones[i + 1].position;
            let bone = &mut chain.bones[i];
            let dir = (bone.position - child).try_normalize().unwrap_or(-REFERENCE_AXIS);
            bone.position = child + dir * bone.length;
        }
    }

    /// 后向：根回到固定位置，从前往后逐个推出
    fn backward_reach(chain: &mut FabrikChain) {
        chain.bones[0].position = chain.root;
        for i in 1..chain.bones.len() {
            let parent = chain.bones[i - 1];
            let bone = &mut chain.bones[i];
            let dir = (bone.position - parent.position).try_normalize().unwrap_or(REFERENCE_AXIS);
            bone.position = parent.position + dir * parent.length;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Side;
    use std::f32::consts::FRAC_PI_2;

    fn solver() -> FabrikSolver {
        FabrikSolver::with_config(FabrikConfig {
            max_iterations: 10,
            tolerance: 0.01,
            debug_log: false,
        })
    }

    fn vertical_chain() -> FabrikChain {
        FabrikChain::from_positions(&[
            (JointName::LeftUpperArm, Vec3::ZERO),
            (JointName::LeftLowerArm, Vec3::new(0.0, 0.3, 0.0)),
            (JointName::LeftHand, Vec3::new(0.0, 0.6, 0.0)),
        ])
    }

    fn assert_segment_lengths(chain: &FabrikChain) {
        for pair in chain.bones().windows(2) {
            let distance = pair[0].position.distance(pair[1].position);
            assert!(
                (distance - pair[0].length).abs() < 1e-5,
                "{:?}: {} != {}",
                pair[0].name,
                distance,
                pair[0].length
            );
        }
    }

    #[test]
    fn test_init_chain_from_humanoid() {
        let skeleton = Skeleton::humanoid();
        let chain = FabrikChain::init_chain(&JointName::arm(Side::Left), skeleton).unwrap();
        assert_eq!(chain.len(), 3);
        assert!((chain.total_length() - 0.53).abs() < 1e-5);
        assert_eq!(chain.root(), skeleton.rest_world_position(JointName::LeftUpperArm).unwrap());
        let reach = chain.end_effector() - chain.root();
        assert!((reach - Vec3::new(0.53, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_init_chain_missing_joint() {
        let skeleton = Skeleton::humanoid();
        assert!(FabrikChain::init_chain(&[], skeleton).is_none());

        let partial = Skeleton::from_bones(
            skeleton
                .bones()
                .iter()
                .filter(|bone| bone.name != JointName::LeftHand)
                .cloned()
                .collect(),
        )
        .unwrap();
        assert!(FabrikChain::init_chain(&JointName::arm(Side::Left), &partial).is_none());
    }

    #[test]
    fn test_init_chain_through_branching_joints() {
        let skeleton = Skeleton::humanoid();
        let chains = [
            vec![JointName::Hips, JointName::LeftUpperLeg, JointName::LeftLowerLeg, JointName::LeftFoot],
            vec![
                JointName::Chest,
                JointName::LeftShoulder,
                JointName::LeftUpperArm,
                JointName::LeftLowerArm,
                JointName::LeftHand,
            ],
        ];
        for joints in chains {
            let chain = FabrikChain::init_chain(&joints, skeleton).unwrap();
            // 初始位置本身就满足段长
            assert_segment_lengths(&chain);
            let span: f32 = chain.bones()[..chain.len() - 1].iter().map(|bone| bone.length).sum();
            assert!((chain.total_length() - span).abs() < 1e-6);

            // 目标就在末端：零次迭代直接返回
            let mut at_end = chain.clone();
            let outcome = solver().solve(&mut at_end, chain.end_effector());
            assert_eq!(outcome.iterations, 0);
            assert!(outcome.reached);
            assert_segment_lengths(&at_end);

            // 需要迭代的目标
            let mut bent = chain.clone();
            let target = chain.root() + (chain.end_effector() - chain.root()) * 0.7 + Vec3::new(0.0, 0.0, 0.1);
            solver().solve(&mut bent, target);
            assert_segment_lengths(&bent);
        }
    }

    #[test]
    fn test_from_positions_lengths() {
        let chain = vertical_chain();
        assert!((chain.total_length() - 0.6).abs() < 1e-6);
        assert_eq!(chain.bones()[2].length, 0.0);
    }

    #[test]
    fn test_reachable_target() {
        let mut chain = vertical_chain();
        let target = Vec3::new(0.3, 0.3, 0.1);
        let outcome = solver().solve(&mut chain, target);
        assert!(outcome.reached);
        assert!(outcome.iterations <= 10);
        assert!(chain.end_effector().distance(target) <= 0.01);
        assert_eq!(chain.bones()[0].position, Vec3::ZERO);
        assert_segment_lengths(&chain);
    }

    #[test]
    fn test_already_at_target() {
        let mut chain = vertical_chain();
        let outcome = solver().solve(&mut chain, Vec3::new(0.0, 0.6, 0.0));
        assert!(outcome.reached);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_reachability_boundary() {
        let solver = solver();
        let chain = FabrikChain::from_bones(vec![
            FabrikBone { name: JointName::LeftUpperLeg, position: Vec3::ZERO, length: 0.3 },
            FabrikBone { name: JointName::LeftLowerLeg, position: Vec3::new(0.0, -0.3, 0.0), length: 0.3 },
            FabrikBone { name: JointName::LeftFoot, position: Vec3::new(0.0, -0.6, 0.0), length: 0.0 },
        ]);

        assert!(solver.is_reachable(&chain, Vec3::new(0.6, 0.0, 0.0)));
        let mut at_boundary = chain.clone();
        solver.solve(&mut at_boundary, Vec3::new(0.6, 0.0, 0.0));
        assert_segment_lengths(&at_boundary);

        let beyond = Vec3::new(0.6 + 1e-3, 0.0, 0.0);
        assert!(!solver.is_reachable(&chain, beyond));
        let mut stretched = chain.clone();
        let outcome = solver.solve(&mut stretched, beyond);
        assert!(!outcome.reached);
        assert_eq!(outcome.iterations, 0);
        // 拉直分支：所有关节落在根→目标射线上
        for bone in stretched.bones() {
            assert!(bone.position.y.abs() < 1e-6);
            assert!(bone.position.z.abs() < 1e-6);
        }
        assert!((stretched.end_effector().x - 0.6).abs() < 1e-5);
        assert_segment_lengths(&stretched);
    }

    #[test]
    fn test_segment_lengths_always_hold() {
        let solver = FabrikSolver::with_config(FabrikConfig {
            max_iterations: 3,
            tolerance: 1e-6,
            debug_log: true,
        });
        let targets = [
            Vec3::new(0.1, 0.2, 0.0),
            Vec3::new(-0.2, -0.1, 0.3),
            Vec3::new(0.0, 0.05, 0.0),
            Vec3::new(2.0, 1.0, -1.0),
            Vec3::ZERO,
        ];
        for target in targets {
            let mut chain = vertical_chain();
            solver.solve(&mut chain, target);
            assert_segment_lengths(&chain);
        }
    }

    #[test]
    fn test_coincident_positions_keep_lengths() {
        let mut chain = FabrikChain::from_bones(vec![
            FabrikBone { name: JointName::Spine, position: Vec3::ZERO, length: 0.2 },
            FabrikBone { name: JointName::Chest, position: Vec3::ZERO, length: 0.2 },
            FabrikBone { name: JointName::Neck, position: Vec3::ZERO, length: 0.0 },
        ]);
        let outcome = solver().solve(&mut chain, Vec3::new(0.1, 0.1, 0.0));
        assert!(outcome.error.is_finite());
        assert_segment_lengths(&chain);
    }

    #[test]
    fn test_reset_restores_snapshot() {
        let mut chain = vertical_chain();
        let before = chain.positions();
        solver().solve(&mut chain, Vec3::new(0.3, 0.2, 0.0));
        assert_ne!(chain.positions(), before);
        chain.reset();
        assert_eq!(chain.positions(), before);
    }

    #[test]
    fn test_positions_to_rotations() {
        let rotations = vertical_chain().positions_to_rotations();
        assert_eq!(rotations.len(), 3);
        assert!(rotations[&JointName::LeftUpperArm].angle_to(JointRotation::ZERO) < 1e-4);
        assert_eq!(rotations[&JointName::LeftHand], JointRotation::ZERO);

        let horizontal = FabrikChain::from_positions(&[
            (JointName::RightUpperArm, Vec3::ZERO),
            (JointName::RightLowerArm, Vec3::new(0.3, 0.0, 0.0)),
        ]);
        let rotation = horizontal.positions_to_rotations()[&JointName::RightUpperArm];
        assert!(rotation.angle_to(JointRotation::new(0.0, 0.0, -FRAC_PI_2)) < 1e-3);
    }
}
