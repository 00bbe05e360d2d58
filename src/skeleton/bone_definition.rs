//! 骨骼定义 - 静态层次结构
//!
//! BoneDefinition 只描述骨骼的固有属性（父子关系、静止偏移、长度），
//! 不携带任何每帧状态。Skeleton 负责按名称查找和沿父链遍历。

use glam::Vec3;
use once_cell::sync::Lazy;

use crate::animation::{JointRotation, JointRotationMap};
use crate::{MotionError, Result};

use super::joint::JointName;

// ============================================================================
// 骨骼定义
// ============================================================================

/// 单根骨骼的静态定义
#[derive(Clone, Debug, PartialEq)]
pub struct BoneDefinition {
    /// 关节名称
    pub name: JointName,
    /// 父关节（仅根骨骼为 None）
    pub parent: Option<JointName>,
    /// 静止姿势下相对父关节的偏移
    pub local_offset: Vec3,
    /// 默认旋转
    pub default_rotation: JointRotation,
    /// 到子关节的长度（>= 0）
    pub length: f32,
}

impl BoneDefinition {
    pub fn new(name: JointName, parent: Option<JointName>, local_offset: Vec3, length: f32) -> Self {
        Self {
            name,
            parent,
            local_offset,
            default_rotation: JointRotation::ZERO,
            length: length.max(0.0),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

// ============================================================================
// 骨骼层次
// ============================================================================

/// 骨骼层次（以 root 为根的树）
#[derive(Clone, Debug)]
pub struct Skeleton {
    bones: Vec<BoneDefinition>,
    /// 关节序号 -> bones 下标
    lookup: [Option<usize>; JointName::COUNT],
}

impl Skeleton {
    /// 从骨骼定义列表构建，校验树结构
    pub fn from_bones(bones: Vec<BoneDefinition>) -> Result<Self> {
        let mut lookup = [None; JointName::COUNT];
        let mut root = None;

        for (i, bone) in bones.iter().enumerate() {
            if lookup[bone.name.index()].is_some() {
                return Err(MotionError::InvalidHierarchy(format!(
                    "duplicate joint '{}'",
                    bone.name
                )));
            }
            lookup[bone.name.index()] = Some(i);

            if bone.parent.is_none() {
                if let Some(existing) = root {
                    return Err(MotionError::InvalidHierarchy(format!(
                        "second root '{}' (already rooted at '{}')",
                        bone.name, existing
                    )));
                }
                root = Some(bone.name);
            }
        }

        match root {
            Some(JointName::Root) => {}
            Some(other) => {
                return Err(MotionError::InvalidHierarchy(format!(
                    "hierarchy must be rooted at 'root', found '{}'",
                    other
                )))
            }
            None => {
                if !bones.is_empty() {
                    return Err(MotionError::InvalidHierarchy("no root joint".to_string()));
                }
            }
        }

        let skeleton = Self::new_unchecked(bones);

        for bone in &skeleton.bones {
            if let Some(parent) = bone.parent {
                if !skeleton.contains(parent) {
                    return Err(MotionError::InvalidHierarchy(format!(
                        "joint '{}' references missing parent '{}'",
                        bone.name, parent
                    )));
                }
            }
            // 父链长度超过骨骼数即存在环
            if skeleton.parent_chain(bone.name).nth(skeleton.bones.len()).is_some() {
                return Err(MotionError::InvalidHierarchy(format!(
                    "cycle through joint '{}'",
                    bone.name
                )));
            }
        }

        Ok(skeleton)
    }

    fn new_unchecked(bones: Vec<BoneDefinition>) -> Self {
        let mut lookup = [None; JointName::COUNT];
        for (i, bone) in bones.iter().enumerate() {
            lookup[bone.name.index()] = Some(i);
        }
        Self { bones, lookup }
    }

    /// 内置人形骨骼（Y 轴向上，面朝 +Z，左侧 +X）
    pub fn humanoid() -> &'static Skeleton {
        &HUMANOID
    }

    /// 按名称查找骨骼
    #[inline]
    pub fn bone(&self, name: JointName) -> Option<&BoneDefinition> {
        self.lookup[name.index()].map(|i| &self.bones[i])
    }

    #[inline]
    pub fn contains(&self, name: JointName) -> bool {
        self.lookup[name.index()].is_some()
    }

    #[inline]
    pub fn parent(&self, name: JointName) -> Option<JointName> {
        self.bone(name).and_then(|bone| bone.parent)
    }

    /// 沿父链向上遍历（不含自身）
    pub fn parent_chain(&self, name: JointName) -> ParentChain<'_> {
        ParentChain {
            skeleton: self,
            next: self.parent(name),
        }
    }

    /// 直接子关节
    pub fn children(&self, name: JointName) -> Vec<JointName> {
        self.bones
            .iter()
            .filter(|bone| bone.parent == Some(name))
            .map(|bone| bone.name)
            .collect()
    }

    /// 从 ancestor 到 descendant 的关节序列（含两端）
    ///
    /// descendant 不在 ancestor 之下时返回 None
    pub fn chain_between(&self, ancestor: JointName, descendant: JointName) -> Option<Vec<JointName>> {
        if !self.contains(descendant) {
            return None;
        }
        let mut chain = vec![descendant];
        if ancestor == descendant {
            return Some(chain);
        }
        for joint in self.parent_chain(descendant) {
            chain.push(joint);
            if joint == ancestor {
                chain.reverse();
                return Some(chain);
            }
        }
        None
    }

    /// 静止姿势下的世界位置（累加父链上的偏移）
    pub fn rest_world_position(&self, name: JointName) -> Option<Vec3> {
        let bone = self.bone(name)?;
        let offset = self
            .parent_chain(name)
            .filter_map(|joint| self.bone(joint))
            .map(|bone| bone.local_offset)
            .sum::<Vec3>();
        Some(bone.local_offset + offset)
    }

    /// 静止姿势（各骨骼的默认旋转）
    pub fn rest_pose(&self) -> JointRotationMap {
        self.bones
            .iter()
            .map(|bone| (bone.name, bone.default_rotation))
            .collect()
    }

    pub fn bones(&self) -> &[BoneDefinition] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

/// 父链迭代器
pub struct ParentChain<'a> {
    skeleton: &'a Skeleton,
    next: Option<JointName>,
}

impl Iterator for ParentChain<'_> {
    type Item = JointName;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.skeleton.parent(current);
        Some(current)
    }
}

// ============================================================================
// 内置人形骨骼
// ============================================================================

fn humanoid_bones() -> Vec<BoneDefinition> {
    use JointName::*;

    let mut bones = vec![
        BoneDefinition::new(Root, None, Vec3::ZERO, 0.0),
        BoneDefinition::new(Hips, Some(Root), Vec3::new(0.0, 0.95, 0.0), 0.1),
        BoneDefinition::new(Spine, Some(Hips), Vec3::new(0.0, 0.1, 0.0), 0.15),
        BoneDefinition::new(Chest, Some(Spine), Vec3::new(0.0, 0.15, 0.0), 0.2),
        BoneDefinition::new(Neck, Some(Chest), Vec3::new(0.0, 0.2, 0.0), 0.1),
        BoneDefinition::new(Head, Some(Neck), Vec3::new(0.0, 0.1, 0.0), 0.2),
    ];

    for (sign, shoulder, upper_arm, lower_arm, hand) in [
        (1.0, LeftShoulder, LeftUpperArm, LeftLowerArm, LeftHand),
        (-1.0, RightShoulder, RightUpperArm, RightLowerArm, RightHand),
    ] {
        bones.push(BoneDefinition::new(shoulder, Some(Chest), Vec3::new(0.05 * sign, 0.15, 0.0), 0.12));
        bones.push(BoneDefinition::new(upper_arm, Some(shoulder), Vec3::new(0.12 * sign, 0.0, 0.0), 0.28));
        bones.push(BoneDefinition::new(lower_arm, Some(upper_arm), Vec3::new(0.28 * sign, 0.0, 0.0), 0.25));
        bones.push(BoneDefinition::new(hand, Some(lower_arm), Vec3::new(0.25 * sign, 0.0, 0.0), 0.08));
    }

    for (sign, upper_leg, lower_leg, foot) in [
        (1.0, LeftUpperLeg, LeftLowerLeg, LeftFoot),
        (-1.0, RightUpperLeg, RightLowerLeg, RightFoot),
    ] {
        bones.push(BoneDefinition::new(upper_leg, Some(Hips), Vec3::new(0.1 * sign, -0.05, 0.0), 0.45));
        bones.push(BoneDefinition::new(lower_leg, Some(upper_leg), Vec3::new(0.0, -0.45, 0.0), 0.42));
        bones.push(BoneDefinition::new(foot, Some(lower_leg), Vec3::new(0.0, -0.42, 0.0), 0.1));
    }

    bones
}

// 结构由 test_humanoid_is_complete_tree 保证
static HUMANOID: Lazy<Skeleton> = Lazy::new(|| Skeleton::new_unchecked(humanoid_bones()));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanoid_is_complete_tree() {
        assert!(Skeleton::from_bones(humanoid_bones()).is_ok());
        let skeleton = Skeleton::humanoid();
        assert_eq!(skeleton.len(), JointName::ALL.len());
        for joint in JointName::ALL {
            let bone = skeleton.bone(joint).unwrap();
            assert_eq!(bone.is_root(), joint == JointName::Root);
            // 每个关节都能回溯到 root
            let top = skeleton.parent_chain(joint).last().unwrap_or(joint);
            assert_eq!(top, JointName::Root);
        }
    }

    #[test]
    fn test_parent_chain_order() {
        let skeleton = Skeleton::humanoid();
        let chain: Vec<_> = skeleton.parent_chain(JointName::LeftHand).collect();
        assert_eq!(
            chain,
            vec![
                JointName::LeftLowerArm,
                JointName::LeftUpperArm,
                JointName::LeftShoulder,
                JointName::Chest,
                JointName::Spine,
                JointName::Hips,
                JointName::Root,
            ]
        );
    }

    #[test]
    fn test_chain_between() {
        let skeleton = Skeleton::humanoid();
        assert_eq!(
            skeleton.chain_between(JointName::RightUpperLeg, JointName::RightFoot),
            Some(vec![JointName::RightUpperLeg, JointName::RightLowerLeg, JointName::RightFoot])
        );
        assert_eq!(skeleton.chain_between(JointName::LeftUpperLeg, JointName::RightFoot), None);
    }

    #[test]
    fn test_rest_world_position() {
        let skeleton = Skeleton::humanoid();
        let hip = skeleton.rest_world_position(JointName::LeftUpperLeg).unwrap();
        assert!((hip - Vec3::new(0.1, 0.9, 0.0)).length() < 1e-5);
        let ankle = skeleton.rest_world_position(JointName::LeftFoot).unwrap();
        assert!((ankle.y - 0.03).abs() < 1e-5);
    }

    #[test]
    fn test_children() {
        let skeleton = Skeleton::humanoid();
        let mut children = skeleton.children(JointName::Hips);
        children.sort();
        assert_eq!(children, vec![JointName::Spine, JointName::LeftUpperLeg, JointName::RightUpperLeg]);
    }

    #[test]
    fn test_rejects_cycle() {
        let bones = vec![
            BoneDefinition::new(JointName::Root, None, Vec3::ZERO, 0.0),
            BoneDefinition::new(JointName::Hips, Some(JointName::Spine), Vec3::ZERO, 0.1),
            BoneDefinition::new(JointName::Spine, Some(JointName::Hips), Vec3::ZERO, 0.1),
        ];
        assert!(matches!(Skeleton::from_bones(bones), Err(MotionError::InvalidHierarchy(_))));
    }

    #[test]
    fn test_rejects_missing_parent_and_second_root() {
        let dangling = vec![
            BoneDefinition::new(JointName::Root, None, Vec3::ZERO, 0.0),
            BoneDefinition::new(JointName::Head, Some(JointName::Neck), Vec3::ZERO, 0.1),
        ];
        assert!(Skeleton::from_bones(dangling).is_err());

        let two_roots = vec![
            BoneDefinition::new(JointName::Root, None, Vec3::ZERO, 0.0),
            BoneDefinition::new(JointName::Hips, None, Vec3::ZERO, 0.1),
        ];
        assert!(Skeleton::from_bones(two_roots).is_err());
    }

    #[test]
    fn test_missing_optional_joint_is_not_found() {
        let bones = vec![
            BoneDefinition::new(JointName::Root, None, Vec3::ZERO, 0.0),
            BoneDefinition::new(JointName::Hips, Some(JointName::Root), Vec3::Y, 0.1),
        ];
        let skeleton = Skeleton::from_bones(bones).unwrap();
        assert!(skeleton.bone(JointName::LeftHand).is_none());
        assert_eq!(skeleton.rest_world_position(JointName::LeftHand), None);
    }
}
