//! 关节标识 - 人形骨骼的封闭关节集合

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::MotionError;

// ============================================================================
// 左右侧
// ============================================================================

/// 肢体左右侧
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// 侧向符号（左 +X，右 -X）
    #[inline]
    pub fn lateral_sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

// ============================================================================
// 关节名称
// ============================================================================

/// 关节名称（封闭集合）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum JointName {
    Root,
    Hips,
    Spine,
    Chest,
    Neck,
    Head,
    LeftShoulder,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,
    RightShoulder,
    RightUpperArm,
    RightLowerArm,
    RightHand,
    LeftUpperLeg,
    LeftLowerLeg,
    LeftFoot,
    RightUpperLeg,
    RightLowerLeg,
    RightFoot,
}

impl JointName {
    pub const COUNT: usize = 20;

    /// 全部关节（父节点总在子节点之前）
    pub const ALL: [JointName; Self::COUNT] = [
        JointName::Root,
        JointName::Hips,
        JointName::Spine,
        JointName::Chest,
        JointName::Neck,
        JointName::Head,
        JointName::LeftShoulder,
        JointName::LeftUpperArm,
        JointName::LeftLowerArm,
        JointName::LeftHand,
        JointName::RightShoulder,
        JointName::RightUpperArm,
        JointName::RightLowerArm,
        JointName::RightHand,
        JointName::LeftUpperLeg,
        JointName::LeftLowerLeg,
        JointName::LeftFoot,
        JointName::RightUpperLeg,
        JointName::RightLowerLeg,
        JointName::RightFoot,
    ];

    /// 规范名称（camelCase）
    pub fn as_str(self) -> &'static str {
        match self {
            JointName::Root => "root",
            JointName::Hips => "hips",
            JointName::Spine => "spine",
            JointName::Chest => "chest",
            JointName::Neck => "neck",
            JointName::Head => "head",
            JointName::LeftShoulder => "leftShoulder",
            JointName::LeftUpperArm => "leftUpperArm",
            JointName::LeftLowerArm => "leftLowerArm",
            JointName::LeftHand => "leftHand",
            JointName::RightShoulder => "rightShoulder",
            JointName::RightUpperArm => "rightUpperArm",
            JointName::RightLowerArm => "rightLowerArm",
            JointName::RightHand => "rightHand",
            JointName::LeftUpperLeg => "leftUpperLeg",
            JointName::LeftLowerLeg => "leftLowerLeg",
            JointName::LeftFoot => "leftFoot",
            JointName::RightUpperLeg => "rightUpperLeg",
            JointName::RightLowerLeg => "rightLowerLeg",
            JointName::RightFoot => "rightFoot",
        }
    }

    /// 在 `ALL` 中的序号，同时也是 `JointMask` 的位号
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// 所在侧（躯干关节返回 None）
    pub fn side(self) -> Option<Side> {
        match self {
            JointName::LeftShoulder
            | JointName::LeftUpperArm
            | JointName::LeftLowerArm
            | JointName::LeftHand
            | JointName::LeftUpperLeg
            | JointName::LeftLowerLeg
            | JointName::LeftFoot => Some(Side::Left),
            JointName::RightShoulder
            | JointName::RightUpperArm
            | JointName::RightLowerArm
            | JointName::RightHand
            | JointName::RightUpperLeg
            | JointName::RightLowerLeg
            | JointName::RightFoot => Some(Side::Right),
            _ => None,
        }
    }

    /// 某侧的腿部关节 (大腿, 小腿, 脚)
    pub fn leg(side: Side) -> [JointName; 3] {
        match side {
            Side::Left => [JointName::LeftUpperLeg, JointName::LeftLowerLeg, JointName::LeftFoot],
            Side::Right => [JointName::RightUpperLeg, JointName::RightLowerLeg, JointName::RightFoot],
        }
    }

    /// 某侧的手臂关节 (上臂, 前臂, 手)
    pub fn arm(side: Side) -> [JointName; 3] {
        match side {
            Side::Left => [JointName::LeftUpperArm, JointName::LeftLowerArm, JointName::LeftHand],
            Side::Right => [JointName::RightUpperArm, JointName::RightLowerArm, JointName::RightHand],
        }
    }
}

impl fmt::Display for JointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JointName {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JointName::ALL
            .iter()
            .copied()
            .find(|joint| joint.as_str() == s)
            .ok_or_else(|| MotionError::UnknownJoint(s.to_string()))
    }
}

// ============================================================================
// 关节集合
// ============================================================================

bitflags! {
    /// 关节位集合，位号即 `JointName::index`
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct JointMask: u32 {
        const ROOT = 1 << 0;
        const HIPS = 1 << 1;
        const SPINE = 1 << 2;
        const CHEST = 1 << 3;
        const NECK = 1 << 4;
        const HEAD = 1 << 5;
        const LEFT_SHOULDER = 1 << 6;
        const LEFT_UPPER_ARM = 1 << 7;
        const LEFT_LOWER_ARM = 1 << 8;
        const LEFT_HAND = 1 << 9;
        const RIGHT_SHOULDER = 1 << 10;
        const RIGHT_UPPER_ARM = 1 << 11;
        const RIGHT_LOWER_ARM = 1 << 12;
        const RIGHT_HAND = 1 << 13;
        const LEFT_UPPER_LEG = 1 << 14;
        const LEFT_LOWER_LEG = 1 << 15;
        const LEFT_FOOT = 1 << 16;
        const RIGHT_UPPER_LEG = 1 << 17;
        const RIGHT_LOWER_LEG = 1 << 18;
        const RIGHT_FOOT = 1 << 19;

        /// 播放动画所需的最小关节集合
        const REQUIRED = Self::HIPS.bits()
            | Self::SPINE.bits()
            | Self::HEAD.bits()
            | Self::LEFT_UPPER_ARM.bits()
            | Self::LEFT_LOWER_ARM.bits()
            | Self::RIGHT_UPPER_ARM.bits()
            | Self::RIGHT_LOWER_ARM.bits()
            | Self::LEFT_UPPER_LEG.bits()
            | Self::LEFT_LOWER_LEG.bits()
            | Self::RIGHT_UPPER_LEG.bits()
            | Self::RIGHT_LOWER_LEG.bits();
    }
}

impl JointMask {
    #[inline]
    pub fn of(joint: JointName) -> Self {
        Self::from_bits_truncate(1 << joint.index())
    }

    /// 展开为关节列表（按 `JointName::ALL` 顺序）
    pub fn joints(self) -> Vec<JointName> {
        JointName::ALL
            .iter()
            .copied()
            .filter(|joint| self.contains(Self::of(*joint)))
            .collect()
    }
}

impl FromIterator<JointName> for JointMask {
    fn from_iter<I: IntoIterator<Item = JointName>>(iter: I) -> Self {
        iter.into_iter().fold(JointMask::empty(), |mask, joint| mask | JointMask::of(joint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for joint in JointName::ALL {
            assert_eq!(joint.as_str().parse::<JointName>().unwrap(), joint);
        }
    }

    #[test]
    fn test_unknown_name() {
        let err = "tail".parse::<JointName>().unwrap_err();
        assert_eq!(err, MotionError::UnknownJoint("tail".to_string()));
    }

    #[test]
    fn test_mask_bits_follow_index() {
        assert_eq!(JointMask::of(JointName::Head), JointMask::HEAD);
        assert_eq!(JointMask::of(JointName::RightFoot), JointMask::RIGHT_FOOT);
        assert_eq!(JointMask::REQUIRED.joints().len(), 11);
    }

    #[test]
    fn test_sides() {
        assert_eq!(JointName::LeftFoot.side(), Some(Side::Left));
        assert_eq!(JointName::Spine.side(), None);
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(JointName::leg(Side::Right)[1], JointName::RightLowerLeg);
    }
}
