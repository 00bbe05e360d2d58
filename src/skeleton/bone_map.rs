//! 骨骼映射 - 规范关节名到模型实际骨骼的绑定
//!
//! 名称解析由外部的模型加载组件完成，这里只保存结果并校验最小关节集合。

use std::collections::BTreeMap;

use crate::{MotionError, Result};

use super::bone_definition::Skeleton;
use super::joint::{JointMask, JointName};

/// 规范关节 -> 模型骨骼名称
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoneMap {
    entries: BTreeMap<JointName, String>,
}

impl BoneMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每个关节都映射到自身规范名（内置骨骼使用）
    pub fn canonical() -> Self {
        JointName::ALL
            .iter()
            .map(|joint| (*joint, joint.as_str().to_string()))
            .collect()
    }

    /// 按骨骼层次中存在的关节生成映射
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        skeleton
            .bones()
            .iter()
            .map(|bone| (bone.name, bone.name.as_str().to_string()))
            .collect()
    }

    /// 绑定关节，返回之前的绑定
    pub fn insert(&mut self, joint: JointName, model_bone: impl Into<String>) -> Option<String> {
        self.entries.insert(joint, model_bone.into())
    }

    pub fn remove(&mut self, joint: JointName) -> Option<String> {
        self.entries.remove(&joint)
    }

    /// 查询模型骨骼名；未绑定返回 None
    pub fn get(&self, joint: JointName) -> Option<&str> {
        self.entries.get(&joint).map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, joint: JointName) -> bool {
        self.entries.contains_key(&joint)
    }

    /// 已绑定关节的位集合
    pub fn present_mask(&self) -> JointMask {
        self.entries.keys().copied().collect()
    }

    /// 缺失的必需关节
    pub fn missing_required(&self) -> Vec<JointName> {
        (JointMask::REQUIRED - self.present_mask()).joints()
    }

    /// 校验最小关节集合（髋、脊柱、头、双臂上下段、双腿上下段）
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            log::warn!("骨骼映射不完整，缺少 {} 个必需关节: {:?}", missing.len(), missing);
            Err(MotionError::IncompleteSkeleton(missing))
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.present_mask().contains(JointMask::REQUIRED)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointName, &str)> {
        self.entries.iter().map(|(joint, name)| (*joint, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(JointName, S)> for BoneMap {
    fn from_iter<I: IntoIterator<Item = (JointName, S)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(joint, name)| (joint, name.into())).collect(),
        }
    }
}
