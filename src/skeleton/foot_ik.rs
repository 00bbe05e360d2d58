//! 脚部 IK - 落地判定、目标平滑与腿部求解
//!
//! 目标状态与当前状态双缓冲：每帧先按步态计算目标，
//! 再把当前状态按速率插值过去，最后用当前状态解腿部 IK。

use glam::{Quat, Vec3};

use crate::animation::{GaitPhase, JointRotationMap, EULER_ORDER};
use crate::config::{get_config, MotionConfig};

use super::bone_definition::Skeleton;
use super::joint::{JointName, Side};
use super::leg_ik::{LegIkConfig, LegIkSolution, LegIkSolver};

/// 支撑脚承担的体重比例
const STANCE_WEIGHT: f32 = 0.5;

// ============================================================================
// 数据类型
// ============================================================================

/// 单脚目标
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootTarget {
    pub position: Vec3,
    pub rotation: Quat,
    pub is_grounded: bool,
    /// 承重比例 [0, 1]（仅供参考）
    pub weight: f32,
}

impl Default for FootTarget {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            is_grounded: true,
            weight: STANCE_WEIGHT,
        }
    }
}

/// 双脚状态
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FootIkState {
    pub left: FootTarget,
    pub right: FootTarget,
}

impl FootIkState {
    #[inline]
    pub fn get(&self, side: Side) -> &FootTarget {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, side: Side) -> &mut FootTarget {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// 双侧髋关节的世界位置（由渲染端每帧提供）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HipPositions {
    pub left: Vec3,
    pub right: Vec3,
}

impl HipPositions {
    pub fn new(left: Vec3, right: Vec3) -> Self {
        Self { left, right }
    }

    /// 静止骨骼的髋位置，整体按根高度偏移
    pub fn from_rest(skeleton: &Skeleton, root_height: f32) -> Option<Self> {
        let lift = Vec3::new(0.0, root_height, 0.0);
        Some(Self {
            left: skeleton.rest_world_position(JointName::LeftUpperLeg)? + lift,
            right: skeleton.rest_world_position(JointName::RightUpperLeg)? + lift,
        })
    }

    #[inline]
    pub fn get(&self, side: Side) -> Vec3 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// 骨盆中心
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.left + self.right) * 0.5
    }
}

// ============================================================================
// 配置
// ============================================================================

/// 脚部 IK 配置
#[derive(Clone, Debug, PartialEq)]
pub struct FootIkConfig {
    pub ground_level: f32,
    /// 摆动腿抬脚高度
    pub swing_height: f32,
    /// 脚相对骨盆中心的侧向偏移
    pub lateral_offset: f32,
    /// 摆动时的脚背屈角（弧度）
    pub swing_dorsiflexion: f32,
    /// 平滑速度（每秒）
    pub smoothing_speed: f32,
    pub leg: LegIkConfig,
}

impl From<&MotionConfig> for FootIkConfig {
    fn from(config: &MotionConfig) -> Self {
        Self {
            ground_level: config.ground_level,
            swing_height: config.swing_height,
            lateral_offset: config.foot_lateral_offset,
            swing_dorsiflexion: config.swing_dorsiflexion,
            smoothing_speed: config.foot_smoothing_speed,
            leg: LegIkConfig::from(config),
        }
    }
}

impl Default for FootIkConfig {
    fn default() -> Self {
        Self::from(&get_config())
    }
}

// ============================================================================
// 脚部 IK
// ============================================================================

/// 脚部 IK（每个虚拟人一个实例）
#[derive(Clone, Debug)]
pub struct FootIk {
    config: FootIkConfig,
    solver: LegIkSolver,
    current: FootIkState,
    target: FootIkState,
    /// 当前状态是否已由目标初始化
    primed: bool,
}

impl Default for FootIk {
    fn default() -> Self {
        Self::with_config(FootIkConfig::default())
    }
}

impl FootIk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FootIkConfig) -> Self {
        Self {
            solver: LegIkSolver::with_config(config.leg.clone()),
            config,
            current: FootIkState::default(),
            target: FootIkState::default(),
            primed: false,
        }
    }

    pub fn config(&self) -> &FootIkConfig {
        &self.config
    }

    #[inline]
    pub fn current(&self) -> &FootIkState {
        &self.current
    }

    #[inline]
    pub fn target(&self) -> &FootIkState {
        &self.target
    }

    /// 清空平滑历史，下一帧直接跳到目标
    pub fn reset(&mut self) {
        self.current = FootIkState::default();
        self.target = FootIkState::default();
        self.primed = false;
    }

    /// 落地目标
    ///
    /// `pelvis_center` 是骨盆中心（`HipPositions::center()`），不是单侧髋关节：
    /// 脚放在其正下方的地面上，再按侧别偏移 ±lateral_offset。
    /// 摆动侧抬高并背屈；根节点向下（root_vertical_offset < 0）时一律按支撑处理，防止下蹲时脚悬空。
    pub fn calculate_ground_contact(
        &self,
        pelvis_center: Vec3,
        side: Side,
        gait: GaitPhase,
        root_vertical_offset: f32,
    ) -> FootTarget {
        let position = Vec3::new(
            pelvis_center.x + side.lateral_sign() * self.config.lateral_offset,
            self.config.ground_level,
            pelvis_center.z,
        );

        let crouching = root_vertical_offset < 0.0;
        if gait.is_swing(side) && !crouching {
            FootTarget {
                position: position + Vec3::new(0.0, self.config.swing_height, 0.0),
                rotation: Quat::from_rotation_x(-self.config.swing_dorsiflexion),
                is_grounded: false,
                weight: 0.0,
            }
        } else {
            FootTarget {
                position,
                rotation: Quat::IDENTITY,
                is_grounded: true,
                weight: STANCE_WEIGHT,
            }
        }
    }

    /// 重新计算双脚目标
    pub fn update_targets(&mut self, hips: &HipPositions, gait: GaitPhase, root_vertical_offset: f32) {
        let center = hips.center();
        for side in [Side::Left, Side::Right] {
            *self.target.get_mut(side) = self.calculate_ground_contact(center, side, gait, root_vertical_offset);
        }
    }

    /// 当前状态向目标插值（速率 = speed·dt，上限 1）
    pub fn smooth(&mut self, delta_time: f32) {
        if !self.primed {
            self.current = self.target;
            self.primed = true;
            return;
        }

        let rate = (self.config.smoothing_speed * delta_time).clamp(0.0, 1.0);
        for side in [Side::Left, Side::Right] {
            let target = *self.target.get(side);
            let current = self.current.get_mut(side);
            current.position = current.position.lerp(target.position, rate);
            current.rotation = current.rotation.slerp(target.rotation, rate);
            current.weight += (target.weight - current.weight) * rate;
            current.is_grounded = target.is_grounded;
        }
    }

    /// 解单腿 IK
    #[inline]
    pub fn solve_leg_ik(&self, hip: Vec3, target: Vec3, side: Side) -> LegIkSolution {
        self.solver.solve(hip, target, side)
    }

    /// 计算目标 → 平滑 → 解 IK，覆盖双腿的大腿 / 小腿 / 脚旋转
    pub fn apply(
        &mut self,
        joints: &mut JointRotationMap,
        hips: &HipPositions,
        gait: GaitPhase,
        root_vertical_offset: f32,
        delta_time: f32,
    ) -> [LegIkSolution; 2] {
        self.update_targets(hips, gait, root_vertical_offset);
        self.smooth(delta_time);

        [Side::Left, Side::Right].map(|side| {
            let foot = self.current.get(side);
            let mut solution = self.solve_leg_ik(hips.get(side), foot.position, side);
            let (pitch, _, _) = foot.rotation.to_euler(EULER_ORDER);
            solution.ankle.x += pitch;
            solution.write_to(joints);
            solution
        })
    }
}
