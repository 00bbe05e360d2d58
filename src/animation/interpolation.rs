//! 插值基础 - 欧拉角 / 四元数转换、SLERP 与缓动曲线
//!
//! 关键帧以欧拉角存储，插值一律转成四元数进行，避免逐轴 lerp 的万向节锁。

use std::collections::BTreeMap;

use glam::{EulerRot, Quat, Vec3};

use crate::skeleton::JointName;

/// 欧拉角顺序（内旋 X→Y→Z）
pub const EULER_ORDER: EulerRot = EulerRot::XYZ;

// ============================================================================
// 关节旋转
// ============================================================================

/// 关节旋转（欧拉角，弧度）
///
/// 角度不做任何隐式回绕。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointRotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 关节 -> 旋转（有序，迭代顺序稳定）
pub type JointRotationMap = BTreeMap<JointName, JointRotation>;

impl JointRotation {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// 转为单位四元数
    #[inline]
    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EULER_ORDER, self.x, self.y, self.z)
    }

    /// 从四元数分解
    #[inline]
    pub fn from_quat(q: Quat) -> Self {
        let (x, y, z) = q.normalize().to_euler(EULER_ORDER);
        Self::new(x, y, z)
    }

    /// 两个朝向之间的角距离（弧度，[0, π]）
    #[inline]
    pub fn angle_to(self, other: Self) -> f32 {
        self.to_quat().angle_between(other.to_quat())
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Vec3> for JointRotation {
    fn from(v: Vec3) -> Self {
        Self::from_vec3(v)
    }
}

impl From<JointRotation> for Vec3 {
    fn from(r: JointRotation) -> Self {
        r.to_vec3()
    }
}

// ============================================================================
// 缓动曲线
// ============================================================================

/// 曲线 trait
pub trait Curve {
    fn value(&self, t: f32) -> f32;
}

/// 三次缓入缓出
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EaseInOutCubic;

impl Curve for EaseInOutCubic {
    fn value(&self, t: f32) -> f32 {
        ease_in_out_cubic(t)
    }
}

/// 线性（不缓动）
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Linear;

impl Curve for Linear {
    fn value(&self, t: f32) -> f32 {
        t
    }
}

// ============================================================================
// 插值函数
// ============================================================================

/// 标量线性插值
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// 三次缓入缓出 [0,1] → [0,1]
///
/// t < 0.5: 4t³；否则 1 - (-2t + 2)³ / 2
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// 欧拉角球面插值（t 先经三次缓动）
///
/// 走最短弧；t=0 返回 from，t=1 返回 to（浮点误差内）。
pub fn slerp_rotation(from: JointRotation, to: JointRotation, t: f32) -> JointRotation {
    slerp_rotation_with(from, to, t, &EaseInOutCubic)
}

/// 使用指定曲线重映射 t 后做球面插值
pub fn slerp_rotation_with(from: JointRotation, to: JointRotation, t: f32, curve: &dyn Curve) -> JointRotation {
    let amount = curve.value(t);
    // 端点直接返回，避免一次欧拉角往返的舍入误差
    if amount == 0.0 {
        return from;
    }
    if amount == 1.0 {
        return to;
    }
    JointRotation::from_quat(from.to_quat().slerp(to.to_quat(), amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rotation_eq(a: JointRotation, b: JointRotation, eps: f32) {
        assert!(a.angle_to(b) < eps, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
        assert!((lerp(2.0, 4.0, 0.25) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_ease_in_out_cubic() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
        assert!(ease_in_out_cubic(0.25) < 0.25);
        assert!(ease_in_out_cubic(0.75) > 0.75);

        let mut prev = 0.0;
        for i in 1..=100 {
            let v = ease_in_out_cubic(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn test_euler_quat_round_trip() {
        let r = JointRotation::new(0.4, -0.3, 1.1);
        let back = JointRotation::from_quat(r.to_quat());
        assert!((back.to_vec3() - r.to_vec3()).length() < 1e-5);
    }

    #[test]
    fn test_slerp_endpoints() {
        let cases = [
            (JointRotation::new(0.0, 0.0, 0.0), JointRotation::new(1.2, 0.0, 0.0)),
            (JointRotation::new(0.3, -0.5, 0.2), JointRotation::new(-1.0, 0.8, 2.5)),
            (JointRotation::new(-2.0, 1.2, -0.4), JointRotation::new(0.5, -0.3, 3.0)),
        ];
        for (a, b) in cases {
            assert_eq!(slerp_rotation(a, b, 0.0), a);
            assert_eq!(slerp_rotation(a, b, 1.0), b);
            assert_rotation_eq(slerp_rotation(a, b, 1e-7), a, 5e-3);
            assert_rotation_eq(slerp_rotation(a, b, 1.0 - 1e-7), b, 5e-3);
        }
    }

    #[test]
    fn test_slerp_monotonic_distance() {
        let a = JointRotation::new(0.3, -0.5, 0.2);
        let b = JointRotation::new(-1.0, 0.8, 2.5);
        let mut prev = 0.0;
        for i in 0..=50 {
            let r = slerp_rotation(a, b, i as f32 / 50.0);
            let d = a.angle_to(r);
            assert!(d + 5e-3 >= prev, "distance decreased at step {}", i);
            prev = d;
        }
    }

    #[test]
    fn test_slerp_shortest_arc() {
        // 绕 Z 轴 170° 到 -170°，最短弧只经过 20°
        let a = JointRotation::new(0.0, 0.0, 170f32.to_radians());
        let b = JointRotation::new(0.0, 0.0, -170f32.to_radians());
        let mid = slerp_rotation(a, b, 0.5);
        assert!(a.angle_to(mid) < 11f32.to_radians());
        assert!(b.angle_to(mid) < 11f32.to_radians());
    }

    #[test]
    fn test_linear_curve() {
        let a = JointRotation::ZERO;
        let b = JointRotation::new(1.0, 0.0, 0.0);
        let r = slerp_rotation_with(a, b, 0.25, &Linear);
        assert!((r.x - 0.25).abs() < 1e-4);
    }
}
