//! 动画控制器 - 播放状态机
//!
//! 由外部每帧调用 `update(delta_time)` 推进归一化时间，
//! 阶段变化时边沿触发一次回调。

use std::fmt;

use super::keyframe::{AnimationPhase, ExerciseAnimationData};
use super::pose::{current_phase_index, interpolate_pose, InterpolatedPose};

/// 播放状态
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// 阶段变化通知
#[derive(Clone, Copy, Debug)]
pub struct PhaseChange<'a> {
    pub previous: Option<&'a AnimationPhase>,
    pub current: Option<&'a AnimationPhase>,
}

impl PhaseChange<'_> {
    pub fn current_name(&self) -> Option<&str> {
        self.current.map(|phase| phase.name.as_str())
    }

    pub fn previous_name(&self) -> Option<&str> {
        self.previous.map(|phase| phase.name.as_str())
    }
}

type PhaseCallback = Box<dyn FnMut(&PhaseChange<'_>)>;

/// 动画控制器（每个虚拟人一个实例）
pub struct AnimationController {
    animation: Option<ExerciseAnimationData>,
    state: PlaybackState,
    /// 归一化时间 [0, 1]
    time: f32,
    /// 播放速度倍率
    speed: f32,
    /// 上次记录的阶段下标
    current_phase: Option<usize>,
    on_phase_change: Option<PhaseCallback>,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationController")
            .field("animation", &self.animation.as_ref().map(|a| a.name.as_str()))
            .field("state", &self.state)
            .field("time", &self.time)
            .field("speed", &self.speed)
            .field("current_phase", &self.current_phase)
            .field("has_phase_callback", &self.on_phase_change.is_some())
            .finish()
    }
}

impl AnimationController {
    pub fn new() -> Self {
        Self {
            animation: None,
            state: PlaybackState::Stopped,
            time: 0.0,
            speed: 1.0,
            current_phase: None,
            on_phase_change: None,
        }
    }

    // ========================================
    // 动画加载
    // ========================================

    /// 加载动画：时间归零，阶段记录清空，速度取默认节奏
    pub fn load(&mut self, animation: ExerciseAnimationData) {
        log::debug!(
            "加载动画 '{}': {} 关键帧, {} 阶段, 时长 {}s, 循环={}",
            animation.name,
            animation.keyframes.len(),
            animation.phases.len(),
            animation.duration,
            animation.looping
        );
        self.speed = animation.default_tempo;
        self.animation = Some(animation);
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
        self.current_phase = None;
    }

    /// 卸载动画
    pub fn unload(&mut self) -> Option<ExerciseAnimationData> {
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
        self.current_phase = None;
        self.animation.take()
    }

    pub fn animation(&self) -> Option<&ExerciseAnimationData> {
        self.animation.as_ref()
    }

    // ========================================
    // 状态切换
    // ========================================

    /// 开始播放；非循环动画已播完时从头开始
    pub fn play(&mut self) {
        let Some(animation) = self.animation.as_ref() else {
            return;
        };
        if !animation.looping && self.time >= 1.0 {
            self.time = 0.0;
        }
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// 停止并把时间归零
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
    }

    /// 拖动进度（夹紧到 [0, 1]）
    pub fn set_time(&mut self, time: f32) {
        self.time = time.clamp(0.0, 1.0);
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// 与 `set_speed` 等价
    pub fn set_tempo(&mut self, tempo: f32) {
        self.set_speed(tempo);
    }

    /// 注册阶段变化回调（替换旧回调）
    pub fn on_phase_change<F>(&mut self, callback: F)
    where
        F: FnMut(&PhaseChange<'_>) + 'static,
    {
        self.on_phase_change = Some(Box::new(callback));
    }

    pub fn clear_phase_callback(&mut self) {
        self.on_phase_change = None;
    }

    // ========================================
    // 查询
    // ========================================

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// 上次 `update` 记录的阶段
    pub fn current_phase(&self) -> Option<&AnimationPhase> {
        let animation = self.animation.as_ref()?;
        self.current_phase.map(|i| &animation.phases[i])
    }

    // ========================================
    // 逐帧更新
    // ========================================

    /// 推进一帧，返回当前时间的插值姿势；未加载动画时返回 None
    pub fn update(&mut self, delta_time: f32) -> Option<InterpolatedPose> {
        let animation = self.animation.as_ref()?;

        if self.state == PlaybackState::Playing {
            let step = if animation.duration > 0.0 {
                delta_time * self.speed / animation.duration
            } else {
                1.0
            };
            let time = self.time + step;

            self.time = if animation.looping {
                time.rem_euclid(1.0)
            } else if time >= 1.0 {
                self.state = PlaybackState::Stopped;
                log::debug!("动画 '{}' 播放完成", animation.name);
                1.0
            } else {
                time.max(0.0)
            };
        }

        self.refresh_phase();

        self.animation.as_ref().map(|animation| interpolate_pose(animation, self.time))
    }

    /// 重新计算阶段，变化时触发回调
    fn refresh_phase(&mut self) {
        let Some(animation) = self.animation.as_ref() else {
            return;
        };

        let index = current_phase_index(animation, self.time);
        if index == self.current_phase {
            return;
        }

        let previous = std::mem::replace(&mut self.current_phase, index);
        let change = PhaseChange {
            previous: previous.map(|i| &animation.phases[i]),
            current: index.map(|i| &animation.phases[i]),
        };
        log::debug!(
            "阶段切换 {:?} -> {:?} (t={:.3})",
            change.previous_name(),
            change.current_name(),
            self.time
        );

        if let Some(callback) = self.on_phase_change.as_mut() {
            callback(&change);
        }
    }
}
