//! 无界面预览：播放一次内置练习并打印阶段与腿部旋转
//!
//! 用法: preview [exercise] [fps]

use std::cell::RefCell;
use std::rc::Rc;

use rehab_motion::animation::exercise_library;
use rehab_motion::skeleton::HipPositions;
use rehab_motion::{AvatarAnimator, BoneMap, JointName, Skeleton};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| exercise_library::SQUAT.to_string());
    let fps: f32 = match args.next() {
        Some(value) => value.parse()?,
        None => 60.0,
    };
    if fps <= 0.0 {
        return Err(format!("fps must be positive, got {}", fps).into());
    }

    let Some(exercise) = exercise_library::get(&name) else {
        let known: Vec<_> = exercise_library::names().collect();
        return Err(format!("unknown exercise '{}', available: {}", name, known.join(", ")).into());
    };

    let mut avatar = AvatarAnimator::new(&BoneMap::canonical())?;
    avatar.load_exercise(exercise.clone().with_looping(false))?;

    let transitions = Rc::new(RefCell::new(Vec::new()));
    let sink = transitions.clone();
    avatar.controller_mut().on_phase_change(move |change| {
        sink.borrow_mut().push(change.current_name().unwrap_or("-").to_string());
    });
    avatar.controller_mut().play();

    println!("=== {} ({}s @ {} fps) ===", exercise.name, exercise.duration, fps);

    let dt = 1.0 / fps;
    let sample_every = (fps / 4.0).max(1.0) as usize;
    let mut root_height = 0.0;
    let mut frame_index = 0usize;

    while avatar.controller().is_playing() {
        let hips = HipPositions::from_rest(Skeleton::humanoid(), root_height);
        let Some(frame) = avatar.tick(dt, hips) else {
            break;
        };
        root_height = frame.root_height;

        for phase in transitions.borrow_mut().drain(..) {
            println!("[{:6.3}] phase -> {}", frame.time, phase);
        }

        if frame_index % sample_every == 0 {
            let x = |joint: JointName| frame.joints.get(&joint).map_or(0.0, |r| r.x);
            println!(
                "t={:5.3} root={:+.3} hip={:+.3} knee={:+.3} foot={:+.3}",
                frame.time,
                frame.root_height,
                x(JointName::LeftUpperLeg),
                x(JointName::LeftLowerLeg),
                x(JointName::LeftFoot),
            );
        }
        frame_index += 1;
    }

    println!("{} frames", frame_index);
    Ok(())
}
