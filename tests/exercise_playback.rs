use std::cell::RefCell;
use std::rc::Rc;

use rehab_motion::animation::exercise_library::{self, MARCH, SQUAT};
use rehab_motion::skeleton::HipPositions;
use rehab_motion::{AnimationController, AvatarAnimator, BoneMap, JointName, PlaybackState, Side, Skeleton};

const FPS: f32 = 60.0;

fn record(controller: &mut AnimationController) -> Rc<RefCell<Vec<Option<String>>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    controller.on_phase_change(move |change| {
        sink.borrow_mut().push(change.current_name().map(str::to_string));
    });
    events
}

#[test]
fn test_squat_single_cycle() {
    let squat = exercise_library::get(SQUAT).unwrap().clone().with_looping(false);
    let bottom = squat.keyframes[1].clone();

    let mut controller = AnimationController::new();
    controller.load(squat);
    controller.set_speed(1.0);
    let events = record(&mut controller);
    controller.play();

    let mut ticks = 0;
    let mut at_two_seconds = None;
    while controller.state() == PlaybackState::Playing {
        let pose = controller.update(1.0 / FPS).unwrap();
        ticks += 1;
        if ticks == 120 {
            at_two_seconds = Some(pose);
        }
    }

    // 4 秒 × 60 帧，末帧可能因浮点累积多一帧
    assert!((240..=241).contains(&ticks), "ticks = {}", ticks);
    assert_eq!(controller.time(), 1.0);

    let pose = at_two_seconds.unwrap();
    for joint in [
        JointName::LeftUpperLeg,
        JointName::LeftLowerLeg,
        JointName::RightUpperLeg,
        JointName::RightLowerLeg,
        JointName::Hips,
    ] {
        let expected = bottom.joints[&joint];
        assert!(
            pose.joints[&joint].angle_to(expected) < 5e-3,
            "{}: {:?} != {:?}",
            joint,
            pose.joints[&joint],
            expected
        );
    }

    assert_eq!(
        *events.borrow(),
        vec![Some("ECCENTRIC".to_string()), Some("CONCENTRIC".to_string())]
    );
}

#[test]
fn test_controller_loop_and_clamp() {
    let squat = exercise_library::get(SQUAT).unwrap();

    let mut looping = AnimationController::new();
    let mut data = squat.clone();
    data.duration = 2.0;
    looping.load(data.clone().with_looping(true));
    looping.set_speed(1.0);
    looping.play();
    for _ in 0..10 {
        looping.update(0.5);
    }
    assert!((looping.time() - 0.5).abs() < 1e-5);

    let mut clamped = AnimationController::new();
    clamped.load(data.with_looping(false));
    clamped.set_speed(1.0);
    clamped.play();
    for _ in 0..10 {
        clamped.update(0.5);
    }
    assert_eq!(clamped.time(), 1.0);
    assert_eq!(clamped.state(), PlaybackState::Stopped);
}

#[test]
fn test_scrubbing_fires_once() {
    let mut controller = AnimationController::new();
    controller.load(exercise_library::get(SQUAT).unwrap().clone());
    let events = record(&mut controller);

    controller.set_time(0.4);
    controller.update(0.0);
    controller.set_time(0.6);
    controller.update(0.0);
    for _ in 0..20 {
        controller.update(1.0 / FPS);
    }
    assert_eq!(
        *events.borrow(),
        vec![Some("ECCENTRIC".to_string()), Some("CONCENTRIC".to_string())]
    );
}

#[test]
fn test_march_lifts_swing_foot() {
    let mut avatar = AvatarAnimator::new(&BoneMap::canonical()).unwrap();
    avatar.load_builtin(MARCH).unwrap();
    avatar.controller_mut().play();

    let hips = HipPositions::from_rest(Skeleton::humanoid(), 0.0).unwrap();
    let mut saw_swing = false;
    for _ in 0..60 {
        let frame = avatar.tick(1.0 / FPS, Some(hips)).unwrap();
        assert!(frame.joints.values().all(|rotation| rotation.is_finite()));
        if frame.phase.as_deref() == Some("STEP_LEFT") {
            let left = avatar.foot_ik().current().get(Side::Left);
            if !left.is_grounded {
                saw_swing = true;
                assert!(left.position.y > 0.0);
                assert!(avatar.foot_ik().current().get(Side::Right).is_grounded);
            }
        }
    }
    assert!(saw_swing);
}

#[test]
fn test_avatars_are_independent() {
    let mut a = AvatarAnimator::new(&BoneMap::canonical()).unwrap();
    let mut b = AvatarAnimator::new(&BoneMap::canonical()).unwrap();
    a.load_builtin(SQUAT).unwrap();
    b.load_builtin(SQUAT).unwrap();
    a.controller_mut().play();
    b.controller_mut().play();

    for _ in 0..30 {
        a.tick(1.0 / FPS, None);
    }
    let first_b = b.tick(1.0 / FPS, None).unwrap();
    let first_a = {
        let mut fresh = AvatarAnimator::new(&BoneMap::canonical()).unwrap();
        fresh.load_builtin(SQUAT).unwrap();
        fresh.controller_mut().play();
        fresh.tick(1.0 / FPS, None).unwrap()
    };
    assert_eq!(first_a, first_b);
}
