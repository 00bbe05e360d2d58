#![cfg(feature = "serde")]

use rehab_motion::animation::interpolate_pose;
use rehab_motion::{ExerciseAnimationData, GaitPhase, JointName, Side};

const HEEL_RAISE: &str = r#"{
    "name": "heel_raise",
    "keyframes": [
        { "time": 0.0, "joints": { "leftFoot": { "x": 0.0, "y": 0.0, "z": 0.0 } } },
        { "time": 0.5, "joints": { "leftFoot": { "x": 0.5, "y": 0.0, "z": 0.0 } }, "expression": "effort",
          "rootPosition": [0.0, 0.06, 0.0] },
        { "time": 1.0, "joints": { "leftFoot": { "x": 0.0, "y": 0.0, "z": 0.0 } } }
    ],
    "phases": [
        { "name": "RISE", "startTime": 0.0, "endTime": 0.5 },
        { "name": "SHIFT", "startTime": 0.5, "endTime": 1.0, "gait": { "swing": "right" } }
    ],
    "duration": 3.0,
    "loop": true,
    "defaultTempo": 1.0
}"#;

#[test]
fn test_author_exercise_as_json() {
    let exercise: ExerciseAnimationData = serde_json::from_str(HEEL_RAISE).unwrap();
    exercise.validate().unwrap();

    assert!(exercise.looping);
    assert_eq!(exercise.phases[0].gait, GaitPhase::Stance);
    assert_eq!(exercise.phases[1].gait, GaitPhase::Swing(Side::Right));

    let pose = interpolate_pose(&exercise, 0.5);
    assert_eq!(pose.joints[&JointName::LeftFoot].x, 0.5);
    assert!((pose.root_height - 0.06).abs() < 1e-6);
    assert_eq!(pose.expression.as_deref(), Some("effort"));

    let json = serde_json::to_string(&exercise).unwrap();
    assert!(json.contains("\"loop\":true"));
    assert!(json.contains("\"leftFoot\""));
}
