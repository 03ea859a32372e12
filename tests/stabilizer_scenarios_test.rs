//! End-to-end scenarios for the pose stabilizer


use skeleton_overlay::{
    constants::NUM_LANDMARKS,
    filters::{
        create_filter,
        occlusion::LandmarkPhase,
        stabilizer::{PoseStabilizer, StabilizerConfig},
        PoseFilter,
    },
    landmarks::{LandmarkIndex, FAST_LIMB_LANDMARKS},
    validity::ValidityThresholds,
};
use test_helpers::{shifted, standing_pose, with_visibility};

fn stabilizer() -> PoseStabilizer {
    PoseStabilizer::new(StabilizerConfig::default(), ValidityThresholds::default())
}

#[test]
fn test_steady_pose_stays_put() {
    let mut s = stabilizer();
    let pose = standing_pose(0.95);
    for _ in 0..50 {
        let out = s.apply(&pose);
        for i in 0..NUM_LANDMARKS {
            assert!((out[i].x - pose[i].x).abs() < 1e-6);
            assert!((out[i].y - pose[i].y).abs() < 1e-6);
        }
    }
    assert_eq!(s.phase(0), LandmarkPhase::Tracked);
}

#[test]
fn test_converges_toward_new_position() {
    let mut s = stabilizer();
    let pose = standing_pose(0.95);
    s.apply(&pose);
    let moved = shifted(&pose, 0.2);

    let mut last_gap = f32::INFINITY;
    for _ in 0..20 {
        let out = s.apply(&moved);
        let gap = (out[0].x - moved[0].x).abs();
        assert!(gap < last_gap);
        last_gap = gap;
    }
    assert!(last_gap < 1e-4);
}

#[test]
fn test_legs_follow_faster_than_arms() {
    let mut s = stabilizer();
    let pose = standing_pose(0.95);
    s.apply(&pose);
    let out = s.apply(&shifted(&pose, 0.1));

    let wrist = LandmarkIndex::LeftWrist.index();
    for &leg in &FAST_LIMB_LANDMARKS {
        assert!(out[leg].x - pose[leg].x > out[wrist].x - pose[wrist].x);
    }
}

#[test]
fn test_single_frame_foot_occlusion_is_bridged() {
    let mut s = stabilizer();
    let foot = LandmarkIndex::LeftFootIndex.index();
    assert_eq!(foot, 31);

    let base = standing_pose(0.9);
    let mut outputs = Vec::new();
    for step in 0..5 {
        outputs.push(s.apply(&shifted(&base, 0.01 * step as f32)));
    }

    let occluded = with_visibility(&shifted(&base, 0.05), foot, Some(0.02));
    let bridged = s.apply(&occluded);
    let prev = &outputs[4][foot];
    let prev_prev = &outputs[3][foot];
    let expected = prev.x + (prev.x - prev_prev.x) * StabilizerConfig::default().extrapolation_decay;

    assert_eq!(s.phase(foot), LandmarkPhase::OccludedPredicting);
    assert_eq!(s.miss_count(foot), 1);
    assert!((bridged[foot].x - expected).abs() < 1e-6);
    assert!(bridged[foot].x > prev.x);
    assert_eq!(bridged[foot].visibility, prev.visibility);

    s.apply(&shifted(&base, 0.06));
    assert_eq!(s.miss_count(foot), 0);
    assert_eq!(s.phase(foot), LandmarkPhase::Tracked);
}

#[test]
fn test_misses_count_up_and_confidence_decays_after_grace() {
    let config = StabilizerConfig::default();
    let mut s = stabilizer();
    let wrist = LandmarkIndex::RightWrist.index();
    let pose = standing_pose(0.9);
    s.apply(&pose);
    s.apply(&pose);

    let hidden = with_visibility(&pose, wrist, Some(0.0));
    let mut last_confidence = f32::INFINITY;
    for k in 1..=20u32 {
        let out = s.apply(&hidden);
        assert_eq!(s.miss_count(wrist), k);
        assert!((out[wrist].x - pose[wrist].x).abs() < 1e-6);

        let confidence = out[wrist].visibility.unwrap();
        if k <= config.grace_frames {
            assert_eq!(s.phase(wrist), LandmarkPhase::OccludedHolding);
            assert!((confidence - 0.9).abs() < 1e-6);
        } else {
            assert_eq!(s.phase(wrist), LandmarkPhase::OccludedFrozen);
            assert!(confidence < last_confidence);
        }
        last_confidence = confidence;
    }
}

#[test]
fn test_unknown_confidence_counts_as_miss_and_stays_unknown_when_frozen() {
    let config = StabilizerConfig {
        grace_frames: 1,
        ..StabilizerConfig::default()
    };
    let mut s = PoseStabilizer::new(config, ValidityThresholds::default());
    let nose = LandmarkIndex::Nose.index();
    let pose = with_visibility(&standing_pose(0.9), nose, None);
    for _ in 0..4 {
        let out = s.apply(&pose);
        assert_eq!(out[nose].visibility, None);
    }
    assert_eq!(s.miss_count(nose), 4);
}

#[test]
fn test_reconfigure_keeps_history() {
    let mut s = stabilizer();
    let pose = standing_pose(0.9);
    s.apply(&pose);
    s.configure(
        &StabilizerConfig {
            base_smoothing: 0.0,
            ..StabilizerConfig::default()
        },
        &ValidityThresholds::default(),
    );
    assert!(s.previous().is_some());

    let moved = shifted(&pose, 0.1);
    let out = s.apply(&moved);
    let nose = LandmarkIndex::Nose.index();
    assert!((out[nose].x - moved[nose].x).abs() < 1e-6);
}

#[test]
fn test_reset_bootstraps_again() {
    let mut filter = create_filter("stabilized", &StabilizerConfig::default(), &ValidityThresholds::default()).unwrap();
    filter.apply(&standing_pose(0.9));
    filter.reset();
    assert!(filter.previous().is_none());

    let raw = shifted(&standing_pose(0.9), 0.3);
    assert_eq!(filter.apply(&raw), raw);
}
