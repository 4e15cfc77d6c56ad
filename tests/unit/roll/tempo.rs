use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn seconds_per_tick_follows_bpm_and_resolution() {
    assert!(close(seconds_per_tick(500_000, 480), 1.0 / 960.0));
    assert!(close(seconds_per_tick(250_000, 96), 1.0 / 384.0));
}

#[test]
fn degenerate_tempo_yields_zero() {
    assert_eq!(seconds_per_tick(0, 480), 0.0);
    assert_eq!(seconds_per_tick(-1, 480), 0.0);
    assert_eq!(seconds_per_tick(500_000, 0), 0.0);
}

#[test]
fn map_defaults_to_120_bpm() {
    let map = TempoMap::new([], 480);
    assert!(close(map.seconds_at(480), 0.5));
}

#[test]
fn map_integrates_segment_by_segment() {
    let map = TempoMap::new([(960, 250_000), (0, 500_000)], 480);
    assert!(close(map.seconds_at(0), 0.0));
    assert!(close(map.seconds_at(960), 1.0));
    assert!(close(map.seconds_at(1440), 1.25));
}

#[test]
fn same_tick_changes_keep_the_last() {
    let map = TempoMap::new([(0, 250_000), (0, 1_000_000)], 480);
    assert!(close(map.seconds_at(480), 1.0));
}

#[test]
fn mode_wire_names() {
    assert_eq!(
        serde_json::to_string(&TempoMode::Integrated).unwrap(),
        "\"integrated\""
    );
    assert_eq!(TempoMode::default(), TempoMode::Current);
}
