/// Tempo assumed before the first tempo change (120 bpm).
pub const DEFAULT_MICROSECONDS_PER_BEAT: i64 = 500_000;

/// How tick positions are turned into seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoMode {
    /// Per track, the most recent tempo scales the note's absolute tick. Before the first tempo
    /// event the factor is zero. Matches what existing consumers of the roll expect.
    #[default]
    Current,
    /// One tempo map for the whole piece, integrated segment by segment.
    Integrated,
}

/// Seconds per tick for a tempo and resolution; zero for a non-positive tempo or resolution.
pub fn seconds_per_tick(microseconds_per_beat: i64, ticks_per_beat: u16) -> f64 {
    if microseconds_per_beat <= 0 || ticks_per_beat == 0 {
        return 0.0;
    }
    let bpm = 60_000_000.0 / microseconds_per_beat as f64;
    60.0 / (bpm * f64::from(ticks_per_beat))
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Segment {
    start_tick: u64,
    start_seconds: f64,
    seconds_per_tick: f64,
}

/// Piecewise-linear tick → seconds mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct TempoMap {
    segments: Vec<Segment>,
}

impl TempoMap {
    /// Build from `(tick, microseconds per beat)` changes in any order.
    ///
    /// Changes at the same tick apply in the order given, the last one winning.
    pub fn new(changes: impl IntoIterator<Item = (u64, i64)>, ticks_per_beat: u16) -> Self {
        let mut changes: Vec<(u64, i64)> = changes.into_iter().collect();
        changes.sort_by_key(|(tick, _)| *tick);

        let mut segments = vec![Segment {
            start_tick: 0,
            start_seconds: 0.0,
            seconds_per_tick: seconds_per_tick(DEFAULT_MICROSECONDS_PER_BEAT, ticks_per_beat),
        }];
        for (tick, us) in changes {
            let spt = seconds_per_tick(us, ticks_per_beat);
            let last = segments[segments.len() - 1];
            if last.start_tick == tick {
                segments.pop();
                segments.push(Segment {
                    seconds_per_tick: spt,
                    ..last
                });
            } else {
                segments.push(Segment {
                    start_tick: tick,
                    start_seconds: last.start_seconds
                        + (tick - last.start_tick) as f64 * last.seconds_per_tick,
                    seconds_per_tick: spt,
                });
            }
        }
        Self { segments }
    }

    /// Seconds elapsed at `tick`.
    pub fn seconds_at(&self, tick: u64) -> f64 {
        let idx = self
            .segments
            .partition_point(|s| s.start_tick <= tick)
            .saturating_sub(1);
        let s = self.segments[idx];
        s.start_seconds + (tick - s.start_tick) as f64 * s.seconds_per_tick
    }
}

#[cfg(test)]
#[path = "../../tests/unit/roll/tempo.rs"]
mod tests;
