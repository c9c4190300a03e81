//! Real-time playback of the virtual-time scheduler
//!
//! Maps each virtual deadline onto a wall-clock instant (scaled by the
//! configured time scale) and sleeps until it before advancing the simulator.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use super::{SharedSimulator, Simulator};
use super::types::SimTime;

/// Longest wall-clock wait between two deadlines
const MAX_WALL_OFFSET: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn wall_offset(at: SimTime, time_scale: f64) -> Duration {
    let secs = at.as_millis() as f64 * time_scale / 1000.0;
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs)
        .map(|offset| offset.min(MAX_WALL_OFFSET))
        .unwrap_or(MAX_WALL_OFFSET)
}

fn wall_deadline(started: Instant, at: SimTime, time_scale: f64) -> Instant {
    let offset = wall_offset(at, time_scale);
    started.checked_add(offset).unwrap_or(started + MAX_WALL_OFFSET)
}

/// Play pending timers in real time until none remain
///
/// Returns the number of timers fired. A `time_scale` of zero plays
/// everything back-to-back without sleeping.
pub async fn play(sim: &mut Simulator, time_scale: f64) -> usize {
    let origin = sim.now();
    let started = Instant::now();
    let mut fired = 0;

    while let Some(due) = sim.next_deadline() {
        let offset = SimTime(due.as_millis().saturating_sub(origin.as_millis()));
        if time_scale > 0.0 {
            sleep_until(wall_deadline(started, offset, time_scale)).await;
        } else {
            tokio::task::yield_now().await;
        }
        fired += sim.advance_to(due);
    }

    fired
}

/// Like [`play`], for a simulator shared with other tasks
///
/// The lock is only held while timers fire, so other holders can call
/// `reset` or `run_task` between deadlines.
pub async fn play_shared(sim: &SharedSimulator, time_scale: f64) -> usize {
    let origin = sim.with(|s| s.now());
    let started = Instant::now();
    let mut fired = 0;

    while let Some(due) = sim.with(|s| s.next_deadline()) {
        let offset = SimTime(due.as_millis().saturating_sub(origin.as_millis()));
        if time_scale > 0.0 {
            sleep_until(wall_deadline(started, offset, time_scale)).await;
        } else {
            tokio::task::yield_now().await;
        }
        fired += sim.with(|s| s.advance_to(due));
    }

    fired
}
