//! Score-race standings and the wall-clock countdown.
//!
//! Score updates arrive from two sources that are never merged into one
//! ambiguously keyed map: the embedded game runtime reports the *local*
//! player (via the bridge), and `competition:*` server events report the
//! *remote* player. [`RaceStandings`] keeps the two sides as separate
//! fields and only ranks once both have explicitly finished — a high score
//! alone never implies completion.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::bus::EventBus;
use crate::event::SessionEvent;

// ── Standings ───────────────────────────────────────────────────────

/// Relative ranking once both sides have finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceRanking {
    LocalWins,
    OpponentWins,
    Draw,
}

/// Per-session score-race bookkeeping for the two players.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RaceStandings {
    /// Local player's latest reported score (provisional until finished).
    pub my_score: f64,
    /// Remote player's latest reported score.
    pub opponent_score: f64,
    /// Local player has explicitly completed (runtime `gameOver` message or
    /// clock expiry).
    pub my_finished: bool,
    /// Remote player has explicitly completed (`competition:opponentFinished`).
    pub opponent_finished: bool,
    /// Shared time limit in seconds, if the game enforces one.
    pub time_limit: Option<u64>,
}

impl RaceStandings {
    pub fn new(time_limit: Option<u64>) -> Self {
        Self {
            time_limit,
            ..Default::default()
        }
    }

    /// Record a running score for the local player.
    pub fn record_local_score(&mut self, score: f64) {
        if !self.my_finished {
            self.my_score = score;
        }
    }

    /// Mark the local player finished with a final score.
    pub fn record_local_finished(&mut self, final_score: f64) {
        self.my_score = final_score;
        self.my_finished = true;
    }

    /// Record a running score for the remote player.
    pub fn record_opponent_score(&mut self, score: f64) {
        if !self.opponent_finished {
            self.opponent_score = score;
        }
    }

    /// Mark the remote player finished with a final score.
    pub fn record_opponent_finished(&mut self, final_score: f64) {
        self.opponent_score = final_score;
        self.opponent_finished = true;
    }

    /// Clock expiry: force both sides finished at their current scores so
    /// a side that never signals completion cannot stall the result.
    pub fn force_finish(&mut self) {
        self.my_finished = true;
        self.opponent_finished = true;
    }

    /// Authoritative final scores from the server overwrite anything
    /// observed locally.
    pub fn apply_final(&mut self, my_score: f64, opponent_score: f64) {
        self.my_score = my_score;
        self.opponent_score = opponent_score;
        self.my_finished = true;
        self.opponent_finished = true;
    }

    pub fn both_finished(&self) -> bool {
        self.my_finished && self.opponent_finished
    }

    /// Rank the race. `None` until both sides have finished.
    pub fn ranking(&self) -> Option<RaceRanking> {
        if !self.both_finished() {
            return None;
        }
        // Scores are validated finite on entry; treat incomparable as equal.
        Some(
            match self
                .my_score
                .partial_cmp(&self.opponent_score)
                .unwrap_or(std::cmp::Ordering::Equal)
            {
                std::cmp::Ordering::Greater => RaceRanking::LocalWins,
                std::cmp::Ordering::Less => RaceRanking::OpponentWins,
                std::cmp::Ordering::Equal => RaceRanking::Draw,
            },
        )
    }
}

// ── Countdown timer ─────────────────────────────────────────────────

/// Cancellable wall-clock countdown for one score-race session.
///
/// Ticks once per second, decrementing from the time limit; reaching zero
/// publishes [`SessionEvent::RaceClockExpired`] exactly once, guarded by
/// the `ended` flag rather than by re-checking `time_left` (tick jitter
/// must not double-fire the finish path).
///
/// The handle is owned by the session and invalidated synchronously on
/// room change or leave, so a stale expiry can never fire into a discarded
/// session. Dropping the handle cancels the countdown.
#[derive(Debug)]
pub struct RaceTimer {
    handle: JoinHandle<()>,
    remaining: Arc<AtomicU64>,
    ended: Arc<AtomicBool>,
}

impl RaceTimer {
    /// Start a countdown of `time_limit` seconds, publishing the expiry
    /// event on `bus`.
    pub fn start(time_limit: u64, bus: Arc<EventBus>) -> Self {
        let remaining = Arc::new(AtomicU64::new(time_limit));
        let ended = Arc::new(AtomicBool::new(time_limit == 0));

        let task_remaining = Arc::clone(&remaining);
        let task_ended = Arc::clone(&ended);
        let handle = tokio::spawn(async move {
            if task_ended.load(Ordering::Acquire) {
                return;
            }
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let left = task_remaining
                    .load(Ordering::Acquire)
                    .saturating_sub(1);
                task_remaining.store(left, Ordering::Release);
                if left == 0 {
                    if !task_ended.swap(true, Ordering::AcqRel) {
                        debug!("race clock expired");
                        bus.publish(&SessionEvent::RaceClockExpired);
                    }
                    break;
                }
            }
        });

        Self {
            handle,
            remaining,
            ended,
        }
    }

    /// Seconds left on the countdown.
    pub fn time_left(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Whether the countdown has reached zero or been cancelled.
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    /// Cancel the countdown synchronously. After this call the expiry
    /// event can no longer fire. Idempotent.
    pub fn cancel(&self) {
        self.ended.store(true, Ordering::Release);
        self.handle.abort();
    }
}

impl Drop for RaceTimer {
    fn drop(&mut self) {
        self.ended.store(true, Ordering::Release);
        self.handle.abort();
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn no_ranking_until_both_finished() {
        let mut standings = RaceStandings::new(Some(60));
        standings.record_local_score(40.0);
        standings.record_opponent_score(10.0);
        // A high score alone does not imply completion.
        assert_eq!(standings.ranking(), None);

        standings.record_local_finished(40.0);
        assert_eq!(standings.ranking(), None);

        standings.record_opponent_finished(10.0);
        assert_eq!(standings.ranking(), Some(RaceRanking::LocalWins));
    }

    #[test]
    fn higher_finished_score_wins() {
        let mut standings = RaceStandings::new(None);
        standings.record_local_finished(10.0);
        standings.record_opponent_finished(12.0);
        assert_eq!(standings.ranking(), Some(RaceRanking::OpponentWins));
    }

    #[test]
    fn equal_finished_scores_draw() {
        let mut standings = RaceStandings::new(None);
        standings.record_local_finished(10.0);
        standings.record_opponent_finished(10.0);
        assert_eq!(standings.ranking(), Some(RaceRanking::Draw));
    }

    #[test]
    fn scores_freeze_after_finishing() {
        let mut standings = RaceStandings::new(None);
        standings.record_local_finished(10.0);
        standings.record_local_score(99.0);
        assert_eq!(standings.my_score, 10.0);

        standings.record_opponent_finished(5.0);
        standings.record_opponent_score(50.0);
        assert_eq!(standings.opponent_score, 5.0);
    }

    #[test]
    fn force_finish_ranks_current_scores() {
        let mut standings = RaceStandings::new(Some(30));
        standings.record_local_score(7.0);
        standings.record_opponent_score(3.0);
        standings.force_finish();
        assert_eq!(standings.ranking(), Some(RaceRanking::LocalWins));
    }

    #[test]
    fn authoritative_final_overwrites_local_observation() {
        let mut standings = RaceStandings::new(None);
        standings.record_local_score(100.0);
        standings.apply_final(12.0, 15.0);
        assert_eq!(standings.my_score, 12.0);
        assert_eq!(standings.ranking(), Some(RaceRanking::OpponentWins));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_exactly_once_at_zero() {
        let bus = Arc::new(EventBus::new());
        let (_sub, mut rx) = bus.subscribe_all();

        let timer = RaceTimer::start(3, Arc::clone(&bus));
        assert_eq!(timer.time_left(), 3);

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev, SessionEvent::RaceClockExpired);
        assert!(timer.is_ended());

        // Let any jitter play out; no second expiry may arrive.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let bus = Arc::new(EventBus::new());
        let (_sub, mut rx) = bus.subscribe_all();

        let timer = RaceTimer::start(30, Arc::clone(&bus));
        timer.cancel();
        assert!(timer.is_ended());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_timer_never_fires() {
        let bus = Arc::new(EventBus::new());
        let (_sub, mut rx) = bus.subscribe_all();

        let timer = RaceTimer::start(10, Arc::clone(&bus));
        drop(timer);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_limit_timer_does_not_tick() {
        let bus = Arc::new(EventBus::new());
        let (_sub, mut rx) = bus.subscribe_all();

        let timer = RaceTimer::start(0, Arc::clone(&bus));
        assert!(timer.is_ended());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
