use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::event_bus::Event;
use crate::timeline::Timeline;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("playback task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Drives a [`Timeline`] on a background task, one tick per period.
///
/// The task ends when playback finishes or [`TimelinePlayer::stop`] is
/// called; timeline events are forwarded as they happen.
#[derive(Debug)]
pub struct TimelinePlayer {
    stop: watch::Sender<bool>,
    events: mpsc::UnboundedReceiver<Event>,
    handle: JoinHandle<Timeline>,
}

impl TimelinePlayer {
    /// Starts playback. Must be called inside a tokio runtime.
    pub fn spawn(mut timeline: Timeline, period: Duration) -> Self {
        let (stop, mut stop_rx) = watch::channel(false);
        let (events_tx, events) = mpsc::unbounded_channel();
        timeline.play();

        let handle = tokio::spawn(async move {
            let forward = |timeline: &mut Timeline| {
                for event in timeline.drain_events() {
                    // A dropped receiver only means nobody is listening.
                    let _ = events_tx.send(event);
                }
            };
            forward(&mut timeline);

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; years advance one period in.
            interval.tick().await;

            loop {
                if *stop_rx.borrow() {
                    break;
                }
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        timeline.tick();
                        forward(&mut timeline);
                        if !timeline.is_playing() {
                            break;
                        }
                    }
                }
            }

            timeline.pause();
            forward(&mut timeline);
            debug!("playback ended at {}", timeline.label());
            timeline
        });

        Self {
            stop,
            events,
            handle,
        }
    }

    /// Requests the task to stop. Safe to call any number of times.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Next forwarded event; `None` once the task has ended and all events
    /// were read.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Waits for the task and returns the timeline in its final state.
    pub async fn join(self) -> Result<Timeline, PlayerError> {
        Ok(self.handle.await?)
    }
}

#[cfg(test)]
mod tests {
    use super::TimelinePlayer;
    use crate::event_bus::TimelineEvent;
    use crate::timeline::Timeline;
    use foundation::YearSpan;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn plays_to_the_end_and_finishes() {
        let timeline = Timeline::new(YearSpan::new(1902, 1904).unwrap());
        let mut player = TimelinePlayer::spawn(timeline, Duration::from_secs(1));

        let mut seen = Vec::new();
        while let Some(event) = player.next_event().await {
            seen.push(event.kind);
        }
        assert_eq!(
            seen,
            vec![
                TimelineEvent::Played,
                TimelineEvent::YearChanged(1902),
                TimelineEvent::YearChanged(1903),
                TimelineEvent::YearChanged(1904),
                TimelineEvent::Finished,
            ]
        );

        let timeline = player.join().await.unwrap();
        assert_eq!(timeline.year(), Some(1904));
        assert!(!timeline.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_pauses() {
        let timeline = Timeline::new(YearSpan::new(1900, 2000).unwrap());
        let mut player = TimelinePlayer::spawn(timeline, Duration::from_secs(1));

        assert_eq!(player.next_event().await.map(|e| e.kind), Some(TimelineEvent::Played));
        assert_eq!(
            player.next_event().await.map(|e| e.kind),
            Some(TimelineEvent::YearChanged(1900))
        );

        player.stop();
        player.stop();
        assert_eq!(player.next_event().await.map(|e| e.kind), Some(TimelineEvent::Paused));
        assert_eq!(player.next_event().await, None);
        player.stop();

        let timeline = player.join().await.unwrap();
        assert_eq!(timeline.year(), Some(1900));
        assert!(!timeline.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_tick() {
        let timeline = Timeline::new(YearSpan::new(1900, 1910).unwrap());
        let player = TimelinePlayer::spawn(timeline, Duration::from_secs(1));
        player.stop();
        let timeline = player.join().await.unwrap();
        assert_eq!(timeline.year(), None);
    }
}
