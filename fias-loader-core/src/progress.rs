//! Progress fan-in from concurrently running entity pipelines.
//!
//! Each pipeline owns the sending half of its own bounded channel. A single
//! [`ProgressAggregator`] merges all receivers into one [`StatusSnapshot`]
//! holding the latest message per entity, and hands the snapshot to a
//! [`StatusRenderer`] on a fixed tick. Rendering is driven by the tick only,
//! so render frequency does not depend on ingestion rate.
//!
//! Completion is signalled by the channels themselves: a pipeline drops its
//! sender when it ends, and once every sender is gone and every buffered
//! event has been applied the aggregator renders a final time and returns.
//!
//! Channels are bounded: a pipeline that outruns the aggregator blocks on
//! [`ProgressSender::send`] instead of dropping or piling up messages.

use chrono::{DateTime, Local};
use futures::stream::{BoxStream, SelectAll};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// One status message from one entity pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Element name of the reporting entity
    pub entity: &'static str,
    /// Human readable status
    pub message: String,
}

/// Sending half of an entity's progress channel.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    entity: &'static str,
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressSender {
    /// Entity this sender reports for.
    pub const fn entity(&self) -> &'static str {
        self.entity
    }

    /// Sends a message, waiting while the channel is full.
    ///
    /// Once the aggregator has stopped (after a quit) messages are discarded;
    /// the pipeline itself keeps running.
    pub async fn send(&self, message: impl Into<String>) {
        let event = ProgressEvent {
            entity: self.entity,
            message: message.into(),
        };

        if self.tx.send(event).await.is_err() {
            trace!(entity = self.entity, "Progress receiver closed");
        }
    }
}

/// Creates the bounded progress channel of one entity.
pub fn progress_channel(
    entity: &'static str,
    capacity: usize,
) -> (ProgressSender, mpsc::Receiver<ProgressEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ProgressSender { entity, tx }, rx)
}

/// Latest status message per entity slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    slots: Vec<String>,
}

impl StatusSnapshot {
    /// Creates `len` empty slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![String::new(); len],
        }
    }

    /// Replaces the message in `slot`; out of range slots are ignored.
    pub fn update(&mut self, slot: usize, message: String) {
        if let Some(current) = self.slots.get_mut(slot) {
            *current = message;
        }
    }

    /// Message in `slot`.
    pub fn get(&self, slot: usize) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }

    /// All slots in registry order.
    pub fn slots(&self) -> &[String] {
        &self.slots
    }
}

/// What a renderer is given on every refresh.
#[derive(Debug, Clone, Copy)]
pub struct StatusView<'a> {
    /// Current per-entity messages
    pub snapshot: &'a StatusSnapshot,
    /// Wall clock time the import started
    pub started_at: DateTime<Local>,
    /// Time since the import started
    pub elapsed: Duration,
    /// Set on the last render after every pipeline ended
    pub finished: bool,
}

/// Presentation boundary fed by the aggregator.
pub trait StatusRenderer: Send {
    /// Draws the current status.
    fn render(&mut self, view: &StatusView<'_>);
}

/// Renderer that discards every view.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl StatusRenderer for NullRenderer {
    fn render(&mut self, _view: &StatusView<'_>) {}
}

/// Why the aggregator loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorExit {
    /// Every pipeline dropped its sender
    Completed,
    /// The cancellation token fired first
    Cancelled,
}

/// Final state of an aggregator run.
#[derive(Debug, Clone)]
pub struct AggregatorOutcome {
    /// Snapshot at exit
    pub snapshot: StatusSnapshot,
    /// Exit reason
    pub exit: AggregatorExit,
    /// Run duration
    pub elapsed: Duration,
}

/// Merges progress channels into one snapshot.
pub struct ProgressAggregator {
    receivers: Vec<mpsc::Receiver<ProgressEvent>>,
    render_interval: Duration,
}

impl std::fmt::Debug for ProgressAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressAggregator")
            .field("channels", &self.receivers.len())
            .field("render_interval", &self.render_interval)
            .finish()
    }
}

impl ProgressAggregator {
    /// Creates an aggregator; receiver `i` feeds snapshot slot `i`.
    pub const fn new(
        receivers: Vec<mpsc::Receiver<ProgressEvent>>,
        render_interval: Duration,
    ) -> Self {
        Self {
            receivers,
            render_interval,
        }
    }

    /// Runs the loop until every channel closes or `cancel` fires.
    ///
    /// On completion the renderer is invoked one last time with
    /// `finished = true`. On cancellation the loop returns without a final
    /// render.
    pub async fn run<R>(self, renderer: &mut R, cancel: CancellationToken) -> AggregatorOutcome
    where
        R: StatusRenderer + ?Sized,
    {
        let started_at = Local::now();
        let start = Instant::now();
        let mut snapshot = StatusSnapshot::new(self.receivers.len());
        let mut events = merge(self.receivers);

        let mut ticker = tokio::time::interval_at(start + self.render_interval, self.render_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let exit = loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!("Progress aggregation cancelled");
                    break AggregatorExit::Cancelled;
                }

                _ = ticker.tick() => {
                    renderer.render(&StatusView {
                        snapshot: &snapshot,
                        started_at,
                        elapsed: start.elapsed(),
                        finished: false,
                    });
                }

                event = events.next() => match event {
                    Some((slot, event)) => snapshot.update(slot, event.message),
                    None => break AggregatorExit::Completed,
                },
            }
        };

        let elapsed = start.elapsed();
        if exit == AggregatorExit::Completed {
            renderer.render(&StatusView {
                snapshot: &snapshot,
                started_at,
                elapsed,
                finished: true,
            });
        }

        AggregatorOutcome {
            snapshot,
            exit,
            elapsed,
        }
    }
}

fn merge(
    receivers: Vec<mpsc::Receiver<ProgressEvent>>,
) -> SelectAll<BoxStream<'static, (usize, ProgressEvent)>> {
    futures::stream::select_all(receivers.into_iter().enumerate().map(|(slot, rx)| {
        futures::stream::unfold(rx, move |mut rx| async move {
            rx.recv().await.map(|event| ((slot, event), rx))
        })
        .boxed()
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[derive(Default)]
    struct RecordingRenderer {
        views: Vec<(Vec<String>, bool)>,
    }

    impl StatusRenderer for RecordingRenderer {
        fn render(&mut self, view: &StatusView<'_>) {
            self.views
                .push((view.snapshot.slots().to_vec(), view.finished));
        }
    }

    #[tokio::test]
    async fn test_last_message_per_slot_wins() {
        let (kind_tx, kind_rx) = progress_channel("Kind", 10);
        let (other_tx, other_rx) = progress_channel("Other", 10);

        kind_tx.send("Kind 1 rows affected").await;
        kind_tx.send("Kind 2 rows affected").await;
        other_tx.send("Other 1 rows affected").await;
        drop(kind_tx);
        drop(other_tx);

        let mut renderer = RecordingRenderer::default();
        let outcome = ProgressAggregator::new(vec![kind_rx, other_rx], Duration::from_secs(1))
            .run(&mut renderer, CancellationToken::new())
            .await;

        assert_eq!(outcome.exit, AggregatorExit::Completed);
        assert_eq!(outcome.snapshot.get(0), Some("Kind 2 rows affected"));
        assert_eq!(outcome.snapshot.get(1), Some("Other 1 rows affected"));

        let (slots, finished) = renderer.views.last().unwrap();
        assert!(*finished);
        assert_eq!(slots[0], "Kind 2 rows affected");
    }

    #[tokio::test]
    async fn test_no_channels_completes_immediately() {
        let mut renderer = RecordingRenderer::default();
        let outcome = ProgressAggregator::new(Vec::new(), Duration::from_secs(1))
            .run(&mut renderer, CancellationToken::new())
            .await;

        assert_eq!(outcome.exit, AggregatorExit::Completed);
        assert_eq!(renderer.views.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renders_on_tick_not_on_event() {
        let (tx, rx) = progress_channel("Kind", 10);
        let mut renderer = RecordingRenderer::default();

        let producer = tokio::spawn(async move {
            tx.send("Kind 1 rows affected").await;
            tokio::time::sleep(Duration::from_millis(2500)).await;
            tx.send("Kind 2 rows affected").await;
        });

        let outcome = ProgressAggregator::new(vec![rx], Duration::from_secs(1))
            .run(&mut renderer, CancellationToken::new())
            .await;
        producer.await.unwrap();

        assert_eq!(outcome.exit, AggregatorExit::Completed);
        let ticks: Vec<_> = renderer.views.iter().filter(|(_, f)| !f).collect();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].0[0], "Kind 1 rows affected");
        assert_eq!(renderer.views.last().unwrap().0[0], "Kind 2 rows affected");
    }

    #[tokio::test]
    async fn test_cancellation_stops_loop_without_final_render() {
        let (_tx, rx) = progress_channel("Kind", 10);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut renderer = RecordingRenderer::default();
        let outcome = ProgressAggregator::new(vec![rx], Duration::from_secs(1))
            .run(&mut renderer, cancel)
            .await;

        assert_eq!(outcome.exit, AggregatorExit::Cancelled);
        assert!(renderer.views.is_empty());
    }

    #[tokio::test]
    async fn test_full_channel_blocks_sender() {
        let capacity = 1000;
        let (tx, mut rx) = progress_channel("Kind", capacity);

        for n in 1..=capacity {
            tx.send(format!("Kind {n} rows affected")).await;
        }

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            tx.send("Kind 1001 rows affected"),
        )
        .await;
        assert!(blocked.is_err(), "send past capacity must wait");

        let producer = tokio::spawn(async move {
            tx.send("Kind 1001 rows affected").await;
        });

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event.message);
        }
        producer.await.unwrap();

        assert_eq!(received.len(), capacity + 1);
        assert_eq!(received[0], "Kind 1 rows affected");
        assert_eq!(received[capacity], "Kind 1001 rows affected");
    }
}
