//! Live Update Driver
//!
//! Polls the coin list on a fixed interval while the board is visible and
//! pauses while it is hidden. Runs as one spawned task that owns the timer,
//! the in-flight fetches and the sequence counter; callers talk to it through
//! a [`LiveUpdateHandle`] and read [`LiveEvent`]s from a channel.
//!
//! After a failed poll the retry schedule replaces the interval: ticks that
//! land while a retry is pending are skipped.
//!
//! Every fetch (and every pushed update) takes the next sequence number. A
//! result is applied only when its number is greater than the last applied
//! one, so a slow response can never overwrite a newer list.

use async_trait::async_trait;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::models::coin::CoinRecord;

/// Anything that can produce the full coin list.
#[async_trait]
pub trait CoinSource: Send + Sync + 'static {
    async fn fetch_coins(&self) -> Result<Vec<CoinRecord>, ClientError>;
}

/// Retry behaviour after a failed poll. `max_attempts == 0` pauses on the
/// first failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Delay before retry number `attempt` (1-based), or None once the
    /// attempts are used up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = self.multiplier.max(1.0).powi(attempt as i32 - 1);
        let millis = (self.initial_delay.as_millis() as f64 * factor).min(self.max_delay.as_millis() as f64);
        Some(Duration::from_millis(millis as u64))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            retry: RetryPolicy::disabled(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Active,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    Hidden,
    FetchFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    Poll,
    Push,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Activated,
    Coins {
        seq: u64,
        origin: UpdateOrigin,
        coins: Vec<CoinRecord>,
    },
    FetchFailed {
        seq: u64,
        error: String,
        retry_in: Option<Duration>,
    },
    Paused(PauseReason),
    Stopped,
}

#[derive(Debug)]
enum Command {
    Visible(bool),
    Push(Vec<CoinRecord>),
    Stop,
}

/// Control side of a running driver. Dropping every clone stops the driver.
#[derive(Clone)]
pub struct LiveUpdateHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl LiveUpdateHandle {
    /// Page became visible (true) or hidden (false).
    pub fn set_visible(&self, visible: bool) {
        let _ = self.commands.send(Command::Visible(visible));
    }

    /// Feed a coin list that arrived over the push channel.
    pub fn push(&self, coins: Vec<CoinRecord>) {
        let _ = self.commands.send(Command::Push(coins));
    }

    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

pub struct LiveUpdateDriver<S: CoinSource> {
    source: Arc<S>,
    config: PollConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::Sender<LiveEvent>,
    state: DriverState,
    ticker: Option<Interval>,
    retry_sleep: Option<Pin<Box<Sleep>>>,
    failed_attempts: u32,
    in_flight: JoinSet<(u64, Result<Vec<CoinRecord>, ClientError>)>,
    next_seq: u64,
    last_applied: u64,
}

impl<S: CoinSource> LiveUpdateDriver<S> {
    /// Spawn the driver. It starts active (visible) and fetches right away.
    pub fn spawn(
        source: Arc<S>,
        config: PollConfig,
    ) -> (LiveUpdateHandle, mpsc::Receiver<LiveEvent>, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(64);

        let driver = Self {
            source,
            config,
            commands: command_rx,
            events: event_tx,
            state: DriverState::Paused,
            ticker: None,
            retry_sleep: None,
            failed_attempts: 0,
            in_flight: JoinSet::new(),
            next_seq: 0,
            last_applied: 0,
        };

        let task = tokio::spawn(driver.run());

        (LiveUpdateHandle { commands: command_tx }, event_rx, task)
    }

    async fn run(mut self) {
        info!("Starting live updates (every {} seconds)", self.config.interval.as_secs());
        self.activate().await;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Visible(true)) => {
                        if self.state != DriverState::Active {
                            self.activate().await;
                        }
                    }
                    Some(Command::Visible(false)) => {
                        if self.state == DriverState::Active {
                            self.pause(PauseReason::Hidden).await;
                        }
                    }
                    Some(Command::Push(coins)) => {
                        let seq = self.take_seq();
                        self.apply(seq, UpdateOrigin::Push, coins).await;
                    }
                    Some(Command::Stop) | None => break,
                },
                _ = next_tick(&mut self.ticker) => {
                    // A pending retry owns the next fetch.
                    if self.retry_sleep.is_some() {
                        debug!("Skipping poll, retry pending (attempt {})", self.failed_attempts);
                    } else {
                        self.start_fetch();
                    }
                }
                _ = retry_due(&mut self.retry_sleep) => {
                    self.retry_sleep = None;
                    debug!("Retrying coin list fetch (attempt {})", self.failed_attempts);
                    self.start_fetch();
                }
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    match joined {
                        Ok((seq, result)) => self.on_fetch_done(seq, result).await,
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => warn!("Fetch task failed: {}", e),
                    }
                }
            }
        }

        self.in_flight.abort_all();
        self.ticker = None;
        self.state = DriverState::Stopped;
        info!("Live updates stopped");
        let _ = self.events.send(LiveEvent::Stopped).await;
    }

    async fn activate(&mut self) {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately, giving the fetch on entry.
        self.ticker = Some(ticker);
        self.retry_sleep = None;
        self.failed_attempts = 0;
        self.state = DriverState::Active;
        debug!("Live updates active");
        self.emit(LiveEvent::Activated).await;
    }

    async fn pause(&mut self, reason: PauseReason) {
        self.ticker = None;
        self.retry_sleep = None;
        // Dropping the set aborts whatever is still running.
        self.in_flight = JoinSet::new();
        self.state = DriverState::Paused;
        info!("Live updates paused ({:?})", reason);
        self.emit(LiveEvent::Paused(reason)).await;
    }

    fn take_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn start_fetch(&mut self) {
        let seq = self.take_seq();
        let source = self.source.clone();
        debug!("Fetching coin list (seq {})", seq);
        self.in_flight.spawn(async move { (seq, source.fetch_coins().await) });
    }

    async fn on_fetch_done(&mut self, seq: u64, result: Result<Vec<CoinRecord>, ClientError>) {
        if seq <= self.last_applied {
            debug!("Dropping stale response (seq {} <= {})", seq, self.last_applied);
            return;
        }

        match result {
            Ok(coins) => {
                self.failed_attempts = 0;
                self.retry_sleep = None;
                self.apply(seq, UpdateOrigin::Poll, coins).await;
            }
            Err(e) => {
                if self.state != DriverState::Active {
                    return;
                }
                self.failed_attempts += 1;
                let retry_in = self.config.retry.delay_for(self.failed_attempts);
                warn!("Coin list fetch failed (seq {}): {}", seq, e);

                self.emit(LiveEvent::FetchFailed {
                    seq,
                    error: e.to_string(),
                    retry_in,
                })
                .await;

                match retry_in {
                    Some(delay) => {
                        self.retry_sleep = Some(Box::pin(tokio::time::sleep_until(Instant::now() + delay)));
                    }
                    None => self.pause(PauseReason::FetchFailed).await,
                }
            }
        }
    }

    async fn apply(&mut self, seq: u64, origin: UpdateOrigin, coins: Vec<CoinRecord>) {
        self.last_applied = seq;
        debug!("Applying {} coins (seq {}, {:?})", coins.len(), seq, origin);
        self.emit(LiveEvent::Coins { seq, origin, coins }).await;
    }

    async fn emit(&self, event: LiveEvent) {
        // A closed receiver only means nobody is listening any more.
        let _ = self.events.send(event).await;
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn retry_due(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_policy_never_retries() {
        let policy = RetryPolicy::disabled();
        assert_eq!(policy.delay_for(1), None);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(3),
        };

        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(4), Some(Duration::from_secs(3)));
        assert_eq!(policy.delay_for(6), None);
    }
}
