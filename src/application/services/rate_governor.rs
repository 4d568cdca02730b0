//! Per-client token-bucket admission control for the write path.
//!
//! Each client identity owns a `governor` rate limiter holding up to `burst`
//! cells, replenished at `rate_per_second`. An admitted request consumes one
//! cell. A background sweeper evicts clients idle longer than `idle_timeout`,
//! bounding memory under identity churn.
//!
//! The client map sits behind one mutex. Admission holds it for the
//! lookup-and-check only, and the sweeper takes the same lock before scanning,
//! so neither can observe a half-inserted client.

use governor::clock::{Clock, DefaultClock, Reference};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// Longest replenish period a quota is built with.
const MAX_REPLENISH_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

type ClientLimiter<C> = RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Tuning for a [`RateGovernor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GovernorSettings {
    /// Cells replenished per second.
    pub rate_per_second: f64,
    /// Bucket capacity; a new client starts full.
    pub burst: u32,
    /// Period of the background sweep.
    pub sweep_interval: Duration,
    /// Clients unseen for longer than this are evicted by the sweep.
    pub idle_timeout: Duration,
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            rate_per_second: 2.0,
            burst: 4,
            sweep_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(180),
        }
    }
}

impl GovernorSettings {
    /// Builds the per-client quota.
    ///
    /// A non-positive rate or a zero burst is clamped to the slowest quota
    /// (one cell, replenished once a day) instead of failing.
    pub fn quota(&self) -> Quota {
        let period = if self.rate_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / self.rate_per_second)
                .unwrap_or(MAX_REPLENISH_PERIOD)
                .clamp(Duration::from_nanos(1), MAX_REPLENISH_PERIOD)
        } else {
            MAX_REPLENISH_PERIOD
        };
        let burst = NonZeroU32::new(self.burst).unwrap_or(NonZeroU32::MIN);

        Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst)
    }
}

struct Client<C: Clock> {
    limiter: ClientLimiter<C>,
    last_seen: C::Instant,
}

struct Clients<C: Clock> {
    entries: Mutex<HashMap<String, Client<C>>>,
    settings: GovernorSettings,
    quota: Quota,
    clock: C,
}

impl<C: Clock + Clone> Clients<C> {
    fn admit(&self, identity: &str) -> bool {
        let now = self.clock.now();

        let mut entries = self.entries.lock();
        let client = entries.entry(identity.to_owned()).or_insert_with(|| Client {
            limiter: RateLimiter::direct_with_clock(self.quota, self.clock.clone()),
            last_seen: now,
        });

        client.last_seen = now;
        client.limiter.check().is_ok()
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let idle_timeout = self.settings.idle_timeout;

        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, client| Duration::from(now.duration_since(client.last_seen)) <= idle_timeout);
        before - entries.len()
    }
}

struct Sweeper {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// In-memory, per-client rate governor.
///
/// State is not persisted: a restart forgets every client. This is a soft
/// protection for the write path, not a security boundary.
///
/// # Lifecycle
///
/// - [`RateGovernor::start`] builds the governor and spawns its sweeper on the
///   current tokio runtime
/// - [`RateGovernor::shutdown`] stops the sweeper and waits for it
/// - Dropping the governor aborts a still-running sweeper
///
/// [`RateGovernor::new`] builds one without a sweeper; call
/// [`RateGovernor::sweep`] manually.
///
/// The clock is `governor`'s [`DefaultClock`] unless one is injected with
/// [`RateGovernor::with_clock`]; tests use [`governor::clock::FakeRelativeClock`].
///
/// # Example
///
/// ```rust,ignore
/// let governor = RateGovernor::start(GovernorSettings::default());
///
/// if !governor.admit("203.0.113.7") {
///     return Err(AppError::RateLimited);
/// }
/// ```
pub struct RateGovernor<C: Clock = DefaultClock> {
    clients: Arc<Clients<C>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl RateGovernor {
    /// Creates a governor on the default clock without a background sweeper.
    pub fn new(settings: GovernorSettings) -> Self {
        Self::with_clock(settings, DefaultClock::default())
    }

    /// Creates a governor on the default clock and starts its sweeper.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(settings: GovernorSettings) -> Self {
        Self::start_with_clock(settings, DefaultClock::default())
    }
}

impl<C> RateGovernor<C>
where
    C: Clock + Clone + Send + Sync + 'static,
{
    /// Creates a governor on a custom clock without a background sweeper.
    pub fn with_clock(settings: GovernorSettings, clock: C) -> Self {
        Self {
            clients: Arc::new(Clients {
                entries: Mutex::new(HashMap::new()),
                settings,
                quota: settings.quota(),
                clock,
            }),
            sweeper: Mutex::new(None),
        }
    }

    /// Creates a governor on a custom clock and starts its sweeper.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start_with_clock(settings: GovernorSettings, clock: C) -> Self {
        let governor = Self::with_clock(settings, clock);

        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_sweeper(governor.clients.clone(), stop_rx));
        *governor.sweeper.lock() = Some(Sweeper { stop, handle });

        info!(
            rate_per_second = settings.rate_per_second,
            burst = settings.burst,
            sweep_interval_secs = settings.sweep_interval.as_secs(),
            idle_timeout_secs = settings.idle_timeout.as_secs(),
            "Rate governor started"
        );

        governor
    }

    /// Decides whether a request from `identity` may proceed.
    ///
    /// Creates a full limiter for a first-seen identity, then asks it for one
    /// cell. The client's last-seen time is refreshed whether or not it is
    /// admitted.
    pub fn admit(&self, identity: &str) -> bool {
        let allowed = self.clients.admit(identity);

        let decision = if allowed { "allowed" } else { "denied" };
        metrics::counter!("rate_governor_decisions_total", "decision" => decision).increment(1);

        if !allowed {
            debug!(client = identity, "rate limit exceeded");
        }

        allowed
    }

    /// [`Self::admit`] as a result, for `?` at call sites.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::RateLimited`] if the client has no cell left.
    pub fn check(&self, identity: &str) -> Result<(), AppError> {
        if self.admit(identity) {
            Ok(())
        } else {
            Err(AppError::RateLimited)
        }
    }

    /// Evicts clients idle beyond the staleness threshold. Returns the count evicted.
    pub fn sweep(&self) -> usize {
        let evicted = self.clients.sweep();
        if evicted > 0 {
            metrics::counter!("rate_governor_evictions_total").increment(evicted as u64);
        }
        evicted
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.entries.lock().len()
    }

    pub fn settings(&self) -> &GovernorSettings {
        &self.clients.settings
    }

    /// Returns true while the background sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|sweeper| !sweeper.handle.is_finished())
    }

    /// Stops the background sweeper and waits for it to exit.
    ///
    /// Admission keeps working afterwards; only eviction stops.
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().take();

        if let Some(sweeper) = sweeper {
            let _ = sweeper.stop.send(true);
            if let Err(e) = sweeper.handle.await {
                warn!(error = %e, "Rate governor sweeper ended abnormally");
            }
            info!("Rate governor stopped");
        }
    }
}

impl<C: Clock> Drop for RateGovernor<C> {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.handle.abort();
        }
    }
}

async fn run_sweeper<C: Clock + Clone>(clients: Arc<Clients<C>>, mut stop: watch::Receiver<bool>) {
    let period = clients.settings.sweep_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = clients.sweep();
                if evicted > 0 {
                    metrics::counter!("rate_governor_evictions_total").increment(evicted as u64);
                    debug!(evicted, "evicted idle rate limit clients");
                }
            }
            _ = stop.changed() => break,
        }
    }
}
