//! The background music session.
//!
//! `AudioSession` owns at most one player handle and drives it from the
//! caller's declared intent:
//! - Track selection and switching (tracks are never mixed)
//! - Pause/resume that keeps the handle
//! - Mute that only touches the live volume
//! - Retry after load/play failures with a fixed delay
//! - A health check that reloads a stalled player
//!
//! Every asynchronous load carries the generation that was current when it
//! was issued. A completion whose generation is no longer current releases
//! its handle instead of playing it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{
    SessionConfig, DEFAULT_HEALTH_CHECK_INTERVAL_MS, DEFAULT_RETRY_DELAY_MS, DEFAULT_VOLUME,
};
use crate::sound::{AudioBackend, PlayerHandle, SoundError, TrackCatalog};
use crate::types::{AppLifecycle, PlayIntent, SessionStatus, TrackId};

use super::listeners::{MuteListeners, MuteSubscription};

// ============================================================================
// SessionState
// ============================================================================

/// Asynchronous work outstanding for the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Idle,
    Loading,
    RetryScheduled,
}

struct SessionState<H> {
    track: TrackId,
    handle: Option<H>,
    intent: PlayIntent,
    muted: bool,
    /// Bumped on every mute change; a notification stops once it is stale.
    mute_seq: u64,
    volume: f32,
    generation: u64,
    pending: Pending,
    health: Option<JoinHandle<()>>,
}

impl<H: PlayerHandle> SessionState<H> {
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Drops the current handle and invalidates in-flight loads and retries.
    fn discard_player(&mut self) {
        self.generation += 1;
        self.pending = Pending::Idle;
        if let Some(handle) = self.handle.take() {
            release_quietly(handle);
        }
    }

    fn stop_health_check(&mut self) {
        if let Some(task) = self.health.take() {
            task.abort();
            debug!("Health check stopped");
        }
    }
}

fn release_quietly<H: PlayerHandle>(handle: H) {
    if let Err(e) = handle.release() {
        debug!("Ignoring release error: {}", e);
    }
}

// ============================================================================
// Inner
// ============================================================================

struct Inner<B: AudioBackend> {
    backend: Arc<B>,
    catalog: TrackCatalog,
    retry_delay: Duration,
    health_interval: Duration,
    runtime: RuntimeHandle,
    state: Mutex<SessionState<B::Handle>>,
    listeners: Arc<MuteListeners>,
}

type StateGuard<'a, B> = MutexGuard<'a, SessionState<<B as AudioBackend>::Handle>>;

impl<B: AudioBackend> Inner<B> {
    fn lock(&self) -> StateGuard<'_, B> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begins playing `track`, replacing whatever is loaded.
    fn start_locked(self: &Arc<Self>, st: &mut SessionState<B::Handle>, track: TrackId) {
        if st.intent == PlayIntent::Playing && st.track == track && self.reconfirm(st) {
            return;
        }

        if st.track != track || st.intent != PlayIntent::Playing {
            info!(track = %track, "Starting background music");
        }
        st.intent = PlayIntent::Playing;
        st.track = track;
        self.begin_load(st);
        self.ensure_health_check(st);
    }

    /// Makes sure the already-selected track is audible.
    ///
    /// Returns false when there is neither a handle nor a load in flight,
    /// in which case the caller must load.
    fn reconfirm(self: &Arc<Self>, st: &mut SessionState<B::Handle>) -> bool {
        let Some(handle) = st.handle.as_mut() else {
            return st.pending != Pending::Idle;
        };

        if !handle.is_playing() {
            debug!("Player not producing audio, resuming in place");
            if let Err(e) = handle.play() {
                warn!("Failed to resume background music: {}, reloading", e);
                self.begin_load(st);
            }
        }
        self.ensure_health_check(st);
        true
    }

    /// Releases any handle and issues a load for the selected track.
    fn begin_load(self: &Arc<Self>, st: &mut SessionState<B::Handle>) {
        st.discard_player();
        st.pending = Pending::Loading;

        let generation = st.generation;
        let track = st.track;
        let asset = self.catalog.get(track).clone();
        let backend = Arc::clone(&self.backend);
        let session = Arc::downgrade(self);

        debug!(track = %track, generation, "Loading {}", asset.name());

        self.runtime.spawn(async move {
            let result = backend.load(&asset).await;
            match session.upgrade() {
                Some(inner) => inner.finish_load(generation, result),
                None => {
                    if let Ok(handle) = result {
                        release_quietly(handle);
                    }
                }
            }
        });
    }

    fn finish_load(self: &Arc<Self>, generation: u64, result: Result<B::Handle, SoundError>) {
        let mut st = self.lock();

        if st.generation != generation || st.intent != PlayIntent::Playing {
            debug!(generation, current = st.generation, "Discarding stale load");
            if let Ok(handle) = result {
                release_quietly(handle);
            }
            return;
        }

        match result {
            Ok(mut handle) => {
                handle.set_volume(st.effective_volume());
                handle.set_looping(true);
                match handle.play() {
                    Ok(()) => {
                        debug!(track = %st.track, "Background music playing");
                        st.handle = Some(handle);
                        st.pending = Pending::Idle;
                    }
                    Err(e) => {
                        warn!(
                            track = %st.track,
                            hint = e.suggestion(),
                            "Failed to play background music: {}",
                            e
                        );
                        release_quietly(handle);
                        self.schedule_retry(&mut st);
                    }
                }
            }
            Err(e) => {
                warn!(
                    track = %st.track,
                    hint = e.suggestion(),
                    "Failed to load background music: {}",
                    e
                );
                self.schedule_retry(&mut st);
            }
        }
    }

    fn schedule_retry(self: &Arc<Self>, st: &mut SessionState<B::Handle>) {
        st.pending = Pending::RetryScheduled;

        let generation = st.generation;
        let delay = self.retry_delay;
        let session = Arc::downgrade(self);

        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = session.upgrade() {
                inner.retry(generation);
            }
        });
    }

    fn retry(self: &Arc<Self>, generation: u64) {
        let mut st = self.lock();
        if st.generation != generation || st.intent != PlayIntent::Playing {
            return;
        }
        debug!(track = %st.track, "Retrying background music");
        self.begin_load(&mut st);
    }

    fn ensure_health_check(self: &Arc<Self>, st: &mut SessionState<B::Handle>) {
        if st.health.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let period = self.health_interval;
        let session: Weak<Self> = Arc::downgrade(self);

        st.health = Some(self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(inner) = session.upgrade() else {
                    break;
                };
                inner.check_health();
            }
        }));
        debug!("Health check started");
    }

    fn check_health(self: &Arc<Self>) {
        let mut st = self.lock();
        if st.intent != PlayIntent::Playing {
            return;
        }

        match st.handle.as_ref().map(PlayerHandle::is_playing) {
            Some(true) => {}
            Some(false) => {
                warn!(track = %st.track, "Background music stalled, reloading");
                self.begin_load(&mut st);
            }
            None if st.pending == Pending::Loading => {
                debug!("Health check: load still in flight");
            }
            None => {
                warn!(track = %st.track, "Background music has no player, reloading");
                self.begin_load(&mut st);
            }
        }
    }
}

fn non_zero_or(period: Duration, default_ms: u64) -> Duration {
    if period.is_zero() {
        warn!("Zero period in session config, using {} ms", default_ms);
        Duration::from_millis(default_ms)
    } else {
        period
    }
}

impl<B: AudioBackend> Drop for Inner<B> {
    fn drop(&mut self) {
        let st = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        st.stop_health_check();
        if let Some(handle) = st.handle.take() {
            release_quietly(handle);
        }
    }
}

// ============================================================================
// AudioSession
// ============================================================================

/// The application's single background music session.
///
/// Cloning is cheap and every clone controls the same session. None of the
/// operations fail or block: loads happen on the runtime and failures are
/// logged and retried.
///
/// # Example
///
/// ```no_run
/// use bgmusic::config::SessionConfig;
/// use bgmusic::session::AudioSession;
/// use bgmusic::sound::AudioOutput;
/// use bgmusic::types::TrackId;
///
/// # async fn example() -> Result<(), bgmusic::sound::SoundError> {
/// let output = AudioOutput::try_default()?;
/// let session = AudioSession::new(output.backend(), &SessionConfig::default());
///
/// session.start(TrackId::Home);
/// session.switch_to(TrackId::Game);
/// session.toggle_mute();
/// # Ok(())
/// # }
/// ```
pub struct AudioSession<B: AudioBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: AudioBackend> Clone for AudioSession<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: AudioBackend> AudioSession<B> {
    /// Creates a stopped session using the catalog from `config`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new(backend: B, config: &SessionConfig) -> Self {
        Self::with_catalog(backend, TrackCatalog::from_config(config), config)
    }

    /// Creates a stopped session with an explicit catalog.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn with_catalog(backend: B, catalog: TrackCatalog, config: &SessionConfig) -> Self {
        let volume = if config.default_volume.is_nan() {
            DEFAULT_VOLUME
        } else {
            config.default_volume.clamp(0.0, 1.0)
        };
        // A zero period would panic the health check and spin the retry.
        let retry_delay = non_zero_or(config.retry_delay(), DEFAULT_RETRY_DELAY_MS);
        let health_interval =
            non_zero_or(config.health_check_interval(), DEFAULT_HEALTH_CHECK_INTERVAL_MS);

        Self {
            inner: Arc::new(Inner {
                backend: Arc::new(backend),
                catalog,
                retry_delay,
                health_interval,
                runtime: RuntimeHandle::current(),
                state: Mutex::new(SessionState {
                    track: TrackId::default(),
                    handle: None,
                    intent: PlayIntent::Stopped,
                    muted: false,
                    mute_seq: 0,
                    volume,
                    generation: 0,
                    pending: Pending::Idle,
                    health: None,
                }),
                listeners: Arc::new(MuteListeners::default()),
            }),
        }
    }

    /// Plays `track`, looping, unless it is already the live track.
    pub fn start(&self, track: TrackId) {
        let mut st = self.inner.lock();
        self.inner.start_locked(&mut st, track);
    }

    /// Swaps the audible track.
    ///
    /// While stopped this only changes which track `start`/`ensure_playing`
    /// will use. While paused the old player is released and the new
    /// track loads on resume.
    pub fn switch_to(&self, track: TrackId) {
        let mut st = self.inner.lock();

        match st.intent {
            PlayIntent::Playing => {
                if st.track != track {
                    info!(from = %st.track, to = %track, "Switching background music");
                }
                self.inner.start_locked(&mut st, track);
            }
            PlayIntent::Stopped => {
                debug!(track = %track, "Selected track while stopped");
                st.track = track;
            }
            PlayIntent::Paused => {
                if st.track != track {
                    debug!(track = %track, "Selected track while paused");
                    st.track = track;
                    st.discard_player();
                }
            }
        }
    }

    /// Stops playback and releases the player.
    pub fn stop(&self) {
        let mut st = self.inner.lock();
        if st.intent != PlayIntent::Stopped {
            info!("Stopping background music");
        }
        st.intent = PlayIntent::Stopped;
        st.discard_player();
        st.stop_health_check();
    }

    /// Suspends playback, keeping the player. Only acts while playing.
    pub fn pause(&self) {
        let mut st = self.inner.lock();
        if st.intent != PlayIntent::Playing {
            return;
        }

        st.intent = PlayIntent::Paused;
        st.stop_health_check();

        match st.handle.as_mut() {
            Some(handle) => {
                if let Err(e) = handle.pause() {
                    warn!("Failed to pause background music: {}", e);
                }
            }
            // Nothing audible yet; a load that lands now must not play.
            None => st.discard_player(),
        }
        debug!("Background music paused");
    }

    /// Resumes after `pause`. Only acts while paused.
    pub fn resume(&self) {
        let mut st = self.inner.lock();
        if st.intent != PlayIntent::Paused {
            return;
        }

        st.intent = PlayIntent::Playing;
        match st.handle.as_mut() {
            Some(handle) => {
                if !handle.is_playing() {
                    if let Err(e) = handle.play() {
                        warn!("Failed to resume background music: {}, reloading", e);
                        self.inner.begin_load(&mut st);
                    }
                }
            }
            None => self.inner.begin_load(&mut st),
        }
        self.inner.ensure_health_check(&mut st);
        debug!("Background music resumed");
    }

    /// Makes sure something is audible unless the music is paused.
    pub fn ensure_playing(&self) {
        let mut st = self.inner.lock();
        match st.intent {
            PlayIntent::Paused => {}
            PlayIntent::Stopped | PlayIntent::Playing => {
                let track = st.track;
                self.inner.start_locked(&mut st, track);
            }
        }
    }

    /// Sets the non-muted volume, clamped to 0.0-1.0. NaN is ignored.
    pub fn set_volume(&self, volume: f32) {
        if volume.is_nan() {
            warn!("Ignoring NaN music volume");
            return;
        }

        let volume = volume.clamp(0.0, 1.0);
        let mut st = self.inner.lock();
        st.volume = volume;
        if !st.muted {
            if let Some(handle) = st.handle.as_mut() {
                handle.set_volume(volume);
            }
        }
    }

    /// Returns the non-muted volume.
    pub fn volume(&self) -> f32 {
        self.inner.lock().volume
    }

    /// Returns true if the caller's intent is to play.
    pub fn is_playing(&self) -> bool {
        self.inner.lock().intent == PlayIntent::Playing
    }

    /// Returns the selected track.
    pub fn current_track(&self) -> TrackId {
        self.inner.lock().track
    }

    /// Returns the caller's declared intent.
    pub fn intent(&self) -> PlayIntent {
        self.inner.lock().intent
    }

    /// Returns the observable session status.
    pub fn status(&self) -> SessionStatus {
        let st = self.inner.lock();
        match st.intent {
            PlayIntent::Stopped => SessionStatus::Stopped,
            PlayIntent::Paused => SessionStatus::Paused,
            PlayIntent::Playing if st.handle.is_some() => SessionStatus::Playing,
            PlayIntent::Playing => SessionStatus::Loading,
        }
    }

    /// Returns true if the music is muted.
    pub fn is_muted(&self) -> bool {
        self.inner.lock().muted
    }

    /// Sets the mute state. Setting the current value does nothing.
    pub fn set_muted(&self, muted: bool) {
        let seq = {
            let mut st = self.inner.lock();
            if st.muted == muted {
                return;
            }
            self.apply_mute(&mut st, muted)
        };
        self.notify_mute(muted, seq);
    }

    /// Flips the mute state and returns the new value.
    pub fn toggle_mute(&self) -> bool {
        let (muted, seq) = {
            let mut st = self.inner.lock();
            let muted = !st.muted;
            (muted, self.apply_mute(&mut st, muted))
        };
        self.notify_mute(muted, seq);
        muted
    }

    /// Delivers `muted` until a listener changes the mute state again; the
    /// nested change has already reached every listener by then.
    fn notify_mute(&self, muted: bool, seq: u64) {
        self.inner
            .listeners
            .notify(muted, || self.inner.lock().mute_seq == seq);
    }

    fn apply_mute(&self, st: &mut SessionState<B::Handle>, muted: bool) -> u64 {
        st.muted = muted;
        st.mute_seq += 1;
        let volume = st.effective_volume();
        if let Some(handle) = st.handle.as_mut() {
            handle.set_volume(volume);
        }
        debug!(muted, "Mute state changed");
        st.mute_seq
    }

    /// Registers a listener called with the new value on every mute change.
    ///
    /// Listeners run synchronously, in subscription order, after the mute
    /// state and the player volume have been updated. A listener may call
    /// back into the session; when it changes the mute state, the remaining
    /// listeners get only the newer value, so the last value every listener
    /// sees matches `is_muted()`.
    pub fn subscribe_mute<F>(&self, listener: F) -> MuteSubscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(Arc::new(listener))
    }

    /// Number of registered mute listeners.
    pub fn mute_listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Pauses on background, resumes on foreground.
    pub fn handle_lifecycle(&self, event: AppLifecycle) {
        debug!(?event, "Lifecycle event");
        match event {
            AppLifecycle::Background => self.pause(),
            AppLifecycle::Foreground => self.resume(),
        }
    }

    /// Applies lifecycle events until the channel closes.
    pub async fn run_lifecycle(&self, mut events: mpsc::UnboundedReceiver<AppLifecycle>) {
        while let Some(event) = events.recv().await {
            self.handle_lifecycle(event);
        }
        debug!("Lifecycle channel closed");
    }

    /// Stops the music and drops every listener.
    pub fn shutdown(&self) {
        self.stop();
        self.inner.listeners.clear();
        info!("Background music session shut down");
    }
}

impl<B: AudioBackend> std::fmt::Debug for AudioSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.inner.lock();
        f.debug_struct("AudioSession")
            .field("track", &st.track)
            .field("intent", &st.intent)
            .field("has_player", &st.handle.is_some())
            .field("muted", &st.muted)
            .field("volume", &st.volume)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
