//! Scriptable backend for tests.
//!
//! `MockAudioBackend` records every load, tracks which handles are still
//! live, and lets a test hold loads in flight, inject load/play failures
//! and kill playback to simulate a stall.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::error::SoundError;
use super::source::TrackAsset;
use super::{AudioBackend, PlayerHandle};

/// What the mock knows about one handle it created.
#[derive(Debug, Clone, PartialEq)]
pub struct MockPlayerState {
    pub id: u64,
    pub asset: TrackAsset,
    pub playing: bool,
    pub volume: f32,
    pub looping: bool,
    pub released: bool,
    pub play_calls: u32,
    pub pause_calls: u32,
    pub volume_calls: u32,
}

#[derive(Debug, Default)]
struct MockState {
    load_requests: Vec<TrackAsset>,
    next_id: u64,
    players: BTreeMap<u64, MockPlayerState>,
    holding: bool,
    failing_loads: u32,
    failing_plays: u32,
    failing_releases: bool,
}

/// Mock audio backend for testing.
#[derive(Debug, Clone, Default)]
pub struct MockAudioBackend {
    state: Arc<Mutex<MockState>>,
    gate: Arc<Notify>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAudioBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps every load pending until `release_loads` is called.
    pub fn hold_loads(&self) {
        lock(&self.state).holding = true;
    }

    /// Lets pending and future loads complete.
    pub fn release_loads(&self) {
        lock(&self.state).holding = false;
        self.gate.notify_waiters();
    }

    /// Makes the next `count` loads fail.
    pub fn fail_next_loads(&self, count: u32) {
        lock(&self.state).failing_loads = count;
    }

    /// Makes the next `count` play calls fail.
    pub fn fail_next_plays(&self, count: u32) {
        lock(&self.state).failing_plays = count;
    }

    /// Makes every release report an error (the handle is still freed).
    pub fn set_release_fails(&self, fails: bool) {
        lock(&self.state).failing_releases = fails;
    }

    /// Stops every live handle behind the session's back.
    pub fn stall_live_players(&self) {
        for player in lock(&self.state).players.values_mut() {
            if !player.released {
                player.playing = false;
            }
        }
    }

    /// Number of load requests issued so far.
    #[must_use]
    pub fn load_count(&self) -> usize {
        lock(&self.state).load_requests.len()
    }

    /// Assets requested so far, in order.
    #[must_use]
    pub fn load_requests(&self) -> Vec<TrackAsset> {
        lock(&self.state).load_requests.clone()
    }

    /// Every handle ever created, live or released.
    #[must_use]
    pub fn players(&self) -> Vec<MockPlayerState> {
        lock(&self.state).players.values().cloned().collect()
    }

    /// Handles that have not been released.
    #[must_use]
    pub fn live_players(&self) -> Vec<MockPlayerState> {
        lock(&self.state)
            .players
            .values()
            .filter(|p| !p.released)
            .cloned()
            .collect()
    }

    /// The most recently created live handle.
    #[must_use]
    pub fn current_player(&self) -> Option<MockPlayerState> {
        self.live_players().pop()
    }

    /// Handles that are live and producing audio.
    #[must_use]
    pub fn audible_players(&self) -> Vec<MockPlayerState> {
        self.live_players()
            .into_iter()
            .filter(|p| p.playing && p.volume > 0.0)
            .collect()
    }
}

impl AudioBackend for MockAudioBackend {
    type Handle = MockPlayerHandle;

    fn load(
        &self,
        asset: &TrackAsset,
    ) -> impl std::future::Future<Output = Result<MockPlayerHandle, SoundError>> + Send {
        let state = Arc::clone(&self.state);
        let gate = Arc::clone(&self.gate);
        let asset = asset.clone();
        lock(&state).load_requests.push(asset.clone());

        async move {
            loop {
                let notified = gate.notified();
                let holding = lock(&state).holding;
                if !holding {
                    break;
                }
                notified.await;
            }
            // A real platform never completes a load synchronously.
            tokio::task::yield_now().await;

            let mut guard = lock(&state);
            if guard.failing_loads > 0 {
                guard.failing_loads -= 1;
                return Err(SoundError::FileNotFound(format!("mock: {}", asset.name())));
            }

            let id = guard.next_id;
            guard.next_id += 1;
            guard.players.insert(
                id,
                MockPlayerState {
                    id,
                    asset,
                    playing: false,
                    volume: 1.0,
                    looping: false,
                    released: false,
                    play_calls: 0,
                    pause_calls: 0,
                    volume_calls: 0,
                },
            );
            drop(guard);

            Ok(MockPlayerHandle { id, state })
        }
    }
}

/// Handle to one mock player.
#[derive(Debug)]
pub struct MockPlayerHandle {
    id: u64,
    state: Arc<Mutex<MockState>>,
}

impl MockPlayerHandle {
    /// The id of the player this handle controls.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    fn with_player<R>(&self, f: impl FnOnce(&mut MockPlayerState) -> R) -> Option<R> {
        lock(&self.state).players.get_mut(&self.id).map(f)
    }
}

impl PlayerHandle for MockPlayerHandle {
    fn play(&mut self) -> Result<(), SoundError> {
        let mut guard = lock(&self.state);
        if guard.failing_plays > 0 {
            guard.failing_plays -= 1;
            return Err(SoundError::PlaybackError("mock failure".to_string()));
        }
        if let Some(player) = guard.players.get_mut(&self.id) {
            player.play_calls += 1;
            player.playing = true;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SoundError> {
        self.with_player(|p| {
            p.pause_calls += 1;
            p.playing = false;
        });
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.with_player(|p| {
            p.volume_calls += 1;
            p.volume = volume;
        });
    }

    fn set_looping(&mut self, looping: bool) {
        self.with_player(|p| p.looping = looping);
    }

    fn is_playing(&self) -> bool {
        self.with_player(|p| p.playing).unwrap_or(false)
    }

    fn release(self) -> Result<(), SoundError> {
        let mut guard = lock(&self.state);
        if let Some(player) = guard.players.get_mut(&self.id) {
            player.playing = false;
            player.released = true;
        }
        if guard.failing_releases {
            return Err(SoundError::ReleaseFailed("mock failure".to_string()));
        }
        Ok(())
    }
}
