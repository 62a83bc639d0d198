//! Playback Scheduler
//!
//! Two-state machine (Stopped, Playing) driving the timeline at a fixed
//! rate. While playing, exactly one tick task runs; it advances the current
//! frame every 1000/fps milliseconds and wraps around after the last frame.
//! Ticks are view-only changes and never enter undo history.
//!
//! The scheduler also owns the soundtrack: it starts audio when playback
//! starts (from zero when starting on the first frame), restarts it each
//! time the loop wraps back to the first frame, and pauses it on stop.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::engine::audio::SharedAudio;
use crate::error::{AnimateError, Result};
use crate::state::store::SharedStore;
use crate::timeline::frames::advance_frame;

/// Playback states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "Stopped"),
            PlaybackState::Playing => write!(f, "Playing"),
        }
    }
}

/// Handle to the running tick task and the rate it was scheduled with.
#[derive(Debug)]
struct TickTask {
    handle: JoinHandle<()>,
    fps: u32,

    /// Cleared under the store lock when the task is cancelled.
    active: Arc<AtomicBool>,
}

/// Fixed-rate frame advance with audio synchronization.
#[derive(Debug)]
pub struct PlaybackScheduler {
    state: PlaybackState,
    store: SharedStore,
    audio: SharedAudio,
    task: Option<TickTask>,

    /// Whether the document had a soundtrack when audio was last synced.
    audio_attached: bool,

    ticks: Arc<AtomicU64>,
}

impl PlaybackScheduler {
    pub fn new(store: SharedStore, audio: SharedAudio) -> Self {
        Self {
            state: PlaybackState::Stopped,
            store,
            audio,
            task: None,
            audio_attached: false,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start playback. Must be called from within a tokio runtime.
    ///
    /// State transition: Stopped -> Playing. No-op when already playing.
    pub fn play(&mut self) -> Result<()> {
        if self.is_playing() {
            debug!("[PLAYBACK] Already playing");
            return Ok(());
        }

        let state = self.store.state();
        self.schedule(state.fps)?;
        self.state = PlaybackState::Playing;

        self.audio_attached = state.audio_track.is_some();
        if self.audio_attached {
            self.audio.start(state.current_frame_index == 0);
        }

        info!(
            "[PLAYBACK] Play from frame {} at {} fps",
            state.current_frame_index, state.fps
        );
        Ok(())
    }

    /// Stop playback; no tick fires after this returns.
    ///
    /// State transition: Playing -> Stopped. No-op when already stopped.
    pub fn stop(&mut self) {
        if !self.is_playing() {
            debug!("[PLAYBACK] Already stopped");
            return;
        }
        self.cancel_task();
        self.state = PlaybackState::Stopped;
        self.audio.pause();
        info!("[PLAYBACK] Stopped at frame {}", self.store.state().current_frame_index);
    }

    /// Flip between Stopped and Playing. Returns the new state.
    pub fn toggle_play(&mut self) -> Result<PlaybackState> {
        match self.state {
            PlaybackState::Playing => self.stop(),
            PlaybackState::Stopped => self.play()?,
        }
        Ok(self.state)
    }

    /// Re-read the document after an edit while playing.
    ///
    /// A changed fps cancels the running tick task and schedules a new one
    /// at the new period. Attaching or detaching the soundtrack starts or
    /// pauses audio.
    pub fn refresh(&mut self) -> Result<()> {
        if !self.is_playing() {
            return Ok(());
        }
        let state = self.store.state();

        let attached = state.audio_track.is_some();
        if attached != self.audio_attached {
            if attached {
                self.audio.start(state.current_frame_index == 0);
            } else {
                self.audio.pause();
            }
            self.audio_attached = attached;
        }

        let scheduled_fps = self.task.as_ref().map(|t| t.fps);
        if scheduled_fps != Some(state.fps) {
            info!(
                "[PLAYBACK] Rescheduling ticks: {:?} -> {} fps",
                scheduled_fps, state.fps
            );
            self.schedule(state.fps)?;
        }
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Total ticks fired since the scheduler was created.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// The fps the running tick task was scheduled with.
    pub fn scheduled_fps(&self) -> Option<u32> {
        self.task.as_ref().map(|t| t.fps)
    }

    fn schedule(&mut self, fps: u32) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| AnimateError::Internal("playback requires a tokio runtime".into()))?;

        self.cancel_task();
        let period = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        let active = Arc::new(AtomicBool::new(true));
        let handle = runtime.spawn(run_ticks(
            self.store.clone(),
            self.audio.clone(),
            period,
            Arc::clone(&self.ticks),
            Arc::clone(&active),
        ));
        self.task = Some(TickTask { handle, fps, active });
        Ok(())
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            // a tick already past its await either finished navigating or sees the flag
            self.store.with(|_| task.active.store(false, Ordering::Release));
            task.handle.abort();
            debug!("[PLAYBACK] Tick task at {} fps cancelled", task.fps);
        }
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

/// Tick loop. Every tick re-reads the live document from the store, so edits
/// made between ticks (added or deleted frames) are always honoured.
async fn run_ticks(
    store: SharedStore,
    audio: SharedAudio,
    period: Duration,
    ticks: Arc<AtomicU64>,
    active: Arc<AtomicBool>,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let Some(outcome) = advance_tick(&store, &audio, &active) else {
            break;
        };
        ticks.fetch_add(1, Ordering::Relaxed);

        match outcome {
            Ok(index) => tracing::trace!(frame = index, "playback tick"),
            Err(e) => {
                tracing::warn!(error = %e, "playback tick rejected, stopping tick task");
                break;
            }
        }
    }
}

/// Advance one frame and restart audio on wrap, all under the store lock.
/// `None` once the owning task has been cancelled.
fn advance_tick(store: &SharedStore, audio: &SharedAudio, active: &AtomicBool) -> Option<Result<usize>> {
    store.with(|s| {
        if !active.load(Ordering::Acquire) {
            return None;
        }
        let current = s.state();
        let next = advance_frame(&current);
        let index = next.current_frame_index;
        let restart_audio =
            current.current_frame_index != 0 && index == 0 && next.audio_track.is_some();

        Some(s.navigate(next).map(|()| {
            if restart_audio {
                audio.start(true);
            }
            index
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::audio::{AudioError, AudioSink};
    use crate::state::history::EditAction;
    use crate::state::project::ProjectState;
    use crate::state::store::ProjectStore;
    use crate::timeline::frames::add_frame;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum AudioEvent {
        Play,
        Pause,
        Rewind,
    }

    #[derive(Clone, Default)]
    struct RecordingAudio {
        events: Arc<Mutex<Vec<AudioEvent>>>,
        blocked: bool,
    }

    impl RecordingAudio {
        fn events(&self) -> Vec<AudioEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AudioSink for RecordingAudio {
        fn play(&mut self) -> std::result::Result<(), AudioError> {
            self.events.lock().unwrap().push(AudioEvent::Play);
            if self.blocked {
                Err(AudioError::Blocked)
            } else {
                Ok(())
            }
        }
        fn pause(&mut self) {
            self.events.lock().unwrap().push(AudioEvent::Pause);
        }
        fn rewind(&mut self) {
            self.events.lock().unwrap().push(AudioEvent::Rewind);
        }
    }

    fn store_with_frames(count: usize, fps: u32, audio: bool) -> SharedStore {
        let mut state = ProjectState {
            fps,
            ..ProjectState::default()
        };
        for _ in 1..count {
            state = add_frame(&state).unwrap();
        }
        state.current_frame_index = 0;
        if audio {
            state.audio_track = Some("loop.ogg".to_string());
        }
        SharedStore::new(ProjectStore::new(state, 20))
    }

    #[test]
    fn test_default_state_is_stopped() {
        let playback = PlaybackScheduler::new(SharedStore::default(), SharedAudio::default());
        assert_eq!(playback.state(), PlaybackState::Stopped);
        assert_eq!(playback.scheduled_fps(), None);
        assert_eq!(PlaybackState::Playing.to_string(), "Playing");
    }

    #[test]
    fn test_play_outside_runtime_fails() {
        let mut playback = PlaybackScheduler::new(SharedStore::default(), SharedAudio::default());
        assert!(playback.play().is_err());
        assert!(!playback.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_wrap_around() {
        let store = store_with_frames(3, 12, false);
        let mut playback = PlaybackScheduler::new(store.clone(), SharedAudio::default());
        playback.play().unwrap();

        let period = store.state().frame_period();
        time::sleep(period / 2).await;
        let mut seen = Vec::new();
        for _ in 0..5 {
            time::sleep(period).await;
            seen.push(store.state().current_frame_index);
        }

        assert_eq!(seen, vec![1, 2, 0, 1, 2]);
        assert_eq!(playback.tick_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_do_not_enter_history() {
        let store = store_with_frames(3, 12, false);
        let mut playback = PlaybackScheduler::new(store.clone(), SharedAudio::default());
        playback.play().unwrap();
        time::sleep(Duration::from_millis(500)).await;
        assert!(store.lock().history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_ticks() {
        let store = store_with_frames(3, 10, false);
        let mut playback = PlaybackScheduler::new(store.clone(), SharedAudio::default());
        assert_eq!(playback.toggle_play().unwrap(), PlaybackState::Playing);

        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(playback.toggle_play().unwrap(), PlaybackState::Stopped);
        let index = store.state().current_frame_index;

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.state().current_frame_index, index);
        assert_eq!(playback.tick_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fps_change_reschedules() {
        let store = store_with_frames(3, 10, false);
        let mut playback = PlaybackScheduler::new(store.clone(), SharedAudio::default());
        playback.play().unwrap();

        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(playback.tick_count(), 1);

        store.with(|s| {
            let next = ProjectState {
                fps: 2,
                ..(*s.state()).clone()
            };
            s.commit(EditAction::Settings, next).unwrap();
        });
        playback.refresh().unwrap();
        assert_eq!(playback.scheduled_fps(), Some(2));

        // the old 100 ms task is gone; the new one first fires at +500 ms
        time::sleep(Duration::from_millis(450)).await;
        assert_eq!(playback.tick_count(), 1);
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(playback.tick_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_without_fps_change_keeps_task() {
        let store = store_with_frames(2, 10, false);
        let mut playback = PlaybackScheduler::new(store.clone(), SharedAudio::default());
        playback.play().unwrap();
        time::sleep(Duration::from_millis(150)).await;
        playback.refresh().unwrap();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(playback.tick_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_restarts_from_zero_on_first_frame() {
        let store = store_with_frames(2, 10, true);
        let audio = RecordingAudio::default();
        let mut playback = PlaybackScheduler::new(store.clone(), SharedAudio::new(audio.clone()));

        playback.play().unwrap();
        assert_eq!(audio.events(), vec![AudioEvent::Rewind, AudioEvent::Play]);

        // tick 1 -> frame 1, tick 2 wraps -> frame 0 and restarts audio
        time::sleep(Duration::from_millis(250)).await;
        assert_eq!(store.state().current_frame_index, 0);
        assert_eq!(
            audio.events(),
            vec![
                AudioEvent::Rewind,
                AudioEvent::Play,
                AudioEvent::Rewind,
                AudioEvent::Play
            ]
        );

        playback.stop();
        assert_eq!(audio.events().last(), Some(&AudioEvent::Pause));
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_resumes_mid_sequence_without_rewind() {
        let store = store_with_frames(3, 10, true);
        store.with(|s| {
            let next = ProjectState {
                current_frame_index: 1,
                ..(*s.state()).clone()
            };
            s.navigate(next).unwrap();
        });
        let audio = RecordingAudio::default();
        let mut playback = PlaybackScheduler::new(store, SharedAudio::new(audio.clone()));
        playback.play().unwrap();
        assert_eq!(audio.events(), vec![AudioEvent::Play]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_audio_does_not_stop_visuals() {
        let store = store_with_frames(3, 10, true);
        let audio = RecordingAudio {
            blocked: true,
            ..RecordingAudio::default()
        };
        let mut playback = PlaybackScheduler::new(store.clone(), SharedAudio::new(audio));
        playback.play().unwrap();
        assert!(playback.is_playing());

        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.state().current_frame_index, 1);
    }

    #[test]
    fn test_tick_after_cancel_is_noop() {
        let store = store_with_frames(2, 10, true);
        let audio = RecordingAudio::default();
        let shared = SharedAudio::new(audio.clone());
        let active = AtomicBool::new(false);

        assert!(advance_tick(&store, &shared, &active).is_none());
        assert_eq!(store.state().current_frame_index, 0);

        active.store(true, Ordering::Release);
        assert_eq!(advance_tick(&store, &shared, &active).unwrap().unwrap(), 1);
        assert!(audio.events().is_empty());
        assert_eq!(advance_tick(&store, &shared, &active).unwrap().unwrap(), 0);
        assert_eq!(audio.events(), vec![AudioEvent::Rewind, AudioEvent::Play]);

        active.store(false, Ordering::Release);
        assert!(advance_tick(&store, &shared, &active).is_none());
        assert_eq!(audio.events().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_task_flag() {
        let store = store_with_frames(3, 10, false);
        let mut playback = PlaybackScheduler::new(store.clone(), SharedAudio::default());
        playback.play().unwrap();
        let active = Arc::clone(&playback.task.as_ref().unwrap().active);

        playback.stop();
        assert!(!active.load(Ordering::Acquire));
        assert!(advance_tick(&store, &SharedAudio::default(), &active).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_ticks() {
        let store = store_with_frames(3, 10, false);
        {
            let mut playback = PlaybackScheduler::new(store.clone(), SharedAudio::default());
            playback.play().unwrap();
        }
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.state().current_frame_index, 0);
    }
}
