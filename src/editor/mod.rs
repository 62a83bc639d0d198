//! Editor Session
//!
//! Glue between user commands and the engine: every timeline operation is
//! computed against the live document and committed (or navigated) through
//! the shared store in one locked step. The session also owns playback,
//! export jobs, notifications, the active tool and image import staging.

pub mod import;
pub mod input;
pub mod job;
pub mod notify;
pub mod onion;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, error, info, warn};

use crate::config::EditorConfig;
use crate::engine::audio::SharedAudio;
use crate::engine::playback::{PlaybackScheduler, PlaybackState};
use crate::error::{AnimateError, Result};
use crate::export::encoder::VideoEncoder;
use crate::export::pipeline::{ExportPipeline, FrameSink};
use crate::state::history::EditAction;
use crate::state::persistence;
use crate::state::project::{EffectKind, ProjectState};
use crate::state::store::{ProjectStore, SharedStore};
use crate::timeline;

pub use import::{read_image_file, ImageSource, ImportedImage, ToolType, LOCAL_IMPORT_FAILED};
pub use input::{KeyPress, Shortcut};
pub use job::ExportJob;
pub use notify::{Notification, NotificationKind, Notifications};
pub use onion::{OnionSkinNeighbours, OnionSkinSettings};

use job::{post, ExportGuard};

#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    store: SharedStore,
    playback: PlaybackScheduler,
    pipeline: ExportPipeline,
    notifications: Arc<Mutex<Notifications>>,
    exporting: Arc<AtomicBool>,
    active_tool: ToolType,
    pending_image: Option<ImportedImage>,
    onion_skin: OnionSkinSettings,
}

impl Editor {
    /// A session on a fresh project with silent audio.
    pub fn new(config: EditorConfig) -> Result<Self> {
        Self::with_audio(config, SharedAudio::default())
    }

    pub fn with_audio(config: EditorConfig, audio: SharedAudio) -> Result<Self> {
        config.validate()?;
        let store = SharedStore::new(ProjectStore::new(
            config.initial_project(),
            config.history_capacity,
        ));
        let playback = PlaybackScheduler::new(store.clone(), audio);

        Ok(Self {
            pipeline: ExportPipeline::new(config.background_color()?),
            notifications: Arc::new(Mutex::new(Notifications::new(config.notification_ttl()))),
            exporting: Arc::new(AtomicBool::new(false)),
            active_tool: ToolType::default(),
            pending_image: None,
            onion_skin: OnionSkinSettings::default(),
            config,
            store,
            playback,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The live document.
    pub fn state(&self) -> Arc<ProjectState> {
        self.store.state()
    }

    // ------------------------------------------------------------------
    // Timeline
    // ------------------------------------------------------------------

    /// Returns `Ok(false)` when the operation does not apply to the
    /// current document.
    pub fn add_frame(&mut self) -> Result<bool> {
        self.edit(EditAction::AddFrame, timeline::add_frame)
    }

    pub fn delete_frame(&mut self, index: usize) -> Result<bool> {
        self.edit(EditAction::DeleteFrame, |s| timeline::delete_frame(s, index))
    }

    pub fn duplicate_frame(&mut self, index: usize) -> Result<bool> {
        self.edit(EditAction::DuplicateFrame, |s| timeline::duplicate_frame(s, index))
    }

    pub fn reorder_frames(&mut self, from: usize, to: usize) -> Result<bool> {
        self.edit(EditAction::ReorderFrames, |s| timeline::reorder_frames(s, from, to))
    }

    pub fn select_frame(&mut self, index: usize) -> Result<bool> {
        self.view(|s| timeline::select_frame(s, index))
    }

    pub fn select_layer(&mut self, index: usize) -> Result<bool> {
        self.view(|s| timeline::select_layer(s, index))
    }

    pub fn add_layer(&mut self) -> Result<bool> {
        self.edit(EditAction::LayerChange, timeline::add_layer)
    }

    pub fn delete_layer(&mut self, index: usize) -> Result<bool> {
        self.edit(EditAction::LayerChange, |s| timeline::delete_layer(s, index))
    }

    pub fn set_layer_visibility(&mut self, frame: usize, layer: usize, visible: bool) -> Result<bool> {
        self.edit(EditAction::LayerChange, |s| {
            timeline::set_layer_visibility(s, frame, layer, visible)
        })
    }

    pub fn set_layer_locked(&mut self, frame: usize, layer: usize, locked: bool) -> Result<bool> {
        self.edit(EditAction::LayerChange, |s| {
            timeline::set_layer_locked(s, frame, layer, locked)
        })
    }

    pub fn set_layer_opacity(&mut self, frame: usize, layer: usize, opacity: f32) -> Result<bool> {
        self.edit(EditAction::LayerChange, |s| {
            timeline::set_layer_opacity(s, frame, layer, opacity)
        })
    }

    /// Pixel hand-off from the drawing surface.
    pub fn update_layer_data(&mut self, frame: usize, layer: usize, payload: &str) -> Result<bool> {
        self.edit(EditAction::Draw, |s| {
            timeline::update_layer_data(s, frame, layer, payload)
        })
    }

    pub fn clear_layer(&mut self, frame: usize, layer: usize) -> Result<bool> {
        self.edit(EditAction::Draw, |s| timeline::clear_layer(s, frame, layer))
    }

    pub fn apply_dynamic_effect(
        &mut self,
        kind: EffectKind,
        intensity: f32,
        apply_to_all: bool,
    ) -> Result<bool> {
        self.edit(EditAction::DynamicEffect, |s| {
            Some(timeline::apply_dynamic_effect(s, kind, intensity, apply_to_all))
        })
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Change the frame rate. A running playback picks up the new period.
    pub fn set_fps(&mut self, fps: u32) -> Result<bool> {
        let changed = self.edit(EditAction::Settings, |s| timeline::set_fps(s, fps))?;
        if changed {
            self.playback.refresh()?;
        }
        Ok(changed)
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<bool> {
        self.edit(EditAction::Settings, |s| timeline::set_dimensions(s, width, height))
    }

    pub fn set_audio_track(&mut self, track: Option<String>) -> Result<bool> {
        let changed = self.edit(EditAction::Settings, |s| timeline::set_audio_track(s, track))?;
        if changed {
            self.playback.refresh()?;
        }
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<bool> {
        let changed = self.store.with(|s| s.undo());
        if changed {
            self.playback.refresh()?;
        }
        Ok(changed)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let changed = self.store.with(|s| s.redo());
        if changed {
            self.playback.refresh()?;
        }
        Ok(changed)
    }

    pub fn can_undo(&self) -> bool {
        self.store.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.lock().can_redo()
    }

    /// Route a key press. Returns whether a shortcut changed the document.
    pub fn handle_key(&mut self, press: KeyPress) -> Result<bool> {
        match Shortcut::from_key(&press) {
            Some(Shortcut::Undo) => self.undo(),
            Some(Shortcut::Redo) => self.redo(),
            None => Ok(false),
        }
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    pub fn play(&mut self) -> Result<()> {
        self.playback.play()
    }

    pub fn stop(&mut self) {
        self.playback.stop()
    }

    pub fn toggle_play(&mut self) -> Result<PlaybackState> {
        self.playback.toggle_play()
    }

    pub fn playback(&self) -> &PlaybackScheduler {
        &self.playback
    }

    // ------------------------------------------------------------------
    // Project files
    // ------------------------------------------------------------------

    /// Start over from the configured blank project. History is cleared.
    pub fn new_project(&mut self) -> Result<()> {
        let fresh = self.config.initial_project();
        self.replace_project(fresh)?;
        info!("[EDITOR] New project");
        Ok(())
    }

    pub fn open_project(&mut self, path: &Path) -> Result<()> {
        let loaded = persistence::load_project(path).map_err(|e| {
            warn!("[EDITOR] Could not open {}: {}", path.display(), e);
            self.notify(e.friendly_message(), NotificationKind::Error);
            e
        })?;
        self.replace_project(loaded)
    }

    /// Save into `dir` under a timestamped name.
    pub fn save_project(&self, dir: &Path) -> Result<PathBuf> {
        match persistence::save_project_in(&self.state(), dir) {
            Ok(path) => {
                self.notify("Project saved", NotificationKind::Success);
                Ok(path)
            }
            Err(e) => {
                self.notify(e.friendly_message(), NotificationKind::Error);
                Err(e)
            }
        }
    }

    fn replace_project(&mut self, state: ProjectState) -> Result<()> {
        self.store.with(|s| s.reset(state))?;
        self.playback.refresh()
    }

    // ------------------------------------------------------------------
    // Tools and import
    // ------------------------------------------------------------------

    pub fn active_tool(&self) -> ToolType {
        self.active_tool
    }

    pub fn set_tool(&mut self, tool: ToolType) {
        self.active_tool = tool;
    }

    /// Stage an image for placement and switch to the Move tool.
    pub fn import_image(&mut self, image: ImportedImage) {
        self.notify(image.source.import_message(), NotificationKind::Info);
        self.active_tool = ToolType::Move;
        self.pending_image = Some(image);
    }

    /// Read a local file and stage it. A failed read leaves the session as it was.
    pub fn import_local_image(&mut self, path: &Path) -> Result<()> {
        match read_image_file(path) {
            Ok(image) => {
                self.import_image(image);
                Ok(())
            }
            Err(e) => {
                warn!("[EDITOR] Import of {} failed: {}", path.display(), e);
                self.notify(LOCAL_IMPORT_FAILED, NotificationKind::Error);
                Err(e)
            }
        }
    }

    pub fn pending_image(&self) -> Option<&ImportedImage> {
        self.pending_image.as_ref()
    }

    /// Called by the drawing surface once the image has been placed.
    pub fn clear_pending_image(&mut self) {
        self.pending_image = None;
    }

    pub fn onion_skin(&self) -> &OnionSkinSettings {
        &self.onion_skin
    }

    pub fn set_onion_skin(&mut self, settings: OnionSkinSettings) {
        self.onion_skin = OnionSkinSettings {
            opacity: settings.opacity.clamp(0.0, 1.0),
            ..settings
        };
    }

    pub fn onion_skin_neighbours(&self) -> OnionSkinNeighbours {
        onion::neighbours(&self.state(), &self.onion_skin)
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// The notification on screen, if any.
    pub fn notification(&self) -> Option<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current()
            .cloned()
    }

    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) {
        post(&self.notifications, message, kind);
    }

    pub fn dismiss_notification(&self) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dismiss();
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    /// Export the document as it is right now. Must be called from within
    /// a tokio runtime.
    pub fn export_video(&self, encoder: Box<dyn VideoEncoder>) -> Result<ExportJob> {
        self.export_with_sink(encoder, Box::new(()))
    }

    /// Like `export_video`, reporting each composited frame to `sink`.
    pub fn export_with_sink(
        &self,
        encoder: Box<dyn VideoEncoder>,
        sink: Box<dyn FrameSink>,
    ) -> Result<ExportJob> {
        let guard = ExportGuard::acquire(&self.exporting).map_err(|e| {
            debug!("[EDITOR] Export requested while one is running");
            e
        })?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| AnimateError::Internal("export requires a tokio runtime".into()))?;

        let snapshot = self.store.state();
        let pipeline = self.pipeline.clone();
        let notifications = Arc::clone(&self.notifications);
        self.notify("Rendering video...", NotificationKind::Info);

        let handle = runtime.spawn(async move {
            let _guard = guard;
            let (mut encoder, mut sink) = (encoder, sink);
            let result = pipeline.run(snapshot, encoder.as_mut(), sink.as_mut()).await;
            match &result {
                Ok(artifact) => {
                    info!(
                        "[EXPORT] {} ready, {} frames, {} bytes",
                        artifact.file_name,
                        artifact.frame_count,
                        artifact.len()
                    );
                    post(&notifications, "Export complete!", NotificationKind::Success);
                }
                Err(e) => {
                    error!("[EXPORT] Failed: {}", e);
                    post(&notifications, e.friendly_message(), NotificationKind::Error);
                }
            }
            result
        });

        Ok(ExportJob::new(handle, Arc::clone(&self.notifications)))
    }

    // ------------------------------------------------------------------
    // Store access
    // ------------------------------------------------------------------

    fn edit(
        &self,
        action: EditAction,
        op: impl FnOnce(&ProjectState) -> Option<ProjectState>,
    ) -> Result<bool> {
        self.store.with(|store| match op(&store.state()) {
            Some(next) => store.commit(action, next).map(|_| true),
            None => {
                debug!("[EDITOR] {} does not apply, ignored", action);
                Ok(false)
            }
        })
    }

    fn view(&self, op: impl FnOnce(&ProjectState) -> Option<ProjectState>) -> Result<bool> {
        self.store.with(|store| match op(&store.state()) {
            Some(next) => store.navigate(next).map(|_| true),
            None => Ok(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn editor() -> Editor {
        Editor::new(EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_first_edit_is_undoable() {
        let mut editor = editor();
        assert!(!editor.can_undo());
        assert!(editor.add_frame().unwrap());
        assert!(editor.can_undo());

        assert!(editor.undo().unwrap());
        assert_eq!(editor.state().frame_count(), 1);
        assert!(!editor.undo().unwrap());
        assert!(editor.redo().unwrap());
        assert_eq!(editor.state().frame_count(), 2);
    }

    #[test]
    fn test_ignored_operations_leave_history_alone() {
        let mut editor = editor();
        assert!(!editor.delete_frame(0).unwrap());
        assert!(!editor.reorder_frames(0, 3).unwrap());
        assert!(editor.store().lock().history().is_empty());
    }

    #[test]
    fn test_selection_bypasses_history() {
        let mut editor = editor();
        editor.add_frame().unwrap();
        let entries = editor.store().lock().history().len();

        assert!(editor.select_frame(0).unwrap());
        assert_eq!(editor.state().current_frame_index, 0);
        assert!(!editor.select_frame(5).unwrap());
        assert_eq!(editor.store().lock().history().len(), entries);
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let mut editor = editor();
        editor.add_frame().unwrap();
        assert!(editor.handle_key(KeyPress::primary('z')).unwrap());
        assert_eq!(editor.state().frame_count(), 1);
        assert!(editor.handle_key(KeyPress::primary('y')).unwrap());
        assert_eq!(editor.state().frame_count(), 2);
        assert!(!editor.handle_key(KeyPress::primary('z').with_shift()).unwrap());
        assert!(!editor.handle_key(KeyPress::new('z')).unwrap());
    }

    #[test]
    fn test_new_project_clears_history() {
        let mut editor = editor();
        editor.add_frame().unwrap();
        editor.new_project().unwrap();
        assert_eq!(editor.state().frame_count(), 1);
        assert!(!editor.can_undo());
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_stages_image_and_switches_tool() {
        let mut editor = editor();
        editor.import_image(ImportedImage::new("data:image/png;base64,AA==", ImageSource::Ai));

        assert_eq!(editor.active_tool(), ToolType::Move);
        assert!(editor.pending_image().is_some());
        let note = editor.notification().unwrap();
        assert_eq!(note.message, "Character generated! Position it with MOVE tool.");
        assert_eq!(note.kind, NotificationKind::Info);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(editor.notification().is_none());

        editor.clear_pending_image();
        assert!(editor.pending_image().is_none());
    }

    #[test]
    fn test_failed_local_import_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor();
        let before = editor.state();

        assert!(editor
            .import_local_image(&dir.path().join("missing.png"))
            .is_err());
        assert_eq!(editor.notification().unwrap().message, LOCAL_IMPORT_FAILED);
        assert_eq!(editor.active_tool(), ToolType::Pen);
        assert!(editor.pending_image().is_none());
        assert!(Arc::ptr_eq(&before, &editor.state()));
    }

    #[test]
    fn test_save_and_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor();
        editor.add_frame().unwrap();
        editor.apply_dynamic_effect(EffectKind::Glow, 0.5, true).unwrap();

        let path = editor.save_project(dir.path()).unwrap();
        let saved = editor.state();

        editor.new_project().unwrap();
        editor.open_project(&path).unwrap();
        assert_eq!(*editor.state(), *saved);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_opacity_of_onion_skin_is_clamped() {
        let mut editor = editor();
        editor.set_onion_skin(OnionSkinSettings {
            opacity: 2.0,
            ..Default::default()
        });
        assert!((editor.onion_skin().opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_export_requires_runtime() {
        let editor = editor();
        let result = editor.export_video(Box::new(crate::export::GifVideoEncoder::default()));
        assert!(matches!(result, Err(AnimateError::Internal(_))));
        assert!(!editor.is_exporting());
    }
}
