//! CLI Command Implementations
//!
//! Each editing command opens the project in an editor session, applies
//! one operation and writes the file back.

use std::path::{Path, PathBuf};

use log::info;

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::error::{AnimateError, Result};
use crate::export::encoder::GifVideoEncoder;
use crate::state::persistence;
use crate::state::project::EffectKind;

fn open(path: &Path, config: EditorConfig) -> Result<Editor> {
    let mut editor = Editor::new(config)?;
    editor.open_project(path)?;
    Ok(editor)
}

/// Write back when the edit applied; report when it was ignored.
fn finish_edit(editor: &Editor, path: &Path, applied: bool, label: &str) -> Result<()> {
    if !applied {
        println!("{}: nothing to do", label);
        return Ok(());
    }
    persistence::save_project(&editor.state(), path)?;
    let state = editor.state();
    println!(
        "{}: {} frames, current {}",
        label,
        state.frame_count(),
        state.current_frame_index
    );
    Ok(())
}

/// Create a new project file.
pub fn new_project(dir: &Path, fps: Option<u32>, mut config: EditorConfig) -> Result<()> {
    if let Some(fps) = fps {
        config.fps = fps;
    }
    config.validate()?;
    info!("Creating new project in: {}", dir.display());

    let path = persistence::save_project_in(&config.initial_project(), dir)?;
    println!("Project created: {}", path.display());
    Ok(())
}

/// Print a summary of a project.
pub fn show_info(path: &Path, config: EditorConfig) -> Result<()> {
    let editor = open(path, config)?;
    let state = editor.state();

    println!("Project: {}", path.display());
    println!("Canvas: {}x{} @ {} fps", state.width, state.height, state.fps);
    println!(
        "Audio: {}",
        state.audio_track.as_deref().unwrap_or("(none)")
    );
    println!("{:-<60}", "");

    for (i, frame) in state.frames.iter().enumerate() {
        let marker = if i == state.current_frame_index {
            ">>> "
        } else {
            "    "
        };
        let effects: Vec<&str> = frame.effects.iter().map(|e| e.kind.as_str()).collect();
        println!(
            "{}{}: {} ({} layers, {} drawn) {}",
            marker,
            i,
            frame.id,
            frame.layers.len(),
            frame.layers.iter().filter(|l| l.has_pixels()).count(),
            if effects.is_empty() {
                String::new()
            } else {
                format!("[{}]", effects.join(", "))
            }
        );
    }

    println!("{:-<60}", "");
    Ok(())
}

pub fn add_frame(path: &Path, config: EditorConfig) -> Result<()> {
    let mut editor = open(path, config)?;
    let applied = editor.add_frame()?;
    finish_edit(&editor, path, applied, "Add frame")
}

pub fn delete_frame(path: &Path, index: usize, config: EditorConfig) -> Result<()> {
    let mut editor = open(path, config)?;
    let applied = editor.delete_frame(index)?;
    finish_edit(&editor, path, applied, "Delete frame")
}

pub fn duplicate_frame(path: &Path, index: usize, config: EditorConfig) -> Result<()> {
    let mut editor = open(path, config)?;
    let applied = editor.duplicate_frame(index)?;
    finish_edit(&editor, path, applied, "Duplicate frame")
}

pub fn reorder(path: &Path, from: usize, to: usize, config: EditorConfig) -> Result<()> {
    let mut editor = open(path, config)?;
    let applied = editor.reorder_frames(from, to)?;
    finish_edit(&editor, path, applied, "Reorder")
}

pub fn toggle_effect(
    path: &Path,
    kind: EffectKind,
    intensity: f32,
    all: bool,
    config: EditorConfig,
) -> Result<()> {
    let mut editor = open(path, config)?;
    let applied = editor.apply_dynamic_effect(kind, intensity, all)?;
    finish_edit(&editor, path, applied, &format!("Toggle {}", kind))
}

pub fn set_fps(path: &Path, fps: u32, config: EditorConfig) -> Result<()> {
    let mut editor = open(path, config)?;
    let applied = editor.set_fps(fps)?;
    finish_edit(&editor, path, applied, &format!("Set fps {}", fps))
}

/// Play for `ticks` frame advances, printing each frame shown.
pub async fn play(path: &Path, ticks: u64, config: EditorConfig) -> Result<()> {
    let mut editor = open(path, config)?;
    let mut updates = editor.store().lock().subscribe();

    editor.play()?;
    for _ in 0..ticks {
        updates
            .changed()
            .await
            .map_err(|_| AnimateError::Internal("store closed during playback".into()))?;
        let state = updates.borrow_and_update().clone();
        println!(
            "frame {}/{} ({})",
            state.current_frame_index + 1,
            state.frame_count(),
            state.current_frame().id
        );
    }
    editor.stop();
    Ok(())
}

/// Render to a GIF next to the project (or into `out`).
pub async fn export(path: &Path, out: Option<&Path>, config: EditorConfig) -> Result<()> {
    let editor = open(path, config)?;
    let state = editor.state();
    println!(
        "Rendering {} frames at {} fps...",
        state.frame_count(),
        state.fps
    );

    let encoder = GifVideoEncoder::new(editor.config().gif_speed);
    let artifact = editor.export_video(Box::new(encoder))?.wait().await?;

    let dir = match out {
        Some(dir) => dir.to_path_buf(),
        None => output_dir(path),
    };
    let saved = artifact.save_to(&dir)?;

    println!("Exported: {}", saved.display());
    println!("Size: {} bytes", artifact.len());
    println!("SHA-256: {}", artifact.sha256_hex());
    Ok(())
}

fn output_dir(project: &Path) -> PathBuf {
    match project.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_in(dir: &Path) -> PathBuf {
        new_project(dir, Some(6), EditorConfig::default()).unwrap();
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .find(|p| p.extension().is_some_and(|e| e == persistence::PROJECT_EXTENSION))
            .unwrap()
    }

    #[test]
    fn test_edit_commands_write_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_in(dir.path());

        add_frame(&path, EditorConfig::default()).unwrap();
        duplicate_frame(&path, 0, EditorConfig::default()).unwrap();
        toggle_effect(&path, EffectKind::Glow, 0.8, true, EditorConfig::default()).unwrap();

        let state = persistence::load_project(&path).unwrap();
        assert_eq!(state.fps, 6);
        assert_eq!(state.frame_count(), 3);
        assert!(state.frames.iter().all(|f| f.has_effect(EffectKind::Glow)));

        reorder(&path, 0, 2, EditorConfig::default()).unwrap();
        delete_frame(&path, 2, EditorConfig::default()).unwrap();
        set_fps(&path, 24, EditorConfig::default()).unwrap();

        let state = persistence::load_project(&path).unwrap();
        assert_eq!(state.frame_count(), 2);
        assert_eq!(state.fps, 24);
    }

    #[test]
    fn test_ignored_edit_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_in(dir.path());
        let before = std::fs::read_to_string(&path).unwrap();

        delete_frame(&path, 0, EditorConfig::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_output_dir_defaults() {
        assert_eq!(output_dir(Path::new("a.animate")), PathBuf::from("."));
        assert_eq!(output_dir(Path::new("x/a.animate")), PathBuf::from("x"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_command_writes_gif() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_in(dir.path());
        let out = tempfile::tempdir().unwrap();

        export(&path, Some(out.path()), EditorConfig::default()).await.unwrap();
        let written: Vec<_> = std::fs::read_dir(out.path()).unwrap().collect();
        assert_eq!(written.len(), 1);
    }
}
