//! Onion skin view settings.
//!
//! The drawing surface renders the overlay; the editor only decides which
//! neighbouring layers it gets.

use serde::{Deserialize, Serialize};

use crate::state::project::{Layer, ProjectState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnionSkinSettings {
    pub enabled: bool,
    pub opacity: f32,
    pub show_previous: bool,
    pub show_next: bool,
}

impl Default for OnionSkinSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            opacity: 0.25,
            show_previous: true,
            show_next: true,
        }
    }
}

/// First layer of the frames around the current one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnionSkinNeighbours {
    pub previous: Option<Layer>,
    pub next: Option<Layer>,
}

pub fn neighbours(state: &ProjectState, settings: &OnionSkinSettings) -> OnionSkinNeighbours {
    if !settings.enabled {
        return OnionSkinNeighbours::default();
    }
    let index = state.current_frame_index;
    let first_layer = |i: usize| state.frame(i).and_then(|f| f.layers.first()).cloned();

    OnionSkinNeighbours {
        previous: if settings.show_previous && index > 0 {
            first_layer(index - 1)
        } else {
            None
        },
        next: if settings.show_next {
            first_layer(index + 1)
        } else {
            None
        },
    }
}
