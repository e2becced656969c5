use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::hierarchy_server::RelatedDirection;

/// Which tree the user is looking at.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyView {
    #[default]
    Supertype,
    Subtype,
    Class,
}

impl HierarchyView {
    pub fn name(&self) -> &'static str {
        match self {
            HierarchyView::Supertype => "supertype",
            HierarchyView::Subtype => "subtype",
            HierarchyView::Class => "class",
        }
    }

    /// The query direction child resolution uses in this view.  The class
    /// view's materialized chain runs topmost-ancestor down to the anchor, so
    /// expansion below the anchor keeps going downward into subtypes.
    pub fn direction(&self) -> RelatedDirection {
        match self {
            HierarchyView::Supertype => RelatedDirection::Supertypes,
            HierarchyView::Subtype => RelatedDirection::Subtypes,
            HierarchyView::Class => RelatedDirection::Subtypes,
        }
    }
}

/// Knobs for how the adapter presents the tree.  Owned by the embedding and
/// handed in at construction; the core never reads ambient global state.
#[derive(Clone, Debug, Default)]
pub struct TreeDisplayConfig {
    /// Resolve children eagerly while computing display state, trading fetch
    /// latency for fewer expand clicks.
    pub prefetch: bool,
    /// Bound on the number of synthesized hops during class-chain
    /// materialization.  `None` preserves the unguarded climb, which will not
    /// terminate if the backend ever reports a supertype cycle.
    pub class_chain_limit: Option<usize>,
}

/// The slice of user preference that survives across sessions.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionPrefs {
    #[serde(default)]
    pub view: HierarchyView,
    #[serde(default)]
    pub prefetch: bool,
}

/// Persistence collaborator for `SessionPrefs`.  The embedding decides where
/// the preference actually lives; the core only reads and writes through this
/// seam.
pub trait PreferenceStore {
    fn load(&self) -> SessionPrefs;
    fn save(&mut self, prefs: SessionPrefs);
}

/// Store that forgets everything when dropped; the default for tests and for
/// embeddings that do their own persistence.
#[derive(Default)]
pub struct MemoryPreferences {
    prefs: SessionPrefs,
}

impl PreferenceStore for MemoryPreferences {
    fn load(&self) -> SessionPrefs {
        self.prefs
    }

    fn save(&mut self, prefs: SessionPrefs) {
        self.prefs = prefs;
    }
}

/// Store backed by a small JSON file.  Load degrades to defaults on any
/// problem because a broken preference file should never block a session.
pub struct JsonFilePreferences {
    path: PathBuf,
}

impl JsonFilePreferences {
    pub fn new(path: PathBuf) -> JsonFilePreferences {
        JsonFilePreferences { path }
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn load(&self) -> SessionPrefs {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return SessionPrefs::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "unparseable preference file");
                SessionPrefs::default()
            }
        }
    }

    fn save(&mut self, prefs: SessionPrefs) {
        match serde_json::to_string_pretty(&prefs) {
            Ok(raw) => {
                if let Err(err) = std::fs::write(&self.path, raw) {
                    warn!(path = %self.path.display(), %err, "failed to persist preferences");
                }
            }
            Err(err) => {
                warn!(%err, "failed to serialize preferences");
            }
        }
    }
}
