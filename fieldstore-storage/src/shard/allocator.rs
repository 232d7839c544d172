//! Leaf directory allocation across per-kind shard trees.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fieldstore_core::keys::MAX_FILES_PER_DIR;
use fieldstore_core::{ConfigError, FieldstoreResult, MediaKind, ShardError};

use super::naming::{
    directory_name, entry_count, io_error, numeric_children, parse_directory_number,
};
use crate::cache::PreferenceLookup;

/// Current position in one media kind's shard tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardState {
    pub root: PathBuf,
    /// Existing directory exactly `depth` levels below `root`.
    pub current_leaf: PathBuf,
    /// Maximum numerically named entries per directory.
    pub fanout: u32,
    pub depth: u32,
}

/// Hands out writable leaf directories, one shard tree per [`MediaKind`].
///
/// Tree geometry is read from preferences the first time a kind is used.
/// The filesystem is re-listed on every call since other processes may
/// write into the same tree.
pub struct ShardedDirectoryAllocator {
    preferences: Arc<dyn PreferenceLookup>,
    states: Mutex<HashMap<MediaKind, ShardState>>,
}

impl ShardedDirectoryAllocator {
    pub fn new(preferences: Arc<dyn PreferenceLookup>) -> Self {
        Self {
            preferences,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// A leaf directory for `kind` with room for at least one more file.
    pub fn directory_for(&self, kind: MediaKind) -> FieldstoreResult<PathBuf> {
        // Poison leaves at worst a stale leaf pointer; capacity is re-checked below.
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let state = match states.entry(kind) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.initialize(kind)?),
        };

        loop {
            if entry_count(&state.current_leaf)? < state.fanout as usize {
                return Ok(state.current_leaf.clone());
            }

            let next = roll_over(state)?;
            tracing::info!(
                kind = %kind,
                from = %state.current_leaf.display(),
                to = %next.display(),
                "Shard leaf full, rolled over"
            );
            state.current_leaf = next;
        }
    }

    /// The leaf pointer for `kind`, if it has been initialized.
    pub fn current_leaf(&self, kind: MediaKind) -> Option<PathBuf> {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.get(&kind).map(|s| s.current_leaf.clone())
    }

    /// Snapshot of the state for `kind`, if it has been initialized.
    pub fn state(&self, kind: MediaKind) -> Option<ShardState> {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.get(&kind).cloned()
    }

    fn initialize(&self, kind: MediaKind) -> FieldstoreResult<ShardState> {
        let root = PathBuf::from(self.preferences.lookup(kind.root_key())?);
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(ConfigError::RootNotDirectory { path: root }.into()),
            Err(_) => return Err(ConfigError::RootNotFound { path: root }.into()),
        }

        let fanout = self.preferences.lookup_u32(MAX_FILES_PER_DIR)?;
        if fanout == 0 {
            return Err(ConfigError::InvalidValue {
                field: MAX_FILES_PER_DIR.to_string(),
                value: "0".to_string(),
                reason: "fanout must be at least 1".to_string(),
            }
            .into());
        }
        let depth = self.preferences.lookup_u32(kind.depth_key())?;

        let current_leaf = descend_to_leaf(&root, fanout, depth)?;
        tracing::info!(
            kind = %kind,
            root = %root.display(),
            leaf = %current_leaf.display(),
            fanout,
            depth,
            "Shard tree initialized"
        );

        Ok(ShardState {
            root,
            current_leaf,
            fanout,
            depth,
        })
    }
}

impl std::fmt::Debug for ShardedDirectoryAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("ShardedDirectoryAllocator")
            .field("states", &*states)
            .finish()
    }
}

/// Walk `depth` levels down from `root`, following the largest child and
/// creating directories where a level is empty.
fn descend_to_leaf(root: &Path, fanout: u32, depth: u32) -> FieldstoreResult<PathBuf> {
    let mut current = root.to_path_buf();
    let mut level = 0;

    while level < depth {
        let children = numeric_children(&current)?;

        if children.is_empty() {
            let next = current.join(directory_name(0, fanout));
            ensure_dir(&next)?;
            current = next;
            level += 1;
        } else if children.len() > fanout as usize {
            // Overfull level: start a sibling of `current` and fill it instead.
            if level == 0 {
                return Err(ShardError::StructureExhausted {
                    root: root.to_path_buf(),
                }
                .into());
            }
            current = mint_sibling(&current, fanout)?;
        } else {
            // Sorted ascending by number, so the last child is the largest.
            let (_, largest) = &children[children.len() - 1];
            current = largest.clone();
            level += 1;
        }
    }

    Ok(current)
}

/// Create the directory numbered one past `dir` next to it. An existing
/// directory of that name means the tree was not laid out by us.
fn mint_sibling(dir: &Path, fanout: u32) -> Result<PathBuf, ShardError> {
    let number = directory_number(dir)?;
    let parent = parent_of(dir)?;
    let sibling = parent.join(directory_name(number + 1, fanout));
    if sibling.exists() {
        return Err(ShardError::IntegrityViolation {
            path: sibling,
            reason: "new sibling directory already exists".to_string(),
        });
    }
    fs::create_dir(&sibling).map_err(|e| io_error(&sibling, e))?;
    Ok(sibling)
}

/// Find the next leaf after `state.current_leaf`.
///
/// Climbs until some ancestor has room for another child, creates that
/// child, then creates a `0` chain back down to leaf depth.
fn roll_over(state: &ShardState) -> FieldstoreResult<PathBuf> {
    let exhausted = || ShardError::StructureExhausted {
        root: state.root.clone(),
    };

    if state.depth == 0 {
        return Err(exhausted().into());
    }

    let mut current = state.current_leaf.clone();
    let mut climbed = 0u32;

    loop {
        let number = directory_number(&current)?;
        let parent = parent_of(&current)?;

        if numeric_children(&parent)?.len() < state.fanout as usize {
            let mut next = parent.join(directory_name(number + 1, state.fanout));
            ensure_dir(&next)?;
            for _ in 0..climbed {
                next = next.join(directory_name(0, state.fanout));
                ensure_dir(&next)?;
            }
            return Ok(next);
        }

        climbed += 1;
        if parent == state.root || climbed >= state.depth {
            return Err(exhausted().into());
        }
        current = parent;
    }
}

fn directory_number(dir: &Path) -> Result<u64, ShardError> {
    dir.file_name()
        .and_then(|n| n.to_str())
        .and_then(parse_directory_number)
        .ok_or_else(|| ShardError::IntegrityViolation {
            path: dir.to_path_buf(),
            reason: "directory name is not a number".to_string(),
        })
}

fn parent_of(dir: &Path) -> Result<PathBuf, ShardError> {
    dir.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ShardError::IntegrityViolation {
            path: dir.to_path_buf(),
            reason: "directory has no parent".to_string(),
        })
}

/// Create `dir`, accepting a directory another process created first.
fn ensure_dir(dir: &Path) -> Result<(), ShardError> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(io_error(dir, e)),
    }
}
