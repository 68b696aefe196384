//! Per-image analysis state and its store.

use std::collections::HashMap;

use crate::dirty;
use crate::model::{ImageDimensions, ImageId, LineSet, ManualResult};

/// Analysis data associated with a specific image.
#[derive(Clone, Debug)]
pub struct AnalysisState {
    /// Original image as a data URL, cached verbatim
    pub original_image: Option<String>,
    /// Blurred image as a data URL, cached verbatim
    pub blurred_image: Option<String>,
    /// Pixel extents captured from the original image
    pub dimensions: Option<ImageDimensions>,
    /// Current partition lines
    pub current_lines: LineSet,
    /// Last mean computation persisted by the analysis service
    pub last_server_result: Option<ManualResult>,
    /// Current lines differ from the ones `last_server_result` was computed against
    pub dirty: bool,
    /// A remote call for this image is in flight (advisory only)
    pub busy: bool,
}

impl Default for AnalysisState {
    fn default() -> Self {
        Self {
            original_image: None,
            blurred_image: None,
            dimensions: None,
            current_lines: LineSet::default(),
            last_server_result: None,
            // Nothing has been synced yet.
            dirty: true,
            busy: false,
        }
    }
}

impl AnalysisState {
    /// Recompute the dirty flag from the current lines and last result.
    pub fn refresh_dirty(&mut self) -> bool {
        self.dirty = dirty::is_dirty(self);
        self.dirty
    }
}

/// Storage for per-image analysis state, keyed by image id.
///
/// Entries are created on first access and live until [`clear`](Self::clear)
/// is called; there is no eviction.
#[derive(Clone, Debug, Default)]
pub struct AnalysisStateStore {
    /// Map from image id to its state
    states: HashMap<ImageId, AnalysisState>,
}

impl AnalysisStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for an image, creating default if not exists
    pub fn get_or_create(&mut self, image_id: ImageId) -> &mut AnalysisState {
        self.states.entry(image_id).or_insert_with(|| {
            log::debug!("Creating analysis state for image {}", image_id);
            AnalysisState::default()
        })
    }

    /// Get state for an image without creating it
    pub fn get(&self, image_id: ImageId) -> Option<&AnalysisState> {
        self.states.get(&image_id)
    }

    /// Get mutable state for an image, if it exists
    pub fn get_mut(&mut self, image_id: ImageId) -> Option<&mut AnalysisState> {
        self.states.get_mut(&image_id)
    }

    /// Replace the lines of an image and recompute its dirty flag.
    ///
    /// Returns the new dirty flag.
    pub fn set_lines(&mut self, image_id: ImageId, lines: LineSet) -> bool {
        let state = self.get_or_create(image_id);
        state.current_lines = lines;
        let dirty = state.refresh_dirty();
        log::debug!(
            "Lines updated for image {} ({} vertical, {} horizontal), dirty: {}",
            image_id,
            state.current_lines.vertical.len(),
            state.current_lines.horizontal.len(),
            dirty
        );
        dirty
    }

    /// Drop all state for an image.
    pub fn clear(&mut self, image_id: ImageId) -> Option<AnalysisState> {
        let removed = self.states.remove(&image_id);
        if removed.is_some() {
            log::info!("Cleared analysis state for image {}", image_id);
        }
        removed
    }

    /// Check if state exists for an image
    pub fn contains(&self, image_id: ImageId) -> bool {
        self.states.contains_key(&image_id)
    }

    /// Number of images with state.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if no image has state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Ids of all images with state, ascending.
    pub fn image_ids(&self) -> Vec<ImageId> {
        let mut ids: Vec<ImageId> = self.states.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_lazy_and_stable() {
        let mut store = AnalysisStateStore::new();
        assert!(store.get(7).is_none());

        store.get_or_create(7).busy = true;
        assert!(store.contains(7));
        assert!(store.get_or_create(7).busy);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_fresh_state_is_dirty() {
        let mut store = AnalysisStateStore::new();
        let state = store.get_or_create(1);
        assert!(state.dirty);
        assert!(state.current_lines.is_empty());
        assert!(state.original_image.is_none());
    }

    #[test]
    fn test_set_lines_replaces_wholesale() {
        let mut store = AnalysisStateStore::new();
        store.set_lines(1, LineSet::from_fractions(&[0.1, 0.2], &[0.3]));
        let dirty = store.set_lines(1, LineSet::from_fractions(&[0.5], &[]));
        assert!(dirty);
        let lines = &store.get(1).unwrap().current_lines;
        assert_eq!(lines.vertical.len(), 1);
        assert!(lines.horizontal.is_empty());
    }

    #[test]
    fn test_clear_only_touches_one_image() {
        let mut store = AnalysisStateStore::new();
        store.get_or_create(1);
        store.get_or_create(2);
        assert!(store.clear(1).is_some());
        assert!(store.clear(1).is_none());
        assert_eq!(store.image_ids(), vec![2]);
    }
}
