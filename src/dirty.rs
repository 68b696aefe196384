//! Divergence between local lines and the last synced computation.

use crate::coords;
use crate::model::{ImageDimensions, LineSet, ManualParameters};
use crate::state::AnalysisState;

/// Whether the state's current lines differ from the ones its last server
/// result was computed against.
///
/// Only interior pixel lines are compared, as sorted sequences. A state with
/// no result, or without captured dimensions, is always dirty.
pub fn is_dirty(state: &AnalysisState) -> bool {
    let (Some(result), Some(dims)) = (&state.last_server_result, state.dimensions) else {
        return true;
    };
    lines_differ(&state.current_lines, &result.parameters, dims)
}

/// Compare a line set against synced parameters in interior pixel space.
pub fn lines_differ(current: &LineSet, synced: &ManualParameters, dims: ImageDimensions) -> bool {
    let Ok(local) = coords::interior_pixels(current, dims) else {
        return true;
    };
    local.vertical != coords::interior(&synced.vertical_lines, dims.width)
        || local.horizontal != coords::interior(&synced.horizontal_lines, dims.height)
}
