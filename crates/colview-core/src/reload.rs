#![forbid(unsafe_code)]

//! Second-`load` detection for reused frame elements.
//!
//! When the patcher reuses an already-loaded frame element for a new
//! address, updating its `src` attribute does not reliably navigate it; the
//! browser instead fires `load` again on the same element. Every frame gets
//! a fresh identifier each time the view is built, so:
//!
//! 1. first `load` for an identifier: remember it, do nothing else;
//! 2. second `load` for the same identifier: reassign the frame's address
//!    to the current logical URL once and forget the identifier. The load
//!    that follows is a fresh identifier-less cycle from the tracker's view
//!    and settles on its own.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAction {
    /// Frame has no address; nothing to track.
    Ignored,
    /// First completion for this identifier.
    Recorded,
    /// Second completion: the host must force-assign the address.
    ForceReload,
}

/// Record a `load` completion for `frame_id` against `loaded`.
pub fn on_frame_load(loaded: &mut HashSet<String>, frame_id: &str, has_source: bool) -> LoadAction {
    if !has_source {
        return LoadAction::Ignored;
    }
    if loaded.insert(frame_id.to_owned()) {
        tracing::trace!(target: "colview.reload", frame_id, "first load recorded");
        return LoadAction::Recorded;
    }
    loaded.remove(frame_id);
    tracing::debug!(target: "colview.reload", frame_id, "second load, forcing address");
    LoadAction::ForceReload
}
