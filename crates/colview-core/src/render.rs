#![forbid(unsafe_code)]

//! Render loop: build, patch, retain, then schedule a scroll re-alignment.
//!
//! The virtual-DOM patcher is an external collaborator behind [`Patcher`].
//! The loop retains the last tree that was applied successfully and hands it
//! back as `previous` on the next pass; the first pass passes `None`, which
//! the patcher treats as "mount onto the live root". Patching can change
//! column heights, so every successful pass raises a flag asking the owner
//! to run one scroll synchronization on column 0 at the next tick.

use crate::error::Result;
use crate::state::State;
use crate::tree::Node;
use crate::view::view;

/// Applies a view tree to the live document.
pub trait Patcher {
    /// Reconcile the document with `next`. `previous` is the tree applied
    /// last time, or `None` for the initial mount.
    fn patch(&mut self, previous: Option<&Node>, next: &Node) -> Result<()>;
}

#[derive(Debug)]
pub struct RenderLoop<P> {
    patcher: P,
    previous: Option<Node>,
    scroll_pass_pending: bool,
    renders: u64,
}

impl<P: Patcher> RenderLoop<P> {
    #[must_use]
    pub const fn new(patcher: P) -> Self {
        Self {
            patcher,
            previous: None,
            scroll_pass_pending: false,
            renders: 0,
        }
    }

    /// Build and apply the tree for `state`.
    ///
    /// A failed patch keeps the previously retained tree so the next pass
    /// diffs against what the document actually shows.
    pub fn render(&mut self, state: &State) -> Result<()> {
        let next = view(state);
        match self.patcher.patch(self.previous.as_ref(), &next) {
            Ok(()) => {
                self.renders += 1;
                tracing::debug!(
                    target: "colview.render",
                    render = self.renders,
                    mode = %state.display_mode,
                    columns = state.columns_count,
                    width = state.columns_width,
                    "patched"
                );
                self.previous = Some(next);
                self.scroll_pass_pending = true;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(target: "colview.render", %err, "patch failed, keeping previous tree");
                Err(err)
            }
        }
    }

    /// Consume the deferred scroll-pass request raised by the last render.
    pub fn take_scroll_pass(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pass_pending)
    }

    #[must_use]
    pub const fn scroll_pass_pending(&self) -> bool {
        self.scroll_pass_pending
    }

    #[must_use]
    pub const fn last_tree(&self) -> Option<&Node> {
        self.previous.as_ref()
    }

    pub fn patcher_mut(&mut self) -> &mut P {
        &mut self.patcher
    }

    #[must_use]
    pub const fn patcher(&self) -> &P {
        &self.patcher
    }
}

/// Patcher that keeps every applied tree in memory.
///
/// Used by native tests and headless hosts. `fail_next` makes the next patch
/// fail once.
#[derive(Debug, Clone, Default)]
pub struct RecordingPatcher {
    pub applied: Vec<Node>,
    /// Whether each call received a previous tree.
    pub had_previous: Vec<bool>,
    pub fail_next: bool,
}

impl RecordingPatcher {
    #[must_use]
    pub fn latest(&self) -> Option<&Node> {
        self.applied.last()
    }
}

impl Patcher for RecordingPatcher {
    fn patch(&mut self, previous: Option<&Node>, next: &Node) -> Result<()> {
        if std::mem::take(&mut self.fail_next) {
            return Err(crate::error::ViewerError::patch("injected failure"));
        }
        self.had_previous.push(previous.is_some());
        self.applied.push(next.clone());
        Ok(())
    }
}
