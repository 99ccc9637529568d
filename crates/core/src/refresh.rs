// crates/core/src/refresh.rs
//! Per-panel refresh state machine: dedup, force bypass, and deferral.
//!
//! The controller decides; it never fetches. Each entry point returns a
//! [`RefreshDecision`] and the owning fetcher acts on it, which keeps the
//! state transitions synchronous and the whole machine testable without a
//! transport.
//!
//! Deferral uses a single parked-options slot shared by the two unblocking
//! events (expand and viewport entry). Whichever fires first takes the slot;
//! the other finds it empty. That collapses the historical pair of
//! nearly-duplicate deferred paths into one, so rapid expand/collapse
//! toggling cannot double-fetch.

use std::sync::Arc;

use houseview_types::RefreshOptions;

use crate::visibility::VisibilityProvider;

/// Where the panel is in its refresh lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Collapsed,
    ExpandedIdle,
    ExpandedLoading,
    ExpandedNeedsRefresh,
}

/// What the owning fetcher should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshDecision {
    /// Run the fetch with these options now.
    Execute(RefreshOptions),
    /// Options parked; a later expand or viewport entry will release them.
    Deferred,
    /// Identical to the last executed refresh and not forced.
    Deduplicated,
    /// Nothing to do (no parked options, or the event changed no state).
    Idle,
}

/// The state machine for one panel instance.
pub struct RefreshController {
    phase: PanelPhase,
    visibility: Arc<dyn VisibilityProvider>,
    /// Cache key of the last refresh that actually executed.
    last_executed_key: Option<String>,
    /// At most one set of deferred options; consumed exactly once.
    parked: Option<RefreshOptions>,
}

impl RefreshController {
    pub fn new(visibility: Arc<dyn VisibilityProvider>) -> Self {
        Self {
            phase: PanelPhase::ExpandedIdle,
            visibility,
            last_executed_key: None,
            parked: None,
        }
    }

    /// Start life collapsed (panel restored from a collapsed layout).
    pub fn collapsed(visibility: Arc<dyn VisibilityProvider>) -> Self {
        let mut c = Self::new(visibility);
        c.phase = PanelPhase::Collapsed;
        c
    }

    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    pub fn is_collapsed(&self) -> bool {
        self.phase == PanelPhase::Collapsed
    }

    /// Ask for a refresh with `options`.
    ///
    /// Dedup compares cache keys (serialized options minus the force flag)
    /// against the last *executed* refresh; `force_refresh` bypasses the
    /// comparison. A panel that is collapsed or out of view parks the
    /// options instead of executing.
    pub fn request_refresh(&mut self, options: RefreshOptions) -> RefreshDecision {
        let key = options.cache_key();
        if !options.force_refresh && self.last_executed_key.as_deref() == Some(key.as_str()) {
            tracing::debug!(key, "refresh deduplicated");
            return RefreshDecision::Deduplicated;
        }

        if self.phase != PanelPhase::Collapsed && self.visibility.is_in_view() {
            self.begin_execution(key);
            RefreshDecision::Execute(options)
        } else {
            self.parked = Some(options);
            if self.phase != PanelPhase::Collapsed {
                self.phase = PanelPhase::ExpandedNeedsRefresh;
            }
            RefreshDecision::Deferred
        }
    }

    /// Collapse or expand. Expanding releases parked options when the node
    /// is visible; otherwise the panel waits in `ExpandedNeedsRefresh`.
    pub fn set_collapsed(&mut self, collapsed: bool) -> RefreshDecision {
        if collapsed {
            self.phase = PanelPhase::Collapsed;
            return RefreshDecision::Idle;
        }
        match self.parked.take() {
            Some(options) if self.visibility.is_in_view() => {
                self.release(options)
            }
            Some(options) => {
                self.parked = Some(options);
                self.phase = PanelPhase::ExpandedNeedsRefresh;
                RefreshDecision::Deferred
            }
            None => {
                self.phase = PanelPhase::ExpandedIdle;
                RefreshDecision::Idle
            }
        }
    }

    /// The node entered the viewport. Releases parked options if any.
    pub fn notify_in_view(&mut self) -> RefreshDecision {
        if self.phase != PanelPhase::ExpandedNeedsRefresh {
            return RefreshDecision::Idle;
        }
        match self.parked.take() {
            Some(options) => self.release(options),
            None => {
                self.phase = PanelPhase::ExpandedIdle;
                RefreshDecision::Idle
            }
        }
    }

    /// The in-flight fetch settled (success, error, or silent cancellation).
    pub fn settle(&mut self) {
        if self.phase == PanelPhase::ExpandedLoading {
            self.phase = PanelPhase::ExpandedIdle;
        }
    }

    /// Dedup-and-execute for options leaving the parked slot. The executed
    /// key can have caught up in the meantime (a forced refresh with the
    /// same parameters ran while these waited), so the check runs again.
    fn release(&mut self, options: RefreshOptions) -> RefreshDecision {
        let key = options.cache_key();
        if !options.force_refresh && self.last_executed_key.as_deref() == Some(key.as_str()) {
            self.phase = PanelPhase::ExpandedIdle;
            return RefreshDecision::Deduplicated;
        }
        self.begin_execution(key);
        RefreshDecision::Execute(options)
    }

    fn begin_execution(&mut self, key: String) {
        self.last_executed_key = Some(key);
        // An executing refresh supersedes anything still waiting.
        self.parked = None;
        self.phase = PanelPhase::ExpandedLoading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::{AlwaysVisible, SharedVisibility};

    fn controller() -> RefreshController {
        RefreshController::new(Arc::new(AlwaysVisible))
    }

    fn opts(filter: &str) -> RefreshOptions {
        RefreshOptions::default().with_filter(filter)
    }

    #[test]
    fn test_first_refresh_executes() {
        let mut c = controller();
        assert_eq!(
            c.request_refresh(opts("a")),
            RefreshDecision::Execute(opts("a"))
        );
        assert_eq!(c.phase(), PanelPhase::ExpandedLoading);
        c.settle();
        assert_eq!(c.phase(), PanelPhase::ExpandedIdle);
    }

    #[test]
    fn test_identical_refresh_deduplicates() {
        let mut c = controller();
        c.request_refresh(opts("a"));
        c.settle();
        assert_eq!(c.request_refresh(opts("a")), RefreshDecision::Deduplicated);
    }

    #[test]
    fn test_changed_options_execute_again() {
        let mut c = controller();
        c.request_refresh(opts("a"));
        c.settle();
        assert_eq!(
            c.request_refresh(opts("b")),
            RefreshDecision::Execute(opts("b"))
        );
    }

    #[test]
    fn test_force_bypasses_dedup() {
        let mut c = controller();
        c.request_refresh(opts("a"));
        c.settle();
        let forced = opts("a").forced();
        assert_eq!(
            c.request_refresh(forced.clone()),
            RefreshDecision::Execute(forced)
        );
    }

    #[test]
    fn test_refresh_while_collapsed_parks() {
        let mut c = RefreshController::collapsed(Arc::new(AlwaysVisible));
        assert_eq!(c.request_refresh(opts("a")), RefreshDecision::Deferred);
        assert_eq!(c.phase(), PanelPhase::Collapsed);

        // Expanding releases the parked options exactly once.
        assert_eq!(
            c.set_collapsed(false),
            RefreshDecision::Execute(opts("a"))
        );
        c.settle();
        assert_eq!(c.set_collapsed(false), RefreshDecision::Idle);
    }

    #[test]
    fn test_refresh_while_out_of_view_defers() {
        let vis = SharedVisibility::new();
        let mut c = RefreshController::new(Arc::new(vis.clone()));
        assert_eq!(c.request_refresh(opts("a")), RefreshDecision::Deferred);
        assert_eq!(c.phase(), PanelPhase::ExpandedNeedsRefresh);

        vis.set(true);
        assert_eq!(c.notify_in_view(), RefreshDecision::Execute(opts("a")));
    }

    #[test]
    fn test_parked_slot_fires_once_across_expand_and_viewport() {
        let vis = SharedVisibility::new();
        let mut c = RefreshController::collapsed(Arc::new(vis.clone()));
        c.request_refresh(opts("a"));

        // Expand while still off-screen: stays parked.
        assert_eq!(c.set_collapsed(false), RefreshDecision::Deferred);

        // Viewport entry wins the race and consumes the slot.
        vis.set(true);
        assert_eq!(c.notify_in_view(), RefreshDecision::Execute(opts("a")));

        // The loser finds the slot empty.
        assert_eq!(c.notify_in_view(), RefreshDecision::Idle);
        c.settle();
        assert_eq!(c.set_collapsed(false), RefreshDecision::Idle);
    }

    #[test]
    fn test_collapse_from_loading_then_expand() {
        let mut c = controller();
        c.request_refresh(opts("a"));
        c.set_collapsed(true);
        assert_eq!(c.phase(), PanelPhase::Collapsed);
        // Nothing parked: the refresh already executed.
        assert_eq!(c.set_collapsed(false), RefreshDecision::Idle);
    }

    #[test]
    fn test_executing_refresh_supersedes_parked_options() {
        let vis = SharedVisibility::new();
        let mut c = RefreshController::new(Arc::new(vis.clone()));
        c.request_refresh(opts("a"));

        // A forced refresh with the same parameters runs while "a" waits.
        vis.set(true);
        c.request_refresh(opts("a").forced());
        c.settle();

        // The forced execution superseded the parked copy.
        assert_eq!(c.notify_in_view(), RefreshDecision::Idle);
        assert_eq!(c.set_collapsed(false), RefreshDecision::Idle);
    }

    #[test]
    fn test_notify_in_view_outside_needs_refresh_is_idle() {
        let mut c = controller();
        assert_eq!(c.notify_in_view(), RefreshDecision::Idle);
        c.request_refresh(opts("a"));
        assert_eq!(c.notify_in_view(), RefreshDecision::Idle);
    }
}
