// crates/core/src/visibility.rs
//! Visibility for deferred refreshes.
//!
//! The refresh controller never walks a DOM. It asks an injected
//! [`VisibilityProvider`] at every refresh attempt, and the host reports
//! viewport entry separately (the intersection-observer analog). The
//! geometry/ancestor rules themselves are a pure function over a node
//! snapshot, so every rule is testable in isolation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Answers "is this panel's node currently in view?" on demand.
pub trait VisibilityProvider: Send + Sync {
    fn is_in_view(&self) -> bool;
}

/// Provider for headless hosts and tests: the panel is always visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl VisibilityProvider for AlwaysVisible {
    fn is_in_view(&self) -> bool {
        true
    }
}

/// A flag the host flips from its viewport reports. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct SharedVisibility(Arc<AtomicBool>);

impl SharedVisibility {
    /// Starts hidden; the host reports the first sighting.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible() -> Self {
        let v = Self::default();
        v.set(true);
        v
    }

    pub fn set(&self, in_view: bool) {
        self.0.store(in_view, Ordering::Relaxed);
    }
}

impl VisibilityProvider for SharedVisibility {
    fn is_in_view(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounding rect of the panel's node, in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeRect {
    pub top: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

/// Style bits of one ancestor, up to but excluding the document root.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AncestorStyle {
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub hidden_attribute: bool,
    /// The ancestor is a collapsible region with a "closed" state marker.
    /// It only hides its subtree once its computed display is also none.
    pub collapsible_closed: bool,
}

impl AncestorStyle {
    fn hides_subtree(&self) -> bool {
        self.display_none
            || self.visibility_hidden
            || self.hidden_attribute
            || (self.collapsible_closed && self.display_none)
    }
}

/// The panel node's rect plus its ancestor chain, leaf-most first.
#[derive(Debug, Clone, Default)]
pub struct NodeSnapshot {
    pub rect: NodeRect,
    pub ancestors: Vec<AncestorStyle>,
}

/// The synchronous visibility check, re-evaluated at every refresh attempt.
///
/// A node counts as in view when it has a non-empty rect, no ancestor hides
/// it, and its vertical bounds intersect the viewport.
pub fn is_component_in_view(node: &NodeSnapshot, viewport_height: f64) -> bool {
    if node.rect.width == 0.0 || node.rect.height == 0.0 {
        return false;
    }
    if node.ancestors.iter().any(AncestorStyle::hides_subtree) {
        return false;
    }
    node.rect.top < viewport_height && node.rect.bottom > 0.0
}
