//! Host-page boundary shared by the tracking engine and its embedders.
//! This crate centralizes the stable element keys, geometry types, event
//! records, and the capability traits through which the engine reads and
//! writes the live document without owning it.

use anyhow::Result;

pub mod geometry;
pub use geometry::{Rect, Viewport};

pub mod events;
pub use events::{ClickEvent, MutationRecord};

pub mod selector;
pub use selector::CompoundSelector;

/// Deterministic in-memory host implementing every capability trait.
pub mod sim;
pub use sim::SimHost;

// ============================
// Stable element keys
// ============================

/// A 64-bit stable key for document elements used to correlate host events
/// with engine-side bookkeeping.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ElementKey(pub u64);

impl ElementKey {
    /// The document root element (always present).
    pub const ROOT: Self = Self(0);
}

/// Destination of a style-property write.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StyleScope {
    /// The document root element's inline style.
    Root,
    /// A specific element's inline style.
    Element(ElementKey),
}

/// Window-level event streams the engine can subscribe to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Listener {
    ViewportResize,
    Scroll,
    Click,
}

// ============================
// Document capability
// ============================

/// Read/write access to the live document and its style system.
///
/// All reads are snapshots at call time. Selector-based queries are the only
/// fallible operations: a selector the host cannot parse is an `Err`, which
/// callers are expected to treat as "no match" rather than propagate.
pub trait PageDom {
    /// All connected elements bearing `name`, in document order.
    fn elements_with_attribute(&self, name: &str) -> Vec<ElementKey>;
    /// Lowercase tag name, or `None` for an unknown key.
    fn tag_name(&self, el: ElementKey) -> Option<String>;
    /// Current value of an attribute, `None` when absent.
    fn attribute(&self, el: ElementKey, name: &str) -> Option<String>;
    /// Whether the attribute is present (value may be empty).
    fn has_attribute(&self, el: ElementKey, name: &str) -> bool {
        self.attribute(el, name).is_some()
    }
    /// The element's id attribute when non-empty.
    fn element_id(&self, el: ElementKey) -> Option<String> {
        self.attribute(el, "id").filter(|id| !id.is_empty())
    }
    /// Parent element link, `None` at the document root or for unknown keys.
    fn parent(&self, el: ElementKey) -> Option<ElementKey>;
    /// First connected element with the given id.
    fn element_by_id(&self, id: &str) -> Option<ElementKey>;
    /// Nearest self-or-ancestor matching `selector`.
    fn closest(&self, el: ElementKey, selector: &str) -> Result<Option<ElementKey>>;
    /// First connected element matching `selector`, in document order.
    fn query_selector(&self, selector: &str) -> Result<Option<ElementKey>>;
    /// Whether `el` or any descendant bears the attribute. Must answer for
    /// detached subtrees so removal batches can be classified.
    fn subtree_bears_attribute(&self, el: ElementKey, name: &str) -> bool;
    /// Resolved computed value of a style property; empty string when the
    /// host knows no value.
    fn computed_style(&self, el: ElementKey, property: &str) -> String;
    /// Border-box rectangle in viewport coordinates.
    fn bounding_rect(&self, el: ElementKey) -> Rect;
    /// Layout height including borders, as used for container overlap tests.
    fn offset_height(&self, el: ElementKey) -> f64;
    /// Current viewport metrics (inner vs client sizes).
    fn viewport(&self) -> Viewport;
    /// Vertical document scroll offset.
    fn scroll_y(&self) -> f64;

    fn set_attribute(&mut self, el: ElementKey, name: &str, value: &str);
    fn remove_attribute(&mut self, el: ElementKey, name: &str);
    fn set_style_property(&mut self, scope: StyleScope, name: &str, value: &str);
    fn remove_style_property(&mut self, scope: StyleScope, name: &str);

    fn add_listener(&mut self, listener: Listener);
    fn remove_listener(&mut self, listener: Listener);
}

// ============================
// Observation services
// ============================

/// Per-element size observation. The host delivers resize batches for
/// watched elements back to the engine.
pub trait ResizeWatch {
    fn watch(&mut self, el: ElementKey);
    fn unwatch(&mut self, el: ElementKey);
    /// Stop watching everything.
    fn disconnect(&mut self);
}

/// Document-wide mutation observation, filtered to the given attribute
/// names (structural child-list changes are always reported).
pub trait MutationWatch {
    fn observe(&mut self, attribute_filter: &[&str]);
    /// Stop observing and drop any undelivered records.
    fn disconnect(&mut self);
}

// ============================
// Frame scheduling
// ============================

/// Handle for a pending timeout; a cleared handle never fires.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TimerId(pub u64);

/// Handle for a pending animation-frame callback.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FrameId(pub u64);

/// Timers and animation frames with cancellation by handle.
pub trait FrameScheduler {
    fn set_timeout(&mut self, delay_ms: u64) -> TimerId;
    fn clear_timeout(&mut self, timer: TimerId);
    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, frame: FrameId);
}

/// Everything the tracking engine needs from one host environment.
pub trait Host: PageDom + ResizeWatch + MutationWatch + FrameScheduler {}

impl<T: PageDom + ResizeWatch + MutationWatch + FrameScheduler> Host for T {}
