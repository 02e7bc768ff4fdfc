//! Computed-style tracking engine.
//!
//! Mirrors selected computed CSS values of marked elements into custom
//! properties, keeps a scroll-padding offset in sync with the heights of
//! contributing elements, and optionally flags sticky elements while they
//! are pinned. The engine owns no document: it reads and writes through
//! the capability traits in the `page` crate and is driven entirely by
//! host-delivered events (resize, mutation, scroll, click, timer, frame).
//!
//! Every write is deduplicated against the last written value, so a
//! recompute pass over unchanged styles performs no writes and invokes no
//! callbacks.

use std::collections::HashMap;

use log::{debug, info};
use page::{
    ClickEvent, ElementKey, FrameId, Host, Listener, MutationWatch, ResizeWatch, TimerId,
};

mod config;
mod elements;
mod mirror;
mod padding;
mod scrollbars;
mod sticky;

/// Attribute opting an element into tracking; its value is the
/// comma-separated list of computed-style properties to mirror.
pub const MARKER_ATTR: &str = "data-keeptrack";
/// Write-target resolution value: ancestor depth or selector.
pub const TARGET_PARENT_ATTR: &str = "data-keeptrack-target-parent";
/// Older spelling of [`TARGET_PARENT_ATTR`], still honored.
pub const ADD_PARENT_ATTR: &str = "data-keeptrack-addparent";
/// Marks an element's height as a scroll-padding contributor.
pub const SCROLL_PADDING_ATTR: &str = "data-keeptrack-scroll-padding";
/// Written by the engine while a sticky element is pinned.
pub const STUCK_ATTR: &str = "data-keeptrack-stuck";

/// Attribute names the mutation observer is filtered to. The stuck marker
/// is deliberately absent so the engine's own writes do not feed back.
pub const WATCHED_ATTRIBUTES: [&str; 5] = [
    MARKER_ATTR,
    TARGET_PARENT_ATTR,
    ADD_PARENT_ATTR,
    SCROLL_PADDING_ATTR,
    "id",
];

/// Hook invoked synchronously after each property write with
/// (element, property, new value).
pub type ChangeHook = Box<dyn FnMut(ElementKey, &str, &str)>;

/// Engine options. Construct by struct update over `Settings::default()`.
pub struct Settings {
    pub scrollbar_width: bool,
    pub scrollbar_height: bool,
    /// Quiet period for the viewport-resize and structural-mutation paths.
    pub debounce_ms: u64,
    /// Re-mirror every tracked element each frame, catching computed-style
    /// changes invisible to resize and mutation observation.
    pub poll: bool,
    pub detect_sticky: bool,
    pub on_change: Option<ChangeHook>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scrollbar_width: true,
            scrollbar_height: false,
            debounce_ms: 250,
            poll: false,
            detect_sticky: false,
            on_change: None,
        }
    }
}

/// Quiet-period debounce aligned to the next animation frame: a kick arms
/// the timer, the timer firing requests the frame, the frame runs the work.
#[derive(Default)]
struct Debounce {
    timer: Option<TimerId>,
    frame: Option<FrameId>,
}

/// The tracking engine bound to one host environment.
pub struct TrackEngine<H: Host> {
    host: H,
    settings: Settings,
    /// Ordered, duplicate-free set of currently tracked elements.
    tracked: Vec<ElementKey>,
    /// Memoized per-element configs; invalidated wholesale.
    configs: HashMap<ElementKey, config::ElementConfig>,
    /// Last written value per element and property.
    values: HashMap<ElementKey, HashMap<String, String>>,
    /// Config in effect as of each element's last mirror write.
    applied: HashMap<ElementKey, mirror::AppliedState>,
    last_scrollbar_width: Option<String>,
    last_scrollbar_height: Option<String>,
    last_scroll_padding: Option<String>,
    resize_debounce: Debounce,
    mutation_debounce: Debounce,
    /// In-flight frame for scroll-driven sticky checks; further scroll
    /// events are dropped while set.
    scroll_frame: Option<FrameId>,
    poll_frame: Option<FrameId>,
}

impl<H: Host> TrackEngine<H> {
    /// Create an engine bound to `host` and immediately initialize it.
    pub fn new(host: H, settings: Settings) -> Self {
        let mut engine = Self {
            host,
            settings: Settings::default(),
            tracked: Vec::new(),
            configs: HashMap::new(),
            values: HashMap::new(),
            applied: HashMap::new(),
            last_scrollbar_width: None,
            last_scrollbar_height: None,
            last_scroll_padding: None,
            resize_debounce: Debounce::default(),
            mutation_debounce: Debounce::default(),
            scroll_frame: None,
            poll_frame: None,
        };
        engine.init(settings);
        engine
    }

    /// (Re)initialize: tears down prior state, applies `settings`, wires
    /// every subscription, and runs one full synchronous pass.
    pub fn init(&mut self, settings: Settings) {
        self.destroy();
        self.settings = settings;

        MutationWatch::observe(&mut self.host, &WATCHED_ATTRIBUTES);
        self.host.add_listener(Listener::ViewportResize);
        self.host.add_listener(Listener::Click);
        if self.settings.detect_sticky {
            self.host.add_listener(Listener::Scroll);
        }

        self.report_scrollbars();
        self.refresh_elements();
        for el in self.tracked.clone() {
            self.mirror_element(el);
        }
        if self.settings.detect_sticky {
            self.check_sticky_elements();
        }
        self.recompute_scroll_padding();

        if self.settings.poll {
            self.poll_frame = Some(self.host.request_frame());
        }
        info!(
            "TrackEngine: initialized, tracking {} elements",
            self.tracked.len()
        );
    }

    /// Tear down every subscription, pending callback, and written
    /// property, leaving no observable trace on the document.
    pub fn destroy(&mut self) {
        self.host.remove_listener(Listener::ViewportResize);
        self.host.remove_listener(Listener::Scroll);
        self.host.remove_listener(Listener::Click);
        MutationWatch::disconnect(&mut self.host);
        ResizeWatch::disconnect(&mut self.host);

        // Cancellation is by handle: a cleared handle can never fire.
        if let Some(timer) = self.resize_debounce.timer.take() {
            self.host.clear_timeout(timer);
        }
        if let Some(frame) = self.resize_debounce.frame.take() {
            self.host.cancel_frame(frame);
        }
        if let Some(timer) = self.mutation_debounce.timer.take() {
            self.host.clear_timeout(timer);
        }
        if let Some(frame) = self.mutation_debounce.frame.take() {
            self.host.cancel_frame(frame);
        }
        if let Some(frame) = self.scroll_frame.take() {
            self.host.cancel_frame(frame);
        }
        if let Some(frame) = self.poll_frame.take() {
            self.host.cancel_frame(frame);
        }

        for el in self.tracked.clone() {
            self.cleanup_element(el);
        }
        self.clear_scrollbar_properties();
        self.remove_scroll_padding();

        self.tracked.clear();
        self.configs.clear();
        self.values.clear();
        self.applied.clear();
        debug!("TrackEngine: destroyed");
    }

    /// Manually start tracking `el`, bypassing the document re-scan. A
    /// no-op when the element is already tracked.
    pub fn observe(&mut self, el: ElementKey) {
        if self.tracked.contains(&el) {
            return;
        }
        self.tracked.push(el);
        self.host.watch(el);
        self.mirror_element(el);
        self.recompute_scroll_padding();
    }

    /// Manually stop tracking `el`, removing everything it published.
    pub fn unobserve(&mut self, el: ElementKey) {
        let Some(index) = self.tracked.iter().position(|key| *key == el) else {
            return;
        };
        self.cleanup_element(el);
        self.tracked.remove(index);
        self.host.unwatch(el);
        self.recompute_scroll_padding();
    }

    /// Force a full pass without re-scanning the document.
    pub fn recalculate(&mut self) {
        self.report_scrollbars();
        for el in self.tracked.clone() {
            self.mirror_element(el);
        }
        if self.settings.detect_sticky {
            self.check_sticky_elements();
        }
        self.recompute_scroll_padding();
    }

    /// Access the bound host (read-only).
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Access the bound host mutably (embedder-level integration).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // ============================
    // Host event entry points
    // ============================

    /// The viewport resized; scrollbar recomputation runs after the quiet
    /// period, on the next frame.
    pub fn viewport_resized(&mut self) {
        if let Some(timer) = self.resize_debounce.timer.take() {
            self.host.clear_timeout(timer);
        }
        self.resize_debounce.timer = Some(self.host.set_timeout(self.settings.debounce_ms));
    }

    /// A batch of watched elements changed size.
    pub fn elements_resized(&mut self, elements: &[ElementKey]) {
        for &el in elements {
            self.mirror_element(el);
        }
        self.recompute_scroll_padding();
    }

    /// The document scrolled. Sticky checks coalesce to one per frame;
    /// events arriving while a frame is in flight are dropped.
    pub fn scrolled(&mut self) {
        if !self.settings.detect_sticky {
            return;
        }
        if self.scroll_frame.is_none() {
            self.scroll_frame = Some(self.host.request_frame());
        }
    }

    /// A document-wide click was observed.
    pub fn clicked(&mut self, event: &ClickEvent) {
        self.predict_padding_for_click(event);
    }

    /// A previously armed timeout fired.
    pub fn timer_fired(&mut self, timer: TimerId) {
        if self.resize_debounce.timer == Some(timer) {
            self.resize_debounce.timer = None;
            if let Some(frame) = self.resize_debounce.frame.take() {
                self.host.cancel_frame(frame);
            }
            self.resize_debounce.frame = Some(self.host.request_frame());
        } else if self.mutation_debounce.timer == Some(timer) {
            self.mutation_debounce.timer = None;
            if let Some(frame) = self.mutation_debounce.frame.take() {
                self.host.cancel_frame(frame);
            }
            self.mutation_debounce.frame = Some(self.host.request_frame());
        }
    }

    /// A previously requested animation frame fired.
    pub fn frame_fired(&mut self, frame: FrameId) {
        if self.resize_debounce.frame == Some(frame) {
            self.resize_debounce.frame = None;
            self.report_scrollbars();
        } else if self.mutation_debounce.frame == Some(frame) {
            self.mutation_debounce.frame = None;
            self.run_mutation_refresh();
        } else if self.scroll_frame == Some(frame) {
            self.scroll_frame = None;
            self.check_sticky_elements();
            self.recompute_scroll_padding();
        } else if self.poll_frame == Some(frame) {
            self.run_poll_tick();
        }
    }

    // ============================
    // Internal scheduling
    // ============================

    pub(crate) fn kick_mutation_debounce(&mut self) {
        if let Some(timer) = self.mutation_debounce.timer.take() {
            self.host.clear_timeout(timer);
        }
        self.mutation_debounce.timer = Some(self.host.set_timeout(self.settings.debounce_ms));
    }

    fn run_mutation_refresh(&mut self) {
        self.invalidate_configs();
        self.refresh_elements();
        for el in self.tracked.clone() {
            self.mirror_element(el);
        }
        self.recompute_scroll_padding();
    }

    fn run_poll_tick(&mut self) {
        for el in self.tracked.clone() {
            self.mirror_element(el);
        }
        if self.settings.detect_sticky {
            self.check_sticky_elements();
        }
        self.recompute_scroll_padding();
        // Self-rescheduling chain; destroy cancels the stored handle.
        self.poll_frame = Some(self.host.request_frame());
    }

    pub(crate) fn notify_change(&mut self, el: ElementKey, property: &str, value: &str) {
        if let Some(hook) = self.settings.on_change.as_mut() {
            hook(el, property, value);
        }
    }
}

/// Format a pixel length the way written values are compared: integral
/// values print without a fractional part.
pub(crate) fn px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}px", value as i64)
    } else {
        format!("{value}px")
    }
}
