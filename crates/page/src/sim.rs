//! Headless in-memory host.
//!
//! `SimHost` implements every capability trait over a hand-built element
//! tree with manually stepped timers and frames, so debounce coalescing
//! and cancellation are testable without a browser or real time. Handles
//! are cheap clones sharing one document.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::Result;

use crate::selector::CompoundSelector;
use crate::{
    ElementKey, FrameId, FrameScheduler, Listener, MutationRecord, MutationWatch, PageDom, Rect,
    ResizeWatch, StyleScope, TimerId, Viewport,
};

struct SimNode {
    tag: String,
    attributes: HashMap<String, String>,
    computed: HashMap<String, String>,
    rect: Rect,
    offset_height: f64,
    /// Inline style properties written through [`StyleScope`].
    style: HashMap<String, String>,
    parent: Option<ElementKey>,
    children: Vec<ElementKey>,
    connected: bool,
}

impl SimNode {
    fn new(tag: &str, parent: Option<ElementKey>, connected: bool) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: HashMap::new(),
            computed: HashMap::new(),
            rect: Rect::default(),
            offset_height: 0.0,
            style: HashMap::new(),
            parent,
            children: Vec::new(),
            connected,
        }
    }
}

struct SimState {
    nodes: HashMap<ElementKey, SimNode>,
    viewport: Viewport,
    scroll_y: f64,
    listeners: HashSet<Listener>,
    watched: HashSet<ElementKey>,
    /// `Some` while a mutation observer is connected.
    mutation_filter: Option<Vec<String>>,
    pending_mutations: Vec<MutationRecord>,
    timers: Vec<(TimerId, u64)>,
    frames: Vec<FrameId>,
    now_ms: u64,
    next_timer: u64,
    next_frame: u64,
    next_element: u64,
    writes: Vec<(StyleScope, String, String)>,
}

impl SimState {
    fn queue_attribute(&mut self, node: ElementKey, name: &str) {
        if let Some(filter) = &self.mutation_filter
            && filter.iter().any(|watched| watched == name)
        {
            self.pending_mutations.push(MutationRecord::Attribute {
                node,
                name: name.to_owned(),
            });
        }
    }

    fn queue_child_list(&mut self, added: Vec<ElementKey>, removed: Vec<ElementKey>) {
        if self.mutation_filter.is_some() {
            self.pending_mutations
                .push(MutationRecord::ChildList { added, removed });
        }
    }

    /// Connected elements reachable from the root, preorder.
    fn document_order(&self) -> Vec<ElementKey> {
        let mut out = Vec::new();
        let mut stack = vec![ElementKey::ROOT];
        while let Some(el) = stack.pop() {
            let Some(node) = self.nodes.get(&el) else {
                continue;
            };
            out.push(el);
            for child in node.children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    fn scope_key(scope: StyleScope) -> ElementKey {
        match scope {
            StyleScope::Root => ElementKey::ROOT,
            StyleScope::Element(el) => el,
        }
    }
}

/// Cheaply clonable handle to one in-memory document.
#[derive(Clone)]
pub struct SimHost {
    state: Rc<RefCell<SimState>>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    /// A document holding only the root element.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(ElementKey::ROOT, SimNode::new("html", None, true));
        Self {
            state: Rc::new(RefCell::new(SimState {
                nodes,
                viewport: Viewport::default(),
                scroll_y: 0.0,
                listeners: HashSet::new(),
                watched: HashSet::new(),
                mutation_filter: None,
                pending_mutations: Vec::new(),
                timers: Vec::new(),
                frames: Vec::new(),
                now_ms: 0,
                next_timer: 1,
                next_frame: 1,
                next_element: 1,
                writes: Vec::new(),
            })),
        }
    }

    // ---- document construction ----

    /// Append a child element under `parent`, reporting the insertion to a
    /// connected mutation observer.
    pub fn add_element(&self, parent: ElementKey, tag: &str) -> ElementKey {
        let mut state = self.state.borrow_mut();
        let key = ElementKey(state.next_element);
        state.next_element += 1;
        let connected = state.nodes.get(&parent).is_some_and(|p| p.connected);
        state.nodes.insert(key, SimNode::new(tag, Some(parent), connected));
        if let Some(parent_node) = state.nodes.get_mut(&parent) {
            parent_node.children.push(key);
        }
        state.queue_child_list(vec![key], Vec::new());
        key
    }

    /// Detach an element (and its subtree) from the document. The detached
    /// nodes stay queryable, matching hosts that report removed nodes.
    pub fn remove_element(&self, el: ElementKey) {
        let mut state = self.state.borrow_mut();
        let parent = state.nodes.get(&el).and_then(|n| n.parent);
        if let Some(parent) = parent
            && let Some(parent_node) = state.nodes.get_mut(&parent)
        {
            parent_node.children.retain(|child| *child != el);
        }
        let mut stack = vec![el];
        while let Some(cur) = stack.pop() {
            if let Some(node) = state.nodes.get_mut(&cur) {
                node.connected = false;
                stack.extend(node.children.iter().copied());
            }
        }
        if let Some(node) = state.nodes.get_mut(&el) {
            node.parent = None;
        }
        state.queue_child_list(Vec::new(), vec![el]);
    }

    pub fn set_computed(&self, el: ElementKey, property: &str, value: &str) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&el) {
            node.computed.insert(property.to_owned(), value.to_owned());
        }
    }

    pub fn set_rect(&self, el: ElementKey, rect: Rect) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&el) {
            node.rect = rect;
        }
    }

    pub fn set_offset_height(&self, el: ElementKey, height: f64) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&el) {
            node.offset_height = height;
        }
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.state.borrow_mut().viewport = viewport;
    }

    pub fn set_scroll_y(&self, offset: f64) {
        self.state.borrow_mut().scroll_y = offset;
    }

    // ---- event and scheduler stepping ----

    /// Drain the pending mutation batch.
    pub fn take_mutations(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.state.borrow_mut().pending_mutations)
    }

    /// Advance the clock and drain timers that came due, in firing order.
    pub fn advance_time(&self, ms: u64) -> Vec<TimerId> {
        let mut state = self.state.borrow_mut();
        state.now_ms += ms;
        let now = state.now_ms;
        let mut due: Vec<(TimerId, u64)> = state
            .timers
            .iter()
            .copied()
            .filter(|(_, deadline)| *deadline <= now)
            .collect();
        state.timers.retain(|(_, deadline)| *deadline > now);
        due.sort_by_key(|(id, deadline)| (*deadline, id.0));
        due.into_iter().map(|(id, _)| id).collect()
    }

    /// Drain all scheduled animation frames, in request order.
    pub fn take_frames(&self) -> Vec<FrameId> {
        std::mem::take(&mut self.state.borrow_mut().frames)
    }

    // ---- assertion helpers ----

    pub fn style_value(&self, scope: StyleScope, name: &str) -> Option<String> {
        let state = self.state.borrow();
        state
            .nodes
            .get(&SimState::scope_key(scope))
            .and_then(|node| node.style.get(name).cloned())
    }

    /// Every inline style property currently set anywhere in the document.
    pub fn all_style_properties(&self) -> Vec<(ElementKey, String)> {
        let state = self.state.borrow();
        let mut out = Vec::new();
        for (key, node) in &state.nodes {
            for name in node.style.keys() {
                out.push((*key, name.clone()));
            }
        }
        out
    }

    /// Number of style-property writes performed so far.
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes.len()
    }

    /// Drain the style-write log.
    pub fn take_writes(&self) -> Vec<(StyleScope, String, String)> {
        std::mem::take(&mut self.state.borrow_mut().writes)
    }

    pub fn has_listener(&self, listener: Listener) -> bool {
        self.state.borrow().listeners.contains(&listener)
    }

    pub fn is_watching(&self, el: ElementKey) -> bool {
        self.state.borrow().watched.contains(&el)
    }

    pub fn watched_count(&self) -> usize {
        self.state.borrow().watched.len()
    }

    pub fn mutation_observer_connected(&self) -> bool {
        self.state.borrow().mutation_filter.is_some()
    }

    pub fn pending_timer_count(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn pending_frame_count(&self) -> usize {
        self.state.borrow().frames.len()
    }
}

impl PageDom for SimHost {
    fn elements_with_attribute(&self, name: &str) -> Vec<ElementKey> {
        let state = self.state.borrow();
        state
            .document_order()
            .into_iter()
            .filter(|el| {
                state
                    .nodes
                    .get(el)
                    .is_some_and(|node| node.attributes.contains_key(name))
            })
            .collect()
    }

    fn tag_name(&self, el: ElementKey) -> Option<String> {
        self.state.borrow().nodes.get(&el).map(|node| node.tag.clone())
    }

    fn attribute(&self, el: ElementKey, name: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(&el)
            .and_then(|node| node.attributes.get(name).cloned())
    }

    fn parent(&self, el: ElementKey) -> Option<ElementKey> {
        self.state.borrow().nodes.get(&el).and_then(|node| node.parent)
    }

    fn element_by_id(&self, id: &str) -> Option<ElementKey> {
        if id.is_empty() {
            return None;
        }
        let state = self.state.borrow();
        state.document_order().into_iter().find(|el| {
            state
                .nodes
                .get(el)
                .and_then(|node| node.attributes.get("id"))
                .is_some_and(|value| value == id)
        })
    }

    fn closest(&self, el: ElementKey, selector: &str) -> Result<Option<ElementKey>> {
        let compound = CompoundSelector::parse(selector)?;
        let mut current = Some(el);
        while let Some(candidate) = current {
            if compound.matches(self, candidate) {
                return Ok(Some(candidate));
            }
            current = self.parent(candidate);
        }
        Ok(None)
    }

    fn query_selector(&self, selector: &str) -> Result<Option<ElementKey>> {
        let compound = CompoundSelector::parse(selector)?;
        let order = self.state.borrow().document_order();
        Ok(order.into_iter().find(|el| compound.matches(self, *el)))
    }

    fn subtree_bears_attribute(&self, el: ElementKey, name: &str) -> bool {
        let state = self.state.borrow();
        let mut stack = vec![el];
        while let Some(cur) = stack.pop() {
            let Some(node) = state.nodes.get(&cur) else {
                continue;
            };
            if node.attributes.contains_key(name) {
                return true;
            }
            stack.extend(node.children.iter().copied());
        }
        false
    }

    fn computed_style(&self, el: ElementKey, property: &str) -> String {
        self.state
            .borrow()
            .nodes
            .get(&el)
            .and_then(|node| node.computed.get(property).cloned())
            .unwrap_or_default()
    }

    fn bounding_rect(&self, el: ElementKey) -> Rect {
        self.state
            .borrow()
            .nodes
            .get(&el)
            .map(|node| node.rect)
            .unwrap_or_default()
    }

    fn offset_height(&self, el: ElementKey) -> f64 {
        self.state
            .borrow()
            .nodes
            .get(&el)
            .map(|node| node.offset_height)
            .unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    fn scroll_y(&self) -> f64 {
        self.state.borrow().scroll_y
    }

    fn set_attribute(&mut self, el: ElementKey, name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(node) = state.nodes.get_mut(&el) {
            node.attributes.insert(name.to_owned(), value.to_owned());
            state.queue_attribute(el, name);
        }
    }

    fn remove_attribute(&mut self, el: ElementKey, name: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(node) = state.nodes.get_mut(&el)
            && node.attributes.remove(name).is_some()
        {
            state.queue_attribute(el, name);
        }
    }

    fn set_style_property(&mut self, scope: StyleScope, name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        let key = SimState::scope_key(scope);
        if let Some(node) = state.nodes.get_mut(&key) {
            node.style.insert(name.to_owned(), value.to_owned());
            state
                .writes
                .push((scope, name.to_owned(), value.to_owned()));
        }
    }

    fn remove_style_property(&mut self, scope: StyleScope, name: &str) {
        let mut state = self.state.borrow_mut();
        let key = SimState::scope_key(scope);
        if let Some(node) = state.nodes.get_mut(&key) {
            node.style.remove(name);
        }
    }

    fn add_listener(&mut self, listener: Listener) {
        self.state.borrow_mut().listeners.insert(listener);
    }

    fn remove_listener(&mut self, listener: Listener) {
        self.state.borrow_mut().listeners.remove(&listener);
    }
}

impl ResizeWatch for SimHost {
    fn watch(&mut self, el: ElementKey) {
        self.state.borrow_mut().watched.insert(el);
    }

    fn unwatch(&mut self, el: ElementKey) {
        self.state.borrow_mut().watched.remove(&el);
    }

    fn disconnect(&mut self) {
        self.state.borrow_mut().watched.clear();
    }
}

impl MutationWatch for SimHost {
    fn observe(&mut self, attribute_filter: &[&str]) {
        let mut state = self.state.borrow_mut();
        state.mutation_filter = Some(attribute_filter.iter().map(|s| (*s).to_owned()).collect());
        state.pending_mutations.clear();
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.mutation_filter = None;
        state.pending_mutations.clear();
    }
}

impl FrameScheduler for SimHost {
    fn set_timeout(&mut self, delay_ms: u64) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_timer);
        state.next_timer += 1;
        let deadline = state.now_ms + delay_ms;
        state.timers.push((id, deadline));
        id
    }

    fn clear_timeout(&mut self, timer: TimerId) {
        self.state.borrow_mut().timers.retain(|(id, _)| *id != timer);
    }

    fn request_frame(&mut self) -> FrameId {
        let mut state = self.state.borrow_mut();
        let id = FrameId(state.next_frame);
        state.next_frame += 1;
        state.frames.push(id);
        id
    }

    fn cancel_frame(&mut self, frame: FrameId) {
        self.state.borrow_mut().frames.retain(|id| *id != frame);
    }
}
