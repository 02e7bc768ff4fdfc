//! Change-detected mirroring of computed values into custom properties.

use page::{ElementKey, Host, StyleScope};

use crate::config::ElementConfig;
use crate::sticky::stuck_property;
use crate::{STUCK_ATTR, TrackEngine};

/// The configuration actually in effect as of an element's last mirror
/// write. A mismatch against the freshly resolved config means stale
/// properties must be removed before reapplying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppliedState {
    props: Vec<String>,
    id: Option<String>,
    target: Option<ElementKey>,
}

impl AppliedState {
    fn of(config: &ElementConfig) -> Self {
        Self {
            props: config.props.clone(),
            id: config.id.clone(),
            target: config.target,
        }
    }

    fn matches(&self, config: &ElementConfig) -> bool {
        self.props == config.props && self.id == config.id && self.target == config.target
    }
}

/// Custom-property name for a mirrored property, id-prefixed when set.
fn property_name(id: Option<&str>, prop: &str) -> String {
    id.map_or_else(|| format!("--{prop}"), |id| format!("--{id}-{prop}"))
}

/// Where a config's properties land: the explicit target, else the
/// document root when an id scopes the name, else the element itself.
fn write_scope(el: ElementKey, id: Option<&str>, target: Option<ElementKey>) -> StyleScope {
    match (target, id) {
        (Some(target), _) => StyleScope::Element(target),
        (None, Some(_)) => StyleScope::Root,
        (None, None) => StyleScope::Element(el),
    }
}

impl<H: Host> TrackEngine<H> {
    /// Mirror every configured property of `el`, writing only values that
    /// changed since the last observation.
    pub(crate) fn mirror_element(&mut self, el: ElementKey) {
        let Some(config) = self.resolve_config(el) else {
            if self.applied.contains_key(&el) {
                self.cleanup_element(el);
            }
            return;
        };
        if config.props.is_empty() {
            if self.applied.contains_key(&el) {
                self.cleanup_element(el);
            }
            return;
        }
        // Stale state must go before the new config writes anything, else
        // properties under the old name or target leak.
        if let Some(previous) = self.applied.get(&el)
            && !previous.matches(&config)
        {
            let stale = previous.clone();
            self.cleanup_state(el, Some(&stale));
        }
        let scope = write_scope(el, config.id.as_deref(), config.target);
        for prop in &config.props {
            let value = self.host.computed_style(el, prop);
            if self.values.get(&el).and_then(|cache| cache.get(prop)) == Some(&value) {
                continue;
            }
            self.values
                .entry(el)
                .or_default()
                .insert(prop.clone(), value.clone());
            let name = property_name(config.id.as_deref(), prop);
            self.host.set_style_property(scope, &name, &value);
            self.notify_change(el, prop, &value);
        }
        self.applied.insert(el, AppliedState::of(&config));
    }

    /// Remove every property the element's effective config wrote, plus
    /// its stuck markers, and purge all per-element state. Safe to call on
    /// an element with nothing recorded.
    pub(crate) fn cleanup_element(&mut self, el: ElementKey) {
        let state = self
            .applied
            .get(&el)
            .cloned()
            .or_else(|| self.configs.get(&el).map(AppliedState::of));
        self.cleanup_state(el, state.as_ref());
    }

    fn cleanup_state(&mut self, el: ElementKey, state: Option<&AppliedState>) {
        if let Some(state) = state {
            let scope = write_scope(el, state.id.as_deref(), state.target);
            for prop in &state.props {
                let name = property_name(state.id.as_deref(), prop);
                self.host.remove_style_property(scope, &name);
            }
            let (stuck_scope, stuck_name) = stuck_property(el, state.id.as_deref());
            self.host.remove_style_property(stuck_scope, &stuck_name);
        }
        self.host.remove_attribute(el, STUCK_ATTR);
        self.values.remove(&el);
        self.configs.remove(&el);
        self.applied.remove(&el);
    }
}
