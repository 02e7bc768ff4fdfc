//! Scroll-padding aggregation over contributing elements.

use page::{ClickEvent, ElementKey, Host, StyleScope};

use crate::{SCROLL_PADDING_ATTR, STUCK_ATTR, TrackEngine, px};

/// Standard property, not a custom one: consumed directly by the
/// browser's scroll-into-view positioning.
pub(crate) const SCROLL_PADDING_PROP: &str = "scroll-padding-top";

impl<H: Host> TrackEngine<H> {
    /// Sum the heights of all scroll-padding contributors and republish
    /// the offset. With sticky detection enabled, sticky contributors
    /// count only while stuck; non-sticky contributors always count. An
    /// empty contributor set removes the property.
    pub(crate) fn recompute_scroll_padding(&mut self) {
        let mut total = 0.0_f64;
        let mut any = false;
        for el in self.tracked.clone() {
            if !self.host.has_attribute(el, SCROLL_PADDING_ATTR) {
                continue;
            }
            if self.settings.detect_sticky {
                let Some(sticky) = self.config_is_sticky(el) else {
                    continue;
                };
                if sticky && !self.host.has_attribute(el, STUCK_ATTR) {
                    continue;
                }
            }
            any = true;
            total += self.host.bounding_rect(el).height;
        }
        if !any {
            self.remove_scroll_padding();
            return;
        }
        let value = px(total);
        if self.last_scroll_padding.as_deref() != Some(value.as_str()) {
            self.host
                .set_style_property(StyleScope::Root, SCROLL_PADDING_PROP, &value);
            self.last_scroll_padding = Some(value);
        }
    }

    /// Remove the padding property when previously written.
    pub(crate) fn remove_scroll_padding(&mut self) {
        if self.last_scroll_padding.take().is_some() {
            self.host
                .remove_style_property(StyleScope::Root, SCROLL_PADDING_PROP);
        }
    }

    /// On a plain left-click on an in-page anchor link, write the offset
    /// the jump target will need before the scroll happens. Sticky
    /// contributors count only when their container still reaches below
    /// the target's top edge after the jump; the stuck attribute is not
    /// consulted, since the jump changes what will be stuck.
    pub(crate) fn predict_padding_for_click(&mut self, event: &ClickEvent) {
        if event.default_prevented
            || event.button != 0
            || event.ctrl
            || event.meta
            || event.shift
            || event.alt
        {
            return;
        }
        let Some(anchor) = self.enclosing_fragment_anchor(event.target) else {
            return;
        };
        let Some(href) = self.host.attribute(anchor, "href") else {
            return;
        };
        let Some(fragment) = href.strip_prefix('#') else {
            return;
        };
        if fragment.is_empty() {
            return;
        }
        let Some(target) = self.host.element_by_id(fragment) else {
            return;
        };
        let target_top = self.host.bounding_rect(target).top() + self.host.scroll_y();

        let mut total = 0.0_f64;
        let mut any = false;
        for el in self.tracked.clone() {
            if !self.host.has_attribute(el, SCROLL_PADDING_ATTR) {
                continue;
            }
            let Some(sticky) = self.config_is_sticky(el) else {
                continue;
            };
            if !sticky {
                any = true;
                total += self.host.bounding_rect(el).height;
                continue;
            }
            let container = self.sticky_container(el);
            let container_bottom = self.host.bounding_rect(container).top()
                + self.host.scroll_y()
                + self.host.offset_height(container);
            if target_top < container_bottom {
                any = true;
                total += self.host.bounding_rect(el).height;
            }
        }

        // Written immediately, bypassing debounce and the change compare:
        // the upcoming scroll must see the predicted value.
        if any {
            let value = px(total);
            self.host
                .set_style_property(StyleScope::Root, SCROLL_PADDING_PROP, &value);
            self.last_scroll_padding = Some(value);
        } else {
            self.remove_scroll_padding();
        }
    }

    /// Nearest self-or-ancestor `a` element with a fragment href.
    fn enclosing_fragment_anchor(&self, from: ElementKey) -> Option<ElementKey> {
        let mut current = Some(from);
        while let Some(el) = current {
            if self.host.tag_name(el).as_deref() == Some("a")
                && self
                    .host
                    .attribute(el, "href")
                    .is_some_and(|href| href.starts_with('#'))
            {
                return Some(el);
            }
            current = self.host.parent(el);
        }
        None
    }

    /// Nearest ancestor that is not `display: contents`; the document
    /// root when every ancestor is.
    fn sticky_container(&self, el: ElementKey) -> ElementKey {
        let mut current = self.host.parent(el);
        while let Some(parent) = current {
            if parent == ElementKey::ROOT {
                break;
            }
            if self.host.computed_style(parent, "display") != "contents" {
                return parent;
            }
            current = self.host.parent(parent);
        }
        ElementKey::ROOT
    }
}
