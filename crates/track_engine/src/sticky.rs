//! Stuck-state evaluation for sticky-positioned elements.

use page::{ElementKey, Host, StyleScope};

use crate::{STUCK_ATTR, TrackEngine};

/// An element counts as stuck while its top edge sits within this band
/// around its computed `top` offset.
const STUCK_TOLERANCE_PX: f64 = 1.0;

/// Scope and name of an element's stuck property: id-prefixed on the
/// document root when an identifier is set, else on the element itself.
pub(crate) fn stuck_property(el: ElementKey, id: Option<&str>) -> (StyleScope, String) {
    id.map_or_else(
        || (StyleScope::Element(el), "--stuck".to_owned()),
        |id| (StyleScope::Root, format!("--{id}-stuck")),
    )
}

/// Parse a computed pixel length ("12px" or a bare number). `auto` and
/// other keywords yield `None`.
fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(number) = value.strip_suffix("px") {
        return number.trim().parse().ok();
    }
    value.parse().ok()
}

impl<H: Host> TrackEngine<H> {
    /// Re-evaluate the stuck state of every sticky tracked element,
    /// toggling the marker attribute and stuck property on transition
    /// only.
    pub(crate) fn check_sticky_elements(&mut self) {
        for el in self.tracked.clone() {
            let Some(sticky) = self.config_is_sticky(el) else {
                continue;
            };
            if !sticky {
                continue;
            }
            let Some(offset) = parse_px(&self.host.computed_style(el, "top")) else {
                continue;
            };
            let rect_top = self.host.bounding_rect(el).top();
            let stuck = rect_top >= offset - STUCK_TOLERANCE_PX
                && rect_top <= offset + STUCK_TOLERANCE_PX;
            let was_stuck = self.host.has_attribute(el, STUCK_ATTR);
            if stuck == was_stuck {
                continue;
            }
            if stuck {
                self.host.set_attribute(el, STUCK_ATTR, "");
            } else {
                self.host.remove_attribute(el, STUCK_ATTR);
            }
            let value = if stuck { "1" } else { "0" };
            // The id is read live, not from the config, so the property
            // lands where a freshly resolved config would put it.
            let id = self.host.element_id(el);
            let (scope, name) = stuck_property(el, id.as_deref());
            self.host.set_style_property(scope, &name, value);
            self.notify_change(el, "stuck", value);
        }
    }
}
