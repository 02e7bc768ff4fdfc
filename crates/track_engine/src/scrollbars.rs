//! Viewport scrollbar size reporting.

use page::{Host, StyleScope};

use crate::{TrackEngine, px};

pub(crate) const SCROLLBAR_WIDTH_PROP: &str = "--scrollbar-width";
pub(crate) const SCROLLBAR_HEIGHT_PROP: &str = "--scrollbar-height";

impl<H: Host> TrackEngine<H> {
    /// Republish the scrollbar size per enabled axis, on change only.
    pub(crate) fn report_scrollbars(&mut self) {
        let viewport = self.host.viewport();
        if self.settings.scrollbar_width {
            let value = px(viewport.inner_width - viewport.client_width);
            if self.last_scrollbar_width.as_deref() != Some(value.as_str()) {
                self.host
                    .set_style_property(StyleScope::Root, SCROLLBAR_WIDTH_PROP, &value);
                self.last_scrollbar_width = Some(value);
            }
        }
        if self.settings.scrollbar_height {
            let value = px(viewport.inner_height - viewport.client_height);
            if self.last_scrollbar_height.as_deref() != Some(value.as_str()) {
                self.host
                    .set_style_property(StyleScope::Root, SCROLLBAR_HEIGHT_PROP, &value);
                self.last_scrollbar_height = Some(value);
            }
        }
    }

    /// Remove whichever scrollbar properties were previously written.
    pub(crate) fn clear_scrollbar_properties(&mut self) {
        if self.last_scrollbar_width.take().is_some() {
            self.host
                .remove_style_property(StyleScope::Root, SCROLLBAR_WIDTH_PROP);
        }
        if self.last_scrollbar_height.take().is_some() {
            self.host
                .remove_style_property(StyleScope::Root, SCROLLBAR_HEIGHT_PROP);
        }
    }
}
