//! Per-element tracking configuration derived from marker attributes.

use log::debug;
use page::{ElementKey, Host};

use crate::{ADD_PARENT_ATTR, MARKER_ATTR, TARGET_PARENT_ATTR, TrackEngine};

/// Cached view of one element's marker attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ElementConfig {
    /// Property names in declaration order. Duplicates are retained, so
    /// the last occurrence wins the write.
    pub props: Vec<String>,
    /// Identifier prefix for custom-property names (the element's id).
    pub id: Option<String>,
    /// Resolved write target, when the target attribute resolves.
    pub target: Option<ElementKey>,
    /// Lazily filled from a live computed-style read.
    pub is_sticky: Option<bool>,
}

impl<H: Host> TrackEngine<H> {
    /// Resolve (or fetch the memoized) config for `el`. `None` when the
    /// marker attribute is absent.
    pub(crate) fn resolve_config(&mut self, el: ElementKey) -> Option<ElementConfig> {
        if let Some(config) = self.configs.get(&el) {
            return Some(config.clone());
        }
        let raw = self.host.attribute(el, MARKER_ATTR)?;
        let props: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|prop| !prop.is_empty())
            .map(str::to_owned)
            .collect();
        let id = self.host.element_id(el);
        let target = self
            .host
            .attribute(el, TARGET_PARENT_ATTR)
            .or_else(|| self.host.attribute(el, ADD_PARENT_ATTR))
            .and_then(|value| self.resolve_target(el, &value));
        let config = ElementConfig {
            props,
            id,
            target,
            is_sticky: None,
        };
        self.configs.insert(el, config.clone());
        Some(config)
    }

    /// Whether `el`'s config reports sticky positioning, computing and
    /// caching the flag on first use. `None` when no config resolves.
    pub(crate) fn config_is_sticky(&mut self, el: ElementKey) -> Option<bool> {
        let cached = self.resolve_config(el)?;
        if let Some(sticky) = cached.is_sticky {
            return Some(sticky);
        }
        let sticky = self.host.computed_style(el, "position") == "sticky";
        if let Some(config) = self.configs.get_mut(&el) {
            config.is_sticky = Some(sticky);
        }
        Some(sticky)
    }

    /// Drop every memoized config. Invalidation is deliberately coarse:
    /// any relevant attribute mutation clears the whole cache.
    pub(crate) fn invalidate_configs(&mut self) {
        self.configs.clear();
    }

    /// Resolve the write target: a value with a positive leading integer
    /// walks that many parent links (failing if an ancestor is missing);
    /// anything else is tried as a selector, nearest self-or-ancestor
    /// first, then the whole document. Every failure resolves to "no
    /// target".
    fn resolve_target(&self, el: ElementKey, value: &str) -> Option<ElementKey> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if let Some(levels) = parse_depth(value)
            && levels > 0
        {
            let mut node = el;
            for _ in 0..levels {
                node = self.host.parent(node)?;
            }
            return Some(node);
        }
        match self.host.closest(el, value) {
            Ok(Some(found)) => Some(found),
            Ok(None) => match self.host.query_selector(value) {
                Ok(found) => found,
                Err(_) => None,
            },
            Err(err) => {
                debug!("target selector {value:?} rejected: {err}");
                None
            }
        }
    }
}

/// Ancestor depth from the leading digits of the attribute value (an
/// optional `+` sign and trailing text are ignored). `None` when the
/// value does not begin with a digit.
fn parse_depth(value: &str) -> Option<u32> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::parse_depth;

    #[test]
    fn depths_parse_from_the_leading_digits() {
        assert_eq!(parse_depth("2"), Some(2));
        assert_eq!(parse_depth("3-up"), Some(3));
        assert_eq!(parse_depth("10x"), Some(10));
        assert_eq!(parse_depth("+4"), Some(4));
        assert_eq!(parse_depth("0"), Some(0));
        assert_eq!(parse_depth(".wrap"), None);
        assert_eq!(parse_depth("-2"), None);
    }
}
