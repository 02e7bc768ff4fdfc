//! Tracked-element set maintenance driven by document mutations.

use std::collections::HashSet;

use log::debug;
use page::{ElementKey, Host, MutationRecord};

use crate::{MARKER_ATTR, TrackEngine};

impl<H: Host> TrackEngine<H> {
    /// Re-query the document and reconcile the tracked set: elements that
    /// dropped out are unwatched and cleaned up, new ones are watched.
    pub(crate) fn refresh_elements(&mut self) {
        let next = self.host.elements_with_attribute(MARKER_ATTR);
        let next_set: HashSet<ElementKey> = next.iter().copied().collect();
        for el in self.tracked.clone() {
            if !next_set.contains(&el) {
                self.host.unwatch(el);
                self.cleanup_element(el);
            }
        }
        for &el in &next {
            if !self.tracked.contains(&el) {
                self.host.watch(el);
            }
        }
        debug!("refresh: tracking {} elements", next.len());
        self.tracked = next;
    }

    /// Classify and apply one host-delivered mutation batch.
    ///
    /// Attribute records are handled immediately, element by element;
    /// structural records only decide relevance. A relevant batch arms the
    /// debounced full refresh.
    pub fn apply_mutations(&mut self, records: &[MutationRecord]) {
        let mut relevant = false;
        for record in records {
            match record {
                MutationRecord::Attribute { node, name } => {
                    if name == MARKER_ATTR {
                        if self.host.has_attribute(*node, MARKER_ATTR) {
                            // Marker added or changed: the refresh pass
                            // picks the element up.
                            relevant = true;
                        } else {
                            self.cleanup_element(*node);
                            relevant = true;
                        }
                    } else if self.host.has_attribute(*node, MARKER_ATTR) {
                        // Another watched attribute changed on a tracked
                        // element. Scoped and cheap, so no debounce.
                        self.cleanup_element(*node);
                        self.invalidate_configs();
                        self.mirror_element(*node);
                        self.recompute_scroll_padding();
                    }
                }
                MutationRecord::ChildList { added, removed } => {
                    if !relevant {
                        relevant = added
                            .iter()
                            .chain(removed)
                            .any(|&node| self.host.subtree_bears_attribute(node, MARKER_ATTR));
                    }
                }
            }
        }
        if relevant {
            self.kick_mutation_debounce();
        }
    }
}
