//! Image handling composed into section views.
//!
//! Views call [`ImageCapability::attach`] once their element is in the
//! document and [`ImageCapability::detach`] when they are torn down.

use crate::dom::{Document, NodeId};
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::trace;

/// Image behaviour attached to a section view.
pub trait ImageCapability {
    /// Prepare the images under `section` once it is in the document.
    fn attach(&self, doc: &mut Document, section: NodeId);

    /// Release whatever [`attach`](Self::attach) set up for `section`.
    fn detach(&self, _section: NodeId) {}
}

/// Leaves images untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageCapability for NoImages {
    fn attach(&self, _doc: &mut Document, _section: NodeId) {}
}

const LAZY_CLASS: &str = "lazy";

/// Defers image loading: `src` is parked in `data-src` until [`load`] runs.
///
/// [`load`]: LazyImages::load
#[derive(Debug, Default)]
pub struct LazyImages {
    pending: RefCell<BTreeMap<NodeId, Vec<NodeId>>>,
}

impl LazyImages {
    /// No images pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Images of `section` still waiting to load.
    pub fn pending(&self, section: NodeId) -> Vec<NodeId> {
        self.pending
            .borrow()
            .get(&section)
            .cloned()
            .unwrap_or_default()
    }

    /// Restore the deferred sources of `section`. Returns how many images
    /// were loaded.
    pub fn load(&self, doc: &mut Document, section: NodeId) -> usize {
        let images = self.pending.borrow_mut().remove(&section).unwrap_or_default();
        let mut loaded = 0;
        for img in images {
            if doc.is_removed(img) {
                continue;
            }
            if let Some(src) = doc.remove_attribute(img, "data-src") {
                doc.set_attribute(img, "src", &src);
                doc.toggle_class(img, LAZY_CLASS, false);
                loaded += 1;
            }
        }
        trace!(?section, loaded, "lazy images loaded");
        loaded
    }
}

impl ImageCapability for LazyImages {
    fn attach(&self, doc: &mut Document, section: NodeId) {
        let mut deferred = Vec::new();
        for img in doc.descendants_by_tag(section, "img") {
            if let Some(src) = doc.remove_attribute(img, "src") {
                doc.set_attribute(img, "data-src", &src);
                doc.toggle_class(img, LAZY_CLASS, true);
                deferred.push(img);
            }
        }
        if !deferred.is_empty() {
            trace!(?section, count = deferred.len(), "images deferred");
            self.pending.borrow_mut().insert(section, deferred);
        }
    }

    fn detach(&self, section: NodeId) {
        self.pending.borrow_mut().remove(&section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_with_image(doc: &mut Document) -> (NodeId, NodeId) {
        let roots = doc
            .parse_fragment(r#"<section><figure><img src="a.png"></figure><blockquote>x</blockquote></section>"#)
            .expect("valid markup");
        let img = doc.descendants_by_tag(roots[0], "img")[0];
        (roots[0], img)
    }

    #[test]
    fn attach_defers_sources() {
        let mut doc = Document::new();
        let (section, img) = section_with_image(&mut doc);
        let images = LazyImages::new();

        images.attach(&mut doc, section);

        assert_eq!(doc.attribute(img, "src"), None);
        assert_eq!(doc.attribute(img, "data-src"), Some("a.png"));
        assert!(doc.has_class(img, "lazy"));
        assert_eq!(images.pending(section), vec![img]);
    }

    #[test]
    fn load_restores_sources() {
        let mut doc = Document::new();
        let (section, img) = section_with_image(&mut doc);
        let images = LazyImages::new();
        images.attach(&mut doc, section);

        assert_eq!(images.load(&mut doc, section), 1);

        assert_eq!(doc.attribute(img, "src"), Some("a.png"));
        assert!(!doc.has_class(img, "lazy"));
        assert!(images.pending(section).is_empty());
    }

    #[test]
    fn detach_forgets_pending_images() {
        let mut doc = Document::new();
        let (section, _) = section_with_image(&mut doc);
        let images = LazyImages::new();
        images.attach(&mut doc, section);

        images.detach(section);

        assert!(images.pending(section).is_empty());
        assert_eq!(images.load(&mut doc, section), 0);
    }
}
