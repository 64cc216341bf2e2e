//! Thread list container and view hosts.

use crate::dom::{Document, MarkupError, NodeId};
use crate::model::PostId;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared document handle.
pub type SharedDocument = Rc<RefCell<Document>>;

/// Where a view renders: the document, the thread list container, and the
/// view's own element (empty for live creation, populated when the markup
/// was rendered ahead of time).
#[derive(Debug, Clone)]
pub struct Host {
    /// Document the view renders into.
    pub doc: SharedDocument,
    /// Thread list element.
    pub container: NodeId,
    /// Element the view takes over.
    pub element: NodeId,
}

/// A page's thread list: `div#threads` whose first child is the
/// new-thread `aside`. Threads are inserted right after that `aside`.
#[derive(Debug, Clone)]
pub struct Board {
    doc: SharedDocument,
    container: NodeId,
}

impl Board {
    /// Empty board: the container holding only the new-thread `aside`.
    pub fn new() -> Self {
        let mut doc = Document::new();
        let container = doc.create_element("div");
        doc.set_attribute(container, "id", "threads");
        let aside = doc.create_element("aside");
        doc.toggle_class(aside, "act", true);
        doc.set_text(aside, "New thread");
        doc.append_child(container, aside);
        Self {
            doc: Rc::new(RefCell::new(doc)),
            container,
        }
    }

    /// Board whose container already holds pre-rendered markup.
    pub fn with_markup(html: &str) -> Result<Self, MarkupError> {
        let board = Self::new();
        {
            let mut doc = board.doc.borrow_mut();
            let fragment = doc.parse_fragment(html)?;
            for node in fragment {
                doc.append_child(board.container, node);
            }
        }
        Ok(board)
    }

    /// Shared handle to the board's document.
    pub fn doc(&self) -> SharedDocument {
        Rc::clone(&self.doc)
    }

    /// The `div#threads` element.
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Host for a new thread: a fresh, detached, empty element.
    pub fn empty_host(&self) -> Host {
        let element = self.doc.borrow_mut().create_element("section");
        self.host(element)
    }

    /// Host for thread `id`: its pre-rendered `section#p{id}` if the
    /// container has one, otherwise an empty host.
    pub fn host_for(&self, id: PostId) -> Host {
        match self.find_section(id) {
            Some(element) => self.host(element),
            None => self.empty_host(),
        }
    }

    /// Top-level `section#p{id}` of thread `id`, if rendered.
    pub fn find_section(&self, id: PostId) -> Option<NodeId> {
        let doc = self.doc.borrow();
        let element_id = id.element_id();
        doc.children(self.container)
            .iter()
            .copied()
            .find(|&node| {
                doc.tag(node) == Some("section")
                    && doc.attribute(node, "id") == Some(element_id.as_str())
            })
    }

    /// Thread ids in display order, read from the `section#pN` elements.
    pub fn thread_order(&self) -> Vec<PostId> {
        let doc = self.doc.borrow();
        doc.children(self.container)
            .iter()
            .filter(|&&node| doc.tag(node) == Some("section"))
            .filter_map(|&node| doc.attribute(node, "id"))
            .filter_map(|id| id.strip_prefix('p')?.parse::<u64>().ok())
            .filter_map(|num| PostId::new(num).ok())
            .collect()
    }

    /// Outline of the whole container; see [`Document::outline`].
    pub fn outline(&self) -> String {
        self.doc.borrow().outline(self.container)
    }

    fn host(&self, element: NodeId) -> Host {
        Host {
            doc: Rc::clone(&self.doc),
            container: self.container,
            element,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
