use std::rc::Rc;

use crate::sheet::style_tree::{Document, Node, NodeRef};

/// Every rule in a document, captured in pre-order before anything is mutated.
///
/// Holding `Rc`s keeps each captured rule alive even if a later step drops it
/// from the tree, so an entry always refers to the node that existed at capture.
#[derive(Debug, Default)]
pub struct RuleSnapshot {
    rules: Vec<NodeRef>,
}

impl RuleSnapshot {
    /// Enumerate the rules of the entire document.
    pub fn capture(document: &Document) -> Self {
        let mut snapshot = RuleSnapshot::default();
        Self::traverse(&document.root, &mut snapshot);
        snapshot
    }

    /// Recursively walk the tree in document order, recording rules before
    /// their nested children.
    fn traverse(node: &NodeRef, snapshot: &mut RuleSnapshot) {
        let node_ref = node.borrow();
        match &*node_ref {
            Node::Rule(rule) => {
                snapshot.rules.push(Rc::clone(node));
                for child in &rule.children {
                    Self::traverse(child, snapshot);
                }
            }
            Node::Root(_) | Node::AtRule(_) => {
                if let Some(children) = node_ref.children() {
                    for child in children {
                        Self::traverse(child, snapshot);
                    }
                }
            }
            // Leaves hold no rules.
            Node::Declaration(_) | Node::Comment(_) | Node::Raw(_) => {}
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeRef> {
        self.rules.iter()
    }

    /// True if `node` is one of the captured rules.
    #[cfg(test)]
    pub fn contains(&self, node: &NodeRef) -> bool {
        self.rules.iter().any(|rule| Rc::ptr_eq(rule, node))
    }
}

impl<'a> IntoIterator for &'a RuleSnapshot {
    type Item = &'a NodeRef;
    type IntoIter = std::slice::Iter<'a, NodeRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
