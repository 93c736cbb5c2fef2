use crate::error::NestingError;
use crate::nesting::selector::split_selector_list;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub mod style_tree {
    use super::*;

    pub type NodeRef = Rc<RefCell<Node>>;
    pub type WeakNodeRef = Weak<RefCell<Node>>;

    #[derive(Debug)]
    pub enum Node {
        Root(RootNode),
        Rule(RuleNode),
        AtRule(AtRuleNode),
        Declaration(DeclarationNode),
        Comment(String),
        /// Pre-printed text for constructs the tree does not model (e.g. `@keyframes`
        /// coming out of the parser). Never looked into.
        Raw(String),
    }

    #[derive(Debug, Default)]
    pub struct RootNode {
        pub children: Vec<NodeRef>,
    }

    #[derive(Debug)]
    pub struct RuleNode {
        /// e.g. ".a", "&:hover", "> li"
        pub selectors: Vec<String>,
        pub children: Vec<NodeRef>,
        pub parent: Option<WeakNodeRef>,
    }

    #[derive(Debug)]
    pub struct AtRuleNode {
        /// Name without the leading `@`.
        pub name: String,
        pub params: String,
        /// `None` for statement at-rules such as `@import "a.css";`.
        pub children: Option<Vec<NodeRef>>,
        pub parent: Option<WeakNodeRef>,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DeclarationNode {
        pub property: String,
        pub value: String,
        pub important: bool,
    }

    /// A style sheet. The root node is a `Node::Root`.
    #[derive(Debug)]
    pub struct Document {
        pub root: NodeRef,
    }

    impl RuleNode {
        pub fn new(selectors: Vec<String>) -> Self {
            RuleNode {
                selectors,
                children: Vec::new(),
                parent: None,
            }
        }

        /// The selector list as written in a stylesheet, e.g. "a, b".
        pub fn selector_text(&self) -> String {
            self.selectors.join(", ")
        }
    }

    impl AtRuleNode {
        pub fn new(name: String, params: String) -> Self {
            AtRuleNode {
                name,
                params,
                children: Some(Vec::new()),
                parent: None,
            }
        }
    }

    impl Node {
        pub fn kind_name(&self) -> &'static str {
            match self {
                Node::Root(_) => "root",
                Node::Rule(_) => "rule",
                Node::AtRule(_) => "at-rule",
                Node::Declaration(_) => "declaration",
                Node::Comment(_) => "comment",
                Node::Raw(_) => "raw",
            }
        }

        pub fn is_rule(&self) -> bool {
            matches!(self, Node::Rule(_))
        }

        pub fn as_rule(&self) -> Option<&RuleNode> {
            match self {
                Node::Rule(rule) => Some(rule),
                _ => None,
            }
        }

        pub fn as_rule_mut(&mut self) -> Option<&mut RuleNode> {
            match self {
                Node::Rule(rule) => Some(rule),
                _ => None,
            }
        }

        pub fn children(&self) -> Option<&Vec<NodeRef>> {
            match self {
                Node::Root(root) => Some(&root.children),
                Node::Rule(rule) => Some(&rule.children),
                Node::AtRule(at_rule) => at_rule.children.as_ref(),
                _ => None,
            }
        }

        /// Mutable child list. A statement at-rule gains an empty block on first use.
        pub fn children_mut(&mut self) -> Option<&mut Vec<NodeRef>> {
            match self {
                Node::Root(root) => Some(&mut root.children),
                Node::Rule(rule) => Some(&mut rule.children),
                Node::AtRule(at_rule) => Some(at_rule.children.get_or_insert_with(Vec::new)),
                _ => None,
            }
        }

        /// Only rules and at-rules track their container.
        pub fn parent(&self) -> Option<&WeakNodeRef> {
            match self {
                Node::Rule(rule) => rule.parent.as_ref(),
                Node::AtRule(at_rule) => at_rule.parent.as_ref(),
                _ => None,
            }
        }

        fn set_parent(&mut self, parent: Option<WeakNodeRef>) {
            match self {
                Node::Rule(rule) => rule.parent = parent,
                Node::AtRule(at_rule) => at_rule.parent = parent,
                _ => {}
            }
        }
    }

    impl Document {
        pub fn new() -> Self {
            Document {
                root: Rc::new(RefCell::new(Node::Root(RootNode::default()))),
            }
        }

        /// Append a top-level node and hand it back.
        pub fn append(&self, child: NodeRef) -> Result<NodeRef, NestingError> {
            append_child(&self.root, child)
        }

        /// The current top-level nodes.
        pub fn children(&self) -> Vec<NodeRef> {
            children_of(&self.root)
        }
    }

    impl Default for Document {
        fn default() -> Self {
            Document::new()
        }
    }

    impl fmt::Display for Document {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&crate::parser::serialize::to_css(self))
        }
    }

    impl fmt::Display for Node {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&crate::parser::serialize::node_to_css(self))
        }
    }

    /// Create a rule from a selector list such as "a, b:hover".
    pub fn new_rule(selector: &str) -> NodeRef {
        new_rule_with(split_selector_list(selector))
    }

    pub fn new_rule_with(selectors: Vec<String>) -> NodeRef {
        Rc::new(RefCell::new(Node::Rule(RuleNode::new(selectors))))
    }

    /// Create a block at-rule (`@media screen { }`). `name` is given without the `@`.
    pub fn new_at_rule(name: &str, params: &str) -> NodeRef {
        Rc::new(RefCell::new(Node::AtRule(AtRuleNode::new(
            name.to_string(),
            params.to_string(),
        ))))
    }

    /// Create a statement at-rule (`@import "a.css";`).
    pub fn new_statement_at_rule(name: &str, params: &str) -> NodeRef {
        Rc::new(RefCell::new(Node::AtRule(AtRuleNode {
            name: name.to_string(),
            params: params.to_string(),
            children: None,
            parent: None,
        })))
    }

    pub fn new_declaration(property: &str, value: &str) -> NodeRef {
        Rc::new(RefCell::new(Node::Declaration(DeclarationNode {
            property: property.to_string(),
            value: value.to_string(),
            important: false,
        })))
    }

    pub fn new_comment(text: &str) -> NodeRef {
        Rc::new(RefCell::new(Node::Comment(text.to_string())))
    }

    pub fn new_raw(text: &str) -> NodeRef {
        Rc::new(RefCell::new(Node::Raw(text.to_string())))
    }

    pub fn is_rule(node: &NodeRef) -> bool {
        node.borrow().is_rule()
    }

    pub fn parent_of(node: &NodeRef) -> Option<NodeRef> {
        node.borrow().parent().and_then(|weak| weak.upgrade())
    }

    /// A copy of the node's child list; empty for leaves.
    pub fn children_of(node: &NodeRef) -> Vec<NodeRef> {
        node.borrow().children().cloned().unwrap_or_default()
    }

    fn position_of(children: &[NodeRef], child: &NodeRef) -> Option<usize> {
        children.iter().position(|c| Rc::ptr_eq(c, child))
    }

    /// Remove `child` from `container`'s child list. Returns false if it was not there.
    pub fn remove_child(container: &NodeRef, child: &NodeRef) -> bool {
        let removed = {
            let mut container_mut = container.borrow_mut();
            match container_mut.children_mut() {
                Some(children) => match position_of(children, child) {
                    Some(index) => {
                        children.remove(index);
                        true
                    }
                    None => false,
                },
                None => false,
            }
        };
        if removed {
            child.borrow_mut().set_parent(None);
        }
        removed
    }

    /// Take a rule or at-rule out of its container. Leaves do not know their
    /// container; use `remove_child` for those.
    pub fn detach(node: &NodeRef) -> bool {
        match parent_of(node) {
            Some(parent) => remove_child(&parent, node),
            None => {
                node.borrow_mut().set_parent(None);
                false
            }
        }
    }

    pub fn append_child(parent: &NodeRef, child: NodeRef) -> Result<NodeRef, NestingError> {
        insert_child(parent, child, |children| children.len())
    }

    pub fn prepend_child(parent: &NodeRef, child: NodeRef) -> Result<NodeRef, NestingError> {
        insert_child(parent, child, |_| 0)
    }

    fn insert_child(
        parent: &NodeRef,
        child: NodeRef,
        index: impl FnOnce(&[NodeRef]) -> usize,
    ) -> Result<NodeRef, NestingError> {
        let accepts = matches!(
            *parent.borrow(),
            Node::Root(_) | Node::Rule(_) | Node::AtRule(_)
        );
        if !accepts {
            return Err(NestingError::NotAContainer(parent.borrow().kind_name()));
        }
        detach(&child);
        {
            let mut parent_mut = parent.borrow_mut();
            if let Some(children) = parent_mut.children_mut() {
                let at = index(children);
                children.insert(at, Rc::clone(&child));
            }
        }
        child.borrow_mut().set_parent(Some(Rc::downgrade(parent)));
        Ok(child)
    }

    /// Move `node` so it directly follows `anchor` in `anchor`'s container.
    /// `anchor` must be a rule or at-rule; a leaf `node` must already be out of
    /// its old container.
    pub fn insert_after(anchor: &NodeRef, node: &NodeRef) -> Result<(), NestingError> {
        if Rc::ptr_eq(anchor, node) {
            return Ok(());
        }
        detach(node);
        let parent = parent_of(anchor).ok_or(NestingError::Detached)?;
        {
            let mut parent_mut = parent.borrow_mut();
            let children = parent_mut
                .children_mut()
                .ok_or(NestingError::Detached)?;
            let index = position_of(children, anchor).ok_or(NestingError::Detached)?;
            children.insert(index + 1, Rc::clone(node));
        }
        node.borrow_mut().set_parent(Some(Rc::downgrade(&parent)));
        Ok(())
    }

    /// True if following parent links from `node` reaches a root.
    ///
    /// The parent link is authoritative: `remove_child` and `detach` clear it,
    /// so this costs one step per level and never scans a child list. Editing
    /// `children_mut()` directly bypasses that bookkeeping.
    pub fn is_attached(node: &NodeRef) -> bool {
        let mut current = Rc::clone(node);
        loop {
            if matches!(*current.borrow(), Node::Root(_)) {
                return true;
            }
            current = match parent_of(&current) {
                Some(parent) => parent,
                None => return false,
            };
        }
    }

    /// True if some container above `node` (before reaching the root) is a rule.
    pub fn has_rule_ancestor(node: &NodeRef) -> bool {
        let mut current = parent_of(node);
        while let Some(parent) = current {
            if parent.borrow().is_rule() {
                return true;
            }
            current = parent_of(&parent);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::style_tree::*;
    use std::rc::Rc;

    #[test]
    fn test_append_sets_parent() {
        let doc = Document::new();
        let a = doc.append(new_rule("a")).unwrap();
        let b = append_child(&a, new_rule("b")).unwrap();

        assert!(Rc::ptr_eq(&parent_of(&b).unwrap(), &a));
        assert!(Rc::ptr_eq(&parent_of(&a).unwrap(), &doc.root));
        assert!(is_attached(&b));
        assert!(has_rule_ancestor(&b));
        assert!(!has_rule_ancestor(&a));
    }

    #[test]
    fn test_declaration_cannot_hold_children() {
        let decl = new_declaration("color", "red");
        let err = append_child(&decl, new_rule("a")).unwrap_err();
        assert_eq!(err, crate::error::NestingError::NotAContainer("declaration"));
    }

    #[test]
    fn test_statement_at_rule_gains_block() {
        let import = new_statement_at_rule("import", "\"a.css\"");
        assert!(import.borrow().children().is_none());
        append_child(&import, new_declaration("color", "red")).unwrap();
        assert_eq!(children_of(&import).len(), 1);
    }

    #[test]
    fn test_insert_after_moves_node() {
        let doc = Document::new();
        let a = doc.append(new_rule("a")).unwrap();
        let c = doc.append(new_rule("c")).unwrap();
        let b = append_child(&a, new_rule("b")).unwrap();

        insert_after(&a, &b).unwrap();

        let top: Vec<String> = doc
            .children()
            .iter()
            .map(|n| n.borrow().as_rule().unwrap().selector_text())
            .collect();
        assert_eq!(top, vec!["a", "b", "c"]);
        assert!(children_of(&a).is_empty());
        assert!(Rc::ptr_eq(&parent_of(&b).unwrap(), &doc.root));
        assert!(Rc::ptr_eq(&doc.children()[2], &c));
    }

    #[test]
    fn test_insert_after_detached_anchor() {
        let a = new_rule("a");
        let b = new_rule("b");
        assert_eq!(insert_after(&a, &b), Err(crate::error::NestingError::Detached));
    }

    #[test]
    fn test_detached_subtree_is_not_attached() {
        let doc = Document::new();
        let a = doc.append(new_rule("a")).unwrap();
        let b = append_child(&a, new_rule("b")).unwrap();

        assert!(detach(&a));
        assert!(!is_attached(&a));
        // b still points at a, but a no longer reaches the root
        assert!(!is_attached(&b));
        assert!(doc.children().is_empty());
    }

    #[test]
    fn test_removed_node_loses_parent_link() {
        let doc = Document::new();
        let a = doc.append(new_rule("a")).unwrap();
        let b = append_child(&a, new_rule("b")).unwrap();
        let c = append_child(&b, new_rule("c")).unwrap();

        assert!(remove_child(&a, &b));
        assert!(parent_of(&b).is_none());
        assert!(!is_attached(&b));
        // c keeps its link to b, which no longer reaches the root
        assert!(parent_of(&c).is_some());
        assert!(!is_attached(&c));

        // moving b back under the root re-attaches the whole subtree
        doc.append(Rc::clone(&b)).unwrap();
        assert!(is_attached(&c));
    }
}
