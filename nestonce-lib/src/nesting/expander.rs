use log::trace;
use std::rc::Rc;

use crate::error::NestingError;
use crate::nesting::options::{NestingContext, NestingOptions, StalePolicy};
use crate::nesting::selector::{merge_selectors, split_selector_list};
use crate::sheet::style_tree::{
    append_child, children_of, detach, insert_after, is_attached, is_rule, new_rule_with,
    prepend_child, remove_child, Node, NodeRef,
};

/// Flattens the immediate nesting of a single rule.
///
/// An implementation may rewrite the rule, move its children next to it and
/// remove it. It is called once per rule that existed when the pass started and
/// must not rely on being called again for anything it creates.
pub trait RuleExpander {
    fn expand(&mut self, rule: &NodeRef, context: &NestingContext) -> Result<(), NestingError>;
}

impl<F> RuleExpander for F
where
    F: FnMut(&NodeRef, &NestingContext) -> Result<(), NestingError>,
{
    fn expand(&mut self, rule: &NodeRef, context: &NestingContext) -> Result<(), NestingError> {
        self(rule, context)
    }
}

/// The standard expander: nested rules get combined selectors and are moved
/// after their parent, bubbling at-rules carry a copy of the parent inside them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NestedRuleExpander;

enum ChildKind {
    Rule,
    AtRule(String),
    Movable,
    Comment,
}

impl ChildKind {
    fn of(node: &NodeRef) -> Self {
        match &*node.borrow() {
            Node::Rule(_) => ChildKind::Rule,
            Node::AtRule(at_rule) => ChildKind::AtRule(at_rule.name.clone()),
            Node::Declaration(_) | Node::Raw(_) => ChildKind::Movable,
            Node::Comment(_) | Node::Root(_) => ChildKind::Comment,
        }
    }
}

impl RuleExpander for NestedRuleExpander {
    fn expand(&mut self, rule: &NodeRef, context: &NestingContext) -> Result<(), NestingError> {
        let (selectors, children) = {
            let node = rule.borrow();
            match node.as_rule() {
                Some(r) => (r.selectors.clone(), r.children.clone()),
                None => return Err(NestingError::NotARule(node.kind_name())),
            }
        };
        // The controller filters detached rules unless told to dispatch them.
        if context.options.stale_policy == StalePolicy::Dispatch && !is_attached(rule) {
            trace!("`{}` is no longer in the tree, skipping", selectors.join(", "));
            return Ok(());
        }

        let options = &context.options;
        let mut after = Rc::clone(rule);
        let mut unwrapped = false;
        let mut copy_declarations = false;
        let mut pending: Vec<NodeRef> = Vec::new();

        for child in children {
            match ChildKind::of(&child) {
                ChildKind::Rule => {
                    after = pick_declarations(rule, &selectors, &mut pending, after)?;
                    unwrapped = true;
                    copy_declarations = true;
                    if let Some(nested) = child.borrow_mut().as_rule_mut() {
                        nested.selectors = merge_selectors(&selectors, &nested.selectors);
                    }
                    after = break_out(&child, after)?;
                }
                ChildKind::AtRule(name) if options.is_root_rule(&name) => {
                    after = pick_declarations(rule, &selectors, &mut pending, after)?;
                    unwrapped = true;
                    copy_declarations = true;
                    after = lift_root_rule(&child, &selectors, after, options)?;
                }
                ChildKind::AtRule(name) if options.bubbles(&name) => {
                    after = pick_declarations(rule, &selectors, &mut pending, after)?;
                    unwrapped = true;
                    copy_declarations = true;
                    bubble_at_rule(&child, &selectors, true, options)?;
                    after = break_out(&child, after)?;
                }
                ChildKind::AtRule(name) if options.unwraps(&name) => {
                    after = pick_declarations(rule, &selectors, &mut pending, after)?;
                    unwrapped = true;
                    copy_declarations = true;
                    after = break_out(&child, after)?;
                }
                ChildKind::AtRule(_) | ChildKind::Movable => {
                    // Anything after an unwrapped child has to move too, or it
                    // would end up before it in the output.
                    if copy_declarations {
                        pending.push(child);
                    }
                }
                ChildKind::Comment => {}
            }
        }
        pick_declarations(rule, &selectors, &mut pending, after)?;

        if unwrapped && !options.preserve_empty && children_of(rule).is_empty() {
            trace!("dropping emptied rule `{}`", selectors.join(", "));
            detach(rule);
        }
        Ok(())
    }
}

/// Move `child` right after `after` and make it the new anchor.
fn break_out(child: &NodeRef, after: NodeRef) -> Result<NodeRef, NestingError> {
    insert_after(&after, child)?;
    Ok(Rc::clone(child))
}

/// Move the collected nodes out of `rule` into a fresh rule with the same
/// selectors, placed after `after`.
fn pick_declarations(
    rule: &NodeRef,
    selectors: &[String],
    pending: &mut Vec<NodeRef>,
    after: NodeRef,
) -> Result<NodeRef, NestingError> {
    if pending.is_empty() {
        return Ok(after);
    }
    let copy = new_rule_with(selectors.to_vec());
    for node in pending.drain(..) {
        remove_child(rule, &node);
        append_child(&copy, node)?;
    }
    trace!("split off declarations of `{}`", selectors.join(", "));
    insert_after(&after, &copy)?;
    Ok(copy)
}

/// Prepare a bubbling at-rule for leaving `selectors`' rule: with `merge`,
/// rules inside get combined selectors; everything that is not a rule is
/// wrapped in a copy of the rule.
fn bubble_at_rule(
    at_rule: &NodeRef,
    selectors: &[String],
    merge: bool,
    options: &NestingOptions,
) -> Result<(), NestingError> {
    let mut leftovers = Vec::new();
    for child in children_of(at_rule) {
        if let Some(nested) = child.borrow_mut().as_rule_mut() {
            if merge {
                nested.selectors = merge_selectors(selectors, &nested.selectors);
            }
            continue;
        }
        if bubbling_block(&child, options) {
            bubble_at_rule(&child, selectors, merge, options)?;
        } else {
            leftovers.push(child);
        }
    }

    if !leftovers.is_empty() {
        let copy = new_rule_with(selectors.to_vec());
        for node in leftovers {
            remove_child(at_rule, &node);
            append_child(&copy, node)?;
        }
        prepend_child(at_rule, copy)?;
    }
    Ok(())
}

/// A block at-rule named in the bubble set.
fn bubbling_block(node: &NodeRef, options: &NestingOptions) -> bool {
    match &*node.borrow() {
        Node::AtRule(at_rule) => at_rule.children.is_some() && options.bubbles(&at_rule.name),
        _ => false,
    }
}

/// A block at-rule named in the unwrap set.
fn unwrapping_block(node: &NodeRef, options: &NestingOptions) -> bool {
    match &*node.borrow() {
        Node::AtRule(at_rule) => at_rule.children.is_some() && options.unwraps(&at_rule.name),
        _ => false,
    }
}

/// Lift the contents of an `@at-root` block out of the enclosing rule.
///
/// Rules inside keep their own selectors. With a selector prelude
/// (`@at-root .b { ... }`) the prelude takes the place of the parent.
/// Bubbling and unwrapping at-rules inside move out as well; only the
/// remaining children are wrapped in a rule.
fn lift_root_rule(
    at_root: &NodeRef,
    selectors: &[String],
    mut after: NodeRef,
    options: &NestingOptions,
) -> Result<NodeRef, NestingError> {
    let params = match &*at_root.borrow() {
        Node::AtRule(at_rule) => at_rule.params.trim().to_string(),
        _ => String::new(),
    };
    let prelude = if params.is_empty() || params.starts_with('(') {
        None
    } else {
        Some(split_selector_list(&params))
    };

    let (lifted, leftovers): (Vec<NodeRef>, Vec<NodeRef>) = children_of(at_root)
        .into_iter()
        .partition(|child| {
            is_rule(child) || bubbling_block(child, options) || unwrapping_block(child, options)
        });

    if !leftovers.is_empty() {
        let holder_selectors = prelude.clone().unwrap_or_else(|| selectors.to_vec());
        let holder = new_rule_with(holder_selectors);
        for node in leftovers {
            remove_child(at_root, &node);
            append_child(&holder, node)?;
        }
        insert_after(&after, &holder)?;
        after = holder;
    }
    for child in lifted {
        if bubbling_block(&child, options) {
            match &prelude {
                Some(prelude) => bubble_at_rule(&child, prelude, true, options)?,
                None => bubble_at_rule(&child, selectors, false, options)?,
            }
        } else if let Some(prelude) = &prelude {
            if let Some(nested) = child.borrow_mut().as_rule_mut() {
                nested.selectors = merge_selectors(prelude, &nested.selectors);
            }
        }
        after = break_out(&child, after)?;
    }
    detach(at_root);
    Ok(after)
}
