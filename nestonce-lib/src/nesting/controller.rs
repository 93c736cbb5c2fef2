use log::{debug, trace};

use crate::error::NestingError;
use crate::nesting::expander::RuleExpander;
use crate::nesting::options::{NestingContext, StalePolicy};
use crate::nesting::snapshot::RuleSnapshot;
use crate::sheet::style_tree::{is_attached, Document};

/// Counters for one pass over a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Rules present when the pass started.
    pub enumerated: usize,
    /// Expander calls made.
    pub dispatched: usize,
    /// Entries no longer in the tree when their turn came.
    pub skipped: usize,
}

/// Flatten `document` in place, calling `expander` once for each rule that
/// existed when the pass started.
///
/// The rule list is captured before the first call, in document order with
/// parents ahead of their nested rules. Rules the expander creates are never
/// handed back to it during this pass. An expander error stops the pass and is
/// returned as-is; whatever was already rewritten stays rewritten.
///
/// # Arguments
///
/// * `document` - The sheet to flatten.
/// * `context` - Options and source information passed through to every call.
/// * `expander` - Flattens one rule's immediate nesting.
pub fn run<E>(
    document: &Document,
    context: &NestingContext,
    expander: &mut E,
) -> Result<PassStats, NestingError>
where
    E: RuleExpander + ?Sized,
{
    let snapshot = RuleSnapshot::capture(document);
    let mut stats = PassStats {
        enumerated: snapshot.len(),
        ..PassStats::default()
    };
    debug!("flattening {} rules", stats.enumerated);

    for rule in &snapshot {
        if context.options.stale_policy == StalePolicy::Skip && !is_attached(rule) {
            debug!("skipping rule removed earlier in the pass");
            stats.skipped += 1;
            continue;
        }
        if let Some(r) = rule.borrow().as_rule() {
            trace!("expanding `{}`", r.selector_text());
        }
        expander.expand(rule, context)?;
        stats.dispatched += 1;
    }

    debug!(
        "flattening done: {} dispatched, {} skipped",
        stats.dispatched, stats.skipped
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nesting::expander::NestedRuleExpander;
    use crate::nesting::options::NestingOptions;
    use crate::sheet::style_tree::*;
    use std::rc::Rc;

    /// Wraps the standard expander and records every rule it is handed.
    struct Recording {
        seen: Vec<NodeRef>,
    }

    impl RuleExpander for Recording {
        fn expand(&mut self, rule: &NodeRef, context: &NestingContext) -> Result<(), NestingError> {
            self.seen.push(Rc::clone(rule));
            NestedRuleExpander.expand(rule, context)
        }
    }

    fn nested_x_y_z() -> Document {
        // x { color: red; y { color: blue; } z { color: green; } }
        let doc = Document::new();
        let x = doc.append(new_rule("x")).unwrap();
        append_child(&x, new_declaration("color", "red")).unwrap();
        let y = append_child(&x, new_rule("y")).unwrap();
        append_child(&y, new_declaration("color", "blue")).unwrap();
        let z = append_child(&x, new_rule("z")).unwrap();
        append_child(&z, new_declaration("color", "green")).unwrap();
        doc
    }

    #[test]
    fn test_each_original_rule_expanded_once() {
        let doc = nested_x_y_z();
        let original = RuleSnapshot::capture(&doc);
        let mut recording = Recording { seen: Vec::new() };

        let stats = run(&doc, &NestingContext::default(), &mut recording).unwrap();

        assert_eq!(stats.enumerated, 3);
        assert_eq!(stats.dispatched, 3);
        assert_eq!(recording.seen.len(), 3);
        for (seen, expected) in recording.seen.iter().zip(original.iter()) {
            assert!(Rc::ptr_eq(seen, expected));
        }
    }

    #[test]
    fn test_created_rules_are_never_dispatched() {
        // Declarations after a nested rule are split off into a new rule.
        let doc = Document::new();
        let a = doc.append(new_rule("a")).unwrap();
        let b = append_child(&a, new_rule("b")).unwrap();
        append_child(&b, new_rule("c")).unwrap();
        append_child(&b, new_declaration("margin", "0")).unwrap();
        append_child(&a, new_declaration("color", "red")).unwrap();

        let original = RuleSnapshot::capture(&doc);
        let mut recording = Recording { seen: Vec::new() };
        let context = NestingContext::new(NestingOptions::default().with_preserve_empty(true));
        run(&doc, &context, &mut recording).unwrap();

        assert_eq!(recording.seen.len(), original.len());
        assert!(recording.seen.iter().all(|rule| original.contains(rule)));
        // a and b were split, so more rules exist than were dispatched
        assert!(RuleSnapshot::capture(&doc).len() > original.len());
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let doc = nested_x_y_z();
        let context = NestingContext::default();
        run(&doc, &context, &mut NestedRuleExpander).unwrap();
        let first = doc.to_string();

        let mut calls = 0;
        let mut counting = |_: &NodeRef, _: &NestingContext| -> Result<(), NestingError> {
            calls += 1;
            Ok(())
        };
        let stats = run(&doc, &context, &mut counting).unwrap();
        // Nothing nested is left, so the standard expander has nothing to do either.
        run(&doc, &context, &mut NestedRuleExpander).unwrap();

        assert_eq!(calls, 3);
        assert_eq!(stats.dispatched, 3);
        assert_eq!(doc.to_string(), first);
    }

    #[test]
    fn test_expander_error_aborts_pass() {
        let doc = nested_x_y_z();
        let mut calls = 0;
        let mut failing = |rule: &NodeRef, context: &NestingContext| {
            calls += 1;
            if calls == 2 {
                return Err(NestingError::Print("boom".to_string()));
            }
            NestedRuleExpander.expand(rule, context)
        };

        let err = run(&doc, &NestingContext::default(), &mut failing).unwrap_err();

        assert_eq!(err, NestingError::Print("boom".to_string()));
        assert_eq!(calls, 2);
        // x was already flattened and stays that way
        let top: Vec<String> = doc
            .children()
            .iter()
            .map(|n| n.borrow().as_rule().unwrap().selector_text())
            .collect();
        assert_eq!(top, vec!["x", "x y", "x z"]);
    }

    /// Removes `b` from the tree while expanding `a`, before `b` is reached.
    fn remove_b_while_expanding_a(
        b: NodeRef,
    ) -> impl FnMut(&NodeRef, &NestingContext) -> Result<(), NestingError> {
        move |rule: &NodeRef, _: &NestingContext| {
            let is_a = rule.borrow().as_rule().is_some_and(|r| r.selector_text() == "a");
            if is_a {
                detach(&b);
            }
            Ok(())
        }
    }

    fn a_then_b() -> (Document, NodeRef) {
        let doc = Document::new();
        doc.append(new_rule("a")).unwrap();
        let b = doc.append(new_rule("b")).unwrap();
        (doc, b)
    }

    #[test]
    fn test_stale_entry_skipped_by_default() {
        let (doc, b) = a_then_b();
        let mut seen = Vec::new();
        let mut inner = remove_b_while_expanding_a(Rc::clone(&b));
        let mut expander = |rule: &NodeRef, context: &NestingContext| {
            seen.push(rule.borrow().as_rule().unwrap().selector_text());
            inner(rule, context)
        };

        let stats = run(&doc, &NestingContext::default(), &mut expander).unwrap();

        assert_eq!(seen, vec!["a"]);
        assert_eq!(
            stats,
            PassStats {
                enumerated: 2,
                dispatched: 1,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_stale_entry_dispatched_when_configured() {
        let (doc, b) = a_then_b();
        append_child(&b, new_rule("c")).unwrap();
        let context = NestingContext::new(
            NestingOptions::default().with_stale_policy(StalePolicy::Dispatch),
        );
        let mut seen = Vec::new();
        let mut remove = remove_b_while_expanding_a(Rc::clone(&b));
        let mut expander = |rule: &NodeRef, context: &NestingContext| {
            seen.push(rule.borrow().as_rule().unwrap().selector_text());
            remove(rule, context)?;
            NestedRuleExpander.expand(rule, context)
        };

        let stats = run(&doc, &context, &mut expander).unwrap();

        // b and its child c are still handed over; the standard expander
        // leaves the detached subtree alone.
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(stats.skipped, 0);
        assert_eq!(children_of(&b).len(), 1);
        assert_eq!(doc.children().len(), 1);
    }

    #[test]
    fn test_rules_inside_at_rules_are_flattened() {
        // @media print { a { b { color: red; } } }
        let doc = Document::new();
        let media = doc.append(new_at_rule("media", "print")).unwrap();
        let a = append_child(&media, new_rule("a")).unwrap();
        let b = append_child(&a, new_rule("b")).unwrap();
        append_child(&b, new_declaration("color", "red")).unwrap();

        let stats = run(&doc, &NestingContext::default(), &mut NestedRuleExpander).unwrap();

        assert_eq!(stats.dispatched, 2);
        let inside = children_of(&media);
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].borrow().as_rule().unwrap().selector_text(), "a b");
        assert!(RuleSnapshot::capture(&doc)
            .iter()
            .all(|rule| !has_rule_ancestor(rule)));
    }
}
