//! Prints a style tree back to CSS text.
//!
//! Output is indented by two spaces per level, one declaration per line.

use crate::sheet::style_tree::{Document, Node, NodeRef};

/// Serialize the whole document.
pub fn to_css(document: &Document) -> String {
    let mut out = String::new();
    write_node(&document.root.borrow(), 0, &mut out);
    out
}

/// Serialize a single node and its descendants.
pub fn node_to_css(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, 0, &mut out);
    out
}

/// Recursively writes a node.
///
/// # Arguments
///
/// * `node` - The node to print.
/// * `indent` - The current nesting depth.
/// * `out` - Where the text goes.
fn write_node(node: &Node, indent: usize, out: &mut String) {
    let indentation = "  ".repeat(indent);
    match node {
        Node::Root(root) => {
            for child in &root.children {
                write_node(&child.borrow(), indent, out);
            }
        }
        Node::Rule(rule) => {
            write_block(&indentation, &rule.selector_text(), Some(&rule.children), indent, out);
        }
        Node::AtRule(at_rule) => {
            let mut header = format!("@{}", at_rule.name);
            if !at_rule.params.is_empty() {
                header.push(' ');
                header.push_str(&at_rule.params);
            }
            write_block(&indentation, &header, at_rule.children.as_ref(), indent, out);
        }
        Node::Declaration(decl) => {
            out.push_str(&format!("{}{}: {}", indentation, decl.property, decl.value));
            if decl.important {
                out.push_str(" !important");
            }
            out.push_str(";\n");
        }
        Node::Comment(text) => {
            out.push_str(&format!("{}/* {} */\n", indentation, text.trim()));
        }
        Node::Raw(text) => {
            out.push_str(&format!("{}{}\n", indentation, text.trim()));
        }
    }
}

fn write_block(
    indentation: &str,
    header: &str,
    children: Option<&Vec<NodeRef>>,
    indent: usize,
    out: &mut String,
) {
    match children {
        None => out.push_str(&format!("{}{};\n", indentation, header)),
        Some(children) if children.is_empty() => {
            out.push_str(&format!("{}{} {{}}\n", indentation, header))
        }
        Some(children) => {
            out.push_str(&format!("{}{} {{\n", indentation, header));
            for child in children {
                write_node(&child.borrow(), indent + 1, out);
            }
            out.push_str(&format!("{}}}\n", indentation));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::style_tree::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_print_nested_tree() {
        let doc = Document::new();
        doc.append(new_statement_at_rule("import", "\"base.css\"")).unwrap();
        let a = doc.append(new_rule("a, b")).unwrap();
        append_child(&a, new_declaration("color", "red")).unwrap();
        append_child(&a, new_comment(" note ")).unwrap();
        let media = append_child(&a, new_at_rule("media", "print")).unwrap();
        append_child(&media, new_declaration("display", "none")).unwrap();
        doc.append(new_rule(".empty")).unwrap();
        doc.append(new_raw("@keyframes spin { to { rotate: 1turn } }")).unwrap();

        let expected = r#"@import "base.css";
a, b {
  color: red;
  /* note */
  @media print {
    display: none;
  }
}
.empty {}
@keyframes spin { to { rotate: 1turn } }
"#;
        assert_eq!(to_css(&doc), expected);
    }

    #[test]
    fn test_important_flag() {
        let decl = new_declaration("color", "red");
        if let Node::Declaration(d) = &mut *decl.borrow_mut() {
            d.important = true;
        }
        assert_eq!(decl.borrow().to_string(), "color: red !important;\n");
    }
}
