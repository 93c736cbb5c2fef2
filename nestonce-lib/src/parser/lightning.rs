//! Builds a style tree from CSS text with LightningCSS.
//!
//! Style rules (including nested ones) and the grouping at-rules that can hold
//! them (`@media`, `@supports`, `@container`, `@layer` blocks and
//! `@starting-style`) become tree nodes. Every other rule is kept as
//! pre-printed text.

use crate::error::NestingError;
use crate::sheet::style_tree::{
    append_child, new_at_rule, new_raw, new_rule_with, Document, DeclarationNode, Node, NodeRef,
};
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::rules::{style::StyleRule, CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserFlags, ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use std::cell::RefCell;
use std::rc::Rc;

/// Parse CSS (nesting syntax allowed) into a new document.
///
/// # Arguments
///
/// * `css_text` - The stylesheet source.
/// * `filename` - Used in parse error messages.
pub fn parse_document(css_text: &str, filename: Option<&str>) -> Result<Document, NestingError> {
    let parser_opts = ParserOptions {
        filename: filename.unwrap_or_default().to_string(),
        flags: ParserFlags::NESTING,
        ..ParserOptions::default()
    };

    let sheet = LightningStyleSheet::parse(css_text, parser_opts)
        .map_err(|e| NestingError::Parse(e.to_string()))?;

    let document = Document::new();
    convert_rules(&sheet.rules, &document.root)?;
    Ok(document)
}

fn print<T: ToCss>(value: &T) -> Result<String, NestingError> {
    value
        .to_css_string(PrinterOptions::default())
        .map_err(|e| NestingError::Print(e.to_string()))
}

/// Append a node for each rule in `rules` to `parent`.
fn convert_rules(rules: &CssRuleList<'_>, parent: &NodeRef) -> Result<(), NestingError> {
    for rule in &rules.0 {
        let node = match rule {
            CssRule::Style(style_rule) => convert_style_rule(style_rule)?,
            CssRule::Media(media_rule) => {
                let node = new_at_rule("media", &print(&media_rule.query)?);
                convert_rules(&media_rule.rules, &node)?;
                node
            }
            CssRule::Supports(supports_rule) => {
                let node = new_at_rule("supports", &print(&supports_rule.condition)?);
                convert_rules(&supports_rule.rules, &node)?;
                node
            }
            CssRule::Container(container_rule) => {
                let mut params = String::new();
                if let Some(name) = &container_rule.name {
                    params.push_str(&print(name)?);
                    params.push(' ');
                }
                params.push_str(&print(&container_rule.condition)?);
                let node = new_at_rule("container", &params);
                convert_rules(&container_rule.rules, &node)?;
                node
            }
            CssRule::LayerBlock(layer_rule) => {
                let name = match &layer_rule.name {
                    Some(name) => print(name)?,
                    None => String::new(),
                };
                let node = new_at_rule("layer", &name);
                convert_rules(&layer_rule.rules, &node)?;
                node
            }
            CssRule::StartingStyle(starting_rule) => {
                let node = new_at_rule("starting-style", "");
                convert_rules(&starting_rule.rules, &node)?;
                node
            }
            other => new_raw(&print(other)?),
        };
        append_child(parent, node)?;
    }
    Ok(())
}

/// Copy a single StyleRule's selectors, declarations and nested rules.
fn convert_style_rule(style_rule: &StyleRule<'_>) -> Result<NodeRef, NestingError> {
    let mut selectors = Vec::new();
    for selector in &style_rule.selectors.0 {
        selectors.push(print(selector)?);
    }
    let node = new_rule_with(selectors);

    // Normal declarations first, then the !important ones.
    let block = &style_rule.declarations;
    for property in &block.declarations {
        append_child(&node, convert_property(property, false)?)?;
    }
    for property in &block.important_declarations {
        append_child(&node, convert_property(property, true)?)?;
    }

    convert_rules(&style_rule.rules, &node)?;
    Ok(node)
}

fn convert_property(property: &Property<'_>, important: bool) -> Result<NodeRef, NestingError> {
    let value = property
        .value_to_css_string(PrinterOptions::default())
        .map_err(|e| NestingError::Print(e.to_string()))?;
    Ok(Rc::new(RefCell::new(Node::Declaration(DeclarationNode {
        property: property.property_id().name().to_string(),
        value,
        important,
    }))))
}
