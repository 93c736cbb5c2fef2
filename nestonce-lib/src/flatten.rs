use crate::error::NestingError;
use crate::nesting::{controller, NestedRuleExpander, NestingContext, PassStats};
use crate::parser::{lightning, serialize};
use crate::sheet::style_tree::Document;

pub mod nest_once {
    use super::*;

    /// Flatten a document in place with the standard expander.
    pub fn flatten_document(
        document: &Document,
        context: &NestingContext,
    ) -> Result<PassStats, NestingError> {
        controller::run(document, context, &mut NestedRuleExpander)
    }

    /// Parse CSS, flatten it and print the result.
    pub fn flatten_css(css_content: &str, context: &NestingContext) -> Result<String, NestingError> {
        let filename = context
            .source
            .as_ref()
            .map(|path| path.display().to_string());
        let document = lightning::parse_document(css_content, filename.as_deref())?;
        flatten_document(&document, context)?;
        Ok(serialize::to_css(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nesting::NestingOptions;

    #[test]
    fn test_flatten_css_snippet() {
        // 1) Some nested CSS
        let css_snippet = r#"
            .card { padding: 4px;
                .title { font-weight: bold; }
                &:hover { opacity: 0.5; }
            }
            p { margin: 0; }
        "#;

        // 2) Flatten it
        let output = nest_once::flatten_css(css_snippet, &NestingContext::default()).unwrap();

        // 3) Every rule is top-level now, in source order
        let headers: Vec<&str> = output
            .lines()
            .filter(|line| line.ends_with('{'))
            .collect();
        assert_eq!(
            headers,
            vec![".card {", ".card .title {", ".card:hover {", "p {"]
        );
    }

    #[test]
    fn test_flatten_css_reports_parse_errors() {
        let context = NestingContext::new(NestingOptions::default()).with_source("broken.css");
        let result = nest_once::flatten_css("a::: {}", &context);
        assert!(matches!(result, Err(NestingError::Parse(_))));
    }
}
