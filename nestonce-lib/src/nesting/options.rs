use std::path::PathBuf;

/// At-rules that move out of a rule and take a copy of the rule inside them.
pub const DEFAULT_BUBBLE: &[&str] = &["container", "media", "supports", "layer", "starting-style"];

/// At-rules that move out of a rule unchanged.
pub const DEFAULT_UNWRAP: &[&str] = &[
    "document",
    "font-face",
    "keyframes",
    "-webkit-keyframes",
    "-moz-keyframes",
];

pub const DEFAULT_ROOT_RULE_NAME: &str = "at-root";

/// What the pass does with a rule that was enumerated but is no longer in the
/// tree when its turn comes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Check attachment before dispatch and skip detached rules.
    #[default]
    Skip,
    /// Always dispatch; the expander decides what a detached rule means.
    Dispatch,
}

/// Flattening options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingOptions {
    /// Keep rules that flattening left without any children.
    pub preserve_empty: bool,
    /// Names (without `@`) of at-rules that bubble.
    pub bubble: Vec<String>,
    /// Names (without `@`) of at-rules that are lifted unchanged.
    pub unwrap: Vec<String>,
    /// Name of the at-rule whose contents escape the enclosing selector.
    pub root_rule_name: String,
    pub stale_policy: StalePolicy,
}

impl Default for NestingOptions {
    fn default() -> Self {
        NestingOptions {
            preserve_empty: false,
            bubble: DEFAULT_BUBBLE.iter().map(|s| s.to_string()).collect(),
            unwrap: DEFAULT_UNWRAP.iter().map(|s| s.to_string()).collect(),
            root_rule_name: DEFAULT_ROOT_RULE_NAME.to_string(),
            stale_policy: StalePolicy::default(),
        }
    }
}

fn at_rule_name(name: &str) -> String {
    name.trim().trim_start_matches('@').to_string()
}

impl NestingOptions {
    pub fn with_preserve_empty(mut self, preserve_empty: bool) -> Self {
        self.preserve_empty = preserve_empty;
        self
    }

    /// Add an at-rule name to the bubbling set. A leading `@` is accepted.
    pub fn with_bubble(mut self, name: &str) -> Self {
        let name = at_rule_name(name);
        if !self.bubble.contains(&name) {
            self.bubble.push(name);
        }
        self
    }

    /// Add an at-rule name to the unwrap set. A leading `@` is accepted.
    pub fn with_unwrap(mut self, name: &str) -> Self {
        let name = at_rule_name(name);
        if !self.unwrap.contains(&name) {
            self.unwrap.push(name);
        }
        self
    }

    pub fn with_root_rule_name(mut self, name: &str) -> Self {
        self.root_rule_name = at_rule_name(name);
        self
    }

    pub fn with_stale_policy(mut self, stale_policy: StalePolicy) -> Self {
        self.stale_policy = stale_policy;
        self
    }

    pub fn bubbles(&self, name: &str) -> bool {
        self.bubble.iter().any(|b| b.eq_ignore_ascii_case(name))
    }

    pub fn unwraps(&self, name: &str) -> bool {
        self.unwrap.iter().any(|u| u.eq_ignore_ascii_case(name))
    }

    pub fn is_root_rule(&self, name: &str) -> bool {
        self.root_rule_name.eq_ignore_ascii_case(name)
    }
}

/// Per-pass environment handed unchanged to every expander call.
#[derive(Debug, Clone, Default)]
pub struct NestingContext {
    pub options: NestingOptions,
    /// Path of the sheet being processed, if it came from a file.
    pub source: Option<PathBuf>,
}

impl NestingContext {
    pub fn new(options: NestingOptions) -> Self {
        NestingContext {
            options,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}
