/// ------------------------------
/// 1. Selector list splitting
/// ------------------------------

/// Tracks whether the scanner is inside a string or an attribute selector,
/// where `,` and `&` are plain characters.
#[derive(Debug, Default)]
struct ScanState {
    quote: Option<char>,
    brackets: u32,
    parens: u32,
}

impl ScanState {
    /// Feed one character. Returns true if the character is significant
    /// selector syntax (outside strings and attribute brackets).
    fn step(&mut self, ch: char) -> bool {
        if let Some(q) = self.quote {
            if ch == q {
                self.quote = None;
            }
            return false;
        }
        match ch {
            '"' | '\'' => {
                self.quote = Some(ch);
                false
            }
            '[' => {
                self.brackets += 1;
                false
            }
            ']' => {
                self.brackets = self.brackets.saturating_sub(1);
                false
            }
            '(' => {
                self.parens += 1;
                self.brackets == 0
            }
            ')' => {
                self.parens = self.parens.saturating_sub(1);
                self.brackets == 0
            }
            _ => self.brackets == 0,
        }
    }
}

/// Split a selector list such as "a, b:is(.c, .d)" into its top-level members.
/// Empty members are dropped.
pub fn split_selector_list(list: &str) -> Vec<String> {
    let mut selectors = Vec::new();
    let mut state = ScanState::default();
    let mut buffer = String::new();

    for ch in list.chars() {
        let significant = state.step(ch);
        if significant && ch == ',' && state.parens == 0 {
            push_trimmed(&mut selectors, &buffer);
            buffer.clear();
        } else {
            buffer.push(ch);
        }
    }
    push_trimmed(&mut selectors, &buffer);
    selectors
}

fn push_trimmed(selectors: &mut Vec<String>, selector: &str) {
    let trimmed = selector.trim();
    if !trimmed.is_empty() {
        selectors.push(trimmed.to_string());
    }
}

/// ------------------------------
/// 2. Parent/child combination
/// ------------------------------

/// Replace every nesting selector (`&`) in `selector` with `parent`.
/// Returns `None` when the selector has no `&`.
pub fn replace_nesting(selector: &str, parent: &str) -> Option<String> {
    let mut state = ScanState::default();
    let mut out = String::with_capacity(selector.len() + parent.len());
    let mut replaced = false;

    for ch in selector.chars() {
        let significant = state.step(ch);
        if significant && ch == '&' {
            out.push_str(parent);
            replaced = true;
        } else {
            out.push(ch);
        }
    }
    replaced.then_some(out)
}

/// Combine a nested rule's selectors with its parent's.
///
/// Every parent selector is paired with every child selector, parent-major.
/// A child containing `&` has it substituted; any other child is joined to the
/// parent with a descendant combinator, so `> li` under `ul` gives `ul > li`.
pub fn merge_selectors(parents: &[String], children: &[String]) -> Vec<String> {
    let mut merged = Vec::with_capacity(parents.len() * children.len());
    for parent in parents {
        for child in children {
            let child = child.trim();
            if child.is_empty() {
                continue;
            }
            match replace_nesting(child, parent) {
                Some(selector) => merged.push(selector),
                None => merged.push(format!("{} {}", parent, child)),
            }
        }
    }
    merged
}
