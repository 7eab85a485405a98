use std::ops::Range;

use crate::grammar::Patterns;

/// One recognized `const [value, setter] = origin(<literal>)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationMatch {
    pub value_name: String,
    pub setter_name: String,
    /// Literal text exactly as written in the source.
    pub default_literal: String,
    /// Whole declaration, from the `const`/`let` keyword to the closing paren.
    pub span: Range<usize>,
    /// The origin call only; the rewriter replaces this range.
    pub call_span: Range<usize>,
}

/// Scan `text` left to right for the declaration idiom.
///
/// Matches binding the same name twice are dropped and stay untouched.
pub fn find_declarations<'a>(
    text: &'a str,
    patterns: &'a Patterns,
) -> impl Iterator<Item = DeclarationMatch> + 'a {
    patterns
        .declaration()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let value = caps.name("value")?;
            let setter = caps.name("setter")?;
            let call = caps.name("call")?;
            let default = caps.name("default")?;
            if value.as_str() == setter.as_str() {
                return None;
            }
            Some(DeclarationMatch {
                value_name: value.as_str().to_string(),
                setter_name: setter.as_str().to_string(),
                default_literal: default.as_str().to_string(),
                span: whole.range(),
                call_span: call.range(),
            })
        })
}
