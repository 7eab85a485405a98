use crate::grammar::Patterns;
use crate::imports::{ensure_target_import, prune_origin_import};
use crate::matcher::{DeclarationMatch, find_declarations};

/// Outcome of running one file's text through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMigration {
    pub text: String,
    /// URL keys of the rewritten declarations, in source order.
    pub keys: Vec<String>,
    pub inserted_import: bool,
    pub pruned_import: bool,
    /// Some origin call survived (non-literal default, generic call, ...).
    pub origin_still_used: bool,
}

impl SourceMigration {
    fn unchanged(text: &str, origin_still_used: bool) -> Self {
        Self {
            text: text.to_string(),
            keys: Vec::new(),
            inserted_import: false,
            pruned_import: false,
            origin_still_used,
        }
    }
}

pub fn render_target_call(target_hook: &str, found: &DeclarationMatch) -> String {
    format!(
        "{target_hook}(\"{}\", {})",
        found.value_name, found.default_literal
    )
}

/// Replace each match's origin call with the target call. `matches` must be
/// ordered and non-overlapping, as produced by [`find_declarations`].
pub fn rewrite_declarations(text: &str, matches: &[DeclarationMatch], target_hook: &str) -> String {
    let mut out = String::with_capacity(text.len() + matches.len() * target_hook.len());
    let mut cursor = 0;
    for found in matches {
        out.push_str(&text[cursor..found.call_span.start]);
        out.push_str(&render_target_call(target_hook, found));
        cursor = found.call_span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Import-insert, match, rewrite, import-prune.
///
/// Text without an origin call, or without any matchable declaration, comes
/// back byte-for-byte.
pub fn migrate_source(text: &str, patterns: &Patterns) -> SourceMigration {
    if !patterns.origin_call().is_match(text) {
        return SourceMigration::unchanged(text, false);
    }
    if find_declarations(text, patterns).next().is_none() {
        return SourceMigration::unchanged(text, true);
    }

    let with_import = ensure_target_import(text, patterns);
    let inserted_import = with_import.as_ref() != text;

    let matches: Vec<DeclarationMatch> = find_declarations(&with_import, patterns).collect();
    let rewritten = rewrite_declarations(
        &with_import,
        &matches,
        &patterns.settings().target_hook,
    );

    let pruned = prune_origin_import(&rewritten, patterns);
    let pruned_import = pruned.as_ref() != rewritten;
    let text = pruned.into_owned();
    let origin_still_used = patterns.origin_call().is_match(&text);

    SourceMigration {
        keys: matches.into_iter().map(|found| found.value_name).collect(),
        text,
        inserted_import,
        pruned_import,
        origin_still_used,
    }
}
