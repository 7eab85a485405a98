use std::borrow::Cow;
use std::ops::Range;

use crate::grammar::Patterns;

pub fn references_target(text: &str, patterns: &Patterns) -> bool {
    patterns.target_word().is_match(text)
}

/// Insert the target hook import unless the text already names the hook.
///
/// The line goes after the first framework import, else after a leading
/// directive prologue, else at the top of the file.
pub fn ensure_target_import<'a>(text: &'a str, patterns: &Patterns) -> Cow<'a, str> {
    if references_target(text, patterns) {
        return Cow::Borrowed(text);
    }

    let newline = line_ending(text);
    let line = patterns.target_import_line();
    let offset = insertion_offset(text, patterns);

    let mut out = String::with_capacity(text.len() + line.len() + newline.len() * 2);
    out.push_str(&text[..offset]);
    if offset > 0 && !text[..offset].ends_with('\n') {
        out.push_str(newline);
    }
    out.push_str(&line);
    out.push_str(newline);
    out.push_str(&text[offset..]);
    Cow::Owned(out)
}

/// Drop the origin hook from the framework's named import once nothing else
/// in the file refers to it.
pub fn prune_origin_import<'a>(text: &'a str, patterns: &Patterns) -> Cow<'a, str> {
    let origin = &patterns.settings().origin_hook;

    for caps in patterns.named_framework_import().captures_iter(text) {
        let (Some(statement), Some(list), Some(names)) =
            (caps.get(0), caps.name("list"), caps.name("names"))
        else {
            continue;
        };
        let Some(remaining) = remove_named_entry(names.as_str(), origin) else {
            continue;
        };
        if origin_used_outside(text, statement.range(), patterns) {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len());
        if !remaining.trim().is_empty() {
            out.push_str(&text[..names.start()]);
            out.push_str(&remaining);
            out.push_str(&text[names.end()..]);
        } else if let Some(default) = caps.name("default") {
            // `import React, { useState } from "react"` -> `import React from "react"`
            out.push_str(&text[..default.end()]);
            let rest = &text[list.end()..];
            if !rest.starts_with(char::is_whitespace) {
                out.push(' ');
            }
            out.push_str(rest);
        } else {
            let removal = statement_removal_range(text, statement.range());
            out.push_str(&text[..removal.start]);
            out.push_str(&text[removal.end..]);
        }
        return Cow::Owned(out);
    }

    Cow::Borrowed(text)
}

fn insertion_offset(text: &str, patterns: &Patterns) -> usize {
    if let Some(found) = patterns.framework_import().find(text) {
        return end_of_line(text, found.end());
    }
    if let Some(found) = patterns.directive_prologue().find(text) {
        return found.end();
    }
    0
}

fn origin_used_outside(text: &str, statement: Range<usize>, patterns: &Patterns) -> bool {
    patterns
        .origin_word()
        .find_iter(text)
        .any(|found| found.start() < statement.start || found.start() >= statement.end)
}

/// Remove `origin` from a comma-separated named-import list, keeping the
/// layout of the other entries. `None` when the list has no such entry.
fn remove_named_entry(names: &str, origin: &str) -> Option<String> {
    let mut segments: Vec<Range<usize>> = Vec::new();
    let mut start = 0;
    for (index, ch) in names.char_indices() {
        if ch == ',' {
            segments.push(start..index);
            start = index + 1;
        }
    }
    segments.push(start..names.len());

    let position = segments
        .iter()
        .position(|segment| names[segment.clone()].trim() == origin)?;
    let current = segments[position].clone();
    let current_text = &names[current.clone()];
    let leading = leading_whitespace(current_text);

    let removal = if let Some(next) = segments.get(position + 1) {
        current.start + leading..next.start + leading_whitespace(&names[next.clone()])
    } else if position > 0 {
        // last entry: take the comma before it, keep the whitespace after it
        current.start - 1..current.start + leading + current_text.trim().len()
    } else {
        return Some(String::new());
    };

    let mut out = String::with_capacity(names.len());
    out.push_str(&names[..removal.start]);
    out.push_str(&names[removal.end..]);
    Some(out)
}

fn statement_removal_range(text: &str, statement: Range<usize>) -> Range<usize> {
    let rest = &text[statement.end..];
    let line_rest = rest.split('\n').next().unwrap_or("");
    if line_rest.trim().is_empty() {
        let end = (statement.end + line_rest.len() + 1).min(text.len());
        statement.start..end
    } else {
        statement
    }
}

fn end_of_line(text: &str, offset: usize) -> usize {
    match text[offset..].find('\n') {
        Some(index) => offset + index + 1,
        None => text.len(),
    }
}

fn leading_whitespace(value: &str) -> usize {
    value.len() - value.trim_start().len()
}

fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}
