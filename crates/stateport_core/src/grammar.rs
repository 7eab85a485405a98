use anyhow::{Context, Result};
use regex::Regex;

use crate::config::MigrationSettings;

/// Numeric default literal: `1`, `1_000`, `2.50`, `.25`, `1e-3`, `1_000.50E3`.
///
/// Hexadecimal, binary, signed values, `NaN` and `Infinity` are not accepted.
pub const NUMERIC_LITERAL: &str = r"(?:\d[\d_]*(?:\.\d[\d_]*)?|\.\d[\d_]+)(?:[eE][+-]?\d+)?";

/// Binding names on the left-hand side of the destructuring.
pub const IDENTIFIER: &str = r"[A-Za-z_$][A-Za-z0-9_$]*";

#[derive(Debug, Clone)]
pub struct Patterns {
    settings: MigrationSettings,
    declaration: Regex,
    origin_call: Regex,
    origin_word: Regex,
    target_word: Regex,
    framework_import: Regex,
    named_framework_import: Regex,
    directive_prologue: Regex,
}

impl Patterns {
    pub fn new(settings: MigrationSettings) -> Result<Self> {
        settings.validate()?;
        let origin = regex::escape(&settings.origin_hook);
        let target = regex::escape(&settings.target_hook);
        let framework = regex::escape(&settings.framework_module);

        let declaration = compile(&format!(
            r"\b(?:const|let)\s+\[\s*(?P<value>{IDENTIFIER})\s*,\s*(?P<setter>{IDENTIFIER})\s*\]\s*=\s*(?P<call>{origin}\s*\(\s*(?P<default>{NUMERIC_LITERAL})\s*\))"
        ))?;
        let origin_call = compile(&format!(r"\b{origin}\s*\("))?;
        let origin_word = compile(&format!(r"\b{origin}\b"))?;
        let target_word = compile(&format!(r"\b{target}\b"))?;
        let framework_import = compile(&format!(
            r#"(?m)^[ \t]*import\b[^;]*?\bfrom\s*["']{framework}["'][ \t]*;?"#
        ))?;
        let named_framework_import = compile(&format!(
            r#"(?m)^[ \t]*import\s+(?:(?P<default>{IDENTIFIER})\s*,\s*)?(?P<list>\{{(?P<names>[^{{}}]*)\}})\s*from\s*["']{framework}["'][ \t]*;?"#
        ))?;
        let directive_prologue = compile(concat!(
            // comment and blank lines ahead of the directives
            r"\A(?:[ \t]*(?://[^\n]*|/\*(?s:.*?)\*/)?[ \t]*\r?\n)*",
            r#"(?:[ \t]*(?:"use [A-Za-z ]+"|'use [A-Za-z ]+')[ \t]*;?[ \t]*(?:\r?\n|\z))+"#,
        ))?;

        Ok(Self {
            settings,
            declaration,
            origin_call,
            origin_word,
            target_word,
            framework_import,
            named_framework_import,
            directive_prologue,
        })
    }

    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    /// `const [value, setter] = origin(<literal>)`, capturing `value`,
    /// `setter`, `call` and `default`.
    pub fn declaration(&self) -> &Regex {
        &self.declaration
    }

    /// Any call of the origin hook, with or without a matchable default.
    pub fn origin_call(&self) -> &Regex {
        &self.origin_call
    }

    pub fn origin_word(&self) -> &Regex {
        &self.origin_word
    }

    pub fn target_word(&self) -> &Regex {
        &self.target_word
    }

    /// An import statement (any shape) from the framework root module.
    pub fn framework_import(&self) -> &Regex {
        &self.framework_import
    }

    /// A framework import with a named list, capturing `default`, `list` and `names`.
    pub fn named_framework_import(&self) -> &Regex {
        &self.named_framework_import
    }

    /// Leading `"use client";` style directives that must stay first, along
    /// with any comment or blank lines before them.
    pub fn directive_prologue(&self) -> &Regex {
        &self.directive_prologue
    }

    pub fn target_import_line(&self) -> String {
        format!(
            "import {{ {} }} from \"{}\";",
            self.settings.target_hook, self.settings.target_module
        )
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("failed to compile pattern {pattern}"))
}
