//! Preprocessor: macro expansion, conditional compilation, include
//! resolution, directive handling (spec §4.1).
pub mod eval;
pub mod macro_def;

use std::collections::HashSet;
use std::path::PathBuf;

use crate::position::{FileId, SourceArea, SourcePosition};
use crate::report::Report;
use crate::source::{IncludeProvider, SourceManager};

use eval::CondEval;
use macro_def::{MacroDef, MacroTable};

const TWO_CHAR_OPERATORS: &[&str] = &["==", "!=", "<=", ">=", "&&", "||", "<<", ">>", "##"];

/// A record of one resolved `#include`, surfaced in the reflection "macros"
/// and used by the analyzer/driver for dependency tracking.
#[derive(Debug, Clone)]
pub struct ResolvedInclude {
    pub relative_path: String,
    pub file: FileId,
}

#[derive(Debug, Default)]
pub struct PreprocessedOutput {
    pub text: String,
    pub includes: Vec<ResolvedInclude>,
    pub diagnostics: Vec<Report>,
    /// Names of every macro defined by the end of preprocessing (spec's
    /// `ReflectionData::macros`).
    pub defined_macro_names: Vec<String>,
}

struct CondFrame {
    branch_taken: bool,
    any_branch_taken: bool,
    seen_else: bool,
}

pub struct Preprocessor<'a> {
    source: &'a mut SourceManager,
    include: &'a mut dyn IncludeProvider,
    macros: MacroTable,
    once_visited: HashSet<PathBuf>,
    include_depth: usize,
    depth_limit: usize,
    diagnostics: Vec<Report>,
    includes: Vec<ResolvedInclude>,
    expanding: Vec<String>, // hide set: macros currently being expanded
}

impl<'a> Preprocessor<'a> {
    pub const DEFAULT_DEPTH_LIMIT: usize = 256;

    pub fn new(
        source: &'a mut SourceManager,
        include: &'a mut dyn IncludeProvider,
        defines: &[(String, String)],
        target_version_macro: &str,
    ) -> Self {
        let mut macros = MacroTable::with_standard_macros(target_version_macro);
        for (name, value) in defines {
            let _ = macros.define(MacroDef::object_like(name.clone(), tokenize_line(value)));
        }
        Self {
            source,
            include,
            macros,
            once_visited: HashSet::new(),
            include_depth: 0,
            depth_limit: Self::DEFAULT_DEPTH_LIMIT,
            diagnostics: Vec::new(),
            includes: Vec::new(),
            expanding: Vec::new(),
        }
    }

    pub fn run(self, file: FileId) -> PreprocessedOutput {
        let (output, _macros, _once_visited) = self.run_keep_state(file);
        output
    }

    /// Like [`Preprocessor::run`] but also hands back the macro table and
    /// `#pragma once` visited set, so a parent `#include` can fold an
    /// included file's state back into its own.
    fn run_keep_state(mut self, file: FileId) -> (PreprocessedOutput, MacroTable, HashSet<PathBuf>) {
        let text = self.source.file(file).text.clone();
        let mut out = String::new();
        let mut cond_stack: Vec<CondFrame> = Vec::new();
        let mut lines = text.split('\n').peekable();
        let mut line_no: u32 = 0;
        while let Some(mut line) = lines.next() {
            // Directive continuation via trailing backslash.
            let mut joined = String::new();
            while line.trim_end().ends_with('\\') {
                joined.push_str(line.trim_end().trim_end_matches('\\'));
                joined.push(' ');
                match lines.next() {
                    Some(next) => {
                        line_no += 1;
                        line = next;
                    }
                    None => break,
                }
            }
            let effective_line: &str = if joined.is_empty() {
                line
            } else {
                joined.push_str(line);
                // Leak-free: use a temporary owned string for this iteration.
                out.push_str(&self.process_line(&joined, file, line_no, &mut cond_stack));
                out.push('\n');
                line_no += 1;
                continue;
            };
            out.push_str(&self.process_line(effective_line, file, line_no, &mut cond_stack));
            out.push('\n');
            line_no += 1;
        }
        if !cond_stack.is_empty() {
            self.diagnostics.push(Report::error("unterminated conditional block: missing #endif"));
        }
        let output = PreprocessedOutput {
            text: out,
            includes: self.includes,
            diagnostics: self.diagnostics,
            defined_macro_names: self.macros.names(),
        };
        (output, self.macros, self.once_visited)
    }

    fn enabled(cond_stack: &[CondFrame]) -> bool {
        cond_stack.iter().all(|f| f.branch_taken)
    }

    fn process_line(&mut self, line: &str, file: FileId, line_no: u32, cond_stack: &mut Vec<CondFrame>) -> String {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('#') {
            return self.process_directive(rest.trim(), file, line_no, cond_stack).unwrap_or_default();
        }
        if !Self::enabled(cond_stack) {
            return String::new();
        }
        let tokens = tokenize_line(line);
        let expanded = self.expand_tokens(&tokens, file, line_no);
        expanded.join(" ")
    }

    fn area(file: FileId, line: u32) -> SourceArea {
        SourceArea::new(SourcePosition::new(file, line, 0), 0)
    }

    /// Returns the text to splice into the output stream in place of this
    /// directive line — only `#include` ever produces any (the resolved and
    /// preprocessed contents of the included file).
    fn process_directive(&mut self, directive: &str, file: FileId, line_no: u32, cond_stack: &mut Vec<CondFrame>) -> Option<String> {
        let (keyword, rest) = split_first_word(directive);
        let currently_enabled = Self::enabled(cond_stack);
        match keyword {
            "define" if currently_enabled => self.handle_define(rest, file, line_no),
            "undef" if currently_enabled => self.handle_undef(rest, file, line_no),
            "include" if currently_enabled => return self.handle_include(rest, file, line_no),
            "pragma" if currently_enabled => self.handle_pragma(rest, file, line_no),
            "line" if currently_enabled => { /* tracked for diagnostics only; best-effort */ }
            "error" if currently_enabled => {
                self.diagnostics.push(Report::error(format!("#error {}", rest)).with_area(Self::area(file, line_no)));
            }
            "if" => {
                let taken = currently_enabled && self.eval_condition(rest, file, line_no);
                cond_stack.push(CondFrame { branch_taken: taken, any_branch_taken: taken, seen_else: false });
            }
            "ifdef" => {
                let taken = currently_enabled && self.macros.is_defined(rest.trim());
                cond_stack.push(CondFrame { branch_taken: taken, any_branch_taken: taken, seen_else: false });
            }
            "ifndef" => {
                let taken = currently_enabled && !self.macros.is_defined(rest.trim());
                cond_stack.push(CondFrame { branch_taken: taken, any_branch_taken: taken, seen_else: false });
            }
            "elif" => match cond_stack.last_mut() {
                Some(frame) if !frame.seen_else => {
                    let parent_enabled = true; // stack already only contains frames reachable from here
                    let take = parent_enabled && !frame.any_branch_taken && self.eval_condition(rest, file, line_no);
                    frame.branch_taken = take;
                    frame.any_branch_taken = frame.any_branch_taken || take;
                }
                Some(_) => self.diagnostics.push(Report::error("#elif after #else").with_area(Self::area(file, line_no))),
                None => self.diagnostics.push(Report::error("#elif without matching #if").with_area(Self::area(file, line_no))),
            },
            "else" => match cond_stack.last_mut() {
                Some(frame) if !frame.seen_else => {
                    frame.seen_else = true;
                    frame.branch_taken = !frame.any_branch_taken;
                    frame.any_branch_taken = true;
                }
                Some(_) => self.diagnostics.push(Report::error("multiple #else for one #if").with_area(Self::area(file, line_no))),
                None => self.diagnostics.push(Report::error("#else without matching #if").with_area(Self::area(file, line_no))),
            },
            "endif" => {
                if cond_stack.pop().is_none() {
                    self.diagnostics.push(Report::error("unmatched #endif").with_area(Self::area(file, line_no)));
                }
            }
            "" => {}
            other => {
                if currently_enabled {
                    self.diagnostics.push(
                        Report::warning(format!("unknown preprocessor directive '#{}'", other)).with_area(Self::area(file, line_no)),
                    );
                }
            }
        }
        None
    }

    fn eval_condition(&mut self, expr: &str, file: FileId, line_no: u32) -> bool {
        let tokens = tokenize_line(expr);
        let expanded = self.expand_tokens_keep_defined(&tokens);
        let mut eval = CondEval::new(&expanded, &self.macros);
        match eval.eval() {
            Ok(v) => v != 0,
            Err(message) => {
                self.diagnostics.push(Report::error(format!("malformed #if expression: {}", message)).with_area(Self::area(file, line_no)));
                false
            }
        }
    }

    /// Expand macros but leave `defined` operands untouched, so `defined(X)`
    /// observes `X` itself rather than whatever it expands to.
    fn expand_tokens_keep_defined(&mut self, tokens: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i] == "defined" {
                out.push(tokens[i].clone());
                i += 1;
                if tokens.get(i).map(|s| s.as_str()) == Some("(") {
                    out.push(tokens[i].clone());
                    i += 1;
                    if let Some(name) = tokens.get(i) {
                        out.push(name.clone());
                        i += 1;
                    }
                    if tokens.get(i).map(|s| s.as_str()) == Some(")") {
                        out.push(tokens[i].clone());
                        i += 1;
                    }
                } else if let Some(name) = tokens.get(i) {
                    out.push(name.clone());
                    i += 1;
                }
                continue;
            }
            let expanded = self.expand_tokens(&tokens[i..i + 1], 0, 0);
            out.extend(expanded);
            i += 1;
        }
        out
    }

    fn handle_define(&mut self, rest: &str, file: FileId, line_no: u32) {
        let rest = rest.trim_start();
        let mut chars = rest.char_indices();
        let name_end = chars
            .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty() {
            self.diagnostics.push(Report::error("malformed #define: missing macro name").with_area(Self::area(file, line_no)));
            return;
        }
        let after_name = &rest[name_end..];
        let (params, body_str) = if let Some(stripped) = after_name.strip_prefix('(') {
            let close = match stripped.find(')') {
                Some(idx) => idx,
                None => {
                    self.diagnostics.push(Report::error("malformed #define: unterminated parameter list").with_area(Self::area(file, line_no)));
                    return;
                }
            };
            let param_list = &stripped[..close];
            let mut is_variadic = false;
            let mut params: Vec<String> = param_list
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            if params.last().map(|p| p == "...").unwrap_or(false) {
                is_variadic = true;
                params.pop();
            }
            (Some((params, is_variadic)), &stripped[close + 1..])
        } else {
            (None, after_name)
        };
        let body = tokenize_line(body_str.trim());
        let def = match params {
            Some((params, is_variadic)) => MacroDef { name: name.to_string(), params: Some(params), is_variadic, body, is_standard: false },
            None => MacroDef::object_like(name, body),
        };
        if let Err(message) = self.macros.define(def) {
            self.diagnostics.push(Report::error(message).with_area(Self::area(file, line_no)));
        }
    }

    fn handle_undef(&mut self, rest: &str, file: FileId, line_no: u32) {
        let name = rest.trim();
        match self.macros.undef(name) {
            Ok(false) => self.diagnostics.push(Report::warning(format!("#undef of undefined macro '{}'", name)).with_area(Self::area(file, line_no))),
            Ok(true) => {}
            Err(message) => self.diagnostics.push(Report::error(message).with_area(Self::area(file, line_no))),
        }
    }

    fn handle_pragma(&mut self, rest: &str, file: FileId, line_no: u32) {
        let rest = rest.trim();
        if rest == "once" {
            if let Ok(canon) = std::fs::canonicalize(self.source.file_name(file)) {
                self.once_visited.insert(canon);
            } else {
                self.once_visited.insert(PathBuf::from(self.source.file_name(file)));
            }
        } else {
            self.diagnostics.push(Report::warning(format!("unknown #pragma '{}'", rest)).with_area(Self::area(file, line_no)));
        }
    }

    fn handle_include(&mut self, rest: &str, file: FileId, line_no: u32) -> Option<String> {
        let rest = rest.trim();
        let filename = if (rest.starts_with('"') && rest.ends_with('"') && rest.len() >= 2)
            || (rest.starts_with('<') && rest.ends_with('>') && rest.len() >= 2)
        {
            &rest[1..rest.len() - 1]
        } else {
            self.diagnostics.push(Report::error("malformed #include directive").with_area(Self::area(file, line_no)));
            return None;
        };
        let prefer_search_paths = rest.starts_with('<');
        if self.include_depth >= self.depth_limit {
            self.diagnostics.push(Report::error(format!("#include recursion exceeded depth limit of {}", self.depth_limit)).with_area(Self::area(file, line_no)));
            return None;
        }
        let canonical_check = std::fs::canonicalize(filename).ok();
        if let Some(canon) = &canonical_check {
            if self.once_visited.contains(canon) {
                return None;
            }
        }
        match self.include.open(filename, prefer_search_paths) {
            Some(contents) => {
                let included_file = self.source.add_file(filename, contents);
                self.includes.push(ResolvedInclude { relative_path: filename.to_string(), file: included_file });
                self.include_depth += 1;
                let sub = Preprocessor {
                    source: self.source,
                    include: self.include,
                    macros: std::mem::take(&mut self.macros),
                    once_visited: std::mem::take(&mut self.once_visited),
                    include_depth: self.include_depth,
                    depth_limit: self.depth_limit,
                    diagnostics: Vec::new(),
                    includes: Vec::new(),
                    expanding: Vec::new(),
                };
                let (sub_output, macros, once_visited) = sub.run_keep_state(included_file);
                self.macros = macros;
                self.once_visited = once_visited;
                self.include_depth -= 1;
                self.diagnostics.extend(sub_output.diagnostics);
                self.includes.extend(sub_output.includes);
                Some(sub_output.text)
            }
            None => {
                self.diagnostics.push(Report::error(format!("include file '{}' not found", filename)).with_area(Self::area(file, line_no)));
                None
            }
        }
    }

    fn expand_tokens(&mut self, tokens: &[String], _file: FileId, _line_no: u32) -> Vec<String> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let tok = &tokens[i];
            if is_ident(tok) && !self.expanding.contains(tok) {
                if let Some(def) = self.macros.get(tok).cloned() {
                    if def.is_function_like() {
                        if tokens.get(i + 1).map(|s| s.as_str()) == Some("(") {
                            let (args, consumed) = parse_call_args(&tokens[i + 1..]);
                            let expanded_body = substitute(&def, &args);
                            self.expanding.push(tok.clone());
                            let rescanned = self.expand_tokens(&expanded_body, _file, _line_no);
                            self.expanding.pop();
                            out.extend(rescanned);
                            i += 1 + consumed;
                            continue;
                        } else {
                            out.push(tok.clone());
                            i += 1;
                            continue;
                        }
                    } else {
                        self.expanding.push(tok.clone());
                        let rescanned = self.expand_tokens(&def.body, _file, _line_no);
                        self.expanding.pop();
                        out.extend(rescanned);
                        i += 1;
                        continue;
                    }
                }
            }
            out.push(tok.clone());
            i += 1;
        }
        out
    }
}

/// Parse the parenthesized argument list following a function-like macro
/// name, starting at the opening `(`. Returns the arguments (each a
/// token-string) and how many input tokens were consumed including both
/// parens.
fn parse_call_args(tokens: &[String]) -> (Vec<Vec<String>>, usize) {
    debug_assert_eq!(tokens.first().map(|s| s.as_str()), Some("("));
    let mut depth = 0i32;
    let mut args: Vec<Vec<String>> = vec![Vec::new()];
    let mut i = 0;
    loop {
        let tok = match tokens.get(i) {
            Some(t) => t,
            None => break,
        };
        match tok.as_str() {
            "(" => {
                depth += 1;
                if depth > 1 {
                    args.last_mut().unwrap().push(tok.clone());
                }
            }
            ")" => {
                depth -= 1;
                if depth == 0 {
                    i += 1;
                    break;
                }
                args.last_mut().unwrap().push(tok.clone());
            }
            "," if depth == 1 => {
                args.push(Vec::new());
            }
            _ => args.last_mut().unwrap().push(tok.clone()),
        }
        i += 1;
    }
    if args.len() == 1 && args[0].is_empty() {
        args.clear();
    }
    (args, i)
}

fn substitute(def: &MacroDef, args: &[Vec<String>]) -> Vec<String> {
    let params = def.params.as_ref().cloned().unwrap_or_default();
    let mut out = Vec::new();
    let mut i = 0;
    while i < def.body.len() {
        let tok = &def.body[i];
        if let Some(idx) = params.iter().position(|p| p == tok) {
            if let Some(arg) = args.get(idx) {
                out.extend(arg.clone());
            }
        } else if def.is_variadic && tok == "__VA_ARGS__" {
            let variadic_start = params.len();
            for (k, arg) in args.iter().enumerate().skip(variadic_start) {
                if k > variadic_start {
                    out.push(",".to_string());
                }
                out.extend(arg.clone());
            }
        } else {
            out.push(tok.clone());
        }
        i += 1;
    }
    out
}

fn is_ident(tok: &str) -> bool {
    let mut chars = tok.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(|c: char| c.is_whitespace()) {
        Some(idx) => (&s[..idx], s[idx..].trim_start()),
        None => (s, ""),
    }
}

/// Split a line of source into preprocessing tokens: identifiers/keywords,
/// numbers, string literals, and punctuation (merging known two-character
/// operators and `(`/`)`/`,` as individual tokens for argument parsing).
pub fn tokenize_line(line: &str) -> Vec<String> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && ((bytes[i] as char).is_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            out.push(line[start..i].to_string());
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && ((bytes[i] as char).is_alphanumeric() || bytes[i] == b'.') {
                i += 1;
            }
            out.push(line[start..i].to_string());
            continue;
        }
        if c == '"' {
            let start = i;
            i += 1;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            if i < bytes.len() {
                i += 1;
            }
            out.push(line[start..i].to_string());
            continue;
        }
        // Two-character operators.
        if i + 1 < bytes.len() {
            let two = &line[i..i + 2];
            if TWO_CHAR_OPERATORS.contains(&two) {
                out.push(two.to_string());
                i += 2;
                continue;
            }
        }
        out.push(c.to_string());
        i += 1;
    }
    out
}
