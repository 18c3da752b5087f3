//! SimplicityHL syntax pre-filter
//!
//! A heuristic lint pass run before the external compiler. It is not a
//! parser: it tokenizes just enough to spot constructs the current compiler
//! rejects, so a source that passes here can still fail to compile.

use serde::Serialize;

use crate::catalog::{is_working_jet, Construct, RESERVED_KEYWORDS, WORKING_JETS};

/// Appended to every clean result
pub const HEURISTIC_NOTE: &str = "Validation is a heuristic pre-filter, not a full parse; \
     the compiler may still reject this program.";

/// Outcome of a validation pass
///
/// `valid` always equals `errors.is_empty()`; fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn new(errors: Vec<String>, warnings: Vec<String>, suggestions: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            suggestions,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    PathSep,
    Punct,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    line: usize,
    depth: usize,
}

impl Token<'_> {
    fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }
}

#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
    suggestions: Vec<String>,
}

impl Findings {
    fn suggest(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !self.suggestions.contains(&text) {
            self.suggestions.push(text);
        }
    }
}

/// Validate contract source
///
/// Every check runs regardless of earlier findings, so one input can surface
/// several issues at once.
pub fn validate(source: &str) -> ValidationResult {
    let stripped = strip_comments(source);
    let tokens = tokenize(&stripped);
    let mut findings = Findings::default();

    check_top_level_bindings(&tokens, &mut findings);
    check_reserved_keywords(&tokens, &mut findings);
    check_conditionals(&tokens, &mut findings);
    check_pattern_matching(&tokens, &mut findings);
    check_jets(&tokens, &mut findings);
    check_functions(&tokens, &mut findings);

    if findings.errors.is_empty() {
        findings.suggest(HEURISTIC_NOTE);
    }

    ValidationResult::new(findings.errors, findings.warnings, findings.suggestions)
}

fn check_top_level_bindings(tokens: &[Token<'_>], findings: &mut Findings) {
    if let Some(token) = tokens.iter().find(|t| t.is_ident("let") && t.depth == 0) {
        findings.errors.push(format!(
            "line {}: {} are not supported; every statement must live inside the \
             entry function fn main()",
            token.line,
            Construct::TopLevelBinding.feature()
        ));
        findings.suggest("Move top-level let bindings into the body of fn main().");
    }
}

fn check_reserved_keywords(tokens: &[Token<'_>], findings: &mut Findings) {
    for keyword in RESERVED_KEYWORDS {
        if let Some(token) = tokens.iter().find(|t| t.is_ident(keyword)) {
            findings.warnings.push(format!(
                "line {}: `{}` is a reserved keyword that the compiler does not implement yet",
                token.line, keyword
            ));
        }
    }
}

fn check_conditionals(tokens: &[Token<'_>], findings: &mut Findings) {
    if let Some(token) = tokens
        .iter()
        .find(|t| t.is_ident("if") || t.is_ident("else"))
    {
        findings.errors.push(format!(
            "line {}: {} are not supported by the current compiler",
            token.line,
            Construct::Conditional.feature()
        ));
        findings.suggest(
            "Replace branching with assert!(jet::...) checks; a failed assertion rejects the spend.",
        );
    }
}

fn check_pattern_matching(tokens: &[Token<'_>], findings: &mut Findings) {
    if let Some(token) = tokens.iter().find(|t| t.is_ident("match")) {
        findings.errors.push(format!(
            "line {}: {} are not supported by the current compiler",
            token.line,
            Construct::PatternMatch.feature()
        ));
        findings.suggest("Restructure the program so each path is a separate assertion.");
    }
}

fn check_jets(tokens: &[Token<'_>], findings: &mut Findings) {
    let mut reported: Vec<&str> = Vec::new();

    for window in tokens.windows(3) {
        let [jet, sep, name] = window else { continue };
        if !jet.is_ident("jet") || sep.kind != TokenKind::PathSep || name.kind != TokenKind::Ident
        {
            continue;
        }
        if is_working_jet(name.text) || reported.contains(&name.text) {
            continue;
        }
        reported.push(name.text);
        findings.warnings.push(format!(
            "line {}: jet::{} is not on the working jet list and may fail to compile",
            name.line, name.text
        ));
    }

    if !reported.is_empty() {
        findings.suggest(format!("Working jets: {}", WORKING_JETS.join(", ")));
    }
}

fn check_functions(tokens: &[Token<'_>], findings: &mut Findings) {
    let mut has_main = false;
    let mut helpers: Vec<&str> = Vec::new();

    for pair in tokens.windows(2) {
        let [kw, name] = pair else { continue };
        if !kw.is_ident("fn") || name.kind != TokenKind::Ident || kw.depth != 0 {
            continue;
        }
        if name.text == "main" {
            has_main = true;
        } else if !helpers.contains(&name.text) {
            helpers.push(name.text);
        }
    }

    if !has_main {
        findings
            .errors
            .push("Missing entry point: the program must define fn main()".to_string());
        findings.suggest("Start from the minimal program: fn main() { () }");
    }

    if !helpers.is_empty() {
        findings.warnings.push(format!(
            "helper functions are only partially supported: {}",
            helpers.join(", ")
        ));
        findings.suggest("If compilation fails, inline helper function bodies into fn main().");
    }
}

/// Replace comments with whitespace, keeping line numbers intact
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '/' {
            match chars.peek() {
                Some('/') => {
                    for next in chars.by_ref() {
                        if next == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                    continue;
                }
                Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for next in chars.by_ref() {
                        if next == '\n' {
                            out.push('\n');
                        }
                        if prev == '*' && next == '/' {
                            break;
                        }
                        prev = next;
                    }
                    out.push(' ');
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }

    out
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident,
                text: &source[start..i],
                line,
                depth,
            });
            continue;
        }

        // Numeric literals, including 0x.. and 0b.. forms
        if b.is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            continue;
        }

        match b {
            b'\n' => line += 1,
            b':' if bytes.get(i + 1) == Some(&b':') => {
                tokens.push(Token {
                    kind: TokenKind::PathSep,
                    text: "::",
                    line,
                    depth,
                });
                i += 2;
                continue;
            }
            b'{' => {
                tokens.push(Token {
                    kind: TokenKind::Punct,
                    text: "{",
                    line,
                    depth,
                });
                depth += 1;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                tokens.push(Token {
                    kind: TokenKind::Punct,
                    text: "}",
                    line,
                    depth,
                });
            }
            _ if b.is_ascii_whitespace() || !b.is_ascii() => {}
            _ => tokens.push(Token {
                kind: TokenKind::Punct,
                text: &source[i..i + 1],
                line,
                depth,
            }),
        }
        i += 1;
    }

    tokens
}
