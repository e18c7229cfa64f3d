//! Declaration rules.
//!
//! Each rule pairs a kind with an anchored pattern, an extent (how far the
//! declaration reaches past the pattern) and a renderer turning the match into
//! declarations. Rules run against the masked text at top-level statement
//! starts, in table order.

use regex::bytes::{Captures, Regex};

use super::imports::split_import;
use super::scan::{matching_brace, statement_end};
use super::{DeclKind, Declaration};

/// Words that can sit where a type or a name is expected in statements but
/// never start a declaration.
const KEYWORDS: &[&str] = &[
    "if", "else", "while", "for", "foreach", "foreach_reverse", "do", "switch", "case",
    "default", "with", "try", "catch", "finally", "throw", "return", "new", "delete",
    "assert", "cast", "typeof", "mixin", "version", "debug", "synchronized", "scope",
    "goto", "break", "continue", "import", "module", "alias",
];

/// Storage classes and attributes accepted before a declaration.
const ATTRS: &str = r"(?:static|pure|nothrow|@[A-Za-z_]\w*|private|public|protected|package|export|extern\s*\([^)]*\)|final|override|abstract|synchronized|deprecated|const|immutable|inout|shared|__gshared|ref)";

/// A type: dotted identifier, optional template instance, array/pointer suffixes.
const TYPE: &str = r"[A-Za-z_][\w.]*(?:\s*!\s*(?:\([^()]*\)|[\w.]+))?(?:\s*\[[^\]]*\]|\s*\*)*";

/// How far a declaration extends past its pattern match.
#[derive(Debug, Clone, Copy)]
enum Extent {
    /// The match ends on `{` (body runs to the matching `}`) or on `=>`
    /// (expression body runs to the next top-level `;`).
    Body,
    /// The match already ends on the terminating `;`.
    Statement,
    /// The match ends on the first byte of an initializer, which runs to the
    /// next `;` outside braces, parens and brackets.
    Initializer,
}

/// Renders a matched declaration. Returning an empty vector rejects the match.
type Render = fn(kind: DeclKind, caps: &Captures<'_>, text: &str) -> Vec<Declaration>;

/// One entry of the rule table.
pub(crate) struct Rule {
    pub(crate) kind: DeclKind,
    pattern: Regex,
    extent: Extent,
    render: Render,
}

/// A declaration found at a statement start.
pub(crate) struct RuleMatch {
    pub(crate) end: usize,
    pub(crate) declarations: Vec<Declaration>,
}

impl Rule {
    fn new(kind: DeclKind, pattern: &str, extent: Extent, render: Render) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern)
                .unwrap_or_else(|e| panic!("invalid {} pattern: {e}", kind.as_str())),
            extent,
            render,
        }
    }

    /// Try the rule at `start`. `end` in the result is exclusive.
    pub(crate) fn apply(&self, source: &str, masked: &[u8], start: usize) -> Option<RuleMatch> {
        let caps = self.pattern.captures(&masked[start..])?;
        let head = caps.get(0)?;
        let head_end = start + head.end();

        let end = match self.extent {
            Extent::Statement => head_end,
            Extent::Initializer => statement_end(masked, head_end - 1)? + 1,
            Extent::Body if masked[head_end - 1] == b'{' => {
                matching_brace(masked, head_end - 1)? + 1
            }
            Extent::Body => statement_end(masked, head_end)? + 1,
        };

        let text = source.get(start..end)?;
        let declarations = (self.render)(self.kind, &caps, text);
        if declarations.is_empty() {
            return None;
        }

        Some(RuleMatch { end, declarations })
    }
}

/// Build the rule table in evaluation order.
pub(crate) fn rule_table() -> Vec<Rule> {
    vec![
        Rule::new(
            DeclKind::Class,
            &format!(
                r"^(?:(?:{ATTRS}|abstract|final)\s+)*class\s+(?P<name>[A-Za-z_]\w*)\s*(?:\([^()]*\)\s*)?(?::\s*(?P<bases>[^{{;]+?)\s*)?\{{"
            ),
            Extent::Body,
            render_named,
        ),
        Rule::new(
            DeclKind::Struct,
            &format!(r"^(?:{ATTRS}\s+)*struct\s+(?P<name>[A-Za-z_]\w*)\s*(?:\([^()]*\)\s*)?\{{"),
            Extent::Body,
            render_named,
        ),
        Rule::new(
            DeclKind::Function,
            &format!(
                r"^(?:(?:{ATTRS}|auto)\s+)*(?P<ret>{TYPE})\s+(?P<name>[A-Za-z_]\w*)\s*(?:\([^()]*\)\s*)?\([^()]*(?:\([^()]*\)[^()]*)*\)\s*(?:(?:const|immutable|inout|shared|pure|nothrow|return|scope|@[A-Za-z_]\w*)\s*)*(?:if\s*\([^{{;]*\)\s*)?(?:\{{|=>)"
            ),
            Extent::Body,
            render_typed,
        ),
        Rule::new(
            DeclKind::Import,
            r"^(?P<prefix>(?:(?:public|private|package|static)\s+)*)import\s+(?P<body>[^;{}]+);",
            Extent::Statement,
            render_import,
        ),
        Rule::new(
            DeclKind::Variable,
            &format!(
                r"^(?:(?:{ATTRS}|enum)\s+)*(?P<ret>{TYPE})\s+(?P<name>[A-Za-z_]\w*)\s*=[^=>]"
            ),
            Extent::Initializer,
            render_typed,
        ),
    ]
}

fn capture<'c>(caps: &'c Captures<'_>, name: &str) -> Option<&'c str> {
    caps.name(name)
        .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn render_named(kind: DeclKind, caps: &Captures<'_>, text: &str) -> Vec<Declaration> {
    match capture(caps, "name") {
        Some(name) if !is_keyword(name) => vec![Declaration {
            kind,
            name: name.to_string(),
            source: text.trim_end().to_string(),
        }],
        _ => Vec::new(),
    }
}

/// Functions and variables: both the type and the name must be real words.
fn render_typed(kind: DeclKind, caps: &Captures<'_>, text: &str) -> Vec<Declaration> {
    let ret = capture(caps, "ret").unwrap_or_default();
    let head = ret.split(|c: char| !c.is_alphanumeric() && c != '_').next();
    if head.is_some_and(is_keyword) {
        return Vec::new();
    }
    render_named(kind, caps, text)
}

fn render_import(_kind: DeclKind, caps: &Captures<'_>, text: &str) -> Vec<Declaration> {
    let prefix = capture(caps, "prefix").unwrap_or_default();
    let prefix = prefix
        .split_whitespace()
        .map(|attr| format!("{attr} "))
        .collect::<String>();

    // Module names are never masked, so the original text splits the same way.
    let Some(body) = text
        .split_once("import")
        .and_then(|(_, rest)| rest.rsplit_once(';'))
        .map(|(body, _)| body)
    else {
        return Vec::new();
    };

    split_import(&prefix, body)
}
