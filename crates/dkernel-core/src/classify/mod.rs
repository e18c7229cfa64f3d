//! Fragment classification for D cells.
//!
//! Decides whether a cell is a whole program, a set of persistent
//! declarations, or a sequence of statements to run inside `main`.
//!
//! # Architecture
//!
//! ```text
//! cell text ──► mask (blank comments/literals) ──► top-level statement starts
//!                                                         │
//!                      rule table (class, struct, function, import, variable)
//!                                                         │
//!                                        Classification { declarations, statements }
//! ```
//!
//! Matching is shallow on purpose. A cell the rules cannot make sense of is
//! treated as statements and the compiler gets the final word.

mod imports;
mod rules;
mod scan;

use std::fmt;

use crate::config::StatementPolicy;

use rules::{Rule, rule_table};

/// Kind of a persistent declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclKind {
    Import,
    Class,
    Struct,
    Function,
    Variable,
}

impl DeclKind {
    /// Order in which kinds are emitted into the assembled program.
    pub const ASSEMBLY_ORDER: [DeclKind; 5] = [
        DeclKind::Import,
        DeclKind::Class,
        DeclKind::Struct,
        DeclKind::Function,
        DeclKind::Variable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Import => "import",
            DeclKind::Class => "class",
            DeclKind::Struct => "struct",
            DeclKind::Function => "function",
            DeclKind::Variable => "variable",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named source fragment that is replayed in every later compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclKind,
    pub name: String,
    /// Rendered source text, emitted verbatim.
    pub source: String,
}

/// Result of classifying one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Nothing but whitespace.
    Empty,

    /// The cell defines its own `main` and is compiled as written.
    Program(String),

    /// Declarations to remember, and statements to run in `main`.
    Fragments {
        declarations: Vec<Declaration>,
        statements: Option<String>,
    },
}

impl Classification {
    /// Declarations found in the cell (empty for programs).
    pub fn declarations(&self) -> &[Declaration] {
        match self {
            Classification::Fragments { declarations, .. } => declarations,
            _ => &[],
        }
    }

    /// Statements to place into the synthesized `main`.
    pub fn statements(&self) -> Option<&str> {
        match self {
            Classification::Fragments { statements, .. } => statements.as_deref(),
            _ => None,
        }
    }
}

/// Rule-based cell classifier.
pub struct Classifier {
    rules: Vec<Rule>,
    policy: StatementPolicy,
}

impl Classifier {
    /// Create a classifier with the given statement policy.
    pub fn new(policy: StatementPolicy) -> Self {
        Self {
            rules: rule_table(),
            policy,
        }
    }

    /// Classify a cell.
    pub fn classify(&self, cell: &str) -> Classification {
        if cell.trim().is_empty() {
            return Classification::Empty;
        }

        let masked = scan::mask(cell);
        let mut declarations = Vec::new();
        let mut consumed: Vec<(usize, usize)> = Vec::new();
        let mut cursor = 0;

        for start in scan::statement_starts(&masked) {
            if start < cursor {
                continue;
            }
            let Some(found) = self
                .rules
                .iter()
                .find_map(|rule| rule.apply(cell, &masked, start))
            else {
                continue;
            };

            if found
                .declarations
                .iter()
                .any(|d| d.kind == DeclKind::Function && d.name == "main")
            {
                tracing::debug!("cell defines main, compiling as a whole program");
                return Classification::Program(cell.to_string());
            }

            consumed.push((start, found.end));
            cursor = found.end;
            declarations.extend(found.declarations);
        }

        let statements = if declarations.is_empty() {
            Some(cell.trim().to_string())
        } else {
            match self.policy {
                StatementPolicy::Exclusive => None,
                StatementPolicy::Residual => residual(cell, &consumed),
            }
        };

        tracing::debug!(
            declarations = declarations.len(),
            has_statements = statements.is_some(),
            "classified cell"
        );

        Classification::Fragments {
            declarations,
            statements,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(StatementPolicy::default())
    }
}

/// Text outside the consumed spans, or `None` if only whitespace is left.
fn residual(cell: &str, consumed: &[(usize, usize)]) -> Option<String> {
    let mut rest = String::new();
    let mut last = 0;
    for &(start, end) in consumed {
        rest.push_str(&cell[last..start]);
        last = end;
    }
    rest.push_str(&cell[last..]);

    let lines: Vec<&str> = rest.lines().filter(|l| !l.trim().is_empty()).collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(c: &Classification) -> Vec<(DeclKind, &str)> {
        c.declarations()
            .iter()
            .map(|d| (d.kind, d.name.as_str()))
            .collect()
    }

    #[test]
    fn test_empty_cell() {
        assert_eq!(Classifier::default().classify("  \n\t"), Classification::Empty);
    }

    #[test]
    fn test_statements_only() {
        let c = Classifier::default().classify("writeln(add(2,3));");
        assert!(c.declarations().is_empty());
        assert_eq!(c.statements(), Some("writeln(add(2,3));"));
    }

    #[test]
    fn test_whole_program() {
        let src = "import std.stdio;\nvoid main() {\n    writeln(1);\n}\n";
        assert_eq!(
            Classifier::default().classify(src),
            Classification::Program(src.to_string())
        );
    }

    #[test]
    fn test_mixed_declarations() {
        let src = r#"
import std.stdio : writeln, write;
import std.algorithm;

struct Point { int x; int y; }

class Shape {
    abstract double area();
}

class Square : Shape {
    double side;
    override double area() { return side * side; }
}

int add(int a, int b) { return a + b; }

int counter = 0;
"#;
        let c = Classifier::default().classify(src);
        assert_eq!(
            names(&c),
            vec![
                (DeclKind::Import, "std.stdio.writeln"),
                (DeclKind::Import, "std.stdio.write"),
                (DeclKind::Import, "std.algorithm"),
                (DeclKind::Struct, "Point"),
                (DeclKind::Class, "Shape"),
                (DeclKind::Class, "Square"),
                (DeclKind::Function, "add"),
                (DeclKind::Variable, "counter"),
            ]
        );
        assert_eq!(c.statements(), None);
    }

    #[test]
    fn test_methods_are_not_functions() {
        let src = "class C { int get() { return 1; } void set(int v) { } }";
        let c = Classifier::default().classify(src);
        assert_eq!(names(&c), vec![(DeclKind::Class, "C")]);
    }

    #[test]
    fn test_exclusive_policy_drops_statements() {
        let c = Classifier::default().classify("int x = 5;\nwriteln(x);");
        assert_eq!(names(&c), vec![(DeclKind::Variable, "x")]);
        assert_eq!(c.statements(), None);
    }

    #[test]
    fn test_residual_policy_keeps_statements() {
        let classifier = Classifier::new(StatementPolicy::Residual);
        let c = classifier.classify("int x = 5;\nwriteln(x);\n\nwriteln(x + 1);");
        assert_eq!(names(&c), vec![(DeclKind::Variable, "x")]);
        assert_eq!(c.statements(), Some("writeln(x);\nwriteln(x + 1);"));
    }

    #[test]
    fn test_same_line_declarations() {
        let c = Classifier::default().classify("int a = 1; int b = 2; int c = a + b;");
        assert_eq!(
            names(&c),
            vec![
                (DeclKind::Variable, "a"),
                (DeclKind::Variable, "b"),
                (DeclKind::Variable, "c"),
            ]
        );
    }

    #[test]
    fn test_lambda_variable_keeps_whole_initializer() {
        let src = "auto sq = (int x) { return x * x; };\nint n = sq(3);";
        let c = Classifier::default().classify(src);
        assert_eq!(names(&c), vec![(DeclKind::Variable, "sq"), (DeclKind::Variable, "n")]);
        assert_eq!(
            c.declarations()[0].source,
            "auto sq = (int x) { return x * x; };"
        );
        assert_eq!(c.statements(), None);
    }

    #[test]
    fn test_declarations_in_strings_ignored() {
        let c = Classifier::default().classify("writeln(\"int f() { return 1; }\");");
        assert!(c.declarations().is_empty());
    }
}
