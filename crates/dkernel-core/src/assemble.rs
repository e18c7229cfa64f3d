//! Program assembly.
//!
//! Builds one compilable D module from the remembered declarations and the
//! current cell:
//!
//! ```text
//! imports ─► classes ─► structs ─► functions ─► variables ─► void main() { <cell statements> }
//! ```

use crate::classify::{Classification, DeclKind};
use crate::store::DeclarationStore;

/// Indentation used for statements inside the synthesized `main`.
const INDENT: &str = "    ";

/// A complete D source file ready for the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledProgram {
    source: String,
}

impl AssembledProgram {
    /// The full source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Consume into the source text.
    pub fn into_source(self) -> String {
        self.source
    }

    /// Whether the program reads from standard input.
    ///
    /// A plain word search for `readln`, `readf` or `stdin`, so a mention in
    /// a comment or string also counts. The kernel asks the front-end once,
    /// before the program starts, and then closes its stdin: a program
    /// reading more lines than that single answer holds sees end-of-file.
    pub fn reads_stdin(&self) -> bool {
        ["readln", "readf", "stdin"]
            .iter()
            .any(|word| contains_word(&self.source, word))
    }
}

/// Assemble the program for a classified cell.
///
/// Whole-program cells are used verbatim. Otherwise every declaration of the
/// store is emitted, kind by kind, followed by `main`, which is always present
/// even when the cell contributed no statements.
pub fn assemble(store: &DeclarationStore, cell: &Classification) -> AssembledProgram {
    if let Classification::Program(source) = cell {
        return AssembledProgram {
            source: source.clone(),
        };
    }

    let mut source = String::new();
    for kind in DeclKind::ASSEMBLY_ORDER {
        let sources = store.sources(kind);
        if sources.is_empty() {
            continue;
        }
        for decl in sources {
            source.push_str(decl);
            source.push('\n');
        }
        source.push('\n');
    }

    source.push_str("void main()\n{\n");
    if let Some(statements) = cell.statements() {
        for line in statements.lines() {
            if line.trim().is_empty() {
                source.push('\n');
            } else {
                source.push_str(INDENT);
                source.push_str(line);
                source.push('\n');
            }
        }
    }
    source.push_str("}\n");

    AssembledProgram { source }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + word.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;

    fn store_with(cells: &[&str]) -> DeclarationStore {
        let classifier = Classifier::default();
        let mut store = DeclarationStore::new();
        for cell in cells {
            let c = classifier.classify(cell);
            store.apply(c.declarations()).commit();
        }
        store
    }

    #[test]
    fn test_empty_store_still_has_main() {
        let store = DeclarationStore::new();
        let program = assemble(&store, &Classification::Empty);
        assert_eq!(program.source(), "void main()\n{\n}\n");
    }

    #[test]
    fn test_function_then_statement() {
        let store = store_with(&[
            "import std.stdio;",
            "int add(int a, int b) { return a+b; }",
        ]);
        let cell = Classifier::default().classify("writeln(add(2,3));");
        let program = assemble(&store, &cell);
        let src = program.source();

        assert_eq!(src.matches("int add(int a, int b) { return a+b; }").count(), 1);
        assert!(src.ends_with("void main()\n{\n    writeln(add(2,3));\n}\n"));
        assert!(src.find("import std.stdio;") < src.find("int add"));
    }

    #[test]
    fn test_kind_order() {
        let store = store_with(&[
            "int total = 3;",
            "int f() { return total; }",
            "struct S { int v; }",
            "class C { }",
            "import std.conv;",
        ]);
        let program = assemble(&store, &Classifier::default().classify(""));
        let src = program.source();

        let at = |needle: &str| src.find(needle).unwrap();
        assert!(at("import std.conv;") < at("class C"));
        assert!(at("class C") < at("struct S"));
        assert!(at("struct S") < at("int f()"));
        assert!(at("int f()") < at("int total"));
        assert!(at("int total") < at("void main()"));
    }

    #[test]
    fn test_program_is_verbatim() {
        let store = store_with(&["int unused = 1;"]);
        let src = "void main() { }";
        let program = assemble(&store, &Classification::Program(src.to_string()));
        assert_eq!(program.into_source(), src);
    }

    #[test]
    fn test_reads_stdin() {
        let reading = Classifier::default().classify("auto name = readln();");
        let mut store = DeclarationStore::new();
        store.apply(reading.declarations()).commit();
        assert!(assemble(&store, &Classification::Empty).reads_stdin());

        let quiet = Classifier::default().classify("writeln(\"readline_count\");");
        assert!(!assemble(&DeclarationStore::new(), &quiet).reads_stdin());

        let mentioned = Classifier::default().classify("writeln(1); // no stdin here");
        assert!(assemble(&DeclarationStore::new(), &mentioned).reads_stdin());
    }
}
