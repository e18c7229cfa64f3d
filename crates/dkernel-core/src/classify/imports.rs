//! Import statement splitting.
//!
//! `import a, b : s1, s2;` becomes one record per plain module and one per
//! `(module, symbol)` pair, so that a later cell importing a different symbol
//! from the same module adds to the set instead of replacing it. As in D, the
//! selective list binds to the last module of the list.

use super::{DeclKind, Declaration};

/// Split the body of an import statement (the text between `import` and `;`)
/// into individual declarations. `prefix` holds any leading attributes such as
/// `static ` or `public `.
pub(crate) fn split_import(prefix: &str, body: &str) -> Vec<Declaration> {
    let (modules, symbols) = match body.split_once(':') {
        Some((modules, symbols)) => (modules, Some(symbols)),
        None => (body, None),
    };

    let modules: Vec<&str> = modules
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .collect();

    let Some((last, plain)) = modules.split_last() else {
        return Vec::new();
    };

    let mut records: Vec<Declaration> = plain
        .iter()
        .map(|module| plain_record(prefix, module))
        .collect();

    match symbols {
        None => records.push(plain_record(prefix, last)),
        Some(symbols) => {
            let module = normalize(last);
            records.extend(
                symbols
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|symbol| {
                        let symbol = normalize(symbol);
                        let bound = alias_target(&symbol).0;
                        Declaration {
                            kind: DeclKind::Import,
                            name: format!("{}.{}", module_name(&module), bound),
                            source: format!("{prefix}import {module} : {symbol};"),
                        }
                    }),
            );
        }
    }

    records
}

fn plain_record(prefix: &str, module: &str) -> Declaration {
    let module = normalize(module);
    Declaration {
        kind: DeclKind::Import,
        name: alias_target(&module).0.to_string(),
        source: format!("{prefix}import {module};"),
    }
}

/// For `x = y` returns `("x", "y")`, otherwise the name twice.
fn alias_target(spec: &str) -> (&str, &str) {
    match spec.split_once('=') {
        Some((alias, target)) => (alias.trim(), target.trim()),
        None => (spec, spec),
    }
}

/// Module part of a possibly aliased module spec.
fn module_name(spec: &str) -> &str {
    alias_target(spec).1
}

/// Collapse internal whitespace and put single spaces around `=`.
fn normalize(spec: &str) -> String {
    match spec.split_once('=') {
        Some((alias, target)) => format!("{} = {}", squash(alias), squash(target)),
        None => squash(spec),
    }
}

fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(decls: &[Declaration]) -> Vec<(&str, &str)> {
        decls
            .iter()
            .map(|d| (d.name.as_str(), d.source.as_str()))
            .collect()
    }

    #[test]
    fn test_selective_import() {
        let decls = split_import("", " std.stdio : writeln, write");
        assert_eq!(
            pairs(&decls),
            vec![
                ("std.stdio.writeln", "import std.stdio : writeln;"),
                ("std.stdio.write", "import std.stdio : write;"),
            ]
        );
    }

    #[test]
    fn test_plain_modules() {
        let decls = split_import("", "std.stdio, std.algorithm");
        assert_eq!(
            pairs(&decls),
            vec![
                ("std.stdio", "import std.stdio;"),
                ("std.algorithm", "import std.algorithm;"),
            ]
        );
    }

    #[test]
    fn test_selective_binds_to_last_module() {
        let decls = split_import("", "std.conv, std.stdio : writeln");
        assert_eq!(
            pairs(&decls),
            vec![
                ("std.conv", "import std.conv;"),
                ("std.stdio.writeln", "import std.stdio : writeln;"),
            ]
        );
    }

    #[test]
    fn test_aliases_preserved() {
        let decls = split_import("", "io = std.stdio");
        assert_eq!(pairs(&decls), vec![("io", "import io = std.stdio;")]);

        let decls = split_import("", "std.stdio : say=writeln");
        assert_eq!(
            pairs(&decls),
            vec![("std.stdio.say", "import std.stdio : say = writeln;")]
        );
    }

    #[test]
    fn test_prefix_kept() {
        let decls = split_import("static ", "std.math");
        assert_eq!(pairs(&decls), vec![("std.math", "static import std.math;")]);
    }
}
