//! Compiler diagnostic cleanup.

use std::path::Path;

/// Replace every mention of the temporary build location in `text` with
/// `placeholder`.
///
/// Covers the absolute source path, the temp directory, the bare file name
/// and the file stem (the compiler's module name for the file). Longer forms
/// are replaced first so a path never degrades into a partial replacement.
pub fn neutralize(text: &str, source: &Path, dir: &Path, placeholder: &str) -> String {
    let mut needles: Vec<String> = Vec::with_capacity(4);
    needles.push(source.display().to_string());
    if let Some(name) = source.file_name() {
        needles.push(format!(
            "{}{}{}",
            dir.display(),
            std::path::MAIN_SEPARATOR,
            name.to_string_lossy()
        ));
        needles.push(name.to_string_lossy().into_owned());
    }
    needles.push(dir.display().to_string());
    if let Some(stem) = source.file_stem() {
        needles.push(stem.to_string_lossy().into_owned());
    }
    needles.sort_by_key(|needle| std::cmp::Reverse(needle.len()));
    needles.dedup();

    needles
        .iter()
        .filter(|needle| !needle.is_empty())
        .fold(text.to_string(), |acc, needle| acc.replace(needle.as_str(), placeholder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn paths() -> (PathBuf, PathBuf) {
        let dir = PathBuf::from("/work/.dkernel-Ab12Cd");
        (dir.join("cell_x7y8z9w0.d"), dir)
    }

    #[test]
    fn test_absolute_path_replaced() {
        let (source, dir) = paths();
        let text = format!("{}(3): Error: undefined identifier `oops`\n", source.display());
        assert_eq!(
            neutralize(&text, &source, &dir, "line"),
            "line(3): Error: undefined identifier `oops`\n"
        );
    }

    #[test]
    fn test_bare_name_and_module_replaced() {
        let (source, dir) = paths();
        let text = "cell_x7y8z9w0.d(1): Error: module `cell_x7y8z9w0` is in file 'cell_x7y8z9w0.d'";
        let cleaned = neutralize(text, &source, &dir, "line");
        assert!(!cleaned.contains("cell_x7y8z9w0"));
        assert_eq!(cleaned, "line(1): Error: module `line` is in file 'line'");
    }

    #[test]
    fn test_temp_dir_replaced() {
        let (source, dir) = paths();
        let text = "Error: cannot write object file /work/.dkernel-Ab12Cd/other.o";
        let cleaned = neutralize(text, &source, &dir, "line");
        assert!(!cleaned.contains(".dkernel-"));
        assert_eq!(cleaned, "Error: cannot write object file line/other.o");
    }

    #[test]
    fn test_unrelated_text_untouched() {
        let (source, dir) = paths();
        let text = "Warning: statement is not reachable\n";
        assert_eq!(neutralize(text, &source, &dir, "line"), text);
    }
}
