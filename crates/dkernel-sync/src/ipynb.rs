//! Jupyter notebook (.ipynb) model.
//!
//! Only the parts the kernel reads or writes are typed. Everything else
//! (notebook and cell metadata, attachments, unknown keys) is carried through
//! untouched so a notebook survives a read/write cycle.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SyncError, SyncResult};

/// Text that nbformat allows as either one string or a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Lines(Vec<String>),
    Single(String),
}

impl MultilineText {
    /// Split `text` into lines that keep their terminators.
    pub fn from_text(text: &str) -> Self {
        MultilineText::Lines(text.split_inclusive('\n').map(str::to_string).collect())
    }

    /// The full text.
    pub fn text(&self) -> String {
        match self {
            MultilineText::Lines(lines) => lines.concat(),
            MultilineText::Single(text) => text.clone(),
        }
    }
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::Lines(Vec::new())
    }
}

/// A Jupyter notebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupyterNotebook {
    /// Notebook metadata
    #[serde(default)]
    pub metadata: JupyterMetadata,

    /// Format version (always 4)
    pub nbformat: u32,

    /// Minor format version
    pub nbformat_minor: u32,

    /// Notebook cells
    pub cells: Vec<JupyterCell>,
}

/// Jupyter notebook metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JupyterMetadata {
    /// Kernel specification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernelspec: Option<KernelSpec>,

    /// Language info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_info: Option<Value>,

    /// Other metadata, preserved as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Kernel specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub name: String,
}

impl KernelSpec {
    /// The spec identifying this kernel.
    pub fn d_kernel() -> Self {
        Self {
            display_name: "D".to_string(),
            language: Some("d".to_string()),
            name: "d".to_string(),
        }
    }
}

/// A Jupyter cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupyterCell {
    /// Cell type: `code`, `markdown` or `raw`
    pub cell_type: String,

    /// Cell id (nbformat 4.5+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    pub source: MultilineText,

    /// Cell outputs (code cells)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<CellOutput>>,

    /// Execution count (code cells)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<u64>,

    /// Attachments and any other keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JupyterCell {
    /// A code cell with no outputs.
    pub fn code(source: &str) -> Self {
        Self {
            cell_type: "code".to_string(),
            id: None,
            metadata: Map::new(),
            source: MultilineText::from_text(source),
            outputs: Some(Vec::new()),
            execution_count: None,
            extra: Map::new(),
        }
    }

    /// A markdown cell.
    pub fn markdown(source: &str) -> Self {
        Self {
            cell_type: "markdown".to_string(),
            outputs: None,
            ..Self::code(source)
        }
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == "code"
    }

    /// Stream text recorded for this cell on `name` (`stdout`/`stderr`).
    pub fn stream_text(&self, name: &str) -> String {
        self.outputs
            .iter()
            .flatten()
            .filter_map(|output| match output {
                CellOutput::Stream { name: n, text } if n == name => Some(text.text()),
                _ => None,
            })
            .collect()
    }
}

/// Cell output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type")]
pub enum CellOutput {
    /// Standard output/error
    #[serde(rename = "stream")]
    Stream { name: String, text: MultilineText },

    /// Rich result
    #[serde(rename = "execute_result")]
    ExecuteResult {
        execution_count: Option<u64>,
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },

    /// Display data
    #[serde(rename = "display_data")]
    DisplayData {
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },

    /// Error output
    #[serde(rename = "error")]
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
}

impl JupyterNotebook {
    /// Create a new empty notebook for the D kernel.
    pub fn new() -> Self {
        Self {
            metadata: JupyterMetadata {
                kernelspec: Some(KernelSpec::d_kernel()),
                ..JupyterMetadata::default()
            },
            nbformat: 4,
            nbformat_minor: 5,
            cells: Vec::new(),
        }
    }

    /// Parse a notebook from JSON text.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let notebook: Self = serde_json::from_str(json)?;
        if notebook.nbformat != 4 {
            return Err(SyncError::InvalidNotebook(format!(
                "unsupported nbformat {} (expected 4)",
                notebook.nbformat
            )));
        }
        Ok(notebook)
    }

    /// Write the notebook to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> SyncResult<()> {
        let path = path.as_ref();
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json).map_err(|e| SyncError::WriteError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Read a notebook from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SyncError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Code cells in notebook order.
    pub fn code_cells(&self) -> impl Iterator<Item = &JupyterCell> {
        self.cells.iter().filter(|cell| cell.is_code())
    }
}

impl Default for JupyterNotebook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_notebook() {
        let notebook = JupyterNotebook::new();
        assert_eq!(notebook.nbformat, 4);
        assert!(notebook.cells.is_empty());
        assert_eq!(notebook.metadata.kernelspec, Some(KernelSpec::d_kernel()));
    }

    #[test]
    fn test_source_string_or_lines() {
        let as_lines: JupyterCell = serde_json::from_value(json!({
            "cell_type": "code",
            "metadata": {},
            "source": ["int x = 1;\n", "int y = 2;"],
            "outputs": [],
            "execution_count": null
        }))
        .unwrap();
        let as_string: JupyterCell = serde_json::from_value(json!({
            "cell_type": "code",
            "metadata": {},
            "source": "int x = 1;\nint y = 2;",
            "outputs": [],
            "execution_count": null
        }))
        .unwrap();

        assert_eq!(as_lines.source.text(), as_string.source.text());
        assert_eq!(as_lines.execution_count, None);
    }

    #[test]
    fn test_unknown_fields_survive() {
        let value = json!({
            "metadata": {"kernelspec": {"name": "d", "display_name": "D"}, "authors": ["W. Bright"]},
            "nbformat": 4,
            "nbformat_minor": 5,
            "cells": [{
                "cell_type": "markdown",
                "id": "intro",
                "metadata": {"tags": ["doc"]},
                "source": "# Title",
                "attachments": {}
            }]
        });
        let notebook: JupyterNotebook = serde_json::from_value(value).unwrap();
        let back = serde_json::to_value(&notebook).unwrap();

        assert_eq!(back["metadata"]["authors"][0], "W. Bright");
        assert_eq!(back["cells"][0]["id"], "intro");
        assert_eq!(back["cells"][0]["metadata"]["tags"][0], "doc");
        assert!(back["cells"][0].get("attachments").is_some());
        assert!(back["cells"][0].get("outputs").is_none());
    }

    #[test]
    fn test_rejects_old_format() {
        let err = JupyterNotebook::from_json(
            r#"{"metadata": {}, "nbformat": 3, "nbformat_minor": 0, "cells": []}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::InvalidNotebook(_)));
    }

    #[test]
    fn test_stream_output_lines() {
        let mut cell = JupyterCell::code("writeln(1);");
        cell.outputs = Some(vec![CellOutput::Stream {
            name: "stdout".to_string(),
            text: MultilineText::from_text("1\n2\n"),
        }]);

        let value = serde_json::to_value(&cell).unwrap();
        assert_eq!(value["outputs"][0]["output_type"], "stream");
        assert_eq!(value["outputs"][0]["text"], json!(["1\n", "2\n"]));
        assert_eq!(cell.stream_text("stdout"), "1\n2\n");
    }
}
