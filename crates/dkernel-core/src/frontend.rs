//! The notebook front-end as seen by the kernel.
//!
//! A [`Frontend`] receives streamed output while a cell runs and answers
//! input requests from the running program.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Name of an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    Stdout,
    Stderr,
}

impl StreamName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamName::Stdout => "stdout",
            StreamName::Stderr => "stderr",
        }
    }
}

/// Receiver of cell output and provider of cell input.
pub trait Frontend: Send {
    /// Deliver a chunk of output. Called as output arrives, possibly many
    /// times per cell.
    fn stream(&mut self, name: StreamName, text: &str);

    /// Ask the user for a line of input. `None` means no input is available
    /// and the program will see end-of-file.
    fn raw_input(&mut self, prompt: &str) -> impl Future<Output = Option<String>> + Send;
}

/// Wraps a front-end and drops all streamed output (silent execution).
pub struct Muted<'a, F>(pub &'a mut F);

impl<F: Frontend> Frontend for Muted<'_, F> {
    fn stream(&mut self, _name: StreamName, _text: &str) {}

    async fn raw_input(&mut self, prompt: &str) -> Option<String> {
        self.0.raw_input(prompt).await
    }
}

/// Front-end that records everything it is sent.
///
/// Consecutive chunks on the same stream are merged, which matches how
/// notebooks store stream outputs.
#[derive(Debug, Default)]
pub struct CollectingFrontend {
    outputs: Vec<(StreamName, String)>,
    input: Option<String>,
}

impl CollectingFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next input request with `input`.
    pub fn with_input(input: impl Into<String>) -> Self {
        Self {
            outputs: Vec::new(),
            input: Some(input.into()),
        }
    }

    /// Recorded outputs in arrival order.
    pub fn outputs(&self) -> &[(StreamName, String)] {
        &self.outputs
    }

    /// All text sent on one stream.
    pub fn text(&self, name: StreamName) -> String {
        self.outputs
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    /// Take the recorded outputs, leaving the collector empty.
    pub fn take(&mut self) -> Vec<(StreamName, String)> {
        std::mem::take(&mut self.outputs)
    }
}

impl Frontend for CollectingFrontend {
    fn stream(&mut self, name: StreamName, text: &str) {
        match self.outputs.last_mut() {
            Some((last, buf)) if *last == name => buf.push_str(text),
            _ => self.outputs.push((name, text.to_string())),
        }
    }

    async fn raw_input(&mut self, _prompt: &str) -> Option<String> {
        self.input.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_merges_runs() {
        let mut frontend = CollectingFrontend::new();
        frontend.stream(StreamName::Stdout, "a\n");
        frontend.stream(StreamName::Stdout, "b\n");
        frontend.stream(StreamName::Stderr, "oops\n");
        frontend.stream(StreamName::Stdout, "c\n");

        assert_eq!(frontend.outputs().len(), 3);
        assert_eq!(frontend.text(StreamName::Stdout), "a\nb\nc\n");
        assert_eq!(frontend.text(StreamName::Stderr), "oops\n");
    }

    #[tokio::test]
    async fn test_muted_forwards_input_only() {
        let mut inner = CollectingFrontend::with_input("42\n");
        {
            let mut muted = Muted(&mut inner);
            muted.stream(StreamName::Stdout, "hidden");
            assert_eq!(muted.raw_input("").await.as_deref(), Some("42\n"));
        }
        assert!(inner.outputs().is_empty());
    }

    #[test]
    fn test_stream_name_serde() {
        assert_eq!(serde_json::to_string(&StreamName::Stderr).unwrap(), "\"stderr\"");
    }
}
