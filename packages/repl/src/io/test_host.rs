//! In-memory host for driving the REPL loop without a terminal.

use std::collections::VecDeque;

use super::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

/// One scripted step: a typed line or a key signal.
#[derive(Debug, Clone)]
enum Step {
    Line(String),
    Signal(Signal),
}

/// Test host with in-memory I/O buffers.
///
/// Lines and signals are replayed in the order they were queued. Once the
/// script is exhausted the host reports end of input, so a loop under test
/// always terminates.
#[derive(Debug, Default)]
pub struct TestHost {
    script: VecDeque<Step>,
    pending: Option<Step>,
    output_buffer: Vec<Output>,
    prompts: Vec<PromptConfig>,
    history: Vec<String>,
    flush_count: usize,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an input line.
    pub fn queue_input(&mut self, line: impl Into<String>) {
        self.script.push_back(Step::Line(line.into()));
    }

    /// Queue multiple input lines.
    pub fn queue_inputs(&mut self, lines: impl IntoIterator<Item = impl Into<String>>) {
        for line in lines {
            self.queue_input(line);
        }
    }

    /// Queue a signal after the lines queued so far.
    pub fn queue_signal(&mut self, signal: Signal) {
        self.script.push_back(Step::Signal(signal));
    }

    /// All output that was written.
    pub fn output(&self) -> &[Output] {
        &self.output_buffer
    }

    /// Output text only, one entry per line.
    pub fn output_text(&self) -> String {
        self.output_buffer
            .iter()
            .map(|o| o.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Output of a specific style.
    pub fn output_with_style(&self, style: OutputStyle) -> Vec<&str> {
        self.output_buffer
            .iter()
            .filter(|o| o.style == style)
            .map(|o| o.text.as_str())
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.output_with_style(OutputStyle::Error)
    }

    pub fn last_prompt(&self) -> Option<&PromptConfig> {
        self.prompts.last()
    }

    /// Every prompt configuration, one per read.
    pub fn prompts(&self) -> &[PromptConfig] {
        &self.prompts
    }

    /// Entries recorded in the line-edit history.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    pub fn clear_output(&mut self) {
        self.output_buffer.clear();
    }

    pub fn has_pending_input(&self) -> bool {
        !self.script.is_empty()
    }
}

impl IoHost for TestHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        self.pending = Some(
            self.script
                .pop_front()
                .unwrap_or(Step::Signal(Signal::Eof)),
        );
        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        match self.pending.take() {
            Some(Step::Line(line)) => Ok(Some(InputLine { line })),
            other => {
                self.pending = other;
                Ok(None)
            }
        }
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        match self.pending.take() {
            Some(Step::Signal(signal)) => Ok(Some(signal)),
            other => {
                self.pending = other;
                Ok(None)
            }
        }
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        self.output_buffer.push(output);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.prompts.push(config);
        Ok(())
    }

    fn record_history(&mut self, entry: &str) -> Result<(), IoError> {
        self.history.push(entry.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        self.flush_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_lines_and_signals_in_order() {
        let mut host = TestHost::new();
        host.queue_input("first");
        host.queue_signal(Signal::Interrupt { partial: true });
        host.queue_input("second");

        host.wait_for_input().unwrap();
        assert!(host.read_signal().unwrap().is_none());
        assert_eq!(host.read_input().unwrap().unwrap().line, "first");

        host.wait_for_input().unwrap();
        assert!(host.read_input().unwrap().is_none());
        assert_eq!(
            host.read_signal().unwrap(),
            Some(Signal::Interrupt { partial: true })
        );

        host.wait_for_input().unwrap();
        assert_eq!(host.read_input().unwrap().unwrap().line, "second");
        assert!(!host.has_pending_input());
    }

    #[test]
    fn exhausted_script_reports_eof() {
        let mut host = TestHost::new();
        host.wait_for_input().unwrap();
        assert_eq!(host.read_signal().unwrap(), Some(Signal::Eof));
    }

    #[test]
    fn output_with_style_filters() {
        let mut host = TestHost::new();
        host.write_output(Output::normal("normal")).unwrap();
        host.write_output(Output::error("error")).unwrap();
        host.write_output(Output::info("info")).unwrap();

        assert_eq!(host.errors(), vec!["error"]);
        assert_eq!(host.output_with_style(OutputStyle::Info), vec!["info"]);
        assert_eq!(host.output_text(), "normal\nerror\ninfo");

        host.clear_output();
        assert!(host.output().is_empty());
    }

    #[test]
    fn records_prompts_and_history() {
        let mut host = TestHost::new();
        assert!(host.last_prompt().is_none());

        host.write_prompt(PromptConfig {
            continuation: true,
            module: Some("app".to_string()),
            labels: vec!["a".to_string()],
        })
        .unwrap();
        host.record_history("a: 1").unwrap();
        host.flush().unwrap();

        let prompt = host.last_prompt().unwrap();
        assert!(prompt.continuation);
        assert_eq!(prompt.module.as_deref(), Some("app"));
        assert_eq!(host.history(), ["a: 1"]);
        assert_eq!(host.flush_count(), 1);
    }
}
