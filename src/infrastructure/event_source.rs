//! Outcome events read from a test harness's JSON output.
//!
//! Two line formats are understood: the libtest JSON event stream
//! (`cargo test -- -Z unstable-options --format json`) and a native format
//! that can also carry setup/teardown phases.
//!
//! [`run`] feeds a whole stream into a reporter. The input is always read to
//! EOF, whatever happens to the run, so the producer never sees a broken pipe.

use crate::application::flush::FlushSummary;
use crate::application::reporter::PrometheusReporter;
use crate::domain::errors::ReporterError;
use crate::domain::outcome::{Outcome, OutcomeEvent, Phase};
use crate::domain::ports::MetricsPusher;
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InputFormat {
    /// libtest JSON events
    #[default]
    Libtest,
    /// One OutcomeEvent object per line
    Native,
}

/// Why a line produced no event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// Not UTF-8, not JSON, or JSON of an unexpected shape
    Malformed(String),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LibtestLine {
    Suite {
        event: LibtestSuiteEvent,
    },
    Test {
        name: String,
        event: LibtestTestEvent,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LibtestSuiteEvent {
    Started,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LibtestTestEvent {
    Ok,
    Failed,
    Ignored,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct NativeLine {
    test_identifier: String,
    #[serde(default)]
    node_id: Option<String>,
    outcome: NativeOutcome,
    #[serde(default)]
    phase: NativePhase,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum NativeOutcome {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum NativePhase {
    Setup,
    #[default]
    Call,
    Teardown,
}

impl From<NativeOutcome> for Outcome {
    fn from(outcome: NativeOutcome) -> Self {
        match outcome {
            NativeOutcome::Passed => Outcome::Passed,
            NativeOutcome::Failed => Outcome::Failed,
            NativeOutcome::Skipped => Outcome::Skipped,
        }
    }
}

impl From<NativePhase> for Phase {
    fn from(phase: NativePhase) -> Self {
        match phase {
            NativePhase::Setup => Phase::Setup,
            NativePhase::Call => Phase::Call,
            NativePhase::Teardown => Phase::Teardown,
        }
    }
}

/// What one libtest line means for the stream
enum LibtestItem {
    SuiteStarted,
    Completed(OutcomeEvent),
    Nothing,
}

/// Parse one input line on its own. `Ok(None)` means a well-formed line that
/// carries no completed test (blank lines, suite events, `started`, ...).
///
/// Names are taken as-is; use [`EventParser`] for a stream that may span
/// several test binaries.
pub fn parse_line(format: InputFormat, line: &str) -> Result<Option<OutcomeEvent>, LineError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    match format {
        InputFormat::Libtest => match parse_libtest(line)? {
            LibtestItem::Completed(event) => Ok(Some(event)),
            LibtestItem::SuiteStarted | LibtestItem::Nothing => Ok(None),
        },
        InputFormat::Native => parse_native(line).map(Some),
    }
}

/// Stateful parser for a whole stream.
///
/// libtest names are only unique within one test binary, and every binary
/// opens its own suite. A name already seen in an earlier suite is scoped as
/// `suite<N>::<name>`, `N` counting suites from 1. Names seen for the first
/// time keep their plain form, and a repeat inside the same suite is left
/// alone so the registry still rejects it.
#[derive(Debug)]
pub struct EventParser {
    format: InputFormat,
    suite: usize,
    first_seen_in: HashMap<String, usize>,
}

impl EventParser {
    pub fn new(format: InputFormat) -> Self {
        Self {
            format,
            suite: 0,
            first_seen_in: HashMap::new(),
        }
    }

    /// Decode and parse one raw line, newline included or not
    pub fn parse_bytes(&mut self, raw: &[u8]) -> Result<Option<OutcomeEvent>, LineError> {
        let line = std::str::from_utf8(raw)
            .map_err(|e| LineError::Malformed(format!("invalid UTF-8: {e}")))?;
        self.parse(line)
    }

    pub fn parse(&mut self, line: &str) -> Result<Option<OutcomeEvent>, LineError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        if self.format == InputFormat::Native {
            return parse_native(line).map(Some);
        }

        match parse_libtest(line)? {
            LibtestItem::SuiteStarted => {
                self.suite += 1;
                Ok(None)
            }
            LibtestItem::Completed(event) => Ok(Some(self.scope(event))),
            LibtestItem::Nothing => Ok(None),
        }
    }

    fn scope(&mut self, mut event: OutcomeEvent) -> OutcomeEvent {
        let first = *self
            .first_seen_in
            .entry(event.test_identifier.clone())
            .or_insert(self.suite);

        if first != self.suite {
            event.test_identifier = format!("suite{}::{}", self.suite, event.test_identifier);
        }
        event
    }
}

fn parse_libtest(line: &str) -> Result<LibtestItem, LineError> {
    let parsed: LibtestLine =
        serde_json::from_str(line).map_err(|e| LineError::Malformed(e.to_string()))?;

    let (name, event) = match parsed {
        LibtestLine::Suite {
            event: LibtestSuiteEvent::Started,
        } => return Ok(LibtestItem::SuiteStarted),
        LibtestLine::Test { name, event } => (name, event),
        LibtestLine::Suite { .. } | LibtestLine::Other => return Ok(LibtestItem::Nothing),
    };
    let outcome = match event {
        LibtestTestEvent::Ok => Outcome::Passed,
        LibtestTestEvent::Failed => Outcome::Failed,
        LibtestTestEvent::Ignored => Outcome::Skipped,
        LibtestTestEvent::Other => return Ok(LibtestItem::Nothing),
    };

    Ok(LibtestItem::Completed(OutcomeEvent::new(
        metric_safe_identifier(&name),
        name,
        outcome,
        Phase::Call,
    )))
}

fn parse_native(line: &str) -> Result<OutcomeEvent, LineError> {
    let parsed: NativeLine =
        serde_json::from_str(line).map_err(|e| LineError::Malformed(e.to_string()))?;

    // An empty help text is rejected by the registry
    let node_id = parsed
        .node_id
        .filter(|node_id| !node_id.is_empty())
        .unwrap_or_else(|| parsed.test_identifier.clone());
    Ok(OutcomeEvent::new(
        parsed.test_identifier,
        node_id,
        parsed.outcome.into(),
        parsed.phase.into(),
    ))
}

/// Map a libtest name onto the metric name alphabet: anything outside
/// `[a-zA-Z0-9_:]` becomes `_`.
pub fn metric_safe_identifier(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Counters for one consumed stream
#[derive(Debug, Clone, Default)]
pub struct StreamReport {
    pub lines: usize,
    pub events: usize,
    pub malformed: usize,
    /// Present when the run was active and the push succeeded
    pub summary: Option<FlushSummary>,
}

async fn read_raw_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<bool, ReporterError>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = reader
        .read_until(b'\n', buf)
        .await
        .map_err(|e| ReporterError::Input {
            reason: e.to_string(),
        })?;
    Ok(n > 0)
}

/// Read and discard everything up to EOF. Returns the number of lines.
pub async fn drain<R>(reader: &mut R) -> Result<usize, ReporterError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut lines = 0;
    while read_raw_line(reader, &mut buf).await? {
        lines += 1;
    }
    Ok(lines)
}

/// Feed a whole event stream into `reporter`. EOF is the session end.
///
/// Malformed lines are skipped with a warning. After a recording failure the
/// rest of the input is drained, the run is discarded without a push, and
/// the failure is returned. An inactive reporter only drains.
pub async fn run<R, P>(
    reader: &mut R,
    format: InputFormat,
    mut reporter: PrometheusReporter<P>,
) -> Result<StreamReport, ReporterError>
where
    R: AsyncBufRead + Unpin,
    P: MetricsPusher,
{
    let mut report = StreamReport::default();

    if !reporter.is_active() {
        report.lines = drain(reader).await?;
        info!("Consumed {} input lines without reporting", report.lines);
        return Ok(report);
    }

    let mut parser = EventParser::new(format);
    let mut failure: Option<ReporterError> = None;
    let mut buf = Vec::new();

    while read_raw_line(reader, &mut buf).await? {
        report.lines += 1;
        if failure.is_some() {
            continue;
        }

        match parser.parse_bytes(&buf) {
            Ok(Some(event)) => match reporter.on_test_report(&event) {
                Ok(_) => report.events += 1,
                Err(e) => {
                    error!("Failed to record {}: {}", event.node_id, e);
                    failure = Some(e);
                }
            },
            Ok(None) => {}
            Err(LineError::Malformed(reason)) => {
                report.malformed += 1;
                warn!("Skipping unparseable input line {}: {}", report.lines, reason);
            }
        }
    }

    if let Some(e) = failure {
        reporter.unconfigure();
        return Err(e);
    }

    report.summary = reporter.on_session_finish().await?;
    Ok(report)
}
