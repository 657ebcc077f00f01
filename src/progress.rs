//! Batch progress reporting.
//!
//! Decode, merge and assemble runs can take hours over a full collection
//! export. Progress is emitted on **stderr** so stdout (the run summary)
//! stays parseable for scripts.

use std::io::Write;
use std::str::FromStr;

/// Stage of the pipeline a progress event belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    Decoding,
    Merging,
    Assembling,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Decoding => "decoding",
            Stage::Merging => "merging",
            Stage::Assembling => "assembling",
        }
    }
}

/// A single progress event.
#[derive(Clone, Debug)]
pub struct ProgressEvent<'a> {
    pub stage: Stage,
    /// Input file or identifier list being processed.
    pub input: &'a str,
    pub n: u64,
    /// Total when known up front.
    pub total: Option<u64>,
}

/// Reports progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter {
    fn report(&self, event: ProgressEvent<'_>);
}

/// Human-friendly progress on stderr: "decoding abstracts.seq  1,234 / 5,000".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent<'_>) {
        let line = match event.total {
            Some(total) => format!(
                "{} {}  {} / {}\n",
                event.stage.as_str(),
                event.input,
                format_number(event.n),
                format_number(total)
            ),
            None => format!(
                "{} {}  {}\n",
                event.stage.as_str(),
                event.input,
                format_number(event.n)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent<'_>) {
        let obj = serde_json::json!({
            "event": "progress",
            "stage": event.stage.as_str(),
            "input": event.input,
            "n": event.n,
            "total": event.total,
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent<'_>) {}
}

/// Emit every `every` items, plus once at the end.
pub struct Throttle<'a> {
    reporter: &'a dyn ProgressReporter,
    stage: Stage,
    input: &'a str,
    total: Option<u64>,
    every: u64,
    n: u64,
}

impl<'a> Throttle<'a> {
    pub fn new(
        reporter: &'a dyn ProgressReporter,
        stage: Stage,
        input: &'a str,
        total: Option<u64>,
    ) -> Self {
        Self {
            reporter,
            stage,
            input,
            total,
            every: 1000,
            n: 0,
        }
    }

    pub fn tick(&mut self) {
        self.n += 1;
        if self.n % self.every == 0 {
            self.emit();
        }
    }

    pub fn finish(&self) {
        self.emit();
    }

    fn emit(&self) {
        self.reporter.report(ProgressEvent {
            stage: self.stage,
            input: self.input,
            n: self.n,
            total: self.total,
        });
    }
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

impl FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "unknown progress mode '{}'; expected off, human or json",
                other
            )),
        }
    }
}
