use std::backtrace::BacktraceStatus;
use std::fmt;

use crate::backend::BackendError;
use crate::context::ContextId;

/// Errors raised by the execution-context layer.
#[derive(Debug, thiserror::Error)]
pub enum ProvableError {
    /// `leave` did not match the innermost frame.
    #[error("context mismatch: leave({found}) called, but the innermost frame is {}", describe_frame(.expected))]
    ContextMismatch {
        expected: Option<ContextId>,
        found: ContextId,
    },

    #[error(transparent)]
    CircuitExecution(#[from] CircuitExecutionError),

    #[error(
        "You cannot use Unconstrained::get() in provable code.\n\n\
         The only place where you can read unconstrained values is in witness() \
         and as_prover() blocks, which execute outside the proof."
    )]
    AccessViolation,

    #[error("Empty `Unconstrained`")]
    InvariantViolation,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("witness computation failed: {0:#}")]
    Witness(anyhow::Error),

    /// A provable value was rebuilt from the wrong number of fields or auxiliary slots.
    #[error("expected {expected} {kind}(s), got {actual}")]
    Layout {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid coefficient {coefficient:?}: {reason}")]
    InvalidCoefficient {
        coefficient: String,
        reason: &'static str,
    },
}

fn describe_frame(id: &Option<ContextId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}

/// An error raised inside a circuit body, with framework frames removed from
/// its backtrace.
pub struct CircuitExecutionError {
    message: String,
    trace: Option<String>,
    source: anyhow::Error,
}

impl CircuitExecutionError {
    /// The error chain of the body's error, outermost first.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Caller frames of the captured backtrace, if one was captured.
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    /// The error the body returned.
    pub fn inner(&self) -> &anyhow::Error {
        &self.source
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.source
    }
}

impl fmt::Display for CircuitExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for CircuitExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(trace) = &self.trace {
            write!(f, "\n\nStack backtrace:\n{}", trace)?;
        }
        Ok(())
    }
}

impl std::error::Error for CircuitExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source: &(dyn std::error::Error + Send + Sync + 'static) = self.source.as_ref();
        Some(source)
    }
}

const INTERNAL_FRAME_PREFIXES: &[&str] = &["snarkctx::", "<snarkctx::", "anyhow::", "<anyhow::"];

pub(crate) fn prettify(error: anyhow::Error) -> CircuitExecutionError {
    let message = format!("{:#}", error);
    let backtrace = error.backtrace();
    let trace = match backtrace.status() {
        BacktraceStatus::Captured => Some(strip_internal_frames(&backtrace.to_string())),
        _ => None,
    };
    CircuitExecutionError {
        message,
        trace,
        source: error,
    }
}

/// Drop the frames of a rendered backtrace whose symbol belongs to this
/// crate or to `anyhow`. A frame is its numbered header line plus the
/// indented `at file:line` lines following it.
pub(crate) fn strip_internal_frames(backtrace: &str) -> String {
    let mut kept = Vec::new();
    let mut keep_current = true;
    for line in backtrace.lines() {
        if let Some(symbol) = frame_symbol(line) {
            keep_current = !INTERNAL_FRAME_PREFIXES
                .iter()
                .any(|prefix| symbol.starts_with(prefix));
        }
        if keep_current {
            kept.push(line);
        }
    }
    kept.join("\n")
}

fn frame_symbol(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let (index, symbol) = trimmed.split_once(": ")?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(symbol.trim())
}
