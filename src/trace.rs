//! Write-only observers for the integration loop.

use tracing::trace;

/// One row of the integration trace: the state *before* a step is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceRow {
    /// Stage that produced the row.
    pub component: &'static str,
    /// Step index, starting at zero.
    pub step: u64,
    /// Source-like process value.
    pub source: f64,
    /// Noise-like process value.
    pub noise: f64,
}

/// Receives trace rows. Sinks cannot influence the simulation.
pub trait TraceSink {
    /// Records a row.
    fn record(&mut self, row: TraceRow);
}

/// Discards every row.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn record(&mut self, _row: TraceRow) {}
}

/// Forwards rows to `tracing` at trace level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn record(&mut self, row: TraceRow) {
        trace!(
            component = row.component,
            step = row.step,
            source = row.source,
            noise = row.noise
        );
    }
}

impl TraceSink for Vec<TraceRow> {
    fn record(&mut self, row: TraceRow) {
        self.push(row);
    }
}

impl<S: TraceSink + ?Sized> TraceSink for &mut S {
    fn record(&mut self, row: TraceRow) {
        (**self).record(row);
    }
}
