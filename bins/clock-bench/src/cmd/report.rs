use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

use super::config::Layout;

// ═══════════════════════════════════════════════════════════════
//  Phase timings
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Generate and write all records.
    Store,
    /// Random single-record reads.
    LookupSingle,
    /// Read the whole partition back.
    LookupAll,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Store => f.write_str("store"),
            Phase::LookupSingle => f.write_str("lookup-single"),
            Phase::LookupAll => f.write_str("lookup-all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTiming {
    pub batch: u32,
    pub layout: Layout,
    pub phase: Phase,
    /// Records written or read.
    pub items: usize,
    /// Lookups that found nothing.
    pub misses: usize,
    pub elapsed: Duration,
}

impl PhaseTiming {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Receives phase results as the benchmark progresses. A write error
/// aborts the run.
pub trait ReportSink {
    fn batch_started(&mut self, _batch: u32) -> io::Result<()> {
        Ok(())
    }

    fn phase(&mut self, timing: &PhaseTiming) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Summary
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub layout: Layout,
    pub phase: Phase,
    pub runs: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Aggregate timings per (layout, phase), ordered by layout then phase.
pub fn summarize(timings: &[PhaseTiming]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(Layout, Phase), Vec<f64>> = BTreeMap::new();
    for t in timings {
        groups.entry((t.layout, t.phase)).or_default().push(t.elapsed_ms());
    }
    groups
        .into_iter()
        .map(|((layout, phase), ms)| {
            let runs = ms.len();
            let sum: f64 = ms.iter().sum();
            SummaryRow {
                layout,
                phase,
                runs,
                mean_ms: sum / runs as f64,
                min_ms: ms.iter().copied().fold(f64::INFINITY, f64::min),
                max_ms: ms.iter().copied().fold(0.0, f64::max),
            }
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════
//  Console report
// ═══════════════════════════════════════════════════════════════

/// Human-readable report: one line per phase, summary table at the end.
pub struct ConsoleReport<W: Write> {
    out: W,
    timings: Vec<PhaseTiming>,
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W) -> Self {
        Self { out, timings: Vec::new() }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for ConsoleReport<W> {
    fn batch_started(&mut self, batch: u32) -> io::Result<()> {
        writeln!(self.out, "Batch # {batch}")
    }

    fn phase(&mut self, t: &PhaseTiming) -> io::Result<()> {
        let ms = t.elapsed_ms();
        let line = match t.phase {
            Phase::Store => format!("Storing {} ({}): {ms:.3}ms", t.items, t.layout),
            Phase::LookupSingle => format!("Looking up single item {} times ({}): {ms:.3}ms", t.items, t.layout),
            Phase::LookupAll => format!("Get {} items back as list ({}): {ms:.3}ms", t.items, t.layout),
        };
        writeln!(self.out, "{line}")?;
        if t.misses > 0 {
            writeln!(self.out, "  not found: {}", t.misses)?;
        }
        tracing::debug!(
            batch = t.batch,
            layout = %t.layout,
            phase = %t.phase,
            items = t.items,
            misses = t.misses,
            elapsed_ms = format_args!("{ms:.3}"),
            "phase complete"
        );
        self.timings.push(t.clone());
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        let rows = summarize(&self.timings);
        if rows.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        writeln!(self.out, "Summary")?;
        for r in rows {
            writeln!(
                self.out,
                "  {:<12} {:<14} runs {:>3}  mean {:>10.3}ms  min {:>10.3}ms  max {:>10.3}ms",
                r.layout.to_string(),
                r.phase.to_string(),
                r.runs,
                r.mean_ms,
                r.min_ms,
                r.max_ms
            )?;
        }
        self.out.flush()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Recording report (tests)
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
#[derive(Default)]
pub struct RecordingReport {
    pub batches: Vec<u32>,
    pub timings: Vec<PhaseTiming>,
    pub finished: bool,
}

#[cfg(test)]
impl ReportSink for RecordingReport {
    fn batch_started(&mut self, batch: u32) -> io::Result<()> {
        self.batches.push(batch);
        Ok(())
    }

    fn phase(&mut self, timing: &PhaseTiming) -> io::Result<()> {
        self.timings.push(timing.clone());
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writer whose every write fails, like stdout after the reader went away.
#[cfg(test)]
pub struct BrokenPipe;

#[cfg(test)]
impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }
}
