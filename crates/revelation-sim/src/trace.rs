//! Line-oriented rendering of the trace stream.

use std::io::{self, Write};

use revelation_core::{TraceEvent, TraceSink};

/// [`TraceSink`] writing one line per event.
///
/// The first write error stops further output and is returned by
/// [`TracePrinter::finish`].
#[derive(Debug)]
pub struct TracePrinter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TracePrinter<W> {
    /// Printer writing to `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Flushes the output and hands it back.
    ///
    /// # Errors
    ///
    /// Returns the first error hit while printing or flushing.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> TraceSink for TracePrinter<W> {
    fn on_event(&mut self, event: TraceEvent) {
        if self.error.is_some() {
            return;
        }
        if let Err(error) = writeln!(self.out, "{}", format_event(&event)) {
            log::warn!("trace output failed: {error}");
            self.error = Some(error);
        }
    }
}

/// Renders one event.
///
/// Every line starts with the executing core id; instruction lines are
/// flush left and their effects are indented beneath them.
#[must_use]
pub fn format_event(event: &TraceEvent) -> String {
    match *event {
        TraceEvent::InstructionStart {
            coreid,
            pc,
            word,
            mnemonic,
        } => format!("{coreid:03x} {pc:08x} {word:08x} {mnemonic}"),
        TraceEvent::RegisterWrite {
            coreid,
            register,
            value,
        } => format!(
            "{coreid:03x}     {} <= {value:#010x}",
            register.descriptor().name
        ),
        TraceEvent::MemoryWrite {
            coreid,
            address,
            bytes,
            value,
        } => format!("{coreid:03x}     mem[{address:#010x}] <= {value:#x} ({bytes} bytes)"),
        TraceEvent::InstructionRetired { coreid, pc, cycles } => {
            format!("{coreid:03x}     retired {pc:#010x} in {cycles} cycles")
        }
        TraceEvent::HardwareLoop {
            coreid,
            start,
            remaining,
        } => format!("{coreid:03x}     loop to {start:#010x}, {remaining} left"),
        TraceEvent::InterruptDispatched {
            coreid,
            level,
            iret,
        } => format!("{coreid:03x}     interrupt {level} taken, IRET = {iret:#010x}"),
        TraceEvent::FaultRaised { coreid, pc, fault } => {
            format!("{coreid:03x}     fault at {pc:#010x}: {fault}")
        }
    }
}
