//! Output sinks for cycle records: a coloured console view and a CSV file.

use std::{
    fs::File,
    io::{self, BufWriter, Stdout, Write},
    path::Path,
};

use crate::{cycle::CycleRecord, error::FusionError};

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_GRAY: &str = "\x1b[90m";
const COLOR_YELLOW: &str = "\x1b[33m";
const COLOR_CYAN: &str = "\x1b[36m";
const COLOR_GREEN: &str = "\x1b[32m";

/// Header row of the CSV output.
pub const CSV_HEADER: &str = "cycle,gyro_rate,accel_angle,fused_angle";

/// A destination for cycle records.
pub trait CycleSink {
    /// Record the outcome of one cycle.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Io`] if the underlying writer fails.
    fn record(&mut self, record: &CycleRecord) -> Result<(), FusionError>;

    /// Flush any buffered output. Called once after the last cycle.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Io`] if the underlying writer fails.
    fn finish(&mut self) -> Result<(), FusionError> {
        Ok(())
    }
}

impl<S: CycleSink + ?Sized> CycleSink for Box<S> {
    fn record(&mut self, record: &CycleRecord) -> Result<(), FusionError> {
        (**self).record(record)
    }

    fn finish(&mut self) -> Result<(), FusionError> {
        (**self).finish()
    }
}

/// Human-readable, one line per cycle.
#[derive(Debug)]
pub struct ConsoleSink<W = Stdout> {
    out: W,
    color: bool,
}

impl ConsoleSink<Stdout> {
    /// Print to standard output.
    #[must_use]
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Print to `out`, with ANSI colours if `color` is set.
    #[must_use]
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    /// Consume the sink and return the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CycleSink for ConsoleSink<W> {
    fn record(&mut self, record: &CycleRecord) -> Result<(), FusionError> {
        let (gray, yellow, cyan, green, reset) = if self.color {
            (COLOR_GRAY, COLOR_YELLOW, COLOR_CYAN, COLOR_GREEN, COLOR_RESET)
        } else {
            ("", "", "", "", "")
        };

        writeln!(
            self.out,
            "{gray}[Cycle {:03}] {reset}Accel: {yellow}{:6.2} deg{reset} | \
             Gyro: {cyan}{:6.2} deg/s{reset} | Fused: {green}{:6.2} deg{reset}",
            record.cycle, record.reading.accel_angle, record.reading.gyro_rate, record.fused_angle,
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), FusionError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Comma separated values, one row per cycle, preceded by [`CSV_HEADER`].
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    out: W,
}

impl CsvSink<BufWriter<File>> {
    /// Create (or truncate) the file at `path` and write the header.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Io`] if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, FusionError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvSink<W> {
    /// Write the header to `out` and return the sink.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Io`] if the header cannot be written.
    pub fn new(mut out: W) -> Result<Self, FusionError> {
        writeln!(out, "{CSV_HEADER}")?;
        Ok(Self { out })
    }

    /// Flush and return the writer.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Io`] if flushing fails.
    pub fn into_inner(mut self) -> Result<W, FusionError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> CycleSink for CsvSink<W> {
    fn record(&mut self, record: &CycleRecord) -> Result<(), FusionError> {
        writeln!(
            self.out,
            "{},{:.4},{:.4},{:.4}",
            record.cycle, record.reading.gyro_rate, record.reading.accel_angle, record.fused_angle,
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), FusionError> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SensorReading;

    fn record() -> CycleRecord {
        CycleRecord {
            cycle: 7,
            reading: SensorReading {
                accel_angle: 12.345,
                gyro_rate: -1.5,
            },
            fused_angle: 12.0,
        }
    }

    #[test]
    fn console_line_without_color() {
        let mut sink = ConsoleSink::new(Vec::new(), false);
        sink.record(&record()).unwrap();

        let line = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            line,
            "[Cycle 007] Accel:  12.35 deg | Gyro:  -1.50 deg/s | Fused:  12.00 deg\n"
        );
    }

    #[test]
    fn console_line_with_color() {
        let mut sink = ConsoleSink::new(Vec::new(), true);
        sink.record(&record()).unwrap();

        let line = String::from_utf8(sink.into_inner()).unwrap();
        assert!(line.starts_with("\x1b[90m[Cycle 007] \x1b[0m"));
        assert!(line.contains("\x1b[32m 12.00 deg\x1b[0m"));
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.record(&record()).unwrap();
        sink.record(&CycleRecord {
            cycle: 8,
            ..record()
        })
        .unwrap();

        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                CSV_HEADER,
                "7,-1.5000,12.3450,12.0000",
                "8,-1.5000,12.3450,12.0000"
            ]
        );
    }

    #[test]
    fn csv_file_is_flushed_on_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        sink.record(&record()).unwrap();
        sink.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{CSV_HEADER}\n7,-1.5000,12.3450,12.0000\n"));
    }

    #[test]
    fn csv_create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("log.csv");

        assert!(matches!(CsvSink::create(path), Err(FusionError::Io(_))));
    }
}
