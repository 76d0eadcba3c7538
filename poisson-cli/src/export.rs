use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use poisson_core::{Grid, SweepObserver};

/// Writes the grid one row per line, comma separated, no header. `shift` is
/// added to every value on the way out.
pub fn write_grid_csv<P: AsRef<Path>>(path: P, grid: &Grid, shift: f64) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);

    for row in grid.rows() {
        let line: Vec<String> = row.iter().map(|v| format!("{:.15e}", v + shift)).collect();
        writeln!(w, "{}", line.join(","))?;
    }
    w.flush()
}

/// Appends `metric,iteration` per sweep.
///
/// Write failures never reach the solver: the first one is logged and the
/// sink goes quiet for the rest of the run.
pub struct DiagnosticsCsv {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows: usize,
}

impl DiagnosticsCsv {
    pub fn open<P: AsRef<Path>>(path: P, append: bool) -> io::Result<DiagnosticsCsv> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)?;
        Ok(DiagnosticsCsv {
            path,
            writer: Some(BufWriter::new(file)),
            rows: 0,
        })
    }

    /// Falls back to a sink that drops everything if `path` cannot be opened.
    pub fn open_or_disabled<P: AsRef<Path>>(path: P, append: bool) -> DiagnosticsCsv {
        let path = path.as_ref();
        match DiagnosticsCsv::open(path, append) {
            Ok(sink) => sink,
            Err(e) => {
                log::warn!("diagnostics disabled, cannot open {}: {e}", path.display());
                DiagnosticsCsv {
                    path: path.to_path_buf(),
                    writer: None,
                    rows: 0,
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes buffered rows; a failure here is logged, not returned.
    pub fn finish(mut self) {
        if let Some(mut w) = self.writer.take() {
            if let Err(e) = w.flush() {
                log::warn!("flushing {} failed: {e}", self.path.display());
            }
        }
    }
}

impl SweepObserver for DiagnosticsCsv {
    fn on_sweep(&mut self, iteration: usize, metric: f64) {
        let result = match self.writer.as_mut() {
            Some(w) => writeln!(w, "{metric:.15e},{iteration}"),
            None => return,
        };
        match result {
            Ok(()) => self.rows += 1,
            Err(e) => {
                log::warn!(
                    "diagnostics write to {} failed at sweep {iteration}: {e}; disabling",
                    self.path.display()
                );
                self.writer = None;
            }
        }
    }
}
