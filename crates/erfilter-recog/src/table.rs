//! Character transition probability table
//!
//! A square matrix of label-to-label transition weights, indexed by the
//! recognizer's label indices. Loaded once before recognition and shared
//! read-only by every sequence solve.
//!
//! # Format
//!
//! ```text
//! p00 p01 ... p0N\n
//! p10 p11 ... p1N\n
//! ...
//! ```
//!
//! One row per line, values separated by whitespace. Blank lines are
//! ignored. Values are written with the shortest representation that reads
//! back to the same `f64`.

use crate::error::{RecogError, RecogResult};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{error, warn};

/// Square table of transition weights
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTable {
    size: usize,
    values: Vec<f64>,
}

impl TransitionTable {
    /// Create a `size` x `size` table filled with zeros
    pub fn new(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Build a table from its rows.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::InvalidTable`] if the rows do not form a square
    /// matrix.
    pub fn from_rows(rows: &[Vec<f64>]) -> RecogResult<Self> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(RecogError::InvalidTable(format!(
                    "row {i} has {} values, expected {size}",
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Ok(Self { size, values })
    }

    /// Number of labels covered by the table
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Weight of the transition `from` -> `to`, `None` out of range
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        (from < self.size && to < self.size).then(|| self.values[from * self.size + to])
    }

    /// Weight between two optional label indices.
    ///
    /// Unknown labels and out-of-range indices weigh 0.
    pub fn weight(&self, from: Option<usize>, to: Option<usize>) -> f64 {
        match (from, to) {
            (Some(a), Some(b)) => self.get(a, b).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Set the weight of the transition `from` -> `to`.
    pub fn set(&mut self, from: usize, to: usize, value: f64) -> RecogResult<()> {
        if from >= self.size || to >= self.size {
            return Err(RecogError::InvalidParameter(format!(
                "transition ({from}, {to}) outside a {0}x{0} table",
                self.size
            )));
        }
        self.values[from * self.size + to] = value;
        Ok(())
    }

    /// Read a `size` x `size` table from a reader.
    pub fn read_from_reader(reader: &mut impl Read, size: usize) -> RecogResult<Self> {
        let reader = BufReader::new(reader);
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(size);

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let row = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<f64>().map_err(|e| {
                        RecogError::InvalidTable(format!(
                            "line {}: cannot parse {token:?}: {e}",
                            lineno + 1
                        ))
                    })
                })
                .collect::<RecogResult<Vec<f64>>>()?;

            if row.len() != size {
                warn!(
                    line = lineno + 1,
                    values = row.len(),
                    expected = size,
                    "rejected transition table row"
                );
                return Err(RecogError::InvalidTable(format!(
                    "line {} has {} values, expected {size}",
                    lineno + 1,
                    row.len()
                )));
            }
            rows.push(row);
        }

        if rows.len() != size {
            return Err(RecogError::InvalidTable(format!(
                "{} rows, expected {size}",
                rows.len()
            )));
        }
        Self::from_rows(&rows)
    }

    /// Read a table from a text file.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::TableIo`] if the file cannot be opened. The
    /// failure is also logged; the caller decides whether to continue
    /// without a table.
    pub fn read_from_file(path: impl AsRef<Path>, size: usize) -> RecogResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| {
            error!(path = %path.display(), %source, "cannot open transition table");
            RecogError::TableIo {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::read_from_reader(&mut BufReader::new(file), size)
    }

    /// Read a table from a byte slice.
    pub fn read_from_bytes(data: &[u8], size: usize) -> RecogResult<Self> {
        let mut cursor = data;
        Self::read_from_reader(&mut cursor, size)
    }

    /// Write the table to a writer.
    pub fn write_to_writer(&self, writer: &mut impl Write) -> RecogResult<()> {
        for row in self.values.chunks(self.size.max(1)) {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
        Ok(())
    }

    /// Write the table to a text file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> RecogResult<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| RecogError::TableIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the table to a byte vector.
    pub fn write_to_bytes(&self) -> RecogResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to_writer(&mut buf)?;
        Ok(buf)
    }
}
