pub mod process;
pub mod schema_gen;
pub mod sqlite;

pub use process::*;
pub use sqlite::*;

use anyhow::{Context, Result};
use std::io::Write;

use crate::fitting::CanonicalFitting;

/// Destination for accepted fittings
pub trait FittingSink {
    fn accept(&mut self, fitting: CanonicalFitting) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

/// Writes one JSON document per fitting per line
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FittingSink for JsonLinesSink<W> {
    fn accept(&mut self, fitting: CanonicalFitting) -> Result<()> {
        serde_json::to_writer(&mut self.out, &fitting)
            .with_context(|| format!("Failed to write fitting {}", fitting.id))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush output")
    }
}
