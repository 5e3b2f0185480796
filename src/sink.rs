use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::osu::data::Page;

/// Writes one numbered line per mapset: `{index}: {id}-{title} (by {artist})`.
///
/// The index keeps counting across pages, starting at 1.
pub struct ListWriter<W: Write> {
    out: W,
    written: usize,
}

impl ListWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ListWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn write_page(&mut self, page: &Page) -> Result<()> {
        for mapset in &page.beatmapsets {
            let index = self.written + 1;
            writeln!(
                self.out,
                "{}: {}-{} (by {})",
                index, mapset.id, mapset.title, mapset.artist
            )?;
            self.written = index;
        }
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes buffered lines and returns how many were written in total.
    pub fn finish(&mut self) -> Result<usize> {
        self.out.flush()?;
        Ok(self.written)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
