use std::io::{self, BufWriter, Write};

/// Buffered, line-oriented sink for Hack assembly text.
///
/// I/O errors are sticky: the first one is kept, later writes become
/// no-ops, and the stored error surfaces once at [`AsmEmitter::finish`].
/// Call sites can therefore emit freely without per-call checks.
pub struct AsmEmitter<W: Write> {
    out: BufWriter<W>,
    error: Option<io::Error>,
}

impl<W: Write> AsmEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: BufWriter::new(out),
            error: None,
        }
    }

    pub fn write_lines<S: AsRef<str>>(&mut self, lines: &[S]) {
        if self.error.is_some() {
            return;
        }

        let text = lines
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n")
            + "\n";

        if let Err(error) = self.out.write_all(text.as_bytes()) {
            self.error = Some(error);
        }
    }

    /// Flush and report the first error encountered, if any.
    pub fn finish(mut self) -> io::Result<()> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }

        self.out.flush()
    }
}
