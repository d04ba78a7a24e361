//! Report output for text vs JSON rendering
//!
//! All report output flows through [`OutputWriter`], which owns the format switch and
//! whether ANSI colors are emitted. Color is only used for text written to a terminal;
//! JSON output and redirected text are always plain, and `NO_COLOR` disables it too.

use std::io::{IsTerminal, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes audit reports in the selected format.
///
/// Handlers call `writer.render(&payload)` where `payload`
/// implements both `Serialize` (for JSON) and `Render` (for text).
pub struct OutputWriter {
    format: OutputFormat,
    color: bool,
}

impl OutputWriter {
    /// Create a writer for `format`, coloring text only when stdout is a terminal.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lockwarden_cli::output::OutputWriter;
    /// use lockwarden_cli::cli::OutputFormat;
    ///
    /// let writer = OutputWriter::new(OutputFormat::Text);
    /// ```
    pub fn new(format: OutputFormat) -> Self {
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self::with_color(format, color)
    }

    /// Create a writer with an explicit color choice. JSON is never colored.
    pub fn with_color(format: OutputFormat, color: bool) -> Self {
        Self {
            format,
            color: color && format == OutputFormat::Text,
        }
    }

    /// Whether text output carries ANSI colors.
    pub fn colored(&self) -> bool {
        self.color
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Render a payload to an arbitrary writer.
    ///
    /// Text goes through `Render::render_text()` with the color choice applied;
    /// JSON is pretty-printed via `serde_json` with a trailing newline.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => {
                colored::control::set_override(self.color);
                payload.render_text(w)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable text rendering, implemented alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}
