//! Spec persistence: save a resolved spec as formatted JSON and load one
//! back for a display collaborator.

use crate::error::{Result, VizSpecError};
use crate::spec::ChartSpec;
use log::debug;
use std::path::Path;

/// Write a resolved spec to `path` as pretty-printed JSON.
pub fn save_spec(path: impl AsRef<Path>, spec: &ChartSpec) -> Result<()> {
    let text = serde_json::to_string_pretty(spec)?;
    std::fs::write(path.as_ref(), text)?;
    debug!("saved spec to {}", path.as_ref().display());
    Ok(())
}

/// Load a spec from `path`. Malformed input fails with a `ParseError`.
pub fn load_spec(path: impl AsRef<Path>) -> Result<ChartSpec> {
    let text = std::fs::read_to_string(path.as_ref())?;
    serde_json::from_str(&text).map_err(|err| {
        VizSpecError::parse_error(format!(
            "malformed spec at {}: {err}",
            path.as_ref().display()
        ))
    })
}

/// Collaborator that consumes a loaded spec, e.g. a rendering engine shim.
pub trait SpecDisplay {
    fn display(&mut self, spec: &ChartSpec) -> Result<()>;
}

/// Display collaborator that pretty-prints the spec to a writer.
pub struct WriterDisplay<W: std::io::Write> {
    writer: W,
}

impl<W: std::io::Write> WriterDisplay<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: std::io::Write> SpecDisplay for WriterDisplay<W> {
    fn display(&mut self, spec: &ChartSpec) -> Result<()> {
        let text = serde_json::to_string_pretty(spec)?;
        writeln!(self.writer, "{text}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_rejects_malformed_input() {
        let dir = std::env::temp_dir();
        let path = dir.join("vizspec_malformed_test.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_spec(&path).unwrap_err();
        assert!(matches!(err, VizSpecError::ParseError(..)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_display_writes_formatted_spec() {
        let spec: ChartSpec =
            serde_json::from_value(json!({"scales": [{"name": "x", "type": "quantitative"}]}))
                .unwrap();
        let mut buffer = Vec::new();
        WriterDisplay::new(&mut buffer).display(&spec).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("\"quantitative\""));
    }
}
