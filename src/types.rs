use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// Which renderer a run should display progress with.
///
/// - `Auto`: plain lines on an interactive stderr, `tracing` events otherwise.
/// - `Lines`: always plain lines on stderr.
/// - `Log`: always `tracing` events.
/// - `Quiet`: no progress output at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    #[default]
    Auto,
    Lines,
    Log,
    Quiet,
}

impl FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(RendererKind::Auto),
            "lines" => Ok(RendererKind::Lines),
            "log" => Ok(RendererKind::Log),
            "quiet" => Ok(RendererKind::Quiet),
            other => Err(format!(
                "invalid renderer: {other} (expected \"auto\", \"lines\", \"log\" or \"quiet\")"
            )),
        }
    }
}
