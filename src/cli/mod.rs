use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "transcript_fetcher",
    about = "Transcript Fetcher - Fetch or list YouTube transcripts as one line of JSON",
    version,
    long_about = "Fetches the transcript of a YouTube video (or lists the transcript tracks it offers) and prints the outcome as a single JSON line on stdout. Failures are reported inside the JSON record, never as a crash."
)]
pub struct Cli {
    /// Video identifier (e.g. dQw4w9WgXcQ)
    #[arg(value_name = "VIDEO_ID", allow_hyphen_values = true)]
    pub video_id: Option<String>,

    /// Mode: "list" lists available transcripts, anything else fetches one
    #[arg(value_name = "MODE", allow_hyphen_values = true)]
    pub mode: Option<String>,

    /// Further positional arguments are accepted and ignored
    #[arg(value_name = "IGNORED", hide = true)]
    pub rest: Vec<String>,

    /// Preferred language code, tried in the given order (repeatable)
    #[arg(short, long = "language", value_name = "LANG")]
    pub languages: Vec<String>,

    /// Translate the selected transcript into this language code
    #[arg(long, value_name = "LANG")]
    pub translate: Option<String>,

    /// Configuration file (YAML)
    #[arg(short, long, value_name = "FILE", env = "TRANSCRIPT_FETCHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (stderr)
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON (stderr)
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        self.mode.as_deref().map(Mode::from).unwrap_or_default()
    }
}

/// Operation selected by the second positional argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Fetch one transcript
    #[default]
    Fetch,
    /// List the available transcript tracks
    List,
}

impl From<&str> for Mode {
    fn from(value: &str) -> Self {
        match value {
            "list" => Mode::List,
            _ => Mode::Fetch,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Fetch => write!(f, "transcript"),
            Mode::List => write!(f, "list"),
        }
    }
}
