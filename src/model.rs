use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix every failure message starts with; also drives the status colour.
pub const ERROR_PREFIX: &str = "Erro";

/// Output kind requested from the download service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// MP4 video (default)
    #[default]
    Mp4,
    /// WebM video
    Webm,
    /// MP3 audio only
    Mp3,
}

impl OutputFormat {
    /// All formats in the order the selector shows them.
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Mp4, OutputFormat::Webm, OutputFormat::Mp3];

    /// File extension, also the wire value.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Webm => "webm",
            OutputFormat::Mp3 => "mp3",
        }
    }

    /// Human-readable label for the format selector.
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "MP4 (Vídeo)",
            OutputFormat::Webm => "WebM (Vídeo)",
            OutputFormat::Mp3 => "MP3 (Áudio)",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// JSON body of `POST /download`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Trimmed video URL
    pub url: String,
    /// Requested output format
    pub format: OutputFormat,
}

/// Display phase of the form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Transient state backing the form; lives as long as the window.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    /// Text in the URL field
    pub url: String,
    /// Selected output format
    pub format: OutputFormat,
    /// True while a request is in flight
    pub loading: bool,
    /// Last status or error line; empty when nothing to show
    pub message: String,
}

impl FormState {
    /// Whether the current message reports a failure.
    pub fn is_error(&self) -> bool {
        self.message.starts_with(ERROR_PREFIX)
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.message.is_empty() {
            Phase::Idle
        } else if self.is_error() {
            Phase::Error
        } else {
            Phase::Success
        }
    }

    /// Inputs and the submit button are disabled exactly while loading.
    pub fn inputs_enabled(&self) -> bool {
        !self.loading
    }
}
