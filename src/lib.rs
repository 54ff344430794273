//! Desktop form that sends a video URL and output format to a download
//! service and saves the file it returns.

// Request/response plumbing for the download service
pub mod client;
// Settings file and environment overrides
pub mod config;
// Filename suggested by the response headers
pub mod content_disposition;
// Form state machine and the in-flight task
pub mod controller;
// Error taxonomy shown on the status line
pub mod error;
// Tracing subscriber setup
pub mod logging;
// Form state and wire types
pub mod model;
// Byte progress of the running download
pub mod progress;
// Temp file + persist into the download folder
pub mod save;
