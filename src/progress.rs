use tokio::sync::mpsc::UnboundedSender;

/// Bytes received so far for the in-flight response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    pub received: u64,
    /// From `Content-Length`, when the server sent one
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Completed fraction in 0.0..=1.0, or None when the size is unknown.
    pub fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.received as f64 / total as f64).min(1.0) as f32),
            None => None,
        }
    }
}

/// Forwards byte counts to the UI; a closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: UnboundedSender<DownloadProgress>,
    total: Option<u64>,
    received: u64,
}

impl ProgressReporter {
    pub fn new(tx: UnboundedSender<DownloadProgress>) -> Self {
        Self {
            tx,
            total: None,
            received: 0,
        }
    }

    /// Expected body size, once the response headers are in.
    pub fn set_total(&mut self, total: Option<u64>) {
        self.total = total;
    }

    pub fn advance(&mut self, bytes: usize) {
        self.received += bytes as u64;
        let _ = self.tx.send(DownloadProgress {
            received: self.received,
            total: self.total,
        });
    }
}
