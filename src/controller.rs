//! Form controller: validates input, runs one download at a time on the
//! Tokio runtime and folds the outcome back into [`FormState`].
//!
//! The UI calls [`FormController::submit`] on click and
//! [`FormController::poll`] once per frame. Nothing here blocks.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{
    runtime::Handle,
    sync::{
        mpsc::{UnboundedReceiver, unbounded_channel},
        oneshot::{self, error::TryRecvError},
    },
    task::JoinHandle,
};
use tracing::{error, info, warn};

use crate::{
    client::BackendClient,
    config::AppConfig,
    error::{DownloadError, Result},
    model::{DownloadRequest, FormState},
    progress::{DownloadProgress, ProgressReporter},
    save::SavedFile,
};

/// Called from the download task once it has a result, e.g. to wake the UI.
pub type RepaintHook = Arc<dyn Fn() + Send + Sync>;

/// The running request: abort handle plus its result and progress channels
struct InFlight {
    handle: JoinHandle<()>,
    result_rx: oneshot::Receiver<Result<SavedFile>>,
    progress_rx: UnboundedReceiver<DownloadProgress>,
}

pub struct FormController {
    /// Fields the form binds to
    pub state: FormState,
    download_dir: PathBuf,
    client: BackendClient,
    runtime: Handle,
    in_flight: Option<InFlight>,
    progress: Option<DownloadProgress>,
    last_saved: Option<SavedFile>,
    repaint: Option<RepaintHook>,
}

impl FormController {
    pub fn new(client: BackendClient, download_dir: PathBuf, runtime: Handle) -> Self {
        Self {
            state: FormState::default(),
            download_dir,
            client,
            runtime,
            in_flight: None,
            progress: None,
            last_saved: None,
            repaint: None,
        }
    }

    pub fn from_config(config: &AppConfig, runtime: Handle) -> Result<Self> {
        let client = BackendClient::new(config.backend_url.clone(), config.request_timeout())?;
        let mut controller = Self::new(client, config.download_dir.clone(), runtime);
        controller.state.format = config.default_format;
        Ok(controller)
    }

    pub fn with_repaint(mut self, hook: RepaintHook) -> Self {
        self.repaint = Some(hook);
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn set_download_dir(&mut self, dir: PathBuf) {
        self.download_dir = dir;
    }

    pub fn progress(&self) -> Option<DownloadProgress> {
        self.progress
    }

    pub fn last_saved(&self) -> Option<&SavedFile> {
        self.last_saved.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    /// Starts a download for the current URL and format.
    ///
    /// Returns false when the URL is blank; the validation message is set and
    /// no request is made. A request still in flight is aborted first.
    pub fn submit(&mut self) -> bool {
        let url = self.state.url.trim().to_string();
        if url.is_empty() {
            self.state.message = DownloadError::Validation.status_message();
            return false;
        }

        if let Some(previous) = self.in_flight.take() {
            warn!("superseding a download that is still in flight");
            previous.handle.abort();
        }

        let request = DownloadRequest {
            url,
            format: self.state.format,
        };
        info!(url = %request.url, format = %request.format, "submitting download");

        self.state.loading = true;
        self.state.message.clear();
        self.progress = None;

        let (result_tx, result_rx) = oneshot::channel();
        let (progress_tx, progress_rx) = unbounded_channel();
        let client = self.client.clone();
        let dir = self.download_dir.clone();
        let repaint = self.repaint.clone();

        let handle = self.runtime.spawn(async move {
            let reporter = ProgressReporter::new(progress_tx);
            let result = client.download_to(&request, &dir, Some(reporter)).await;
            let _ = result_tx.send(result);
            if let Some(repaint) = repaint {
                repaint();
            }
        });

        self.in_flight = Some(InFlight {
            handle,
            result_rx,
            progress_rx,
        });
        true
    }

    /// Drains progress and settles the request once it has finished.
    pub fn poll(&mut self) {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return;
        };

        while let Ok(progress) = in_flight.progress_rx.try_recv() {
            self.progress = Some(progress);
        }

        let outcome = match in_flight.result_rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => Err(DownloadError::Runtime(
                "a tarefa terminou sem resultado".to_string(),
            )),
        };

        self.in_flight = None;
        self.settle(outcome);
    }

    /// Aborts the in-flight request. Its partial file is discarded.
    ///
    /// A request that already finished is settled with its own outcome
    /// instead, and false is returned as nothing was cancelled.
    pub fn cancel(&mut self) -> bool {
        let Some(mut in_flight) = self.in_flight.take() else {
            return false;
        };

        if let Ok(outcome) = in_flight.result_rx.try_recv() {
            self.settle(outcome);
            return false;
        }

        in_flight.handle.abort();
        self.settle(Err(DownloadError::Cancelled));
        true
    }

    fn settle(&mut self, outcome: Result<SavedFile>) {
        match outcome {
            Ok(saved) => {
                info!(path = %saved.path.display(), bytes = saved.bytes, "download saved");
                self.state.message = format!("Download concluído com sucesso: {}", saved.file_name());
                self.last_saved = Some(saved);
            }
            Err(err) => {
                match &err {
                    DownloadError::Server { .. } | DownloadError::Cancelled => {
                        warn!(error = %err, "download failed")
                    }
                    _ => error!(error = %err, "download failed"),
                }
                self.state.message = err.status_message();
            }
        }
        self.state.loading = false;
        self.progress = None;
    }
}

impl Drop for FormController {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}
