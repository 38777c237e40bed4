use crate::{DocumentHost, Error, ExporterConfig, Rasterizer, Result, SnapshotRequest};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    LoadUrl(String, oneshot::Sender<Result<()>>),
    SetContent(String, oneshot::Sender<Result<()>>),
    Export(SnapshotRequest, oneshot::Sender<Result<()>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly exporter backed by a dedicated worker thread.
///
/// The worker thread owns a synchronous host instance and executes commands
/// sent from async tasks so callers can use an async interface without
/// requiring the host to be `Send` across threads. Awaiting `export` is the
/// operation's single suspension point; while it is pending the caller's
/// runtime stays free to run other work.
#[derive(Clone)]
pub struct Exporter {
    cmd_tx: Sender<Command>,
}

impl Exporter {
    /// Create a new exporter over the default backend (spawns a background
    /// thread that owns the host).
    pub async fn new(config: Option<ExporterConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        Self::with_backend(move || default_host(config)).await
    }

    /// Create an exporter over a caller-supplied backend.
    ///
    /// The factory runs on the worker thread, so the host never has to
    /// cross threads. This is the injection seam for custom rasterization
    /// backends and for tests.
    pub async fn with_backend<H, F>(factory: F) -> Result<Self>
    where
        H: DocumentHost + Rasterizer + 'static,
        F: FnOnce() -> Result<H> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize the host on the worker thread
            let mut host = match factory() {
                Ok(h) => h,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            // Signal successful creation (no-op when previous send returned Err)
            let _ = init_tx.send(Ok(()));

            // Command loop
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::LoadUrl(url, resp) => {
                        let res = host.load_url(&url);
                        let _ = resp.send(res);
                    }
                    Command::SetContent(html, resp) => {
                        let res = host.set_content(&html);
                        let _ = resp.send(res);
                    }
                    Command::Export(request, resp) => {
                        let res = crate::export::export_element_as_image(&mut host, &request);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let res = host.close();
                        let _ = resp.send(res);
                        break;
                    }
                }
            }
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Load a URL into the worker's document
    pub async fn load_url(&self, url: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::LoadUrl(url.to_string(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("LoadUrl canceled: {}", e)))?
    }

    /// Replace the worker's document with the given HTML
    pub async fn set_content(&self, html: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::SetContent(html.to_string(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("SetContent canceled: {}", e)))?
    }

    /// Export one element as a downloadable image
    ///
    /// Resolves the element, rasterizes it, and drives the transient
    /// download anchor on the worker thread; the returned future completes
    /// when the anchor has been activated and removed again.
    pub async fn export(&self, request: SnapshotRequest) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Export(request, tx));
        rx.await
            .map_err(|e| Error::Other(format!("Export canceled: {}", e)))?
    }

    /// Convenience: build the request inline
    pub async fn export_element_as_image(&self, element_id: &str, filename: &str) -> Result<()> {
        self.export(SnapshotRequest::new(element_id, filename)).await
    }

    /// Shutdown the background worker and close the host
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}

// The worker constructs its backend in-thread; prefer the pure-Rust host
// when the feature is enabled (it does not require Chrome).
#[cfg(feature = "dom")]
fn default_host(config: ExporterConfig) -> Result<crate::dom::DomHost> {
    crate::dom::DomHost::new(config)
}

#[cfg(all(not(feature = "dom"), feature = "cdp"))]
fn default_host(config: ExporterConfig) -> Result<crate::cdp::CdpHost> {
    crate::cdp::CdpHost::new(config)
}
