//! domsnap
//!
//! Capture a live document element as a downloadable image snapshot. The
//! crate resolves an element by id, hands it to a rasterization backend,
//! encodes the resulting bitmap as a data URI, and triggers the host's
//! download mechanism through a transient anchor that is always removed
//! again, whether the export succeeds or fails.
//!
//! # Features
//!
//! - **dom backend** (default): pure-Rust document host with a deliberately
//!   naive prototype rasterizer, suitable for tests and fixtures
//! - **cdp backend**: headless Chrome via the Chrome DevTools Protocol for
//!   real rendering
//! - **Injectable rasterization**: the element-to-bitmap step is a trait,
//!   so callers and tests can swap in their own capability
//!
//! # Example
//!
//! ```no_run
//! use domsnap::Exporter;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = Exporter::new(None).await?;
//! exporter.set_content("<div id=\"recap\">2024 in review</div>").await?;
//! exporter.export_element_as_image("recap", "anime_recap_2024.png").await?;
//! exporter.close().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod export;
pub use export::{data_uri, export_element_as_image, export_with_rasterizer};

#[cfg(feature = "cdp")]
pub mod cdp;

// Pure-Rust document host (no Chrome, prototype rasterizer)
#[cfg(feature = "dom")]
pub mod dom;

// Async-friendly exporter API (simple worker-backed abstraction)
#[cfg(any(feature = "dom", feature = "cdp"))]
pub mod async_api;

// Re-export the Exporter type at the crate root for ergonomic examples
#[cfg(any(feature = "dom", feature = "cdp"))]
pub use async_api::Exporter;

/// Configuration for an export host
///
/// This struct contains the core configuration used when creating a
/// `DocumentHost` instance. The defaults are chosen to be conservative:
/// PNG output, a desktop viewport, and no download directory (the `dom`
/// backend records activations without writing files unless one is set).
///
/// # Examples
///
/// ```
/// let cfg = domsnap::ExporterConfig::default();
/// assert!(cfg.user_agent.contains("domsnap"));
/// ```
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// User agent string to send with requests
    pub user_agent: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Timeout for document loads in milliseconds
    pub timeout_ms: u64,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
    /// Image encoding for captured bitmaps
    pub format: ImageFormat,
    /// JPEG quality (0-100); ignored for PNG
    pub jpeg_quality: Option<u32>,
    /// Where the `dom` backend writes activated downloads; `None` records
    /// activations without writing files
    pub download_dir: Option<PathBuf>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 domsnap/0.1".to_string(),
            viewport: Viewport::default(),
            timeout_ms: 30000,
            headers: HashMap::new(),
            format: ImageFormat::Png,
            jpeg_quality: None,
            download_dir: None,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Image encodings a rasterizer may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// MIME type used in data URIs
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Conventional file extension (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// An encoded bitmap produced by a rasterizer
#[derive(Debug, Clone)]
pub struct Bitmap {
    /// Pixel width of the captured region
    pub width: u32,
    /// Pixel height of the captured region
    pub height: u32,
    /// Encoded image bytes (PNG or JPEG per `format`)
    pub data: Vec<u8>,
    /// Encoding of `data`
    pub format: ImageFormat,
}

/// Geometry of a resolved element's content box, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A resolved reference to a single element in the current document
///
/// Handles are cheap snapshots taken at resolve time; they do not pin the
/// underlying DOM node. Backends re-locate the element by id when they
/// rasterize.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    /// The id the element was resolved by
    pub element_id: String,
    /// Content-box geometry at resolve time
    pub region: Region,
}

/// A request to export one element as a downloadable image
///
/// Transient: created at call time, consumed by the export operation,
/// discarded afterwards.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SnapshotRequest {
    /// Id of the element to capture; must resolve to exactly one element
    pub element_id: String,
    /// Suggested download name, used verbatim (including extension)
    pub filename: String,
}

impl SnapshotRequest {
    pub fn new(element_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            filename: filename.into(),
        }
    }
}

/// Contents of a transient download anchor
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnchorSpec {
    /// Data URI the anchor points at
    pub href: String,
    /// Suggested filename carried in the `download` attribute
    pub download: String,
}

/// Identifier of an anchor inserted by a host; valid until removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorId(pub String);

impl AnchorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Record of one anchor activation, kept by hosts that model the document
/// in memory so tests can observe download triggers
#[derive(Debug, Clone)]
pub struct AnchorActivation {
    /// Suggested filename the activation carried
    pub filename: String,
    /// The activated href (a data URI on the export path)
    pub href: String,
}

/// Document surface an export drives
///
/// Backends own a current document and expose the handful of operations the
/// export operation needs: element resolution and the transient anchor
/// lifecycle. All methods are synchronous; the async facade in `async_api`
/// runs them on a dedicated worker thread.
pub trait DocumentHost {
    /// Create a new host instance with the given configuration
    fn new(config: ExporterConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load a URL and wait for the document to be ready
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Replace the current document with the given HTML
    fn set_content(&mut self, html: &str) -> Result<()>;

    /// Resolve an element id to a handle
    ///
    /// Fails with `Error::ElementNotFound` when nothing matches. The id must
    /// identify exactly one element; backends that can count matches report
    /// `Error::AmbiguousElement` for duplicates.
    fn resolve_element(&self, element_id: &str) -> Result<ElementHandle>;

    /// Insert a transient, non-visible download anchor into the document
    fn insert_anchor(&mut self, spec: &AnchorSpec) -> Result<AnchorId>;

    /// Programmatically activate a previously inserted anchor, triggering
    /// the host's download behavior
    fn activate_anchor(&mut self, id: &AnchorId) -> Result<()>;

    /// Remove a previously inserted anchor from the document
    fn remove_anchor(&mut self, id: &AnchorId) -> Result<()>;

    // --- Convenience helpers (default implementations) ---

    /// Whether an element with the given id currently resolves
    fn element_exists(&self, element_id: &str) -> bool {
        self.resolve_element(element_id).is_ok()
    }

    /// Close the host and clean up resources
    fn close(self) -> Result<()>;
}

/// Capability interface for element rasterization
///
/// The capture itself is an opaque collaborator: implementations lay out and
/// paint the element's rendered content (including descendants) however they
/// like, as long as they come back with an encoded bitmap. Tests inject
/// counting or failing fakes through this trait.
pub trait Rasterizer {
    /// Produce a bitmap of the element's rendered content
    fn rasterize(&self, element: &ElementHandle) -> Result<Bitmap>;
}

/// Create a new host instance with the default backend
///
/// This prefers the pure-Rust `dom` backend when enabled (default), because
/// it does not require Chrome. With only the `cdp` feature enabled the
/// Chrome-backed host is used instead.
#[cfg(feature = "dom")]
pub fn new_host(config: ExporterConfig) -> Result<impl DocumentHost + Rasterizer> {
    dom::DomHost::new(config)
}

// Fallback to CDP when the dom backend is not enabled but cdp is.
#[cfg(all(not(feature = "dom"), feature = "cdp"))]
pub fn new_host(config: ExporterConfig) -> Result<impl DocumentHost + Rasterizer> {
    cdp::CdpHost::new(config)
}
