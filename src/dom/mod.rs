//! Pure-Rust document host with a prototype rasterizer.
//!
//! `DomHost` fetches (or accepts inline) HTML, resolves elements with
//! `scraper`, and models the transient download-anchor lifecycle in memory
//! so the export path can be exercised without a browser. Activations are
//! recorded and, when a download directory is configured, the decoded image
//! is written there under the suggested filename.

use crate::{
    AnchorActivation, AnchorId, AnchorSpec, Bitmap, DocumentHost, ElementHandle, Error,
    ExporterConfig, ImageFormat, Rasterizer, Region, Result,
};
use base64::Engine as Base64Engine;
use log::debug;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::time::Duration;

pub mod layout;
pub mod paint;

pub struct DomHost {
    client: Client,
    config: ExporterConfig,
    last_html: Option<String>,
    last_url: Option<String>,
    anchors: Vec<(AnchorId, AnchorSpec)>,
    activations: Vec<AnchorActivation>,
    next_anchor: u64,
}

impl DomHost {
    /// Anchor activations recorded since the host was created
    pub fn anchor_activations(&self) -> &[AnchorActivation] {
        &self.activations
    }

    /// Number of transient anchors currently attached to the document
    pub fn attached_anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Final URL of the current document, if one was loaded
    pub fn current_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    // Locate the element's text content by id; the handle does not pin the
    // node, so rasterization re-parses like every other query.
    fn element_text(&self, element_id: &str) -> Result<String> {
        let html = self
            .last_html
            .as_ref()
            .ok_or_else(|| Error::LoadError("No document loaded".into()))?;
        let document = Html::parse_document(html);
        let sel = Selector::parse("[id]").unwrap();
        document
            .select(&sel)
            .find(|node| node.value().attr("id") == Some(element_id))
            .map(|node| node.text().collect::<String>())
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))
    }
}

impl DocumentHost for DomHost {
    fn new(config: ExporterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                Error::InitializationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            last_html: None,
            last_url: None,
            anchors: Vec::new(),
            activations: Vec::new(),
            next_anchor: 0,
        })
    }

    fn load_url(&mut self, url: &str) -> Result<()> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", self.config.user_agent.clone())
            .send()
            .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", url, e)))?;

        let body = resp
            .text()
            .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;

        self.last_html = Some(body);
        self.last_url = Some(url.to_string());
        Ok(())
    }

    fn set_content(&mut self, html: &str) -> Result<()> {
        self.last_html = Some(html.to_string());
        self.last_url = Some("about:blank".to_string());
        Ok(())
    }

    fn resolve_element(&self, element_id: &str) -> Result<ElementHandle> {
        let html = self
            .last_html
            .as_ref()
            .ok_or_else(|| Error::LoadError("No document loaded".into()))?;

        let document = Html::parse_document(html);
        let sel = Selector::parse("[id]").unwrap();
        let matches: Vec<_> = document
            .select(&sel)
            .filter(|node| node.value().attr("id") == Some(element_id))
            .collect();

        match matches.len() {
            0 => Err(Error::ElementNotFound(element_id.to_string())),
            1 => {
                let text = matches[0].text().collect::<String>();
                let tl = layout::layout_text(&text, self.config.viewport.width);
                Ok(ElementHandle {
                    element_id: element_id.to_string(),
                    region: Region {
                        x: 0.0,
                        y: 0.0,
                        width: tl.rect.width as f64,
                        height: tl.rect.height as f64,
                    },
                })
            }
            _ => Err(Error::AmbiguousElement(element_id.to_string())),
        }
    }

    fn insert_anchor(&mut self, spec: &AnchorSpec) -> Result<AnchorId> {
        self.next_anchor += 1;
        let id = AnchorId(format!("__domsnap_anchor_{}", self.next_anchor));
        debug!(
            "attaching transient anchor {} for '{}'",
            id.as_str(),
            spec.download
        );
        self.anchors.push((id.clone(), spec.clone()));
        Ok(id)
    }

    fn activate_anchor(&mut self, id: &AnchorId) -> Result<()> {
        let spec = self
            .anchors
            .iter()
            .find(|(aid, _)| aid == id)
            .map(|(_, spec)| spec.clone())
            .ok_or_else(|| Error::AnchorError(format!("anchor {} not attached", id.as_str())))?;

        // Host-level download: decode the data URI into the configured
        // directory. Without a directory the activation is only recorded.
        if let Some(dir) = &self.config.download_dir {
            let payload = spec
                .href
                .split_once("base64,")
                .map(|(_, p)| p)
                .ok_or_else(|| {
                    Error::AnchorError("anchor href is not a base64 data URI".into())
                })?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| Error::AnchorError(format!("undecodable data URI: {}", e)))?;
            let path = dir.join(&spec.download);
            std::fs::write(&path, bytes).map_err(|e| {
                Error::AnchorError(format!("failed to save {}: {}", path.display(), e))
            })?;
            debug!("saved download to {}", path.display());
        }

        self.activations.push(AnchorActivation {
            filename: spec.download,
            href: spec.href,
        });
        Ok(())
    }

    fn remove_anchor(&mut self, id: &AnchorId) -> Result<()> {
        let before = self.anchors.len();
        self.anchors.retain(|(aid, _)| aid != id);
        if self.anchors.len() == before {
            return Err(Error::AnchorError(format!(
                "anchor {} not attached",
                id.as_str()
            )));
        }
        Ok(())
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

impl Rasterizer for DomHost {
    fn rasterize(&self, element: &ElementHandle) -> Result<Bitmap> {
        if self.config.format != ImageFormat::Png {
            return Err(Error::RasterizationFailure(
                "only PNG output is supported by the dom backend".into(),
            ));
        }

        let width = element.region.width.round() as u32;
        let height = element.region.height.round() as u32;
        if width == 0 || height == 0 {
            return Err(Error::RasterizationFailure(format!(
                "element '{}' has a zero-size region",
                element.element_id
            )));
        }

        let text = self.element_text(&element.element_id)?;
        let tl = layout::layout_text(&text, width);
        let commands = paint::paint_layout(&tl);
        let rgba = paint::rasterize(&commands, width, height);
        let data = paint::encode_png(width, height, &rgba)?;

        Ok(Bitmap {
            width,
            height,
            data,
            format: ImageFormat::Png,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::export_element_as_image;
    use crate::SnapshotRequest;

    const RECAP_HTML: &str = r#"<html><head><title>Recap</title></head>
<body><div id="recap" class="card">Watched 42 shows in 2024</div></body></html>"#;

    fn host_with_content(html: &str) -> DomHost {
        let mut host = DomHost::new(ExporterConfig::default()).expect("Failed to create DomHost");
        host.set_content(html).expect("Failed to set content");
        host
    }

    #[test]
    fn resolve_known_element() {
        let host = host_with_content(RECAP_HTML);
        let handle = host.resolve_element("recap").expect("resolve failed");
        assert_eq!(handle.element_id, "recap");
        assert!(handle.region.width > 0.0);
        assert!(handle.region.height > 0.0);
    }

    #[test]
    fn resolve_missing_element() {
        let host = host_with_content(RECAP_HTML);
        let err = host.resolve_element("nope").unwrap_err();
        assert!(matches!(err, Error::ElementNotFound(ref id) if id == "nope"));
        assert!(!host.element_exists("nope"));
    }

    #[test]
    fn resolve_duplicate_id_is_rejected() {
        let host = host_with_content(
            r#"<html><body><div id="recap">a</div><div id="recap">b</div></body></html>"#,
        );
        let err = host.resolve_element("recap").unwrap_err();
        assert!(matches!(err, Error::AmbiguousElement(_)));
    }

    #[test]
    fn export_records_one_activation() {
        let mut host = host_with_content(RECAP_HTML);
        let request = SnapshotRequest::new("recap", "anime_recap_2024.png");
        export_element_as_image(&mut host, &request).expect("export failed");

        let activations = host.anchor_activations();
        assert_eq!(activations.len(), 1);
        assert_eq!(activations[0].filename, "anime_recap_2024.png");
        assert!(activations[0].href.starts_with("data:image/png;base64,"));
        assert_eq!(host.attached_anchor_count(), 0);
    }

    #[test]
    fn jpeg_output_is_not_supported() {
        let config = ExporterConfig {
            format: ImageFormat::Jpeg,
            ..Default::default()
        };
        let mut host = DomHost::new(config).unwrap();
        host.set_content(RECAP_HTML).unwrap();
        let request = SnapshotRequest::new("recap", "recap.jpg");
        let err = export_element_as_image(&mut host, &request).unwrap_err();
        assert!(matches!(err, Error::RasterizationFailure(_)));
        assert_eq!(host.anchor_activations().len(), 0);
    }

    #[test]
    fn zero_size_region_fails_rasterization() {
        let host = host_with_content(RECAP_HTML);
        let handle = ElementHandle {
            element_id: "recap".to_string(),
            region: Region {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            },
        };
        let err = host.rasterize(&handle).unwrap_err();
        assert!(matches!(err, Error::RasterizationFailure(_)));
    }
}
