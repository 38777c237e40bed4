//! The export operation: resolve an element, rasterize it, encode the
//! bitmap as a data URI, and trigger the host download through a transient
//! anchor.
//!
//! The sequence is linear and performs no retries; every failure propagates
//! to the caller unchanged. The anchor is a scoped resource: once inserted
//! it is removed again on every exit path.

use base64::Engine as Base64Engine;

use crate::{
    AnchorId, AnchorSpec, Bitmap, DocumentHost, Error, Rasterizer, Result, SnapshotRequest,
};

/// Encode a bitmap as an inline data URI (`data:<mime>;base64,<payload>`)
pub fn data_uri(bitmap: &Bitmap) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(&bitmap.data);
    format!("data:{};base64,{}", bitmap.format.mime(), payload)
}

/// Export an element as a downloadable image using the host's own rasterizer
///
/// Resolves `request.element_id`, captures the element, and activates a
/// transient download anchor named `request.filename`. Returns nothing on
/// success; the download itself is a host side effect.
pub fn export_element_as_image<H>(host: &mut H, request: &SnapshotRequest) -> Result<()>
where
    H: DocumentHost + Rasterizer,
{
    validate(request)?;
    let handle = host.resolve_element(&request.element_id)?;
    let bitmap = host.rasterize(&handle)?;
    deliver(host, request, &bitmap)
}

/// Export with an injected rasterization capability
///
/// Same operation as [`export_element_as_image`], but the element-to-bitmap
/// step goes through `rasterizer` instead of the host. This is the seam
/// tests use to swap in counting or failing captures.
pub fn export_with_rasterizer<H, R>(
    host: &mut H,
    rasterizer: &R,
    request: &SnapshotRequest,
) -> Result<()>
where
    H: DocumentHost,
    R: Rasterizer + ?Sized,
{
    validate(request)?;
    let handle = host.resolve_element(&request.element_id)?;
    let bitmap = rasterizer.rasterize(&handle)?;
    deliver(host, request, &bitmap)
}

fn validate(request: &SnapshotRequest) -> Result<()> {
    if request.filename.is_empty() {
        return Err(Error::ConfigError(
            "download filename must not be empty".into(),
        ));
    }
    Ok(())
}

// Insert the anchor, run `activate`, and remove the anchor again no matter
// how the activation went. When both fail, the activation error wins.
fn with_transient_anchor<H: DocumentHost>(
    host: &mut H,
    spec: &AnchorSpec,
    activate: impl FnOnce(&mut H, &AnchorId) -> Result<()>,
) -> Result<()> {
    let id = host.insert_anchor(spec)?;
    let activated = activate(host, &id);
    let removed = host.remove_anchor(&id);
    activated.and(removed)
}

fn deliver<H: DocumentHost>(
    host: &mut H,
    request: &SnapshotRequest,
    bitmap: &Bitmap,
) -> Result<()> {
    if bitmap.data.is_empty() {
        return Err(Error::RasterizationFailure(
            "rasterizer produced an empty bitmap".into(),
        ));
    }

    let spec = AnchorSpec {
        href: data_uri(bitmap),
        download: request.filename.clone(),
    };

    with_transient_anchor(host, &spec, |h, id| h.activate_anchor(id))
}
