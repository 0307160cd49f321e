//! Geometry classification of media files.

use std::path::Path;
use tracing::debug;

use tubely_models::GeometryClass;

use crate::error::MediaResult;
use crate::tool::MediaTool;

/// Classify the first video stream of `path`.
///
/// Probe failures are returned as-is; no class is guessed.
pub async fn classify(tool: &dyn MediaTool, path: &Path) -> MediaResult<GeometryClass> {
    let dims = tool.probe_dimensions(path).await?;
    let class = GeometryClass::from(dims);
    debug!(dimensions = %dims, class = %class, "Classified video geometry");
    Ok(class)
}
