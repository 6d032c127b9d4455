//! Common `Algorithm` instance loader.

use explorer_detector::ExplorerV1;
use fmo::prelude::v1::*;
use median_detector::MedianV1;

/// Names of the available detection algorithms.
pub const ALGORITHMS: &[&str] = &["explorer-v1", "median-v1"];

/// Create a detection algorithm by name for a stream of the given format and dimensions.
pub fn create_algorithm(
    name: &str,
    cfg: Config,
    format: Format,
    dims: Dims,
) -> Result<Box<dyn Algorithm>> {
    match name {
        "explorer-v1" => Ok(Box::new(ExplorerV1::new(cfg, format, dims)?)),
        "median-v1" => Ok(Box::new(MedianV1::new(cfg, format, dims)?)),
        _ => bail!(
            "unknown algorithm '{}' (available: {})",
            name,
            ALGORITHMS.join(", ")
        ),
    }
}
