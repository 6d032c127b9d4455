//! # Fast-Moving Object Detection Library
//!
//! This library provides the building blocks for detecting fast-moving objects in a video
//! stream. Such objects leave a streak-like footprint across a short temporal window even
//! when individual frames show no recognizable shape. The building blocks are image buffers,
//! a format-aware decimator, a vertical strip generator and the [`Algorithm`] capability
//! trait that detector crates implement.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use fmo::prelude::v1::*;
//! ```
//!
//! You may need [`nalgebra`](https://crates.io/crates/nalgebra) to make use of the functionality.
//!
//! [`Algorithm`]: crate::algorithm::Algorithm

pub mod algorithm;
pub mod decimator;
pub mod image;
pub mod processing;
pub mod strip;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            algorithm::{Algorithm, Bounds, Config, ObjectDetails},
            decimator::Decimator,
            image::{num_bytes, Dims, Format, Image, Pos, Region},
            strip::{Strip, StripGen},
        };
        pub use anyhow::{anyhow, bail, Error, Result};
    }
}
