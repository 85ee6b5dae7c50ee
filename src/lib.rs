//! Geometric core for two-stage hand landmark tracking.
//!
//! This library contains the coordinate plumbing shared by a palm detection
//! network and a hand landmark network: region-of-interest transform
//! computation, mapping of raw network output back into texture space, and the
//! landmark-to-detection handoff that lets landmark output seed the next
//! frame's crop region without re-running the detector.
//!
//! Inference itself is *not* part of this crate. The caller runs the networks
//! and hands the raw output buffers (a flat keypoint tensor plus a scalar
//! confidence) to [`hand::tracking::HandTracker`], which owns the per-frame
//! geometry.
//!
//! # Coordinate Conventions
//!
//! All positions are in normalized texture coordinates, so `(0, 0)` and
//! `(1, 1)` are opposite corners of the source texture regardless of its pixel
//! size.
//!
//! Detection results use y-down coordinates. Landmark results use y-up
//! coordinates; the decode step flips the y axis of the (y-down) network
//! output, and the landmark-to-detection bridge flips it back. Rotation angles
//! are measured clockwise in y-down space, with 0 meaning the fingers point
//! from the wrist towards the top of the texture.

use log::LevelFilter;

pub mod affine;
pub mod detection;
pub mod hand;
pub mod iter;
pub mod landmark;
pub mod num;
pub mod rect;
pub mod roi;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and this library will log at *debug* level; the
/// `RUST_LOG` environment variable can override this.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
