//! Landmark storage and raw-output decoding.

use thiserror::Error;

use crate::iter::zip_exact;
use crate::roi::RoiTransform;

type Position = [f32; 3];

/// Landmark networks emit coordinates in the pixel scale of their input image; this maps them
/// back to [0,1].
const PIXEL_SCALE: f32 = 1.0 / 255.0;

/// A fixed-size collection of 3D landmark positions.
#[derive(Debug, Clone)]
pub struct Landmarks {
    positions: Box<[Position]>,
}

impl Landmarks {
    /// Creates a new [`Landmarks`] collection containing `len` preallocated landmarks.
    ///
    /// All landmarks will start with all coordinates at `0.0`.
    pub fn new(len: usize) -> Self {
        Self {
            positions: vec![[0.0, 0.0, 0.0]; len].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + Clone + '_ {
        self.positions.iter().copied()
    }

    pub fn get(&self, index: usize) -> Position {
        self.positions[index]
    }

    pub fn set(&mut self, index: usize, position: Position) {
        self.positions[index] = position;
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Position] {
        &mut self.positions
    }

    pub fn average_position(&self) -> Position {
        let mut center = [0.0; 3];
        for pos in self.positions() {
            center[0] += pos[0] / self.positions().len() as f32;
            center[1] += pos[1] / self.positions().len() as f32;
            center[2] += pos[2] / self.positions().len() as f32;
        }
        center
    }

    pub fn map_positions(&mut self, mut f: impl FnMut(Position) -> Position) {
        for pos in self.positions_mut() {
            *pos = f(*pos);
        }
    }
}

/// Dimensionality of a landmark network's output coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    /// Number of values the network emits per landmark.
    pub fn coords(self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }
}

/// Error returned when a landmark network declares an output shape this library cannot decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported landmark output shape {shape:?}: expected {joints}x2 or {joints}x3 values")]
pub struct UnsupportedOutputShape {
    pub shape: Vec<usize>,
    pub joints: usize,
}

/// Decodes raw landmark tensors into texture-space [`Landmarks`].
///
/// The output dimensionality is fixed when the decoder is created, from the shape the model
/// declares for its keypoint output; per-frame decoding never re-examines it.
#[derive(Debug, Clone)]
pub struct LandmarkDecoder {
    joints: usize,
    dim: Dimension,
}

impl LandmarkDecoder {
    /// Creates a decoder for a network that locates `joints` landmarks and declares the output
    /// tensor shape `shape`.
    ///
    /// A shape holding `joints * 2` values decodes as 2D output, `joints * 3` values as 3D
    /// output. Anything else fails with [`UnsupportedOutputShape`]; this is a configuration
    /// error, not a per-frame condition.
    pub fn from_output_shape(joints: usize, shape: &[usize]) -> Result<Self, UnsupportedOutputShape> {
        let values: usize = shape.iter().product();
        let dim = if values == joints * 2 {
            Dimension::Two
        } else if values == joints * 3 {
            Dimension::Three
        } else {
            return Err(UnsupportedOutputShape {
                shape: shape.to_vec(),
                joints,
            });
        };

        Ok(Self { joints, dim })
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    /// Decodes `raw` into `out`, mapping every landmark into texture space.
    ///
    /// Each raw coordinate is scaled from pixel scale to [0,1], the y axis is flipped (networks
    /// emit y-down, result space is y-up), and the 2D position is mapped through the inverse of
    /// `roi`. The z coordinate (when present) is scaled but neither flipped nor mapped.
    ///
    /// # Panics
    ///
    /// Panics if `raw` or `out` do not hold exactly as many values as the decoder was
    /// constructed for.
    pub fn decode(&self, raw: &[f32], roi: &RoiTransform, out: &mut Landmarks) {
        let coords = self.dim.coords();
        assert_eq!(
            raw.len(),
            self.joints * coords,
            "raw landmark buffer does not match the declared output shape"
        );

        let from_canonical = roi.from_canonical();
        for (joint, pos) in zip_exact(raw.chunks_exact(coords), out.positions_mut()) {
            let x = joint[0] * PIXEL_SCALE;
            let y = 1.0 - joint[1] * PIXEL_SCALE;
            let z = match self.dim {
                Dimension::Two => 0.0,
                Dimension::Three => joint[2] * PIXEL_SCALE,
            };
            *pos = from_canonical.apply3([x, y, z]);
        }
    }
}
