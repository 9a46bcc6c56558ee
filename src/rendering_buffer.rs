//! Owned RGBA32 pixel storage with row access.
//!
//! Rows are stored top-down with a stride of `width * 4` bytes.

use crate::error::{Error, Result};

/// Bytes per RGBA pixel.
pub const BPP: usize = 4;

/// Upper bound on either surface dimension.
pub const MAX_DIMENSION: u32 = 16384;

/// A rectangular RGBA32 surface owning its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderingBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RenderingBuffer {
    /// Allocate a zeroed (transparent black) surface.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        check_size(width, height)?;
        Ok(Self {
            data: vec![0; width as usize * height as usize * BPP],
            width,
            height,
        })
    }

    /// Wrap existing RGBA bytes.
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_size(width, height)?;
        if data.len() != width as usize * height as usize * BPP {
            return Err(Error::InvalidSurface { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.width as usize * BPP
    }

    /// Bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride();
        &self.data[start..start + self.stride()]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

fn check_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::InvalidSurface { width, height });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
