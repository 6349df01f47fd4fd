//! Logical buffer descriptors

use glam::UVec2;

use crate::backend::types::{BufferClass, TextureFormat};

/// Handle to a buffer descriptor inside a [`GraphDescription`](super::GraphDescription).
///
/// Handles are the identity of a logical buffer: two handles are the same
/// buffer only if they are equal, no matter what the descriptors contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub(crate) u32);

impl BufferHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Describes texture dimensions that can be relative to the output resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureSize {
    /// Absolute size in pixels
    Absolute { width: u32, height: u32 },
    /// Relative to the output resolution (1.0 = full resolution)
    Relative { width_scale: f32, height_scale: f32 },
}

impl Default for TextureSize {
    fn default() -> Self {
        TextureSize::Relative {
            width_scale: 1.0,
            height_scale: 1.0,
        }
    }
}

impl TextureSize {
    /// Full output resolution.
    pub fn full() -> Self {
        Self::default()
    }

    /// Output resolution divided by `divisor` on both axes.
    pub fn scaled(divisor: u32) -> Self {
        let scale = 1.0 / divisor.max(1) as f32;
        TextureSize::Relative {
            width_scale: scale,
            height_scale: scale,
        }
    }

    /// Resolve to pixels. Relative sizes never collapse below one pixel.
    pub fn resolve(&self, resolution: UVec2) -> UVec2 {
        match self {
            TextureSize::Absolute { width, height } => UVec2::new(*width, *height),
            TextureSize::Relative {
                width_scale,
                height_scale,
            } => UVec2::new(
                ((resolution.x as f32) * width_scale) as u32,
                ((resolution.y as f32) * height_scale) as u32,
            )
            .max(UVec2::ONE),
        }
    }
}

/// What kind of storage a logical buffer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferKind {
    Texture {
        size: TextureSize,
        format: TextureFormat,
    },
    /// Carries no data. Used to express "run after" between operations.
    Dummy,
}

/// Immutable description of one logical buffer requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferDescriptor {
    pub name: String,
    pub kind: BufferKind,
}

impl BufferDescriptor {
    pub fn texture(name: impl Into<String>, size: TextureSize, format: TextureFormat) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::Texture { size, format },
        }
    }

    pub fn dummy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::Dummy,
        }
    }

    /// Equivalence class at the given output resolution.
    ///
    /// Descriptors with equal classes are mergeable: they may be backed by
    /// the same physical resource as long as their lifetimes don't overlap.
    pub fn class(&self, resolution: UVec2) -> BufferClass {
        match self.kind {
            BufferKind::Texture { size, format } => {
                let extent = size.resolve(resolution);
                BufferClass::Texture {
                    width: extent.x,
                    height: extent.y,
                    format,
                }
            }
            BufferKind::Dummy => BufferClass::Dummy,
        }
    }

    /// Resource weight at the given output resolution.
    pub fn cost(&self, resolution: UVec2) -> u64 {
        self.class(resolution).cost()
    }

    pub fn is_mergeable_with(&self, other: &BufferDescriptor, resolution: UVec2) -> bool {
        self.class(resolution) == other.class(resolution)
    }
}
