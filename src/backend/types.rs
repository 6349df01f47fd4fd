//! Common types shared between the graph compiler and backends

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Rgba16Float,
    Rgba32Float,
    Rg16Float,
    R8Unorm,
    R32Float,
    Depth32Float,
    Depth24PlusStencil8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Rg16Float
            | TextureFormat::R32Float
            | TextureFormat::Depth32Float
            | TextureFormat::Depth24PlusStencil8 => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }
}

/// Equivalence class of a logical buffer.
///
/// Two logical buffers with equal classes can share one physical resource.
/// This is the key the allocator and the realizer bucket resources by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferClass {
    /// A 2D render target.
    Texture {
        width: u32,
        height: u32,
        format: TextureFormat,
    },
    /// Ordering-only dependency with no storage behind it.
    Dummy,
}

impl BufferClass {
    /// Resource weight of one physical resource of this class, in bytes.
    ///
    /// Saturates at `u64::MAX` for sizes no device could allocate.
    pub fn cost(&self) -> u64 {
        match self {
            BufferClass::Texture {
                width,
                height,
                format,
            } => (*width as u64)
                .saturating_mul(*height as u64)
                .saturating_mul(format.bytes_per_pixel() as u64),
            BufferClass::Dummy => 0,
        }
    }
}

impl std::fmt::Display for BufferClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferClass::Texture {
                width,
                height,
                format,
            } => write!(f, "{width}x{height} {format:?}"),
            BufferClass::Dummy => write!(f, "dummy"),
        }
    }
}
