/// Host texture formats a browser window can be rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba32,
    Bgra32,
    Argb32,
    Rgb24,
    Rgba4444,
    Rgb565,
}

/// Native format code -> host format. Index is the native code.
///
/// Codes 4 (ABGR32), 6 (BGR24) and 8 (RGBA5551) exist natively but have no
/// host texture counterpart.
const NATIVE_FORMATS: [Option<TextureFormat>; 10] = [
    None,
    Some(TextureFormat::Rgba32),
    Some(TextureFormat::Bgra32),
    Some(TextureFormat::Argb32),
    None,
    Some(TextureFormat::Rgb24),
    None,
    Some(TextureFormat::Rgba4444),
    None,
    Some(TextureFormat::Rgb565),
];

impl TextureFormat {
    #[inline]
    pub fn from_native(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| NATIVE_FORMATS.get(i).copied().flatten())
    }

    #[inline]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba32 | Self::Bgra32 | Self::Argb32 => 4,
            Self::Rgb24 => 3,
            Self::Rgba4444 | Self::Rgb565 => 2,
        }
    }
}
