//! Converts a single source image into a multi-size Windows ICO file.
//! The source is converted to RGBA and scaled down to each requested icon size.
//!
//! ## Examples
//! ### Default Windows sizes
//! Produces 16, 32, 48, 64, 128 and 256px icons from one PNG.
//!
//! ```no_run
//! # use logo_ico::IcoConverter;
//! let summary = IcoConverter::default()
//!     .source_file("logo.png")
//!     .build_file("logo.ico")?;
//! println!("{:.2} KB", summary.size_kib());
//! # Ok::<(), logo_ico::Error>(())
//! ```
//!
//! ### Custom Icon Sizes
//! ```no_run
//! # use logo_ico::IcoConverter;
//! IcoConverter::default()
//!     .sizes(&[16, 32])
//!     .source_file("logo.png")
//!     .build_file("logo.ico")?;
//! # Ok::<(), logo_ico::Error>(())
//! ```

use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::codecs::png::PngEncoder;
use image::imageops::{replace, resize, FilterType};
use image::{
    ColorType, ExtendedColorType, ImageEncoder, ImageReader, Rgba, Rgba32FImage, RgbaImage,
};
use std::borrow::Cow;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

mod error;

pub use error::{Error, Result};

/// Input image converted by the command-line tool, relative to the working directory.
pub const INPUT_PATH: &str = "composeApp/src/jvmMain/resources/logo.png";

/// ICO file written by the command-line tool, relative to the working directory.
pub const OUTPUT_PATH: &str = "composeApp/src/jvmMain/resources/logo.ico";

/// The largest edge an ICO directory entry can describe.
pub const MAX_ICON_SIZE: u32 = 256;

/// Builds an ICO file from one source image.
#[derive(Debug, Default)]
pub struct IcoConverter {
    sizes: IconSizes,
    source_file: Option<PathBuf>,
}

impl IcoConverter {
    /// Customizes the sizes included in the ICO file. Defaults to [`IconSizes::WINDOWS`].
    pub fn sizes(&mut self, sizes: impl Into<IconSizes>) -> &mut IcoConverter {
        self.sizes = sizes.into();
        self
    }

    /// Sets the source image (required). Its format is detected from the file contents,
    /// so anything the enabled [`image`] features can decode is accepted.
    pub fn source_file(&mut self, source_file: impl AsRef<Path>) -> &mut IcoConverter {
        self.source_file = Some(source_file.as_ref().to_owned());
        self
    }

    /// Encodes the ICO into `writer` and returns the icon sizes it contains.
    ///
    /// Sizes that don't fit inside the source image are left out.
    pub fn encode<W: Write>(&self, writer: W) -> Result<Vec<u32>> {
        let source_file = self.source_file.as_deref().ok_or(Error::MissingSource)?;
        let smallest = self.sizes.smallest().ok_or(Error::NoValidIconSize)?;

        let source = decode_source(source_file)?;
        let sizes = self.sizes.usable(source.width(), source.height());
        if sizes.is_empty() {
            return Err(Error::SourceTooSmall {
                width: source.width(),
                height: source.height(),
                smallest,
            });
        }

        let frames: Vec<_> = sizes
            .iter()
            .copied()
            .map(|size| create_ico_frame(&source, size))
            .collect::<Result<_>>()?;

        IcoEncoder::new(writer).encode_images(&frames)?;
        Ok(sizes)
    }

    /// Builds the ICO file and writes it to the specified `output_file_path`,
    /// replacing any existing file. The file is written next to its destination
    /// and moved into place, so a failed conversion leaves the old file untouched.
    pub fn build_file(&self, output_file_path: impl AsRef<Path>) -> Result<IcoSummary> {
        let path = output_file_path.as_ref();
        let mut encoded = Vec::new();
        let sizes = self.encode(&mut encoded)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&encoded)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;

        let byte_len = encoded.len() as u64;
        info!(path = %path.display(), byte_len, "wrote ICO file");

        Ok(IcoSummary {
            path: path.to_owned(),
            sizes,
            byte_len,
        })
    }
}

/// What [`IcoConverter::build_file`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcoSummary {
    pub path: PathBuf,
    pub sizes: Vec<u32>,
    pub byte_len: u64,
}

impl IcoSummary {
    /// File size in KiB.
    pub fn size_kib(&self) -> f64 {
        self.byte_len as f64 / 1024.0
    }
}

/// A list of square icon sizes.
#[derive(Debug)]
pub struct IconSizes(Cow<'static, [u32]>);

impl IconSizes {
    /// The sizes recommended for Windows application icons: 16x16, 32x32, 48x48, 64x64,
    /// 128x128, and 256x256.
    pub const WINDOWS: Self = Self::new(&[16, 32, 48, 64, 128, 256]);

    pub const fn new(sizes: &'static [u32]) -> IconSizes {
        Self(Cow::Borrowed(sizes))
    }

    /// Sizes an ICO entry can hold, `1..=MAX_ICON_SIZE`.
    fn valid(&self) -> impl Iterator<Item = u32> + '_ {
        self.0
            .iter()
            .copied()
            .filter(|size| (1..=MAX_ICON_SIZE).contains(size))
    }

    fn smallest(&self) -> Option<u32> {
        self.valid().min()
    }

    /// Sizes that fit inside a `width` × `height` source, ascending and without duplicates.
    fn usable(&self, width: u32, height: u32) -> Vec<u32> {
        let limit = width.min(height);
        let mut sizes: Vec<_> = self.valid().filter(|&size| size <= limit).collect();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    }
}

impl Default for IconSizes {
    fn default() -> Self {
        IconSizes::WINDOWS
    }
}

impl<'a, I> From<I> for IconSizes
where
    I: IntoIterator<Item = &'a u32>,
{
    fn from(value: I) -> Self {
        IconSizes(value.into_iter().copied().collect::<Vec<_>>().into())
    }
}

fn decode_source(path: &Path) -> Result<RgbaImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "decoded source image"
    );
    if image.color() != ColorType::Rgba8 {
        debug!(from = ?image.color(), "converting source to RGBA");
    }
    Ok(image.into_rgba8())
}

fn create_ico_frame(source: &RgbaImage, size: u32) -> Result<IcoFrame<'static>> {
    let icon = fit_to_square(source, size);
    debug!(size, "encoding ICO frame");
    encode_ico_frame(icon.as_raw(), size)
}

fn encode_ico_frame(buf: &[u8], size: u32) -> Result<IcoFrame<'static>> {
    let color_type = ExtendedColorType::Rgba8;
    let mut encoded = Vec::new();
    PngEncoder::new(Cursor::new(&mut encoded)).write_image(buf, size, size, color_type)?;
    Ok(IcoFrame::with_encoded(encoded, size, size, color_type)?)
}

/// Scales `source` to fit a `size` × `size` square and centers it on a transparent canvas.
fn fit_to_square(source: &RgbaImage, size: u32) -> RgbaImage {
    let (width, height) = scaled_dimensions(source.width(), source.height(), size);
    let resized = if (width, height) == source.dimensions() {
        source.clone()
    } else {
        resize_premultiplied(source, width, height)
    };
    if width == size && height == size {
        return resized;
    }

    let mut canvas = RgbaImage::new(size, size);
    replace(
        &mut canvas,
        &resized,
        i64::from((size - width) / 2),
        i64::from((size - height) / 2),
    );
    canvas
}

/// Lanczos3 resize with colour weighted by alpha, so fully transparent pixels
/// don't bleed their (usually black) colour into visible edges.
fn resize_premultiplied(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let premultiplied = Rgba32FImage::from_fn(source.width(), source.height(), |x, y| {
        let Rgba([r, g, b, a]) = *source.get_pixel(x, y);
        let alpha = f32::from(a) / 255.0;
        let channel = |c: u8| f32::from(c) / 255.0 * alpha;
        Rgba([channel(r), channel(g), channel(b), alpha])
    });
    let resized = resize(&premultiplied, width, height, FilterType::Lanczos3);

    RgbaImage::from_fn(width, height, |x, y| {
        let Rgba([r, g, b, a]) = *resized.get_pixel(x, y);
        let alpha = a.clamp(0.0, 1.0);
        let alpha_byte = (alpha * 255.0).round() as u8;
        if alpha_byte == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        let channel = |c: f32| ((c / alpha).clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([channel(r), channel(g), channel(b), alpha_byte])
    })
}

/// Dimensions of a `width` × `height` image scaled so its longer edge is `size`.
fn scaled_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| {
        let scaled = (u64::from(size) * u64::from(short) + u64::from(long) / 2) / u64::from(long);
        (scaled as u32).clamp(1, size)
    };
    if width >= height {
        (size, scale(height, width))
    } else {
        (scale(width, height), size)
    }
}
