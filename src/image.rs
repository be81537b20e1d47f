#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl<T> From<(T, T)> for Point
where
    T: Into<i32>,
{
    fn from(value: (T, T)) -> Self {
        Point {
            x: value.0.into(),
            y: value.1.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl<T> From<(T, T)> for Size
where
    T: Into<i32>,
{
    fn from(value: (T, T)) -> Self {
        Size {
            width: value.0.into(),
            height: value.1.into(),
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// "WIDTHxHEIGHT", e.g. "640x480"
impl std::str::FromStr for Size {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let re = regex::Regex::new(r"^\s*(\d+)\s*[xX]\s*(\d+)\s*$")?;
        let Some(caps) = re.captures(s) else {
            anyhow::bail!("Invalid size {:?}, expected WIDTHxHEIGHT", s);
        };
        let size = Size {
            width: caps[1].parse()?,
            height: caps[2].parse()?,
        };
        if size.width == 0 || size.height == 0 {
            anyhow::bail!("Invalid size {:?}, both dimensions must be positive", s);
        }
        Ok(size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Mono8, // single intensity channel
    Bgr24, // BGR, 8 bits per channel, OpenCV order
}

impl ImageFormat {
    pub fn bpp(&self) -> i32 {
        match self {
            Self::Mono8 => 8,
            Self::Bgr24 => 24,
        }
    }

    pub fn channels(&self) -> usize {
        (self.bpp() / 8) as usize
    }
}

fn minimum_pitch(bpp: i32, width: i32) -> i32 {
    let pitch = (i64::from(width) * i64::from(bpp) + 7) / 8;
    assert!(pitch <= i64::from(i32::MAX), "width {} too large", width);
    pitch as i32
}

/// Bytes needed for `height` rows of `pitch`, the last row holding only
/// `last_row` bytes. `None` on overflow or non-positive dimensions.
pub fn checked_data_len(pitch: i32, height: i32, last_row: i32) -> Option<usize> {
    if pitch <= 0 || height <= 0 || last_row <= 0 {
        return None;
    }
    (height as usize - 1)
        .checked_mul(pitch as usize)?
        .checked_add(last_row as usize)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageHeader {
    data_len: usize,
    format: ImageFormat,
    width: i32,
    pitch: i32,
    height: i32,
}

impl ImageHeader {
    pub fn new(format: ImageFormat, data_len: usize, width: i32, height: i32, pitch: Option<i32>) -> Self {
        let minimum_pitch = minimum_pitch(format.bpp(), width);
        let pitch = pitch.unwrap_or(minimum_pitch);
        assert!(
            pitch >= minimum_pitch,
            "invalid pitch {} for width {} with format {:?}",
            pitch,
            width,
            format
        );
        assert!(
            width > 0 && height > 0,
            "invalid width {} and height {}",
            width,
            height
        );
        // the last row only needs to hold its pixels, not a full pitch
        let required_len = checked_data_len(pitch, height, minimum_pitch);
        assert!(
            required_len.map_or(false, |len| data_len >= len),
            "invalid data len {} for height {} and pitch {}",
            data_len,
            height,
            pitch
        );
        ImageHeader {
            data_len,
            format,
            width,
            pitch,
            height,
        }
    }

    fn subimg(&self, pt: Point, size: Size) -> (Self, usize) {
        assert!(pt.x >= 0 && pt.x < self.width && pt.x + size.width <= self.width);
        assert!(pt.y >= 0 && pt.y < self.height && pt.y + size.height <= self.height);
        let offset = pt.y as usize * self.pitch as usize + pt.x as usize * self.format.channels();
        (
            Self {
                data_len: self.data_len - offset,
                format: self.format,
                width: size.width,
                pitch: self.pitch,
                height: size.height,
            },
            offset,
        )
    }
}

pub trait HasImageHeader {
    fn header(&self) -> ImageHeader;
}

pub trait ConstImage: HasImageHeader {
    fn data(&self) -> &[u8];

    fn bpp(&self) -> i32 {
        self.header().format.bpp()
    }
    fn format(&self) -> ImageFormat {
        self.header().format
    }
    fn width(&self) -> i32 {
        self.header().width
    }
    fn height(&self) -> i32 {
        self.header().height
    }
    fn pitch(&self) -> i32 {
        self.header().pitch
    }
    fn is_continuous(&self) -> bool {
        self.pitch() == minimum_pitch(self.bpp(), self.width())
    }
    fn size(&self) -> Size {
        (self.width(), self.height()).into()
    }
    /// Bytes of one row, without the padding up to `pitch`.
    fn row(&self, y: i32) -> &[u8] {
        assert!(y >= 0 && y < self.height(), "row {} out of range", y);
        let start = y as usize * self.pitch() as usize;
        let len = minimum_pitch(self.bpp(), self.width()) as usize;
        &self.data()[start..start + len]
    }
    /// Samples at (x, y), one per channel.
    fn pixel(&self, x: i32, y: i32) -> &[u8] {
        assert!(x >= 0 && x < self.width(), "column {} out of range", x);
        let channels = self.format().channels();
        let start = x as usize * channels;
        &self.row(y)[start..start + channels]
    }
    /// Every sample in row-major order, skipping row padding.
    fn samples(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(minimum_pitch(self.bpp(), self.width()) as usize * self.height() as usize);
        for y in 0..self.height() {
            out.extend_from_slice(self.row(y));
        }
        out
    }
}

pub trait Image: ConstImage {
    fn mut_data(&mut self) -> &mut [u8];

    fn mut_row(&mut self, y: i32) -> &mut [u8] {
        assert!(y >= 0 && y < self.height(), "row {} out of range", y);
        let start = y as usize * self.pitch() as usize;
        let len = minimum_pitch(self.bpp(), self.width()) as usize;
        &mut self.mut_data()[start..start + len]
    }
    fn mut_subimg(&mut self, pt: Point, size: Size) -> ImageView {
        let (sub_hdr, offset) = self.header().subimg(pt, size);
        ImageView {
            header: sub_hdr,
            data: &mut self.mut_data()[offset..],
        }
    }
    fn copy_from<T: ConstImage + ?Sized>(&mut self, src: &T) {
        assert_eq!(self.size(), src.size());
        assert_eq!(self.format(), src.format());
        for y in 0..self.height() {
            self.mut_row(y).copy_from_slice(src.row(y));
        }
    }

    fn fill(&mut self, val: u8) {
        for y in 0..self.height() {
            self.mut_row(y).fill(val);
        }
    }
}

pub struct ConstImageView<'a> {
    header: ImageHeader,
    data: &'a [u8],
}

impl<'a> ConstImageView<'a> {
    pub fn new(format: ImageFormat, data: &'a [u8], width: i32, height: i32, pitch: Option<i32>) -> Self {
        let header = ImageHeader::new(format, data.len(), width, height, pitch);
        ConstImageView { header, data }
    }
}

impl<'a> HasImageHeader for ConstImageView<'a> {
    fn header(&self) -> ImageHeader {
        self.header
    }
}

impl<'a> ConstImage for ConstImageView<'a> {
    fn data(&self) -> &[u8] {
        self.data
    }
}

pub struct ImageView<'a> {
    header: ImageHeader,
    data: &'a mut [u8],
}

impl<'a> ImageView<'a> {
    pub fn new(format: ImageFormat, data: &'a mut [u8], width: i32, height: i32, pitch: Option<i32>) -> Self {
        let header = ImageHeader::new(format, data.len(), width, height, pitch);
        ImageView { header, data }
    }
}

impl<'a> HasImageHeader for ImageView<'a> {
    fn header(&self) -> ImageHeader {
        self.header
    }
}

impl<'a> ConstImage for ImageView<'a> {
    fn data(&self) -> &[u8] {
        self.data
    }
}

impl<'a> Image for ImageView<'a> {
    fn mut_data(&mut self) -> &mut [u8] {
        self.data
    }
}

/// Owned frame. Every frame that moves through the pipeline is one of these.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    data: Vec<u8>,
    header: ImageHeader,
}

impl ImageBuffer {
    pub fn new(format: ImageFormat, width: i32, height: i32, pitch: Option<i32>) -> Self {
        let minimum_pitch = minimum_pitch(format.bpp(), width);
        let pitch = pitch.unwrap_or(minimum_pitch);
        let data = vec![0; pitch.max(0) as usize * height.max(0) as usize];
        let header = ImageHeader::new(format, data.len(), width, height, Some(pitch));
        Self { data, header }
    }

    /// Takes ownership of tightly packed row-major samples.
    pub fn from_vec(format: ImageFormat, width: i32, height: i32, data: Vec<u8>) -> Self {
        let header = ImageHeader::new(format, data.len(), width, height, None);
        Self { data, header }
    }

    /// A zeroed buffer with the same format and size as `other`.
    pub fn zeros_like<T: ConstImage + ?Sized>(other: &T) -> Self {
        Self::new(other.format(), other.width(), other.height(), None)
    }
}

impl HasImageHeader for ImageBuffer {
    fn header(&self) -> ImageHeader {
        self.header
    }
}

impl ConstImage for ImageBuffer {
    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }
}

impl Image for ImageBuffer {
    fn mut_data(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }
}

pub mod convert;

#[cfg(feature = "opencv")]
pub mod cv_adapter;
