//! Single-entry ICO container with a PNG-backed image.
//!
//! Layout written by [`write_icon`]:
//!
//! ```text
//! 0   u16  reserved (0)
//! 2   u16  type (1 = icon)
//! 4   u16  image count (1)
//! 6   u8   width  (0 = 256)
//! 7   u8   height (0 = 256)
//! 8   u8   palette count (0)
//! 9   u8   reserved (0)
//! 10  u16  color planes (0)
//! 12  u16  bits per pixel (32)
//! 14  u32  data size
//! 18  u32  data offset (22)
//! 22  ...  PNG file bytes
//! ```
//!
//! All integers are little-endian.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use thiserror::Error;

/// Edge length of the only image stored in the icon.
pub const ICON_SIZE: u32 = 256;

pub const HEADER_LEN: u32 = 6;
pub const ENTRY_LEN: u32 = 16;
/// Offset of the payload for a file with exactly one directory entry.
pub const DATA_OFFSET: u32 = HEADER_LEN + ENTRY_LEN;

const TYPE_ICON: u16 = 1;
const BITS_PER_PIXEL: u16 = 32;

#[derive(Debug, Error)]
pub enum IcoError {
    #[error("PNG payload is empty")]
    EmptyPayload,
    #[error("PNG payload of {0} bytes does not fit the 32-bit data size field")]
    PayloadTooLarge(usize),
    #[error("Failed to create icon file")]
    Create(#[source] io::Error),
    #[error("Failed to write icon data")]
    Sink(#[from] io::Error),
}

/// A complete PNG file, stored in the icon as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngPayload(Vec<u8>);

impl PngPayload {
    pub fn new(bytes: Vec<u8>) -> Result<Self, IcoError> {
        if bytes.is_empty() {
            return Err(IcoError::EmptyPayload);
        }
        if u32::try_from(bytes.len()).is_err() {
            return Err(IcoError::PayloadTooLarge(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn byte_len(&self) -> u32 {
        // checked in new()
        self.0.len() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconDirectoryHeader {
    pub image_type: u16,
    pub count: u16,
}

impl IconDirectoryHeader {
    pub fn single_icon() -> Self {
        Self {
            image_type: TYPE_ICON,
            count: 1,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u16::<LittleEndian>(0)?; // reserved
        w.write_u16::<LittleEndian>(self.image_type)?;
        w.write_u16::<LittleEndian>(self.count)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconDirectoryEntry {
    pub width: u8,
    pub height: u8,
    pub palette_count: u8,
    /// Color planes for icons, hotspot x for cursors.
    pub planes: u16,
    /// Bits per pixel for icons, hotspot y for cursors.
    pub bit_depth: u16,
    pub data_size: u32,
    pub data_offset: u32,
}

impl IconDirectoryEntry {
    /// Entry describing a 256x256 PNG placed right after the directory.
    pub fn for_png(payload: &PngPayload) -> Self {
        Self {
            width: dimension_code(ICON_SIZE),
            height: dimension_code(ICON_SIZE),
            palette_count: 0,
            planes: 0,
            bit_depth: BITS_PER_PIXEL,
            data_size: payload.byte_len(),
            data_offset: DATA_OFFSET,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u8(self.width)?;
        w.write_u8(self.height)?;
        w.write_u8(self.palette_count)?;
        w.write_u8(0)?; // reserved
        w.write_u16::<LittleEndian>(self.planes)?;
        w.write_u16::<LittleEndian>(self.bit_depth)?;
        w.write_u32::<LittleEndian>(self.data_size)?;
        w.write_u32::<LittleEndian>(self.data_offset)?;
        Ok(())
    }
}

/// Width and height bytes only go up to 255; 256 is stored as 0.
fn dimension_code(size: u32) -> u8 {
    (size % 256) as u8
}

/// Writes header, entry and payload to `sink` and flushes it.
/// Returns the number of bytes written.
pub fn write_icon<W: Write>(sink: &mut W, payload: &PngPayload) -> Result<u64, IcoError> {
    let header = IconDirectoryHeader::single_icon();
    let entry = IconDirectoryEntry::for_png(payload);

    header.write_to(sink)?;
    entry.write_to(sink)?;
    sink.write_all(payload.as_bytes())?;
    sink.flush()?;

    Ok(u64::from(DATA_OFFSET) + u64::from(payload.byte_len()))
}

pub fn encode_icon(payload: &PngPayload) -> Result<Vec<u8>, IcoError> {
    let mut out = Vec::with_capacity(DATA_OFFSET as usize + payload.as_bytes().len());
    write_icon(&mut out, payload)?;
    Ok(out)
}

/// Creates (or truncates) `path` and writes the icon into it.
///
/// The file is closed when this returns, on success and on error. After an
/// error the file contents are undefined.
pub fn write_icon_file(path: &Path, payload: &PngPayload) -> Result<u64, IcoError> {
    let file = File::create(path).map_err(IcoError::Create)?;
    let mut writer = BufWriter::new(file);
    let written = write_icon(&mut writer, payload)?;
    tracing::debug!("Wrote {} bytes to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ReadBytesExt;
    use std::io::{Cursor, Read};

    struct Parsed {
        reserved: u16,
        image_type: u16,
        count: u16,
        entry: IconDirectoryEntry,
        entry_reserved: u8,
        data: Vec<u8>,
    }

    fn parse(bytes: &[u8]) -> Parsed {
        let mut r = Cursor::new(bytes);
        let reserved = r.read_u16::<LittleEndian>().unwrap();
        let image_type = r.read_u16::<LittleEndian>().unwrap();
        let count = r.read_u16::<LittleEndian>().unwrap();
        let width = r.read_u8().unwrap();
        let height = r.read_u8().unwrap();
        let palette_count = r.read_u8().unwrap();
        let entry_reserved = r.read_u8().unwrap();
        let planes = r.read_u16::<LittleEndian>().unwrap();
        let bit_depth = r.read_u16::<LittleEndian>().unwrap();
        let data_size = r.read_u32::<LittleEndian>().unwrap();
        let data_offset = r.read_u32::<LittleEndian>().unwrap();
        r.set_position(u64::from(data_offset));
        let mut data = vec![0u8; data_size as usize];
        r.read_exact(&mut data).unwrap();
        Parsed {
            reserved,
            image_type,
            count,
            entry: IconDirectoryEntry {
                width,
                height,
                palette_count,
                planes,
                bit_depth,
                data_size,
                data_offset,
            },
            entry_reserved,
            data,
        }
    }

    fn placeholder_png() -> PngPayload {
        PngPayload::new(vec![0x89, 0x50, 0x4E, 0x47, 1, 2, 3, 4, 5, 6]).unwrap()
    }

    #[test]
    fn ten_byte_payload_layout() {
        let payload = placeholder_png();
        let out = encode_icon(&payload).unwrap();

        assert_eq!(out.len(), 32);
        let expected_head: &[u8] = &[
            0, 0, 1, 0, 1, 0, // header
            0, 0, 0, 0, 0, 0, 32, 0, // entry up to bit depth
            10, 0, 0, 0, // data size
            22, 0, 0, 0, // data offset
        ];
        assert_eq!(&out[..22], expected_head);
        assert_eq!(&out[22..], payload.as_bytes());
        assert_eq!(u32::from_le_bytes(out[14..18].try_into().unwrap()), 10);
        assert_eq!(u32::from_le_bytes(out[18..22].try_into().unwrap()), 22);
    }

    #[test]
    fn empty_payload_is_refused() {
        assert!(matches!(PngPayload::new(Vec::new()), Err(IcoError::EmptyPayload)));
    }

    #[test]
    fn parsed_entry_matches_payload() {
        let payload = placeholder_png();
        let parsed = parse(&encode_icon(&payload).unwrap());

        assert_eq!(parsed.reserved, 0);
        assert_eq!(parsed.image_type, 1);
        assert_eq!(parsed.count, 1);
        assert_eq!(parsed.entry_reserved, 0);
        assert_eq!(parsed.entry, IconDirectoryEntry::for_png(&payload));
        assert_eq!(parsed.entry.width, 0);
        assert_eq!(parsed.entry.height, 0);
        assert_eq!(parsed.entry.bit_depth, 32);
        assert_eq!(parsed.data, payload.as_bytes());
    }

    #[test]
    fn size_and_offset_track_payload_length() {
        for len in [1usize, 255, 256, 65_536, 3 * 1024 * 1024 + 7] {
            let bytes: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let payload = PngPayload::new(bytes).unwrap();
            let out = encode_icon(&payload).unwrap();

            assert_eq!(out.len(), 22 + len);
            assert_eq!(u32::from_le_bytes(out[14..18].try_into().unwrap()) as usize, len);
            assert_eq!(u32::from_le_bytes(out[18..22].try_into().unwrap()), 22);
            assert_eq!(&out[22..], payload.as_bytes());
        }
    }

    #[test]
    fn write_icon_reports_bytes_written() {
        let payload = placeholder_png();
        let mut sink = Vec::new();
        let written = write_icon(&mut sink, &payload).unwrap();
        assert_eq!(written, sink.len() as u64);
    }

    #[test]
    fn same_payload_encodes_identically() {
        let payload = placeholder_png();
        let mut a = Vec::new();
        let mut b = Cursor::new(Vec::new());
        write_icon(&mut a, &payload).unwrap();
        write_icon(&mut b, &payload).unwrap();
        assert_eq!(a, b.into_inner());
    }

    #[test]
    fn sink_errors_are_propagated() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = write_icon(&mut Full, &placeholder_png()).unwrap_err();
        assert!(matches!(err, IcoError::Sink(_)));
    }

    #[test]
    fn real_png_decodes_as_256_icon() {
        let img = image::RgbaImage::from_pixel(256, 256, image::Rgba([200, 30, 30, 255]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let ico = encode_icon(&PngPayload::new(png).unwrap()).unwrap();
        let decoded = image::load_from_memory_with_format(&ico, image::ImageFormat::Ico).unwrap();
        assert_eq!(decoded.width(), 256);
        assert_eq!(decoded.height(), 256);
    }

    #[test]
    fn write_icon_file_truncates_existing_file() {
        let dir = std::env::temp_dir().join(format!("icon-converter-ico-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.ico");
        std::fs::write(&path, vec![0xAAu8; 4096]).unwrap();

        let payload = placeholder_png();
        let written = write_icon_file(&path, &payload).unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(written, 32);
        assert_eq!(on_disk, encode_icon(&payload).unwrap());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_icon_file_reports_create_failure() {
        let path = std::env::temp_dir()
            .join(format!("icon-converter-missing-{}", std::process::id()))
            .join("nested")
            .join("out.ico");
        let err = write_icon_file(&path, &placeholder_png()).unwrap_err();
        assert!(matches!(err, IcoError::Create(_)));
    }
}
