//! Little-endian primitive reads and writes for MD3 records.
//!
//! Reads are strictly sequential. Callers keep their own byte counts to check
//! section placement against the offsets declared in the headers.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Result;
use crate::math::Vec3;

/// Extension trait for reading MD3 primitives from a reader
pub trait ReadExt: Read {
    fn read_byte(&mut self) -> Result<u8> {
        Ok(ReadBytesExt::read_u8(self)?)
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        Ok(ReadBytesExt::read_u16::<LittleEndian>(self)?)
    }

    fn read_i16_le(&mut self) -> Result<i16> {
        Ok(ReadBytesExt::read_i16::<LittleEndian>(self)?)
    }

    fn read_i32_le(&mut self) -> Result<i32> {
        Ok(ReadBytesExt::read_i32::<LittleEndian>(self)?)
    }

    fn read_f32_le(&mut self) -> Result<f32> {
        Ok(ReadBytesExt::read_f32::<LittleEndian>(self)?)
    }

    fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(
            self.read_f32_le()?,
            self.read_f32_le()?,
            self.read_f32_le()?,
        ))
    }

    /// Reads `len` bytes and keeps everything before the first NUL.
    fn read_fixed_string(&mut self, len: usize) -> Result<String> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(len);
        Ok(buf[..end].iter().map(|&b| char::from(b)).collect())
    }
}

/// Extension trait for writing MD3 primitives to a writer
pub trait WriteExt: Write {
    fn write_byte(&mut self, n: u8) -> Result<()> {
        Ok(WriteBytesExt::write_u8(self, n)?)
    }

    fn write_u16_le(&mut self, n: u16) -> Result<()> {
        Ok(WriteBytesExt::write_u16::<LittleEndian>(self, n)?)
    }

    fn write_i16_le(&mut self, n: i16) -> Result<()> {
        Ok(WriteBytesExt::write_i16::<LittleEndian>(self, n)?)
    }

    fn write_i32_le(&mut self, n: i32) -> Result<()> {
        Ok(WriteBytesExt::write_i32::<LittleEndian>(self, n)?)
    }

    fn write_f32_le(&mut self, n: f32) -> Result<()> {
        Ok(WriteBytesExt::write_f32::<LittleEndian>(self, n)?)
    }

    fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32_le(v.x)?;
        self.write_f32_le(v.y)?;
        self.write_f32_le(v.z)
    }

    /// Writes `s` into a NUL padded field of `len` bytes, cutting it so that
    /// at least one terminating NUL remains.
    fn write_fixed_string(&mut self, s: &str, len: usize) -> Result<()> {
        let mut buf = vec![0u8; len];
        let bytes: Vec<u8> = s.chars().map(|c| u8::try_from(c).unwrap_or(b'?')).collect();
        let n = bytes.len().min(len.saturating_sub(1));
        buf[..n].copy_from_slice(&bytes[..n]);
        self.write_all(&buf)?;
        Ok(())
    }
}

impl<R: Read + ?Sized> ReadExt for R {}
impl<W: Write + ?Sized> WriteExt for W {}
