//! Cache file layout, little endian, appended by the [`PackedBvh`] blob:
//!
//! ```text
//! i32 string_count
//! string_count x { var_u32 byte_len, utf8 bytes }
//! i32 triangle_count
//! triangle_count x { f32x3 a, f32x3 b, f32x3 c, var_u32 section, var_u32 material }
//! ```

use std::io::{self, Read, Write};

use crate::*;

fn corrupt(message: String) -> BvhIoError {
  CorruptReason::Content(message).into()
}

impl MaterialBvh {
  pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
    writer.write_count_le(self.strings.len())?;
    for s in self.strings.values() {
      let len = u32::try_from(s.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
      writer.write_var_u32(len)?;
      writer.write_all(s.as_bytes())?;
    }

    writer.write_count_le(self.triangles.len())?;
    for t in &self.triangles {
      for p in t.triangle.iter_point() {
        writer.write_vec3_le(*p)?;
      }
      writer.write_var_u32(t.section.index() as u32)?;
      writer.write_var_u32(t.material.index() as u32)?;
    }

    self.bvh.write_to(writer)
  }

  /// Any inconsistency in the stream, a short read included, is reported as
  /// [`BvhIoError::CorruptIndex`] so the caller can rebuild from source.
  pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, BvhIoError> {
    let result = Self::read_from_impl(reader);
    if let Err(BvhIoError::CorruptIndex(reason)) = &result {
      log::warn!("material bvh cache rejected: {reason}");
    }
    result
  }

  fn read_from_impl<R: Read + ?Sized>(reader: &mut R) -> Result<Self, BvhIoError> {
    let string_count = reader.read_count_le("string")?;
    let mut strings = preallocate(string_count);
    for _ in 0..string_count {
      let len = reader.read_var_u32()? as usize;
      let mut bytes = preallocate(len);
      // bounded read, a corrupt length must not turn into a huge allocation
      Read::take(&mut *reader, len as u64).read_to_end(&mut bytes)?;
      if bytes.len() != len {
        return Err(CorruptReason::Truncated.into());
      }
      let s = String::from_utf8(bytes)
        .map_err(|e| corrupt(format!("string table entry is not utf-8: {e}")))?;
      strings.push(s);
    }

    let triangle_count = reader.read_count_le("triangle")?;
    let mut triangles = preallocate(triangle_count);
    for index in 0..triangle_count {
      let a = reader.read_vec3_le()?;
      let b = reader.read_vec3_le()?;
      let c = reader.read_vec3_le()?;
      let mut string_id = || -> Result<InternedId<String>, BvhIoError> {
        let id = reader.read_var_u32()? as usize;
        if id >= string_count {
          return Err(corrupt(format!(
            "triangle {index} references string {id}, table has {string_count}"
          )));
        }
        Ok(InternedId::from_index(id))
      };
      let section = string_id()?;
      let material = string_id()?;
      triangles.push(TriangleData {
        triangle: Triangle3D::new(a, b, c),
        section,
        material,
      });
    }

    let bvh = PackedBvh::read_from(reader)?;
    if bvh.shape_count() != triangle_count {
      return Err(corrupt(format!(
        "bvh indexes {} shapes but {triangle_count} triangles are stored",
        bvh.shape_count()
      )));
    }

    Ok(Self::from_parts(
      bvh,
      triangles,
      ValueInterning::from_values(strings),
    ))
  }

  pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    self.write_to(&mut buffer)?;
    Ok(buffer)
  }

  /// Like [`MaterialBvh::read_from`] but also rejects trailing bytes.
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, BvhIoError> {
    let mut reader = bytes;
    let bvh = Self::read_from(&mut reader)?;
    if !reader.is_empty() {
      let reason = CorruptReason::TrailingBytes(reader.len());
      log::warn!("material bvh cache rejected: {reason}");
      return Err(reason.into());
    }
    Ok(bvh)
  }
}
