//! Little endian binary layout of [`PackedBvh`]:
//!
//! ```text
//! i32 node_count
//! node_count x { f32x3 min, f32x3 max, i32 field_a, i32 field_b }
//! i32 proxy_count
//! proxy_count x i32
//! ```
//!
//! A leaf stores `first_proxy` and `proxy_count` in the two fields. An internal node
//! stores the bit negated child indices, so a negative `field_a` marks it.

use std::io::{self, Read, Write};

use rendiation_algebra::Vec3;
use rendiation_geometry::Box3;

use super::*;

#[derive(thiserror::Error, Debug)]
pub enum BvhIoError {
  #[error("corrupt bvh index: {0}")]
  CorruptIndex(#[from] CorruptReason),
  #[error("bvh index io failed: {0}")]
  Io(io::Error),
}

impl From<io::Error> for BvhIoError {
  fn from(e: io::Error) -> Self {
    if e.kind() == io::ErrorKind::UnexpectedEof {
      BvhIoError::CorruptIndex(CorruptReason::Truncated)
    } else {
      BvhIoError::Io(e)
    }
  }
}

const MAX_PREALLOCATE: usize = 1 << 16;

pub trait LittleEndianWrite: Write {
  fn write_i32_le(&mut self, v: i32) -> io::Result<()> {
    self.write_all(&v.to_le_bytes())
  }

  fn write_f32_le(&mut self, v: f32) -> io::Result<()> {
    self.write_all(&v.to_le_bytes())
  }

  fn write_vec3_le(&mut self, v: Vec3<f32>) -> io::Result<()> {
    self.write_f32_le(v.x)?;
    self.write_f32_le(v.y)?;
    self.write_f32_le(v.z)
  }

  /// write a length or count as i32, failing if it does not fit
  fn write_count_le(&mut self, count: usize) -> io::Result<()> {
    let count = i32::try_from(count)
      .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "count exceeds i32 range"))?;
    self.write_i32_le(count)
  }

  /// 7 bits per byte, low bits first, high bit set while more bytes follow
  fn write_var_u32(&mut self, mut v: u32) -> io::Result<()> {
    while v >= 0x80 {
      self.write_all(&[(v as u8) | 0x80])?;
      v >>= 7;
    }
    self.write_all(&[v as u8])
  }
}

impl<W: Write + ?Sized> LittleEndianWrite for W {}

pub trait LittleEndianRead: Read {
  fn read_i32_le(&mut self) -> io::Result<i32> {
    let mut buf = [0; 4];
    self.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
  }

  fn read_f32_le(&mut self) -> io::Result<f32> {
    let mut buf = [0; 4];
    self.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
  }

  fn read_vec3_le(&mut self) -> io::Result<Vec3<f32>> {
    Ok(Vec3::new(
      self.read_f32_le()?,
      self.read_f32_le()?,
      self.read_f32_le()?,
    ))
  }

  fn read_count_le(&mut self, what: &'static str) -> Result<usize, BvhIoError> {
    let count = self.read_i32_le()?;
    usize::try_from(count).map_err(|_| CorruptReason::NegativeCount { what, count }.into())
  }

  fn read_var_u32(&mut self) -> Result<u32, BvhIoError> {
    let mut result: u32 = 0;
    for i in 0..5 {
      let mut byte = [0];
      self.read_exact(&mut byte)?;
      let byte = byte[0];
      // the fifth byte only has room for the top 4 bits
      if i == 4 && byte > 0x0F {
        return Err(CorruptReason::MalformedVarInt.into());
      }
      result |= ((byte & 0x7F) as u32) << (7 * i);
      if byte & 0x80 == 0 {
        return Ok(result);
      }
    }
    Err(CorruptReason::MalformedVarInt.into())
  }
}

impl<R: Read + ?Sized> LittleEndianRead for R {}

/// capacity for a count read from an untrusted stream
pub fn preallocate<T>(count: usize) -> Vec<T> {
  Vec::with_capacity(count.min(MAX_PREALLOCATE))
}

impl PackedBvh {
  pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
    writer.write_count_le(self.nodes.len())?;
    for node in &self.nodes {
      writer.write_vec3_le(node.bounding.min)?;
      writer.write_vec3_le(node.bounding.max)?;
      let (field_a, field_b) = match node.kind {
        PackedBvhNodeKind::Leaf {
          first_proxy,
          proxy_count,
        } => (first_proxy as i32, proxy_count as i32),
        PackedBvhNodeKind::Internal { left, right } => (!(left as i32), !(right as i32)),
      };
      writer.write_i32_le(field_a)?;
      writer.write_i32_le(field_b)?;
    }
    writer.write_count_le(self.proxies.len())?;
    for &proxy in &self.proxies {
      writer.write_i32_le(proxy as i32)?;
    }
    Ok(())
  }

  /// Read and fully validate a tree. Any inconsistency, including a truncated stream,
  /// is reported as [`BvhIoError::CorruptIndex`].
  pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, BvhIoError> {
    let node_count = reader.read_count_le("node")?;
    let mut nodes = preallocate(node_count);
    for index in 0..node_count {
      let min = reader.read_vec3_le()?;
      let max = reader.read_vec3_le()?;
      let bounding = Box3::new(min, max);
      let field_a = reader.read_i32_le()?;
      let field_b = reader.read_i32_le()?;
      let kind = match (field_a >= 0, field_b >= 0) {
        (true, true) => PackedBvhNodeKind::Leaf {
          first_proxy: field_a as u32,
          proxy_count: field_b as u32,
        },
        (false, false) => PackedBvhNodeKind::Internal {
          left: !field_a as u32,
          right: !field_b as u32,
        },
        _ => {
          return Err(
            CorruptReason::InvalidChild {
              node: index as u32,
              child: field_b as u32,
            }
            .into(),
          )
        }
      };
      nodes.push(PackedBvhNode { bounding, kind });
    }

    let proxy_count = reader.read_count_le("proxy")?;
    let mut proxies = preallocate(proxy_count);
    for _ in 0..proxy_count {
      let proxy = reader.read_i32_le()?;
      proxies.push(proxy as u32);
    }

    Ok(Self::from_parts(nodes, proxies)?)
  }

  pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    self.write_to(&mut buffer)?;
    Ok(buffer)
  }

  /// Like [`PackedBvh::read_from`] but also rejects trailing bytes.
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, BvhIoError> {
    let mut reader = bytes;
    let bvh = Self::read_from(&mut reader)?;
    if !reader.is_empty() {
      return Err(CorruptReason::TrailingBytes(reader.len()).into());
    }
    Ok(bvh)
  }
}
