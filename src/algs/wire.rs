//! Fixed, versioned, little-endian wire types for the shared-face exchange.
//!
//! A payload is a [`WireHdr`] and a [`WireCount`] of faces, followed by one
//! [`WireFaceHdr`] and `n` [`WireCornerFace`] records per face.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;
use std::num::TryFromIntError;

use crate::mesh_error::MeshError;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// A message from `neighbor` must be exactly `expected` bytes long.
pub fn expect_exact_len(neighbor: usize, actual: usize, expected: usize) -> Result<(), MeshError> {
    if actual == expected {
        Ok(())
    } else {
        Err(MeshError::MalformedMessage {
            neighbor,
            reason: format!("expected {expected} bytes, got {actual}"),
        })
    }
}

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Payload kind carried in [`WireHdr`].
pub const KIND_SHARED_FACES: u16 = 1;

/// All multi-byte integers in these structs are **little-endian** on the wire.
/// We store them pre-LE with `.to_le()` and decode with `.from_le()`.

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireHdr {
    pub version_le: u16,
    pub kind_le: u16,
    pub reserved_le: u32,
}

impl WireHdr {
    pub fn new(kind: u16) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: kind.to_le(),
            reserved_le: 0,
        }
    }
    pub fn kind(&self) -> u16 {
        u16::from_le(self.kind_le)
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32,
}
impl WireCount {
    /// Fails if `n` does not fit the 32-bit wire field.
    pub fn new(n: usize) -> Result<Self, TryFromIntError> {
        Ok(Self {
            n_le: u32::try_from(n)?.to_le(),
        })
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

/// One shared face as seen by the sending partition.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireFaceHdr {
    pub face_le: u64,
    pub half_face_le: u64,
    pub n_corners_le: u32,
    pub _pad: u32,
}
impl WireFaceHdr {
    pub fn new(face: u64, half_face: u64, n_corners: u32) -> Self {
        Self {
            face_le: face.to_le(),
            half_face_le: half_face.to_le(),
            n_corners_le: n_corners.to_le(),
            _pad: 0,
        }
    }
    pub fn face(&self) -> u64 {
        u64::from_le(self.face_le)
    }
    pub fn half_face(&self) -> u64 {
        u64::from_le(self.half_face_le)
    }
    pub fn n_corners(&self) -> usize {
        u32::from_le(self.n_corners_le) as usize
    }
}

/// `(global vertex, sender corner id)` for one corner-face.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireCornerFace {
    pub vertex_le: u64,
    pub corner_le: u64,
}
impl WireCornerFace {
    pub fn new(vertex: u64, corner: u64) -> Self {
        Self {
            vertex_le: vertex.to_le(),
            corner_le: corner.to_le(),
        }
    }
    pub fn vertex(&self) -> u64 {
        u64::from_le(self.vertex_le)
    }
    pub fn corner(&self) -> u64 {
        u64::from_le(self.corner_le)
    }
}

// ===== Compile-time sanity checks =========================================

const_assert_eq!(size_of::<WireHdr>(), 8);
const_assert_eq!(size_of::<WireCount>(), 4);
const_assert_eq!(size_of::<WireFaceHdr>(), 24);
const_assert_eq!(size_of::<WireCornerFace>(), 16);

/// Appends Pod records to a byte buffer.
#[derive(Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new(kind: u16) -> Self {
        let mut w = Self::default();
        w.push(&WireHdr::new(kind));
        w
    }

    pub fn push<T: Pod>(&mut self, rec: &T) {
        self.buf.extend_from_slice(bytemuck::bytes_of(rec));
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads Pod records from an unaligned byte buffer sent by `neighbor`.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    neighbor: usize,
}

impl<'a> WireReader<'a> {
    /// Start reading; checks the header version and kind.
    pub fn new(buf: &'a [u8], kind: u16, neighbor: usize) -> Result<Self, MeshError> {
        let mut r = Self {
            buf,
            pos: 0,
            neighbor,
        };
        let hdr: WireHdr = r.read()?;
        if hdr.version() != WIRE_VERSION {
            return Err(r.malformed(format!(
                "wire version {} (expected {WIRE_VERSION})",
                hdr.version()
            )));
        }
        if hdr.kind() != kind {
            return Err(r.malformed(format!(
                "payload kind {} (expected {kind})",
                hdr.kind()
            )));
        }
        Ok(r)
    }

    /// [`MeshError::MalformedMessage`] blaming this reader's sender.
    pub fn malformed(&self, reason: String) -> MeshError {
        MeshError::MalformedMessage {
            neighbor: self.neighbor,
            reason,
        }
    }

    pub fn read<T: Pod>(&mut self) -> Result<T, MeshError> {
        let end = self.pos + size_of::<T>();
        if end > self.buf.len() {
            return Err(self.malformed(format!(
                "truncated record at byte {} ({} bytes total)",
                self.pos,
                self.buf.len()
            )));
        }
        let rec = bytemuck::pod_read_unaligned(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(rec)
    }

    pub fn is_done(&self) -> bool {
        self.pos == self.buf.len()
    }
}
