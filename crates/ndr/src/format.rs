//! Data representation of a marshaling pass
//!
//! The byte order and transfer syntax are fixed once per call and never
//! change between fields.

use bytes::{Buf, BufMut};

/// Alignment marker meaning "align to the pointer size of the transfer syntax"
pub const ALIGN_PTR: usize = 9;

/// Byte-order dispatching `put_*` / `get_*` pairs over `bytes`.
///
/// The big-endian method of `BufMut`/`Buf` shares its name with the
/// generated one. Getters assume the caller checked `remaining()`.
macro_rules! byte_order_accessors {
    ($($ty:ty: $put:ident / $put_le:ident, $get:ident / $get_le:ident;)*) => {
        $(
            #[inline]
            pub fn $put<B: BufMut>(&self, buf: &mut B, value: $ty) {
                if self.little_endian {
                    buf.$put_le(value);
                } else {
                    buf.$put(value);
                }
            }

            #[inline]
            pub fn $get<B: Buf>(&self, buf: &mut B) -> $ty {
                if self.little_endian {
                    buf.$get_le()
                } else {
                    buf.$get()
                }
            }
        )*
    };
}

/// NDR transfer syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferSyntax {
    /// NDR 2.0: 32-bit sizes and referent ids
    #[default]
    Ndr20,
    /// NDR64: 64-bit sizes and referent ids, 4-byte enums
    Ndr64,
}

/// Byte order and transfer syntax used for one marshaling pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdrFormat {
    /// Whether to use little-endian byte order
    pub little_endian: bool,
    /// Transfer syntax negotiated for the presentation context
    pub syntax: TransferSyntax,
}

impl NdrFormat {
    /// Little-endian NDR 2.0 (default)
    pub fn new() -> Self {
        Self {
            little_endian: true,
            syntax: TransferSyntax::Ndr20,
        }
    }

    /// Big-endian NDR 2.0
    pub fn big_endian() -> Self {
        Self {
            little_endian: false,
            syntax: TransferSyntax::Ndr20,
        }
    }

    /// Little-endian NDR64
    pub fn ndr64() -> Self {
        Self {
            little_endian: true,
            syntax: TransferSyntax::Ndr64,
        }
    }

    /// NDR 2.0 with the given byte order
    pub fn with_byte_order(little_endian: bool) -> Self {
        Self {
            little_endian,
            syntax: TransferSyntax::Ndr20,
        }
    }

    /// Build from the 4-byte data representation label of a PDU header.
    ///
    /// Only the integer representation (upper nibble of byte 0) matters to
    /// the codec; character and floating point formats are assumed ASCII/IEEE.
    pub fn from_data_representation(label: [u8; 4]) -> Self {
        Self::with_byte_order(label[0] & 0xF0 != 0)
    }

    #[inline]
    pub fn is_ndr64(&self) -> bool {
        self.syntax == TransferSyntax::Ndr64
    }

    /// Width of sizes, offsets, counts and referent ids
    #[inline]
    pub fn size_width(&self) -> usize {
        if self.is_ndr64() {
            8
        } else {
            4
        }
    }

    /// Resolve an alignment value, expanding the pointer-size marker
    #[inline]
    pub fn resolve_align(&self, alignment: usize) -> usize {
        if alignment == ALIGN_PTR {
            self.size_width()
        } else {
            alignment
        }
    }

    /// Calculate padding needed to align to the given boundary
    #[inline]
    pub fn align_padding(&self, position: usize, alignment: usize) -> usize {
        let alignment = self.resolve_align(alignment);
        if alignment <= 1 {
            return 0;
        }
        let remainder = position % alignment;
        if remainder == 0 {
            0
        } else {
            alignment - remainder
        }
    }

    byte_order_accessors! {
        u16: put_u16 / put_u16_le, get_u16 / get_u16_le;
        i16: put_i16 / put_i16_le, get_i16 / get_i16_le;
        u32: put_u32 / put_u32_le, get_u32 / get_u32_le;
        i32: put_i32 / put_i32_le, get_i32 / get_i32_le;
        u64: put_u64 / put_u64_le, get_u64 / get_u64_le;
        i64: put_i64 / put_i64_le, get_i64 / get_i64_le;
        f32: put_f32 / put_f32_le, get_f32 / get_f32_le;
        f64: put_f64 / put_f64_le, get_f64 / get_f64_le;
    }
}

impl Default for NdrFormat {
    fn default() -> Self {
        Self::new()
    }
}
