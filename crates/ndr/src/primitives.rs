//! NDR primitive type implementations
//!
//! NDR primitive types and their encodings:
//!
//! | MIDL Type      | Rust Type  | NDR20 size | NDR64 size |
//! |----------------|------------|------------|------------|
//! | boolean        | bool       | 1          | 1          |
//! | byte/char      | u8         | 1          | 1          |
//! | small          | i8         | 1          | 1          |
//! | short          | i16        | 2          | 2          |
//! | long/int       | i32        | 4          | 4          |
//! | hyper          | i64        | 8          | 8          |
//! | unsigned short | u16        | 2          | 2          |
//! | unsigned long  | u32        | 4          | 4          |
//! | unsigned hyper | u64        | 8          | 8          |
//! | float          | f32        | 4          | 4          |
//! | double         | f64        | 8          | 8          |
//! | enum           | NdrEnum    | 2          | 4          |
//! | __int3264      | Int3264    | 4          | 8          |
//!
//! Every primitive aligns to its own wire size.

use crate::{NdrContext, NdrError, NdrFormat, NdrMarshal, NdrReader, NdrUnmarshal, NdrWriter, Result};
use bytes::{Buf, BufMut};

/// Fixed-width scalar with a byte-order dependent wire form
pub trait Primitive: Copy + Default {
    /// Number of bytes on the wire, which is also the natural alignment
    fn wire_size(format: &NdrFormat) -> usize;

    /// Append the wire form. The caller has already checked capacity.
    ///
    /// Fails without writing anything when the value does not fit the
    /// wire width of `format`.
    fn put<B: BufMut>(self, format: &NdrFormat, buf: &mut B) -> Result<()>;

    /// Consume the wire form. The caller has already checked `remaining()`.
    fn get<B: Buf>(format: &NdrFormat, buf: &mut B) -> Result<Self>;
}

macro_rules! impl_primitive {
    ($ty:ty, $size:expr, $put:ident, $get:ident) => {
        impl Primitive for $ty {
            #[inline]
            fn wire_size(_format: &NdrFormat) -> usize {
                $size
            }

            #[inline]
            fn put<B: BufMut>(self, format: &NdrFormat, buf: &mut B) -> Result<()> {
                format.$put(buf, self);
                Ok(())
            }

            #[inline]
            fn get<B: Buf>(format: &NdrFormat, buf: &mut B) -> Result<Self> {
                Ok(format.$get(buf))
            }
        }
    };
}

impl_primitive!(u16, 2, put_u16, get_u16);
impl_primitive!(i16, 2, put_i16, get_i16);
impl_primitive!(u32, 4, put_u32, get_u32);
impl_primitive!(i32, 4, put_i32, get_i32);
impl_primitive!(u64, 8, put_u64, get_u64);
impl_primitive!(i64, 8, put_i64, get_i64);
impl_primitive!(f32, 4, put_f32, get_f32);
impl_primitive!(f64, 8, put_f64, get_f64);

impl Primitive for u8 {
    fn wire_size(_format: &NdrFormat) -> usize {
        1
    }

    fn put<B: BufMut>(self, _format: &NdrFormat, buf: &mut B) -> Result<()> {
        buf.put_u8(self);
        Ok(())
    }

    fn get<B: Buf>(_format: &NdrFormat, buf: &mut B) -> Result<Self> {
        Ok(buf.get_u8())
    }
}

impl Primitive for i8 {
    fn wire_size(_format: &NdrFormat) -> usize {
        1
    }

    fn put<B: BufMut>(self, _format: &NdrFormat, buf: &mut B) -> Result<()> {
        buf.put_i8(self);
        Ok(())
    }

    fn get<B: Buf>(_format: &NdrFormat, buf: &mut B) -> Result<Self> {
        Ok(buf.get_i8())
    }
}

/// NDR boolean - encoded as a single byte (0x00 = false, anything else = true)
impl Primitive for bool {
    fn wire_size(_format: &NdrFormat) -> usize {
        1
    }

    fn put<B: BufMut>(self, _format: &NdrFormat, buf: &mut B) -> Result<()> {
        buf.put_u8(u8::from(self));
        Ok(())
    }

    fn get<B: Buf>(_format: &NdrFormat, buf: &mut B) -> Result<Self> {
        Ok(buf.get_u8() != 0)
    }
}

/// NDR enumeration value
///
/// Enums travel as 16-bit values in NDR20 and 32-bit values in NDR64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NdrEnum(pub u16);

impl Primitive for NdrEnum {
    fn wire_size(format: &NdrFormat) -> usize {
        if format.is_ndr64() {
            4
        } else {
            2
        }
    }

    fn put<B: BufMut>(self, format: &NdrFormat, buf: &mut B) -> Result<()> {
        if format.is_ndr64() {
            format.put_u32(buf, u32::from(self.0));
        } else {
            format.put_u16(buf, self.0);
        }
        Ok(())
    }

    /// NDR64 carries enums in 32 bits, but their values stay 16-bit.
    fn get<B: Buf>(format: &NdrFormat, buf: &mut B) -> Result<Self> {
        if format.is_ndr64() {
            let raw = format.get_u32(buf);
            u16::try_from(raw)
                .map(Self)
                .map_err(|_| out_of_range(i128::from(raw), 2))
        } else {
            Ok(Self(format.get_u16(buf)))
        }
    }
}

impl From<NdrEnum> for u64 {
    fn from(value: NdrEnum) -> Self {
        u64::from(value.0)
    }
}

/// Unsigned `__int3264`: pointer-sized integer (4 bytes NDR20, 8 bytes NDR64)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uint3264(pub u64);

impl Primitive for Uint3264 {
    fn wire_size(format: &NdrFormat) -> usize {
        format.size_width()
    }

    fn put<B: BufMut>(self, format: &NdrFormat, buf: &mut B) -> Result<()> {
        if format.is_ndr64() {
            format.put_u64(buf, self.0);
        } else {
            let narrow = u32::try_from(self.0).map_err(|_| out_of_range(i128::from(self.0), 4))?;
            format.put_u32(buf, narrow);
        }
        Ok(())
    }

    fn get<B: Buf>(format: &NdrFormat, buf: &mut B) -> Result<Self> {
        if format.is_ndr64() {
            Ok(Self(format.get_u64(buf)))
        } else {
            Ok(Self(u64::from(format.get_u32(buf))))
        }
    }
}

/// Signed `__int3264`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Int3264(pub i64);

impl Primitive for Int3264 {
    fn wire_size(format: &NdrFormat) -> usize {
        format.size_width()
    }

    fn put<B: BufMut>(self, format: &NdrFormat, buf: &mut B) -> Result<()> {
        if format.is_ndr64() {
            format.put_i64(buf, self.0);
        } else {
            let narrow = i32::try_from(self.0).map_err(|_| out_of_range(i128::from(self.0), 4))?;
            format.put_i32(buf, narrow);
        }
        Ok(())
    }

    fn get<B: Buf>(format: &NdrFormat, buf: &mut B) -> Result<Self> {
        if format.is_ndr64() {
            Ok(Self(format.get_i64(buf)))
        } else {
            Ok(Self(i64::from(format.get_i32(buf))))
        }
    }
}

fn out_of_range(value: i128, width: usize) -> NdrError {
    NdrError::ValueOutOfRange { value, width }
}

// As struct members or array elements, primitives align to their own size.
macro_rules! impl_ndr_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl NdrMarshal for $ty {
                fn marshal_ndr<'a>(&'a self, _ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
                    w.write_field(*self)
                }
            }

            impl NdrUnmarshal for $ty {
                fn unmarshal_ndr<'a>(&'a mut self, _ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
                    *self = r.read_field()?;
                    Ok(())
                }
            }
        )*
    };
}

impl_ndr_field!(u8, i8, bool, u16, i16, u32, i32, u64, i64, f32, f64, NdrEnum, Uint3264, Int3264);

/// GUID/UUID in its NDR layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Nil GUID
    pub const NIL: Self = Self {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    /// Parse from string "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
    pub fn parse(s: &str) -> Option<Self> {
        const GROUP_LENGTHS: [usize; 5] = [8, 4, 4, 4, 12];

        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != GROUP_LENGTHS.len() {
            return None;
        }
        for (part, len) in parts.iter().zip(GROUP_LENGTHS) {
            if part.len() != len || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
        }

        let data1 = u32::from_str_radix(parts[0], 16).ok()?;
        let data2 = u16::from_str_radix(parts[1], 16).ok()?;
        let data3 = u16::from_str_radix(parts[2], 16).ok()?;
        let clock = u16::from_str_radix(parts[3], 16).ok()?;
        let node_str = parts[4];

        let mut data4 = [0u8; 8];
        data4[0] = (clock >> 8) as u8;
        data4[1] = clock as u8;
        for i in 0..6 {
            data4[2 + i] = u8::from_str_radix(node_str.get(i * 2..i * 2 + 2)?, 16).ok()?;
        }

        Some(Self { data1, data2, data3, data4 })
    }

    /// Build from the 16 bytes of an RFC 4122 (big-endian) UUID
    pub fn from_rfc4122(bytes: [u8; 16]) -> Self {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..]);
        Self {
            data1: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_be_bytes([bytes[4], bytes[5]]),
            data3: u16::from_be_bytes([bytes[6], bytes[7]]),
            data4,
        }
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

impl NdrMarshal for Guid {
    fn marshal_ndr<'a>(&'a self, _ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        // GUID aligns to 4 bytes (same as first field)
        w.write_align(4)?;
        w.write_data(self.data1)?;
        w.write_data(self.data2)?;
        w.write_data(self.data3)?;
        w.write_bytes(&self.data4)
    }
}

impl NdrUnmarshal for Guid {
    fn unmarshal_ndr<'a>(&'a mut self, _ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.data1 = r.read_data()?;
        self.data2 = r.read_data()?;
        self.data3 = r.read_data()?;
        r.read_bytes(&mut self.data4)
    }
}
