//! NDR string types
//!
//! `[string]` pointers and arrays are conformant varying arrays whose last
//! element is a NUL terminator.
//!
//! Wire format:
//! ```text
//! max_count: u32/u64    # elements including NUL, omitted when hoisted
//! offset: u32/u64       # always 0
//! actual_count: u32/u64 # elements including NUL
//! chars[actual_count]
//! ```
//!
//! No padding follows the characters; the next field aligns itself.

use crate::arrays::wire_count;
use crate::{NdrContext, NdrError, NdrMarshal, NdrReader, NdrUnmarshal, NdrWriter, Result, UniquePtr};

/// Write the max/offset/actual header of a string of `actual` elements
fn write_string_header(ctx: &NdrContext, w: &mut NdrWriter<'_>, actual: u64) -> Result<()> {
    let max_count = match ctx.size_info() {
        Some(_) => ctx.dimension(0),
        None => {
            w.write_size(actual)?;
            actual
        }
    };
    if actual > max_count {
        return Err(NdrError::ConformanceMismatch {
            max_count,
            actual_count: actual,
        });
    }
    w.write_size(0)?;
    w.write_size(actual)
}

/// Read and validate a string header; returns the element count including
/// the NUL, already checked against the remaining input.
fn read_string_header(ctx: &NdrContext, r: &mut NdrReader<'_>, unit_size: u64) -> Result<usize> {
    let max_count = match ctx.size_info() {
        Some(_) => ctx.dimension(0),
        None => r.read_size()?,
    };
    let offset = r.read_size()?;
    if offset != 0 {
        return Err(NdrError::InvalidString(format!("non-zero offset {offset}")));
    }
    let actual_count = r.read_size()?;
    if actual_count > max_count {
        return Err(NdrError::ConformanceMismatch {
            max_count,
            actual_count,
        });
    }
    r.check_size(actual_count.saturating_mul(unit_size))?;
    Ok(actual_count as usize)
}

/// Encode `value` as a NUL-terminated UTF-16 `[string] wchar_t*`
pub fn write_utf16_nstring(ctx: &NdrContext, w: &mut NdrWriter<'_>, value: &str) -> Result<()> {
    let units: Vec<u16> = value.encode_utf16().chain(std::iter::once(0)).collect();
    write_string_header(ctx, w, units.len() as u64)?;
    for unit in units {
        w.write_data(unit)?;
    }
    Ok(())
}

/// Decode a NUL-terminated UTF-16 string
pub fn read_utf16_nstring(ctx: &NdrContext, r: &mut NdrReader<'_>) -> Result<String> {
    let count = read_string_header(ctx, r, 2)?;
    let mut units = Vec::with_capacity(count);
    for _ in 0..count {
        units.push(r.read_data::<u16>()?);
    }
    if units.last() == Some(&0) {
        units.pop();
    }
    Ok(char::decode_utf16(units).collect::<std::result::Result<String, _>>()?)
}

/// Encode `value` as a NUL-terminated `[string] char*`
pub fn write_char_nstring(ctx: &NdrContext, w: &mut NdrWriter<'_>, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    write_string_header(ctx, w, bytes.len() as u64 + 1)?;
    w.write_bytes(bytes)?;
    w.write_data(0u8)
}

/// Decode a NUL-terminated 8-bit string
pub fn read_char_nstring(ctx: &NdrContext, r: &mut NdrReader<'_>) -> Result<String> {
    let count = read_string_header(ctx, r, 1)?;
    let mut bytes = vec![0u8; count];
    r.read_bytes(&mut bytes)?;
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    Ok(String::from_utf8(bytes)?)
}

/// ANSI string type (null-terminated char*)
///
/// Used for [string] annotated char* parameters in MIDL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrString(pub String);

impl NdrString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for NdrString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl NdrMarshal for NdrString {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        write_char_nstring(ctx, w, &self.0)
    }
}

impl NdrUnmarshal for NdrString {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.0 = read_char_nstring(ctx, r)?;
        Ok(())
    }
}

/// Unicode string type (null-terminated wchar_t*)
///
/// Used for [string] annotated wchar_t* parameters in MIDL.
/// Encoded as UTF-16 on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrWString(pub String);

impl NdrWString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for NdrWString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl NdrMarshal for NdrWString {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        write_utf16_nstring(ctx, w, &self.0)
    }
}

impl NdrUnmarshal for NdrWString {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.0 = read_utf16_nstring(ctx, r)?;
        Ok(())
    }
}

/// `FLAGGED_WORD_BLOB`, the wire form of a BSTR
///
/// A conformant structure: `cl_size` is hoisted ahead of the fields.
/// ```text
/// max_count: u32       # == cl_size
/// c_bytes: u32         # byte length of the string
/// cl_size: u32         # number of UTF-16 units
/// as_data[cl_size]: u16
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlaggedWordBlob {
    pub c_bytes: u32,
    pub cl_size: u32,
    pub as_data: Vec<u16>,
}

impl FlaggedWordBlob {
    /// Counts saturate here; [`prepare_payload`](NdrMarshal::prepare_payload)
    /// rejects a string too long for them.
    pub fn new(s: &str) -> Self {
        let as_data: Vec<u16> = s.encode_utf16().collect();
        let cl_size = u32::try_from(as_data.len()).unwrap_or(u32::MAX);
        Self {
            c_bytes: cl_size.saturating_mul(2),
            cl_size,
            as_data,
        }
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.as_data)
    }
}

impl NdrMarshal for FlaggedWordBlob {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        let ctx = w.enter_conformant(ctx, || vec![u64::from(self.cl_size)])?;
        w.write_field(self.c_bytes)?;
        w.write_field(self.cl_size)?;
        crate::arrays::marshal_sized(&self.as_data, ctx.dimension(0), &ctx.without_size_info(), w)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.cl_size = wire_count(self.as_data.len())?;
        self.c_bytes = wire_count(self.as_data.len().saturating_mul(2))?;
        Ok(())
    }
}

impl NdrUnmarshal for FlaggedWordBlob {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        let ctx = r.enter_conformant(ctx, 1)?;
        self.c_bytes = r.read_field()?;
        self.cl_size = r.read_field()?;
        let count = r.reconcile_size(u64::from(self.cl_size), ctx.dimension(0))?;
        crate::arrays::unmarshal_sized(&mut self.as_data, count, &ctx.without_size_info(), r)
    }
}

/// BSTR: a unique pointer to a [`FlaggedWordBlob`]
///
/// A null BSTR and an empty BSTR have different wire forms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bstr(pub UniquePtr<FlaggedWordBlob>);

impl Bstr {
    pub fn new(s: &str) -> Self {
        Self(UniquePtr::new(FlaggedWordBlob::new(s)))
    }

    pub fn null() -> Self {
        Self(UniquePtr::null())
    }

    pub fn is_null(&self) -> bool {
        self.0.as_ref().is_none()
    }

    /// The string value, `None` for a null BSTR
    pub fn to_option_string(&self) -> Option<String> {
        self.0.as_ref().map(FlaggedWordBlob::to_string_lossy)
    }
}

impl From<&str> for Bstr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl NdrMarshal for Bstr {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.0.marshal_ndr(ctx, w)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.0.prepare_payload()
    }
}

impl NdrUnmarshal for Bstr {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.0.unmarshal_ndr(ctx, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{marshal, unmarshal, unmarshal_opaque, NdrFormat};

    #[test]
    fn test_ndr_string_roundtrip() {
        let mut s = NdrString::new("Hello, World!");
        let bytes = marshal(&mut s, NdrFormat::new()).unwrap();
        assert_eq!(bytes.len(), 12 + 14);

        let decoded: NdrString = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(s, decoded);
    }

    #[test]
    fn test_ndr_wstring_layout() {
        let mut s = NdrWString::new("ab");
        let bytes = marshal(&mut s, NdrFormat::new()).unwrap();
        assert_eq!(
            &bytes[..],
            &[3, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, b'a', 0, b'b', 0, 0, 0]
        );

        let decoded: NdrWString = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded.as_str(), "ab");
    }

    #[test]
    fn test_ndr_wstring_unicode() {
        let mut s = NdrWString::new("Hello\u{00e9}\u{1F600}");
        let bytes = marshal(&mut s, NdrFormat::big_endian()).unwrap();

        let decoded: NdrWString = unmarshal(bytes, NdrFormat::big_endian()).unwrap();
        assert_eq!(s, decoded);
    }

    #[test]
    fn test_empty_string() {
        let mut s = NdrString::new("");
        let bytes = marshal(&mut s, NdrFormat::new()).unwrap();

        // max_count=1, offset=0, actual_count=1 for the NUL terminator
        assert_eq!(&bytes[..], &[1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]);

        let decoded: NdrString = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded.0, "");
    }

    #[test]
    fn test_nonzero_offset_rejected() {
        let data = vec![2u8, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, b'a', 0];
        let result: Result<NdrString> = unmarshal(data, NdrFormat::new());
        assert!(matches!(result, Err(NdrError::InvalidString(_))));
    }

    #[test]
    fn test_actual_exceeds_max() {
        let data = vec![1u8, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, b'a', 0];
        let result: Result<NdrString> = unmarshal(data, NdrFormat::new());
        assert!(matches!(
            result,
            Err(NdrError::ConformanceMismatch { max_count: 1, actual_count: 2 })
        ));
    }

    #[test]
    fn test_oversized_wstring() {
        let data = vec![0xFFu8, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0];
        let result: Result<NdrWString> = unmarshal(data, NdrFormat::new());
        assert!(matches!(result, Err(NdrError::BufferOverflow { .. })));
    }

    #[test]
    fn test_invalid_utf16() {
        // lone high surrogate
        let data = vec![2u8, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0x00, 0xD8, 0, 0];
        let result: Result<NdrWString> = unmarshal(data, NdrFormat::new());
        assert!(matches!(result, Err(NdrError::Utf16(_))));
    }

    #[test]
    fn test_bstr_layout() {
        let mut s = Bstr::new("hi");
        let bytes = marshal(&mut s, NdrFormat::new()).unwrap();
        assert_eq!(
            &bytes[..],
            &[
                0x00, 0x00, 0x02, 0x00, // referent
                2, 0, 0, 0, // max_count
                4, 0, 0, 0, // c_bytes
                2, 0, 0, 0, // cl_size
                b'h', 0, b'i', 0,
            ]
        );

        let decoded: Bstr = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded.to_option_string().as_deref(), Some("hi"));
    }

    #[test]
    fn test_bstr_null_and_empty() {
        let mut null = Bstr::null();
        let mut empty = Bstr::new("");
        let null_bytes = marshal(&mut null, NdrFormat::new()).unwrap();
        let empty_bytes = marshal(&mut empty, NdrFormat::new()).unwrap();
        assert_eq!(&null_bytes[..], &[0, 0, 0, 0]);
        assert_eq!(empty_bytes.len(), 16);

        let decoded: Bstr = unmarshal(null_bytes, NdrFormat::new()).unwrap();
        assert!(decoded.is_null());
        let decoded: Bstr = unmarshal(empty_bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded.to_option_string().as_deref(), Some(""));
    }

    #[test]
    fn test_bstr_prepare_payload_fills_counts() {
        let mut s = Bstr(UniquePtr::new(FlaggedWordBlob {
            c_bytes: 0,
            cl_size: 0,
            as_data: vec![u16::from(b'x')],
        }));
        marshal(&mut s, NdrFormat::new()).unwrap();
        let blob = s.0.as_ref().unwrap();
        assert_eq!((blob.c_bytes, blob.cl_size), (2, 1));
    }

    #[test]
    fn test_bstr_zero_conformance() {
        // conformance 0 on the wire, cl_size says 1
        let data = vec![
            0x00u8, 0x00, 0x02, 0x00, 0, 0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, b'x', 0,
        ];
        let strict: Result<Bstr> = unmarshal(data.clone(), NdrFormat::new());
        assert!(matches!(strict, Err(NdrError::ArraySizeMismatch { expected: 1, got: 0 })));

        let lenient: Bstr = unmarshal_opaque(data, NdrFormat::new()).unwrap();
        assert_eq!(lenient.to_option_string().as_deref(), Some("x"));
    }
}
