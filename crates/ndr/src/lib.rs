//! NDR (Network Data Representation) codec for DCE/RPC and DCOM stubs
//!
//! This crate is the runtime that hand-written and generated bindings compose
//! to marshal request and response payloads, as specified in DCE RPC and
//! MS-RPCE.
//!
//! # NDR Wire Format
//!
//! - Primitives align to their natural size (1, 2, 4, or 8 bytes); the
//!   marker [`ALIGN_PTR`] (`9`) means the size of a pointer in the
//!   transfer syntax (4 in NDR20, 8 in NDR64)
//! - Conformant data carries its size ahead of the data; inside a conformant
//!   structure the size is hoisted to the start of the outermost structure
//!   and threaded down through [`NdrContext`]
//! - Embedded pointers are a referent id inline; referents are written in
//!   encounter order by [`NdrWriter::write_deferred`]
//! - Unions are the discriminant followed by one arm ([`NdrUnion`])
//! - Strings are conformant varying arrays with a NUL terminator
//!
//! ```
//! use msrpc_ndr::{marshal, unmarshal, NdrFormat, NdrWString, UniquePtr};
//!
//! let mut name = UniquePtr::new(NdrWString::new("disk0"));
//! let bytes = marshal(&mut name, NdrFormat::new()).unwrap();
//! let back: UniquePtr<NdrWString> = unmarshal(bytes, NdrFormat::new()).unwrap();
//! assert_eq!(back, name);
//! ```

pub mod arrays;
mod context;
mod decode;
mod encode;
mod error;
pub mod format;
mod pointers;
mod primitives;
mod reader;
pub mod strings;
mod unions;
mod writer;

pub use arrays::{
    marshal_sized, unmarshal_sized, wire_count, ConformantArray, ConformantVaryingArray,
    MAX_ZERO_PADDING,
};
pub use context::NdrContext;
pub use decode::{unmarshal, unmarshal_opaque, NdrUnmarshal};
pub use encode::{marshal, NdrMarshal};
pub use error::{NdrError, Result};
pub use format::{NdrFormat, TransferSyntax, ALIGN_PTR};
pub use pointers::{NdrPtr, RefPtr, UniquePtr};
pub use primitives::{Guid, Int3264, NdrEnum, Primitive, Uint3264};
pub use reader::NdrReader;
pub use strings::{
    read_char_nstring, read_utf16_nstring, write_char_nstring, write_utf16_nstring, Bstr,
    FlaggedWordBlob, NdrString, NdrWString,
};
pub use unions::NdrUnion;
pub use writer::{NdrWriter, FIRST_REFERENT_ID};

/// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};
