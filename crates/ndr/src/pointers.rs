//! NDR pointer types
//!
//! Two pointer semantics are used by the generated bindings:
//!
//! - Reference (`[ref]`): non-null, top-level parameter, no wire
//!   representation; the referent is encoded in place
//! - Unique (`[unique]`): nullable, a referent id inline (4 bytes NDR20,
//!   8 bytes NDR64) and the referent in the deferred section
//!
//! Full pointers (`[ptr]`) with aliasing are not supported.

use crate::{NdrContext, NdrMarshal, NdrReader, NdrUnmarshal, NdrWriter, Result};
use std::ops::{Deref, DerefMut};

/// Trait for NDR pointer types
pub trait NdrPtr {
    type Target;

    /// Check if the pointer is null
    fn is_null(&self) -> bool;

    /// Get the inner value, if any
    fn get(&self) -> Option<&Self::Target>;

    /// Get a mutable reference to the inner value, if any
    fn get_mut(&mut self) -> Option<&mut Self::Target>;
}

/// Reference pointer - non-null, data follows inline
///
/// The `[ref]` attribute on a top-level parameter. The pointer itself is not
/// transmitted; the pointee is always present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefPtr<T>(pub T);

impl<T> RefPtr<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for RefPtr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for RefPtr<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> NdrPtr for RefPtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        false
    }

    fn get(&self) -> Option<&T> {
        Some(&self.0)
    }

    fn get_mut(&mut self) -> Option<&mut T> {
        Some(&mut self.0)
    }
}

impl<T: NdrMarshal> NdrMarshal for RefPtr<T> {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.0.marshal_ndr(ctx, w)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.0.prepare_payload()
    }
}

impl<T: NdrUnmarshal> NdrUnmarshal for RefPtr<T> {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.0.unmarshal_ndr(ctx, r)
    }
}

/// Unique pointer - nullable, no aliasing
///
/// The `[unique]` attribute. Encoded as a referent id (0 = null) at the
/// field's position; a non-null referent follows in the deferred section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquePtr<T>(pub Option<Box<T>>);

impl<T> UniquePtr<T> {
    pub fn new(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn from_option(opt: Option<T>) -> Self {
        Self(opt.map(Box::new))
    }

    pub fn into_option(self) -> Option<T> {
        self.0.map(|b| *b)
    }

    pub fn as_ref(&self) -> Option<&T> {
        self.0.as_deref()
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut()
    }
}

impl<T> Default for UniquePtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Option<T>> for UniquePtr<T> {
    fn from(opt: Option<T>) -> Self {
        Self::from_option(opt)
    }
}

impl<T> NdrPtr for UniquePtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        self.0.is_none()
    }

    fn get(&self) -> Option<&T> {
        self.0.as_deref()
    }

    fn get_mut(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut()
    }
}

impl<T: NdrMarshal> NdrMarshal for UniquePtr<T> {
    fn marshal_ndr<'a>(&'a self, _ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_pointer(self.0.as_deref())
    }

    fn prepare_payload(&mut self) -> Result<()> {
        match self.0.as_deref_mut() {
            Some(value) => value.prepare_payload(),
            None => Ok(()),
        }
    }
}

impl<T: NdrUnmarshal + Default> NdrUnmarshal for UniquePtr<T> {
    fn unmarshal_ndr<'a>(&'a mut self, _ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_pointer(&mut self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{marshal, unmarshal, ConformantArray, NdrFormat};

    #[test]
    fn test_ref_ptr() {
        let mut ptr = RefPtr::new(42u32);
        let bytes = marshal(&mut ptr, NdrFormat::new()).unwrap();

        // No referent ID for ref pointers
        assert_eq!(&bytes[..], &[42, 0, 0, 0]);

        let decoded: RefPtr<u32> = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(*decoded, 42);
    }

    #[test]
    fn test_unique_ptr_non_null() {
        let mut ptr = UniquePtr::new(0xDEADBEEFu32);
        let bytes = marshal(&mut ptr, NdrFormat::new()).unwrap();

        // Referent ID + data
        assert_eq!(&bytes[..], &[0x00, 0x00, 0x02, 0x00, 0xEF, 0xBE, 0xAD, 0xDE]);

        let decoded: UniquePtr<u32> = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert!(!decoded.is_null());
        assert_eq!(*decoded.get().unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn test_unique_ptr_null() {
        let mut ptr: UniquePtr<u32> = UniquePtr::null();
        let bytes = marshal(&mut ptr, NdrFormat::new()).unwrap();

        assert_eq!(&bytes[..], &[0, 0, 0, 0]);

        let decoded: UniquePtr<u32> = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert!(decoded.is_null());
    }

    #[test]
    fn test_null_and_empty_array_differ() {
        let mut null: UniquePtr<ConformantArray<u8>> = UniquePtr::null();
        let mut empty = UniquePtr::new(ConformantArray::<u8>::new(Vec::new()));

        let null_bytes = marshal(&mut null, NdrFormat::new()).unwrap();
        let empty_bytes = marshal(&mut empty, NdrFormat::new()).unwrap();
        assert_ne!(null_bytes, empty_bytes);
        assert_eq!(&empty_bytes[..], &[0x00, 0x00, 0x02, 0x00, 0, 0, 0, 0]);

        let decoded: UniquePtr<ConformantArray<u8>> = unmarshal(null_bytes, NdrFormat::new()).unwrap();
        assert!(decoded.is_null());
        let decoded: UniquePtr<ConformantArray<u8>> = unmarshal(empty_bytes, NdrFormat::new()).unwrap();
        assert!(decoded.get().unwrap().is_empty());
    }

    #[test]
    fn test_unique_ptr_ndr64() {
        let mut ptr = UniquePtr::new(7i64);
        let bytes = marshal(&mut ptr, NdrFormat::ndr64()).unwrap();
        assert_eq!(bytes.len(), 16);

        let decoded: UniquePtr<i64> = unmarshal(bytes, NdrFormat::ndr64()).unwrap();
        assert_eq!(decoded.into_option(), Some(7));
    }

    #[test]
    fn test_truncated_referent() {
        let result: Result<UniquePtr<u32>> =
            unmarshal(vec![0x00u8, 0x00, 0x02, 0x00, 1, 2], NdrFormat::new());
        assert!(matches!(result, Err(crate::NdrError::Truncated { .. })));
    }
}
