//! DCOM identifiers (MS-DCOM 2.2.1, 2.2.18)

use msrpc_ndr::Guid;

/// Causality ID: identifies the chain of calls an ORPC call belongs to
pub type Cid = Guid;

/// Interface identifier
pub type Iid = Guid;

/// Generate a new random v4 UUID in NDR layout
pub fn generate_uuid() -> Guid {
    Guid::from_rfc4122(*uuid::Uuid::new_v4().as_bytes())
}

/// Parse a well-known identifier string
///
/// Returns the nil GUID for malformed input; only used with literals.
pub fn well_known(s: &str) -> Guid {
    Guid::parse(s).unwrap_or(Guid::NIL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uuid_is_v4() {
        let a = generate_uuid();
        let b = generate_uuid();
        assert_ne!(a, b);
        assert!(!a.is_nil());
        assert_eq!(a.data3 >> 12, 4);
    }

    #[test]
    fn test_well_known() {
        assert_eq!(
            well_known(crate::iid::IUNKNOWN).to_string(),
            "00000000-0000-0000-c000-000000000046"
        );
        assert!(well_known("bogus").is_nil());
    }
}
