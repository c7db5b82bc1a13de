//! NDR discriminated unions
//!
//! A union is transmitted as its discriminant followed by exactly one arm:
//! ```text
//! [union align] discriminant [union align] arm
//! ```
//! The union alignment only applies under NDR64.
//!
//! Union types are Rust enums. An implementation maps the active variant to
//! its label in [`NdrUnion::switch_value`] and decodes the arm selected by a
//! label in [`NdrUnion::unmarshal_arm`], returning
//! [`NdrError::UnsupportedDiscriminant`](crate::NdrError::UnsupportedDiscriminant)
//! when the union has no default arm.

use crate::{format::ALIGN_PTR, NdrContext, NdrReader, NdrWriter, Primitive, Result};

/// Discriminated union codec
pub trait NdrUnion {
    /// Discriminant type on the wire
    type Switch: Primitive + Into<u64>;

    /// Alignment of the discriminant and of the arm under NDR64
    const ALIGN: usize = ALIGN_PTR;

    /// Label of the active variant
    fn switch_value(&self) -> Self::Switch;

    /// Encode the arm selected by `sw`.
    ///
    /// When the active variant does not carry the arm for `sw`, a zero-valued
    /// arm is written with [`NdrWriter::write_zero_value`].
    fn marshal_arm<'a>(&'a self, sw: Self::Switch, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Replace `self` with the arm selected by `sw` and decode it
    fn unmarshal_arm<'a>(&'a mut self, sw: Self::Switch, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()>;

    /// Encode discriminant and arm
    fn marshal_union_ndr<'a>(&'a self, sw: Self::Switch, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_union_align(Self::ALIGN)?;
        w.write_switch(sw)?;
        w.write_union_align(Self::ALIGN)?;
        self.marshal_arm(sw, ctx, w)
    }

    /// Decode discriminant and arm; returns the discriminant
    fn unmarshal_union_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<Self::Switch> {
        r.read_union_align(Self::ALIGN)?;
        let sw: Self::Switch = r.read_switch()?;
        r.read_union_align(Self::ALIGN)?;
        self.unmarshal_arm(sw, ctx, r)?;
        Ok(sw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{marshal, unmarshal, NdrError, NdrFormat, NdrMarshal, NdrUnmarshal};

    /// `switch(long) { case 1: short; case 2: hyper; default: long }`
    #[derive(Debug, Clone, PartialEq)]
    enum Sample {
        Short(i16),
        Hyper(i64),
        Other(u32, i32),
    }

    impl Default for Sample {
        fn default() -> Self {
            Self::Short(0)
        }
    }

    impl NdrUnion for Sample {
        type Switch = u32;

        fn switch_value(&self) -> u32 {
            match self {
                Self::Short(_) => 1,
                Self::Hyper(_) => 2,
                Self::Other(label, _) => *label,
            }
        }

        fn marshal_arm<'a>(&'a self, sw: u32, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
            match (sw, self) {
                (1, Self::Short(v)) => v.marshal_ndr(ctx, w),
                (1, _) => w.write_zero_value::<i16>(ctx),
                (2, Self::Hyper(v)) => v.marshal_ndr(ctx, w),
                (2, _) => w.write_zero_value::<i64>(ctx),
                (_, Self::Other(_, v)) => v.marshal_ndr(ctx, w),
                (_, _) => w.write_zero_value::<i32>(ctx),
            }
        }

        fn unmarshal_arm<'a>(&'a mut self, sw: u32, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
            *self = match sw {
                1 => Self::Short(0),
                2 => Self::Hyper(0),
                _ => Self::Other(sw, 0),
            };
            match self {
                Self::Short(v) => v.unmarshal_ndr(ctx, r),
                Self::Hyper(v) => v.unmarshal_ndr(ctx, r),
                Self::Other(_, v) => v.unmarshal_ndr(ctx, r),
            }
        }
    }

    impl NdrMarshal for Sample {
        fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
            self.marshal_union_ndr(self.switch_value(), ctx, w)
        }
    }

    impl NdrUnmarshal for Sample {
        fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
            self.unmarshal_union_ndr(ctx, r).map(|_| ())
        }
    }

    /// `switch(short) { case 7: long }` with no default arm
    #[derive(Debug, Default, PartialEq)]
    struct Strict(i32);

    impl NdrUnion for Strict {
        type Switch = u16;

        fn switch_value(&self) -> u16 {
            7
        }

        fn marshal_arm<'a>(&'a self, _sw: u16, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
            self.0.marshal_ndr(ctx, w)
        }

        fn unmarshal_arm<'a>(&'a mut self, sw: u16, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
            match sw {
                7 => self.0.unmarshal_ndr(ctx, r),
                _ => Err(NdrError::UnsupportedDiscriminant(u64::from(sw))),
            }
        }
    }

    impl NdrUnmarshal for Strict {
        fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
            self.unmarshal_union_ndr(ctx, r).map(|_| ())
        }
    }

    #[test]
    fn test_union_roundtrip_every_arm() {
        for value in [Sample::Short(-3), Sample::Hyper(1 << 40), Sample::Other(9, -1)] {
            let mut v = value.clone();
            let bytes = marshal(&mut v, NdrFormat::new()).unwrap();
            let decoded: Sample = unmarshal(bytes, NdrFormat::new()).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_union_ndr20_layout() {
        let mut v = Sample::Hyper(5);
        let bytes = marshal(&mut v, NdrFormat::new()).unwrap();
        // discriminant, 4 bytes padding to 8, arm
        assert_eq!(&bytes[..], &[2, 0, 0, 0, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_union_align_ndr64() {
        let mut w = NdrWriter::new(NdrFormat::ndr64());
        w.write_data(1u8).unwrap();
        let v = Sample::Short(4);
        v.marshal_ndr(&NdrContext::new(), &mut w).unwrap();
        // 7 bytes union align, 4-byte discriminant, 4 bytes union align, arm
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 8 + 4 + 4 + 2);
        assert_eq!(&bytes[8..12], &[1, 0, 0, 0]);
        assert_eq!(&bytes[16..], &[4, 0]);

        let mut r = NdrReader::new(bytes, NdrFormat::ndr64());
        r.read_data::<u8>().unwrap();
        let mut decoded = Sample::default();
        decoded.unmarshal_ndr(&NdrContext::new(), &mut r).unwrap();
        assert_eq!(decoded, Sample::Short(4));
    }

    #[test]
    fn test_mismatched_arm_writes_zero_value() {
        let v = Sample::Short(4);
        let mut w = NdrWriter::new(NdrFormat::new());
        v.marshal_union_ndr(2, &NdrContext::new(), &mut w).unwrap();
        assert_eq!(&w.into_bytes()[..], &[2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_default_arm_takes_unknown_label() {
        let decoded: Sample = unmarshal(vec![99u8, 0, 0, 0, 0xFE, 0xFF, 0xFF, 0xFF], NdrFormat::new()).unwrap();
        assert_eq!(decoded, Sample::Other(99, -2));
    }

    #[test]
    fn test_unknown_label_without_default_arm() {
        let result: Result<Strict> = unmarshal(vec![99u8, 0, 1, 0, 0, 0], NdrFormat::new());
        assert!(matches!(result, Err(NdrError::UnsupportedDiscriminant(99))));

        let decoded: Strict = unmarshal(vec![7u8, 0, 0, 0, 1, 0, 0, 0], NdrFormat::new()).unwrap();
        assert_eq!(decoded, Strict(1));
    }
}
