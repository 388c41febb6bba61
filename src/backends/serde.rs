use std::borrow::{Borrow, Cow};

use crate::errors::{DecResult, DecodeError};

pub trait Encode: ToOwned {
    fn encode(&self) -> Cow<[u8]>;
    fn encode_owned(input: <Self as ToOwned>::Owned) -> Vec<u8> {
        Self::encode(input.borrow()).into_owned()
    }

    fn encode_cow(input: Cow<Self>) -> Cow<[u8]> {
        match input {
            Cow::Borrowed(x) => Self::encode(x),
            Cow::Owned(x) => Cow::Owned(Self::encode_owned(x)),
        }
    }
}

pub trait Decode: ToOwned {
    fn decode(input: &[u8]) -> DecResult<Cow<Self>>;
    fn decode_owned(input: Vec<u8>) -> DecResult<Self::Owned> {
        Ok(Self::decode(input.as_slice())?.into_owned())
    }
}

impl Encode for [u8] {
    fn encode(&self) -> Cow<[u8]> {
        Cow::Borrowed(self)
    }
}

impl Decode for [u8] {
    fn decode(input: &[u8]) -> DecResult<Cow<Self>> {
        Ok(Cow::Borrowed(input))
    }

    fn decode_owned(input: Vec<u8>) -> DecResult<Self::Owned> {
        Ok(input)
    }
}

// Big-endian so that byte order equals numeric order under table iteration.
impl Encode for u64 {
    fn encode(&self) -> Cow<[u8]> {
        Cow::Owned(self.to_be_bytes().to_vec())
    }
}

impl Decode for u64 {
    fn decode(input: &[u8]) -> DecResult<Cow<Self>> {
        const BYTES: usize = std::mem::size_of::<u64>();
        if input.len() != BYTES {
            return Err(DecodeError::IncorrectLength);
        }

        Ok(Cow::Owned(u64::from_be_bytes(input.try_into().unwrap())))
    }
}

impl Encode for () {
    fn encode(&self) -> Cow<[u8]> {
        Cow::Borrowed(&[])
    }
}

impl Decode for () {
    fn decode(input: &[u8]) -> DecResult<Cow<Self>> {
        if !input.is_empty() {
            return Err(DecodeError::IncorrectLength);
        }
        Ok(Cow::Owned(()))
    }
}

// Sorted id lists back the set-valued association tables.
impl Encode for Vec<u64> {
    fn encode(&self) -> Cow<[u8]> {
        let mut out = Vec::with_capacity(self.len() * 8);
        for id in self {
            out.extend_from_slice(&id.to_be_bytes());
        }
        Cow::Owned(out)
    }
}

impl Decode for Vec<u64> {
    fn decode(input: &[u8]) -> DecResult<Cow<Self>> {
        if input.len() % 8 != 0 {
            return Err(DecodeError::IncorrectLength);
        }
        let ids = input
            .chunks_exact(8)
            .map(|chunk| u64::from_be_bytes(chunk.try_into().unwrap()))
            .collect();
        Ok(Cow::Owned(ids))
    }
}

/// Implements [`Encode`]/[`Decode`] for serde row types through bincode.
#[macro_export]
macro_rules! bincode_codec {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::backends::serde::Encode for $t {
                fn encode(&self) -> std::borrow::Cow<[u8]> {
                    std::borrow::Cow::Owned(
                        bincode::serialize(self).expect("row types always serialize"),
                    )
                }
            }

            impl $crate::backends::serde::Decode for $t {
                fn decode(input: &[u8]) -> $crate::errors::DecResult<std::borrow::Cow<Self>> {
                    match bincode::deserialize(input) {
                        Ok(row) => Ok(std::borrow::Cow::Owned(row)),
                        Err(e) => Err($crate::errors::DecodeError::Corrupted(e.to_string())),
                    }
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_roundtrip_preserves_order() {
        let small = u64::encode(&3).into_owned();
        let big = u64::encode(&(1 << 40)).into_owned();
        assert!(small < big);
        assert_eq!(u64::decode(&small).unwrap().into_owned(), 3);
        assert_eq!(u64::decode(&[0; 4]), Err(DecodeError::IncorrectLength));
    }

    #[test]
    fn id_list_roundtrip() {
        let ids = vec![1u64, 5, 9000];
        let bytes = Vec::<u64>::encode(&ids).into_owned();
        assert_eq!(Vec::<u64>::decode(&bytes).unwrap().into_owned(), ids);
        assert!(Vec::<u64>::decode(&bytes[..5]).is_err());
    }
}
