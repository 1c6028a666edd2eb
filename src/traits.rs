//! Serialization of objects with a fixed-size byte representation.

use core::fmt;
use core::ops::Sub;

use generic_array::sequence::Split;
use generic_array::{ArrayLength, GenericArray};
use typenum::{Diff, Unsigned};

/// Errors that can happen during object deserialization.
#[derive(Debug, PartialEq)]
pub enum DeserializationError {
    /// The given bytestring has a different length than the object's representation.
    SizeMismatch,
    /// Failed to construct the object from a bytestring of the correct length.
    ConstructionFailure,
}

impl fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch => write!(f, "Bytestring size mismatch"),
            Self::ConstructionFailure => write!(f, "Failed to construct the object"),
        }
    }
}

/// A type with a fixed-size byte representation.
pub trait RepresentableAsArray: Sized {
    /// Resulting array length.
    type Size: ArrayLength<u8>;

    /// Returns the size (in bytes) of the serialized representation.
    fn serialized_size() -> usize {
        <Self::Size as Unsigned>::to_usize()
    }
}

/// A type which can be serialized into an array of the predefined size.
pub trait SerializableToArray: RepresentableAsArray {
    /// Produces a byte array with the canonical representation of the object.
    fn to_array(&self) -> GenericArray<u8, Self::Size>;
}

/// A type which can be deserialized from an array of the predefined size.
pub trait DeserializableFromArray: RepresentableAsArray {
    /// Attempts to produce the object back from the canonical representation.
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError>;

    /// Attempts to produce the object back from a bytestring,
    /// checking the length first.
    fn from_bytes(data: impl AsRef<[u8]>) -> Result<Self, DeserializationError> {
        let data_slice = data.as_ref();
        if data_slice.len() != Self::serialized_size() {
            return Err(DeserializationError::SizeMismatch);
        }
        Self::from_array(GenericArray::<u8, Self::Size>::from_slice(data_slice))
    }

    /// Deserializes the object from the prefix of `arr` and returns the remaining bytes.
    fn take<U>(
        arr: GenericArray<u8, U>,
    ) -> Result<(Self, GenericArray<u8, Diff<U, Self::Size>>), DeserializationError>
    where
        U: ArrayLength<u8> + Sub<Self::Size>,
        Diff<U, Self::Size>: ArrayLength<u8>,
    {
        let (res_bytes, rest): (GenericArray<u8, Self::Size>, GenericArray<u8, _>) = arr.split();
        Self::from_array(&res_bytes).map(|obj| (obj, rest))
    }

    /// Deserializes the object from the whole of `arr`;
    /// the counterpart of [`take`](`Self::take`) for the last object in the array.
    fn take_last(arr: GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError> {
        Self::from_array(&arr)
    }
}
