//! This module is an adapter to the ECC backend.
//! `elliptic_curve` has a somewhat unstable API,
//! and we isolate all the related logic here.

use core::ops::{Add, Mul, Sub};

use elliptic_curve::ff::PrimeField;
use elliptic_curve::ops::Reduce;
use elliptic_curve::sec1::{CompressedPointSize, EncodedPoint, FromEncodedPoint, ToEncodedPoint};
use elliptic_curve::{FieldBytesSize, NonZeroScalar};
use generic_array::GenericArray;
use k256::{Secp256k1, U256};
use rand_core::OsRng;
use subtle::CtOption;
use zeroize::Zeroize;

use crate::traits::{
    DeserializableFromArray, DeserializationError, RepresentableAsArray, SerializableToArray,
};

pub(crate) type CurveType = Secp256k1;

type BackendScalar = k256::Scalar;
type BackendNonZeroScalar = NonZeroScalar<CurveType>;
type BackendPoint = k256::ProjectivePoint;
type BackendPointAffine = k256::AffinePoint;

pub(crate) type CurveScalarSize = FieldBytesSize<CurveType>;
pub(crate) type CurvePointSize = CompressedPointSize<CurveType>;

// We have to define newtypes for scalar and point here because the compiler
// is not currently smart enough to resolve `BackendScalar` and `BackendPoint`
// as specific types, so we cannot implement local traits for them.
//
// They also have to be public because Rust isn't smart enough to understand that
//     type PointSize = <Point as RepresentableAsArray>::Size;
// isn't leaking the `Point` (probably because type aliases are just inlined).

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveScalar(BackendScalar);

impl CurveScalar {
    pub(crate) fn from_backend_scalar(scalar: &BackendScalar) -> Self {
        Self(*scalar)
    }

    pub(crate) fn one() -> Self {
        Self(BackendScalar::ONE)
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.0.is_zero().into()
    }

    pub(crate) fn invert(&self) -> CtOption<Self> {
        self.0.invert().map(Self)
    }

    /// Generates a random non-zero scalar (in nearly constant-time).
    pub(crate) fn random_nonzero() -> Self {
        Self(*BackendNonZeroScalar::random(&mut OsRng))
    }

    /// Reduces a hash digest into a scalar.
    pub(crate) fn from_digest_bytes(bytes: &GenericArray<u8, CurveScalarSize>) -> Self {
        Self(<BackendScalar as Reduce<U256>>::reduce_bytes(bytes))
    }
}

impl Zeroize for CurveScalar {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}

impl RepresentableAsArray for CurveScalar {
    // Currently it's the only size available.
    // A separate scalar size may appear in later versions of `elliptic_curve`.
    type Size = CurveScalarSize;
}

impl SerializableToArray for CurveScalar {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.0.to_bytes()
    }
}

impl DeserializableFromArray for CurveScalar {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError> {
        // Rejects non-canonical encodings (values greater or equal to the curve order).
        Option::from(BackendScalar::from_repr(*arr))
            .map(Self)
            .ok_or(DeserializationError::ConstructionFailure)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint(BackendPoint);

impl CurvePoint {
    pub(crate) fn generator() -> Self {
        Self(BackendPoint::GENERATOR)
    }

    pub(crate) fn identity() -> Self {
        Self(BackendPoint::IDENTITY)
    }

    pub(crate) fn to_affine_point(&self) -> BackendPointAffine {
        self.0.to_affine()
    }

    pub(crate) fn from_compressed_array(arr: &GenericArray<u8, CurvePointSize>) -> Option<Self> {
        // A compressed SEC1 encoding of this size cannot represent
        // the identity, so no separate check is necessary.
        let ep = EncodedPoint::<CurveType>::from_bytes(arr.as_slice()).ok()?;
        let cp_opt: Option<BackendPointAffine> = BackendPointAffine::from_encoded_point(&ep).into();
        cp_opt.map(|affine| Self(BackendPoint::from(affine)))
    }

    fn to_compressed_array(&self) -> GenericArray<u8, CurvePointSize> {
        *GenericArray::<u8, CurvePointSize>::from_slice(
            self.0.to_affine().to_encoded_point(true).as_bytes(),
        )
    }
}

impl Add<&CurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn add(self, other: &CurveScalar) -> CurveScalar {
        CurveScalar(self.0.add(&(other.0)))
    }
}

impl Add<&CurvePoint> for &CurvePoint {
    type Output = CurvePoint;

    fn add(self, other: &CurvePoint) -> CurvePoint {
        CurvePoint(self.0.add(&(other.0)))
    }
}

impl Sub<&CurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn sub(self, other: &CurveScalar) -> CurveScalar {
        CurveScalar(self.0.sub(&(other.0)))
    }
}

impl Mul<&CurveScalar> for &CurvePoint {
    type Output = CurvePoint;

    fn mul(self, other: &CurveScalar) -> CurvePoint {
        CurvePoint(self.0.mul(&(other.0)))
    }
}

impl Mul<&CurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn mul(self, other: &CurveScalar) -> CurveScalar {
        CurveScalar(self.0.mul(&(other.0)))
    }
}

impl RepresentableAsArray for CurvePoint {
    type Size = CurvePointSize;
}

impl SerializableToArray for CurvePoint {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.to_compressed_array()
    }
}

impl DeserializableFromArray for CurvePoint {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError> {
        Self::from_compressed_array(arr).ok_or(DeserializationError::ConstructionFailure)
    }
}

#[cfg(test)]
mod tests {

    use generic_array::GenericArray;

    use super::{CurvePoint, CurveScalar};
    use crate::traits::{DeserializableFromArray, DeserializationError, SerializableToArray};

    #[test]
    fn test_scalar_serialization() {
        let scalar = CurveScalar::random_nonzero();
        let arr = scalar.to_array();
        let scalar_back = CurveScalar::from_array(&arr).unwrap();
        assert_eq!(scalar, scalar_back);

        // A value greater than the curve order is not a canonical scalar.
        let arr = GenericArray::clone_from_slice(&[0xffu8; 32]);
        assert_eq!(
            CurveScalar::from_array(&arr),
            Err(DeserializationError::ConstructionFailure)
        );
    }

    #[test]
    fn test_point_serialization() {
        let point = &CurvePoint::generator() * &CurveScalar::random_nonzero();
        let arr = point.to_array();
        let point_back = CurvePoint::from_array(&arr).unwrap();
        assert_eq!(point, point_back);

        // An invalid SEC1 tag byte.
        let mut bad_arr = arr;
        bad_arr[0] = 0x05;
        assert_eq!(
            CurvePoint::from_array(&bad_arr),
            Err(DeserializationError::ConstructionFailure)
        );
    }

    #[test]
    fn test_from_bytes_checks_the_size() {
        let scalar = CurveScalar::random_nonzero();
        let arr = scalar.to_array();
        assert_eq!(
            CurveScalar::from_bytes(&arr[0..31]),
            Err(DeserializationError::SizeMismatch)
        );
    }
}
