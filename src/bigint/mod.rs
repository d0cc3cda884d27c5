//! Arbitrary-precision signed integers backing strong-name and signature
//! computations.
//!
//! [`BigInt`] is a thin sign-and-magnitude wrapper over the word kernel in
//! [`words`]: the magnitude is a trimmed little-endian `u32` word buffer and
//! the sign is -1, 0 or 1, with sign 0 if and only if the magnitude is
//! empty. All arithmetic delegates to the kernel; only sign bookkeeping
//! lives here.

pub mod words;

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

use crate::{Error, Result};

/// Endianness of a magnitude byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

/// A signed arbitrary-precision integer.
///
/// The byte formats carry no sign; callers supply the sign out-of-band when
/// parsing, matching how RSA key material stores magnitudes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BigInt {
    /// -1, 0 or 1; 0 exactly when `words` is empty.
    sign: i8,
    /// Trimmed little-endian magnitude.
    words: Vec<u32>,
}

impl BigInt {
    /// The zero value.
    #[must_use]
    pub fn zero() -> Self {
        BigInt::default()
    }

    /// The value one.
    #[must_use]
    pub fn one() -> Self {
        BigInt { sign: 1, words: vec![1] }
    }

    /// Build from a sign and magnitude, normalizing zero.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidSign`] when `sign` is outside
    /// `{-1, 0, 1}` or a zero sign is paired with a non-zero magnitude.
    pub fn from_sign_magnitude(sign: i8, mut magnitude: Vec<u32>) -> Result<Self> {
        if !(-1..=1).contains(&sign) {
            return Err(Error::InvalidSign(sign));
        }

        words::trim(&mut magnitude);
        if magnitude.is_empty() {
            return Ok(BigInt::zero());
        }
        if sign == 0 {
            return Err(Error::InvalidSign(sign));
        }

        Ok(BigInt { sign, words: magnitude })
    }

    /// Parse a magnitude byte buffer with an out-of-band sign.
    ///
    /// Insignificant zero bytes (leading for big-endian, trailing for
    /// little-endian) are stripped; an all-zero buffer yields zero
    /// regardless of the supplied sign.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidSign`] as for
    /// [`BigInt::from_sign_magnitude`].
    pub fn from_bytes(bytes: &[u8], endian: Endian, sign: i8) -> Result<Self> {
        let mut magnitude = vec![0_u32; bytes.len().div_ceil(4)];

        for (position, &byte) in match endian {
            Endian::Little => bytes.iter().enumerate().collect::<Vec<_>>(),
            Endian::Big => bytes.iter().rev().enumerate().collect::<Vec<_>>(),
        } {
            magnitude[position / 4] |= u32::from(byte) << ((position % 4) * 8);
        }

        BigInt::from_sign_magnitude(sign, magnitude)
    }

    /// Serialize the magnitude. The sign is not encoded; zero serializes to
    /// an empty buffer.
    #[must_use]
    pub fn to_bytes(&self, endian: Endian) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.words.len() * 4);
        for &word in &self.words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }

        while bytes.last() == Some(&0) {
            bytes.pop();
        }

        if endian == Endian::Big {
            bytes.reverse();
        }
        bytes
    }

    /// The sign: -1, 0 or 1.
    #[must_use]
    pub fn sign(&self) -> i8 {
        self.sign
    }

    /// The trimmed little-endian magnitude words.
    #[must_use]
    pub fn magnitude(&self) -> &[u32] {
        &self.words
    }

    /// Whether the value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.sign == 0
    }

    /// Whether the value is strictly negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.sign < 0
    }

    /// Number of significant bits in the magnitude; 0 for zero.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        match self.words.last() {
            Some(&top) => (self.words.len() - 1) * 32 + (32 - top.leading_zeros() as usize),
            None => 0,
        }
    }

    /// Compare magnitudes, ignoring signs.
    #[must_use]
    pub fn magnitude_cmp(&self, other: &BigInt) -> Ordering {
        words::compare(&self.words, &other.words)
    }

    /// Division with remainder, truncating toward zero. The remainder takes
    /// the dividend's sign.
    ///
    /// # Errors
    /// Returns [`crate::Error::ZeroDivisor`] when `divisor` is zero.
    pub fn div_rem(&self, divisor: &BigInt) -> Result<(BigInt, BigInt)> {
        let (quotient, remainder) = words::div_rem(&self.words, &divisor.words)?;

        let quotient_sign = if words::is_zero(&quotient) { 0 } else { self.sign * divisor.sign };
        let remainder_sign = if words::is_zero(&remainder) { 0 } else { self.sign };

        Ok((
            BigInt { sign: quotient_sign, words: quotient },
            BigInt { sign: remainder_sign, words: remainder },
        ))
    }

    /// Fallible division.
    ///
    /// # Errors
    /// Returns [`crate::Error::ZeroDivisor`] when `divisor` is zero.
    pub fn checked_div(&self, divisor: &BigInt) -> Result<BigInt> {
        Ok(self.div_rem(divisor)?.0)
    }

    /// Fallible remainder.
    ///
    /// # Errors
    /// Returns [`crate::Error::ZeroDivisor`] when `divisor` is zero.
    pub fn checked_rem(&self, divisor: &BigInt) -> Result<BigInt> {
        Ok(self.div_rem(divisor)?.1)
    }

    /// Modular exponentiation: `self ^ exponent mod modulus`.
    ///
    /// The base is reduced into range first; a negative base with an odd
    /// exponent yields the non-negative representative `modulus - r`.
    ///
    /// # Errors
    /// Returns [`crate::Error::ZeroDivisor`] for a zero modulus and
    /// [`crate::Error::InvalidSign`] for a negative exponent or modulus.
    pub fn mod_pow(&self, exponent: &BigInt, modulus: &BigInt) -> Result<BigInt> {
        if exponent.sign < 0 {
            return Err(Error::InvalidSign(exponent.sign));
        }
        if modulus.sign < 0 {
            return Err(Error::InvalidSign(modulus.sign));
        }

        let magnitude = words::mod_pow(&self.words, &exponent.words, &modulus.words)?;

        // Exponentiating a negative base by an odd exponent flips the sign;
        // map back into 0..modulus.
        let negative = self.sign < 0 && exponent.words.first().is_some_and(|w| w & 1 == 1);
        if negative && !words::is_zero(&magnitude) {
            let mut folded = modulus.words.clone();
            words::sub_assign(&mut folded, &magnitude);
            return BigInt::from_sign_magnitude(1, folded);
        }

        BigInt::from_sign_magnitude(i8::from(!words::is_zero(&magnitude)), magnitude)
    }

    /// Signed addition over (sign, magnitude) pairs.
    fn add_signed(&self, other: &BigInt) -> BigInt {
        if self.sign == 0 {
            return other.clone();
        }
        if other.sign == 0 {
            return self.clone();
        }

        if self.sign == other.sign {
            return BigInt { sign: self.sign, words: words::add(&self.words, &other.words) };
        }

        // Opposite signs: subtract the smaller magnitude from the larger;
        // the result takes the larger operand's sign.
        match self.magnitude_cmp(other) {
            Ordering::Equal => BigInt::zero(),
            Ordering::Greater => {
                let mut words = self.words.clone();
                words::sub_assign(&mut words, &other.words);
                BigInt { sign: self.sign, words }
            }
            Ordering::Less => {
                let mut words = other.words.clone();
                words::sub_assign(&mut words, &self.words);
                BigInt { sign: other.sign, words }
            }
        }
    }
}

impl From<u32> for BigInt {
    fn from(value: u32) -> Self {
        if value == 0 {
            BigInt::zero()
        } else {
            BigInt { sign: 1, words: vec![value] }
        }
    }
}

impl From<u64> for BigInt {
    fn from(value: u64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let mut words = vec![value as u32, (value >> 32) as u32];
        words::trim(&mut words);
        BigInt { sign: i8::from(value != 0), words }
    }
}

impl From<i64> for BigInt {
    fn from(value: i64) -> Self {
        let mut result = BigInt::from(value.unsigned_abs());
        if value < 0 {
            result.sign = -1;
        }
        result
    }
}

impl From<i32> for BigInt {
    fn from(value: i32) -> Self {
        BigInt::from(i64::from(value))
    }
}

impl Neg for &BigInt {
    type Output = BigInt;

    fn neg(self) -> BigInt {
        BigInt { sign: -self.sign, words: self.words.clone() }
    }
}

impl Add for &BigInt {
    type Output = BigInt;

    fn add(self, other: &BigInt) -> BigInt {
        self.add_signed(other)
    }
}

impl Sub for &BigInt {
    type Output = BigInt;

    fn sub(self, other: &BigInt) -> BigInt {
        self.add_signed(&-other)
    }
}

impl Mul for &BigInt {
    type Output = BigInt;

    fn mul(self, other: &BigInt) -> BigInt {
        let words = words::mul(&self.words, &other.words);
        let sign = if words.is_empty() { 0 } else { self.sign * other.sign };
        BigInt { sign, words }
    }
}

impl Div for &BigInt {
    type Output = BigInt;

    /// # Panics
    /// Panics on a zero divisor, like the primitive integer operators; use
    /// [`BigInt::checked_div`] for a fallible variant.
    fn div(self, other: &BigInt) -> BigInt {
        match self.checked_div(other) {
            Ok(quotient) => quotient,
            Err(_) => panic!("attempt to divide by zero"),
        }
    }
}

impl Rem for &BigInt {
    type Output = BigInt;

    /// # Panics
    /// Panics on a zero divisor, like the primitive integer operators; use
    /// [`BigInt::checked_rem`] for a fallible variant.
    fn rem(self, other: &BigInt) -> BigInt {
        match self.checked_rem(other) {
            Ok(remainder) => remainder,
            Err(_) => panic!("attempt to calculate the remainder with a divisor of zero"),
        }
    }
}

macro_rules! forward_owned_binop {
    ($($trait:ident :: $method:ident),+ $(,)?) => {
        $(
            impl $trait for BigInt {
                type Output = BigInt;

                fn $method(self, other: BigInt) -> BigInt {
                    $trait::$method(&self, &other)
                }
            }
        )+
    };
}

forward_owned_binop!(Add::add, Sub::sub, Mul::mul, Div::div, Rem::rem);

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.sign.cmp(&other.sign) {
            Ordering::Equal => {}
            unequal => return unequal,
        }

        let magnitude = self.magnitude_cmp(other);
        if self.sign < 0 {
            magnitude.reverse()
        } else {
            magnitude
        }
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sign < 0 {
            f.write_str("-")?;
        }
        f.write_str(&words::to_decimal(&self.words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(value: i64) -> BigInt {
        BigInt::from(value)
    }

    #[test]
    fn construction_normalizes_zero() {
        assert_eq!(BigInt::from_sign_magnitude(1, vec![0, 0]).unwrap(), BigInt::zero());
        assert_eq!(BigInt::from_sign_magnitude(-1, vec![]).unwrap(), BigInt::zero());
        assert_eq!(BigInt::from(0_u32), BigInt::zero());
    }

    #[test]
    fn construction_rejects_bad_signs() {
        assert!(matches!(
            BigInt::from_sign_magnitude(2, vec![1]),
            Err(Error::InvalidSign(2))
        ));
        assert!(matches!(
            BigInt::from_sign_magnitude(0, vec![1]),
            Err(Error::InvalidSign(0))
        ));
    }

    #[test]
    fn byte_parsing_strips_zeros() {
        // Big-endian 0x00000102 and little-endian 0x020100-trailing both
        // reduce to the same magnitude.
        let be = BigInt::from_bytes(&[0x00, 0x00, 0x01, 0x02], Endian::Big, 1).unwrap();
        let le = BigInt::from_bytes(&[0x02, 0x01, 0x00, 0x00], Endian::Little, 1).unwrap();
        assert_eq!(be, le);
        assert_eq!(be, big(0x0102));

        let zero = BigInt::from_bytes(&[0, 0, 0], Endian::Big, -1).unwrap();
        assert_eq!(zero, BigInt::zero());
    }

    #[test]
    fn byte_round_trip() {
        for value in [1_i64, 255, 256, 0x1234_5678, 0x0102_0304_0506_0708] {
            for endian in [Endian::Big, Endian::Little] {
                for sign in [1_i8, -1] {
                    let original = if sign < 0 { -&big(value) } else { big(value) };
                    let bytes = original.to_bytes(endian);
                    let parsed = BigInt::from_bytes(&bytes, endian, sign).unwrap();
                    assert_eq!(parsed, original);
                }
            }
        }
    }

    #[test]
    fn signed_addition() {
        assert_eq!(&big(5) + &big(7), big(12));
        assert_eq!(&big(5) + &big(-7), big(-2));
        assert_eq!(&big(-5) + &big(7), big(2));
        assert_eq!(&big(-5) + &big(-7), big(-12));
        assert_eq!(&big(5) + &big(-5), BigInt::zero());
    }

    #[test]
    fn add_sub_identity() {
        let a = BigInt::from(0xDEAD_BEEF_CAFE_F00D_u64);
        let b = BigInt::from(0x1234_5678_9ABC_DEF0_u64);
        assert_eq!(&(&a + &b) - &b, a);
    }

    #[test]
    fn multiplication_signs() {
        assert_eq!(&big(6) * &big(7), big(42));
        assert_eq!(&big(-6) * &big(7), big(-42));
        assert_eq!(&big(-6) * &big(-7), big(42));
        assert_eq!(&big(-6) * &BigInt::zero(), BigInt::zero());
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(&big(7) / &big(2), big(3));
        assert_eq!(&big(-7) / &big(2), big(-3));
        assert_eq!(&big(7) % &big(2), big(1));
        assert_eq!(&big(-7) % &big(2), big(-1));
        assert_eq!(&big(7) % &big(-2), big(1));
    }

    #[test]
    fn mul_div_identity() {
        let a = BigInt::from(0x0123_4567_89AB_CDEF_u64);
        let b = BigInt::from(0xFEDC_BA98_u64);
        let product = &a * &b;
        assert_eq!(&product / &b, a);
        assert_eq!(&product % &b, BigInt::zero());
    }

    #[test]
    fn checked_division_by_zero() {
        assert!(matches!(big(1).checked_div(&BigInt::zero()), Err(Error::ZeroDivisor)));
        assert!(matches!(big(1).checked_rem(&BigInt::zero()), Err(Error::ZeroDivisor)));
    }

    #[test]
    fn mod_pow_wrapper() {
        let result = big(7).mod_pow(&big(5), &big(13)).unwrap();
        assert_eq!(result, big(11));

        // Negative base, odd exponent: folded into 0..modulus.
        let result = big(-7).mod_pow(&big(3), &big(13)).unwrap();
        // (-7)^3 = -343; -343 mod 13 = -343 + 27*13 = 8
        assert_eq!(result, big(8));

        assert!(matches!(
            big(7).mod_pow(&big(-1), &big(13)),
            Err(Error::InvalidSign(-1))
        ));
    }

    #[test]
    fn ordering() {
        let mut values = vec![big(3), big(-100), BigInt::zero(), big(100), big(-3)];
        values.sort();
        assert_eq!(values, vec![big(-100), big(-3), BigInt::zero(), big(3), big(100)]);
    }

    #[test]
    fn display() {
        assert_eq!(BigInt::zero().to_string(), "0");
        assert_eq!(big(-255).to_string(), "-255");
        assert_eq!(BigInt::from(4_294_967_296_u64).to_string(), "4294967296");
    }

    #[test]
    fn bit_length() {
        assert_eq!(BigInt::zero().bit_len(), 0);
        assert_eq!(big(1).bit_len(), 1);
        assert_eq!(big(255).bit_len(), 8);
        assert_eq!(BigInt::from(1_u64 << 40).bit_len(), 41);
    }
}
