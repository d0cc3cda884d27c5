//! Unsigned-magnitude arithmetic over little-endian `u32` word buffers.
//!
//! All functions treat a slice of words as an unsigned integer with the word
//! at index 0 least significant. High zero words are insignificant; inputs
//! are re-trimmed on entry and every produced buffer is trimmed before it is
//! returned, so the empty slice is the canonical zero. Sign handling lives in
//! [`crate::bigint::BigInt`], never here.
//!
//! All widening intermediates are 64-bit so carry and borrow chains cannot
//! overflow. Multiplication and division are schoolbook/Knuth Algorithm D,
//! which is quadratic in word count and entirely adequate for the
//! metadata-signature and RSA-modulus sizes this crate deals with.

use std::cmp::Ordering;
use std::fmt::Write;

use crate::{Error::ZeroDivisor, Result};

/// Base used when peeling decimal chunks off a magnitude, 10^9 being the
/// largest power of ten that fits a `u32` word.
const DECIMAL_CHUNK_BASE: u32 = 1_000_000_000;

/// Number of significant words in `words`, ignoring high zero words.
#[must_use]
pub fn trimmed_len(words: &[u32]) -> usize {
    let mut len = words.len();
    while len > 0 && words[len - 1] == 0 {
        len -= 1;
    }
    len
}

/// Drop high zero words so the buffer is canonical (empty for zero).
pub fn trim(words: &mut Vec<u32>) {
    words.truncate(trimmed_len(words));
}

/// Whether `words` represents zero.
#[must_use]
pub fn is_zero(words: &[u32]) -> bool {
    trimmed_len(words) == 0
}

/// Compare two magnitudes numerically.
///
/// Longer (trimmed) buffers are larger; equal lengths compare word by word
/// from the most significant end down.
#[must_use]
pub fn compare(x: &[u32], y: &[u32]) -> Ordering {
    let x_len = trimmed_len(x);
    let y_len = trimmed_len(y);
    if x_len != y_len {
        return x_len.cmp(&y_len);
    }

    for index in (0..x_len).rev() {
        if x[index] != y[index] {
            return x[index].cmp(&y[index]);
        }
    }

    Ordering::Equal
}

/// Add two magnitudes into a fresh buffer.
///
/// The result is sized to the longer operand; the extra carry word is
/// appended only when the final carry actually overflows, so most additions
/// do not pay for a word they never use.
#[must_use]
pub fn add(x: &[u32], y: &[u32]) -> Vec<u32> {
    let x = &x[..trimmed_len(x)];
    let y = &y[..trimmed_len(y)];
    let (longer, shorter) = if x.len() >= y.len() { (x, y) } else { (y, x) };

    let mut result = Vec::with_capacity(longer.len() + 1);
    let mut carry = 0_u64;

    for (index, &word) in longer.iter().enumerate() {
        let addend = shorter.get(index).copied().unwrap_or(0);
        let sum = u64::from(word) + u64::from(addend) + carry;
        #[allow(clippy::cast_possible_truncation)]
        result.push(sum as u32);
        carry = sum >> 32;
    }

    if carry != 0 {
        result.push(1);
    }

    result
}

/// Subtract `y` from `x` in place. `x` must be numerically >= `y`.
///
/// Borrow that survives past `y`'s words is propagated by decrementing
/// higher words of `x` until one does not underflow.
pub fn sub_assign(x: &mut Vec<u32>, y: &[u32]) {
    let y = &y[..trimmed_len(y)];
    debug_assert!(compare(x, y) != Ordering::Less);

    let mut borrow = 0_u64;
    for index in 0..x.len() {
        let subtrahend = u64::from(y.get(index).copied().unwrap_or(0)) + borrow;
        let word = u64::from(x[index]);

        if word >= subtrahend {
            #[allow(clippy::cast_possible_truncation)]
            {
                x[index] = (word - subtrahend) as u32;
            }
            borrow = 0;
            // Past y there is nothing left to subtract once the borrow dies.
            if index >= y.len() {
                break;
            }
        } else {
            #[allow(clippy::cast_possible_truncation)]
            {
                x[index] = (word + (1_u64 << 32) - subtrahend) as u32;
            }
            borrow = 1;
        }
    }

    trim(x);
}

/// Multiply two magnitudes into a fresh buffer.
///
/// Dispatches over three tiers: either operand zero, either operand a single
/// word (including the trivial 1), and the general schoolbook double loop.
#[must_use]
pub fn mul(x: &[u32], y: &[u32]) -> Vec<u32> {
    let x = &x[..trimmed_len(x)];
    let y = &y[..trimmed_len(y)];

    if x.is_empty() || y.is_empty() {
        return Vec::new();
    }

    if x.len() == 1 {
        return mul_word(y, x[0]);
    }
    if y.len() == 1 {
        return mul_word(x, y[0]);
    }

    let mut result = vec![0_u32; x.len() + y.len()];
    for (i, &xi) in x.iter().enumerate() {
        let factor = u64::from(xi);
        let mut carry = 0_u64;

        for (j, &yj) in y.iter().enumerate() {
            let acc = u64::from(result[i + j]) + factor * u64::from(yj) + carry;
            #[allow(clippy::cast_possible_truncation)]
            {
                result[i + j] = acc as u32;
            }
            carry = acc >> 32;
        }

        #[allow(clippy::cast_possible_truncation)]
        {
            result[i + y.len()] = carry as u32;
        }
    }

    trim(&mut result);
    result
}

/// Multiply a magnitude by a single word.
#[must_use]
pub fn mul_word(x: &[u32], y: u32) -> Vec<u32> {
    let x = &x[..trimmed_len(x)];
    if x.is_empty() || y == 0 {
        return Vec::new();
    }
    if y == 1 {
        return x.to_vec();
    }

    let factor = u64::from(y);
    let mut result = Vec::with_capacity(x.len() + 1);
    let mut carry = 0_u64;

    for &word in x {
        let product = u64::from(word) * factor + carry;
        #[allow(clippy::cast_possible_truncation)]
        result.push(product as u32);
        carry = product >> 32;
    }

    if carry != 0 {
        #[allow(clippy::cast_possible_truncation)]
        result.push(carry as u32);
    }

    result
}

/// Divide `dividend` by `divisor`, returning `(quotient, remainder)`.
///
/// Single-word divisors take the straightforward long-division path; larger
/// divisors go through Knuth Algorithm D with normalization, two-word
/// quotient-digit estimation and the rare add-back correction.
///
/// # Errors
/// Returns [`crate::Error::ZeroDivisor`] when `divisor` is zero.
pub fn div_rem(dividend: &[u32], divisor: &[u32]) -> Result<(Vec<u32>, Vec<u32>)> {
    let dividend = &dividend[..trimmed_len(dividend)];
    let divisor = &divisor[..trimmed_len(divisor)];

    if divisor.is_empty() {
        return Err(ZeroDivisor);
    }

    // Covers the shorter-dividend case: quotient 0, remainder untouched.
    if compare(dividend, divisor) == Ordering::Less {
        return Ok((Vec::new(), dividend.to_vec()));
    }

    if divisor.len() == 1 {
        let (quotient, remainder) = div_rem_word(dividend, divisor[0]);
        let remainder = if remainder == 0 { Vec::new() } else { vec![remainder] };
        return Ok((quotient, remainder));
    }

    Ok(div_rem_knuth(dividend, divisor))
}

/// Remainder of `x` modulo `modulus`.
///
/// # Errors
/// Returns [`crate::Error::ZeroDivisor`] when `modulus` is zero.
pub fn rem(x: &[u32], modulus: &[u32]) -> Result<Vec<u32>> {
    Ok(div_rem(x, modulus)?.1)
}

/// Long division by a single word, most significant word first.
///
/// The divisor must be non-zero; the dividend must be trimmed.
fn div_rem_word(dividend: &[u32], divisor: u32) -> (Vec<u32>, u32) {
    let divisor = u64::from(divisor);
    let mut quotient = vec![0_u32; dividend.len()];
    let mut remainder = 0_u64;

    for index in (0..dividend.len()).rev() {
        let acc = (remainder << 32) | u64::from(dividend[index]);
        #[allow(clippy::cast_possible_truncation)]
        {
            quotient[index] = (acc / divisor) as u32;
        }
        remainder = acc % divisor;
    }

    trim(&mut quotient);
    #[allow(clippy::cast_possible_truncation)]
    (quotient, remainder as u32)
}

/// Knuth Algorithm D for divisors of two or more words.
///
/// Preconditions: both operands trimmed, `divisor.len() >= 2`, and
/// `dividend >= divisor` numerically.
fn div_rem_knuth(dividend: &[u32], divisor: &[u32]) -> (Vec<u32>, Vec<u32>) {
    let divisor_len = divisor.len();
    let quotient_len = dividend.len() - divisor_len + 1;

    // Normalize so the divisor's top word has its high bit set; the same
    // shift is undone on the remainder at the end.
    let shift = divisor[divisor_len - 1].leading_zeros();
    let normalized_divisor = shl(divisor, shift, false);
    let mut window = shl(dividend, shift, true);

    let divisor_top = u64::from(normalized_divisor[divisor_len - 1]);
    let divisor_next = u64::from(normalized_divisor[divisor_len - 2]);

    let mut quotient = vec![0_u32; quotient_len];

    for digit_index in (0..quotient_len).rev() {
        // Estimate the quotient digit from the top two divisor words against
        // the top three words of the current window, then walk the estimate
        // down (at most twice) while the trial product overshoots.
        let numerator = (u64::from(window[digit_index + divisor_len]) << 32)
            | u64::from(window[digit_index + divisor_len - 1]);
        let mut digit = numerator / divisor_top;
        let mut rest = numerator % divisor_top;

        while digit > u64::from(u32::MAX)
            || digit * divisor_next
                > (rest << 32) | u64::from(window[digit_index + divisor_len - 2])
        {
            digit -= 1;
            rest += divisor_top;
            if rest > u64::from(u32::MAX) {
                break;
            }
        }

        // Multiply-and-subtract the scaled divisor from the window.
        let mut mul_carry = 0_u64;
        let mut borrow = 0_i64;
        for (offset, &divisor_word) in normalized_divisor.iter().enumerate() {
            let product = digit * u64::from(divisor_word) + mul_carry;
            mul_carry = product >> 32;

            #[allow(clippy::cast_possible_truncation)]
            let diff =
                i64::from(window[digit_index + offset]) - i64::from(product as u32) + borrow;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                window[digit_index + offset] = diff as u32;
            }
            borrow = diff >> 32;
        }

        #[allow(clippy::cast_possible_wrap)]
        let diff = i64::from(window[digit_index + divisor_len]) - (mul_carry as i64) + borrow;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            window[digit_index + divisor_len] = diff as u32;
        }

        // A surviving borrow means the estimate was one too high: add the
        // divisor back once and decrement the digit.
        if diff < 0 {
            digit -= 1;

            let mut carry = 0_u64;
            for (offset, &divisor_word) in normalized_divisor.iter().enumerate() {
                let sum = u64::from(window[digit_index + offset])
                    + u64::from(divisor_word)
                    + carry;
                #[allow(clippy::cast_possible_truncation)]
                {
                    window[digit_index + offset] = sum as u32;
                }
                carry = sum >> 32;
            }

            // The wrap here cancels the earlier borrow.
            #[allow(clippy::cast_possible_truncation)]
            {
                window[digit_index + divisor_len] =
                    (u64::from(window[digit_index + divisor_len]) + carry) as u32;
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        {
            quotient[digit_index] = digit as u32;
        }
    }

    window.truncate(divisor_len);
    let mut remainder = shr(&window, shift);

    trim(&mut quotient);
    trim(&mut remainder);
    (quotient, remainder)
}

/// Shift a magnitude left by `shift` bits (0..32), optionally with a spare
/// high word for overflow into the next position.
fn shl(words: &[u32], shift: u32, spare_word: bool) -> Vec<u32> {
    let mut result = Vec::with_capacity(words.len() + 1);

    if shift == 0 {
        result.extend_from_slice(words);
        if spare_word {
            result.push(0);
        }
        return result;
    }

    let mut carry = 0_u32;
    for &word in words {
        result.push((word << shift) | carry);
        carry = word >> (32 - shift);
    }

    if spare_word || carry != 0 {
        result.push(carry);
    }

    result
}

/// Shift a magnitude right by `shift` bits (0..32).
fn shr(words: &[u32], shift: u32) -> Vec<u32> {
    if shift == 0 {
        return words.to_vec();
    }

    let mut result = vec![0_u32; words.len()];
    for index in 0..words.len() {
        let high = words.get(index + 1).copied().unwrap_or(0);
        result[index] = (words[index] >> shift) | (high << (32 - shift));
    }

    result
}

/// Modular exponentiation: `base ^ exponent mod modulus`.
///
/// Square-and-multiply over the exponent 32 bits at a time, least
/// significant word first. Every non-final exponent word runs all 32 steps
/// so its high zero bits still advance the squaring chain; the final word
/// may stop once no set bits remain, since nothing more significant follows.
/// The squaring chain alternates between two buffers with an active-buffer
/// index flip, so no per-step copies are made.
///
/// # Errors
/// Returns [`crate::Error::ZeroDivisor`] when `modulus` is zero.
pub fn mod_pow(base: &[u32], exponent: &[u32], modulus: &[u32]) -> Result<Vec<u32>> {
    if is_zero(modulus) {
        return Err(ZeroDivisor);
    }

    let exponent = &exponent[..trimmed_len(exponent)];

    // 1 mod modulus, which also covers the empty exponent.
    let mut result = rem(&[1], modulus)?;

    let mut squares = [rem(base, modulus)?, Vec::new()];
    let mut active = 0_usize;

    for (word_index, &word) in exponent.iter().enumerate() {
        let final_word = word_index + 1 == exponent.len();
        let mut chunk = word;

        for _ in 0..32 {
            if final_word && chunk == 0 {
                break;
            }

            if (chunk & 1) != 0 {
                result = rem(&mul(&result, &squares[active]), modulus)?;
            }

            squares[1 - active] = rem(&mul(&squares[active], &squares[active]), modulus)?;
            active = 1 - active;
            chunk >>= 1;
        }
    }

    Ok(result)
}

/// Render a magnitude in base 10.
///
/// Peels base-10^9 chunks off the value by repeated single-word division,
/// then formats them most significant first, zero-padding every chunk except
/// the leading one. Zero renders as `"0"`.
#[must_use]
pub fn to_decimal(words: &[u32]) -> String {
    let mut current = words[..trimmed_len(words)].to_vec();
    if current.is_empty() {
        return "0".to_string();
    }

    let mut chunks = Vec::new();
    while !current.is_empty() {
        let (quotient, chunk) = div_rem_word(&current, DECIMAL_CHUNK_BASE);
        chunks.push(chunk);
        current = quotient;
    }

    let mut rendered = String::with_capacity(chunks.len() * 9);
    for (position, chunk) in chunks.iter().rev().enumerate() {
        if position == 0 {
            let _ = write!(rendered, "{chunk}");
        } else {
            let _ = write!(rendered, "{chunk:09}");
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_and_zero() {
        let mut words = vec![1, 2, 0, 0];
        trim(&mut words);
        assert_eq!(words, vec![1, 2]);

        assert!(is_zero(&[]));
        assert!(is_zero(&[0, 0, 0]));
        assert!(!is_zero(&[0, 1]));
    }

    #[test]
    fn compare_magnitudes() {
        assert_eq!(compare(&[1, 2], &[1, 2]), Ordering::Equal);
        assert_eq!(compare(&[1, 2], &[1, 2, 0]), Ordering::Equal);
        assert_eq!(compare(&[0xFFFF_FFFF], &[0, 1]), Ordering::Less);
        assert_eq!(compare(&[5, 2], &[6, 1]), Ordering::Greater);
    }

    #[test]
    fn add_carry_chain() {
        // 0xFFFFFFFF_FFFFFFFF + 1 carries through both words.
        let sum = add(&[0xFFFF_FFFF, 0xFFFF_FFFF], &[1]);
        assert_eq!(sum, vec![0, 0, 1]);

        // No carry: no extra word allocated.
        let sum = add(&[1, 1], &[2, 2]);
        assert_eq!(sum, vec![3, 3]);
    }

    #[test]
    fn sub_borrow_chain() {
        // 0x1_00000000_00000000 - 1
        let mut x = vec![0, 0, 1];
        sub_assign(&mut x, &[1]);
        assert_eq!(x, vec![0xFFFF_FFFF, 0xFFFF_FFFF]);

        let mut x = vec![5, 5];
        sub_assign(&mut x, &[5, 5]);
        assert!(x.is_empty());
    }

    #[test]
    fn mul_fast_paths() {
        assert!(mul(&[1, 2, 3], &[0]).is_empty());
        assert!(mul(&[], &[1, 2, 3]).is_empty());
        assert_eq!(mul(&[1, 2, 3], &[1]), vec![1, 2, 3]);
        assert_eq!(mul(&[1], &[1, 2, 3]), vec![1, 2, 3]);

        // Single-word path: 0xFFFFFFFF * 2 = 0x1_FFFFFFFE
        assert_eq!(mul(&[0xFFFF_FFFF], &[2]), vec![0xFFFF_FFFE, 1]);
    }

    #[test]
    fn mul_general() {
        // (2^32 + 1) * (2^32 + 1) = 2^64 + 2^33 + 1
        assert_eq!(mul(&[1, 1], &[1, 1]), vec![1, 2, 1]);

        // 0xFFFFFFFF_FFFFFFFF^2 = 0xFFFFFFFF_FFFFFFFE_00000000_00000001
        let square = mul(&[0xFFFF_FFFF, 0xFFFF_FFFF], &[0xFFFF_FFFF, 0xFFFF_FFFF]);
        assert_eq!(square, vec![1, 0, 0xFFFF_FFFE, 0xFFFF_FFFF]);
    }

    #[test]
    fn div_by_zero() {
        assert!(matches!(div_rem(&[1, 2], &[]), Err(ZeroDivisor)));
        assert!(matches!(div_rem(&[1, 2], &[0, 0]), Err(ZeroDivisor)));
    }

    #[test]
    fn div_shorter_dividend() {
        let (quotient, remainder) = div_rem(&[7], &[1, 1]).unwrap();
        assert!(quotient.is_empty());
        assert_eq!(remainder, vec![7]);
    }

    #[test]
    fn div_equal_operands() {
        let (quotient, remainder) = div_rem(&[3, 4, 5], &[3, 4, 5]).unwrap();
        assert_eq!(quotient, vec![1]);
        assert!(remainder.is_empty());
    }

    #[test]
    fn div_single_word() {
        // 0x1_00000000 / 3 = 0x55555555 rem 1
        let (quotient, remainder) = div_rem(&[0, 1], &[3]).unwrap();
        assert_eq!(quotient, vec![0x5555_5555]);
        assert_eq!(remainder, vec![1]);
    }

    #[test]
    fn div_exact_multiple() {
        // dividend = divisor * k must give quotient k, remainder 0,
        // including when the leading windows compare exactly equal.
        let divisor = vec![0x89AB_CDEF, 0x0123_4567];
        let k = vec![0x0000_FFFF, 0x0000_0003];
        let dividend = mul(&divisor, &k);

        let (quotient, remainder) = div_rem(&dividend, &divisor).unwrap();
        assert_eq!(quotient, k);
        assert!(remainder.is_empty());
    }

    #[test]
    fn div_reconstruction() {
        let dividend = vec![0xDEAD_BEEF, 0x1234_5678, 0x9ABC_DEF0, 0x0FED_CBA9];
        let divisor = vec![0x8765_4321, 0x0000_FFFF];

        let (quotient, remainder) = div_rem(&dividend, &divisor).unwrap();

        assert_eq!(compare(&remainder, &divisor), Ordering::Less);
        let rebuilt = add(&mul(&quotient, &divisor), &remainder);
        assert_eq!(compare(&rebuilt, &dividend), Ordering::Equal);
    }

    #[test]
    fn div_single_word_reconstruction() {
        let dividend = vec![0x1111_1111, 0x2222_2222, 0x3333_3333];
        let divisor_value = 0xABCD_1234_u32;

        let (q1, r1) = div_rem(&dividend, &[divisor_value]).unwrap();
        let rebuilt = add(&mul(&q1, &[divisor_value]), &r1);
        assert_eq!(compare(&rebuilt, &dividend), Ordering::Equal);
        assert_eq!(compare(&r1, &[divisor_value]), Ordering::Less);
    }

    #[test]
    fn mod_pow_small() {
        // 7^5 mod 13 = 11
        assert_eq!(mod_pow(&[7], &[5], &[13]).unwrap(), vec![11]);
        // 2^10 mod 1000 = 24
        assert_eq!(mod_pow(&[2], &[10], &[1000]).unwrap(), vec![24]);
    }

    #[test]
    fn mod_pow_identities() {
        let a = vec![0x1234_5678, 0x9ABC_DEF0];
        let m = vec![0x0000_FFFF, 0x0000_0001];

        // a^1 mod m == a mod m
        assert_eq!(mod_pow(&a, &[1], &m).unwrap(), rem(&a, &m).unwrap());
        // a^0 mod m == 1 for m > 1
        assert_eq!(mod_pow(&a, &[], &m).unwrap(), vec![1]);

        // a^(e1+e2) == a^e1 * a^e2 (mod m)
        let lhs = mod_pow(&a, &[7], &m).unwrap();
        let product = mul(&mod_pow(&a, &[3], &m).unwrap(), &mod_pow(&a, &[4], &m).unwrap());
        assert_eq!(lhs, rem(&product, &m).unwrap());
    }

    #[test]
    fn mod_pow_multi_word_exponent() {
        // 2^(2^32) mod 13: the order of 2 mod 13 is 12, and
        // 2^32 mod 12 = 4, so the result is 2^4 mod 13 = 3.
        assert_eq!(mod_pow(&[2], &[0, 1], &[13]).unwrap(), vec![3]);
    }

    #[test]
    fn mod_pow_zero_modulus() {
        assert!(matches!(mod_pow(&[2], &[3], &[]), Err(ZeroDivisor)));
    }

    #[test]
    fn decimal_rendering() {
        assert_eq!(to_decimal(&[]), "0");
        assert_eq!(to_decimal(&[0]), "0");
        assert_eq!(to_decimal(&[255]), "255");
        // 2^32
        assert_eq!(to_decimal(&[0, 1]), "4294967296");
        // Chunk padding: 10^9 splits into chunks [1, 000000000].
        assert_eq!(to_decimal(&[1_000_000_000]), "1000000000");
        // 2^64 - 1
        assert_eq!(to_decimal(&[0xFFFF_FFFF, 0xFFFF_FFFF]), "18446744073709551615");
    }
}
