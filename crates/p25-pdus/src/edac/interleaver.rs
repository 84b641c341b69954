//! Bit interleaving for multi-block TSDU bursts.
//!
//! The three stacked coded TSBKs of a triple-length TSDU are not carried in
//! block order: the payload is permuted as one 588-bit block before frame
//! placement, spreading each coded block across the whole burst. The
//! permutation is the linear block interleave `out[a*i mod k] = in[i]`.

use p25_core::p25_common::{TSBK_FEC_LENGTH_BITS, TSBK_MBF_CNT};

/// Permutation length: three coded TSBK blocks.
pub const MBF_INTERLEAVE_BITS: usize = TSBK_FEC_LENGTH_BITS * TSBK_MBF_CNT;
/// Interleave step, coprime with the permutation length.
pub const MBF_INTERLEAVE_STEP: usize = 37;

pub const fn block_interl_func(k: u32, a: u32, i: u32) -> u32 {
    1 + (a.wrapping_mul(i)) % k
}

#[inline]
fn get_bit(data: &[u8], pos: usize) -> u8 {
    (data[pos / 8] >> (7 - pos % 8)) & 1
}

#[inline]
fn set_bit(data: &mut [u8], pos: usize, bit: u8) {
    let mask = 0x80 >> (pos % 8);
    if bit != 0 {
        data[pos / 8] |= mask;
    } else {
        data[pos / 8] &= !mask;
    }
}

/// Interleave `k` packed bits (MSB first) with step `a`. `a` must be
/// coprime with `k` or the permutation is not a bijection.
pub fn block_interleave_bits(k: usize, a: usize, input: &[u8], output: &mut [u8]) {
    assert!(input.len() * 8 >= k && output.len() * 8 >= k);
    for i in 1..=k {
        let j = block_interl_func(k as u32, a as u32, i as u32) as usize;
        set_bit(output, j - 1, get_bit(input, i - 1));
    }
}

/// Inverse of [`block_interleave_bits`].
pub fn block_deinterleave_bits(k: usize, a: usize, input: &[u8], output: &mut [u8]) {
    assert!(input.len() * 8 >= k && output.len() * 8 >= k);
    for i in 1..=k {
        let j = block_interl_func(k as u32, a as u32, i as u32) as usize;
        set_bit(output, i - 1, get_bit(input, j - 1));
    }
}

/// Permute a stacked MBF payload for frame placement.
pub fn interleave_mbf(input: &[u8], output: &mut [u8]) {
    block_interleave_bits(MBF_INTERLEAVE_BITS, MBF_INTERLEAVE_STEP, input, output);
}

/// Recover the stacked MBF payload from a received burst.
pub fn deinterleave_mbf(input: &[u8], output: &mut [u8]) {
    block_deinterleave_bits(MBF_INTERLEAVE_BITS, MBF_INTERLEAVE_STEP, input, output);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_interleave_bits_roundtrip() {
        let k = 64;
        let a = 13;
        let data: Vec<u8> = (0..8).map(|i| i * 31 + 5).collect();
        let mut tmp = vec![0u8; 8];
        let mut out = vec![0u8; 8];

        block_interleave_bits(k, a, &data, &mut tmp);
        block_deinterleave_bits(k, a, &tmp, &mut out);
        assert_eq!(data, out);
    }

    #[test]
    fn test_mbf_roundtrip() {
        let data: Vec<u8> = (0..75).map(|i| (i as u8).wrapping_mul(29).wrapping_add(7)).collect();
        let mut tmp = vec![0u8; 75];
        let mut out = vec![0u8; 75];

        interleave_mbf(&data, &mut tmp);
        deinterleave_mbf(&tmp, &mut out);
        assert_eq!(&data[..73], &out[..73]);
        // last partial byte only carries bits inside the permutation window
        assert_eq!(data[73] & 0xF0, out[73] & 0xF0);
    }

    #[test]
    fn test_mbf_actually_permutes() {
        // a block confined to the head must spread past its own length
        let mut data = vec![0u8; 75];
        for b in data.iter_mut().take(25) {
            *b = 0xFF;
        }
        let mut out = vec![0u8; 75];
        interleave_mbf(&data, &mut out);

        assert_ne!(data, out);
        let moved: u32 = out[25..].iter().map(|b| b.count_ones()).sum();
        assert!(moved > 0, "interleave left the first block in place");
    }

    #[test]
    fn test_step_is_coprime_with_length() {
        // a non-bijective permutation would collide and lose bits
        let mut seen = vec![false; MBF_INTERLEAVE_BITS];
        for i in 1..=MBF_INTERLEAVE_BITS {
            let j = block_interl_func(MBF_INTERLEAVE_BITS as u32, MBF_INTERLEAVE_STEP as u32,
                i as u32) as usize;
            assert!(!seen[j - 1], "position {} assigned twice", j - 1);
            seen[j - 1] = true;
        }
    }
}
