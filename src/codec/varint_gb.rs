//! Group varint codec for `u32` sequences
//!
//! Based on group varint (Dean, WSDM 2009 keynote) as used by Lemire et al.
//! ("Decoding billions of integers per second through vectorization", SPE 2015).
//!
//! # Format
//!
//! ```text
//! values:   [255, 256, 16777215, 16777216]
//!
//! selector: 0b11_10_01_00 = 0xE4   // 2-bit length code per value, value 0 in the low bits
//! payload:  FF | 00 01 | FF FF FF | 00 00 00 01
//! ```
//!
//! Code `c` means the value occupies `c + 1` little-endian bytes. A trailing run of
//! 1-3 values gets its own selector covering only the values present.

/// Group varint codec, optionally delta coded
///
/// Delta mode is fixed per instance: a stream must be decoded by a codec with the
/// same mode that encoded it.
///
/// # Example
///
/// ```
/// use trueno_graph_store::VarIntGroupCodec;
///
/// let codec = VarIntGroupCodec::new();
/// let bytes = codec.encode_to_vec(&[1, 300, 70_000]);
/// let (values, consumed) = codec.decode_to_vec(&bytes, 3);
///
/// assert_eq!(values, vec![1, 300, 70_000]);
/// assert_eq!(consumed, bytes.len());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarIntGroupCodec {
    delta: bool,
}

impl VarIntGroupCodec {
    /// Plain codec (no delta coding)
    #[must_use]
    pub const fn new() -> Self {
        Self { delta: false }
    }

    /// Delta-coding codec
    #[must_use]
    pub const fn delta() -> Self {
        Self { delta: true }
    }

    /// Codec with an explicit delta mode
    #[must_use]
    pub const fn with_delta(delta: bool) -> Self {
        Self { delta }
    }

    /// Whether values are delta coded
    #[must_use]
    pub const fn is_delta(&self) -> bool {
        self.delta
    }

    /// Worst-case encoded size of `count` values
    ///
    /// Four bytes per value plus one selector byte per (possibly partial) group.
    #[must_use]
    pub const fn max_compressed_len(count: usize) -> usize {
        count * 4 + count.div_ceil(4)
    }

    /// Encode `values` into `out`, returning the number of bytes written
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than the encoding. A buffer of
    /// [`max_compressed_len`](Self::max_compressed_len) bytes is always enough.
    pub fn encode(&self, values: &[u32], out: &mut [u8]) -> usize {
        let mut prev = 0_u32;
        let mut pos = 0;

        for group in values.chunks(4) {
            let selector_pos = pos;
            pos += 1;
            let mut selector = 0_u8;

            for (j, &raw) in group.iter().enumerate() {
                let value = if self.delta { raw.wrapping_sub(prev) } else { raw };
                prev = raw;

                let code = length_code(value);
                selector |= code << (2 * j);

                let len = usize::from(code) + 1;
                out[pos..pos + len].copy_from_slice(&value.to_le_bytes()[..len]);
                pos += len;
            }

            out[selector_pos] = selector;
        }

        pos
    }

    /// Encode `values` into a freshly allocated, exactly sized buffer
    #[must_use]
    pub fn encode_to_vec(&self, values: &[u32]) -> Vec<u8> {
        let mut out = vec![0_u8; Self::max_compressed_len(values.len())];
        let written = self.encode(values, &mut out);
        out.truncate(written);
        out
    }

    /// Decode `count` values from `input` into `out`, returning the bytes consumed
    ///
    /// Full groups of four are decoded while at least four values remain; the last
    /// 1-3 values are read from one trailing selector.
    ///
    /// # Panics
    ///
    /// Panics if `out` holds fewer than `count` slots or if `input` ends before
    /// `count` values have been read.
    pub fn decode(&self, input: &[u8], count: usize, out: &mut [u32]) -> usize {
        let out = &mut out[..count];
        let mut acc = 0_u32;
        let mut pos = 0;

        let mut groups = out.chunks_exact_mut(4);
        for group in &mut groups {
            pos += self.decode_group(&input[pos..], &mut acc, group);
        }

        let tail = groups.into_remainder();
        if !tail.is_empty() {
            let selector = input[pos];
            pos += 1;
            for (j, slot) in tail.iter_mut().enumerate() {
                let len = field_len(selector, j);
                *slot = self.accumulate(&mut acc, read_le(&input[pos..pos + len]));
                pos += len;
            }
        }

        pos
    }

    /// Decode `count` values into a new `Vec`, returning it with the bytes consumed
    ///
    /// # Panics
    ///
    /// Panics if `input` ends before `count` values have been read.
    #[must_use]
    pub fn decode_to_vec(&self, input: &[u8], count: usize) -> (Vec<u32>, usize) {
        let mut values = vec![0_u32; count];
        let consumed = self.decode(input, count, &mut values);
        (values, consumed)
    }

    /// Count the values held by a complete encoded stream
    ///
    /// Walks the selector bytes without materialising any value, so it works for
    /// both plain and delta streams. Returns `None` if a declared field runs past the
    /// end of `input` or a selector is not followed by any value.
    #[must_use]
    pub fn count_values(input: &[u8]) -> Option<usize> {
        let mut pos = 0;
        let mut count = 0;

        while pos < input.len() {
            let selector = input[pos];
            pos += 1;

            if pos == input.len() {
                return None;
            }

            for j in 0..4 {
                if pos == input.len() {
                    break;
                }
                pos += field_len(selector, j);
                if pos > input.len() {
                    return None;
                }
                count += 1;
            }
        }

        Some(count)
    }

    fn decode_group(&self, input: &[u8], acc: &mut u32, out: &mut [u32]) -> usize {
        let selector = input[0];

        // Four single-byte values
        if selector == 0 {
            for (slot, &byte) in out.iter_mut().zip(&input[1..5]) {
                *slot = self.accumulate(acc, u32::from(byte));
            }
            return 5;
        }

        let mut pos = 1;
        for (j, slot) in out.iter_mut().enumerate() {
            let len = field_len(selector, j);
            *slot = self.accumulate(acc, read_le(&input[pos..pos + len]));
            pos += len;
        }
        pos
    }

    #[inline]
    fn accumulate(&self, acc: &mut u32, value: u32) -> u32 {
        if self.delta {
            *acc = acc.wrapping_add(value);
            *acc
        } else {
            value
        }
    }
}

/// Smallest length code able to hold `value`
#[inline]
fn length_code(value: u32) -> u8 {
    match value {
        0..=0xFF => 0,
        0x100..=0xFFFF => 1,
        0x1_0000..=0xFF_FFFF => 2,
        _ => 3,
    }
}

/// Byte length of field `j` in `selector`
#[inline]
fn field_len(selector: u8, j: usize) -> usize {
    usize::from((selector >> (2 * j)) & 3) + 1
}

/// Little-endian assembly of up to four bytes, zero-extended
#[inline]
fn read_le(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .rev()
        .fold(0, |acc, &byte| (acc << 8) | u32::from(byte))
}
