// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The wire format shared by every channel in the offload engine.
//!
//! Everything that travels is a 64-byte [Word]. A collective is sent as a
//! _burst_: one header word (see [Header]) followed by `count` payload words.
//!
//! Header layout, sixteen little-endian `u32` fields:
//!
//! | field | 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7..16 |
//! |---|---|---|---|---|---|---|---|---|
//! | | collective | op | datatype | count | root | dest | tag | reserved |

use std::fmt;
use std::mem::size_of;

use arcol_engine::types::SimError;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Number of bytes in a [Word].
pub const WORD_BYTES: usize = 64;

const NUM_FIELDS: usize = WORD_BYTES / size_of::<u32>();
const NUM_RESERVED: usize = 9;

/// The collective a burst belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u32)]
pub enum Collective {
    Barrier = 0,
    P2P = 1,
    Bcast = 2,
    Reduce = 3,
    Scatter = 4,
    Gather = 5,
}

/// Reduction operator. Carried on the wire but not used for routing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive)]
#[repr(u32)]
pub enum ReduceOp {
    #[default]
    Sum = 0,
    Max = 1,
    Min = 2,
    Prod = 3,
}

/// Element type of the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u32)]
pub enum Datatype {
    Float = 0,
    Double = 1,
    Int32 = 2,
    UInt32 = 3,
    Int64 = 4,
    UInt64 = 5,
}

impl fmt::Display for Collective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A header word that could not be decoded.
#[derive(Debug, PartialEq, Eq)]
pub enum WireError {
    BadCollective(u32),
    BadOp(u32),
    BadDatatype(u32),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WireError::BadCollective(v) => write!(f, "invalid collective {v} in header"),
            WireError::BadOp(v) => write!(f, "invalid reduce op {v} in header"),
            WireError::BadDatatype(v) => write!(f, "invalid datatype {v} in header"),
        }
    }
}

impl std::error::Error for WireError {}

impl From<WireError> for SimError {
    fn from(e: WireError) -> Self {
        SimError(e.to_string())
    }
}

/// One 64-byte unit of transfer.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Word([u8; WORD_BYTES]);

impl Word {
    #[must_use]
    pub fn zeroed() -> Self {
        Self([0; WORD_BYTES])
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; WORD_BYTES]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; WORD_BYTES] {
        &self.0
    }

    fn u32_at(&self, index: usize) -> u32 {
        let start = index * size_of::<u32>();
        let mut raw = [0; size_of::<u32>()];
        raw.copy_from_slice(&self.0[start..start + size_of::<u32>()]);
        u32::from_le_bytes(raw)
    }

    fn set_u32(&mut self, index: usize, value: u32) {
        let start = index * size_of::<u32>();
        self.0[start..start + size_of::<u32>()].copy_from_slice(&value.to_le_bytes());
    }
}

impl Default for Word {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Word(")?;
        for (i, field) in (0..NUM_FIELDS).map(|i| self.u32_at(i)).enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{field:08x}")?;
        }
        write!(f, ")")
    }
}

/// The first word of every burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub collective: Collective,
    pub op: ReduceOp,
    pub datatype: Datatype,

    /// Number of payload words that follow the header.
    pub count: u32,
    pub root: u32,

    /// The P2P target. While a broadcast is forwarded it holds the last rank
    /// of the arc being travelled.
    pub dest: u32,
    pub tag: u32,
    pub reserved: [u32; NUM_RESERVED],
}

impl Header {
    #[must_use]
    pub fn new(collective: Collective, datatype: Datatype, count: u32, root: u32, dest: u32) -> Self {
        Self {
            collective,
            op: ReduceOp::default(),
            datatype,
            count,
            root,
            dest,
            tag: 0,
            reserved: [0; NUM_RESERVED],
        }
    }

    /// A copy of this header with `dest` replaced.
    #[must_use]
    pub fn with_dest(&self, dest: u32) -> Self {
        Self { dest, ..*self }
    }

    #[must_use]
    pub fn to_word(&self) -> Word {
        let mut word = Word::zeroed();
        word.set_u32(0, self.collective as u32);
        word.set_u32(1, self.op as u32);
        word.set_u32(2, self.datatype as u32);
        word.set_u32(3, self.count);
        word.set_u32(4, self.root);
        word.set_u32(5, self.dest);
        word.set_u32(6, self.tag);
        for (i, value) in self.reserved.iter().enumerate() {
            word.set_u32(7 + i, *value);
        }
        word
    }

    pub fn from_word(word: &Word) -> Result<Self, WireError> {
        let raw = word.u32_at(0);
        let collective = Collective::from_u32(raw).ok_or(WireError::BadCollective(raw))?;
        let raw = word.u32_at(1);
        let op = ReduceOp::from_u32(raw).ok_or(WireError::BadOp(raw))?;
        let raw = word.u32_at(2);
        let datatype = Datatype::from_u32(raw).ok_or(WireError::BadDatatype(raw))?;

        let mut reserved = [0; NUM_RESERVED];
        for (i, value) in reserved.iter_mut().enumerate() {
            *value = word.u32_at(7 + i);
        }
        Ok(Self {
            collective,
            op,
            datatype,
            count: word.u32_at(3),
            root: word.u32_at(4),
            dest: word.u32_at(5),
            tag: word.u32_at(6),
            reserved,
        })
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} x{} root={} dest={}",
            self.collective, self.datatype, self.count, self.root, self.dest
        )
    }
}

/// The element types a payload can carry.
pub trait Element: Copy + Default + PartialEq + fmt::Debug + 'static {
    const DATATYPE: Datatype;
    const SIZE: usize;

    /// Write the little-endian bytes of `self` into `out` (`SIZE` bytes).
    fn write_le(self, out: &mut [u8]);

    /// Read a value from `SIZE` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($t:ty, $datatype:expr) => {
        impl Element for $t {
            const DATATYPE: Datatype = $datatype;
            const SIZE: usize = size_of::<$t>();

            fn write_le(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0; size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_le_bytes(raw)
            }
        }
    };
}

impl_element!(f32, Datatype::Float);
impl_element!(f64, Datatype::Double);
impl_element!(i32, Datatype::Int32);
impl_element!(u32, Datatype::UInt32);
impl_element!(i64, Datatype::Int64);
impl_element!(u64, Datatype::UInt64);

/// How many `T` fit in one [Word].
#[must_use]
pub const fn elements_per_word<T: Element>() -> usize {
    WORD_BYTES / T::SIZE
}

/// Pack up to `elements_per_word::<T>()` values into a word, element 0 first.
/// Missing elements are zero.
#[must_use]
pub fn pack_word<T: Element>(values: &[T]) -> Word {
    let mut word = Word::zeroed();
    for (value, out) in values
        .iter()
        .zip(word.0.chunks_exact_mut(T::SIZE))
    {
        value.write_le(out);
    }
    word
}

/// Unpack a word into `out`, which may be shorter than a full word.
pub fn unpack_word<T: Element>(word: &Word, out: &mut [T]) {
    for (value, bytes) in out.iter_mut().zip(word.0.chunks_exact(T::SIZE)) {
        *value = T::read_le(bytes);
    }
}

/// Pack a slice into as many words as needed. The final word is zero-filled.
#[must_use]
pub fn pack<T: Element>(values: &[T]) -> Vec<Word> {
    values
        .chunks(elements_per_word::<T>())
        .map(pack_word)
        .collect()
}

/// Unpack words into `out` until either runs out.
pub fn unpack<T: Element>(words: &[Word], out: &mut [T]) {
    for (word, chunk) in words.iter().zip(out.chunks_mut(elements_per_word::<T>())) {
        unpack_word(word, chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_per_word_by_type() {
        assert_eq!(elements_per_word::<f32>(), 16);
        assert_eq!(elements_per_word::<i32>(), 16);
        assert_eq!(elements_per_word::<u32>(), 16);
        assert_eq!(elements_per_word::<f64>(), 8);
        assert_eq!(elements_per_word::<i64>(), 8);
        assert_eq!(elements_per_word::<u64>(), 8);
    }

    #[test]
    fn header_layout() {
        let mut header = Header::new(Collective::Bcast, Datatype::Int64, 7, 3, 5);
        header.tag = 9;
        let word = header.to_word();
        let bytes = word.as_bytes();

        assert_eq!(&bytes[0..4], &2_u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0_u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &4_u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &7_u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &3_u32.to_le_bytes());
        assert_eq!(&bytes[20..24], &5_u32.to_le_bytes());
        assert_eq!(&bytes[24..28], &9_u32.to_le_bytes());
        assert!(bytes[28..].iter().all(|b| *b == 0));

        assert_eq!(Header::from_word(&word), Ok(header));
    }

    #[test]
    fn bad_header_fields() {
        let mut word = Header::new(Collective::P2P, Datatype::Float, 1, 0, 1).to_word();
        word.set_u32(0, 6);
        assert_eq!(Header::from_word(&word), Err(WireError::BadCollective(6)));

        let mut word = Header::new(Collective::P2P, Datatype::Float, 1, 0, 1).to_word();
        word.set_u32(1, 4);
        assert_eq!(Header::from_word(&word), Err(WireError::BadOp(4)));

        let mut word = Header::new(Collective::P2P, Datatype::Float, 1, 0, 1).to_word();
        word.set_u32(2, 6);
        assert_eq!(Header::from_word(&word), Err(WireError::BadDatatype(6)));
    }

    #[test]
    fn little_endian_element_order() {
        let word = pack_word(&[0x0403_0201_u32, 0x0807_0605]);
        assert_eq!(&word.as_bytes()[0..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(word.as_bytes()[8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn partial_chunk_zero_filled() {
        let values: Vec<f64> = (0..11).map(|i| f64::from(i) + 0.5).collect();
        let words = pack(&values);
        assert_eq!(words.len(), 2);

        let mut out = [f64::NAN; 8];
        unpack_word(&words[1], &mut out);
        assert_eq!(&out[..3], &[8.5, 9.5, 10.5]);
        assert!(out[3..].iter().all(|v| *v == 0.0));
    }
}
