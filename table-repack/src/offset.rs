//! Objects, links, and the widths of the offsets that link them

use font_types::Uint24;

use crate::error::RepackError;

/// An identifier for an object in the graph.
///
/// This is the index of the object in the input sequence; the object with
/// index `0` is the root, and is always written first.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ObjectId(u32);

impl ObjectId {
    /// The root object.
    pub const ROOT: ObjectId = ObjectId(0);

    pub const fn new(raw: u32) -> Self {
        ObjectId(raw)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub(crate) const fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ObjectId {
    fn from(src: u32) -> ObjectId {
        ObjectId(src)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "obj{}", self.0)
    }
}

/// The width of an offset, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum OffsetLen {
    Offset16 = 2,
    Offset24 = 3,
    Offset32 = 4,
}

impl OffsetLen {
    /// The maximum value for an unsigned offset of this length.
    pub const fn max_value(self) -> u32 {
        match self {
            Self::Offset16 => u16::MAX as u32,
            Self::Offset24 => (1 << 24) - 1,
            Self::Offset32 => u32::MAX,
        }
    }

    /// The range of distances representable by a signed offset of this length.
    pub const fn signed_range(self) -> (i64, i64) {
        let half = 1i64 << (self.width() * 8 - 1);
        (-half, half - 1)
    }

    /// The number of bytes occupied by an offset of this length.
    pub const fn width(self) -> usize {
        self as u8 as usize
    }

    /// Write `value` into the first bytes of `at`, big-endian.
    ///
    /// `at` must be at least [`width`](Self::width) bytes long, and `value`
    /// must not exceed [`max_value`](Self::max_value); returns `None` otherwise.
    pub(crate) fn write_be(self, at: &mut [u8], value: u32) -> Option<()> {
        let at = at.get_mut(..self.width())?;
        match self {
            OffsetLen::Offset16 => {
                at.copy_from_slice(u16::try_from(value).ok()?.to_be_bytes().as_slice())
            }
            OffsetLen::Offset24 => {
                at.copy_from_slice(Uint24::checked_new(value)?.to_be_bytes().as_slice())
            }
            OffsetLen::Offset32 => at.copy_from_slice(value.to_be_bytes().as_slice()),
        }
        Some(())
    }
}

impl TryFrom<u8> for OffsetLen {
    type Error = RepackError;

    fn try_from(width: u8) -> Result<Self, Self::Error> {
        match width {
            2 => Ok(OffsetLen::Offset16),
            3 => Ok(OffsetLen::Offset24),
            4 => Ok(OffsetLen::Offset32),
            other => Err(RepackError::InvalidWidth(other)),
        }
    }
}

impl std::fmt::Display for OffsetLen {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Offset16 => write!(f, "Offset16"),
            Self::Offset24 => write!(f, "Offset24"),
            Self::Offset32 => write!(f, "Offset32"),
        }
    }
}

/// An offset from one object to another.
///
/// The offset is stored at `position` bytes from the start of the object
/// that owns the link, and is relative to the start of that same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    pub position: u32,
    pub width: OffsetLen,
    pub target: ObjectId,
    /// If set, the distance is written as two's complement, and the target
    /// may precede the object holding the offset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_signed: bool,
}

impl Link {
    pub fn new(position: u32, width: OffsetLen, target: u32) -> Self {
        Link {
            position,
            width,
            target: ObjectId::new(target),
            is_signed: false,
        }
    }

    pub fn new_signed(position: u32, width: OffsetLen, target: u32) -> Self {
        Link {
            is_signed: true,
            ..Link::new(position, width, target)
        }
    }

    /// The byte range covered by this offset, relative to its object.
    pub(crate) fn byte_range(&self) -> std::ops::Range<u64> {
        let start = self.position as u64;
        start..start + self.width.width() as u64
    }

    /// Encode a resolved distance as the raw bits to be written, or `None`
    /// if it cannot be represented by this link.
    pub(crate) fn encode(&self, distance: i64) -> Option<u32> {
        if self.is_signed {
            let (min, max) = self.width.signed_range();
            if distance < min || distance > max {
                return None;
            }
            Some((distance as u32) & self.width.max_value())
        } else {
            u32::try_from(distance)
                .ok()
                .filter(|value| *value <= self.width.max_value())
        }
    }
}

impl TryFrom<(u32, u8, u32)> for Link {
    type Error = RepackError;

    /// Convert a raw `(position, width, target)` triple.
    fn try_from((position, width, target): (u32, u8, u32)) -> Result<Self, Self::Error> {
        OffsetLen::try_from(width).map(|width| Link::new(position, width, target))
    }
}

/// The links belonging to a single object.
///
/// Real links are resolved into offsets. Virtual links only record that the
/// object depends on another one; they are checked for validity, but write
/// nothing and do not influence the packing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectLinks {
    #[cfg_attr(feature = "serde", serde(default))]
    pub links: Vec<Link>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub virtual_links: Vec<ObjectId>,
}

impl ObjectLinks {
    pub fn new(links: impl IntoIterator<Item = Link>) -> Self {
        ObjectLinks {
            links: links.into_iter().collect(),
            virtual_links: Vec::new(),
        }
    }

    /// Build from raw `(position, width, target)` triples.
    pub fn from_raw(raw: &[(u32, u8, u32)]) -> Result<Self, RepackError> {
        raw.iter()
            .copied()
            .map(Link::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(ObjectLinks::new)
    }

    pub fn with_virtual_links(mut self, targets: impl IntoIterator<Item = ObjectId>) -> Self {
        self.virtual_links.extend(targets);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.virtual_links.is_empty()
    }
}

impl From<Vec<Link>> for ObjectLinks {
    fn from(links: Vec<Link>) -> Self {
        ObjectLinks::new(links)
    }
}
