//! Record layout descriptor.
//!
//! A [`Layout`] is the ordered list of field kinds that make up one record.
//! Every element is four bytes on disk; the first element is the record id.

use crate::error::{DbcError, DbcResult};
use std::fmt;

/// Kind of one field in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LayoutElement {
    /// A raw 32-bit word: `int32`, `uint32` or `float32`.
    FixedWord = 0,
    /// A 32-bit byte offset into the string pool.
    StringRef = 1,
}

impl LayoutElement {
    /// On-disk width of the element in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        4
    }
}

impl TryFrom<u8> for LayoutElement {
    type Error = DbcError;

    fn try_from(code: u8) -> DbcResult<Self> {
        match code {
            0 => Ok(Self::FixedWord),
            1 => Ok(Self::StringRef),
            other => Err(DbcError::schema(format!("unknown layout element code {other}"))),
        }
    }
}

/// Ordered, size-accumulating description of a record.
///
/// A layout can be extended until it is [fixed](Layout::fix); after that
/// every mutation fails with [`DbcError::LayoutFixed`].
///
/// Cloning yields an **unfixed** copy with the same elements, so a fixed
/// layout can serve as a template for a derived one.
///
/// # Example
///
/// ```rust
/// use dbc_core::{Layout, LayoutElement};
///
/// let layout = Layout::from_format("nisf").unwrap();
/// assert_eq!(layout.size(), 16);
/// assert_eq!(layout.element(2), Some(LayoutElement::StringRef));
/// ```
#[derive(PartialEq, Eq, Default)]
pub struct Layout {
    elements: Vec<LayoutElement>,
    size: usize,
    fixed: bool,
}

impl Layout {
    /// Creates an empty, unfixed layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a layout from a one-character-per-field format string.
    ///
    /// `i`, `f` are fixed words; `d`, `n` are the id field and may only
    /// appear first; `s` is a string reference.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::LayoutFormat`] for any other character, or for
    /// `d`/`n` past the first position.
    pub fn from_format(format: &str) -> DbcResult<Self> {
        let mut layout = Self::new();
        for (position, element) in format.chars().enumerate() {
            let kind = match element {
                'd' | 'n' if position == 0 => LayoutElement::FixedWord,
                'i' | 'f' => LayoutElement::FixedWord,
                's' => LayoutElement::StringRef,
                _ => return Err(DbcError::LayoutFormat { position, element }),
            };
            layout.add_field(kind)?;
        }
        Ok(layout)
    }

    /// Builds a layout from raw element codes.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::SchemaError`] for an unknown code.
    pub fn from_codes(codes: &[u8]) -> DbcResult<Self> {
        let mut layout = Self::new();
        for &code in codes {
            layout.add_code(code)?;
        }
        Ok(layout)
    }

    /// Builds a layout of `count` fixed words.
    #[must_use]
    pub fn fixed_words(count: usize) -> Self {
        Self {
            elements: vec![LayoutElement::FixedWord; count],
            size: count * LayoutElement::FixedWord.width(),
            fixed: false,
        }
    }

    /// Appends a field.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::LayoutFixed`] if the layout is fixed.
    pub fn add_field(&mut self, element: LayoutElement) -> DbcResult<()> {
        if self.fixed {
            return Err(DbcError::LayoutFixed);
        }
        self.size += element.width();
        self.elements.push(element);
        Ok(())
    }

    /// Appends a field given by its raw code.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::LayoutFixed`] if the layout is fixed, or
    /// [`DbcError::SchemaError`] for an unknown code.
    pub fn add_code(&mut self, code: u8) -> DbcResult<()> {
        if self.fixed {
            return Err(DbcError::LayoutFixed);
        }
        self.add_field(LayoutElement::try_from(code)?)
    }

    /// Marks the layout immutable. Idempotent.
    pub fn fix(&mut self) -> &mut Self {
        self.fixed = true;
        self
    }

    /// Returns a fixed version of this layout.
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Returns whether the layout is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Total record size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns whether the layout has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<LayoutElement> {
        self.elements.get(index).copied()
    }

    /// Returns the elements in order.
    #[must_use]
    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    /// Byte offset of the field at `index` within a record.
    #[must_use]
    pub fn offset_of(&self, index: usize) -> Option<usize> {
        if index >= self.elements.len() {
            return None;
        }
        Some(self.elements[..index].iter().map(|e| e.width()).sum())
    }

    /// Iterates over `(byte_offset, element)` pairs.
    pub fn fields(&self) -> impl Iterator<Item = (usize, LayoutElement)> + '_ {
        self.elements.iter().scan(0usize, |offset, &element| {
            let at = *offset;
            *offset += element.width();
            Some((at, element))
        })
    }

    /// Byte offsets of every string reference.
    pub fn string_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.fields()
            .filter(|(_, element)| *element == LayoutElement::StringRef)
            .map(|(offset, _)| offset)
    }

    /// Checks that the layout can describe a record keyed by its first word.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::SchemaError`] if the layout is empty or does not
    /// start with a fixed word.
    pub fn ensure_keyed(&self) -> DbcResult<()> {
        match self.elements.first() {
            Some(LayoutElement::FixedWord) => Ok(()),
            Some(LayoutElement::StringRef) => Err(DbcError::schema(
                "the first field is the record id and cannot be a string",
            )),
            None => Err(DbcError::schema("layout has no fields")),
        }
    }
}

impl Clone for Layout {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            size: self.size,
            fixed: false,
        }
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Layout(")?;
        for (i, element) in self.elements.iter().enumerate() {
            let c = match element {
                LayoutElement::FixedWord if i == 0 => 'n',
                LayoutElement::FixedWord => 'i',
                LayoutElement::StringRef => 's',
            };
            write!(f, "{c}")?;
        }
        write!(f, ", {} bytes{})", self.size, if self.fixed { ", fixed" } else { "" })
    }
}
