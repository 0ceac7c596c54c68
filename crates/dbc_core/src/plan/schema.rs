//! Target field descriptions.

use crate::error::{DbcError, DbcResult};
use crate::layout::LayoutElement;
use crate::lazy::LazyString;
use std::fmt;
use std::str::FromStr;

/// Kind of a target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// 32-bit float.
    Float32,
    /// String decoded during record decode.
    String,
    /// String decoded on first read.
    LazyString,
}

impl FieldKind {
    /// The layout element a field of this kind is stored in.
    #[must_use]
    pub const fn element(self) -> LayoutElement {
        match self {
            Self::Int32 | Self::UInt32 | Self::Float32 => LayoutElement::FixedWord,
            Self::String | Self::LazyString => LayoutElement::StringRef,
        }
    }

    /// Returns whether the kind can hold a record id.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::UInt32)
    }

    /// Canonical name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Float32 => "float32",
            Self::String => "string",
            Self::LazyString => "lazy_string",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKind {
    type Err = DbcError;

    fn from_str(s: &str) -> DbcResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "int32" | "i32" | "int" => Ok(Self::Int32),
            "uint32" | "u32" | "uint" => Ok(Self::UInt32),
            "float32" | "f32" | "float" => Ok(Self::Float32),
            "string" | "str" | "cstring" => Ok(Self::String),
            "lazy_string" | "lazystring" | "lazy_cstring" => Ok(Self::LazyString),
            _ => Err(DbcError::schema(format!("unrecognized field kind '{s}'"))),
        }
    }
}

/// Write destination for one decoded field.
pub enum FieldSetter<T> {
    /// Receives a signed integer.
    Int32(fn(&mut T, i32)),
    /// Receives an unsigned integer.
    UInt32(fn(&mut T, u32)),
    /// Receives a float.
    Float32(fn(&mut T, f32)),
    /// Receives a decoded string.
    String(fn(&mut T, String)),
    /// Receives a lazy string.
    LazyString(fn(&mut T, LazyString)),
}

impl<T> FieldSetter<T> {
    /// The kind of value this setter accepts.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Int32(_) => FieldKind::Int32,
            Self::UInt32(_) => FieldKind::UInt32,
            Self::Float32(_) => FieldKind::Float32,
            Self::String(_) => FieldKind::String,
            Self::LazyString(_) => FieldKind::LazyString,
        }
    }
}

impl<T> Clone for FieldSetter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldSetter<T> {}

impl<T> fmt::Debug for FieldSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldSetter({})", self.kind())
    }
}

/// Declared kind of a target field.
///
/// Schemas read from configuration name their kinds as text; those names
/// are resolved when the plan is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindSpec {
    /// A known kind.
    Kind(FieldKind),
    /// A kind given by name, resolved at plan construction.
    Named(String),
}

impl From<FieldKind> for KindSpec {
    fn from(kind: FieldKind) -> Self {
        Self::Kind(kind)
    }
}

impl From<&str> for KindSpec {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl KindSpec {
    pub(crate) fn resolve(&self) -> DbcResult<FieldKind> {
        match self {
            Self::Kind(kind) => Ok(*kind),
            Self::Named(name) => name.parse(),
        }
    }
}

/// One field of a target record type.
#[derive(Debug, Clone)]
pub struct TargetField<T> {
    /// Field name, used in error messages.
    pub name: String,
    /// Declared kind.
    pub kind: KindSpec,
    /// Where the decoded value goes. `None` marks a field that cannot be
    /// written.
    pub setter: Option<FieldSetter<T>>,
}

impl<T> TargetField<T> {
    /// Creates a field whose kind is implied by its setter.
    pub fn new(name: impl Into<String>, setter: FieldSetter<T>) -> Self {
        Self {
            name: name.into(),
            kind: KindSpec::Kind(setter.kind()),
            setter: Some(setter),
        }
    }

    /// Creates a field from an external description.
    pub fn described(
        name: impl Into<String>,
        kind: impl Into<KindSpec>,
        setter: Option<FieldSetter<T>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            setter,
        }
    }
}

/// Ordered target fields of a record type.
#[derive(Debug, Clone)]
pub struct Schema<T> {
    fields: Vec<TargetField<T>>,
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<T> Schema<T> {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: TargetField<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a signed integer field.
    #[must_use]
    pub fn int32(self, name: &str, setter: fn(&mut T, i32)) -> Self {
        self.field(TargetField::new(name, FieldSetter::Int32(setter)))
    }

    /// Appends an unsigned integer field.
    #[must_use]
    pub fn uint32(self, name: &str, setter: fn(&mut T, u32)) -> Self {
        self.field(TargetField::new(name, FieldSetter::UInt32(setter)))
    }

    /// Appends a float field.
    #[must_use]
    pub fn float32(self, name: &str, setter: fn(&mut T, f32)) -> Self {
        self.field(TargetField::new(name, FieldSetter::Float32(setter)))
    }

    /// Appends an eagerly decoded string field.
    #[must_use]
    pub fn string(self, name: &str, setter: fn(&mut T, String)) -> Self {
        self.field(TargetField::new(name, FieldSetter::String(setter)))
    }

    /// Appends a lazily decoded string field.
    #[must_use]
    pub fn lazy_string(self, name: &str, setter: fn(&mut T, LazyString)) -> Self {
        self.field(TargetField::new(name, FieldSetter::LazyString(setter)))
    }

    /// The fields in order.
    #[must_use]
    pub fn fields(&self) -> &[TargetField<T>] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
