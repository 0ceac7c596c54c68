//! Validated decode plans.

use crate::config::LoadConfig;
use crate::error::{DbcError, DbcResult};
use crate::layout::Layout;
use crate::lazy::LazyString;
use crate::plan::schema::{FieldSetter, Schema};
use crate::record::RecordView;
use std::fmt;

/// How `LazyString` fields are produced during decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringMode {
    /// Lazy strings keep a reference to their pool and decode on first read.
    #[default]
    Deferred,
    /// Lazy strings are decoded during record decode, like `String` fields.
    Immediate,
}

impl From<&LoadConfig> for StringMode {
    fn from(config: &LoadConfig) -> Self {
        if config.materialize_lazy_strings_immediately {
            Self::Immediate
        } else {
            Self::Deferred
        }
    }
}

struct Step<T> {
    index: usize,
    offset: usize,
    setter: FieldSetter<T>,
}

/// A schema validated against a layout, ready to decode records.
///
/// Building the plan checks every field once:
/// - the schema has exactly one field per layout element
/// - the first field is `Int32` or `UInt32` (the record id)
/// - every field kind matches its layout element
/// - every field has a setter of its declared kind
/// - kinds given by name are recognized
///
/// Decoding then only reads words and calls setters.
pub struct FieldPlan<T> {
    layout: Layout,
    names: Vec<String>,
    steps: Vec<Step<T>>,
}

impl<T: Default> FieldPlan<T> {
    /// Validates `schema` against `layout` and builds the plan.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::SchemaError`] describing the first field that
    /// cannot be mapped.
    pub fn new(layout: &Layout, schema: Schema<T>) -> DbcResult<Self> {
        layout.ensure_keyed()?;

        if schema.len() != layout.len() {
            return Err(DbcError::schema(format!(
                "schema has {} fields but the layout has {}",
                schema.len(),
                layout.len()
            )));
        }

        let mut names = Vec::with_capacity(schema.len());
        let mut steps = Vec::with_capacity(schema.len());

        for (index, (field, (offset, element))) in
            schema.fields().iter().zip(layout.fields()).enumerate()
        {
            let kind = field.kind.resolve()?;

            if index == 0 && !kind.is_integer() {
                return Err(DbcError::schema(format!(
                    "id field '{}' must be int32 or uint32, not {kind}",
                    field.name
                )));
            }

            if kind.element() != element {
                return Err(DbcError::schema(format!(
                    "field '{}' is {kind} but layout element {index} is {element:?}",
                    field.name
                )));
            }

            let setter = field.setter.ok_or_else(|| {
                DbcError::schema(format!("field '{}' has no setter", field.name))
            })?;

            if setter.kind() != kind {
                return Err(DbcError::schema(format!(
                    "field '{}' is declared {kind} but its setter takes {}",
                    field.name,
                    setter.kind()
                )));
            }

            names.push(field.name.clone());
            steps.push(Step {
                index,
                offset,
                setter,
            });
        }

        Ok(Self {
            layout: layout.clone().fixed(),
            names,
            steps,
        })
    }

    /// Decodes one record.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::SchemaError`] if the record does not have the
    /// size this plan was built for, or a string error from the view.
    pub fn decode(&self, record: &RecordView<'_>, mode: StringMode) -> DbcResult<T> {
        let bytes = record.as_bytes();
        if bytes.len() != self.layout.size() {
            return Err(DbcError::schema(format!(
                "record is {} bytes but the plan expects {}",
                bytes.len(),
                self.layout.size()
            )));
        }

        let mut value = T::default();
        for step in &self.steps {
            let at = step.offset;
            let word = [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
            match step.setter {
                FieldSetter::Int32(set) => set(&mut value, i32::from_le_bytes(word)),
                FieldSetter::UInt32(set) => set(&mut value, u32::from_le_bytes(word)),
                FieldSetter::Float32(set) => set(&mut value, f32::from_le_bytes(word)),
                FieldSetter::String(set) => set(&mut value, record.string(step.index)?),
                FieldSetter::LazyString(set) => {
                    let lazy = match mode {
                        StringMode::Deferred => record.lazy_string(step.index)?,
                        StringMode::Immediate => LazyString::from(record.string(step.index)?),
                    };
                    set(&mut value, lazy);
                }
            }
        }
        Ok(value)
    }
}

impl<T> FieldPlan<T> {
    /// The layout this plan decodes.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Size of one record in bytes.
    #[must_use]
    pub fn record_size(&self) -> usize {
        self.layout.size()
    }

    /// Field names in layout order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.names
    }
}

impl<T> fmt::Debug for FieldPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPlan")
            .field("layout", &self.layout)
            .field("fields", &self.names)
            .finish()
    }
}
