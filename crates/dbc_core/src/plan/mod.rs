//! Schema mapping from raw records to typed values.
//!
//! A [`Schema`] lists the target fields of a record type in layout order,
//! each with its kind and a setter. [`FieldPlan::new`] validates the schema
//! against a [`Layout`](crate::Layout) once; the resulting plan decodes any
//! number of records without re-validating.
//!
//! ## Example
//!
//! ```rust
//! use dbc_core::{FieldPlan, Layout, Schema};
//!
//! #[derive(Default)]
//! struct Item {
//!     id: u32,
//!     quality: i32,
//!     name: String,
//! }
//!
//! let layout = Layout::from_format("nis").unwrap();
//! let schema = Schema::new()
//!     .uint32("id", |r: &mut Item, v| r.id = v)
//!     .int32("quality", |r, v| r.quality = v)
//!     .string("name", |r, v| r.name = v);
//! let plan = FieldPlan::new(&layout, schema).unwrap();
//! assert_eq!(plan.record_size(), 12);
//! ```

mod field_plan;
mod schema;

pub use field_plan::{FieldPlan, StringMode};
pub use schema::{FieldKind, FieldSetter, KindSpec, Schema, TargetField};
