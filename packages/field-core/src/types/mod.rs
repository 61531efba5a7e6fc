//! Built-in field types.
//!
//! Each type owns the canonical shape of its stored value. Composite types
//! (repeater) validate structure only; per-subfield normalization happens in
//! the engine, which knows the child definitions.

mod basic;
mod choice;
mod content;
mod relational;
mod repeater;

use std::sync::Arc;

pub use basic::{DateType, NumberType, TextType, TextareaType, TrueFalseType};
pub use choice::SelectType;
pub use content::{FileType, GalleryType, ImageType, LinkType};
pub use relational::RelationType;
pub use repeater::RepeaterType;

use crate::traits::FieldType;

/// Every core type, in picker order.
pub fn builtins() -> Vec<Arc<dyn FieldType>> {
    vec![
        Arc::new(TextType),
        Arc::new(TextareaType),
        Arc::new(NumberType),
        Arc::new(TrueFalseType),
        Arc::new(DateType),
        Arc::new(SelectType),
        Arc::new(LinkType),
        Arc::new(FileType),
        Arc::new(ImageType),
        Arc::new(GalleryType),
        Arc::new(RelationType),
        Arc::new(RepeaterType),
    ]
}
