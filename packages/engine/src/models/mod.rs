pub mod field;
pub mod group;
pub mod shared;

pub use field::{FieldDto, FieldTranslationDto};
pub use group::GroupDto;
pub use shared::{
    Pagination, escape_like, validate_optional_position, validate_reorder_ids, validate_title,
};
