pub mod cpt;
pub mod fields;
pub mod groups;
pub mod values;

pub use fields::{FieldInput, FieldRepository, FieldWithChildren};
pub use groups::{FieldGroupRepository, GroupInput, GroupListQuery, GroupPage};
pub use values::{
    ENTITY_CPT_POST, ENTITY_PRODUCT, ValueStore, ValueWithMeta, ValueWrite,
};
