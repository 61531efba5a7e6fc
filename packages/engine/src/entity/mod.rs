pub mod cpt_post;
pub mod cpt_post_shop;
pub mod cpt_post_term;
pub mod cpt_post_translation;
pub mod cpt_relation;
pub mod cpt_relation_link;
pub mod cpt_taxonomy;
pub mod cpt_term;
pub mod cpt_type;
pub mod cpt_type_group;
pub mod cpt_type_shop;
pub mod cpt_type_taxonomy;
pub mod cpt_type_translation;
pub mod field;
pub mod field_group;
pub mod field_translation;
pub mod field_value;
