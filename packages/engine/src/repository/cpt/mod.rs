pub mod posts;
pub mod provider;
pub mod relations;
pub mod taxonomies;
pub mod terms;
pub mod types;

pub use posts::{CptPostInput, CptPostRepository};
pub use provider::CptPostProvider;
pub use relations::{CptRelationInput, CptRelationRepository};
pub use taxonomies::{CptTaxonomyInput, CptTaxonomyRepository};
pub use terms::{CptTermInput, CptTermRepository, TermNode};
pub use types::{CptTypeInput, CptTypeRepository};
