use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::location::RuleContext;
use crate::provider::{EntityFieldProvider, minimal_context};
use crate::repository::cpt::posts::CptPostRepository;
use crate::repository::values::ENTITY_CPT_POST;

/// The engine's own provider for CPT posts. Host platforms register their
/// siblings for products, categories, orders and so on.
pub struct CptPostProvider;

#[async_trait]
impl EntityFieldProvider for CptPostProvider {
    fn entity_type(&self) -> &str {
        ENTITY_CPT_POST
    }

    async fn build_context(&self, db: &DatabaseConnection, entity_id: i32) -> RuleContext {
        match CptPostRepository::new(db).build_context(entity_id).await {
            Ok(ctx) => ctx,
            Err(e) => {
                // Optional context could not be derived; match on what we
                // know rather than failing the render.
                warn!(post_id = entity_id, "Falling back to minimal context: {e}");
                minimal_context(ENTITY_CPT_POST)
            }
        }
    }
}
