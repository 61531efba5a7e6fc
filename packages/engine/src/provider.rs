use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::location::RuleContext;

/// Builds the location-rule context for one entity family.
///
/// The host platform registers one provider per entity type it exposes
/// (products, categories, orders, ...); the engine ships its own for CPT
/// posts. Providers degrade instead of failing: when an optional context
/// property cannot be derived, they return what they have rather than
/// sinking the whole operation.
#[async_trait]
pub trait EntityFieldProvider: Send + Sync {
    /// Value of the `entity_type` context key, e.g. "product".
    fn entity_type(&self) -> &str;

    /// Context for one entity. Always contains at least `entity_type`.
    async fn build_context(&self, db: &DatabaseConnection, entity_id: i32) -> RuleContext;
}

/// The context every provider can fall back to.
pub fn minimal_context(entity_type: &str) -> RuleContext {
    let mut ctx = RuleContext::new();
    ctx.insert("entity_type".into(), json!(entity_type));
    ctx
}
