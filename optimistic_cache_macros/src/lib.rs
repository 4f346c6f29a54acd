mod entity;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Entity)]
// ============================================================================

/// Derive macro implementing `optimistic_cache::Entity` for a struct.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
/// #[entity(collection = "todos", name = "todo")]
/// struct Todo {
///     #[entity(id)]
///     pub id: i64,
///     pub title: String,
///     #[serde(default)]
///     pub completed: bool,
/// }
/// ```
///
/// Struct-level `#[entity(...)]` keys:
/// - `collection = "..."`: resource key, defaults to the snake_case struct name plus `s`
/// - `name = "..."`: singular noun used in failure messages, defaults to the snake_case struct name
///
/// The id field is the one marked `#[entity(id)]`, or the field named `id`.
/// Its type becomes `Entity::Id` and must implement `EntityKey`.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input)
}
