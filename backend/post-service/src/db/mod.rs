/// Database access layer
///
/// - `PostStore`: the append log every read and write goes through
/// - `PgPostStore`: PostgreSQL implementation (production)
/// - `InMemoryPostStore`: process-local implementation (tests, demos)
mod memory_post_store;
mod pg_post_store;
mod post_store;

pub use memory_post_store::InMemoryPostStore;
pub use pg_post_store::PgPostStore;
pub use post_store::PostStore;
