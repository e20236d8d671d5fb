/// Business logic layer for post-service
///
/// - Feed: read views over the post store (recent, search, by author)
/// - Ingestion: validated, authenticated appends
pub mod feed;
pub mod ingestion;

pub use feed::FeedService;
pub use ingestion::IngestionService;
