/// HTTP handlers for post-related endpoints
///
/// - Posts: submit, recent feed, search feed, by-author feed, latest by author
/// - Health: store liveness probe
pub mod health;
pub mod posts;

pub use health::health_summary;
pub use posts::{create_post, latest_post_by_author, posts_by_author, recent_posts, search_posts};

use crate::auth::Authenticator;
use crate::error::AppError;
use crate::middleware::CredentialAuthMiddleware;
use actix_web::web;
use std::sync::Arc;

/// Route table shared by the binary and the API tests.
pub fn configure(cfg: &mut web::ServiceConfig, authenticator: Arc<dyn Authenticator>) {
    let json_config = web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _| AppError::ValidationError(err.to_string()).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _| AppError::ValidationError(err.to_string()).into());

    cfg.app_data(json_config)
        .app_data(query_config)
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .route("/api/v1/health", web::get().to(health_summary))
        .service(
            web::scope("/api/v1/posts")
                .wrap(CredentialAuthMiddleware::new(authenticator))
                .route("", web::post().to(create_post))
                .route("/recent", web::get().to(recent_posts))
                .route("/search", web::get().to(search_posts))
                .route("/by-author", web::get().to(posts_by_author))
                .route("/by-author/latest", web::get().to(latest_post_by_author)),
        );
}
