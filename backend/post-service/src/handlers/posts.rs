/// Post handlers - HTTP endpoints for post operations
use crate::auth::AuthorIdentity;
use crate::error::Result;
use crate::models::{AuthorParams, CreatePostRequest, LimitParams, PostsResponse, SearchParams};
use crate::AppState;
use actix_web::{web, HttpResponse};

/// Submit a new post as the authenticated author
/// POST /api/v1/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Option<AuthorIdentity>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let body = req.post.as_deref().unwrap_or_default();
    let post = state.ingestion.submit(identity.as_ref(), body).await?;

    Ok(HttpResponse::Created().json(post))
}

/// Most recent posts from everyone
/// GET /api/v1/posts/recent?limit=
pub async fn recent_posts(
    state: web::Data<AppState>,
    _identity: AuthorIdentity,
    query: web::Query<LimitParams>,
) -> Result<HttpResponse> {
    let posts = state.feed.recent(query.limit).await?;
    Ok(HttpResponse::Ok().json(PostsResponse::from(posts)))
}

/// Posts containing `q`
/// GET /api/v1/posts/search?q=&limit=
pub async fn search_posts(
    state: web::Data<AppState>,
    _identity: AuthorIdentity,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let posts = state.feed.search(query.q.as_deref(), query.limit).await?;
    Ok(HttpResponse::Ok().json(PostsResponse::from(posts)))
}

/// Posts by the named author
/// GET /api/v1/posts/by-author?author=&limit=
pub async fn posts_by_author(
    state: web::Data<AppState>,
    _identity: AuthorIdentity,
    query: web::Query<AuthorParams>,
) -> Result<HttpResponse> {
    let posts = state.feed.by_author(query.author.as_deref(), query.limit).await?;
    Ok(HttpResponse::Ok().json(PostsResponse::from(posts)))
}

/// Newest post by the named author, as a feed of zero or one posts
/// GET /api/v1/posts/by-author/latest?author=
pub async fn latest_post_by_author(
    state: web::Data<AppState>,
    _identity: AuthorIdentity,
    query: web::Query<AuthorParams>,
) -> Result<HttpResponse> {
    let latest = state.feed.latest_by_author(query.author.as_deref()).await?;
    Ok(HttpResponse::Ok().json(PostsResponse::from(Vec::from_iter(latest))))
}
