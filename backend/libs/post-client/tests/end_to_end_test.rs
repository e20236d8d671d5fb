//! Drives `FeedClient` against a real post-service HTTP server backed by the
//! in-memory store.

use actix_web::{web, App, HttpServer};
use post_client::{ClientConfig, ClientError, FeedClient, LatestPostSource, PollOutcome};
use post_service::auth::{Authenticator, InMemoryAuthenticator};
use post_service::db::{InMemoryPostStore, PostStore};
use post_service::{handlers, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

struct TestServer {
    addr: SocketAddr,
    handle: actix_web::dev::ServerHandle,
}

impl TestServer {
    fn client(&self, username: &str, password: &str) -> FeedClient {
        let config = ClientConfig::new(format!("http://{}", self.addr), username, password)
            .with_poll_interval(Duration::from_millis(200));
        FeedClient::new(config).unwrap()
    }

    async fn stop(self) {
        self.handle.stop(false).await;
    }
}

/// foo/foobar has "foofirst post" and "foosecond post"; bar/barbar has
/// "barfirst post" appended in between.
async fn start_server() -> TestServer {
    let store = Arc::new(InMemoryPostStore::new());
    let authenticator = Arc::new(InMemoryAuthenticator::new());

    let foo = store.create_author("foo").await.unwrap();
    let bar = store.create_author("bar").await.unwrap();
    authenticator.add_account(&foo, "foobar").await.unwrap();
    authenticator.add_account(&bar, "barbar").await.unwrap();

    store.append(foo.id, "foofirst post").await.unwrap();
    store.append(bar.id, "barfirst post").await.unwrap();
    store.append(foo.id, "foosecond post").await.unwrap();

    let store: Arc<dyn PostStore> = store;
    let authenticator: Arc<dyn Authenticator> = authenticator;
    let state = web::Data::new(AppState::new(store, 100, 1_000));

    let server = HttpServer::new(move || {
        let authenticator = authenticator.clone();
        App::new()
            .app_data(state.clone())
            .configure(move |cfg| handlers::configure(cfg, authenticator))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    TestServer { addr, handle }
}

#[actix_web::test]
async fn list_recent_is_newest_first() {
    let server = start_server().await;
    let foo = server.client("foo", "foobar");

    let bodies = foo.list_recent().await.unwrap();
    assert_eq!(bodies, vec!["foosecond post", "barfirst post", "foofirst post"]);

    server.stop().await;
}

#[actix_web::test]
async fn submit_echoes_created_post() {
    let server = start_server().await;
    let bar = server.client("bar", "barbar");

    let echoed = bar.submit("barsecond post").await.unwrap();
    assert_eq!(echoed, vec!["barsecond post"]);

    let bodies = bar.list_recent().await.unwrap();
    assert_eq!(bodies.first().map(String::as_str), Some("barsecond post"));

    server.stop().await;
}

#[actix_web::test]
async fn latest_by_author_returns_single_newest_post() {
    let server = start_server().await;
    let reader = server.client("bar", "barbar");

    let latest = reader.latest_by_author("foo").await.unwrap().unwrap();
    assert_eq!(latest.body, "foosecond post");
    assert_eq!(latest.id, 3);

    assert!(reader.latest_by_author("nobody").await.unwrap().is_none());

    server.stop().await;
}

#[actix_web::test]
async fn read_from_user_sees_post_made_while_polling() {
    let server = start_server().await;
    let reader = server.client("bar", "barbar");
    let foo = server.client("foo", "foobar");

    let (read, submitted) = tokio::join!(reader.read_from_user("foo", 5), async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        foo.submit("foothird post").await
    });

    submitted.unwrap();
    assert_eq!(read.unwrap().as_deref(), Some("foothird post"));

    server.stop().await;
}

#[actix_web::test]
async fn read_from_user_ignores_existing_posts() {
    let server = start_server().await;
    let reader = server.client("bar", "barbar");

    let read = reader.read_from_user("foo", 3).await.unwrap();
    assert_eq!(read, None);

    // unknown author: baseline 0 and nothing ever arrives
    let read = reader.read_from_user("nobody", 2).await.unwrap();
    assert_eq!(read, None);

    server.stop().await;
}

#[actix_web::test]
async fn poll_can_be_cancelled() {
    let server = start_server().await;
    let reader = server.client("bar", "barbar");
    let (tx, rx) = watch::channel(false);

    let (outcome, _) = tokio::join!(reader.poll_for_new_post("foo", 30, rx), async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(true).unwrap();
    });

    assert_eq!(outcome.unwrap(), PollOutcome::Cancelled);

    server.stop().await;
}

#[actix_web::test]
async fn bad_credentials_are_unauthorized() {
    let server = start_server().await;
    let intruder = server.client("foo", "wrong");

    let err = intruder.list_recent().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(ref msg) if msg == "Login failed"));

    let err = intruder.read_from_user("bar", 5).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));

    server.stop().await;
}

#[actix_web::test]
async fn empty_post_is_rejected() {
    let server = start_server().await;
    let foo = server.client("foo", "foobar");

    let err = foo.submit("   ").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected { status: 400, .. }));

    server.stop().await;
}
