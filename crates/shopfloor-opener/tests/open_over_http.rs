//! End-to-end opens against an in-process HTTP server standing in for the
//! object store's download endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use shopfloor_core::AttachmentRef;
use shopfloor_opener::mock::{HostEvent, RecordingHost};
use shopfloor_opener::{
    AttachmentCache, AttachmentOpener, CommandHost, HostServices, HttpFetcher, OpenError, Opened,
    Platform,
};
use shopfloor_store::mock::MockStore;
use shopfloor_store::{HttpProbe, SignedUrlProvider};
use tokio::net::TcpListener;

async fn serve_object(State(hits): State<Arc<AtomicUsize>>, Path(name): Path<String>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    match name.as_str() {
        "abc123.pdf" | "x.pdf" => {
            ([(header::CONTENT_TYPE, "application/pdf")], "%PDF-1.4").into_response()
        }
        "denied.pdf" => StatusCode::FORBIDDEN.into_response(),
        "envelope.pdf" => (
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#,
        )
            .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Spawn the server; returns (base_url, hit counter).
async fn spawn_server() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/documents/{name}", get(serve_object))
        .route("/public/{name}", get(serve_object))
        .with_state(hits.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), hits)
}

fn store_for(base: &str) -> Arc<MockStore> {
    Arc::new(
        MockStore::new("documents")
            .with_url_base(&format!("{base}/documents"))
            .with_objects(vec![
                ("abc123.pdf", "%PDF-1.4"),
                ("x.pdf", "%PDF-1.4"),
                ("denied.pdf", "%PDF-1.4"),
                ("envelope.pdf", "%PDF-1.4"),
            ]),
    )
}

fn opener(
    platform: Platform,
    store: Arc<MockStore>,
    host: Arc<dyn HostServices>,
    cache_dir: &std::path::Path,
) -> AttachmentOpener {
    AttachmentOpener::new(
        platform,
        SignedUrlProvider::new(store, Arc::new(HttpProbe::new())),
        Arc::new(HttpFetcher::new()),
        host,
        AttachmentCache::new(cache_dir),
    )
}

#[tokio::test]
async fn browser_download_lands_in_downloads_dir() {
    let (base, _) = spawn_server().await;
    let tmp = tempfile::tempdir().unwrap();
    let host = Arc::new(CommandHost::new(tmp.path().join("downloads"), "true", None));
    let opener = opener(Platform::Browser, store_for(&base), host, &tmp.path().join("cache"));

    let att = AttachmentRef::new("abc123.pdf", "documents/abc123.pdf");
    let opened = opener.open(&att).await.unwrap();
    assert_eq!(
        opened,
        Opened::Saved {
            filename: "abc123.pdf".into()
        }
    );
    let saved = std::fs::read(tmp.path().join("downloads/abc123.pdf")).unwrap();
    assert_eq!(saved, b"%PDF-1.4");
}

#[tokio::test]
async fn browser_forbidden_download_saves_nothing() {
    let (base, _) = spawn_server().await;
    let tmp = tempfile::tempdir().unwrap();
    let host = Arc::new(RecordingHost::new());
    let opener = opener(Platform::Browser, store_for(&base), host.clone(), tmp.path());

    let att = AttachmentRef::new("denied.pdf", "documents/denied.pdf");
    let err = opener.open(&att).await.unwrap_err();
    assert!(matches!(err, OpenError::Transfer(_)));
    assert!(err.to_string().contains("403"));
    assert!(host.events().is_empty());
}

#[tokio::test]
async fn browser_json_error_envelope_is_rejected() {
    let (base, _) = spawn_server().await;
    let tmp = tempfile::tempdir().unwrap();
    let host = Arc::new(RecordingHost::new());
    let opener = opener(Platform::Browser, store_for(&base), host.clone(), tmp.path());

    let att = AttachmentRef::new("envelope.pdf", "documents/envelope.pdf");
    assert!(!opener.open_or_alert(&att).await);
    let events = host.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], HostEvent::Alert { message, .. } if message.contains("not_found")));
}

#[tokio::test]
async fn android_reuses_cached_download() {
    let (base, hits) = spawn_server().await;
    let tmp = tempfile::tempdir().unwrap();
    let host = Arc::new(RecordingHost::new());
    let cache_dir = tmp.path().join("attachments");
    let opener = opener(Platform::Android, store_for(&base), host.clone(), &cache_dir);

    let att = AttachmentRef::new("x.pdf", "documents/x.pdf");
    assert!(opener.open_or_alert(&att).await);
    assert!(opener.open_or_alert(&att).await);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read(cache_dir.join("x.pdf")).unwrap(), b"%PDF-1.4");
    let views = host
        .events()
        .into_iter()
        .filter(|e| matches!(e, HostEvent::View { .. }))
        .count();
    assert_eq!(views, 2);
}

#[tokio::test]
async fn reachable_public_url_is_used_without_signing() {
    let (base, _) = spawn_server().await;
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(
        MockStore::new("documents")
            .with_public_base(&format!("{base}/public"))
            .with_objects(vec![("abc123.pdf", "%PDF-1.4")]),
    );
    let host = Arc::new(RecordingHost::new());
    let opener = opener(Platform::Browser, store.clone(), host.clone(), tmp.path());

    let att = AttachmentRef::new("abc123.pdf", "documents/abc123.pdf");
    opener.open(&att).await.unwrap();
    assert!(store.sign_calls().is_empty());
    assert!(matches!(
        host.events().as_slice(),
        [HostEvent::SaveAs { len: 8, .. }]
    ));
}

#[tokio::test]
async fn opaque_key_falls_back_to_display_filename() {
    let (base, _) = spawn_server().await;
    let tmp = tempfile::tempdir().unwrap();
    let store = store_for(&base);
    let host = Arc::new(RecordingHost::new());
    let opener = opener(Platform::Browser, store.clone(), host.clone(), tmp.path());

    let att = AttachmentRef::new("abc123.pdf", "documents/550e8400-e29b-41d4-a716-446655440000");
    opener.open(&att).await.unwrap();
    let keys: Vec<String> = store.sign_calls().into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec!["550e8400-e29b-41d4-a716-446655440000", "abc123.pdf"]
    );
}
