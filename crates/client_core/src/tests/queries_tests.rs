use super::*;
use crate::test_support::{api_with_tokens, ok, spawn_api, tokens, worker_json};
use axum::{
    extract::State,
    http::StatusCode as HttpStatus,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex as StdMutex,
    },
    time::Duration,
};
use uuid::Uuid;

#[derive(Clone, Default)]
struct Backend {
    workers: Arc<StdMutex<Vec<Value>>>,
    worker_lists: Arc<AtomicUsize>,
    me_hits: Arc<AtomicUsize>,
    setting_value: Arc<StdMutex<Value>>,
}

async fn list_workers(State(backend): State<Backend>) -> Json<Value> {
    backend.worker_lists.fetch_add(1, Ordering::SeqCst);
    let items = backend.workers.lock().expect("workers lock").clone();
    let total = items.len();
    ok(json!({ "items": items, "total": total, "page": 1, "limit": 20 }))
}

async fn create_worker(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@x.com" {
        return (
            HttpStatus::CONFLICT,
            Json(json!({ "message": "Email already registered", "statusCode": 409 })),
        )
            .into_response();
    }
    let worker = worker_json(
        &Uuid::new_v4().to_string(),
        body["firstName"].as_str().unwrap_or_default(),
        body["lastName"].as_str().unwrap_or_default(),
        body["email"].as_str().unwrap_or_default(),
    );
    backend
        .workers
        .lock()
        .expect("workers lock")
        .push(worker.clone());
    ok(worker).into_response()
}

async fn me(State(backend): State<Backend>) -> Json<Value> {
    backend.me_hits.fetch_add(1, Ordering::SeqCst);
    ok(json!({ "id": Uuid::new_v4(), "email": "ana@x.com", "role": "COMPANY" }))
}

async fn list_settings(State(backend): State<Backend>) -> Json<Value> {
    let value = backend.setting_value.lock().expect("setting lock").clone();
    ok(json!([{ "key": "max_invites", "value": value }]))
}

async fn update_setting(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    *backend.setting_value.lock().expect("setting lock") = body["value"].clone();
    ok(json!({ "key": "max_invites", "value": body["value"] }))
}

async fn talentree_with_backend() -> (Talentree, Backend) {
    let backend = Backend::default();
    *backend.setting_value.lock().expect("setting lock") = json!(10);
    let app = Router::new()
        .route("/workers", get(list_workers).post(create_worker))
        .route("/auth/me", get(me))
        .route("/settings", get(list_settings))
        .route("/settings/:key", put(update_setting))
        .with_state(backend.clone());
    let base = spawn_api(app).await;
    let (api, _, _) = api_with_tokens(&base, Some(tokens("a1", "r1")));
    (
        Talentree::new(api, QueryCache::new(Duration::from_secs(300))),
        backend,
    )
}

fn new_worker(email: &str) -> CreateWorkerRequest {
    CreateWorkerRequest {
        first_name: "Juan".to_string(),
        last_name: "Pérez".to_string(),
        email: email.to_string(),
        ..CreateWorkerRequest::default()
    }
}

#[tokio::test]
async fn creating_a_worker_invalidates_the_worker_list() {
    let (talentree, backend) = talentree_with_backend().await;
    let query = WorkerQuery::default();

    let before = talentree.workers(&query).await.expect("first list");
    assert!(before.items.is_empty());
    talentree.workers(&query).await.expect("cached list");
    assert_eq!(backend.worker_lists.load(Ordering::SeqCst), 1);

    talentree
        .create_worker(&new_worker("juan@x.com"))
        .await
        .expect("create");

    let after = talentree.workers(&query).await.expect("list after create");
    assert_eq!(after.items.len(), 1);
    assert_eq!(after.items[0].email, "juan@x.com");
    assert_eq!(backend.worker_lists.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_mutations_keep_the_cache() {
    let (talentree, backend) = talentree_with_backend().await;
    let query = WorkerQuery::default();
    talentree.workers(&query).await.expect("first list");

    let err = talentree
        .create_worker(&new_worker("taken@x.com"))
        .await
        .expect_err("conflict");

    assert_eq!(err.display_message(), "Email already registered");
    assert!(
        talentree
            .cache()
            .is_cached(&QueryKey::with_params(WORKERS, &query).expect("key"))
            .await
    );
    talentree.workers(&query).await.expect("still cached");
    assert_eq!(backend.worker_lists.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn updating_a_setting_invalidates_settings() {
    let (talentree, _) = talentree_with_backend().await;

    let before = talentree.settings().await.expect("settings");
    assert_eq!(before[0].value, json!(10));

    talentree
        .update_setting("max_invites", json!(25))
        .await
        .expect("update");

    let after = talentree.settings().await.expect("settings after update");
    assert_eq!(after[0].value, json!(25));
}

#[tokio::test]
async fn current_user_is_fetched_once_until_invalidated() {
    let (talentree, backend) = talentree_with_backend().await;

    let (a, b) = tokio::join!(talentree.current_user(), talentree.current_user());
    assert_eq!(a.expect("a").email, b.expect("b").email);
    assert_eq!(backend.me_hits.load(Ordering::SeqCst), 1);

    talentree.cache().invalidate(CURRENT_USER).await;
    talentree.current_user().await.expect("refetch");
    assert_eq!(backend.me_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn other_resources_survive_a_worker_mutation() {
    let (talentree, backend) = talentree_with_backend().await;
    talentree.current_user().await.expect("me");

    talentree
        .create_worker(&new_worker("ana@x.com"))
        .await
        .expect("create");
    talentree.current_user().await.expect("me again");

    assert_eq!(backend.me_hits.load(Ordering::SeqCst), 1);
}
