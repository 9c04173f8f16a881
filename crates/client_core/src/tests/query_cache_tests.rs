use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counting_fetch(
    calls: &Arc<AtomicUsize>,
    value: &'static str,
) -> impl Future<Output = ClientResult<String>> {
    let calls = Arc::clone(calls);
    async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(value.to_string())
    }
}

#[tokio::test]
async fn second_read_is_served_from_cache() {
    let cache = QueryCache::new(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));

    let first = cache
        .fetch(QueryKey::new("workers"), || counting_fetch(&calls, "a"))
        .await
        .expect("first");
    let second = cache
        .fetch(QueryKey::new("workers"), || counting_fetch(&calls, "b"))
        .await
        .expect("second");

    assert_eq!(first.as_str(), "a");
    assert_eq!(second.as_str(), "a");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_reads_share_one_fetch() {
    let cache = QueryCache::new(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));

    let (a, b) = tokio::join!(
        cache.fetch(QueryKey::new("settings"), || counting_fetch(&calls, "x")),
        cache.fetch(QueryKey::new("settings"), || counting_fetch(&calls, "y")),
    );

    assert_eq!(a.expect("a"), b.expect("b"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn params_are_part_of_the_key() {
    #[derive(Serialize)]
    struct Page {
        page: u32,
    }

    let cache = QueryCache::new(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let page_one = QueryKey::with_params("workers", &Page { page: 1 }).expect("key");
    let page_two = QueryKey::with_params("workers", &Page { page: 2 }).expect("key");

    cache
        .fetch(page_one.clone(), || counting_fetch(&calls, "p1"))
        .await
        .expect("p1");
    cache
        .fetch(page_two, || counting_fetch(&calls, "p2"))
        .await
        .expect("p2");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(page_one.to_string(), r#"workers?{"page":1}"#);
}

#[tokio::test]
async fn invalidation_forces_refetch_for_every_key_of_the_resource() {
    let cache = QueryCache::new(Duration::from_secs(60));
    let calls = Arc::new(AtomicUsize::new(0));
    let list = QueryKey::with_params("workers", &serde_json::json!({ "page": 1 })).expect("key");
    let other = QueryKey::new("settings");

    cache
        .fetch(list.clone(), || counting_fetch(&calls, "old"))
        .await
        .expect("list");
    cache
        .fetch(other.clone(), || counting_fetch(&calls, "s"))
        .await
        .expect("settings");

    cache.invalidate("workers").await;
    assert!(!cache.is_cached(&list).await);
    assert!(cache.is_cached(&other).await);

    let refreshed = cache
        .fetch(list, || counting_fetch(&calls, "new"))
        .await
        .expect("refetch");
    assert_eq!(refreshed.as_str(), "new");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failed_fetches_are_not_cached() {
    let cache = QueryCache::new(Duration::from_secs(60));

    let err = cache
        .fetch(QueryKey::new("audit"), || async {
            Err::<String, _>(ClientError::validation("boom"))
        })
        .await
        .expect_err("first fetch fails");
    assert_eq!(err.to_string(), "boom");
    assert!(!cache.is_cached(&QueryKey::new("audit")).await);

    let value = cache
        .fetch(QueryKey::new("audit"), || async { Ok("ok".to_string()) })
        .await
        .expect("second fetch");
    assert_eq!(value.as_str(), "ok");
}

#[tokio::test]
async fn stale_entries_are_refetched() {
    let cache = QueryCache::new(Duration::ZERO);
    let calls = Arc::new(AtomicUsize::new(0));

    cache
        .fetch(QueryKey::new("reports"), || counting_fetch(&calls, "1"))
        .await
        .expect("first");
    cache
        .fetch(QueryKey::new("reports"), || counting_fetch(&calls, "2"))
        .await
        .expect("second");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn mismatched_types_for_one_key_are_reported() {
    let cache = QueryCache::new(Duration::from_secs(60));
    cache
        .fetch(QueryKey::new("settings"), || async { Ok(1_u32) })
        .await
        .expect("u32");

    let err = cache
        .fetch(QueryKey::new("settings"), || async { Ok("text".to_string()) })
        .await
        .expect_err("type mismatch");
    assert!(matches!(err, ClientError::CacheType(_)));
}
