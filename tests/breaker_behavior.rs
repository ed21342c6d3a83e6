//! Circuit breaker behavior through the full HTTP stack.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

mod common;
use common::{start_service, start_upstream, test_config, ALICE_USERS_JSON};

#[tokio::test]
async fn test_breaker_opens_and_short_circuits() {
    let directory = start_upstream(|_req| async move { (200, ALICE_USERS_JSON.to_string()) }).await;

    let hits = Arc::new(AtomicU32::new(0));
    let posts_hits = hits.clone();
    let posts = start_upstream(move |_req| {
        let hits = posts_hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            (500, "down".to_string())
        }
    })
    .await;

    let mut config = test_config(directory, posts);
    config.breaker.sliding_window_size = 3;
    config.breaker.failure_rate_threshold = 100;
    config.breaker.wait_duration_in_open_state_ms = 60_000;
    config.breaker.permitted_calls_in_half_open_state = 1;

    let (addr, _shutdown) = start_service(config).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/feed/all", addr);

    // Three failures fill the window and trip the breaker; each one still
    // degrades to the fallback with 200.
    for _ in 0..3 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body[0]["profileName"], "Fall Back Sample");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    // Open: the next call is short-circuited without network I/O.
    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(hits.load(Ordering::SeqCst), 3, "open breaker must not attempt the call");

    // Operational visibility: posts breaker open, directory untouched.
    let health: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "up");
    assert_eq!(health["breakers"]["posts"], "open");
    assert_eq!(health["breakers"]["directory"], "closed");
}

#[tokio::test]
async fn test_breaker_recovers_through_half_open() {
    let directory = start_upstream(|_req| async move { (200, ALICE_USERS_JSON.to_string()) }).await;

    let healthy = Arc::new(AtomicBool::new(false));
    let hits = Arc::new(AtomicU32::new(0));
    let posts_healthy = healthy.clone();
    let posts_hits = hits.clone();
    let posts = start_upstream(move |_req| {
        let healthy = posts_healthy.clone();
        let hits = posts_hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            if healthy.load(Ordering::SeqCst) {
                (200, r#"[{"id":10,"content":"hi","userId":1}]"#.to_string())
            } else {
                (503, "down".to_string())
            }
        }
    })
    .await;

    let mut config = test_config(directory, posts);
    config.breaker.sliding_window_size = 2;
    config.breaker.failure_rate_threshold = 100;
    config.breaker.wait_duration_in_open_state_ms = 300;
    config.breaker.permitted_calls_in_half_open_state = 1;

    let (addr, _shutdown) = start_service(config).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/feed/all", addr);

    // Trip the breaker.
    for _ in 0..2 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // Short-circuited while open.
    let _ = client.get(&url).send().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // Backend recovers, cool-down elapses.
    healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(400)).await;

    let health: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["breakers"]["posts"], "half_open");

    // The trial call goes through, succeeds, and closes the breaker.
    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["profileName"], "Alice A");
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    let health: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["breakers"]["posts"], "closed");
}

/// When one upstream fails, the concurrent fan-out drops the sibling
/// fetch mid-flight. Trials cancelled that way must hand their half-open
/// permit back, or the breaker would short-circuit forever once the
/// trial budget is spent.
#[tokio::test]
async fn test_cancelled_trials_do_not_exhaust_half_open_permits() {
    let dir_healthy = Arc::new(AtomicBool::new(true));
    let directory_healthy = dir_healthy.clone();
    let directory = start_upstream(move |_req| {
        let healthy = directory_healthy.clone();
        async move {
            if healthy.load(Ordering::SeqCst) {
                (200, ALICE_USERS_JSON.to_string())
            } else {
                (500, "down".to_string())
            }
        }
    })
    .await;

    let posts_healthy = Arc::new(AtomicBool::new(false));
    let posts_flag = posts_healthy.clone();
    let posts = start_upstream(move |_req| {
        let healthy = posts_flag.clone();
        async move {
            if healthy.load(Ordering::SeqCst) {
                // Slow enough that a fast directory failure always wins
                // the race and cancels this response mid-flight.
                tokio::time::sleep(Duration::from_millis(150)).await;
                (200, r#"[{"id":10,"content":"hi","userId":1}]"#.to_string())
            } else {
                (503, "down".to_string())
            }
        }
    })
    .await;

    let mut config = test_config(directory, posts);
    config.breaker.sliding_window_size = 2;
    config.breaker.failure_rate_threshold = 100;
    config.breaker.wait_duration_in_open_state_ms = 300;
    config.breaker.permitted_calls_in_half_open_state = 1;

    let (addr, _shutdown) = start_service(config).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/feed/all", addr);

    // Trip the posts breaker.
    for _ in 0..2 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }

    // Posts recovers but the directory goes down; once the cool-down
    // elapses, every feed call starts a posts trial that gets cancelled
    // when the directory fails first.
    posts_healthy.store(true, Ordering::SeqCst);
    dir_healthy.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(400)).await;

    for _ in 0..2 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body[0]["profileName"], "Fall Back Sample");
    }

    // Both upstreams healthy again; after the directory's cool-down the
    // posts trial must still be allowed to run, succeed, and close the
    // breaker.
    dir_healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(400)).await;

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["profileName"], "Alice A");

    let health: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["breakers"]["posts"], "closed");
    assert_eq!(health["breakers"]["directory"], "closed");
}

#[tokio::test]
async fn test_user_endpoint_degrades_without_tripping_on_404() {
    let directory = start_upstream(|_req| async move { (404, "{}".to_string()) }).await;
    let posts = start_upstream(|_req| async move { (200, "[]".to_string()) }).await;

    let mut config = test_config(directory, posts);
    config.breaker.sliding_window_size = 2;
    config.breaker.failure_rate_threshold = 100;

    let (addr, _shutdown) = start_service(config).await;
    let client = reqwest::Client::new();

    // Repeated 404s are client errors, not dependency failures; the
    // directory breaker must stay closed.
    for _ in 0..5 {
        let res = client
            .get(format!("http://{}/feed/user/ghost", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 404);
    }

    let health: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["breakers"]["directory"], "closed");
}
