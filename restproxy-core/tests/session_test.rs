use common::{UsersClient, config, manager, manager_with_session, record_outcomes};
use httpmock::prelude::*;
use restproxy_core::reqwest::StatusCode;
use restproxy_core::{BoxError, ProxyError, Session};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

mod common;

#[tokio::test]
async fn test_cookies_accumulate_across_calls() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET).path("/session/1").header_missing("cookie");
        then.status(200).header("set-cookie", "a=1; Path=/; HttpOnly");
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/session/2").header("cookie", "a=1");
        then.status(200).header("set-cookie", "b=2");
    });
    let third = server.mock(|when, then| {
        when.method(GET).path("/session/3").header("cookie", "a=1; b=2");
        then.status(200).header("set-cookie", "a=9; Secure");
    });
    let fourth = server.mock(|when, then| {
        when.method(GET).path("/session/4").header("cookie", "a=9; b=2");
        then.status(200);
    });

    let manager = manager(&server);
    let users: UsersClient = manager.create_client(true).unwrap();

    for step in 1..=4 {
        users.step(step).await.unwrap();
    }

    first.assert_calls(1);
    second.assert_calls(1);
    third.assert_calls(1);
    fourth.assert_calls(1);
    assert_eq!(manager.session().cookie("a").as_deref(), Some("9"));
    assert_eq!(manager.session().cookie("b").as_deref(), Some("2"));
}

#[tokio::test]
async fn test_cookies_are_merged_from_failed_responses() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/session/1");
        then.status(403).header("set-cookie", "trace=xyz").body("forbidden");
    });

    let manager = manager(&server);
    let users: UsersClient = manager.create_client(true).unwrap();

    let err = users.step(1).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    assert_eq!(manager.session().cookie("trace").as_deref(), Some("xyz"));
}

#[tokio::test]
async fn test_unauthorized_call_is_retried_after_reauthentication() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.method(GET)
            .path("/api/Users/42/profile")
            .header_missing("authorization");
        then.status(401).body("token expired");
    });
    let accepted = server.mock(|when, then| {
        when.method(GET)
            .path("/api/Users/42/profile")
            .header("authorization", "Bearer fresh");
        then.status(200)
            .json_body(json!({ "id": 42, "name": "Ada", "tags": ["admin", "ops"] }));
    });

    let reauthentications = Arc::new(AtomicUsize::new(0));
    let counter = reauthentications.clone();
    let session = Session::builder(config(&server))
        .with_reauthentication(move |session: Session| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                session.set_header("authorization", "Bearer fresh")?;
                Ok::<(), BoxError>(())
            }
        })
        .build()
        .unwrap();

    let mut manager = manager_with_session(session);
    let outcomes = record_outcomes(&mut manager);
    let users: UsersClient = manager.create_client(true).unwrap();

    let result = users.get_user(42).await.unwrap();

    rejected.assert_calls(1);
    accepted.assert_calls(1);
    assert_eq!(reauthentications.load(Ordering::SeqCst), 1);
    assert_eq!(result.status, Some(StatusCode::OK));
    assert_eq!(result.value.map(|u| u.name), Some("Ada".to_string()));

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].status, Some(StatusCode::OK));
}

#[tokio::test]
async fn test_second_unauthorized_response_is_final() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/Users/42/profile");
        then.status(401).body("still expired");
    });

    let reauthentications = Arc::new(AtomicUsize::new(0));
    let counter = reauthentications.clone();
    let session = Session::builder(config(&server))
        .with_reauthentication(move |_session: Session| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), BoxError>(())
            }
        })
        .build()
        .unwrap();

    let users: UsersClient = manager_with_session(session).create_client(true).unwrap();

    let err = users.get_user(42).await.unwrap_err();

    mock.assert_calls(2);
    assert_eq!(reauthentications.load(Ordering::SeqCst), 1);
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.to_string(), "still expired");
}

#[tokio::test]
async fn test_unauthorized_without_callback_is_not_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/Users/42/profile");
        then.status(401);
    });

    let users: UsersClient = manager(&server).create_client(true).unwrap();

    let err = users.get_user(42).await.unwrap_err();

    mock.assert_calls(1);
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn test_failed_reauthentication_is_not_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/Users/42/profile");
        then.status(401);
    });

    let session = Session::builder(config(&server))
        .with_reauthentication(|_session: Session| async move {
            Err::<(), BoxError>("identity provider unreachable".into())
        })
        .build()
        .unwrap();

    let users: UsersClient = manager_with_session(session).create_client(true).unwrap();

    let err = users.get_user(42).await.unwrap_err();

    mock.assert_calls(1);
    match err {
        ProxyError::Remote(err) => {
            assert_eq!(err.status, Some(StatusCode::UNAUTHORIZED));
            assert_eq!(err.message, "Re-authentication failed");
            assert_eq!(
                err.source.map(|s| s.to_string()).as_deref(),
                Some("identity provider unreachable")
            );
        }
        other => panic!("expected a remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_calls_share_the_cookie_jar() {
    let server = MockServer::start();
    for step in 1..=8u32 {
        server.mock(move |when, then| {
            when.method(GET).path(format!("/session/{step}"));
            then.status(200)
                .header("set-cookie", format!("c{step}={step}"));
        });
    }

    let manager = manager(&server);
    let users: Arc<UsersClient> = Arc::new(manager.create_client(true).unwrap());

    let handles: Vec<_> = (1..=8u32)
        .map(|step| {
            let users = users.clone();
            tokio::spawn(async move { users.step(step).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let jar = manager.session().cookies();
    assert_eq!(jar.len(), 8);
    for step in 1..=8u32 {
        assert_eq!(jar.get(&format!("c{step}")), Some(step.to_string().as_str()));
    }
}
