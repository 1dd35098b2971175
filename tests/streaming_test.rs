//! Live output delivery, stderr forwarding and dispatch deadlines.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use webrun::ServerConfig;

mod common;

#[tokio::test]
async fn test_output_arrives_before_child_exits() {
    let server = common::start_server(&[], ServerConfig::default()).await;
    let script = server.script("slow.sh", "echo first\nsleep 2\necho second\n");
    server.write_routes(&[&format!("/slow sh {}", script.display())]);

    let client = common::client();
    client.get(server.url("/reload")).send().await.unwrap();

    let started = Instant::now();
    let mut res = client.get(server.url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let first = tokio::time::timeout(Duration::from_millis(1500), res.chunk())
        .await
        .expect("first line should be streamed before the child exits")
        .unwrap()
        .unwrap();
    assert_eq!(&first[..], b"first\n");
    assert!(started.elapsed() < Duration::from_secs(2));

    let mut rest = Vec::new();
    while let Some(chunk) = res.chunk().await.unwrap() {
        rest.extend_from_slice(&chunk);
    }
    assert_eq!(rest, b"second\n");
}

#[tokio::test]
async fn test_stderr_hidden_by_default() {
    let server = common::start_server(&[], ServerConfig::default()).await;
    let script = server.script("both.sh", "echo out\necho err 1>&2\n");
    server.write_routes(&[&format!("/both sh {}", script.display())]);

    let client = common::client();
    client.get(server.url("/reload")).send().await.unwrap();
    let res = client.get(server.url("/both")).send().await.unwrap();

    assert_eq!(res.text().await.unwrap(), "out\n");
}

#[tokio::test]
async fn test_stderr_follows_stdout_with_show_errors() {
    let config = ServerConfig {
        show_errors: true,
        ..Default::default()
    };
    let server = common::start_server(&[], config).await;
    let script = server.script("both.sh", "echo err1 1>&2\necho out\necho err2 1>&2\n");
    server.write_routes(&[&format!("/both sh {}", script.display())]);

    let client = common::client();
    client.get(server.url("/reload")).send().await.unwrap();
    let res = client.get(server.url("/both")).send().await.unwrap();

    assert_eq!(res.text().await.unwrap(), "out\nerr1\nerr2\n");
}

#[tokio::test]
async fn test_god_mode_shows_stderr() {
    let config = ServerConfig {
        god_mode: true,
        ..Default::default()
    };
    let server = common::start_server(&[], config).await;
    let script = server.script("both.sh", "echo out\necho err 1>&2\n");

    let path = format!("/sh {}", script.display());
    let res = common::client().get(server.url(&path)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "out\nerr\n");
}

#[tokio::test]
async fn test_large_stderr_does_not_stall_stdout() {
    let config = ServerConfig {
        show_errors: true,
        ..Default::default()
    };
    let server = common::start_server(&[], config).await;
    // Far more than a pipe buffer of stderr before stdout is closed.
    let script = server.script(
        "noisy.sh",
        "i=0\nwhile [ $i -lt 5000 ]; do echo 'xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx' 1>&2; i=$((i+1)); done\necho done\n",
    );
    server.write_routes(&[&format!("/noisy sh {}", script.display())]);

    let client = common::client();
    client.get(server.url("/reload")).send().await.unwrap();
    let res = client.get(server.url("/noisy")).send().await.unwrap();

    let body = tokio::time::timeout(Duration::from_secs(20), res.text())
        .await
        .expect("stream should finish")
        .unwrap();
    assert!(body.starts_with("done\n"));
    assert_eq!(body.lines().count(), 5001);
}

#[tokio::test]
async fn test_deadline_ends_hung_dispatch() {
    let config = ServerConfig {
        timeout_secs: 1,
        ..Default::default()
    };
    let server = common::start_server(&["/hang sleep 30"], config).await;

    let started = Instant::now();
    let res = common::client().get(server.url("/hang")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = tokio::time::timeout(Duration::from_secs(10), res.text())
        .await
        .expect("deadline should close the response")
        .unwrap();
    assert!(body.is_empty());
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_concurrent_dispatches_are_independent() {
    let server = common::start_server(&[], ServerConfig::default()).await;
    let slow = server.script("slow.sh", "sleep 2\necho slow\n");
    server.write_routes(&[&format!("/slow sh {}", slow.display()), "/fast echo fast"]);

    let client = common::client();
    client.get(server.url("/reload")).send().await.unwrap();

    let slow_req = tokio::spawn({
        let client = client.clone();
        let url = server.url("/slow");
        async move { client.get(url).send().await.unwrap().text().await.unwrap() }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = Instant::now();
    let fast = client.get(server.url("/fast")).send().await.unwrap().text().await.unwrap();
    assert_eq!(fast, "fast\n");
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_eq!(slow_req.await.unwrap(), "slow\n");
}
