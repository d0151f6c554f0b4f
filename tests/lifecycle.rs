//! End-to-end runs over a real socket: serve, shut down, drain, report.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use ding_dong::metrics::report;
use ding_dong::{lifecycle, Config, MetricsSnapshot};

async fn start(config: Config) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<MetricsSnapshot>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(lifecycle::serve(listener, config, async move {
        let _ = rx.await;
    }));

    (addr, tx, handle)
}

/// One HTTP/1.1 exchange on a fresh connection; returns the raw response.
async fn send(addr: SocketAddr, method: &str, path: &str, body: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let head = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes()).await.unwrap();
    stream.write_all(body).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_traffic_then_shutdown() {
    let config = Config {
        workers: 4,
        queue_size: 1_000,
        ..Config::default()
    };
    let (addr, shutdown, handle) = start(config).await;

    let resp = send(addr, "GET", "/health", b"").await;
    assert!(resp.starts_with("HTTP/1.1 200 OK"));
    assert!(resp.to_ascii_lowercase().contains("content-length: 0"));

    let mut expected_bytes = 0u64;
    for len in [10usize, 200, 3_000, 40_000] {
        let body = vec![b'p'; len];
        let resp = send(addr, "POST", "/submit", &body).await;
        assert!(resp.starts_with("HTTP/1.1 200 OK"));
        expected_bytes += len as u64;
    }
    send(addr, "PUT", "/dump", b"hello dump").await;
    expected_bytes += 10;

    shutdown.send(()).unwrap();
    let snapshot = handle.await.unwrap();

    assert_eq!(snapshot.total_requests, 6);
    assert_eq!(snapshot.total_body_size, expected_bytes);
    assert_eq!(snapshot.dropped_bodies, 0);
    assert_eq!(snapshot.method_total(), 6);

    let counts: Vec<_> = snapshot
        .methods
        .iter()
        .map(|m| (m.method.as_str(), m.count))
        .collect();
    assert_eq!(counts, [("POST", 4), ("GET", 1), ("PUT", 1)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zero_workers_keep_backlog_and_count_drops() {
    let config = Config {
        workers: 0,
        queue_size: 2,
        ..Config::default()
    };
    let (addr, shutdown, handle) = start(config).await;

    for _ in 0..3 {
        let resp = send(addr, "POST", "/", b"body").await;
        assert!(resp.starts_with("HTTP/1.1 200 OK"));
    }

    shutdown.send(()).unwrap();
    let snapshot = handle.await.unwrap();

    assert_eq!(snapshot.total_requests, 3);
    assert_eq!(snapshot.dropped_bodies, 1);
    // Nothing consumed the two retained bodies
    assert_eq!(snapshot.total_body_size, 0);

    let text = report::render_text(&snapshot);
    assert!(text.contains("Dropped Bodies:     1 (33.33% of requests)"));
    assert!(text.contains("Average Body Size:  0 KB (no request bodies)"));
}

#[tokio::test]
async fn listener_refuses_connections_after_shutdown() {
    let (addr, shutdown, handle) = start(Config::default()).await;

    send(addr, "GET", "/", b"").await;
    shutdown.send(()).unwrap();
    let snapshot = handle.await.unwrap();
    assert_eq!(snapshot.total_requests, 1);

    assert!(TcpStream::connect(addr).await.is_err());
}
