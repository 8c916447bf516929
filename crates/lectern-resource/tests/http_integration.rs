//! Integration tests for the resource server over a real socket.
//!
//! Requests are written by hand on a `TcpStream` so the request path reaches
//! the server exactly as written, with no client-side normalization of `..`
//! or percent escapes.

use std::fs;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use lectern_resource::application::ResourcePolicy;
use lectern_resource::infrastructure::serve;

struct Server {
    addr: std::net::SocketAddr,
    running: Arc<AtomicBool>,
    _dir: TempDir,
}

/// Root holds `media/clip.mp4` (ten digits); `secret.txt` sits beside it.
async fn start_server() -> Server {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("root");
    fs::create_dir_all(root.join("media")).expect("mkdir");
    fs::write(root.join("media/clip.mp4"), b"0123456789").expect("write");
    fs::write(root.join("media/Song Sheet.pdf"), b"%PDF-1.4").expect("write");
    fs::write(dir.path().join("secret.txt"), b"top secret").expect("write");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let policy = ResourcePolicy::new(&root).expect("policy");
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(serve(listener, policy, Arc::clone(&running)));

    Server {
        addr,
        running,
        _dir: dir,
    }
}

/// Sends one raw HTTP/1.1 GET and returns (status, headers, body).
async fn get(server: &Server, path: &str, extra: &str) -> (u16, String, Vec<u8>) {
    let mut stream = TcpStream::connect(server.addr).await.expect("connect");
    let request =
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n{extra}\r\n");
    stream.write_all(request.as_bytes()).await.expect("write");

    let mut raw = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("response within timeout")
        .expect("read");

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header terminator");
    let head = String::from_utf8_lossy(&raw[..split]).to_string();
    let body = raw[split + 4..].to_vec();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status code");
    (status, head.to_ascii_lowercase(), body)
}

#[tokio::test]
async fn test_whole_file_is_served_with_type_and_length() {
    // Arrange
    let server = start_server().await;

    // Act
    let (status, head, body) = get(&server, "/media/clip.mp4", "").await;

    // Assert
    assert_eq!(status, 200);
    assert!(head.contains("content-type: video/mp4"));
    assert!(head.contains("content-length: 10"));
    assert!(head.contains("accept-ranges: bytes"));
    assert_eq!(body, b"0123456789");
}

#[tokio::test]
async fn test_range_request_returns_partial_content() {
    let server = start_server().await;

    let (status, head, body) = get(&server, "/media/clip.mp4", "Range: bytes=3-6\r\n").await;

    assert_eq!(status, 206);
    assert!(head.contains("content-range: bytes 3-6/10"));
    assert_eq!(body, b"3456");
}

#[tokio::test]
async fn test_suffix_range_returns_tail() {
    let server = start_server().await;

    let (status, _, body) = get(&server, "/media/clip.mp4", "Range: bytes=-3\r\n").await;

    assert_eq!(status, 206);
    assert_eq!(body, b"789");
}

#[tokio::test]
async fn test_malformed_range_serves_whole_file() {
    let server = start_server().await;

    let (status, _, body) = get(&server, "/media/clip.mp4", "Range: bytes=9-2\r\n").await;

    assert_eq!(status, 200);
    assert_eq!(body, b"0123456789");
}

#[tokio::test]
async fn test_percent_encoded_name_is_served() {
    let server = start_server().await;

    let (status, head, _) = get(&server, "/media/Song%20Sheet.pdf", "").await;

    assert_eq!(status, 200);
    assert!(head.contains("content-type: application/pdf"));
}

#[tokio::test]
async fn test_traversal_is_forbidden_without_leaking_content() {
    let server = start_server().await;

    for path in [
        "/../secret.txt",
        "/media/../../secret.txt",
        "/%2e%2e/secret.txt",
        "/media/%2E%2E/%2e%2e/secret.txt",
        "/media/..%5c..%5csecret.txt",
    ] {
        let (status, _, body) = get(&server, path, "").await;
        assert_eq!(status, 403, "{path}");
        assert_eq!(body, b"Forbidden", "{path}");
    }
}

#[tokio::test]
async fn test_missing_file_and_directory_are_not_found() {
    let server = start_server().await;

    let (missing, _, body) = get(&server, "/media/nope.mp4", "").await;
    let (directory, _, _) = get(&server, "/media", "").await;
    let (root, _, _) = get(&server, "/", "").await;
    let (below_file, _, below_body) = get(&server, "/media/clip.mp4/x", "").await;

    assert_eq!(missing, 404);
    assert_eq!(below_file, 404);
    assert_eq!(below_body, b"Not Found");
    assert_eq!(body, b"Not Found");
    assert_eq!(directory, 404);
    assert_eq!(root, 404);
}

#[tokio::test]
async fn test_server_stops_when_flag_cleared() {
    // Arrange
    let server = start_server().await;

    // Act
    server.running.store(false, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(600)).await;

    // Assert
    assert!(TcpStream::connect(server.addr).await.is_err());
}
