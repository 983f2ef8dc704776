mod common;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::{fixture_dir, not_found_response, ok_head, write_file};
use statik::http::connection::{Connection, ConnectionContext};
use statik::root::DocumentRoot;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

const PIPE_SIZE: usize = 64 * 1024;

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

async fn context(root: &Path, confine: bool) -> ConnectionContext {
    ConnectionContext {
        root: DocumentRoot::new(root, confine).await.unwrap(),
        max_request_bytes: 1024,
        max_response_bytes: 1024 * 1024,
        io_timeout: Some(Duration::from_secs(5)),
    }
}

fn spawn_connection(ctx: ConnectionContext) -> (DuplexStream, JoinHandle<anyhow::Result<()>>) {
    let (client, server) = tokio::io::duplex(PIPE_SIZE);
    let task = tokio::spawn(async move {
        let mut conn = Connection::new(server, peer(), Arc::new(ctx));
        conn.run().await
    });
    (client, task)
}

async fn exchange(ctx: ConnectionContext, request: &[u8]) -> Vec<u8> {
    let (mut client, task) = spawn_connection(ctx);
    client.write_all(request).await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    task.await.unwrap().unwrap();
    response
}

#[tokio::test]
async fn test_serves_existing_file() {
    let dir = fixture_dir("conn-index");
    write_file(&dir, "index.html", b"<h1>hi</h1>");

    let response = exchange(context(&dir, true).await, b"GET /index.html HTTP/1.1\r\n\r\n").await;

    assert_eq!(
        response,
        b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<h1>hi</h1>".to_vec()
    );
}

#[tokio::test]
async fn test_missing_file_gets_fixed_404() {
    let dir = fixture_dir("conn-missing");

    let response = exchange(context(&dir, true).await, b"GET /missing.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(response, not_found_response());
}

#[tokio::test]
async fn test_404_does_not_depend_on_path() {
    let dir = fixture_dir("conn-missing-any");

    let a = exchange(context(&dir, true).await, b"GET /nope.html HTTP/1.1\r\n\r\n").await;
    let b = exchange(context(&dir, true).await, b"GET /x/y/z%20q.png HTTP/1.1\r\n\r\n").await;

    assert_eq!(a, b);
}

#[tokio::test]
async fn test_percent_encoded_path_is_decoded_before_lookup() {
    let dir = fixture_dir("conn-space");
    write_file(&dir, "a b.txt", b"spaced");

    let response = exchange(context(&dir, true).await, b"GET /a%20b.txt HTTP/1.1\r\n\r\n").await;

    let mut expected = ok_head("text/plain");
    expected.extend_from_slice(b"spaced");
    assert_eq!(response, expected);
}

#[tokio::test]
async fn test_nested_file_and_unknown_extension() {
    let dir = fixture_dir("conn-nested");
    write_file(&dir, "assets/data.bin", &[0, 1, 2, 255]);

    let response = exchange(context(&dir, true).await, b"GET /assets/data.bin HTTP/1.1\r\n\r\n").await;

    let mut expected = ok_head("application/octet-stream");
    expected.extend_from_slice(&[0, 1, 2, 255]);
    assert_eq!(response, expected);
}

#[tokio::test]
async fn test_large_file_is_sent_completely() {
    let dir = fixture_dir("conn-large");
    let body: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    write_file(&dir, "big.pdf", &body);

    let response = exchange(context(&dir, true).await, b"GET /big.pdf HTTP/1.1\r\n\r\n").await;

    let head = ok_head("application/pdf");
    assert_eq!(response.len(), head.len() + body.len());
    assert_eq!(&response[head.len()..], body.as_slice());
}

#[tokio::test]
async fn test_post_request_is_dropped_silently() {
    let dir = fixture_dir("conn-post");
    write_file(&dir, "index.html", b"x");

    let response = exchange(context(&dir, true).await, b"POST /index.html HTTP/1.1\r\n\r\n").await;

    assert!(response.is_empty());
}

#[tokio::test]
async fn test_missing_slash_is_dropped_silently() {
    let dir = fixture_dir("conn-noslash");

    let response = exchange(context(&dir, true).await, b"GET index.html HTTP/1.1\r\n\r\n").await;

    assert!(response.is_empty());
}

#[tokio::test]
async fn test_empty_connection_is_closed() {
    let dir = fixture_dir("conn-empty");
    let (mut client, task) = spawn_connection(context(&dir, true).await);

    client.shutdown().await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    assert!(response.is_empty());
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_request_split_across_writes() {
    let dir = fixture_dir("conn-split");
    write_file(&dir, "style.css", b"body{}");
    let (mut client, task) = spawn_connection(context(&dir, true).await);

    client.write_all(b"GET /sty").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    client.write_all(b"le.css HTTP/1.1\r\n\r\n").await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    task.await.unwrap().unwrap();

    let mut expected = ok_head("text/css");
    expected.extend_from_slice(b"body{}");
    assert_eq!(response, expected);
}

#[tokio::test]
async fn test_unterminated_line_is_parsed_at_eof() {
    let dir = fixture_dir("conn-eof");
    write_file(&dir, "note.txt", b"n");
    let (mut client, task) = spawn_connection(context(&dir, true).await);

    client.write_all(b"GET /note.txt HTTP/1.1").await.unwrap();
    client.shutdown().await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    task.await.unwrap().unwrap();

    assert!(response.starts_with(b"HTTP/1.1 200 OK\r\n"));
}

#[tokio::test]
async fn test_request_line_over_limit_is_dropped() {
    let dir = fixture_dir("conn-long");
    let mut request = b"GET /".to_vec();
    request.extend(std::iter::repeat_n(b'a', 2000));
    request.extend_from_slice(b".txt HTTP/1.1\r\n\r\n");

    let response = exchange(context(&dir, true).await, &request).await;

    assert!(response.is_empty());
}

#[tokio::test]
async fn test_file_over_response_limit_gets_500() {
    let dir = fixture_dir("conn-toolarge");
    write_file(&dir, "huge.txt", &vec![b'z'; 8192]);
    let mut ctx = context(&dir, true).await;
    ctx.max_response_bytes = 4096;

    let response = exchange(ctx, b"GET /huge.txt HTTP/1.1\r\n\r\n").await;

    assert!(response.starts_with(b"HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/html\r\n\r\n"));
    assert!(response.len() <= 4096);
}

#[tokio::test]
async fn test_directory_request_gets_404() {
    let dir = fixture_dir("conn-dir");
    std::fs::create_dir_all(dir.join("sub")).unwrap();

    let response = exchange(context(&dir, true).await, b"GET /sub HTTP/1.1\r\n\r\n").await;

    assert_eq!(response, not_found_response());
}

#[tokio::test]
async fn test_traversal_outside_root_gets_404_when_confined() {
    let dir = fixture_dir("conn-traversal");
    write_file(&dir, "secret.txt", b"secret");
    let site = dir.join("site");
    std::fs::create_dir_all(&site).unwrap();

    let plain = exchange(context(&site, true).await, b"GET /../secret.txt HTTP/1.1\r\n\r\n").await;
    let encoded = exchange(
        context(&site, true).await,
        b"GET /%2e%2e%2fsecret.txt HTTP/1.1\r\n\r\n",
    )
    .await;

    assert_eq!(plain, not_found_response());
    assert_eq!(encoded, not_found_response());
}

#[tokio::test]
async fn test_absolute_path_gets_404_when_confined() {
    let dir = fixture_dir("conn-absolute");
    let outside = write_file(&dir, "outside.txt", b"o");
    let site = dir.join("site");
    std::fs::create_dir_all(&site).unwrap();

    let request = format!("GET /{} HTTP/1.1\r\n\r\n", outside.display());
    let response = exchange(context(&site, true).await, request.as_bytes()).await;

    assert_eq!(response, not_found_response());
}

#[tokio::test]
async fn test_traversal_is_served_when_not_confined() {
    let dir = fixture_dir("conn-unconfined");
    write_file(&dir, "secret.txt", b"secret");
    let site = dir.join("site");
    std::fs::create_dir_all(&site).unwrap();

    let response = exchange(context(&site, false).await, b"GET /../secret.txt HTTP/1.1\r\n\r\n").await;

    let mut expected = ok_head("text/plain");
    expected.extend_from_slice(b"secret");
    assert_eq!(response, expected);
}

#[tokio::test]
async fn test_idle_peer_times_out() {
    let dir = fixture_dir("conn-timeout");
    let mut ctx = context(&dir, true).await;
    ctx.io_timeout = Some(Duration::from_millis(50));
    let (client, task) = spawn_connection(ctx);

    let result = task.await.unwrap();

    assert!(result.is_err());
    drop(client);
}
