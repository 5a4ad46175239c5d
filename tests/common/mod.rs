//! Shared utilities for integration testing.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use csp_nonce_proxy::{HttpServer, ProxyConfig, Shutdown};

/// Start an origin that answers every connection with the same raw HTTP/1.1
/// response. Returns its address.
pub async fn start_raw_origin(response: impl Into<Vec<u8>>) -> SocketAddr {
    let response: Vec<u8> = response.into();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Raw response with a body and `Connection: close`.
pub fn raw_response(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {status_line}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n{body}", body.len()));
    out
}

/// An address nothing is listening on.
pub async fn dead_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start the proxy in front of `origin`. Keep the returned `Shutdown` alive
/// for as long as the proxy should run.
pub async fn start_proxy(origin: SocketAddr) -> (SocketAddr, Shutdown) {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.origin = format!("http://{origin}");
    config.upstream.connect_timeout_secs = 2;
    config.timeouts.request_secs = 10;

    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Extract the nonce from a `script-src 'nonce-...'` directive.
pub fn policy_nonce(csp: &str) -> &str {
    let start = csp.find("'nonce-").unwrap() + "'nonce-".len();
    let end = start + csp[start..].find('\'').unwrap();
    &csp[start..end]
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}
