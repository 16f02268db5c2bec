#![allow(dead_code)]

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

async fn bind_local() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let (listener, port) = bind_local().await;
    drop(listener);
    port
}

/// Minimal HTTP server: waits for a request, sleeps `delay`, replies.
/// Every request received is forwarded on the returned channel.
pub async fn http_server(delay: Duration) -> (u16, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (listener, port) = bind_local().await;
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1024];
                let n = sock.read(&mut buf).await.unwrap_or(0);
                let _ = tx.send(buf[..n].to_vec());
                tokio::time::sleep(delay).await;
                let _ = sock
                    .write_all(b"HTTP/1.0 200 OK\r\nServer: test-gw\r\n\r\nok")
                    .await;
            });
        }
    });
    (port, rx)
}

/// Service that greets first, like SSH or Telnet.
pub async fn greeting_server(greeting: &'static [u8]) -> u16 {
    let (listener, port) = bind_local().await;
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = sock.write_all(greeting).await;
                tokio::time::sleep(Duration::from_secs(1)).await;
            });
        }
    });
    port
}

/// Accepts and holds the connection without ever writing.
pub async fn silent_server() -> u16 {
    let (listener, port) = bind_local().await;
    tokio::spawn(async move {
        while let Ok((sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                drop(sock);
            });
        }
    });
    port
}

/// Reads whatever the client sends first (e.g. a TLS ClientHello), then hangs up.
pub async fn hangup_server() -> u16 {
    let (listener, port) = bind_local().await;
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 2048];
                let _ = sock.read(&mut buf).await;
            });
        }
    });
    port
}

/// HTTP behind TLS with the self-signed `gateway.test` identity from `tests/fixtures`.
pub async fn tls_http_server() -> u16 {
    let cert = include_bytes!("fixtures/gateway-test.crt");
    let key = include_bytes!("fixtures/gateway-test.key");
    let identity = native_tls::Identity::from_pkcs8(cert, key).expect("test identity");
    let acceptor = native_tls::TlsAcceptor::new(identity).expect("tls acceptor");
    let acceptor = tokio_native_tls::TlsAcceptor::from(acceptor);

    let (listener, port) = bind_local().await;
    tokio::spawn(async move {
        while let Ok((sock, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(sock).await else {
                    return;
                };
                let mut buf = vec![0u8; 1024];
                let _ = tls.read(&mut buf).await;
                let _ = tls
                    .write_all(b"HTTP/1.0 200 OK\r\nServer: test-gw-tls\r\n\r\nok")
                    .await;
                let _ = tls.flush().await;
            });
        }
    });
    port
}
