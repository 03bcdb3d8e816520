//! One-shot HTTP stub used by the outbound client tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// What the stub received
#[derive(Debug)]
pub struct CapturedRequest {
    /// Request line plus headers
    pub head: String,
    pub body: String,
}

pub struct StubServer {
    pub url: String,
    captured: oneshot::Receiver<CapturedRequest>,
}

impl StubServer {
    pub async fn request(self) -> CapturedRequest {
        self.captured.await.expect("stub server saw no request")
    }
}

/// Accept a single connection, answer it with `status` and `body`, and hand
/// back the request that came in.
pub async fn serve_once(status: &str, body: String) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
    let addr = listener.local_addr().expect("stub server address");
    let status = status.to_string();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write response");
        let _ = socket.shutdown().await;
        let _ = tx.send(request);
    });

    StubServer {
        url: format!("http://{addr}"),
        captured: rx,
    }
}

async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        if let Some(end) = find_header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let body_start = end + 4;
            let length = content_length(&head);
            if buf.len() >= body_start + length {
                let body = String::from_utf8_lossy(&buf[body_start..body_start + length]).to_string();
                return CapturedRequest { head, body };
            }
        }

        let n = socket.read(&mut chunk).await.expect("read request");
        if n == 0 {
            return CapturedRequest {
                head: String::from_utf8_lossy(&buf).to_string(),
                body: String::new(),
            };
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
