//! Minimal HTTP endpoint exposing the runtime configuration.
//!
//! One connection at a time, one request per connection. The request is
//! parsed just enough to recover the method, the path and the body; the
//! endpoint semantics live in `node_core::rest`. CORS headers go on every
//! response so browser-hosted dashboards can call the endpoint directly.

use core::fmt::Write as _;

use embassy_net::{tcp::TcpSocket, Stack};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Duration;
use embedded_io_async::Write;
use heapless::String;
use log::{info, warn};

use node_core::config::RuntimeConfig;
use node_core::rest::{self, Method};

use crate::config::CONFIG;
use crate::constants::{HTTP_REQUEST_MAX, HTTP_SOCKET_TIMEOUT_SECS, HTTP_TCP_BUFFER_SIZE};

const HEADER_MAX: usize = 256;

const CORS_HEADERS: &str = "Access-Control-Allow-Origin: *\r\n\
    Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
    Access-Control-Allow-Headers: Content-Type\r\n";

#[embassy_executor::task]
pub async fn httpd_task(
    stack: Stack<'static>,
    cfg: &'static Mutex<CriticalSectionRawMutex, RuntimeConfig>,
) {
    let mut rx_buffer = [0; HTTP_TCP_BUFFER_SIZE];
    let mut tx_buffer = [0; HTTP_TCP_BUFFER_SIZE];
    let mut request = [0; HTTP_REQUEST_MAX];

    info!("httpd: listening on port {}", CONFIG.http_port);
    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(HTTP_SOCKET_TIMEOUT_SECS)));

        if let Err(e) = socket.accept(CONFIG.http_port).await {
            warn!("httpd: accept failed: {:?}", e);
            continue;
        }

        handle_connection(&mut socket, cfg, &mut request).await;

        socket.close();
        let _ = socket.flush().await;
    }
}

async fn handle_connection(
    socket: &mut TcpSocket<'_>,
    cfg: &Mutex<CriticalSectionRawMutex, RuntimeConfig>,
    buf: &mut [u8],
) {
    let Ok(request) = read_request(socket, buf).await else {
        let _ = write_reply(socket, 400, "{\"error\":\"malformed request\"}").await;
        return;
    };

    let reply = match route(&request) {
        Route::Config(method) => {
            let mut cfg = cfg.lock().await;
            rest::handle_request(&mut cfg, method, request.body)
        }
        Route::NotFound => rest::HttpReply {
            status: 404,
            body: String::new(),
        },
        Route::MethodNotAllowed => rest::HttpReply {
            status: 405,
            body: String::new(),
        },
    };

    if let Err(e) = write_reply(socket, reply.status, &reply.body).await {
        warn!("httpd: write failed: {:?}", e);
    }
}

struct Request<'a> {
    method: &'a str,
    path: &'a str,
    body: Option<&'a [u8]>,
}

enum Route {
    Config(Method),
    NotFound,
    MethodNotAllowed,
}

fn route(request: &Request<'_>) -> Route {
    // Ignore any query string when matching the path.
    let path = request.path.split('?').next().unwrap_or("");
    if path != CONFIG.http_path {
        return Route::NotFound;
    }
    match request.method {
        "OPTIONS" => Route::Config(Method::Options),
        "GET" => Route::Config(Method::Get),
        "POST" => Route::Config(Method::Post),
        _ => Route::MethodNotAllowed,
    }
}

/// Reads one request into `buf`: headers first, then as many body bytes as
/// Content-Length announces. Anything that does not fit is an error.
async fn read_request<'a>(
    socket: &mut TcpSocket<'_>,
    buf: &'a mut [u8],
) -> Result<Request<'a>, ()> {
    let mut total = 0;
    let header_end = loop {
        if total == buf.len() {
            return Err(());
        }
        let n = socket.read(&mut buf[total..]).await.map_err(|_| ())?;
        if n == 0 {
            return Err(());
        }
        total += n;
        if let Some(end) = find_header_end(&buf[..total]) {
            break end;
        }
    };

    let content_length = {
        let headers = core::str::from_utf8(&buf[..header_end]).map_err(|_| ())?;
        headers
            .lines()
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0)
    };

    let body_end = header_end.checked_add(content_length).ok_or(())?;
    if body_end > buf.len() {
        return Err(());
    }
    while total < body_end {
        let n = socket.read(&mut buf[total..]).await.map_err(|_| ())?;
        if n == 0 {
            return Err(());
        }
        total += n;
    }

    let (head, rest) = buf.split_at(header_end);
    let request_line = core::str::from_utf8(head)
        .map_err(|_| ())?
        .lines()
        .next()
        .ok_or(())?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or(())?;
    let path = parts.next().ok_or(())?;
    let body = (content_length > 0).then(|| &rest[..content_length]);

    Ok(Request { method, path, body })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

async fn write_reply(
    socket: &mut TcpSocket<'_>,
    status: u16,
    body: &str,
) -> Result<(), embassy_net::tcp::Error> {
    let reason = match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Internal Server Error",
    };

    let mut header: String<HEADER_MAX> = String::new();
    write!(
        header,
        "HTTP/1.1 {} {}\r\n{}Content-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        CORS_HEADERS,
        body.len()
    )
    .map_err(|_| embassy_net::tcp::Error::ConnectionReset)?;

    socket.write_all(header.as_bytes()).await?;
    if !body.is_empty() {
        socket.write_all(body.as_bytes()).await?;
    }
    Ok(())
}
