//! HTTP surface of the scan service.
//!
//! A deliberately small HTTP/1.1 server on `std::net`: the kiosk frontend
//! needs three endpoints and nothing else, so there is no framework, no
//! TLS, and no connection reuse. Every response carries a wildcard CORS
//! header because the frontend is served from a different origin.

pub mod multipart;

use crate::advisor::ChatQuery;
use crate::pipeline::DetectionResponse;
use crate::ScanService;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Upload ceiling; phone photos stay well under this.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const MAX_HEADER_BYTES: usize = 8192;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ApiHandle {
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("api server thread panicked"))?;
        }
        Ok(())
    }
}

pub struct ApiServer {
    cfg: ApiConfig,
    service: Arc<ScanService>,
}

impl ApiServer {
    pub fn new(cfg: ApiConfig, service: Arc<ScanService>) -> Self {
        Self { cfg, service }
    }

    pub fn spawn(self) -> Result<ApiHandle> {
        let listener = TcpListener::bind(self.cfg.addr.as_str())?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let service = self.service;
        let join = std::thread::spawn(move || {
            if let Err(err) = run_api(listener, service, shutdown_thread) {
                log::error!("scan api stopped: {}", err);
            }
        });

        Ok(ApiHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

fn run_api(
    listener: TcpListener,
    service: Arc<ScanService>,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, _)) => {
                let service = service.clone();
                std::thread::spawn(move || {
                    if let Err(err) = handle_connection(stream, &service) {
                        log::warn!("scan api request failed: {}", err);
                    }
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn handle_connection(mut stream: TcpStream, service: &ScanService) -> Result<()> {
    let request = read_request(&mut stream)?;
    match (request.method.as_str(), request.path.as_str()) {
        ("OPTIONS", _) => write_preflight_response(&mut stream),
        ("GET", "/health") => write_json_response(&mut stream, 200, r#"{"status":"ok"}"#),
        ("POST", "/detect") => handle_detect(&mut stream, service, &request),
        ("POST", "/chat") => handle_chat(&mut stream, service, &request),
        (_, "/health") | (_, "/detect") | (_, "/chat") => {
            write_json_response(&mut stream, 405, r#"{"error":"method_not_allowed"}"#)
        }
        _ => write_json_response(&mut stream, 404, r#"{"error":"not_found"}"#),
    }
}

/// `POST /detect`: multipart photo upload in, item list out.
///
/// Always answers 200; a request with no usable image part gets the same
/// empty response an undecodable photo would.
fn handle_detect(
    stream: &mut TcpStream,
    service: &ScanService,
    request: &HttpRequest,
) -> Result<()> {
    let response = match upload_bytes(request) {
        Some(bytes) => service.pipeline.detect(&bytes),
        None => {
            log::warn!("detect request carried no usable image part");
            DetectionResponse::default()
        }
    };
    let payload = serde_json::to_vec(&response)?;
    write_response(stream, 200, "application/json", &payload)
}

/// `POST /chat`: waste question in, advice out. Always answers 200; an
/// unreadable body gets the generic greeting.
fn handle_chat(stream: &mut TcpStream, service: &ScanService, request: &HttpRequest) -> Result<()> {
    let advice = match serde_json::from_slice::<ChatQuery>(&request.body) {
        Ok(query) => service.advisor.advise(&query.query),
        Err(err) => {
            log::warn!(
                "chat request body unreadable, serving fallback advice: {}",
                err
            );
            service.advisor.fallback_advice()
        }
    };
    let payload = serde_json::to_vec(&advice)?;
    write_response(stream, 200, "application/json", &payload)
}

fn upload_bytes(request: &HttpRequest) -> Option<Vec<u8>> {
    let content_type = request.headers.get("content-type")?;
    let boundary = multipart::boundary_from_content_type(content_type)?;
    let parts = match multipart::parse_parts(&request.body, &boundary) {
        Ok(parts) => parts,
        Err(err) => {
            log::warn!("ignoring malformed multipart body: {}", err);
            return None;
        }
    };
    multipart::image_part(&parts).map(|part| part.data.clone())
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut buf = [0u8; 8192];
    let mut data = Vec::new();

    let header_end = loop {
        if let Some(end) = find_header_end(&data) {
            break end;
        }
        if data.len() > MAX_HEADER_BYTES {
            return Err(anyhow!("request headers too large"));
        }
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed before request headers ended"));
        }
        data.extend_from_slice(&buf[..n]);
    };

    let header_text = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| anyhow!("missing method"))?
        .to_string();
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;
    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }

    let content_length = headers
        .get("content-length")
        .map(|value| value.parse::<usize>())
        .transpose()
        .map_err(|_| anyhow!("invalid content-length header"))?
        .unwrap_or(0);
    if content_length > MAX_BODY_BYTES {
        return Err(anyhow!("request body too large ({} bytes)", content_length));
    }

    let mut body: Vec<u8> = data[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed mid-body"));
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);

    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();
    Ok(HttpRequest {
        method,
        path,
        headers,
        body,
    })
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|position| position + 4)
}

fn write_json_response(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    write_response(stream, status, "application/json", body.as_bytes())
}

fn write_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        204 => "HTTP/1.1 204 No Content",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nAccess-Control-Allow-Origin: *\r\nCache-Control: no-store\r\n\r\n",
        status_line = status_line,
        content_type = content_type,
        len = body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body)?;
    Ok(())
}

fn write_preflight_response(stream: &mut TcpStream) -> Result<()> {
    let header = "HTTP/1.1 204 No Content\r\n\
                  Access-Control-Allow-Origin: *\r\n\
                  Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
                  Access-Control-Allow-Headers: Content-Type\r\n\
                  Content-Length: 0\r\n\r\n";
    stream.write_all(header.as_bytes())?;
    Ok(())
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}
