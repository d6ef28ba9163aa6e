use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use tiny_http::{Header, Method, Response, Server, StatusCode};

/// Read-only view of both engines, published by the GUI loop and served to
/// local-network clients.
#[derive(Debug, Clone, Serialize, Default)]
pub struct RuntimeSnapshot {
    pub iso_local: String,
    pub stopwatch_running: bool,
    pub stopwatch_elapsed_ms: u64,
    pub stopwatch_clock: String,
    pub countdown_phase: String,
    pub countdown_running: bool,
    pub countdown_remaining_ms: u64,
    pub countdown_original_ms: u64,
    pub countdown_clock: String,
    pub countdown_alert_fired: bool,
    pub updated_unix_ms: i64,
}

#[derive(Debug)]
pub struct ApiSharedState {
    pub runtime: RuntimeSnapshot,
    total_requests: u64,
    server_started_unix_ms: i64,
}

impl Default for ApiSharedState {
    fn default() -> Self {
        Self {
            runtime: RuntimeSnapshot::default(),
            total_requests: 0,
            server_started_unix_ms: Local::now().timestamp_millis(),
        }
    }
}

impl ApiSharedState {
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn server_started_unix_ms(&self) -> i64 {
        self.server_started_unix_ms
    }
}

pub struct ApiServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

pub struct ApiServer {
    pub state: Arc<Mutex<ApiSharedState>>,
    stop: Arc<AtomicBool>,
    http_join: Option<JoinHandle<()>>,
}

impl ApiServer {
    pub fn start(config: ApiServerConfig) -> Result<Self> {
        let bind = format!("{}:{}", config.bind_addr, config.port);
        let server = Server::http(&bind)
            .map_err(|err| anyhow::anyhow!("failed to start API server on {bind}: {err}"))?;
        let state = Arc::new(Mutex::new(ApiSharedState::default()));
        let stop = Arc::new(AtomicBool::new(false));
        let state_for_thread = Arc::clone(&state);
        let stop_for_thread = Arc::clone(&stop);
        let http_join =
            thread::spawn(move || run_server_loop(server, state_for_thread, stop_for_thread));

        Ok(Self {
            state,
            stop,
            http_join: Some(http_join),
        })
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.http_join.take() {
            let _ = join.join();
        }
    }
}

fn run_server_loop(server: Server, state: Arc<Mutex<ApiSharedState>>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match server.recv_timeout(Duration::from_millis(200)) {
            Ok(Some(request)) => handle_request(request, &state),
            Ok(None) => continue,
            Err(_) => continue,
        }
    }
}

fn handle_request(request: tiny_http::Request, state: &Arc<Mutex<ApiSharedState>>) {
    if request.method() != &Method::Get {
        let _ = send_text(request, StatusCode(405), "method not allowed");
        return;
    }

    let Some(remote_addr) = request.remote_addr() else {
        let _ = send_text(request, StatusCode(400), "missing remote address");
        return;
    };
    if !is_local_network_ip(remote_addr.ip()) {
        let _ = send_text(request, StatusCode(403), "forbidden: local network only");
        return;
    }

    let url = request.url().to_string();
    let (path, _query) = split_path_query(&url);

    let mut guard = match state.lock() {
        Ok(guard) => guard,
        Err(_) => {
            let _ = send_text(request, StatusCode(500), "internal state lock error");
            return;
        }
    };
    guard.total_requests += 1;

    match path {
        "/" | "/v1/state" => {
            #[derive(Serialize)]
            struct StateResponse {
                runtime: RuntimeSnapshot,
                total_requests: u64,
                server_started_unix_ms: i64,
                response_unix_ms: i64,
                response_iso_local: String,
            }

            let response_now = Local::now();
            let payload = StateResponse {
                runtime: guard.runtime.clone(),
                total_requests: guard.total_requests(),
                server_started_unix_ms: guard.server_started_unix_ms(),
                response_unix_ms: response_now.timestamp_millis(),
                response_iso_local: response_now.to_rfc3339(),
            };
            let _ = send_json(request, StatusCode(200), &payload);
        }
        "/healthz" => {
            let _ = send_text(request, StatusCode(200), "ok");
        }
        _ => {
            let _ = send_text(request, StatusCode(404), "not found");
        }
    }
}

fn send_json<T: Serialize>(
    request: tiny_http::Request,
    status: StatusCode,
    body: &T,
) -> Result<()> {
    let payload = serde_json::to_vec(body)?;
    let content_type = Header::from_str("Content-Type: application/json; charset=utf-8")
        .map_err(|_| anyhow::anyhow!("failed to build content-type header"))?;
    request.respond(
        Response::from_data(payload)
            .with_status_code(status)
            .with_header(content_type),
    )?;
    Ok(())
}

fn send_text(request: tiny_http::Request, status: StatusCode, body: &str) -> Result<()> {
    let content_type = Header::from_str("Content-Type: text/plain; charset=utf-8")
        .map_err(|_| anyhow::anyhow!("failed to build content-type header"))?;
    request.respond(
        Response::from_string(body.to_string())
            .with_status_code(status)
            .with_header(content_type),
    )?;
    Ok(())
}

fn split_path_query(url: &str) -> (&str, &str) {
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

fn is_local_network_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
                || is_ipv4_mapped_local(v6)
        }
    }
}

fn is_ipv4_mapped_local(v6: Ipv6Addr) -> bool {
    match v6.to_ipv4_mapped() {
        Some(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn local_network_ip_filter_accepts_private_and_loopback() {
        assert!(is_local_network_ip(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
        assert!(is_local_network_ip(IpAddr::V4(Ipv4Addr::new(
            192, 168, 1, 44
        ))));
        assert!(is_local_network_ip(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3))));
        assert!(is_local_network_ip(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert!(!is_local_network_ip(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))));
    }

    #[test]
    fn split_path_query_separates_components() {
        assert_eq!(split_path_query("/v1/state?x=1"), ("/v1/state", "x=1"));
        assert_eq!(split_path_query("/healthz"), ("/healthz", ""));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let snapshot = RuntimeSnapshot {
            iso_local: "2026-08-30T10:00:00+00:00".to_string(),
            stopwatch_running: true,
            stopwatch_elapsed_ms: 5_000,
            stopwatch_clock: "00:00:05.00".to_string(),
            countdown_phase: "running".to_string(),
            countdown_running: true,
            countdown_remaining_ms: 65_000,
            countdown_original_ms: 65_000,
            countdown_clock: "00:01:05.00".to_string(),
            countdown_alert_fired: false,
            updated_unix_ms: 0,
        };
        let json = serde_json::to_string(&snapshot).expect("serialize");
        assert!(json.contains("\"stopwatch_elapsed_ms\":5000"));
        assert!(json.contains("\"countdown_phase\":\"running\""));
    }
}
