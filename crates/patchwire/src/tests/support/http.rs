//! Minimal HTTP client used against a live listener.
//!
//! Requests ask the server to close the connection so responses can be read
//! to the end. Event-stream frames arrive chunked; chunk-size lines are
//! skipped because they never start with a field name.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::patch::PatchMessage;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

fn exchange(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(CLIENT_TIMEOUT))
        .expect("set read timeout");
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut response = String::new();
    stream.read_to_string(&mut response).expect("read response");
    response
}

/// Issues a GET and returns the raw response.
pub fn get(addr: SocketAddr, path: &str) -> String {
    exchange(addr, &format!("GET {path} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n"))
}

/// Issues a JSON POST and returns the raw response.
pub fn post(addr: SocketAddr, path: &str, body: &str) -> String {
    exchange(
        addr,
        &format!(
            "POST {path} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\r\n{body}",
            body.len()
        ),
    )
}

/// Client side of an open `/__sse` stream.
pub struct PatchStream {
    reader: BufReader<TcpStream>,
}

impl PatchStream {
    /// Connects and waits until the server has subscribed the stream.
    pub fn open(addr: SocketAddr) -> Self {
        let mut stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(CLIENT_TIMEOUT))
            .expect("set read timeout");
        stream
            .write_all(b"GET /__sse HTTP/1.1\r\nHost: test\r\n\r\n")
            .expect("write request");
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        loop {
            line.clear();
            let read = reader.read_line(&mut line).expect("read stream head");
            assert!(read > 0, "stream closed before it opened");
            if line.starts_with("retry:") {
                break;
            }
        }
        Self { reader }
    }

    /// Next patch event, skipping pings, or `None` once `wait` elapses.
    pub fn next_patch(&mut self, wait: Duration) -> Option<PatchMessage> {
        self.reader
            .get_ref()
            .set_read_timeout(Some(wait))
            .expect("set read timeout");
        let mut in_patch = false;
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }
            if let Some(event) = line.strip_prefix("event:") {
                in_patch = event.trim() == "patch";
            } else if let Some(data) = line.strip_prefix("data:")
                && in_patch
            {
                return Some(serde_json::from_str(data.trim()).expect("patch payload"));
            }
        }
    }
}

/// Body of a raw HTTP response.
pub fn body_of(response: &str) -> &str {
    response
        .split_once("\r\n\r\n")
        .map_or("", |(_, body)| body)
}
