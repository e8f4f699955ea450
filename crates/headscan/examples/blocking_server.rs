//! Blocking echo server built on a shared parser pool.
//!
//! Reads each request head into a growing buffer, parsing again after every
//! read until the head is complete, then drains the body and replies with a
//! short summary of what was parsed.
//!
//! Run with:
//!
//! ```text
//! cargo run --example blocking_server -- 127.0.0.1:8080
//! ```
//!
//! Then in another terminal:
//!
//! ```text
//! curl -d 'hello' http://127.0.0.1:8080/echo
//! ```
//!
//! Set `HEADSCAN_DEBUG=1` to see the parser's debug output.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use headscan::prelude::*;

/// Largest request head accepted before giving up.
const MAX_HEAD_SIZE: usize = 8 * OPTIMAL_BUFFER_SIZE;

fn main() -> io::Result<()> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let config = ParserConfig::new()
        .header_capacity(16)
        .max_body_size(64 * 1024);
    let pool = Arc::new(ParserPool::new(config));

    let listener = TcpListener::bind(&addr)?;
    println!("listening on http://{addr}");

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                eprintln!("accept failed: {e}");
                continue;
            }
        };
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            if let Err(e) = handle(&pool, stream) {
                eprintln!("connection error: {e}");
            }
        });
    }
    Ok(())
}

fn handle(pool: &ParserPool, mut stream: TcpStream) -> io::Result<()> {
    let mut parser = pool.acquire();
    let mut buffer = Vec::with_capacity(OPTIMAL_BUFFER_SIZE);
    let mut chunk = [0u8; OPTIMAL_BUFFER_SIZE];

    loop {
        match parser.parse(&buffer) {
            Ok(_) => break,
            Err(ParseError::MissingData) => {
                if buffer.len() >= MAX_HEAD_SIZE {
                    return respond(&mut stream, "431 Request Header Fields Too Large", b"");
                }
                let n = stream.read(&mut chunk)?;
                if n == 0 {
                    // Peer closed before finishing the head.
                    return Ok(());
                }
                buffer.extend_from_slice(&chunk[..n]);
            }
            Err(e) => {
                return respond(&mut stream, "400 Bad Request", e.to_string().as_bytes());
            }
        }
    }

    let Some(head) = parser.head(&buffer) else {
        return Ok(());
    };

    let body = head
        .body_reader(head.rest(), &mut stream)
        .and_then(|mut reader| reader.read_all());
    let body = match body {
        Ok(body) => body,
        Err(BodyError::TooLarge { .. }) => {
            return respond(&mut stream, "413 Content Too Large", b"");
        }
        Err(BodyError::Unsupported(what)) => {
            return respond(&mut stream, "501 Not Implemented", what.as_bytes());
        }
        Err(e) => return respond(&mut stream, "400 Bad Request", e.to_string().as_bytes()),
    };

    let mut summary = format!(
        "method: {}\npath: {}\nversion: {}\nhost: {}\nbody: {} bytes\n",
        String::from_utf8_lossy(head.method()),
        String::from_utf8_lossy(head.path()),
        String::from_utf8_lossy(head.version()),
        head.host().map(String::from_utf8_lossy).unwrap_or_default(),
        body.len(),
    );
    for header in head.headers() {
        summary.push_str(&format!(
            "header: {}: {}\n",
            String::from_utf8_lossy(header.name()),
            String::from_utf8_lossy(header.value()),
        ));
    }

    respond(&mut stream, "200 OK", summary.as_bytes())
}

fn respond(stream: &mut TcpStream, status: &str, body: &[u8]) -> io::Result<()> {
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )?;
    stream.write_all(body)?;
    stream.flush()
}
