#![allow(dead_code)]

pub mod test_server {
    use std::net::{SocketAddr, TcpListener};
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// Reserve a free local port and release it for the server to bind.
    pub fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw request and read until the peer goes quiet.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Split a raw response into status, header lines and body.
    pub fn parse_parts(resp: &str) -> (u16, Vec<String>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let headers = lines.map(str::to_string).collect();
        (status, headers, body.to_string())
    }
}

pub mod trace {
    use http::{HeaderMap, Method, StatusCode};
    use std::io;
    use std::sync::{Arc, Mutex};
    use webtrie::middleware::{handler, middleware, Middleware};
    use webtrie::{RecordingSink, ResponseSink};

    /// Shared, ordered event log.
    pub type Events = Arc<Mutex<Vec<String>>>;

    pub fn events() -> Events {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn snapshot(events: &Events) -> Vec<String> {
        events.lock().unwrap().clone()
    }

    /// Middleware that logs `<name>.pre` and `<name>.post` around `next`.
    pub fn tracing_layer(name: &'static str, events: &Events) -> Middleware {
        let events = Arc::clone(events);
        middleware(move |next| {
            let events = Arc::clone(&events);
            handler(move |ctx| {
                events.lock().unwrap().push(format!("{name}.pre"));
                next(ctx);
                events.lock().unwrap().push(format!("{name}.post"));
            })
        })
    }

    /// Middleware that never calls `next`.
    pub fn blocking_layer(name: &'static str, events: &Events) -> Middleware {
        let events = Arc::clone(events);
        middleware(move |_next| {
            let events = Arc::clone(&events);
            handler(move |_ctx| {
                events.lock().unwrap().push(format!("{name}.stop"));
            })
        })
    }

    /// Sink that logs `flush` when the head is written.
    pub struct TraceSink {
        pub events: Events,
        pub inner: RecordingSink,
    }

    impl TraceSink {
        pub fn new(events: &Events) -> Self {
            Self {
                events: Arc::clone(events),
                inner: RecordingSink::new(),
            }
        }
    }

    impl ResponseSink for TraceSink {
        fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> io::Result<()> {
            self.events.lock().unwrap().push("flush".to_string());
            self.inner.write_head(status, headers)
        }

        fn write_body(&mut self, body: &[u8]) -> io::Result<usize> {
            self.inner.write_body(body)
        }
    }

    pub fn request(method: Method, uri: &str) -> http::Request<Vec<u8>> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Vec::new())
            .unwrap()
    }
}
