//! Shared helpers for the end-to-end server tests.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use pkgindex::network::{Server, ShutdownHandle};
use pkgindex::{Config, IndexStore};

/// A running server on an ephemeral port, shut down and joined on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<IndexStore>,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn start() -> Self {
        Self::start_with(Config::builder())
    }

    pub fn start_with(builder: pkgindex::config::ConfigBuilder) -> Self {
        let config = builder
            .listen_addr("127.0.0.1:0")
            .poll_interval_ms(20)
            .build();

        let store = Arc::new(IndexStore::new());
        let mut server = Server::new(config, Arc::clone(&store));
        let addr = server.bind().expect("bind ephemeral port");
        let shutdown = server.shutdown_handle();

        let thread = std::thread::spawn(move || {
            server.run().expect("server run");
        });

        Self {
            addr,
            store,
            shutdown,
            thread: Some(thread),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// A line-protocol client against the server under test.
pub struct TestClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl TestClient {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .expect("set timeout");
        let reader = BufReader::new(stream.try_clone().expect("clone stream"));
        Self { stream, reader }
    }

    /// Send one request line (terminator appended) and read the response.
    pub fn send(&mut self, request: &str) -> String {
        self.send_raw(format!("{request}\n").as_bytes());
        self.recv()
    }

    /// Write raw bytes without framing.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).expect("write");
        self.stream.flush().expect("flush");
    }

    /// Read one response line, terminator stripped.
    pub fn recv(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response");
        line.trim_end_matches('\n').to_string()
    }

    /// Read until EOF; returns the number of bytes seen.
    pub fn read_to_eof(&mut self) -> usize {
        let mut rest = Vec::new();
        std::io::Read::read_to_end(&mut self.reader, &mut rest).expect("read to eof");
        rest.len()
    }
}
