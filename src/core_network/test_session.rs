// End-to-end sessions against a real server on ephemeral ports.
use crate::config::Config;
use crate::core_network::reactor::{Server, ShutdownHandle};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    task: JoinHandle<anyhow::Result<()>>,
    dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.control_port = 0;
        config.server.data_port = 0;
        config.server.worker_threads = 2;
        config.server.shutdown_grace_secs = 1;
        let server = Server::bind_in(config, dir.path()).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();
        let task = tokio::spawn(server.run());
        Self { addr, shutdown, task, dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn root_str(&self) -> String {
        self.dir.path().to_str().unwrap().to_string()
    }

    async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server stops in time")
            .unwrap()
            .unwrap();
    }
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> (Self, String) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
        };
        let greeting = client.reply().await;
        (client, greeting)
    }

    async fn reply(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("reply in time")
            .unwrap();
        line.trim_end_matches("\r\n").to_string()
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\r\n").await.unwrap();
    }

    async fn command(&mut self, line: &str) -> String {
        self.send(line).await;
        self.reply().await
    }

    /// Enters passive mode and opens the data connection it announced.
    async fn passive(&mut self) -> TcpStream {
        let reply = self.command("PASV").await;
        let port = pasv_port(&reply);
        TcpStream::connect(("127.0.0.1", port)).await.unwrap()
    }
}

fn pasv_port(reply: &str) -> u16 {
    let fields: Vec<u16> = reply
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(|f| f.parse().unwrap())
        .collect();
    assert_eq!(fields.len(), 6, "unexpected PASV reply {:?}", reply);
    fields[4] * 256 + fields[5]
}

async fn read_exact_from(data: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    tokio::time::timeout(Duration::from_secs(5), data.read_exact(&mut buf))
        .await
        .expect("data in time")
        .unwrap();
    buf
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

#[tokio::test]
async fn test_login_and_pwd() {
    let server = TestServer::start().await;
    let (mut client, greeting) = Client::connect(server.addr).await;

    assert_eq!(greeting, "Welcome to use FTP server!");
    assert_eq!(client.command("USER anonymous").await, "welcome to use");
    assert_eq!(client.command("PASS secret").await, "welcome to use");
    assert_eq!(
        client.command("PWD").await,
        format!("current workdir is {}", server.root_str())
    );

    server.stop().await;
}

#[tokio::test]
async fn test_cwd_failure_keeps_directory() {
    let server = TestServer::start().await;
    let (mut client, _) = Client::connect(server.addr).await;

    assert_eq!(
        client.command("CWD /nonexistent/dir").await,
        format!("change work dir error, current workdir is {}", server.root_str())
    );
    assert_eq!(
        client.command("PWD").await,
        format!("current workdir is {}", server.root_str())
    );

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_command_and_pipelined_lines() {
    let server = TestServer::start().await;
    let (mut client, _) = Client::connect(server.addr).await;

    client.writer.write_all(b"NO").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    client.writer.write_all(b"OP\r\nUSER a\r\nPWD\r\n").await.unwrap();

    assert_eq!(client.reply().await, "cannot parse command, please enter correct command");
    assert_eq!(client.reply().await, "welcome to use");
    assert!(client.reply().await.starts_with("current workdir is "));

    server.stop().await;
}

#[tokio::test]
async fn test_pasv_is_idempotent() {
    let server = TestServer::start().await;
    let (mut client, _) = Client::connect(server.addr).await;

    let first = client.command("PASV").await;
    let second = client.command("PASV").await;
    assert_eq!(first, second);
    assert!(first.starts_with("(127,0,0,1,"));
    assert_ne!(pasv_port(&first), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_rest_then_retr_resumes_once() {
    let server = TestServer::start().await;
    let content = pattern(500);
    std::fs::write(server.root().join("file.bin"), &content).unwrap();

    let (mut client, _) = Client::connect(server.addr).await;
    let mut data = client.passive().await;

    assert_eq!(
        client.command("REST 100").await,
        "350 Restarting at <100>. Send STORE or RETRIEVE to initiate transfer."
    );
    assert_eq!(client.command("RETR file.bin").await, "retr parse success");
    assert_eq!(read_exact_from(&mut data, 400).await, &content[100..]);

    assert_eq!(client.command("RETR file.bin").await, "retr parse success");
    assert_eq!(read_exact_from(&mut data, 500).await, content);

    server.stop().await;
}

#[tokio::test]
async fn test_stor_then_size() {
    let server = TestServer::start().await;
    let (mut client, _) = Client::connect(server.addr).await;
    let mut data = client.passive().await;

    assert_eq!(
        client.command("STOR /incoming/a.txt<5>").await,
        "recv command success, start store file"
    );
    data.write_all(b"hello").await.unwrap();

    assert_eq!(client.command("SIZE a.txt").await, "5");
    assert_eq!(std::fs::read(server.root().join("a.txt")).unwrap(), b"hello");

    server.stop().await;
}

#[tokio::test]
async fn test_stor_short_upload_when_peer_closes() {
    let server = TestServer::start().await;
    let (mut client, _) = Client::connect(server.addr).await;
    let mut data = client.passive().await;

    client.command("STOR /x/short.txt<100>").await;
    data.write_all(b"abc").await.unwrap();
    drop(data);

    assert_eq!(client.command("SIZE short.txt").await, "3");

    server.stop().await;
}

#[tokio::test]
async fn test_port_mode_retr() {
    let server = TestServer::start().await;
    let content = pattern(64);
    std::fs::write(server.root().join("active.bin"), &content).unwrap();

    let (mut client, _) = Client::connect(server.addr).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let reply = client
        .command(&format!("PORT 127,0,0,1,{},{}", port / 256, port % 256))
        .await;
    assert_eq!(reply, "convert port pattern success");
    let (mut data, _) = listener.accept().await.unwrap();

    assert_eq!(client.command("RETR active.bin").await, "retr parse success");
    assert_eq!(read_exact_from(&mut data, 64).await, content);

    server.stop().await;
}

#[tokio::test]
async fn test_port_failures() {
    let server = TestServer::start().await;
    let (mut client, _) = Client::connect(server.addr).await;

    assert_eq!(
        client.command("PORT 1,2,3").await,
        "fail to convert to port pattern, invalid argument"
    );

    // Nothing listens on a port that was just released.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    assert_eq!(
        client
            .command(&format!("PORT 127,0,0,1,{},{}", port / 256, port % 256))
            .await,
        "fail to connect to port pattern, connect to client error"
    );

    server.stop().await;
}

#[tokio::test]
async fn test_failed_port_keeps_previous_channel() {
    let server = TestServer::start().await;
    let content = pattern(64);
    std::fs::write(server.root().join("kept.bin"), &content).unwrap();

    let (mut client, _) = Client::connect(server.addr).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    assert_eq!(
        client
            .command(&format!("PORT 127,0,0,1,{},{}", port / 256, port % 256))
            .await,
        "convert port pattern success"
    );
    let (mut data, _) = listener.accept().await.unwrap();

    let released = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = released.local_addr().unwrap().port();
    drop(released);
    assert_eq!(
        client
            .command(&format!("PORT 127,0,0,1,{},{}", dead_port / 256, dead_port % 256))
            .await,
        "fail to connect to port pattern, connect to client error"
    );
    assert_eq!(
        client.command("PORT 1,2,3").await,
        "fail to convert to port pattern, invalid argument"
    );

    assert_eq!(client.command("RETR kept.bin").await, "retr parse success");
    assert_eq!(read_exact_from(&mut data, 64).await, content);

    server.stop().await;
}

#[tokio::test]
async fn test_data_connection_from_unknown_address_is_dropped() {
    let server = TestServer::start().await;
    std::fs::write(server.root().join("file.bin"), pattern(16)).unwrap();

    let (mut client, _) = Client::connect(server.addr).await;
    let port = pasv_port(&client.command("PASV").await);

    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.2:0".parse().unwrap()).unwrap();
    let mut stranger = socket
        .connect(SocketAddr::from(([127, 0, 0, 1], port)))
        .await
        .unwrap();

    assert_eq!(client.command("RETR file.bin").await, "RETR error, no data connection");

    let mut buf = [0u8; 1];
    let closed = tokio::time::timeout(Duration::from_secs(5), stranger.read(&mut buf))
        .await
        .expect("stranger closed in time");
    assert!(matches!(closed, Ok(0) | Err(_)));

    assert_eq!(
        client.command("PWD").await,
        format!("current workdir is {}", server.root_str())
    );

    server.stop().await;
}

#[tokio::test]
async fn test_rest_beyond_any_file_keeps_channel() {
    let server = TestServer::start().await;
    let content = pattern(32);
    std::fs::write(server.root().join("file.bin"), &content).unwrap();

    let (mut client, _) = Client::connect(server.addr).await;
    let mut data = client.passive().await;

    client.command("REST 18446744073709551615").await;
    assert_eq!(client.command("RETR file.bin").await, "retr parse success");

    assert_eq!(client.command("RETR file.bin").await, "retr parse success");
    assert_eq!(read_exact_from(&mut data, 32).await, content);

    server.stop().await;
}

#[tokio::test]
async fn test_list_working_directory() {
    let server = TestServer::start().await;
    std::fs::write(server.root().join("one.txt"), b"1").unwrap();
    let (mut client, _) = Client::connect(server.addr).await;

    let listing = client.command("LIST").await;
    let mut names: Vec<&str> = listing.split('\t').filter(|s| !s.is_empty()).collect();
    names.sort();
    assert_eq!(names, vec![".", "..", "one.txt"]);

    server.stop().await;
}

#[tokio::test]
async fn test_quit_closes_connection() {
    let server = TestServer::start().await;
    let (mut client, _) = Client::connect(server.addr).await;

    assert_eq!(client.command("QUIT").await, "Quit success!");
    let mut rest = String::new();
    let n = client.reader.read_line(&mut rest).await.unwrap();
    assert_eq!(n, 0);

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_closes_sessions() {
    let server = TestServer::start().await;
    let (mut client, _) = Client::connect(server.addr).await;
    assert_eq!(client.command("USER a").await, "welcome to use");

    server.stop().await;

    let mut rest = String::new();
    let n = tokio::time::timeout(Duration::from_secs(5), client.reader.read_line(&mut rest))
        .await
        .expect("session closed in time")
        .unwrap_or(0);
    assert_eq!(n, 0);
}
