use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use micro_proxy::handler::ProxyHandler;
use micro_proxy::origin::{OriginClient, OriginError, OriginResponse, OutboundRequest};
use micro_proxy::selector::AddressSelector;
use micro_proxy::server::ProxyServer;
use micro_proxy_http::connection::{ConnectionContext, HttpConnection};
use micro_proxy_http::handler::BodySource;
use micro_proxy_http::protocol::{HttpError, ResponseHeaders};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};
use tokio::net::{TcpListener, TcpStream};
use triomphe::Arc;

const REQUEST: &[u8] = b"GET /foo?x=1 HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n";

/// A body handing out pre-arranged reads.
#[derive(Debug, Clone, Default)]
struct ScriptedBody {
    reads: VecDeque<Bytes>,
}

impl BodySource for ScriptedBody {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut next) = self.reads.pop_front() else {
            return Ok(0);
        };
        let len = next.len().min(buf.len());
        buf[..len].copy_from_slice(&next.split_to(len));
        if !next.is_empty() {
            self.reads.push_front(next);
        }
        Ok(len)
    }
}

/// An origin answering every request with the same response.
#[derive(Debug)]
struct StubOrigin {
    chunked: bool,
    headers: ResponseHeaders,
    reads: Vec<&'static str>,
}

impl StubOrigin {
    fn new(headers: ResponseHeaders, reads: Vec<&'static str>) -> Self {
        Self { chunked: false, headers, reads }
    }

    fn chunked(mut self) -> Self {
        self.chunked = true;
        self
    }
}

impl OriginClient for StubOrigin {
    type Body<'a> = ScriptedBody;

    async fn send(&mut self, request: &OutboundRequest<'_>) -> Result<OriginResponse<ScriptedBody>, OriginError> {
        assert_eq!(request.path_and_query, b"/base/foo?x=1");
        let body = ScriptedBody { reads: self.reads.iter().map(|read| Bytes::from_static(read.as_bytes())).collect() };
        Ok(OriginResponse::new(StatusCode::OK, self.headers.clone(), body).with_chunked(self.chunked))
    }
}

/// Serves one client connection against `origin`, returning the client side.
fn connect(origin: StubOrigin) -> (DuplexStream, tokio::task::JoinHandle<Result<(), HttpError>>) {
    let target = Arc::new("http://origin:9000/base/".parse().unwrap());
    let handler = ProxyHandler::new(target, origin);

    let (client, server) = duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(server);
    let connection = tokio::spawn(HttpConnection::new(reader, writer, handler, ConnectionContext::default()).process());
    (client, connection)
}

/// Runs one client connection against `origin` and returns everything
/// written back once the client side is closed.
async fn exchange(origin: StubOrigin, request: &[u8]) -> Vec<u8> {
    let (mut client, connection) = connect(origin);

    client.write_all(request).await.unwrap();
    client.shutdown().await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    connection.await.unwrap().unwrap();
    response
}

#[tokio::test]
async fn test_response_streamed_verbatim() {
    let headers = ResponseHeaders::builder().header("Content-Type", "text/plain").build();
    let response = exchange(StubOrigin::new(headers, vec!["hi"]), REQUEST).await;

    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhi");
}

#[tokio::test]
async fn test_response_reframed_as_chunked() {
    let headers = ResponseHeaders::builder()
        .header("Content-Type", "text/plain")
        .header("Transfer-Encoding", "chunked")
        .build();
    let response = exchange(StubOrigin::new(headers, vec!["hi", "!"]).chunked(), REQUEST).await;

    assert_eq!(
        response,
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nhi\r\n1\r\n!\r\n0\r\n\r\n"
    );
}

#[tokio::test]
async fn test_pipelined_requests_answered_in_order() {
    let headers = ResponseHeaders::builder().header("Content-Length", "2").build();
    let mut requests = REQUEST.to_vec();
    requests.extend_from_slice(REQUEST);

    let response = exchange(StubOrigin::new(headers, vec!["hi"]), &requests).await;

    let single = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi".as_slice();
    assert_eq!(response, [single, single].concat());
}

#[tokio::test]
async fn test_http10_client_gets_unframed_body() {
    let headers = ResponseHeaders::builder().header("Transfer-Encoding", "chunked").build();
    let response = exchange(StubOrigin::new(headers, vec!["hi", "!"]).chunked(), b"GET /foo?x=1 HTTP/1.0\r\n\r\n").await;

    assert_eq!(response, b"HTTP/1.1 200 OK\r\n\r\nhi!");
}

#[tokio::test]
async fn test_expect_continue_answered_before_body() {
    let headers = ResponseHeaders::builder().header("Content-Length", "2").build();
    let (mut client, connection) = connect(StubOrigin::new(headers, vec!["hi"]));

    client
        .write_all(b"POST /foo?x=1 HTTP/1.1\r\nHost: a\r\nContent-Length: 5\r\nExpect: 100-continue\r\n\r\n")
        .await
        .unwrap();
    let mut interim = [0u8; 25];
    tokio::time::timeout(Duration::from_secs(5), client.read_exact(&mut interim))
        .await
        .expect("interim response before the body is sent")
        .unwrap();
    assert_eq!(&interim, b"HTTP/1.1 100 Continue\r\n\r\n");

    client.write_all(b"hello").await.unwrap();
    client.shutdown().await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    connection.await.unwrap().unwrap();
    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi");
}

/// Reads one request head from `stream`.
async fn read_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await.unwrap();
        assert_ne!(n, 0, "origin saw eof before a complete head");
        head.extend_from_slice(&buf[..n]);
    }
    String::from_utf8(head).unwrap()
}

/// Starts an origin that answers one connection's first request with `body`
/// and hands the request head back.
async fn spawn_origin(body: &'static str) -> (SocketAddr, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let head = read_head(&mut stream).await;
        let response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{body}", body.len());
        stream.write_all(response.as_bytes()).await.unwrap();
        head
    });
    (address, task)
}

async fn spawn_proxy(selector: AddressSelector) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = ProxyServer::builder().address(address).selector(selector).build().unwrap();
    tokio::spawn(server.serve(listener));
    address
}

async fn get(proxy: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn test_forwards_over_tcp() {
    let (origin, origin_task) = spawn_origin("hi").await;
    let target = format!("http://{origin}/base/").parse().unwrap();
    let proxy = spawn_proxy(AddressSelector::fixed(target)).await;

    let response =
        get(proxy, b"GET /foo?x=1 HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\nConnection: close\r\n\r\n").await;
    assert_eq!(response, "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi");

    let head = origin_task.await.unwrap();
    assert_eq!(head, format!("GET /base/foo?x=1 HTTP/1.1\r\nHost: {origin}\r\nAccept: */*\r\n\r\n"));
}

#[tokio::test]
async fn test_connections_spread_round_robin() {
    let (first, first_task) = spawn_origin("a").await;
    let (second, second_task) = spawn_origin("b").await;
    let targets = vec![format!("http://{first}/").parse().unwrap(), format!("http://{second}/").parse().unwrap()];
    let proxy = spawn_proxy(AddressSelector::round_robin(targets).unwrap()).await;

    let request = b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n";
    assert!(get(proxy, request).await.ends_with("\r\n\r\na"));
    assert!(get(proxy, request).await.ends_with("\r\n\r\nb"));

    first_task.await.unwrap();
    second_task.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_origin_closes_client() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed = listener.local_addr().unwrap();
    drop(listener);

    let target = format!("http://{closed}/").parse().unwrap();
    let proxy = spawn_proxy(AddressSelector::fixed(target)).await;

    let mut stream = TcpStream::connect(proxy).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert!(response.is_empty());
}
