// crates/ouch-server/tests/end_to_end.rs
//
// Real TCP sessions against a server bound to 127.0.0.1:0.

use std::net::SocketAddr;
use std::time::Duration;

use ouch_core::{
    CancelOrder, InboundMessage, NewOrder, OrderCanceled, OrderId, OrderRegistry, OrderState,
    OutboundMessage, Side,
};
use ouch_protocol::{decode_output, encode_input, message_size};
use ouch_server::{Config, Server, ShutdownHandle};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

const QUIET: Duration = Duration::from_millis(200);

struct Harness {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    task: JoinHandle<OrderRegistry>,
}

impl Harness {
    async fn start() -> Self {
        let config = Config {
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
            ..Config::default()
        };
        let server = Server::bind(config).await;
        let addr = server.local_addr().expect("listener bound");
        let shutdown = server.shutdown_handle();
        let task = tokio::spawn(server.run());
        Harness { addr, shutdown, task }
    }

    async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }

    async fn stop(self) -> OrderRegistry {
        self.shutdown.shutdown();
        timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server stopped in time")
            .unwrap()
    }
}

fn new_order(token: &str, qty: u32) -> InboundMessage {
    InboundMessage::NewOrder(NewOrder::new(
        token.parse().unwrap(),
        Side::Buy,
        qty,
        "AAPL".parse().unwrap(),
        1_895_000,
    ))
}

fn cancel(token: &str, qty: u32) -> InboundMessage {
    InboundMessage::CancelOrder(CancelOrder {
        token: token.parse().unwrap(),
        qty,
    })
}

fn encode(msg: &InboundMessage) -> Vec<u8> {
    let mut out = Vec::new();
    encode_input(msg, &mut out);
    out
}

async fn send(stream: &mut TcpStream, msg: &InboundMessage) {
    stream.write_all(&encode(msg)).await.unwrap();
}

async fn read_reply(stream: &mut TcpStream) -> OutboundMessage {
    let mut tag = [0u8; 1];
    timeout(Duration::from_secs(5), stream.read_exact(&mut tag))
        .await
        .expect("reply in time")
        .unwrap();

    let size = message_size(tag[0]).expect("known reply tag");
    let mut record = vec![0u8; size];
    record[0] = tag[0];
    stream.read_exact(&mut record[1..]).await.unwrap();

    let (reply, used) = decode_output(&record).unwrap();
    assert_eq!(used, size);
    reply
}

async fn assert_no_reply(stream: &mut TcpStream) {
    let mut byte = [0u8; 1];
    assert!(
        timeout(QUIET, stream.read(&mut byte)).await.is_err(),
        "unexpected reply"
    );
}

#[tokio::test]
async fn new_order_is_acked_with_first_id() {
    let server = Harness::start().await;
    let mut client = server.connect().await;

    send(&mut client, &new_order("TOKEN00000001", 100)).await;

    let OutboundMessage::Ack(ack) = read_reply(&mut client).await else {
        panic!("expected ack");
    };
    assert_eq!(ack.order_id, OrderId(0));
    assert_eq!(ack.token.to_string(), "TOKEN00000001");
    assert_eq!(ack.side, b'B');
    assert_eq!(ack.qty, 100);
    assert_eq!(ack.px, 1_895_000);
    assert_eq!(ack.state, b'L');

    let registry = server.stop().await;
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn ack_then_cancel() {
    let server = Harness::start().await;
    let mut client = server.connect().await;

    send(&mut client, &new_order("ORD1", 100)).await;
    assert!(matches!(read_reply(&mut client).await, OutboundMessage::Ack(_)));

    send(&mut client, &cancel("ORD1", 100)).await;
    let OutboundMessage::Canceled(OrderCanceled { token, qty, reason, .. }) =
        read_reply(&mut client).await
    else {
        panic!("expected canceled");
    };
    assert_eq!(token.to_string(), "ORD1");
    assert_eq!(qty, 100);
    assert_eq!(reason, b'U');

    // A second cancel finds nothing cancelable.
    send(&mut client, &cancel("ORD1", 100)).await;
    assert_no_reply(&mut client).await;

    let registry = server.stop().await;
    assert_eq!(registry.get(OrderId(0)).unwrap().state, OrderState::Canceled);
}

#[tokio::test]
async fn split_new_order_is_acked_once() {
    let server = Harness::start().await;
    let mut client = server.connect().await;

    let bytes = encode(&new_order("SPLIT", 10));
    client.write_all(&bytes[..3]).await.unwrap();
    sleep(Duration::from_millis(50)).await;
    client.write_all(&bytes[3..]).await.unwrap();

    assert!(matches!(read_reply(&mut client).await, OutboundMessage::Ack(_)));
    assert_no_reply(&mut client).await;

    server.stop().await;
}

#[tokio::test]
async fn unknown_tag_is_discarded_and_connection_survives() {
    let server = Harness::start().await;
    let mut client = server.connect().await;

    client.write_all(b"Zjunkjunkjunk").await.unwrap();
    assert_no_reply(&mut client).await;

    send(&mut client, &new_order("AFTER", 5)).await;
    let OutboundMessage::Ack(ack) = read_reply(&mut client).await else {
        panic!("expected ack");
    };
    assert_eq!(ack.order_id, OrderId(0));

    server.stop().await;
}

#[tokio::test]
async fn cancel_of_unknown_token_is_silent() {
    let server = Harness::start().await;
    let mut client = server.connect().await;

    send(&mut client, &cancel("NEVER", 1)).await;
    assert_no_reply(&mut client).await;

    let registry = server.stop().await;
    assert!(registry.is_empty());
}

#[tokio::test]
async fn replies_go_only_to_the_sender() {
    let server = Harness::start().await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;

    send(&mut alice, &new_order("A1", 1)).await;
    let OutboundMessage::Ack(a) = read_reply(&mut alice).await else {
        panic!("expected ack");
    };

    send(&mut bob, &new_order("B1", 2)).await;
    let OutboundMessage::Ack(b) = read_reply(&mut bob).await else {
        panic!("expected ack");
    };

    // Identifiers are global across connections.
    assert_eq!(a.order_id, OrderId(0));
    assert_eq!(b.order_id, OrderId(1));
    assert_no_reply(&mut alice).await;

    server.stop().await;
}

#[tokio::test]
async fn shutdown_closes_client_connections() {
    let server = Harness::start().await;
    let mut client = server.connect().await;

    send(&mut client, &new_order("ORD1", 1)).await;
    read_reply(&mut client).await;

    server.stop().await;

    let mut byte = [0u8; 1];
    let n = timeout(Duration::from_secs(5), client.read(&mut byte))
        .await
        .expect("connection closed in time")
        .unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn bind_failure_still_honors_shutdown() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = Config {
        bind_addr: "127.0.0.1".to_string(),
        port: taken.local_addr().unwrap().port(),
        ..Config::default()
    };

    let server = Server::bind(config).await;
    assert!(server.local_addr().is_none());

    let shutdown = server.shutdown_handle();
    let task = tokio::spawn(server.run());
    shutdown.shutdown();
    assert!(shutdown.is_shutdown());

    let registry = timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(registry.is_empty());
}
