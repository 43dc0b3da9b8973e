use std::ops::ControlFlow;

use bytes::Bytes;
use tokio::net::TcpListener;

use super::{Producer, Subscriber};
use crate::codec::{Decoded, FramedStream};
use crate::test_support::TestBroker;
use crate::transport::message::{FAILED, OK, PREPARED, PUB, SUB};
use crate::utils::error::BrokerError;

async fn expect_frame<S>(conn: &mut FramedStream<S>, expected: &[u8])
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    match conn.recv().await.unwrap() {
        Decoded::Frame(frame) => assert_eq!(frame.as_ref(), expected),
        Decoded::Closed => panic!("stream closed early"),
    }
}

#[tokio::test]
async fn test_producer_publish_is_acknowledged() {
    let broker = TestBroker::start().await;
    let mut producer = Producer::connect(broker.addr_string(), "orders").await.unwrap();

    assert!(producer.is_connected());
    assert_eq!(producer.topic(), "orders");
    assert!(producer.publish(b"one").await.unwrap());
    assert!(producer.publish(Vec::<u8>::new()).await.unwrap());

    let queue = std::sync::Arc::clone(broker.registry.resolve("orders").queue());
    assert_eq!(queue.len(), 2);
}

#[tokio::test]
async fn test_operations_after_close_fail_cleanly() {
    let broker = TestBroker::start().await;
    let mut producer = Producer::connect(broker.addr_string(), "t").await.unwrap();
    let mut subscriber = Subscriber::connect(broker.addr_string(), "t").await.unwrap();

    producer.close().await;
    producer.close().await;
    subscriber.close().await;
    subscriber.close().await;

    assert!(!producer.is_connected());
    assert!(!subscriber.is_connected());
    assert!(matches!(
        producer.publish(b"late").await,
        Err(BrokerError::NotConnected)
    ));
    assert!(matches!(
        subscriber.consume(|_| {}).await,
        Err(BrokerError::NotConnected)
    ));
}

#[tokio::test]
async fn test_reconnect_switches_topic() {
    let broker = TestBroker::start().await;
    let mut producer = Producer::connect(broker.addr_string(), "a").await.unwrap();
    producer.close().await;

    producer.reconnect("b").await.unwrap();
    assert_eq!(producer.topic(), "b");
    assert!(producer.publish(b"to b").await.unwrap());

    assert!(broker.registry.resolve("a").queue().is_empty());
    assert_eq!(broker.registry.resolve("b").queue().len(), 1);
}

#[tokio::test]
async fn test_consume_until_can_resume() {
    let broker = TestBroker::start().await;
    let mut producer = Producer::connect(broker.addr_string(), "resume").await.unwrap();
    for payload in ["a", "b", "c"] {
        assert!(producer.publish(payload).await.unwrap());
    }

    let mut subscriber = Subscriber::connect(broker.addr_string(), "resume").await.unwrap();
    let mut first = Vec::new();
    let handled = subscriber
        .consume_until(|message| {
            first.push(message);
            ControlFlow::Break(())
        })
        .await
        .unwrap();
    assert_eq!(handled, 1);
    assert!(subscriber.is_connected());

    let mut rest = Vec::new();
    subscriber
        .consume_until(|message| {
            rest.push(message);
            if rest.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await
        .unwrap();

    assert_eq!(first, vec![Bytes::from_static(b"a")]);
    assert_eq!(rest, vec![Bytes::from_static(b"b"), Bytes::from_static(b"c")]);
}

#[tokio::test]
async fn test_rejected_role_surfaces_as_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut conn = FramedStream::new(stream);
        expect_frame(&mut conn, PUB).await;
        conn.send(FAILED).await.unwrap();
    });

    match Producer::connect(addr, "t").await {
        Err(BrokerError::HandshakeRejected { step, reply }) => {
            assert_eq!(step, "role");
            assert_eq!(reply, "failed");
        }
        other => panic!("expected HandshakeRejected, got {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_consume_acks_each_message_and_stops_on_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    // a scripted broker that checks every step the subscriber takes
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut conn = FramedStream::new(stream);
        expect_frame(&mut conn, SUB).await;
        conn.send(OK).await.unwrap();
        expect_frame(&mut conn, b"jobs").await;
        conn.send(OK).await.unwrap();
        expect_frame(&mut conn, PREPARED).await;

        for payload in [&b"first"[..], b"second"] {
            conn.send(payload).await.unwrap();
            expect_frame(&mut conn, OK).await;
        }
        conn.shutdown().await.unwrap();
    });

    let mut subscriber = Subscriber::connect(addr, "jobs").await.unwrap();
    let mut received = Vec::new();
    let handled = subscriber.consume(|m| received.push(m)).await.unwrap();

    assert_eq!(handled, 2);
    assert_eq!(
        received,
        vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")]
    );
    assert!(!subscriber.is_connected());
    server.await.unwrap();
}

#[tokio::test]
async fn test_publish_reports_negative_ack() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut conn = FramedStream::new(stream);
        expect_frame(&mut conn, PUB).await;
        conn.send(OK).await.unwrap();
        expect_frame(&mut conn, b"t").await;
        conn.send(OK).await.unwrap();
        expect_frame(&mut conn, b"msg").await;
        conn.send(FAILED).await.unwrap();
        // wait for the client to go away
        let _ = conn.recv().await;
    });

    let mut producer = Producer::connect(addr, "t").await.unwrap();
    assert!(!producer.publish(b"msg").await.unwrap());
    assert!(producer.is_connected());
    producer.close().await;
    server.await.unwrap();
}
