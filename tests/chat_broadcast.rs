//! Integration tests for join/leave/chat broadcast.

mod common;

use common::TestServer;
use ndfa_proto::{ServerEvent, ServerMessage};
use std::time::Duration;

#[tokio::test]
async fn test_join_is_announced_to_existing_sessions() {
    let server = TestServer::spawn(25521).await.expect("Failed to spawn test server");
    let mut alice = server.connect("alice").await.expect("Failed to connect alice");
    let _bob = server.connect("bob").await.expect("Failed to connect bob");

    match alice.recv_event().await.unwrap() {
        ServerEvent::Join { nick, time } => {
            assert_eq!(nick, "bob");
            assert_eq!(time.len(), 8);
        }
        other => panic!("expected join, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_reaches_everyone_including_sender() {
    let server = TestServer::spawn(25522).await.expect("Failed to spawn test server");
    let mut alice = server.connect("alice").await.expect("Failed to connect alice");
    let mut bob = server.connect("bob").await.expect("Failed to connect bob");
    alice.expect_join("bob").await.unwrap();

    alice.chat("hello everyone").await.unwrap();

    for client in [&mut alice, &mut bob] {
        match client.recv_event().await.unwrap() {
            ServerEvent::Chat { nick, text, .. } => {
                assert_eq!(nick, "alice");
                assert_eq!(text, "hello everyone");
            }
            other => panic!("expected chat, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_chat_order_is_preserved_per_sender() {
    let server = TestServer::spawn(25523).await.expect("Failed to spawn test server");
    let mut alice = server.connect("alice").await.expect("Failed to connect alice");
    let mut bob = server.connect("bob").await.expect("Failed to connect bob");
    alice.expect_join("bob").await.unwrap();

    for i in 0..20 {
        alice.chat(&format!("line {i}")).await.unwrap();
    }
    for i in 0..20 {
        match bob.recv_event().await.unwrap() {
            ServerEvent::Chat { text, .. } => assert_eq!(text, format!("line {i}")),
            other => panic!("expected chat, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_leave_is_announced_when_client_quits() {
    let server = TestServer::spawn(25524).await.expect("Failed to spawn test server");
    let mut alice = server.connect("alice").await.expect("Failed to connect alice");
    let bob = server.connect("bob").await.expect("Failed to connect bob");
    alice.expect_join("bob").await.unwrap();

    bob.quit().await.unwrap();

    match alice.recv_event().await.unwrap() {
        ServerEvent::Leave { nick, .. } => assert_eq!(nick, "bob"),
        other => panic!("expected leave, got {other:?}"),
    }
}

#[tokio::test]
async fn test_blank_chat_is_not_broadcast() {
    let server = TestServer::spawn(25525).await.expect("Failed to spawn test server");
    let mut alice = server.connect("alice").await.expect("Failed to connect alice");

    alice.chat("   ").await.unwrap();
    assert!(alice.recv_timeout(Duration::from_millis(300)).await.is_err());
}

#[tokio::test]
async fn test_vanished_client_does_not_break_others() {
    let server = TestServer::spawn(25526).await.expect("Failed to spawn test server");
    let mut alice = server.connect("alice").await.expect("Failed to connect alice");
    let bob = server.connect("bob").await.expect("Failed to connect bob");
    let mut carol = server.connect("carol").await.expect("Failed to connect carol");
    alice.expect_join("carol").await.unwrap();

    // Drop without a clean shutdown.
    drop(bob);

    alice.chat("still here").await.unwrap();

    let messages = carol
        .recv_until(|m| {
            matches!(m, ServerMessage::Event(ServerEvent::Chat { text, .. }) if text == "still here")
        })
        .await
        .unwrap();
    assert!(!messages.is_empty());
}

#[tokio::test]
async fn test_validation_results_are_not_broadcast() {
    let server = TestServer::spawn(25527).await.expect("Failed to spawn test server");
    let mut alice = server.connect("alice").await.expect("Failed to connect alice");
    let mut bob = server.connect("bob").await.expect("Failed to connect bob");
    alice.expect_join("bob").await.unwrap();

    alice.send_frame(br#"{"user":{"id":1}}"#).await.unwrap();
    let result = alice.recv_result().await.unwrap();
    assert_eq!(result.id, 1);

    assert!(bob.recv_timeout(Duration::from_millis(300)).await.is_err());
}
