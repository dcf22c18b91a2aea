//! Relay fan-out integration tests over real WebSocket connections.

use std::time::Duration;

use anyhow::{Result, ensure};
use futures::StreamExt;
use tokio_tungstenite::connect_async;

use pointstream::Relay;

type Ws = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Publish until the subscriber sees a payload, bounded by an overall
/// timeout. Subscription registration races the first publish, so a
/// single-shot publish would be flaky.
async fn publish_until_received(relay: &Relay, ws: &mut Ws, payload: Vec<u8>) -> Result<Vec<u8>> {
    let handle = relay.handle();
    let received = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            handle.publish(payload.clone()).await;
            if let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_millis(50), ws.next()).await
            {
                return msg;
            }
        }
    })
    .await?;
    Ok(received.into_data())
}

#[tokio::test]
async fn subscribers_receive_published_payloads() -> Result<()> {
    let relay = Relay::bind("127.0.0.1:0".parse()?).await?;
    let url = format!("ws://{}", relay.local_addr());

    let (mut ws, _) = connect_async(&url).await?;
    let payload = vec![0xDEu8, 0xAD, 0xBE, 0xEF];
    let received = publish_until_received(&relay, &mut ws, payload.clone()).await?;

    ensure!(received == payload, "subscriber received {received:?}");
    Ok(())
}

#[tokio::test]
async fn multiple_subscribers_all_receive_the_fanout() -> Result<()> {
    let relay = Relay::bind("127.0.0.1:0".parse()?).await?;
    let url = format!("ws://{}", relay.local_addr());

    let (mut first, _) = connect_async(&url).await?;
    let (mut second, _) = connect_async(&url).await?;

    let payload = b"frame payload".to_vec();
    let from_first = publish_until_received(&relay, &mut first, payload.clone()).await?;
    ensure!(from_first == payload);

    // The second subscriber was registered for at least the publish that
    // reached the first, so a bounded read must yield the same payload.
    let from_second = tokio::time::timeout(Duration::from_secs(5), second.next())
        .await?
        .expect("open stream")?;
    ensure!(from_second.into_data() == payload);
    Ok(())
}

#[tokio::test]
async fn shutdown_stops_delivery() -> Result<()> {
    let relay = Relay::bind("127.0.0.1:0".parse()?).await?;
    let handle = relay.handle();

    relay.shutdown();

    // The delivery loop drains away after cancellation; publishing must
    // eventually report the relay gone rather than hang.
    let stopped = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if !handle.publish(vec![1, 2, 3]).await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    ensure!(stopped);
    Ok(())
}
