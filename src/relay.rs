//! WebSocket fan-out relay for decoded frames.
//!
//! An owned service with its own lifecycle: [`Relay::bind`] starts an
//! accept loop and a delivery task, [`RelayHandle::publish`] queues binary
//! payloads for fan-out, and dropping the relay (or calling
//! [`Relay::shutdown`]) cancels everything. Each subscriber gets its own
//! bounded queue and writer task, so one slow viewer sheds its own
//! payloads instead of stalling delivery to the rest.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, StreamError};

/// Queue depth per subscriber; overflow drops the payload for that
/// subscriber only.
const SUBSCRIBER_QUEUE_LEN: usize = 64;

/// Publish-side queue feeding the delivery task.
const PUBLISH_QUEUE_LEN: usize = 256;

type SubscriberMap = Arc<Mutex<HashMap<u64, mpsc::Sender<Vec<u8>>>>>;

/// Running relay service.
pub struct Relay {
    local_addr: SocketAddr,
    handle: RelayHandle,
    cancel: CancellationToken,
}

/// Cloneable publishing handle into a running [`Relay`].
#[derive(Clone)]
pub struct RelayHandle {
    publish_tx: mpsc::Sender<Vec<u8>>,
}

impl RelayHandle {
    /// Queue a binary payload for delivery to every current subscriber.
    ///
    /// Payloads of arbitrary length are accepted and never acknowledged.
    /// Returns `false` once the relay has shut down.
    pub async fn publish(&self, payload: Vec<u8>) -> bool {
        self.publish_tx.send(payload).await.is_ok()
    }
}

impl Relay {
    /// Bind the viewer endpoint and start the relay's tasks.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| StreamError::transport_with_source(format!("relay bind {addr}"), Box::new(e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| StreamError::transport_with_source("relay local address", Box::new(e)))?;

        info!("relay listening on ws://{local_addr}");

        let subscribers: SubscriberMap = Arc::new(Mutex::new(HashMap::new()));
        let (publish_tx, publish_rx) = mpsc::channel(PUBLISH_QUEUE_LEN);
        let cancel = CancellationToken::new();

        tokio::spawn(accept_loop(listener, Arc::clone(&subscribers), cancel.clone()));
        tokio::spawn(delivery_loop(publish_rx, subscribers, cancel.clone()));

        Ok(Self { local_addr, handle: RelayHandle { publish_tx }, cancel })
    }

    /// Address the viewer endpoint actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A publishing handle usable from any task.
    pub fn handle(&self) -> RelayHandle {
        self.handle.clone()
    }

    /// Stop the accept loop, the delivery task, and every subscriber.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        debug!("dropping relay");
        self.cancel.cancel();
    }
}

async fn accept_loop(listener: TcpListener, subscribers: SubscriberMap, cancel: CancellationToken) {
    let mut next_id = 0u64;
    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, peer)) => {
                next_id += 1;
                tokio::spawn(subscriber_task(
                    next_id,
                    stream,
                    peer,
                    Arc::clone(&subscribers),
                    cancel.clone(),
                ));
            }
            Err(e) => warn!("relay accept failed: {e}"),
        }
    }
    debug!("relay accept loop ended");
}

/// One task per viewer: handshake, register, forward the bounded queue
/// into the socket, unregister on any exit path.
async fn subscriber_task(
    id: u64,
    stream: TcpStream,
    peer: SocketAddr,
    subscribers: SubscriberMap,
    cancel: CancellationToken,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("websocket handshake with {peer} failed: {e}");
            return;
        }
    };
    info!("viewer {peer} subscribed");

    let (queue_tx, queue_rx) = mpsc::channel::<Vec<u8>>(SUBSCRIBER_QUEUE_LEN);
    subscribers.lock().await.insert(id, queue_tx);

    let (mut sink, mut source) = ws.split();
    let mut outbound =
        ReceiverStream::new(queue_rx).map(|payload| Ok::<_, tungstenite::Error>(Message::Binary(payload)));

    tokio::select! {
        _ = cancel.cancelled() => {}
        result = sink.send_all(&mut outbound) => {
            if let Err(e) = result {
                debug!("viewer {peer} write failed: {e}");
            }
        }
        // Inbound traffic from viewers is read and discarded; a close or
        // read error ends the subscription.
        _ = async {
            while let Some(msg) = source.next().await {
                if msg.is_err() {
                    break;
                }
            }
        } => {}
    }

    subscribers.lock().await.remove(&id);
    info!("viewer {peer} unsubscribed");
}

async fn delivery_loop(
    mut publish_rx: mpsc::Receiver<Vec<u8>>,
    subscribers: SubscriberMap,
    cancel: CancellationToken,
) {
    loop {
        let payload = tokio::select! {
            _ = cancel.cancelled() => break,
            payload = publish_rx.recv() => match payload {
                Some(payload) => payload,
                None => break,
            },
        };

        let subs = subscribers.lock().await;
        for (id, queue) in subs.iter() {
            match queue.try_send(payload.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("viewer {id}: queue full, dropping payload");
                }
                // A closed queue means the subscriber task is already
                // unregistering itself.
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }
    debug!("relay delivery loop ended");
}
