//! An in-process [`PeerLink`] pair.
//!
//! Two linked endpoints over tokio channels: ordered, reliable, no
//! negotiation, no network. Messages still travel as serialized frames and
//! pass through the same deserialize-or-drop gate as the real transport, so
//! everything above the link behaves identically. This is what drives the
//! session controller in tests and same-process demos.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use gridlink_protocol::{deserialize_message, serialize_message, GameMessage};

use crate::{fire_close_once, LinkState, PeerError, PeerHandlers, PeerLink};

/// One endpoint of an in-process pair. See [`MemoryLink::pair`].
pub struct MemoryLink {
    /// Outbound frames toward the peer. `None` once closed.
    tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    handlers: Arc<PeerHandlers>,
    closed: Arc<AtomicBool>,
}

impl MemoryLink {
    /// Creates two connected endpoints.
    ///
    /// Both sides' `on_open` (and a `Connected` state change) fire from a
    /// spawned task, mirroring the asynchronous open of a real channel —
    /// callers get their link back before the open event lands.
    ///
    /// Must be called from within a tokio runtime.
    pub fn pair(a: PeerHandlers, b: PeerHandlers) -> (MemoryLink, MemoryLink) {
        let a = Arc::new(a);
        let b = Arc::new(b);
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();

        // a sends into a_tx, b receives from a_rx; and vice versa.
        let link_a = MemoryLink::new(a_tx, Arc::clone(&a));
        let link_b = MemoryLink::new(b_tx, Arc::clone(&b));

        tokio::spawn(pump(a_rx, Arc::clone(&b), Arc::clone(&link_b.closed)));
        tokio::spawn(pump(b_rx, Arc::clone(&a), Arc::clone(&link_a.closed)));

        tokio::spawn(announce_open(a));
        tokio::spawn(announce_open(b));

        (link_a, link_b)
    }

    fn new(tx: mpsc::UnboundedSender<String>, handlers: Arc<PeerHandlers>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
            handlers,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }
}

async fn announce_open(handlers: Arc<PeerHandlers>) {
    (handlers.on_state_change)(LinkState::Connected);
    (handlers.on_open)();
}

/// Delivers inbound frames to one side until the peer's sender is gone,
/// then reports the disconnection.
async fn pump(
    mut rx: mpsc::UnboundedReceiver<String>,
    handlers: Arc<PeerHandlers>,
    closed: Arc<AtomicBool>,
) {
    while let Some(frame) = rx.recv().await {
        match deserialize_message(&frame) {
            Some(msg) => (handlers.on_message)(msg),
            None => tracing::debug!(len = frame.len(), "dropping malformed frame"),
        }
    }
    (handlers.on_state_change)(LinkState::Disconnected);
    fire_close_once(&closed, &handlers);
}

impl PeerLink for MemoryLink {
    async fn send(&self, message: &GameMessage) -> Result<(), PeerError> {
        let frame = serialize_message(message)?;
        let tx = self.tx.lock().expect("memory link lock poisoned");
        match tx.as_ref() {
            Some(tx) => tx.send(frame).map_err(|_| PeerError::ChannelClosed),
            None => Err(PeerError::ChannelClosed),
        }
    }

    async fn close(&self) -> Result<(), PeerError> {
        // Dropping the sender ends the peer's pump, which fires *their*
        // close event; ours fires here.
        self.tx.lock().expect("memory link lock poisoned").take();
        (self.handlers.on_state_change)(LinkState::Closed);
        fire_close_once(&self.closed, &self.handlers);
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;

    /// Handlers that forward every event into inspectable channels.
    struct Probe {
        opened: mpsc::UnboundedReceiver<()>,
        messages: mpsc::UnboundedReceiver<GameMessage>,
        closes: mpsc::UnboundedReceiver<()>,
    }

    fn probed_handlers() -> (PeerHandlers, Probe) {
        let (open_tx, opened) = unbounded_channel();
        let (msg_tx, messages) = unbounded_channel();
        let (close_tx, closes) = unbounded_channel();
        let handlers = PeerHandlers::new()
            .on_open(move || {
                let _ = open_tx.send(());
            })
            .on_message(move |m| {
                let _ = msg_tx.send(m);
            })
            .on_close(move || {
                let _ = close_tx.send(());
            });
        (
            handlers,
            Probe {
                opened,
                messages,
                closes,
            },
        )
    }

    async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel ended")
    }

    #[tokio::test]
    async fn test_pair_fires_on_open_on_both_sides() {
        let (ha, mut pa) = probed_handlers();
        let (hb, mut pb) = probed_handlers();
        let (_a, _b) = MemoryLink::pair(ha, hb);

        recv(&mut pa.opened).await;
        recv(&mut pb.opened).await;
    }

    #[tokio::test]
    async fn test_send_delivers_in_order() {
        let (ha, _pa) = probed_handlers();
        let (hb, mut pb) = probed_handlers();
        let (a, _b) = MemoryLink::pair(ha, hb);

        for n in 1..=3 {
            a.send(&GameMessage::move_at(n, gridlink_protocol::Mark::X, n.into()))
                .await
                .unwrap();
        }

        for n in 1..=3u8 {
            let msg = recv(&mut pb.messages).await;
            assert_eq!(
                msg,
                GameMessage::move_at(n, gridlink_protocol::Mark::X, n.into())
            );
        }
    }

    #[tokio::test]
    async fn test_close_fires_close_on_both_sides() {
        let (ha, mut pa) = probed_handlers();
        let (hb, mut pb) = probed_handlers();
        let (a, _b) = MemoryLink::pair(ha, hb);

        a.close().await.unwrap();

        recv(&mut pa.closes).await;
        recv(&mut pb.closes).await;
    }

    #[tokio::test]
    async fn test_send_after_close_is_channel_closed() {
        let (ha, _pa) = probed_handlers();
        let (hb, _pb) = probed_handlers();
        let (a, _b) = MemoryLink::pair(ha, hb);

        a.close().await.unwrap();
        let result = a.send(&GameMessage::game_reset()).await;
        assert!(matches!(result, Err(PeerError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_peer_drop_fires_close_on_survivor() {
        // The "peer vanished" case: no goodbye message, the other end just
        // goes away. The survivor still gets exactly one close event.
        let (ha, mut pa) = probed_handlers();
        let (hb, _pb) = probed_handlers();
        let (_a, b) = MemoryLink::pair(ha, hb);

        drop(b);

        recv(&mut pa.closes).await;
    }
}
