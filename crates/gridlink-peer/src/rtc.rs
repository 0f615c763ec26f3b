//! WebRTC data-channel connections.
//!
//! Signaling here is manual (codes pasted between humans), so there is no
//! candidate trickling: each side waits — bounded — for ICE gathering to
//! finish and ships one *complete* description. The exchange is:
//!
//! ```text
//! host: create_offer() ──code──→ guest: accept_offer() ──code──→ host: accept_answer()
//! ```
//!
//! After that the channel opens on both sides and the role distinction
//! disappears: both ends are just a [`PeerLink`].

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;

use gridlink_protocol::deserialize_message;

use crate::{fire_close_once, LinkState, PeerConfig, PeerError, PeerHandlers, PeerLink};

impl From<RTCPeerConnectionState> for LinkState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => LinkState::New,
            RTCPeerConnectionState::Connecting => LinkState::Connecting,
            RTCPeerConnectionState::Connected => LinkState::Connected,
            RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
            RTCPeerConnectionState::Failed => LinkState::Failed,
            RTCPeerConnectionState::Closed => LinkState::Closed,
        }
    }
}

/// Builds the peer connection and wires the state-change plumbing shared by
/// both roles.
async fn new_peer_connection(
    config: &PeerConfig,
    handlers: &Arc<PeerHandlers>,
    closed: &Arc<AtomicBool>,
) -> Result<Arc<RTCPeerConnection>, PeerError> {
    let api = APIBuilder::new().build();
    let mut rtc_config = RTCConfiguration::default();
    if !config.stun_servers.is_empty() {
        rtc_config.ice_servers = vec![RTCIceServer {
            urls: config.stun_servers.clone(),
            ..Default::default()
        }];
    }
    let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

    let h = Arc::clone(handlers);
    let closed = Arc::clone(closed);
    pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
        let state = LinkState::from(s);
        tracing::debug!(%state, "peer connection state changed");
        (h.on_state_change)(state);
        // Two native failure signals (state change, channel close) collapse
        // into a single close event for the layer above.
        if matches!(state, LinkState::Disconnected | LinkState::Failed) {
            fire_close_once(&closed, &h);
        }
        Box::pin(async {})
    }));

    Ok(pc)
}

/// Attaches the message/open/close/error plumbing to a data channel.
fn wire_channel(
    channel: &Arc<RTCDataChannel>,
    handlers: &Arc<PeerHandlers>,
    closed: &Arc<AtomicBool>,
) {
    let h = Arc::clone(handlers);
    channel.on_open(Box::new(move || {
        tracing::info!("data channel open");
        (h.on_open)();
        Box::pin(async {})
    }));

    let h = Arc::clone(handlers);
    channel.on_message(Box::new(move |msg: DataChannelMessage| {
        match std::str::from_utf8(&msg.data)
            .ok()
            .and_then(deserialize_message)
        {
            Some(parsed) => (h.on_message)(parsed),
            // Already rejected by the type guard; nothing above can act
            // on a garbled frame, so it stops here.
            None => tracing::debug!(len = msg.data.len(), "dropping malformed frame"),
        }
        Box::pin(async {})
    }));

    let h = Arc::clone(handlers);
    let closed = Arc::clone(closed);
    channel.on_close(Box::new(move || {
        tracing::info!("data channel closed");
        fire_close_once(&closed, &h);
        Box::pin(async {})
    }));

    let h = Arc::clone(handlers);
    channel.on_error(Box::new(move |err: webrtc::Error| {
        tracing::warn!(error = %err, "data channel error");
        (h.on_error)(PeerError::Rtc(err));
        Box::pin(async {})
    }));
}

/// Waits for ICE gathering to complete, up to `timeout`.
///
/// On timeout the flow proceeds with the candidates gathered so far — a
/// stalled gatherer must never hang negotiation indefinitely.
async fn wait_for_gathering(mut done: tokio::sync::mpsc::Receiver<()>, timeout: Duration) {
    if tokio::time::timeout(timeout, done.recv()).await.is_err() {
        tracing::warn!(
            timeout_secs = timeout.as_secs(),
            "ICE gathering did not complete in time, continuing with partial candidates"
        );
    }
}

// ---------------------------------------------------------------------------
// HostConnection
// ---------------------------------------------------------------------------

/// The offer-creating side of a connection.
///
/// The host creates the data channel up front, so the channel exists before
/// the offer is generated and rides along inside it.
pub struct HostConnection {
    pc: Arc<RTCPeerConnection>,
    channel: Arc<RTCDataChannel>,
    gathering_timeout: Duration,
}

impl HostConnection {
    /// Builds the peer connection and the `"game"` data channel
    /// (ordered, reliable), wiring `handlers` to both.
    pub async fn connect(config: PeerConfig, handlers: PeerHandlers) -> Result<Self, PeerError> {
        let handlers = Arc::new(handlers);
        let closed = Arc::new(AtomicBool::new(false));
        let pc = new_peer_connection(&config, &handlers, &closed).await?;

        let init = RTCDataChannelInit {
            ordered: Some(true),
            ..Default::default()
        };
        let channel = pc
            .create_data_channel(&config.channel_label, Some(init))
            .await?;
        wire_channel(&channel, &handlers, &closed);

        Ok(Self {
            pc,
            channel,
            gathering_timeout: config.gathering_timeout,
        })
    }

    /// Generates the offer: creates it, installs it locally, waits (bounded)
    /// for candidate gathering, and returns the complete SDP ready for
    /// encoding into a session code.
    pub async fn create_offer(&self) -> Result<String, PeerError> {
        let offer = self.pc.create_offer(None).await?;
        // Gathering starts when the local description is set; register for
        // the completion signal first so it cannot be missed.
        let gathered = self.pc.gathering_complete_promise().await;
        self.pc.set_local_description(offer).await?;
        wait_for_gathering(gathered, self.gathering_timeout).await;

        let local = self
            .pc
            .local_description()
            .await
            .ok_or(PeerError::MissingDescription)?;
        tracing::info!(sdp_len = local.sdp.len(), "offer ready");
        Ok(local.sdp)
    }

    /// Applies the guest's answer — the second half of the host-side
    /// handshake. After this, the connection proceeds on its own.
    ///
    /// # Errors
    /// Fails if the SDP does not parse or the connection is in no state to
    /// accept a remote description (e.g. `create_offer` was never called) —
    /// the latter is a caller bug, surfaced as an error rather than hidden.
    pub async fn accept_answer(&self, sdp: &str) -> Result<(), PeerError> {
        let answer = RTCSessionDescription::answer(sdp.to_string())?;
        self.pc.set_remote_description(answer).await?;
        tracing::info!("answer applied, waiting for channel to open");
        Ok(())
    }
}

impl PeerLink for HostConnection {
    async fn send(&self, message: &gridlink_protocol::GameMessage) -> Result<(), PeerError> {
        if self.channel.ready_state() != RTCDataChannelState::Open {
            return Err(PeerError::ChannelClosed);
        }
        let frame = gridlink_protocol::serialize_message(message)?;
        self.channel.send_text(frame).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.pc.close().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GuestConnection
// ---------------------------------------------------------------------------

/// The answer-creating side of a connection.
///
/// The guest does not create a channel; it receives the host's channel via
/// the `on_data_channel` event once the connection comes up.
pub struct GuestConnection {
    pc: Arc<RTCPeerConnection>,
    channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    gathering_timeout: Duration,
}

impl GuestConnection {
    /// Builds the peer connection and registers for the host's data channel.
    pub async fn connect(config: PeerConfig, handlers: PeerHandlers) -> Result<Self, PeerError> {
        let handlers = Arc::new(handlers);
        let closed = Arc::new(AtomicBool::new(false));
        let pc = new_peer_connection(&config, &handlers, &closed).await?;

        let slot: Arc<Mutex<Option<Arc<RTCDataChannel>>>> = Arc::new(Mutex::new(None));

        let h = Arc::clone(&handlers);
        let c = Arc::clone(&closed);
        let s = Arc::clone(&slot);
        pc.on_data_channel(Box::new(move |channel: Arc<RTCDataChannel>| {
            tracing::debug!(label = channel.label(), "remote data channel announced");
            wire_channel(&channel, &h, &c);
            let s = Arc::clone(&s);
            Box::pin(async move {
                *s.lock().await = Some(channel);
            })
        }));

        Ok(Self {
            pc,
            channel: slot,
            gathering_timeout: config.gathering_timeout,
        })
    }

    /// Consumes the host's offer and produces the complete answer SDP,
    /// with the same bounded gathering wait as the host side.
    pub async fn accept_offer(&self, sdp: &str) -> Result<String, PeerError> {
        let offer = RTCSessionDescription::offer(sdp.to_string())?;
        self.pc.set_remote_description(offer).await?;

        let answer = self.pc.create_answer(None).await?;
        let gathered = self.pc.gathering_complete_promise().await;
        self.pc.set_local_description(answer).await?;
        wait_for_gathering(gathered, self.gathering_timeout).await;

        let local = self
            .pc
            .local_description()
            .await
            .ok_or(PeerError::MissingDescription)?;
        tracing::info!(sdp_len = local.sdp.len(), "answer ready");
        Ok(local.sdp)
    }
}

impl PeerLink for GuestConnection {
    async fn send(&self, message: &gridlink_protocol::GameMessage) -> Result<(), PeerError> {
        let channel = {
            let slot = self.channel.lock().await;
            slot.as_ref().cloned().ok_or(PeerError::ChannelClosed)?
        };
        if channel.ready_state() != RTCDataChannelState::Open {
            return Err(PeerError::ChannelClosed);
        }
        let frame = gridlink_protocol::serialize_message(message)?;
        channel.send_text(frame).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.pc.close().await?;
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
