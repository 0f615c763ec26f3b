//! Host and join entry points: assembling a session over WebRTC.
//!
//! These tie the layers together the way a frontend uses them:
//!
//! ```text
//! host_session() ──session_code──→ (any out-of-band channel)
//!                                        │
//!                             join_session(session_code)
//!                                        │
//! complete(answer_code) ←──answer_code──┘
//! ```
//!
//! Both functions return before the remote side exists; the rest of the
//! lifecycle arrives through the [`SessionCallbacks`] the caller supplied.

use std::sync::Arc;

use gridlink_peer::{GuestConnection, HostConnection, PeerConfig};
use gridlink_protocol::SessionId;
use gridlink_signaling::{decode_session_code, encode_session_description, SdpKind};

use crate::{
    ConnectionStatus, GridlinkError, RemoteSessionController, Role, SessionCallbacks,
    SessionError,
};

/// A hosted session waiting for its guest.
pub struct HostedSession {
    /// The offer code to share out of band.
    pub session_code: String,
    /// The generated session label (also the code's prefix).
    pub session_id: SessionId,
    /// The controller driving this session.
    pub controller: RemoteSessionController<HostConnection>,
    connection: Arc<HostConnection>,
}

impl HostedSession {
    /// Feeds the guest's answer code in — the second half of the host-side
    /// handshake. After this the transport connects on its own and the
    /// channel-open event lands through the callbacks.
    ///
    /// # Errors
    /// Rejects codes that do not decode, that hold an offer instead of an
    /// answer, or that belong to a different session.
    pub async fn complete(&self, answer_code: &str) -> Result<(), GridlinkError> {
        let decoded =
            decode_session_code(answer_code).ok_or(SessionError::MalformedCode)?;
        if decoded.kind != SdpKind::Answer {
            return Err(SessionError::WrongCodeKind { expected: "answer" }.into());
        }
        if decoded.id != self.session_id {
            return Err(SessionError::SessionIdMismatch.into());
        }
        self.controller.set_status(ConnectionStatus::Connecting);
        self.connection.accept_answer(&decoded.sdp).await?;
        Ok(())
    }
}

/// A joined session waiting for the transport to come up.
pub struct JoinedSession {
    /// The answer code to send back to the host out of band.
    pub answer_code: String,
    /// The session label, taken from the host's code.
    pub session_id: SessionId,
    /// The controller driving this session.
    pub controller: RemoteSessionController<GuestConnection>,
}

/// Starts hosting: builds the connection and data channel, generates a
/// session id, produces the offer, and encodes it into a shareable code.
///
/// Returns as soon as the code is ready — long before a guest shows up.
pub async fn host_session(
    local_name: &str,
    config: PeerConfig,
    callbacks: SessionCallbacks,
) -> Result<HostedSession, GridlinkError> {
    let session_id = SessionId::generate();
    tracing::info!(%session_id, "hosting session");

    let controller = RemoteSessionController::new(
        Role::Host,
        local_name,
        session_id.clone(),
        callbacks,
    );
    let connection =
        Arc::new(HostConnection::connect(config, controller.peer_handlers()).await?);
    controller.attach_link(Arc::clone(&connection));

    let offer_sdp = connection.create_offer().await?;
    let session_code = encode_session_description(SdpKind::Offer, &offer_sdp, &session_id);
    controller.set_session_code(session_code.clone());
    controller.set_status(ConnectionStatus::WaitingForPeer);

    Ok(HostedSession {
        session_code,
        session_id,
        controller,
        connection,
    })
}

/// Joins a hosted session from its code: decodes the offer, builds the
/// guest connection, and produces the answer code to send back.
///
/// # Errors
/// Rejects codes that do not decode or that hold an answer instead of an
/// offer.
pub async fn join_session(
    session_code: &str,
    local_name: &str,
    config: PeerConfig,
    callbacks: SessionCallbacks,
) -> Result<JoinedSession, GridlinkError> {
    let decoded = decode_session_code(session_code).ok_or(SessionError::MalformedCode)?;
    if decoded.kind != SdpKind::Offer {
        return Err(SessionError::WrongCodeKind { expected: "offer" }.into());
    }
    let session_id = decoded.id.clone();
    tracing::info!(%session_id, "joining session");

    let controller = RemoteSessionController::new(
        Role::Guest,
        local_name,
        session_id.clone(),
        callbacks,
    );
    let connection =
        Arc::new(GuestConnection::connect(config, controller.peer_handlers()).await?);
    controller.attach_link(Arc::clone(&connection));

    let answer_sdp = connection.accept_offer(&decoded.sdp).await?;
    let answer_code = encode_session_description(SdpKind::Answer, &answer_sdp, &session_id);
    controller.set_session_code(answer_code.clone());
    controller.set_status(ConnectionStatus::Connecting);

    Ok(JoinedSession {
        answer_code,
        session_id,
        controller,
    })
}
