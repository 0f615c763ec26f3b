//! The session controller: one instance per session, owning everything the
//! two peers must agree on.
//!
//! The controller sits between the UI and the peer link. Control flows down
//! (`send_move`, `request_rematch`, `leave`), events flow back up through
//! [`SessionCallbacks`]. It owns the move counter, the expected-turn mark,
//! and a shadow board mirroring accepted moves — the state both boards must
//! agree on — and resets all three together on every accepted rematch.
//!
//! Every inbound message is treated as adversarial: moves pass
//! [`validate_move`] against the shadow board before they reach the UI, and
//! a violation is surfaced through the error callback rather than silently
//! dropped — a bad sequence number means the two boards have diverged and
//! the session should be considered compromised.

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use tokio::sync::watch;

use gridlink_peer::{LinkState, PeerError, PeerHandlers, PeerLink};
use gridlink_protocol::{
    validate_move, Board, DisconnectReason, GameMessage, Mark, SessionId, BOARD_CELLS,
    PROTOCOL_VERSION,
};

use crate::{
    BoardView, ConnectionStatus, DisconnectKind, GamePhase, GridlinkError, PlayerRecord,
    RemoteSession, Role, SessionCallbacks, SessionError,
};

/// How long the handshake sender will wait for a link to be attached after
/// the channel reports open. Only relevant in the narrow window between
/// link construction and [`RemoteSessionController::attach_link`].
const LINK_WAIT: Duration = Duration::from_secs(5);

/// Rematch negotiation state.
///
/// The interesting transition is the race: both sides request at the same
/// time, so each receives a request while its own is outstanding. That is
/// mutual consent — both reset immediately, nobody waits for a response,
/// and no response is sent (the peer resolves the race the same way).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RematchState {
    Idle,
    WeRequested,
    TheyRequested,
}

/// Mutable per-session state. Guarded by one mutex; never held across an
/// `.await` or a callback invocation.
struct SessionState {
    status: ConnectionStatus,
    session_code: Option<String>,
    local: PlayerRecord,
    remote: Option<PlayerRecord>,
    error: Option<String>,
    /// Accepted moves so far; the next inbound move must carry
    /// `move_count + 1`.
    move_count: u32,
    /// Whose move the next one must be.
    expected_mark: Mark,
    /// Mirror of accepted moves, used to validate inbound cell targets.
    board: Board,
    rematch: RematchState,
    /// Set once teardown has been reported (goodbye received, we left, or
    /// the transport died) so later signals do not double-report.
    teardown_seen: bool,
}

struct Shared<L> {
    session_id: SessionId,
    role: Role,
    callbacks: SessionCallbacks,
    link: OnceLock<Arc<L>>,
    link_ready: watch::Sender<bool>,
    state: Mutex<SessionState>,
}

/// The per-session orchestrator. Cheap to clone; clones share one session.
///
/// Generic over [`PeerLink`] so the same controller runs over a WebRTC
/// data channel in production and an in-memory pair in tests.
pub struct RemoteSessionController<L: PeerLink> {
    shared: Arc<Shared<L>>,
}

impl<L: PeerLink> Clone for RemoteSessionController<L> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<L: PeerLink> RemoteSessionController<L> {
    /// Creates a controller for one session.
    ///
    /// The host is born into `Creating`, the guest into `Joining`; the
    /// link is attached separately once constructed (the link needs the
    /// controller's handlers first — see [`peer_handlers`]).
    ///
    /// [`peer_handlers`]: Self::peer_handlers
    pub fn new(
        role: Role,
        local_name: &str,
        session_id: SessionId,
        callbacks: SessionCallbacks,
    ) -> Self {
        let mark = role.mark();
        let status = match role {
            Role::Host => ConnectionStatus::Creating,
            Role::Guest => ConnectionStatus::Joining,
        };
        let (link_ready, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                session_id,
                role,
                callbacks,
                link: OnceLock::new(),
                link_ready,
                state: Mutex::new(SessionState {
                    status,
                    session_code: None,
                    local: PlayerRecord {
                        name: local_name.to_string(),
                        symbol: mark.to_string(),
                        mark,
                    },
                    remote: None,
                    error: None,
                    move_count: 0,
                    expected_mark: Mark::first(),
                    board: [None; BOARD_CELLS],
                    rematch: RematchState::Idle,
                    teardown_seen: false,
                }),
            }),
        }
    }

    /// Attaches the established link. Called exactly once, right after the
    /// link is constructed with this controller's [`peer_handlers`].
    ///
    /// [`peer_handlers`]: Self::peer_handlers
    pub fn attach_link(&self, link: Arc<L>) {
        if self.shared.link.set(link).is_err() {
            tracing::warn!("attach_link called twice, keeping the first link");
            return;
        }
        let _ = self.shared.link_ready.send(true);
    }

    /// The five peer callbacks, wired to this controller. Hand this to the
    /// link constructor.
    pub fn peer_handlers(&self) -> PeerHandlers {
        let open = self.clone();
        let message = self.clone();
        let close = self.clone();
        let error = self.clone();
        let state = self.clone();
        PeerHandlers::new()
            .on_open(move || open.handle_open())
            .on_message(move |msg| message.handle_incoming(msg))
            .on_close(move || close.handle_close())
            .on_error(move |e| error.handle_link_error(e))
            .on_state_change(move |s| state.handle_link_state(s))
    }

    // -- accessors ---------------------------------------------------------

    pub fn session_id(&self) -> &SessionId {
        &self.shared.session_id
    }

    pub fn is_host(&self) -> bool {
        self.shared.role == Role::Host
    }

    /// The mark this side plays.
    pub fn local_mark(&self) -> Mark {
        self.shared.role.mark()
    }

    /// A point-in-time snapshot for rendering.
    pub fn session(&self) -> RemoteSession {
        let st = self.lock();
        RemoteSession {
            session_id: self.shared.session_id.clone(),
            session_code: st.session_code.clone(),
            status: st.status,
            local_player: st.local.clone(),
            remote_player: st.remote.clone(),
            error: st.error.clone(),
            is_host: self.is_host(),
        }
    }

    /// The single authorization gate for local input: remote session
    /// connected, game still running, and the local board agrees it is the
    /// local player's turn.
    pub fn is_local_player_turn(&self, view: &BoardView) -> bool {
        let st = self.lock();
        st.status == ConnectionStatus::Connected
            && view.phase == GamePhase::Playing
            && view.current_turn == st.local.mark
    }

    // -- outbound operations ----------------------------------------------

    /// Sends one local move to the peer.
    ///
    /// Callers gate input through [`is_local_player_turn`] first; turn order
    /// is not re-checked here. The controller bumps its move counter,
    /// records the cell on the shadow board, and flips the expected mark —
    /// the same bookkeeping the receiving side performs on acceptance.
    ///
    /// [`is_local_player_turn`]: Self::is_local_player_turn
    pub async fn send_move(&self, cell_index: u8, player: Mark) -> Result<(), GridlinkError> {
        if usize::from(cell_index) >= BOARD_CELLS {
            return Err(SessionError::CellOutOfRange(cell_index).into());
        }
        let msg = {
            let mut st = self.lock();
            if st.status != ConnectionStatus::Connected {
                return Err(SessionError::NotConnected.into());
            }
            st.move_count += 1;
            st.board[usize::from(cell_index)] = Some(player);
            st.expected_mark = player.opponent();
            GameMessage::move_at(cell_index, player, st.move_count)
        };
        tracing::debug!(cell = cell_index, %player, "sending move");
        self.send(msg).await
    }

    /// Asks the peer for a rematch.
    ///
    /// If the peer's own request already arrived, this is the other half of
    /// a mutual request: reset immediately instead of waiting for a
    /// response that will never come.
    pub async fn request_rematch(&self) -> Result<(), GridlinkError> {
        let mutual = {
            let mut st = self.lock();
            match st.rematch {
                RematchState::TheyRequested => {
                    st.rematch = RematchState::Idle;
                    reset_game(&mut st, Mark::first());
                    true
                }
                _ => {
                    st.rematch = RematchState::WeRequested;
                    false
                }
            }
        };
        self.send(GameMessage::rematch_request()).await?;
        if mutual {
            tracing::info!("mutual rematch, resetting");
            (self.shared.callbacks.on_game_reset)(Mark::first());
        }
        Ok(())
    }

    /// Answers the peer's rematch request.
    pub async fn respond_to_rematch(&self, accept: bool) -> Result<(), GridlinkError> {
        let starting = accept.then(Mark::first);
        {
            let mut st = self.lock();
            st.rematch = RematchState::Idle;
            if accept {
                reset_game(&mut st, Mark::first());
            }
        }
        self.send(GameMessage::rematch_response(accept, starting))
            .await?;
        if accept {
            (self.shared.callbacks.on_game_reset)(Mark::first());
        }
        Ok(())
    }

    /// Announces a local name/symbol change to the peer.
    pub async fn update_local_player(
        &self,
        name: &str,
        symbol: &str,
    ) -> Result<(), GridlinkError> {
        {
            let mut st = self.lock();
            st.local.name = name.to_string();
            st.local.symbol = symbol.to_string();
        }
        self.send(GameMessage::player_update(name, symbol)).await
    }

    /// The one graceful teardown path: says goodbye, then closes the link.
    ///
    /// The goodbye is best-effort — if the channel is already dead the peer
    /// will see an ungraceful close anyway. No reconnection is attempted.
    pub async fn leave(&self) -> Result<(), GridlinkError> {
        {
            let mut st = self.lock();
            st.teardown_seen = true;
            st.status = ConnectionStatus::Disconnected;
            st.remote = None;
        }
        if let Err(e) = self
            .send(GameMessage::disconnect(DisconnectReason::Left))
            .await
        {
            tracing::debug!(error = %e, "goodbye not delivered");
        }
        if let Some(link) = self.shared.link.get() {
            let _ = link.close().await;
        }
        (self.shared.callbacks.on_status_change)(ConnectionStatus::Disconnected);
        tracing::info!("left session");
        Ok(())
    }

    // -- wiring used by the host/join entry points ------------------------

    pub(crate) fn set_session_code(&self, code: String) {
        self.lock().session_code = Some(code);
    }

    pub(crate) fn set_status(&self, status: ConnectionStatus) {
        {
            let mut st = self.lock();
            if st.status == status {
                return;
            }
            st.status = status;
        }
        tracing::debug!(%status, "status changed");
        (self.shared.callbacks.on_status_change)(status);
    }

    // -- inbound event handling -------------------------------------------

    fn handle_open(&self) {
        self.set_status(ConnectionStatus::Connected);
        let me = self.clone();
        let name = self.lock().local.name.clone();
        tokio::spawn(async move {
            if let Some(link) = me.wait_for_link().await {
                if let Err(e) = link.send(&GameMessage::handshake(&name)).await {
                    tracing::warn!(error = %e, "failed to send handshake");
                }
            } else {
                tracing::warn!("channel opened but no link was attached");
            }
        });
    }

    fn handle_incoming(&self, msg: GameMessage) {
        match msg {
            GameMessage::Handshake {
                player_name,
                protocol_version,
            } => self.handle_handshake(player_name, protocol_version),
            msg @ GameMessage::Move { .. } => self.handle_move(msg),
            GameMessage::RematchRequest => self.handle_rematch_request(),
            GameMessage::RematchResponse {
                accepted,
                starting_player,
            } => self.handle_rematch_response(accepted, starting_player),
            GameMessage::Disconnect { reason } => self.handle_goodbye(reason),
            GameMessage::GameReset => {
                {
                    let mut st = self.lock();
                    reset_game(&mut st, Mark::first());
                }
                tracing::info!("peer reset the game");
                (self.shared.callbacks.on_game_reset)(Mark::first());
            }
            GameMessage::PlayerUpdate { name, symbol } => {
                self.handle_player_update(name, symbol)
            }
        }
    }

    fn handle_handshake(&self, player_name: String, protocol_version: u32) {
        if protocol_version != PROTOCOL_VERSION {
            let message = format!(
                "protocol version mismatch: peer speaks {protocol_version}, \
                 this side speaks {PROTOCOL_VERSION}"
            );
            tracing::warn!(%message, "rejecting handshake");
            {
                let mut st = self.lock();
                st.error = Some(message.clone());
                st.status = ConnectionStatus::Error;
            }
            (self.shared.callbacks.on_status_change)(ConnectionStatus::Error);
            (self.shared.callbacks.on_error)(message);
            return;
        }

        let remote_mark = self.local_mark().opponent();
        {
            let mut st = self.lock();
            st.remote = Some(PlayerRecord {
                name: player_name.clone(),
                symbol: remote_mark.to_string(),
                mark: remote_mark,
            });
        }
        tracing::info!(peer = %player_name, "peer joined");
        (self.shared.callbacks.on_peer_joined)(player_name);
    }

    fn handle_move(&self, msg: GameMessage) {
        let accepted = {
            let mut st = self.lock();
            if st.status != ConnectionStatus::Connected {
                Err("move received while not connected".to_string())
            } else {
                match validate_move(&msg, &st.board, st.expected_mark, st.move_count + 1) {
                    Ok(()) => {
                        let GameMessage::Move {
                            cell_index,
                            player,
                            move_number,
                        } = msg
                        else {
                            // validate_move only passes Move variants
                            unreachable!("validated message is a move");
                        };
                        st.board[usize::from(cell_index)] = Some(player);
                        st.move_count = move_number;
                        st.expected_mark = player.opponent();
                        Ok((cell_index, player, move_number))
                    }
                    Err(e) => Err(e.to_string()),
                }
            }
        };
        match accepted {
            Ok((cell, player, n)) => {
                tracing::debug!(cell, %player, n, "remote move accepted");
                (self.shared.callbacks.on_remote_move)(cell, player, n);
            }
            Err(reason) => {
                // The boards have diverged (or the peer is lying). Not
                // silently dropped: the caller must know the session is
                // compromised.
                tracing::warn!(%reason, "rejecting remote move");
                (self.shared.callbacks.on_error)(format!("protocol violation: {reason}"));
            }
        }
    }

    fn handle_rematch_request(&self) {
        let mutual = {
            let mut st = self.lock();
            match st.rematch {
                RematchState::WeRequested => {
                    st.rematch = RematchState::Idle;
                    reset_game(&mut st, Mark::first());
                    true
                }
                _ => {
                    st.rematch = RematchState::TheyRequested;
                    false
                }
            }
        };
        if mutual {
            tracing::info!("mutual rematch, resetting");
            (self.shared.callbacks.on_game_reset)(Mark::first());
        } else {
            (self.shared.callbacks.on_rematch_requested)();
        }
    }

    fn handle_rematch_response(&self, accepted: bool, starting_player: Option<Mark>) {
        let starting = starting_player.unwrap_or_else(Mark::first);
        {
            let mut st = self.lock();
            st.rematch = RematchState::Idle;
            if accepted {
                reset_game(&mut st, starting);
            }
        }
        if accepted {
            tracing::info!(%starting, "rematch accepted");
            (self.shared.callbacks.on_game_reset)(starting);
        } else {
            tracing::info!("rematch declined");
            (self.shared.callbacks.on_rematch_declined)();
        }
    }

    fn handle_goodbye(&self, reason: DisconnectReason) {
        {
            let mut st = self.lock();
            st.teardown_seen = true;
            st.status = ConnectionStatus::Disconnected;
            st.remote = None;
        }
        tracing::info!(%reason, "peer disconnected gracefully");
        (self.shared.callbacks.on_status_change)(ConnectionStatus::Disconnected);
        (self.shared.callbacks.on_disconnected)(DisconnectKind::PeerLeft);
    }

    fn handle_player_update(&self, name: String, symbol: String) {
        let resolved = {
            let mut st = self.lock();
            let remote_mark = st.local.mark.opponent();
            // A peer proposing the symbol the local player already uses gets
            // renamed in the local view only; they are never told, and the
            // local symbol never changes — it was chosen deliberately.
            let resolved = if symbol == st.local.symbol {
                substitute_symbol(&st.local.symbol, remote_mark)
            } else {
                symbol.clone()
            };
            match &mut st.remote {
                Some(remote) => {
                    remote.name = name.clone();
                    remote.symbol = resolved.clone();
                }
                None => {
                    st.remote = Some(PlayerRecord {
                        name: name.clone(),
                        symbol: resolved.clone(),
                        mark: remote_mark,
                    });
                }
            }
            resolved
        };
        (self.shared.callbacks.on_player_update)(name, resolved);
    }

    fn handle_close(&self) {
        let report = {
            let mut st = self.lock();
            if st.teardown_seen {
                false
            } else {
                st.teardown_seen = true;
                st.status = ConnectionStatus::Disconnected;
                st.remote = None;
                true
            }
        };
        if report {
            tracing::info!("connection lost without a goodbye");
            (self.shared.callbacks.on_status_change)(ConnectionStatus::Disconnected);
            (self.shared.callbacks.on_disconnected)(DisconnectKind::ConnectionLost);
        }
    }

    fn handle_link_error(&self, error: PeerError) {
        tracing::warn!(%error, "link error");
        (self.shared.callbacks.on_error)(format!("transport error: {error}"));
    }

    fn handle_link_state(&self, state: LinkState) {
        tracing::debug!(%state, "link state changed");
        // Surface the negotiation phase; open/close events drive the rest.
        if state == LinkState::Connecting {
            let waiting = matches!(
                self.lock().status,
                ConnectionStatus::WaitingForPeer | ConnectionStatus::Joining
            );
            if waiting {
                self.set_status(ConnectionStatus::Connecting);
            }
        }
    }

    // -- plumbing ----------------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.shared
            .state
            .lock()
            .expect("session state lock poisoned")
    }

    async fn send(&self, msg: GameMessage) -> Result<(), GridlinkError> {
        let link = self
            .shared
            .link
            .get()
            .ok_or(SessionError::NoActiveConnection)?;
        link.send(&msg).await?;
        Ok(())
    }

    /// Like [`Self::send`]'s link lookup, but tolerant of the startup
    /// window where the channel opens before `attach_link` ran.
    async fn wait_for_link(&self) -> Option<Arc<L>> {
        if let Some(link) = self.shared.link.get() {
            return Some(Arc::clone(link));
        }
        let mut ready = self.shared.link_ready.subscribe();
        let _ = tokio::time::timeout(LINK_WAIT, async {
            while !*ready.borrow_and_update() {
                if ready.changed().await.is_err() {
                    return;
                }
            }
        })
        .await;
        self.shared.link.get().map(Arc::clone)
    }
}

/// Returns the counters and shadow board to a fresh game.
///
/// Everything that must stay in lockstep across the two peers resets
/// together, always.
fn reset_game(st: &mut SessionState, starting: Mark) {
    st.move_count = 0;
    st.expected_mark = starting;
    st.board = [None; BOARD_CELLS];
}

/// Picks a display symbol for the remote party that does not collide with
/// the local one. Tries the remote's own mark first, then neutral shapes.
fn substitute_symbol(local_symbol: &str, remote_mark: Mark) -> String {
    let mark = remote_mark.to_string();
    for candidate in [mark.as_str(), "●", "▲", "■"] {
        if candidate != local_symbol {
            return candidate.to_string();
        }
    }
    // Four distinct candidates; at most one can equal the local symbol.
    mark
}

// =========================================================================
// Tests
// =========================================================================
