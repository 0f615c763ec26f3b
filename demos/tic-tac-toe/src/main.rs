//! Two-terminal tic-tac-toe over a Gridlink session.
//!
//! ```text
//! terminal A: tic-tac-toe host ada
//! terminal B: tic-tac-toe join grace <session-code>
//! ```
//!
//! The host prints a session code; paste it to the joining side (any
//! channel works), paste the answer code back, and play by typing cell
//! numbers 0–8. The board, win detection, and rendering here are the
//! "local game" collaborators — the session core only ever sees moves and
//! a [`BoardView`].

use std::io::Write as _;
use std::sync::{Arc, Mutex};

use gridlink::prelude::*;

// ---------------------------------------------------------------------------
// Local game state (outside the session core)
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Game {
    board: Board,
    turn: Mark,
    winner: Option<Mark>,
}

impl Game {
    fn new(starting: Mark) -> Self {
        Self {
            board: [None; 9],
            turn: starting,
            winner: None,
        }
    }

    /// Applies a mark and advances the turn. The caller validates first.
    fn apply(&mut self, cell: u8, mark: Mark) {
        self.board[usize::from(cell)] = Some(mark);
        if check_winner(&self.board, mark) {
            self.winner = Some(mark);
        } else {
            self.turn = mark.opponent();
        }
    }

    fn is_open(&self, cell: u8) -> bool {
        usize::from(cell) < 9 && self.board[usize::from(cell)].is_none()
    }

    fn is_draw(&self) -> bool {
        self.winner.is_none() && self.board.iter().all(|c| c.is_some())
    }

    fn view(&self) -> BoardView {
        let phase = if self.winner.is_some() || self.is_draw() {
            GamePhase::Over
        } else {
            GamePhase::Playing
        };
        BoardView {
            phase,
            current_turn: self.turn,
        }
    }

    fn render(&self) -> String {
        let cell = |i: usize| match self.board[i] {
            Some(m) => m.to_string(),
            None => i.to_string(),
        };
        let mut out = String::new();
        for row in 0..3 {
            let i = row * 3;
            out.push_str(&format!(
                " {} | {} | {}\n",
                cell(i),
                cell(i + 1),
                cell(i + 2)
            ));
            if row < 2 {
                out.push_str("---+---+---\n");
            }
        }
        out
    }
}

fn check_winner(b: &Board, m: Mark) -> bool {
    let at = |i: usize| b[i] == Some(m);
    (0..3).any(|r| (0..3).all(|c| at(r * 3 + c)))        // rows
        || (0..3).any(|c| (0..3).all(|r| at(r * 3 + c))) // columns
        || (0..3).all(|i| at(i * 4))                      // diagonal
        || (0..3).all(|i| at(i * 2 + 2))                  // anti-diagonal
}

// ---------------------------------------------------------------------------
// Session wiring
// ---------------------------------------------------------------------------

fn callbacks(game: Arc<Mutex<Game>>, local_mark: Mark) -> SessionCallbacks {
    let g = Arc::clone(&game);
    let on_move = move |cell: u8, mark: Mark, _n: u32| {
        let mut game = g.lock().unwrap();
        game.apply(cell, mark);
        println!("\npeer played {mark} at {cell}:\n{}", game.render());
        announce(&game, local_mark);
    };
    let g = Arc::clone(&game);
    let on_reset = move |starting: Mark| {
        let mut game = g.lock().unwrap();
        *game = Game::new(starting);
        println!("\nnew game — {starting} opens:\n{}", game.render());
    };
    SessionCallbacks::new()
        .on_status_change(|s| println!("[session] {s}"))
        .on_peer_joined(|name| println!("[session] {name} joined"))
        .on_remote_move(on_move)
        .on_game_reset(on_reset)
        .on_rematch_requested(|| println!("[session] peer wants a rematch — type 'y' to accept"))
        .on_rematch_declined(|| println!("[session] rematch declined"))
        .on_error(|e| println!("[session] error: {e}"))
        .on_disconnected(|kind| println!("[session] disconnected: {kind}"))
}

fn announce(game: &Game, local_mark: Mark) {
    if let Some(w) = game.winner {
        if w == local_mark {
            println!("you win! type 'r' for a rematch");
        } else {
            println!("{w} wins. type 'r' for a rematch");
        }
    } else if game.is_draw() {
        println!("draw. type 'r' for a rematch");
    }
}

async fn read_line(prompt: &str) -> String {
    print!("{prompt}");
    std::io::stdout().flush().expect("flush stdout");
    // Blocking stdin is fine here: this task has nothing else to do while
    // the session runs on its own tasks.
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .map(|_| line)
            .unwrap_or_default()
    })
    .await
    .expect("stdin task")
    .trim()
    .to_string()
}

/// The shared play loop, once the session is set up.
async fn play<L: PeerLink>(controller: RemoteSessionController<L>, game: Arc<Mutex<Game>>) {
    let local_mark = controller.local_mark();
    println!("you are {local_mark}\n{}", game.lock().unwrap().render());

    loop {
        let input = read_line("> ").await;
        match input.as_str() {
            "q" | "quit" => {
                let _ = controller.leave().await;
                return;
            }
            "r" => {
                if let Err(e) = controller.request_rematch().await {
                    println!("rematch failed: {e}");
                }
            }
            "y" => {
                if let Err(e) = controller.respond_to_rematch(true).await {
                    println!("rematch response failed: {e}");
                }
            }
            "n" => {
                let _ = controller.respond_to_rematch(false).await;
            }
            cell => {
                let Ok(cell) = cell.parse::<u8>() else {
                    println!("type a cell number 0-8, 'r' for rematch, 'q' to quit");
                    continue;
                };
                let view = game.lock().unwrap().view();
                if !controller.is_local_player_turn(&view) {
                    println!("not your turn");
                    continue;
                }
                if !game.lock().unwrap().is_open(cell) {
                    println!("cell {cell} is taken");
                    continue;
                }
                if let Err(e) = controller.send_move(cell, local_mark).await {
                    println!("move failed: {e}");
                    continue;
                }
                let mut g = game.lock().unwrap();
                g.apply(cell, local_mark);
                println!("{}", g.render());
                announce(&g, local_mark);
            }
        }
    }
}

async fn run_host(name: &str) -> Result<(), GridlinkError> {
    let game = Arc::new(Mutex::new(Game::new(Mark::first())));
    let hosted = host_session(
        name,
        PeerConfig::default(),
        callbacks(Arc::clone(&game), Role::Host.mark()),
    )
    .await?;

    println!(
        "session {} — share this code:\n\n{}\n",
        hosted.session_id, hosted.session_code
    );
    if copy_to_clipboard(&hosted.session_code).is_ok() {
        println!("(copied to clipboard)");
    }
    println!(
        "or share a link: {}",
        set_session_in_url("https://example.com/play", &hosted.session_code)
    );

    let answer = read_line("paste the answer code: ").await;
    hosted.complete(&answer).await?;

    play(hosted.controller.clone(), game).await;
    Ok(())
}

async fn run_join(name: &str, code: &str) -> Result<(), GridlinkError> {
    // Accept either a bare code or a full join link.
    let code = session_from_url(code).unwrap_or_else(|| code.to_string());
    let game = Arc::new(Mutex::new(Game::new(Mark::first())));
    let joined = join_session(
        &code,
        name,
        PeerConfig::default(),
        callbacks(Arc::clone(&game), Role::Guest.mark()),
    )
    .await?;

    println!(
        "session {} — send this answer code back:\n\n{}\n",
        joined.session_id, joined.answer_code
    );
    if copy_to_clipboard(&joined.answer_code).is_ok() {
        println!("(copied to clipboard)");
    }

    play(joined.controller.clone(), game).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("host") => {
            let name = args.get(2).cloned().unwrap_or_else(|| "host".into());
            run_host(&name).await?;
        }
        Some("join") => {
            let name = args.get(2).cloned().unwrap_or_else(|| "guest".into());
            let code = args.get(3).cloned().unwrap_or_default();
            if code.is_empty() {
                eprintln!("usage: tic-tac-toe join <name> <session-code>");
                std::process::exit(2);
            }
            run_join(&name, &code).await?;
        }
        _ => {
            eprintln!("usage: tic-tac-toe host <name> | tic-tac-toe join <name> <code>");
            std::process::exit(2);
        }
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    // ---------------------------------------------------------------
    // Local rules — deterministic, no session.
    // ---------------------------------------------------------------

    #[test]
    fn test_win_detection_all_lines() {
        // Rows
        for row in 0..3 {
            let mut b: Board = [None; 9];
            for col in 0..3 {
                b[row * 3 + col] = Some(Mark::X);
            }
            assert!(check_winner(&b, Mark::X), "row {row}");
        }
        // Columns
        for col in 0..3 {
            let mut b: Board = [None; 9];
            for row in 0..3 {
                b[row * 3 + col] = Some(Mark::O);
            }
            assert!(check_winner(&b, Mark::O), "col {col}");
        }
        // Diagonals
        let mut b: Board = [None; 9];
        for i in 0..3 {
            b[i * 4] = Some(Mark::X);
        }
        assert!(check_winner(&b, Mark::X), "main diagonal");

        let mut b: Board = [None; 9];
        for i in 0..3 {
            b[i * 2 + 2] = Some(Mark::O);
        }
        assert!(check_winner(&b, Mark::O), "anti-diagonal");
    }

    #[test]
    fn test_no_winner_on_empty_board() {
        let b: Board = [None; 9];
        assert!(!check_winner(&b, Mark::X));
        assert!(!check_winner(&b, Mark::O));
    }

    #[test]
    fn test_draw_detection() {
        //  X | O | X
        //  X | O | O
        //  O | X | X
        let mut game = Game::new(Mark::X);
        for (cell, mark) in [
            (0, Mark::X),
            (1, Mark::O),
            (2, Mark::X),
            (4, Mark::O),
            (3, Mark::X),
            (5, Mark::O),
            (7, Mark::X),
            (6, Mark::O),
            (8, Mark::X),
        ] {
            game.board[cell as usize] = Some(mark);
        }
        assert!(game.is_draw());
        assert_eq!(game.view().phase, GamePhase::Over);
    }

    #[test]
    fn test_apply_advances_turn_until_win() {
        let mut game = Game::new(Mark::X);
        game.apply(0, Mark::X);
        assert_eq!(game.turn, Mark::O);
        game.apply(3, Mark::O);
        assert_eq!(game.turn, Mark::X);
        game.apply(1, Mark::X);
        game.apply(4, Mark::O);
        game.apply(2, Mark::X); // top row
        assert_eq!(game.winner, Some(Mark::X));
        assert_eq!(game.view().phase, GamePhase::Over);
    }

    // ---------------------------------------------------------------
    // A scripted game over an in-process session: both boards end
    // identical, winner detected on both sides.
    // ---------------------------------------------------------------

    struct Side {
        controller: RemoteSessionController<MemoryLink>,
        game: Arc<Mutex<Game>>,
        moves_applied: mpsc::UnboundedReceiver<u8>,
    }

    fn side(role: Role, id: SessionId) -> (Side, PeerHandlers) {
        let game = Arc::new(Mutex::new(Game::new(Mark::first())));
        let (tx, moves_applied) = mpsc::unbounded_channel();
        let g = Arc::clone(&game);
        let callbacks = SessionCallbacks::new().on_remote_move(move |cell, mark, _| {
            g.lock().unwrap().apply(cell, mark);
            let _ = tx.send(cell);
        });
        let controller = RemoteSessionController::new(role, "player", id, callbacks);
        let handlers = controller.peer_handlers();
        (
            Side {
                controller,
                game,
                moves_applied,
            },
            handlers,
        )
    }

    async fn play_move(from: &Side, to: &mut Side, cell: u8, mark: Mark) {
        from.game.lock().unwrap().apply(cell, mark);
        from.controller.send_move(cell, mark).await.unwrap();
        let applied = tokio::time::timeout(Duration::from_secs(5), to.moves_applied.recv())
            .await
            .expect("move should arrive")
            .unwrap();
        assert_eq!(applied, cell);
    }

    #[tokio::test]
    async fn test_scripted_game_keeps_boards_in_lockstep() {
        let id = SessionId::generate();
        let (mut host, host_handlers) = side(Role::Host, id.clone());
        let (mut guest, guest_handlers) = side(Role::Guest, id);
        let (hl, gl) = MemoryLink::pair(host_handlers, guest_handlers);
        host.controller.attach_link(Arc::new(hl));
        guest.controller.attach_link(Arc::new(gl));
        // Let the channel open and handshakes cross.
        tokio::time::sleep(Duration::from_millis(10)).await;

        //  X | X | X
        //  O | O | .
        play_move(&host, &mut guest, 0, Mark::X).await;
        play_move(&guest, &mut host, 3, Mark::O).await;
        play_move(&host, &mut guest, 1, Mark::X).await;
        play_move(&guest, &mut host, 4, Mark::O).await;
        play_move(&host, &mut guest, 2, Mark::X).await;

        let host_board = host.game.lock().unwrap().board;
        let guest_board = guest.game.lock().unwrap().board;
        assert_eq!(host_board, guest_board, "boards must stay in lockstep");
        assert_eq!(host.game.lock().unwrap().winner, Some(Mark::X));
        assert_eq!(guest.game.lock().unwrap().winner, Some(Mark::X));
    }
}
