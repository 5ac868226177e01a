//! Bridge to an external GTP engine running as a child process.
//!
//! The engine (Pachi by default) is spawned with piped stdin/stdout and
//! driven over the Go Text Protocol. A dedicated reader thread forwards
//! every stdout line into a channel, so responses can be awaited with a
//! deadline instead of blocking forever on a wedged or dead process.
//!
//! [`GtpClient`] is the raw transport: spawn, send one command, collect
//! one framed response, shut down. [`EngineBot`] layers the [`Bot`]
//! interface on top of it, translating between board coordinates and GTP
//! vertices and keeping the whole exchange behind one mutex so that
//! multi-command conversations (hints, board reloads) stay atomic.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};

use crate::board::{Board, Point, Stone};
use crate::bot::{lock_or_recover, Bot, BotMove};
use crate::constants::{
    RESPONSE_TIMEOUT, SHUTDOWN_TIMEOUT, STARTUP_QUIET, STARTUP_TIMEOUT, THINK_TIME_HARD_SECS,
};
use crate::gtp::{clean_response, format_vertex, parse_vertex, stone_name};

/// Lifecycle of the engine connection. A closed client stays closed;
/// restarting means building a new one.
enum ClientState {
    Unstarted,
    Running(Conn),
    Closed,
}

struct Conn {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<String>,
    reader: Option<JoinHandle<()>>,
}

/// Line-oriented GTP transport over a child process.
pub struct GtpClient {
    state: ClientState,
}

impl Default for GtpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GtpClient {
    pub fn new() -> Self {
        Self {
            state: ClientState::Unstarted,
        }
    }

    /// Spawn the engine process and attach the reader thread. Returns
    /// whether the client ended up running; a failed spawn leaves it
    /// unstarted so a different command can be tried.
    pub fn start(&mut self, cmd: &str, args: &[String]) -> bool {
        match self.state {
            ClientState::Running(_) => return true,
            ClientState::Closed => {
                log::warn!("gtp client is closed, refusing to restart");
                return false;
            }
            ClientState::Unstarted => {}
        }

        let mut child = match Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                log::warn!("failed to spawn engine '{cmd}': {e}");
                return false;
            }
        };

        let stdin = child.stdin.take();
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return false;
        };

        let (tx, rx) = unbounded();
        let reader = thread::Builder::new()
            .name("gtp-reader".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .ok();

        self.state = ClientState::Running(Conn {
            child,
            stdin,
            lines: rx,
            reader,
        });
        true
    }

    /// Whether the engine process is alive.
    pub fn is_running(&mut self) -> bool {
        match &mut self.state {
            ClientState::Running(conn) => matches!(conn.child.try_wait(), Ok(None)),
            _ => false,
        }
    }

    /// Swallow the engine's startup chatter. Returns once the output has
    /// been quiet for [`STARTUP_QUIET`], or after [`STARTUP_TIMEOUT`] at
    /// the latest.
    pub fn drain_startup(&mut self) {
        let ClientState::Running(conn) = &mut self.state else {
            return;
        };
        let deadline = Instant::now() + STARTUP_TIMEOUT;
        while Instant::now() < deadline {
            match conn.lines.recv_timeout(STARTUP_QUIET) {
                Ok(line) => log::debug!("engine startup: {line}"),
                Err(_) => break,
            }
        }
    }

    /// Send one GTP command and collect its response payload.
    ///
    /// GTP frames a response as a `=`/`?` status line followed by optional
    /// continuation lines and a terminating blank line. Blank lines before
    /// the status line are skipped, so engines that pad their output with
    /// leading newlines parse the same as strict ones. Returns an empty
    /// string when the client is not running, the engine reports an error,
    /// or no complete response arrives within [`RESPONSE_TIMEOUT`].
    pub fn send(&mut self, command: &str) -> String {
        let ClientState::Running(conn) = &mut self.state else {
            return String::new();
        };

        log::debug!("engine <- {command}");
        match conn.stdin.as_mut() {
            Some(stdin) => {
                if writeln!(stdin, "{command}")
                    .and_then(|()| stdin.flush())
                    .is_err()
                {
                    log::warn!("engine stdin write failed for '{command}'");
                    return String::new();
                }
            }
            None => return String::new(),
        }

        let mut raw = String::new();
        let mut seen_status = false;
        let deadline = Instant::now() + RESPONSE_TIMEOUT;

        loop {
            let now = Instant::now();
            if now >= deadline {
                log::warn!("engine response timed out for '{command}'");
                break;
            }
            match conn.lines.recv_timeout(deadline - now) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        if seen_status {
                            break;
                        }
                        continue;
                    }
                    if !seen_status
                        && (trimmed.starts_with('=') || trimmed.starts_with('?'))
                    {
                        seen_status = true;
                    }
                    if seen_status {
                        raw.push_str(&line);
                        raw.push('\n');
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("engine response timed out for '{command}'");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("engine closed its output pipe");
                    break;
                }
            }
        }

        if raw.trim_start().starts_with('?') {
            log::warn!("engine rejected '{command}': {}", raw.trim());
        }
        let response = clean_response(&raw);
        log::debug!("engine -> {response}");
        response
    }

    /// Shut the engine down: ask politely with `quit`, close its stdin,
    /// and kill it if it has not exited within [`SHUTDOWN_TIMEOUT`].
    /// Idempotent; the client is closed afterwards either way.
    pub fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, ClientState::Closed);
        let ClientState::Running(mut conn) = state else {
            return;
        };

        if let Some(stdin) = conn.stdin.as_mut() {
            let _ = writeln!(stdin, "quit");
            let _ = stdin.flush();
        }
        drop(conn.stdin.take());

        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        let mut exited = false;
        while Instant::now() < deadline {
            match conn.child.try_wait() {
                Ok(Some(status)) => {
                    log::info!("engine exited with {status}");
                    exited = true;
                    break;
                }
                Ok(None) => thread::sleep(Duration::from_millis(50)),
                Err(e) => {
                    log::warn!("engine wait failed: {e}");
                    break;
                }
            }
        }
        if !exited {
            let _ = conn.child.kill();
            let _ = conn.child.wait();
            log::info!("engine killed after quit timeout");
        }
        if let Some(reader) = conn.reader.take() {
            let _ = reader.join();
        }
    }
}

impl Drop for GtpClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Interpret a `genmove` reply.
fn parse_engine_move(response: &str, size: usize) -> BotMove {
    let lower = response.trim().to_lowercase();
    if lower.is_empty() || lower == "pass" {
        return BotMove::Pass;
    }
    if lower == "resign" {
        return BotMove::Resign;
    }
    match parse_vertex(&lower, size) {
        Some(point) => BotMove::Play(point),
        None => {
            log::warn!("unparseable engine move '{response}', treating as pass");
            BotMove::Pass
        }
    }
}

struct EngineInner {
    client: GtpClient,
    size: usize,
}

/// External GTP engine wrapped as a [`Bot`].
///
/// All protocol traffic goes through one mutex, so callers on different
/// threads cannot interleave commands mid-conversation. The engine keeps
/// its own board, which means moves only need to be forwarded, not
/// regenerated; [`Bot::applies_own_moves`] reports that its `genmove`
/// already placed the stone on its side.
pub struct EngineBot {
    cmd: String,
    args: Vec<String>,
    inner: Mutex<EngineInner>,
}

impl EngineBot {
    pub fn new(cmd: &str, args: &[String], size: usize) -> Self {
        Self {
            cmd: cmd.to_string(),
            args: args.to_vec(),
            inner: Mutex::new(EngineInner {
                client: GtpClient::new(),
                size,
            }),
        }
    }

    /// Pass a raw GTP command through to the engine.
    pub fn send_raw(&self, command: &str) -> String {
        lock_or_recover(&self.inner).client.send(command)
    }

    /// Set the engine's per-move thinking budget in seconds.
    pub fn set_think_time(&self, secs: u32) {
        let mut inner = lock_or_recover(&self.inner);
        inner.client.send(&format!("time_settings 0 {secs} 1"));
    }

    /// Ask the engine what it would play for the side to move, then take
    /// the move back so the engine's board is unchanged. The think time
    /// is raised for the question and restored to `restore_secs` after.
    pub fn hint_move(&self, black_to_move: bool, restore_secs: u32) -> BotMove {
        let color = if black_to_move {
            Stone::Black
        } else {
            Stone::White
        };
        let mut inner = lock_or_recover(&self.inner);
        let size = inner.size;

        inner
            .client
            .send(&format!("time_settings 0 {THINK_TIME_HARD_SECS} 1"));
        let response = inner.client.send(&format!("genmove {}", stone_name(color)));
        let mv = parse_engine_move(&response, size);
        if matches!(mv, BotMove::Play(_) | BotMove::Pass) {
            inner.client.send("undo");
        }
        inner
            .client
            .send(&format!("time_settings 0 {restore_secs} 1"));
        mv
    }

    /// Whether the engine process is alive.
    pub fn is_running(&self) -> bool {
        lock_or_recover(&self.inner).client.is_running()
    }

    /// Shut the engine process down.
    pub fn close(&self) {
        lock_or_recover(&self.inner).client.close();
    }
}

impl Bot for EngineBot {
    fn init(&self) {
        let mut inner = lock_or_recover(&self.inner);
        if !inner.client.start(&self.cmd, &self.args) {
            return;
        }
        inner.client.drain_startup();
        let name = inner.client.send("name");
        let version = inner.client.send("version");
        log::info!("engine ready: {name} {version}");
        let size = inner.size;
        inner.client.send(&format!("boardsize {size}"));
    }

    fn sync_move(&self, color: Stone, x: usize, y: usize) {
        let mut inner = lock_or_recover(&self.inner);
        let vertex = format_vertex((x, y), inner.size);
        let command = format!("play {} {vertex}", stone_name(color));
        inner.client.send(&command);
    }

    fn generate_move(&self, black_to_move: bool) -> BotMove {
        let color = if black_to_move {
            Stone::Black
        } else {
            Stone::White
        };
        let mut inner = lock_or_recover(&self.inner);
        let size = inner.size;
        let response = inner.client.send(&format!("genmove {}", stone_name(color)));
        parse_engine_move(&response, size)
    }

    fn dead_stones(&self) -> Vec<Point> {
        let mut inner = lock_or_recover(&self.inner);
        let size = inner.size;
        let response = inner.client.send("final_status_list dead");
        response
            .split_whitespace()
            .filter_map(|vertex| parse_vertex(vertex, size))
            .collect()
    }

    fn set_board_size(&self, size: usize) {
        let mut inner = lock_or_recover(&self.inner);
        inner.size = size;
        inner.client.send(&format!("boardsize {size}"));
    }

    fn applies_own_moves(&self) -> bool {
        true
    }

    fn load_board(&self, board: &Board) {
        // One lock for the whole replay keeps other callers from
        // interleaving commands into a half-loaded position.
        let mut inner = lock_or_recover(&self.inner);
        let size = board.size();
        inner.size = size;
        inner.client.send(&format!("boardsize {size}"));
        for (x, y) in board.iter_points() {
            let stone = board.get(x, y);
            if !stone.is_stone() {
                continue;
            }
            let vertex = format_vertex((x, y), size);
            let command = format!("play {} {vertex}", stone_name(stone));
            inner.client.send(&command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_engine_move() {
        assert_eq!(parse_engine_move("D4", 9), BotMove::Play((3, 5)));
        assert_eq!(parse_engine_move("pass", 9), BotMove::Pass);
        assert_eq!(parse_engine_move("PASS", 9), BotMove::Pass);
        assert_eq!(parse_engine_move("resign", 9), BotMove::Resign);
        assert_eq!(parse_engine_move("", 9), BotMove::Pass);
        assert_eq!(parse_engine_move("garbage", 9), BotMove::Pass);
    }

    #[test]
    fn test_send_before_start_is_empty() {
        let mut client = GtpClient::new();
        assert_eq!(client.send("name"), "");
        assert!(!client.is_running());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut client = GtpClient::new();
        client.close();
        client.close();
        assert!(!client.is_running());
        assert_eq!(client.send("name"), "");
    }

    #[test]
    fn test_failed_spawn_leaves_client_unstarted() {
        let mut client = GtpClient::new();
        let started = client.start("tengen-no-such-engine-binary", &[]);
        assert!(!started);
        assert!(!client.is_running());
        assert_eq!(client.send("name"), "");
    }
}
