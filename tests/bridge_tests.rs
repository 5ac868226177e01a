//! Live engine bridge tests. Each test spawns this crate's own binary
//! in GTP mode as the backend process, so the whole pipe stack gets
//! exercised without any external engine installed.

use tengen::board::{Board, Stone};
use tengen::bot::{Bot, BotMove, Difficulty};
use tengen::bridge::{EngineBot, GtpClient};
use tengen::gtp::parse_vertex;
use tengen::manager::{BotManager, ManagerConfig};

/// Path to this crate's binary, used as the engine under test.
const BIN: &str = env!("CARGO_BIN_EXE_tengen");

/// Arguments putting the binary into GTP mode on a 9x9 board.
fn gtp_args() -> Vec<String> {
    vec!["gtp".to_string(), "--size".to_string(), "9".to_string()]
}

#[test]
fn test_raw_client_session() {
    let args = gtp_args();
    let mut client = GtpClient::new();
    assert!(client.start(BIN, &args), "spawning our own binary must work");
    assert!(client.start(BIN, &args), "start is a no-op while running");
    client.drain_startup();

    assert_eq!(client.send("protocol_version"), "2");
    assert_eq!(client.send("name"), "tengen");
    assert_eq!(client.send("boardsize 9"), "");
    assert_eq!(client.send("play black E5"), "");

    let answer = client.send("genmove white");
    assert!(!answer.is_empty(), "genmove must produce a vertex or pass");
    if answer != "pass" && answer != "resign" {
        assert!(
            parse_vertex(&answer, 9).is_some(),
            "unparseable genmove reply: {answer}"
        );
    }

    assert_eq!(client.send("final_status_list dead"), "");

    client.close();
    assert!(!client.is_running(), "close must reap the child");
    client.close(); // second close is a no-op
    assert!(
        !client.start(BIN, &args),
        "a closed client refuses to restart"
    );
}

#[test]
fn test_engine_bot_session() {
    let bot = EngineBot::new(BIN, &gtp_args(), 9);
    bot.init();
    assert!(bot.is_running(), "engine process should be up after init");

    // Raw passthrough for commands the Bot trait has no method for.
    assert_eq!(bot.send_raw("komi 6.5"), "");

    bot.sync_move(Stone::Black, 4, 4);
    bot.sync_move(Stone::White, 2, 2);

    match bot.generate_move(true) {
        BotMove::Play((x, y)) => {
            assert!(x < 9 && y < 9, "generated move off the board: ({x}, {y})");
            assert!((x, y) != (4, 4) && (x, y) != (2, 2), "point already taken");
        }
        BotMove::Pass => {}
        BotMove::Resign => panic!("engine resigned a three-stone opening"),
    }

    assert!(bot.dead_stones().is_empty());

    bot.set_think_time(1);
    match bot.hint_move(false, 1) {
        BotMove::Play((x, y)) => assert!(x < 9 && y < 9),
        BotMove::Pass => {}
        BotMove::Resign => panic!("hint should never resign"),
    }

    bot.close();
    assert!(!bot.is_running());
}

#[test]
fn test_manager_runs_engine_opponent() {
    let config = ManagerConfig {
        engine_cmd: BIN.to_string(),
        engine_args: gtp_args(),
        board_size: 9,
    };
    let mut manager = BotManager::new(config);
    assert!(!manager.is_ready());
    assert!(
        manager.request_move(true).is_none(),
        "no opponent selected yet"
    );

    // Warm the engine up front, the way a session without an AI opponent
    // would for hints and scoring.
    manager.start_background(9).wait();
    let dead = manager.dead_stones().wait().expect("score worker");
    assert!(dead.is_empty(), "our own engine reports no dead stones");
    assert!(!manager.is_ready(), "readiness tracks opponent selection");

    // Selecting Medium reuses the warm engine instead of respawning.
    assert!(manager.select_bot(Difficulty::Medium, 9).wait().is_some());
    assert!(manager.is_ready());
    assert_eq!(manager.difficulty(), Some(Difficulty::Medium));

    // First engine move on an empty board opens at the center.
    let reply = manager
        .request_move(true)
        .unwrap()
        .wait()
        .expect("genmove worker must deliver");
    assert_eq!(reply, BotMove::Play((4, 4)));

    // The engine applied its own move; only the human reply is synced.
    manager.sync_generated(Stone::Black, 4, 4).wait();
    manager.sync_move(Stone::White, 2, 6).wait();

    let hint = manager
        .request_hint(true)
        .expect("background engine is attached")
        .wait()
        .expect("hint worker must deliver");
    match hint {
        BotMove::Play((x, y)) => assert!(x < 9 && y < 9),
        BotMove::Pass => {}
        BotMove::Resign => panic!("hint should never resign"),
    }

    // Force a full rebuild from an authoritative position, then make
    // sure the engine still answers.
    let mut board = Board::new(9);
    board.set(4, 4, Stone::Black);
    board.set(2, 6, Stone::White);
    manager.resync(&board).wait();

    let answer = manager
        .request_move(false)
        .unwrap()
        .wait()
        .expect("genmove worker must deliver");
    assert!(
        matches!(answer, BotMove::Play(_) | BotMove::Pass),
        "engine must keep playing after a resync, got {answer:?}"
    );

    manager.shutdown();
    assert!(!manager.is_ready());
    assert!(manager.request_move(true).is_none());
}
