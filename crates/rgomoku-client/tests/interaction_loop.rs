//! 対話ループをスクリプト化エンジンで通しで動かすテスト

use std::collections::VecDeque;
use std::io::{self, BufReader, Cursor, Read};
use std::thread;
use std::time::Duration;

use rgomoku_client::InteractionLoop;
use rgomoku_client::SessionError;
use rgomoku_client::testing::{fast_options, lines, scripted_session};

/// 1 行ずつ間を置いて入力する。解析ワーカーが途中経過を受け取る時間を作る。
struct Typist {
    lines: VecDeque<Vec<u8>>,
    pause: Duration,
}

impl Typist {
    fn new(script: &[&str]) -> Self {
        Self {
            lines: script.iter().map(|l| format!("{l}\n").into_bytes()).collect(),
            pause: Duration::from_millis(200),
        }
    }
}

impl Read for Typist {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut line) = self.lines.pop_front() else {
            return Ok(0);
        };
        thread::sleep(self.pause);
        if line.len() > buf.len() {
            let rest = line.split_off(buf.len());
            self.lines.push_front(rest);
        }
        buf[..line.len()].copy_from_slice(&line);
        Ok(line.len())
    }
}

#[test]
fn auto_analysis_prints_the_best_move() {
    let (mut session, handle) = scripted_session(
        |line| {
            if line == "DONE" {
                lines(&["MESSAGE depth 4 ev 10 pv i9", "8,8"])
            } else {
                Vec::new()
            }
        },
        fast_options(),
    )
    .unwrap();

    let input = Cursor::new("analyze\nh8h9\n5\nauto\nbest move\nquit\n");
    let mut output = Vec::new();
    InteractionLoop::new(&mut session, input, &mut output).run().unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("-> Pos: h8 h9"), "{text}");
    assert!(text.contains("-> Type: auto"), "{text}");
    assert!(text.contains("==Best Move=="), "{text}");
    assert!(text.contains("--> Best move: i9"), "{text}");
    assert_eq!(
        handle.commands(),
        vec!["INFO timeout_match 5000", "INFO timeout_turn 5000", "BOARD", "7,7,1", "7,8,2", "DONE"]
    );
}

#[test]
fn swap2_and_play_by_time_use_the_balance_command() {
    let (mut session, handle) = scripted_session(
        |line| {
            if line == "YXBALANCETWO 0" {
                lines(&["7,7 8,8 6,9"])
            } else {
                Vec::new()
            }
        },
        fast_options(),
    )
    .unwrap();

    // 打ち間違いは語彙に補正される
    let input = Cursor::new("ply by tme\n\n3\nswpa2\nqiut\n");
    let mut output = Vec::new();
    InteractionLoop::new(&mut session, input, &mut output).run().unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("==Make Swap2=="), "{text}");
    assert!(text.contains("--> Best move: h8 i9 g10"), "{text}");
    assert!(!text.contains("(Manual/Auto)"), "{text}");
    assert_eq!(handle.commands()[2..], ["YXBOARD", "DONE", "YXBALANCETWO 0"]);
}

#[test]
fn invalid_input_is_reported_without_touching_the_engine() {
    let (mut session, handle) = scripted_session(|_| Vec::new(), fast_options()).unwrap();
    // 局面の入力中に入力が尽きた場合もループを抜ける
    let input = Cursor::new("zzzzzzzzzzzz\nanalyze\nh8h8\nz99\n");
    let mut output = Vec::new();
    InteractionLoop::new(&mut session, input, &mut output).run().unwrap();

    let text = String::from_utf8(output).unwrap();
    assert_eq!(text.matches("--> Not valid!").count(), 3, "{text}");
    assert!(handle.commands().is_empty());
}

#[test]
fn end_of_input_leaves_the_loop() {
    let (mut session, _handle) = scripted_session(|_| Vec::new(), fast_options()).unwrap();
    let mut output = Vec::new();
    InteractionLoop::new(&mut session, Cursor::new(""), &mut output).run().unwrap();
    assert_eq!(String::from_utf8(output).unwrap(), "Input: ");
}

#[test]
fn manual_analysis_displays_links_and_stops() {
    let (mut session, handle) = scripted_session(
        |line| match line {
            "DONE" => lines(&["MESSAGE depth 5 ev 20 pv i9 j10"]),
            "STOP" => lines(&["9,9"]),
            _ => Vec::new(),
        },
        fast_options(),
    )
    .unwrap();

    let input = BufReader::new(Typist::new(&[
        "analyze",
        "h8",
        "-1",
        "best move",
        "display 1",
        "get link",
        "stpo",
        "quit",
    ]));
    let mut output = Vec::new();
    InteractionLoop::new(&mut session, input, &mut output).run().unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("-> Type: manual"), "{text}");
    assert!(text.contains("https://www.playok.com/p/?g=gm+h8i9j10#2"), "{text}");
    assert!(text.contains("--> Stopped"), "{text}");
    // 9 行目 (y = 8) に i9 の白石、8 行目に h8 の黒石。j10 は表示手数の外
    assert!(text.contains(" .  .  .  .  .  .  .  .  ○  .  .  .  .  .  .   9"), "{text}");
    assert!(text.contains(" .  .  .  .  .  .  .  ●  .  .  .  .  .  .  .   8"), "{text}");
    assert!(text.contains(" .  .  .  .  .  .  .  .  .  .  .  .  .  .  .  10"), "{text}");
    assert_eq!(handle.commands().iter().filter(|c| *c == "STOP").count(), 1);
}

#[test]
fn manual_analysis_ends_when_the_engine_answers() {
    let (mut session, handle) = scripted_session(
        |line| {
            if line == "DONE" {
                lines(&["MESSAGE depth 2 ev M1 pv h8", "7,7"])
            } else {
                Vec::new()
            }
        },
        fast_options(),
    )
    .unwrap();

    let input = BufReader::new(Typist::new(&["analyze", "", "10", "manual", "best move", "display", "quit"]));
    let mut output = Vec::new();
    InteractionLoop::new(&mut session, input, &mut output).run().unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("--> Best move: h8"), "{text}");
    assert!(!handle.commands().iter().any(|c| c == "STOP"));
}

#[test]
fn closed_engine_ends_the_loop_with_an_error() {
    let (mut session, handle) = scripted_session(|_| Vec::new(), fast_options()).unwrap();
    handle.close();
    let input = Cursor::new("analyze\nh8\n5\nauto\nbest move\nquit\n");
    let mut output = Vec::new();
    let result = InteractionLoop::new(&mut session, input, &mut output).run();
    assert!(matches!(result, Err(SessionError::EngineClosed)));
}
