//! Performance benchmarks for the board model, AI and wire codec

use shared::{Board, Mark, Packet, SessionCode};
use std::time::Instant;

fn mid_game_board() -> Board {
    let mut board = Board::new();
    for (cell, mark) in [(0, Mark::X), (4, Mark::O), (8, Mark::X), (2, Mark::O)] {
        board.apply_mark(cell, mark).unwrap();
    }
    board
}

/// Benchmarks win/draw evaluation
#[test]
fn benchmark_board_evaluation() {
    let board = mid_game_board();

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = std::hint::black_box(&board).evaluate();
    }

    let duration = start.elapsed();
    println!(
        "Board evaluation: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 500ms for 100k iterations
    assert!(duration.as_millis() < 500);
}

/// Benchmarks the AI's opening move, the most expensive search it ever runs
#[test]
fn benchmark_minimax_full_search() {
    let start = Instant::now();

    let cell = client::ai::best_move(&Board::new(), Mark::X);

    let duration = start.elapsed();
    println!("Minimax from empty board: {:?}", duration);

    assert_eq!(cell, Some(0));
    // Should complete in under 5 seconds even in debug builds
    assert!(duration.as_secs() < 5);
}

/// Benchmarks AI replies across a whole game
#[test]
fn benchmark_minimax_replies() {
    let iterations = 100;
    let start = Instant::now();

    for _ in 0..iterations {
        let reply = client::ai::best_move(&mid_game_board(), Mark::X);
        assert!(reply.is_some());
    }

    let duration = start.elapsed();
    println!(
        "Minimax mid-game: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks packet framing
#[test]
fn benchmark_packet_encoding() {
    let packets = [
        Packet::MakeMove {
            code: SessionCode::from_number(123_456),
            cell: 4,
            mark: Mark::X,
        },
        Packet::GameWon {
            mark: Mark::O,
            line: [2, 4, 6],
        },
        Packet::TurnChanged { mark: Mark::O },
    ];

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        for packet in &packets {
            let frame = shared::encode_packet(packet).unwrap();
            assert!(frame.len() > 4);
        }
    }

    let duration = start.elapsed();
    println!(
        "Packet encoding: {} packets in {:?}",
        iterations * packets.len(),
        duration
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks framed round trips through an in-memory stream
#[tokio::test]
async fn benchmark_frame_round_trip() {
    let packet = Packet::MoveMade {
        cell: 7,
        mark: Mark::O,
    };

    let iterations = 10_000;
    let start = Instant::now();

    let mut buffer = Vec::new();
    for _ in 0..iterations {
        shared::write_packet(&mut buffer, &packet).await.unwrap();
    }
    let mut reader = buffer.as_slice();
    let mut decoded = 0;
    while let Some(received) = shared::read_packet(&mut reader).await.unwrap() {
        assert_eq!(received, packet);
        decoded += 1;
    }

    let duration = start.elapsed();
    println!("Frame round trip: {} frames in {:?}", decoded, duration);

    assert_eq!(decoded, iterations);
    assert!(duration.as_millis() < 1000);
}
