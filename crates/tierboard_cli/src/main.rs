//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tierboard_core` linkage with deterministic output.
//! - Optionally summarize a board database: `tierboard_cli [DB_PATH]`.

use std::process::ExitCode;
use tierboard_core::{BoardService, EngineConfig, NoopNotifier, SqliteFileBoardRepository};

fn main() -> ExitCode {
    println!("tierboard_core ping={}", tierboard_core::ping());
    println!("tierboard_core version={}", tierboard_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match summarize(&db_path) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("tierboard_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(db_path: &str) -> Result<Vec<String>, String> {
    let config = EngineConfig::default().with_db_path(db_path);
    let repo = SqliteFileBoardRepository::new(db_path);
    let service =
        BoardService::open(repo, NoopNotifier, &config).map_err(|err| err.to_string())?;
    let board = service.current_board();

    let mut lines = vec![format!("board items={}", board.item_count())];
    lines.extend(
        board
            .buckets()
            .iter()
            .map(|bucket| format!("tier {} items={}", bucket.tier(), bucket.len())),
    );
    Ok(lines)
}
