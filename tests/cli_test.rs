//! Drives the CLI against a file-backed store in a temp directory.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use common::*;
use tradebook::adapters::sqlite_adapter::SqliteAdapter;
use tradebook::cli::{run, Cli};
use tradebook::domain::position::PositionStatus;
use tradebook::ports::store_port::{JournalStore, PositionStore};
use tradebook::services::position_journal::PositionWithJournalInput;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("book.db");
        fs::write(
            dir.path().join("tradebook.ini"),
            format!(
                "[storage]\npath = {}\npool_size = 2\n\n[logging]\nlevel = warn\n",
                db.display()
            ),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> ExitCode {
        let config = self.path("tradebook.ini");
        let mut argv = vec!["tradebook", "--config", config.to_str().unwrap()];
        argv.extend_from_slice(args);
        run(Cli::parse_from(argv))
    }

    fn write_json(&self, name: &str, value: &impl serde::Serialize) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn store(&self) -> SqliteAdapter {
        SqliteAdapter::open(self.path("book.db").to_str().unwrap(), 1).unwrap()
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn init_creates_schema() {
    let ws = Workspace::new();
    assert_eq!(ws.run(&["init"]), ExitCode::SUCCESS);
    assert_eq!(ws.store().schema_version().unwrap(), 3);
}

#[test]
fn create_then_trade_once() {
    let ws = Workspace::new();
    let mut position = long_stock();
    position.symbol = "msft".into();
    let input = ws.write_json(
        "plan.json",
        &PositionWithJournalInput {
            position,
            journal_fields: plan_fields(),
        },
    );
    assert_eq!(ws.run(&["create", arg(&input)]), ExitCode::SUCCESS);

    let store = ws.store();
    let positions = store.list_positions().unwrap();
    assert_eq!(positions.len(), 1);
    let id = positions[0].id.clone();
    assert_eq!(positions[0].symbol, "MSFT");
    assert_eq!(store.entries_by_position(&id).unwrap().len(), 1);

    let fill = ws.write_json("fill.json", &buy(&id, 100.0, 151.0));
    assert_eq!(ws.run(&["add-trade", arg(&fill)]), ExitCode::SUCCESS);
    assert_eq!(
        store.get_position(&id).unwrap().unwrap().status,
        PositionStatus::Open
    );

    assert_eq!(ws.run(&["add-trade", arg(&fill)]), ExitCode::from(5));
    assert_eq!(store.get_position(&id).unwrap().unwrap().trades.len(), 1);

    for cmd in [
        vec!["list"],
        vec!["show", id.as_str()],
        vec!["journal", id.as_str()],
        vec!["risk", id.as_str()],
        vec!["pnl", id.as_str(), "--price", "160"],
    ] {
        assert_eq!(ws.run(&cmd), ExitCode::SUCCESS, "command {cmd:?}");
    }
}

#[test]
fn invalid_plan_is_validation_exit() {
    let ws = Workspace::new();
    let mut position = long_stock();
    position.position_thesis = "too short".into();
    let input = ws.write_json(
        "plan.json",
        &PositionWithJournalInput {
            position,
            journal_fields: plan_fields(),
        },
    );
    assert_eq!(ws.run(&["create", arg(&input)]), ExitCode::from(4));
    assert!(ws.store().list_positions().unwrap().is_empty());
}

#[test]
fn unknown_position_is_not_found_exit() {
    let ws = Workspace::new();
    assert_eq!(ws.run(&["show", "missing"]), ExitCode::from(6));
}

#[test]
fn malformed_input_is_rejected() {
    let ws = Workspace::new();
    let input = ws.path("broken.json");
    fs::write(&input, "{ not json").unwrap();
    assert_eq!(ws.run(&["add-trade", arg(&input)]), ExitCode::from(4));
}

#[test]
fn bad_pool_size_is_config_exit() {
    let ws = Workspace::new();
    fs::write(
        ws.path("tradebook.ini"),
        "[storage]\npath = x.db\npool_size = 0\n",
    )
    .unwrap();
    assert_eq!(ws.run(&["list"]), ExitCode::from(2));
}
