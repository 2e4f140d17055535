use bisync::cli::Command;
use bisync::logging::{self, reset_for_tests, ConsoleOutput};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::tempdir;
use tracing::info;

// A process can install its global subscriber only once, so this binary holds a single init.
#[test]
#[serial]
fn json_file_sink_receives_events() {
    reset_for_tests();
    env::remove_var("BISYNC_LOG_DIR");
    env::remove_var("BISYNC_LOG_FORMAT");
    env::remove_var("RUST_LOG");
    let original_dir = env::current_dir().unwrap();
    let workspace = tempdir().unwrap();
    fs::write(
        workspace.path().join("bisync.toml"),
        "[logging]\nformat = \"json\"\nconsole_output = \"none\"\ndefault_level = \"info\"\n",
    )
    .unwrap();
    env::set_current_dir(workspace.path()).unwrap();

    let guard = logging::init(&Command::RemoveSegments).unwrap();
    info!(archive = "export.tar.gz", "logging integration event");

    assert_eq!(guard.console_output(), ConsoleOutput::None);
    let log_path = guard.log_file_path().to_path_buf();
    assert!(log_path.ends_with(".bisync/logs/bisync.log"));
    drop(guard);

    let contents = fs::read_to_string(&log_path).unwrap();
    let line = contents
        .lines()
        .find(|line| line.contains("logging integration event"))
        .unwrap();
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["level"], "INFO");
    assert_eq!(event["fields"]["archive"], "export.tar.gz");

    assert!(logging::init(&Command::RemoveSegments).is_err());

    env::set_current_dir(original_dir).unwrap();
}
