use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

/// A home directory with no `.rspace` file, plus a `data/` folder to upload.
fn workspace() -> TempDir {
    let home = tempdir().expect("temp home");
    let data = home.path().join("data");
    fs::create_dir_all(data.join("sub")).unwrap();
    fs::write(data.join("a.txt"), b"alpha").unwrap();
    fs::write(data.join("b.txt"), b"beta").unwrap();
    fs::write(data.join(".hidden"), b"skip me").unwrap();
    fs::write(data.join("sub").join("c.txt"), b"gamma").unwrap();
    home
}

fn rspace(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rspace").expect("Binary exists");
    cmd.env("HOME", home.path())
        .env("RSPACE_URL", "http://127.0.0.1:9/api/v1")
        .env("RSPACE_API_KEY", "test-key")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn dry_run_upload_reports_count_without_contacting_the_server() {
    let home = workspace();
    rspace(&home)
        .args(["eln", "upload", "--dry-run"])
        .arg(home.path().join("data"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Found 2 files to upload"))
        .stderr(predicate::str::contains("File upload would upload 2 files"))
        .stderr(predicate::str::contains("Uploading:").not());
}

#[test]
fn recursive_dry_run_includes_subfolders() {
    let home = workspace();
    rspace(&home)
        .args(["eln", "upload", "--dry-run", "--recursive"])
        .arg(home.path().join("data"))
        .assert()
        .success()
        .stderr(predicate::str::contains("File upload would upload 3 files"));
}

#[test]
fn missing_input_path_exits_with_failure() {
    let home = workspace();
    rspace(&home)
        .args(["eln", "upload"])
        .arg(home.path().join("data"))
        .arg(home.path().join("no-such-file.txt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no-such-file.txt"))
        .stderr(predicate::str::contains("Uploading:").not());
}

#[test]
fn invalid_output_format_exits_with_failure() {
    let home = workspace();
    rspace(&home)
        .args(["eln", "-f", "xml", "upload", "--dry-run"])
        .arg(home.path().join("data"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid outputFormat argument"));
}

#[test]
fn missing_configuration_exits_with_failure() {
    let home = workspace();
    let mut cmd = Command::cargo_bin("rspace").expect("Binary exists");
    cmd.env("HOME", home.path())
        .env_remove("RSPACE_URL")
        .env_remove("RSPACE_API_KEY")
        .current_dir(home.path())
        .args(["eln", "upload", "--dry-run"])
        .arg(home.path().join("data"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("RSPACE_URL"));
}

#[test]
fn dry_run_word_import_counts_only_word_files() {
    let home = workspace();
    let data = home.path().join("data");
    fs::write(data.join("report.docx"), b"PK").unwrap();
    fs::write(data.join("notes.odt"), b"PK").unwrap();
    rspace(&home)
        .args(["eln", "importWord", "--dry-run"])
        .arg(&data)
        .assert()
        .success()
        .stderr(predicate::str::contains("File import would import 2 files"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector { events: events.clone() };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use rspace::cli::{run, Cli, Commands};

    // points at a config file that doesn't exist, so run stops after entry
    let cli = Cli {
        config: Some(std::path::PathBuf::from("does-not-exist.rspace")),
        command: Commands::Status,
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
