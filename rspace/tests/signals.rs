#![cfg(unix)]

use rspace::cli::{BulkArgs, UploadArgs};
use rspace::commands;
use rspace_core::contract::{DocumentInfo, FileInfo, FileUploadConfig, MockElnClient, NewDocument};
use rspace_core::format::{Output, OutputFormat};
use std::fs;
use std::process::Command;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn send_sigint_to_self(after: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(after);
        let status = Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .expect("kill runs");
        assert!(status.success());
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sigint_during_summary_fails_the_upload_and_logs_leftovers() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"a").unwrap();
    fs::write(data.join("b.txt"), b"b").unwrap();
    let logfile = tmp.path().join("upload.log");

    let mut client = MockElnClient::new();
    client
        .expect_upload_file()
        .times(2)
        .returning(|req: FileUploadConfig| {
            if req.file_path.ends_with("b.txt") {
                Err("500 Internal Server Error".into())
            } else {
                Ok(FileInfo {
                    id: 1,
                    ..Default::default()
                })
            }
        });
    client
        .expect_new_basic_document_with_content()
        .times(1)
        .returning(|_: NewDocument| {
            thread::sleep(Duration::from_millis(1500));
            Ok(DocumentInfo {
                id: 9,
                ..Default::default()
            })
        });

    let args = UploadArgs {
        bulk: BulkArgs {
            paths: vec![data.clone()],
            recursive: false,
            dry_run: false,
            logfile: Some(logfile.clone()),
        },
        caption: String::new(),
        folder: None,
        add_summary: true,
        summary_template: None,
    };

    let killer = send_sigint_to_self(Duration::from_millis(600));
    let mut out = Output::new(OutputFormat::Quiet, Vec::new());
    let result = commands::upload(&client, &args, &mut out).await;
    killer.join().unwrap();

    let err = result.expect_err("SIGINT after the last upload still fails the run");
    assert!(err.to_string().contains("interrupted"));
    assert_eq!(String::from_utf8(out.into_inner()).unwrap(), "1\n");

    let log = fs::read_to_string(&logfile).unwrap();
    assert!(log.starts_with("1 files weren't uploaded:"));
    assert!(log.contains("b.txt"));
}
