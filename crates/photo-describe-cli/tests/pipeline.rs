//! End-to-end runs of the binary against a stand-in Ollama server.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use assert_cmd::Command;
use photo_describe_test_support::FixtureFolder;
use predicates::prelude::*;

const CHAT_REPLY: &str =
    r#"{"model":"llava:latest","message":{"role":"assistant","content":"A small test image."},"done":true}"#;

/// Answers every chat request with the same description. Returns the base
/// URL and a request counter.
fn fake_ollama() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&requests);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                        break;
                    }
                    let lower = line.to_ascii_lowercase();
                    if let Some(v) = lower.strip_prefix("content-length:") {
                        content_length = v.trim().parse().unwrap_or(0);
                    }
                }
                let mut body = vec![0u8; content_length];
                if reader.read_exact(&mut body).is_err() {
                    return;
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let mut stream = stream;
                let _ = write!(
                    stream,
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{CHAT_REPLY}",
                    CHAT_REPLY.len()
                );
                let _ = stream.flush();
            });
        }
    });

    (format!("http://{addr}"), requests)
}

/// A local URL nothing is listening on.
fn unreachable_host() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn photo_describe(cwd: &Path, host: &str) -> Command {
    let mut cmd = Command::cargo_bin("photo-describe").unwrap();
    cmd.current_dir(cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".xdg"))
        .env("HOME", cwd)
        .args(["--host", host, "--retry-delay", "0", "--timeout", "10"]);
    cmd
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_describes_folder_and_resumes() {
    let (host, requests) = fake_ollama();
    let work = tempfile::tempdir().unwrap();
    let folder = FixtureFolder::new()
        .with_png("a.png")
        .with_image("b.jpg")
        .with_file("readme.md", b"skip me");

    photo_describe(work.path(), &host)
        .arg(folder.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("descriptions.txt"))
        .stderr(predicate::str::contains("2 described, 0 failed"));

    let output = read(work.path().join("descriptions.txt"));
    assert!(output.contains("Processing image: a.png\nDescription: A small test image.\n--------------\n"));
    assert!(output.contains("Processing image: b.jpg\nDescription: A small test image.\n--------------\n"));
    assert_eq!(read(work.path().join("processed_images.json")), r#"["a.png","b.jpg"]"#);
    assert_eq!(requests.load(Ordering::SeqCst), 2);

    // Second run finds nothing new and leaves both files alone.
    photo_describe(work.path(), &host)
        .arg(folder.path())
        .assert()
        .code(0)
        .stderr(predicate::str::contains("nothing to do"));

    assert_eq!(read(work.path().join("descriptions.txt")), output);
    assert_eq!(requests.load(Ordering::SeqCst), 2);
}

#[test]
fn test_corrupt_image_reported_and_exit_code_one() {
    let (host, requests) = fake_ollama();
    let work = tempfile::tempdir().unwrap();
    let folder = FixtureFolder::new()
        .with_png("good.png")
        .with_corrupt("bad.jpg");

    photo_describe(work.path(), &host)
        .arg(folder.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FAILED bad.jpg: IOError"));

    let output = read(work.path().join("descriptions.txt"));
    assert!(output.contains("Error processing image: bad.jpg. Error: IOError: "));
    assert_eq!(read(work.path().join("processed_images.json")), r#"["good.png"]"#);
    assert_eq!(requests.load(Ordering::SeqCst), 1);

    let log = read(work.path().join("processing.log"));
    assert!(log.contains("Error processing image: bad.jpg"));
    assert!(log.contains("checkpoint at processed_images.json"));
}

#[test]
fn test_unreachable_service_records_failures() {
    let work = tempfile::tempdir().unwrap();
    let folder = FixtureFolder::new().with_png("a.png").with_png("b.png");

    photo_describe(work.path(), &unreachable_host())
        .args(["--max-retries", "2"])
        .arg(folder.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("0 described, 2 failed"));

    let output = read(work.path().join("descriptions.txt"));
    assert_eq!(output.matches("Error: UnexpectedError: ").count(), 2);
    assert_eq!(read(work.path().join("processed_images.json")), "[]");
}

#[test]
fn test_corrupt_checkpoint_aborts_before_dispatch() {
    let (host, requests) = fake_ollama();
    let work = tempfile::tempdir().unwrap();
    fs::write(work.path().join("processed_images.json"), "{not json").unwrap();
    let folder = FixtureFolder::new().with_png("a.png");

    photo_describe(work.path(), &host)
        .arg(folder.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("checkpoint"));

    assert!(!work.path().join("descriptions.txt").exists());
    assert_eq!(requests.load(Ordering::SeqCst), 0);
}

#[test]
fn test_custom_locations_are_used() {
    let (host, _requests) = fake_ollama();
    let work = tempfile::tempdir().unwrap();
    let folder = FixtureFolder::new().with_png("a.png");

    photo_describe(work.path(), &host)
        .args(["--output", "out/desc.txt"])
        .args(["--checkpoint", "state/done.json"])
        .args(["--log-file", "logs/run.log"])
        .arg("--quiet")
        .arg(folder.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("desc.txt"))
        .stderr(predicate::str::is_empty());

    assert!(read(work.path().join("out/desc.txt")).contains("Processing image: a.png"));
    assert_eq!(read(work.path().join("state/done.json")), r#"["a.png"]"#);
    assert!(work.path().join("logs/run.log").exists());
    assert!(!work.path().join("descriptions.txt").exists());
}
