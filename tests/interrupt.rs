#![cfg(unix)]

mod common;
use assert_fs::fixture::FileWriteStr;
use assert_fs::fixture::PathChild;
use std::net::TcpListener;
use std::process::Stdio;
use std::sync::mpsc;
use std::time::Duration;

/// Accept connections and never answer, so the first API call hangs
fn silent_api() -> (String, mpsc::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
            let _ = tx.send(());
        }
    });
    (url, rx)
}

#[test]
fn test_interrupt_exits_immediately_without_cleanup() {
    let sandbox = common::Sandbox::new();
    let (api_url, connected) = silent_api();
    sandbox
        .temp
        .child("ginit.toml")
        .write_str(&format!("[github]\napi_url = \"{api_url}\"\ntimeout_secs = 120\n"))
        .unwrap();

    let mut cmd = sandbox.command();
    cmd.env_remove("GINIT_TEST_MODE");
    cmd.args(["repo", "-n", "demo"]);
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let child = cmd.spawn().unwrap();

    // The repository creation request is in flight once the connection lands
    connected.recv_timeout(Duration::from_secs(30)).unwrap();
    std::thread::sleep(Duration::from_millis(300));
    let pid = libc::pid_t::try_from(child.id()).unwrap();
    assert_eq!(unsafe { libc::kill(pid, libc::SIGINT) }, 0);

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(130), "stderr: {stderr}");
    assert!(stderr.contains("Interrupted"), "stderr: {stderr}");
    assert!(!sandbox.work().join("demo").exists());
}
