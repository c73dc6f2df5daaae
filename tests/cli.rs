//! 命令行集成测试

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

const TRANSLATED_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Saved</title></head><body>
<p data-tg-state="translated" data-tg-original="One" data-tg-translated-html="하나">하나</p>
<p data-tg-state="translated" data-tg-original="Two" data-tg-translated-html="둘">둘</p>
</body></html>"#;

fn pagelingo(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pagelingo").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("PAGELINGO_ENDPOINT")
        .env_remove("PAGELINGO_LOG_LEVEL");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_env_docs() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(pagelingo(&dir).arg("env-docs"));

    assert!(out.contains("PAGELINGO_ENDPOINT"));
    assert!(out.contains("PAGELINGO_TARGET_LANG"));
}

#[test]
fn test_init_config_writes_loadable_file() {
    let dir = TempDir::new().unwrap();
    pagelingo(&dir).args(["init-config", "example.toml"]).assert().success();

    let path = dir.path().join("example.toml");
    assert!(Path::new(&path).exists());
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("endpoint"));

    // 生成的配置可以直接使用
    let input = write(&dir, "page.html", TRANSLATED_PAGE);
    pagelingo(&dir)
        .args(["-c", "example.toml", "state", &input])
        .assert()
        .success();
}

#[test]
fn test_state_of_translated_page() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "page.html", TRANSLATED_PAGE);

    let out = stdout_of(pagelingo(&dir).args(["state", &input]));
    assert_eq!(out.trim(), r#"{"state":"translated","count":2}"#);
}

#[test]
fn test_state_of_fresh_page_from_stdin() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(
        pagelingo(&dir)
            .args(["state", "-"])
            .write_stdin("<html><body><p>Hello</p></body></html>"),
    );
    assert_eq!(out.trim(), r#"{"state":"none","count":0}"#);
}

#[test]
fn test_toggle_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "page.html", TRANSLATED_PAGE);
    let output = dir.path().join("original.html");

    let out = stdout_of(pagelingo(&dir).args([
        "toggle",
        &input,
        "-o",
        output.to_str().unwrap(),
    ]));
    assert_eq!(out.trim(), r#"{"state":"original","count":2}"#);

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains(">One</p>"));
    assert!(html.contains(r#"data-tg-state="original""#));
    // 输入文件保持不变
    assert_eq!(fs::read_to_string(&input).unwrap(), TRANSLATED_PAGE);
}

#[test]
fn test_page_with_unreachable_endpoint_completes() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "fast.toml",
        "endpoint = \"http://127.0.0.1:9\"\nretry_delay_ms = 0\nrequest_timeout_secs = 5\n",
    );
    let input = write(&dir, "page.html", "<html><body><p>Hello world</p></body></html>");

    let out = stdout_of(pagelingo(&dir).args(["-q", "-c", "fast.toml", "page", &input]));
    assert!(out.contains("跳过: 1"));

    let html = fs::read_to_string(&input).unwrap();
    assert!(html.contains("<p>Hello world</p>"));
}

#[test]
fn test_exec_rejects_invalid_command() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "page.html", TRANSLATED_PAGE);

    pagelingo(&dir)
        .args(["exec", &input, "--command", r#"{"action":"explode"}"#])
        .assert()
        .failure();
}

#[test]
fn test_exec_state_command() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "page.html", TRANSLATED_PAGE);

    let out = stdout_of(pagelingo(&dir).args([
        "exec",
        &input,
        "--command",
        r#"{"action":"getTranslationState"}"#,
    ]));
    assert_eq!(out.trim(), r#"{"state":"translated","count":2}"#);
}

#[test]
fn test_invalid_endpoint_fails() {
    let dir = TempDir::new().unwrap();
    pagelingo(&dir)
        .args(["--endpoint", "not a url", "selection", "Hello"])
        .assert()
        .failure();
}
