mod common;
use assert_cmd::assert::OutputAssertExt;
use assert_fs::fixture::FileWriteStr;
use assert_fs::fixture::PathChild;
use predicates::str::contains;

#[test]
fn test_help_lists_commands() {
    let sandbox = common::Sandbox::new();
    let mut cmd = sandbox.command();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(contains("repo"))
        .stdout(contains("usage"))
        .stdout(contains("templates"));
}

#[test]
fn test_usage_points_at_token_docs() {
    let sandbox = common::Sandbox::new();
    let mut cmd = sandbox.command_without_token();
    cmd.arg("usage");
    cmd.assert()
        .success()
        .stdout(contains("personal access token"))
        .stdout(contains("https://docs.github.com"));
}

#[test]
fn test_usage_alias() {
    let sandbox = common::Sandbox::new();
    sandbox.command().arg("u").assert().success();
}

#[test]
fn test_templates_lists_catalog() {
    let sandbox = common::Sandbox::new();
    let mut cmd = sandbox.command();
    cmd.arg("templates");
    let assert = cmd.assert().success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let listed: Vec<&str> = output.lines().collect();
    assert_eq!(
        listed,
        vec!["Node", "Android", "Java", "Python", "Go", "Rails", "None"]
    );
}

#[test]
fn test_completions_for_bash() {
    let sandbox = common::Sandbox::new();
    let mut cmd = sandbox.command_without_token();
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(contains("ginit"))
        .stdout(contains("repo"))
        .stdout(contains("usage"));
}

#[test]
fn test_completions_reject_unknown_shell() {
    let sandbox = common::Sandbox::new();
    let mut cmd = sandbox.command();
    cmd.args(["completions", "tcsh"]);
    cmd.assert().failure().stderr(contains("invalid value"));
}

#[test]
fn test_prompt_mode_requires_terminal() {
    let sandbox = common::Sandbox::new();
    let mut cmd = sandbox.command();
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("Interactive mode needs a terminal"));
}

#[test]
fn test_missing_token_fails_before_any_work() {
    let sandbox = common::Sandbox::new();
    let mut cmd = sandbox.command_without_token();
    cmd.args(["repo", "--name", "demo"]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("No access token found"));
    assert!(!sandbox.work().join("demo").exists());
    assert!(!sandbox.remote_repo("demo").exists());
}

#[test]
fn test_token_from_env_file() {
    let sandbox = common::Sandbox::new();
    sandbox
        .temp
        .child("work")
        .child(".env")
        .write_str(&format!("GITHUB_PAT={}\n", common::TEST_TOKEN))
        .unwrap();
    let mut cmd = sandbox.command_without_token();
    cmd.args(["repo", "--name", "demo"]);
    cmd.assert().success();
}

#[test]
fn test_invalid_name_is_rejected() {
    let sandbox = common::Sandbox::new();
    let mut cmd = sandbox.command();
    cmd.args(["repo", "--name", "a/b"]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("not a valid directory name"));
}

#[test]
fn test_unknown_template_is_rejected_by_parser() {
    let sandbox = common::Sandbox::new();
    let mut cmd = sandbox.command();
    cmd.args(["repo", "--name", "demo", "--gitignore", "cobol"]);
    cmd.assert().failure().stderr(contains("invalid value"));
}

#[test]
fn test_config_command_writes_defaults() {
    let sandbox = common::Sandbox::new();
    let path = sandbox.temp.child("out").child("ginit.toml");
    let mut cmd = sandbox.command();
    cmd.arg("config").arg("--path").arg(path.path());
    cmd.assert()
        .success()
        .stderr(contains("Created configuration file"));
    let content = std::fs::read_to_string(path.path()).unwrap();
    assert!(content.contains("api_url = \"https://api.github.com\""));
    assert!(content.contains("default_branch = \"main\""));

    let mut again = sandbox.command();
    again.arg("config").arg("--path").arg(path.path());
    again.assert().failure().stderr(contains("already exists"));

    let mut forced = sandbox.command();
    forced.arg("config").arg("--path").arg(path.path()).arg("--force");
    forced.assert().success();
}

#[test]
fn test_config_defaults_apply_to_repo() {
    let sandbox = common::Sandbox::new();
    sandbox
        .temp
        .child("ginit.toml")
        .write_str(
            r#"
[repository]
default_branch = "trunk"
ignore_template = "node"
"#,
        )
        .unwrap();
    let mut cmd = sandbox.command();
    cmd.args(["repo", "--name", "demo"]);
    cmd.assert().success();

    let project = sandbox.work().join("demo");
    assert_eq!(
        std::fs::read_to_string(project.join(".gitignore")).unwrap(),
        "node_modules/\n"
    );
    let remote = git2::Repository::open_bare(sandbox.remote_repo("demo")).unwrap();
    assert!(remote.find_reference("refs/heads/trunk").is_ok());
}

#[test]
fn test_broken_config_is_reported() {
    let sandbox = common::Sandbox::new();
    sandbox
        .temp
        .child("ginit.toml")
        .write_str("this is [not toml")
        .unwrap();
    let mut cmd = sandbox.command();
    cmd.args(["repo", "--name", "demo"]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("Failed to parse config file"));
}
