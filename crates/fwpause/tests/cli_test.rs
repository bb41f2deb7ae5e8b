#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const FW_VARS: [&str; 10] = [
    "FW_RESOURCE_GROUP",
    "FW_NAME",
    "FW_VNET_RESOURCE_GROUP",
    "FW_VNET",
    "FW_SUBNET",
    "FW_CONFIG",
    "FW_UDR_CSV",
    "FW_STORAGE_MODE",
    "FW_STORAGE_ACCOUNT",
    "FW_STORAGE_CONTAINER",
];

/// 環境変数の影響を受けない fwpause コマンド
fn fwpause() -> Command {
    let mut cmd = Command::cargo_bin("fwpause").unwrap();
    for var in FW_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

/// az が見つからない環境
fn fwpause_without_az() -> Command {
    let mut cmd = fwpause();
    cmd.env("PATH", "");
    cmd
}

/// ヘルプにアクションが表示されることを確認
#[test]
fn test_cli_help() {
    fwpause()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pause"))
        .stdout(predicate::str::contains("resume"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("--storage-mode"))
        .stdout(predicate::str::contains("--udr-csv"));
}

/// help アクションも exit 0
#[test]
fn test_help_action() {
    fwpause()
        .arg("help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pause and resume an Azure Firewall"));
}

/// アクション未指定はエラー
#[test]
fn test_missing_action() {
    fwpause().assert().code(1);
}

/// 不正なアクションはエラー
#[test]
fn test_invalid_action() {
    fwpause().arg("restart").assert().code(1);
}

/// 必須パラメータ不足は API 呼び出し前に exit 1
#[test]
fn test_missing_resource_group() {
    fwpause_without_az()
        .args(["status", "--fw", "fw1", "--vnet", "hub"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing required parameter: --rg"))
        .stderr(predicate::str::contains("fwpause --help"));
}

#[test]
fn test_missing_vnet() {
    fwpause_without_az()
        .args(["pause", "--rg", "rg1", "--fw", "fw1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--vnet"));
}

/// azure モードはストレージアカウント必須
#[test]
fn test_azure_storage_requires_account() {
    fwpause_without_az()
        .args([
            "pause",
            "--rg",
            "rg1",
            "--fw",
            "fw1",
            "--vnet",
            "hub",
            "--storage-mode",
            "azure",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--storage-account"));
}

#[test]
fn test_invalid_storage_mode() {
    fwpause()
        .args(["status", "--storage-mode", "s3"])
        .assert()
        .code(1);
}

/// 存在しない CSV は exit 1
#[test]
fn test_missing_udr_csv() {
    fwpause_without_az()
        .args([
            "resume",
            "--rg",
            "rg1",
            "--fw",
            "fw1",
            "--vnet",
            "hub",
            "--udr-csv",
            "/nonexistent/routes.csv",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("UDR CSV file not found"));
}

/// 環境変数からのパラメータ解決（az が無いので読み取りで失敗する）
#[test]
fn test_env_fallback_reaches_firewall_read() {
    fwpause_without_az()
        .env("FW_RESOURCE_GROUP", "rg1")
        .env("FW_NAME", "fw1")
        .env("FW_VNET", "hub")
        .args(["status", "--dry-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing required parameter").not())
        .stderr(predicate::str::contains("Install the Azure CLI"));
}

/// dry-run でも az が無ければ読み取りエラー、ファイルは作られない
#[test]
fn test_dry_run_without_az() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("firewall-config.json");

    fwpause_without_az()
        .args(["pause", "--rg", "rg1", "--fw", "fw1", "--vnet", "hub", "--dry-run"])
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stderr(predicate::str::contains("Install the Azure CLI"));

    assert!(!config.exists());
}

/// dry-run でなければ事前の認証チェックで止まる
#[test]
fn test_preflight_without_az() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "resource_group,route_table_name,route_name").unwrap();
    writeln!(csv, "rg1,rt1,route1").unwrap();

    fwpause_without_az()
        .args(["resume", "--rg", "rg1", "--fw", "fw1", "--vnet", "hub"])
        .arg("--udr-csv")
        .arg(csv.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("az is not installed"));
}
