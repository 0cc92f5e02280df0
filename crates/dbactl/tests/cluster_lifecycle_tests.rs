//! End-to-end cluster lifecycle through the binary, against an isolated
//! state directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct TestEnv {
    state: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            state: TempDir::new().unwrap(),
        }
    }

    fn dbactl(&self) -> Command {
        let mut cmd = Command::cargo_bin("dbactl").unwrap();
        // point at an absent config file so the host environment never leaks in
        cmd.arg("--config-file")
            .arg(self.state.path().join("no-config.toml"))
            .arg("--state-dir")
            .arg(self.state.path());
        cmd
    }
}

#[test]
fn test_cluster_create_get_drop() {
    let env = TestEnv::new();

    env.dbactl()
        .args(["cluster", "create", "devCluster", "--admin-password", "secret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("devCluster"));

    env.dbactl()
        .args(["cluster", "get", "devCluster"])
        .assert()
        .success()
        .stdout(predicate::str::contains("devCluster"))
        .stdout(predicate::str::contains("default"));

    env.dbactl()
        .args(["cluster", "drop", "devCluster"])
        .assert()
        .success();

    env.dbactl()
        .args(["cluster", "get", "devCluster"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_create_cluster_rejects_invalid_name() {
    let env = TestEnv::new();

    env.dbactl()
        .args(["cluster", "create", "dev cluster"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("alphanumeric"));
}

#[test]
fn test_create_cluster_rejects_unknown_option() {
    let env = TestEnv::new();

    env.dbactl()
        .args(["cluster", "create", "devCluster", "--option", "replicas=3"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("replicas"));
}

#[test]
fn test_populated_cluster_drop_requires_override() {
    let env = TestEnv::new();

    env.dbactl()
        .args(["cluster", "create", "devCluster"])
        .assert()
        .success();
    env.dbactl()
        .args(["local", "deploy", "3310"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stopped"));
    env.dbactl()
        .args([
            "instance",
            "add",
            "devCluster",
            "root:root@127.0.0.1:3310",
            "--credential",
            "root",
        ])
        .assert()
        .success();

    env.dbactl()
        .args(["cluster", "drop", "devCluster"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("dropDefaultReplicaSet"));

    env.dbactl()
        .args(["cluster", "drop", "devCluster", "--drop-default-replica-set"])
        .assert()
        .success();
}

#[test]
fn test_local_instance_lifecycle() {
    let env = TestEnv::new();

    env.dbactl()
        .args(["local", "deploy", "3310"])
        .assert()
        .success();
    env.dbactl()
        .args(["local", "start", "3310"])
        .assert()
        .success()
        .stdout(predicate::str::contains("running"));

    // deleting a running instance is refused
    env.dbactl()
        .args(["local", "delete", "3310"])
        .assert()
        .failure()
        .code(1);

    env.dbactl()
        .args(["local", "kill", "3310"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stopped"));
    env.dbactl()
        .args(["local", "delete", "3310"])
        .assert()
        .success();

    env.dbactl()
        .args(["local", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_metadata_drop_requires_enforce() {
    let env = TestEnv::new();

    env.dbactl()
        .args(["cluster", "create", "devCluster"])
        .assert()
        .success();

    env.dbactl()
        .args(["metadata", "drop"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("enforce"));

    env.dbactl()
        .args(["metadata", "drop", "--enforce"])
        .assert()
        .success();

    env.dbactl()
        .args(["metadata", "status", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"schema_exists\": false"));
}

#[test]
fn test_ops_describes_operations() {
    let env = TestEnv::new();

    env.dbactl()
        .args(["ops"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create_cluster"))
        .stdout(predicate::str::contains("add_instance"));

    env.dbactl()
        .args(["ops", "drop_cluster"])
        .assert()
        .success()
        .stdout(predicate::str::contains("drop_cluster(name[, options])"));

    env.dbactl()
        .args(["ops", "make_coffee"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_yaml_output() {
    let env = TestEnv::new();

    env.dbactl()
        .args(["cluster", "create", "devCluster"])
        .assert()
        .success();

    env.dbactl()
        .args(["cluster", "status", "devCluster", "-o", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cluster_name: devCluster"));
}
