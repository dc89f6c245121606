//! Init runs against real config and state directories

use galera_init::cluster::resource::{Condition, MariaDBStatus, CONDITION_GALERA_CONFIGURED};
use galera_init::cluster::{MariaDB, MariaDBSpec, MemClusterClient};
use galera_init::common::{ObjectKey, PodEnvironment};
use galera_init::galera::state::{
    BOOTSTRAP_FILE_NAME, CONFIG_FILE_NAME, GALERA_STATE_FILE_NAME, SST_IN_PROGRESS_FILE_NAME,
    WSREP_SST_PID_FILE_NAME,
};
use galera_init::galera::FileManager;
use galera_init::init::{InitContext, InitOutcome, InitStep, Initializer};
use std::sync::Arc;
use tempfile::TempDir;

fn env() -> PodEnvironment {
    PodEnvironment {
        pod_name: "mariadb-galera-0".into(),
        pod_namespace: "db".into(),
        pod_ip: "10.1.2.3".parse().unwrap(),
        mariadb_name: "mariadb-galera".into(),
        cluster_name: "cluster.local".into(),
        root_password: None,
        mysql_port: 3306,
    }
}

fn mariadb(configured: bool) -> MariaDB {
    let mut mdb = MariaDB::new(
        "mariadb-galera",
        MariaDBSpec {
            replicas: 3,
            ..Default::default()
        },
    );
    mdb.status = Some(MariaDBStatus {
        conditions: vec![Condition::new(CONDITION_GALERA_CONFIGURED, configured)],
    });
    mdb
}

fn setup(configured: Option<bool>) -> (TempDir, FileManager, Arc<MemClusterClient>) {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join("mysql");
    std::fs::create_dir_all(&state_dir).unwrap();
    let files = FileManager::new(dir.path().join("mariadb.conf.d"), state_dir);

    let client = Arc::new(MemClusterClient::new());
    if let Some(configured) = configured {
        client.put_mariadb(ObjectKey::new("mariadb-galera", "db"), mariadb(configured));
    }
    (dir, files, client)
}

#[tokio::test]
async fn test_bootstrap_on_disk() {
    let (_dir, files, client) = setup(Some(false));
    std::fs::write(files.state_dir().join(WSREP_SST_PID_FILE_NAME), b"77").unwrap();
    std::fs::write(files.state_dir().join(SST_IN_PROGRESS_FILE_NAME), b"").unwrap();

    let ctx = InitContext::new(env(), Arc::new(files.clone()), client);
    let outcome = Initializer::new(ctx).run().await.unwrap();

    assert!(matches!(outcome, InitOutcome::Initialized { bootstrapped: true, .. }));
    let bootstrap = std::fs::read_to_string(files.config_dir().join(BOOTSTRAP_FILE_NAME)).unwrap();
    assert_eq!(bootstrap, "[galera]\nwsrep_new_cluster=\"ON\"");
    assert!(files.config_dir().join(CONFIG_FILE_NAME).exists());
    assert!(!files.state_dir().join(WSREP_SST_PID_FILE_NAME).exists());
    assert!(!files.state_dir().join(SST_IN_PROGRESS_FILE_NAME).exists());
}

#[tokio::test]
async fn test_resume_keeps_state_on_disk() {
    let (_dir, files, client) = setup(Some(true));
    std::fs::write(files.state_dir().join(GALERA_STATE_FILE_NAME), b"seqno: 5").unwrap();

    let ctx = InitContext::new(env(), Arc::new(files.clone()), client);
    Initializer::new(ctx).run().await.unwrap();

    assert!(files.state_dir().join(GALERA_STATE_FILE_NAME).exists());
    assert!(!files.config_dir().join(BOOTSTRAP_FILE_NAME).exists());
}

#[tokio::test]
async fn test_fallback_rewrites_file_in_place() {
    let (_dir, files, client) = setup(None);
    std::fs::create_dir_all(files.config_dir()).unwrap();
    let original = galera_init::galera::config::render_config(&mariadb(true), &env()).unwrap();
    std::fs::write(files.config_dir().join(CONFIG_FILE_NAME), &original).unwrap();

    let mut moved = env();
    moved.pod_ip = "10.9.9.9".parse().unwrap();
    let ctx = InitContext::new(moved, Arc::new(files.clone()), client);
    let outcome = Initializer::new(ctx).run().await.unwrap();

    assert_eq!(outcome, InitOutcome::ConfigUpdated);
    let updated = std::fs::read_to_string(files.config_dir().join(CONFIG_FILE_NAME)).unwrap();
    assert!(updated.contains("wsrep_node_address=\"10.9.9.9\""));
    assert_eq!(original.lines().count(), updated.lines().count());
}

#[tokio::test]
async fn test_undeletable_transfer_marker_fails_run() {
    let (_dir, files, client) = setup(Some(false));
    let marker = files.state_dir().join(SST_IN_PROGRESS_FILE_NAME);
    std::fs::create_dir_all(marker.join("partial")).unwrap();

    let ctx = InitContext::new(env(), Arc::new(files.clone()), client);
    let err = Initializer::new(ctx).run().await.unwrap_err();

    assert_eq!(err.step(), Some(InitStep::TransferCleanup));
    assert!(marker.is_dir());
}
