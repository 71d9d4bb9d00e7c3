use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use resource_bundler_core::config::BuildConfig;
use resource_bundler_core::contract::{Credentials, DeployStatus, MockDeployer, Session};
use resource_bundler_core::deploy::{deploy_directory, deploy_package};
use resource_bundler_core::error::BuildError;

fn fast_credentials() -> Credentials {
    let mut creds = Credentials::new("dev@example.com", "secret");
    creds.poll_interval = Duration::from_millis(1);
    creds.poll_timeout = Duration::from_millis(200);
    creds
}

fn session() -> Session {
    Session {
        session_id: "SESSION".into(),
        metadata_server_url: "https://org.example.com/services/Soap/m/37.0/00D".into(),
    }
}

fn in_progress(id: &str) -> DeployStatus {
    DeployStatus {
        id: id.into(),
        done: false,
        status: "InProgress".into(),
        ..DeployStatus::default()
    }
}

#[tokio::test]
async fn deploy_polls_until_done() {
    let mut deployer = MockDeployer::new();
    deployer
        .expect_login()
        .withf(|c| c.username == "dev@example.com")
        .times(1)
        .returning(|_| Ok(session()));
    deployer
        .expect_deploy()
        .withf(|s, zip, opts| s.session_id == "SESSION" && zip == b"zip" && opts.rollback_on_error)
        .times(1)
        .returning(|_, _, _| Ok("0Af000000000001".to_string()));

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    deployer
        .expect_check_deploy_status()
        .times(3)
        .returning(move |_, id| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Ok(in_progress(id))
            } else {
                Ok(DeployStatus {
                    id: id.into(),
                    done: true,
                    success: true,
                    status: "Succeeded".into(),
                    components_deployed: 4,
                    components_total: 4,
                    errors: vec![],
                })
            }
        });

    let report = deploy_package(&deployer, &fast_credentials(), b"zip".to_vec())
        .await
        .expect("deploy should succeed");
    assert_eq!(report.id, "0Af000000000001");
    assert_eq!(report.polls, 3);
    assert_eq!(report.components_deployed, 4);
}

#[tokio::test]
async fn failed_deploy_surfaces_remote_errors() {
    let mut deployer = MockDeployer::new();
    deployer.expect_login().returning(|_| Ok(session()));
    deployer
        .expect_deploy()
        .returning(|_, _, _| Ok("0Af2".to_string()));
    deployer.expect_check_deploy_status().returning(|_, id| {
        Ok(DeployStatus {
            id: id.into(),
            done: true,
            success: false,
            status: "Failed".into(),
            errors: vec!["staticresources/CompanyComponents.resource: Missing metadata".into()],
            ..DeployStatus::default()
        })
    });

    match deploy_package(&deployer, &fast_credentials(), vec![]).await {
        Err(BuildError::RemoteDeploy(msg)) => assert!(msg.contains("Missing metadata")),
        other => panic!("expected remote failure, got {other:?}"),
    }
}

#[tokio::test]
async fn login_failure_stops_before_upload() {
    let mut deployer = MockDeployer::new();
    deployer
        .expect_login()
        .returning(|_| Err("INVALID_LOGIN".into()));
    deployer.expect_deploy().never();

    let err = deploy_package(&deployer, &fast_credentials(), vec![])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("INVALID_LOGIN"));
}

#[tokio::test]
async fn polling_gives_up_after_timeout() {
    let mut deployer = MockDeployer::new();
    deployer.expect_login().returning(|_| Ok(session()));
    deployer
        .expect_deploy()
        .returning(|_, _, _| Ok("0Af3".to_string()));
    deployer
        .expect_check_deploy_status()
        .returning(|_, id| Ok(in_progress(id)));

    let mut creds = fast_credentials();
    creds.poll_timeout = Duration::from_millis(20);
    let err = deploy_package(&deployer, &creds, vec![]).await.unwrap_err();
    assert!(matches!(err, BuildError::DeployTimeout(t) if t == Duration::from_millis(20)));
}

#[tokio::test]
async fn deploy_directory_zips_the_source_tree() {
    let tmp = tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("src/staticresources")).unwrap();
    std::fs::write(tmp.path().join("src/package.xml"), "<Package/>").unwrap();
    std::fs::write(
        tmp.path().join("src/staticresources/CompanyComponents.resource"),
        b"PK",
    )
    .unwrap();
    let config = BuildConfig::new(tmp.path());

    let mut deployer = MockDeployer::new();
    deployer.expect_login().returning(|_| Ok(session()));
    deployer
        .expect_deploy()
        .withf(|_, zip_bytes, _| {
            let archive = zip::ZipArchive::new(Cursor::new(zip_bytes.clone())).unwrap();
            let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
            names.sort();
            names == ["src/package.xml", "src/staticresources/CompanyComponents.resource"]
        })
        .returning(|_, _, _| Ok("0Af4".to_string()));
    deployer.expect_check_deploy_status().returning(|_, id| {
        Ok(DeployStatus {
            id: id.into(),
            done: true,
            success: true,
            status: "Succeeded".into(),
            ..DeployStatus::default()
        })
    });

    let report = deploy_directory(&deployer, &config, &fast_credentials())
        .await
        .expect("deploy should succeed");
    assert_eq!(report.status, "Succeeded");
}
