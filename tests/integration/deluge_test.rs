//! Integration tests for the Deluge driver over RPC.

use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_install_busy_then_finished() {
    let app = TestApp::new();
    app.runtime.pause_pulls();

    let input = json!({"run_as_user": "bob", "password": ""});
    let job = app.call("Deluge.Install", input.clone()).await.ok();
    let job_id = job["job_id"].as_str().expect("job id").to_string();
    assert_eq!(job["status"], "Busy");
    assert_eq!(job["options"], input);

    let polled = app.call("Jobs.Get", json!(job_id)).await.ok();
    assert_eq!(polled["status"], "Busy");
    assert_eq!(polled["options"], input);

    app.runtime.resume_pulls();
    let done = app.wait_for_job(&job_id).await;

    assert_eq!(done["status"], "Finished");
    assert!(done.get("error").is_none());
    let options = &done["options"];
    let password = options["password"].as_str().expect("password");
    assert_eq!(password.len(), 14);
    assert!(password.chars().all(|c| c.is_ascii_alphabetic()));
    let port: u16 = options["web_port"]
        .as_str()
        .expect("web_port")
        .parse()
        .expect("numeric web_port");
    assert!((1024..51024).contains(&port));
    assert_eq!(options["run_as_user"], "bob");

    let container_id = options["container_id"].as_str().expect("container id");
    let container = app.runtime.container(container_id).await.expect("container");
    assert!(container.running);
    assert_eq!(container.spec.name, format!("dockhand_deluge_{port}"));
    assert!(app.home.path().join("bob/config/deluge").is_dir());
}

#[tokio::test]
async fn test_install_failure_is_recorded() {
    let app = TestApp::new();
    app.runtime
        .fail_on("pull_image", "registry unreachable")
        .await;

    let job = app.call("Deluge.Install", json!({})).await.ok();
    let done = app
        .wait_for_job(job["job_id"].as_str().expect("job id"))
        .await;

    assert_eq!(done["status"], "Failed");
    assert_eq!(done["error"]["kind"], "Container");
    assert_eq!(done["error"]["message"], "registry unreachable");
    let again = app
        .call("Jobs.Get", done["job_id"].clone())
        .await
        .ok();
    assert_eq!(again["status"], "Failed");
}

#[tokio::test]
async fn test_container_lifecycle() {
    let app = TestApp::new();
    let job = app.call("Deluge.Install", json!({})).await.ok();
    let done = app
        .wait_for_job(job["job_id"].as_str().expect("job id"))
        .await;
    let container = json!({"container_id": done["options"]["container_id"]});

    assert_eq!(app.call("Deluge.Stop", container.clone()).await.ok(), json!(true));
    let status = app.call("Deluge.Status", container.clone()).await.ok();
    assert_eq!(status["Running"], false);

    assert_eq!(app.call("Deluge.Start", container.clone()).await.ok(), json!(true));
    assert_eq!(app.call("Deluge.Restart", container.clone()).await.ok(), json!(true));
    let status = app.call("Deluge.Status", container.clone()).await.ok();
    assert_eq!(status["Running"], true);

    assert_eq!(app.call("Deluge.Uninstall", container.clone()).await.ok(), json!(true));
    let error = app.call("Deluge.Start", container).await.err();
    assert!(error.starts_with("NOT_FOUND"), "{error}");
}

#[tokio::test]
async fn test_reinstall_replaces_container() {
    let app = TestApp::new();
    let first = app.call("Deluge.Install", json!({})).await.ok();
    let first = app
        .wait_for_job(first["job_id"].as_str().expect("job id"))
        .await;
    let old_id = first["options"]["container_id"].clone();

    let second = app
        .call("Deluge.Reinstall", json!({"container_id": old_id}))
        .await
        .ok();
    assert_eq!(second["status"], "Busy");
    let second = app
        .wait_for_job(second["job_id"].as_str().expect("job id"))
        .await;

    assert_eq!(second["status"], "Finished");
    assert_ne!(second["options"]["container_id"], old_id);
    assert!(
        app.runtime
            .container(old_id.as_str().expect("old id"))
            .await
            .is_none()
    );
    assert_eq!(app.runtime.container_count().await, 1);
}

#[tokio::test]
async fn test_bad_options_are_rpc_errors() {
    let app = TestApp::new();
    let error = app.call("Deluge.Install", json!("bob")).await.err();
    assert!(error.starts_with("INVALID_REQUEST"), "{error}");
    assert!(app.jobs.is_empty().await);
}
