//! Integration tests for job tracking.

use std::collections::HashSet;

use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_never_issued_id_is_lost() {
    let app = TestApp::new();
    let error = app
        .call("Jobs.Get", json!("00000000000040008000000000000000"))
        .await
        .err();
    assert!(error.starts_with("OPERATION_LOST"), "{error}");
}

#[tokio::test]
async fn test_fifty_concurrent_installs() {
    let app = TestApp::new();
    app.runtime.pause_pulls();

    let mut handles = Vec::new();
    for i in 0..50u16 {
        let options = json!({
            "web_port": (20000 + i).to_string(),
            "daemon_port": (30000 + i).to_string(),
        });
        handles.push(app.call("Deluge.Install", options));
    }
    let jobs = futures::future::join_all(handles).await;

    let ids: HashSet<String> = jobs
        .into_iter()
        .map(|outcome| {
            let job = outcome.ok();
            assert_eq!(job["status"], "Busy");
            job["job_id"].as_str().expect("job id").to_string()
        })
        .collect();
    assert_eq!(ids.len(), 50);

    app.runtime.resume_pulls();
    let mut containers = HashSet::new();
    for id in &ids {
        let done = app.wait_for_job(id).await;
        assert_eq!(done["status"], "Finished", "{done}");
        let container_id = done["options"]["container_id"].as_str().expect("container id");
        containers.insert(container_id.to_string());
    }
    assert_eq!(containers.len(), 50);
    assert_eq!(app.runtime.container_count().await, 50);
    assert_eq!(app.jobs.len().await, 50);
}
