use crate::e2e::helpers;

use helpers::fixtures::{wav, wav_duration};
use helpers::{
    count_requests, google_repository, mount_google_job, STAGED_OBJECT_PATH, TEST_PROJECT,
    TEST_TOKEN,
};
use serde_json::{json, Value};
use std::time::Duration;
use story_audio_backend::domain::audio::{SynthesisError, VoiceOverride};
use story_audio_backend::infrastructure::repositories::SynthesisRepository;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn submit_path() -> String {
    format!("/v1/projects/{}/locations/global:synthesizeLongAudio", TEST_PROJECT)
}

/// Staged-object deletes issued from a dropped guard run on a spawned task
async fn wait_for_deletes(server: &MockServer, expected: usize) -> usize {
    for _ in 0..50 {
        let deletes = count_requests(server, "DELETE").await;
        if deletes >= expected {
            return deletes;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    count_requests(server, "DELETE").await
}

#[tokio::test]
async fn it_should_submit_poll_download_and_clean_up() {
    let server = MockServer::start().await;
    let audio = wav(24000, 36000);
    mount_google_job(&server, audio.clone()).await;

    let repository = google_repository(&server, Duration::from_secs(5));
    let chunk = repository
        .synthesize("<speak><p>Long story</p></speak>", &VoiceOverride::default())
        .await
        .unwrap();

    assert_eq!(chunk.audio, audio);
    assert!((chunk.duration_secs - 1.5).abs() < 1e-9);
    assert!((wav_duration(&chunk.audio) - 1.5).abs() < 1e-9);

    let requests = server.received_requests().await.unwrap();
    let submit = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let body: Value = serde_json::from_slice(&submit.body).unwrap();
    assert_eq!(body["input"]["ssml"], "<speak><p>Long story</p></speak>");
    assert_eq!(body["audioConfig"]["audioEncoding"], "LINEAR16");
    assert_eq!(body["voice"]["name"], "en-US-Studio-O");
    let output_uri = body["outputGcsUri"].as_str().unwrap();
    assert!(output_uri.starts_with("gs://staging-bucket/temp_audio_"));
    assert!(output_uri.ends_with(".wav"));

    // Cleanup happens before synthesize returns on success
    assert_eq!(count_requests(&server, "DELETE").await, 1);
}

#[tokio::test]
async fn it_should_authorize_every_call_with_bearer_token() {
    let server = MockServer::start().await;
    let bearer = format!("Bearer {}", TEST_TOKEN);

    Mock::given(method("POST"))
        .and(path(submit_path()))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op-9", "done": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(STAGED_OBJECT_PATH))
        .and(query_param("alt", "media"))
        .and(query_param("userProject", TEST_PROJECT))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wav(16000, 1600)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(STAGED_OBJECT_PATH))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let repository = google_repository(&server, Duration::from_secs(5));
    let chunk = repository
        .synthesize("<speak><p>Hi</p></speak>", &VoiceOverride::default())
        .await
        .unwrap();

    // Already done on submit: no polling
    assert!((chunk.duration_secs - 0.1).abs() < 1e-9);
}

#[tokio::test]
async fn it_should_fail_and_clean_up_when_job_reports_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(submit_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op-2"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/operations/op-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op-2",
            "done": true,
            "error": {"code": 3, "message": "Invalid SSML"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(STAGED_OBJECT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let repository = google_repository(&server, Duration::from_secs(5));
    let err = repository
        .synthesize("<speak><p>Hi</p></speak>", &VoiceOverride::default())
        .await
        .unwrap_err();

    match err {
        SynthesisError::JobFailed(message) => assert!(message.contains("Invalid SSML")),
        other => panic!("unexpected error: {:?}", other),
    }

    // A failed delete is logged, never surfaced
    assert_eq!(wait_for_deletes(&server, 1).await, 1);
}

#[tokio::test]
async fn it_should_time_out_long_running_jobs() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(submit_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/slow"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/operations/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/slow", "done": false})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(STAGED_OBJECT_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let repository = google_repository(&server, Duration::from_millis(200));
    let err = repository
        .synthesize("<speak><p>Hi</p></speak>", &VoiceOverride::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SynthesisError::Timeout(timeout) if timeout == Duration::from_millis(200)));
    assert!(count_requests(&server, "GET").await >= 1);
    assert_eq!(wait_for_deletes(&server, 1).await, 1);
}

#[tokio::test]
async fn it_should_report_staging_download_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(submit_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op-3", "done": true})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(STAGED_OBJECT_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(STAGED_OBJECT_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let repository = google_repository(&server, Duration::from_secs(5));
    let err = repository
        .synthesize("<speak><p>Hi</p></speak>", &VoiceOverride::default())
        .await
        .unwrap_err();

    match err {
        SynthesisError::Staging(message) => assert!(message.contains("403")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(count_requests(&server, "DELETE").await, 1);
}

#[tokio::test]
async fn it_should_surface_submit_rejections() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(submit_path()))
        .respond_with(ResponseTemplate::new(400).set_body_string("SSML too long"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(STAGED_OBJECT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let repository = google_repository(&server, Duration::from_secs(5));
    let err = repository
        .synthesize("<speak><p>Hi</p></speak>", &VoiceOverride::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SynthesisError::Provider { status: 400, .. }));
}
