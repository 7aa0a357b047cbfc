//! Unit and mock HTTP tests for VeoClient and the generation workflow.
//!
//! These tests cover:
//! - Client creation and configuration
//! - Request formatting for submit and status calls
//! - Video download and error mapping
//! - End-to-end scene generation against a mock server

use std::time::Duration;

use veo_scene::scene::{SceneSession, GENERATION_FAILED_MESSAGE};
use veo_scene::veo::{
    generate_video, Cancellation, GenerationRequest, OperationHandle, PollPolicy, ReferenceImage,
    VeoClient, VeoError, DEFAULT_MODEL, VEO_API_BASE_URL,
};

const SUBMIT_PATH: &str = "/v1beta/models/veo-2.0-generate-001:predictLongRunning";
const OPERATION_NAME: &str = "models/veo-2.0-generate-001/operations/op-1";
const OPERATION_PATH: &str = "/v1beta/models/veo-2.0-generate-001/operations/op-1";

fn reference_image() -> ReferenceImage {
    ReferenceImage::new(vec![0xff, 0xd8], "image/jpeg")
}

fn fast_policy() -> PollPolicy {
    PollPolicy::default().with_interval(Duration::from_millis(10))
}

// === Client Creation Tests ===

#[test]
fn test_with_api_key_creates_client() {
    let client = VeoClient::with_api_key("test-api-key".to_string()).unwrap();
    assert_eq!(client.api_key(), "test-api-key");
    assert_eq!(client.base_url(), VEO_API_BASE_URL);
    assert_eq!(client.model(), DEFAULT_MODEL);
}

#[test]
fn test_with_base_url_empty_key_returns_error() {
    let result = VeoClient::with_base_url("".to_string(), "https://custom.api".to_string());
    assert!(matches!(result, Err(VeoError::MissingApiKey)));
}

#[test]
fn test_with_options_custom_model() {
    let client = VeoClient::with_options(
        "k".to_string(),
        "https://custom.api".to_string(),
        "veo-3.0-generate-preview".to_string(),
    )
    .unwrap();
    assert_eq!(client.model(), "veo-3.0-generate-preview");
    assert_eq!(client.base_url(), "https://custom.api");
}

// === Mock HTTP Server Tests ===

mod mock_http_tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> VeoClient {
        VeoClient::with_base_url("test-api-key".to_string(), server.uri()).unwrap()
    }

    fn done_with_uri(uri: &str) -> serde_json::Value {
        serde_json::json!({
            "name": OPERATION_NAME,
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": uri}}]
                }
            }
        })
    }

    #[tokio::test]
    async fn test_submit_sends_fixed_config_once() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .and(header("x-goog-api-key", "test-api-key"))
            .and(body_json(serde_json::json!({
                "instances": [{
                    "prompt": "A tiger runs through the jungle",
                    "image": {"bytesBase64Encoded": "/9g=", "mimeType": "image/jpeg"}
                }],
                "parameters": {"sampleCount": 1, "aspectRatio": "16:9"}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": OPERATION_NAME})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = GenerationRequest::new("A tiger runs through the jungle", reference_image());
        let handle = client.submit_generation(&request).await.unwrap();

        assert_eq!(handle.name, OPERATION_NAME);
        assert!(!handle.done);
    }

    #[tokio::test]
    async fn test_submit_config_does_not_depend_on_prompt() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .and(wiremock::matchers::body_partial_json(serde_json::json!({
                "parameters": {"sampleCount": 1, "aspectRatio": "16:9"}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": OPERATION_NAME})),
            )
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        for prompt in ["", "a very long prompt about a portrait 9:16 video", "two videos please"] {
            let request = GenerationRequest::new(prompt, reference_image());
            client.submit_generation(&request).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_submit_api_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("API key not valid"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = GenerationRequest::new("tiger", reference_image());
        let result = client.submit_generation(&request).await;

        match result {
            Err(VeoError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.contains("API key not valid"));
            }
            _ => panic!("Expected Api error, got {:?}", result),
        }
    }

    #[tokio::test]
    async fn test_get_operation_sends_correct_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OPERATION_PATH))
            .and(header("x-goog-api-key", "test-api-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(done_with_uri("https://example.com/video?token=abc")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let pending = OperationHandle {
            name: OPERATION_NAME.to_string(),
            ..Default::default()
        };
        let handle = client.get_operation(&pending).await.unwrap();

        assert!(handle.done);
        let videos = handle.response.unwrap().generated_videos.unwrap();
        assert_eq!(videos[0].uri(), "https://example.com/video?token=abc");
    }

    #[tokio::test]
    async fn test_get_operation_handles_non_success_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OPERATION_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let pending = OperationHandle {
            name: OPERATION_NAME.to_string(),
            ..Default::default()
        };
        let result = client.get_operation(&pending).await;

        assert!(matches!(result, Err(VeoError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_download_video_handles_successful_download() {
        let mock_server = MockServer::start().await;
        let video_bytes: Vec<u8> = vec![0x00, 0x00, 0x00, 0x18, 0x66, 0x74, 0x79, 0x70];

        Mock::given(method("GET"))
            .and(path("/videos/test.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(video_bytes.clone()))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let url: reqwest::Url = format!("{}/videos/test.mp4", mock_server.uri())
            .parse()
            .unwrap();
        let bytes = client.download_video(&url).await.unwrap();

        assert_eq!(bytes, video_bytes);
    }

    #[tokio::test]
    async fn test_download_video_403_carries_status_and_reason() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/video"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let url: reqwest::Url = format!("{}/video?token=abc&key=test-api-key", mock_server.uri())
            .parse()
            .unwrap();
        let result = client.download_video(&url).await;

        let error = result.unwrap_err();
        assert!(matches!(
            error,
            VeoError::FetchFailed { status: 403, ref reason } if reason == "Forbidden"
        ));
        assert!(error.to_string().contains("403"));
        assert!(error.to_string().contains("Forbidden"));
    }

    #[tokio::test]
    async fn test_download_video_with_oversized_content_length_returns_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // wiremock always sends a truthful Content-Length, so answer by hand.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 9000000000000000\r\n\r\n\x00\x01")
                .await
                .unwrap();
        });

        let client =
            VeoClient::with_base_url("test-api-key".to_string(), format!("http://{}", addr))
                .unwrap();
        let url: reqwest::Url = format!("http://{}/video", addr).parse().unwrap();
        let result = client.download_video(&url).await;

        assert!(matches!(result, Err(VeoError::HttpError(_))));
    }

    #[tokio::test]
    async fn test_generate_video_end_to_end() {
        let mock_server = MockServer::start().await;
        let encoded_uri = urlencoding::encode(&format!("{}/video?token=abc", mock_server.uri()))
            .into_owned();

        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": OPERATION_NAME,
                "done": false
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(OPERATION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(done_with_uri(&encoded_uri)))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/video"))
            .and(query_param("token", "abc"))
            .and(query_param("key", "test-api-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(vec![0x00, 0x01]),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let mut session = SceneSession::new(reference_image(), "test-api-key".to_string())
            .with_policy(fast_policy());
        session.set_prompt("A tiger runs through the jungle");

        let video = session
            .generate(&client, &Cancellation::new())
            .await
            .unwrap()
            .clone();

        assert_eq!(video.video_url, "data:video/mp4;base64,AAE=");
        assert_eq!(video.description, "A tiger runs through the jungle");
        assert!(session.error().is_none());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_immediately_done_without_videos_shows_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": OPERATION_NAME,
                "done": true,
                "response": {"generateVideoResponse": {"generatedSamples": []}}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let mut session = SceneSession::new(reference_image(), "test-api-key".to_string())
            .with_policy(fast_policy());
        session.set_prompt("A tiger runs through the jungle");

        let lines = session
            .generate(&client, &Cancellation::new())
            .await
            .unwrap_err()
            .lines()
            .to_vec();

        assert_eq!(lines, GENERATION_FAILED_MESSAGE.map(String::from).to_vec());
        assert!(session.playing().is_none());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_fetch_403_surfaces_fixed_message() {
        let mock_server = MockServer::start().await;
        let uri = format!("{}/video?token=abc", mock_server.uri());

        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(done_with_uri(&uri)))
            .expect(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/video"))
            .respond_with(ResponseTemplate::new(403))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // The workflow itself reports the status...
        let request = GenerationRequest::new("tiger", reference_image());
        let raw = generate_video(
            &client,
            &request,
            "test-api-key",
            &fast_policy(),
            &Cancellation::new(),
        )
        .await;
        assert!(matches!(raw, Err(VeoError::FetchFailed { status: 403, .. })));

        // ...but the user only ever sees the fixed message.
        let mut session = SceneSession::new(reference_image(), "test-api-key".to_string());
        session.set_prompt("tiger");
        let state = session
            .generate(&client, &Cancellation::new())
            .await
            .unwrap_err()
            .clone();
        assert_eq!(state.lines(), GENERATION_FAILED_MESSAGE.map(String::from).as_slice());
        assert!(state.lines().iter().all(|l| !l.contains("403")));
        assert!(session.playing().is_none());
    }

    #[tokio::test]
    async fn test_resubmission_after_failure_is_independent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": OPERATION_NAME,
                "done": true
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let mut session = SceneSession::new(reference_image(), "test-api-key".to_string());
        session.set_prompt("same prompt");

        assert!(session.generate(&client, &Cancellation::new()).await.is_err());
        session.dismiss_error();
        assert!(session.error().is_none());
        assert!(session.generate(&client, &Cancellation::new()).await.is_err());
        assert!(session.error().is_some());

        let submits: Vec<_> = mock_server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.as_str() == "POST")
            .collect();
        assert_eq!(submits.len(), 2);

        let first: serde_json::Value = serde_json::from_slice(&submits[0].body).unwrap();
        let second: serde_json::Value = serde_json::from_slice(&submits[1].body).unwrap();
        assert_eq!(first, second);
        assert_eq!(first["instances"][0]["prompt"], "same prompt");
    }
}
