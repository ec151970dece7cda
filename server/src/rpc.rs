use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use askbot::{GenerateError, GenerationRequest};
use serde_json::json;
use shared::{
    ChatFailure, ChatRequest, ChatResponse, FailureKind, ModelsResponse, ProfileResponse,
    SessionResponse, Transcript,
};
use uuid::Uuid;

use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v0/profile", get(profile))
        .route("/api/v0/chat", post(chat))
        .route(
            "/api/v0/sessions/:session",
            get(get_session).delete(clear_session),
        )
        .route("/api/v0/models/local", get(local_models))
        .with_state(state)
}

pub struct ChatRejection {
    status: StatusCode,
    failure: ChatFailure,
}

impl ChatRejection {
    fn new(kind: FailureKind, message: String, transcript: Transcript) -> Self {
        let status = match kind {
            FailureKind::InvalidRequest | FailureKind::Configuration => StatusCode::BAD_REQUEST,
            FailureKind::Generation => StatusCode::BAD_GATEWAY,
        };

        Self {
            status,
            failure: ChatFailure {
                kind,
                message,
                transcript,
            },
        }
    }

    fn from_error(err: GenerateError, transcript: Transcript) -> Self {
        let kind = match err {
            GenerateError::Configuration(_) => FailureKind::Configuration,
            GenerateError::Generation(_) => FailureKind::Generation,
        };
        Self::new(kind, err.to_string(), transcript)
    }
}

impl IntoResponse for ChatRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.failure)).into_response()
    }
}

async fn profile(State(state): State<AppState>) -> Json<ProfileResponse> {
    Json(state.profile.describe())
}

async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatRejection> {
    let session = body.session;

    if body.question.trim().is_empty() {
        return Err(ChatRejection::new(
            FailureKind::InvalidRequest,
            "question is empty".to_string(),
            state.sessions.transcript(session),
        ));
    }

    let result = match GenerationRequest::from_settings(body.question.as_str(), &body.settings) {
        Ok(request) => state.generator.generate(&request).await,
        Err(e) => Err(e.into()),
    };

    let transcript = state
        .sessions
        .record(session, &body.question, result.as_ref().ok().cloned());

    match result {
        Ok(answer) => Ok(Json(ChatResponse {
            session,
            answer,
            transcript,
        })),
        Err(err) => {
            tracing::warn!(%session, backend = %body.settings.backend, "chat failed: {}", err);
            Err(ChatRejection::from_error(err, transcript))
        }
    }
}

async fn get_session(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        session,
        transcript: state.sessions.transcript(session),
    })
}

async fn clear_session(State(state): State<AppState>, Path(session): Path<Uuid>) -> StatusCode {
    state.sessions.clear(session);
    StatusCode::NO_CONTENT
}

async fn local_models(State(state): State<AppState>) -> Response {
    match state.ollama.list_models().await {
        Ok(models) => Json(ModelsResponse { models }).into_response(),
        Err(e) => {
            tracing::warn!("Could not list local models: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use askbot::{AppProfile, Endpoints, GeneratorConfig, TelemetryConfig};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use shared::{Backend, ChatSettings};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn app(server: &MockServer, profile: AppProfile) -> Router {
        let config = GeneratorConfig {
            endpoints: Endpoints {
                openai: server.uri(),
                ollama: server.uri(),
            },
            telemetry: TelemetryConfig::default(),
        };
        routes(AppState::new(&config, profile).unwrap())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn chat_request(session: Uuid, question: &str, settings: ChatSettings) -> Request<Body> {
        let body = ChatRequest {
            session,
            question: question.to_string(),
            settings,
        };
        Request::builder()
            .method("POST")
            .uri("/api/v0/chat")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn mount_ollama_reply(server: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gemma:2b",
                "message": { "role": "assistant", "content": content },
                "done": true
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn successful_chats_build_an_alternating_transcript() {
        let server = MockServer::start().await;
        mount_ollama_reply(&server, "Hi there!").await;
        let app = app(&server, AppProfile::Combined).await;
        let session = Uuid::new_v4();

        for question in ["hello", "how are you?"] {
            let settings = ChatSettings::for_backend(Backend::Ollama);
            let (status, body) = send(&app, chat_request(session, question, settings)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["answer"], "Hi there!");
        }

        let (status, body) = send(&app, get(&format!("/api/v0/sessions/{session}"))).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["transcript"].as_array().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], json!({ "sender": "user", "text": "hello" }));
        assert_eq!(entries[1], json!({ "sender": "assistant", "text": "Hi there!" }));
        assert_eq!(entries[2]["text"], "how are you?");
        assert_eq!(entries[3]["sender"], "assistant");
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_failure() {
        let server = MockServer::start().await;
        let app = app(&server, AppProfile::OpenAi).await;
        let session = Uuid::new_v4();

        let settings = ChatSettings::for_backend(Backend::OpenAi);
        let (status, body) = send(&app, chat_request(session, "hello", settings)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "configuration");
        assert_eq!(body["message"], "missing credential");
        assert_eq!(
            body["transcript"],
            json!([{ "sender": "user", "text": "hello" }])
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_backend_is_a_configuration_failure() {
        let server = MockServer::start().await;
        let app = app(&server, AppProfile::Combined).await;

        let mut settings = ChatSettings::for_backend(Backend::Ollama);
        settings.backend = "anthropic".to_string();
        let (status, body) = send(&app, chat_request(Uuid::new_v4(), "hello", settings)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "unsupported backend: anthropic");
    }

    #[tokio::test]
    async fn provider_failure_is_a_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "error": "out of memory" })),
            )
            .mount(&server)
            .await;
        let app = app(&server, AppProfile::Ollama).await;

        let settings = ChatSettings::for_backend(Backend::Ollama);
        let (status, body) = send(&app, chat_request(Uuid::new_v4(), "hello", settings)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "generation");
        assert_eq!(body["message"], "out of memory");
        assert_eq!(body["transcript"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_question_leaves_the_transcript_alone() {
        let server = MockServer::start().await;
        let app = app(&server, AppProfile::Ollama).await;
        let session = Uuid::new_v4();

        let settings = ChatSettings::for_backend(Backend::Ollama);
        let (status, body) = send(&app, chat_request(session, "   ", settings)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_request");
        assert_eq!(body["transcript"], json!([]));
    }

    #[tokio::test]
    async fn clearing_a_session_empties_it() {
        let server = MockServer::start().await;
        mount_ollama_reply(&server, "ok").await;
        let app = app(&server, AppProfile::Ollama).await;
        let session = Uuid::new_v4();

        let settings = ChatSettings::for_backend(Backend::Ollama);
        send(&app, chat_request(session, "hello", settings)).await;

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/api/v0/sessions/{session}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, get(&format!("/api/v0/sessions/{session}"))).await;
        assert_eq!(body["transcript"], json!([]));
    }

    #[tokio::test]
    async fn profile_describes_enabled_backends() {
        let server = MockServer::start().await;
        let app = app(&server, AppProfile::OpenAi).await;

        let (status, body) = send(&app, get("/api/v0/profile")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Enhanced Q&A Chatbot with OpenAI");
        assert_eq!(body["backends"].as_array().unwrap().len(), 1);
        assert_eq!(body["backends"][0]["backend"], "openai");
        assert_eq!(body["backends"][0]["requires_credential"], true);
        assert_eq!(body["defaults"]["temperature"], 0.7);
    }

    #[tokio::test]
    async fn local_models_are_proxied_from_ollama() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{ "name": "mistral:7b" }]
            })))
            .mount(&server)
            .await;
        let app = app(&server, AppProfile::Ollama).await;

        let (status, body) = send(&app, get("/api/v0/models/local")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models"], json!(["mistral:7b"]));
    }
}
