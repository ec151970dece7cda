use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use shared::{ChatFailure, ChatRequest, ChatResponse, ModelsResponse, ProfileResponse};
use uuid::Uuid;

const API_ROOT: &str = "/api/v0";

async fn read<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
    if resp.ok() {
        resp.json().await.map_err(|e| e.to_string())
    } else {
        Err(format!("{} {}", resp.status(), resp.status_text()))
    }
}

pub async fn profile() -> Result<ProfileResponse, String> {
    let resp = Request::get(&format!("{API_ROOT}/profile"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    read(resp).await
}

/// `Ok(Err(_))` is a failure the server answered with; it still carries the
/// updated transcript.
pub async fn chat(body: &ChatRequest) -> Result<Result<ChatResponse, ChatFailure>, String> {
    let resp = Request::post(&format!("{API_ROOT}/chat"))
        .json(body)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if resp.ok() {
        resp.json().await.map(Ok).map_err(|e| e.to_string())
    } else {
        match resp.json::<ChatFailure>().await {
            Ok(failure) => Ok(Err(failure)),
            Err(_) => Err(format!("{} {}", resp.status(), resp.status_text())),
        }
    }
}

pub async fn clear_session(id: Uuid) -> Result<(), String> {
    let resp = Request::delete(&format!("{API_ROOT}/sessions/{id}"))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if resp.ok() {
        Ok(())
    } else {
        Err(format!("{} {}", resp.status(), resp.status_text()))
    }
}

pub async fn local_models() -> Result<Vec<String>, String> {
    let resp = Request::get(&format!("{API_ROOT}/models/local"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    read::<ModelsResponse>(resp).await.map(|r| r.models)
}
