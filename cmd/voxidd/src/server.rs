//! HTTP transport for the speaker service.
//!
//! API endpoints:
//! - GET    /                        - Health check and endpoint map
//! - POST   /enroll                  - Enroll a clip (multipart: username, clip_number, audio)
//! - POST   /predict                 - Identify a speaker (multipart: audio)
//! - GET    /enrolled-users          - List enrolled identities
//! - DELETE /delete-user/{username}  - Remove an identity

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use voxid_speaker::{SpeakerError, SpeakerService};

type AppState = Arc<SpeakerService>;
type JsonResponse = (StatusCode, Json<Value>);

/// Bind the listen address and serve until shutdown.
pub async fn serve(addr: &str, service: AppState, max_body_bytes: usize) -> Result<()> {
    let app = Router::new()
        .route("/", get(health))
        .route("/enroll", post(enroll))
        .route("/predict", post(predict))
        .route("/enrolled-users", get(enrolled_users))
        .route("/delete-user/{username}", delete(delete_user))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(service);

    let addr = parse_addr(addr)?;
    tracing::info!("listening on http://{addr}");
    tracing::info!("  - GET    /                    health check");
    tracing::info!("  - POST   /enroll              enroll a clip");
    tracing::info!("  - POST   /predict             identify a speaker");
    tracing::info!("  - GET    /enrolled-users      list identities");
    tracing::info!("  - DELETE /delete-user/<name>  remove an identity");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Parse an address string to SocketAddr; ":5000" binds all interfaces.
fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };
    Ok(addr.parse()?)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> JsonResponse {
    (
        status,
        Json(json!({ "status": "error", "message": message.into() })),
    )
}

/// Translate a core error into an HTTP response, logging at the boundary.
fn speaker_error_response(e: &SpeakerError) -> JsonResponse {
    let status = match e {
        SpeakerError::InvalidIdentity(_)
        | SpeakerError::SlotOutOfRange { .. }
        | SpeakerError::Transcode(_) => StatusCode::BAD_REQUEST,
        SpeakerError::NotFound => StatusCode::NOT_FOUND,
        SpeakerError::Extraction(_)
        | SpeakerError::InsufficientData
        | SpeakerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %e, "request failed");
    } else {
        tracing::warn!(error = %e, "request rejected");
    }
    error_response(status, e.to_string())
}

async fn health(State(service): State<AppState>) -> JsonResponse {
    let enrolled = match tokio::task::spawn_blocking(move || service.enrolled_count()).await {
        Ok(Ok(count)) => count,
        Ok(Err(e)) => return speaker_error_response(&e),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "running",
            "message": "Speaker Recognition Server",
            "enrolled_users": enrolled,
            "endpoints": {
                "health": "/ (GET)",
                "enroll": "/enroll (POST)",
                "predict": "/predict (POST)",
                "enrolled_users": "/enrolled-users (GET)",
                "delete_user": "/delete-user/<username> (DELETE)"
            }
        })),
    )
}

async fn enroll(State(service): State<AppState>, mut multipart: Multipart) -> JsonResponse {
    let mut username = None;
    let mut clip_number = None;
    let mut audio = None;

    loop {
        match multipart.next_field().await {
            // Capture the name before consuming the field body.
            Ok(Some(field)) => match field.name().map(str::to_string).as_deref() {
                Some("username") => match field.text().await {
                    Ok(text) => username = Some(text),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("bad username field: {e}"),
                        );
                    }
                },
                Some("clip_number") => match field.text().await {
                    Ok(text) => clip_number = Some(text),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("bad clip_number field: {e}"),
                        );
                    }
                },
                Some("audio") => match field.bytes().await {
                    Ok(bytes) => audio = Some(bytes.to_vec()),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("bad audio field: {e}"),
                        );
                    }
                },
                _ => {}
            },
            Ok(None) => break,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("bad multipart body: {e}"));
            }
        }
    }

    let Some(username) = username else {
        return error_response(StatusCode::BAD_REQUEST, "username is required");
    };
    let Some(clip_number) = clip_number else {
        return error_response(StatusCode::BAD_REQUEST, "clip_number is required");
    };
    let Ok(slot) = clip_number.trim().parse::<usize>() else {
        return error_response(StatusCode::BAD_REQUEST, "clip_number must be an integer");
    };
    let Some(audio) = audio else {
        return error_response(StatusCode::BAD_REQUEST, "no audio file provided");
    };
    if audio.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "audio file is empty");
    }

    let progress =
        match tokio::task::spawn_blocking(move || service.submit_clip(&username, slot, &audio))
            .await
        {
            Ok(Ok(progress)) => progress,
            Ok(Err(e)) => return speaker_error_response(&e),
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

    tracing::info!(
        identity = %progress.identity,
        clips = progress.clips_received,
        complete = progress.enrollment_complete,
        "enrollment clip accepted"
    );

    let message = if progress.enrollment_complete {
        format!("Enrollment complete for {}", progress.identity)
    } else {
        format!(
            "Clip {}/{} received",
            progress.clips_received, progress.required_clips
        )
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": message,
            "username": progress.identity,
            "clips_received": progress.clips_received,
            "required_clips": progress.required_clips,
            "enrollment_complete": progress.enrollment_complete,
        })),
    )
}

async fn predict(State(service): State<AppState>, mut multipart: Multipart) -> JsonResponse {
    let mut audio = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name().map(str::to_string).as_deref() == Some("audio") {
                    match field.bytes().await {
                        Ok(bytes) => audio = Some(bytes.to_vec()),
                        Err(e) => {
                            return error_response(
                                StatusCode::BAD_REQUEST,
                                format!("bad audio field: {e}"),
                            );
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("bad multipart body: {e}"));
            }
        }
    }

    let Some(audio) = audio else {
        return error_response(StatusCode::BAD_REQUEST, "no audio file provided");
    };
    if audio.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "audio file is empty");
    }

    let identification = match tokio::task::spawn_blocking(move || service.identify(&audio)).await {
        Ok(Ok(identification)) => identification,
        Ok(Err(e)) => return speaker_error_response(&e),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let prediction = identification
        .prediction
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    let message = match &identification.prediction {
        Some(identity) => format!("Matched with {identity}"),
        None => "No match found above threshold".to_string(),
    };

    tracing::info!(
        prediction = %prediction,
        confidence = identification.confidence,
        "prediction served"
    );

    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "prediction": prediction,
            "confidence": identification.confidence,
            "threshold": identification.threshold,
            "all_similarities": identification.scores,
            "message": message,
        })),
    )
}

async fn enrolled_users(State(service): State<AppState>) -> JsonResponse {
    let records = match tokio::task::spawn_blocking(move || service.list_identities()).await {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => return speaker_error_response(&e),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let users: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "username": r.identity,
                "enrolled_date": r.enrolled_date,
                "clips_count": r.clips_count,
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "count": users.len(),
            "users": users,
        })),
    )
}

async fn delete_user(
    State(service): State<AppState>,
    Path(username): Path<String>,
) -> JsonResponse {
    let deleted_name = username.clone();
    match tokio::task::spawn_blocking(move || service.delete_identity(&username)).await {
        Ok(Ok(())) => {
            tracing::info!(identity = %deleted_name, "identity deleted");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "message": format!("User {deleted_name} deleted successfully"),
                })),
            )
        }
        Ok(Err(e)) => speaker_error_response(&e),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
