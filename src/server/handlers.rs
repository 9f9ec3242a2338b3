use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::{
    debug_log::{DebugKind, DISPLAY_LIMIT, SESSION_HEADER},
    error::{RelayError, Result},
    models::{
        common::{GenerateJsonRequest, HealthResponse, PromptResponse},
        image::{GenerateResponse, UploadPayload},
    },
    prompt::PromptOptions,
    relay::TransformForm,
    server::state::AppState,
};

const UPLOAD_FILE_NAME: &str = "uploaded-image.jpg";
const INDEX_HTML: &str = include_str!("../../static/index.html");

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        provider_configured: state.provider_configured,
    })
}

pub async fn generate(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let session = debug_session(&req);
    let form = match read_transform_form(&req, payload, state.max_upload_bytes).await {
        Ok(form) => form,
        Err(err) => {
            state.record(session, DebugKind::Error, json!({ "error": err.to_string() }));
            return Err(err);
        }
    };

    state.record(
        session,
        DebugKind::Request,
        json!({
            "prompt": form.prompt,
            "hasImage": form.image.is_some(),
            "imageBytes": form.image.as_ref().map(|i| i.len()),
        }),
    );

    match state.relay.transform(form).await {
        Ok(reference) => {
            let body = GenerateResponse::from(&reference);
            state.record(
                session,
                DebugKind::Response,
                json!({
                    "status": 200,
                    "imageUrl": preview(&body.image_url),
                    "success": true,
                }),
            );
            Ok(HttpResponse::Ok().json(body))
        }
        Err(err) => {
            state.record(
                session,
                DebugKind::Error,
                json!({ "status": err.http_status(), "error": err.to_string() }),
            );
            Err(err)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

pub async fn proxy_image(
    query: web::Query<ProxyQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let image = state.proxy.fetch(query.url.as_deref()).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, image.content_type))
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "GET"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
        .streaming(image.response.bytes_stream()))
}

pub async fn compose_prompt(
    options: web::Json<PromptOptions>,
    state: web::Data<AppState>,
) -> HttpResponse {
    HttpResponse::Ok().json(PromptResponse {
        prompt: state.prompts.build(&options),
        mode: state.prompts.mode(),
    })
}

pub async fn debug_entries(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.recent_debug(debug_session(&req), DISPLAY_LIMIT))
}

fn debug_session(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Data URIs are long; the debug panel only needs the start.
fn preview(image_url: &str) -> String {
    const LIMIT: usize = 64;
    match image_url.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}…", &image_url[..idx]),
        None => image_url.to_string(),
    }
}

fn is_json(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.trim_start().starts_with("application/json"))
}

async fn read_transform_form(
    req: &HttpRequest,
    payload: web::Payload,
    limit: usize,
) -> Result<TransformForm> {
    if is_json(req) {
        read_json_form(payload, limit).await
    } else {
        read_multipart_form(Multipart::new(req.headers(), payload), limit).await
    }
}

async fn read_json_form(mut payload: web::Payload, limit: usize) -> Result<TransformForm> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| RelayError::InvalidInput(format!("Failed to read body: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(too_large(limit));
        }
        body.extend_from_slice(&chunk);
    }

    let request: GenerateJsonRequest = serde_json::from_slice(&body)
        .map_err(|e| RelayError::InvalidInput(format!("Invalid JSON body: {}", e)))?;
    let image = match request.image.as_deref().map(str::trim) {
        Some(uri) if !uri.is_empty() => Some(UploadPayload::from_data_uri(uri, UPLOAD_FILE_NAME)?),
        _ => None,
    };

    Ok(TransformForm {
        prompt: request.prompt,
        image,
    })
}

async fn read_multipart_form(mut multipart: Multipart, limit: usize) -> Result<TransformForm> {
    let mut form = TransformForm::default();
    let mut total = 0usize;

    while let Some(mut field) = multipart.try_next().await.map_err(malformed_form)? {
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let file_name = disposition.get_filename().map(str::to_string);
        let content_type = field.content_type().map(|m| m.essence_str().to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed_form)? {
            total += chunk.len();
            if total > limit {
                return Err(too_large(limit));
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "prompt" => form.prompt = Some(String::from_utf8_lossy(&bytes).into_owned()),
            // Browsers send an empty file part when nothing was picked.
            "image" if bytes.is_empty() => {}
            "image" => {
                let file_name = file_name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| UPLOAD_FILE_NAME.to_string());
                let content_type = content_type
                    .filter(|ct| ct != "application/octet-stream")
                    .or_else(|| mime_guess::from_path(&file_name).first().map(|m| m.to_string()))
                    .unwrap_or_else(|| "image/jpeg".to_string());
                form.image = Some(UploadPayload::new(bytes, file_name, content_type));
            }
            other => log::debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(form)
}

fn malformed_form(err: actix_multipart::MultipartError) -> RelayError {
    RelayError::InvalidInput(format!("Expected multipart/form-data or JSON body: {}", err))
}

fn too_large(limit: usize) -> RelayError {
    RelayError::InvalidInput(format!("Upload exceeds {} bytes", limit))
}
