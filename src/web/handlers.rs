use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use serde_json::json;
use uuid::Uuid;

use crate::upstream;
use crate::web::models::{ChatRequest, ChatResponse, Message};
use crate::web::AppState;

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Chat relay endpoint
pub async fn chat(data: web::Data<AppState>, req: web::Json<ChatRequest>) -> impl Responder {
    let ChatRequest { message, history } = req.into_inner();

    if message.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "Message must not be empty"
        }));
    }

    let request_id = Uuid::new_v4();
    info!(
        "Chat request {}: {} prior turns, {} chars",
        request_id,
        history.len(),
        message.len()
    );

    // The upstream sequence is the caller's history with the new user turn
    // appended, in the caller's order. Nothing is reordered or deduplicated.
    let mut messages = history;
    messages.push(Message::user(message));

    match data.upstream.complete(&messages).await {
        Ok(response) => {
            info!("Chat request {}: {} chars returned", request_id, response.len());
            HttpResponse::Ok().json(ChatResponse {
                success: true,
                response,
                model: upstream::MODEL.to_string(),
            })
        }
        Err(e) => {
            error!("Chat request {} failed: {:#}", request_id, e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}
