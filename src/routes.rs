use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::*;
use crate::session::{SessionRegistry, SharedSession};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(web::resource("/sessions").route(web::post().to(open_session)))
            .service(
                web::resource("/sessions/{sid}")
                    .route(web::get().to(get_view))
                    .route(web::delete().to(close_session)),
            )
            .service(web::resource("/sessions/{sid}/refresh").route(web::post().to(refresh)))
            .service(web::resource("/sessions/{sid}/questions").route(web::post().to(submit_question)))
            .service(
                web::resource("/sessions/{sid}/questions/{id}/vote")
                    .route(web::post().to(vote_question)),
            )
            .service(
                web::resource("/sessions/{sid}/questions/{id}/status")
                    .route(web::put().to(set_status)),
            )
            .service(web::resource("/sessions/{sid}/reset").route(web::post().to(reset_all))),
    );
    cfg.route("/health", web::get().to(health));
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    fn session(&self, sid: &Uuid) -> Result<SharedSession, ApiError> {
        self.sessions.get(sid).ok_or(ApiError::NotFound)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    pub kind: DashboardKind,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OpenSessionResponse {
    pub session_id: Uuid,
    pub view: DashboardView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetResponse {
    pub reset: usize,
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 201, description = "Dashboard session opened", body = OpenSessionResponse)
    )
)]
pub async fn open_session(
    data: web::Data<AppState>,
    payload: web::Json<OpenSessionRequest>,
) -> Result<HttpResponse, ApiError> {
    let (session_id, session) = data.sessions.open(payload.kind).await;
    let view = session.lock().await.view();
    Ok(HttpResponse::Created().json(OpenSessionResponse { session_id, view }))
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sid}",
    params(("sid" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Current dashboard view", body = DashboardView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_view(data: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let session = data.session(&path.into_inner())?;
    let mut s = session.lock().await;
    s.refresh_if_stale().await;
    Ok(HttpResponse::Ok().json(s.view()))
}

pub async fn close_session(data: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    if !data.sessions.close(&path.into_inner()) {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sid}/refresh",
    params(("sid" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Reloaded dashboard view", body = DashboardView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn refresh(data: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let session = data.session(&path.into_inner())?;
    let mut s = session.lock().await;
    s.refresh().await;
    Ok(HttpResponse::Ok().json(s.view()))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sid}/questions",
    request_body = NewQuestion,
    params(("sid" = Uuid, Path, description = "Submitter session id")),
    responses(
        (status = 201, description = "Question submitted", body = Question),
        (status = 400, description = "Empty question text or no id left"),
        (status = 403, description = "Not a submitter dashboard"),
        (status = 502, description = "Store write failed")
    )
)]
pub async fn submit_question(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: web::Json<NewQuestion>,
) -> Result<HttpResponse, ApiError> {
    let session = data.session(&path.into_inner())?;
    let question = session.lock().await.submit(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(question))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sid}/questions/{id}/vote",
    params(
        ("sid" = Uuid, Path, description = "Submitter session id"),
        ("id" = i64, Path, description = "Question id")
    ),
    responses(
        (status = 200, description = "Vote recorded", body = Question),
        (status = 400, description = "Vote count at its limit"),
        (status = 404, description = "Unknown session or question"),
        (status = 502, description = "Store write failed")
    )
)]
pub async fn vote_question(
    data: web::Data<AppState>,
    path: web::Path<(Uuid, Id)>,
) -> Result<HttpResponse, ApiError> {
    let (sid, id) = path.into_inner();
    let session = data.session(&sid)?;
    let question = session.lock().await.vote(id).await?;
    Ok(HttpResponse::Ok().json(question))
}

#[utoipa::path(
    put,
    path = "/api/v1/sessions/{sid}/questions/{id}/status",
    request_body = UpdateStatus,
    params(
        ("sid" = Uuid, Path, description = "Moderator session id"),
        ("id" = i64, Path, description = "Question id")
    ),
    responses(
        (status = 200, description = "Status changed", body = Question),
        (status = 400, description = "Status is not pending, asked or deleted"),
        (status = 403, description = "Not a moderator dashboard"),
        (status = 404, description = "Unknown session or question"),
        (status = 409, description = "Table changed since last read"),
        (status = 502, description = "Store write failed")
    )
)]
pub async fn set_status(
    data: web::Data<AppState>,
    path: web::Path<(Uuid, Id)>,
    payload: web::Json<UpdateStatus>,
) -> Result<HttpResponse, ApiError> {
    let (sid, id) = path.into_inner();
    let session = data.session(&sid)?;
    let question = session.lock().await.set_status(id, payload.into_inner().status).await?;
    Ok(HttpResponse::Ok().json(question))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sid}/reset",
    params(("sid" = Uuid, Path, description = "Moderator session id")),
    responses(
        (status = 200, description = "Asked questions reset to pending", body = ResetResponse),
        (status = 403, description = "Not a moderator dashboard"),
        (status = 502, description = "Store write failed")
    )
)]
pub async fn reset_all(data: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let session = data.session(&path.into_inner())?;
    let reset = session.lock().await.reset_all_to_pending().await?;
    Ok(HttpResponse::Ok().json(ResetResponse { reset }))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}
