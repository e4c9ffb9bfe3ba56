use crate::models::{
    Counts, DashboardKind, DashboardView, NewQuestion, Question, QuestionCard, StatusGroup, UpdateStatus,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::open_session,
        crate::routes::get_view,
        crate::routes::refresh,
        crate::routes::submit_question,
        crate::routes::vote_question,
        crate::routes::set_status,
        crate::routes::reset_all,
    ),
    components(schemas(
        Question, NewQuestion, UpdateStatus, QuestionCard, Counts, StatusGroup,
        DashboardView, DashboardKind,
        crate::routes::OpenSessionRequest, crate::routes::OpenSessionResponse,
        crate::routes::ResetResponse
    )),
    tags(
        (name = "sessions", description = "Submitter and moderator dashboards"),
    )
)]
pub struct ApiDoc;
