use std::sync::Arc;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::models::*;
use crate::quiz::{self, QuestionPayload};
use crate::repo::Repo;

/// Request header carrying the `is_ruf` override for create/upsert.
pub const IS_RUF_HEADER: &str = "is_ruf";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .app_data(query_config())
            .service(
                web::resource("/questions")
                    .route(web::get().to(list_questions))
                    .route(web::post().to(create_questions)),
            )
            .service(web::resource("/questions/{id}/comment").route(web::put().to(upsert_comment)))
            .service(web::resource("/answers").route(web::post().to(submit_answer)))
            .service(web::resource("/user/{id}/stats").route(web::get().to(user_stats))),
    );
}

// malformed bodies / query strings surface as 400 with the usual JSON error body
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::Validation(err.to_string()).into())
}

#[derive(Clone)]
pub struct AppState { pub repo: Arc<dyn Repo> }

/// Ids that are not UUIDs cannot name a stored question.
fn parse_question_id(raw: &str) -> Result<Id, ApiError> {
    raw.trim().parse::<Id>().map_err(|_| ApiError::question_not_found())
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    /// 1..=100, defaults to 20
    pub limit: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> QuestionFilter {
        fn non_empty(v: &Option<String>) -> Option<String> {
            v.clone().filter(|s| !s.is_empty())
        }
        QuestionFilter {
            subject: non_empty(&self.subject),
            topic: non_empty(&self.topic),
            difficulty: non_empty(&self.difficulty),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/questions",
    tag = "questions",
    params(ListQuery),
    responses(
        (status = 200, description = "Matching questions, newest first", body = [Question]),
        (status = 500, description = "Store error")
    )
)]
pub async fn list_questions(data: web::Data<AppState>, query: web::Query<ListQuery>) -> Result<HttpResponse, ApiError> {
    let limit = quiz::clamp_limit(query.limit.as_deref());
    let questions = data.repo.list_questions(&query.filter(), limit).await?;
    Ok(HttpResponse::Ok().json(questions))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedQuestion {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpsertQuestionsResponse {
    pub success: bool,
    pub inserted_or_updated: usize,
    pub questions: Vec<Question>,
    pub rejected: Vec<RejectedQuestion>,
}

#[utoipa::path(
    post,
    path = "/api/questions",
    tag = "questions",
    request_body = NewQuestion,
    params(("is_ruf" = Option<String>, Header, description = "\"true\" or \"false\"; defaults to true")),
    responses(
        (status = 200, description = "Questions created or updated", body = UpsertQuestionsResponse),
        (status = 400, description = "Invalid question payload"),
        (status = 500, description = "Store error")
    )
)]
pub async fn create_questions(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    // a header that is present but not text is still "not true"
    let is_ruf = quiz::parse_is_ruf(req.headers().get(IS_RUF_HEADER).map(|v| v.to_str().unwrap_or("")));
    let (items, single) = match QuestionPayload::from_json(body.into_inner())? {
        QuestionPayload::Single(v) => (vec![v], true),
        QuestionPayload::Batch(v) => (v, false),
    };
    let total = items.len();

    let mut questions = Vec::with_capacity(total);
    let mut rejected = Vec::new();
    // sequential: skip invalid elements, stop at the first store failure
    for (index, item) in items.into_iter().enumerate() {
        let new = match quiz::decode_question(item) {
            Ok(new) => new,
            Err(e) if single => return Err(e.into()),
            Err(e) => {
                warn!(index, error = %e, "rejected question in batch");
                rejected.push(RejectedQuestion { index, error: e.0 });
                continue;
            }
        };
        questions.push(data.repo.upsert_question(new, is_ruf).await?);
    }

    if total > 0 && questions.is_empty() {
        let first = rejected.first().map(|r| r.error.clone()).unwrap_or_default();
        return Err(ApiError::Validation(format!("no valid questions in batch: {first}")));
    }
    info!(count = questions.len(), rejected = rejected.len(), is_ruf, "questions upserted");
    Ok(HttpResponse::Ok().json(UpsertQuestionsResponse {
        success: true,
        inserted_or_updated: questions.len(),
        questions,
        rejected,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub comment: String,
    #[serde(default, deserialize_with = "de_user_id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

#[utoipa::path(
    put,
    path = "/api/questions/{id}/comment",
    tag = "questions",
    request_body = CommentRequest,
    params(("id" = String, Path, description = "Question id")),
    responses(
        (status = 200, description = "Comment added or replaced", body = AckResponse),
        (status = 400, description = "Empty comment"),
        (status = 404, description = "Question not found"),
        (status = 500, description = "Store error")
    )
)]
pub async fn upsert_comment(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CommentRequest>,
) -> Result<HttpResponse, ApiError> {
    let CommentRequest { comment, user_id } = body.into_inner();
    quiz::validate_comment(&comment)?;
    let id = parse_question_id(&path)?;
    let user_id = user_id.unwrap_or_else(|| GUEST_USER.to_string());
    let question = data.repo.upsert_comment(id, &user_id, &comment).await?;
    info!(question_id = %question.id, user_id = %user_id, comments = question.comments.len(), "comment saved");
    Ok(HttpResponse::Ok().json(AckResponse {
        success: true,
        message: "Comment saved successfully!".into(),
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub question_id: String,
    pub selected_option_index: i64,
    #[serde(default, deserialize_with = "de_user_id")]
    pub user_id: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/answers",
    tag = "answers",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Graded answer", body = crate::quiz::Grade),
        (status = 400, description = "Option index out of range or no correct option"),
        (status = 404, description = "Question not found"),
        (status = 500, description = "Store error")
    )
)]
pub async fn submit_answer(data: web::Data<AppState>, body: web::Json<AnswerRequest>) -> Result<HttpResponse, ApiError> {
    let AnswerRequest { question_id, selected_option_index, user_id } = body.into_inner();
    let id = parse_question_id(&question_id)?;
    let question = data.repo.get_question(id).await?;
    // grade first: a rejected submission must not touch the tally
    let grade = quiz::grade(&question, selected_option_index)?;
    if let Some(user_id) = user_id.as_deref().filter(|u| !u.trim().is_empty()) {
        data.repo.record_attempt(user_id, grade.is_correct).await?;
    }
    Ok(HttpResponse::Ok().json(grade))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}/stats",
    tag = "answers",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Score tally (zeros for unknown users)", body = User),
        (status = 500, description = "Store error")
    )
)]
pub async fn user_stats(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    let user = data.repo.get_user(&username).await?.unwrap_or_else(|| User::empty(&username));
    Ok(HttpResponse::Ok().json(user))
}
