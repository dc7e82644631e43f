use crate::models::{Comment, NewQuestion, Question, QuestionOption, User};
use crate::quiz::Grade;
use crate::routes::{AckResponse, AnswerRequest, CommentRequest, RejectedQuestion, UpsertQuestionsResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_questions,
        crate::routes::create_questions,
        crate::routes::upsert_comment,
        crate::routes::submit_answer,
        crate::routes::user_stats,
    ),
    components(schemas(
        Question, QuestionOption, Comment, NewQuestion, User, Grade,
        AnswerRequest, CommentRequest, AckResponse, RejectedQuestion, UpsertQuestionsResponse
    )),
    tags(
        (name = "questions", description = "Question listing, upsert and comments"),
        (name = "answers", description = "Answer grading and score tallies"),
    )
)]
pub struct ApiDoc;
