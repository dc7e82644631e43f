use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Store-assigned question identity.
pub type Id = Uuid;

pub const GUEST_USER: &str = "guest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuestionOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    #[serde(default = "guest_user")]
    pub user_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn guest_user() -> String { GUEST_USER.to_string() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: Uuid,
    pub question_text: String,
    pub subject: String,
    pub topic: String,
    #[serde(default)]
    pub difficulty: String,
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub is_ruf: bool,
    pub created_at: DateTime<Utc>,
}

/// Inbound question document for create / upsert. Extra fields sent by clients
/// (ids, comments, timestamps) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewQuestion {
    pub question_text: String,
    pub subject: String,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Question {
    pub fn from_new(new: NewQuestion, is_ruf: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_text: new.question_text,
            subject: new.subject,
            topic: new.topic,
            difficulty: new.difficulty.unwrap_or_default(),
            options: new.options,
            explanation: new.explanation,
            comments: Vec::new(),
            is_ruf,
            created_at: now,
        }
    }

    /// Overwrite with an incoming payload for the same `question_text`.
    /// Optional fields left out of the payload keep their stored value;
    /// identity, creation time and comments are never touched.
    pub fn merge(&mut self, new: NewQuestion, is_ruf: bool) {
        self.subject = new.subject;
        self.topic = new.topic;
        if let Some(difficulty) = new.difficulty { self.difficulty = difficulty; }
        self.options = new.options;
        if new.explanation.is_some() { self.explanation = new.explanation; }
        self.is_ruf = is_ruf;
    }

    /// One comment per user: replace the text of an existing entry or append a
    /// new one. Returns true when a new comment was appended.
    pub fn upsert_comment(&mut self, user_id: &str, text: &str, now: DateTime<Utc>) -> bool {
        if let Some(existing) = self.comments.iter_mut().find(|c| c.user_id == user_id) {
            existing.text = text.to_string();
            existing.updated_at = now;
            return false;
        }
        self.comments.push(Comment {
            user_id: user_id.to_string(),
            text: text.to_string(),
            created_at: now,
            updated_at: now,
        });
        true
    }
}

/// Conjunctive equality filter for listing; `None` imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
}

impl QuestionFilter {
    pub fn matches(&self, q: &Question) -> bool {
        fn field(want: &Option<String>, have: &str) -> bool {
            want.as_deref().map_or(true, |w| w == have)
        }
        field(&self.subject, &q.subject)
            && field(&self.topic, &q.topic)
            && field(&self.difficulty, &q.difficulty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub username: String,
    pub total_score: i64,
    pub total_attempts: i64,
    #[serde(default)]
    pub weak_topics: Vec<String>,
}

impl User {
    /// Zero tally returned for users that never submitted an answer.
    pub fn empty(username: &str) -> Self {
        Self { username: username.to_string(), total_score: 0, total_attempts: 0, weak_topics: Vec::new() }
    }
}

/// Clients send user ids either as strings or bare numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserKey {
    Text(String),
    Number(i64),
}

pub fn de_user_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<UserKey>::deserialize(de)?.map(|k| match k {
        UserKey::Text(s) => s,
        UserKey::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question::from_new(
            NewQuestion {
                question_text: "2+2=?".into(),
                subject: "Math".into(),
                topic: "Arithmetic".into(),
                difficulty: None,
                options: vec![
                    QuestionOption { text: "3".into(), is_correct: false },
                    QuestionOption { text: "4".into(), is_correct: true },
                ],
                explanation: Some("basic addition".into()),
            },
            true,
            Utc::now(),
        )
    }

    #[test]
    fn second_comment_from_same_user_replaces_text() {
        let mut q = sample();
        let t0 = Utc::now();
        assert!(q.upsert_comment("u1", "first", t0));
        let t1 = t0 + chrono::Duration::seconds(5);
        assert!(!q.upsert_comment("u1", "second", t1));
        assert_eq!(q.comments.len(), 1);
        assert_eq!(q.comments[0].text, "second");
        assert_eq!(q.comments[0].created_at, t0);
        assert_eq!(q.comments[0].updated_at, t1);

        assert!(q.upsert_comment("u2", "other", t1));
        assert_eq!(q.comments.len(), 2);
        assert_eq!(q.comments[1].user_id, "u2");
    }

    #[test]
    fn merge_keeps_optional_fields_and_comments_when_omitted() {
        let mut q = sample();
        q.upsert_comment("u1", "hi", Utc::now());
        let id = q.id;
        q.merge(
            NewQuestion {
                question_text: "2+2=?".into(),
                subject: "Maths".into(),
                topic: "Arithmetic".into(),
                difficulty: Some("easy".into()),
                options: q.options.clone(),
                explanation: None,
            },
            false,
        );
        assert_eq!(q.id, id);
        assert_eq!(q.subject, "Maths");
        assert_eq!(q.difficulty, "easy");
        assert_eq!(q.explanation.as_deref(), Some("basic addition"));
        assert_eq!(q.comments.len(), 1);
        assert!(!q.is_ruf);
    }

    #[test]
    fn filter_is_conjunctive() {
        let q = sample();
        assert!(QuestionFilter::default().matches(&q));
        let f = QuestionFilter { subject: Some("Math".into()), topic: Some("Arithmetic".into()), difficulty: None };
        assert!(f.matches(&q));
        let f = QuestionFilter { subject: Some("Math".into()), topic: Some("Geometry".into()), difficulty: None };
        assert!(!f.matches(&q));
    }

    #[test]
    fn numeric_user_ids_become_strings() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default, deserialize_with = "de_user_id")]
            user_id: Option<String>,
        }
        let b: Body = serde_json::from_str(r#"{"user_id": 7}"#).unwrap();
        assert_eq!(b.user_id.as_deref(), Some("7"));
        let b: Body = serde_json::from_str(r#"{"user_id": "u1"}"#).unwrap();
        assert_eq!(b.user_id.as_deref(), Some("u1"));
        let b: Body = serde_json::from_str(r#"{}"#).unwrap();
        assert!(b.user_id.is_none());
    }
}
