use tracing::info;

use crate::models::{NewQuestion, QuestionOption};
use crate::repo::{Repo, RepoResult};

fn question(text: &str, subject: &str, topic: &str, options: &[(&str, bool)], explanation: Option<&str>) -> NewQuestion {
    NewQuestion {
        question_text: text.into(),
        subject: subject.into(),
        topic: topic.into(),
        difficulty: None,
        options: options.iter().map(|(t, c)| QuestionOption { text: t.to_string(), is_correct: *c }).collect(),
        explanation: explanation.map(str::to_string),
    }
}

pub fn sample_questions() -> Vec<NewQuestion> {
    vec![
        question(
            "jQuery kis language ki library hai?",
            "Web Development",
            "jQuery",
            &[("JavaScript", true), ("Python", false), ("PHP", false), ("C++", false)],
            Some("jQuery JavaScript ki lightweight library hai"),
        ),
        question(
            "Rajasthan ka capital kya hai?",
            "Rajasthan GK",
            "Geography",
            &[("Delhi", false), ("Jaipur", true), ("Jodhpur", false), ("Udaipur", false)],
            None,
        ),
        question(
            "C++ me class ka keyword kya hai?",
            "Programming",
            "C++",
            &[("struct", false), ("class", true), ("object", false), ("function", false)],
            None,
        ),
    ]
}

/// Insert the sample questions when the store holds none. Returns how many
/// were written.
pub async fn seed_if_empty(repo: &dyn Repo) -> RepoResult<usize> {
    if repo.count_questions().await? > 0 {
        return Ok(0);
    }
    let samples = sample_questions();
    let n = samples.len();
    for q in samples {
        repo.upsert_question(q, true).await?;
    }
    info!(count = n, "seeded sample questions");
    Ok(n)
}
