use serde::{Deserialize, Serialize};

/// Identity of the signed-in user. The backend only hands us back a token,
/// so the email typed into the login form is what we remember.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct User {
    pub email: String,
}

/// Persisted session record (`{"user": {"email": ..}, "token": ..}`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionStatus {
    Anonymous,
    Authenticated,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Notebook {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The single body of text attached to a notebook.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Note {
    #[serde(default)]
    pub notebook_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub ai_summary: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ChatRole {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Difficulty sent to `/ai/quiz` as `level`.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum QuizLevel {
    Beginner,
    #[default]
    Medium,
    Hard,
}

/// Question style sent to `/ai/quiz` as `qtype`.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum QuestionType {
    #[default]
    Mcq,
    Tf,
    Theory,
    Mix,
}

impl QuestionType {
    pub fn label(self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::Tf => "True/False",
            QuestionType::Theory => "Theory",
            QuestionType::Mix => "Mix",
        }
    }
}
