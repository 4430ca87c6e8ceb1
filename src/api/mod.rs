pub(crate) mod transport;

pub(crate) use transport::{
    HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError, UploadFile,
};

use crate::models::{ChatMessage, Notebook, Note, QuestionType, QuizLevel};
use crate::state::SessionStore;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    /// Backend-provided `detail`, when the error body carried one.
    pub detail: Option<String>,
    pub message: String,
}

impl ApiError {
    pub(crate) fn network(e: TransportError) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            status: None,
            detail: None,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            status: None,
            detail: None,
            message: e.to_string(),
        }
    }

    pub(crate) fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            status: Some(401),
            detail: None,
            message: "Unauthorized".to_string(),
        }
    }

    pub(crate) fn http(status: u16, body: &str, ctx: &str) -> Self {
        let detail = detail_from_body(body);
        let message = match &detail {
            Some(d) => d.clone(),
            None => format!("{ctx} ({status})"),
        };
        Self {
            kind: ApiErrorKind::Http,
            status: Some(status),
            detail,
            message,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// FastAPI-style error bodies: `{"detail": "..."}`. Validation errors carry a
/// list instead of a string; those are not shown to the user.
fn detail_from_body(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("detail")
        .and_then(|d| d.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginResponse {
    pub access_token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateNotebookRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SaveNoteRequest {
    pub notebook_id: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UploadResponse {
    pub extracted_text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ChatRequest {
    pub notebook_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ChatResponse {
    pub answer: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SummaryRequest {
    pub notebook_id: Option<String>,
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SummaryResponse {
    pub summary: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct QuizRequest {
    pub notebook_id: Option<String>,
    pub text: String,
    pub level: QuizLevel,
    pub qtype: QuestionType,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct QuizResponse {
    pub quiz_raw: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct StudyPlanRequest {
    pub notebook_id: Option<String>,
    pub text: String,
    /// `YYYY-MM-DD`.
    pub exam_date: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct StudyPlanResponse {
    pub plan_raw: String,
}

/// `Bearer <token>`.
pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Request half of the gateway middleware: attach the session's
/// `Authorization` value. Without one the request goes out unchanged.
pub(crate) fn authorize(req: HttpRequest, auth_header: Option<String>) -> HttpRequest {
    match auth_header {
        Some(value) => req.with_header("Authorization", value),
        None => req,
    }
}

/// Response half of the gateway middleware. A 401 tears the session down
/// (idempotently) and becomes [`ApiErrorKind::Unauthorized`]; other non-2xx
/// statuses become [`ApiErrorKind::Http`].
pub(crate) fn screen_response(res: HttpResponse, session: &SessionStore) -> ApiResult<HttpResponse> {
    if res.status == 401 {
        session.expire();
        return Err(ApiError::unauthorized());
    }
    if !res.is_success() {
        return Err(ApiError::http(res.status, &res.body, "Request failed"));
    }
    Ok(res)
}

/// An empty body decodes like `null`.
fn decode<T: DeserializeOwned>(res: &HttpResponse) -> ApiResult<T> {
    let body = if res.body.trim().is_empty() {
        "null"
    } else {
        res.body.as_str()
    };
    serde_json::from_str(body).map_err(ApiError::parse)
}

async fn request_public<T: DeserializeOwned>(
    transport: &dyn Transport,
    req: HttpRequest,
) -> ApiResult<T> {
    let res = transport.send(req).await.map_err(ApiError::network)?;
    if !res.is_success() {
        return Err(ApiError::http(res.status, &res.body, "Request failed"));
    }
    decode(&res)
}

/// Credential endpoints bypass the gateway: no token is attached and a 401
/// (bad credentials) must not tear down an unrelated session.
pub(crate) async fn login_request(
    transport: &dyn Transport,
    email: &str,
    password: &str,
) -> ApiResult<LoginResponse> {
    let req = HttpRequest::post_json(
        "/auth/login",
        &CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        },
    )
    .map_err(ApiError::parse)?;
    request_public(transport, req).await
}

pub(crate) async fn signup_request(
    transport: &dyn Transport,
    email: &str,
    password: &str,
) -> ApiResult<()> {
    let req = HttpRequest::post_json(
        "/auth/signup",
        &CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        },
    )
    .map_err(ApiError::parse)?;
    request_public::<IgnoredAny>(transport, req).await?;
    Ok(())
}

/// Authorized Request Gateway: every call goes through [`authorize`] and
/// [`screen_response`].
#[derive(Clone)]
pub(crate) struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self { transport, session }
    }

    async fn request_api<T: DeserializeOwned>(&self, req: HttpRequest) -> ApiResult<T> {
        // The token is read once here; it never changes under an in-flight request.
        let req = authorize(req, self.session.auth_header());
        let path = req.path.clone();

        let res = match self.transport.send(req).await {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!(%path, error = %e, "request failed to reach backend");
                return Err(ApiError::network(e));
            }
        };

        let res = screen_response(res, &self.session)?;
        decode(&res)
    }

    fn post<B: Serialize>(path: &str, body: &B) -> ApiResult<HttpRequest> {
        HttpRequest::post_json(path, body).map_err(ApiError::parse)
    }

    pub async fn list_notebooks(&self) -> ApiResult<Vec<Notebook>> {
        self.request_api(HttpRequest::get("/notebooks/list")).await
    }

    pub async fn create_notebook(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> ApiResult<Notebook> {
        let req = Self::post(
            "/notebooks/create",
            &CreateNotebookRequest {
                title: title.to_string(),
                description: description.map(|d| d.to_string()),
            },
        )?;
        self.request_api(req).await
    }

    /// `None` when the notebook has no note yet (backend answers `null`).
    pub async fn get_note(&self, notebook_id: &str) -> ApiResult<Option<Note>> {
        let path = format!("/notebooks/notes/{}", urlencoding::encode(notebook_id));
        self.request_api(HttpRequest::get(path)).await
    }

    pub async fn save_note(&self, notebook_id: &str, content: &str) -> ApiResult<()> {
        let req = Self::post(
            "/notebooks/notes",
            &SaveNoteRequest {
                notebook_id: notebook_id.to_string(),
                content: content.to_string(),
            },
        )?;
        self.request_api::<IgnoredAny>(req).await?;
        Ok(())
    }

    pub async fn upload(&self, notebook_id: &str, file: UploadFile) -> ApiResult<String> {
        let req = HttpRequest::post_multipart(
            "/upload",
            file,
            vec![("notebook_id".to_string(), notebook_id.to_string())],
        );
        let res: UploadResponse = self.request_api(req).await?;
        Ok(res.extracted_text)
    }

    pub async fn ai_chat(
        &self,
        notebook_id: Option<String>,
        messages: Vec<ChatMessage>,
    ) -> ApiResult<String> {
        let req = Self::post(
            "/ai/chat",
            &ChatRequest {
                notebook_id,
                messages,
            },
        )?;
        let res: ChatResponse = self.request_api(req).await?;
        Ok(res.answer)
    }

    pub async fn ai_summary(&self, notebook_id: Option<String>, text: String) -> ApiResult<String> {
        let req = Self::post("/ai/summary", &SummaryRequest { notebook_id, text })?;
        let res: SummaryResponse = self.request_api(req).await?;
        Ok(res.summary)
    }

    pub async fn ai_quiz(
        &self,
        notebook_id: Option<String>,
        text: String,
        level: QuizLevel,
        qtype: QuestionType,
    ) -> ApiResult<String> {
        let req = Self::post(
            "/ai/quiz",
            &QuizRequest {
                notebook_id,
                text,
                level,
                qtype,
            },
        )?;
        let res: QuizResponse = self.request_api(req).await?;
        Ok(res.quiz_raw)
    }

    pub async fn ai_study_plan(
        &self,
        notebook_id: Option<String>,
        text: String,
        exam_date: Option<chrono::NaiveDate>,
    ) -> ApiResult<String> {
        let req = Self::post(
            "/ai/study-plan",
            &StudyPlanRequest {
                notebook_id,
                text,
                exam_date: exam_date.map(crate::util::format_exam_date),
            },
        )?;
        let res: StudyPlanResponse = self.request_api(req).await?;
        Ok(res.plan_raw)
    }
}
