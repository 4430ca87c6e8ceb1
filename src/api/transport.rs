use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;

/// A file picked by the user for `/upload`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct UploadFile {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart {
        file: UploadFile,
        fields: Vec<(String, String)>,
    },
}

/// Transport-agnostic request. `path` is relative to the API base URL.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers: vec![],
            body: RequestBody::Empty,
        }
    }

    pub fn post_json<B: Serialize>(
        path: impl Into<String>,
        body: &B,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            headers: vec![],
            body: RequestBody::Json(serde_json::to_value(body)?),
        })
    }

    pub fn post_multipart(
        path: impl Into<String>,
        file: UploadFile,
        fields: Vec<(String, String)>,
    ) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            headers: vec![],
            body: RequestBody::Multipart { file, fields },
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }
}

#[cfg(test)]
impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match &self.body {
            RequestBody::Json(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// One request, one response. No retries or timeouts at this layer.
#[async_trait(?Send)]
pub(crate) trait Transport: Send + Sync {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Browser `fetch` (wasm) / hyper (native) via reqwest.
#[derive(Clone)]
pub(crate) struct ReqwestTransport {
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn multipart_form(
        file: UploadFile,
        fields: Vec<(String, String)>,
    ) -> Result<reqwest::multipart::Form, TransportError> {
        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime) = file.mime.filter(|m| !m.trim().is_empty()) {
            part = part
                .mime_str(&mime)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        }

        let mut form = reqwest::multipart::Form::new().part("file", part);
        for (k, v) in fields {
            form = form.text(k, v);
        }
        Ok(form)
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            path,
            headers,
            body,
        } = req;

        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        for (k, v) in &headers {
            builder = builder.header(k.as_str(), v.as_str());
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(v) => builder.json(&v),
            RequestBody::Multipart { file, fields } => {
                builder.multipart(Self::multipart_form(file, fields)?)
            }
        };

        let res = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
