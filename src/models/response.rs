use serde::Serialize;

/// Envelope shared by every JSON endpoint: `{ ok, data?, error? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }

    pub fn failure(error: Option<String>) -> Self {
        Self { ok: false, data: None, error }
    }
}

impl ApiResponse<()> {
    pub fn done() -> Self {
        Self { ok: true, data: None, error: None }
    }
}
