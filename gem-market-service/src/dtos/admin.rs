use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSessionResponse {
    pub success: bool,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}
