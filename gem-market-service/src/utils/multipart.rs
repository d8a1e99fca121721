use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use service_core::error::AppError;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Lowercased extension taken from the client file name, falling back to the MIME type.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| {
                match self.content_type.as_str() {
                    "image/jpeg" => "jpg",
                    "image/png" => "png",
                    "image/gif" => "gif",
                    "image/webp" => "webp",
                    "application/pdf" => "pdf",
                    _ => "bin",
                }
                .to_string()
            })
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf"
    }
}

fn read_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(anyhow::anyhow!("{}: {}", context, e.body_text()))
    } else {
        AppError::bad_request(format!("{}: {}", context, e.body_text()))
    }
}

/// A fully buffered `multipart/form-data` body: text fields by name plus file parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Read every part. Any single file larger than `max_file_bytes` fails with 413.
    pub async fn collect(mut multipart: Multipart, max_file_bytes: usize) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| read_error("Failed to read multipart field", e))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| read_error("Failed to read file bytes", e))?
                        .to_vec();

                    if data.len() > max_file_bytes {
                        return Err(AppError::PayloadTooLarge(anyhow::anyhow!(
                            "File '{}' exceeds the {} byte limit",
                            file_name,
                            max_file_bytes
                        )));
                    }

                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        data,
                    });
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| read_error("Failed to read form field", e))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text value; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required_text(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::bad_request(format!("{} is required", name)))
    }

    /// A required number that must be finite and greater than zero.
    pub fn required_positive(&self, name: &str) -> Result<f64, AppError> {
        let raw = self.required_text(name)?;
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
            _ => Err(AppError::bad_request(format!(
                "{} must be a positive number",
                name
            ))),
        }
    }

    /// Remove and return the file parts sent under `field`.
    pub fn take_files(&mut self, field: &str) -> Vec<UploadedFile> {
        let (taken, kept) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = kept;
        taken
    }

    #[cfg(test)]
    fn with_fields(pairs: &[(&str, &str)]) -> Self {
        MultipartForm {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(field: &str, name: &str, content_type: &str) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn blank_text_is_missing() {
        let form = MultipartForm::with_fields(&[("name", "  "), ("bank", " BOC ")]);
        assert!(form.text("name").is_none());
        assert_eq!(form.text("bank").as_deref(), Some("BOC"));
        assert!(matches!(
            form.required_text("name"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn numbers_must_be_positive() {
        let form = MultipartForm::with_fields(&[("a", "12.5"), ("b", "0"), ("c", "abc"), ("d", "-3")]);
        assert_eq!(form.required_positive("a").unwrap(), 12.5);
        assert!(form.required_positive("b").is_err());
        assert!(form.required_positive("c").is_err());
        assert!(form.required_positive("d").is_err());
        assert!(form.required_positive("missing").is_err());
    }

    #[test]
    fn extension_falls_back_to_mime_type() {
        assert_eq!(file("slip", "Slip.PNG", "image/png").extension(), "png");
        assert_eq!(file("slip", "blob", "image/jpeg").extension(), "jpg");
        assert_eq!(file("slip", "weird.p?g", "application/pdf").extension(), "pdf");
        assert_eq!(file("slip", "noext", "text/plain").extension(), "bin");
    }

    #[test]
    fn take_files_only_removes_named_field() {
        let mut form = MultipartForm::default();
        form.files.push(file("images", "a.png", "image/png"));
        form.files.push(file("slip", "b.pdf", "application/pdf"));
        form.files.push(file("images", "c.jpg", "image/jpeg"));

        let images = form.take_files("images");
        assert_eq!(images.len(), 2);
        assert_eq!(form.take_files("slip").len(), 1);
        assert!(form.take_files("images").is_empty());
    }
}
