//! Request descriptors and bodies
//!
//! A [`RequestDescriptor`] is everything the client needs to send, and to
//! send again after a refresh: verb, relative path, optional body and
//! caller header overrides. Bodies own their bytes so the retried request is
//! identical to the first one.

use std::collections::BTreeMap;
use std::path::Path;

use mani_domain::constants::{MAX_MEDIA_FILES, MEDIA_FIELD_NAME};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;

use super::errors::ApiError;

/// Verb, path, body and header overrides of one logical call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<RequestBody>,
    headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// Descriptor for `path`, relative to the client's base URL
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, headers: BTreeMap::new() }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Serialize `body` as the JSON payload
    ///
    /// # Errors
    /// Returns `ApiError::InvalidRequest` if `body` cannot be serialized
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn multipart(self, payload: MultipartPayload) -> Self {
        self.body(RequestBody::Multipart(payload))
    }

    /// Add a header override; a later value for the same name wins
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    #[must_use]
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers.into_iter().fold(self, |request, (name, value)| request.header(name, value))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body_ref(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn header_overrides(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured payload, sent as `application/json`
    Json(serde_json::Value),
    /// Form parts; the transport picks the content type and boundary
    Multipart(MultipartPayload),
    /// Opaque bytes with an optional explicit content type
    Bytes { data: Vec<u8>, content_type: Option<String> },
}

impl RequestBody {
    pub fn bytes(data: impl Into<Vec<u8>>, content_type: Option<String>) -> Self {
        Self::Bytes { data: data.into(), content_type }
    }

    /// Content type the client should declare, if any
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Json(_) => Some("application/json"),
            Self::Bytes { content_type, .. } => content_type.as_deref(),
            Self::Multipart(_) => None,
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// One form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl MultipartPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: value.into().into_bytes(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data,
        }
    }

    fn to_part(&self) -> Result<Part, reqwest::Error> {
        let mut part = Part::bytes(self.data.clone());
        if let Some(file_name) = &self.file_name {
            part = part.file_name(file_name.clone());
        }
        if let Some(content_type) = &self.content_type {
            part = part.mime_str(content_type)?;
        }
        Ok(part)
    }
}

/// Re-buildable multipart form
///
/// `reqwest::multipart::Form` is consumed on send, so the parts are kept
/// here and a fresh form is built for every attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    parts: Vec<MultipartPart>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn part(mut self, part: MultipartPart) -> Self {
        self.parts.push(part);
        self
    }

    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(MultipartPart::text(name, value))
    }

    /// Media upload form: one `media` part per file
    ///
    /// # Errors
    /// Returns `ApiError::InvalidRequest` if no file is given, more than
    /// five are given, or a file is neither `video/*` nor `image/*`
    pub fn media_files<I>(files: I) -> Result<Self, ApiError>
    where
        I: IntoIterator<Item = MediaFile>,
    {
        let files: Vec<MediaFile> = files.into_iter().collect();

        if files.is_empty() {
            return Err(ApiError::InvalidRequest("No media files selected".into()));
        }
        if files.len() > MAX_MEDIA_FILES {
            return Err(ApiError::InvalidRequest(format!(
                "At most {} media files can be uploaded at once, got {}",
                MAX_MEDIA_FILES,
                files.len()
            )));
        }

        files.into_iter().try_fold(Self::new(), |payload, file| {
            if !file.is_media() {
                return Err(ApiError::InvalidRequest(format!(
                    "{} has unsupported type {}; only video and image files are accepted",
                    file.file_name, file.content_type
                )));
            }
            Ok(payload.part(MultipartPart::file(
                MEDIA_FIELD_NAME,
                file.file_name,
                file.content_type,
                file.data,
            )))
        })
    }

    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Build a fresh reqwest form from the stored parts
    ///
    /// # Errors
    /// Returns error if a part carries an unparsable content type
    pub fn to_form(&self) -> Result<Form, reqwest::Error> {
        self.parts
            .iter()
            .try_fold(Form::new(), |form, part| Ok(form.part(part.name.clone(), part.to_part()?)))
    }
}

/// File selected for a media upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), data }
    }

    /// Read a file from disk, guessing its content type from the extension
    ///
    /// # Errors
    /// Returns `ApiError::InvalidRequest` if the file cannot be read
    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            ApiError::InvalidRequest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = content_type_for(path).to_string();

        Ok(Self { file_name, content_type, data })
    }

    pub fn is_media(&self) -> bool {
        self.content_type.starts_with("video/") || self.content_type.starts_with("image/")
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension =
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).unwrap_or_default();

    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::Builder;

    use super::*;

    fn video(name: &str) -> MediaFile {
        MediaFile::new(name, "video/mp4", vec![0, 1, 2])
    }

    #[test]
    fn header_overrides_replace_case_insensitively() {
        let request = RequestDescriptor::get("/api/events")
            .header("X-Lang", "en")
            .header("x-lang", "am");

        assert_eq!(request.header_overrides().len(), 1);
        assert_eq!(request.header_overrides().get("x-lang").map(String::as_str), Some("am"));
    }

    #[test]
    fn json_body_declares_content_type() {
        let request = RequestDescriptor::post("/api/events")
            .json(&serde_json::json!({ "name": "Choir practice" }))
            .unwrap();

        assert_eq!(request.body_ref().and_then(RequestBody::content_type), Some("application/json"));
    }

    #[test]
    fn multipart_body_declares_no_content_type() {
        let body = RequestBody::Multipart(MultipartPayload::new().text("caption", "Easter"));

        assert!(body.is_multipart());
        assert_eq!(body.content_type(), None);
    }

    #[test]
    fn media_files_builds_one_part_per_file() {
        let payload = MultipartPayload::media_files(vec![
            video("a.mp4"),
            MediaFile::new("b.png", "image/png", vec![9]),
        ])
        .unwrap();

        assert_eq!(payload.len(), 2);
        assert!(payload.parts().iter().all(|part| part.name == "media"));
        assert_eq!(payload.parts()[1].file_name.as_deref(), Some("b.png"));
    }

    #[test]
    fn media_files_rejects_non_media() {
        let result = MultipartPayload::media_files(vec![MediaFile::new(
            "notes.pdf",
            "application/pdf",
            vec![],
        )]);

        assert!(matches!(result, Err(ApiError::InvalidRequest(msg)) if msg.contains("notes.pdf")));
    }

    #[test]
    fn media_files_enforces_limit() {
        let files = (0..=MAX_MEDIA_FILES).map(|i| video(&format!("{i}.mp4")));

        assert!(matches!(
            MultipartPayload::media_files(files),
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(MultipartPayload::media_files(Vec::new()).is_err());
    }

    #[test]
    fn to_form_can_be_built_repeatedly() {
        let payload = MultipartPayload::media_files(vec![video("a.mp4")]).unwrap();

        assert!(payload.to_form().is_ok());
        assert!(payload.to_form().is_ok());
    }

    #[tokio::test]
    async fn media_file_from_path_guesses_type() {
        let mut file = Builder::new().suffix(".JPG").tempfile().unwrap();
        file.write_all(b"jpeg-bytes").unwrap();

        let media = MediaFile::from_path(file.path()).await.unwrap();

        assert_eq!(media.content_type, "image/jpeg");
        assert_eq!(media.data, b"jpeg-bytes");
        assert!(media.is_media());
    }

    #[tokio::test]
    async fn media_file_from_missing_path_fails() {
        let result = MediaFile::from_path(Path::new("/nonexistent/clip.mp4")).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
