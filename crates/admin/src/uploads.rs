//! Reading multipart admin forms.
//!
//! Product and category forms carry image files next to ordinary fields, so
//! they are posted as `multipart/form-data`. The whole body is read into
//! memory; [`MAX_UPLOAD_BYTES`] bounds it.

use axum::extract::Multipart;

use crate::backend::Upload;
use crate::error::AppError;

/// Body limit for routes that accept image uploads.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Image types the backend accepts.
const IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Text fields and files of one multipart form, in submission order.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, Upload)>,
}

impl MultipartForm {
    /// Read every part of the request.
    ///
    /// File inputs left empty by the browser (no filename, no bytes) are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a malformed body or a file that is
    /// not an image.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(ToString::to_string);
            let content_type = field.content_type().map(ToString::to_string);

            match filename {
                Some(filename) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if filename.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    if !content_type.as_deref().is_some_and(is_image) {
                        return Err(AppError::BadRequest(format!(
                            "{filename} är inte en bild (JPEG, PNG, WebP eller GIF)."
                        )));
                    }
                    form.files.push((
                        name,
                        Upload {
                            filename,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    ));
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.fields.push((name, value));
                }
            }
        }

        Ok(form)
    }

    /// First value of a text field, trimmed, `None` when blank.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Every value of a repeated field, untrimmed, in order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether a checkbox was ticked.
    #[must_use]
    pub fn checked(&self, name: &str) -> bool {
        self.text(name).is_some()
    }

    /// Take the files posted under `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<Upload> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = kept;
        taken.into_iter().map(|(_, upload)| upload).collect()
    }

    #[cfg(test)]
    pub(crate) fn from_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            files: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn push_file(&mut self, name: &str, upload: Upload) {
        self.files.push((name.to_string(), upload));
    }
}

fn is_image(content_type: &str) -> bool {
    IMAGE_TYPES
        .iter()
        .any(|allowed| content_type.eq_ignore_ascii_case(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_trimmed_and_blank_is_none() {
        let form = MultipartForm::from_fields(&[("name", "  Gi  "), ("color", "   ")]);
        assert_eq!(form.text("name"), Some("Gi"));
        assert_eq!(form.text("color"), None);
        assert_eq!(form.text("missing"), None);
    }

    #[test]
    fn test_repeated_fields_keep_order() {
        let form = MultipartForm::from_fields(&[
            ("size_label", "150"),
            ("name", "Gi"),
            ("size_label", "160"),
        ]);
        assert_eq!(form.all("size_label").collect::<Vec<_>>(), ["150", "160"]);
    }

    #[test]
    fn test_image_types() {
        assert!(is_image("image/JPEG"));
        assert!(!is_image("application/pdf"));
    }
}
