//! Multipart form reading
//!
//! Files are buffered in memory up to a per-file limit; an oversized file is
//! kept as a read failure so batch requests can still process the others.
//! The whole body and the number of files are capped as well; crossing either
//! cap fails the request.

use crate::config::ProcessingConfig;
use crate::error::{AppError, Result};
use crate::models::TransformParams;
use crate::services::BatchItem;
use actix_multipart::Multipart;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::collections::HashMap;
use tracing::debug;

/// Limit for a single text field
const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;

#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Result<Bytes>,
}

impl UploadedFile {
    pub fn into_batch_item(self) -> BatchItem {
        match self.content {
            Ok(bytes) => BatchItem::new(self.filename, bytes),
            Err(e) => BatchItem::unreadable(self.filename, e.to_string()),
        }
    }
}

#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: Vec<(String, UploadedFile)>,
}

impl UploadForm {
    pub async fn read(mut payload: Multipart, limits: &ProcessingConfig) -> Result<Self> {
        let max_file_bytes = limits.max_upload_bytes;
        let mut form = UploadForm::default();
        let mut received = 0usize;

        while let Some(item) = payload.next().await {
            let mut field =
                item.map_err(|e| AppError::BadRequest(format!("Invalid multipart form: {e}")))?;

            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);

            if filename.is_some() && form.files.len() >= limits.max_files {
                return Err(AppError::PayloadTooLarge(format!(
                    "Request carries more than {} files",
                    limits.max_files
                )));
            }

            let limit = if filename.is_some() {
                max_file_bytes
            } else {
                MAX_TEXT_FIELD_BYTES
            };

            let mut buf = BytesMut::new();
            let mut oversized = false;
            while let Some(chunk) = field.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::BadRequest(format!("Error reading form field {name}: {e}")))?;
                received += chunk.len();
                if received > limits.max_request_bytes {
                    return Err(AppError::PayloadTooLarge(format!(
                        "Request exceeds the {} byte limit",
                        limits.max_request_bytes
                    )));
                }
                if oversized {
                    continue;
                }
                if buf.len() + chunk.len() > limit {
                    oversized = true;
                    buf.clear();
                    continue;
                }
                buf.extend_from_slice(&chunk);
            }

            match filename {
                Some(filename) => {
                    debug!(field = %name, filename = %filename, size = buf.len(), oversized, "Received file");
                    let content = if oversized {
                        Err(AppError::PayloadTooLarge(format!(
                            "{filename} exceeds the {max_file_bytes} byte upload limit"
                        )))
                    } else {
                        Ok(buf.freeze())
                    };
                    form.files.push((name, UploadedFile { filename, content }));
                }
                None => {
                    if oversized {
                        return Err(AppError::BadRequest(format!("Form field {name} is too large")));
                    }
                    let value = String::from_utf8(buf.to_vec()).map_err(|_| {
                        AppError::BadRequest(format!("Form field {name} is not valid UTF-8"))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    pub fn transform_params(&self) -> Result<TransformParams> {
        TransformParams::from_fields(&self.fields)
    }

    /// Remove and return the first file sent under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.remove(index).1)
    }

    /// Remove and return every file sent under `name`, in form order.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = kept;
        taken.into_iter().map(|(_, file)| file).collect()
    }
}
