//! Buffered `multipart/form-data` reading for upload endpoints.
//!
//! Text parts are collected by name; exactly one named part may carry a
//! file. File parts stop streaming as soon as they exceed the configured
//! limit so oversize uploads are never fully buffered.

use std::collections::HashMap;

use actix_multipart::{Field, Multipart, MultipartError};
use futures_util::TryStreamExt;

use crate::domain::Error;
use crate::domain::ports::FileUpload;

use super::validation::{FieldName, file_too_large_error, invalid_value_error, missing_field_error};

/// Longest accepted text part.
const TEXT_FIELD_LIMIT: usize = 64 * 1024;

/// Parsed form: text parts plus the optional file part.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    fields: HashMap<String, String>,
    file: Option<FileUpload>,
}

impl UploadForm {
    /// Text value of `field`, trimmed; blank values count as absent.
    pub(crate) fn text(&self, field: FieldName) -> Option<&str> {
        self.fields
            .get(field.as_str())
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Raw text value of `field`, including blank values.
    pub(crate) fn raw(&self, field: FieldName) -> Option<&str> {
        self.fields.get(field.as_str()).map(String::as_str)
    }

    /// Take the file part or fail with `missing_field`.
    pub(crate) fn take_file(&mut self, field: FieldName) -> Result<FileUpload, Error> {
        self.file.take().ok_or_else(|| missing_field_error(field))
    }
}

fn multipart_error(error: MultipartError) -> Error {
    Error::invalid_request(format!("malformed multipart body: {error}"))
}

async fn read_part(
    field: &mut Field,
    limit: usize,
    too_large: impl Fn() -> Error,
) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if buffer.len() + chunk.len() > limit {
            return Err(too_large());
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}

/// Read every part of `payload`.
///
/// The part named `file_field` must carry a file name; any other part with
/// a file name is rejected, as is a second file part.
pub(crate) async fn read_upload_form(
    mut payload: Multipart,
    file_field: FieldName,
    file_limit: usize,
) -> Result<UploadForm, Error> {
    let mut form = UploadForm::default();
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_owned);

        match file_name {
            Some(original_name) if name == file_field.as_str() => {
                if form.file.is_some() {
                    return Err(invalid_value_error(
                        file_field,
                        format!("only one {} part is accepted", file_field.as_str()),
                    ));
                }
                let contents = read_part(&mut field, file_limit, || {
                    file_too_large_error(file_field, file_limit)
                })
                .await?;
                form.file = Some(FileUpload {
                    original_name,
                    contents,
                });
            }
            Some(_) => {
                return Err(Error::invalid_request(format!(
                    "unexpected file part: {name}"
                )));
            }
            None => {
                let bytes = read_part(&mut field, TEXT_FIELD_LIMIT, || {
                    Error::invalid_request(format!("form field {name} is too long"))
                })
                .await?;
                let value = String::from_utf8(bytes).map_err(|_| {
                    Error::invalid_request(format!("form field {name} must be UTF-8 text"))
                })?;
                form.fields.insert(name, value);
            }
        }
    }
    Ok(form)
}
