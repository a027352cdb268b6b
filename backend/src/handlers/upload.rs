//! Multipart file extraction shared by the upload endpoints

use axum::extract::Multipart;

use crate::error::{AppError, AppResult};

/// Largest request body accepted on upload routes
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// A file pulled out of a multipart body
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Take the first field named in `field_names`, or failing that the first
/// field that carries a filename
pub async fn read_upload(multipart: &mut Multipart, field_names: &[&str]) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Requisição multipart inválida: {}", e)))?
    {
        let named = field.name().is_some_and(|n| field_names.contains(&n));
        if !named && field.file_name().is_none() {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Falha ao ler o arquivo: {}", e)))?
            .to_vec();

        return Ok(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    Err(AppError::ValidationError("Nenhum arquivo enviado".to_string()))
}
