//! Image uploads and the files served under /media/. Uploaded images are
//! written below the media root with a random prefix so filenames never
//! collide, and posts store the path relative to that root.

use crate::twoface::{externalerror::Cause, Describe, ExternalError, Fallible};
use actix_multipart::Multipart;
use actix_web::{error::BlockingError, web, HttpResponse};
use futures::StreamExt;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// A new or edited post, as submitted through the multipart form.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<ImageUpload>,
}

/// An image file pulled out of a form submission.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl PostForm {
    pub fn validate(&self) -> Vec<String> {
        if self.text.trim().is_empty() {
            vec!["Post text can't be empty".to_owned()]
        } else {
            Vec::new()
        }
    }
}

/// Read the post form fields out of a multipart body. `max_bytes` bounds the
/// whole submission, images included.
pub async fn read_post_form(mut payload: Multipart, max_bytes: usize) -> Fallible<PostForm> {
    let mut form = PostForm::default();
    let mut budget = max_bytes;
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| anyhow::anyhow!("multipart stream: {}", e))?;
        guard!(let Some(disposition) = field.content_disposition() else {
            continue
        });
        let name = disposition.get_name().unwrap_or("").to_owned();
        let filename = disposition.get_filename().map(sanitize_filename);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| anyhow::anyhow!("multipart read: {}", e))?;
            guard!(let Some(remaining) = budget.checked_sub(data.len()) else {
                return Err(anyhow::anyhow!("upload exceeded {} bytes", max_bytes).describe(
                    ExternalError {
                        cause: Cause::UserActionInvalid,
                        text: "Upload is too large",
                    },
                ))
            });
            budget = remaining;
            bytes.extend_from_slice(&data);
        }

        match name.as_str() {
            "text" => form.text = String::from_utf8_lossy(&bytes).into_owned(),
            "group" => {
                let raw = String::from_utf8_lossy(&bytes);
                let raw = raw.trim();
                form.group_id = if raw.is_empty() {
                    None
                } else {
                    Some(raw.parse().map_err(|e| {
                        anyhow::anyhow!("bad group id {:?}: {}", raw, e).describe(ExternalError {
                            cause: Cause::UserInvalidField,
                            text: "That group doesn't exist",
                        })
                    })?)
                };
            }
            "image" => {
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        filename: filename.unwrap_or_else(|| "upload".to_owned()),
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Strip directories and shell-hostile characters from an uploaded filename.
fn sanitize_filename(raw: &str) -> String {
    let base = Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write an uploaded image below the media root. Returns the relative path
/// that gets recorded on the post, e.g. `posts/<uuid>_pic.gif`.
pub async fn store_image(media_root: &str, upload: ImageUpload) -> Fallible<String> {
    let relative = format!("posts/{}_{}", Uuid::new_v4(), upload.filename);
    let full = Path::new(media_root).join(&relative);
    web::block(move || {
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, &upload.bytes)
    })
    .await
    .map_err(|e| {
        anyhow::anyhow!("storing image: {}", e).describe(ExternalError {
            cause: Cause::ServerError,
            text: "Couldn't store the uploaded image",
        })
    })?;
    Ok(relative)
}

/// The directory media files are served from.
#[derive(Clone)]
pub struct MediaRoot(pub String);

/// GET /media/{path}. Serves exactly the files under the media root.
pub async fn serve(root: web::Data<MediaRoot>, path: web::Path<String>) -> Fallible<HttpResponse> {
    let relative = path.into_inner();
    let not_found = ExternalError {
        cause: Cause::NotFound,
        text: "No such media file",
    };
    // Only plain names below the root. Rejects `..` and absolute paths.
    if Path::new(&relative)
        .components()
        .any(|part| !matches!(part, Component::Normal(_)))
    {
        return Err(anyhow::anyhow!("media path escapes root: {:?}", relative).describe(not_found));
    }

    let full: PathBuf = Path::new(&root.0).join(&relative);
    let bytes = web::block(move || std::fs::read(&full)).await.map_err(|e| match e {
        BlockingError::Error(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            anyhow::anyhow!("media file missing: {}", e).describe(not_found)
        }
        other => anyhow::anyhow!("reading media file: {}", other).into(),
    })?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&relative))
        .body(bytes))
}

fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("gif") => "image/gif",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
