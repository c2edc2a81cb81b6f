//! Form input for posts and comments, and its validation.
use crate::datastore::structs::{Group, Post};
use crate::images::Upload;
use crate::twoface::{Cause, Describe, ExternalError, Fallible, TfError};
use actix_multipart::{Field, Multipart, MultipartError};
use anyhow::anyhow;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error messages per form field.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

const REQUIRED: &str = "This field is required.";
const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Largest text field accepted in a multipart post form.
const TEXT_FIELD_LIMIT: usize = 64 * 1024;

const BAD_MULTIPART: ExternalError = ExternalError {
    cause: Cause::UserInvalidField,
    text: "Invalid multipart form body",
};

/// The post form as submitted. Missing fields are empty, so they become field errors instead of
/// a rejected request.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
    pub text: String,
    /// Group id, or empty for no group.
    pub group: String,
    /// Contents of the uploaded file, or empty for no (new) image.
    #[serde(skip_serializing)]
    pub image: Vec<u8>,
}

/// A post form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<Upload>,
}

impl PostForm {
    /// The form pre-filled from an existing post, for editing.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: Vec::new(),
        }
    }

    /// Read the form from a `multipart/form-data` body. The image part may be at most
    /// `image_limit` bytes; unknown parts are skipped.
    pub async fn from_multipart(mut payload: Multipart, image_limit: usize) -> Fallible<Self> {
        let mut form = Self::default();
        while let Some(field) = payload.try_next().await.map_err(bad_multipart)? {
            let name = field
                .content_disposition()
                .and_then(|cd| cd.get_name().map(str::to_owned));
            match name.as_deref() {
                Some("text") => form.text = read_text(field).await?,
                Some("group") => form.group = read_text(field).await?,
                Some("image") => form.image = read_field(field, image_limit).await?,
                _ => skip_field(field).await?,
            }
        }
        Ok(form)
    }

    /// Check the input against the groups that exist.
    pub fn validate(&self, groups: &[Group]) -> Result<CleanPost, FieldErrors> {
        let mut errors = FieldErrors::new();

        let text = self.text.trim();
        if text.is_empty() {
            errors.entry("text").or_default().push(REQUIRED.to_owned());
        }

        let group = self.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            match group.parse::<i32>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.entry("group").or_default().push(INVALID_GROUP.to_owned());
                    None
                }
            }
        };

        let image = match Upload::from_file(&self.image) {
            Ok(image) => image,
            Err(message) => {
                errors.entry("image").or_default().push(message.to_owned());
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CleanPost {
            text: text.to_owned(),
            group_id,
            image,
        })
    }
}

fn bad_multipart(e: MultipartError) -> TfError {
    anyhow!("couldn't read multipart body: {}", e).describe(BAD_MULTIPART)
}

async fn read_field(mut field: Field, limit: usize) -> Fallible<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(bad_multipart)? {
        if data.len() + chunk.len() > limit {
            return Err(anyhow!("multipart field over {} bytes", limit).describe(ExternalError {
                cause: Cause::UserInvalidField,
                text: "Uploaded file is too large",
            }));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_text(field: Field) -> Fallible<String> {
    let data = read_field(field, TEXT_FIELD_LIMIT).await?;
    String::from_utf8(data).map_err(|e| e.describe(BAD_MULTIPART))
}

async fn skip_field(mut field: Field) -> Fallible<()> {
    while field.try_next().await.map_err(bad_multipart)?.is_some() {}
    Ok(())
}

#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    /// The comment text, if there is any.
    pub fn validate(&self) -> Option<String> {
        let text = self.text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_owned())
        }
    }
}

/// Everything the post form template needs.
#[derive(Serialize, Debug, Clone)]
pub struct PostFormView {
    pub form: PostForm,
    pub errors: FieldErrors,
    pub groups: Vec<Group>,
    /// Set when editing an existing post.
    pub post_id: Option<i32>,
    pub current_image: Option<String>,
}

impl PostFormView {
    pub fn is_edit(&self) -> bool {
        self.post_id.is_some()
    }
}
