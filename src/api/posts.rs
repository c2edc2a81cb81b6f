//! Writing posts and comments.
use crate::api::{observe, redirect, render, State};
use crate::auth::LoggedIn;
use crate::datastore::{
    structs::{NewComment, NewPost, PostChanges},
    Datastore,
};
use crate::forms::{CommentForm, FieldErrors, PostForm, PostFormView};
use crate::images::Upload;
use crate::render::View;
use crate::twoface::{BlockingResp, Fallible, OrNotFound};
use crate::urls;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tracing::info;

/// Save an uploaded image off the async executor and return its reference.
async fn store_image<DS>(state: &State<DS>, upload: Option<Upload>) -> Fallible<Option<String>> {
    guard!(let Some(upload) = upload else {
        return Ok(None)
    });
    let images = Arc::clone(&state.images);
    let reference = web::block(move || images.store(&upload)).await.to_resp()?;
    Ok(Some(reference))
}

pub async fn create_form<DS: Datastore>(
    state: web::Data<State<DS>>,
    _user: LoggedIn,
) -> Fallible<HttpResponse> {
    observe("create_form", || async {
        let groups = state.ds.list_groups().await?;
        let view = PostFormView {
            form: PostForm::default(),
            errors: FieldErrors::new(),
            groups,
            post_id: None,
            current_image: None,
        };
        render(state.get_ref(), &View::PostForm(view))
    })
    .await
}

pub async fn create_post<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: LoggedIn,
    payload: Multipart,
) -> Fallible<HttpResponse> {
    observe("create_post", || async {
        let form = PostForm::from_multipart(payload, state.max_upload_size).await?;
        let groups = state.ds.list_groups().await?;
        let clean = match form.validate(&groups) {
            Ok(clean) => clean,
            Err(errors) => {
                let view = PostFormView {
                    form,
                    errors,
                    groups,
                    post_id: None,
                    current_image: None,
                };
                return render(state.get_ref(), &View::PostForm(view));
            }
        };
        let image = store_image(state.get_ref(), clean.image).await?;
        let post = state
            .ds
            .new_post(NewPost {
                text: clean.text,
                group_id: clean.group_id,
                author_id: Some(user.0.id),
                image,
            })
            .await?;
        info!(post_id = post.id, author = %user.0.username, "created post");
        Ok(redirect(&urls::profile(&user.0.username)))
    })
    .await
}

pub async fn edit_form<DS: Datastore>(
    state: web::Data<State<DS>>,
    id: web::Path<i32>,
    user: LoggedIn,
) -> Fallible<HttpResponse> {
    observe("edit_form", || async {
        let existing = state.ds.find_post(*id).await?.or_not_found("Post not found")?;
        if !existing.post.is_by(user.0.id) {
            return Ok(redirect(&urls::post_detail(*id)));
        }
        let groups = state.ds.list_groups().await?;
        let view = PostFormView {
            form: PostForm::from_post(&existing.post),
            errors: FieldErrors::new(),
            groups,
            post_id: Some(*id),
            current_image: existing.post.image,
        };
        render(state.get_ref(), &View::PostForm(view))
    })
    .await
}

pub async fn edit_post<DS: Datastore>(
    state: web::Data<State<DS>>,
    id: web::Path<i32>,
    user: LoggedIn,
    payload: Multipart,
) -> Fallible<HttpResponse> {
    observe("edit_post", || async {
        let existing = state.ds.find_post(*id).await?.or_not_found("Post not found")?;
        if !existing.post.is_by(user.0.id) {
            return Ok(redirect(&urls::post_detail(*id)));
        }
        let form = PostForm::from_multipart(payload, state.max_upload_size).await?;
        let groups = state.ds.list_groups().await?;
        let clean = match form.validate(&groups) {
            Ok(clean) => clean,
            Err(errors) => {
                let view = PostFormView {
                    form,
                    errors,
                    groups,
                    post_id: Some(*id),
                    current_image: existing.post.image,
                };
                return render(state.get_ref(), &View::PostForm(view));
            }
        };
        let changes = PostChanges {
            text: clean.text,
            group_id: clean.group_id,
            image: store_image(state.get_ref(), clean.image).await?,
        };
        state
            .ds
            .update_post(*id, changes)
            .await?
            .or_not_found("Post not found")?;
        info!(post_id = *id, author = %user.0.username, "edited post");
        Ok(redirect(&urls::post_detail(*id)))
    })
    .await
}

/// Comments are only ever posted; a GET goes back to the post.
pub async fn comment_redirect(id: web::Path<i32>) -> HttpResponse {
    redirect(&urls::post_detail(*id))
}

pub async fn add_comment<DS: Datastore>(
    state: web::Data<State<DS>>,
    id: web::Path<i32>,
    user: LoggedIn,
    form: web::Form<CommentForm>,
) -> Fallible<HttpResponse> {
    observe("add_comment", || async {
        // Blank comments are dropped without looking the post up.
        if let Some(text) = form.validate() {
            let post = state.ds.find_post(*id).await?.or_not_found("Post not found")?;
            let comment = state
                .ds
                .new_comment(NewComment {
                    post_id: post.post.id,
                    author_id: user.0.id,
                    text,
                })
                .await?;
            info!(comment_id = comment.id, post_id = post.post.id, "added comment");
        }
        Ok(redirect(&urls::post_detail(*id)))
    })
    .await
}
