//! Turning page data into HTML. `Renderer` is the seam a real template engine plugs into; the
//! view models are `Serialize` so one can consume them as plain data. `HtmlRenderer` is a small
//! built-in renderer that needs no template files.
use crate::datastore::structs::{CommentView, PostView};
use crate::feed::{GroupListing, Listing, PostDetail, ProfileListing};
use crate::forms::PostFormView;
use crate::images::ImageStore;
use crate::pagination::Page;
use crate::twoface::Fallible;
use crate::urls;
use chrono::Datelike;
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;

/// A page of the site, with the data its template needs.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "template", content = "context", rename_all = "snake_case")]
pub enum View {
    Index(Listing),
    Group(GroupListing),
    Profile(ProfileListing),
    Follow(Listing),
    PostDetail(PostDetail),
    PostForm(PostFormView),
}

impl View {
    pub fn title(&self) -> String {
        match self {
            View::Index(_) => "Latest posts".to_owned(),
            View::Group(listing) => format!("Posts in {}", listing.group.title),
            View::Profile(listing) => format!("Posts by {}", listing.author.username),
            View::Follow(_) => "Posts by authors you follow".to_owned(),
            View::PostDetail(detail) => format!("Post {}", truncate(&detail.post.post.text, 30)),
            View::PostForm(form) if form.is_edit() => "Edit post".to_owned(),
            View::PostForm(_) => "New post".to_owned(),
        }
    }
}

pub trait Renderer: Send + Sync + 'static {
    fn render(&self, view: &View) -> Fallible<String>;
}

pub struct HtmlRenderer {
    images: Arc<dyn ImageStore>,
}

impl HtmlRenderer {
    pub fn new(images: Arc<dyn ImageStore>) -> Self {
        Self { images }
    }

    fn post(&self, out: &mut String, view: &PostView) -> std::fmt::Result {
        let post = &view.post;
        writeln!(out, "<article>")?;
        write!(out, "<ul><li>Author: ")?;
        match &view.author {
            Some(author) => write!(
                out,
                "<a href=\"{}\">{}</a>",
                urls::profile(&author.username),
                escape(&author.username)
            )?,
            None => write!(out, "unknown")?,
        }
        writeln!(
            out,
            "</li><li>Published: {}</li></ul>",
            post.created_at.format("%-d %B %Y")
        )?;
        if let Some(image) = &post.image {
            writeln!(
                out,
                "<img src=\"{}\" alt=\"\">",
                escape(&self.images.url(image))
            )?;
        }
        writeln!(out, "<p>{}</p>", escape(&post.text))?;
        write!(out, "<a href=\"{}\">details</a>", urls::post_detail(post.id))?;
        if let Some(group) = &view.group {
            write!(
                out,
                " | <a href=\"{}\">all posts in {}</a>",
                urls::group(&group.slug),
                escape(&group.title)
            )?;
        }
        writeln!(out, "\n</article>")
    }

    fn page(&self, out: &mut String, page: &Page<PostView>, base: &str) -> std::fmt::Result {
        if page.is_empty() {
            writeln!(out, "<p>No posts yet.</p>")?;
        }
        for view in &page.items {
            self.post(out, view)?;
        }
        if page.num_pages > 1 {
            write!(out, "<nav>")?;
            if page.has_previous {
                write!(out, "<a href=\"{}\">previous</a> ", urls::page(base, page.number - 1))?;
            }
            write!(out, "page {} of {}", page.number, page.num_pages)?;
            if page.has_next {
                write!(out, " <a href=\"{}\">next</a>", urls::page(base, page.number + 1))?;
            }
            writeln!(out, "</nav>")?;
        }
        Ok(())
    }

    fn comment(&self, out: &mut String, view: &CommentView) -> std::fmt::Result {
        let name = view
            .author
            .as_ref()
            .map(|a| a.username.as_str())
            .unwrap_or("unknown");
        writeln!(
            out,
            "<div class=\"comment\"><a href=\"{}\">{}</a><p>{}</p></div>",
            urls::profile(name),
            escape(name),
            escape(&view.comment.text)
        )
    }

    fn body(&self, out: &mut String, view: &View) -> std::fmt::Result {
        match view {
            View::Index(listing) => self.page(out, &listing.page, &urls::index()),
            View::Follow(listing) => self.page(out, &listing.page, &urls::follow_index()),
            View::Group(listing) => {
                writeln!(out, "<p>{}</p>", escape(&listing.group.description))?;
                self.page(out, &listing.page, &urls::group(&listing.group.slug))
            }
            View::Profile(listing) => {
                let name = &listing.author.username;
                writeln!(out, "<p>Posts: {}</p>", listing.page.count)?;
                if !listing.is_self {
                    let (action, label) = if listing.following {
                        (urls::profile_unfollow(name), "Unfollow")
                    } else {
                        (urls::profile_follow(name), "Follow")
                    };
                    writeln!(
                        out,
                        "<form method=\"post\" action=\"{}\"><button>{}</button></form>",
                        action, label
                    )?;
                }
                self.page(out, &listing.page, &urls::profile(name))
            }
            View::PostDetail(detail) => {
                self.post(out, &detail.post)?;
                if detail.is_author {
                    writeln!(
                        out,
                        "<a href=\"{}\">edit</a>",
                        urls::post_edit(detail.post.post.id)
                    )?;
                }
                if detail.can_comment {
                    writeln!(
                        out,
                        "<form method=\"post\" action=\"{}\"><textarea name=\"text\"></textarea>\
                         <button>Send</button></form>",
                        urls::add_comment(detail.post.post.id)
                    )?;
                }
                for comment in &detail.comments {
                    self.comment(out, comment)?;
                }
                Ok(())
            }
            View::PostForm(form) => {
                let action = match form.post_id {
                    Some(id) => urls::post_edit(id),
                    None => urls::create_post(),
                };
                writeln!(
                    out,
                    "<form method=\"post\" action=\"{}\" enctype=\"multipart/form-data\">",
                    action
                )?;
                field_errors(out, form, "text")?;
                writeln!(
                    out,
                    "<textarea name=\"text\">{}</textarea>",
                    escape(&form.form.text)
                )?;
                field_errors(out, form, "group")?;
                writeln!(out, "<select name=\"group\"><option value=\"\">---------</option>")?;
                for group in &form.groups {
                    let id = group.id.to_string();
                    let selected = if form.form.group == id { " selected" } else { "" };
                    writeln!(
                        out,
                        "<option value=\"{}\"{}>{}</option>",
                        id,
                        selected,
                        escape(&group.title)
                    )?;
                }
                writeln!(out, "</select>")?;
                field_errors(out, form, "image")?;
                if let Some(image) = &form.current_image {
                    writeln!(
                        out,
                        "<img src=\"{}\" alt=\"\">",
                        escape(&self.images.url(image))
                    )?;
                }
                writeln!(out, "<input type=\"file\" name=\"image\" accept=\"image/*\">")?;
                let label = if form.is_edit() { "Save" } else { "Add" };
                writeln!(out, "<button>{}</button>\n</form>", label)
            }
        }
    }
}

fn field_errors(out: &mut String, form: &PostFormView, field: &str) -> std::fmt::Result {
    if let Some(errors) = form.errors.get(field) {
        for error in errors {
            writeln!(out, "<p class=\"error\">{}</p>", escape(error))?;
        }
    }
    Ok(())
}

impl Renderer for HtmlRenderer {
    fn render(&self, view: &View) -> Fallible<String> {
        let mut out = String::new();
        let title = escape(&view.title());
        writeln!(
            out,
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
            title
        )?;
        writeln!(out, "<h1>{}</h1>", title)?;
        self.body(&mut out, view)?;
        writeln!(
            out,
            "<footer>&copy; {}</footer>\n</body></html>",
            chrono::Utc::now().year()
        )?;
        Ok(out)
    }
}

/// Escape text for use in HTML content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
