//! Paths of the site's pages, shared by redirects and templates. Names and slugs are
//! percent-encoded, so the results are safe in `Location` headers and quoted attributes.
use url::form_urlencoded::byte_serialize;

/// Percent-encode one path segment. Only ASCII letters, digits and `*-._` are left as they are.
fn segment(raw: &str) -> String {
    // Paths don't decode `+`, so spaces must be `%20`.
    byte_serialize(raw.as_bytes()).collect::<String>().replace('+', "%20")
}

pub fn index() -> String {
    "/".to_owned()
}

pub fn group(slug: &str) -> String {
    format!("/group/{}/", segment(slug))
}

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", segment(username))
}

pub fn profile_follow(username: &str) -> String {
    format!("/profile/{}/follow/", segment(username))
}

pub fn profile_unfollow(username: &str) -> String {
    format!("/profile/{}/unfollow/", segment(username))
}

pub fn post_detail(id: i32) -> String {
    format!("/posts/{}/", id)
}

pub fn post_edit(id: i32) -> String {
    format!("/posts/{}/edit/", id)
}

pub fn add_comment(id: i32) -> String {
    format!("/posts/{}/comment/", id)
}

pub fn create_post() -> String {
    "/create/".to_owned()
}

pub fn follow_index() -> String {
    "/follow/".to_owned()
}

/// `base` with the page number appended as a query string.
pub fn page(base: &str, number: usize) -> String {
    format!("{}?page={}", base, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_are_unchanged() {
        assert_eq!(profile("alice"), "/profile/alice/");
        assert_eq!(group("news_2021-a"), "/group/news_2021-a/");
        assert_eq!(page(&profile("alice"), 2), "/profile/alice/?page=2");
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        assert_eq!(profile("a b/<c>"), "/profile/a%20b%2F%3Cc%3E/");
        assert_eq!(profile_follow("\"x\"&y"), "/profile/%22x%22%26y/follow/");
        assert_eq!(profile_unfollow("a+b?"), "/profile/a%2Bb%3F/unfollow/");
        assert_eq!(profile("jürgen"), "/profile/j%C3%BCrgen/");
    }
}
