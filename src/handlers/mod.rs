pub mod auth;
pub mod comments;
pub mod groups;
pub mod posts;
pub mod profiles;

use uuid::Uuid;

use crate::error::AppError;

/// Form fields arrive as empty strings when left blank; treat those as None.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let s = s.trim().to_string();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    })
}

/// Optional group selector from a form: blank means "no group".
pub(crate) fn parse_optional_group(value: Option<String>) -> Option<Uuid> {
    non_empty(value).and_then(|s| Uuid::parse_str(&s).ok())
}

/// Path ids are opaque strings to the client; an unparseable one is
/// indistinguishable from a missing record and reported the same way.
pub(crate) fn parse_id(id: &str, message: &str, redirect: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::not_found(message, redirect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_form_fields_become_none() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("".to_string())), None);
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" x ".to_string())), Some("x".to_string()));
    }

    #[test]
    fn group_selector_tolerates_blank_and_garbage() {
        assert_eq!(parse_optional_group(None), None);
        assert_eq!(parse_optional_group(Some("".to_string())), None);
        assert_eq!(parse_optional_group(Some("not-a-uuid".to_string())), None);

        let id = Uuid::new_v4();
        assert_eq!(parse_optional_group(Some(id.to_string())), Some(id));
    }

    #[test]
    fn bad_path_ids_read_as_not_found() {
        assert!(parse_id("gibberish", "Post Not Found", "/get_posts").is_err());
    }
}
