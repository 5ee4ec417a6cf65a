/// Collapses every whitespace run (newlines included) into one space and trims the ends.
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes the first occurrence of `label` and normalizes what is left.
pub fn strip_label(input: &str, label: &str) -> String {
    clean_text(&input.replacen(label, "", 1))
}

/// Like [`clean_text`], but an empty result becomes `None`.
pub fn clean_optional(input: &str) -> Option<String> {
    Some(clean_text(input)).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(clean_text("  Foo \n\t  Bar  "), "Foo Bar");
    }

    #[test]
    fn empty_and_blank_become_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n \t "), "");
    }

    #[test]
    fn strips_title_label() {
        assert_eq!(strip_label("  Title:  Foo   Bar  ", "Title:"), "Foo Bar");
    }

    #[test]
    fn strip_label_only_removes_first_occurrence() {
        assert_eq!(
            strip_label("Comments: Comments: welcome", "Comments:"),
            "Comments: welcome"
        );
    }

    #[test]
    fn label_only_comment_is_none() {
        assert_eq!(clean_optional(&"Comments: ".replacen("Comments:", "", 1)), None);
        assert_eq!(clean_optional(" 12 pages "), Some("12 pages".to_string()));
    }
}
