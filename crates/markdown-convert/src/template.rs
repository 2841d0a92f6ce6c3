//! Placeholder substitution for `--template` files.

pub const TITLE_PLACEHOLDER: &str = "{{title}}";
pub const FILENAME_PLACEHOLDER: &str = "{{filename}}";
pub const CONTENT_PLACEHOLDER: &str = "{{content}}";

/// Substitute rendered output into `template`, or pass it through when there is none.
///
/// Content goes in last, so placeholder-like text inside the rendered
/// document is never substituted itself.
pub fn compose(template: Option<&str>, title: &str, file_name: &str, content: String) -> String {
    match template {
        None => content,
        Some(template) => template
            .replace(TITLE_PLACEHOLDER, title)
            .replace(FILENAME_PLACEHOLDER, file_name)
            .replace(CONTENT_PLACEHOLDER, &content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_all_three_placeholders() {
        let out = compose(
            Some("T:{{title}} F:{{filename}} C:{{content}}"),
            "X",
            "doc",
            "<p>hi</p>".to_string(),
        );
        assert_eq!(out, "T:X F:doc C:<p>hi</p>");
    }

    #[test]
    fn passes_content_through_without_template() {
        let out = compose(None, "X", "doc", "<p>hi</p>".to_string());
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn replaces_every_occurrence() {
        let out = compose(
            Some("{{title}}|{{title}}|{{filename}}{{filename}}"),
            "A",
            "b",
            String::new(),
        );
        assert_eq!(out, "A|A|bb");
    }

    #[test]
    fn placeholders_inside_content_survive() {
        let out = compose(
            Some("<h1>{{title}}</h1>{{content}}"),
            "Real",
            "doc",
            "<p>{{title}} and {{filename}}</p>".to_string(),
        );
        assert_eq!(out, "<h1>Real</h1><p>{{title}} and {{filename}}</p>");
    }
}
