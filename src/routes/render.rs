use handle_errors::ValidationErrors;

use crate::types::{grade::Grade, question::QuestionForm};

pub const NEW_QUESTION_PATH: &str = "/explore/new_question";

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
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

fn field_error(errors: Option<&ValidationErrors>, field: &str) -> String {
    match errors.and_then(|errors| errors.get(field)) {
        Some(error) => format!(
            "<ul class=\"errorlist\"><li>{}</li></ul>",
            escape(&error.to_string())
        ),
        None => String::new(),
    }
}

fn input(
    label: &str,
    name: &str,
    kind: &str,
    value: &Option<String>,
    errors: Option<&ValidationErrors>,
) -> String {
    format!(
        "<p>{error}<label for=\"id_{name}\">{label}:</label> \
         <input type=\"{kind}\" name=\"{name}\" id=\"id_{name}\" value=\"{value}\"></p>\n",
        error = field_error(errors, name),
        name = name,
        label = label,
        kind = kind,
        value = escape(value.as_deref().unwrap_or_default()),
    )
}

fn grade_select(selected: &Option<String>, errors: Option<&ValidationErrors>) -> String {
    let mut options = String::from("<option value=\"\">---------</option>");
    for grade in Grade::ALL {
        let is_selected = selected.as_deref() == Some(grade.as_str());
        options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            grade.as_str(),
            if is_selected { " selected" } else { "" },
            grade.label()
        ));
    }
    format!(
        "<p>{}<label for=\"id_grade\">Grade:</label> \
         <select name=\"grade\" id=\"id_grade\">{}</select></p>\n",
        field_error(errors, "grade"),
        options
    )
}

/// The new-question page, bound to `form` and showing `errors` next to the
/// fields they belong to.
pub fn new_question_page(form: &QuestionForm, errors: Option<&ValidationErrors>) -> String {
    let mut body = String::new();
    body.push_str(&input("Title", "title", "text", &form.title, errors));
    body.push_str(&format!(
        "<p>{}<label for=\"id_content\">Content:</label> \
         <textarea name=\"content\" id=\"id_content\">{}</textarea></p>\n",
        field_error(errors, "content"),
        escape(form.content.as_deref().unwrap_or_default())
    ));
    body.push_str(&input("Subject", "subject", "number", &form.subject, errors));
    body.push_str(&input(
        "Sub-subject",
        "sub-subject",
        "number",
        &form.sub_subject,
        errors,
    ));
    body.push_str(&grade_select(&form.grade, errors));
    body.push_str(&input("Book", "book", "number", &form.book, errors));
    body.push_str(&input("Book page", "book_page", "number", &form.book_page, errors));

    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>New question</title></head>\n<body>\n\
         <h1>Ask a question</h1>\n\
         <form method=\"post\" action=\"{}\" id=\"new-question-form\">\n{}\
         <button type=\"submit\">Post</button>\n</form>\n</body>\n</html>\n",
        NEW_QUESTION_PATH, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use handle_errors::FieldError;

    #[test]
    fn empty_form_has_every_field() {
        let page = new_question_page(&QuestionForm::default(), None);

        for name in ["title", "content", "subject", "sub-subject", "grade", "book", "book_page"] {
            assert!(page.contains(&format!("name=\"{}\"", name)), "{}", name);
        }
        assert!(!page.contains("errorlist"));
    }

    #[test]
    fn submitted_values_are_escaped_and_kept() {
        let form = QuestionForm {
            title: Some("<b>1+1</b>".to_string()),
            grade: Some("GRADE7".to_string()),
            ..QuestionForm::default()
        };

        let page = new_question_page(&form, None);

        assert!(page.contains("value=\"&lt;b&gt;1+1&lt;/b&gt;\""));
        assert!(page.contains("<option value=\"GRADE7\" selected>"));
    }

    #[test]
    fn errors_are_shown_next_to_their_field() {
        let mut errors = ValidationErrors::new();
        errors.add("grade", FieldError::Required);

        let page = new_question_page(&QuestionForm::default(), Some(&errors));

        assert!(page.contains("This field is required."));
    }
}
