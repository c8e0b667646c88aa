//! Server-rendered HTML for the two forms and their listings.

use formdesk_core::actions::{ActionState, CONTACT_ROUTE, Listing, TASKS_ROUTE};
use formdesk_core::form::{ContactSchema, FormFields, TaskSchema};
use formdesk_core::model::{ContactMessage, MessageType, Task};
use std::fmt::Write;

pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n<main>\n{}</main>\n</body>\n</html>\n",
        escape(title),
        body
    )
}

fn status_line(state: Option<&ActionState>) -> String {
    let message = state.map(|state| state.message.as_str()).unwrap_or("");
    format!(
        "<p aria-live=\"polite\" role=\"status\">{}</p>\n",
        escape(message)
    )
}

fn degraded_notice<T>(listing: &Listing<T>) -> String {
    match listing.error.as_deref() {
        Some(error) => format!("<p class=\"notice\">{}</p>\n", escape(error)),
        None => String::new(),
    }
}

/// Task form followed by every stored task. `draft` refills the input after a failure.
pub fn tasks_page(state: Option<&ActionState>, draft: Option<&str>, listing: &Listing<Task>) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        "<form method=\"post\" action=\"{action}\">\n\
         <label for=\"{field}\">Enter Task</label>\n\
         <input type=\"text\" id=\"{field}\" name=\"{field}\" value=\"{value}\" required>\n\
         <button type=\"submit\">Submit</button>\n{status}</form>\n",
        action = TASKS_ROUTE,
        field = TaskSchema::TODO,
        value = escape(draft.unwrap_or("")),
        status = status_line(state),
    );

    body.push_str(&degraded_notice(listing));
    body.push_str("<ul>\n");
    for task in &listing.items {
        let _ = writeln!(body, "<li id=\"task-{}\">{}</li>", task.id, escape(&task.text));
    }
    body.push_str("</ul>\n");

    layout("Tasks", &body)
}

fn text_input(name: &str, label: &str, fields: &FormFields) -> String {
    format!(
        "<label for=\"{name}\">{label}</label>\n\
         <input type=\"text\" id=\"{name}\" name=\"{name}\" value=\"{}\" required>\n",
        escape(fields.get(name).unwrap_or(""))
    )
}

/// Contact form. After a failed submission `fields` carries the values to keep.
pub fn contact_page(state: Option<&ActionState>, fields: &FormFields) -> String {
    let selected = fields
        .get(ContactSchema::TYPE)
        .and_then(MessageType::parse);

    let mut body = String::new();
    let _ = writeln!(body, "<form method=\"post\" action=\"{CONTACT_ROUTE}\">");
    let _ = writeln!(
        body,
        "<label for=\"{name}\">Enter Type</label>\n<select id=\"{name}\" name=\"{name}\" required>",
        name = ContactSchema::TYPE
    );
    let placeholder = if selected.is_none() { " selected" } else { "" };
    let _ = writeln!(
        body,
        "<option value=\"\" disabled{placeholder}>Message Type</option>"
    );
    for kind in MessageType::ALL {
        let marker = if selected == Some(kind) { " selected" } else { "" };
        let _ = writeln!(
            body,
            "<option value=\"{}\"{marker}>{}</option>",
            escape(kind.as_str()),
            kind.label()
        );
    }
    body.push_str("</select>\n");

    body.push_str(&text_input(ContactSchema::NAME, "Enter Name", fields));
    body.push_str(&text_input(ContactSchema::EMAIL, "Enter Email", fields));
    let _ = write!(
        body,
        "<label for=\"{name}\">Enter Message</label>\n\
         <textarea id=\"{name}\" name=\"{name}\" required>{}</textarea>\n",
        escape(fields.get(ContactSchema::MESSAGE).unwrap_or("")),
        name = ContactSchema::MESSAGE
    );
    body.push_str("<button type=\"submit\">Submit</button>\n");
    body.push_str(&status_line(state));
    body.push_str("</form>\n");

    layout("Contact", &body)
}

pub fn thank_you_page(listing: &Listing<ContactMessage>) -> String {
    let mut body = String::from("<h2>Thank You for your message!</h2>\n");
    body.push_str(&degraded_notice(listing));
    body.push_str("<ul>\n");
    for message in &listing.items {
        let _ = write!(
            body,
            "<li id=\"message-{id}\">\n\
             <div>Date: {date}</div>\n\
             <div>Message Type: {kind}</div>\n\
             <div>Name: {name}</div>\n\
             <div>Email: {email}</div>\n\
             <div>Message: {text}</div>\n</li>\n",
            id = message.id,
            date = message.created_at.date(),
            kind = escape(message.message_type.as_str()),
            name = escape(&message.name),
            email = escape(&message.email),
            text = escape(&message.message),
        );
    }
    body.push_str("</ul>\n");

    layout("Thank you", &body)
}

#[cfg(test)]
mod tests {
    use super::{contact_page, escape, tasks_page, thank_you_page};
    use formdesk_core::actions::Listing;
    use formdesk_core::form::FormFields;
    use formdesk_core::model::{ContactMessage, MessageType, Task};

    fn listing<T>(items: Vec<T>) -> Listing<T> {
        Listing { items, error: None }
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(
            escape("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn tasks_page_lists_escaped_tasks_in_order() {
        let page = tasks_page(
            None,
            None,
            &listing(vec![
                Task {
                    id: 1,
                    text: "first".to_string(),
                },
                Task {
                    id: 2,
                    text: "<script>".to_string(),
                },
            ]),
        );

        let first = page.find("<li id=\"task-1\">first</li>").unwrap();
        let second = page.find("<li id=\"task-2\">&lt;script&gt;</li>").unwrap();
        assert!(first < second);
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn degraded_listing_shows_notice() {
        let page = tasks_page(
            None,
            None,
            &Listing::<Task> {
                items: Vec::new(),
                error: Some("An error occurred while fetching tasks.".to_string()),
            },
        );
        assert!(page.contains("class=\"notice\""));
        assert!(page.contains("<ul>\n</ul>"));
    }

    #[test]
    fn contact_page_keeps_submitted_values() {
        let fields = FormFields::new()
            .with("name", "A")
            .with("email", "not-an-email")
            .with("message", "hi <there>")
            .with("type", "bug report");

        let page = contact_page(None, &fields);

        assert!(page.contains("value=\"not-an-email\""));
        assert!(page.contains(">hi &lt;there&gt;</textarea>"));
        assert!(page.contains("<option value=\"bug report\" selected>Bug Report</option>"));
        assert!(!page.contains("disabled selected"));
    }

    #[test]
    fn empty_contact_page_selects_placeholder() {
        let page = contact_page(None, &FormFields::new());
        assert!(page.contains("<option value=\"\" disabled selected>Message Type</option>"));
    }

    #[test]
    fn thank_you_page_shows_date_only() {
        let page = thank_you_page(&listing(vec![ContactMessage {
            id: 3,
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            message: "hi".to_string(),
            message_type: MessageType::Inquiry,
            created_at: time::macros::datetime!(2024-10-01 12:34:56 UTC),
        }]));

        assert!(page.contains("<div>Date: 2024-10-01</div>"));
        assert!(page.contains("<div>Message Type: inquiry</div>"));
        assert!(!page.contains("12:34:56"));
    }
}
