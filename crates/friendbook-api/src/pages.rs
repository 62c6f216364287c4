//! HTML for the four pages. Deliberately plain: every piece of user text goes
//! through [`escape`], everything else is static markup.

use friendbook_types::models::{ChatMessage, FeedEntry};
use friendbook_types::session::CurrentUser;

use crate::flash::Notice;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, notice: Option<Notice>, body: &str) -> String {
    let notice = notice
        .map(|n| format!("<div class=\"flash-message\">{}</div>\n", n.message()))
        .unwrap_or_default();
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>FriendBook - {title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n{notice}{body}</body>\n</html>\n"
    )
}

fn nav(home_or_chat: &str) -> String {
    format!(
        "<form action=\"/logout\" method=\"POST\"><button>Logout</button></form>\n{home_or_chat}\n"
    )
}

pub fn register(notice: Option<Notice>) -> String {
    layout(
        "Register",
        notice,
        "<form method=\"POST\" action=\"/register\">\n\
         <input name=\"username\" placeholder=\"Username\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
         <button type=\"submit\">Register</button>\n</form>\n\
         <p>Already have an account? <a href=\"/login\">Login</a></p>\n",
    )
}

pub fn login(notice: Option<Notice>) -> String {
    layout(
        "Login",
        notice,
        "<form method=\"POST\" action=\"/login\">\n\
         <input name=\"username\" placeholder=\"Username\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
         <button type=\"submit\">Login</button>\n</form>\n\
         <p>Don't have an account? <a href=\"/register\">Register</a></p>\n",
    )
}

/// The feed. Edit and delete controls appear only on the viewer's comments.
pub fn index(user: &CurrentUser, entries: &[FeedEntry], notice: Option<Notice>) -> String {
    let mut body = nav("<a href=\"/chat\">Chat</a>");
    body.push_str(
        "<form method=\"POST\" action=\"/post\">\n\
         <textarea name=\"content\" placeholder=\"What's on your mind?\" required></textarea>\n\
         <button type=\"submit\">Post</button>\n</form>\n<hr>\n",
    );

    for entry in entries {
        let post = &entry.post;
        body.push_str(&format!(
            "<div class=\"card\">\n<h5>{}</h5>\n<p>{}</p>\n<small>{}</small>\n\
             <form action=\"/comment/{}\" method=\"POST\">\
             <input name=\"content\" placeholder=\"Comment...\" required><button>Comment</button></form>\n",
            escape(&post.author_username),
            escape(&post.content),
            post.created_at.format(TIME_FORMAT),
            post.id,
        ));

        for comment in &entry.comments {
            body.push_str(&format!(
                "<div class=\"comment\"><strong>{}:</strong> {} <small>({})</small>",
                escape(&comment.author_username),
                escape(&comment.content),
                comment.created_at.format(TIME_FORMAT),
            ));
            if comment.author_id == user.user_id {
                body.push_str(&format!(
                    "\n<form action=\"/edit_comment/{id}\" method=\"POST\">\
                     <input name=\"content\" value=\"{}\" required><button>Edit</button></form>\
                     <form action=\"/delete_comment/{id}\" method=\"POST\"><button>Delete</button></form>",
                    escape(&comment.content),
                    id = comment.id,
                ));
            }
            body.push_str("</div>\n");
        }
        body.push_str("</div>\n");
    }

    layout("FriendBook", notice, &body)
}

/// The chat room, newest message first. The viewer's own messages are
/// marked `chat-right`, everyone else's `chat-left`.
pub fn chat(user: &CurrentUser, messages: &[ChatMessage], notice: Option<Notice>) -> String {
    let mut body = nav("<a href=\"/\">Home</a>");
    body.push_str(
        "<form method=\"POST\" action=\"/chat\">\n\
         <textarea name=\"content\" placeholder=\"Type a message...\" required></textarea>\n\
         <button type=\"submit\">Send</button>\n</form>\n",
    );

    for msg in messages {
        let side = if msg.author_id == user.user_id { "chat-right" } else { "chat-left" };
        body.push_str(&format!(
            "<div class=\"chat-bubble {side}\"><small><strong>{}</strong> - {}</small><br>{}</div>\n",
            escape(&msg.author_username),
            msg.created_at.format(TIME_FORMAT),
            escape(&msg.content),
        ));
    }

    layout("Chat Room", notice, &body)
}
