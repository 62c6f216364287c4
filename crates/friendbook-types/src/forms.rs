use serde::Deserialize;

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Posts, comments, chat --

/// Body of every form that submits a single block of text.
#[derive(Debug, Deserialize)]
pub struct ContentForm {
    pub content: String,
}
