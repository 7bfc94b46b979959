//! The HTML forms users submit. Validation returns a list of problems to
//! show back on the form; an empty list means the form is good.

use serde::Deserialize;

/// Characters allowed in usernames.
fn valid_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

#[derive(Deserialize, Clone, Debug)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

impl SignupForm {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.username.is_empty() || self.username.len() > 150 {
            problems.push("Username must be between 1 and 150 characters".to_owned());
        } else if !self.username.chars().all(valid_username_char) {
            problems
                .push("Username may only contain letters, digits and @/./+/-/_".to_owned());
        }
        if !self.email.contains('@') {
            problems.push("Enter a valid email address".to_owned());
        }
        if self.password1.chars().count() < 8 {
            problems.push("Password must be at least 8 characters".to_owned());
        }
        if self.password1 != self.password2 {
            problems.push("The two passwords didn't match".to_owned());
        }
        problems
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    /// Where to send the user after login. Only same-site paths are
    /// honoured, anything else falls back to the home page.
    pub fn destination(&self) -> &str {
        match &self.next {
            Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
            _ => "/",
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Vec<String> {
        if self.text.trim().is_empty() {
            vec!["Comment text can't be empty".to_owned()]
        } else {
            Vec::new()
        }
    }
}
