//! Inline HTML pages.

const STYLES: &str = r"
    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif;
        min-height: 100vh;
        margin: 0;
        display: flex;
        align-items: center;
        justify-content: center;
        background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
    }
    .card {
        background: white;
        padding: 32px 40px;
        border-radius: 12px;
        box-shadow: 0 10px 30px rgba(0,0,0,0.2);
        width: 340px;
    }
    h1 { color: #333; margin-top: 0; }
    label { display: block; font-weight: bold; margin: 12px 0 4px; color: #333; }
    input {
        width: 100%;
        padding: 10px;
        border: 1px solid #ccc;
        border-radius: 6px;
        box-sizing: border-box;
    }
    button, .logout-btn {
        margin-top: 20px;
        width: 100%;
        padding: 10px;
        border: none;
        border-radius: 6px;
        background: #667eea;
        color: white;
        font-size: 15px;
        cursor: pointer;
        text-align: center;
        text-decoration: none;
        display: block;
    }
    .error {
        background: #fdecea;
        color: #b71c1c;
        padding: 10px;
        border-radius: 6px;
    }
    p.switch { text-align: center; }
";

/// Escape text for HTML element and attribute content.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLES}</style>
</head>
<body>
<div class="card">
{body}
</div>
</body>
</html>"#
    )
}

fn error_block(error: Option<&str>) -> String {
    error.map_or_else(String::new, |message| {
        format!(r#"<p class="error">{}</p>"#, escape(message))
    })
}

#[must_use]
pub fn register(error: Option<&str>) -> String {
    page(
        "Register",
        &format!(
            r#"<h1>Register</h1>
{error}
<form method="post" action="/register">
<label for="username">Username</label>
<input id="username" name="username" type="text" maxlength="100" required>
<label for="email">Email</label>
<input id="email" name="email" type="email" maxlength="100" required>
<label for="password">Password</label>
<input id="password" name="password" type="password" required>
<button type="submit">Register</button>
</form>
<p class="switch">Already have an account? <a href="/login">Login</a></p>"#,
            error = error_block(error)
        ),
    )
}

#[must_use]
pub fn login(error: Option<&str>) -> String {
    page(
        "Login",
        &format!(
            r#"<h1>Login</h1>
{error}
<form method="post" action="/login">
<label for="username">Username</label>
<input id="username" name="username" type="text" required>
<label for="password">Password</label>
<input id="password" name="password" type="password" required>
<button type="submit">Login</button>
</form>
<p class="switch">No account yet? <a href="/register">Register</a></p>"#,
            error = error_block(error)
        ),
    )
}

#[must_use]
pub fn home(username: &str) -> String {
    page(
        "Welcome",
        &format!(
            r#"<h1>Welcome, {username}!</h1>
<p>You are logged in.</p>
<a class="logout-btn" href="/logout">Logout</a>"#,
            username = escape(username)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_replaces_markup() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape("alice"), "alice");
    }

    #[test]
    fn home_escapes_username() {
        let html = home("<b>mallory</b>");
        assert!(html.contains("Welcome, &lt;b&gt;mallory&lt;/b&gt;!"));
        assert!(!html.contains("<b>mallory</b>"));
    }

    #[test]
    fn forms_show_error_only_when_present() {
        assert!(!login(None).contains("class=\"error\""));
        assert!(login(Some("Invalid username or password")).contains("Invalid username or password"));
        assert!(register(None).contains(r#"action="/register""#));
    }
}
