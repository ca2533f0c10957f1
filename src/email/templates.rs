use chrono::{DateTime, Utc};

pub const OTP_SUBJECT: &str = "Your verification code";

/// Plain-text and HTML bodies for a verification code email.
pub fn render_email_otp(code: &str, expires_at: DateTime<Utc>) -> (String, String) {
    let expires = expires_at.format("%Y-%m-%d %H:%M UTC");

    let text = format!(
        "Hi!\n\nYour verification code is: {code}\n\nThis code will expire at {expires}.\n"
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Verify your email</h2>
    <p>Hi!</p>
    <p>Your verification code is:</p>
    <p style="font-size: 24px; font-weight: bold; letter-spacing: 4px;">{code}</p>
    <p style="color: #666; font-size: 14px;">This code will expire at {expires}. If you didn't request it, you can ignore this email.</p>
</body>
</html>"#
    );

    (text, html)
}
