use regex::Regex;

/// leaves room for the moderation header inside telegram's 4096 character limit
pub const MODERATION_PREVIEW_CHARS: usize = 3500;

pub struct MessageFormatter;

impl MessageFormatter {
    pub fn escape_html(text: &str) -> String {
        html_escape::encode_text(text).to_string()
    }

    /// telegram deep link that carries the referrer id as the start payload
    pub fn referral_link(bot_username: &str, user_id: i64) -> String {
        format!(
            "https://t.me/{}?start={}",
            bot_username.trim_start_matches('@'),
            user_id
        )
    }

    /// referrer id from a `/start` payload: `42`, `ref42` or `ref_42`
    pub fn parse_start_payload(payload: &str) -> Option<i64> {
        let re = Regex::new(r"^(?:ref_?)?(\d{1,19})$").ok()?;
        let captures = re.captures(payload.trim())?;
        captures.get(1)?.as_str().parse::<i64>().ok()
    }

    /// truncates to `max_chars` characters, appending an ellipsis when cut
    pub fn preview(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let mut preview: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        preview.push('…');
        preview
    }

    /// splits command arguments into the first word and the remaining text
    pub fn split_first_arg(args: &str) -> Option<(&str, &str)> {
        let args = args.trim();
        if args.is_empty() {
            return None;
        }
        match args.split_once(char::is_whitespace) {
            Some((first, rest)) => Some((first, rest.trim())),
            None => Some((args, "")),
        }
    }
}
