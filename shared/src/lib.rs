use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

pub const INPUT_MARKER: &str = "<input>";
pub const DEFAULT_PORT: u16 = 8079;
pub const DEFAULT_BACKLOG: u32 = 10;
pub const MAX_LINE_LEN: usize = 4096;
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub const KNOCK_KNOCK: &str = "Knock knock!";
pub const WHO_IS_THERE: &str = "Who's there?";
pub const ANOTHER_PROMPT: &str = "Would you like to listen to another? (Y/N)";
pub const PLEASE_REPLY_YN: &str = "Please reply with Y or N.";
pub const NO_MORE_JOKES: &str = "I have no more jokes to tell.";
pub const CORRECTION_PREFIX: &str = "You are supposed to say";

/// Appends the input marker, telling the peer one line of free text is expected.
pub fn prompt(text: &str) -> String {
    format!("{} {}", text, INPUT_MARKER)
}

pub fn knock_prompt() -> String {
    prompt(KNOCK_KNOCK)
}

pub fn another_prompt() -> String {
    prompt(ANOTHER_PROMPT)
}

/// The reply a client owes after hearing `setup`.
pub fn setup_reply(setup: &str) -> String {
    format!("{} who?", setup)
}

pub fn correction(expected: &str) -> String {
    format!("{}, \"{}\". Let's try again.", CORRECTION_PREFIX, expected)
}

/// Case-insensitive comparison after trimming both sides. Spelling must be exact.
pub fn replies_match(reply: &str, expected: &str) -> bool {
    reply.trim().to_lowercase() == expected.trim().to_lowercase()
}

pub fn is_yes(reply: &str) -> bool {
    replies_match(reply, "y") || replies_match(reply, "yes")
}

pub fn is_no(reply: &str) -> bool {
    replies_match(reply, "n") || replies_match(reply, "no")
}

/// A line as seen by a client: display text plus whether a reply is owed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLine {
    pub text: String,
    pub expects_input: bool,
}

impl ServerLine {
    pub fn parse(raw: &str) -> Self {
        match raw.find(INPUT_MARKER) {
            Some(pos) => {
                let mut text = String::with_capacity(raw.len());
                text.push_str(&raw[..pos]);
                text.push_str(&raw[pos + INPUT_MARKER.len()..]);
                Self {
                    text: text.trim_end().to_string(),
                    expects_input: true,
                }
            }
            None => Self {
                text: raw.to_string(),
                expects_input: false,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum LineError {
    #[error("line exceeds {limit} bytes")]
    TooLong { limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Reads one newline-terminated line, dropping carriage returns.
///
/// Returns `Ok(None)` on a clean end of stream. A trailing fragment without a
/// newline is returned as a final line. Lines longer than `limit` bytes are a
/// framing error and leave the reader positioned mid-line.
pub async fn read_line<R>(reader: &mut R, limit: usize) -> Result<Option<String>, LineError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(limit as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;

    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > limit {
        return Err(LineError::TooLong { limit });
    }

    buf.retain(|&b| b != b'\r');
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn test_exact_wire_lines() {
        assert_eq!(knock_prompt(), "Knock knock! <input>");
        assert_eq!(prompt("Lettuce"), "Lettuce <input>");
        assert_eq!(
            another_prompt(),
            "Would you like to listen to another? (Y/N) <input>"
        );
        assert_eq!(
            correction(WHO_IS_THERE),
            "You are supposed to say, \"Who's there?\". Let's try again."
        );
        assert_eq!(
            correction(&setup_reply("Lettuce")),
            "You are supposed to say, \"Lettuce who?\". Let's try again."
        );
    }

    #[test]
    fn test_replies_match_ignores_case_and_padding() {
        assert!(replies_match("Who's there?", WHO_IS_THERE));
        assert!(replies_match("  WHO'S THERE?\t", WHO_IS_THERE));
        assert!(replies_match("who's there?", WHO_IS_THERE));
        assert!(replies_match("lettuce WHO?", &setup_reply("Lettuce")));
    }

    #[test]
    fn test_replies_match_rejects_spelling_changes() {
        assert!(!replies_match("Who there?", WHO_IS_THERE));
        assert!(!replies_match("Who's there", WHO_IS_THERE));
        assert!(!replies_match("Whos there?", WHO_IS_THERE));
        assert!(!replies_match("Lettuces who?", &setup_reply("Lettuce")));
        assert!(!replies_match("Lettuce whoo?", &setup_reply("Lettuce")));
        assert!(!replies_match("", WHO_IS_THERE));
    }

    #[test]
    fn test_yes_no_answers() {
        for answer in ["y", "Y", "yes", " YES ", "Yes"] {
            assert!(is_yes(answer), "{answer:?} should be yes");
            assert!(!is_no(answer));
        }
        for answer in ["n", "N", "no", "No ", "NO"] {
            assert!(is_no(answer), "{answer:?} should be no");
            assert!(!is_yes(answer));
        }
        for answer in ["", "yep", "nope", "maybe", "y n"] {
            assert!(!is_yes(answer) && !is_no(answer));
        }
    }

    #[test]
    fn test_server_line_parse() {
        let line = ServerLine::parse("Knock knock! <input>");
        assert!(line.expects_input);
        assert_eq!(line.text, "Knock knock!");

        let line = ServerLine::parse("Lettuce in, it's cold out here!");
        assert!(!line.expects_input);
        assert_eq!(line.text, "Lettuce in, it's cold out here!");
    }

    #[tokio::test]
    async fn test_read_line_strips_carriage_returns() {
        let mut reader = BufReader::new(&b"Who's there?\r\nsecond\n"[..]);

        let first = read_line(&mut reader, MAX_LINE_LEN).await.unwrap();
        assert_eq!(first.as_deref(), Some("Who's there?"));

        let second = read_line(&mut reader, MAX_LINE_LEN).await.unwrap();
        assert_eq!(second.as_deref(), Some("second"));

        let eof = read_line(&mut reader, MAX_LINE_LEN).await.unwrap();
        assert!(eof.is_none());
    }

    #[tokio::test]
    async fn test_read_line_returns_trailing_fragment() {
        let mut reader = BufReader::new(&b"no newline"[..]);

        let line = read_line(&mut reader, MAX_LINE_LEN).await.unwrap();
        assert_eq!(line.as_deref(), Some("no newline"));
        assert!(read_line(&mut reader, MAX_LINE_LEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_line_enforces_limit() {
        let exact = format!("{}\n", "a".repeat(8));
        let mut reader = BufReader::new(exact.as_bytes());
        let line = read_line(&mut reader, 8).await.unwrap();
        assert_eq!(line.map(|l| l.len()), Some(8));

        let long = format!("{}\n", "a".repeat(9));
        let mut reader = BufReader::new(long.as_bytes());
        match read_line(&mut reader, 8).await {
            Err(LineError::TooLong { limit }) => assert_eq!(limit, 8),
            other => panic!("expected TooLong, got {:?}", other),
        }
    }
}
