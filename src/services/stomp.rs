//! Minimal STOMP 1.2 text framing
//!
//! Just enough of the protocol to connect, subscribe to a topic and read
//! `MESSAGE` frames over a WebSocket text channel.
//! Frame layout: `COMMAND\nkey:value\n...\n\nbody\0`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StompError {
    #[error("empty frame")]
    Empty,
    #[error("frame is not NUL-terminated")]
    MissingTerminator,
    #[error("no blank line between headers and body")]
    MissingBlankLine,
    #[error("malformed header line {0:?}")]
    MalformedHeader(String),
}

impl StompFrame {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value for `key`; repeated headers keep the first occurrence.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn connect(host: &str) -> Self {
        StompFrame::new("CONNECT")
            .header("accept-version", "1.2")
            .header("host", host)
            .header("heart-beat", "0,0")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        StompFrame::new("SUBSCRIBE")
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn disconnect() -> Self {
        StompFrame::new("DISCONNECT")
    }

    pub fn encode(&self) -> String {
        // CONNECT headers are never escaped
        let escape_headers = self.command != "CONNECT" && self.command != "CONNECTED";

        let mut out = String::with_capacity(self.command.len() + self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (key, value) in &self.headers {
            if escape_headers {
                out.push_str(&escape(key));
                out.push(':');
                out.push_str(&escape(value));
            } else {
                out.push_str(key);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse one frame. Returns `Ok(None)` for a heart-beat (bare EOLs).
    pub fn decode(raw: &str) -> Result<Option<StompFrame>, StompError> {
        let trimmed = raw.trim_start_matches(['\r', '\n']);
        if trimmed.is_empty() {
            return Ok(None);
        }

        let frame = match trimmed.find('\0') {
            Some(end) => &trimmed[..end],
            None => return Err(StompError::MissingTerminator),
        };

        let (head, body) = match frame.find("\n\n") {
            Some(split) => (&frame[..split], &frame[split + 2..]),
            None => match frame.find("\r\n\r\n") {
                Some(split) => (&frame[..split], &frame[split + 4..]),
                None => return Err(StompError::MissingBlankLine),
            },
        };

        let mut lines = head.lines();
        let command = lines.next().map(str::trim).unwrap_or_default();
        if command.is_empty() {
            return Err(StompError::Empty);
        }
        let unescape_headers = command != "CONNECT" && command != "CONNECTED";

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| StompError::MalformedHeader(line.to_string()))?;
            if unescape_headers {
                headers.push((unescape(key), unescape(value)));
            } else {
                headers.push((key.to_string(), value.to_string()));
            }
        }

        Ok(Some(StompFrame {
            command: command.to_string(),
            headers,
            body: body.to_string(),
        }))
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_subscribe() {
        let frame = StompFrame::subscribe("sub-0", "/topic/crypto");
        assert_eq!(
            frame.encode(),
            "SUBSCRIBE\nid:sub-0\ndestination:/topic/crypto\nack:auto\n\n\0"
        );
    }

    #[test]
    fn test_decode_message_frame() {
        let raw = "MESSAGE\ndestination:/topic/crypto\nmessage-id:7\nsubscription:sub-0\ncontent-type:application/json\n\n[{\"id\":\"btc\"}]\0";
        let frame = StompFrame::decode(raw).unwrap().unwrap();

        assert_eq!(frame.command, "MESSAGE");
        assert_eq!(frame.get("destination"), Some("/topic/crypto"));
        assert_eq!(frame.get("message-id"), Some("7"));
        assert_eq!(frame.body, "[{\"id\":\"btc\"}]");
    }

    #[test]
    fn test_decode_heartbeat_and_errors() {
        assert_eq!(StompFrame::decode("\n").unwrap(), None);
        assert_eq!(StompFrame::decode("MESSAGE\n\nbody"), Err(StompError::MissingTerminator));
        assert_eq!(StompFrame::decode("MESSAGE\nbody\0"), Err(StompError::MissingBlankLine));
        assert!(matches!(
            StompFrame::decode("MESSAGE\nnocolon\n\n\0"),
            Err(StompError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_header_escaping_applies_outside_connect() {
        let frame = StompFrame::new("SEND").header("note", "a:b\nc").body("x");
        let encoded = frame.encode();
        assert!(encoded.contains("note:a\\cb\\nc\n"));
        assert!(encoded.contains("content-length:1\n"));

        let decoded = StompFrame::decode(&encoded).unwrap().unwrap();
        assert_eq!(decoded.get("note"), Some("a:b\nc"));
        assert_eq!(decoded.body, "x");

        let connect = StompFrame::connect("localhost").encode();
        assert!(connect.starts_with("CONNECT\naccept-version:1.2\nhost:localhost\n"));
    }
}
