//! Minimal STOMP 1.2 frame codec, one frame per WebSocket text message.

use std::time::Duration;

use crate::notifications::errors::ChannelError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of the named header. Repeated headers keep the first one.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The client never sends heart-beats; it asks the broker for one every
    /// `heartbeat` (zero asks for none).
    pub fn connect(host: &str, heartbeat: Duration) -> Self {
        Frame::new("CONNECT")
            .header("accept-version", "1.2")
            .header("host", host)
            .header("heart-beat", format!("0,{}", heartbeat.as_millis()))
    }

    /// Interval at which the broker promised heart-beats in its `CONNECTED`
    /// frame, given what was asked for. `None` when either side declined.
    pub fn incoming_heartbeat(&self, requested: Duration) -> Option<Duration> {
        let offered = self
            .get("heart-beat")?
            .split(',')
            .next()?
            .trim()
            .parse::<u64>()
            .ok()?;
        if offered == 0 || requested.is_zero() {
            return None;
        }
        Some(requested.max(Duration::from_millis(offered)))
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new("SUBSCRIBE")
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn unsubscribe(id: &str) -> Self {
        Frame::new("UNSUBSCRIBE").header("id", id)
    }

    pub fn disconnect(receipt: &str) -> Self {
        Frame::new("DISCONNECT").header("receipt", receipt)
    }

    pub fn encode(&self) -> String {
        // CONNECT and CONNECTED headers are never escaped.
        let escape_headers = !matches!(self.command.as_str(), "CONNECT" | "CONNECTED");

        let mut out = String::with_capacity(self.command.len() + self.body.len() + 32);
        out.push_str(&self.command);
        out.push('\n');
        for (name, value) in &self.headers {
            if escape_headers {
                out.push_str(&escape(name));
                out.push(':');
                out.push_str(&escape(value));
            } else {
                out.push_str(name);
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

    /// Decodes one frame. Returns `Ok(None)` for heart-beats (bare EOLs).
    pub fn decode(raw: &str) -> Result<Option<Frame>, ChannelError> {
        let mut rest = raw.trim_start_matches(['\r', '\n']);
        if rest.is_empty() {
            return Ok(None);
        }

        let command = take_line(&mut rest)
            .ok_or_else(|| ChannelError::Protocol("frame without command line".to_string()))?;
        if command.is_empty() || !command.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ChannelError::Protocol(format!("invalid command {command:?}")));
        }
        let unescape_headers = command != "CONNECTED";

        let mut headers = Vec::new();
        loop {
            let line = take_line(&mut rest)
                .ok_or_else(|| ChannelError::Protocol("unterminated header block".to_string()))?;
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ChannelError::Protocol(format!("malformed header {line:?}")))?;
            if unescape_headers {
                headers.push((unescape(name)?, unescape(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let mut frame = Frame {
            command: command.to_string(),
            headers,
            body: String::new(),
        };

        let body = match frame.get("content-length") {
            Some(length) => {
                let length: usize = length.trim().parse().map_err(|_| {
                    ChannelError::Protocol(format!("invalid content-length {length:?}"))
                })?;
                rest.get(..length).ok_or_else(|| {
                    ChannelError::Protocol("body shorter than content-length".to_string())
                })?
            }
            None => match rest.find('\0') {
                Some(end) => &rest[..end],
                None => rest,
            },
        };
        frame.body = body.to_string();

        Ok(Some(frame))
    }
}

fn take_line<'a>(input: &mut &'a str) -> Option<&'a str> {
    let idx = input.find('\n')?;
    let line = &input[..idx];
    *input = &input[idx + 1..];
    Some(line.strip_suffix('\r').unwrap_or(line))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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

fn unescape(value: &str) -> Result<String, ChannelError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(ChannelError::Protocol(format!(
                    "invalid header escape \\{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}
