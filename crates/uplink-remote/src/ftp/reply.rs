use std::net::{Ipv4Addr, SocketAddrV4};

/// A complete server reply: a three-digit code and its text lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    /// Text of the reply with the code prefixes stripped, lines joined.
    pub fn message(&self) -> String {
        self.lines.join(" ")
    }

    /// 1xx: the command was accepted and a transfer is starting.
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }
}

/// Incremental parser for (possibly multi-line) replies.
///
/// A single-line reply is `123 text`. A multi-line reply opens with
/// `123-text` and runs until a line beginning with the same code followed by
/// a space; lines in between are taken verbatim.
#[derive(Debug, Default)]
pub struct ReplyParser {
    code: Option<u16>,
    lines: Vec<String>,
}

impl ReplyParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without the line terminator). Returns the reply once
    /// its final line has been seen, or an error for a malformed opener.
    pub fn feed(&mut self, line: &str) -> Result<Option<Reply>, String> {
        let line = line.trim_end_matches(['\r', '\n']);
        match self.code {
            None => {
                let (code, sep, text) = split_status(line)
                    .ok_or_else(|| format!("malformed reply line: {line:?}"))?;
                self.lines.push(text.to_string());
                if sep == '-' {
                    self.code = Some(code);
                    Ok(None)
                } else {
                    Ok(Some(self.take(code)))
                }
            }
            Some(code) => match split_status(line) {
                Some((c, ' ', text)) if c == code => {
                    self.lines.push(text.to_string());
                    Ok(Some(self.take(code)))
                }
                _ => {
                    self.lines.push(line.trim_start().to_string());
                    Ok(None)
                }
            },
        }
    }

    fn take(&mut self, code: u16) -> Reply {
        self.code = None;
        Reply {
            code,
            lines: std::mem::take(&mut self.lines),
        }
    }
}

fn split_status(line: &str) -> Option<(u16, char, &str)> {
    let digits = line.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let code = digits.parse().ok()?;
    let mut rest = line[3..].chars();
    match rest.next() {
        Some(sep @ (' ' | '-')) => Some((code, sep, rest.as_str())),
        None => Some((code, ' ', "")),
        Some(_) => None,
    }
}

/// Extract the data-connection address from a `227` reply, e.g.
/// `Entering Passive Mode (192,168,1,2,195,80)`.
pub fn parse_pasv(message: &str) -> Option<SocketAddrV4> {
    let start = message.find(|c: char| c.is_ascii_digit())?;
    let numbers: Vec<u8> = message[start..]
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .take(6)
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    if numbers.len() != 6 {
        return None;
    }
    let ip = Ipv4Addr::new(numbers[0], numbers[1], numbers[2], numbers[3]);
    let port = u16::from(numbers[4]) << 8 | u16::from(numbers[5]);
    Some(SocketAddrV4::new(ip, port))
}
