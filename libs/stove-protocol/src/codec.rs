//! Request frame codec
//!
//! Builds the ASCII request frames understood by the stove firmware:
//!
//! ```text
//! # 00000 C--- LLLL CMD M p1;p2;...; CCCC \n
//! │   │     │    │    │  │     │       │
//! │   │     │    │    │  │     │       └─ CRC-16/CCITT-FALSE, 4 upper hex
//! │   │     │    │    │  │     └─ parameters, each followed by ';'
//! │   │     │    │    │  └─ mode: R / W / E
//! │   │     │    │    └─ 3-char command (INF, DAT)
//! │   │     │    └─ parameter section length in chars, 4 upper hex
//! │   │     └─ client marker
//! │   └─ socket id
//! └─ start byte
//! ```
//!
//! The checksum covers everything between `#` and the checksum itself.

use std::fmt;

use crc::{Crc, CRC_16_IBM_3740};
use serde::{Deserialize, Serialize};

use crate::constants::{
    CHECKSUM_LEN, CLIENT_MARKER, COMMAND_LEN, FIELD_SEPARATOR, FRAME_END, FRAME_START,
    LENGTH_FIELD_LEN, MIN_FRAME_LEN, SOCKET_ID,
};
use crate::error::{Result, StoveError};

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, no reflection, no final xor
const FRAME_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Request command code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// `INF`: device information
    Info,
    /// `DAT`: status blocks (read) and parameter changes (write)
    Data,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Info => "INF",
            Command::Data => "DAT",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "INF" => Some(Command::Info),
            "DAT" => Some(Command::Data),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Read,
    Write,
    Execute,
}

impl Mode {
    pub fn as_char(&self) -> char {
        match self {
            Mode::Read => 'R',
            Mode::Write => 'W',
            Mode::Execute => 'E',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'R' => Some(Mode::Read),
            'W' => Some(Mode::Write),
            'E' => Some(Mode::Execute),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One request frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    mode: Mode,
    parameters: Vec<String>,
}

impl Frame {
    /// Build a frame from its parameters
    ///
    /// The length field is 4 hex digits, so the joined parameter text
    /// (separators included) must stay within 0xFFFF characters. Longer input
    /// is not rejected and produces a frame the stove cannot parse.
    pub fn new<I, S>(command: Command, mode: Mode, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command,
            mode,
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// `INF` read; the firmware expects one empty parameter
    pub fn info() -> Self {
        Self::new(Command::Info, Mode::Read, [""])
    }

    /// `DAT` read of one status block
    pub fn read_block(block: &str) -> Self {
        Self::new(Command::Data, Mode::Read, [block])
    }

    /// `DAT` write carrying one queued parameter list
    pub fn write(parameters: &[String]) -> Self {
        Self::new(Command::Data, Mode::Write, parameters.iter().cloned())
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Frame text without the trailing newline, for logs
    pub fn to_wire_string(&self) -> String {
        let joined = join_parameters(&self.parameters);
        let body = format!(
            "{SOCKET_ID}{CLIENT_MARKER}{:04X}{}{}{}",
            joined.chars().count(),
            self.command.as_str(),
            self.mode.as_char(),
            joined
        );
        format!("{}{}{}", FRAME_START as char, body, checksum_hex(&body))
    }

    /// Wire bytes including the terminating newline
    pub fn encode(&self) -> Vec<u8> {
        let mut wire = self.to_wire_string().into_bytes();
        wire.push(FRAME_END);
        wire
    }

    /// Parse and verify a request frame
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| StoveError::protocol(format!("Frame is not UTF-8: {e}")))?;
        let text = text
            .strip_suffix(FRAME_END as char)
            .ok_or_else(|| StoveError::protocol("Frame is not newline terminated"))?;
        let text = text
            .strip_prefix(FRAME_START as char)
            .ok_or_else(|| StoveError::protocol("Frame does not start with '#'"))?;

        if text.len() + 2 < MIN_FRAME_LEN {
            return Err(StoveError::protocol(format!(
                "Frame too short: {} bytes",
                data.len()
            )));
        }

        let split = text.len() - CHECKSUM_LEN;
        let (body, crc_text) = match (text.get(..split), text.get(split..)) {
            (Some(body), Some(crc)) => (body, crc),
            _ => return Err(StoveError::protocol("Checksum field is not ASCII")),
        };

        let received = u16::from_str_radix(crc_text, 16)
            .map_err(|_| StoveError::protocol(format!("Invalid checksum field: {crc_text}")))?;
        let expected = checksum(body);
        if received != expected {
            return Err(StoveError::protocol(format!(
                "Checksum mismatch: received {received:04X}, computed {expected:04X}"
            )));
        }

        let rest = body
            .strip_prefix(SOCKET_ID)
            .and_then(|r| r.strip_prefix(CLIENT_MARKER))
            .ok_or_else(|| StoveError::protocol("Unexpected socket id or client marker"))?;

        let length_text = rest
            .get(..LENGTH_FIELD_LEN)
            .ok_or_else(|| StoveError::protocol("Missing length field"))?;
        let length = usize::from_str_radix(length_text, 16)
            .map_err(|_| StoveError::protocol(format!("Invalid length field: {length_text}")))?;

        let code_end = LENGTH_FIELD_LEN + COMMAND_LEN;
        let code = rest
            .get(LENGTH_FIELD_LEN..code_end)
            .ok_or_else(|| StoveError::protocol("Missing command code"))?;
        let command = Command::from_code(code)
            .ok_or_else(|| StoveError::protocol(format!("Unknown command: {code}")))?;

        let mut tail = rest
            .get(code_end..)
            .ok_or_else(|| StoveError::protocol("Missing mode"))?
            .chars();
        let mode_char = tail
            .next()
            .ok_or_else(|| StoveError::protocol("Missing mode"))?;
        let mode = Mode::from_char(mode_char)
            .ok_or_else(|| StoveError::protocol(format!("Unknown mode: {mode_char}")))?;

        let joined = tail.as_str();
        let actual = joined.chars().count();
        if actual != length {
            return Err(StoveError::protocol(format!(
                "Length field {length} does not match parameter section {actual}"
            )));
        }
        if !joined.ends_with(FIELD_SEPARATOR) {
            return Err(StoveError::protocol(
                "Parameter section is not ';' terminated",
            ));
        }

        Ok(Self {
            command,
            mode,
            parameters: split_parameters(joined),
        })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}

/// Encode one request frame
pub fn encode<S: AsRef<str>>(command: Command, mode: Mode, parameters: &[S]) -> Vec<u8> {
    Frame::new(command, mode, parameters.iter().map(|p| p.as_ref().to_string())).encode()
}

/// Join parameters with ';' and terminate with ';'
///
/// An empty list encodes like a single empty parameter (`";"`).
pub fn join_parameters<S: AsRef<str>>(parameters: &[S]) -> String {
    let mut joined = parameters
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(";");
    joined.push(FIELD_SEPARATOR);
    joined
}

/// Inverse of [`join_parameters`]
pub fn split_parameters(joined: &str) -> Vec<String> {
    let trimmed = joined.strip_suffix(FIELD_SEPARATOR).unwrap_or(joined);
    trimmed.split(FIELD_SEPARATOR).map(str::to_string).collect()
}

/// CRC-16/CCITT-FALSE over the UTF-8 bytes of `body`
pub fn checksum(body: &str) -> u16 {
    FRAME_CRC.checksum(body.as_bytes())
}

pub fn checksum_hex(body: &str) -> String {
    format!("{:04X}", checksum(body))
}
