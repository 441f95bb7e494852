//! Wire protocol
//!
//! One command per TCP connection: the client writes a 1-byte tag followed by
//! the tag's fixed-size payload, the server writes the tag's fixed-size reply
//! (if it has one) and closes the connection.
//!
//! | Tag | Command      | Payload                         | Reply             |
//! |-----|--------------|---------------------------------|-------------------|
//! | 0   | PLAY         | 128-byte NUL-padded filename    | none              |
//! | 1   | PAUSE        | none                            | none              |
//! | 2   | RESUME       | none                            | none              |
//! | 3   | SEEK         | f32 timepoint (seconds)         | none              |
//! | 4   | GET_ELAPSED  | none                            | f32 seconds       |
//! | 5   | GET_DURATION | none                            | f32 seconds       |
//!
//! Floats are 4-byte little-endian. There is no error reply: failures are
//! reported only in the daemon's log.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Size of the PLAY filename field
pub const FILENAME_LEN: usize = 128;

/// Size of an f32 payload or reply
pub const FLOAT_LEN: usize = 4;

/// Command tag (first byte of every request)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Play = 0,
    Pause = 1,
    Resume = 2,
    Seek = 3,
    GetElapsed = 4,
    GetDuration = 5,
}

impl Tag {
    /// Bytes following the tag byte
    pub fn payload_len(self) -> usize {
        match self {
            Tag::Play => FILENAME_LEN,
            Tag::Seek => FLOAT_LEN,
            Tag::Pause | Tag::Resume | Tag::GetElapsed | Tag::GetDuration => 0,
        }
    }

    /// Bytes the server writes back
    pub fn reply_len(self) -> usize {
        match self {
            Tag::GetElapsed | Tag::GetDuration => FLOAT_LEN,
            Tag::Play | Tag::Pause | Tag::Resume | Tag::Seek => 0,
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Tag::Play),
            1 => Ok(Tag::Pause),
            2 => Ok(Tag::Resume),
            3 => Ok(Tag::Seek),
            4 => Ok(Tag::GetElapsed),
            5 => Ok(Tag::GetDuration),
            other => Err(Error::UnknownTag(other)),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Play => "PLAY",
            Tag::Pause => "PAUSE",
            Tag::Resume => "RESUME",
            Tag::Seek => "SEEK",
            Tag::GetElapsed => "GET_ELAPSED",
            Tag::GetDuration => "GET_DURATION",
        };
        f.write_str(name)
    }
}

/// Decoded request
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Play { filename: PathBuf },
    Pause,
    Resume,
    Seek { timepoint: f32 },
    GetElapsed,
    GetDuration,
}

impl Request {
    pub fn tag(&self) -> Tag {
        match self {
            Request::Play { .. } => Tag::Play,
            Request::Pause => Tag::Pause,
            Request::Resume => Tag::Resume,
            Request::Seek { .. } => Tag::Seek,
            Request::GetElapsed => Tag::GetElapsed,
            Request::GetDuration => Tag::GetDuration,
        }
    }

    /// Decode the payload that followed `tag`.
    ///
    /// `payload` must be exactly `tag.payload_len()` bytes.
    pub fn decode(tag: Tag, payload: &[u8]) -> Result<Self> {
        if payload.len() != tag.payload_len() {
            return Err(Error::Protocol(format!(
                "{} payload is {} bytes, expected {}",
                tag,
                payload.len(),
                tag.payload_len()
            )));
        }

        let request = match tag {
            Tag::Play => Request::Play {
                filename: decode_filename(payload)?,
            },
            Tag::Pause => Request::Pause,
            Tag::Resume => Request::Resume,
            Tag::Seek => Request::Seek {
                timepoint: decode_f32(payload)?,
            },
            Tag::GetElapsed => Request::GetElapsed,
            Tag::GetDuration => Request::GetDuration,
        };
        Ok(request)
    }

    /// Encode tag byte plus payload
    pub fn encode(&self) -> Result<Vec<u8>> {
        let tag = self.tag();
        let mut out = Vec::with_capacity(1 + tag.payload_len());
        out.push(tag as u8);

        match self {
            Request::Play { filename } => {
                let bytes = path_to_bytes(filename)?;
                // One byte is reserved for the terminating NUL
                if bytes.len() >= FILENAME_LEN {
                    return Err(Error::FilenameTooLong {
                        len: bytes.len(),
                        max: FILENAME_LEN - 1,
                    });
                }
                if bytes.contains(&0) {
                    return Err(Error::Protocol("filename contains a NUL byte".to_string()));
                }
                out.extend_from_slice(bytes);
                out.resize(1 + FILENAME_LEN, 0);
            }
            Request::Seek { timepoint } => out.extend_from_slice(&timepoint.to_le_bytes()),
            Request::Pause | Request::Resume | Request::GetElapsed | Request::GetDuration => {}
        }

        Ok(out)
    }
}

/// Server reply
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reply {
    /// Time value in seconds (elapsed or duration)
    Seconds(f32),
}

impl Reply {
    pub fn encode(&self) -> [u8; FLOAT_LEN] {
        match self {
            Reply::Seconds(secs) => secs.to_le_bytes(),
        }
    }

    pub fn decode_seconds(bytes: &[u8]) -> Result<f32> {
        decode_f32(bytes)
    }
}

fn decode_filename(payload: &[u8]) -> Result<PathBuf> {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    if end == 0 {
        return Err(Error::Protocol("empty filename".to_string()));
    }
    path_from_bytes(&payload[..end])
}

// Unix paths are arbitrary bytes; elsewhere the field must be UTF-8
#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> Result<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Ok(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Result<PathBuf> {
    String::from_utf8(bytes.to_vec())
        .map(PathBuf::from)
        .map_err(|e| Error::Protocol(format!("filename is not valid UTF-8: {}", e)))
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Result<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Ok(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Result<&[u8]> {
    path.to_str()
        .map(str::as_bytes)
        .ok_or_else(|| Error::Protocol("filename is not valid UTF-8".to_string()))
}

fn decode_f32(bytes: &[u8]) -> Result<f32> {
    let raw: [u8; FLOAT_LEN] = bytes
        .try_into()
        .map_err(|_| Error::Protocol(format!("expected {} bytes, got {}", FLOAT_LEN, bytes.len())))?;
    Ok(f32::from_le_bytes(raw))
}
