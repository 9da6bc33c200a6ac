use std::string::String;

/// One CAN-bus message as captured by a candump-style logger:
/// `(timestamp) interface canId#data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    pub timestamp: String,
    pub interface: String,
    pub can_id: String,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("line is missing frame delimiters")]
    MissingDelimiters,
    #[error("no timestamp segment found")]
    MissingTimestamp,
    #[error("no interface segment found")]
    MissingInterface,
    #[error("no id/data separator found")]
    MissingSeparator,
}

/// Parses a raw log line into its four components. Total over all inputs:
/// every line yields a frame or a [FrameError], never a panic.
pub fn parse_line(line: &str) -> Result<CanFrame, FrameError> {
    if !line.contains(')') || !line.contains('#') {
        return Err(FrameError::MissingDelimiters);
    }

    let (timestamp_part, rest) = line.split_once(") ").ok_or(FrameError::MissingTimestamp)?;
    let timestamp = timestamp_part.strip_prefix('(').unwrap_or(timestamp_part);

    if !rest.contains(' ') || !rest.contains('#') {
        return Err(FrameError::MissingInterface);
    }

    let (interface, id_data) = rest.split_once(' ').ok_or(FrameError::MissingInterface)?;
    // The payload may itself contain '#'; only the first one separates id from data.
    let (can_id, data) = id_data.split_once('#').ok_or(FrameError::MissingSeparator)?;

    Ok(CanFrame {
        timestamp: timestamp.trim().to_string(),
        interface: interface.trim().to_string(),
        can_id: can_id.trim().to_string(),
        data: data.trim().to_string(),
    })
}
