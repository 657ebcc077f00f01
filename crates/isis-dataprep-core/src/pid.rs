//! Article identifiers.
//!
//! A pid is `[source prefix][9-char issn bucket][4-char year][sequence]`,
//! 23 characters in canonical form or 28 with a reference sequence
//! suffix. Raw identifier cells may carry the collection after a literal
//! `^c` marker: `S0001-37652020000100001^cscl`.

use std::fmt;

use crate::error::DecodeError;

/// Collection marker inside a raw identifier cell.
pub const COLLECTION_MARKER: &str = "^c";

/// Canonical pid length.
pub const PID_LEN: usize = 23;

/// Pid length with a reference sequence suffix.
pub const PID_WITH_SEQ_LEN: usize = 28;

/// Split a raw identifier on `^c`.
///
/// No marker yields an empty collection. More than one marker is a
/// structural error.
pub fn split_identifier(raw: &str) -> Result<(String, String), DecodeError> {
    let mut parts = raw.split(COLLECTION_MARKER);
    let id = parts.next().unwrap_or_default();
    let collection = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err(DecodeError::structural(format!(
            "identifier carries more than one collection marker: {raw}"
        )));
    }
    Ok((id.to_string(), collection.to_string()))
}

/// A validated 23- or 28-character pid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(String);

impl Pid {
    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        let len = raw.chars().count();
        if (len == PID_LEN || len == PID_WITH_SEQ_LEN) && raw.is_ascii() {
            Ok(Pid(raw.to_string()))
        } else {
            Err(DecodeError::structural(format!(
                "pid must be {PID_LEN} or {PID_WITH_SEQ_LEN} ASCII characters, got {len}: {raw:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 23-character article part, dropping any reference suffix.
    pub fn article(&self) -> &str {
        &self.0[..PID_LEN]
    }

    /// Journal bucket: `pid[1..10]`.
    pub fn issn_bucket(&self) -> &str {
        &self.0[1..10]
    }

    /// Publication year: `pid[10..14]`.
    pub fn year(&self) -> &str {
        &self.0[10..14]
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Pid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PID: &str = "S0001-37652020000100001";

    #[test]
    fn split_without_marker() {
        assert_eq!(
            split_identifier(PID).unwrap(),
            (PID.to_string(), String::new())
        );
    }

    #[test]
    fn split_with_marker() {
        let raw = format!("{PID}^cscl");
        assert_eq!(
            split_identifier(&raw).unwrap(),
            (PID.to_string(), "scl".to_string())
        );
        assert_eq!(
            split_identifier("S0001^c").unwrap(),
            ("S0001".to_string(), String::new())
        );
    }

    #[test]
    fn split_rejects_two_markers() {
        assert!(split_identifier("a^cb^cc").is_err());
    }

    #[test]
    fn pid_segments() {
        let pid = Pid::parse(PID).unwrap();
        assert_eq!(pid.issn_bucket(), "0001-3765");
        assert_eq!(pid.year(), "2020");
        assert_eq!(pid.article(), PID);
    }

    #[test]
    fn pid_with_sequence() {
        let pid = Pid::parse("S0011-8516202100010001000003").unwrap();
        assert_eq!(pid.article(), "S0011-85162021000100010");
        assert_eq!(pid.year(), "2021");
    }

    #[test]
    fn pid_wrong_length() {
        assert!(Pid::parse("S0001").is_err());
        assert!(Pid::parse("").is_err());
        assert!(Pid::parse("S0001-376520200001000012").is_err());
    }
}
