//! Open-mode parsing (`rb`, `w`, `at`, ...).

use crate::error::{FsError, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Append,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenMode {
    pub access: Access,
    pub text: bool,
}

impl OpenMode {
    pub const READ: OpenMode = OpenMode {
        access: Access::Read,
        text: false,
    };
    pub const WRITE: OpenMode = OpenMode {
        access: Access::Write,
        text: false,
    };

    pub fn is_read(&self) -> bool {
        self.access == Access::Read
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self> {
        let mut access = None;
        let mut text = None;
        for c in s.chars() {
            match c {
                'r' | 'w' | 'a' if access.is_none() => {
                    access = Some(match c {
                        'r' => Access::Read,
                        'w' => Access::Write,
                        _ => Access::Append,
                    })
                }
                'b' | 't' if text.is_none() => text = Some(c == 't'),
                '+' => {
                    return Err(FsError::Unsupported(format!(
                        "mixed read/write mode `{s}`"
                    )));
                }
                _ => return Err(FsError::InvalidMode(s.to_string())),
            }
        }
        let access = access.ok_or_else(|| FsError::InvalidMode(s.to_string()))?;
        Ok(OpenMode {
            access,
            text: text.unwrap_or(false),
        })
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = match self.access {
            Access::Read => 'r',
            Access::Write => 'w',
            Access::Append => 'a',
        };
        write!(f, "{a}{}", if self.text { 't' } else { 'b' })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("rb".parse::<OpenMode>().unwrap(), OpenMode::READ);
        assert_eq!("r".parse::<OpenMode>().unwrap(), OpenMode::READ);
        assert_eq!("wb".parse::<OpenMode>().unwrap(), OpenMode::WRITE);
        let m: OpenMode = "wt".parse().unwrap();
        assert!(m.text);
        assert_eq!(m.to_string(), "wt");
        assert_eq!("ab".parse::<OpenMode>().unwrap().access, Access::Append);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("".parse::<OpenMode>(), Err(FsError::InvalidMode(_))));
        assert!(matches!("rw".parse::<OpenMode>(), Err(FsError::InvalidMode(_))));
        assert!(matches!("bt".parse::<OpenMode>(), Err(FsError::InvalidMode(_))));
        assert!(matches!("x".parse::<OpenMode>(), Err(FsError::InvalidMode(_))));
        assert!(matches!("r+b".parse::<OpenMode>(), Err(FsError::Unsupported(_))));
    }
}
