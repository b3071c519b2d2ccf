//! Placing phone calls to leads

use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialError {
    #[error("Phone number missing")]
    MissingNumber,

    #[error("Calling not supported on this device")]
    Unsupported,

    #[error("Call could not be started: {0}")]
    Failed(String),
}

impl DialError {
    /// Alert title and body shown to the user
    pub fn alert(&self) -> (&'static str, &'static str) {
        match self {
            DialError::MissingNumber => (
                "Phone number not available",
                "This lead cannot be called.",
            ),
            DialError::Unsupported => ("Device not supported", "Unable to place the call."),
            DialError::Failed(_) => ("Error", "Unable to place the call."),
        }
    }
}

/// Platform hook that hands a `tel:` URI to the phone app
pub trait Dialer: Send + Sync {
    fn can_open(&self, uri: &str) -> bool;

    fn open(&self, uri: &str) -> Result<(), String>;
}

/// `tel:` URI with all whitespace removed from the number
pub fn dial_uri(phone: Option<&str>) -> Result<String, DialError> {
    let digits: String = phone
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if digits.is_empty() {
        return Err(DialError::MissingNumber);
    }
    Ok(format!("tel:{}", digits))
}

pub fn place_call(phone: Option<&str>, dialer: &dyn Dialer) -> Result<String, DialError> {
    let uri = dial_uri(phone)?;

    if !dialer.can_open(&uri) {
        return Err(DialError::Unsupported);
    }
    dialer.open(&uri).map_err(DialError::Failed)?;

    tracing::info!("Handed call to the system dialer");
    Ok(uri)
}

const NO_ARGS: &[&str] = &[];
const WINDOWS_START_ARGS: &[&str] = &["/C", "start", ""];

/// Opens `tel:` URIs with the desktop URL handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDialer;

impl SystemDialer {
    fn opener() -> Option<(&'static str, &'static [&'static str])> {
        if cfg!(target_os = "macos") {
            Some(("open", NO_ARGS))
        } else if cfg!(target_os = "windows") {
            Some(("cmd", WINDOWS_START_ARGS))
        } else if cfg!(target_os = "linux") {
            Some(("xdg-open", NO_ARGS))
        } else {
            None
        }
    }
}

impl Dialer for SystemDialer {
    fn can_open(&self, uri: &str) -> bool {
        uri.starts_with("tel:") && Self::opener().is_some()
    }

    fn open(&self, uri: &str) -> Result<(), String> {
        let (program, args) = Self::opener().ok_or_else(|| "no URL handler".to_string())?;
        Command::new(program)
            .args(args)
            .arg(uri)
            .spawn()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingDialer {
        supported: bool,
        fail: bool,
        opened: Mutex<Vec<String>>,
    }

    impl RecordingDialer {
        fn new(supported: bool, fail: bool) -> Self {
            Self {
                supported,
                fail,
                opened: Mutex::new(Vec::new()),
            }
        }
    }

    impl Dialer for RecordingDialer {
        fn can_open(&self, _uri: &str) -> bool {
            self.supported
        }

        fn open(&self, uri: &str) -> Result<(), String> {
            if self.fail {
                return Err("activity not found".to_string());
            }
            self.opened.lock().unwrap().push(uri.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_dial_uri_strips_whitespace() {
        assert_eq!(dial_uri(Some("090 123 4567")).unwrap(), "tel:0901234567");
        assert_eq!(dial_uri(Some("+84\t90 1234")).unwrap(), "tel:+84901234");
    }

    #[test]
    fn test_dial_uri_missing() {
        assert_eq!(dial_uri(None), Err(DialError::MissingNumber));
        assert_eq!(dial_uri(Some("   ")), Err(DialError::MissingNumber));
    }

    #[test]
    fn test_place_call() {
        let dialer = RecordingDialer::new(true, false);
        assert_eq!(place_call(Some("0901 234"), &dialer).unwrap(), "tel:0901234");
        assert_eq!(*dialer.opened.lock().unwrap(), vec!["tel:0901234".to_string()]);

        let unsupported = RecordingDialer::new(false, false);
        assert_eq!(
            place_call(Some("0901"), &unsupported),
            Err(DialError::Unsupported)
        );

        let broken = RecordingDialer::new(true, true);
        let err = place_call(Some("0901"), &broken).unwrap_err();
        assert_eq!(err.alert().0, "Error");
    }
}
