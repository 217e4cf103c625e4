use std::fmt;

/// Host environment the opener runs in. Chosen once per open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// Web build: fetch and hand the bytes to a save-as download.
    Browser,
    /// Android-like: cache locally, open with a view intent, share as fallback.
    Android,
    /// iOS-like: cache locally, open through the share sheet only.
    Ios,
    Unsupported(String),
}

impl Platform {
    /// Platform for the compile target.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Browser
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Unsupported(std::env::consts::OS.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Platform::Browser => "browser",
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Unsupported(name) => name.as_str(),
        }
    }

    /// Parse a platform name; `auto` means [`Platform::detect`].
    pub fn parse_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Platform::detect(),
            "browser" | "web" => Platform::Browser,
            "android" => Platform::Android,
            "ios" => Platform::Ios,
            other => Platform::Unsupported(other.to_string()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_str_known_names() {
        assert_eq!(Platform::parse_str("browser"), Platform::Browser);
        assert_eq!(Platform::parse_str("Web"), Platform::Browser);
        assert_eq!(Platform::parse_str("android"), Platform::Android);
        assert_eq!(Platform::parse_str(" IOS "), Platform::Ios);
        assert_eq!(
            Platform::parse_str("windows"),
            Platform::Unsupported("windows".into())
        );
        assert_eq!(Platform::parse_str("auto"), Platform::detect());
    }

    #[test]
    fn detect_on_host_is_unsupported() {
        // Tests run on a desktop target.
        assert!(matches!(Platform::detect(), Platform::Unsupported(_)));
    }

    #[test]
    fn display_uses_platform_name() {
        assert_eq!(format!("{}", Platform::Android), "android");
        assert_eq!(format!("{}", Platform::Ios), "ios");
        assert_eq!(format!("{}", Platform::Unsupported("linux".into())), "linux");
    }
}
