//! Session header written at the top of every fresh log file

use chrono::{DateTime, Local};

use crate::config::SessionInfo;

use super::clock::format_timestamp;

const RULE: &str = "========================================";

/// Renders the banner that opens a new, rotated or cleared log file
#[derive(Debug, Clone)]
pub struct SessionHeader {
    info: SessionInfo,
}

impl SessionHeader {
    pub fn new(info: SessionInfo) -> Self {
        Self { info }
    }

    /// Header text, ending with a blank line
    pub fn render(&self, started: &DateTime<Local>) -> String {
        let info = &self.info;
        let mut out = String::with_capacity(256);
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("{} Log File\n", info.product));
        out.push_str(&format!("Started: {}\n", format_timestamp(started)));
        out.push_str(&format!("App Version: {}\n", info.app_version));
        out.push_str(&format!(
            "Platform Version: {} (API {})\n",
            info.platform_version, info.api_level
        ));
        out.push_str(&format!("Device: {} {}\n", info.manufacturer, info.model));
        out.push_str(RULE);
        out.push_str("\n\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_header() {
        let header = SessionHeader::new(SessionInfo {
            product: "YAM Launcher".to_string(),
            app_version: "1.4.2".to_string(),
            platform_version: "14".to_string(),
            api_level: 34,
            manufacturer: "Google".to_string(),
            model: "Pixel 8".to_string(),
        });
        let started = Local.with_ymd_and_hms(2026, 1, 21, 9, 5, 0).unwrap();

        let expected = "========================================\n\
                        YAM Launcher Log File\n\
                        Started: 2026-01-21 09:05:00.000\n\
                        App Version: 1.4.2\n\
                        Platform Version: 14 (API 34)\n\
                        Device: Google Pixel 8\n\
                        ========================================\n\
                        \n";
        assert_eq!(header.render(&started), expected);
    }
}
