//! Alert classification: type and severity labels.

define_label_enum! {
    /// Alert severity. Variants are declared in ascending order, so the
    /// derived `Ord` gives the total order used for display and filtering.
    Severity ("severity") {
        Low = "LOW",
        Medium = "MEDIUM",
        High = "HIGH",
        Critical = "CRITICAL",
    }
}

define_label_enum! {
    /// The abnormal condition an alert reports.
    ///
    /// At most one unresolved alert of each type may exist per kiosk.
    AlertType ("alert type") {
        HighCpu = "HIGH_CPU",
        HighMemory = "HIGH_MEMORY",
        HighDisk = "HIGH_DISK",
        KioskOffline = "KIOSK_OFFLINE",
    }
}

/// Maximum rows returned by the alert list.
pub const ALERT_LIST_LIMIT: i64 = 100;

/// Resolver identity recorded when a recovery heartbeat auto-resolves an
/// offline alert.
pub const RECOVERY_RESOLVER: &str = "system:recovery";

/// Human-readable message for a kiosk swept offline.
pub fn offline_message(device_id: &str) -> String {
    format!("Kiosk {device_id} has gone offline")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_totally_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::ALL.iter().max(), Some(&Severity::Critical));
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!(" High ".parse::<Severity>().unwrap(), Severity::High);
        assert!("SEVERE".parse::<Severity>().is_err());
    }

    #[test]
    fn alert_type_labels_match_wire_format() {
        assert_eq!(AlertType::KioskOffline.as_str(), "KIOSK_OFFLINE");
        let json = serde_json::to_value(AlertType::HighCpu).unwrap();
        assert_eq!(json, "HIGH_CPU");
        let parsed: AlertType = serde_json::from_value("HIGH_DISK".into()).unwrap();
        assert_eq!(parsed, AlertType::HighDisk);
    }

    #[test]
    fn offline_message_names_the_device() {
        assert_eq!(offline_message("KIOSK_07"), "Kiosk KIOSK_07 has gone offline");
    }
}
