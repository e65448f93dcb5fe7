//! System event labels for the `system_events` audit trail.

define_label_enum! {
    /// Kind of audit entry appended for a kiosk.
    SystemEventType ("system event type") {
        /// A heartbeat was accepted.
        Heartbeat = "HEARTBEAT",
        /// The kiosk moved between ONLINE and OFFLINE.
        StatusChange = "STATUS_CHANGE",
        /// A new alert row was opened.
        AlertOpened = "ALERT_OPENED",
        /// An alert was resolved by an operator or by policy.
        AlertResolved = "ALERT_RESOLVED",
    }
}
