//! Pool introspection snapshots.
//!
//! A snapshot is captured in one piece under the pool lock and rendered
//! afterwards, so the plain-text and XML views never show a torn state.
//! The XML shape is a fixed wire format consumed by external monitoring
//! tooling; do not reorder its elements.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Point-in-time view of the whole pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Global worker cap.
    pub max: u32,
    /// Total workers in the pool.
    pub count: u32,
    /// Workers with at least one active session.
    pub active: u32,
    /// Workers with no active session.
    pub inactive: u32,
    /// Requests currently parked on the global queue.
    pub waiting_on_global_queue: u32,
    /// Per-application groups, ordered by application root.
    pub groups: Vec<GroupSnapshot>,
}

/// Snapshot of one application group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSnapshot {
    /// The application root identifying this group.
    pub app_root: String,
    /// Workers in list order (idle first).
    pub processes: Vec<ProcessSnapshot>,
}

/// Snapshot of one worker process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    /// OS process id.
    pub pid: u32,
    /// Active sessions at capture time.
    pub sessions: u32,
    /// Lifetime request count.
    pub processed: u64,
    /// Seconds since the worker was spawned.
    pub uptime_secs: u64,
}

impl PoolSnapshot {
    /// Render the operator-facing plain-text view.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("----------- General information -----------\n");
        let _ = writeln!(out, "max      = {}", self.max);
        let _ = writeln!(out, "count    = {}", self.count);
        let _ = writeln!(out, "active   = {}", self.active);
        let _ = writeln!(out, "inactive = {}", self.inactive);
        let _ = writeln!(out, "Waiting on global queue: {}", self.waiting_on_global_queue);
        out.push('\n');

        out.push_str("----------- Groups -----------\n");
        for group in &self.groups {
            let _ = writeln!(out, "{}:", group.app_root);
            for process in &group.processes {
                let _ = writeln!(
                    out,
                    "  PID: {:<5}   Sessions: {:<2}   Processed: {:<5}   Uptime: {}",
                    process.pid,
                    process.sessions,
                    process.processed,
                    format_uptime(process.uptime_secs)
                );
            }
            out.push('\n');
        }
        out
    }

    /// Render the structured XML view.
    ///
    /// `include_sensitive` adds the `<includes_sensitive_information/>`
    /// marker that monitoring endpoints key their redaction on.
    #[must_use]
    pub fn to_xml(&self, include_sensitive: bool) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"iso8859-1\" ?>\n");
        out.push_str("<info>");
        if include_sensitive {
            out.push_str("<includes_sensitive_information/>");
        }
        out.push_str("<groups>");
        for group in &self.groups {
            out.push_str("<group>");
            let _ = write!(out, "<name>{}</name>", escape_xml(&group.app_root));
            out.push_str("<processes>");
            for process in &group.processes {
                out.push_str("<process>");
                let _ = write!(out, "<pid>{}</pid>", process.pid);
                let _ = write!(out, "<sessions>{}</sessions>", process.sessions);
                let _ = write!(out, "<processed>{}</processed>", process.processed);
                let _ = write!(out, "<uptime>{}</uptime>", format_uptime(process.uptime_secs));
                out.push_str("</process>");
            }
            out.push_str("</processes>");
            out.push_str("</group>");
        }
        out.push_str("</groups>");
        out.push_str("</info>");
        out
    }
}

/// Render an uptime as `"2h 13m 5s"`, eliding units that have not been
/// reached yet.
pub(crate) fn format_uptime(total_secs: u64) -> String {
    let mut out = String::new();
    let mut seconds = total_secs;
    if seconds >= 60 {
        let mut minutes = seconds / 60;
        if minutes >= 60 {
            let hours = minutes / 60;
            minutes %= 60;
            let _ = write!(out, "{}h ", hours);
        }
        seconds %= 60;
        let _ = write!(out, "{}m ", minutes);
    }
    let _ = write!(out, "{}s", seconds);
    out
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PoolSnapshot {
        PoolSnapshot {
            max: 20,
            count: 2,
            active: 1,
            inactive: 1,
            waiting_on_global_queue: 0,
            groups: vec![GroupSnapshot {
                app_root: "/srv/shop&blog".to_string(),
                processes: vec![
                    ProcessSnapshot {
                        pid: 4021,
                        sessions: 0,
                        processed: 17,
                        uptime_secs: 59,
                    },
                    ProcessSnapshot {
                        pid: 4022,
                        sessions: 1,
                        processed: 3,
                        uptime_secs: 3661,
                    },
                ],
            }],
        }
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(0), "0s");
        assert_eq!(format_uptime(59), "59s");
        assert_eq!(format_uptime(60), "1m 0s");
        assert_eq!(format_uptime(61), "1m 1s");
        assert_eq!(format_uptime(3600), "1h 0m 0s");
        assert_eq!(format_uptime(3661), "1h 1m 1s");
        assert_eq!(format_uptime(7325), "2h 2m 5s");
    }

    #[test]
    fn xml_shape() {
        let xml = sample().to_xml(true);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"iso8859-1\" ?>\n<info>"));
        assert!(xml.contains("<includes_sensitive_information/>"));
        assert!(xml.contains("<name>/srv/shop&amp;blog</name>"));
        assert!(xml.contains(
            "<process><pid>4021</pid><sessions>0</sessions><processed>17</processed><uptime>59s</uptime></process>"
        ));
        assert!(xml.ends_with("</groups></info>"));
    }

    #[test]
    fn xml_omits_the_sensitive_marker_on_request() {
        let xml = sample().to_xml(false);
        assert!(!xml.contains("<includes_sensitive_information/>"));
    }

    #[test]
    fn text_rendering_lists_every_process() {
        let text = sample().render_text();
        assert!(text.contains("max      = 20"));
        assert!(text.contains("count    = 2"));
        assert!(text.contains("/srv/shop&blog:"));
        assert!(text.contains("PID: 4021"));
        assert!(text.contains("Uptime: 1h 1m 1s"));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let snapshot = sample();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: PoolSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.count, 2);
        assert_eq!(back.groups[0].processes.len(), 2);
    }
}
