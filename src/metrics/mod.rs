use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated by the hub while it runs.
#[derive(Debug, Default, Clone)]
pub struct HubMetrics {
    frames: u64,
    keys: u64,
    keys_cancelled: u64,
    layout_refreshes: u64,
    resizes: u64,
}

impl HubMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    pub fn record_key(&mut self, cancelled: bool) {
        self.keys = self.keys.saturating_add(1);
        if cancelled {
            self.keys_cancelled = self.keys_cancelled.saturating_add(1);
        }
    }

    pub fn record_layout_refresh(&mut self) {
        self.layout_refreshes = self.layout_refreshes.saturating_add(1);
    }

    pub fn record_resize(&mut self) {
        self.resizes = self.resizes.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            frames: self.frames,
            keys: self.keys,
            keys_cancelled: self.keys_cancelled,
            layout_refreshes: self.layout_refreshes,
            resizes: self.resizes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub frames: u64,
    pub keys: u64,
    pub keys_cancelled: u64,
    pub layout_refreshes: u64,
    pub resizes: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("frames".to_string(), json!(self.frames));
        map.insert("keys".to_string(), json!(self.keys));
        map.insert("keys_cancelled".to_string(), json!(self.keys_cancelled));
        map.insert(
            "layout_refreshes".to_string(),
            json!(self.layout_refreshes),
        );
        map.insert("resizes".to_string(), json!(self.resizes));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "hub_metrics", self.as_fields())
    }
}
