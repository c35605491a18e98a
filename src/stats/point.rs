use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MEASUREMENT_EVENTS: &str = "karrot.events";
pub const MEASUREMENT_GROUP_APPLICATIONS: &str = "karrot.group.applications";

/// One time-series sample: `{measurement, tags, fields}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, i64>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.tags.insert(key.into(), value.to_string());
        self
    }

    pub fn tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: i64) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// InfluxDB line protocol, integers suffixed with `i`
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);
        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape(key, &[',', '=', ' ']));
            line.push('=');
            line.push_str(&escape(value, &[',', '=', ' ']));
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={}i", escape(key, &[',', '=', ' ']), value))
            .collect();
        line.push(' ');
        line.push_str(&fields.join(","));
        line
    }
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_line_protocol() {
        let point = Point::new(MEASUREMENT_EVENTS)
            .tag("group", 12)
            .tag("group_status", "active")
            .field("application_pending", 1);

        assert_eq!(
            point.to_line_protocol(),
            "karrot.events,group=12,group_status=active application_pending=1i"
        );
    }

    #[test]
    fn escapes_special_characters() {
        let point = Point::new("my measurement")
            .tag("name", "a=b,c d")
            .field("count", -3);

        assert_eq!(
            point.to_line_protocol(),
            "my\\ measurement,name=a\\=b\\,c\\ d count=-3i"
        );
    }
}
