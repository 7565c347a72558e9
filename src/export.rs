//! CSV serialization of event listings.
//!
//! Output uses a fixed header row, quotes every field, doubles embedded
//! quotes, and separates records with `\n`. The header is written even when
//! no rows match.

use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::repositories::EventRecord;

/// Column headings: time, location, type, risk level, status, camera, algorithm, description
pub const EVENT_CSV_HEADER: [&str; 8] = [
    "时间",
    "位置",
    "类型",
    "风险等级",
    "状态",
    "相机",
    "算法",
    "描述",
];

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Writes the header and one line per event, returning the number of data rows
pub fn write_events_csv<W: Write>(out: &mut W, events: &[EventRecord]) -> io::Result<usize> {
    out.write_all(EVENT_CSV_HEADER.join(",").as_bytes())?;

    for record in events {
        let time = record
            .event
            .time
            .to_rfc3339_opts(SecondsFormat::AutoSi, true);
        let fields = [
            time.as_str(),
            record.event.location.as_str(),
            record.event.kind.as_str(),
            record.event.risk_level.as_str(),
            record.event.status.as_str(),
            record.camera.as_ref().map(|c| c.name.as_str()).unwrap_or(""),
            record
                .algorithm
                .as_ref()
                .map(|a| a.name.as_str())
                .unwrap_or(""),
            record.event.description.as_deref().unwrap_or(""),
        ];

        out.write_all(b"\n")?;
        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                out.write_all(b",")?;
            }
            write_quoted(out, field)?;
        }
    }

    Ok(events.len())
}

/// Renders the CSV document into a string
pub fn events_to_csv(events: &[EventRecord]) -> String {
    let mut buffer = Vec::new();
    // Writing to a Vec cannot fail
    let _ = write_events_csv(&mut buffer, events);
    String::from_utf8(buffer).unwrap_or_default()
}

/// `events_<timestamp>.csv`, safe for use in a Content-Disposition header
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("events_{}.csv", now.format("%Y-%m-%dT%H-%M-%SZ"))
}

fn write_quoted<W: Write>(out: &mut W, field: &str) -> io::Result<()> {
    out.write_all(b"\"")?;
    out.write_all(field.replace('"', "\"\"").as_bytes())?;
    out.write_all(b"\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event_log;
    use crate::repositories::event_log::{AlgorithmRef, CameraRef};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn record(description: Option<&str>, with_refs: bool) -> EventRecord {
        let time = Utc.with_ymd_and_hms(2025, 1, 6, 8, 30, 0).unwrap();
        EventRecord {
            event: event_log::Model {
                id: Uuid::new_v4(),
                time: time.into(),
                location: "G4 K1203+500".to_string(),
                kind: "Congestion".to_string(),
                risk_level: "high".to_string(),
                status: "pending".to_string(),
                camera_id: None,
                algorithm_id: None,
                description: description.map(str::to_string),
                snapshot_url: None,
                created_at: time.into(),
                updated_at: time.into(),
            },
            camera: with_refs.then(|| CameraRef {
                name: "Cam 7".to_string(),
                location: "North gate".to_string(),
            }),
            algorithm: with_refs.then(|| AlgorithmRef {
                name: "Jam detector".to_string(),
            }),
        }
    }

    #[test]
    fn empty_export_still_has_header() {
        let csv = events_to_csv(&[]);
        assert_eq!(csv, "时间,位置,类型,风险等级,状态,相机,算法,描述");
    }

    #[test]
    fn one_line_per_event_with_all_fields_quoted() {
        let csv = events_to_csv(&[record(Some("slow traffic"), true), record(None, false)]);
        let lines: Vec<&str> = csv.split('\n').collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "\"2025-01-06T08:30:00Z\",\"G4 K1203+500\",\"Congestion\",\"high\",\"pending\",\"Cam 7\",\"Jam detector\",\"slow traffic\""
        );
        assert_eq!(
            lines[2],
            "\"2025-01-06T08:30:00Z\",\"G4 K1203+500\",\"Congestion\",\"high\",\"pending\",\"\",\"\",\"\""
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let csv = events_to_csv(&[record(Some("driver said \"help\", then left"), false)]);
        assert!(csv.ends_with("\"driver said \"\"help\"\", then left\""));
    }

    #[test]
    fn embedded_newlines_stay_inside_quotes() {
        let mut out = Vec::new();
        let rows = write_events_csv(&mut out, &[record(Some("line one\nline two"), false)]).unwrap();
        assert_eq!(rows, 1);
        let csv = String::from_utf8(out).unwrap();
        assert!(csv.contains("\"line one\nline two\""));
    }

    #[test]
    fn filename_has_no_header_unsafe_characters() {
        let now = Utc.with_ymd_and_hms(2025, 1, 6, 8, 30, 5).unwrap();
        assert_eq!(export_filename(now), "events_2025-01-06T08-30-05Z.csv");
    }
}
