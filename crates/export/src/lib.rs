//! Export helpers for event-table reports.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

/// One snap-table slot of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub event: String,
    pub label: String,
    pub enabled: bool,
    /// Absent when the event does not exist for the node's patch.
    pub ut_s: Option<f64>,
    pub countdown: String,
}

/// Event table of one maneuver node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    /// 1-based position in the flight plan.
    pub index: usize,
    pub node_id: u64,
    pub ut_s: f64,
    /// Radial, normal, prograde (m/s).
    pub delta_v_m_s: [f64; 3],
    pub delta_v_total_m_s: f64,
    pub events: Vec<EventRow>,
}

/// Everything the CLI reports for a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventReport {
    pub scenario: String,
    pub body: String,
    pub now_s: f64,
    pub target: Option<String>,
    pub nodes: Vec<NodeReport>,
}

pub mod json {
    use std::io::{self, Write};

    use super::EventReport;

    pub fn write_report(writer: &mut dyn Write, report: &EventReport) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, report)?;
        writeln!(writer)
    }
}

pub mod csv {
    use std::io::{self, Write};

    use super::{EventReport, EventRow, NodeReport};

    const HEADER: &str =
        "scenario,node_index,node_id,node_ut_s,dv_radial_m_s,dv_normal_m_s,dv_prograde_m_s,dv_total_m_s,event,enabled,event_ut_s,countdown";

    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// One line per node and event, header included.
    pub fn write_report(writer: &mut dyn Write, report: &EventReport) -> io::Result<()> {
        write_header(writer)?;
        for node in &report.nodes {
            for row in &node.events {
                write_row(writer, &report.scenario, node, row)?;
            }
        }
        Ok(())
    }

    fn write_row(writer: &mut dyn Write, scenario: &str, node: &NodeReport, row: &EventRow) -> io::Result<()> {
        let event_ut = row.ut_s.map(|ut| format!("{ut:.3}")).unwrap_or_default();
        writeln!(
            writer,
            "{},{},{},{:.3},{:.6},{:.6},{:.6},{:.6},{},{},{},{}",
            escape(scenario),
            node.index,
            node.node_id,
            node.ut_s,
            node.delta_v_m_s[0],
            node.delta_v_m_s[1],
            node.delta_v_m_s[2],
            node.delta_v_total_m_s,
            row.event,
            if row.enabled { "true" } else { "false" },
            event_ut,
            escape(&row.countdown),
        )
    }

    fn escape(field: &str) -> String {
        if field.contains([',', '"', '\n']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> EventReport {
        EventReport {
            scenario: "low orbit, eccentric".into(),
            body: "Kerbin".into(),
            now_s: 0.0,
            target: None,
            nodes: vec![NodeReport {
                index: 1,
                node_id: 7,
                ut_s: 120.0,
                delta_v_m_s: [0.0, 0.0, 25.0],
                delta_v_total_m_s: 25.0,
                events: vec![
                    EventRow {
                        event: "apoapsis".into(),
                        label: "Apoapsis".into(),
                        enabled: true,
                        ut_s: Some(300.0),
                        countdown: "3m 0s".into(),
                    },
                    EventRow {
                        event: "closest_approach".into(),
                        label: "Closest approach".into(),
                        enabled: false,
                        ut_s: None,
                        countdown: String::new(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn csv_has_one_line_per_event() {
        let mut out = Vec::new();
        csv::write_report(&mut out, &report()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("scenario,node_index"));
        assert!(lines[1].starts_with("\"low orbit, eccentric\",1,7,120.000"));
        assert!(lines[1].contains(",apoapsis,true,300.000,3m 0s"));
        assert!(lines[2].ends_with(",closest_approach,false,,"));
    }

    #[test]
    fn json_keeps_missing_times_as_null() {
        let mut out = Vec::new();
        json::write_report(&mut out, &report()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["nodes"][0]["events"][0]["ut_s"], 300.0);
        assert!(value["nodes"][0]["events"][1]["ut_s"].is_null());
    }

    #[test]
    fn writer_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/out.csv");
        {
            let mut writer = writer_for_path(&path).unwrap();
            csv::write_header(&mut *writer).unwrap();
        }
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("scenario,"));
    }
}
