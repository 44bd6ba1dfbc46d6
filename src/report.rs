//! Event tables of every node in a scenario, in exportable form.

use maneuver_editor::{Editor, EditorError, SnapTable};
use maneuver_export::{EventReport, EventRow, NodeReport};
use maneuver_orbits::OrbitModel;

use crate::scenario::Scenario;

/// Attach the editor to each node in turn and capture its snap table.
///
/// The editor is left detached afterwards.
pub fn event_report(scenario: &Scenario, editor: &mut Editor) -> Result<EventReport, EditorError> {
    let model = &scenario.model;
    let mut nodes = Vec::with_capacity(model.nodes().len());
    for (index, node) in model.nodes().iter().enumerate() {
        editor.attach(model, index)?;
        let table = editor
            .status(model)
            .snap_table
            .unwrap_or_else(SnapTable::unavailable);
        nodes.push(NodeReport {
            index: index + 1,
            node_id: node.id.0,
            ut_s: node.ut,
            delta_v_m_s: node.delta_v,
            delta_v_total_m_s: node.magnitude(),
            events: rows(&table),
        });
    }
    if editor.controller().is_active() {
        editor.detach()?;
    }

    Ok(EventReport {
        scenario: scenario.name.clone(),
        body: model.body().name.clone(),
        now_s: model.now(),
        target: scenario.target.as_ref().map(|t| t.name.clone()),
        nodes,
    })
}

pub fn rows(table: &SnapTable) -> Vec<EventRow> {
    table
        .slots
        .iter()
        .map(|slot| EventRow {
            event: slot.kind.key().to_string(),
            label: slot.kind.label().to_string(),
            enabled: slot.enabled,
            ut_s: slot.enabled.then_some(slot.ut),
            countdown: slot.countdown.clone(),
        })
        .collect()
}
