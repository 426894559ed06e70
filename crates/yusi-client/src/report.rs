//! Text rendering for a completed room's situation report.
//!
//! Stateless given the report payload; frontends print the lines however
//! they like.

use thiserror::Error;

use yusi_core::model::{Room, RoomStatus, SituationReport};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Completed status implies every member has a submission; refuse to
    /// render against a room that violates that.
    #[error("room is not completed with all submissions in; report withheld")]
    Incomplete,
}

/// Render the report as display lines.
pub fn render_report(report: &SituationReport, room: &Room) -> Result<Vec<String>, ReportError> {
    if room.status != RoomStatus::Completed || !room.all_submitted() {
        return Err(ReportError::Incomplete);
    }

    let mut lines = Vec::new();
    lines.push(format!("Situation report for room {}", room.code));
    if let Some(scenario) = &room.scenario {
        lines.push(format!("Scenario: {}", scenario.title));
    }

    if !report.personal.is_empty() {
        lines.push(String::new());
        lines.push("Character sketches".to_string());
        for sketch in &report.personal {
            lines.push(format!("  {}: {}", sketch.user_name, sketch.sketch));
        }
    }

    if !report.pairs.is_empty() {
        lines.push(String::new());
        lines.push("Pair compatibility".to_string());
        for pair in &report.pairs {
            let a = room.member_name(&pair.user_a);
            let b = room.member_name(&pair.user_b);
            lines.push(format!("  {a} + {b}: {}/100 - {}", pair.score, pair.rationale));
        }
    }

    if !report.public_submissions.is_empty() {
        lines.push(String::new());
        lines.push("Shared narratives".to_string());
        for sub in &report.public_submissions {
            lines.push(format!("  {} wrote: {}", sub.user_name, sub.narrative));
        }
    }

    Ok(lines)
}
