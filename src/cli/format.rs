//! Output formatting for console display.

use std::collections::BTreeMap;

use crate::history::{Cursor, HistoryLog};
use crate::model::{Candidate, Task, WorldState};
use crate::session::{Notice, Pin, Session, SessionError, Status};

/// One-line summary of where the session stands.
///
/// e.g. `[ACCEPT] target · step 2/3 · target #1 (3/6 steps)`
pub(super) fn format_status(session: &Session) -> String {
    let history = session.history();
    let task = match session.task() {
        Task::World => "world",
        Task::Target => "target",
    };
    let mut line = format!(
        "[{}] {task} · step {}/{}",
        session.status_kind(),
        history.current_index(),
        history.len() - 1
    );
    if history.is_time_travelling() {
        line.push_str(" (time travelling)");
    }
    if let (Some(puzzle), Some(max)) = (session.puzzle(), session.max_steps()) {
        line.push_str(&format!(
            " · target #{} ({}/{max} steps)",
            puzzle.target_id,
            history.resolve().step + 1
        ));
        if session.is_won() {
            line.push_str(" · solved");
        }
    }
    if let Status::Define(state) = session.status() {
        line.push_str(&format!(" · defining \"{}\"", state.command()));
        if !state.phrase().is_empty() {
            line.push_str(&format!(" as \"{}\"", state.phrase()));
        }
        if state.is_pending() {
            line.push_str(" (sent)");
        }
    }
    if !session.pins().is_empty() {
        line.push_str(&format!(" · {} pinned", session.pins().len()));
    }
    if let Some(error) = session.parser_error() {
        line.push_str(&format!(" · parser down: {error}"));
    }
    line
}

/// The candidate list while accepting, with the selection marked.
pub(super) fn format_candidates(status: &Status) -> Vec<String> {
    let Status::Accept {
        command,
        candidates,
        selected,
    } = status
    else {
        return Vec::new();
    };

    let mut lines = vec![format!("\"{command}\": {} interpretation(s)", candidates.len())];
    for (i, candidate) in candidates.iter().enumerate() {
        let marker = if i == *selected { '>' } else { ' ' };
        lines.push(format!("{marker} {}. {}", i + 1, describe_candidate(candidate)));
    }
    lines
}

fn describe_candidate(candidate: &Candidate) -> String {
    let mut text = if candidate.pretty_string.is_empty() {
        "(no description)".to_string()
    } else {
        candidate.pretty_string.clone()
    };
    if candidate.error {
        text.push_str(" [error]");
    }
    if let Some(status) = candidate.status_message() {
        text.push_str(&format!(" ({status})"));
    }
    text
}

/// Every history entry, newest last, with the cursor marked.
pub(super) fn format_history(history: &HistoryLog) -> Vec<String> {
    let current = history.current_index();
    history
        .entries()
        .iter()
        .map(|entry| {
            let marker = if entry.step == current { '>' } else { ' ' };
            let command = entry.command.as_deref().unwrap_or("(start)");
            let from_latest = history.len() - 1 - entry.step;
            format!(
                "{marker} {:>3}  {command}  [{} blocks, back {from_latest}, #{}]",
                entry.step,
                entry.world.len(),
                entry.serial
            )
        })
        .collect()
}

/// Commands the parser did not understand, oldest first.
pub(super) fn format_pins(pins: &[Pin]) -> Vec<String> {
    pins.iter()
        .map(|pin| {
            format!(
                "  pin  {}  [after step {}, {}]",
                pin.command,
                pin.at_len.saturating_sub(1),
                pin.pinned_at.strftime("%H:%M:%S")
            )
        })
        .collect()
}

/// Block count per color, plus the robot.
///
/// e.g. `3 blocks (red 2, yellow 1), robot at (0, 0, 0) facing North`
pub(super) fn format_world(world: &WorldState) -> String {
    if world.is_empty() {
        return format!("empty, {}", format_pose(world));
    }
    let mut colors: BTreeMap<String, usize> = BTreeMap::new();
    for voxel in world.voxels() {
        *colors.entry(voxel.color).or_default() += 1;
    }
    let counts = colors
        .iter()
        .map(|(color, n)| format!("{color} {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} blocks ({counts}), {}", world.len(), format_pose(world))
}

fn format_pose(world: &WorldState) -> String {
    let robot = &world.robot;
    format!(
        "robot at ({}, {}, {}) facing {:?}",
        robot.position.x, robot.position.y, robot.position.z, robot.facing
    )
}

pub(super) fn format_notice(notice: &Notice) -> String {
    match notice {
        Notice::Pinned { command } => {
            format!("Pinned \"{command}\": not understood. Try rephrasing, or :define it.")
        }
        Notice::CandidateStatus(status) => status.clone(),
        Notice::DefineRequested(reason) => format!("Please define this command: {reason}"),
        Notice::Defined { command, phrase } => {
            format!("Defined \"{command}\" as \"{phrase}\"")
        }
        Notice::Requeued(command) => format!("\"{command}\" is back in the command buffer"),
        Notice::TargetDrawn {
            target_id,
            max_steps,
        } => format!("Target #{target_id}: build it in at most {max_steps} steps"),
        Notice::Won { steps } => format!("Target reached in {steps} step(s)!"),
    }
}

pub(super) fn format_error(error: &SessionError) -> String {
    format!("error: {error}")
}

pub(super) fn format_suggestions(suggestions: &[String]) -> Vec<String> {
    suggestions.iter().map(|s| format!("  · {s}")).collect()
}

/// Cursor position as shown in `:history`.
pub(super) fn describe_cursor(cursor: Cursor) -> String {
    match cursor {
        Cursor::Latest => "latest".to_string(),
        Cursor::At(i) => format!("step {i}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::interpret::{InterpretError, SessionContext};
    use crate::session::Effect;
    use crate::model::{CandidateValue, RobotPose, Voxel};

    fn candidate(pretty: &str, status: &str, error: bool) -> Candidate {
        Candidate {
            value: CandidateValue::Blocks(vec![]),
            pretty_string: pretty.to_string(),
            status: status.to_string(),
            error,
            path: vec![],
        }
    }

    #[test]
    fn world_summary_counts_colors() {
        let world = WorldState::from_voxels(
            [
                Voxel::new(0, 0, 0, "red"),
                Voxel::new(1, 0, 0, "red"),
                Voxel::new(2, 0, 0, "yellow"),
            ],
            RobotPose::default(),
        );
        assert_eq!(
            format_world(&world),
            "3 blocks (red 2, yellow 1), robot at (0, 0, 0) facing North"
        );
    }

    #[test]
    fn empty_world_summary() {
        assert!(format_world(&WorldState::empty()).starts_with("empty, robot at"));
    }

    #[test]
    fn candidates_mark_selection_and_errors() {
        let status = Status::Accept {
            command: "add red".into(),
            candidates: vec![
                candidate("add red", "", false),
                candidate("add red top", "out of bounds", true),
            ],
            selected: 1,
        };

        let lines = format_candidates(&status);
        assert_eq!(lines[0], "\"add red\": 2 interpretation(s)");
        assert_eq!(lines[1], "  1. add red");
        assert_eq!(lines[2], "> 2. add red top [error] (out of bounds)");
    }

    #[test]
    fn candidates_empty_outside_accept() {
        assert!(format_candidates(&Status::Try).is_empty());
    }

    #[test]
    fn history_marks_cursor() {
        let mut history = HistoryLog::new(WorldState::empty());
        history.append("add red", WorldState::empty(), vec![]);
        history.undo();

        let lines = format_history(&history);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(">   0  (start)"));
        assert!(lines[1].contains("add red"));
        assert_eq!(describe_cursor(history.cursor()), "step 0");
    }

    #[test]
    fn status_line_for_fresh_session() {
        let session = Session::new(
            SessionContext {
                session_id: "format-test".into(),
            },
            WorldState::empty(),
            ChaCha8Rng::seed_from_u64(5),
        );
        assert_eq!(format_status(&session), "[TRY] world · step 0/0");
    }

    #[test]
    fn status_line_flags_a_parser_failure() {
        let mut session = Session::new(
            SessionContext {
                session_id: "format-test".into(),
            },
            WorldState::empty(),
            ChaCha8Rng::seed_from_u64(5),
        );
        let effects = session.submit("add red").unwrap();
        let Some(Effect::Interpret { ticket, .. }) = effects.first() else {
            panic!("expected a parse request, got {effects:?}");
        };
        session
            .on_interpreted(*ticket, Err(InterpretError::Status(502)))
            .unwrap();

        let line = format_status(&session);
        assert!(line.starts_with("[TRY] world · step 0/0 · parser down: "));
        assert!(line.contains("502"));
    }

    #[test]
    fn pins_show_where_they_were_made() {
        let pins = [Pin {
            command: "make it pretty".into(),
            at_len: 3,
            pinned_at: Timestamp::UNIX_EPOCH,
        }];
        let lines = format_pins(&pins);
        assert_eq!(lines, vec!["  pin  make it pretty  [after step 2, 00:00:00]"]);
    }

    #[test]
    fn notices_read_as_sentences() {
        assert_eq!(
            format_notice(&Notice::Won { steps: 3 }),
            "Target reached in 3 step(s)!"
        );
        assert!(
            format_notice(&Notice::Pinned {
                command: "foo".into()
            })
            .contains(":define")
        );
    }
}
