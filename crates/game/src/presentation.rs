use glam::Vec3;

use crate::control::{ControlPointId, ControlPointState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Gray,
    Red,
    Blue,
    Yellow,
}

impl Color {
    pub fn rgb(self) -> Vec3 {
        match self {
            Self::Gray => Vec3::new(0.5, 0.5, 0.5),
            Self::Red => Vec3::new(0.9, 0.1, 0.1),
            Self::Blue => Vec3::new(0.1, 0.3, 0.9),
            Self::Yellow => Vec3::new(0.95, 0.85, 0.1),
        }
    }
}

/// Rendering and UI side of a process. Calls are pure functions of the
/// replicated state, so repeating one is harmless.
pub trait Presentation {
    fn set_control_point_color(&mut self, control_point: ControlPointId, state: ControlPointState);

    fn set_scores(&mut self, red_score: u32, blue_score: u32);
}

#[derive(Debug, Default)]
pub struct LogPresentation {
    label: String,
}

impl LogPresentation {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Presentation for LogPresentation {
    fn set_control_point_color(&mut self, control_point: ControlPointId, state: ControlPointState) {
        log::debug!(
            "[{}] control point {} -> {:?} ({})",
            self.label,
            control_point,
            state.color(),
            state.as_str()
        );
    }

    fn set_scores(&mut self, red_score: u32, blue_score: u32) {
        log::debug!("[{}] scores red {} blue {}", self.label, red_score, blue_score);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationCall {
    Color {
        control_point: ControlPointId,
        state: ControlPointState,
    },
    Scores {
        red_score: u32,
        blue_score: u32,
    },
}

/// Keeps every call in order; lets hosts and tests inspect what was shown.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    calls: Vec<PresentationCall>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[PresentationCall] {
        &self.calls
    }

    pub fn color_calls(&self, control_point: ControlPointId) -> Vec<ControlPointState> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                PresentationCall::Color {
                    control_point: id,
                    state,
                } if id == control_point => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn last_color(&self, control_point: ControlPointId) -> Option<Color> {
        self.color_calls(control_point)
            .last()
            .map(|state| state.color())
    }

    pub fn last_scores(&self) -> Option<(u32, u32)> {
        self.calls.iter().rev().find_map(|call| match *call {
            PresentationCall::Scores {
                red_score,
                blue_score,
            } => Some((red_score, blue_score)),
            _ => None,
        })
    }
}

impl Presentation for RecordingPresentation {
    fn set_control_point_color(&mut self, control_point: ControlPointId, state: ControlPointState) {
        self.calls.push(PresentationCall::Color {
            control_point,
            state,
        });
    }

    fn set_scores(&mut self, red_score: u32, blue_score: u32) {
        self.calls.push(PresentationCall::Scores {
            red_score,
            blue_score,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_order() {
        let mut presentation = RecordingPresentation::new();
        presentation.set_control_point_color(1, ControlPointState::RedControlled);
        presentation.set_scores(3, 4);
        presentation.set_control_point_color(1, ControlPointState::Contested);

        assert_eq!(presentation.calls().len(), 3);
        assert_eq!(
            presentation.color_calls(1),
            vec![ControlPointState::RedControlled, ControlPointState::Contested]
        );
        assert_eq!(presentation.last_color(1), Some(Color::Yellow));
        assert_eq!(presentation.last_scores(), Some((3, 4)));
    }

    #[test]
    fn colors_are_distinct() {
        let colors = [Color::Gray, Color::Red, Color::Blue, Color::Yellow];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a.rgb(), b.rgb());
            }
        }
    }
}
