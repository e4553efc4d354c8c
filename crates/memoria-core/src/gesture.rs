//! Pointer gestures mapped to musical parameter changes

use serde::{Deserialize, Serialize};

/// Discrete pointer events from the input layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gesture {
    PointerDown { x: f64, y: f64 },
    /// Movement since the previous drag event
    PointerDrag { dx: f64, dy: f64 },
    PointerUp,
}

/// What a gesture asks the sequencer to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// Play an immediate preview note
    Preview,
    /// Shift gesture-following pools by semitones
    Transpose(i32),
    /// Change tempo by this many BPM
    TempoDelta(f64),
}

/// Accumulates drag movement and emits one step per threshold crossing.
///
/// Horizontal: right transposes up, left down. Vertical: dragging down slows
/// the tempo, dragging up speeds it up. Each axis resets after it fires.
#[derive(Debug, Clone)]
pub struct GestureMapper {
    threshold: f64,
    tempo_step: f64,
    dragging: bool,
    acc_x: f64,
    acc_y: f64,
}

impl GestureMapper {
    pub fn new(threshold: f64, tempo_step: f64) -> Self {
        Self {
            threshold: threshold.abs(),
            tempo_step: tempo_step.abs(),
            dragging: false,
            acc_x: 0.0,
            acc_y: 0.0,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn map(&mut self, gesture: Gesture) -> Vec<GestureAction> {
        match gesture {
            Gesture::PointerDown { .. } => {
                self.dragging = true;
                self.acc_x = 0.0;
                self.acc_y = 0.0;
                vec![GestureAction::Preview]
            }
            Gesture::PointerDrag { dx, dy } => {
                // A drag without a press (e.g. touch resumed) starts tracking here
                self.dragging = true;
                self.acc_x += dx;
                self.acc_y += dy;

                let mut actions = Vec::new();
                if self.acc_x.abs() > self.threshold {
                    actions.push(GestureAction::Transpose(if self.acc_x > 0.0 { 1 } else { -1 }));
                    self.acc_x = 0.0;
                }
                if self.acc_y.abs() > self.threshold {
                    let delta = if self.acc_y > 0.0 { -self.tempo_step } else { self.tempo_step };
                    actions.push(GestureAction::TempoDelta(delta));
                    self.acc_y = 0.0;
                }
                actions
            }
            Gesture::PointerUp => {
                self.dragging = false;
                self.acc_x = 0.0;
                self.acc_y = 0.0;
                Vec::new()
            }
        }
    }
}

impl Default for GestureMapper {
    fn default() -> Self {
        Self::new(5.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_down_previews() {
        let mut mapper = GestureMapper::default();
        assert_eq!(mapper.map(Gesture::PointerDown { x: 10.0, y: 10.0 }), vec![GestureAction::Preview]);
        assert!(mapper.is_dragging());
    }

    #[test]
    fn test_vertical_drag_down_slows() {
        let mut mapper = GestureMapper::new(5.0, 1.0);
        mapper.map(Gesture::PointerDown { x: 0.0, y: 0.0 });
        let actions = mapper.map(Gesture::PointerDrag { dx: 0.0, dy: 10.0 });
        assert_eq!(actions, vec![GestureAction::TempoDelta(-1.0)]);
        let actions = mapper.map(Gesture::PointerDrag { dx: 0.0, dy: -6.0 });
        assert_eq!(actions, vec![GestureAction::TempoDelta(1.0)]);
    }

    #[test]
    fn test_small_moves_accumulate() {
        let mut mapper = GestureMapper::new(5.0, 2.0);
        assert!(mapper.map(Gesture::PointerDrag { dx: 3.0, dy: 0.0 }).is_empty());
        assert_eq!(
            mapper.map(Gesture::PointerDrag { dx: 3.0, dy: 0.0 }),
            vec![GestureAction::Transpose(1)]
        );
        // Axis reset after firing
        assert!(mapper.map(Gesture::PointerDrag { dx: -4.0, dy: 0.0 }).is_empty());
        assert_eq!(
            mapper.map(Gesture::PointerDrag { dx: -2.0, dy: 0.0 }),
            vec![GestureAction::Transpose(-1)]
        );
    }

    #[test]
    fn test_pointer_up_resets() {
        let mut mapper = GestureMapper::default();
        mapper.map(Gesture::PointerDrag { dx: 4.0, dy: 4.0 });
        mapper.map(Gesture::PointerUp);
        assert!(!mapper.is_dragging());
        assert!(mapper.map(Gesture::PointerDrag { dx: 4.0, dy: 4.0 }).is_empty());
    }

    #[test]
    fn test_diagonal_drag_fires_both_axes() {
        let mut mapper = GestureMapper::default();
        let actions = mapper.map(Gesture::PointerDrag { dx: -8.0, dy: -8.0 });
        assert_eq!(actions, vec![GestureAction::Transpose(-1), GestureAction::TempoDelta(1.0)]);
    }
}
