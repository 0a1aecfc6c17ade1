//! Setup state tracking.
//!
//! Tracks which positions have been captured and the current step. Clicks are
//! fed in as they arrive from the mouse hook. This type never touches the
//! screen, so the wizard samples slot colors before handing the click over.

use crate::automation::config::{MonitoredSlot, ZodiacConfig};
use crate::automation::detection::{Rgb, SACRIFICE_BUTTON_COLOR};
use crate::capture::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// Steps of a setup session, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupStep {
    /// Left-click each zodiac slot, right-click to finish.
    ZodiacSlots,
    /// Left-click the drag target.
    SacrificeBox,
    /// Left-click the confirmation button.
    SacrificeButton,
    Complete,
}

/// What a click did to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupOutcome {
    SlotCaptured {
        number: usize,
        position: Point,
        color: Rgb,
        limit_reached: bool,
    },
    /// Left click on a slot whose color could not be read.
    SlotColorUnavailable(Point),
    SlotsFinished(usize),
    /// Right click before any slot was captured.
    NeedAtLeastOneSlot,
    BoxCaptured(Point),
    /// The last step. The session is complete.
    ButtonCaptured(Point),
    /// Right click outside the slot step, or any click after completion.
    Ignored,
}

impl SetupOutcome {
    /// Console message for this outcome.
    pub fn message(&self) -> String {
        match self {
            Self::SlotCaptured {
                number,
                position,
                color,
                limit_reached,
            } => {
                let mut msg = format!(
                    "Zodiac Slot {} captured: {} with color {}.",
                    number, position, color
                );
                if *limit_reached {
                    msg.push_str(&format!(
                        " Maximum zodiac slots ({}) reached. Now left-click to set the Sacrifice Drag Box.",
                        number
                    ));
                } else {
                    msg.push_str(&format!(
                        " Left-click to add Zodiac Slot {} (or right-click to finish adding zodiac slots).",
                        number + 1
                    ));
                }
                msg
            }
            Self::SlotColorUnavailable(position) => format!(
                "Could not read the color at {}. Click the zodiac slot again.",
                position
            ),
            Self::SlotsFinished(count) => format!(
                "Finished adding zodiac slots. {} zodiac slot(s) configured. Now left-click to set the Sacrifice Drag Box.",
                count
            ),
            Self::NeedAtLeastOneSlot => {
                "Capture at least one zodiac slot before right-clicking to finish.".to_string()
            }
            Self::BoxCaptured(position) => format!(
                "Sacrifice Drag Box captured: {}. Now left-click to set the Sacrifice Button.",
                position
            ),
            Self::ButtonCaptured(position) => format!(
                "Sacrifice Button captured: {}. Its target color is fixed to {}.",
                position, SACRIFICE_BUTTON_COLOR
            ),
            Self::Ignored => {
                "Right-click detected. In setup mode, right-click is only used to finish adding zodiac slots."
                    .to_string()
            }
        }
    }
}

/// Positions and colors collected so far.
#[derive(Clone, Debug)]
pub struct SetupState {
    step: SetupStep,
    slots: Vec<MonitoredSlot>,
    sacrifice_box: Option<Point>,
    sacrifice_button: Option<Point>,
    slot_limit: Option<usize>,
}

impl SetupState {
    /// `slot_limit` of `None` allows any number of slots.
    pub fn new(slot_limit: Option<usize>) -> Self {
        Self {
            step: SetupStep::ZodiacSlots,
            slots: Vec::new(),
            sacrifice_box: None,
            sacrifice_button: None,
            slot_limit,
        }
    }

    pub fn step(&self) -> SetupStep {
        self.step
    }

    pub fn slots(&self) -> &[MonitoredSlot] {
        &self.slots
    }

    pub fn is_complete(&self) -> bool {
        self.step == SetupStep::Complete
    }

    /// True when the next left click needs the slot color.
    pub fn wants_color(&self) -> bool {
        self.step == SetupStep::ZodiacSlots
    }

    /// Applies one click. `color` is the pixel color under the click, which
    /// is only needed during the slot step.
    pub fn handle_click(
        &mut self,
        button: MouseButton,
        position: Point,
        color: Option<Rgb>,
    ) -> SetupOutcome {
        match (self.step, button) {
            (SetupStep::ZodiacSlots, MouseButton::Left) => {
                let Some(color) = color else {
                    return SetupOutcome::SlotColorUnavailable(position);
                };
                self.slots.push(MonitoredSlot { position, color });
                let limit_reached = self
                    .slot_limit
                    .is_some_and(|limit| self.slots.len() >= limit);
                if limit_reached {
                    self.step = SetupStep::SacrificeBox;
                }
                SetupOutcome::SlotCaptured {
                    number: self.slots.len(),
                    position,
                    color,
                    limit_reached,
                }
            }
            (SetupStep::ZodiacSlots, MouseButton::Right) => {
                if self.slots.is_empty() {
                    SetupOutcome::NeedAtLeastOneSlot
                } else {
                    self.step = SetupStep::SacrificeBox;
                    SetupOutcome::SlotsFinished(self.slots.len())
                }
            }
            (SetupStep::SacrificeBox, MouseButton::Left) => {
                self.sacrifice_box = Some(position);
                self.step = SetupStep::SacrificeButton;
                SetupOutcome::BoxCaptured(position)
            }
            (SetupStep::SacrificeButton, MouseButton::Left) => {
                self.sacrifice_button = Some(position);
                self.step = SetupStep::Complete;
                SetupOutcome::ButtonCaptured(position)
            }
            _ => SetupOutcome::Ignored,
        }
    }

    /// Replaces the slot list (grid setup) and moves on to the drag box.
    pub fn set_slots(&mut self, slots: Vec<MonitoredSlot>) {
        self.slots = slots;
        if !self.slots.is_empty() {
            self.step = SetupStep::SacrificeBox;
        }
    }

    /// The finished configuration, or `None` until every step is done.
    pub fn to_config(&self) -> Option<ZodiacConfig> {
        if !self.is_complete() || self.slots.is_empty() {
            return None;
        }
        Some(ZodiacConfig {
            slots: self.slots.clone(),
            sacrifice_box: self.sacrifice_box?,
            sacrifice_button: self.sacrifice_button?,
            button_color: SACRIFICE_BUTTON_COLOR,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLOR: Rgb = Rgb::new(120, 40, 200);

    fn left(state: &mut SetupState, x: i32, y: i32) -> SetupOutcome {
        state.handle_click(MouseButton::Left, Point::new(x, y), Some(COLOR))
    }

    fn right(state: &mut SetupState) -> SetupOutcome {
        state.handle_click(MouseButton::Right, Point::new(0, 0), None)
    }

    #[test]
    fn test_full_session() {
        let mut state = SetupState::new(None);
        assert!(state.wants_color());

        left(&mut state, 10, 10);
        left(&mut state, 20, 10);
        assert_eq!(state.step(), SetupStep::ZodiacSlots);

        assert_eq!(right(&mut state), SetupOutcome::SlotsFinished(2));
        assert_eq!(state.step(), SetupStep::SacrificeBox);

        assert_eq!(left(&mut state, 100, 100), SetupOutcome::BoxCaptured(Point::new(100, 100)));
        assert_eq!(state.step(), SetupStep::SacrificeButton);
        assert!(state.to_config().is_none());

        left(&mut state, 200, 300);
        assert!(state.is_complete());

        let config = state.to_config().unwrap();
        assert_eq!(config.slots.len(), 2);
        assert_eq!(config.slots[1].position, Point::new(20, 10));
        assert_eq!(config.slots[1].color, COLOR);
        assert_eq!(config.sacrifice_box, Point::new(100, 100));
        assert_eq!(config.sacrifice_button, Point::new(200, 300));
        assert_eq!(config.button_color, SACRIFICE_BUTTON_COLOR);
    }

    #[test]
    fn test_right_click_without_slots_is_rejected() {
        let mut state = SetupState::new(None);
        assert_eq!(right(&mut state), SetupOutcome::NeedAtLeastOneSlot);
        assert_eq!(state.step(), SetupStep::ZodiacSlots);
    }

    #[test]
    fn test_slot_limit_advances_automatically() {
        let mut state = SetupState::new(Some(2));
        let first = left(&mut state, 1, 1);
        assert!(matches!(first, SetupOutcome::SlotCaptured { limit_reached: false, .. }));

        let second = left(&mut state, 2, 1);
        assert!(matches!(
            second,
            SetupOutcome::SlotCaptured {
                number: 2,
                limit_reached: true,
                ..
            }
        ));
        assert_eq!(state.step(), SetupStep::SacrificeBox);

        // Next left click is the box, not a third slot
        left(&mut state, 50, 50);
        assert_eq!(state.slots().len(), 2);
        assert_eq!(state.step(), SetupStep::SacrificeButton);
    }

    #[test]
    fn test_slot_click_without_color_is_not_captured() {
        let mut state = SetupState::new(None);
        let outcome = state.handle_click(MouseButton::Left, Point::new(5, 5), None);
        assert_eq!(outcome, SetupOutcome::SlotColorUnavailable(Point::new(5, 5)));
        assert!(state.slots().is_empty());
    }

    #[test]
    fn test_right_click_after_slots_is_ignored() {
        let mut state = SetupState::new(Some(1));
        left(&mut state, 1, 1);
        assert_eq!(right(&mut state), SetupOutcome::Ignored);
        assert_eq!(state.step(), SetupStep::SacrificeBox);
    }

    #[test]
    fn test_grid_slots_skip_to_box() {
        let mut state = SetupState::new(None);
        state.set_slots(vec![
            MonitoredSlot {
                position: Point::new(1, 1),
                color: COLOR,
            };
            4
        ]);
        assert_eq!(state.step(), SetupStep::SacrificeBox);
        assert!(!state.wants_color());
    }

    #[test]
    fn test_messages() {
        let captured = SetupOutcome::SlotCaptured {
            number: 1,
            position: Point::new(3, 4),
            color: COLOR,
            limit_reached: false,
        };
        assert!(captured
            .message()
            .starts_with("Zodiac Slot 1 captured: (3, 4) with color (120, 40, 200)."));
        assert!(SetupOutcome::ButtonCaptured(Point::new(1, 2))
            .message()
            .contains("(219, 124, 0)"));
    }
}
