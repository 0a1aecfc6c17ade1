//! The automation loop.
//!
//! Polls the zodiac slot colors. When a slot shows its target color the item
//! is dragged to the sacrifice box, and if the sacrifice button then shows its
//! color it is clicked. Runs until the stop flag is raised.

use anyhow::{anyhow, Context, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::automation::config::ZodiacConfig;
use crate::automation::desktop::{Desktop, ScreenDesktop};
use crate::automation::detection::{colors_match, ColorComparison, Rgb};
use crate::automation::settings::Settings;
use crate::automation::stats::PerformanceTracker;
use crate::automation::stop_key::StopListener;
use crate::capture::{screen_bounds, Point};

/// Result of a finished run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub sacrifices: u64,
    pub elapsed: Duration,
}

/// Stop request and live sacrifice count shared between a run and whoever
/// started it. Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct RunControl {
    stop: Arc<AtomicBool>,
    sacrifices: Arc<AtomicU64>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Flag for the stop key listener to raise.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Sacrifices completed so far in the current run.
    pub fn sacrifices(&self) -> u64 {
        self.sacrifices.load(Ordering::SeqCst)
    }
}

pub struct AutomationEngine<'a, D: Desktop> {
    desktop: D,
    config: &'a ZodiacConfig,
    settings: &'a Settings,
    control: &'a RunControl,
}

impl<'a, D: Desktop> AutomationEngine<'a, D> {
    pub fn new(
        desktop: D,
        config: &'a ZodiacConfig,
        settings: &'a Settings,
        control: &'a RunControl,
    ) -> Self {
        Self {
            desktop,
            config,
            settings,
            control,
        }
    }

    fn stopped(&self) -> bool {
        self.control.stop_requested()
    }

    /// Runs until the stop flag is set.
    ///
    /// Capture failures skip the iteration. Mouse input failures end the run
    /// with an error.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.config.validate()?;

        let points = self.config.sample_points();
        self.control.sacrifices.store(0, Ordering::SeqCst);
        let mut tracker = PerformanceTracker::new();
        tracker.print_status();

        while !self.stopped() {
            pause(self.settings.before_check());
            if self.stopped() {
                break;
            }

            let colors = match self.desktop.sample_colors(&points) {
                Ok(colors) => colors,
                Err(e) => {
                    crate::debug(&format!("Color sampling failed: {:#}", e));
                    continue;
                }
            };

            if !self.scan_slots(&colors, &mut tracker)? {
                crate::debug("No zodiac slots have matching colors. Waiting for a match...");
            }
        }

        println!();
        Ok(RunSummary {
            sacrifices: tracker.sacrifices(),
            elapsed: tracker.elapsed(),
        })
    }

    /// Checks each slot in order against `colors` and sacrifices the first
    /// one whose button check succeeds. Returns true if a sacrifice happened.
    fn scan_slots(&mut self, colors: &[Rgb], tracker: &mut PerformanceTracker) -> Result<bool> {
        let config = self.config;
        let tolerance = self.settings.tolerance();

        for (i, slot) in config.slots.iter().enumerate() {
            if self.stopped() {
                return Ok(false);
            }
            let current = *colors.get(i).ok_or_else(|| {
                anyhow!("Sampled {} colors for {} slots", colors.len(), config.slots.len())
            })?;

            let comparison = ColorComparison {
                slot_index: i,
                current,
                target: slot.color,
                tolerance,
            };
            if self.settings.debug_color_matching {
                crate::debug(&comparison.to_string());
            }
            if !comparison.is_match() {
                continue;
            }

            crate::debug(&format!("Zodiac slot {} matched, dragging to sacrifice box", i + 1));
            self.drag(slot.position, config.sacrifice_box)?;
            pause(self.settings.after_drag());

            let button = match self.desktop.sample_colors(&[config.sacrifice_button]) {
                Ok(colors) => colors.first().copied(),
                Err(e) => {
                    crate::debug(&format!("Could not read the sacrifice button: {:#}", e));
                    None
                }
            };

            match button {
                Some(color) if colors_match(color, config.button_color, tolerance) => {
                    self.desktop
                        .click_left(config.sacrifice_button)
                        .context("Failed to click the sacrifice button")?;
                    pause(self.settings.after_click());
                    tracker.record_sacrifice();
                    self.control
                        .sacrifices
                        .store(tracker.sacrifices(), Ordering::SeqCst);
                    return Ok(true);
                }
                Some(color) => crate::debug(&format!(
                    "Sacrifice button color {} does not match {}, checking next slot",
                    color, config.button_color
                )),
                None => {}
            }
        }

        Ok(false)
    }

    fn drag(&mut self, from: Point, to: Point) -> Result<()> {
        self.desktop.move_to(from).context("Failed to move to zodiac slot")?;
        self.desktop.press_left(from).context("Failed to press on zodiac slot")?;
        pause(self.settings.after_press());
        self.desktop.move_to(to).context("Failed to drag to sacrifice box")?;
        pause(self.settings.drag_duration());
        self.desktop.release_left(to).context("Failed to release on sacrifice box")?;
        Ok(())
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

/// Runs automation on the real screen until the stop key is pressed or
/// `control` is asked to stop.
pub fn run_automation(
    settings: &Settings,
    config: &ZodiacConfig,
    control: &RunControl,
) -> Result<RunSummary> {
    config.validate()?;

    match screen_bounds() {
        Ok(screen) => {
            for problem in config.points_outside(&screen) {
                crate::log(&format!("Warning: {} is outside the screen bounds", problem));
            }
        }
        Err(e) => crate::debug(&format!("Could not check screen bounds: {:#}", e)),
    }

    let stop_key = settings.stop_key();
    let listener = StopListener::start(&stop_key, control.stop_flag())
        .context("Failed to start the stop key listener")?;

    crate::log(&format!(
        "Starting automation with {} zodiac slot(s). Press '{}' to stop.",
        config.slot_count(),
        stop_key
    ));

    let summary = AutomationEngine::new(ScreenDesktop, config, settings, control).run();
    drop(listener);

    let summary = summary?;
    crate::log(&format!(
        "Automation stopped. {} sacrifices in {:.1}s",
        summary.sacrifices,
        summary.elapsed.as_secs_f64()
    ));
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::MonitoredSlot;
    use std::collections::VecDeque;

    const READY: Rgb = Rgb::new(200, 50, 50);
    const EMPTY: Rgb = Rgb::new(20, 20, 20);
    const BUTTON: Rgb = Rgb::new(219, 124, 0);

    #[derive(Debug, PartialEq)]
    enum Action {
        Move(Point),
        Press(Point),
        Release(Point),
    }

    /// Returns scripted samples in order. Raises the stop flag once the
    /// script runs out.
    struct FakeDesktop {
        samples: VecDeque<Result<Vec<Rgb>>>,
        actions: Vec<Action>,
        stop: Arc<AtomicBool>,
        sample_calls: usize,
        fail_input: bool,
    }

    impl FakeDesktop {
        fn new(samples: Vec<Result<Vec<Rgb>>>, stop: Arc<AtomicBool>) -> Self {
            Self {
                samples: samples.into(),
                actions: Vec::new(),
                stop,
                sample_calls: 0,
                fail_input: false,
            }
        }

        fn act(&mut self, action: Action) -> Result<()> {
            if self.fail_input {
                return Err(anyhow!("input blocked"));
            }
            self.actions.push(action);
            Ok(())
        }
    }

    impl Desktop for &mut FakeDesktop {
        fn sample_colors(&mut self, _points: &[Point]) -> Result<Vec<Rgb>> {
            self.sample_calls += 1;
            match self.samples.pop_front() {
                Some(sample) => sample,
                None => {
                    self.stop.store(true, Ordering::SeqCst);
                    Err(anyhow!("script finished"))
                }
            }
        }

        fn move_to(&mut self, point: Point) -> Result<()> {
            self.act(Action::Move(point))
        }

        fn press_left(&mut self, point: Point) -> Result<()> {
            self.act(Action::Press(point))
        }

        fn release_left(&mut self, point: Point) -> Result<()> {
            self.act(Action::Release(point))
        }
    }

    fn slot(x: i32) -> MonitoredSlot {
        MonitoredSlot {
            position: Point::new(x, 100),
            color: READY,
        }
    }

    fn config(slots: usize) -> ZodiacConfig {
        ZodiacConfig {
            slots: (0..slots).map(|i| slot(10 + i as i32 * 10)).collect(),
            sacrifice_box: Point::new(300, 300),
            sacrifice_button: Point::new(300, 400),
            button_color: BUTTON,
        }
    }

    fn instant_settings() -> Settings {
        Settings {
            delay_before_check: 0.0,
            delay_after_press: 0.0,
            delay_drag_duration: 0.0,
            delay_after_drag: 0.0,
            delay_after_click: 0.0,
            ..Settings::default()
        }
    }

    fn drag_actions(from: Point, to: Point) -> Vec<Action> {
        vec![Action::Move(from), Action::Press(from), Action::Move(to), Action::Release(to)]
    }

    fn click_actions(at: Point) -> Vec<Action> {
        vec![Action::Move(at), Action::Press(at), Action::Release(at)]
    }

    #[test]
    fn test_drag_and_click_when_slot_and_button_match() {
        let config = config(1);
        let settings = instant_settings();
        let control = RunControl::new();
        let mut desktop = FakeDesktop::new(
            vec![Ok(vec![READY, EMPTY]), Ok(vec![BUTTON])],
            control.stop_flag(),
        );

        let summary = AutomationEngine::new(&mut desktop, &config, &settings, &control)
            .run()
            .unwrap();

        assert_eq!(summary.sacrifices, 1);
        assert_eq!(control.sacrifices(), 1);
        let mut expected = drag_actions(Point::new(10, 100), config.sacrifice_box);
        expected.extend(click_actions(config.sacrifice_button));
        assert_eq!(desktop.actions, expected);
    }

    #[test]
    fn test_continues_scanning_when_button_does_not_match() {
        let config = config(2);
        let settings = instant_settings();
        let control = RunControl::new();
        let mut desktop = FakeDesktop::new(
            vec![
                Ok(vec![READY, READY, EMPTY]),
                Ok(vec![EMPTY]),
                Ok(vec![BUTTON]),
            ],
            control.stop_flag(),
        );

        let summary = AutomationEngine::new(&mut desktop, &config, &settings, &control)
            .run()
            .unwrap();

        assert_eq!(summary.sacrifices, 1);
        let mut expected = drag_actions(Point::new(10, 100), config.sacrifice_box);
        expected.extend(drag_actions(Point::new(20, 100), config.sacrifice_box));
        expected.extend(click_actions(config.sacrifice_button));
        assert_eq!(desktop.actions, expected);
    }

    #[test]
    fn test_button_within_tolerance_is_clicked() {
        let config = config(1);
        let settings = Settings {
            color_tolerance: 5,
            ..instant_settings()
        };
        let control = RunControl::new();
        let mut desktop = FakeDesktop::new(
            vec![Ok(vec![Rgb::new(203, 48, 52), EMPTY]), Ok(vec![Rgb::new(215, 128, 3)])],
            control.stop_flag(),
        );

        let summary = AutomationEngine::new(&mut desktop, &config, &settings, &control)
            .run()
            .unwrap();
        assert_eq!(summary.sacrifices, 1);
    }

    #[test]
    fn test_no_action_without_matching_slot() {
        let config = config(3);
        let settings = instant_settings();
        let control = RunControl::new();
        let mut desktop = FakeDesktop::new(
            (0..3).map(|_| Ok(vec![EMPTY, EMPTY, EMPTY, BUTTON])).collect(),
            control.stop_flag(),
        );

        let summary = AutomationEngine::new(&mut desktop, &config, &settings, &control)
            .run()
            .unwrap();

        assert_eq!(summary.sacrifices, 0);
        assert!(desktop.actions.is_empty());
        assert_eq!(desktop.sample_calls, 4);
    }

    #[test]
    fn test_capture_errors_skip_the_iteration() {
        let config = config(1);
        let settings = instant_settings();
        let control = RunControl::new();
        let mut desktop = FakeDesktop::new(
            vec![
                Err(anyhow!("capture failed")),
                Ok(vec![READY, EMPTY]),
                Ok(vec![BUTTON]),
            ],
            control.stop_flag(),
        );

        let summary = AutomationEngine::new(&mut desktop, &config, &settings, &control)
            .run()
            .unwrap();
        assert_eq!(summary.sacrifices, 1);
    }

    #[test]
    fn test_stop_flag_prevents_any_work() {
        let config = config(1);
        let settings = instant_settings();
        let control = RunControl::new();
        control.request_stop();
        let mut desktop = FakeDesktop::new(vec![Ok(vec![READY, BUTTON])], control.stop_flag());

        let summary = AutomationEngine::new(&mut desktop, &config, &settings, &control)
            .run()
            .unwrap();

        assert_eq!(summary.sacrifices, 0);
        assert_eq!(desktop.sample_calls, 0);
    }

    #[test]
    fn test_input_failure_aborts_run() {
        let config = config(1);
        let settings = instant_settings();
        let control = RunControl::new();
        let mut desktop = FakeDesktop::new(vec![Ok(vec![READY, EMPTY])], control.stop_flag());
        desktop.fail_input = true;

        let result = AutomationEngine::new(&mut desktop, &config, &settings, &control).run();
        assert!(result.is_err());
    }

    #[test]
    fn test_clones_share_stop_request() {
        let control = RunControl::new();
        let remote = control.clone();
        assert!(!control.stop_requested());
        remote.request_stop();
        assert!(control.stop_requested());
        assert!(control.stop_flag().load(Ordering::SeqCst));
    }

    #[test]
    fn test_refuses_empty_config() {
        let config = config(0);
        let settings = instant_settings();
        let control = RunControl::new();
        let mut desktop = FakeDesktop::new(Vec::new(), control.stop_flag());

        assert!(AutomationEngine::new(&mut desktop, &config, &settings, &control).run().is_err());
    }
}
