//! Help text shown from the main menu.

use crate::automation::{Settings, SACRIFICE_BUTTON_COLOR};
use crate::paths::{SETTINGS_FILE_NAME, ZODIAC_CONFIG_FILE_NAME};

/// Help text, filled in with the values currently in effect.
pub fn help_text(settings: &Settings) -> String {
    let slot_limit = match settings.slot_limit() {
        Some(limit) => limit.to_string(),
        None => "unlimited".to_string(),
    };

    format!(
        r#"
--- Revolution Idle Sacrifice Automation Help ---

This tool automates zodiac sacrifices in Revolution Idle.

1. Setup
   Records the screen positions and colors the automation works with.
   - Left-click each Zodiac Slot to monitor. The color under the click is
     remembered as the slot's "ready" color.
   - Right-click when done adding slots (at least one is required).
   - Left-click the Sacrifice Drag Box, where zodiacs are dragged to.
   - Left-click the Sacrifice Button. Its color is fixed to {button}.
   Grid setup instead asks for rows, columns and the number of boxes, then
   takes two clicks: the top-left box and the box one column right and one
   row down. Every other slot position is computed from those.
   Only clicks on the game window are recorded (start with
   --no-window-filter to turn this off). Press the stop key to cancel.
   The result is saved to '{config}'.

2. Automation
   Runs with the saved configuration until the stop key is pressed:
   - Reads every zodiac slot color from one screenshot.
   - Drags the first slot that matches its color to the Sacrifice Box.
   - Checks the Sacrifice Button color and clicks it if it matches.
   - Otherwise keeps checking the remaining slots.

3. Help
   Shows this text.

4. Reload settings
   Re-reads '{settings_file}' after you edit it.

5. Exit

--- Settings ('{settings_file}') ---

   color_tolerance       {tolerance:<8} Max difference per RGB channel (0 = exact).
                                  Raise it if only some slots are detected.
   delay_before_check    {before_check:<8} Seconds before each color check.
   delay_after_press     {after_press:<8} Seconds after pressing on a slot.
   delay_drag_duration   {drag:<8} Seconds spent on the drag box before release.
   delay_after_drag      {after_drag:<8} Seconds after a drag, before the button check.
   delay_after_click     {after_click:<8} Seconds after clicking the button.
   stop_key              {stop_key:<8} A letter, digit, or a key name such as
                                  esc, space, enter, f1-f12, up, down, left, right.
   max_zodiac_slots      {slot_limit:<8} -1 for unlimited, or the most slots setup accepts.
   debug_color_matching  {debug_colors:<8} Log every slot comparison (needs debug level).
   message_level         {level:<8} "info" or "debug".
   gui_scale             {scale:<8} Zoom of the --gui window.

   Missing keys use their defaults. Invalid values are replaced by the default
   and a warning is logged.

--- Performance ---

   A single slot with the default delays reaches roughly 230 sacrifices per
   minute. Shorter delays are faster but may miss drags; more slots add time
   to each pass.
"#,
        button = SACRIFICE_BUTTON_COLOR,
        config = ZODIAC_CONFIG_FILE_NAME,
        settings_file = SETTINGS_FILE_NAME,
        tolerance = settings.color_tolerance,
        before_check = settings.delay_before_check,
        after_press = settings.delay_after_press,
        drag = settings.delay_drag_duration,
        after_drag = settings.delay_after_drag,
        after_click = settings.delay_after_click,
        stop_key = settings.stop_key,
        slot_limit = slot_limit,
        debug_colors = settings.debug_color_matching,
        level = settings.message_level,
        scale = settings.gui_scale,
    )
}
