use dialoguer::Confirm;
use log::{info, warn};

use crate::config::{ModeChoice, OverlayConfig};
use crate::models::Mode;

const TRACKING_PROMPT: &str =
    "Do you want to track System Resources? Answer 'no' to track the currently focused window.";

/// Turn the configured choice into the mode for this process, asking the user
/// when the configuration leaves it open. Blocks until answered.
pub fn resolve_mode(config: &OverlayConfig) -> Mode {
    let mode = match config.get_mode_choice() {
        ModeChoice::System => Mode::SystemWide,
        ModeChoice::Window => Mode::FocusedWindow,
        ModeChoice::Ask => match Confirm::new()
            .with_prompt(TRACKING_PROMPT)
            .default(true)
            .interact_opt()
        {
            Ok(answer) => mode_from_answer(answer),
            Err(e) => {
                warn!("Tracking option prompt unavailable: {}", e);
                mode_from_answer(None)
            }
        },
    };
    info!("Tracking mode: {}", mode);
    mode
}

/// Only an explicit yes selects system-wide tracking; no or a dismissed
/// prompt tracks the focused window.
fn mode_from_answer(answer: Option<bool>) -> Mode {
    match answer {
        Some(true) => Mode::SystemWide,
        Some(false) | None => Mode::FocusedWindow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_answer() {
        assert_eq!(mode_from_answer(Some(true)), Mode::SystemWide);
        assert_eq!(mode_from_answer(Some(false)), Mode::FocusedWindow);
        assert_eq!(mode_from_answer(None), Mode::FocusedWindow);
    }

    #[test]
    fn test_configured_mode_skips_prompt() {
        let mut config = OverlayConfig::default();
        config.mode = "system".to_string();
        assert_eq!(resolve_mode(&config), Mode::SystemWide);
        config.mode = "window".to_string();
        assert_eq!(resolve_mode(&config), Mode::FocusedWindow);
    }
}
