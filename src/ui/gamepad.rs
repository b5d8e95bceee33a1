/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping (4 columns):
///   D-pad Left / L1   →  Column 1
///   D-pad Down / L2   →  Column 2
///   B / R2            →  Column 3
///   A / R1            →  Column 4
///   Start             →  Start / Restart
///   Select            →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Button, EventType, Gilrs};

use crate::config::GamepadConfig;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

const BTN_COUNT: usize = 14;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            "DPADUP" | "UP" => Some(Btn::DPadUp),
            "DPADDOWN" | "DOWN" => Some(Btn::DPadDown),
            "DPADLEFT" | "LEFT" => Some(Btn::DPadLeft),
            "DPADRIGHT" | "RIGHT" => Some(Btn::DPadRight),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            Button::DPadUp    => Some(Btn::DPadUp),
            Button::DPadDown  => Some(Btn::DPadDown),
            Button::DPadLeft  => Some(Btn::DPadLeft),
            Button::DPadRight => Some(Btn::DPadRight),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) plus press/release edges.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
    just_released: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    columns: Vec<Vec<Btn>>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            columns: vec![
                vec![Btn::DPadLeft, Btn::L1],
                vec![Btn::DPadDown, Btn::L2],
                vec![Btn::B, Btn::R2],
                vec![Btn::A, Btn::R1],
            ],
            confirm: vec![Btn::Start],
            cancel:  vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

fn parse_list(names: &[String]) -> Vec<Btn> {
    names.iter().filter_map(|s| Btn::from_name(s)).collect()
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    log::warn!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unparseable lists keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        let map = &mut self.action_map;
        let cols: Vec<Vec<Btn>> = cfg.columns.iter().map(|c| parse_list(c)).collect();
        if cols.iter().any(|c| !c.is_empty()) { map.columns = cols; }
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
    }

    pub fn update(&mut self) {
        self.clear_edges();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    if let Some(b) = Btn::from_gilrs(btn) { self.set_button(b, true); }
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    if let Some(b) = Btn::from_gilrs(btn) { self.set_button(b, false); }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set_button(&mut self, btn: Btn, held: bool) {
        let s = &mut self.buttons[btn_index(btn)];
        if held && !s.held { s.just_pressed = true; }
        if !held && s.held { s.just_released = true; }
        s.held = held;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    /// Columns whose mapped button went down this frame.
    pub fn columns_pressed(&self) -> Vec<usize> {
        self.action_map.columns.iter().enumerate()
            .filter(|(_, btns)| self.any_just_pressed(btns))
            .map(|(i, _)| i)
            .collect()
    }

    /// Columns whose last held button came up this frame.
    pub fn columns_released(&self) -> Vec<usize> {
        self.action_map.columns.iter().enumerate()
            .filter(|(_, btns)| {
                let released = btns.iter().any(|&b| self.buttons[btn_index(b)].just_released);
                let still_held = btns.iter().any(|&b| self.buttons[btn_index(b)].held);
                released && !still_held
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }

    // ── Internal ──

    fn clear_edges(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
            b.just_released = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons {
            if b.held { b.just_released = true; }
            b.held = false;
            b.just_pressed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> GamepadState {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); BTN_COUNT],
            action_map: ActionMap::default(),
            connected: false,
        }
    }

    #[test]
    fn button_names_parse() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("LB"), Some(Btn::L1));
        assert_eq!(Btn::from_name("DPadLeft"), Some(Btn::DPadLeft));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("Turbo"), None);
    }

    #[test]
    fn column_press_and_release_edges() {
        let mut p = pad();
        p.set_button(Btn::B, true);
        assert_eq!(p.columns_pressed(), vec![2]);
        assert!(p.columns_released().is_empty());

        p.clear_edges();
        p.set_button(Btn::B, true); // still held, no new edge
        assert!(p.columns_pressed().is_empty());

        p.set_button(Btn::B, false);
        assert_eq!(p.columns_released(), vec![2]);
    }

    #[test]
    fn release_waits_for_all_mapped_buttons() {
        let mut p = pad();
        p.set_button(Btn::A, true);
        p.set_button(Btn::R1, true);
        p.clear_edges();
        p.set_button(Btn::A, false);
        assert!(p.columns_released().is_empty());
        p.set_button(Btn::R1, false);
        assert_eq!(p.columns_released(), vec![3]);
    }

    #[test]
    fn config_overrides_mapping() {
        let mut p = pad();
        p.load_button_config(&GamepadConfig {
            columns: vec![vec!["X".into()], vec!["Y".into()]],
            confirm: vec!["A".into()],
            cancel: vec!["Nonsense".into()],
        });
        p.set_button(Btn::Y, true);
        p.set_button(Btn::A, true);
        assert_eq!(p.columns_pressed(), vec![1]);
        assert!(p.confirm_pressed());
        // unparseable list keeps the default
        p.set_button(Btn::Select, true);
        assert!(p.cancel_pressed());
    }
}
