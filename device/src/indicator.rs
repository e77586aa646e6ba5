// Status LED next to the operator screen. Only the color mapping lives here;
// the pin-level protocol belongs to the hardware driver implementing `Indicator`.

use log::info;

use crate::state::WorkstationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(unused)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Teal,
    White,
    Black,
}

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Color::Red => (0xFF, 0, 0),
            Color::Green => (0, 0xFF, 0),
            Color::Blue => (0, 0, 0xFF),
            Color::Yellow => (0xFF, 0xFF, 0),
            Color::Magenta => (0xFF, 0, 0xFF),
            Color::Teal => (0, 0xFF, 0xFF),
            Color::White => (0xFF, 0xFF, 0xFF),
            Color::Black => (0, 0, 0),
        }
    }
}

impl From<WorkstationState> for Color {
    fn from(state: WorkstationState) -> Self {
        match state {
            WorkstationState::Empty => Color::Red,
            WorkstationState::Idle => Color::Yellow,
            WorkstationState::Active => Color::Green,
        }
    }
}

pub trait Indicator: Send {
    fn set_rgb(&mut self, r: u8, g: u8, b: u8);

    /// Named colors are shown at quarter brightness.
    fn set_color(&mut self, color: Color) {
        let (r, g, b) = color.rgb();
        self.set_rgb(r / 4, g / 4, b / 4);
    }

    fn show_state(&mut self, state: WorkstationState) {
        self.set_color(state.into());
    }
}

/// Indicator without hardware: logs every color change.
#[derive(Debug, Default)]
pub struct LogIndicator {
    pub rgb: (u8, u8, u8),
}

impl Indicator for LogIndicator {
    fn set_rgb(&mut self, r: u8, g: u8, b: u8) {
        if self.rgb != (r, g, b) {
            info!("Indicator #{r:02x}{g:02x}{b:02x}");
        }
        self.rgb = (r, g, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_map_to_dimmed_colors() {
        let mut led = LogIndicator::default();

        led.show_state(WorkstationState::Empty);
        assert_eq!(led.rgb, (0x3F, 0, 0));
        led.show_state(WorkstationState::Idle);
        assert_eq!(led.rgb, (0x3F, 0x3F, 0));
        led.show_state(WorkstationState::Active);
        assert_eq!(led.rgb, (0, 0x3F, 0));
    }
}
