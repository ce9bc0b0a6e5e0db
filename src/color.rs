//! Highlight colors
//!
//! The client colors a glowing entity by the color of the team it belongs
//! to, so a mesh's highlight is expressed as membership of one team per
//! named color.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The sixteen named chat colors the protocol can assign to a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl NamedColor {
    /// Every named color, in protocol order
    pub const ALL: [NamedColor; 16] = [
        NamedColor::Black,
        NamedColor::DarkBlue,
        NamedColor::DarkGreen,
        NamedColor::DarkAqua,
        NamedColor::DarkRed,
        NamedColor::DarkPurple,
        NamedColor::Gold,
        NamedColor::Gray,
        NamedColor::DarkGray,
        NamedColor::Blue,
        NamedColor::Green,
        NamedColor::Aqua,
        NamedColor::Red,
        NamedColor::LightPurple,
        NamedColor::Yellow,
        NamedColor::White,
    ];

    /// Protocol name of the color
    pub fn name(self) -> &'static str {
        match self {
            NamedColor::Black => "black",
            NamedColor::DarkBlue => "dark_blue",
            NamedColor::DarkGreen => "dark_green",
            NamedColor::DarkAqua => "dark_aqua",
            NamedColor::DarkRed => "dark_red",
            NamedColor::DarkPurple => "dark_purple",
            NamedColor::Gold => "gold",
            NamedColor::Gray => "gray",
            NamedColor::DarkGray => "dark_gray",
            NamedColor::Blue => "blue",
            NamedColor::Green => "green",
            NamedColor::Aqua => "aqua",
            NamedColor::Red => "red",
            NamedColor::LightPurple => "light_purple",
            NamedColor::Yellow => "yellow",
            NamedColor::White => "white",
        }
    }

    /// Protocol color index (0-15)
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Name of the team that renders this color
    pub fn team_name(self, prefix: &str) -> String {
        format!("{}{}", prefix, self.name())
    }
}

impl fmt::Display for NamedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Highlight state of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    /// Not glowing
    #[default]
    Off,
    /// Glowing in the given color
    Color(NamedColor),
}

impl Highlight {
    /// Whether the body should have its glowing flag set
    pub fn is_glowing(self) -> bool {
        matches!(self, Highlight::Color(_))
    }

    /// Color of the highlight, if any
    pub fn color(self) -> Option<NamedColor> {
        match self {
            Highlight::Off => None,
            Highlight::Color(color) => Some(color),
        }
    }
}

impl From<NamedColor> for Highlight {
    fn from(color: NamedColor) -> Self {
        Highlight::Color(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_indices_follow_protocol_order() {
        for (i, color) in NamedColor::ALL.iter().enumerate() {
            assert_eq!(color.index() as usize, i);
        }
        assert_eq!(NamedColor::White.index(), 15);
    }

    #[test]
    fn test_team_name() {
        assert_eq!(NamedColor::Gold.team_name("alexandria_"), "alexandria_gold");
        assert_eq!(NamedColor::LightPurple.team_name("m_"), "m_light_purple");
    }

    #[test]
    fn test_team_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            NamedColor::ALL.iter().map(|c| c.team_name("t_")).collect();
        assert_eq!(names.len(), NamedColor::ALL.len());
    }

    #[test]
    fn test_highlight() {
        assert_eq!(Highlight::default(), Highlight::Off);
        assert!(!Highlight::Off.is_glowing());
        assert_eq!(Highlight::Off.color(), None);

        let red: Highlight = NamedColor::Red.into();
        assert!(red.is_glowing());
        assert_eq!(red.color(), Some(NamedColor::Red));
    }
}
