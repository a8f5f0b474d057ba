use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub primary: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub accent: Color,
    pub success: Color,
    pub error: Color,
    pub border: Color,
    pub highlight: Color,
    pub container: Color,
    /// Player panel colours
    pub player_background: Color,
    pub player_rail: Color,
    pub player_track: Color,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self::podcastr()
    }
}

impl ThemeColors {
    pub fn podcastr() -> Self {
        Self {
            primary: Color::Rgb(130, 87, 229),          // #8257e5
            text: Color::Rgb(73, 77, 75),               // #494d4b
            text_secondary: Color::Rgb(128, 128, 128),  // #808080
            accent: Color::Rgb(4, 211, 97),             // #04d361
            success: Color::Rgb(4, 211, 97),            // #04d361
            error: Color::Red,
            border: Color::Rgb(230, 232, 235),          // #e6e8eb
            highlight: Color::Rgb(145, 100, 250),       // #9164fa
            container: Color::Rgb(255, 255, 255),       // #ffffff
            player_background: Color::Rgb(130, 87, 229), // #8257e5
            player_rail: Color::Rgb(159, 117, 255),     // #9f75ff
            player_track: Color::Rgb(4, 211, 97),       // #04d361
        }
    }

    pub fn dark() -> Self {
        Self {
            primary: Color::Rgb(159, 117, 255),         // #9f75ff
            text: Color::Rgb(246, 245, 244),            // #f6f5f4
            text_secondary: Color::Rgb(160, 160, 170),  // #a0a0aa
            accent: Color::Rgb(4, 211, 97),             // #04d361
            success: Color::Green,
            error: Color::Red,
            border: Color::Rgb(75, 85, 99),             // #4b5563
            highlight: Color::Rgb(75, 85, 99),          // #4b5563
            container: Color::Rgb(27, 29, 30),          // #1b1d1e
            player_background: Color::Rgb(27, 29, 30),  // #1b1d1e
            player_rail: Color::Rgb(75, 85, 99),        // #4b5563
            player_track: Color::Rgb(159, 117, 255),    // #9f75ff
        }
    }

    pub fn light() -> Self {
        Self {
            primary: Color::Rgb(0, 153, 225),           // #0099e1
            text: Color::Rgb(74, 74, 74),               // #4a4a4a
            text_secondary: Color::Rgb(150, 151, 151),  // #969797
            accent: Color::Rgb(112, 86, 151),           // #705697
            success: Color::Green,
            error: Color::Red,
            border: Color::Rgb(74, 74, 74),             // #4a4a4a
            highlight: Color::Rgb(0, 153, 225),         // #0099e1
            container: Color::Rgb(232, 232, 232),       // #e8e8e8
            player_background: Color::Rgb(232, 232, 232), // #e8e8e8
            player_rail: Color::Rgb(150, 151, 151),     // #969797
            player_track: Color::Rgb(0, 153, 225),      // #0099e1
        }
    }

    pub fn from_name(theme_name: &str) -> Self {
        match theme_name {
            "Podcastr" => Self::podcastr(),
            "Dark" => Self::dark(),
            "Light" => Self::light(),
            _ => {
                log::warn!("Unknown theme '{}', using Podcastr", theme_name);
                Self::podcastr()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeManager {
    current_theme: String,
    colors: ThemeColors,
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self {
            current_theme: "Podcastr".to_string(),
            colors: ThemeColors::podcastr(),
        }
    }
}

impl ThemeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_theme(&mut self, theme_name: &str) {
        self.current_theme = theme_name.to_string();
        self.colors = ThemeColors::from_name(theme_name);
    }

    pub fn get_colors(&self) -> &ThemeColors {
        &self.colors
    }

    pub fn get_theme_name(&self) -> &str {
        &self.current_theme
    }

    pub fn available_themes() -> Vec<&'static str> {
        vec!["Podcastr", "Dark", "Light"]
    }
}
