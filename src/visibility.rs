/// One of the three plotted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Raw,
    Scaled,
    Duty,
}

impl Series {
    pub const ALL: [Series; 3] = [Series::Raw, Series::Scaled, Series::Duty];

    /// Maps the toggle keys `r`, `s` and `p`.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'r' => Some(Series::Raw),
            's' => Some(Series::Scaled),
            'p' => Some(Series::Duty),
            _ => None,
        }
    }

    /// Legend label.
    pub fn label(self) -> &'static str {
        match self {
            Series::Raw => "Raw",
            Series::Scaled => "Scaled",
            Series::Duty => "PWM (%)",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Series::Raw => "Raw",
            Series::Scaled => "Scaled",
            Series::Duty => "PWM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFlags {
    pub raw: bool,
    pub scaled: bool,
    pub duty: bool,
}

impl Default for VisibilityFlags {
    fn default() -> Self {
        Self {
            raw: true,
            scaled: true,
            duty: true,
        }
    }
}

impl VisibilityFlags {
    pub fn is_visible(&self, series: Series) -> bool {
        match series {
            Series::Raw => self.raw,
            Series::Scaled => self.scaled,
            Series::Duty => self.duty,
        }
    }

    /// Flips the flag for `series` and returns the status line to show the user.
    pub fn toggle(&mut self, series: Series) -> String {
        let flag = match series {
            Series::Raw => &mut self.raw,
            Series::Scaled => &mut self.scaled,
            Series::Duty => &mut self.duty,
        };
        *flag = !*flag;
        format!(
            "{} display {}",
            series.display_name(),
            if *flag { "ON" } else { "OFF" }
        )
    }
}
