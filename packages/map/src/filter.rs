//! Current filter selection and the refresh each change requires.

use crime_grid_crime_models::{DisplayMode, IncidentQuery};

/// What the layer controller must do after a filter change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// Fetch incidents for this query and rebuild the incident source.
    Refetch(IncidentQuery),
    /// Only switch which incident layer is visible.
    Visibility(DisplayMode),
}

/// The single current `(year, crime type, display mode)` selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    year: i32,
    crime_type: String,
    display_mode: DisplayMode,
}

impl FilterState {
    #[must_use]
    pub fn new(year: i32, crime_type: impl Into<String>, display_mode: DisplayMode) -> Self {
        Self {
            year,
            crime_type: crime_type.into(),
            display_mode,
        }
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn crime_type(&self) -> &str {
        &self.crime_type
    }

    #[must_use]
    pub const fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// The incident query for the current year and crime type.
    #[must_use]
    pub fn query(&self) -> IncidentQuery {
        IncidentQuery {
            year: self.year,
            crime_type: self.crime_type.clone(),
        }
    }

    /// Selects a year. Always requires a refetch.
    #[must_use]
    pub fn set_year(&mut self, year: i32) -> Refresh {
        self.year = year;
        Refresh::Refetch(self.query())
    }

    /// Selects a crime type. Always requires a refetch.
    #[must_use]
    pub fn set_crime_type(&mut self, crime_type: impl Into<String>) -> Refresh {
        self.crime_type = crime_type.into();
        Refresh::Refetch(self.query())
    }

    /// Selects a display mode. Only layer visibility changes.
    #[must_use]
    pub const fn set_display_mode(&mut self, display_mode: DisplayMode) -> Refresh {
        self.display_mode = display_mode;
        Refresh::Visibility(display_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> FilterState {
        FilterState::new(2023, "HOMICIDE", DisplayMode::Heatmap)
    }

    #[test]
    fn year_change_refetches_with_new_year() {
        let mut filter = state();
        assert_eq!(
            filter.set_year(2022),
            Refresh::Refetch(IncidentQuery {
                year: 2022,
                crime_type: "HOMICIDE".to_string(),
            })
        );
        assert_eq!(filter.year(), 2022);
    }

    #[test]
    fn crime_type_change_refetches_and_keeps_mode() {
        let mut filter = state();
        let refresh = filter.set_crime_type("THEFT");

        assert_eq!(refresh, Refresh::Refetch(filter.query()));
        assert_eq!(filter.crime_type(), "THEFT");
        assert_eq!(filter.display_mode(), DisplayMode::Heatmap);
    }

    #[test]
    fn display_mode_change_only_touches_visibility() {
        let mut filter = state();
        let before = filter.query();

        assert_eq!(
            filter.set_display_mode(DisplayMode::Pins),
            Refresh::Visibility(DisplayMode::Pins)
        );
        assert_eq!(filter.query(), before);
    }
}
