//! Plain-text rendering of controller state.

use std::fmt::Write;

use chrono::Local;
use weather_core::{Controller, LocationCandidate, WeatherView};

/// Full screen: loading indicator or session, then the search surface.
pub fn screen(controller: &Controller) -> String {
    let state = controller.state();
    let mut out = String::from("\n");

    if state.loading {
        out.push_str("  ... loading weather ...\n");
    } else {
        out.push_str(&session(controller));
    }

    if let Some(failure) = &state.forecast_error {
        let _ = writeln!(out, "  ! {} (type :retry)", failure.error);
    }

    if state.search_open {
        let _ = writeln!(out, "  search> {}", state.query);
        if let Some(e) = &state.search_error {
            let _ = writeln!(out, "  ! {e}");
        }
        out.push_str(&candidates(controller.visible_candidates()));
    }

    out
}

pub fn session(controller: &Controller) -> String {
    let Some(view) = controller.view() else {
        return String::new();
    };

    let mut out = view_lines(&view);
    if let Some(at) = controller.state().loaded_at {
        let _ = writeln!(out, "  updated {}", at.with_timezone(&Local).format("%H:%M"));
    }
    out
}

fn view_lines(view: &WeatherView<'_>) -> String {
    let mut out = String::new();
    let current = view.current;

    let _ = writeln!(out, "  {}", view.title());
    let _ = writeln!(out, "  [{}]", view.image_key);
    let _ = writeln!(out, "  {:.0}\u{b0}  {}", current.temp_c, current.condition.text);
    let _ = writeln!(
        out,
        "  wind {}km  humidity {}%  sunrise {}",
        current.wind_kph,
        current.humidity,
        view.sunrise.unwrap_or("-")
    );

    for day in view.days {
        let summary = day
            .day
            .as_ref()
            .map(|d| format!("{:.0}\u{b0}/{:.0}\u{b0}", d.maxtemp_c, d.mintemp_c))
            .unwrap_or_default();
        let _ = writeln!(out, "    {}  {}", day.date.format("%a %d"), summary);
    }
    out
}

pub fn candidates(list: &[LocationCandidate]) -> String {
    let mut out = String::new();
    for (i, candidate) in list.iter().enumerate() {
        let _ = writeln!(out, "  :{}  {}", i + 1, candidate.label());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::ImageCatalog;
    use weather_core::testing::sample_session;

    #[test]
    fn candidates_are_numbered_from_one() {
        let list = vec![
            LocationCandidate::new("London", "UK"),
            LocationCandidate::new("London", "CA"),
        ];
        let out = candidates(&list);

        assert!(out.contains(":1  London, UK"));
        assert!(out.contains(":2  London, CA"));
    }

    #[test]
    fn view_lines_include_core_fields() {
        let session = sample_session("Kottawa", "Sri Lanka", "Sunny");
        let images = ImageCatalog::default();
        let out = view_lines(&WeatherView::from_session(&session, &images));

        assert!(out.contains("Kottawa, Sri Lanka"));
        assert!(out.contains("[sun]"));
        assert!(out.contains("humidity 79%"));
        assert!(out.contains("sunrise 06:01 AM"));
    }
}
