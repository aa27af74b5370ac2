//! Text rendering of the summary screen.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use piguard_observable::{Cell, Disposable, DisposablesBag};

use crate::view_model::SummaryViewModel;

/// Placeholder shown for a sensor without a reading.
const MISSING: &str = "--";

/// Renders a [`SummaryViewModel`] into named text labels.
///
/// The view binds one observer per cell and keeps every observation in its
/// [`DisposablesBag`]; dropping the view (or calling
/// [`detach`](Self::detach)) stops all updates.
pub struct SummaryView {
    labels: Arc<Mutex<BTreeMap<&'static str, String>>>,
    bag: DisposablesBag,
}

impl SummaryView {
    /// Binds a new view to `model`, rendering its current state immediately.
    #[must_use]
    pub fn attach(model: &SummaryViewModel) -> Self {
        let view = Self {
            labels: Arc::default(),
            bag: DisposablesBag::new(),
        };

        view.show("date", &model.date, String::clone);
        view.show("time", &model.time, String::clone);
        view.show("picture", &model.picture, or_missing);
        view.show("temperature", &model.temperature, or_missing);
        view.show("humidity", &model.humidity, or_missing);
        view.show("pressure", &model.pressure, or_missing);
        view.show("co2", &model.co2, or_missing);

        view.show("temperature_chart", &model.temperature_history, |points| chart(points));
        view.show("humidity_chart", &model.humidity_history, |points| chart(points));
        view.show("pressure_chart", &model.pressure_history, |points| chart(points));
        view.show("co2_chart", &model.co2_history, |points| chart(points));
        view.show("motion", &model.motion_history, |events| {
            events
                .iter()
                .map(|(at, picture)| format!("{} {picture}", at.format("%d %b %H:%M")))
                .collect::<Vec<_>>()
                .join(", ")
        });

        view.show("system", &model.system_on, |on| switch(*on));
        view.show("surveillance", &model.surveillance_on, |on| switch(*on));
        view.show("error", &model.last_error, |error| {
            if let Some(error) = error {
                tracing::error!(%error, "summary error");
            }
            error.clone().unwrap_or_default()
        });

        view
    }

    fn show<T>(
        &self,
        label: &'static str,
        cell: &Cell<T>,
        render: impl Fn(&T) -> String + Send + Sync + 'static,
    ) where
        T: Clone + Send + Sync + 'static,
    {
        let labels = Arc::clone(&self.labels);
        cell.bind(move |value| {
            let text = render(value);
            tracing::trace!(label, %text, "label rendered");
            labels.lock().insert(label, text);
        })
        .add_to_disposables_bag(&self.bag);
    }

    /// Returns the current text of `label`.
    #[must_use]
    pub fn label(&self, label: &str) -> Option<String> {
        self.labels.lock().get(label).cloned()
    }

    /// Returns every label with its current text.
    #[must_use]
    pub fn labels(&self) -> BTreeMap<&'static str, String> {
        self.labels.lock().clone()
    }

    /// Stops rendering updates.
    pub fn detach(&self) {
        self.bag.dispose_all();
    }
}

impl core::fmt::Debug for SummaryView {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SummaryView")
            .field("labels", &self.labels.lock().len())
            .field("bag", &self.bag)
            .finish()
    }
}

fn or_missing(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| MISSING.to_owned())
}

fn switch(on: bool) -> String {
    if on { "on" } else { "off" }.to_owned()
}

fn chart<V: core::fmt::Display>(points: &[(V, String)]) -> String {
    points
        .iter()
        .map(|(value, at)| format!("{at}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, Settings};
    use crate::station::{SimulatedStation, Station};
    use std::time::Duration;

    fn model() -> SummaryViewModel {
        let settings = Settings::new()
            .with_site("pi.local")
            .with_credentials(Credentials::new("admin", "pw"));
        let station = SimulatedStation::new(settings.clone()).with_latency(Duration::ZERO);
        SummaryViewModel::new(Station::new(station), settings)
    }

    #[test]
    fn attach_renders_placeholders() {
        let model = model();
        let view = SummaryView::attach(&model);

        assert_eq!(view.label("date").as_deref(), Some("01 Jan"));
        assert_eq!(view.label("temperature").as_deref(), Some("--"));
        assert_eq!(view.label("system").as_deref(), Some("off"));
        assert_eq!(view.label("error").as_deref(), Some(""));
    }

    #[test]
    fn labels_follow_cells() {
        let model = model();
        let view = SummaryView::attach(&model);

        model.temperature.set(Some("21°C".into()));
        model.co2_history.set(vec![(415, "14:05".into())]);

        assert_eq!(view.label("temperature").as_deref(), Some("21°C"));
        assert_eq!(view.label("co2_chart").as_deref(), Some("14:05=415"));
    }

    #[test]
    fn dropping_view_releases_observers() {
        let model = model();
        let view = SummaryView::attach(&model);
        assert_eq!(model.temperature.observer_count(), 1);

        drop(view);

        assert_eq!(model.temperature.observer_count(), 0);
        assert_eq!(model.system_on.observer_count(), 0);
    }

    #[test]
    fn detach_freezes_labels() {
        let model = model();
        let view = SummaryView::attach(&model);

        view.detach();
        model.time.set("23:59".into());

        assert_eq!(view.label("time").as_deref(), Some("00:00"));
    }
}
