use chrono::{Datelike, Local, NaiveDateTime, Weekday};
use std::sync::Arc;

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Weekday name table used for partition names.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WeekdayLocale {
    Indonesian,
    English,
}

impl WeekdayLocale {
    /// Accepts `id`, `id_ID`, `id_ID.utf8`, `en`, `en_US`... Unknown codes fall
    /// back to Indonesian.
    pub fn from_code(code: &str) -> Self {
        let lang = code
            .split(|c: char| c == '_' || c == '-' || c == '.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match lang.as_str() {
            "id" | "in" => WeekdayLocale::Indonesian,
            "en" => WeekdayLocale::English,
            _ => {
                tracing::warn!(locale = %code, "Unknown locale, using Indonesian weekday names");
                WeekdayLocale::Indonesian
            }
        }
    }

    pub fn weekday_name(&self, day: Weekday) -> &'static str {
        match self {
            WeekdayLocale::Indonesian => match day {
                Weekday::Mon => "Senin",
                Weekday::Tue => "Selasa",
                Weekday::Wed => "Rabu",
                Weekday::Thu => "Kamis",
                Weekday::Fri => "Jumat",
                Weekday::Sat => "Sabtu",
                Weekday::Sun => "Minggu",
            },
            WeekdayLocale::English => match day {
                Weekday::Mon => "Monday",
                Weekday::Tue => "Tuesday",
                Weekday::Wed => "Wednesday",
                Weekday::Thu => "Thursday",
                Weekday::Fri => "Friday",
                Weekday::Sat => "Saturday",
                Weekday::Sun => "Sunday",
            },
        }
    }
}

/// Derives the daily partition name and the time-of-day stamp from one clock.
#[derive(Clone)]
pub struct PartitionNamer {
    clock: Arc<dyn Clock>,
    locale: WeekdayLocale,
}

impl PartitionNamer {
    pub fn new(clock: Arc<dyn Clock>, locale: WeekdayLocale) -> Self {
        Self { clock, locale }
    }

    pub fn system(locale: WeekdayLocale) -> Self {
        Self::new(Arc::new(SystemClock), locale)
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// e.g. `JUMAT_24-10-2025`
    pub fn partition_name(&self) -> String {
        self.name_for(self.clock.now())
    }

    pub fn name_for(&self, at: NaiveDateTime) -> String {
        let formatted = format!(
            "{}, {}",
            self.locale.weekday_name(at.weekday()),
            at.format("%d-%m-%Y")
        );
        formatted.to_uppercase().replace(", ", "_")
    }

    /// `HH:MM:SS` of `at`. Pair it with `name_for(at)` so a stamp always
    /// belongs to the day of its partition.
    pub fn time_for(&self, at: NaiveDateTime) -> String {
        at.format("%H:%M:%S").to_string()
    }

}
