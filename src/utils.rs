use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

static WARNED_MESSAGES: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

pub fn warn_once(message: impl Into<String>) {
    let message = message.into();
    let cache = WARNED_MESSAGES.get_or_init(|| Mutex::new(HashSet::new()));

    if let Ok(mut warned) = cache.lock()
        && warned.insert(message.clone())
    {
        eprintln!("{message}");
    }
}

#[derive(Clone)]
pub struct NumberFormatOptions {
    pub use_comma: bool,
    pub use_human: bool,
    pub locale: String,
    pub decimal_places: usize,
}

impl Default for NumberFormatOptions {
    fn default() -> Self {
        Self {
            use_comma: false,
            use_human: false,
            locale: "en".to_string(),
            decimal_places: 2,
        }
    }
}

fn locale_for(name: &str) -> Locale {
    match name {
        "de" => Locale::de,
        "fr" => Locale::fr,
        "es" => Locale::es,
        "it" => Locale::it,
        "ja" => Locale::ja,
        "ko" => Locale::ko,
        "zh" => Locale::zh,
        _ => Locale::en,
    }
}

/// Format a count for display. Accepts both u32 and u64.
pub fn format_number(n: impl Into<u64>, options: &NumberFormatOptions) -> String {
    let n: u64 = n.into();

    if options.use_human {
        let (scaled, suffix) = if n >= 1_000_000_000_000 {
            (n as f64 / 1_000_000_000_000.0, "t")
        } else if n >= 1_000_000_000 {
            (n as f64 / 1_000_000_000.0, "b")
        } else if n >= 1_000_000 {
            (n as f64 / 1_000_000.0, "m")
        } else if n >= 1_000 {
            (n as f64 / 1_000.0, "k")
        } else {
            return n.to_string();
        };
        format!("{scaled:.prec$}{suffix}", prec = options.decimal_places)
    } else if options.use_comma {
        n.to_formatted_string(&locale_for(&options.locale))
    } else {
        n.to_string()
    }
}

/// Format a per-day rate, e.g. "12.5" or "1,204.25".
pub fn format_rate(rate: f64, options: &NumberFormatOptions) -> String {
    let fixed = format!("{rate:.prec$}", prec = options.decimal_places);
    if !options.use_comma || rate < 1_000.0 {
        return fixed;
    }

    let locale = locale_for(&options.locale);
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let whole = whole
        .parse::<u64>()
        .map(|w| w.to_formatted_string(&locale))
        .unwrap_or_else(|_| whole.to_string());

    if fraction.is_empty() {
        whole
    } else {
        format!("{whole}{}{fraction}", locale.decimal())
    }
}

/// Day-first date, marking today with a trailing `*`.
pub fn format_date_for_display(date: NaiveDate) -> String {
    let formatted = date.format("%d/%m/%Y").to_string();
    if date == chrono::Local::now().date_naive() {
        format!("{formatted}*")
    } else {
        formatted
    }
}
