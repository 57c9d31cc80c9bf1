use chrono::{Duration, NaiveDate};
use queryspec_core::{Location, WeatherForecast};
use rand::Rng;

/// Summary label and its temperature band in Celsius, lower inclusive, upper exclusive.
pub const SUMMARY_BANDS: [(&str, i32, i32); 10] = [
    ("Freezing", -20, 0),
    ("Bracing", 0, 5),
    ("Chilly", 5, 10),
    ("Cool", 10, 15),
    ("Mild", 15, 20),
    ("Warm", 20, 25),
    ("Balmy", 25, 30),
    ("Hot", 30, 35),
    ("Sweltering", 35, 40),
    ("Scorching", 40, 45),
];

const CITIES: [(&str, &str); 6] = [
    ("Oslo", "Norway"),
    ("Lisbon", "Portugal"),
    ("Nairobi", "Kenya"),
    ("Osaka", "Japan"),
    ("Lima", "Peru"),
    ("Perth", "Australia"),
];

/// `per_summary` forecasts for each band, dated `today`, `today - 1`, and so on.
/// Ids run from 1 in band order. The same rng seed always yields the same rows.
pub fn seed_forecasts<R: Rng + ?Sized>(
    rng: &mut R,
    today: NaiveDate,
    per_summary: usize,
) -> Vec<WeatherForecast> {
    let mut out = Vec::with_capacity(SUMMARY_BANDS.len() * per_summary);
    for (summary, lo, hi) in SUMMARY_BANDS {
        for i in 0..per_summary {
            let (city, country) = CITIES[rng.gen_range(0..CITIES.len())];
            out.push(WeatherForecast {
                id: out.len() as i64 + 1,
                date: today - Duration::days(i as i64),
                temperature_c: rng.gen_range(lo..hi),
                summary: Some(summary.to_string()),
                location: Location {
                    city: city.to_string(),
                    country: country.to_string(),
                },
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 10).unwrap()
    }

    #[test]
    fn test_temperatures_stay_in_band() {
        let rows = seed_forecasts(&mut StdRng::seed_from_u64(42), today(), 5);
        assert_eq!(rows.len(), 50);
        for row in &rows {
            let (_, lo, hi) = SUMMARY_BANDS
                .iter()
                .find(|(s, _, _)| Some(*s) == row.summary.as_deref())
                .unwrap();
            assert!((*lo..*hi).contains(&row.temperature_c), "{row:?}");
        }
    }

    #[test]
    fn test_ids_and_dates() {
        let rows = seed_forecasts(&mut StdRng::seed_from_u64(1), today(), 3);
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=30).collect::<Vec<_>>());
        assert_eq!(rows[0].date, today());
        assert_eq!(rows[2].date, today() - Duration::days(2));
        assert_eq!(rows[3].date, today());
    }

    #[test]
    fn test_same_seed_same_rows() {
        let a = seed_forecasts(&mut StdRng::seed_from_u64(7), today(), 4);
        let b = seed_forecasts(&mut StdRng::seed_from_u64(7), today(), 4);
        assert_eq!(a, b);
    }
}
