use crate::errors::ValidationError;
use crate::schema::{Entity, FieldDef, Record, ScalarType, Shape};
use crate::value::Value;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const SUMMARY_MAX_LEN: usize = 200;

pub static LOCATION_SHAPE: Shape = Shape::new(
    "Location",
    &[
        FieldDef::scalar("city", ScalarType::Text),
        FieldDef::scalar("country", ScalarType::Text),
    ],
);

pub static WEATHER_FORECAST_SHAPE: Shape = Shape::new(
    "WeatherForecast",
    &[
        FieldDef::scalar("id", ScalarType::Long),
        FieldDef::scalar("date", ScalarType::Date),
        FieldDef::scalar("temperatureC", ScalarType::Int),
        FieldDef::scalar("temperatureF", ScalarType::Int),
        FieldDef::scalar("summary", ScalarType::Text),
        FieldDef::object("location", &LOCATION_SHAPE),
    ],
);

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

impl Record for Location {
    fn field_value(&self, path: &[&str]) -> Value {
        match path {
            ["city"] => Value::Text(self.city.clone()),
            ["country"] => Value::Text(self.country.clone()),
            _ => Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub id: i64,
    pub date: NaiveDate,
    pub temperature_c: i32,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub location: Location,
}

impl WeatherForecast {
    pub fn temperature_f(&self) -> i32 {
        32 + (f64::from(self.temperature_c) / 0.5556) as i32
    }
}

impl Record for WeatherForecast {
    fn field_value(&self, path: &[&str]) -> Value {
        match path {
            ["id"] => Value::Long(self.id),
            ["date"] => Value::Date(self.date),
            ["temperatureC"] => Value::Int(self.temperature_c),
            ["temperatureF"] => Value::Int(self.temperature_f()),
            ["summary"] => self.summary.clone().into(),
            ["location", rest @ ..] => self.location.field_value(rest),
            _ => Value::Null,
        }
    }
}

impl Entity for WeatherForecast {
    fn shape() -> &'static Shape {
        &WEATHER_FORECAST_SHAPE
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Outward shape of a forecast, built from the entity after the page window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecastResponse {
    pub id: i64,
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: Option<String>,
    pub city: String,
}

impl From<WeatherForecast> for WeatherForecastResponse {
    fn from(wf: WeatherForecast) -> Self {
        Self {
            id: wf.id,
            date: wf.date,
            temperature_c: wf.temperature_c,
            temperature_f: wf.temperature_f(),
            summary: wf.summary,
            city: wf.location.city,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl CreateForecast {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_summary(&self.summary)
    }

    /// The entity to insert; the store assigns the id.
    pub fn into_entity(self) -> WeatherForecast {
        WeatherForecast {
            id: 0,
            date: self.date,
            temperature_c: self.temperature_c,
            summary: Some(self.summary),
            location: Location {
                city: self.city.unwrap_or_default(),
                country: self.country.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateForecast {
    pub temperature_c: i32,
    pub summary: String,
}

impl UpdateForecast {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_summary(&self.summary)
    }

    pub fn apply_to(self, wf: &mut WeatherForecast) {
        wf.temperature_c = self.temperature_c;
        wf.summary = Some(self.summary);
    }
}

fn validate_summary(summary: &str) -> Result<(), ValidationError> {
    if summary.chars().count() > SUMMARY_MAX_LEN {
        return Err(ValidationError {
            field: "summary",
            reason: format!("must be at most {} characters", SUMMARY_MAX_LEN),
        });
    }
    Ok(())
}
