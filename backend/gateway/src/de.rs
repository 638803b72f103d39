//! Lenient decoders for numeric columns the gateway may serialize as strings.
use serde::{Deserialize, Deserializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn parse<E: Error>(value: NumberOrString) -> Result<f64, E> {
    match value {
        NumberOrString::Number(number) => Ok(number),
        NumberOrString::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("expected a number, got {text:?}"))),
    }
}

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    parse(NumberOrString::deserialize(deserializer)?)
}

pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(parse)
        .transpose()
}

/// Treats an explicit `null` like a missing field.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
