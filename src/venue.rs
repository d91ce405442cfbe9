//! Raw venue records as they appear in the source CSV.

use serde::{Deserialize, Deserializer};

/// Category of coffee shops in the dataset.
pub const COFFEE_SHOP: &str = "кофейня";

/// A single row deserialized from the venues CSV.
///
/// Only base fields are read. The source file also carries its own
/// `middle_avg_bill` / `middle_coffee_cup` columns; those are ignored and
/// recomputed by [`crate::extract`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Venue {
    pub name: String,
    pub address: String,
    pub category: String,
    pub hours: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub rating: Option<f64>,
    pub price: Option<String>,
    pub avg_bill: Option<String>,
    /// `1` for chain venues. Known to be wrong for small chains; passed through
    /// without correction.
    pub chain: u8,
    pub district: String,
    #[serde(default, deserialize_with = "deserialize_seats")]
    pub seats: Option<u32>,
}

impl Venue {
    pub fn is_chain(&self) -> bool {
        self.chain == 1
    }
}

/// Accepts `120`, `120.0` or an empty field. The source export writes seats as
/// floats because of missing values.
fn deserialize_seats<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let value: f64 = raw
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid seats value {raw:?}")))?;
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "seats must be a non-negative integer, got {raw:?}"
        )));
    }

    Ok(Some(value as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "name,address,category,hours,lat,lng,rating,price,avg_bill,middle_avg_bill,middle_coffee_cup,chain,district,seats";

    fn parse(row: &str) -> Result<Venue, csv::Error> {
        let data = format!("{HEADER}\n{row}\n");
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        rdr.deserialize().next().expect("one row")
    }

    #[test]
    fn test_deserialize_full_row() {
        let venue = parse(
            "Кофемания,\"Москва, улица Арбат, 10\",кофейня,\"ежедневно, 08:00–23:00\",55.75,37.59,4.5,выше среднего,Цена одной чашки капучино:250–300 ₽,,275.0,1,Центральный административный округ,40.0",
        )
        .unwrap();

        assert_eq!(venue.name, "Кофемания");
        assert_eq!(venue.address, "Москва, улица Арбат, 10");
        assert_eq!(venue.category, COFFEE_SHOP);
        assert_eq!(venue.rating, Some(4.5));
        assert!(venue.is_chain());
        assert_eq!(venue.seats, Some(40));
    }

    #[test]
    fn test_empty_optional_fields_are_absent() {
        let venue = parse(
            "Шаурма,\"Москва, Тверская улица, 1\",быстрое питание,,55.7,37.6,,,,,,0,Центральный административный округ,",
        )
        .unwrap();

        assert_eq!(venue.hours, None);
        assert_eq!(venue.rating, None);
        assert_eq!(venue.price, None);
        assert_eq!(venue.avg_bill, None);
        assert_eq!(venue.seats, None);
        assert!(!venue.is_chain());
    }

    #[test]
    fn test_seats_rejects_negative_and_fractional() {
        let base = "Кафе,\"Москва, улица Ленина, 2\",кафе,,55.7,37.6,4.0,,,,,0,Центральный административный округ,";
        assert!(parse(&format!("{base}-5")).is_err());
        assert!(parse(&format!("{base}12.5")).is_err());
        assert_eq!(parse(&format!("{base}12")).unwrap().seats, Some(12));
    }
}
