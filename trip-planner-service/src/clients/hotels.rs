use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{clients::backend::REQUEST_TIMEOUT, error::PlannerError, models::HotelOption};

/// Best-effort hotel lookup for the plan display. Failures never surface:
/// the caller substitutes [`mock_hotels`] under `FailurePolicy::SilentFallback`.
#[async_trait]
pub trait HotelProvider: Send + Sync {
    async fn search(
        &self,
        city: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<HotelOption>, PlannerError>;
}

pub struct HttpHotelProvider {
    http: reqwest::Client,
    base_url: String,
}

impl HttpHotelProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PlannerError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl HotelProvider for HttpHotelProvider {
    async fn search(
        &self,
        city: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<HotelOption>, PlannerError> {
        debug!(city = %city, "searching hotels");
        let raw = self
            .http
            .post(&self.base_url)
            .json(&serde_json::json!({
                "city": city,
                "start_date": start_date,
                "end_date": end_date,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Value>>()
            .await?;

        Ok(raw.iter().filter_map(normalize_hotel).collect())
    }
}

/// Map one raw provider record onto the canonical [`HotelOption`] shape.
///
/// Providers disagree on field names (`name` vs `hotel_name`, `price` vs
/// `price_per_night`, numeric vs string prices); that variance stops here
/// and does not leak past the client boundary. Records without any usable
/// name are dropped.
pub fn normalize_hotel(raw: &Value) -> Option<HotelOption> {
    let name = string_field(raw, &["name", "hotel_name", "hotelName"])?;
    let address =
        string_field(raw, &["address", "hotel_address", "location"]).unwrap_or_default();
    let price = string_field(raw, &["price", "price_per_night", "pricePerNight", "price_estimate"])
        .unwrap_or_else(|| "Contact for pricing".to_string());
    let rating = ["rating", "stars"]
        .iter()
        .find_map(|key| raw.get(key).and_then(Value::as_f64));

    Some(HotelOption {
        name,
        address,
        price,
        rating,
    })
}

fn string_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Fixed fallback list rendered whenever the provider call fails.
pub fn mock_hotels(city: &str) -> Vec<HotelOption> {
    vec![
        HotelOption {
            name: format!("Grand {city} Hotel"),
            address: format!("1 Central Plaza, {city}"),
            price: "$180/night".to_string(),
            rating: Some(4.5),
        },
        HotelOption {
            name: format!("{city} Riverside Inn"),
            address: format!("24 Waterfront Road, {city}"),
            price: "$120/night".to_string(),
            rating: Some(4.0),
        },
        HotelOption {
            name: "The Old Town Boutique".to_string(),
            address: format!("Old Town Square, {city}"),
            price: "$95/night".to_string(),
            rating: Some(3.5),
        },
        HotelOption {
            name: format!("{city} Budget Stay"),
            address: format!("8 Station Street, {city}"),
            price: "$60/night".to_string(),
            rating: Some(3.0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_fields_pass_through() {
        let hotel = normalize_hotel(&json!({
            "name": "Hotel Lutetia",
            "address": "45 Boulevard Raspail",
            "price": "$400/night",
            "rating": 4.8,
        }))
        .unwrap();
        assert_eq!(hotel.name, "Hotel Lutetia");
        assert_eq!(hotel.rating, Some(4.8));
    }

    #[test]
    fn polymorphic_field_names_are_normalized() {
        let hotel = normalize_hotel(&json!({
            "hotel_name": "Le Meurice",
            "location": "228 Rue de Rivoli",
            "price_per_night": 520,
            "stars": 5,
        }))
        .unwrap();
        assert_eq!(hotel.name, "Le Meurice");
        assert_eq!(hotel.address, "228 Rue de Rivoli");
        assert_eq!(hotel.price, "520");
        assert_eq!(hotel.rating, Some(5.0));
    }

    #[test]
    fn nameless_records_are_dropped() {
        assert!(normalize_hotel(&json!({"price": "$10"})).is_none());
    }

    #[test]
    fn missing_price_gets_placeholder() {
        let hotel = normalize_hotel(&json!({"name": "Mystery Lodge"})).unwrap();
        assert_eq!(hotel.price, "Contact for pricing");
    }

    #[test]
    fn mock_list_is_between_three_and_six_entries() {
        let hotels = mock_hotels("Paris");
        assert!((3..=6).contains(&hotels.len()));
        assert!(hotels[0].name.contains("Paris"));
    }
}
