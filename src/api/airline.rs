//! Airline API
//!
//! Typed wrappers over the backend endpoints the screens consume. Each method
//! builds one request and hands it to the gateway; no state is kept here.

use serde::Serialize;
use serde_json::Value;

use super::endpoints;
use super::error::ApiError;
use super::gateway::{ApiGateway, RequestEnvelope};
use super::models::{Airport, BookingRequest, Customer, CustomerUpdate, Flight, Meal, Trip};

#[derive(Clone)]
pub struct AirlineApi {
    gateway: ApiGateway,
}

impl AirlineApi {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// Profile of the logged-in customer
    pub async fn customer_profile(&self) -> Result<Customer, ApiError> {
        self.gateway.execute(RequestEnvelope::get(endpoints::CUSTOMER_SELF)).await
    }

    pub async fn update_customer_profile(&self, update: &CustomerUpdate) -> Result<Customer, ApiError> {
        let request = RequestEnvelope::put(endpoints::CUSTOMER_SELF).json(update)?;
        self.gateway.execute(request).await
    }

    /// Flights between two airports on a given date (`YYYY-MM-DD`)
    pub async fn search_flights(&self, from: &str, to: &str, date: &str) -> Result<Vec<Flight>, ApiError> {
        let request = RequestEnvelope::get(endpoints::FLIGHTS)
            .query("from", from)
            .query("to", to)
            .query("date", date);
        self.gateway.execute(request).await
    }

    pub async fn filter_trips<F: Serialize + ?Sized>(&self, filter: &F) -> Result<Vec<Trip>, ApiError> {
        let request = RequestEnvelope::post(endpoints::TRIPS_FILTER).json(filter)?;
        self.gateway.execute(request).await
    }

    pub async fn flight_meals(&self, flight_id: &str) -> Result<Vec<Meal>, ApiError> {
        self.gateway
            .execute(RequestEnvelope::get(endpoints::flight_meals(flight_id)?))
            .await
    }

    /// Price quote; the backend owns the pricing rules and the result shape
    pub async fn calculate_ticket_price<B: Serialize + ?Sized>(&self, selection: &B) -> Result<Value, ApiError> {
        let request = RequestEnvelope::post(endpoints::TICKET_CALCULATION).json(selection)?;
        self.gateway.execute(request).await
    }

    pub async fn process_payment(&self, booking: &BookingRequest) -> Result<Value, ApiError> {
        let request = RequestEnvelope::post(endpoints::TICKET_PAYMENT).json(booking)?;
        self.gateway.execute(request).await
    }

    /// Airports, optionally narrowed by country and region
    pub async fn airports(&self, country: Option<&str>, region: Option<&str>) -> Result<Vec<Airport>, ApiError> {
        let mut request = RequestEnvelope::get(endpoints::AIRPORTS);
        if let Some(country) = country {
            request = request.query("country", country);
        }
        if let Some(region) = region {
            request = request.query("region", region);
        }
        self.gateway.execute(request).await
    }

    pub async fn customer_trips(&self) -> Result<Vec<Trip>, ApiError> {
        self.gateway.execute(RequestEnvelope::get(endpoints::CUSTOMER_TRIPS)).await
    }

    /// Trips matching a passenger last name and booking confirmation code
    pub async fn find_trip_for_check_in(
        &self,
        passenger_last_name: &str,
        confirmation_code: &str,
    ) -> Result<Vec<Trip>, ApiError> {
        let request = RequestEnvelope::get(endpoints::TRIPS_CHECK_IN)
            .query("passengerLastName", passenger_last_name)
            .query("confirmationCode", confirmation_code);
        self.gateway.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gateway::testing::{ScriptedTransport, base_url};
    use crate::api::gateway::{Method, NoCredentials};
    use serde_json::json;
    use std::sync::Arc;

    fn api(transport: Arc<ScriptedTransport>) -> AirlineApi {
        AirlineApi::new(ApiGateway::new(base_url(), transport, Arc::new(NoCredentials)))
    }

    fn flight_json(id: &str) -> Value {
        json!({
            "id": id,
            "flightNumber": "AM101",
            "departure": "JFK",
            "arrival": "LAX",
            "departureTime": "08:00",
            "arrivalTime": "11:30",
            "aircraft": "A320",
            "availableSeats": 12,
            "status": "SCHEDULED"
        })
    }

    #[tokio::test]
    async fn search_flights_sends_query_and_parses_list() {
        let transport = ScriptedTransport::new();
        transport.respond_data(json!([flight_json("f1"), flight_json("f2")]));

        let flights = api(transport.clone())
            .search_flights("JFK", "LAX", "2024-05-01")
            .await
            .unwrap();
        assert_eq!(flights.len(), 2);
        assert_eq!(flights[1].id, "f2");

        let sent = transport.last_request();
        assert_eq!(sent.url.path(), "/api/v1/flights");
        assert_eq!(sent.url.query(), Some("from=JFK&to=LAX&date=2024-05-01"));
    }

    #[tokio::test]
    async fn airports_only_sends_given_filters() {
        let transport = ScriptedTransport::new();
        transport.respond_data(json!([]));
        transport.respond_data(json!([]));

        let api = api(transport.clone());
        api.airports(None, None).await.unwrap();
        assert_eq!(transport.last_request().url.query(), None);

        api.airports(Some("US"), None).await.unwrap();
        assert_eq!(transport.last_request().url.query(), Some("country=US"));
    }

    #[tokio::test]
    async fn check_in_lookup_uses_backend_parameter_names() {
        let transport = ScriptedTransport::new();
        transport.respond_data(json!([]));

        api(transport.clone())
            .find_trip_for_check_in("O'Neil", "XY12Z")
            .await
            .unwrap();
        let pairs: Vec<(String, String)> = transport.last_request().url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("passengerLastName".to_string(), "O'Neil".to_string()),
                ("confirmationCode".to_string(), "XY12Z".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn profile_update_is_a_put_to_self() {
        let transport = ScriptedTransport::new();
        transport.respond_data(json!({
            "id": "c1",
            "firstName": "Ana",
            "lastName": "Lima",
            "email": "ana@example.com",
            "phone": "555",
            "dateOfBirth": "1990-01-01",
            "gender": "FEMALE"
        }));

        let update = CustomerUpdate {
            phone: Some("555".into()),
            ..Default::default()
        };
        let customer = api(transport.clone()).update_customer_profile(&update).await.unwrap();
        assert_eq!(customer.first_name, "Ana");

        let sent = transport.last_request();
        assert_eq!(sent.method, Method::PUT);
        assert_eq!(sent.url.path(), "/api/v1/customers/self");
    }

    #[tokio::test]
    async fn meals_path_embeds_flight_id() {
        let transport = ScriptedTransport::new();
        transport.respond_data(json!([]));

        api(transport.clone()).flight_meals("f42").await.unwrap();
        assert_eq!(transport.last_request().url.path(), "/api/v1/flights/f42/meals");
    }

    #[tokio::test]
    async fn meals_path_keeps_odd_ids_inside_their_segment() {
        let transport = ScriptedTransport::new();
        transport.respond_data(json!([]));

        api(transport.clone()).flight_meals("../admin").await.unwrap();
        assert_eq!(transport.last_request().url.path(), "/api/v1/flights/..%2Fadmin/meals");

        let err = api(transport.clone()).flight_meals("..").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_trip_listing_keeps_status() {
        let transport = ScriptedTransport::new();
        transport.respond(403, r#"{"code":"FORBIDDEN"}"#);

        let err = api(transport).customer_trips().await.unwrap_err();
        assert_eq!(err.status(), Some(403));
    }
}
