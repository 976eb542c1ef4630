//! Backend endpoint paths, relative to the configured base address.

use url::Url;

use super::ApiError;

/// Scratch origin used only to run path-segment encoding
const SEGMENT_ROOT: &str = "http://localhost/";

pub const CUSTOMER_LOGIN: &str = "/customers/login";
pub const CUSTOMER_REGISTER: &str = "/customers/register";
pub const EMPLOYEE_LOGIN: &str = "/employees/login";

pub const CUSTOMER_SELF: &str = "/customers/self";
pub const CUSTOMER_TRIPS: &str = "/customers/self/trips";

pub const FLIGHTS: &str = "/flights";
pub const TRIPS_FILTER: &str = "/trips/filter";
pub const TRIPS_CHECK_IN: &str = "/trips/check-in";

pub const TICKET_CALCULATION: &str = "/tickets/calculation";
pub const TICKET_PAYMENT: &str = "/tickets/payment";

pub const AIRPORTS: &str = "/airports";

/// `/flights/{id}/meals`, with the id percent-encoded as one path segment.
///
/// Ids that are dot segments would be collapsed by URL normalization, so
/// they are rejected along with the empty id.
pub fn flight_meals(flight_id: &str) -> Result<String, ApiError> {
    if matches!(flight_id, "" | "." | "..") {
        return Err(ApiError::InvalidRequest(format!("invalid flight id {:?}", flight_id)));
    }

    let mut url = Url::parse(SEGMENT_ROOT).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidRequest("cannot build flight path".to_string()))?
        .push(FLIGHTS.trim_start_matches('/'))
        .push(flight_id)
        .push("meals");
    Ok(url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_id_is_encoded_as_one_segment() {
        assert_eq!(flight_meals("FL-12").unwrap(), "/flights/FL-12/meals");
        assert_eq!(flight_meals("FL 12").unwrap(), "/flights/FL%2012/meals");
        assert_eq!(flight_meals("../admin").unwrap(), "/flights/..%2Fadmin/meals");
        assert_eq!(flight_meals("a?b#c").unwrap(), "/flights/a%3Fb%23c/meals");
    }

    #[test]
    fn dot_segment_ids_are_rejected() {
        for id in ["", ".", ".."] {
            assert!(matches!(flight_meals(id), Err(ApiError::InvalidRequest(_))));
        }
    }
}
