//! # API Module
//!
//! Backend communication for the client. All traffic flows through the
//! [`ApiGateway`], which owns header injection and error normalization.

pub mod airline;
pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod models;

pub use airline::AirlineApi;
pub use error::ApiError;
pub use gateway::{
    ApiGateway, CredentialProvider, Envelope, HttpRequest, HttpResponse, Method, NoCredentials,
    RequestEnvelope, ReqwestTransport, Transport, TransportError,
};
