//! Request signing: credentials and Signature Version 4

pub mod credentials;
pub mod sigv4;

pub use credentials::{AwsCredentials, Credentials, CredentialsProvider};
pub use sigv4::{sign, SignableRequest, SigningOutput, SigningParams, SEARCH_SERVICE};
