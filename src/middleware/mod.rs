//! HTTP middleware

pub mod preflight;
pub mod request_id;

pub use preflight::preflight_no_content;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
