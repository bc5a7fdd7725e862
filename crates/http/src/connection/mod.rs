//! Client connection handling.
//!
//! [`HttpConnection`] owns both halves of one client connection and runs the
//! request pipeline on it: requests are read into a [`RequestReader`] buffer,
//! parsed in place, handed to a [`RequestHandler`](crate::handler::RequestHandler)
//! and answered through a [`ResponseWriter`], strictly in arrival order.
//!
//! Failures are logged through a shared [`ErrorLogLimiter`] so that a burst of
//! broken clients cannot flood the log.

mod error_log;
mod http_connection;
mod request_reader;
mod response_writer;

pub use error_log::{DEFAULT_ERROR_LOG_LIMIT, ErrorLogLimiter};
pub use http_connection::{ConnectionContext, HttpConnection};
pub use request_reader::RequestReader;
pub use response_writer::ResponseWriter;
