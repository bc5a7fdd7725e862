//! Protocol types shared by the parser, the handlers and the pipeline.
//!
//! - [`request`]: the parsed request line, [`HttpMethod`] and [`HttpVersion`]
//! - [`response`]: [`ResponseHead`] and its ordered [`ResponseHeaders`]
//! - [`error`]: [`HttpError`], [`ParseError`], [`SendError`] and [`HpackError`]

mod request;
pub use request::HttpMethod;
pub use request::HttpVersion;
pub use request::RequestLine;

mod response;
pub use response::HeaderIndex;
pub use response::ResponseHead;
pub use response::ResponseHeaders;
pub use response::ResponseHeadersBuilder;

mod error;
pub use error::HpackError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
