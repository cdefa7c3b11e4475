mod body;
pub use self::body::*;

mod ordered_headers;
pub use self::ordered_headers::OrderedHeaders;

mod ordered_qs;
pub use self::ordered_qs::*;

mod aws_chunked_stream;
pub use self::aws_chunked_stream::*;

mod multipart;
pub use self::multipart::*;
