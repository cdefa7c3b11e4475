//! AWS Signature Version 4

mod amz_content_sha256;
pub use self::amz_content_sha256::*;

mod amz_date;
pub use self::amz_date::*;

mod authorization_v4;
pub use self::authorization_v4::*;

mod presigned_url_v4;
pub use self::presigned_url_v4::*;

mod post_signature_v4;
pub use self::post_signature_v4::*;

mod methods;
pub use self::methods::*;
