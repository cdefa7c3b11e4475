//! AWS Signature Version 2

mod authorization_v2;
pub use self::authorization_v2::*;

mod presigned_url_v2;
pub use self::presigned_url_v2::*;

mod post_signature_v2;
pub use self::post_signature_v2::*;

mod methods;
pub use self::methods::*;
