use std::fmt;

/// The operation a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Action {
    ListAllMyBuckets,
    GetBucketLocation,
    ListBucket,
    CreateBucket,
    DeleteBucket,
    HeadBucket,
    GetObject,
    HeadObject,
    PutObject,
    DeleteObject,
    /// Browser-based upload through a POST policy
    PostObject,
    /// A call to the security token service
    Sts,
}

impl Action {
    /// The IAM action name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListAllMyBuckets => "s3:ListAllMyBuckets",
            Self::GetBucketLocation => "s3:GetBucketLocation",
            Self::ListBucket | Self::HeadBucket => "s3:ListBucket",
            Self::CreateBucket => "s3:CreateBucket",
            Self::DeleteBucket => "s3:DeleteBucket",
            Self::GetObject | Self::HeadObject => "s3:GetObject",
            Self::PutObject | Self::PostObject => "s3:PutObject",
            Self::DeleteObject => "s3:DeleteObject",
            Self::Sts => "sts:AssumeRole",
        }
    }

    /// Requests for these actions may be signed for any region.
    #[must_use]
    pub const fn skips_region_check(self) -> bool {
        matches!(self, Self::GetBucketLocation | Self::ListAllMyBuckets)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(Action::GetObject.to_string(), "s3:GetObject");
        assert_eq!(Action::HeadObject.as_str(), Action::GetObject.as_str());
        assert_eq!(Action::PostObject.as_str(), "s3:PutObject");
    }

    #[test]
    fn region_exceptions() {
        assert!(Action::GetBucketLocation.skips_region_check());
        assert!(Action::ListAllMyBuckets.skips_region_check());
        assert!(!Action::GetObject.skips_region_check());
    }
}
