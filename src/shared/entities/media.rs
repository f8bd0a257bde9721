/// Audio content handed to the provider, independent of where it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// Absolute URL the provider can fetch.
    Url(String),
    /// Base64 payload sent along with the job request.
    Inline {
        content_type: String,
        data_base64: String,
    },
}

impl MediaRef {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Inline { .. } => "inline",
        }
    }
}
