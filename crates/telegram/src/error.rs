use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Channel(#[from] tgbridge_channels::Error),
}

impl From<Error> for tgbridge_channels::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Channel(inner) => inner,
            Error::Telegram(e) => Self::external("telegram request", e),
            Error::Reqwest(e) => Self::external("http request", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_errors_pass_through_unchanged() {
        let err = Error::from(tgbridge_channels::Error::unsupported("login"));
        let channel: tgbridge_channels::Error = err.into();
        assert!(channel.is_unsupported());
    }

    #[test]
    fn request_errors_keep_context() {
        let err = Error::from(teloxide::RequestError::Io(std::io::Error::other("reset").into()));
        let channel: tgbridge_channels::Error = err.into();
        assert!(!channel.is_unsupported());
        assert!(channel.to_string().contains("telegram request"));
    }
}
