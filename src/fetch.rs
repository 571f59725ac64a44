use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::ExtractError;

/// Source of raw page markup.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<String, ExtractError>;
}

/// Plain GET over reqwest: no auth, no custom headers, no retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ExtractError> {
        let client = Client::builder().build().map_err(|source| ExtractError::Http {
            url: String::new(),
            source,
        })?;
        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ExtractError> {
        let http = |source| ExtractError::Http {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http)?;
        check_status(url, response.status())?;

        let body = response.text().await.map_err(http)?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

/// Anything outside 2xx fails the page.
fn check_status(url: &str, status: StatusCode) -> Result<(), ExtractError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ExtractError::Status {
            url: url.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds() {
        assert!(HttpFetcher::new().is_ok());
    }

    #[test]
    fn success_statuses_pass() {
        assert!(check_status("https://zorro-project.com/manual/a.htm", StatusCode::OK).is_ok());
        assert!(check_status("https://zorro-project.com/manual/a.htm", StatusCode::NO_CONTENT).is_ok());
    }

    #[test]
    fn error_statuses_fail_with_url() {
        for status in [
            StatusCode::MOVED_PERMANENTLY,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let err = check_status("https://zorro-project.com/manual/gone.htm", status).unwrap_err();
            assert!(matches!(
                err,
                ExtractError::Status { ref url, status: s } if url.ends_with("gone.htm") && s == status
            ));
        }
    }
}
