//! HTTP client for the recruiting portal with encoding-resilient decoding.
//!
//! Older JPOSTING deployments serve EUC-JP or Shift_JIS without a usable
//! charset header, so the response bytes are trial-decoded against an
//! ordered candidate list and validated by looking for mojibake.

pub mod crawl;

use std::time::Duration;

use encoding_rs::Encoding;
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Canonical listing page; default extraction target, crawl seed, and
/// fallback record URL.
pub const LISTING_URL: &str =
    "https://progres02.jposting.net/pgmitsubishielectric/u/job.phtml";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Candidate encodings in trial order.
static ENCODING_CANDIDATES: [&Encoding; 3] = [
    encoding_rs::EUC_JP,
    encoding_rs::SHIFT_JIS,
    encoding_rs::UTF_8,
];

/// A decoded candidate must contain at least one of these to count as
/// correctly decoded Japanese text.
const SCRIPT_SAMPLE: &str = "あいうえおかきくけこ";

/// How many leading chars of a candidate decode get inspected.
const PROBE_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status} for {url}")]
    Status { status: StatusCode, url: String },
}

/// A fetched document with the encoding that was used to decode it.
#[derive(Debug)]
pub struct FetchedDocument {
    pub url: String,
    pub text: String,
    pub encoding: &'static str,
}

/// Shared HTTP client for all portal requests.
pub struct JobSiteClient {
    client: Client,
}

impl JobSiteClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to build reqwest client");

        Self { client }
    }

    /// Fetches a page and decodes it with the candidate-trial scheme.
    /// Network and HTTP failures are errors; an undecidable encoding is
    /// not: the UTF-8 fallback always yields a document.
    pub async fn fetch_document(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let (text, validated) = decode_candidates(&bytes);
        let encoding = match validated {
            Some(name) => {
                tracing::debug!("decoded {} as {}", url, name);
                name
            }
            None => {
                tracing::warn!(
                    "no encoding candidate validated for {}, continuing with UTF-8",
                    url
                );
                encoding_rs::UTF_8.name()
            }
        };

        Ok(FetchedDocument {
            url: url.to_string(),
            text,
            encoding,
        })
    }
}

impl Default for JobSiteClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Trial-decodes `bytes` against the candidate list. The first candidate
/// whose leading slice contains no replacement character and at least one
/// script-sample character wins. `None` in the second slot means every
/// candidate failed and the text is the lossy UTF-8 fallback.
fn decode_candidates(bytes: &[u8]) -> (String, Option<&'static str>) {
    for encoding in ENCODING_CANDIDATES {
        let (text, _, _) = encoding.decode(bytes);
        let probe: String = text.chars().take(PROBE_CHARS).collect();

        if !probe.contains('\u{FFFD}') && probe.chars().any(|c| SCRIPT_SAMPLE.contains(c)) {
            return (text.into_owned(), Some(encoding.name()));
        }
    }

    let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
    (text.into_owned(), None)
}
