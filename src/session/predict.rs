//! Request dispatch to the detection endpoint.

use log::{debug, warn};
use thiserror::Error;

use super::model::PredictResponse;
use super::AppConfig;

pub const UPLOAD_FIELD: &str = "image";
pub const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("response was not valid JSON: {0}")]
    BadPayload(String),
    /// The upload bytes could not be read from disk; no request was sent.
    #[error("could not read the upload: {0}")]
    LocalRead(String),
}

/// The one outbound call the session makes. Behind a trait so the controller
/// tests can script responses without a server.
pub trait PredictClient: Send + Sync {
    fn predict(&self, file_name: &str, mime: &str, bytes: &[u8])
        -> Result<PredictResponse, PredictError>;
}

pub struct HttpPredictClient {
    predict_url: String,
    csrf_token: Option<String>,
}

impl HttpPredictClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            predict_url: config.predict_url.clone(),
            csrf_token: config.csrf_token.clone(),
        }
    }
}

fn multipart_boundary() -> String {
    format!("----yolo-studio-{:032x}", rand::random::<u128>())
}

pub(crate) fn multipart_body(
    boundary: &str,
    file_name: &str,
    mime: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{UPLOAD_FIELD}\"; filename=\"{file_name}\"\r\n\
             Content-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

impl PredictClient for HttpPredictClient {
    fn predict(
        &self,
        file_name: &str,
        mime: &str,
        bytes: &[u8],
    ) -> Result<PredictResponse, PredictError> {
        let boundary = multipart_boundary();
        let body = multipart_body(&boundary, file_name, mime, bytes);

        let mut request = ureq::post(&self.predict_url).set(
            "Content-Type",
            &format!("multipart/form-data; boundary={boundary}"),
        );
        match &self.csrf_token {
            Some(token) => request = request.set(CSRF_HEADER, token),
            // The server is the authority on rejecting the request.
            None => warn!("no CSRF token configured; the server may reject the upload"),
        }

        debug!("POST {} ({} bytes)", self.predict_url, body.len());
        match request.send_bytes(&body) {
            Ok(response) => response
                .into_json::<PredictResponse>()
                .map_err(|e| PredictError::BadPayload(e.to_string())),
            // The endpoint reports logical failures as JSON bodies on 4xx/5xx
            // status codes; those are responses, not transport errors.
            Err(ureq::Error::Status(code, response)) => {
                match response.into_json::<PredictResponse>() {
                    Ok(payload) => Ok(payload),
                    Err(e) => Err(PredictError::Transport(format!("HTTP {code}: {e}"))),
                }
            }
            Err(ureq::Error::Transport(t)) => Err(PredictError::Transport(t.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_body_carries_field_filename_and_bytes() {
        let body = multipart_body("XYZ", "cat.png", "image/png", b"\x89PNGdata");
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("--XYZ\r\n"));
        assert!(text.contains("Content-Disposition: form-data; name=\"image\"; filename=\"cat.png\""));
        assert!(text.contains("Content-Type: image/png\r\n\r\n"));
        assert!(text.ends_with("\r\n--XYZ--\r\n"));
        assert!(body.windows(8).any(|w| w == b"\x89PNGdata"));
    }

    #[test]
    fn boundaries_are_unique_per_request() {
        assert_ne!(multipart_boundary(), multipart_boundary());
    }
}
