use crate::config::{ConfigError, WriterConfig};
use crate::sink::LogSink;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::ser::Formatter;
use std::error::Error;
use std::io;
use std::time::Duration;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Sink that POSTs each batch to a log collector as a url-encoded form.
///
/// The body carries two fields: `app` with the application name and `logs`
/// with the batch as a JSON array of strings. The response status and body
/// are ignored; only a failure to deliver the request is reported.
#[derive(Clone)]
pub struct HttpSink {
    client: Client,
    url: reqwest::Url,
}

impl HttpSink {
    /// Construct a sink posting to `url`.
    ///
    /// **Parameters**
    /// - `url`: collector endpoint, validated here.
    /// - `timeout`: per-request limit, `None` for no limit.
    ///
    /// **Returns**
    /// - A ready-to-use [`HttpSink`], or [`ConfigError::InvalidUrl`].
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, ConfigError> {
        let url = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(Self { client, url })
    }

    pub fn from_config(config: &WriterConfig) -> Result<Self, ConfigError> {
        Self::new(&config.url, config.request_timeout)
    }

    /// POST one batch. An empty batch sends nothing.
    pub async fn transmit(&self, app_name: &str, batch: &[String]) -> Result<(), TransmitError> {
        if batch.is_empty() {
            return Ok(());
        }
        let body = encode_form(app_name, batch)?;

        let resp = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        // Status is ignored. Read the body so the connection can be reused.
        let _ = resp.bytes().await;
        Ok(())
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn send(
        &self,
        app_name: &str,
        batch: &[String],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.transmit(app_name, batch).await?;
        Ok(())
    }
}

/// Encode the request body: `app=<app_name>&logs=<JSON array of lines>`.
///
/// The bytes match what collectors written against Go's `net/url` and
/// `encoding/json` receive: keys in sorted order, spaces as `+`, every
/// byte outside `A-Za-z0-9-_.~` percent-encoded, and `<`, `>`, `&`,
/// U+2028 and U+2029 escaped inside the JSON strings.
pub fn encode_form(app_name: &str, batch: &[String]) -> Result<String, TransmitError> {
    let mut logs = Vec::with_capacity(batch.iter().map(|l| l.len() + 3).sum::<usize>() + 2);
    let mut ser = serde_json::Serializer::with_formatter(&mut logs, HtmlSafeFormatter);
    batch.serialize(&mut ser)?;

    Ok(format!(
        "app={}&logs={}",
        form_escape(app_name.as_bytes()),
        form_escape(&logs)
    ))
}

// urlencoding leaves exactly `A-Za-z0-9-_.~` unescaped; form values
// additionally spell a space as `+`.
fn form_escape(value: &[u8]) -> String {
    urlencoding::encode_binary(value).replace("%20", "+")
}

/// Compact JSON formatter that also escapes characters unsafe in HTML and
/// JavaScript, like Go's `json.Marshal`.
struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Reasons a batch could not be delivered.
#[derive(thiserror::Error, Debug)]
pub enum TransmitError {
    #[error("failed to serialize log batch: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to deliver log batch: {0}")]
    Transport(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn decode_form(body: &str) -> HashMap<String, String> {
        body.split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                let decode = |s: &str| urlencoding::decode(&s.replace('+', " ")).unwrap().into_owned();
                (decode(k), decode(v))
            })
            .collect()
    }

    #[test]
    fn form_body_decodes_to_app_and_logs() {
        let body = encode_form("svc", &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(body, "app=svc&logs=%5B%22a%22%2C%22b%22%5D");

        let form = decode_form(&body);
        assert_eq!(form.len(), 2);
        assert_eq!(form["app"], "svc");
        assert_eq!(form["logs"], r#"["a","b"]"#);
    }

    #[test]
    fn body_bytes_match_go_form_encoding() {
        let body = encode_form("my svc", &["a b <&>".to_string()]).unwrap();
        assert_eq!(
            body,
            "app=my+svc&logs=%5B%22a+b+%5Cu003c%5Cu0026%5Cu003e%22%5D"
        );
    }

    #[test]
    fn line_separators_are_escaped_in_json() {
        let body = encode_form("svc", &["x\u{2028}y\u{2029}z~*".to_string()]).unwrap();
        assert_eq!(
            body,
            "app=svc&logs=%5B%22x%5Cu2028y%5Cu2029z~%2A%22%5D"
        );
    }

    #[test]
    fn awkward_characters_survive_encoding() {
        let lines = vec![
            "[2024/03/07 09:05:02 UTC] [INFO] (api) a=b&c=d".to_string(),
            "quote \" backslash \\ newline \n unicode é".to_string(),
        ];
        let form = decode_form(&encode_form("my app+1", &lines).unwrap());

        assert_eq!(form["app"], "my app+1");
        let logs: Vec<String> = serde_json::from_str(&form["logs"]).unwrap();
        assert_eq!(logs, lines);
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(
            HttpSink::new("::nope", None),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }
}
