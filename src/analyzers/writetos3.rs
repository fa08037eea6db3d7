use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::info;

/// Serializes `value` to JSON, gzip-compressing it when `gzip` is set.
///
/// Returns the body and the `Content-Encoding` to send with it.
pub fn encode_json(value: &impl Serialize, gzip: bool) -> anyhow::Result<(Vec<u8>, Option<&'static str>)> {
    let body = serde_json::to_vec(value)?;

    if !gzip {
        return Ok((body, None));
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&body)?;
    Ok((encoder.finish()?, Some("gzip")))
}

/// Serializes a value to JSON and uploads it to an S3 bucket with `application/json` content type.
pub async fn write_json_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
    gzip: bool,
) -> anyhow::Result<()> {
    let (body, encoding) = encode_json(value, gzip)?;
    let size = body.len();

    let mut request = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body.into())
        .content_type("application/json");
    if let Some(encoding) = encoding {
        request = request.content_encoding(encoding);
    }
    request.send().await?;

    info!(bucket, key, bytes = size, gzip, "Report uploaded to S3");
    Ok(())
}
