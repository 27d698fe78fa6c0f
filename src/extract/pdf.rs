use bytes::Bytes;

/// text layer of a pdf. parsing runs on the blocking pool and a panic in the
/// parser is reported as an error
pub async fn text_layer(data: Bytes) -> Result<String, String> {
    let result = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&data)
    }).await;

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(err)) => Err(format!("failed to parse pdf: {err}")),
        Err(err) => Err(format!("pdf parser aborted: {err}")),
    }
}
