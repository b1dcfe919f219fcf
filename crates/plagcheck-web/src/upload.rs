use axum::extract::Multipart;

use plagcheck_core::{CheckInput, UploadedFile};

/// Parse the `/check` form: optional `text`, optional `file`.
pub async fn parse_check_form(mut multipart: Multipart) -> Result<CheckInput, String> {
    let mut input = CheckInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "text" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read text: {}", e))?;
                if !val.is_empty() {
                    input.text = Some(val);
                }
            }
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file data: {}", e))?
                    .to_vec();
                // Browsers send an empty part when no file was chosen.
                if !filename.is_empty() || !data.is_empty() {
                    input.file = Some(UploadedFile { filename, data });
                }
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    Ok(input)
}

/// Parse the `/rephrase` form and return its `text` field, if any.
pub async fn parse_rephrase_form(mut multipart: Multipart) -> Result<Option<String>, String> {
    let mut text = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        if field.name() == Some("text") {
            let val = field
                .text()
                .await
                .map_err(|e| format!("Failed to read text: {}", e))?;
            text = Some(val);
        } else {
            let _ = field.bytes().await;
        }
    }

    Ok(text)
}
