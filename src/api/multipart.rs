//! Minimal multipart/form-data parsing for photo uploads.
//!
//! Covers what browsers and the kiosk client actually send: one or a few
//! parts with `Content-Disposition` names and binary payloads. No streaming,
//! no nested multipart, no transfer encodings; the whole body is already
//! buffered by the request reader.

use anyhow::{anyhow, Result};

/// One decoded form part.
#[derive(Debug)]
pub struct MultipartPart {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Extract the boundary token from a `Content-Type: multipart/form-data`
/// header value. Handles the quoted form.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    for segment in content_type.split(';') {
        let segment = segment.trim();
        if let Some(value) = segment.strip_prefix("boundary=") {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Split a buffered body into its parts.
///
/// The byte ranges between delimiters are copied out verbatim, so binary
/// payloads containing CRLF pairs survive intact.
pub fn parse_parts(body: &[u8], boundary: &str) -> Result<Vec<MultipartPart>> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut parts = Vec::new();

    let mut cursor =
        find(body, &delimiter, 0).ok_or_else(|| anyhow!("multipart boundary not in body"))?;
    loop {
        cursor += delimiter.len();
        if body[cursor..].starts_with(b"--") {
            // Terminal delimiter.
            break;
        }
        if body[cursor..].starts_with(b"\r\n") {
            cursor += 2;
        }

        let headers_end =
            find(body, b"\r\n\r\n", cursor).ok_or_else(|| anyhow!("unterminated part headers"))?;
        let headers_text = String::from_utf8_lossy(&body[cursor..headers_end]).into_owned();

        let data_start = headers_end + 4;
        let next = find(body, &delimiter, data_start)
            .ok_or_else(|| anyhow!("multipart body missing terminal boundary"))?;
        let mut data_end = next;
        // The CRLF before the next delimiter belongs to the framing.
        if data_end >= data_start + 2 && &body[data_end - 2..data_end] == b"\r\n" {
            data_end -= 2;
        }

        parts.push(build_part(&headers_text, body[data_start..data_end].to_vec()));
        cursor = next;
    }

    Ok(parts)
}

/// Pick the part that carries the uploaded photo.
///
/// Preference order: the part named `image`, then the first part that looks
/// like a file upload (has a filename or an `image/*` content type), then
/// the first part at all.
pub fn image_part(parts: &[MultipartPart]) -> Option<&MultipartPart> {
    parts
        .iter()
        .find(|part| part.name.as_deref() == Some("image"))
        .or_else(|| {
            parts.iter().find(|part| {
                part.filename.is_some()
                    || part
                        .content_type
                        .as_deref()
                        .map_or(false, |ct| ct.starts_with("image/"))
            })
        })
        .or_else(|| parts.first())
}

fn build_part(headers_text: &str, data: Vec<u8>) -> MultipartPart {
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in headers_text.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "content-disposition" => {
                name = disposition_param(value, "name");
                filename = disposition_param(value, "filename");
            }
            "content-type" => content_type = Some(value.to_string()),
            _ => {}
        }
    }

    MultipartPart {
        name,
        filename,
        content_type,
        data,
    }
}

fn disposition_param(value: &str, key: &str) -> Option<String> {
    for segment in value.split(';') {
        let segment = segment.trim();
        if let Some(rest) = segment.strip_prefix(key) {
            if let Some(rest) = rest.trim_start().strip_prefix('=') {
                return Some(rest.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < from + needle.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|position| position + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_body(boundary: &str, parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (headers, data) in parts {
            body.extend_from_slice(format!("--{}\r\n{}\r\n\r\n", boundary, headers).as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        body
    }

    #[test]
    fn boundary_is_read_from_the_header_value() {
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=xYz123").as_deref(),
            Some("xYz123")
        );
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=\"quoted token\"").as_deref(),
            Some("quoted token")
        );
        assert_eq!(boundary_from_content_type("application/json"), None);
    }

    #[test]
    fn parses_named_parts_with_binary_data() -> Result<()> {
        let payload: &[u8] = b"\xFF\xD8binary\r\nwith crlf\x00";
        let body = form_body(
            "frame",
            &[(
                "Content-Disposition: form-data; name=\"image\"; filename=\"shot.jpg\"\r\n\
                 Content-Type: image/jpeg",
                payload,
            )],
        );

        let parts = parse_parts(&body, "frame")?;
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name.as_deref(), Some("image"));
        assert_eq!(parts[0].filename.as_deref(), Some("shot.jpg"));
        assert_eq!(parts[0].content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(parts[0].data, payload);
        Ok(())
    }

    #[test]
    fn image_part_prefers_the_image_name() -> Result<()> {
        let body = form_body(
            "b",
            &[
                (
                    "Content-Disposition: form-data; name=\"note\"",
                    b"hello" as &[u8],
                ),
                (
                    "Content-Disposition: form-data; name=\"image\"",
                    b"pixels" as &[u8],
                ),
            ],
        );
        let parts = parse_parts(&body, "b")?;
        let picked = image_part(&parts).expect("a part should be picked");
        assert_eq!(picked.data, b"pixels");
        Ok(())
    }

    #[test]
    fn image_part_falls_back_to_file_like_then_first() -> Result<()> {
        let body = form_body(
            "b",
            &[
                (
                    "Content-Disposition: form-data; name=\"note\"",
                    b"hello" as &[u8],
                ),
                (
                    "Content-Disposition: form-data; name=\"upload\"; filename=\"x.png\"",
                    b"pixels" as &[u8],
                ),
            ],
        );
        let parts = parse_parts(&body, "b")?;
        assert_eq!(image_part(&parts).expect("picked").data, b"pixels");

        let body = form_body(
            "b",
            &[(
                "Content-Disposition: form-data; name=\"only\"",
                b"data" as &[u8],
            )],
        );
        let parts = parse_parts(&body, "b")?;
        assert_eq!(image_part(&parts).expect("picked").data, b"data");
        Ok(())
    }

    #[test]
    fn truncated_bodies_are_rejected() {
        let body = b"--frame\r\nContent-Disposition: form-data; name=\"image\"\r\n\r\ndata";
        assert!(parse_parts(body, "frame").is_err());
        assert!(parse_parts(b"no delimiters here", "frame").is_err());
    }

    #[test]
    fn empty_part_data_survives() -> Result<()> {
        let body = form_body(
            "b",
            &[(
                "Content-Disposition: form-data; name=\"image\"",
                b"" as &[u8],
            )],
        );
        let parts = parse_parts(&body, "b")?;
        assert!(parts[0].data.is_empty());
        Ok(())
    }
}
