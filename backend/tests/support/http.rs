//! Request builders shared by HTTP-level suites.

use actix_web::http::header;
use actix_web::test::TestRequest;
use serde_json::Value;

const BOUNDARY: &str = "mercado-integration-boundary";

/// Attach `Authorization: Bearer <token>`.
pub fn authorised(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
}

/// Build a `multipart/form-data` request with text fields and one file.
pub fn multipart(
    req: TestRequest,
    fields: &[(&str, &str)],
    file_field: &str,
    file_name: &str,
    contents: &[u8],
) -> TestRequest {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{file_field}\"; \
             filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    req.insert_header((
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    ))
    .set_payload(body)
}

/// Read an `i32` id field from a JSON body.
pub fn id_of(body: &Value, field: &str) -> i32 {
    body[field]
        .as_i64()
        .and_then(|id| i32::try_from(id).ok())
        .unwrap_or_else(|| panic!("{field} missing from {body}"))
}
