//! `multipart/form-data` encoding for uploads.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

/// An in-memory multipart form.
#[derive(Debug)]
pub struct MultipartForm {
    boundary: String,
    body: BytesMut,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("note-relay-{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: BytesMut::new(),
        }
    }

    /// Value for the request's `content-type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Append a file field.
    pub fn file(mut self, field: &str, filename: &str, data: &[u8]) -> Self {
        self.body.put_slice(b"--");
        self.body.put_slice(self.boundary.as_bytes());
        self.body.put_slice(b"\r\n");
        self.body.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape(field),
                escape(filename)
            )
            .as_bytes(),
        );
        self.body.put_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        self.body.put_slice(data);
        self.body.put_slice(b"\r\n");
        self
    }

    /// Close the form and return the encoded body.
    pub fn finish(mut self) -> Bytes {
        self.body.put_slice(b"--");
        self.body.put_slice(self.boundary.as_bytes());
        self.body.put_slice(b"--\r\n");
        self.body.freeze()
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent-encode the characters that would break a quoted header value.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_layout() {
        let form = MultipartForm::with_boundary("XyZ").file("file", "notes.md", b"# hi");
        assert_eq!(form.content_type(), "multipart/form-data; boundary=XyZ");

        let body = form.finish();
        let expected = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"notes.md\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            # hi\r\n\
            --XyZ--\r\n";
        assert_eq!(body, Bytes::from(expected));
    }

    #[test]
    fn test_filename_quotes_are_escaped() {
        let body = MultipartForm::with_boundary("b")
            .file("file", "a\"b\r\n.md", b"")
            .finish();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("filename=\"a%22b%0D%0A.md\""));
    }

    #[test]
    fn test_generated_boundaries_differ() {
        assert_ne!(MultipartForm::new().content_type(), MultipartForm::new().content_type());
    }
}
