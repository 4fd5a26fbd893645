//! JSON and XML response encoders.
//!
//! Both formats are indented with tabs. The `write_*` functions stream into
//! any writer, so on failure part of the document may already be written.
//! The response builders encode into a buffer first: an encoding error is
//! returned before any response exists.

use std::io;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml encoding failed: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Write `data` as tab-indented JSON followed by a newline.
pub fn write_json<W, T>(mut writer: W, data: &T) -> Result<(), EncodeError>
where
    W: io::Write,
    T: Serialize + ?Sized,
{
    {
        let mut ser = serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"\t"));
        data.serialize(&mut ser)?;
    }
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write `data` as tab-indented XML.
///
/// The root element is named after the serialized type (struct name or
/// `#[serde(rename)]`). Use [`write_xml_with_root`] for maps, sequences and
/// primitives.
pub fn write_xml<W, T>(writer: W, data: &T) -> Result<(), EncodeError>
where
    W: io::Write,
    T: Serialize + ?Sized,
{
    encode_xml(writer, None, data)
}

/// Write `data` as tab-indented XML inside a `<root>` element.
pub fn write_xml_with_root<W, T>(writer: W, root: &str, data: &T) -> Result<(), EncodeError>
where
    W: io::Write,
    T: Serialize + ?Sized,
{
    encode_xml(writer, Some(root), data)
}

fn encode_xml<W, T>(mut writer: W, root: Option<&str>, data: &T) -> Result<(), EncodeError>
where
    W: io::Write,
    T: Serialize + ?Sized,
{
    let mut buf = String::new();
    let mut ser = match root {
        Some(root) => quick_xml::se::Serializer::with_root(&mut buf, Some(root))?,
        None => quick_xml::se::Serializer::new(&mut buf),
    };
    ser.indent('\t', 1);
    data.serialize(ser)?;

    writer.write_all(buf.as_bytes())?;
    Ok(())
}

/// JSON response with `application/json; charset=utf-8`.
pub fn json<T>(status: StatusCode, data: &T) -> Result<Response, EncodeError>
where
    T: Serialize + ?Sized,
{
    let mut body = Vec::new();
    write_json(&mut body, data)?;
    Ok(with_content_type(status, JSON_CONTENT_TYPE, body))
}

/// XML response with `application/xml; charset=utf-8`.
pub fn xml<T>(status: StatusCode, data: &T) -> Result<Response, EncodeError>
where
    T: Serialize + ?Sized,
{
    let mut body = Vec::new();
    write_xml(&mut body, data)?;
    Ok(with_content_type(status, XML_CONTENT_TYPE, body))
}

pub(crate) fn with_content_type(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> Response {
    (
        status,
        [(CONTENT_TYPE, HeaderValue::from_static(content_type))],
        body,
    )
        .into_response()
}
